//! Scalar and series arithmetic.
//!
//! A series result has one entry per observation; only the active sample is
//! computed and everything outside it is NA.

use genr_ir::BinaryOp;
use genr_value::errors::{binary_type_mismatch, non_conformable};
use genr_value::{EvalResult, Matrix, Operand, Value, NA};

use super::scalar::xy_calc;
use super::OpCtx;

/// A numeric operand lined up against the observation index.
#[derive(Copy, Clone)]
pub(crate) enum Column<'a> {
    Const(f64),
    /// Indexed by observation.
    Full(&'a [f64]),
    /// Indexed by position within the sample.
    Sample(&'a [f64], usize),
}

impl Column<'_> {
    #[inline]
    pub fn at(&self, t: usize) -> f64 {
        match *self {
            Column::Const(x) => x,
            Column::Full(v) => v.get(t).copied().unwrap_or(NA),
            Column::Sample(v, t1) => v.get(t - t1).copied().unwrap_or(NA),
        }
    }
}

/// View `op` as a series-aligned column, if it is series-like: a scalar, a
/// series, or a column vector as long as the sample or the dataset.
pub(crate) fn column<'a>(op: Operand<'a>, ctx: &OpCtx<'_>) -> Option<Column<'a>> {
    if let Some(x) = op.scalar() {
        return Some(Column::Const(x));
    }
    match op {
        Operand::Series(s) => Some(Column::Full(s.values)),
        Operand::Matrix(m) => matrix_column(m, ctx),
        _ => None,
    }
}

fn matrix_column<'a>(m: &'a Matrix, ctx: &OpCtx<'_>) -> Option<Column<'a>> {
    let data = m.real()?;
    if m.cols() != 1 {
        return None;
    }
    let (t1, _) = ctx.sample();
    if m.rows() == ctx.sample_len() {
        Some(Column::Sample(data, t1))
    } else if m.rows() == ctx.nobs() {
        Some(Column::Full(data))
    } else {
        None
    }
}

/// Scalar op scalar.
pub(crate) fn scalar_op(op: BinaryOp, x: f64, y: f64, ctx: &mut OpCtx<'_>, out: &mut Value) {
    let na_zero = ctx.na_zero();
    out.set_scalar(xy_calc(x, y, op, na_zero, ctx.warnings));
}

/// Elementwise op where at least one side is a series.
pub(crate) fn series_op(
    op: BinaryOp,
    a: Operand<'_>,
    b: Operand<'_>,
    ctx: &mut OpCtx<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    let ca = column(a, ctx);
    let cb = column(b, ctx);
    let (Some(ca), Some(cb)) = (ca, cb) else {
        if let (Operand::Matrix(m), _) | (_, Operand::Matrix(m)) = (a, b) {
            return Err(non_conformable(
                op.as_symbol(),
                m.shape(),
                (ctx.sample_len(), 1),
            ));
        }
        return Err(binary_type_mismatch(op.as_symbol(), a.kind(), b.kind()));
    };
    fill_series(ctx, out, |t, ctx| {
        xy_calc(ca.at(t), cb.at(t), op, ctx.na_zero(), ctx.warnings)
    });
    Ok(())
}

/// Write a series over the active sample, NA elsewhere.
pub(crate) fn fill_series(
    ctx: &mut OpCtx<'_>,
    out: &mut Value,
    mut f: impl FnMut(usize, &mut OpCtx<'_>) -> f64,
) {
    let nobs = ctx.nobs();
    let (t1, t2) = ctx.sample();
    let buf = out.series_buf(nobs);
    if nobs == 0 {
        return;
    }
    for t in t1..=t2 {
        buf[t] = f(t, ctx);
    }
}
