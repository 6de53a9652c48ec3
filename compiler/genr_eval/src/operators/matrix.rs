//! Matrix operators.
//!
//! Scalars and 1×1 matrices broadcast against any shape. Plain comparisons
//! of matrices produce a single scalar ("holds for every element"); the dot
//! comparisons produce 0/1 matrices.

use std::borrow::Cow;

use num_complex::Complex64;

use genr_ir::BinaryOp;
use genr_value::errors::{binary_type_mismatch, non_conformable, type_mismatch};
use genr_value::na::from_bool;
use genr_value::{EvalResult, Matrix, NumericWarning, Operand, Value, ValueKind, NA};

use super::linalg;
use super::scalar::{xy_calc, NaZero};
use super::OpCtx;
use crate::context::WarningLog;

/// Promote a matrix-compatible operand to a matrix.
pub(crate) fn as_matrix<'a>(op: Operand<'a>, ctx: &OpCtx<'_>) -> Option<Cow<'a, Matrix>> {
    match op {
        Operand::Matrix(m) => Some(Cow::Borrowed(m)),
        Operand::Scalar(x) => Some(Cow::Owned(Matrix::scalar(x))),
        Operand::Series(s) => {
            let (t1, t2) = ctx.sample();
            let values = if s.values.is_empty() {
                Vec::new()
            } else {
                s.values[t1..=t2].to_vec()
            };
            Some(Cow::Owned(Matrix::column(values)))
        }
        _ => None,
    }
}

/// Result shape for elementwise ops. `dot` additionally allows a row or
/// column vector to broadcast along the other dimension.
fn broadcast_shape(
    op: BinaryOp,
    a: (usize, usize),
    b: (usize, usize),
    dot: bool,
) -> EvalResult<(usize, usize)> {
    if a == b {
        return Ok(a);
    }
    if a == (1, 1) {
        return Ok(b);
    }
    if b == (1, 1) {
        return Ok(a);
    }
    if dot {
        let rows = match (a.0, b.0) {
            (x, y) if x == y => Some(x),
            (1, y) => Some(y),
            (x, 1) => Some(x),
            _ => None,
        };
        let cols = match (a.1, b.1) {
            (x, y) if x == y => Some(x),
            (1, y) => Some(y),
            (x, 1) => Some(x),
            _ => None,
        };
        if let (Some(r), Some(c)) = (rows, cols) {
            return Ok((r, c));
        }
    }
    Err(non_conformable(op.as_symbol(), a, b))
}

/// Offset of `(r, c)` in `m` with singleton dimensions broadcast.
#[inline]
fn bidx(m: &Matrix, r: usize, c: usize) -> usize {
    let r = if m.rows() == 1 { 0 } else { r };
    let c = if m.cols() == 1 { 0 } else { c };
    c * m.rows() + r
}

/// Elementwise `op` into `out`.
fn elementwise(
    op: BinaryOp,
    a: &Matrix,
    b: &Matrix,
    dot: bool,
    ctx: &mut OpCtx<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    let (rows, cols) = broadcast_shape(op, a.shape(), b.shape(), dot)?;
    let scalar_op = op.elementwise();
    if a.is_complex() || b.is_complex() {
        let dst = out.complex_matrix_buf(rows, cols);
        let dst = dst.complex_mut().unwrap_or_default();
        for c in 0..cols {
            for r in 0..rows {
                let x = a.at_complex(bidx(a, r, c));
                let y = b.at_complex(bidx(b, r, c));
                dst[c * rows + r] = complex_calc(x, y, scalar_op, ctx.warnings)?;
            }
        }
        if let Value::Matrix(m) = out {
            m.demote_if_real();
        }
        return Ok(());
    }
    let dst = out.matrix_buf(rows, cols);
    let dst = dst.real_mut().unwrap_or_default();
    for c in 0..cols {
        for r in 0..rows {
            let x = a.at(bidx(a, r, c));
            let y = b.at(bidx(b, r, c));
            dst[c * rows + r] = xy_calc(x, y, scalar_op, NaZero::Propagate, ctx.warnings);
        }
    }
    Ok(())
}

fn complex_calc(
    x: Complex64,
    y: Complex64,
    op: BinaryOp,
    warnings: &mut WarningLog,
) -> EvalResult<Complex64> {
    Ok(match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div if y == Complex64::default() => {
            warnings.record(NumericWarning::DivisionByZero);
            Complex64::new(NA, NA)
        }
        BinaryOp::Div => x / y,
        BinaryOp::Pow => x.powc(y),
        BinaryOp::Eq => Complex64::new(from_bool(x == y), 0.0),
        BinaryOp::NotEq => Complex64::new(from_bool(x != y), 0.0),
        other => {
            return Err(type_mismatch(
                format!("real matrix for `{}`", other.as_symbol()),
                ValueKind::Matrix,
            ))
        }
    })
}

/// Plain comparison: 1 if `op` holds for every (broadcast) element pair.
fn compare_all(op: BinaryOp, a: &Matrix, b: &Matrix, ctx: &mut OpCtx<'_>, out: &mut Value) -> EvalResult<()> {
    let (rows, cols) = broadcast_shape(op, a.shape(), b.shape(), false)?;
    let mut all = true;
    for c in 0..cols {
        for r in 0..rows {
            let (ka, kb) = (bidx(a, r, c), bidx(b, r, c));
            let holds = if a.is_complex() || b.is_complex() {
                complex_calc(a.at_complex(ka), b.at_complex(kb), op, ctx.warnings)?.re
            } else {
                xy_calc(a.at(ka), b.at(kb), op, NaZero::Propagate, ctx.warnings)
            };
            if holds != 1.0 {
                all = false;
            }
        }
    }
    out.set_scalar(from_bool(all));
    Ok(())
}

/// Binary op with at least one matrix operand.
pub(crate) fn matrix_op(
    op: BinaryOp,
    a: Operand<'_>,
    b: Operand<'_>,
    ctx: &mut OpCtx<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    let (Some(ma), Some(mb)) = (as_matrix(a, ctx), as_matrix(b, ctx)) else {
        return Err(binary_type_mismatch(op.as_symbol(), a.kind(), b.kind()));
    };
    let (ma, mb) = (ma.as_ref(), mb.as_ref());

    if op.is_dot() {
        return elementwise(op, ma, mb, true, ctx, out);
    }

    let result = match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mod | BinaryOp::And | BinaryOp::Or => {
            return elementwise(op, ma, mb, false, ctx, out);
        }
        BinaryOp::Mul => {
            if ma.is_scalar() || mb.is_scalar() {
                return elementwise(op, ma, mb, false, ctx, out);
            }
            linalg::matmul(ma, mb)?
        }
        BinaryOp::Div => {
            if mb.is_scalar() {
                return elementwise(op, ma, mb, false, ctx, out);
            }
            linalg::right_divide(ma, mb)?
        }
        BinaryOp::LDiv => {
            if ma.is_scalar() {
                return elementwise(BinaryOp::Div, mb, ma, false, ctx, out);
            }
            linalg::solve(ma, mb)?
        }
        BinaryOp::Pow => {
            if ma.is_scalar() {
                return elementwise(op, ma, mb, false, ctx, out);
            }
            match b.scalar() {
                Some(k) => linalg::power(ma, k)?,
                None => return Err(non_conformable("^", ma.shape(), mb.shape())),
            }
        }
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq => return compare_all(op, ma, mb, ctx, out),
        BinaryOp::Concat => linalg::hcat(ma, mb)?,
        BinaryOp::Union => linalg::vcat(ma, mb)?,
        BinaryOp::Kron => linalg::kron(ma, mb)?,
        _ => return Err(binary_type_mismatch(op.as_symbol(), a.kind(), b.kind())),
    };
    match out {
        Value::Matrix(m) => m.copy_from(&result),
        other => *other = Value::Matrix(result),
    }
    Ok(())
}
