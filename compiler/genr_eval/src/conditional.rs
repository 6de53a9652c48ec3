//! `cond ? a : b`.
//!
//! The strategy depends on the kind of the evaluated condition:
//!
//! - scalar: only the selected branch is evaluated and the position shares
//!   its node; an NA condition gives NA without evaluating either branch;
//! - series: when the condition takes a single truth value over the sample
//!   only that branch is evaluated, otherwise both are combined per
//!   observation;
//! - matrix: both branches are evaluated and combined per element.

use std::borrow::Cow;

use genr_ir::NodeId;
use genr_value::errors::{non_conformable, type_mismatch};
use genr_value::na::truth;
use genr_value::{Complex64, EvalResult, Matrix, Operand, NA};

use crate::aux::AuxId;
use crate::eval::Evaluator;
use crate::operators::matrix::as_matrix;
use crate::operators::numeric::{column, fill_series, Column};
use crate::operators::OpCtx;

/// Truth values a series condition takes over the sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Coverage {
    any_true: bool,
    any_false: bool,
    any_na: bool,
}

impl Coverage {
    fn of(values: &[f64]) -> Self {
        values.iter().fold(Self::default(), |mut acc, &x| {
            match truth(x) {
                Some(true) => acc.any_true = true,
                Some(false) => acc.any_false = true,
                None => acc.any_na = true,
            }
            acc
        })
    }
}

impl Evaluator<'_> {
    pub(crate) fn eval_ternary(
        &mut self,
        pos: NodeId,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    ) -> EvalResult<AuxId> {
        let c = self.eval(cond)?;
        match self.operand(c)? {
            op if op.is_scalar_like() => {
                let branch = match op.scalar().and_then(truth) {
                    Some(true) => then_branch,
                    Some(false) => else_branch,
                    None => {
                        return self.compute(pos, |_, _, out| {
                            out.set_scalar(NA);
                            Ok(())
                        });
                    }
                };
                let id = self.eval(branch)?;
                Ok(self.cache.link_ephemeral(pos, id))
            }
            Operand::Series(s) => {
                let (t1, t2) = self.ws.dataset.sample();
                let sample = if s.values.is_empty() {
                    &[][..]
                } else {
                    &s.values[t1..=t2]
                };
                let cover = Coverage::of(sample);
                self.series_ternary(pos, c, cover, then_branch, else_branch)
            }
            Operand::Matrix(_) => {
                let a = self.eval(then_branch)?;
                let b = self.eval(else_branch)?;
                self.compute(pos, |v, ctx, out| {
                    let cond = v.get(c)?;
                    let cm = cond
                        .matrix()
                        .ok_or_else(|| type_mismatch("matrix condition", cond.kind()))?;
                    let ma = branch_matrix(v.get(a)?, cm, ctx)?;
                    let mb = branch_matrix(v.get(b)?, cm, ctx)?;
                    select_matrix(cm, &ma, &mb, out.matrix_buf(cm.rows(), cm.cols()));
                    Ok(())
                })
            }
            other => Err(type_mismatch("scalar, series or matrix condition", other.kind())),
        }
    }

    fn series_ternary(
        &mut self,
        pos: NodeId,
        c: AuxId,
        cover: Coverage,
        then_branch: NodeId,
        else_branch: NodeId,
    ) -> EvalResult<AuxId> {
        // Outside a restricted sample a computed series is NA, so the branch
        // can only be shared when the sample spans the whole dataset.
        let shareable = !cover.any_na && self.ws.dataset.sample_len() == self.ws.dataset.nobs();
        let (a, b) = match (cover.any_true, cover.any_false) {
            (false, false) => {
                tracing::trace!("condition is NA over the sample");
                return self.compute(pos, |_, ctx, out| {
                    fill_series(ctx, out, |_, _| NA);
                    Ok(())
                });
            }
            (true, false) => {
                let a = self.eval(then_branch)?;
                if shareable && matches!(self.operand(a)?, Operand::Series(_)) {
                    return Ok(self.cache.link_ephemeral(pos, a));
                }
                (Some(a), None)
            }
            (false, true) => {
                let b = self.eval(else_branch)?;
                if shareable && matches!(self.operand(b)?, Operand::Series(_)) {
                    return Ok(self.cache.link_ephemeral(pos, b));
                }
                (None, Some(b))
            }
            (true, true) => (Some(self.eval(then_branch)?), Some(self.eval(else_branch)?)),
        };
        self.compute(pos, |v, ctx, out| {
            let cond = v.get(c)?;
            let cond = cond
                .series()
                .ok_or_else(|| type_mismatch("series condition", cond.kind()))?;
            let ca = branch_column(a.map(|id| v.get(id)).transpose()?, ctx)?;
            let cb = branch_column(b.map(|id| v.get(id)).transpose()?, ctx)?;
            fill_series(ctx, out, |t, _| match truth(cond.values[t]) {
                Some(true) => ca.map_or(NA, |col| col.at(t)),
                Some(false) => cb.map_or(NA, |col| col.at(t)),
                None => NA,
            });
            Ok(())
        })
    }
}

fn branch_column<'a>(op: Option<Operand<'a>>, ctx: &OpCtx<'_>) -> EvalResult<Option<Column<'a>>> {
    op.map(|op| column(op, ctx).ok_or_else(|| type_mismatch("series or scalar branch", op.kind())))
        .transpose()
}

/// A branch of a matrix-conditioned ternary: a scalar or a matrix of the
/// condition's shape.
fn branch_matrix<'a>(op: Operand<'a>, cond: &Matrix, ctx: &OpCtx<'_>) -> EvalResult<Cow<'a, Matrix>> {
    let m = match op {
        Operand::Scalar(_) | Operand::Matrix(_) => as_matrix(op, ctx),
        _ => None,
    }
    .ok_or_else(|| type_mismatch("matrix or scalar branch", op.kind()))?;
    if !m.is_scalar() && m.shape() != cond.shape() {
        return Err(non_conformable("?:", cond.shape(), m.shape()));
    }
    Ok(m)
}

fn select_matrix(cond: &Matrix, a: &Matrix, b: &Matrix, out: &mut Matrix) {
    let pick = |m: &Matrix, k: usize| m.at_complex(if m.is_scalar() { 0 } else { k });
    let complex = (0..cond.len()).any(|k| match truth(cond.at(k)) {
        Some(true) => a.is_complex(),
        Some(false) => b.is_complex(),
        None => false,
    });
    if complex {
        out.promote_complex();
    }
    for k in 0..cond.len() {
        let z = match truth(cond.at(k)) {
            Some(true) => pick(a, k),
            Some(false) => pick(b, k),
            None => Complex64::new(NA, 0.0),
        };
        out.set_at(k, z);
    }
}
