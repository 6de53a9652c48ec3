//! Assignment to a whole variable or dataset series.

use genr_data::Dataset;
use genr_ir::AssignOp;
use genr_value::errors::{invalid_assignment, type_mismatch, undefined_symbol};
use genr_value::{EvalResult, Operand, SeriesId, Value, NA};

use super::convert::{conform, convert, empty_of, target_of};
use super::{Place, RhsValue, Root};
use crate::context::{TargetType, Workspace};
use crate::operators::numeric::column;
use crate::operators::scalar::assign_calc;
use crate::operators::{self, OpCtx};

pub(super) fn write(
    ws: &mut Workspace,
    place: &Place,
    op: AssignOp,
    rhs: RhsValue<'_>,
    target: TargetType,
) -> EvalResult<()> {
    match &place.root {
        Root::New(name) => define(ws, name, op, rhs, target),
        Root::Var(vid) => {
            let Workspace {
                dataset,
                vars,
                warnings,
                ..
            } = ws;
            let slot = vars
                .get_mut(*vid)
                .ok_or_else(|| undefined_symbol(place.text.clone()))?;
            let kind = target_of(slot);
            if !target.is_any() && !kind.is_any() && target != kind {
                return Err(invalid_assignment(format!(
                    "{} is a {kind}, not a {target}",
                    place.text
                )));
            }
            let want = if kind.is_any() { target } else { kind };
            let mut ctx = OpCtx {
                ds: dataset,
                warnings,
                target: want,
            };
            update(slot, op, rhs, want, &mut ctx)
        }
        Root::Series(sid) => write_series(ws, *sid, &place.text, op, rhs, target),
    }
}

/// First assignment to `name`.
fn define(
    ws: &mut Workspace,
    name: &str,
    op: AssignOp,
    rhs: RhsValue<'_>,
    target: TargetType,
) -> EvalResult<()> {
    if op.is_inflected() {
        return Err(undefined_symbol(name));
    }
    let value = if rhs.value().is_undefined() {
        empty_of(target).ok_or_else(|| {
            invalid_assignment(format!("{name}: null needs a container type"))
        })?
    } else {
        let ctx = OpCtx {
            ds: &ws.dataset,
            warnings: &mut ws.warnings,
            target,
        };
        conform(rhs, target, &ctx)?.into_value()
    };
    tracing::debug!(name, kind = %value.kind(), "new variable");
    let value = match value {
        Value::Series(mut values) => {
            restrict_to_sample(&mut values, &ws.dataset);
            Value::Series(values)
        }
        other => other,
    };
    match value {
        // Inside a function a new series is local to the call.
        Value::Series(values) if !ws.in_function() => {
            ws.dataset.add_series(name, values)?;
        }
        value => {
            ws.vars.insert(name, value)?;
        }
    }
    Ok(())
}

/// Observations of a new series outside the active sample are NA.
fn restrict_to_sample(values: &mut [f64], ds: &Dataset) {
    if values.len() != ds.nobs() {
        return;
    }
    let (t1, t2) = ds.sample();
    for (t, v) in values.iter_mut().enumerate() {
        if t < t1 || t > t2 {
            *v = NA;
        }
    }
}

/// Write `rhs` into an existing value of type `want` under `op`.
pub(super) fn update(
    slot: &mut Value,
    op: AssignOp,
    rhs: RhsValue<'_>,
    want: TargetType,
    ctx: &mut OpCtx<'_>,
) -> EvalResult<()> {
    match op {
        AssignOp::Assign if rhs.value().is_undefined() => {
            *slot = empty_of(want)
                .ok_or_else(|| invalid_assignment(format!("cannot assign null to a {want}")))?;
            Ok(())
        }
        AssignOp::Assign => {
            conform(rhs, want, ctx)?.store(slot);
            Ok(())
        }
        AssignOp::Fill => fill(slot, &rhs),
        _ => {
            *slot = combine(slot, op, &rhs, ctx)?;
            Ok(())
        }
    }
}

/// `existing op= rhs`; the result keeps the kind of `existing`.
pub(super) fn combine(
    existing: &Value,
    op: AssignOp,
    rhs: &RhsValue<'_>,
    ctx: &mut OpCtx<'_>,
) -> EvalResult<Value> {
    let bop = op
        .binary()
        .ok_or_else(|| invalid_assignment(format!("{} needs an existing value", op.as_symbol())))?;
    let mut out = Value::Undefined;
    operators::binary(bop, existing.as_operand(), rhs.operand(), ctx, &mut out)?;
    let want = target_of(existing);
    if want.is_any() || target_of(&out) == want {
        Ok(out)
    } else {
        convert(out.as_operand(), None, want, ctx)
    }
}

/// `M .= x`: every element of a matrix becomes `x`.
pub(super) fn fill(slot: &mut Value, rhs: &RhsValue<'_>) -> EvalResult<()> {
    let Value::Matrix(m) = slot else {
        return Err(type_mismatch("matrix for .=", slot.kind()));
    };
    let x = rhs
        .operand()
        .scalar()
        .ok_or_else(|| type_mismatch("scalar", rhs.kind()))?;
    let (rows, cols) = m.shape();
    m.reshape_real(rows, cols).fill(x);
    Ok(())
}

/// Assignment to a dataset series. Only the active sample is written.
fn write_series(
    ws: &mut Workspace,
    sid: SeriesId,
    text: &str,
    op: AssignOp,
    rhs: RhsValue<'_>,
    target: TargetType,
) -> EvalResult<()> {
    if !matches!(target, TargetType::Any | TargetType::Series) {
        return Err(invalid_assignment(format!("{text} is a series, not a {target}")));
    }
    if matches!(op, AssignOp::Concat | AssignOp::Union | AssignOp::Fill) {
        return Err(invalid_assignment(format!(
            "{} is not defined for series",
            op.as_symbol()
        )));
    }
    let (t1, t2) = ws.dataset.sample();
    if ws.dataset.nobs() == 0 {
        return Ok(());
    }

    // A string names a category of a string-valued series.
    if let Operand::Str(s) = rhs.operand() {
        let series = ws.dataset.series_mut(sid)?;
        let Some(table) = series.strings.as_mut() else {
            return Err(type_mismatch("numeric value", rhs.kind()));
        };
        if op != AssignOp::Assign {
            return Err(invalid_assignment(format!("{text}: string values need plain =")));
        }
        let code = table.intern(s);
        series.values[t1..=t2].fill(code);
        return Ok(());
    }

    let operand = rhs.operand();
    let col = {
        let ctx = OpCtx {
            ds: &ws.dataset,
            warnings: &mut ws.warnings,
            target,
        };
        column(operand, &ctx).ok_or_else(|| type_mismatch("series", operand.kind()))?
    };
    let Workspace {
        dataset, warnings, ..
    } = ws;
    let series = dataset.series_mut(sid)?;
    if series.is_categorical() && op != AssignOp::Assign {
        return Err(invalid_assignment(format!("{text}: string values need plain =")));
    }
    for (t, v) in (t1..=t2).zip(&mut series.values[t1..=t2]) {
        *v = assign_calc(*v, col.at(t), op, warnings);
    }
    Ok(())
}
