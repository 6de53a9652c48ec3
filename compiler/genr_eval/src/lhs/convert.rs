//! Conversions between value kinds on assignment.
//!
//! | from | to | rule |
//! |---|---|---|
//! | scalar | matrix | 1×1 |
//! | real 1×1 matrix | scalar | its element |
//! | scalar | series | broadcast over the sample, NA elsewhere |
//! | column vector | series | sample-length or full-length column |
//! | series | matrix | column over the sample, with observation span |
//! | dataset series | list | one-element list |

use genr_value::errors::{array_kind_mismatch, type_mismatch};
use genr_value::{
    ArrayKind, Bundle, EvalResult, GArray, List, Matrix, ObsSpan, Operand, SeriesId, Value,
    ValueKind, NA,
};

use crate::context::TargetType;
use crate::operators::numeric::column;
use crate::operators::OpCtx;

use super::RhsValue;

/// Declared type matching an existing value; `Any` for `null`.
pub(crate) fn target_of(value: &Value) -> TargetType {
    match value {
        Value::Undefined => TargetType::Any,
        Value::Scalar(_) => TargetType::Scalar,
        Value::Series(_) => TargetType::Series,
        Value::Matrix(_) => TargetType::Matrix,
        Value::Str(_) => TargetType::Str,
        Value::List(_) => TargetType::List,
        Value::Bundle(_) => TargetType::Bundle,
        Value::Array(a) => a.kind().map_or(TargetType::Any, TargetType::Array),
    }
}

/// Empty value of a declared type, for `null` assignments.
pub(crate) fn empty_of(target: TargetType) -> Option<Value> {
    Some(match target {
        TargetType::Matrix => Value::Matrix(Matrix::default()),
        TargetType::Str => Value::Str(String::new()),
        TargetType::List => Value::List(List::new()),
        TargetType::Bundle => Value::Bundle(Bundle::new()),
        TargetType::Array(kind) => Value::Array(GArray::with_kind(kind)),
        TargetType::Any | TargetType::Scalar | TargetType::Series => return None,
    })
}

fn array_fits(a: &GArray, kind: ArrayKind) -> bool {
    a.kind().map_or(true, |k| k == kind)
}

/// Whether `value` already has the shape `target` asks for.
fn fits(value: &Value, target: TargetType) -> bool {
    match (target, value) {
        (TargetType::Any, _) => true,
        (TargetType::Array(kind), Value::Array(a)) => array_fits(a, kind),
        (t, v) => t.value_kind() == Some(v.kind()),
    }
}

/// Convert an operand to `target`.
pub(crate) fn convert(
    src: Operand<'_>,
    series: Option<SeriesId>,
    target: TargetType,
    ctx: &OpCtx<'_>,
) -> EvalResult<Value> {
    let mismatch = || type_mismatch(target.to_string(), src.kind());
    match target {
        TargetType::Any => Ok(src.to_value()),
        TargetType::Scalar => src.scalar().map(Value::Scalar).ok_or_else(mismatch),
        TargetType::Matrix => match src {
            Operand::Matrix(m) => Ok(Value::Matrix(m.clone())),
            Operand::Scalar(x) => Ok(Value::Matrix(Matrix::scalar(x))),
            Operand::Series(s) => {
                let (t1, t2) = ctx.sample();
                let values = if s.values.is_empty() {
                    Vec::new()
                } else {
                    s.values[t1..=t2].to_vec()
                };
                let mut m = Matrix::column(values);
                m.set_span(Some(ObsSpan { t1, t2 }));
                Ok(Value::Matrix(m))
            }
            _ => Err(mismatch()),
        },
        TargetType::Series => {
            if let Operand::Series(s) = src {
                return Ok(Value::Series(s.values.to_vec()));
            }
            let col = column(src, ctx).ok_or_else(mismatch)?;
            let (t1, t2) = ctx.sample();
            let mut values = vec![NA; ctx.nobs()];
            if !values.is_empty() {
                for t in t1..=t2 {
                    values[t] = col.at(t);
                }
            }
            Ok(Value::Series(values))
        }
        TargetType::List => match (src, series) {
            (Operand::List(l), _) => Ok(Value::List(l.clone())),
            (Operand::Series(_), Some(sid)) => Ok(Value::List(List::from_ids(vec![sid]))),
            _ => Err(mismatch()),
        },
        TargetType::Str => src.str().map(Value::string).ok_or_else(mismatch),
        TargetType::Bundle => match src {
            Operand::Bundle(b) => Ok(Value::Bundle(b.clone())),
            _ => Err(mismatch()),
        },
        TargetType::Array(kind) => match src {
            Operand::Array(a) if array_fits(a, kind) => {
                let mut out = GArray::with_kind(kind);
                out.extend(a)?;
                Ok(Value::Array(out))
            }
            Operand::Array(a) => Err(array_kind_mismatch(Some(kind), element_kind(a))),
            _ => Err(mismatch()),
        },
    }
}

fn element_kind(a: &GArray) -> ValueKind {
    a.kind().map_or(ValueKind::Undefined, ArrayKind::element_kind)
}

/// Bring a right-hand side to `target`, leaving it untouched (and so still
/// movable or copyable without an extra clone) when it already fits.
pub(crate) fn conform<'c>(
    rhs: RhsValue<'c>,
    target: TargetType,
    ctx: &OpCtx<'_>,
) -> EvalResult<RhsValue<'c>> {
    if fits(rhs.value(), target) {
        return Ok(rhs);
    }
    let value = convert(rhs.operand(), rhs.series, target, ctx)?;
    Ok(RhsValue::detached(value))
}
