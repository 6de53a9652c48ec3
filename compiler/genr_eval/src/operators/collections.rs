//! Operators on strings, lists, bundles and arrays.

use genr_ir::BinaryOp;
use genr_value::errors::{array_kind_mismatch, binary_type_mismatch, domain_error};
use genr_value::na::from_bool;
use genr_value::{
    ArrayKind, EvalResult, GArray, List, Operand, SeriesRef, Value, NA,
};

use super::numeric::fill_series;
use super::OpCtx;

fn mismatch(op: BinaryOp, a: Operand<'_>, b: Operand<'_>) -> genr_value::EvalError {
    binary_type_mismatch(op.as_symbol(), a.kind(), b.kind())
}

/// String operators, including string-vs-series comparison.
pub(crate) fn string_op(
    op: BinaryOp,
    a: Operand<'_>,
    b: Operand<'_>,
    ctx: &mut OpCtx<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    match (a, b) {
        (Operand::Str(x), Operand::Str(y)) => match op {
            BinaryOp::Add | BinaryOp::Concat => {
                let buf = out.string_buf();
                buf.push_str(x);
                buf.push_str(y);
                Ok(())
            }
            BinaryOp::Eq => {
                out.set_scalar(from_bool(x == y));
                Ok(())
            }
            BinaryOp::NotEq => {
                out.set_scalar(from_bool(x != y));
                Ok(())
            }
            _ => Err(mismatch(op, a, b)),
        },
        (Operand::Str(s), Operand::Scalar(n)) if op == BinaryOp::Add => {
            if n.is_nan() || n < 0.0 {
                return Err(domain_error("string offset must be non-negative"));
            }
            let skip = n as usize;
            let rest: String = s.chars().skip(skip).collect();
            *out.string_buf() = rest;
            Ok(())
        }
        (Operand::Str(s), Operand::Series(series)) | (Operand::Series(series), Operand::Str(s))
            if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) =>
        {
            compare_with_series(op, s, series, ctx, out);
            Ok(())
        }
        _ => Err(mismatch(op, a, b)),
    }
}

/// `series == "label"`: against the series' categorical table if it has
/// one, otherwise against the observation labels.
fn compare_with_series(
    op: BinaryOp,
    s: &str,
    series: SeriesRef<'_>,
    ctx: &mut OpCtx<'_>,
    out: &mut Value,
) {
    let negate = op == BinaryOp::NotEq;
    let ds = ctx.ds;
    match series.strings {
        Some(table) => {
            let code = table.code_of(s);
            fill_series(ctx, out, |t, _| {
                let v = series.values.get(t).copied().unwrap_or(NA);
                if v.is_nan() {
                    return NA;
                }
                from_bool(code.is_some_and(|c| c == v) != negate)
            });
        }
        None => {
            fill_series(ctx, out, |t, _| from_bool((ds.obs_label(t) == s) != negate));
        }
    }
}

/// View a list-like operand as a list: a list, or a dataset series.
fn as_list<'a>(op: Operand<'a>) -> Option<std::borrow::Cow<'a, List>> {
    match op {
        Operand::List(l) => Some(std::borrow::Cow::Borrowed(l)),
        Operand::Series(s) => s
            .id
            .map(|id| std::borrow::Cow::Owned(List::from_ids(vec![id]))),
        _ => None,
    }
}

pub(crate) fn list_op(
    op: BinaryOp,
    a: Operand<'_>,
    b: Operand<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    let (Some(x), Some(y)) = (as_list(a), as_list(b)) else {
        return Err(mismatch(op, a, b));
    };
    let result = match op {
        BinaryOp::Intersect => x.intersect(&y),
        BinaryOp::Union => x.union(&y),
        BinaryOp::Sub => x.difference(&y),
        BinaryOp::Add | BinaryOp::Concat => {
            let mut l = x.into_owned();
            l.append(&y);
            l
        }
        _ => return Err(mismatch(op, a, b)),
    };
    *out.list_buf() = result;
    Ok(())
}

pub(crate) fn bundle_op(
    op: BinaryOp,
    a: Operand<'_>,
    b: Operand<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    match (a, b, op) {
        (Operand::Bundle(x), Operand::Bundle(y), BinaryOp::Add) => {
            *out = Value::Bundle(x.union(y));
            Ok(())
        }
        _ => Err(mismatch(op, a, b)),
    }
}

pub(crate) fn array_op(
    op: BinaryOp,
    a: Operand<'_>,
    b: Operand<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    let Operand::Array(x) = a else {
        return Err(mismatch(op, a, b));
    };
    let mut result = x.clone();
    match (op, b) {
        (BinaryOp::Add, Operand::Array(y)) if x.kind() != Some(ArrayKind::Arrays) => {
            result.extend(y)?;
        }
        (BinaryOp::Add, elem) => {
            if elem.array_kind().is_none() {
                return Err(array_kind_mismatch(x.kind(), elem.kind()));
            }
            result.push(elem.to_value())?;
        }
        (BinaryOp::Union | BinaryOp::Intersect, Operand::Array(y)) => {
            result = string_set_op(op, x, y)?;
        }
        _ => return Err(mismatch(op, a, b)),
    }
    *out = Value::Array(result);
    Ok(())
}

/// Union or intersection of two string arrays; duplicates are dropped.
fn string_set_op(op: BinaryOp, x: &GArray, y: &GArray) -> EvalResult<GArray> {
    for arr in [x, y] {
        if arr.kind().is_some_and(|k| k != ArrayKind::Strings) {
            return Err(array_kind_mismatch(
                Some(ArrayKind::Strings),
                genr_value::ValueKind::Array,
            ));
        }
    }
    let contains = |arr: &GArray, s: &str| arr.items().iter().any(|v| v.as_str() == Some(s));
    let mut result = GArray::with_kind(ArrayKind::Strings);
    let candidates: Vec<&Value> = match op {
        BinaryOp::Union => x.items().iter().chain(y.items()).collect(),
        _ => x
            .items()
            .iter()
            .filter(|v| v.as_str().is_some_and(|s| contains(y, s)))
            .collect(),
    };
    for v in candidates {
        if let Some(s) = v.as_str() {
            if !contains(&result, s) {
                result.push(Value::string(s))?;
            }
        }
    }
    Ok(result)
}
