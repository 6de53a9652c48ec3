//! Assignment through member and subscript steps.
//!
//! Container steps are followed mutably from the root variable down to the
//! last step, which decides the kind of write. Everything happens in place,
//! so a matrix inside a bundle inside an array is updated where it lives.

use genr_data::Dataset;
use genr_ir::AssignOp;
use genr_value::errors::{
    invalid_assignment, not_addressable, type_mismatch, undefined_member, undefined_symbol,
};
use genr_value::{Bundle, EvalResult, GArray, List, Matrix, Operand, SeriesId, Value, ValueKind};

use super::convert::{conform, empty_of, target_of};
use super::whole::{combine, fill, update};
use super::{Place, RhsValue, Root, Step};
use crate::aux::{follow_mut, Accessor};
use crate::context::{TargetType, WarningLog, Workspace};
use crate::operators::matrix::as_matrix;
use crate::operators::scalar::assign_calc;
use crate::operators::{self, OpCtx};
use crate::select::{self, position, MatrixSel, SubArg};

/// What every step of one write needs.
struct Env<'w> {
    ds: &'w Dataset,
    warnings: &'w mut WarningLog,
    target: TargetType,
    text: &'w str,
}

impl Env<'_> {
    fn ctx(&mut self, target: TargetType) -> OpCtx<'_> {
        OpCtx {
            ds: self.ds,
            warnings: &mut *self.warnings,
            target,
        }
    }

    fn plain_only(&self, op: AssignOp, what: &str) -> EvalResult<()> {
        if op == AssignOp::Assign {
            Ok(())
        } else {
            Err(invalid_assignment(format!(
                "{}: {} is not defined for {what}",
                self.text,
                op.as_symbol()
            )))
        }
    }
}

pub(super) fn write(
    ws: &mut Workspace,
    place: &Place,
    op: AssignOp,
    rhs: RhsValue<'_>,
    target: TargetType,
) -> EvalResult<()> {
    match &place.root {
        Root::Series(sid) => match place.steps.as_slice() {
            [Step::Sub(args)] => {
                let t = observation(&ws.dataset, args)?;
                write_obs(ws, *sid, t, &place.text, op, rhs)
            }
            _ => Err(not_addressable(place.text.clone())),
        },
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
            let mut env = Env {
                ds: dataset,
                warnings,
                target,
                text: &place.text,
            };
            write_into(slot, &place.steps, op, rhs, &mut env)
        }
        Root::New(name) => Err(undefined_symbol(name.clone())),
    }
}

/// Observation addressed by `x[t]` or `x["label"]`.
fn observation(ds: &Dataset, args: &[SubArg]) -> EvalResult<usize> {
    match args {
        [SubArg::Num(x)] => position(*x, ds.nobs()),
        [SubArg::Str(label)] => ds.find_obs(label).ok_or_else(|| undefined_member(label.clone())),
        [other] => Err(type_mismatch("observation index", kind_of(other))),
        _ => Err(not_addressable("series with more than one subscript")),
    }
}

fn kind_of(arg: &SubArg) -> ValueKind {
    match arg {
        SubArg::Num(_) => ValueKind::Scalar,
        SubArg::Str(_) => ValueKind::Str,
        SubArg::Matrix(_) => ValueKind::Matrix,
        SubArg::All | SubArg::Dummy(_) | SubArg::Range(..) => ValueKind::Undefined,
    }
}

/// `x[t] = v` on a dataset series; writes straight into dataset storage.
fn write_obs(
    ws: &mut Workspace,
    sid: SeriesId,
    t: usize,
    text: &str,
    op: AssignOp,
    rhs: RhsValue<'_>,
) -> EvalResult<()> {
    let Workspace {
        dataset, warnings, ..
    } = ws;
    let series = dataset.series_mut(sid)?;
    let operand = rhs.operand();
    if let Some(table) = series.strings.as_mut() {
        if op != AssignOp::Assign {
            return Err(invalid_assignment(format!("{text}: string values need plain =")));
        }
        let Operand::Str(s) = operand else {
            return Err(type_mismatch("string", operand.kind()));
        };
        series.values[t] = table.intern(s);
        return Ok(());
    }
    let x = numeric_element(operand, op, text)?;
    series.values[t] = assign_calc(series.values[t], x, op, warnings);
    Ok(())
}

fn numeric_element(operand: Operand<'_>, op: AssignOp, text: &str) -> EvalResult<f64> {
    if matches!(op, AssignOp::Concat | AssignOp::Union | AssignOp::Fill) {
        return Err(invalid_assignment(format!(
            "{text}: {} is not defined for a single element",
            op.as_symbol()
        )));
    }
    operand
        .scalar()
        .ok_or_else(|| type_mismatch("scalar", operand.kind()))
}

/// Accessor for a container step: a bundle key or an array element.
fn accessor(container: &Value, step: &Step) -> EvalResult<Option<Accessor>> {
    Ok(match (container, step) {
        (Value::Bundle(_), Step::Key(k)) => Some(Accessor::Key(k.clone())),
        (Value::Bundle(_), Step::Sub(args)) => match args.as_slice() {
            [SubArg::Str(k)] => Some(Accessor::Key(k.clone())),
            _ => None,
        },
        (Value::Array(a), Step::Sub(args)) => match args.as_slice() {
            [SubArg::Num(i)] => Some(Accessor::Elem(position(*i, a.len())?)),
            _ => None,
        },
        (other, Step::Key(_)) => return Err(type_mismatch("bundle", other.kind())),
        _ => None,
    })
}

fn write_into(
    slot: &mut Value,
    steps: &[Step],
    op: AssignOp,
    rhs: RhsValue<'_>,
    env: &mut Env<'_>,
) -> EvalResult<()> {
    let Some((step, rest)) = steps.split_first() else {
        let want = target_of(slot);
        let mut ctx = env.ctx(want);
        return update(slot, op, rhs, want, &mut ctx);
    };
    if rest.is_empty() {
        return write_leaf(slot, step, op, rhs, env);
    }
    let step = accessor(slot, step)?.ok_or_else(|| not_addressable(env.text.to_owned()))?;
    let inner = follow_mut(slot, &step)?;
    write_into(inner, rest, op, rhs, env)
}

/// The last step decides the kind of write.
fn write_leaf(
    slot: &mut Value,
    step: &Step,
    op: AssignOp,
    rhs: RhsValue<'_>,
    env: &mut Env<'_>,
) -> EvalResult<()> {
    if let Some(Accessor::Key(key)) = accessor(slot, step)? {
        let Value::Bundle(bundle) = slot else {
            unreachable!()
        };
        return write_member(bundle, &key, op, rhs, env);
    }
    let Step::Sub(args) = step else {
        return Err(not_addressable(env.text.to_owned()));
    };
    match slot {
        Value::Array(a) => write_element(a, args, op, rhs, env),
        Value::List(l) => write_list_elem(l, args, op, &rhs, env),
        Value::Str(s) => write_char(s, args, op, &rhs, env),
        Value::Matrix(m) => write_block(m, args, op, &rhs, env),
        Value::Series(values) => {
            let t = observation(env.ds, args)?;
            let x = numeric_element(rhs.operand(), op, env.text)?;
            values[t] = assign_calc(values[t], x, op, env.warnings);
            Ok(())
        }
        other => Err(type_mismatch("indexable value", other.kind())),
    }
}

/// `b.key` / `b["key"]`.
fn write_member(
    bundle: &mut Bundle,
    key: &str,
    op: AssignOp,
    rhs: RhsValue<'_>,
    env: &mut Env<'_>,
) -> EvalResult<()> {
    if op == AssignOp::Assign && rhs.value().is_undefined() {
        match empty_of(env.target) {
            Some(empty) => {
                bundle.insert(key, empty);
            }
            None => {
                bundle.remove(key);
            }
        }
        return Ok(());
    }
    if op.is_inflected() {
        let existing = bundle
            .get_mut(key)
            .ok_or_else(|| undefined_member(key.to_owned()))?;
        if op == AssignOp::Fill {
            return fill(existing, &rhs);
        }
        let mut ctx = env.ctx(target_of(existing));
        *existing = combine(existing, op, &rhs, &mut ctx)?;
        return Ok(());
    }
    let target = env.target;
    let rhs = conform(rhs, target, &env.ctx(target))?;
    match bundle.get_mut(key) {
        Some(existing) => rhs.store(existing),
        None => {
            bundle.insert(key, rhs.into_value());
        }
    }
    Ok(())
}

/// `a[i]` on an array.
fn write_element(
    array: &mut GArray,
    args: &[SubArg],
    op: AssignOp,
    rhs: RhsValue<'_>,
    env: &mut Env<'_>,
) -> EvalResult<()> {
    let [SubArg::Num(i)] = args else {
        return Err(not_addressable(env.text.to_owned()));
    };
    let p = position(*i, array.len())?;
    if op == AssignOp::Assign {
        let value = if rhs.value().is_undefined() {
            array
                .kind()
                .map(|k| k.empty_element())
                .ok_or_else(|| invalid_assignment(format!("{}: null element", env.text)))?
        } else {
            rhs.into_value()
        };
        return array.set(p, value);
    }
    let existing = array
        .get(p)
        .ok_or_else(|| undefined_member(env.text.to_owned()))?;
    let updated = if op == AssignOp::Fill {
        let mut v = existing.clone();
        fill(&mut v, &rhs)?;
        v
    } else {
        let mut ctx = env.ctx(target_of(existing));
        combine(existing, op, &rhs, &mut ctx)?
    };
    array.set(p, updated)
}

/// `L[i] = x`: the element becomes another series id.
fn write_list_elem(
    list: &mut List,
    args: &[SubArg],
    op: AssignOp,
    rhs: &RhsValue<'_>,
    env: &mut Env<'_>,
) -> EvalResult<()> {
    env.plain_only(op, "list elements")?;
    let [SubArg::Num(i)] = args else {
        return Err(not_addressable(env.text.to_owned()));
    };
    let p = position(*i, list.len())?;
    let sid = match rhs.operand() {
        Operand::Series(s) => s.id,
        other => other
            .scalar()
            .filter(|x| x.fract() == 0.0 && *x >= 0.0)
            .and_then(|x| SeriesId::from_index(x as usize)),
    }
    .filter(|sid| sid.index() < env.ds.num_series())
    .ok_or_else(|| type_mismatch("series or series id", rhs.kind()))?;
    list.set(p, sid);
    Ok(())
}

/// `s[i] = "c"`: replace one character.
fn write_char(
    s: &mut String,
    args: &[SubArg],
    op: AssignOp,
    rhs: &RhsValue<'_>,
    env: &mut Env<'_>,
) -> EvalResult<()> {
    env.plain_only(op, "string characters")?;
    let [SubArg::Num(i)] = args else {
        return Err(not_addressable(env.text.to_owned()));
    };
    let p = position(*i, s.chars().count())?;
    let Operand::Str(new) = rhs.operand() else {
        return Err(type_mismatch("string", rhs.kind()));
    };
    let mut chars = new.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return Err(invalid_assignment(format!(
            "{}: expected a single character",
            env.text
        )));
    };
    *s = s
        .chars()
        .enumerate()
        .map(|(j, old)| if j == p { c } else { old })
        .collect();
    Ok(())
}

/// `M[sel] op= x`. Inflected ops compute on the extracted block and splice
/// the result back.
fn write_block(
    m: &mut Matrix,
    args: &[SubArg],
    op: AssignOp,
    rhs: &RhsValue<'_>,
    env: &mut Env<'_>,
) -> EvalResult<()> {
    let sel = MatrixSel::resolve(args, m.shape())?;
    let mut ctx = env.ctx(TargetType::Matrix);
    let block = match op.binary() {
        None => {
            if op == AssignOp::Fill && !rhs.operand().is_scalar_like() {
                return Err(type_mismatch("scalar", rhs.kind()));
            }
            let operand = rhs.operand();
            as_matrix(operand, &ctx)
                .ok_or_else(|| type_mismatch("matrix", operand.kind()))?
                .into_owned()
        }
        Some(bop) => {
            let current = select::extract(m, &sel);
            let mut out = Value::Undefined;
            operators::binary(bop, Operand::Matrix(&current), rhs.operand(), &mut ctx, &mut out)?;
            match out {
                Value::Matrix(r) => r,
                Value::Scalar(x) => Matrix::scalar(x),
                other => return Err(type_mismatch("matrix", other.kind())),
            }
        }
    };
    select::splice(m, &sel, &block)
}
