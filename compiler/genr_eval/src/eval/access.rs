//! Subscripts, members and lags on the right-hand side.

use smallvec::SmallVec;

use genr_data::Dataset;
use genr_ir::{ExprKind, NodeId, NodeRange, StrId};
use genr_value::errors::{type_mismatch, undefined_member};
use genr_value::{EvalResult, List, Matrix, Operand, Value, ValueKind, NA};

use super::Evaluator;
use crate::aux::{Accessor, AuxId, Handle, NodeFlags};
use crate::operators::numeric::fill_series;
use crate::select::{self, position, range, MatrixSel, SubArg};

/// Evaluated subscript arguments.
pub(crate) type SubArgs = SmallVec<[SubArg; 2]>;

/// Evaluate the arguments of a subscript.
pub(crate) fn subscripts(ev: &mut Evaluator<'_>, args: NodeRange) -> EvalResult<SubArgs> {
    let nodes: SmallVec<[NodeId; 2]> = ev.arena.list(args).iter().copied().collect();
    let mut out = SubArgs::new();
    for node in nodes {
        let arg = match ev.arena.kind(node) {
            ExprKind::All => SubArg::All,
            ExprKind::Dummy(d) => SubArg::Dummy(d),
            ExprKind::Range(lo, hi) => {
                let lo = ev.eval(lo)?;
                let hi = ev.eval(hi)?;
                let bound = |op: Operand<'_>| {
                    op.scalar()
                        .ok_or_else(|| type_mismatch("scalar range bound", op.kind()))
                };
                SubArg::Range(bound(ev.operand(lo)?)?, bound(ev.operand(hi)?)?)
            }
            _ => {
                let id = ev.eval(node)?;
                match ev.operand(id)? {
                    op if op.is_scalar_like() => SubArg::Num(op.scalar().unwrap_or(NA)),
                    Operand::Str(s) => SubArg::Str(s.to_owned()),
                    Operand::Matrix(m) => SubArg::Matrix(m.clone()),
                    other => return Err(type_mismatch("index", other.kind())),
                }
            }
        };
        out.push(arg);
    }
    Ok(out)
}

/// Accessor addressing a bundle member or array element, if `subs` is one.
fn accessor(base: Operand<'_>, subs: &[SubArg]) -> EvalResult<Option<Accessor>> {
    Ok(match (base, subs) {
        (Operand::Bundle(_), [SubArg::Str(k)]) => Some(Accessor::Key(k.clone())),
        (Operand::Array(a), [SubArg::Num(i)]) => Some(Accessor::Elem(position(*i, a.len())?)),
        _ => None,
    })
}

/// A list read from a bundle whose ids no longer name series.
fn is_stale_list(value: Operand<'_>, ds: &Dataset) -> bool {
    match value {
        Operand::List(l) => l.ids().iter().any(|id| id.index() >= ds.num_series()),
        _ => false,
    }
}

fn stale_list_as_matrix(l: &List) -> Matrix {
    tracing::debug!(len = l.len(), "list with stale series ids read back as a vector");
    Matrix::column(l.ids().iter().map(|id| f64::from(id.raw())).collect())
}

impl Evaluator<'_> {
    pub(super) fn eval_index(
        &mut self,
        pos: NodeId,
        base: NodeId,
        args: NodeRange,
    ) -> EvalResult<AuxId> {
        let b = self.eval(base)?;
        let subs = subscripts(self, args)?;
        self.access(pos, b, subs)
    }

    pub(super) fn eval_member(&mut self, pos: NodeId, base: NodeId, key: StrId) -> EvalResult<AuxId> {
        let b = self.eval(base)?;
        let key = self.arena.str(key).to_owned();
        let subs: SubArgs = std::iter::once(SubArg::Str(key)).collect();
        if let op @ (Operand::Matrix(_) | Operand::Scalar(_) | Operand::Series(_)) =
            self.operand(b)?
        {
            return Err(type_mismatch("bundle for `.` member access", op.kind()));
        }
        self.access(pos, b, subs)
    }

    fn access(&mut self, pos: NodeId, b: AuxId, subs: SubArgs) -> EvalResult<AuxId> {
        let base = self.operand(b)?;

        // `L[i]` is the series itself.
        if let (Operand::List(l), [SubArg::Num(i)]) = (base, subs.as_slice()) {
            let sid = l.ids()[position(*i, l.len())?];
            return Ok(self
                .cache
                .bind(pos, Handle::Series(sid), ValueKind::Series, NodeFlags::PRIMARY));
        }

        // Members and elements of a stored container are live aliases.
        if let Some(step) = accessor(base, &subs)? {
            let root_path = match self.views().handle(b) {
                Some(Handle::Var(root)) => Some((*root, SmallVec::new())),
                Some(Handle::Member { root, path }) => Some((*root, path.clone())),
                _ => None,
            };
            if let Some((root, mut path)) = root_path {
                path.push(step);
                let handle = Handle::Member { root, path };
                let value = self.views().resolve(&handle)?;
                if !is_stale_list(value, &self.ws.dataset) {
                    let kind = value.kind();
                    return Ok(self.cache.bind(pos, handle, kind, NodeFlags::MUTABLE_MEMBER));
                }
            }
        }

        self.compute(pos, |v, ctx, out| {
            let base = v.get(b)?;
            index_value(base, &subs, ctx.ds, out)
        })
    }

    pub(super) fn eval_lag(&mut self, pos: NodeId, base: NodeId, lag: NodeId) -> EvalResult<AuxId> {
        let b = self.eval(base)?;
        let k = self.eval(lag)?;
        let offset = match self.operand(k)?.scalar() {
            Some(x) if x.fract() == 0.0 => x as i64,
            Some(x) => return Err(genr_value::errors::domain_error(format!("lag {x}"))),
            None => return Err(type_mismatch("scalar lag", self.operand(k)?.kind())),
        };
        self.compute(pos, |v, ctx, out| {
            let Operand::Series(s) = v.get(b)? else {
                return Err(type_mismatch("series for lag", v.get(b)?.kind()));
            };
            let ds = ctx.ds;
            fill_series(ctx, out, |t, _| match ds.lag_source(t, offset) {
                Some(src) => s.values[src],
                None => NA,
            });
            Ok(())
        })
    }
}

/// `base[subs]` for a value that is not aliased.
fn index_value(base: Operand<'_>, subs: &[SubArg], ds: &Dataset, out: &mut Value) -> EvalResult<()> {
    match base {
        Operand::Series(s) => {
            let t = match subs {
                [SubArg::Num(i)] => position(*i, s.values.len())?,
                [SubArg::Str(label)] => ds
                    .find_obs(label)
                    .ok_or_else(|| undefined_member(label.clone()))?,
                _ => return Err(type_mismatch("observation index", ValueKind::Series)),
            };
            out.set_scalar(s.values[t]);
        }
        Operand::Scalar(x) => {
            let m = Matrix::scalar(x);
            matrix_select(&m, subs, out)?;
        }
        Operand::Matrix(m) => matrix_select(m, subs, out)?,
        Operand::List(l) => match subs {
            [SubArg::Range(lo, hi)] => {
                let (lo, hi) = range(*lo, *hi, l.len())?;
                *out.list_buf() = List::from_ids(l.ids()[lo..=hi].to_vec());
            }
            _ => return Err(type_mismatch("list index", ValueKind::List)),
        },
        Operand::Str(s) => {
            let n = s.chars().count();
            let (lo, hi) = match subs {
                [SubArg::Num(i)] => {
                    let p = position(*i, n)?;
                    (p, p)
                }
                [SubArg::Range(lo, hi)] => range(*lo, *hi, n)?,
                _ => return Err(type_mismatch("string index", ValueKind::Str)),
            };
            out.string_buf().push_str(&select::substring(s, lo, hi));
        }
        Operand::Array(a) => match subs {
            [SubArg::Num(i)] => {
                let p = position(*i, a.len())?;
                if let Some(v) = a.get(p) {
                    out.copy_from(v);
                }
            }
            [SubArg::Range(lo, hi)] => {
                let (lo, hi) = range(*lo, *hi, a.len())?;
                *out = Value::Array(a.slice(lo, hi));
            }
            _ => return Err(type_mismatch("array index", ValueKind::Array)),
        },
        Operand::Bundle(b) => match subs {
            [SubArg::Str(k)] => {
                let member = b.get(k).ok_or_else(|| undefined_member(k.clone()))?;
                if is_stale_list(member.as_operand(), ds) {
                    if let Value::List(l) = member {
                        *out = Value::Matrix(stale_list_as_matrix(l));
                    }
                } else {
                    out.copy_from(member);
                }
            }
            _ => return Err(type_mismatch("string key", ValueKind::Bundle)),
        },
        Operand::Undefined => return Err(type_mismatch("indexable value", ValueKind::Undefined)),
    }
    Ok(())
}

fn matrix_select(m: &Matrix, subs: &[SubArg], out: &mut Value) -> EvalResult<()> {
    let sel = MatrixSel::resolve(subs, m.shape())?;
    let block = select::extract(m, &sel);
    match sel {
        MatrixSel::Block { single: true, .. } if !block.is_complex() => {
            out.set_scalar(block.at(0));
        }
        _ => match out {
            Value::Matrix(dst) => dst.copy_from(&block),
            other => *other = Value::Matrix(block),
        },
    }
    Ok(())
}
