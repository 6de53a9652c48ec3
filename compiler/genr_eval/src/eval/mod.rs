//! The tree walker.
//!
//! [`Evaluator::eval`] maps a tree position to the cache node holding its
//! value. Children are evaluated first, then the position's own node is
//! fetched from the cache and the operator writes into it in place.

mod access;
mod call;
mod literal;

use genr_ir::{BinaryOp, ExprArena, ExprKind, NodeId, StrId};
use genr_value::errors::undefined_symbol;
use genr_value::na::truth;
use genr_value::{EvalError, EvalResult, Operand, Value, ValueKind};

use crate::aux::{AuxCache, AuxId, Handle, NodeFlags, Views};
use crate::context::{TargetType, Workspace};
use crate::operators::{self, OpCtx};
use crate::unary::unary;

pub(crate) use access::subscripts;

/// Space that must be left before descending one more tree level.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 128 * 1024;

/// Size of each heap segment the walk continues on once the red zone is hit.
#[cfg(not(target_arch = "wasm32"))]
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Run one level of the walk, moving to a fresh stack segment first when
/// the current one is nearly used up.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
fn with_headroom<R>(level: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, level)
}

#[inline]
#[cfg(target_arch = "wasm32")]
fn with_headroom<R>(level: impl FnOnce() -> R) -> R {
    level()
}

/// One walk over one statement's tree.
pub(crate) struct Evaluator<'a> {
    pub arena: &'a ExprArena,
    pub cache: &'a mut AuxCache,
    pub ws: &'a mut Workspace,
    pub target: TargetType,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        arena: &'a ExprArena,
        cache: &'a mut AuxCache,
        ws: &'a mut Workspace,
        target: TargetType,
    ) -> Self {
        Self {
            arena,
            cache,
            ws,
            target,
        }
    }

    pub fn views(&self) -> Views<'_> {
        Views::new(self.cache, &self.ws.dataset, &self.ws.vars)
    }

    /// Current value of a node.
    pub fn operand(&self, id: AuxId) -> EvalResult<Operand<'_>> {
        self.views().get(id)
    }

    /// Evaluate the subtree at `pos`.
    #[tracing::instrument(level = "trace", skip(self), fields(expr = %self.arena.display(pos)))]
    pub fn eval(&mut self, pos: NodeId) -> EvalResult<AuxId> {
        with_headroom(|| self.eval_node(pos))
    }

    fn eval_node(&mut self, pos: NodeId) -> EvalResult<AuxId> {
        match self.arena.kind(pos) {
            ExprKind::Num(x) => Ok(self.cache.primary(pos, || Value::Scalar(x))),
            ExprKind::Str(s) => {
                let arena = self.arena;
                Ok(self.cache.primary(pos, || Value::string(arena.str(s))))
            }
            ExprKind::Null => Ok(self.cache.primary(pos, || Value::Undefined)),
            ExprKind::Ident(name) => self.eval_ident(pos, name),

            ExprKind::Unary(op, x) => {
                let a = self.eval(x)?;
                self.compute(pos, |v, ctx, out| unary(op, v.get(a)?, ctx, out))
            }
            ExprKind::Binary(op, l, r) if op.is_logical() => self.eval_logical(pos, op, l, r),
            ExprKind::Binary(op, l, r) => {
                let a = self.eval(l)?;
                let b = self.eval(r)?;
                self.compute(pos, |v, ctx, out| {
                    operators::binary(op, v.get(a)?, v.get(b)?, ctx, out)
                })
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => self.eval_ternary(pos, cond, then_branch, else_branch),

            ExprKind::Call { func, args } => self.eval_call(pos, func, args),
            ExprKind::MatrixLit(rows) => self.eval_matrix_lit(pos, rows),
            ExprKind::ListLit(elems) => self.eval_list_lit(pos, elems),
            ExprKind::BundleLit(pairs) => self.eval_bundle_lit(pos, pairs),
            ExprKind::ArrayLit(elems) => self.eval_array_lit(pos, elems),

            ExprKind::Index { base, args } => self.eval_index(pos, base, args),
            ExprKind::Member { base, key } => self.eval_member(pos, base, key),
            ExprKind::Lag { base, lag } => self.eval_lag(pos, base, lag),

            ExprKind::Dummy(_) | ExprKind::All | ExprKind::Range(..) => Err(EvalError::new(
                format!("`{}` is only valid inside a subscript", self.arena.display(pos)),
            )),
            ExprKind::MatrixRow(_) => Err(EvalError::new("matrix row outside a matrix literal")),
            ExprKind::Ref(_) => Err(EvalError::new(format!(
                "`{}`: pointers are only valid as function arguments",
                self.arena.display(pos)
            ))),
        }
    }

    /// Run `f` against the position's own node.
    ///
    /// The node's value is moved out for the duration of `f` so that `f` can
    /// write it while reading any other node through the views.
    pub fn compute(
        &mut self,
        pos: NodeId,
        f: impl FnOnce(&Views<'_>, &mut OpCtx<'_>, &mut Value) -> EvalResult<()>,
    ) -> EvalResult<AuxId> {
        let id = self.cache.get_aux(pos);
        let mut out = self.cache.lend(id);
        let result = {
            let Workspace {
                dataset,
                vars,
                warnings,
                ..
            } = &mut *self.ws;
            let views = Views::new(self.cache, dataset, vars);
            let mut ctx = OpCtx {
                ds: dataset,
                warnings,
                target: self.target,
            };
            f(&views, &mut ctx, &mut out)
        };
        self.cache.restore(id, out);
        result.map(|()| id)
    }

    /// Rebind a variable reference by name: user variables first, then
    /// dataset series.
    fn eval_ident(&mut self, pos: NodeId, name: StrId) -> EvalResult<AuxId> {
        let name = self.arena.str(name);
        let (handle, kind) = if let Some(vid) = self.ws.vars.lookup(name) {
            let kind = self.ws.vars.get(vid).map_or(ValueKind::Undefined, Value::kind);
            (Handle::Var(vid), kind)
        } else if let Some(sid) = self.ws.dataset.lookup(name) {
            (Handle::Series(sid), ValueKind::Series)
        } else {
            return Err(undefined_symbol(name));
        };
        Ok(self.cache.bind(pos, handle, kind, NodeFlags::PRIMARY))
    }

    /// `&&` and `||`. A scalar left operand that already decides the result
    /// skips the right operand.
    fn eval_logical(
        &mut self,
        pos: NodeId,
        op: BinaryOp,
        l: NodeId,
        r: NodeId,
    ) -> EvalResult<AuxId> {
        let a = self.eval(l)?;
        if let Operand::Scalar(x) = self.operand(a)? {
            let decided = match (op, truth(x)) {
                (BinaryOp::And, Some(false)) => Some(0.0),
                (BinaryOp::Or, Some(true)) => Some(1.0),
                _ => None,
            };
            if let Some(result) = decided {
                tracing::trace!(op = op.as_symbol(), "short circuit");
                if x == result {
                    return Ok(self.cache.link_ephemeral(pos, a));
                }
                return self.compute(pos, |_, _, out| {
                    out.set_scalar(result);
                    Ok(())
                });
            }
        }
        let b = self.eval(r)?;
        self.compute(pos, |v, ctx, out| {
            operators::binary(op, v.get(a)?, v.get(b)?, ctx, out)
        })
    }
}
