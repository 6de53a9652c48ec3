//! Builtin and user-function calls.

use smallvec::SmallVec;

use genr_data::{UserVars, VarId};
use genr_ir::{ExprKind, NodeId, NodeRange, StrId};
use genr_value::errors::{
    arity_mismatch, invalid_assignment, not_addressable, recursion_limit, undefined_symbol,
    unknown_function,
};
use genr_value::{EvalError, EvalResult, Operand, SeriesId, Value};

use super::Evaluator;
use crate::aux::{AuxId, Views};
use crate::builtins::{Builtin, CallCtx};
use crate::context::{TargetType, Workspace};
use crate::function::{Param, UserFunction};
use crate::lhs::convert;
use crate::operators::OpCtx;

/// Caller storage lent to a `&x` parameter.
enum Lent {
    Var(VarId),
    Series(SeriesId),
}

impl Evaluator<'_> {
    pub(super) fn eval_call(&mut self, pos: NodeId, func: StrId, args: NodeRange) -> EvalResult<AuxId> {
        let arena = self.arena;
        let name = arena.str(func);
        if let Some(&builtin) = self.ws.builtins.get(name) {
            return self.call_builtin(pos, name, builtin, args);
        }
        if self.ws.functions.contains(name) {
            return self.call_user(pos, name, args);
        }
        Err(unknown_function(name))
    }

    /// Arguments are evaluated left to right, then checked against the
    /// signature before the routine runs.
    fn call_builtin(
        &mut self,
        pos: NodeId,
        name: &str,
        builtin: Builtin,
        args: NodeRange,
    ) -> EvalResult<AuxId> {
        let nodes: SmallVec<[NodeId; 4]> = self.arena.list(args).iter().copied().collect();
        let ids = self.eval_all(&nodes)?;
        self.compute(pos, |v, ctx, out| {
            let operands = ids
                .iter()
                .map(|&id| v.get(id))
                .collect::<EvalResult<SmallVec<[Operand<'_>; 4]>>>()?;
            builtin.signature.check(name, &operands)?;
            let mut call = CallCtx::new(ctx.ds, &mut *ctx.warnings);
            (builtin.func)(&operands, &mut call, out).map_err(|e| e.into_eval(name))
        })
    }

    #[tracing::instrument(level = "trace", skip(self, pos, args), fields(depth = self.ws.depth))]
    fn call_user(&mut self, pos: NodeId, name: &str, args: NodeRange) -> EvalResult<AuxId> {
        let limit = self.ws.config.depth_limit();
        if self.ws.depth >= limit {
            return Err(recursion_limit(limit));
        }
        let Some(mut func) = self.ws.functions.checkout(name) else {
            return Err(unknown_function(name));
        };
        let result = self.invoke(&mut func, args);
        self.ws.functions.checkin(func);
        let value = result.map_err(|e| e.with_note(format!("in function {name}")))?;
        self.compute(pos, |_, _, out| {
            *out = value;
            Ok(())
        })
    }

    fn invoke(&mut self, func: &mut UserFunction, args: NodeRange) -> EvalResult<Value> {
        let nodes: SmallVec<[NodeId; 4]> = self.arena.list(args).iter().copied().collect();
        let params = func.params().to_vec();
        if nodes.len() != params.len() {
            return Err(arity_mismatch(
                func.name(),
                params.len(),
                params.len(),
                nodes.len(),
            ));
        }

        let mut locals = UserVars::new();
        let mut lent: SmallVec<[(String, Lent); 2]> = SmallVec::new();
        let bound = self.bind_args(&params, &nodes, &mut locals, &mut lent);
        let result = match bound {
            Ok(()) => {
                std::mem::swap(&mut self.ws.vars, &mut locals);
                self.ws.depth += 1;
                let result = run_body(self.ws, func);
                self.ws.depth -= 1;
                std::mem::swap(&mut self.ws.vars, &mut locals);
                result
            }
            Err(e) => Err(e),
        };
        self.give_back(lent, &mut locals)?;
        result
    }

    fn bind_args(
        &mut self,
        params: &[Param],
        nodes: &[NodeId],
        locals: &mut UserVars,
        lent: &mut SmallVec<[(String, Lent); 2]>,
    ) -> EvalResult<()> {
        for (param, &node) in params.iter().zip(nodes) {
            if locals.lookup(&param.name).is_some() {
                return Err(invalid_assignment(format!(
                    "parameter `{}` is declared twice",
                    param.name
                )));
            }
            let value = if param.by_ref {
                let (value, from) = self.borrow_arg(param, node)?;
                lent.push((param.name.clone(), from));
                value
            } else {
                let id = self.eval(node)?;
                self.converted(id, param.ty)?
            };
            locals.insert(&param.name, value)?;
        }
        Ok(())
    }

    /// Move the caller's variable behind `&x` out for the call. A dataset
    /// series is copied and written back afterwards.
    fn borrow_arg(&mut self, param: &Param, node: NodeId) -> EvalResult<(Value, Lent)> {
        let ExprKind::Ref(target) = self.arena.kind(node) else {
            return Err(EvalError::new(format!(
                "argument `{}` must be passed as a pointer (&name)",
                param.name
            )));
        };
        let ExprKind::Ident(var) = self.arena.kind(target) else {
            return Err(not_addressable(self.arena.display(target)));
        };
        let var = self.arena.str(var);
        if let Some(vid) = self.ws.vars.lookup(var) {
            let value = self.ws.vars.take(vid).unwrap_or_default();
            return Ok((value, Lent::Var(vid)));
        }
        if let Some(sid) = self.ws.dataset.lookup(var) {
            let values = self.ws.dataset.values(sid).map(<[f64]>::to_vec).unwrap_or_default();
            return Ok((Value::Series(values), Lent::Series(sid)));
        }
        Err(undefined_symbol(var))
    }

    /// Put pointer arguments back where they came from.
    fn give_back(
        &mut self,
        lent: SmallVec<[(String, Lent); 2]>,
        locals: &mut UserVars,
    ) -> EvalResult<()> {
        let mut series_back = Vec::new();
        let mut lost = None;
        for (name, from) in lent {
            let Some(value) = locals.lookup(&name).and_then(|id| locals.take(id)) else {
                // Nothing to hand back; the caller's variable goes away.
                if let Lent::Var(vid) = from {
                    if let Some(var) = self.ws.vars.name_of(vid).map(str::to_owned) {
                        self.ws.vars.remove(&var)?;
                    }
                }
                lost.get_or_insert(name);
                continue;
            };
            match from {
                Lent::Var(vid) => self.ws.vars.restore(vid, value),
                Lent::Series(sid) => series_back.push((sid, value)),
            }
        }
        for (sid, value) in series_back {
            if let Value::Series(values) = value {
                if values.len() == self.ws.dataset.nobs() {
                    self.ws.dataset.series_mut(sid)?.values = values;
                }
            }
        }
        match lost {
            Some(name) => {
                Err(undefined_symbol(name).with_note("pointer argument was lost during the call"))
            }
            None => Ok(()),
        }
    }

    /// Copy node `id` converted to a parameter type.
    fn converted(&mut self, id: AuxId, ty: TargetType) -> EvalResult<Value> {
        let Workspace {
            dataset,
            vars,
            warnings,
            ..
        } = &mut *self.ws;
        let views = Views::new(self.cache, dataset, vars);
        let op = views.get(id)?;
        let series = op.series().and_then(|s| s.id);
        let ctx = OpCtx {
            ds: dataset,
            warnings,
            target: ty,
        };
        convert(op, series, ty, &ctx)
    }
}

/// Execute a function body in the current (callee) scope.
fn run_body(ws: &mut Workspace, func: &mut UserFunction) -> EvalResult<Value> {
    for stmt in func.body_mut() {
        stmt.execute(ws)?;
    }
    let Some((ty, ret)) = func.ret_mut() else {
        return Ok(Value::Undefined);
    };
    let value = ret.evaluate(ws)?;
    let ctx = OpCtx {
        ds: &ws.dataset,
        warnings: &mut ws.warnings,
        target: ty,
    };
    convert(value.as_operand(), None, ty, &ctx)
}
