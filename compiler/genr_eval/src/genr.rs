//! Statements.
//!
//! A [`Genr`] is one `lhs op rhs` statement (or a bare expression) together
//! with the aux cache of its tree. A compiled statement keeps its cache
//! between executions; an uncompiled one clears it after every run and hands
//! its result to the assignment target without copying.

use std::fmt;
use std::sync::Arc;

use genr_ir::{AssignOp, ExprArena, NodeId};
use genr_value::{EvalResult, Value};

use crate::aux::{AuxCache, CacheStats, Stamp};
use crate::context::{TargetType, Workspace};
use crate::eval::Evaluator;
use crate::lhs;

#[derive(Clone)]
pub struct Genr {
    arena: Arc<ExprArena>,
    lhs: Option<NodeId>,
    op: AssignOp,
    rhs: Option<NodeId>,
    target: TargetType,
    compiled: bool,
    cache: AuxCache,
}

impl Genr {
    /// `lhs op rhs`; `rhs` is `None` for `++`/`--`.
    pub fn assign(arena: Arc<ExprArena>, lhs: NodeId, op: AssignOp, rhs: Option<NodeId>) -> Self {
        Self {
            arena,
            lhs: Some(lhs),
            op,
            rhs,
            target: TargetType::Any,
            compiled: false,
            cache: AuxCache::new(),
        }
    }

    /// A bare expression; [`evaluate`](Self::evaluate) returns its value.
    pub fn expression(arena: Arc<ExprArena>, root: NodeId) -> Self {
        Self {
            arena,
            lhs: None,
            op: AssignOp::Assign,
            rhs: Some(root),
            target: TargetType::Any,
            compiled: false,
            cache: AuxCache::new(),
        }
    }

    /// Declared type of the target (`matrix m = ...`).
    #[must_use]
    pub fn with_target(mut self, target: TargetType) -> Self {
        self.target = target;
        self
    }

    /// Keep the aux cache between executions.
    #[must_use]
    pub fn compiled(mut self, compiled: bool) -> Self {
        self.compiled = compiled;
        self
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    pub fn target(&self) -> TargetType {
        self.target
    }

    pub fn cache(&self) -> &AuxCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Same statement with an empty cache.
    #[must_use]
    pub fn fresh_copy(&self) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
            lhs: self.lhs,
            op: self.op,
            rhs: self.rhs,
            target: self.target,
            compiled: self.compiled,
            cache: AuxCache::new(),
        }
    }

    /// Surface text of the statement.
    pub fn text(&self) -> String {
        let rhs = self.rhs.map(|r| self.arena.display(r));
        match (self.lhs, rhs) {
            (Some(l), Some(r)) => format!("{} {} {r}", self.arena.display(l), self.op.as_symbol()),
            (Some(l), None) => format!("{}{}", self.arena.display(l), self.op.as_symbol()),
            (None, Some(r)) => r,
            (None, None) => String::new(),
        }
    }

    /// Run the statement.
    pub fn execute(&mut self, ws: &mut Workspace) -> EvalResult<()> {
        self.run(ws, false).map(drop)
    }

    /// Run the statement and return the value of a bare expression;
    /// assignments give `Undefined`.
    pub fn evaluate(&mut self, ws: &mut Workspace) -> EvalResult<Value> {
        self.run(ws, true)
    }

    #[tracing::instrument(level = "trace", skip_all, fields(stmt = %self.text()))]
    fn run(&mut self, ws: &mut Workspace, want_value: bool) -> EvalResult<Value> {
        self.cache.validate(Stamp {
            nobs: ws.dataset.nobs(),
            dataset_epoch: ws.dataset.epoch(),
            vars_epoch: ws.vars.epoch(),
        });
        let result = self.walk(ws, want_value);
        if self.compiled && result.is_ok() {
            self.cache.finish_pass();
        } else {
            self.cache.clear();
        }
        let value = result.map_err(|e| e.with_note(format!("in statement: {}", self.text())))?;
        ws.check_warnings()?;
        Ok(value)
    }

    fn walk(&mut self, ws: &mut Workspace, want_value: bool) -> EvalResult<Value> {
        let donate = !self.compiled;
        let mut ev = Evaluator::new(&self.arena, &mut self.cache, ws, self.target);
        let rhs = match self.rhs {
            Some(node) => Some(ev.eval(node)?),
            None => None,
        };
        if let Some(lhs) = self.lhs {
            lhs::assign(&mut ev, lhs, self.op, rhs, donate)?;
            return Ok(Value::Undefined);
        }
        match rhs {
            Some(id) if want_value => {
                if donate {
                    if let Some(value) = ev.cache.take_owned(id) {
                        return Ok(value);
                    }
                }
                Ok(ev.operand(id)?.to_value())
            }
            _ => Ok(Value::Undefined),
        }
    }
}

impl fmt::Debug for Genr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Genr")
            .field("text", &self.text())
            .field("target", &self.target)
            .field("compiled", &self.compiled)
            .field("live_nodes", &self.cache.live_nodes())
            .finish()
    }
}

impl Workspace {
    /// Build a statement, compiled according to [`EvalConfig::compile`].
    ///
    /// [`EvalConfig::compile`]: crate::context::EvalConfig::compile
    pub fn statement(
        &self,
        arena: Arc<ExprArena>,
        lhs: Option<NodeId>,
        op: AssignOp,
        rhs: Option<NodeId>,
    ) -> Genr {
        let genr = match (lhs, rhs) {
            (Some(lhs), rhs) => Genr::assign(arena, lhs, op, rhs),
            (None, Some(root)) => Genr::expression(arena, root),
            (None, None) => Genr {
                arena,
                lhs: None,
                op,
                rhs: None,
                target: TargetType::Any,
                compiled: false,
                cache: AuxCache::new(),
            },
        };
        genr.compiled(self.config.compiles())
    }
}
