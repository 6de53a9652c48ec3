//! Left-hand side resolution and assignment.
//!
//! The target of an assignment is resolved into a [`Place`]: a root (an
//! existing user variable, a dataset series, or a new name) plus member and
//! subscript steps. Subscript arguments are evaluated; the containers
//! themselves are not, so the write lands in the original storage and every
//! enclosing container sees it.

mod convert;
mod nested;
mod whole;

use smallvec::SmallVec;

use genr_data::VarId;
use genr_ir::{AssignOp, ExprKind, NodeId};
use genr_value::errors::{invalid_assignment, not_addressable, undefined_symbol};
use genr_value::{EvalResult, Operand, SeriesId, SeriesRef, Value, ValueKind};

use crate::aux::{AuxCache, AuxId, Handle, Payload, Views};
use crate::context::Workspace;
use crate::eval::{subscripts, Evaluator};
use crate::select::SubArg;

pub(crate) use convert::convert;

/// Where an assignment starts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Root {
    Var(VarId),
    Series(SeriesId),
    /// Name not yet defined.
    New(String),
}

/// One step from a container into its contents.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Step {
    /// `b.key`
    Key(String),
    /// `x[...]`
    Sub(SmallVec<[SubArg; 2]>),
}

/// A resolved assignment target.
#[derive(Clone, Debug)]
pub(crate) struct Place {
    pub root: Root,
    pub steps: SmallVec<[Step; 2]>,
    /// Surface text of the target, for messages.
    pub text: String,
}

impl Place {
    /// Resolve the target tree at `lhs`.
    pub fn resolve(ev: &mut Evaluator<'_>, lhs: NodeId) -> EvalResult<Place> {
        let text = ev.arena.display(lhs);
        let mut steps = SmallVec::new();
        let root = resolve_into(ev, lhs, &mut steps)?;
        if let Root::New(name) = &root {
            if !steps.is_empty() {
                return Err(undefined_symbol(name.clone()));
            }
        }
        Ok(Place { root, steps, text })
    }
}

fn resolve_into(
    ev: &mut Evaluator<'_>,
    node: NodeId,
    steps: &mut SmallVec<[Step; 2]>,
) -> EvalResult<Root> {
    match ev.arena.kind(node) {
        ExprKind::Ident(name) => {
            let name = ev.arena.str(name);
            Ok(if let Some(vid) = ev.ws.vars.lookup(name) {
                Root::Var(vid)
            } else if let Some(sid) = ev.ws.dataset.lookup(name) {
                Root::Series(sid)
            } else {
                Root::New(name.to_owned())
            })
        }
        ExprKind::Index { base, args } => {
            let root = resolve_into(ev, base, steps)?;
            let subs = subscripts(ev, args)?;
            steps.push(Step::Sub(subs));
            Ok(root)
        }
        ExprKind::Member { base, key } => {
            let root = resolve_into(ev, base, steps)?;
            steps.push(Step::Key(ev.arena.str(key).to_owned()));
            Ok(root)
        }
        _ => Err(not_addressable(ev.arena.display(node))),
    }
}

/// Right-hand side value as the resolver sees it: either still inside its
/// cache node (copied on store) or detached and owned (moved on store).
pub(crate) enum Rhs<'c> {
    Cached(&'c Value),
    Detached(Value),
}

/// A right-hand side together with the dataset identity of a series value.
pub(crate) struct RhsValue<'c> {
    pub value: Rhs<'c>,
    pub series: Option<SeriesId>,
}

impl<'c> RhsValue<'c> {
    pub fn detached(value: Value) -> Self {
        Self {
            value: Rhs::Detached(value),
            series: None,
        }
    }

    /// Read node `id`. Borrowed payloads alias workspace storage that the
    /// assignment may be about to write, so they are copied out.
    pub fn read(cache: &'c AuxCache, ws: &Workspace, id: AuxId) -> EvalResult<Self> {
        let views = Views::new(cache, &ws.dataset, &ws.vars);
        if let Some(node) = cache.node(id) {
            if let Payload::Owned(v) = &node.payload {
                return Ok(Self {
                    value: Rhs::Cached(v),
                    series: None,
                });
            }
        }
        let series = match views.handle(id) {
            Some(Handle::Series(sid)) => Some(*sid),
            _ => None,
        };
        Ok(Self {
            value: Rhs::Detached(views.get(id)?.to_value()),
            series,
        })
    }

    pub fn value(&self) -> &Value {
        match &self.value {
            Rhs::Cached(v) => v,
            Rhs::Detached(v) => v,
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.value().kind()
    }

    /// Operand view; a dataset series keeps its id.
    pub fn operand(&self) -> Operand<'_> {
        match self.value().as_operand() {
            Operand::Series(s) => Operand::Series(SeriesRef {
                id: self.series,
                ..s
            }),
            other => other,
        }
    }

    pub fn into_value(self) -> Value {
        match self.value {
            Rhs::Cached(v) => v.clone(),
            Rhs::Detached(v) => v,
        }
    }

    /// Write into `slot`, reusing its storage when copying.
    pub fn store(self, slot: &mut Value) {
        match self.value {
            Rhs::Cached(v) => slot.copy_from(v),
            Rhs::Detached(v) => *slot = v,
        }
    }
}

/// Perform `lhs op rhs`.
///
/// `rhs` is `None` only for `++`/`--`. With `donate`, an owned result is
/// moved out of the cache instead of copied.
#[tracing::instrument(level = "trace", skip(ev, rhs), fields(lhs = %ev.arena.display(lhs)))]
pub(crate) fn assign(
    ev: &mut Evaluator<'_>,
    lhs: NodeId,
    op: AssignOp,
    rhs: Option<AuxId>,
    donate: bool,
) -> EvalResult<()> {
    let place = Place::resolve(ev, lhs)?;
    let target = ev.target;

    let rhs = match rhs {
        None if op.is_unary() => RhsValue::detached(Value::Scalar(1.0)),
        None => return Err(invalid_assignment(format!("{} needs a value", op.as_symbol()))),
        Some(id) => match donate.then(|| ev.cache.take_owned(id)).flatten() {
            Some(v) => RhsValue::detached(v),
            None => RhsValue::read(ev.cache, ev.ws, id)?,
        },
    };

    if place.steps.is_empty() {
        whole::write(ev.ws, &place, op, rhs, target)
    } else {
        nested::write(ev.ws, &place, op, rhs, target)
    }
}
