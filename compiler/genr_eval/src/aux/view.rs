//! Reading node values wherever they live.

use genr_data::{Dataset, UserVars};
use genr_value::errors::{index_out_of_bounds, type_mismatch, undefined_member, undefined_symbol};
use genr_value::{EvalResult, Operand, SeriesRef, Value, ValueKind};

use super::{Accessor, AuxCache, AuxId, Handle, Payload};

/// Read-only access to node values: owned payloads from the cache, borrowed
/// payloads resolved against the dataset and the variable table.
#[derive(Copy, Clone)]
pub(crate) struct Views<'a> {
    pub cache: &'a AuxCache,
    pub ds: &'a Dataset,
    pub vars: &'a UserVars,
}

impl<'a> Views<'a> {
    pub fn new(cache: &'a AuxCache, ds: &'a Dataset, vars: &'a UserVars) -> Self {
        Self { cache, ds, vars }
    }

    /// Current value of node `id`.
    ///
    /// Borrowed nodes are re-resolved on every read and fail if the storage
    /// has been removed or has changed kind since it was bound.
    pub fn get(&self, id: AuxId) -> EvalResult<Operand<'a>> {
        let node = self
            .cache
            .node(id)
            .ok_or_else(|| undefined_symbol(format!("{id:?}")))?;
        match &node.payload {
            Payload::Owned(v) => Ok(v.as_operand()),
            Payload::Borrowed(handle) => {
                let op = self.resolve(handle)?;
                let bound = node.bound_kind();
                if bound != ValueKind::Undefined && op.kind() != bound {
                    return Err(type_mismatch(bound.to_string(), op.kind())
                        .with_note("value changed type during evaluation"));
                }
                Ok(op)
            }
        }
    }

    pub fn handle(&self, id: AuxId) -> Option<&'a Handle> {
        match &self.cache.node(id)?.payload {
            Payload::Borrowed(h) => Some(h),
            Payload::Owned(_) => None,
        }
    }

    pub fn resolve(&self, handle: &Handle) -> EvalResult<Operand<'a>> {
        match handle {
            Handle::Series(sid) => {
                let s = self
                    .ds
                    .series(*sid)
                    .ok_or_else(|| undefined_symbol(sid.to_string()))?;
                Ok(Operand::Series(SeriesRef {
                    values: &s.values,
                    strings: s.strings.as_ref(),
                    id: Some(*sid),
                }))
            }
            Handle::Var(vid) => self
                .vars
                .get(*vid)
                .map(Value::as_operand)
                .ok_or_else(|| undefined_symbol(format!("{vid:?}"))),
            Handle::Member { root, path } => {
                let mut value = self
                    .vars
                    .get(*root)
                    .ok_or_else(|| undefined_symbol(format!("{root:?}")))?;
                for step in path {
                    value = follow(value, step)?;
                }
                Ok(value.as_operand())
            }
        }
    }
}

/// One accessor step on a stored value.
pub(crate) fn follow<'v>(value: &'v Value, step: &Accessor) -> EvalResult<&'v Value> {
    match (value, step) {
        (Value::Bundle(b), Accessor::Key(k)) => b.get(k).ok_or_else(|| undefined_member(k.clone())),
        (Value::Array(a), Accessor::Elem(i)) => a
            .get(*i)
            .ok_or_else(|| index_out_of_bounds(*i as i64 + 1, a.len())),
        (other, Accessor::Key(_)) => Err(type_mismatch("bundle", other.kind())),
        (other, Accessor::Elem(_)) => Err(type_mismatch("array", other.kind())),
    }
}

/// Mutable counterpart of [`follow`].
pub(crate) fn follow_mut<'v>(value: &'v mut Value, step: &Accessor) -> EvalResult<&'v mut Value> {
    match (value, step) {
        (Value::Bundle(b), Accessor::Key(k)) => {
            b.get_mut(k).ok_or_else(|| undefined_member(k.clone()))
        }
        (Value::Array(a), Accessor::Elem(i)) => {
            let len = a.len();
            a.get_mut(*i)
                .ok_or_else(|| index_out_of_bounds(*i as i64 + 1, len))
        }
        (other, Accessor::Key(_)) => Err(type_mismatch("bundle", other.kind())),
        (other, Accessor::Elem(_)) => Err(type_mismatch("array", other.kind())),
    }
}
