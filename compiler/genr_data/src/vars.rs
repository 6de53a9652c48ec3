//! Named user variables (everything that is not a series).

use std::fmt;

use rustc_hash::FxHashMap;

use genr_value::Value;

use crate::error::DataError;
use crate::is_valid_name;

/// Stable slot of a user variable. Replacing a variable's value keeps its id;
/// removing it retires the id.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarId({})", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct UserVar {
    pub name: String,
    pub value: Value,
}

/// Variable table.
#[derive(Clone, Debug, Default)]
pub struct UserVars {
    slots: Vec<Option<UserVar>>,
    index: FxHashMap<String, VarId>,
    epoch: u64,
}

impl UserVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: VarId) -> Option<&Value> {
        self.slot(id).map(|v| &v.value)
    }

    pub fn get_mut(&mut self, id: VarId) -> Option<&mut Value> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .map(|v| &mut v.value)
    }

    pub fn name_of(&self, id: VarId) -> Option<&str> {
        self.slot(id).map(|v| v.name.as_str())
    }

    /// Value of the variable called `name`.
    pub fn by_name(&self, name: &str) -> Option<&Value> {
        self.lookup(name).and_then(|id| self.get(id))
    }

    fn slot(&self, id: VarId) -> Option<&UserVar> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Define or replace `name`. Replacement keeps the id.
    pub fn insert(&mut self, name: &str, value: Value) -> Result<VarId, DataError> {
        if let Some(id) = self.lookup(name) {
            if let Some(slot) = self.get_mut(id) {
                *slot = value;
            }
            return Ok(id);
        }
        if !is_valid_name(name) {
            return Err(DataError::InvalidName {
                name: name.to_owned(),
            });
        }
        let raw = u32::try_from(self.slots.len()).map_err(|_| DataError::BadStructure {
            message: "too many variables".to_owned(),
        })?;
        let id = VarId(raw);
        self.slots.push(Some(UserVar {
            name: name.to_owned(),
            value,
        }));
        self.index.insert(name.to_owned(), id);
        Ok(id)
    }

    pub fn remove(&mut self, name: &str) -> Result<Value, DataError> {
        let id = self.index.remove(name).ok_or_else(|| DataError::UnknownVar {
            name: name.to_owned(),
        })?;
        let var = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| DataError::UnknownVar {
                name: name.to_owned(),
            })?;
        self.epoch += 1;
        tracing::debug!(var = name, epoch = self.epoch, "user variable removed");
        Ok(var.value)
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), DataError> {
        if !is_valid_name(new) {
            return Err(DataError::InvalidName {
                name: new.to_owned(),
            });
        }
        if self.index.contains_key(new) {
            return Err(DataError::DuplicateName {
                name: new.to_owned(),
            });
        }
        let id = self.index.remove(old).ok_or_else(|| DataError::UnknownVar {
            name: old.to_owned(),
        })?;
        if let Some(var) = self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            var.name = new.to_owned();
        }
        self.index.insert(new.to_owned(), id);
        self.epoch += 1;
        Ok(())
    }

    /// Move a value out, leaving `Undefined` in its slot.
    pub fn take(&mut self, id: VarId) -> Option<Value> {
        self.get_mut(id).map(std::mem::take)
    }

    /// Put back a value moved out with [`take`](Self::take).
    pub fn restore(&mut self, id: VarId, value: Value) {
        if let Some(slot) = self.get_mut(id) {
            *slot = value;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &UserVar)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (VarId(i as u32), v)))
    }

    /// Identity counter; changes on remove and rename.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
