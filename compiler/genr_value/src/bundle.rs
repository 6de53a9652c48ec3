//! Bundles: ordered name → value maps.

use indexmap::IndexMap;

use crate::value::Value;

/// Associative container preserving insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bundle {
    members: IndexMap<String, Value>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.members.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }

    /// Insert or replace a member, returning the old value.
    ///
    /// Replacing keeps the member's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.members.insert(key.into(), value)
    }

    /// Remove a member, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.members.shift_remove(key)
    }

    /// Mutable slot for `key`, created as `Undefined` when missing.
    pub fn entry(&mut self, key: &str) -> &mut Value {
        self.members.entry(key.to_owned()).or_default()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Members of `self` plus members of `other` whose keys are not in
    /// `self`. On duplicate keys the left operand wins.
    pub fn union(&self, other: &Bundle) -> Bundle {
        let mut out = self.clone();
        out.absorb(other);
        out
    }

    /// In-place [`union`](Self::union).
    pub fn absorb(&mut self, other: &Bundle) {
        for (k, v) in &other.members {
            if !self.members.contains_key(k) {
                self.members.insert(k.clone(), v.clone());
            }
        }
    }
}

impl FromIterator<(String, Value)> for Bundle {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
