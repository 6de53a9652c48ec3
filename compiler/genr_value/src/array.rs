//! Homogeneous arrays of non-scalar values.

use std::fmt;

use crate::errors::{array_kind_mismatch, index_out_of_bounds, EvalResult};
use crate::matrix::Matrix;
use crate::series_id::List;
use crate::bundle::Bundle;
use crate::value::{Value, ValueKind};

/// Element kind of an array.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    Strings,
    Matrices,
    Bundles,
    Lists,
    Arrays,
}

impl ArrayKind {
    /// Element kind for a value; scalars, series and `Undefined` have none.
    pub fn of(value: &Value) -> Option<ArrayKind> {
        match value {
            Value::Str(_) => Some(ArrayKind::Strings),
            Value::Matrix(_) => Some(ArrayKind::Matrices),
            Value::Bundle(_) => Some(ArrayKind::Bundles),
            Value::List(_) => Some(ArrayKind::Lists),
            Value::Array(_) => Some(ArrayKind::Arrays),
            Value::Undefined | Value::Scalar(_) | Value::Series(_) => None,
        }
    }

    /// Value kind of the elements.
    pub fn element_kind(self) -> ValueKind {
        match self {
            ArrayKind::Strings => ValueKind::Str,
            ArrayKind::Matrices => ValueKind::Matrix,
            ArrayKind::Bundles => ValueKind::Bundle,
            ArrayKind::Lists => ValueKind::List,
            ArrayKind::Arrays => ValueKind::Array,
        }
    }

    /// Empty element of this kind.
    pub fn empty_element(self) -> Value {
        match self {
            ArrayKind::Strings => Value::Str(String::new()),
            ArrayKind::Matrices => Value::Matrix(Matrix::default()),
            ArrayKind::Bundles => Value::Bundle(Bundle::new()),
            ArrayKind::Lists => Value::List(List::new()),
            ArrayKind::Arrays => Value::Array(GArray::new()),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ArrayKind::Strings => "strings",
            ArrayKind::Matrices => "matrices",
            ArrayKind::Bundles => "bundles",
            ArrayKind::Lists => "lists",
            ArrayKind::Arrays => "arrays",
        }
    }
}

impl fmt::Display for ArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Array value. The element kind is fixed by the first insertion (or at
/// construction) and every element matches it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GArray {
    kind: Option<ArrayKind>,
    items: Vec<Value>,
}

impl GArray {
    /// Empty array whose kind is fixed by the first push.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(kind: ArrayKind) -> Self {
        Self {
            kind: Some(kind),
            items: Vec::new(),
        }
    }

    /// Array of `n` empty elements of `kind`.
    pub fn sized(kind: ArrayKind, n: usize) -> Self {
        Self {
            kind: Some(kind),
            items: (0..n).map(|_| kind.empty_element()).collect(),
        }
    }

    pub fn kind(&self) -> Option<ArrayKind> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Element at a 0-based position.
    pub fn get(&self, pos: usize) -> Option<&Value> {
        self.items.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut Value> {
        self.items.get_mut(pos)
    }

    fn check(&mut self, value: &Value) -> EvalResult<()> {
        let Some(got) = ArrayKind::of(value) else {
            return Err(array_kind_mismatch(self.kind, value.kind()));
        };
        match self.kind {
            Some(kind) if kind != got => Err(array_kind_mismatch(self.kind, value.kind())),
            Some(_) => Ok(()),
            None => {
                self.kind = Some(got);
                Ok(())
            }
        }
    }

    /// Append an element, fixing the kind on first insertion.
    pub fn push(&mut self, value: Value) -> EvalResult<()> {
        self.check(&value)?;
        self.items.push(value);
        Ok(())
    }

    /// Replace the element at a 0-based position.
    pub fn set(&mut self, pos: usize, value: Value) -> EvalResult<()> {
        if pos >= self.items.len() {
            return Err(index_out_of_bounds(pos as i64 + 1, self.items.len()));
        }
        self.check(&value)?;
        self.items[pos] = value;
        Ok(())
    }

    /// Append every element of `other` (kinds must agree).
    pub fn extend(&mut self, other: &GArray) -> EvalResult<()> {
        if let (Some(a), Some(b)) = (self.kind, other.kind) {
            if a != b {
                return Err(array_kind_mismatch(self.kind, b.element_kind()));
            }
        }
        if self.kind.is_none() {
            self.kind = other.kind;
        }
        self.items.extend(other.items.iter().cloned());
        Ok(())
    }

    /// Sub-array of the 0-based inclusive range `lo..=hi`.
    pub fn slice(&self, lo: usize, hi: usize) -> GArray {
        GArray {
            kind: self.kind,
            items: self.items[lo..=hi].to_vec(),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
