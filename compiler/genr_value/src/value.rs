//! The runtime value and its borrowed operand view.

use std::fmt;

use crate::array::{ArrayKind, GArray};
use crate::bundle::Bundle;
use crate::errors::EvalResult;
use crate::matrix::{Matrix, MatrixData};
use crate::na::NA;
use crate::series_id::{List, SeriesId};
use crate::strings::StringTable;

/// Kind tag of a [`Value`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Undefined,
    Scalar,
    Series,
    Matrix,
    Str,
    List,
    Bundle,
    Array,
}

impl ValueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueKind::Undefined => "null",
            ValueKind::Scalar => "scalar",
            ValueKind::Series => "series",
            ValueKind::Matrix => "matrix",
            ValueKind::Str => "string",
            ValueKind::List => "list",
            ValueKind::Bundle => "bundle",
            ValueKind::Array => "array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime value.
///
/// A series holds one entry per dataset observation; entries outside the
/// active sample are NA in computed results.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value; also the value of `null`.
    #[default]
    Undefined,
    Scalar(f64),
    Series(Vec<f64>),
    Matrix(Matrix),
    Str(String),
    List(List),
    Bundle(Bundle),
    Array(GArray),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Undefined => ValueKind::Undefined,
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Series(_) => ValueKind::Series,
            Value::Matrix(_) => ValueKind::Matrix,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Bundle(_) => ValueKind::Bundle,
            Value::Array(_) => ValueKind::Array,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Scalar content: a scalar, or the single element of a real 1×1 matrix.
    pub fn as_scalar(&self) -> Option<f64> {
        self.as_operand().scalar()
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Value::Series(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&Bundle> {
        match self {
            Value::Bundle(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&GArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Borrowed view of this value.
    pub fn as_operand(&self) -> Operand<'_> {
        match self {
            Value::Undefined => Operand::Undefined,
            Value::Scalar(x) => Operand::Scalar(*x),
            Value::Series(v) => Operand::Series(SeriesRef::values(v)),
            Value::Matrix(m) => Operand::Matrix(m),
            Value::Str(s) => Operand::Str(s),
            Value::List(l) => Operand::List(l),
            Value::Bundle(b) => Operand::Bundle(b),
            Value::Array(a) => Operand::Array(a),
        }
    }

    // Retagging. Each helper leaves `self` holding the requested kind,
    // reusing the existing allocation when the kind already matches.

    pub fn set_scalar(&mut self, x: f64) {
        *self = Value::Scalar(x);
    }

    /// Series buffer of length `n`, filled with NA.
    pub fn series_buf(&mut self, n: usize) -> &mut Vec<f64> {
        if !matches!(self, Value::Series(_)) {
            *self = Value::Series(Vec::with_capacity(n));
        }
        match self {
            Value::Series(v) => {
                v.clear();
                v.resize(n, NA);
                v
            }
            _ => unreachable!(),
        }
    }

    /// Real matrix of zeros, `rows × cols`, metadata cleared.
    pub fn matrix_buf(&mut self, rows: usize, cols: usize) -> &mut Matrix {
        let m = self.matrix_slot();
        m.reshape_real(rows, cols);
        m
    }

    /// [`matrix_buf`](Self::matrix_buf) for a requested size that may be
    /// too large to allocate.
    pub fn try_matrix_buf(&mut self, rows: usize, cols: usize) -> EvalResult<&mut Matrix> {
        let m = self.matrix_slot();
        m.try_reshape_real(rows, cols)?;
        Ok(m)
    }

    /// Complex matrix of zeros, `rows × cols`, metadata cleared.
    pub fn complex_matrix_buf(&mut self, rows: usize, cols: usize) -> &mut Matrix {
        let m = self.matrix_slot();
        m.reshape_complex(rows, cols);
        m
    }

    fn matrix_slot(&mut self) -> &mut Matrix {
        if !matches!(self, Value::Matrix(_)) {
            *self = Value::Matrix(Matrix::default());
        }
        match self {
            Value::Matrix(m) => m,
            _ => unreachable!(),
        }
    }

    /// Empty string buffer.
    pub fn string_buf(&mut self) -> &mut String {
        if !matches!(self, Value::Str(_)) {
            *self = Value::Str(String::new());
        }
        match self {
            Value::Str(s) => {
                s.clear();
                s
            }
            _ => unreachable!(),
        }
    }

    /// Empty list buffer.
    pub fn list_buf(&mut self) -> &mut List {
        if !matches!(self, Value::List(_)) {
            *self = Value::List(List::new());
        }
        match self {
            Value::List(l) => {
                l.clear();
                l
            }
            _ => unreachable!(),
        }
    }

    /// Copy `src` into `self`, reusing series, matrix and string storage
    /// when the kinds already agree.
    pub fn copy_from(&mut self, src: &Value) {
        match (&mut *self, src) {
            (Value::Series(dst), Value::Series(s)) => dst.clone_from(s),
            (Value::Matrix(dst), Value::Matrix(s)) => dst.copy_from(s),
            (Value::Str(dst), Value::Str(s)) => dst.clone_from(s),
            (dst, s) => *dst = s.clone(),
        }
    }

    /// Copy an operand view into `self`; see [`copy_from`](Self::copy_from).
    pub fn copy_operand(&mut self, src: Operand<'_>) {
        match (&mut *self, src) {
            (Value::Series(dst), Operand::Series(s)) => {
                dst.clear();
                dst.extend_from_slice(s.values);
            }
            (Value::Scalar(dst), Operand::Scalar(x)) => *dst = x,
            (Value::Matrix(dst), Operand::Matrix(m)) => dst.copy_from(m),
            (Value::Str(dst), Operand::Str(s)) => {
                dst.clear();
                dst.push_str(s);
            }
            (dst, s) => *dst = s.to_value(),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Bundle> for Value {
    fn from(b: Bundle) -> Self {
        Value::Bundle(b)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<GArray> for Value {
    fn from(a: GArray) -> Self {
        Value::Array(a)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "null"),
            Value::Scalar(x) if x.is_nan() => write!(f, "NA"),
            Value::Scalar(x) => write!(f, "{x}"),
            Value::Series(v) => write!(f, "series({} obs)", v.len()),
            Value::Matrix(m) => write!(f, "{m}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(l) => {
                write!(f, "list(")?;
                for (i, id) in l.ids().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{id}")?;
                }
                write!(f, ")")
            }
            Value::Bundle(b) => {
                write!(f, "bundle(")?;
                for (i, (k, v)) in b.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {}", v.kind())?;
                }
                write!(f, ")")
            }
            Value::Array(a) => match a.kind() {
                Some(kind) => write!(f, "array of {kind} ({})", a.len()),
                None => write!(f, "array ({})", a.len()),
            },
        }
    }
}

/// A series as seen by an operator: values plus, for dataset series, the
/// categorical table and the series id.
#[derive(Copy, Clone, Debug)]
pub struct SeriesRef<'a> {
    pub values: &'a [f64],
    pub strings: Option<&'a StringTable>,
    pub id: Option<SeriesId>,
}

impl<'a> SeriesRef<'a> {
    /// A computed series with no dataset identity.
    pub fn values(values: &'a [f64]) -> Self {
        Self {
            values,
            strings: None,
            id: None,
        }
    }
}

/// Borrowed view of a value, wherever it lives (aux node, dataset series,
/// user variable, bundle member).
#[derive(Copy, Clone, Debug)]
pub enum Operand<'a> {
    Undefined,
    Scalar(f64),
    Series(SeriesRef<'a>),
    Matrix(&'a Matrix),
    Str(&'a str),
    List(&'a List),
    Bundle(&'a Bundle),
    Array(&'a GArray),
}

impl<'a> Operand<'a> {
    pub fn kind(&self) -> ValueKind {
        match self {
            Operand::Undefined => ValueKind::Undefined,
            Operand::Scalar(_) => ValueKind::Scalar,
            Operand::Series(_) => ValueKind::Series,
            Operand::Matrix(_) => ValueKind::Matrix,
            Operand::Str(_) => ValueKind::Str,
            Operand::List(_) => ValueKind::List,
            Operand::Bundle(_) => ValueKind::Bundle,
            Operand::Array(_) => ValueKind::Array,
        }
    }

    /// Scalar content; a real 1×1 matrix counts as a scalar.
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Operand::Scalar(x) => Some(*x),
            Operand::Matrix(m) if m.is_scalar() => match m.data() {
                MatrixData::Real(v) => Some(v[0]),
                MatrixData::Complex(_) => None,
            },
            _ => None,
        }
    }

    pub fn series(&self) -> Option<SeriesRef<'a>> {
        match self {
            Operand::Series(s) => Some(*s),
            _ => None,
        }
    }

    pub fn matrix(&self) -> Option<&'a Matrix> {
        match self {
            Operand::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn str(&self) -> Option<&'a str> {
        match self {
            Operand::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the operand is a scalar or a real 1×1 matrix.
    pub fn is_scalar_like(&self) -> bool {
        self.scalar().is_some()
    }

    /// Element kind if this operand were stored in an array.
    pub fn array_kind(&self) -> Option<ArrayKind> {
        match self {
            Operand::Str(_) => Some(ArrayKind::Strings),
            Operand::Matrix(_) => Some(ArrayKind::Matrices),
            Operand::Bundle(_) => Some(ArrayKind::Bundles),
            Operand::List(_) => Some(ArrayKind::Lists),
            Operand::Array(_) => Some(ArrayKind::Arrays),
            Operand::Undefined | Operand::Scalar(_) | Operand::Series(_) => None,
        }
    }

    /// Owned copy.
    pub fn to_value(&self) -> Value {
        match *self {
            Operand::Undefined => Value::Undefined,
            Operand::Scalar(x) => Value::Scalar(x),
            Operand::Series(s) => Value::Series(s.values.to_vec()),
            Operand::Matrix(m) => Value::Matrix(m.clone()),
            Operand::Str(s) => Value::Str(s.to_owned()),
            Operand::List(l) => Value::List(l.clone()),
            Operand::Bundle(b) => Value::Bundle(b.clone()),
            Operand::Array(a) => Value::Array(a.clone()),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
