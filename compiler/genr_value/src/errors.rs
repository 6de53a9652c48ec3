//! Error types for genr evaluation.
//!
//! `EvalErrorKind` carries the structured category; factory functions
//! (`type_mismatch()`, `non_conformable()`, ...) are the public way to build
//! errors and fill both `kind` and `message`.
//!
//! Numeric problems inside otherwise valid computations (division by zero,
//! log of a negative number) are not errors: they surface as
//! [`NumericWarning`]s and the offending element becomes NA.

use std::fmt;

use crate::array::ArrayKind;
use crate::value::ValueKind;

/// Result of evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Type/Operator
    TypeMismatch {
        expected: String,
        got: ValueKind,
    },
    BinaryTypeMismatch {
        op: &'static str,
        left: ValueKind,
        right: ValueKind,
    },
    NonConformable {
        op: String,
        left: (usize, usize),
        right: (usize, usize),
    },

    // Access
    IndexOutOfBounds {
        index: i64,
        len: usize,
    },
    UndefinedSymbol {
        name: String,
    },
    UndefinedMember {
        key: String,
    },
    UnknownFunction {
        name: String,
    },
    ArityMismatch {
        name: String,
        min: usize,
        max: usize,
        got: usize,
    },
    ArrayKindMismatch {
        expected: Option<ArrayKind>,
        got: ValueKind,
    },

    // Assignment
    NotAddressable {
        what: String,
    },
    InvalidAssignment {
        message: String,
    },

    // Resources and numerics
    AllocationFailure {
        what: String,
    },
    Domain {
        what: String,
    },
    MissingData {
        what: String,
    },
    RecursionLimit {
        depth: usize,
    },

    /// Errors without a structured category.
    Custom {
        message: String,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::BinaryTypeMismatch { op, left, right } => {
                write!(f, "operator `{op}` cannot be applied to {left} and {right}")
            }
            Self::NonConformable { op, left, right } => write!(
                f,
                "non-conformable operands for {op}: {} x {} and {} x {}",
                left.0, left.1, right.0, right.1
            ),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds (valid range 1 to {len})")
            }
            Self::UndefinedSymbol { name } => write!(f, "undefined symbol: {name}"),
            Self::UndefinedMember { key } => write!(f, "no member \"{key}\" in bundle"),
            Self::UnknownFunction { name } => write!(f, "unknown function: {name}"),
            Self::ArityMismatch {
                name,
                min,
                max,
                got,
            } => {
                if min == max {
                    let word = if *min == 1 { "argument" } else { "arguments" };
                    write!(f, "{name} expects {min} {word}, got {got}")
                } else {
                    write!(f, "{name} expects {min} to {max} arguments, got {got}")
                }
            }
            Self::ArrayKindMismatch { expected, got } => match expected {
                Some(kind) => write!(f, "cannot store {got} in array of {kind}"),
                None => write!(f, "{got} cannot be an array element"),
            },
            Self::NotAddressable { what } => write!(f, "cannot assign to {what}"),
            Self::InvalidAssignment { message } => write!(f, "invalid assignment: {message}"),
            Self::AllocationFailure { what } => write!(f, "out of memory allocating {what}"),
            Self::Domain { what } => write!(f, "domain error: {what}"),
            Self::MissingData { what } => write!(f, "missing values in {what}"),
            Self::RecursionLimit { depth } => {
                write!(f, "maximum recursion depth exceeded (limit: {depth})")
            }
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
    /// Context added while the error propagates (e.g. the statement text).
    pub notes: Vec<String>,
}

impl EvalError {
    /// Error with just a message (`Custom` kind).
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            notes: Vec::new(),
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            notes: Vec::new(),
        }
    }

    /// Attach a context note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Factories

#[cold]
pub fn type_mismatch(expected: impl Into<String>, got: ValueKind) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.into(),
        got,
    })
}

#[cold]
pub fn binary_type_mismatch(op: &'static str, left: ValueKind, right: ValueKind) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BinaryTypeMismatch { op, left, right })
}

#[cold]
pub fn non_conformable(
    op: impl Into<String>,
    left: (usize, usize),
    right: (usize, usize),
) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonConformable {
        op: op.into(),
        left,
        right,
    })
}

/// `index` is the 1-based index as written by the user.
#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, len })
}

#[cold]
pub fn undefined_symbol(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedSymbol { name: name.into() })
}

#[cold]
pub fn undefined_member(key: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMember { key: key.into() })
}

#[cold]
pub fn unknown_function(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownFunction { name: name.into() })
}

#[cold]
pub fn arity_mismatch(name: impl Into<String>, min: usize, max: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.into(),
        min,
        max,
        got,
    })
}

#[cold]
pub fn array_kind_mismatch(expected: Option<ArrayKind>, got: ValueKind) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArrayKindMismatch { expected, got })
}

#[cold]
pub fn not_addressable(what: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAddressable { what: what.into() })
}

#[cold]
pub fn invalid_assignment(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidAssignment {
        message: message.into(),
    })
}

#[cold]
pub fn allocation_failure(what: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AllocationFailure { what: what.into() })
}

#[cold]
pub fn domain_error(what: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Domain { what: what.into() })
}

#[cold]
pub fn missing_data(what: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingData { what: what.into() })
}

#[cold]
pub fn recursion_limit(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::RecursionLimit { depth })
}

/// Non-fatal numeric condition recorded during evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumericWarning {
    DivisionByZero,
    Domain { what: &'static str },
    NonFinite,
}

impl fmt::Display for NumericWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Domain { what } => write!(f, "argument out of domain in {what}"),
            Self::NonFinite => write!(f, "non-finite result"),
        }
    }
}
