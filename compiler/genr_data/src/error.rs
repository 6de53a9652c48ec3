//! Errors raised by dataset and variable-table operations.

use std::fmt;

use genr_value::errors::{
    invalid_assignment, non_conformable, not_addressable, undefined_symbol,
};
use genr_value::EvalError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataError {
    InvalidName { name: String },
    DuplicateName { name: String },
    UnknownSeries { name: String },
    UnknownVar { name: String },
    LengthMismatch { expected: usize, got: usize },
    /// The constant series cannot be renamed, deleted or overwritten.
    ConstSeries,
    BadStructure { message: String },
    BadSample { t1: usize, t2: usize, nobs: usize },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName { name } => write!(f, "invalid name: '{name}'"),
            Self::DuplicateName { name } => write!(f, "'{name}' is already defined"),
            Self::UnknownSeries { name } => write!(f, "no series named '{name}'"),
            Self::UnknownVar { name } => write!(f, "no variable named '{name}'"),
            Self::LengthMismatch { expected, got } => {
                write!(f, "series length {got} does not match dataset length {expected}")
            }
            Self::ConstSeries => write!(f, "the constant series is read-only"),
            Self::BadStructure { message } => write!(f, "invalid data structure: {message}"),
            Self::BadSample { t1, t2, nobs } => write!(
                f,
                "invalid sample {}..{} for {nobs} observations",
                t1 + 1,
                t2 + 1
            ),
        }
    }
}

impl std::error::Error for DataError {}

impl From<DataError> for EvalError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::UnknownSeries { name } | DataError::UnknownVar { name } => {
                undefined_symbol(name)
            }
            DataError::LengthMismatch { expected, got } => {
                non_conformable("series", (expected, 1), (got, 1))
            }
            DataError::ConstSeries => not_addressable("const"),
            other @ (DataError::InvalidName { .. } | DataError::DuplicateName { .. }) => {
                invalid_assignment(other.to_string())
            }
            other => EvalError::new(other.to_string()),
        }
    }
}
