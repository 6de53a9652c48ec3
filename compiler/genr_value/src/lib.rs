//! Runtime value model for the genr evaluator.
//!
//! - [`Value`] is the owned tagged variant over the runtime kinds;
//!   [`Operand`] is a `Copy` view used by operators so that dataset series,
//!   user variables and cached intermediates can be read without cloning.
//! - [`Matrix`] is dense column-major, real or complex.
//! - [`Bundle`], [`GArray`], [`List`] are the container kinds.
//! - [`EvalError`] and the factory functions in [`errors`] are shared by every
//!   crate that can fail during evaluation.

mod array;
mod bundle;
pub mod errors;
mod matrix;
pub mod na;
mod series_id;
mod strings;
mod value;

pub use array::{ArrayKind, GArray};
pub use bundle::Bundle;
pub use errors::{EvalError, EvalErrorKind, EvalResult, NumericWarning};
pub use matrix::{Matrix, MatrixData, ObsSpan};
pub use na::{is_na, NA};
pub use num_complex::Complex64;
pub use series_id::{List, SeriesId};
pub use strings::StringTable;
pub use value::{Operand, SeriesRef, Value, ValueKind};
