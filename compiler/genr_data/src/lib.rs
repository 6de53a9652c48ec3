//! Dataset and user-variable storage for the genr evaluator.
//!
//! The evaluator reads and writes series through [`Dataset`] and named
//! non-series values through [`UserVars`]. Both expose an `epoch` that is
//! bumped whenever an identity the evaluator may have cached (a series id, a
//! variable slot, the row count) stops being valid.

mod dataset;
mod error;
mod vars;

pub use dataset::{Dataset, SeriesData, Structure};
pub use error::DataError;
pub use vars::{UserVar, UserVars, VarId};

/// Longest permitted series or variable name.
pub const MAX_NAME_LEN: usize = 31;

/// Whether `name` can name a series or variable: an ASCII letter followed by
/// letters, digits or underscores.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.len() <= MAX_NAME_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
