//! Scalar arithmetic with NA handling.
//!
//! Every vectorised operator bottoms out in [`xy_calc`], so the NA rules
//! live in exactly one place:
//!
//! - any NA operand gives NA, except
//! - `x * 0` and `0 * x` give 0 even when `x` is NA (unless the computation
//!   produces a matrix),
//! - `||` gives 1 when either known operand is non-zero,
//! - `&&` gives 0 when either known operand is zero.
//!
//! Division by zero and domain errors record a [`NumericWarning`] and give NA.

use genr_ir::{AssignOp, BinaryOp};
use genr_value::na::{from_bool, truth};
use genr_value::{NumericWarning, NA};

use crate::context::WarningLog;

/// Whether the zero-times-NA rule applies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NaZero {
    /// `NA * 0 == 0` (scalar and series results).
    Absorb,
    /// `NA * 0 == NA` (matrix results).
    Propagate,
}

/// Apply `op` to two scalars.
pub fn xy_calc(x: f64, y: f64, op: BinaryOp, na_zero: NaZero, warnings: &mut WarningLog) -> f64 {
    let op = op.elementwise();
    match op {
        BinaryOp::Mul if na_zero == NaZero::Absorb && (x == 0.0 || y == 0.0) => return 0.0,
        BinaryOp::Or => {
            return match (truth(x), truth(y)) {
                (Some(true), _) | (_, Some(true)) => 1.0,
                (Some(false), Some(false)) => 0.0,
                _ => NA,
            };
        }
        BinaryOp::And => {
            return match (truth(x), truth(y)) {
                (Some(false), _) | (_, Some(false)) => 0.0,
                (Some(true), Some(true)) => 1.0,
                _ => NA,
            };
        }
        _ => {}
    }

    if x.is_nan() || y.is_nan() {
        return NA;
    }

    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                warnings.record(NumericWarning::DivisionByZero);
                NA
            } else {
                x / y
            }
        }
        BinaryOp::Mod => {
            if y == 0.0 {
                warnings.record(NumericWarning::DivisionByZero);
                NA
            } else {
                x % y
            }
        }
        BinaryOp::Pow => pow(x, y, warnings),
        BinaryOp::Eq => from_bool(x == y),
        BinaryOp::NotEq => from_bool(x != y),
        BinaryOp::Lt => from_bool(x < y),
        BinaryOp::LtEq => from_bool(x <= y),
        BinaryOp::Gt => from_bool(x > y),
        BinaryOp::GtEq => from_bool(x >= y),
        // Structural operators have no scalar meaning; callers reject them
        // before reaching this point.
        _ => NA,
    }
}

fn pow(x: f64, y: f64, warnings: &mut WarningLog) -> f64 {
    let r = x.powf(y);
    if r.is_nan() {
        warnings.record(NumericWarning::Domain { what: "^" });
        NA
    } else if r.is_infinite() && x.is_finite() && y.is_finite() {
        warnings.record(NumericWarning::NonFinite);
        NA
    } else {
        r
    }
}

/// Combine an existing element with a new one under an assignment operator.
///
/// Plain assignment returns the right operand verbatim (NA included).
pub fn assign_calc(old: f64, new: f64, op: AssignOp, warnings: &mut WarningLog) -> f64 {
    match op {
        AssignOp::Assign | AssignOp::Fill => new,
        AssignOp::Inc => xy_calc(old, 1.0, BinaryOp::Add, NaZero::Absorb, warnings),
        AssignOp::Dec => xy_calc(old, 1.0, BinaryOp::Sub, NaZero::Absorb, warnings),
        other => match other.binary() {
            Some(bop) => xy_calc(old, new, bop, NaZero::Absorb, warnings),
            None => new,
        },
    }
}

/// Whether `op` has an elementwise scalar meaning.
pub fn is_numeric(op: BinaryOp) -> bool {
    matches!(
        op.elementwise(),
        BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Mod
            | BinaryOp::Pow
            | BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::And
            | BinaryOp::Or
    )
}

/// Logical negation; NA stays NA.
pub fn not(x: f64) -> f64 {
    match truth(x) {
        Some(b) => from_bool(!b),
        None => NA,
    }
}
