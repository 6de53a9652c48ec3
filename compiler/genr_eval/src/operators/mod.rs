//! Binary operator dispatch.
//!
//! Dispatch is a match over operand kinds; each family lives in its own
//! module:
//!
//! - `scalar`: the per-element kernel with the NA rules
//! - `numeric`: scalar and series combinations
//! - `matrix` (+ `linalg`): anything with a matrix operand
//! - `collections`: strings, lists, bundles and arrays

mod collections;
pub(crate) mod linalg;
pub(crate) mod matrix;
pub(crate) mod numeric;
pub mod scalar;

use genr_data::Dataset;
use genr_ir::BinaryOp;
use genr_value::errors::binary_type_mismatch;
use genr_value::{EvalResult, Operand, Value};

use crate::context::{TargetType, WarningLog};
use scalar::NaZero;

/// What an operator needs besides its operands.
pub(crate) struct OpCtx<'a> {
    pub ds: &'a Dataset,
    pub warnings: &'a mut WarningLog,
    pub target: TargetType,
}

impl OpCtx<'_> {
    #[inline]
    pub fn sample(&self) -> (usize, usize) {
        self.ds.sample()
    }

    #[inline]
    pub fn sample_len(&self) -> usize {
        self.ds.sample_len()
    }

    #[inline]
    pub fn nobs(&self) -> usize {
        self.ds.nobs()
    }

    /// `NA * 0` is 0 unless the statement produces a matrix.
    pub fn na_zero(&self) -> NaZero {
        if self.target == TargetType::Matrix {
            NaZero::Propagate
        } else {
            NaZero::Absorb
        }
    }
}

/// Evaluate `a op b` into `out`.
pub(crate) fn binary(
    op: BinaryOp,
    a: Operand<'_>,
    b: Operand<'_>,
    ctx: &mut OpCtx<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    use Operand as O;

    match (a, b) {
        (O::Str(_), _) | (_, O::Str(_)) => collections::string_op(op, a, b, ctx, out),
        (O::Array(_), _) => collections::array_op(op, a, b, out),
        (O::Bundle(_), _) | (_, O::Bundle(_)) => collections::bundle_op(op, a, b, out),
        (O::List(_), _) | (_, O::List(_)) => collections::list_op(op, a, b, out),

        _ if op.is_dot() => {
            if matches!(a, O::Matrix(_)) || matches!(b, O::Matrix(_)) {
                matrix::matrix_op(op, a, b, ctx, out)
            } else {
                Err(binary_type_mismatch(op.as_symbol(), a.kind(), b.kind()))
            }
        }

        // A series against a matrix combines elementwise when the matrix is a
        // column over the sample (or 1×1); otherwise matrix rules apply.
        (O::Series(_), O::Matrix(m)) | (O::Matrix(m), O::Series(_))
            if scalar::is_numeric(op) && (m.is_scalar() || m.cols() == 1) =>
        {
            numeric::series_op(op, a, b, ctx, out)
        }
        (O::Matrix(_), _) | (_, O::Matrix(_)) => matrix::matrix_op(op, a, b, ctx, out),

        (O::Series(_), O::Series(_) | O::Scalar(_)) | (O::Scalar(_), O::Series(_))
            if scalar::is_numeric(op) =>
        {
            numeric::series_op(op, a, b, ctx, out)
        }
        (O::Scalar(x), O::Scalar(y)) if scalar::is_numeric(op) => {
            numeric::scalar_op(op, x, y, ctx, out);
            Ok(())
        }

        // `1 ~ 2` and `1 | 2` build matrices
        (O::Scalar(_), O::Scalar(_))
            if matches!(op, BinaryOp::Concat | BinaryOp::Union | BinaryOp::Kron) =>
        {
            matrix::matrix_op(op, a, b, ctx, out)
        }

        _ => Err(binary_type_mismatch(op.as_symbol(), a.kind(), b.kind())),
    }
}
