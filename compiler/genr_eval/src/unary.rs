//! Unary operators: `-x`, `+x`, `!x`, `x'`.

use genr_ir::UnaryOp;
use genr_value::errors::type_mismatch;
use genr_value::{EvalResult, Operand, Value};

use crate::operators::numeric::fill_series;
use crate::operators::scalar::not;
use crate::operators::OpCtx;

pub(crate) fn unary(
    op: UnaryOp,
    x: Operand<'_>,
    ctx: &mut OpCtx<'_>,
    out: &mut Value,
) -> EvalResult<()> {
    let f: fn(f64) -> f64 = match op {
        UnaryOp::Neg => |v| -v,
        UnaryOp::Plus => |v| v,
        UnaryOp::Not => not,
        UnaryOp::Transpose => return transpose(x, out),
    };
    match x {
        Operand::Scalar(v) => out.set_scalar(f(v)),
        Operand::Series(s) => fill_series(ctx, out, |t, _| f(s.values[t])),
        Operand::Matrix(m) => {
            if m.is_complex() && op != UnaryOp::Not {
                let sign = if op == UnaryOp::Neg { -1.0 } else { 1.0 };
                let dst = out.complex_matrix_buf(m.rows(), m.cols());
                for k in 0..m.len() {
                    dst.set_at(k, m.at_complex(k) * sign);
                }
            } else {
                let dst = out.matrix_buf(m.rows(), m.cols());
                for k in 0..m.len() {
                    dst.set_at(k, f(m.at(k)).into());
                }
            }
        }
        other => {
            return Err(type_mismatch(
                format!("scalar, series or matrix for `{}`", op.as_symbol()),
                other.kind(),
            ))
        }
    }
    Ok(())
}

fn transpose(x: Operand<'_>, out: &mut Value) -> EvalResult<()> {
    match x {
        Operand::Scalar(v) => out.set_scalar(v),
        Operand::Matrix(m) => *out = Value::Matrix(m.transpose()),
        other => return Err(type_mismatch("matrix for `'`", other.kind())),
    }
    Ok(())
}
