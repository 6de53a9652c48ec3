//! Standard builtin library.
//!
//! A small set of constructors, shape queries, elementwise math, reductions
//! and complex-matrix helpers. Hosts register the rest of their numerical
//! catalogue through [`BuiltinTable::register`].

use genr_value::na::from_bool;
use genr_value::{is_na, Complex64, Matrix, NumericWarning, Operand, Value, NA};

use super::{ArgMask, BuiltinError, BuiltinTable, CallCtx, Signature};
use crate::operators::linalg;

const S: ArgMask = ArgMask::SCALAR;
const M: ArgMask = ArgMask::MATRIX;
const STR: ArgMask = ArgMask::STRING;
const B: ArgMask = ArgMask::BUNDLE;
const NUM: ArgMask = ArgMask::NUMERIC;
const ANY: ArgMask = ArgMask::ANY;

type Res = Result<(), BuiltinError>;

pub(super) fn register_all(t: &mut BuiltinTable) {
    // constructors
    t.register("ones", Signature::new(1, 2, &[S]), ones);
    t.register("zeros", Signature::new(1, 2, &[S]), zeros);
    t.register("I", Signature::fixed(&[S]), identity);
    t.register("seq", Signature::fixed(&[S, S]), seq);
    t.register("mshape", Signature::fixed(&[M, S, S]), mshape);
    t.register("complex", Signature::fixed(&[NUM, NUM]), complex);

    // shape
    t.register("rows", Signature::fixed(&[ANY]), rows);
    t.register("cols", Signature::fixed(&[ANY]), cols);
    t.register("nelem", Signature::fixed(&[ANY]), nelem);
    t.register("strlen", Signature::fixed(&[STR]), strlen);
    t.register("inbundle", Signature::fixed(&[B, STR]), inbundle);
    t.register("typestr", Signature::fixed(&[ANY]), typestr);

    // elementwise
    t.register("sqrt", Signature::fixed(&[NUM]), sqrt);
    t.register("exp", Signature::fixed(&[NUM]), exp);
    t.register("log", Signature::fixed(&[NUM]), log);
    t.register("abs", Signature::fixed(&[NUM]), abs);
    t.register("missing", Signature::fixed(&[NUM]), missing);
    t.register("ok", Signature::fixed(&[NUM]), ok);

    // reductions
    t.register("sum", Signature::fixed(&[NUM]), sum);
    t.register("mean", Signature::fixed(&[NUM]), mean);
    t.register("min", Signature::fixed(&[NUM]), min);
    t.register("max", Signature::fixed(&[NUM]), max);

    // linear algebra and complex parts
    t.register("transp", Signature::fixed(&[M]), transp);
    t.register("inv", Signature::fixed(&[M]), inv);
    t.register("det", Signature::fixed(&[M]), det);
    t.register("real", Signature::fixed(&[M]), real);
    t.register("imag", Signature::fixed(&[M]), imag);
}

/// Non-negative integer dimension.
fn dim(op: Operand<'_>) -> Result<usize, BuiltinError> {
    match op.scalar() {
        Some(x) if x >= 0.0 && x.fract() == 0.0 => Ok(x as usize),
        Some(x) => Err(BuiltinError::Domain(format!("invalid dimension {x}"))),
        None => Err(BuiltinError::Invalid("expected a dimension".into())),
    }
}

fn square(m: &Matrix) -> Result<(), BuiltinError> {
    if m.is_square() {
        Ok(())
    } else {
        Err(BuiltinError::NonConformable {
            left: m.shape(),
            right: (m.cols(), m.rows()),
        })
    }
}

fn filled(args: &[Operand<'_>], out: &mut Value, x: f64) -> Res {
    let r = dim(args[0])?;
    let c = match args.get(1) {
        Some(op) => dim(*op)?,
        None => 1,
    };
    let m = out.try_matrix_buf(r, c).map_err(|_| BuiltinError::Alloc)?;
    if let Some(v) = m.real_mut() {
        v.fill(x);
    }
    Ok(())
}

fn ones(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    filled(args, out, 1.0)
}

fn zeros(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    filled(args, out, 0.0)
}

fn identity(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let n = dim(args[0])?;
    let m = out.try_matrix_buf(n, n).map_err(|_| BuiltinError::Alloc)?;
    for i in 0..n {
        m.set(i, i, 1.0);
    }
    Ok(())
}

fn seq(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let (Some(a), Some(b)) = (args[0].scalar(), args[1].scalar()) else {
        return Err(BuiltinError::InsufficientArgs);
    };
    if is_na(a) || is_na(b) || a.fract() != 0.0 || b.fract() != 0.0 {
        return Err(BuiltinError::Domain("seq bounds must be integers".into()));
    }
    let n = ((b - a).abs() as usize).saturating_add(1);
    let step = if b >= a { 1.0 } else { -1.0 };
    let m = out.try_matrix_buf(1, n).map_err(|_| BuiltinError::Alloc)?;
    for k in 0..n {
        m.set_at(k, (a + step * k as f64).into());
    }
    Ok(())
}

fn mshape(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let Operand::Matrix(src) = args[0] else {
        return Err(BuiltinError::InsufficientArgs);
    };
    let r = dim(args[1])?;
    let c = dim(args[2])?;
    if r * c != src.len() {
        return Err(BuiltinError::NonConformable {
            left: src.shape(),
            right: (r, c),
        });
    }
    let dst = if src.is_complex() {
        out.complex_matrix_buf(r, c)
    } else {
        out.matrix_buf(r, c)
    };
    for k in 0..src.len() {
        dst.set_at(k, src.at_complex(k));
    }
    Ok(())
}

/// Matrix view of a numeric argument; series are not accepted.
fn matrix_arg(op: Operand<'_>) -> Result<std::borrow::Cow<'_, Matrix>, BuiltinError> {
    match op {
        Operand::Matrix(m) => Ok(std::borrow::Cow::Borrowed(m)),
        Operand::Scalar(x) => Ok(std::borrow::Cow::Owned(Matrix::scalar(x))),
        _ => Err(BuiltinError::Invalid("expected a matrix".into())),
    }
}

fn complex(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let re = matrix_arg(args[0])?;
    let im = matrix_arg(args[1])?;
    let shape = if re.is_scalar() { im.shape() } else { re.shape() };
    for m in [&re, &im] {
        if !m.is_scalar() && m.shape() != shape {
            return Err(BuiltinError::NonConformable {
                left: re.shape(),
                right: im.shape(),
            });
        }
    }
    let dst = out.complex_matrix_buf(shape.0, shape.1);
    for k in 0..shape.0 * shape.1 {
        let x = if re.is_scalar() { re.at(0) } else { re.at(k) };
        let y = if im.is_scalar() { im.at(0) } else { im.at(k) };
        dst.set_at(k, Complex64::new(x, y));
    }
    Ok(())
}

fn rows(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let n = match args[0] {
        Operand::Matrix(m) => m.rows(),
        Operand::Scalar(_) => 1,
        Operand::Series(_) => ctx.dataset().sample_len(),
        _ => return Err(BuiltinError::Invalid("expected a matrix".into())),
    };
    out.set_scalar(n as f64);
    Ok(())
}

fn cols(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let n = match args[0] {
        Operand::Matrix(m) => m.cols(),
        Operand::Scalar(_) | Operand::Series(_) => 1,
        _ => return Err(BuiltinError::Invalid("expected a matrix".into())),
    };
    out.set_scalar(n as f64);
    Ok(())
}

fn nelem(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let n = match args[0] {
        Operand::Undefined => 0,
        Operand::Matrix(m) => m.len(),
        Operand::List(l) => l.len(),
        Operand::Bundle(b) => b.len(),
        Operand::Array(a) => a.len(),
        Operand::Str(s) => s.chars().count(),
        Operand::Scalar(_) | Operand::Series(_) => 1,
    };
    out.set_scalar(n as f64);
    Ok(())
}

fn strlen(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let n = args[0].str().map_or(0, |s| s.chars().count());
    out.set_scalar(n as f64);
    Ok(())
}

fn inbundle(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let (Operand::Bundle(b), Some(key)) = (args[0], args[1].str()) else {
        return Err(BuiltinError::InsufficientArgs);
    };
    out.set_scalar(from_bool(b.contains(key)));
    Ok(())
}

fn typestr(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    out.string_buf().push_str(args[0].kind().as_str());
    Ok(())
}

/// Apply `f` per element of a scalar, series (over the sample) or real
/// matrix.
fn map(
    arg: Operand<'_>,
    ctx: &mut CallCtx<'_>,
    out: &mut Value,
    f: impl Fn(f64, &mut CallCtx<'_>) -> f64,
) -> Res {
    match arg {
        Operand::Scalar(x) => out.set_scalar(f(x, ctx)),
        Operand::Series(s) => {
            let (t1, t2) = ctx.sample();
            let buf = out.series_buf(ctx.nobs());
            if !buf.is_empty() {
                for t in t1..=t2 {
                    buf[t] = f(s.values[t], ctx);
                }
            }
        }
        Operand::Matrix(m) if !m.is_complex() => {
            let dst = out.matrix_buf(m.rows(), m.cols());
            for k in 0..m.len() {
                dst.set_at(k, f(m.at(k), ctx).into());
            }
        }
        Operand::Matrix(_) => {
            return Err(BuiltinError::Invalid("complex argument not supported".into()))
        }
        _ => return Err(BuiltinError::InsufficientArgs),
    }
    Ok(())
}

fn checked(x: f64, ok: bool, what: &'static str, ctx: &mut CallCtx<'_>, f: fn(f64) -> f64) -> f64 {
    if is_na(x) {
        NA
    } else if ok {
        f(x)
    } else {
        ctx.warn(NumericWarning::Domain { what });
        NA
    }
}

fn sqrt(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    map(args[0], ctx, out, |x, ctx| checked(x, x >= 0.0, "sqrt", ctx, f64::sqrt))
}

fn exp(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    map(args[0], ctx, out, |x, ctx| {
        let y = x.exp();
        if y.is_infinite() {
            ctx.warn(NumericWarning::NonFinite);
            NA
        } else {
            y
        }
    })
}

fn log(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    map(args[0], ctx, out, |x, ctx| checked(x, x > 0.0, "log", ctx, f64::ln))
}

fn abs(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    map(args[0], ctx, out, |x, _| x.abs())
}

fn missing(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    map(args[0], ctx, out, |x, _| from_bool(is_na(x)))
}

fn ok(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    map(args[0], ctx, out, |x, _| from_bool(!is_na(x)))
}

/// Values a reduction runs over: a series' non-missing sample values, every
/// element of a matrix.
fn reduce_input(arg: Operand<'_>, ctx: &CallCtx<'_>) -> Result<Vec<f64>, BuiltinError> {
    match arg {
        Operand::Scalar(x) => Ok(vec![x]),
        Operand::Series(s) => {
            if s.values.is_empty() {
                return Ok(Vec::new());
            }
            let (t1, t2) = ctx.sample();
            Ok(s.values[t1..=t2].iter().copied().filter(|x| !is_na(*x)).collect())
        }
        Operand::Matrix(m) if !m.is_complex() => Ok((0..m.len()).map(|k| m.at(k)).collect()),
        Operand::Matrix(_) => Err(BuiltinError::Invalid("complex argument not supported".into())),
        _ => Err(BuiltinError::InsufficientArgs),
    }
}

fn sum(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let xs = reduce_input(args[0], ctx)?;
    out.set_scalar(if xs.is_empty() { NA } else { xs.iter().sum() });
    Ok(())
}

fn mean(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let xs = reduce_input(args[0], ctx)?;
    let m = if xs.is_empty() {
        NA
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    };
    out.set_scalar(m);
    Ok(())
}

fn extremum(xs: &[f64], pick: fn(f64, f64) -> f64) -> f64 {
    if xs.iter().any(|x| is_na(*x)) {
        return NA;
    }
    xs.iter().copied().reduce(pick).unwrap_or(NA)
}

fn min(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let xs = reduce_input(args[0], ctx)?;
    out.set_scalar(extremum(&xs, f64::min));
    Ok(())
}

fn max(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let xs = reduce_input(args[0], ctx)?;
    out.set_scalar(extremum(&xs, f64::max));
    Ok(())
}

fn transp(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let m = matrix_arg(args[0])?;
    *out = Value::Matrix(m.transpose());
    Ok(())
}

fn inv(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let m = matrix_arg(args[0])?;
    square(&m)?;
    let result = linalg::inverse(&m).map_err(|e| BuiltinError::Domain(e.message))?;
    *out = Value::Matrix(result);
    Ok(())
}

fn det(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let m = matrix_arg(args[0])?;
    square(&m)?;
    let d = linalg::determinant(&m).map_err(|e| BuiltinError::Domain(e.message))?;
    out.set_scalar(d);
    Ok(())
}

fn real(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let m = matrix_arg(args[0])?;
    *out = Value::Matrix(m.real_part());
    Ok(())
}

fn imag(args: &[Operand<'_>], _: &mut CallCtx<'_>, out: &mut Value) -> Res {
    let m = matrix_arg(args[0])?;
    *out = Value::Matrix(m.imag_part());
    Ok(())
}
