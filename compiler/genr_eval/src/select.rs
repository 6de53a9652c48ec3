//! Subscript selection.
//!
//! Subscripts are 1-based; ranges are inclusive. For a matrix:
//!
//! - `M[i,j]`, `M[i:j,]`, `M[,k]` select rows and columns;
//! - a single subscript on a vector selects elements, on any other matrix it
//!   is a linear (column-major) index;
//! - a 0/1 matrix with exactly the container's shape is a mask, any other
//!   matrix argument is a vector of indices;
//! - `diag`, `upper` and `lower` select the diagonal and the strict upper or
//!   lower triangle; `real` and `imag` select parts of a complex matrix.

use genr_ir::Dummy;
use genr_value::errors::{domain_error, index_out_of_bounds, type_mismatch};
use genr_value::{EvalResult, Matrix, ValueKind};

/// An evaluated subscript argument.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SubArg {
    All,
    Dummy(Dummy),
    Num(f64),
    Range(f64, f64),
    Str(String),
    Matrix(Matrix),
}

/// 1-based index to 0-based position, bounds-checked against `len`.
pub(crate) fn position(x: f64, len: usize) -> EvalResult<usize> {
    if x.is_nan() || x.fract() != 0.0 {
        return Err(domain_error(format!("invalid index {x}")));
    }
    if x < 1.0 || x > len as f64 {
        return Err(index_out_of_bounds(x as i64, len));
    }
    Ok(x as usize - 1)
}

/// 1-based inclusive range to 0-based bounds.
pub(crate) fn range(lo: f64, hi: f64, len: usize) -> EvalResult<(usize, usize)> {
    let lo = position(lo, len)?;
    let hi = position(hi, len)?;
    if hi < lo {
        return Err(domain_error(format!("empty range {}:{}", lo + 1, hi + 1)));
    }
    Ok((lo, hi))
}

/// Positions along one dimension of length `len`.
fn dimension(arg: &SubArg, len: usize) -> EvalResult<Vec<usize>> {
    match arg {
        SubArg::All => Ok((0..len).collect()),
        SubArg::Num(x) => Ok(vec![position(*x, len)?]),
        SubArg::Range(lo, hi) => {
            let (lo, hi) = range(*lo, *hi, len)?;
            Ok((lo..=hi).collect())
        }
        SubArg::Matrix(m) => index_vector(m, len),
        other => Err(type_mismatch("row or column index", kind_of(other))),
    }
}

fn index_vector(m: &Matrix, len: usize) -> EvalResult<Vec<usize>> {
    if !m.is_vector() && !m.is_empty() {
        return Err(type_mismatch("index vector", ValueKind::Matrix));
    }
    (0..m.len()).map(|k| position(m.at(k), len)).collect()
}

fn kind_of(arg: &SubArg) -> ValueKind {
    match arg {
        SubArg::Str(_) => ValueKind::Str,
        SubArg::Matrix(_) => ValueKind::Matrix,
        SubArg::Num(_) => ValueKind::Scalar,
        _ => ValueKind::Undefined,
    }
}

/// Part of a complex matrix addressed by `real`/`imag`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Part {
    Real,
    Imag,
}

/// A resolved matrix selection.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MatrixSel {
    /// Column-major offsets into the container, and the shape of the block
    /// they form.
    Block {
        offsets: Vec<usize>,
        rows: usize,
        cols: usize,
        /// Every subscript was a single index.
        single: bool,
    },
    Part(Part),
}

impl MatrixSel {
    /// Resolve subscripts against a matrix of `shape`.
    pub fn resolve(args: &[SubArg], shape: (usize, usize)) -> EvalResult<MatrixSel> {
        let (nr, nc) = shape;
        match args {
            [SubArg::Dummy(Dummy::Real)] => Ok(MatrixSel::Part(Part::Real)),
            [SubArg::Dummy(Dummy::Imag)] => Ok(MatrixSel::Part(Part::Imag)),
            [SubArg::Dummy(d)] => {
                let offsets = triangle(*d, nr, nc);
                let n = offsets.len();
                Ok(MatrixSel::Block {
                    offsets,
                    rows: n,
                    cols: 1,
                    single: false,
                })
            }
            [arg] => Self::linear(arg, nr, nc),
            [r, c] => {
                let rows = dimension(r, nr)?;
                let cols = dimension(c, nc)?;
                let offsets = cols
                    .iter()
                    .flat_map(|&j| rows.iter().map(move |&i| j * nr + i))
                    .collect();
                Ok(MatrixSel::Block {
                    offsets,
                    rows: rows.len(),
                    cols: cols.len(),
                    single: matches!((r, c), (SubArg::Num(_), SubArg::Num(_))),
                })
            }
            _ => Err(domain_error(format!(
                "matrix takes 1 or 2 subscripts, got {}",
                args.len()
            ))),
        }
    }

    fn linear(arg: &SubArg, nr: usize, nc: usize) -> EvalResult<MatrixSel> {
        let len = nr * nc;
        let offsets = match arg {
            SubArg::Matrix(m) if m.shape() == (nr, nc) && m.is_zero_one() && len > 1 => (0..len)
                .filter(|&k| m.at(k) == 1.0)
                .collect(),
            other => dimension(other, len)?,
        };
        let n = offsets.len();
        // a row vector keeps its orientation
        let (rows, cols) = if nr == 1 && nc > 1 { (1, n) } else { (n, 1) };
        Ok(MatrixSel::Block {
            offsets,
            rows,
            cols,
            single: matches!(arg, SubArg::Num(_)),
        })
    }
}

/// Offsets of the diagonal or a strict triangle, column-major.
fn triangle(d: Dummy, nr: usize, nc: usize) -> Vec<usize> {
    let mut out = Vec::new();
    for j in 0..nc {
        for i in 0..nr {
            let keep = match d {
                Dummy::Diag => i == j,
                Dummy::Upper => i < j,
                Dummy::Lower => i > j,
                Dummy::Real | Dummy::Imag => false,
            };
            if keep {
                out.push(j * nr + i);
            }
        }
    }
    out
}

/// Read a selection out of `m`.
pub(crate) fn extract(m: &Matrix, sel: &MatrixSel) -> Matrix {
    match sel {
        MatrixSel::Part(Part::Real) => m.real_part(),
        MatrixSel::Part(Part::Imag) => m.imag_part(),
        MatrixSel::Block {
            offsets,
            rows,
            cols,
            ..
        } => {
            let mut out = Matrix::zeros(*rows, *cols);
            if m.is_complex() {
                out.promote_complex();
            }
            for (k, &src) in offsets.iter().enumerate() {
                out.set_at(k, m.at_complex(src));
            }
            out
        }
    }
}

/// Write `block` (or a broadcast scalar) into the selected positions of `m`.
pub(crate) fn splice(m: &mut Matrix, sel: &MatrixSel, block: &Matrix) -> EvalResult<()> {
    match sel {
        MatrixSel::Part(part) => {
            if block.shape() != m.shape() && !block.is_scalar() {
                return Err(genr_value::errors::non_conformable(
                    "=",
                    m.shape(),
                    block.shape(),
                ));
            }
            for k in 0..m.len() {
                let src = if block.is_scalar() { 0 } else { k };
                let z = m.at_complex(k);
                let x = block.at(src);
                let z = match part {
                    Part::Real => num_complex::Complex64::new(x, z.im),
                    Part::Imag => num_complex::Complex64::new(z.re, x),
                };
                m.set_at(k, z);
            }
            m.demote_if_real();
            Ok(())
        }
        MatrixSel::Block {
            offsets,
            rows,
            cols,
            ..
        } => {
            let broadcast = block.is_scalar();
            if !broadcast && block.len() != offsets.len() {
                return Err(genr_value::errors::non_conformable(
                    "=",
                    (*rows, *cols),
                    block.shape(),
                ));
            }
            for (k, &dst) in offsets.iter().enumerate() {
                let src = if broadcast { 0 } else { k };
                m.set_at(dst, block.at_complex(src));
            }
            Ok(())
        }
    }
}

/// Characters `lo..=hi` (0-based) of `s`.
pub(crate) fn substring(s: &str, lo: usize, hi: usize) -> String {
    s.chars().skip(lo).take(hi + 1 - lo).collect()
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
