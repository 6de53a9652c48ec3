//! Dense column-major matrices, real or complex.

use std::fmt;

use num_complex::Complex64;

use crate::errors::{allocation_failure, non_conformable, EvalResult};
use crate::na::slices_na_eq;

/// Observation range a matrix was built from (0-based, inclusive).
///
/// Set when series are gathered into matrix columns so the rows can be
/// labelled with dates later; cleared whenever the node is reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObsSpan {
    pub t1: usize,
    pub t2: usize,
}

/// Element storage.
#[derive(Clone, Debug)]
pub enum MatrixData {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl MatrixData {
    fn len(&self) -> usize {
        match self {
            MatrixData::Real(v) => v.len(),
            MatrixData::Complex(v) => v.len(),
        }
    }
}

/// Dense matrix stored column-major.
#[derive(Clone, Debug)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: MatrixData,
    span: Option<ObsSpan>,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::zeros(0, 0)
    }
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, x: f64) -> Self {
        Self {
            rows,
            cols,
            data: MatrixData::Real(vec![x; rows * cols]),
            span: None,
        }
    }

    /// The 1×1 matrix holding `x`.
    pub fn scalar(x: f64) -> Self {
        Self::filled(1, 1, x)
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn column(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: MatrixData::Real(values),
            span: None,
        }
    }

    pub fn row(values: Vec<f64>) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            data: MatrixData::Real(values),
            span: None,
        }
    }

    pub fn from_col_major(rows: usize, cols: usize, values: Vec<f64>) -> EvalResult<Self> {
        if values.len() != rows * cols {
            return Err(non_conformable("matrix", (rows, cols), (values.len(), 1)));
        }
        Ok(Self {
            rows,
            cols,
            data: MatrixData::Real(values),
            span: None,
        })
    }

    pub fn complex_from_col_major(
        rows: usize,
        cols: usize,
        values: Vec<Complex64>,
    ) -> EvalResult<Self> {
        if values.len() != rows * cols {
            return Err(non_conformable("matrix", (rows, cols), (values.len(), 1)));
        }
        Ok(Self {
            rows,
            cols,
            data: MatrixData::Complex(values),
            span: None,
        })
    }

    /// Build from row slices; every row must have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> EvalResult<Self> {
        let nr = rows.len();
        let nc = rows.first().map_or(0, |r| r.as_ref().len());
        let mut m = Self::zeros(nr, nc);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != nc {
                return Err(non_conformable("matrix", (1, nc), (1, row.len())));
            }
            for (j, &x) in row.iter().enumerate() {
                m.set(i, j, x);
            }
        }
        Ok(m)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1×1.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    /// One row or one column.
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn is_complex(&self) -> bool {
        matches!(self.data, MatrixData::Complex(_))
    }

    pub fn data(&self) -> &MatrixData {
        &self.data
    }

    /// Real elements, column-major; `None` for a complex matrix.
    pub fn real(&self) -> Option<&[f64]> {
        match &self.data {
            MatrixData::Real(v) => Some(v.as_slice()),
            MatrixData::Complex(_) => None,
        }
    }

    pub fn real_mut(&mut self) -> Option<&mut [f64]> {
        match &mut self.data {
            MatrixData::Real(v) => Some(v.as_mut_slice()),
            MatrixData::Complex(_) => None,
        }
    }

    pub fn complex(&self) -> Option<&[Complex64]> {
        match &self.data {
            MatrixData::Complex(v) => Some(v.as_slice()),
            MatrixData::Real(_) => None,
        }
    }

    pub fn complex_mut(&mut self) -> Option<&mut [Complex64]> {
        match &mut self.data {
            MatrixData::Complex(v) => Some(v.as_mut_slice()),
            MatrixData::Real(_) => None,
        }
    }

    #[inline]
    fn offset(&self, r: usize, c: usize) -> usize {
        c * self.rows + r
    }

    /// Element `(r, c)`, 0-based. For a complex matrix this is the real part.
    pub fn get(&self, r: usize, c: usize) -> f64 {
        let k = self.offset(r, c);
        match &self.data {
            MatrixData::Real(v) => v[k],
            MatrixData::Complex(v) => v[k].re,
        }
    }

    pub fn get_complex(&self, r: usize, c: usize) -> Complex64 {
        self.at_complex(self.offset(r, c))
    }

    /// Element at a column-major offset, promoted to complex.
    pub fn at_complex(&self, k: usize) -> Complex64 {
        match &self.data {
            MatrixData::Real(v) => Complex64::new(v[k], 0.0),
            MatrixData::Complex(v) => v[k],
        }
    }

    /// Element at a column-major offset; real part for complex.
    pub fn at(&self, k: usize) -> f64 {
        match &self.data {
            MatrixData::Real(v) => v[k],
            MatrixData::Complex(v) => v[k].re,
        }
    }

    pub fn set(&mut self, r: usize, c: usize, x: f64) {
        let k = self.offset(r, c);
        self.set_at(k, Complex64::new(x, 0.0));
    }

    /// Write at a column-major offset. Real storage drops the imaginary part
    /// only when it is zero; otherwise the matrix is promoted to complex.
    pub fn set_at(&mut self, k: usize, z: Complex64) {
        if z.im != 0.0 {
            self.promote_complex();
        }
        match &mut self.data {
            MatrixData::Real(v) => v[k] = z.re,
            MatrixData::Complex(v) => v[k] = z,
        }
    }

    pub fn set_complex(&mut self, r: usize, c: usize, z: Complex64) {
        let k = self.offset(r, c);
        self.set_at(k, z);
    }

    /// Convert real storage to complex in place.
    pub fn promote_complex(&mut self) {
        if let MatrixData::Real(v) = &self.data {
            let z = v.iter().map(|&x| Complex64::new(x, 0.0)).collect();
            self.data = MatrixData::Complex(z);
        }
    }

    /// Drop the imaginary parts if they are all zero.
    pub fn demote_if_real(&mut self) {
        if let MatrixData::Complex(v) = &self.data {
            if v.iter().all(|z| z.im == 0.0) {
                let re = v.iter().map(|z| z.re).collect();
                self.data = MatrixData::Real(re);
            }
        }
    }

    pub fn span(&self) -> Option<ObsSpan> {
        self.span
    }

    pub fn set_span(&mut self, span: Option<ObsSpan>) {
        self.span = span;
    }

    /// Clear metadata that belongs to a previous use of this storage.
    pub fn clear_meta(&mut self) {
        self.span = None;
    }

    /// Reshape to `rows × cols` real zeros, reusing the allocation.
    pub fn reshape_real(&mut self, rows: usize, cols: usize) -> &mut [f64] {
        self.rows = rows;
        self.cols = cols;
        self.span = None;
        if !matches!(self.data, MatrixData::Real(_)) {
            self.data = MatrixData::Real(Vec::with_capacity(rows * cols));
        }
        match &mut self.data {
            MatrixData::Real(v) => {
                v.clear();
                v.resize(rows * cols, 0.0);
                v.as_mut_slice()
            }
            MatrixData::Complex(_) => unreachable!(),
        }
    }

    /// [`reshape_real`](Self::reshape_real) for sizes taken from user input:
    /// a size that overflows or cannot be allocated is an error instead of
    /// an abort.
    pub fn try_reshape_real(&mut self, rows: usize, cols: usize) -> EvalResult<&mut [f64]> {
        let too_big = || allocation_failure(format!("{rows}x{cols} matrix"));
        let len = rows.checked_mul(cols).ok_or_else(too_big)?;
        if !matches!(self.data, MatrixData::Real(_)) {
            self.data = MatrixData::Real(Vec::new());
        }
        if let MatrixData::Real(v) = &mut self.data {
            v.clear();
            v.try_reserve(len).map_err(|_| too_big())?;
        }
        Ok(self.reshape_real(rows, cols))
    }

    /// Real zeros, `rows × cols`, or an allocation error.
    pub fn try_zeros(rows: usize, cols: usize) -> EvalResult<Self> {
        let mut m = Self::default();
        m.try_reshape_real(rows, cols)?;
        Ok(m)
    }

    /// Reshape to `rows × cols` complex zeros, reusing the allocation.
    pub fn reshape_complex(&mut self, rows: usize, cols: usize) -> &mut [Complex64] {
        self.rows = rows;
        self.cols = cols;
        self.span = None;
        if !matches!(self.data, MatrixData::Complex(_)) {
            self.data = MatrixData::Complex(Vec::with_capacity(rows * cols));
        }
        match &mut self.data {
            MatrixData::Complex(v) => {
                v.clear();
                v.resize(rows * cols, Complex64::new(0.0, 0.0));
                v.as_mut_slice()
            }
            MatrixData::Real(_) => unreachable!(),
        }
    }

    /// Copy `src` into `self`, reusing the allocation when possible.
    pub fn copy_from(&mut self, src: &Matrix) {
        self.rows = src.rows;
        self.cols = src.cols;
        self.span = src.span;
        match (&mut self.data, &src.data) {
            (MatrixData::Real(dst), MatrixData::Real(s)) => dst.clone_from(s),
            (MatrixData::Complex(dst), MatrixData::Complex(s)) => dst.clone_from(s),
            (dst, s) => *dst = s.clone(),
        }
    }

    /// Transpose; complex matrices are conjugated.
    pub fn transpose(&self) -> Matrix {
        let (r, c) = self.shape();
        let mut out = Matrix::zeros(c, r);
        match &self.data {
            MatrixData::Real(v) => {
                if let Some(dst) = out.real_mut() {
                    for j in 0..c {
                        for i in 0..r {
                            dst[i * c + j] = v[j * r + i];
                        }
                    }
                }
            }
            MatrixData::Complex(v) => {
                let dst = out.reshape_complex(c, r);
                for j in 0..c {
                    for i in 0..r {
                        dst[i * c + j] = v[j * r + i].conj();
                    }
                }
            }
        }
        out
    }

    /// Real parts as a new matrix.
    pub fn real_part(&self) -> Matrix {
        let values = (0..self.len()).map(|k| self.at(k)).collect();
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: MatrixData::Real(values),
            span: None,
        }
    }

    /// Imaginary parts as a new real matrix.
    pub fn imag_part(&self) -> Matrix {
        let values = match &self.data {
            MatrixData::Real(v) => vec![0.0; v.len()],
            MatrixData::Complex(v) => v.iter().map(|z| z.im).collect(),
        };
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: MatrixData::Real(values),
            span: None,
        }
    }

    /// Whether every entry is exactly 0 or 1.
    pub fn is_zero_one(&self) -> bool {
        match &self.data {
            MatrixData::Real(v) => v.iter().all(|&x| x == 0.0 || x == 1.0),
            MatrixData::Complex(_) => false,
        }
    }
}

/// Equality compares shape and values; NA equals NA. The observation span
/// is metadata and does not participate.
impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        if self.shape() != other.shape() || self.data.len() != other.data.len() {
            return false;
        }
        match (&self.data, &other.data) {
            (MatrixData::Real(a), MatrixData::Real(b)) => slices_na_eq(a, b),
            (MatrixData::Complex(a), MatrixData::Complex(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for i in 0..self.rows {
            if i > 0 {
                write!(f, "; ")?;
            }
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, ", ")?;
                }
                let z = self.get_complex(i, j);
                if z.re.is_nan() {
                    write!(f, "NA")?;
                } else if self.is_complex() {
                    write!(f, "{}{:+}i", z.re, z.im)?;
                } else {
                    write!(f, "{}", z.re)?;
                }
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
