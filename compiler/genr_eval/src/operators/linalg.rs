//! Dense linear algebra on [`Matrix`] values.

use num_complex::Complex64;

use genr_value::errors::{allocation_failure, domain_error, non_conformable, type_mismatch};
use genr_value::{EvalError, EvalResult, Matrix, ValueKind};

/// Pivots smaller than this are treated as zero.
const SINGULAR_EPS: f64 = 1e-14;

fn singular() -> EvalError {
    domain_error("matrix is singular")
}

fn complex_unsupported(what: &str) -> EvalError {
    type_mismatch(format!("real matrix for {what}"), ValueKind::Matrix)
}

/// `a * b`.
pub fn matmul(a: &Matrix, b: &Matrix) -> EvalResult<Matrix> {
    if a.cols() != b.rows() {
        return Err(non_conformable("*", a.shape(), b.shape()));
    }
    let (n, k, m) = (a.rows(), a.cols(), b.cols());
    if let (Some(x), Some(y)) = (a.real(), b.real()) {
        let mut out = Matrix::zeros(n, m);
        if let Some(dst) = out.real_mut() {
            for j in 0..m {
                for p in 0..k {
                    let y_pj = y[j * k + p];
                    for i in 0..n {
                        dst[j * n + i] += x[p * n + i] * y_pj;
                    }
                }
            }
        }
        return Ok(out);
    }
    let mut out = Matrix::zeros(n, m);
    let dst = out.reshape_complex(n, m);
    for j in 0..m {
        for p in 0..k {
            let y_pj = b.at_complex(j * k + p);
            for i in 0..n {
                dst[j * n + i] += a.at_complex(p * n + i) * y_pj;
            }
        }
    }
    out.demote_if_real();
    Ok(out)
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
pub fn solve(a: &Matrix, b: &Matrix) -> EvalResult<Matrix> {
    let (Some(av), Some(bv)) = (a.real(), b.real()) else {
        return Err(complex_unsupported("\\"));
    };
    let n = a.rows();
    if !a.is_square() || b.rows() != n {
        return Err(non_conformable("\\", a.shape(), b.shape()));
    }
    if av.iter().chain(bv).any(|x| x.is_nan()) {
        return Err(genr_value::errors::missing_data("matrix"));
    }
    let m = b.cols();
    // Row-major working copies are easier to pivot.
    let mut lhs: Vec<Vec<f64>> = (0..n).map(|i| (0..n).map(|j| av[j * n + i]).collect()).collect();
    let mut rhs: Vec<Vec<f64>> = (0..n).map(|i| (0..m).map(|j| bv[j * n + i]).collect()).collect();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| lhs[i][col].abs().total_cmp(&lhs[j][col].abs()))
            .ok_or_else(singular)?;
        if lhs[pivot][col].abs() < SINGULAR_EPS {
            return Err(singular());
        }
        lhs.swap(col, pivot);
        rhs.swap(col, pivot);
        for row in col + 1..n {
            let factor = lhs[row][col] / lhs[col][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                lhs[row][j] -= factor * lhs[col][j];
            }
            for j in 0..m {
                rhs[row][j] -= factor * rhs[col][j];
            }
        }
    }

    let mut x = Matrix::zeros(n, m);
    for j in 0..m {
        for i in (0..n).rev() {
            let mut acc = rhs[i][j];
            for p in i + 1..n {
                acc -= lhs[i][p] * x.get(p, j);
            }
            x.set(i, j, acc / lhs[i][i]);
        }
    }
    Ok(x)
}

pub fn inverse(a: &Matrix) -> EvalResult<Matrix> {
    if !a.is_square() {
        return Err(non_conformable("inv", a.shape(), a.shape()));
    }
    solve(a, &Matrix::identity(a.rows()))
}

/// `a * inv(b)`, computed as `solve(b', a')'`.
pub fn right_divide(a: &Matrix, b: &Matrix) -> EvalResult<Matrix> {
    if a.cols() != b.rows() || !b.is_square() {
        return Err(non_conformable("/", a.shape(), b.shape()));
    }
    Ok(solve(&b.transpose(), &a.transpose())?.transpose())
}

pub fn determinant(a: &Matrix) -> EvalResult<f64> {
    let Some(av) = a.real() else {
        return Err(complex_unsupported("det"));
    };
    if !a.is_square() {
        return Err(non_conformable("det", a.shape(), a.shape()));
    }
    let n = a.rows();
    let mut w: Vec<Vec<f64>> = (0..n).map(|i| (0..n).map(|j| av[j * n + i]).collect()).collect();
    let mut det = 1.0;
    for col in 0..n {
        let Some(pivot) =
            (col..n).max_by(|&i, &j| w[i][col].abs().total_cmp(&w[j][col].abs()))
        else {
            break;
        };
        if w[pivot][col].abs() < SINGULAR_EPS {
            return Ok(0.0);
        }
        if pivot != col {
            w.swap(col, pivot);
            det = -det;
        }
        det *= w[col][col];
        for row in col + 1..n {
            let factor = w[row][col] / w[col][col];
            for j in col..n {
                w[row][j] -= factor * w[col][j];
            }
        }
    }
    Ok(det)
}

/// `a ^ k` for a square matrix and a non-negative integer `k`.
pub fn power(a: &Matrix, k: f64) -> EvalResult<Matrix> {
    if !a.is_square() {
        return Err(non_conformable("^", a.shape(), (1, 1)));
    }
    if k < 0.0 || k.fract() != 0.0 || !k.is_finite() {
        return Err(domain_error("matrix power must be a non-negative integer"));
    }
    let mut exp = k as u64;
    let mut result = Matrix::identity(a.rows());
    let mut base = a.clone();
    while exp > 0 {
        if exp & 1 == 1 {
            result = matmul(&result, &base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = matmul(&base, &base)?;
        }
    }
    Ok(result)
}

/// Kronecker product.
pub fn kron(a: &Matrix, b: &Matrix) -> EvalResult<Matrix> {
    let (ar, ac) = a.shape();
    let (br, bc) = b.shape();
    let too_big = || allocation_failure(format!("{ar}x{ac} ** {br}x{bc}"));
    let rows = ar.checked_mul(br).ok_or_else(too_big)?;
    let cols = ac.checked_mul(bc).ok_or_else(too_big)?;
    let mut out = Matrix::try_zeros(rows, cols)?;
    let complex = a.is_complex() || b.is_complex();
    if complex {
        out.promote_complex();
    }
    for ja in 0..ac {
        for ia in 0..ar {
            let x = a.get_complex(ia, ja);
            for jb in 0..bc {
                for ib in 0..br {
                    let z: Complex64 = x * b.get_complex(ib, jb);
                    out.set_complex(ia * br + ib, ja * bc + jb, z);
                }
            }
        }
    }
    Ok(out)
}

/// Side-by-side concatenation (`~`). An empty operand contributes nothing.
pub fn hcat(a: &Matrix, b: &Matrix) -> EvalResult<Matrix> {
    if a.is_empty() {
        return Ok(b.clone());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }
    if a.rows() != b.rows() {
        return Err(non_conformable("~", a.shape(), b.shape()));
    }
    let rows = a.rows();
    let mut out = Matrix::zeros(rows, a.cols() + b.cols());
    if a.is_complex() || b.is_complex() {
        out.promote_complex();
    }
    for k in 0..a.len() {
        out.set_at(k, a.at_complex(k));
    }
    for k in 0..b.len() {
        out.set_at(a.len() + k, b.at_complex(k));
    }
    Ok(out)
}

/// Stacked concatenation (`|`). An empty operand contributes nothing.
pub fn vcat(a: &Matrix, b: &Matrix) -> EvalResult<Matrix> {
    if a.is_empty() {
        return Ok(b.clone());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }
    if a.cols() != b.cols() {
        return Err(non_conformable("|", a.shape(), b.shape()));
    }
    let (ra, rb) = (a.rows(), b.rows());
    let mut out = Matrix::zeros(ra + rb, a.cols());
    if a.is_complex() || b.is_complex() {
        out.promote_complex();
    }
    for j in 0..a.cols() {
        for i in 0..ra {
            out.set_complex(i, j, a.get_complex(i, j));
        }
        for i in 0..rb {
            out.set_complex(ra + i, j, b.get_complex(i, j));
        }
    }
    Ok(out)
}
