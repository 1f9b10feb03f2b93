//! Dense symmetric linear algebra for the regression engine.
//!
//! Designs here are small (tens of columns), so the normal equations are
//! solved directly: a cyclic Jacobi eigen-decomposition gives a
//! minimum-norm least-squares solution that tolerates exact collinearity,
//! and a Cholesky factorization handles the positive-definite ridge system.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{Error, Result};

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-13;

/// Relative eigenvalue cutoff below which a direction is treated as null.
pub const RANK_TOLERANCE: f64 = 1e-12;

/// Eigen-decomposition of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues, unordered.
    pub values: Array1<f64>,
    /// Eigenvectors as columns, matching `values`.
    pub vectors: Array2<f64>,
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// # Errors
/// `DimensionMismatch` if the matrix is not square, `NumericalInstability`
/// if it holds non-finite entries or the sweeps do not converge.
pub fn symmetric_eigen(matrix: ArrayView2<'_, f64>) -> Result<SymmetricEigen> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(Error::DimensionMismatch {
            expected: format!("{n}x{n} matrix"),
            actual: format!("{n}x{}", matrix.ncols()),
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(Error::numerical_instability("matrix has non-finite entries"));
    }

    let mut a = matrix.to_owned();
    let mut v = Array2::<f64>::eye(n);
    let scale = a.iter().map(|x| x * x).sum::<f64>().sqrt();

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (p + 1..n).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum::<f64>()
            .sqrt();
        if off <= JACOBI_TOLERANCE * scale.max(f64::MIN_POSITIVE) {
            return Ok(SymmetricEigen {
                values: a.diag().to_owned(),
                vectors: v,
            });
        }

        for p in 0..n {
            for q in p + 1..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    Err(Error::numerical_instability(format!(
        "Jacobi eigen-decomposition did not converge for a {n}x{n} matrix"
    )))
}

/// Solution of a least-squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    /// Minimum-norm coefficients.
    pub coefficients: Array1<f64>,
    /// Numerical rank of the design.
    pub rank: usize,
}

/// Minimum-norm solution of `min ‖y − Xβ‖²`.
///
/// # Algorithm
/// 1. Form the Gram matrix XᵀX and the moment vector Xᵀy
/// 2. Decompose XᵀX = V Λ Vᵀ
/// 3. β = Σ vᵢ (vᵢᵀ Xᵀy) / λᵢ over λᵢ > λmax · [`RANK_TOLERANCE`]
///
/// Null directions contribute nothing, which is the pseudo-inverse solution.
///
/// # Errors
/// `DimensionMismatch` if `x` and `y` disagree on rows, plus the errors of
/// [`symmetric_eigen`].
pub fn lstsq(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<LeastSquares> {
    if x.nrows() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: format!("{} responses", x.nrows()),
            actual: format!("{}", y.len()),
        });
    }

    let gram = x.t().dot(&x);
    let moment = x.t().dot(&y);
    let eigen = symmetric_eigen(gram.view())?;

    let max_eigen = eigen.values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = max_eigen * RANK_TOLERANCE;

    let mut coefficients = Array1::<f64>::zeros(x.ncols());
    let mut rank = 0;
    for (i, &lambda) in eigen.values.iter().enumerate() {
        if lambda <= cutoff || lambda <= 0.0 {
            continue;
        }
        rank += 1;
        let direction = eigen.vectors.column(i);
        let weight = direction.dot(&moment) / lambda;
        coefficients.scaled_add(weight, &direction);
    }

    Ok(LeastSquares { coefficients, rank })
}

/// Moore–Penrose inverse of a symmetric positive semi-definite matrix.
#[derive(Debug, Clone)]
pub struct PseudoInverse {
    /// The inverse restricted to the non-null eigen-directions.
    pub matrix: Array2<f64>,
    /// Number of eigenvalues kept.
    pub rank: usize,
}

/// Pseudo-inverse of a symmetric matrix, `V Λ⁺ Vᵀ`, using the same cutoff as
/// [`lstsq`].
///
/// # Errors
/// The errors of [`symmetric_eigen`].
pub fn symmetric_pinv(matrix: ArrayView2<'_, f64>) -> Result<PseudoInverse> {
    let eigen = symmetric_eigen(matrix)?;
    let n = matrix.nrows();

    let max_eigen = eigen.values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = max_eigen * RANK_TOLERANCE;

    let mut inverse = Array2::<f64>::zeros((n, n));
    let mut rank = 0;
    for (i, &lambda) in eigen.values.iter().enumerate() {
        if lambda <= cutoff || lambda <= 0.0 {
            continue;
        }
        rank += 1;
        let direction = eigen.vectors.column(i);
        for r in 0..n {
            for c in 0..n {
                inverse[[r, c]] += direction[r] * direction[c] / lambda;
            }
        }
    }

    Ok(PseudoInverse {
        matrix: inverse,
        rank,
    })
}

/// Solve `A x = b` for symmetric positive-definite `A` by Cholesky.
///
/// # Errors
/// `DimensionMismatch` on shape disagreement, `NumericalInstability` if `A`
/// is not positive definite.
pub fn cholesky_solve(a: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(Error::DimensionMismatch {
            expected: format!("{n}x{n} system"),
            actual: format!("{}x{} with {} right-hand side", n, a.ncols(), b.len()),
        });
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let dot: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let pivot = a[[i, i]] - dot;
                if pivot.is_nan() || pivot <= 0.0 || pivot.is_infinite() {
                    return Err(Error::numerical_instability(format!(
                        "matrix is not positive definite (pivot {i} = {pivot})"
                    )));
                }
                l[[i, i]] = pivot.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - dot) / l[[j, j]];
            }
        }
    }

    // Forward substitution L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let dot: f64 = (0..i).map(|k| l[[i, k]] * z[k]).sum();
        z[i] = (b[i] - dot) / l[[i, i]];
    }

    // Back substitution Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let dot: f64 = (i + 1..n).map(|k| l[[k, i]] * x[k]).sum();
        x[i] = (z[i] - dot) / l[[i, i]];
    }

    Ok(x)
}
