//! Classical inference for the least-squares fit of the training design.

use ndarray::{Array2, ArrayView1, ArrayView2};
use tracing::debug;

use super::vif::CONSTANT_TERM;
use crate::error::{Error, Result};
use crate::stats::distributions::{f_distribution_p_value, t_two_sided_p_value};
use crate::stats::linalg::symmetric_pinv;

/// One coefficient of the OLS fit with its test against zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoefficientEstimate {
    /// Predictor name, or [`CONSTANT_TERM`] for the intercept.
    pub term: String,
    /// Estimated coefficient.
    pub estimate: f64,
    /// Standard error; NaN without residual degrees of freedom.
    pub std_error: f64,
    /// `estimate / std_error`.
    pub t_statistic: f64,
    /// Two-sided p-value of the t statistic.
    pub p_value: f64,
}

/// OLS fit of `y` on `[1, x]` with coefficient tests and the overall F-test.
///
/// Undefined quantities are NaN and serialize as `null`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OLSSummary {
    /// Number of observations.
    pub observations: usize,
    /// Model degrees of freedom: rank of the design minus the intercept.
    pub df_model: usize,
    /// Residual degrees of freedom: observations minus the rank.
    pub df_residual: usize,
    /// Centered R².
    pub r_squared: f64,
    /// R² adjusted for the model degrees of freedom.
    pub adj_r_squared: f64,
    /// Overall F statistic against the intercept-only model.
    pub f_statistic: f64,
    /// p-value of `f_statistic`.
    pub f_p_value: f64,
    /// Intercept first, then one entry per predictor.
    pub coefficients: Vec<CoefficientEstimate>,
}

impl OLSSummary {
    /// Predictors whose coefficient differs from zero at level `alpha`
    /// (the intercept is never listed).
    #[must_use]
    pub fn significant_terms(&self, alpha: f64) -> Vec<&str> {
        self.coefficients
            .iter()
            .filter(|c| c.term != CONSTANT_TERM && c.p_value < alpha)
            .map(|c| c.term.as_str())
            .collect()
    }
}

/// Ordinary least squares of `y` on `[1, x]` with classical inference.
///
/// # Arguments
/// * `x` - Unscaled predictors, `rows × predictors`
/// * `y` - Response, one value per row
/// * `names` - Predictor names, one per column of `x`
///
/// # Algorithm
/// 1. (XᵀX)⁺ by eigen-decomposition; the rank counts the kept directions
/// 2. β = (XᵀX)⁺Xᵀy, residual variance σ² = SSR / (n − rank)
/// 3. SEⱼ = √(σ² (XᵀX)⁺ⱼⱼ), tⱼ = βⱼ / SEⱼ on n − rank degrees of freedom
/// 4. F = (ESS / (rank − 1)) / σ² on (rank − 1, n − rank) degrees of freedom
///
/// Under exact collinearity the pseudo-inverse keeps every coefficient
/// finite; the degrees of freedom follow the numerical rank.
///
/// # Errors
/// * `DimensionMismatch` if `x`, `y` and `names` disagree
/// * `InsufficientData` for an empty design
/// * `NumericalInstability` if the Gram matrix cannot be decomposed
pub fn ols_summary(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    names: &[String],
) -> Result<OLSSummary> {
    let n = x.nrows();
    if y.len() != n || names.len() != x.ncols() {
        return Err(Error::DimensionMismatch {
            expected: format!("{n} responses and {} names", x.ncols()),
            actual: format!("{} responses and {} names", y.len(), names.len()),
        });
    }
    if n == 0 {
        return Err(Error::insufficient_data("OLS needs at least one row"));
    }

    let mut design = Array2::<f64>::ones((n, x.ncols() + 1));
    design.slice_mut(ndarray::s![.., 1..]).assign(&x);

    let pinv = symmetric_pinv(design.t().dot(&design).view())?;
    let beta = pinv.matrix.dot(&design.t().dot(&y));

    let fitted = design.dot(&beta);
    let ssr: f64 = y.iter().zip(&fitted).map(|(a, f)| (a - f).powi(2)).sum();
    let mean = y.sum() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();

    let df_residual = n.saturating_sub(pinv.rank);
    let df_model = pinv.rank.saturating_sub(1);
    let sigma2 = if df_residual == 0 {
        f64::NAN
    } else {
        ssr / df_residual as f64
    };

    let r_squared = if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN };
    let adj_r_squared = if df_residual == 0 {
        f64::NAN
    } else {
        1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64
    };
    let f_statistic = if df_model == 0 {
        f64::NAN
    } else {
        ((tss - ssr) / df_model as f64) / sigma2
    };
    let f_p_value = f_distribution_p_value(f_statistic, df_model as f64, df_residual as f64);

    let coefficients = std::iter::once(CONSTANT_TERM)
        .chain(names.iter().map(String::as_str))
        .enumerate()
        .map(|(j, term)| {
            let estimate = beta[j];
            let std_error = (sigma2 * pinv.matrix[[j, j]]).sqrt();
            let t_statistic = estimate / std_error;
            CoefficientEstimate {
                term: term.to_string(),
                estimate,
                std_error,
                t_statistic,
                p_value: t_two_sided_p_value(t_statistic, df_residual as f64),
            }
        })
        .collect();

    debug!(
        observations = n,
        rank = pinv.rank,
        r_squared,
        "ols summary computed"
    );

    Ok(OLSSummary {
        observations: n,
        df_model,
        df_residual,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value,
        coefficients,
    })
}
