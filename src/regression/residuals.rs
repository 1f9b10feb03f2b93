//! Residual diagnostics of a fitted candidate on the test partition.
//!
//! Purely observational: nothing here feeds back into model selection.

use crate::error::{Error, Result};
use crate::stats::{mean, shapiro_wilk, std_dev, TestResult};

/// Share of residuals expected within ±2 standard deviations under normality.
pub const NOMINAL_TWO_SIGMA_COVERAGE: f64 = 0.95;

/// Distributional summary of residuals (actual − predicted).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResidualSummary {
    /// Number of residuals.
    pub count: usize,
    /// Mean residual.
    pub mean: f64,
    /// Sample standard deviation (n − 1); NaN for a single residual.
    pub std_dev: f64,
    /// Fraction of residuals with |r| ≤ 2·sd.
    pub within_two_sd: f64,
    /// `within_two_sd` minus the nominal 0.95.
    pub coverage_gap: f64,
    /// Largest absolute residual.
    pub max_abs: f64,
    /// Shapiro–Wilk test of the residuals; `None` below 3 residuals.
    pub normality: Option<TestResult>,
}

/// Summarize `actual − predicted`.
///
/// # Errors
/// `InsufficientData` when there are no residuals, `DimensionMismatch` when
/// the two slices differ in length.
pub fn diagnose(actual: &[f64], predicted: &[f64]) -> Result<ResidualSummary> {
    if actual.len() != predicted.len() {
        return Err(Error::DimensionMismatch {
            expected: format!("{} predictions", actual.len()),
            actual: format!("{}", predicted.len()),
        });
    }
    if actual.is_empty() {
        return Err(Error::insufficient_data("no residuals to diagnose"));
    }

    let residuals: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    let count = residuals.len();
    let sd = std_dev(&residuals, 1);
    let within = residuals.iter().filter(|r| r.abs() <= 2.0 * sd).count();
    let within_two_sd = within as f64 / count as f64;

    Ok(ResidualSummary {
        count,
        mean: mean(&residuals),
        std_dev: sd,
        within_two_sd,
        coverage_gap: within_two_sd - NOMINAL_TWO_SIGMA_COVERAGE,
        max_abs: residuals.iter().fold(0.0_f64, |m, r| m.max(r.abs())),
        normality: shapiro_wilk(&residuals).ok(),
    })
}
