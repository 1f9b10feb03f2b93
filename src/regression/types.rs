//! Regression engine types.

use std::fmt;

use ndarray::{Array2, ArrayView2};

use super::models::Pipeline;
use super::inference::OLSSummary;
use super::residuals::ResidualSummary;
use crate::error::{Error, Result};

/// Candidate model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelKind {
    /// Ordinary least squares.
    Linear,
    /// L2-penalized least squares.
    Ridge,
    /// L1-penalized least squares.
    Lasso,
    /// Polynomial feature expansion followed by ordinary least squares.
    Polynomial,
}

impl ModelKind {
    /// All candidates, in fitting order.
    pub const ALL: [Self; 4] = [Self::Linear, Self::Ridge, Self::Lasso, Self::Polynomial];

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Ridge => "Ridge",
            Self::Lasso => "Lasso",
            Self::Polynomial => "Polynomial",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for the regression comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegressionConfig {
    /// Seed of the train/test shuffle (default: 42).
    pub seed: u64,
    /// Fraction of rows held out for testing (default: 0.2).
    pub test_fraction: f64,
    /// Cross-validation folds over the training partition (default: 5).
    pub folds: usize,
    /// Ridge penalty (default: 1.0).
    pub ridge_alpha: f64,
    /// Lasso penalty (default: 0.1).
    pub lasso_alpha: f64,
    /// Polynomial expansion degree (default: 2).
    pub polynomial_degree: usize,
    /// Predictors to use; every other numeric variable when `None`.
    pub predictors: Option<Vec<String>>,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            folds: 5,
            ridge_alpha: 1.0,
            lasso_alpha: 0.1,
            polynomial_degree: 2,
            predictors: None,
        }
    }
}

impl RegressionConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.test_fraction.is_nan() || self.test_fraction <= 0.0 || self.test_fraction >= 1.0 {
            return Err(Error::invalid_params(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.folds < 2 {
            return Err(Error::invalid_params("at least 2 folds are required"));
        }
        for (name, alpha) in [
            ("ridge_alpha", self.ridge_alpha),
            ("lasso_alpha", self.lasso_alpha),
        ] {
            if alpha.is_nan() || alpha < 0.0 {
                return Err(Error::invalid_params(format!(
                    "{name} must be non-negative, got {alpha}"
                )));
            }
        }
        if self.polynomial_degree < 1 {
            return Err(Error::invalid_params("polynomial degree must be at least 1"));
        }
        Ok(())
    }
}

/// Scores of a fitted candidate.
///
/// Undefined scores (fewer than two test rows) are NaN and serialize as
/// `null`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelMetrics {
    /// R² on the training partition.
    pub train_r2: f64,
    /// R² on the test partition.
    pub test_r2: f64,
    /// Mean squared error on the training partition.
    pub train_mse: f64,
    /// Mean squared error on the test partition.
    pub test_mse: f64,
    /// Mean absolute error on the test partition.
    pub test_mae: f64,
    /// Mean R² over the cross-validation folds.
    pub cv_r2_mean: f64,
    /// Population standard deviation of the fold R².
    pub cv_r2_std: f64,
    /// R² of each fold, in fold order (NaN for an undefined fold).
    pub cv_r2_scores: Vec<f64>,
}

/// A candidate fitted on the training partition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FittedModel {
    /// Candidate family.
    pub kind: ModelKind,
    /// Raw predictors, in column order.
    pub predictors: Vec<String>,
    /// Training means used to fill missing predictor values.
    pub imputation: Vec<f64>,
    /// Names of the model features (expanded for the polynomial candidate).
    pub feature_names: Vec<String>,
    /// Expansion, scaler and coefficients.
    pub pipeline: Pipeline,
    /// Scores.
    pub metrics: ModelMetrics,
}

impl FittedModel {
    /// Predict the target for raw predictor rows (`rows × predictors`).
    ///
    /// NaN entries are filled with the training means first.
    ///
    /// # Errors
    /// `DimensionMismatch` if the column count differs from `predictors`.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.predictors.len() {
            return Err(Error::DimensionMismatch {
                expected: format!("{} predictor columns", self.predictors.len()),
                actual: format!("{}", x.ncols()),
            });
        }
        let mut filled: Array2<f64> = x.to_owned();
        for (mut column, &fill) in filled.columns_mut().into_iter().zip(&self.imputation) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        Ok(self.pipeline.predict(filled.view()).to_vec())
    }

    /// Coefficients paired with feature names, by |coefficient| descending.
    #[must_use]
    pub fn ranked_coefficients(&self) -> Vec<(&str, f64)> {
        let mut pairs: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .map(String::as_str)
            .zip(self.pipeline.coefficients.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        pairs
    }
}

/// Multicollinearity level of a VIF value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VIFLevel {
    /// VIF < 5.
    Low,
    /// 5 ≤ VIF < 10.
    Moderate,
    /// VIF ≥ 10, including infinite.
    High,
}

impl VIFLevel {
    /// Level for a VIF value. NaN is treated as infinite.
    #[must_use]
    pub fn from_vif(vif: f64) -> Self {
        if vif.is_nan() || vif >= 10.0 {
            Self::High
        } else if vif >= 5.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// VIF of one design column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VIFEntry {
    /// Predictor name, or [`CONSTANT_TERM`](super::CONSTANT_TERM).
    pub variable: String,
    /// Variance inflation factor, ≥ 1; infinite under perfect collinearity.
    pub vif: f64,
    /// Whether `vif` is finite.
    pub defined: bool,
    /// Level of `vif`.
    pub level: VIFLevel,
    /// Whether this row is the constant term.
    pub constant: bool,
}

/// Result of the regression comparison.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegressionComparison {
    /// Target variable.
    pub target: String,
    /// Seed of the split.
    pub seed: u64,
    /// Table rows of the training partition, in shuffle order.
    pub train_rows: Vec<usize>,
    /// Table rows of the test partition, in shuffle order.
    pub test_rows: Vec<usize>,
    /// Predictors dropped for having no observed training value.
    pub dropped_predictors: Vec<String>,
    /// Fitted candidates, in [`ModelKind::ALL`] order.
    pub candidates: Vec<FittedModel>,
    /// Index of the best candidate.
    pub best: usize,
    /// VIF of each design column, constant first.
    pub vif: Vec<VIFEntry>,
    /// OLS fit of the unscaled training design with coefficient tests.
    pub ols: OLSSummary,
    /// Residuals of the best candidate on the test partition.
    pub residuals: ResidualSummary,
}

impl RegressionComparison {
    /// The selected candidate.
    #[must_use]
    pub fn best_model(&self) -> &FittedModel {
        &self.candidates[self.best]
    }

    /// Candidate of a given family.
    #[must_use]
    pub fn candidate(&self, kind: ModelKind) -> Option<&FittedModel> {
        self.candidates.iter().find(|c| c.kind == kind)
    }

    /// Predictors with VIF ≥ 10 (the constant is never listed).
    #[must_use]
    pub fn high_vif(&self) -> Vec<&str> {
        self.vif
            .iter()
            .filter(|e| !e.constant && e.level == VIFLevel::High)
            .map(|e| e.variable.as_str())
            .collect()
    }
}
