//! Scoring metrics and k-fold cross-validation.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::models::{Pipeline, PolynomialExpansion, Regressor};
use super::split::kfold;
use crate::error::Result;

/// Coefficient of determination.
///
/// NaN with fewer than two observations. A constant `actual` scores 1.0 when
/// predicted exactly and 0.0 otherwise.
#[must_use]
pub fn r2_score(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    let n = actual.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = actual.sum() / n as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Mean squared error. NaN for empty input.
#[must_use]
pub fn mean_squared_error(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    let diff = &actual - &predicted;
    diff.dot(&diff) / actual.len() as f64
}

/// Mean absolute error. NaN for empty input.
#[must_use]
pub fn mean_absolute_error(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    (&actual - &predicted).mapv(f64::abs).sum() / actual.len() as f64
}

/// Fold scores with their summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation {
    /// R² of each fold in fold order; NaN where undefined.
    pub scores: Vec<f64>,
    /// Mean of the defined scores.
    pub mean: f64,
    /// Population standard deviation of the defined scores.
    pub std: f64,
}

impl CrossValidation {
    fn from_scores(scores: Vec<f64>) -> Self {
        let defined: Vec<f64> = scores.iter().copied().filter(|s| !s.is_nan()).collect();
        let (mean, std) = if defined.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            let n = defined.len() as f64;
            let mean = defined.iter().sum::<f64>() / n;
            let var = defined.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
            (mean, var.sqrt())
        };
        Self { scores, mean, std }
    }
}

/// k-fold cross-validated R² of a pipeline on the training rows.
///
/// # Algorithm
/// 1. Cut the rows into `k` contiguous folds, in the order given
/// 2. For each fold, refit expansion, scaler and regressor on the other
///    folds and score R² on the held-out fold
/// 3. Summarize the defined fold scores
///
/// With the `parallel` feature the folds are fitted on the rayon pool;
/// scores are still reported in fold order.
///
/// # Errors
/// `InsufficientData` if there are fewer rows than folds, or the first
/// fold fit failure.
pub fn cross_validate(
    regressor: &dyn Regressor,
    expansion: Option<&PolynomialExpansion>,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    k: usize,
) -> Result<CrossValidation> {
    let folds = kfold(x.nrows(), k)?;

    let score_fold = |fold: &std::ops::Range<usize>| -> Result<f64> {
        let train: Vec<usize> = (0..x.nrows()).filter(|i| !fold.contains(i)).collect();
        let x_train: Array2<f64> = x.select(Axis(0), &train);
        let y_train: Array1<f64> = y.select(Axis(0), &train);
        let pipeline = Pipeline::fit(regressor, expansion, x_train.view(), y_train.view())?;

        let x_valid = x.slice(ndarray::s![fold.clone(), ..]);
        let y_valid = y.slice(ndarray::s![fold.clone()]);
        let predicted = pipeline.predict(x_valid);
        Ok(r2_score(y_valid, predicted.view()))
    };

    #[cfg(feature = "parallel")]
    let scores: Vec<f64> = {
        use rayon::prelude::*;
        folds.par_iter().map(score_fold).collect::<Result<_>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let scores: Vec<f64> = folds.iter().map(score_fold).collect::<Result<_>>()?;

    Ok(CrossValidation::from_scores(scores))
}
