//! Regression comparison engine.
//!
//! Fits four candidate models to the same seeded train/test partition and
//! ranks them by held-out R²:
//!
//! - **Linear**: ordinary least squares (minimum-norm under collinearity)
//! - **Ridge**: L2 penalty, α = 1.0 by default
//! - **Lasso**: L1 penalty, α = 0.1 by default
//! - **Polynomial**: degree-2 expansion followed by least squares
//!
//! Alongside the comparison it reports k-fold cross-validated R², variance
//! inflation factors of the training design, an OLS coefficient table with
//! t-tests and the overall F-test, and residual diagnostics of the selected
//! model.
//!
//! ## Quick Start
//!
//! ```rust
//! use agrostat::regression::{compare_models, RegressionConfig};
//! use agrostat::table::{TableBuilder, YIELD};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let moisture: Vec<f64> = (1..=20).map(|i| f64::from(i) * 5.0).collect();
//! let ph: Vec<f64> = (1..=20).map(|i| 5.5 + f64::from(i % 4) * 0.3).collect();
//! let yield_kg: Vec<f64> = moisture.iter().zip(&ph).map(|(m, p)| 0.1 * m + p).collect();
//!
//! let table = TableBuilder::new()
//!     .numeric_column("umidade_solo", moisture)
//!     .numeric_column("ph", ph)
//!     .numeric_column(YIELD, yield_kg)
//!     .build()?;
//!
//! let comparison = compare_models(&table, YIELD, &RegressionConfig::default())?;
//! println!("best: {}", comparison.best_model().kind);
//! assert!(comparison.best_model().metrics.test_r2 > 0.99);
//! # Ok(())
//! # }
//! ```

pub mod cv;
pub mod inference;
pub mod models;
pub mod residuals;
pub mod split;
mod types;
pub mod vif;

pub use cv::{cross_validate, mean_absolute_error, mean_squared_error, r2_score, CrossValidation};
pub use inference::{ols_summary, CoefficientEstimate, OLSSummary};
pub use models::{
    regressor_for, LassoRegression, LinearFit, OrdinaryLeastSquares, Pipeline,
    PolynomialExpansion, Regressor, RidgeRegression, StandardScaler,
};
pub use residuals::{diagnose, ResidualSummary};
pub use split::{kfold, train_test_split, Split};
pub use types::{
    FittedModel, ModelKind, ModelMetrics, RegressionComparison, RegressionConfig, VIFEntry,
    VIFLevel,
};
pub use vif::{variance_inflation, CONSTANT_TERM};

use std::cmp::Ordering;

use ndarray::{Array1, Array2, Axis};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::table::ObservationTable;

/// Compare the candidate models for predicting `target`.
///
/// # Arguments
/// * `table` - Observation table
/// * `target` - Numeric response variable
/// * `config` - Seed, split, folds, penalties and optional predictor subset
///
/// # Returns
/// * Every fitted candidate with its scores, the index of the best one, the
///   VIF table, the OLS inference table and the best candidate's residual
///   summary
///
/// # Algorithm
/// 1. Keep the rows where the target is present
/// 2. Shuffle them with the seed and hold out ⌈`test_fraction`·n⌉ for testing
/// 3. Fill missing predictor values with training means; drop predictors
///    never observed in training
/// 4. Fit each candidate on standardized training features; score on both
///    partitions and by k-fold CV over the training partition
/// 5. Pick the highest test R², breaking ties by lower test MSE
/// 6. On the unscaled training design, compute VIFs and the OLS coefficient
///    table
///
/// # Errors
/// * `InsufficientData` if the target is not numeric, a partition is empty,
///   or there are fewer training rows than folds
/// * `DegenerateFit` if no usable predictor remains
/// * `UnknownVariable` / `KindMismatch` for a bad configured predictor
/// * `InvalidParams` for an invalid configuration
pub fn compare_models(
    table: &ObservationTable,
    target: &str,
    config: &RegressionConfig,
) -> Result<RegressionComparison> {
    config.validate()?;
    if !table.is_numeric(target) {
        return Err(Error::insufficient_data(format!(
            "target '{target}' is not a numeric variable of the table"
        )));
    }

    let requested = select_predictors(table, target, config)?;
    let rows = table.complete_rows(&[target])?;
    let split = train_test_split(rows.len(), config.test_fraction, config.seed)?;
    let train_rows: Vec<usize> = split.train.iter().map(|&i| rows[i]).collect();
    let test_rows: Vec<usize> = split.test.iter().map(|&i| rows[i]).collect();

    // Training means; a predictor without any observed training value is unusable.
    let mut predictors = Vec::new();
    let mut imputation = Vec::new();
    let mut dropped_predictors = Vec::new();
    for name in requested {
        let column = table.numeric(&name)?;
        let observed: Vec<f64> = train_rows.iter().filter_map(|&r| column.get(r)).collect();
        if observed.is_empty() {
            warn!(predictor = %name, "predictor has no observed training value, dropped");
            dropped_predictors.push(name);
        } else {
            imputation.push(observed.iter().sum::<f64>() / observed.len() as f64);
            predictors.push(name);
        }
    }

    if predictors.is_empty() {
        return Err(Error::degenerate_fit(format!(
            "no usable predictor for '{target}'"
        )));
    }
    if train_rows.len() < config.folds {
        return Err(Error::insufficient_data(format!(
            "{} training rows cannot support {}-fold cross-validation",
            train_rows.len(),
            config.folds
        )));
    }

    let x_train = imputed_matrix(table, &predictors, &imputation, &train_rows)?;
    let x_test = imputed_matrix(table, &predictors, &imputation, &test_rows)?;
    let y_train = target_vector(table, target, &train_rows)?;
    let y_test = target_vector(table, target, &test_rows)?;

    let candidates = ModelKind::ALL
        .iter()
        .map(|&kind| -> Result<FittedModel> {
            let regressor = regressor_for(kind, config.ridge_alpha, config.lasso_alpha);
            let expansion = (kind == ModelKind::Polynomial)
                .then(|| PolynomialExpansion::new(predictors.len(), config.polynomial_degree));

            let pipeline =
                Pipeline::fit(regressor.as_ref(), expansion.as_ref(), x_train.view(), y_train.view())?;
            let train_pred = pipeline.predict(x_train.view());
            let test_pred = pipeline.predict(x_test.view());
            let cv = cross_validate(
                regressor.as_ref(),
                expansion.as_ref(),
                x_train.view(),
                y_train.view(),
                config.folds,
            )?;

            let feature_names = match &expansion {
                Some(expansion) => expansion.feature_names(&predictors),
                None => predictors.clone(),
            };
            Ok(FittedModel {
                kind,
                predictors: predictors.clone(),
                imputation: imputation.clone(),
                feature_names,
                pipeline,
                metrics: ModelMetrics {
                    train_r2: r2_score(y_train.view(), train_pred.view()),
                    test_r2: r2_score(y_test.view(), test_pred.view()),
                    train_mse: mean_squared_error(y_train.view(), train_pred.view()),
                    test_mse: mean_squared_error(y_test.view(), test_pred.view()),
                    test_mae: mean_absolute_error(y_test.view(), test_pred.view()),
                    cv_r2_mean: cv.mean,
                    cv_r2_std: cv.std,
                    cv_r2_scores: cv.scores,
                },
            })
        })
        .collect::<Result<Vec<FittedModel>>>()?;

    let best = select_best(&candidates);
    let vif = variance_inflation(x_train.view(), &predictors)?;
    let ols = ols_summary(x_train.view(), y_train.view(), &predictors)?;

    let best_pred = candidates[best].pipeline.predict(x_test.view());
    let residuals = diagnose(&y_test.to_vec(), &best_pred.to_vec())?;

    debug!(
        response = %target,
        train = train_rows.len(),
        test = test_rows.len(),
        predictors = predictors.len(),
        best = %candidates[best].kind,
        "regression comparison complete"
    );

    Ok(RegressionComparison {
        target: target.to_string(),
        seed: config.seed,
        train_rows,
        test_rows,
        dropped_predictors,
        candidates,
        best,
        vif,
        ols,
        residuals,
    })
}

fn select_predictors(
    table: &ObservationTable,
    target: &str,
    config: &RegressionConfig,
) -> Result<Vec<String>> {
    match &config.predictors {
        Some(list) => {
            let mut selected: Vec<String> = Vec::with_capacity(list.len());
            for name in list {
                table.numeric(name)?;
                if name != target && !selected.contains(name) {
                    selected.push(name.clone());
                }
            }
            Ok(selected)
        }
        None => Ok(table
            .schema()
            .numeric_names()
            .filter(|&name| name != target)
            .map(str::to_string)
            .collect()),
    }
}

fn imputed_matrix(
    table: &ObservationTable,
    predictors: &[String],
    imputation: &[f64],
    rows: &[usize],
) -> Result<Array2<f64>> {
    let mut x = Array2::<f64>::zeros((rows.len(), predictors.len()));
    for ((mut column, name), &fill) in x.axis_iter_mut(Axis(1)).zip(predictors).zip(imputation) {
        let source = table.numeric(name)?;
        for (value, &row) in column.iter_mut().zip(rows) {
            *value = source.get(row).unwrap_or(fill);
        }
    }
    Ok(x)
}

fn target_vector(table: &ObservationTable, target: &str, rows: &[usize]) -> Result<Array1<f64>> {
    let column = table.numeric(target)?;
    rows.iter()
        .map(|&row| {
            column
                .get(row)
                .ok_or_else(|| Error::insufficient_data(format!("row {row} has no '{target}'")))
        })
        .collect()
}

/// Highest test R² first, lower test MSE on ties, undefined R² last.
fn select_best(candidates: &[FittedModel]) -> usize {
    let rank = |a: &FittedModel, b: &FittedModel| -> Ordering {
        let (ra, rb) = (a.metrics.test_r2, b.metrics.test_r2);
        match (ra.is_nan(), rb.is_nan()) {
            (true, true) => a.metrics.test_mse.total_cmp(&b.metrics.test_mse),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => rb
                .total_cmp(&ra)
                .then_with(|| a.metrics.test_mse.total_cmp(&b.metrics.test_mse)),
        }
    };
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&i, &j| rank(&candidates[i], &candidates[j]));
    order.first().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{TableBuilder, YIELD};

    fn perfect_table() -> ObservationTable {
        TableBuilder::new()
            .numeric_column("umidade_solo", (1..=9).map(|i| f64::from(i) * 10.0))
            .numeric_column(YIELD, (1..=9).map(f64::from))
            .build()
            .unwrap()
    }

    fn noisy_table() -> ObservationTable {
        let n = 30;
        let a: Vec<f64> = (0..n).map(|i| f64::from(i % 7) + 0.1 * f64::from(i)).collect();
        let b: Vec<f64> = (0..n).map(|i| f64::from((i * 5) % 11)).collect();
        let noise: Vec<f64> = (0..n).map(|i| f64::from((i * 3) % 5) * 0.2 - 0.4).collect();
        let y: Vec<f64> = (0..n as usize)
            .map(|i| 2.0 + 1.5 * a[i] - 0.7 * b[i] + noise[i])
            .collect();
        TableBuilder::new()
            .numeric_column("a", a)
            .numeric_column("b", b)
            .numeric_column(YIELD, y)
            .build()
            .unwrap()
    }

    #[test]
    fn test_perfect_relation() {
        let comparison =
            compare_models(&perfect_table(), YIELD, &RegressionConfig::default()).unwrap();

        assert_eq!(comparison.test_rows.len(), 2);
        assert_eq!(comparison.train_rows.len(), 7);
        assert_eq!(comparison.candidates.len(), 4);

        let linear = comparison.candidate(ModelKind::Linear).unwrap();
        assert!((linear.metrics.test_r2 - 1.0).abs() < 1e-9);
        assert!(linear.metrics.test_mse < 1e-12);
        assert!((comparison.best_model().metrics.test_r2 - 1.0).abs() < 1e-9);

        // 7 training rows in 5 folds: three folds have a single row
        assert_eq!(linear.metrics.cv_r2_scores.len(), 5);
        assert_eq!(linear.metrics.cv_r2_scores.iter().filter(|s| s.is_nan()).count(), 3);
        assert!((linear.metrics.cv_r2_mean - 1.0).abs() < 1e-9);

        let moisture = comparison.vif.iter().find(|e| e.variable == "umidade_solo").unwrap();
        assert!((moisture.vif - 1.0).abs() < 1e-9);
        assert!(comparison.high_vif().is_empty());

        // yield = umidade_solo / 10 on the training rows
        assert_eq!(comparison.ols.observations, 7);
        assert_eq!(comparison.ols.df_residual, 5);
        assert!((comparison.ols.coefficients[1].estimate - 0.1).abs() < 1e-8);
        assert!(comparison.ols.coefficients[0].estimate.abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let table = noisy_table();
        let config = RegressionConfig::default();
        let a = compare_models(&table, YIELD, &config).unwrap();
        let b = compare_models(&table, YIELD, &config).unwrap();

        assert_eq!(a.train_rows, b.train_rows);
        assert_eq!(a.test_rows, b.test_rows);
        assert_eq!(a.best, b.best);
        for (x, y) in a.candidates.iter().zip(&b.candidates) {
            assert_eq!(x.metrics.test_r2.to_bits(), y.metrics.test_r2.to_bits());
            assert_eq!(x.metrics.cv_r2_mean.to_bits(), y.metrics.cv_r2_mean.to_bits());
        }

        let other = RegressionConfig {
            seed: 7,
            ..RegressionConfig::default()
        };
        let c = compare_models(&table, YIELD, &other).unwrap();
        assert_ne!(a.test_rows, c.test_rows);
    }

    #[test]
    fn test_best_model_ranking() {
        let comparison = compare_models(&noisy_table(), YIELD, &RegressionConfig::default()).unwrap();
        let best = comparison.best_model().metrics.test_r2;
        for candidate in &comparison.candidates {
            assert!(candidate.metrics.test_r2 <= best);
        }
        assert!(best > 0.9);
        assert_eq!(comparison.residuals.count, comparison.test_rows.len());

        let ols = &comparison.ols;
        assert_eq!(ols.observations, comparison.train_rows.len());
        assert_eq!(ols.df_model, 2);
        let terms: Vec<&str> = ols.coefficients.iter().map(|c| c.term.as_str()).collect();
        assert_eq!(terms, vec![CONSTANT_TERM, "a", "b"]);
        assert_eq!(ols.significant_terms(0.05), vec!["a", "b"]);
        assert!((ols.coefficients[1].estimate - 1.5).abs() < 0.1);
        assert!((ols.coefficients[2].estimate + 0.7).abs() < 0.1);
        assert!(ols.f_p_value < 1e-6);
    }

    #[test]
    fn test_duplicate_predictors_do_not_abort() {
        let base: Vec<f64> = (0..12).map(|i| f64::from(i) * 1.5 + f64::from(i % 3)).collect();
        let y: Vec<f64> = base.iter().enumerate().map(|(i, v)| 2.0 * v + (i % 2) as f64).collect();
        let table = TableBuilder::new()
            .numeric_column("umidade_solo", base.clone())
            .numeric_column("umidade_copia", base)
            .numeric_column(YIELD, y)
            .build()
            .unwrap();

        let comparison = compare_models(&table, YIELD, &RegressionConfig::default()).unwrap();
        let high = comparison.high_vif();
        assert_eq!(high, vec!["umidade_solo", "umidade_copia"]);
        assert!(comparison.vif.iter().filter(|e| !e.constant).all(|e| !e.defined));
        assert!(comparison.candidates.iter().all(|c| c.metrics.test_r2.is_finite()));
    }

    #[test]
    fn test_no_usable_predictor() {
        let table = TableBuilder::new()
            .numeric_column(YIELD, (1..=10).map(f64::from))
            .build()
            .unwrap();
        assert!(matches!(
            compare_models(&table, YIELD, &RegressionConfig::default()),
            Err(Error::DegenerateFit { .. })
        ));

        let table = TableBuilder::new()
            .numeric_column("ph", vec![None::<f64>; 10])
            .numeric_column(YIELD, (1..=10).map(f64::from))
            .build()
            .unwrap();
        assert!(matches!(
            compare_models(&table, YIELD, &RegressionConfig::default()),
            Err(Error::DegenerateFit { .. })
        ));
    }

    #[test]
    fn test_too_few_rows() {
        // 5 rows: 1 test, 4 train < 5 folds
        let table = TableBuilder::new()
            .numeric_column("ph", (1..=5).map(f64::from))
            .numeric_column(YIELD, (1..=5).map(f64::from))
            .build()
            .unwrap();
        assert!(matches!(
            compare_models(&table, YIELD, &RegressionConfig::default()),
            Err(Error::InsufficientData { .. })
        ));

        assert!(matches!(
            compare_models(&perfect_table(), "cultura", &RegressionConfig::default()),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_imputation_uses_training_means() {
        let mut ph: Vec<Option<f64>> = (0..20).map(|i| Some(5.0 + f64::from(i) * 0.1)).collect();
        ph[3] = None;
        ph[11] = None;
        let table = TableBuilder::new()
            .numeric_column("ph", ph.clone())
            .numeric_column("umidade_solo", (0..20).map(|i| f64::from(i * 7 % 13)))
            .numeric_column(YIELD, (0..20).map(|i| f64::from(i) * 0.5))
            .build()
            .unwrap();

        let comparison = compare_models(&table, YIELD, &RegressionConfig::default()).unwrap();
        let observed: Vec<f64> = comparison
            .train_rows
            .iter()
            .filter_map(|&r| ph[r])
            .collect();
        let expected = observed.iter().sum::<f64>() / observed.len() as f64;

        let linear = comparison.candidate(ModelKind::Linear).unwrap();
        assert_eq!(linear.predictors[0], "ph");
        assert!((linear.imputation[0] - expected).abs() < 1e-12);

        let filled = linear.predict(ndarray::array![[f64::NAN, 3.0]].view()).unwrap();
        let explicit = linear.predict(ndarray::array![[expected, 3.0]].view()).unwrap();
        assert!((filled[0] - explicit[0]).abs() < 1e-12);
    }

    #[test]
    fn test_configured_predictors() {
        let config = RegressionConfig {
            predictors: Some(vec!["a".to_string(), YIELD.to_string()]),
            ..RegressionConfig::default()
        };
        let comparison = compare_models(&noisy_table(), YIELD, &config).unwrap();
        assert_eq!(comparison.best_model().predictors, vec!["a"]);

        let polynomial = comparison.candidate(ModelKind::Polynomial).unwrap();
        assert_eq!(polynomial.feature_names, vec!["a", "a^2"]);

        let config = RegressionConfig {
            predictors: Some(vec!["missing".to_string()]),
            ..RegressionConfig::default()
        };
        assert!(matches!(
            compare_models(&noisy_table(), YIELD, &config),
            Err(Error::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let config = RegressionConfig {
            folds: 1,
            ..RegressionConfig::default()
        };
        assert!(matches!(
            compare_models(&perfect_table(), YIELD, &config),
            Err(Error::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_nan_penalties_rejected() {
        for config in [
            RegressionConfig {
                ridge_alpha: f64::NAN,
                ..RegressionConfig::default()
            },
            RegressionConfig {
                lasso_alpha: f64::NAN,
                ..RegressionConfig::default()
            },
            RegressionConfig {
                lasso_alpha: -0.5,
                ..RegressionConfig::default()
            },
        ] {
            assert!(matches!(
                compare_models(&perfect_table(), YIELD, &config),
                Err(Error::InvalidParams { .. })
            ));
        }
    }
}
