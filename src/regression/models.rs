//! Candidate regressors and the fit/predict pipeline around them.
//!
//! Every candidate shares the same pipeline: optional polynomial expansion,
//! standardization fitted on the training rows, then a linear fit with an
//! unpenalized intercept. Only the coefficient estimator differs, behind the
//! [`Regressor`] trait.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::warn;

use super::types::ModelKind;
use crate::error::Result;
use crate::stats::linalg::{cholesky_solve, lstsq};

/// Intercept and slopes of a linear fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// Intercept.
    pub intercept: f64,
    /// One coefficient per feature.
    pub coefficients: Array1<f64>,
}

/// Trait for coefficient estimators.
pub trait Regressor: Send + Sync {
    /// Candidate family this estimator implements.
    fn kind(&self) -> ModelKind;

    /// Fit coefficients to a feature matrix and response.
    ///
    /// # Errors
    /// `NumericalInstability` if the underlying solve breaks down.
    fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<LinearFit>;
}

/// Center features and response; returns (centered x, centered y, x means, y mean).
fn center(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
) -> (Array2<f64>, Array1<f64>, Array1<f64>, f64) {
    let n = x.nrows().max(1) as f64;
    let x_mean = x.sum_axis(Axis(0)) / n;
    let y_mean = y.sum() / n;
    let xc = &x - &x_mean;
    let yc = y.mapv(|v| v - y_mean);
    (xc, yc, x_mean, y_mean)
}

fn with_intercept(coefficients: Array1<f64>, x_mean: &Array1<f64>, y_mean: f64) -> LinearFit {
    LinearFit {
        intercept: y_mean - x_mean.dot(&coefficients),
        coefficients,
    }
}

/// Ordinary least squares (minimum-norm when the design is rank deficient).
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryLeastSquares;

impl Regressor for OrdinaryLeastSquares {
    fn kind(&self) -> ModelKind {
        ModelKind::Linear
    }

    fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<LinearFit> {
        let (xc, yc, x_mean, y_mean) = center(x, y);
        let solution = lstsq(xc.view(), yc.view())?;
        if solution.rank < x.ncols() {
            tracing::debug!(
                rank = solution.rank,
                features = x.ncols(),
                "rank-deficient design, using minimum-norm solution"
            );
        }
        Ok(with_intercept(solution.coefficients, &x_mean, y_mean))
    }
}

/// L2-penalized least squares: ‖y − Xβ − b‖² + α‖β‖².
#[derive(Debug, Clone, Copy)]
pub struct RidgeRegression {
    /// Penalty strength.
    pub alpha: f64,
}

impl Regressor for RidgeRegression {
    fn kind(&self) -> ModelKind {
        ModelKind::Ridge
    }

    fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<LinearFit> {
        if self.alpha == 0.0 {
            return OrdinaryLeastSquares.fit(x, y);
        }
        let (xc, yc, x_mean, y_mean) = center(x, y);
        let mut gram = xc.t().dot(&xc);
        gram.diag_mut().mapv_inplace(|d| d + self.alpha);
        let moment = xc.t().dot(&yc);
        let coefficients = cholesky_solve(gram.view(), moment.view())?;
        Ok(with_intercept(coefficients, &x_mean, y_mean))
    }
}

/// L1-penalized least squares: (1/2n)‖y − Xβ − b‖² + α‖β‖₁.
#[derive(Debug, Clone, Copy)]
pub struct LassoRegression {
    /// Penalty strength.
    pub alpha: f64,
    /// Maximum coordinate-descent sweeps.
    pub max_iter: usize,
    /// Stop when no coefficient moves more than this (relative to the largest).
    pub tolerance: f64,
}

impl LassoRegression {
    /// Lasso with the default solver settings.
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_iter: 10_000,
            tolerance: 1e-10,
        }
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

impl Regressor for LassoRegression {
    fn kind(&self) -> ModelKind {
        ModelKind::Lasso
    }

    /// Cyclic coordinate descent on centered data.
    fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<LinearFit> {
        let (xc, yc, x_mean, y_mean) = center(x, y);
        let n = xc.nrows().max(1) as f64;
        let p = xc.ncols();

        let norms: Vec<f64> = xc
            .columns()
            .into_iter()
            .map(|c| c.dot(&c) / n)
            .collect();
        let mut beta = Array1::<f64>::zeros(p);
        let mut residual = yc;

        let mut converged = p == 0;
        for _ in 0..self.max_iter {
            let mut max_step = 0.0_f64;
            for j in 0..p {
                if norms[j] <= 0.0 {
                    continue;
                }
                let column = xc.column(j);
                let old = beta[j];
                let rho = column.dot(&residual) / n + norms[j] * old;
                let new = soft_threshold(rho, self.alpha) / norms[j];
                if new != old {
                    residual.scaled_add(old - new, &column);
                    beta[j] = new;
                    max_step = max_step.max((new - old).abs());
                }
            }
            let scale = beta.iter().fold(1.0_f64, |m, b| m.max(b.abs()));
            if max_step <= self.tolerance * scale {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!(
                alpha = self.alpha,
                max_iter = self.max_iter,
                "lasso coordinate descent did not converge"
            );
        }

        Ok(with_intercept(beta, &x_mean, y_mean))
    }
}

/// Polynomial terms up to a degree, without the bias column.
///
/// Terms are ordered by degree, then lexicographically by the indices of
/// the multiplied features: for features (a, b) and degree 2 the output is
/// a, b, a², a·b, b².
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolynomialExpansion {
    /// Maximum total degree.
    pub degree: usize,
    /// Feature indices multiplied together for each output term.
    pub terms: Vec<Vec<usize>>,
}

impl PolynomialExpansion {
    /// Expansion of `features` inputs up to `degree`.
    #[must_use]
    pub fn new(features: usize, degree: usize) -> Self {
        let mut terms = Vec::new();
        let mut current: Vec<Vec<usize>> = vec![Vec::new()];
        for _ in 0..degree {
            let next: Vec<Vec<usize>> = current
                .iter()
                .flat_map(|term| {
                    let start = term.last().copied().unwrap_or(0);
                    (start..features).map(move |j| {
                        let mut extended = term.clone();
                        extended.push(j);
                        extended
                    })
                })
                .collect();
            terms.extend(next.iter().cloned());
            current = next;
        }
        Self { degree, terms }
    }

    /// Names of the expanded terms, `a^2` for powers and `a b` for products.
    #[must_use]
    pub fn feature_names(&self, inputs: &[String]) -> Vec<String> {
        self.terms
            .iter()
            .map(|term| {
                let mut parts: Vec<String> = Vec::new();
                let mut i = 0;
                while i < term.len() {
                    let power = term[i..].iter().take_while(|&&j| j == term[i]).count();
                    let name = &inputs[term[i]];
                    parts.push(if power == 1 {
                        name.clone()
                    } else {
                        format!("{name}^{power}")
                    });
                    i += power;
                }
                parts.join(" ")
            })
            .collect()
    }

    /// Expand a feature matrix.
    #[must_use]
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((x.nrows(), self.terms.len()));
        for (row, mut expanded) in x.rows().into_iter().zip(out.rows_mut()) {
            for (value, term) in expanded.iter_mut().zip(&self.terms) {
                *value = term.iter().map(|&j| row[j]).product();
            }
        }
        out
    }
}

/// Per-feature standardization fitted on training rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StandardScaler {
    /// Feature means.
    pub means: Vec<f64>,
    /// Population standard deviations; 1.0 for a constant feature.
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit means and scales.
    #[must_use]
    pub fn fit(x: ArrayView2<'_, f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let (means, scales) = x
            .columns()
            .into_iter()
            .map(|column| {
                let mean = column.sum() / n;
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                let scale = if std > f64::EPSILON * mean.abs().max(1.0) { std } else { 1.0 };
                (mean, scale)
            })
            .unzip();
        Self { means, scales }
    }

    /// Apply the fitted standardization.
    #[must_use]
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        let params = self.means.iter().zip(&self.scales);
        for (mut column, (mean, scale)) in out.columns_mut().into_iter().zip(params) {
            column.mapv_inplace(|v| (v - mean) / scale);
        }
        out
    }
}

/// Expansion, scaler and linear fit, applied in that order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pipeline {
    /// Polynomial expansion, for the polynomial candidate.
    pub expansion: Option<PolynomialExpansion>,
    /// Standardization of the (expanded) features.
    pub scaler: StandardScaler,
    /// Intercept on the standardized scale.
    pub intercept: f64,
    /// Coefficients on the standardized features.
    pub coefficients: Vec<f64>,
}

impl Pipeline {
    /// Fit the pipeline on training rows.
    ///
    /// # Errors
    /// Propagates the regressor's failure.
    pub fn fit(
        regressor: &dyn Regressor,
        expansion: Option<&PolynomialExpansion>,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<Self> {
        let features = match expansion {
            Some(expansion) => expansion.transform(x),
            None => x.to_owned(),
        };
        let scaler = StandardScaler::fit(features.view());
        let scaled = scaler.transform(features.view());
        let fit = regressor.fit(scaled.view(), y)?;
        Ok(Self {
            expansion: expansion.cloned(),
            scaler,
            intercept: fit.intercept,
            coefficients: fit.coefficients.to_vec(),
        })
    }

    /// Predict for raw (imputed) rows.
    #[must_use]
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let features = match &self.expansion {
            Some(expansion) => expansion.transform(x),
            None => x.to_owned(),
        };
        let scaled = self.scaler.transform(features.view());
        let coefficients = ArrayView1::from(&self.coefficients[..]);
        scaled.dot(&coefficients) + self.intercept
    }
}

/// Estimator for a candidate family.
#[must_use]
pub fn regressor_for(kind: ModelKind, ridge_alpha: f64, lasso_alpha: f64) -> Box<dyn Regressor> {
    match kind {
        ModelKind::Linear | ModelKind::Polynomial => Box::new(OrdinaryLeastSquares),
        ModelKind::Ridge => Box::new(RidgeRegression { alpha: ridge_alpha }),
        ModelKind::Lasso => Box::new(LassoRegression::new(lasso_alpha)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn design() -> (Array2<f64>, Array1<f64>) {
        // y = 3 + 2a - b
        let x = array![
            [1.0, 4.0],
            [2.0, 1.0],
            [3.0, 5.0],
            [4.0, 2.0],
            [5.0, 7.0],
            [6.0, 3.0]
        ];
        let y = x.column(0).mapv(|a| 3.0 + 2.0 * a) - &x.column(1);
        (x, y)
    }

    #[test]
    fn test_ols_recovers_coefficients() {
        let (x, y) = design();
        let fit = OrdinaryLeastSquares.fit(x.view(), y.view()).unwrap();
        assert!((fit.intercept - 3.0).abs() < 1e-9);
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((fit.coefficients[1] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ridge_shrinks_toward_zero() {
        let (x, y) = design();
        let ols = OrdinaryLeastSquares.fit(x.view(), y.view()).unwrap();
        let ridge = RidgeRegression { alpha: 10.0 }.fit(x.view(), y.view()).unwrap();
        let norm = |c: &Array1<f64>| c.dot(c);
        assert!(norm(&ridge.coefficients) < norm(&ols.coefficients));

        let unpenalized = RidgeRegression { alpha: 0.0 }.fit(x.view(), y.view()).unwrap();
        assert!((unpenalized.coefficients[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_lasso_zeroes_weak_coefficients() {
        let (x, y) = design();
        let big = LassoRegression::new(100.0).fit(x.view(), y.view()).unwrap();
        assert!(big.coefficients.iter().all(|&c| c == 0.0));
        assert!((big.intercept - y.mean().unwrap()).abs() < 1e-12);

        let small = LassoRegression::new(1e-6).fit(x.view(), y.view()).unwrap();
        assert!((small.coefficients[0] - 2.0).abs() < 1e-3);
        assert!((small.coefficients[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_lasso_orthogonal_design_reference() {
        // Centered orthogonal columns with xᵀx / n = 1: the minimizer of
        // ‖y − Xβ − b‖² / 2n + α‖β‖₁ is βⱼ = S(xⱼᵀy / n, α), b = mean(y).
        // scikit-learn's Lasso(alpha=0.25) gives (2.75, -0.25), intercept 5.
        let x = array![[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];
        let interaction = array![0.2, -0.2, -0.2, 0.2];
        let y = x.column(0).mapv(|a| 5.0 + 3.0 * a) - &(x.column(1).to_owned() * 0.5) + &interaction;

        let fit = LassoRegression::new(0.25).fit(x.view(), y.view()).unwrap();
        assert!((fit.coefficients[0] - 2.75).abs() < 1e-9);
        assert!((fit.coefficients[1] + 0.25).abs() < 1e-9);
        assert!((fit.intercept - 5.0).abs() < 1e-9);

        let fit = LassoRegression::new(1.0).fit(x.view(), y.view()).unwrap();
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-9);
        assert_eq!(fit.coefficients[1], 0.0);
    }

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }

    #[test]
    fn test_polynomial_expansion_order() {
        let expansion = PolynomialExpansion::new(2, 2);
        assert_eq!(
            expansion.terms,
            vec![vec![0], vec![1], vec![0, 0], vec![0, 1], vec![1, 1]]
        );
        let names = expansion.feature_names(&["a".to_string(), "b".to_string()]);
        assert_eq!(names, vec!["a", "b", "a^2", "a b", "b^2"]);

        let out = expansion.transform(array![[2.0, 3.0]].view());
        assert_eq!(out.row(0).to_vec(), vec![2.0, 3.0, 4.0, 6.0, 9.0]);

        assert_eq!(PolynomialExpansion::new(3, 2).terms.len(), 9);
        assert_eq!(PolynomialExpansion::new(2, 3).terms.len(), 9);
    }

    #[test]
    fn test_scaler_train_only() {
        let train = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(train.view());
        assert_eq!(scaler.means, vec![2.0, 5.0]);
        assert_eq!(scaler.scales, vec![1.0, 1.0]); // population std of [1, 3] is 1; constant keeps 1

        let test = array![[4.0, 6.0]];
        let scaled = scaler.transform(test.view());
        assert_eq!(scaled.row(0).to_vec(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_pipeline_predicts_on_raw_scale() {
        let (x, y) = design();
        let pipeline = Pipeline::fit(&OrdinaryLeastSquares, None, x.view(), y.view()).unwrap();
        let predicted = pipeline.predict(array![[10.0, 0.0]].view());
        assert!((predicted[0] - 23.0).abs() < 1e-8);
    }

    #[test]
    fn test_regressor_for_kinds() {
        for kind in ModelKind::ALL {
            let regressor = regressor_for(kind, 1.0, 0.1);
            let expected = if kind == ModelKind::Polynomial {
                ModelKind::Linear
            } else {
                kind
            };
            assert_eq!(regressor.kind(), expected);
        }
    }
}
