//! Correlation engine types.

use std::fmt;

use ndarray::Array2;

/// Correlation coefficient to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase", from = "String"))]
pub enum CorrelationMethod {
    /// Pearson product-moment correlation of the raw values.
    #[default]
    Pearson,
    /// Spearman rank correlation (Pearson over average ranks).
    Spearman,
}

impl CorrelationMethod {
    /// Parse a method name, falling back to Pearson for anything unsupported.
    ///
    /// The fallback is logged as a warning.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pearson" => Self::Pearson,
            "spearman" => Self::Spearman,
            other => {
                tracing::warn!(method = other, "unsupported correlation method, using pearson");
                Self::Pearson
            }
        }
    }

    /// Lower-case method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
        }
    }
}

impl From<&str> for CorrelationMethod {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for CorrelationMethod {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the correlation engine.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CorrelationConfig {
    /// Coefficient to compute (default: Pearson).
    pub method: CorrelationMethod,
    /// Numeric variables to include; all numeric variables when `None`.
    /// The target is always included.
    pub variables: Option<Vec<String>>,
}

/// Correlation of one variable with the target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationEntry {
    /// Variable name.
    pub variable: String,
    /// Coefficient in [-1, 1]; `None` when either side has zero variance.
    pub coefficient: Option<f64>,
    /// Two-sided p-value of the coefficient (t-test on n − 2 df).
    pub p_value: Option<f64>,
}

/// Result of the correlation engine.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationResult {
    /// Target variable.
    pub target: String,
    /// Coefficient computed.
    pub method: CorrelationMethod,
    /// Rows complete for every variable used.
    pub rows: usize,
    /// Variables of the matrix, in schema order.
    pub variables: Vec<String>,
    /// Full symmetric matrix; NaN where a coefficient is undefined.
    pub matrix: Array2<f64>,
    /// Every variable except the target, by |coefficient| descending.
    /// Undefined coefficients come last.
    pub entries: Vec<CorrelationEntry>,
}

impl CorrelationResult {
    /// The ranked entries (|coefficient| descending, target excluded).
    #[must_use]
    pub fn ranked(&self) -> &[CorrelationEntry] {
        &self.entries
    }

    /// Coefficient of `variable` with the target.
    #[must_use]
    pub fn coefficient(&self, variable: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.variable == variable)
            .and_then(|e| e.coefficient)
    }

    /// Matrix entry for a pair of variables; `None` if either is absent or
    /// the coefficient is undefined.
    #[must_use]
    pub fn pair(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.variables.iter().position(|v| v == a)?;
        let j = self.variables.iter().position(|v| v == b)?;
        let value = self.matrix[[i, j]];
        (!value.is_nan()).then_some(value)
    }
}
