//! Report types.

use std::fmt;

use crate::anova::{ANOVAConfig, ANOVAResult};
use crate::correlation::{CorrelationConfig, CorrelationResult};
use crate::error::Error;
use crate::regression::{RegressionComparison, RegressionConfig};
use crate::table::{MOISTURE_CLASS_COLUMN, PH_CLASS_COLUMN, TEMPERATURE_CLASS_COLUMN, YIELD};

/// How engine failures affect the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReportMode {
    /// A failed engine becomes a failed section; the others still report.
    #[default]
    Partial,
    /// The first engine error aborts the whole analysis.
    Combined,
}

/// Configuration for a full analysis run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Response variable (default: `producao_kg`).
    pub target: String,
    /// Correlation engine settings.
    pub correlation: CorrelationConfig,
    /// Regression engine settings.
    pub regression: RegressionConfig,
    /// ANOVA engine settings.
    pub anova: ANOVAConfig,
    /// Categorical variables to run one-way ANOVA over. Those absent from
    /// the table are skipped.
    pub groupings: Vec<String>,
    /// Failure handling (default: partial).
    pub mode: ReportMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target: YIELD.to_string(),
            correlation: CorrelationConfig::default(),
            regression: RegressionConfig::default(),
            anova: ANOVAConfig::default(),
            groupings: [
                "cultura",
                "estagio_fenologico",
                MOISTURE_CLASS_COLUMN,
                PH_CLASS_COLUMN,
                TEMPERATURE_CLASS_COLUMN,
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            mode: ReportMode::Partial,
        }
    }
}

/// Result of one engine inside a report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "lowercase"))]
pub enum EngineOutcome<T> {
    /// The engine produced a result.
    Completed {
        /// Engine output.
        result: T,
    },
    /// The engine failed; the message is the error's display form.
    Failed {
        /// Error message.
        error: String,
    },
}

impl<T> EngineOutcome<T> {
    /// The result, if the engine completed.
    #[must_use]
    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed { result } => Some(result),
            Self::Failed { .. } => None,
        }
    }

    /// Whether the engine failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl<T> From<Result<T, Error>> for EngineOutcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(result) => Self::Completed { result },
            Err(error) => Self::Failed {
                error: error.to_string(),
            },
        }
    }
}

/// Predictive power band of the best model's test R².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum R2Band {
    /// R² ≥ 0.8.
    Excellent,
    /// 0.6 ≤ R² < 0.8.
    Good,
    /// 0.4 ≤ R² < 0.6.
    Moderate,
    /// R² < 0.4, or undefined.
    Weak,
}

impl R2Band {
    /// Band of an R² value.
    #[must_use]
    pub fn from_r2(r2: f64) -> Self {
        if r2 >= 0.8 {
            Self::Excellent
        } else if r2 >= 0.6 {
            Self::Good
        } else if r2 >= 0.4 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }

    /// Recommendation attached to the band.
    #[must_use]
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Excellent => {
                "Excellent predictive power (R² ≥ 0.8). The model can be used for forecasting."
            }
            Self::Good => {
                "Good predictive power (0.6 ≤ R² < 0.8). Useful for estimates, with caution."
            }
            Self::Moderate => {
                "Moderate predictive power (0.4 ≤ R² < 0.6). Consider collecting more data or adding variables."
            }
            Self::Weak => {
                "Weak predictive power (R² < 0.4). The current variables do not explain yield well."
            }
        }
    }
}

impl fmt::Display for R2Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Weak => "weak",
        })
    }
}

/// One-way ANOVA section for a grouping variable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupingSection {
    /// Grouping variable.
    pub grouping: String,
    /// Engine outcome.
    pub outcome: EngineOutcome<ANOVAResult>,
}

/// Merged output of every engine.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisReport {
    /// Response variable.
    pub target: String,
    /// Failure handling used.
    pub mode: ReportMode,
    /// Correlation ranking.
    pub correlation: EngineOutcome<CorrelationResult>,
    /// Model comparison, VIF table and residual summary.
    pub regression: EngineOutcome<RegressionComparison>,
    /// One section per analysed grouping, in configured order.
    pub anova: Vec<GroupingSection>,
    /// Band of the best model's test R², when regression completed.
    pub r2_band: Option<R2Band>,
    /// Predictors with VIF ≥ 10; the constant is never listed.
    pub multicollinearity_alert: Vec<String>,
    /// Human-readable recommendations.
    pub recommendations: Vec<String>,
    /// One line per grouping with a significant difference.
    pub anova_summary: Vec<String>,
}

impl AnalysisReport {
    /// Whether every engine completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.correlation.is_failed()
            && !self.regression.is_failed()
            && self.anova.iter().all(|s| !s.outcome.is_failed())
    }

    /// Names of the failed sections.
    #[must_use]
    pub fn failed_sections(&self) -> Vec<String> {
        let mut failed = Vec::new();
        if self.correlation.is_failed() {
            failed.push("correlation".to_string());
        }
        if self.regression.is_failed() {
            failed.push("regression".to_string());
        }
        failed.extend(
            self.anova
                .iter()
                .filter(|s| s.outcome.is_failed())
                .map(|s| format!("anova:{}", s.grouping)),
        );
        failed
    }

    /// ANOVA result for a grouping, if it completed.
    #[must_use]
    pub fn anova_for(&self, grouping: &str) -> Option<&ANOVAResult> {
        self.anova
            .iter()
            .find(|s| s.grouping == grouping)
            .and_then(|s| s.outcome.completed())
    }
}
