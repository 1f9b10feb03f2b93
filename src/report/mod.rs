//! Report assembler.
//!
//! Runs every engine over one table and merges their outputs into an
//! [`AnalysisReport`] with human-readable recommendations. No new statistics
//! are computed here.
//!
//! In [`ReportMode::Partial`] (the default) a failing engine becomes a failed
//! section and the rest of the report is still produced; in
//! [`ReportMode::Combined`] the first engine error is returned instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use agrostat::report::{analyze, AnalysisConfig};
//! use agrostat::table::{TableBuilder, YIELD};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let crops = ["milho", "soja", "trigo"];
//! let table = TableBuilder::new()
//!     .categorical_column("cultura", (0..30).map(|i| crops[i % 3]))
//!     .numeric_column("umidade_solo", (0..30).map(|i| 20.0 + 30.0 * (i % 3) as f64 + (i / 3) as f64))
//!     .numeric_column(YIELD, (0..30).map(|i| 1.0 + 3.0 * (i % 3) as f64 + 0.1 * (i / 3) as f64))
//!     .build()?;
//!
//! let report = analyze(&table, &AnalysisConfig::default())?;
//! for line in &report.recommendations {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

mod types;

pub use types::{
    AnalysisConfig, AnalysisReport, EngineOutcome, GroupingSection, R2Band, ReportMode,
};

use tracing::{debug, warn};

use crate::anova::{one_way_with, ANOVAResult, EffectMagnitude};
use crate::correlation::{correlate, CorrelationResult};
use crate::error::Result;
use crate::regression::{compare_models, RegressionComparison};
use crate::table::ObservationTable;

/// Recommendation added when any predictor has VIF ≥ 10.
pub const MULTICOLLINEARITY_RECOMMENDATION: &str =
    "High multicollinearity detected. Consider removing or combining correlated variables.";

/// Run every engine and assemble the report.
///
/// # Arguments
/// * `table` - Observation table
/// * `config` - Target, engine settings, groupings and failure mode
///
/// # Errors
/// In combined mode, the first engine error (correlation, then regression,
/// then each grouping in order). Partial mode never fails.
pub fn analyze(table: &ObservationTable, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let correlation = correlate(table, &config.target, &config.correlation);
    let regression = compare_models(table, &config.target, &config.regression);
    let anova = analysed_groupings(table, config)
        .into_iter()
        .map(|grouping| {
            let result = one_way_with(table, grouping, &config.target, &config.anova);
            (grouping.to_string(), result)
        })
        .collect();
    assemble(config, correlation, regression, anova)
}

/// Configured groupings that exist in the table, in configured order.
pub(crate) fn analysed_groupings<'a>(
    table: &ObservationTable,
    config: &'a AnalysisConfig,
) -> Vec<&'a str> {
    config
        .groupings
        .iter()
        .map(String::as_str)
        .filter(|&grouping| {
            let present = table.schema().kind_of(grouping).is_some();
            if !present {
                debug!(grouping, "grouping not in table, skipped");
            }
            present
        })
        .collect()
}

/// Merge engine results into a report according to the configured mode.
pub(crate) fn assemble(
    config: &AnalysisConfig,
    correlation: Result<CorrelationResult>,
    regression: Result<RegressionComparison>,
    anova: Vec<(String, Result<ANOVAResult>)>,
) -> Result<AnalysisReport> {
    if config.mode == ReportMode::Combined {
        if let Err(err) = &correlation {
            return Err(err.clone());
        }
        if let Err(err) = &regression {
            return Err(err.clone());
        }
        if let Some((_, Err(err))) = anova.iter().find(|(_, r)| r.is_err()) {
            return Err(err.clone());
        }
    }

    if let Err(err) = &correlation {
        warn!(error = %err, "correlation section failed");
    }
    if let Err(err) = &regression {
        warn!(error = %err, "regression section failed");
    }

    let mut recommendations = Vec::new();
    let mut r2_band = None;
    let mut multicollinearity_alert = Vec::new();
    if let Ok(comparison) = &regression {
        let band = R2Band::from_r2(comparison.best_model().metrics.test_r2);
        recommendations.push(band.recommendation().to_string());
        r2_band = Some(band);

        multicollinearity_alert = comparison
            .high_vif()
            .into_iter()
            .map(str::to_string)
            .collect();
        if !multicollinearity_alert.is_empty() {
            recommendations.push(MULTICOLLINEARITY_RECOMMENDATION.to_string());
        }
    }

    let mut anova_summary = Vec::new();
    let sections: Vec<GroupingSection> = anova
        .into_iter()
        .map(|(grouping, result)| {
            match &result {
                Ok(analysis) => anova_summary.extend(summary_lines(analysis)),
                Err(err) => warn!(grouping = %grouping, error = %err, "ANOVA section failed"),
            }
            GroupingSection {
                grouping,
                outcome: result.into(),
            }
        })
        .collect();

    Ok(AnalysisReport {
        target: config.target.clone(),
        mode: config.mode,
        correlation: correlation.into(),
        regression: regression.into(),
        anova: sections,
        r2_band,
        multicollinearity_alert,
        recommendations,
        anova_summary,
    })
}

fn effect_label(effect: Option<EffectMagnitude>) -> &'static str {
    effect.map_or("undefined", EffectMagnitude::as_str)
}

fn verdict(holds: bool) -> &'static str {
    if holds {
        "yes"
    } else {
        "no"
    }
}

fn summary_lines(analysis: &ANOVAResult) -> Vec<String> {
    let mut lines = Vec::new();
    let f = &analysis.parametric;
    if analysis.significant() {
        lines.push(format!(
            "{}: {} differs across {} groups (F({}, {}) = {:.3}, p = {:.4}, η² = {:.3}, {} effect).",
            analysis.grouping,
            analysis.response,
            analysis.groups.len(),
            f.df_between,
            f.df_within,
            f.statistic,
            f.p_value,
            f.eta_squared,
            effect_label(f.effect),
        ));
    }
    if !analysis.assumptions.parametric_ok() {
        let h = &analysis.rank_based;
        lines.push(format!(
            "{}: parametric assumptions not met (normality: {}, homogeneity: {}); rely on Kruskal–Wallis (H = {:.3}, p = {:.4}, ε² = {:.3}, {} effect).",
            analysis.grouping,
            verdict(analysis.assumptions.normality),
            verdict(analysis.assumptions.homogeneity),
            h.statistic,
            h.p_value,
            h.epsilon_squared,
            effect_label(h.effect),
        ));
    }
    lines
}
