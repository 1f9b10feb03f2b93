//! Parallel analysis support.
//!
//! This module runs the independent engines of a report concurrently using
//! Rayon. Enable with the `parallel` feature flag.
//!
//! # Usage
//!
//! ```ignore
//! use agrostat::parallel::par_analyze;
//! use agrostat::report::AnalysisConfig;
//!
//! let report = par_analyze(&table, &AnalysisConfig::default())?;
//! ```
//!
//! # Performance
//!
//! The correlation engine, the regression comparison and every one-way
//! ANOVA only read the table, so they run side by side. Results are
//! identical to the sequential [`analyze`](crate::report::analyze): the
//! regression split is seeded and groupings keep their configured order.
//! With the feature enabled, the cross-validation folds of every candidate
//! are also fitted on the rayon pool (see
//! [`cross_validate`](crate::regression::cross_validate)).
//!
//! For small tables the sequential version may be faster due to
//! parallelization overhead.

use rayon::prelude::*;

use crate::anova::{one_way_with, ANOVAConfig, ANOVAResult};
use crate::correlation::correlate;
use crate::error::Result;
use crate::regression::compare_models;
use crate::report::{analysed_groupings, assemble, AnalysisConfig, AnalysisReport};
use crate::table::ObservationTable;

/// Parallel version of [`analyze`](crate::report::analyze).
///
/// # Errors
/// In combined mode, the first engine error in the same order as the
/// sequential version. Partial mode never fails.
pub fn par_analyze(table: &ObservationTable, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let groupings = analysed_groupings(table, config);

    let (correlation, (regression, anova)) = rayon::join(
        || correlate(table, &config.target, &config.correlation),
        || {
            rayon::join(
                || compare_models(table, &config.target, &config.regression),
                || {
                    groupings
                        .par_iter()
                        .map(|&grouping| {
                            let result =
                                one_way_with(table, grouping, &config.target, &config.anova);
                            (grouping.to_string(), result)
                        })
                        .collect::<Vec<_>>()
                },
            )
        },
    );

    assemble(config, correlation, regression, anova)
}

/// One-way ANOVA of `response` over several groupings in parallel.
///
/// Results are returned in the order of `groupings`.
#[must_use]
pub fn par_one_way(
    table: &ObservationTable,
    groupings: &[&str],
    response: &str,
    config: &ANOVAConfig,
) -> Vec<Result<ANOVAResult>> {
    groupings
        .par_iter()
        .map(|grouping| one_way_with(table, grouping, response, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{analyze, ReportMode};
    use crate::table::{TableBuilder, YIELD};

    fn field_table() -> ObservationTable {
        let crops = ["milho", "soja", "trigo"];
        let stages = ["vegetativo", "floracao"];
        let moisture: Vec<f64> = (0..36)
            .map(|i| [25.0, 45.0, 65.0][i % 3] + ((i * 5) % 11) as f64)
            .collect();
        let yield_kg: Vec<f64> = moisture
            .iter()
            .enumerate()
            .map(|(i, m)| 0.8 + 0.07 * m + ((i * 3) % 7) as f64 * 0.05)
            .collect();
        TableBuilder::new()
            .categorical_column("cultura", (0..36).map(|i| crops[i % 3]))
            .categorical_column("estagio_fenologico", (0..36).map(|i| stages[(i / 3) % 2]))
            .numeric_column("umidade_solo", moisture)
            .numeric_column(YIELD, yield_kg)
            .build()
            .unwrap()
    }

    #[test]
    fn test_par_analyze_matches_sequential() {
        let table = field_table();
        let config = AnalysisConfig::default();

        let sequential = analyze(&table, &config).unwrap();
        let parallel = par_analyze(&table, &config).unwrap();

        assert_eq!(parallel.recommendations, sequential.recommendations);
        assert_eq!(parallel.anova_summary, sequential.anova_summary);
        assert_eq!(parallel.failed_sections(), sequential.failed_sections());
        assert_eq!(parallel.r2_band, sequential.r2_band);

        let groupings: Vec<&str> = parallel.anova.iter().map(|s| s.grouping.as_str()).collect();
        assert_eq!(groupings, vec!["cultura", "estagio_fenologico"]);

        let best = |r: &AnalysisReport| {
            r.regression
                .completed()
                .map(|c| c.best_model().metrics.test_r2.to_bits())
        };
        assert_eq!(best(&parallel), best(&sequential));
    }

    #[test]
    fn test_par_analyze_combined_error() {
        let table = field_table();
        let config = AnalysisConfig {
            target: "nao_existe".to_string(),
            mode: ReportMode::Combined,
            ..AnalysisConfig::default()
        };
        let sequential = analyze(&table, &config).unwrap_err();
        let parallel = par_analyze(&table, &config).unwrap_err();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_par_one_way_order() {
        let table = field_table();
        let results = par_one_way(
            &table,
            &["estagio_fenologico", "nao_existe", "cultura"],
            YIELD,
            &ANOVAConfig::default(),
        );
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().grouping, "estagio_fenologico");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().grouping, "cultura");
    }
}
