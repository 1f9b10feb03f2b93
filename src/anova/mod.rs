//! One-way ANOVA engine.
//!
//! Tests whether a numeric response differs across the levels of a
//! categorical grouping. The analysis runs as an explicit pipeline of
//! stages, each consuming the previous one:
//!
//! 1. [`GroupedResponse`]: response values split by group label
//! 2. [`AssumptionStage`]: per-group normality, variance homogeneity,
//!    sample-size adequacy
//! 3. [`OmnibusStage`]: F-test with η² and Kruskal–Wallis with ε²
//! 4. Post-hoc: Tukey–Kramer HSD when the F-test is significant, falling
//!    back to Bonferroni-adjusted t-tests if Tukey cannot be computed
//!
//! ## Quick Start
//!
//! ```rust
//! use agrostat::anova::one_way;
//! use agrostat::table::{TableBuilder, YIELD};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = TableBuilder::new()
//!     .categorical_column("cultura", ["milho", "milho", "milho", "soja", "soja", "soja"])
//!     .numeric_column(YIELD, vec![3.1, 3.4, 2.9, 5.2, 5.0, 5.5])
//!     .build()?;
//!
//! let result = one_way(&table, "cultura", YIELD)?;
//! assert!(result.significant());
//! println!("η² = {:.3}", result.parametric.eta_squared);
//! # Ok(())
//! # }
//! ```

mod assumptions;
mod omnibus;
mod posthoc;
mod types;

pub use assumptions::check_assumptions;
pub use omnibus::{f_test, kruskal_wallis};
pub use posthoc::{bonferroni, tukey_hsd};
pub use types::{
    ANOVAConfig, ANOVAResult, Assumptions, BonferroniComparison, EffectMagnitude, FTest,
    GroupSummary, KruskalWallis, PostHoc, TukeyComparison,
};

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::table::ObservationTable;

/// One-way analysis with the default configuration.
///
/// # Errors
/// See [`one_way_with`].
pub fn one_way(table: &ObservationTable, grouping: &str, response: &str) -> Result<ANOVAResult> {
    one_way_with(table, grouping, response, &ANOVAConfig::default())
}

/// One-way analysis of `response` over the levels of `grouping`.
///
/// # Errors
/// * `UnknownVariable` / `KindMismatch` if `grouping` is not categorical or
///   `response` is not numeric
/// * `InsufficientGroups` if fewer than two groups have data
/// * `InvalidParams` if alpha is not in (0, 1)
pub fn one_way_with(
    table: &ObservationTable,
    grouping: &str,
    response: &str,
    config: &ANOVAConfig,
) -> Result<ANOVAResult> {
    GroupedResponse::from_table(table, grouping, response, config)?
        .check_assumptions()
        .run_omnibus()
        .map(OmnibusStage::run_post_hoc)
}

/// Response values split by group, in sorted label order.
#[derive(Debug, Clone)]
pub struct GroupedResponse {
    grouping: String,
    response: String,
    config: ANOVAConfig,
    names: Vec<String>,
    groups: Vec<Vec<f64>>,
}

impl GroupedResponse {
    /// Group the rows where both variables are present.
    ///
    /// # Errors
    /// Same as [`one_way_with`].
    pub fn from_table(
        table: &ObservationTable,
        grouping: &str,
        response: &str,
        config: &ANOVAConfig,
    ) -> Result<Self> {
        let labels = table.categorical(grouping)?;
        let values = table.numeric(response)?;

        let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for row in table.complete_rows(&[grouping, response])? {
            if let (Some(label), Some(value)) = (labels.get(row), values.get(row)) {
                groups.entry(label.to_string()).or_default().push(value);
            }
        }
        Self::from_groups(grouping, response, groups, config)
    }

    /// Build from explicit groups.
    ///
    /// Empty groups are ignored.
    ///
    /// # Errors
    /// `InsufficientGroups` for fewer than two non-empty groups,
    /// `InvalidParams` if alpha is not in (0, 1).
    pub fn from_groups(
        grouping: &str,
        response: &str,
        groups: BTreeMap<String, Vec<f64>>,
        config: &ANOVAConfig,
    ) -> Result<Self> {
        if config.alpha.is_nan() || config.alpha <= 0.0 || config.alpha >= 1.0 {
            return Err(Error::invalid_params(format!(
                "alpha must be in (0, 1), got {}",
                config.alpha
            )));
        }

        let (names, groups): (Vec<String>, Vec<Vec<f64>>) =
            groups.into_iter().filter(|(_, v)| !v.is_empty()).unzip();
        if groups.len() < 2 {
            return Err(Error::InsufficientGroups {
                grouping: grouping.to_string(),
                found: groups.len(),
            });
        }

        Ok(Self {
            grouping: grouping.to_string(),
            response: response.to_string(),
            config: config.clone(),
            names,
            groups,
        })
    }

    /// Group labels in sorted order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Run the assumption checks.
    #[must_use]
    pub fn check_assumptions(self) -> AssumptionStage {
        let (summaries, assumptions) = check_assumptions(&self.names, &self.groups, &self.config);
        AssumptionStage {
            data: self,
            summaries,
            assumptions,
        }
    }
}

/// Groups with their assumption verdicts.
#[derive(Debug, Clone)]
pub struct AssumptionStage {
    data: GroupedResponse,
    summaries: Vec<GroupSummary>,
    assumptions: Assumptions,
}

impl AssumptionStage {
    /// Assumption verdicts.
    #[must_use]
    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Per-group summaries.
    #[must_use]
    pub fn groups(&self) -> &[GroupSummary] {
        &self.summaries
    }

    /// Run both omnibus tests.
    ///
    /// # Errors
    /// Only if the groups were emptied, which the previous stage prevents.
    pub fn run_omnibus(self) -> Result<OmnibusStage> {
        let slices: Vec<&[f64]> = self.data.groups.iter().map(Vec::as_slice).collect();
        let parametric = f_test(&slices)?;
        let rank_based = kruskal_wallis(&slices)?;
        Ok(OmnibusStage {
            stage: self,
            parametric,
            rank_based,
        })
    }
}

/// Groups, assumptions and omnibus results.
#[derive(Debug, Clone)]
pub struct OmnibusStage {
    stage: AssumptionStage,
    parametric: FTest,
    rank_based: KruskalWallis,
}

impl OmnibusStage {
    /// The F-test.
    #[must_use]
    pub fn parametric(&self) -> &FTest {
        &self.parametric
    }

    /// The Kruskal–Wallis test.
    #[must_use]
    pub fn rank_based(&self) -> &KruskalWallis {
        &self.rank_based
    }

    /// Run the post-hoc comparisons when the F-test is significant and
    /// assemble the result. A failing Tukey falls back to Bonferroni.
    #[must_use]
    pub fn run_post_hoc(self) -> ANOVAResult {
        let AssumptionStage {
            data,
            summaries,
            assumptions,
        } = self.stage;
        let alpha = data.config.alpha;

        let post_hoc = if self.parametric.p_value < alpha {
            match tukey_hsd(
                &data.names,
                &data.groups,
                self.parametric.mean_square_within(),
                self.parametric.df_within,
                alpha,
            ) {
                Ok(comparisons) => PostHoc::Tukey { comparisons },
                Err(err) => {
                    warn!(
                        grouping = %data.grouping,
                        error = %err,
                        "Tukey HSD failed, using Bonferroni-adjusted t-tests"
                    );
                    PostHoc::Bonferroni {
                        cause: err.to_string(),
                        comparisons: bonferroni(
                            &data.names,
                            &data.groups,
                            assumptions.homogeneity,
                            alpha,
                        ),
                    }
                }
            }
        } else {
            PostHoc::NotRun
        };

        debug!(
            grouping = %data.grouping,
            response = %data.response,
            groups = data.groups.len(),
            f = self.parametric.statistic,
            p = self.parametric.p_value,
            "one-way ANOVA complete"
        );

        ANOVAResult {
            grouping: data.grouping,
            response: data.response,
            alpha,
            groups: summaries,
            assumptions,
            parametric: self.parametric,
            rank_based: self.rank_based,
            post_hoc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{TableBuilder, YIELD};

    fn table(groups: &[(&str, Vec<f64>)]) -> ObservationTable {
        let labels: Vec<&str> = groups
            .iter()
            .flat_map(|(name, values)| std::iter::repeat(*name).take(values.len()))
            .collect();
        let values: Vec<f64> = groups.iter().flat_map(|(_, v)| v.iter().copied()).collect();
        TableBuilder::new()
            .categorical_column("cultura", labels)
            .numeric_column(YIELD, values)
            .build()
            .unwrap()
    }

    #[test]
    fn test_separated_groups() {
        let table = table(&[
            ("C", vec![1.0, 2.0, 1.0, 3.0, 2.0]),
            ("A", vec![1.0, 2.0, 3.0, 2.0, 1.0]),
            ("B", vec![10.0, 11.0, 9.0, 10.0, 12.0]),
        ]);
        let result = one_way(&table, "cultura", YIELD).unwrap();

        let names: Vec<&str> = result.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(result.observations(), 15);

        assert!(result.significant());
        assert!(result.rank_significant());
        assert!(result.assumptions.parametric_ok());
        assert_eq!(result.parametric.effect, Some(EffectMagnitude::Large));

        assert!(matches!(result.post_hoc, PostHoc::Tukey { .. }));
        assert_eq!(
            result.post_hoc.significant_pairs(),
            vec![("A", "B"), ("B", "C")]
        );
    }

    #[test]
    fn test_identical_constant_groups() {
        let table = table(&[("x", vec![5.0, 5.0, 5.0]), ("y", vec![5.0, 5.0, 5.0])]);
        let result = one_way(&table, "cultura", YIELD).unwrap();

        assert!(result.parametric.p_value.is_nan());
        assert!(!result.significant());
        assert!(!result.rank_significant());
        assert_eq!(result.post_hoc, PostHoc::NotRun);
        assert!(result.assumptions.normality);
        assert!(!result.assumptions.homogeneity);
    }

    #[test]
    fn test_tukey_falls_back_to_bonferroni() {
        // Distinct constant groups: infinite F, zero pooled variance
        let table = table(&[
            ("a", vec![1.0, 1.0, 1.0]),
            ("b", vec![2.0, 2.0, 2.0]),
            ("c", vec![3.0, 3.0, 3.0]),
        ]);
        let result = one_way(&table, "cultura", YIELD).unwrap();

        assert!(result.significant());
        match &result.post_hoc {
            PostHoc::Bonferroni { cause, comparisons } => {
                assert!(cause.contains("variance"));
                assert_eq!(comparisons.len(), 3);
            }
            other => panic!("expected Bonferroni fallback, got {other:?}"),
        }
        assert_eq!(result.post_hoc.significant_pairs().len(), 3);
    }

    #[test]
    fn test_no_post_hoc_when_not_significant() {
        let table = table(&[
            ("a", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ("b", vec![2.0, 1.0, 4.0, 3.0, 5.0]),
        ]);
        let result = one_way(&table, "cultura", YIELD).unwrap();
        assert!(!result.significant());
        assert_eq!(result.post_hoc, PostHoc::NotRun);
    }

    #[test]
    fn test_small_group_excluded_from_normality() {
        let table = table(&[
            ("a", vec![1.0, 2.0]),
            ("b", vec![10.0, 11.0, 9.0, 10.0, 12.0]),
            ("c", vec![1.0, 2.0, 1.0, 3.0, 2.0]),
        ]);
        let result = one_way(&table, "cultura", YIELD).unwrap();
        assert!(result.groups[0].normality.is_none());
        assert_eq!(result.assumptions.normality_tested, 2);
        assert!(!result.assumptions.adequate_sample_size);
    }

    #[test]
    fn test_insufficient_groups() {
        let table = table(&[("a", vec![1.0, 2.0, 3.0])]);
        assert_eq!(
            one_way(&table, "cultura", YIELD).unwrap_err(),
            Error::InsufficientGroups {
                grouping: "cultura".to_string(),
                found: 1
            }
        );
    }

    #[test]
    fn test_missing_values_skip_rows() {
        let table = TableBuilder::new()
            .categorical_column("cultura", vec![Some("a"), Some("a"), None, Some("b"), Some("b")])
            .numeric_column(YIELD, vec![Some(1.0), Some(2.0), Some(9.0), None, Some(4.0)])
            .build()
            .unwrap();
        let result = one_way(&table, "cultura", YIELD).unwrap();
        assert_eq!(result.groups[0].count, 2);
        assert_eq!(result.groups[1].count, 1);
    }

    #[test]
    fn test_variable_errors() {
        let table = table(&[("a", vec![1.0]), ("b", vec![2.0])]);
        assert!(matches!(
            one_way(&table, YIELD, YIELD),
            Err(Error::KindMismatch { .. })
        ));
        assert!(matches!(
            one_way(&table, "cultura", "cultura"),
            Err(Error::KindMismatch { .. })
        ));
        assert!(matches!(
            one_way(&table, "estagio_fenologico", YIELD),
            Err(Error::UnknownVariable(_))
        ));

        let config = ANOVAConfig {
            alpha: 1.5,
            ..ANOVAConfig::default()
        };
        assert!(matches!(
            one_way_with(&table, "cultura", YIELD, &config),
            Err(Error::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_stages_expose_intermediate_results() {
        let mut groups = BTreeMap::new();
        groups.insert("a".to_string(), vec![1.0, 2.0, 3.0]);
        groups.insert("b".to_string(), vec![4.0, 5.0, 6.0]);
        groups.insert("empty".to_string(), Vec::new());

        let grouped =
            GroupedResponse::from_groups("g", "y", groups, &ANOVAConfig::default()).unwrap();
        assert_eq!(grouped.group_count(), 2);

        let assumed = grouped.check_assumptions();
        assert_eq!(assumed.groups().len(), 2);

        let omnibus = assumed.run_omnibus().unwrap();
        assert_eq!(omnibus.parametric().df_within, 4);
        assert_eq!(omnibus.rank_based().df, 1);

        let result = omnibus.run_post_hoc();
        assert_eq!(result.grouping, "g");
    }
}
