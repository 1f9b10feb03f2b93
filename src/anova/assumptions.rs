//! Assumption checks ahead of the omnibus tests.

use tracing::debug;

use super::types::{ANOVAConfig, Assumptions, GroupSummary};
use crate::stats::{levene, mean, shapiro_wilk, std_dev};

/// Summarize each group and judge the parametric assumptions.
///
/// # Arguments
/// * `names` - Group labels, parallel to `groups`
/// * `groups` - Response values of each group
/// * `config` - Significance level and size thresholds
///
/// # Algorithm
/// 1. Shapiro–Wilk on every group with at least `min_normality_size`
///    values; smaller groups are left out of the verdict, constant groups
///    pass (W = 1, p = 1)
/// 2. Normality holds when every tested group has p > alpha, and fails when
///    no group could be tested
/// 3. Levene (median-centred) across all groups; homogeneity holds when
///    p > alpha
/// 4. Sample size is adequate when every group reaches `adequate_group_size`
pub fn check_assumptions(
    names: &[String],
    groups: &[Vec<f64>],
    config: &ANOVAConfig,
) -> (Vec<GroupSummary>, Assumptions) {
    let summaries: Vec<GroupSummary> = names
        .iter()
        .zip(groups)
        .map(|(name, values)| {
            let normality = if values.len() >= config.min_normality_size {
                shapiro_wilk(values).ok()
            } else {
                None
            };
            GroupSummary {
                name: name.clone(),
                count: values.len(),
                mean: mean(values),
                std_dev: std_dev(values, 1),
                normality,
            }
        })
        .collect();

    let tested: Vec<f64> = summaries
        .iter()
        .filter_map(|s| s.normality.map(|t| t.p_value))
        .collect();
    let normality = !tested.is_empty() && tested.iter().all(|&p| p > config.alpha);

    let slices: Vec<&[f64]> = groups.iter().map(Vec::as_slice).collect();
    let levene = levene(&slices).ok();
    let homogeneity = levene.map_or(false, |t| t.p_value > config.alpha);

    let adequate_sample_size = groups.iter().all(|g| g.len() >= config.adequate_group_size);

    debug!(
        groups = groups.len(),
        normality_tested = tested.len(),
        normality,
        homogeneity,
        "assumptions checked"
    );

    (
        summaries,
        Assumptions {
            normality,
            normality_tested: tested.len(),
            homogeneity,
            levene,
            independence: true,
            adequate_sample_size,
        },
    )
}
