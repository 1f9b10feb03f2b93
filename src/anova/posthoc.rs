//! Pairwise comparisons after a significant F-test.

use super::types::{BonferroniComparison, TukeyComparison};
use crate::error::{Error, Result};
use crate::stats::{mean, studentized_range_p_value, studentized_range_quantile, two_sample_t_test};

fn pairs(k: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..k).flat_map(move |i| (i + 1..k).map(move |j| (i, j)))
}

/// Tukey–Kramer honestly significant difference.
///
/// # Arguments
/// * `names` - Group labels in sorted order
/// * `groups` - Values of each group
/// * `mse` - Within-groups mean square from the F-test
/// * `df` - Within-groups degrees of freedom
/// * `alpha` - Family-wise significance level
///
/// # Algorithm
/// For each pair (a, b): d = ȳb − ȳa, se = sqrt(MSE/2 · (1/na + 1/nb)),
/// q = |d| / se. The p-value is the studentized range upper tail for k
/// means; the interval is d ± q₁₋α · se.
///
/// # Errors
/// `NumericalInstability` when the pooled variance is zero or not finite,
/// `InvalidParams` when there are no error degrees of freedom.
pub fn tukey_hsd(
    names: &[String],
    groups: &[Vec<f64>],
    mse: f64,
    df: usize,
    alpha: f64,
) -> Result<Vec<TukeyComparison>> {
    if mse.is_nan() || mse <= 0.0 || mse.is_infinite() {
        return Err(Error::numerical_instability(format!(
            "pooled within-group variance is {mse}"
        )));
    }
    let k = groups.len();
    let df = df as f64;
    let q_crit = studentized_range_quantile(1.0 - alpha, k, df)?;
    let means: Vec<f64> = groups.iter().map(|g| mean(g)).collect();

    pairs(k)
        .map(|(a, b)| {
            let diff = means[b] - means[a];
            let inverse_sizes = 1.0 / groups[a].len() as f64 + 1.0 / groups[b].len() as f64;
            let se = (mse / 2.0 * inverse_sizes).sqrt();
            let q = diff.abs() / se;
            let p_adjusted = studentized_range_p_value(q, k, df)?;
            Ok(TukeyComparison {
                group_a: names[a].clone(),
                group_b: names[b].clone(),
                mean_diff: diff,
                q,
                p_adjusted,
                lower: diff - q_crit * se,
                upper: diff + q_crit * se,
                reject: p_adjusted < alpha,
            })
        })
        .collect()
}

/// Pairwise two-sample t-tests with Bonferroni adjustment.
///
/// Student's pooled test when `equal_variance`, Welch's otherwise. Adjusted
/// p = min(p · m, 1) over m = k(k − 1)/2 pairs; an undefined p stays
/// undefined and is never significant.
#[must_use]
pub fn bonferroni(
    names: &[String],
    groups: &[Vec<f64>],
    equal_variance: bool,
    alpha: f64,
) -> Vec<BonferroniComparison> {
    let k = groups.len();
    let m = (k * k.saturating_sub(1) / 2) as f64;

    pairs(k)
        .map(|(a, b)| {
            let test = two_sample_t_test(&groups[a], &groups[b], equal_variance);
            let p_adjusted = if test.p_value.is_nan() {
                f64::NAN
            } else {
                (test.p_value * m).min(1.0)
            };
            BonferroniComparison {
                group_a: names[a].clone(),
                group_b: names[b].clone(),
                t_statistic: test.statistic,
                p_value: test.p_value,
                p_adjusted,
                significant: p_adjusted < alpha,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> (Vec<String>, Vec<Vec<f64>>) {
        (
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![
                vec![1.0, 2.0, 3.0, 2.0, 1.0],
                vec![10.0, 11.0, 9.0, 10.0, 12.0],
                vec![1.0, 2.0, 1.0, 3.0, 2.0],
            ],
        )
    }

    #[test]
    fn test_pairs_order() {
        assert_eq!(pairs(3).collect::<Vec<_>>(), vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(pairs(1).count(), 0);
    }

    #[test]
    fn test_tukey_separated_groups() {
        let (names, groups) = abc();
        let comparisons = tukey_hsd(&names, &groups, 0.9, 12, 0.05).unwrap();
        assert_eq!(comparisons.len(), 3);

        let ab = &comparisons[0];
        assert_eq!((ab.group_a.as_str(), ab.group_b.as_str()), ("A", "B"));
        assert!((ab.mean_diff - 8.6).abs() < 1e-12);
        assert!(ab.reject);
        assert!(ab.lower > 0.0);

        let ac = &comparisons[1];
        assert!(ac.mean_diff.abs() < 1e-12);
        assert!(!ac.reject);
        assert!(ac.lower < 0.0 && ac.upper > 0.0);
        // Interval half-width is q(0.95; 3, 12) * sqrt(0.18)
        assert!(((ac.upper - ac.lower) / 2.0 - 3.773 * 0.18_f64.sqrt()).abs() < 1e-2);

        let bc = &comparisons[2];
        assert!((bc.mean_diff + 8.6).abs() < 1e-12);
        assert!(bc.reject);

        // statsmodels pairwise_tukeyhsd: p-adj 0.0 for A-B and B-C, 1.0 for A-C
        assert!(ab.p_adjusted < 1e-6);
        assert_eq!(ac.p_adjusted, 1.0);
        assert!(bc.p_adjusted < 1e-6);
    }

    #[test]
    fn test_tukey_two_groups_matches_pooled_t() {
        // With two means q = √2·|t|, so pairwise_tukeyhsd reports the pooled
        // t-test p-value: t = 2.2379 on 8 df, p ≈ 0.0556
        let names = vec!["milho".to_string(), "soja".to_string()];
        let groups = vec![
            vec![4.1, 5.3, 4.8, 5.9, 5.0],
            vec![5.6, 6.2, 5.1, 6.8, 6.0],
        ];
        // Pooled within-group variance: (1.748 + 1.632) / 8
        let mse = 0.4225;
        let comparisons = tukey_hsd(&names, &groups, mse, 8, 0.05).unwrap();
        let t = two_sample_t_test(&groups[0], &groups[1], true);

        let tukey = &comparisons[0];
        assert!((tukey.mean_diff - 0.92).abs() < 1e-12);
        assert!((tukey.q - 2.0_f64.sqrt() * t.statistic.abs()).abs() < 1e-9);
        assert!((tukey.p_adjusted - t.p_value).abs() < 5e-4);
        assert!((tukey.p_adjusted - 0.0556).abs() < 1e-3);
        assert!(!tukey.reject);
        assert!(tukey.lower < 0.0 && tukey.upper > 0.0);
    }

    #[test]
    fn test_tukey_zero_variance_fails() {
        let names = vec!["a".to_string(), "b".to_string()];
        let groups = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        assert!(matches!(
            tukey_hsd(&names, &groups, 0.0, 2, 0.05),
            Err(Error::NumericalInstability { .. })
        ));
    }

    #[test]
    fn test_bonferroni_adjustment() {
        let (names, groups) = abc();
        let comparisons = bonferroni(&names, &groups, true, 0.05);
        assert_eq!(comparisons.len(), 3);
        for c in &comparisons {
            assert!(c.p_adjusted >= c.p_value);
            assert!(c.p_adjusted <= 1.0);
        }
        assert!(comparisons[0].significant);
        assert!(!comparisons[1].significant);
        assert_eq!(comparisons[1].p_adjusted, 1.0);
        assert!(comparisons[2].significant);
    }

    #[test]
    fn test_bonferroni_constant_groups() {
        let names = vec!["a".to_string(), "b".to_string()];
        let groups = vec![vec![1.0, 1.0, 1.0], vec![2.0, 2.0, 2.0]];
        let comparisons = bonferroni(&names, &groups, false, 0.05);
        assert!(comparisons[0].t_statistic.is_infinite());
        assert_eq!(comparisons[0].p_adjusted, 0.0);
        assert!(comparisons[0].significant);
    }
}
