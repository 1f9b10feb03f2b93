//! Omnibus tests: one-way F-test and Kruskal–Wallis H.
//!
//! Both always run; the F-test gates the post-hoc stage, the rank test is
//! reported alongside for when the parametric assumptions do not hold.

use super::types::{EffectMagnitude, FTest, KruskalWallis};
use crate::error::{Error, Result};
use crate::stats::{chi_squared_p_value, f_distribution_p_value, mean, rank_average};

fn check_groups(groups: &[&[f64]]) -> Result<usize> {
    if groups.len() < 2 || groups.iter().any(|g| g.is_empty()) {
        return Err(Error::insufficient_data(
            "omnibus tests need at least 2 non-empty groups",
        ));
    }
    Ok(groups.iter().map(|g| g.len()).sum())
}

/// One-way analysis of variance.
///
/// # Algorithm
/// 1. SSB = Σ nᵢ(ȳᵢ − ȳ)², SSW = Σ Σ (y − ȳᵢ)²
/// 2. F = (SSB / (k − 1)) / (SSW / (N − k))
/// 3. η² = SSB / (SSB + SSW)
///
/// F is infinite when the groups differ but are each constant, and NaN when
/// every observation is equal or N = k.
///
/// # Errors
/// `InsufficientData` for fewer than 2 groups or an empty group.
pub fn f_test(groups: &[&[f64]]) -> Result<FTest> {
    let total = check_groups(groups)?;
    let k = groups.len();
    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let group_mean = mean(group);
        ss_between += group.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - group_mean).powi(2)).sum::<f64>();
    }

    let df_between = k - 1;
    let df_within = total - k;
    let statistic = if df_within == 0 {
        f64::NAN
    } else {
        (ss_between / df_between as f64) / (ss_within / df_within as f64)
    };
    let ss_total = ss_between + ss_within;
    let eta_squared = if ss_total > 0.0 { ss_between / ss_total } else { f64::NAN };

    Ok(FTest {
        statistic,
        p_value: f_distribution_p_value(statistic, df_between as f64, df_within as f64),
        df_between,
        df_within,
        ss_between,
        ss_within,
        eta_squared,
        effect: EffectMagnitude::classify(eta_squared),
    })
}

/// Kruskal–Wallis rank test.
///
/// # Algorithm
/// 1. Rank all observations together, ties sharing their average rank
/// 2. H = 12 / (N(N + 1)) · Σ Rᵢ² / nᵢ − 3(N + 1)
/// 3. Divide by the tie correction 1 − Σ(t³ − t) / (N³ − N)
/// 4. p from χ² with k − 1 degrees of freedom
/// 5. ε² = (H − (k − 1)) / (N − k)
///
/// H is NaN when every observation is tied.
///
/// # Errors
/// `InsufficientData` for fewer than 2 groups or an empty group.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<KruskalWallis> {
    let total = check_groups(groups)?;
    let k = groups.len();
    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let ranking = rank_average(&pooled);

    let n = total as f64;
    let mut offset = 0;
    let mut rank_term = 0.0;
    for group in groups {
        let rank_sum: f64 = ranking.ranks[offset..offset + group.len()].iter().sum();
        rank_term += rank_sum * rank_sum / group.len() as f64;
        offset += group.len();
    }

    let uncorrected = 12.0 / (n * (n + 1.0)) * rank_term - 3.0 * (n + 1.0);
    let correction = 1.0 - ranking.tie_sum / (n * n * n - n);
    let statistic = if correction > 0.0 {
        uncorrected / correction
    } else {
        f64::NAN
    };

    let df = k - 1;
    let epsilon_squared = if total > k {
        (statistic - df as f64) / (total - k) as f64
    } else {
        f64::NAN
    };

    Ok(KruskalWallis {
        statistic,
        p_value: chi_squared_p_value(statistic, df as f64),
        df,
        epsilon_squared,
        effect: EffectMagnitude::classify(epsilon_squared),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: [f64; 5] = [1.0, 2.0, 3.0, 2.0, 1.0];
    const B: [f64; 5] = [10.0, 11.0, 9.0, 10.0, 12.0];
    const C: [f64; 5] = [1.0, 2.0, 1.0, 3.0, 2.0];

    #[test]
    fn test_f_test_separated_groups() {
        let result = f_test(&[&A, &B, &C]).unwrap();
        assert_eq!(result.df_between, 2);
        assert_eq!(result.df_within, 12);
        assert!((result.ss_within - 10.8).abs() < 1e-9);
        assert!((result.ss_between - 246.533_333).abs() < 1e-4);
        assert!((result.statistic - 136.963).abs() < 1e-2);
        assert!(result.p_value < 1e-6);
        assert!((result.mean_square_within() - 0.9).abs() < 1e-12);
        assert_eq!(result.effect, Some(EffectMagnitude::Large));
    }

    #[test]
    fn test_f_test_identical_constant_groups() {
        let g = [5.0, 5.0, 5.0];
        let result = f_test(&[&g, &g]).unwrap();
        assert!(result.statistic.is_nan());
        assert!(result.p_value.is_nan());
        assert!(result.eta_squared.is_nan());
        assert_eq!(result.effect, None);
    }

    #[test]
    fn test_f_test_distinct_constant_groups() {
        let result = f_test(&[&[1.0, 1.0], &[2.0, 2.0]]).unwrap();
        assert!(result.statistic.is_infinite());
        assert_eq!(result.p_value, 0.0);
        assert_eq!(result.eta_squared, 1.0);
    }

    #[test]
    fn test_kruskal_wallis_with_ties() {
        // H = 9.375 / (1 - 132/3360)
        let result = kruskal_wallis(&[&A, &B, &C]).unwrap();
        let expected = 9.375 / (1.0 - 132.0 / 3360.0);
        assert!((result.statistic - expected).abs() < 1e-9);
        assert!((result.p_value - (-expected / 2.0).exp()).abs() < 1e-9);
        assert!((result.epsilon_squared - (expected - 2.0) / 12.0).abs() < 1e-9);
        assert_eq!(result.effect, Some(EffectMagnitude::Large));
    }

    #[test]
    fn test_kruskal_wallis_all_tied() {
        let g = [5.0, 5.0, 5.0];
        let result = kruskal_wallis(&[&g, &g]).unwrap();
        assert!(result.statistic.is_nan());
        assert!(result.p_value.is_nan());
    }

    #[test]
    fn test_needs_two_groups() {
        assert!(f_test(&[&A]).is_err());
        assert!(kruskal_wallis(&[&A, &[]]).is_err());
    }

    #[test]
    fn test_effect_bands() {
        assert_eq!(EffectMagnitude::classify(0.005), Some(EffectMagnitude::Negligible));
        assert_eq!(EffectMagnitude::classify(0.01), Some(EffectMagnitude::Small));
        assert_eq!(EffectMagnitude::classify(0.06), Some(EffectMagnitude::Medium));
        assert_eq!(EffectMagnitude::classify(0.14), Some(EffectMagnitude::Large));
        assert_eq!(EffectMagnitude::classify(-0.2), Some(EffectMagnitude::Negligible));
        assert_eq!(EffectMagnitude::classify(f64::NAN), None);
    }
}
