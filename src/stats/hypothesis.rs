//! Hypothesis tests shared by the ANOVA engine and residual diagnostics.
//!
//! Statistics that cannot be formed (zero variance, 0/0) come back as NaN
//! in a [`TestResult`]; callers decide whether that is an error or simply
//! "not significant".

use std::f64::consts::PI;

use super::descriptive::{mean, median, variance};
use super::distributions::{f_distribution_p_value, t_two_sided_p_value};
use super::special::{normal_quantile, normal_sf};
use crate::error::{Error, Result};

/// Statistic and p-value of a test.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestResult {
    /// Test statistic.
    pub statistic: f64,
    /// P-value (NaN when the statistic is undefined).
    pub p_value: f64,
}

impl TestResult {
    /// Whether the p-value is below `alpha`. NaN is never significant.
    #[must_use]
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

// Royston (1995) polynomial approximations, AS R94
const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_190, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const G: [f64; 2] = [-2.273, 0.459];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];

fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Shapiro–Wilk test of normality.
///
/// # Algorithm
/// Royston's AS R94:
/// 1. Expected normal order statistics mᵢ = Φ⁻¹((i − 3/8)/(n + 1/4))
/// 2. Coefficients aᵢ from m, with the two outermost corrected by
///    polynomials in 1/√n
/// 3. W = (Σ aᵢ (x₍ₙ₊₁₋ᵢ₎ − x₍ᵢ₎))² / Σ (xᵢ − x̄)²
/// 4. p-value from a normalizing transform of W (exact for n = 3)
///
/// Identical values have zero range; they are reported as W = 1, p = 1,
/// the same convention as AS R94's zero-range exit.
///
/// # Errors
/// `InsufficientData` for fewer than 3 values.
pub fn shapiro_wilk(values: &[f64]) -> Result<TestResult> {
    let n = values.len();
    if n < 3 {
        return Err(Error::insufficient_data(format!(
            "Shapiro-Wilk needs at least 3 values, got {n}"
        )));
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    let range = x[n - 1] - x[0];
    if range.is_nan() {
        return Err(Error::numerical_instability(
            "Shapiro-Wilk input contains NaN",
        ));
    }
    if range <= 1e-19 * x[n - 1].abs().max(1.0) {
        return Ok(TestResult {
            statistic: 1.0,
            p_value: 1.0,
        });
    }

    let coefficients = shapiro_coefficients(n);
    let numerator: f64 = coefficients
        .iter()
        .enumerate()
        .map(|(i, a)| a * (x[n - 1 - i] - x[i]))
        .sum();
    let ss: f64 = {
        let m = mean(&x);
        x.iter().map(|v| (v - m).powi(2)).sum()
    };
    let w = (numerator * numerator / ss).min(1.0);

    Ok(TestResult {
        statistic: w,
        p_value: shapiro_p_value(w, n),
    })
}

/// Upper-half coefficients a₁..a₍ₙ/₂₎ (positive, unit total norm over both halves).
fn shapiro_coefficients(n: usize) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    let an = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| normal_quantile((i as f64 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;

    let (first, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    for i in first..half {
        a[i] = -m[i] / fac;
    }
    a
}

fn shapiro_p_value(w: f64, n: usize) -> f64 {
    if n == 3 {
        let p = 6.0 / PI * (w.sqrt().asin() - PI / 3.0);
        return p.clamp(0.0, 1.0);
    }

    let an = n as f64;
    let mut y = (1.0 - w).ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return 1e-99;
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };

    normal_sf((y - m) / s).clamp(0.0, 1.0)
}

/// Levene's test for equal variances, centred on group medians
/// (Brown–Forsythe).
///
/// # Errors
/// `InsufficientData` for fewer than 2 groups or no within-group degrees of
/// freedom.
pub fn levene(groups: &[&[f64]]) -> Result<TestResult> {
    let k = groups.len();
    let total: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || groups.iter().any(|g| g.is_empty()) {
        return Err(Error::insufficient_data(
            "Levene needs at least 2 non-empty groups",
        ));
    }
    if total <= k {
        return Err(Error::insufficient_data(format!(
            "Levene needs more observations than groups, got {total} for {k} groups"
        )));
    }

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let centre = median(g);
            g.iter().map(|v| (v - centre).abs()).collect()
        })
        .collect();

    let group_means: Vec<f64> = deviations.iter().map(|d| mean(d)).collect();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / total as f64;

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(d, m)| d.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(d, m)| d.iter().map(|v| (v - m).powi(2)).sum::<f64>())
        .sum();

    let df1 = (k - 1) as f64;
    let df2 = (total - k) as f64;
    let statistic = (df2 / df1) * between / within;
    Ok(TestResult {
        statistic,
        p_value: f_distribution_p_value(statistic, df1, df2),
    })
}

/// Independent two-sample t-test.
///
/// Pooled variance (Student) when `equal_variance`, otherwise Welch's
/// unequal-variance form with Satterthwaite degrees of freedom. The sign of
/// the statistic follows mean(a) − mean(b).
#[must_use]
pub fn two_sample_t_test(a: &[f64], b: &[f64], equal_variance: bool) -> TestResult {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (v1, v2) = (variance(a, 1), variance(b, 1));
    let diff = mean(a) - mean(b);

    let (se, df) = if equal_variance {
        let df = n1 + n2 - 2.0;
        let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
        ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
    } else {
        let q1 = v1 / n1;
        let q2 = v2 / n2;
        let df = (q1 + q2).powi(2) / (q1 * q1 / (n1 - 1.0) + q2 * q2 / (n2 - 1.0));
        ((q1 + q2).sqrt(), df)
    };

    let statistic = diff / se;
    TestResult {
        statistic,
        p_value: t_two_sided_p_value(statistic, df),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapiro_wilk_three_values() {
        // Equally spaced triple gives W = 1, p = 1
        let r = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert!((r.statistic - 1.0).abs() < 1e-12);
        assert!((r.p_value - 1.0).abs() < 1e-9);

        // W = 0.75 is the lower bound for n = 3, p = 0
        let r = shapiro_wilk(&[0.0, 0.0, 1.0]).unwrap();
        assert!((r.statistic - 0.75).abs() < 1e-12);
        assert!(r.p_value < 1e-9);
    }

    #[test]
    fn test_shapiro_wilk_reference_values() {
        // scipy.stats.shapiro([148, 154, 158, 160, 161, 162, 166, 170, 182, 195, 236])
        // W = 0.7888, p = 0.0067
        let data = [
            148.0, 154.0, 158.0, 160.0, 161.0, 162.0, 166.0, 170.0, 182.0, 195.0, 236.0,
        ];
        let r = shapiro_wilk(&data).unwrap();
        assert!((r.statistic - 0.7888).abs() < 1e-3, "W = {}", r.statistic);
        assert!((r.p_value - 0.0067).abs() < 5e-4, "p = {}", r.p_value);
    }

    #[test]
    fn test_shapiro_wilk_normal_like_sample() {
        let data: Vec<f64> = (1..=20)
            .map(|i| normal_quantile((f64::from(i) - 0.5) / 20.0))
            .collect();
        let r = shapiro_wilk(&data).unwrap();
        assert!(r.statistic > 0.97);
        assert!(r.p_value > 0.5);
    }

    #[test]
    fn test_shapiro_wilk_errors() {
        assert!(matches!(
            shapiro_wilk(&[1.0, 2.0]),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_shapiro_wilk_identical_values() {
        let r = shapiro_wilk(&[4.0, 4.0, 4.0, 4.0]).unwrap();
        assert_eq!(r.statistic, 1.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_levene_equal_spread() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [11.0, 12.0, 13.0, 14.0, 15.0];
        let r = levene(&[&a, &b]).unwrap();
        assert!(r.statistic.abs() < 1e-12);
        assert!((r.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_levene_unequal_spread() {
        let a = [9.0, 10.0, 10.0, 10.0, 11.0, 10.0];
        let b = [0.0, 20.0, 5.0, 15.0, -5.0, 25.0];
        let r = levene(&[&a, &b]).unwrap();
        assert!(r.rejects(0.05), "p = {}", r.p_value);
    }

    #[test]
    fn test_levene_needs_groups() {
        assert!(levene(&[&[1.0, 2.0]]).is_err());
        assert!(levene(&[&[1.0], &[2.0]]).is_err());
    }

    #[test]
    fn test_two_sample_t_test() {
        let a = [1.0, 2.0, 3.0, 2.0, 1.0];
        let b = [10.0, 11.0, 9.0, 10.0, 12.0];
        let pooled = two_sample_t_test(&a, &b, true);
        assert!(pooled.statistic < 0.0);
        assert!(pooled.p_value < 1e-6);

        let welch = two_sample_t_test(&a, &b, false);
        assert!((welch.statistic - pooled.statistic).abs() < 1e-12); // equal n
        assert!(welch.p_value >= pooled.p_value);

        let same = two_sample_t_test(&a, &a, true);
        assert!(same.statistic.abs() < 1e-12);
        assert!((same.p_value - 1.0).abs() < 1e-9);
        assert!(!same.rejects(0.05));
    }

    #[test]
    fn test_nan_never_rejects() {
        let r = TestResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
        assert!(!r.rejects(0.05));
    }
}
