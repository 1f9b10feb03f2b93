//! Tail probabilities of the sampling distributions used by the engines.
//!
//! - F-distribution upper tail (omnibus F-test, Levene)
//! - Student t two-sided p-value (correlation significance, pairwise t-tests)
//! - Chi-squared upper tail (Kruskal–Wallis)
//! - Studentized range distribution (Tukey HSD)

use super::special::{ln_gamma, normal_cdf, normal_pdf, regularized_gamma_q, regularized_incomplete_beta};
use crate::error::{Error, Result};

/// Calculate p-value from F-distribution.
///
/// Returns P(F > f) for the F-distribution with df1 and df2 degrees of freedom.
/// Degrees of freedom may be fractional. Returns NaN for a NaN statistic.
///
/// # Arguments
/// * `f` - F statistic value
/// * `df1` - Numerator degrees of freedom
/// * `df2` - Denominator degrees of freedom
#[must_use]
pub fn f_distribution_p_value(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() {
        return f64::NAN;
    }
    if f <= 0.0 || df1 <= 0.0 || df2 <= 0.0 {
        return 1.0;
    }
    if f.is_infinite() {
        return 0.0;
    }

    // P(F > f) = I_x(df2/2, df1/2) where x = df2/(df2 + df1*f)
    let x = df2 / (df2 + df1 * f);
    regularized_incomplete_beta(x, df2 / 2.0, df1 / 2.0)
}

/// Two-sided p-value P(|T| > |t|) for Student's t with `df` degrees of freedom.
#[must_use]
pub fn t_two_sided_p_value(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    if df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    let x = df / (df + t * t);
    regularized_incomplete_beta(x, df / 2.0, 0.5)
}

/// Upper tail P(X > x) of the chi-squared distribution.
#[must_use]
pub fn chi_squared_p_value(x: f64, df: f64) -> f64 {
    if x.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    regularized_gamma_q(df / 2.0, x / 2.0)
}

const RANGE_Z_LIMIT: f64 = 8.0;
const RANGE_INNER_INTERVALS: usize = 128;
const RANGE_OUTER_INTERVALS: usize = 256;
const RANGE_LARGE_DF: f64 = 25_000.0;

/// CDF of the studentized range Q for `k` means and `df` error degrees of
/// freedom.
///
/// Integrates the range distribution of `k` standard normals against the
/// density of s = sqrt(χ²_df / df) with composite Simpson rules.
///
/// # Errors
/// `InvalidParams` for k < 2 or df < 1, `NumericalInstability` if `q` is NaN
/// or the integral is not finite.
pub fn studentized_range_cdf(q: f64, k: usize, df: f64) -> Result<f64> {
    if k < 2 {
        return Err(Error::invalid_params("studentized range needs at least 2 means"));
    }
    if df.is_nan() || df < 1.0 {
        return Err(Error::invalid_params(format!(
            "studentized range needs df >= 1, got {df}"
        )));
    }
    if q.is_nan() {
        return Err(Error::numerical_instability("studentized range statistic is NaN"));
    }
    if q <= 0.0 {
        return Ok(0.0);
    }
    if q.is_infinite() {
        return Ok(1.0);
    }

    let grid = NormalGrid::new(k);
    if df > RANGE_LARGE_DF {
        return Ok(grid.range_cdf(q).clamp(0.0, 1.0));
    }

    let half_df = df / 2.0;
    let ln_norm = half_df * df.ln() - ln_gamma(half_df) - (half_df - 1.0) * 2.0_f64.ln();
    let lower = (1.0 - 8.0 / df.sqrt()).max(0.0);
    let upper = 1.0 + 10.0 / df.sqrt();

    let integral = simpson(lower, upper, RANGE_OUTER_INTERVALS, |s| {
        if s <= 0.0 {
            return 0.0;
        }
        let density = (ln_norm + (df - 1.0) * s.ln() - half_df * s * s).exp();
        density * grid.range_cdf(q * s)
    });

    if !integral.is_finite() {
        return Err(Error::numerical_instability(format!(
            "studentized range integral diverged for q={q}, k={k}, df={df}"
        )));
    }
    Ok(integral.clamp(0.0, 1.0))
}

/// Upper tail P(Q > q) of the studentized range distribution.
///
/// # Errors
/// Same as [`studentized_range_cdf`].
pub fn studentized_range_p_value(q: f64, k: usize, df: f64) -> Result<f64> {
    studentized_range_cdf(q, k, df).map(|cdf| (1.0 - cdf).clamp(0.0, 1.0))
}

/// Quantile of the studentized range: the q with P(Q <= q) = `p`.
///
/// Bisection on [`studentized_range_cdf`] to an absolute width of 1e-6.
///
/// # Errors
/// `InvalidParams` for `p` outside (0, 1), plus the errors of
/// [`studentized_range_cdf`].
pub fn studentized_range_quantile(p: f64, k: usize, df: f64) -> Result<f64> {
    if p.is_nan() || p <= 0.0 || p >= 1.0 {
        return Err(Error::invalid_params(format!(
            "studentized range quantile needs p in (0, 1), got {p}"
        )));
    }

    let mut lower = 0.0;
    let mut upper = 8.0;
    while studentized_range_cdf(upper, k, df)? < p {
        lower = upper;
        upper *= 2.0;
        if upper > 1e6 {
            return Err(Error::numerical_instability(format!(
                "studentized range quantile did not bracket p={p}, k={k}, df={df}"
            )));
        }
    }
    while upper - lower > 1e-6 {
        let mid = 0.5 * (lower + upper);
        if studentized_range_cdf(mid, k, df)? < p {
            lower = mid;
        } else {
            upper = mid;
        }
    }
    Ok(0.5 * (lower + upper))
}

/// Normal density and CDF tabulated on the inner integration grid.
struct NormalGrid {
    k: usize,
    z: Vec<f64>,
    pdf: Vec<f64>,
    cdf: Vec<f64>,
}

impl NormalGrid {
    fn new(k: usize) -> Self {
        let h = 2.0 * RANGE_Z_LIMIT / RANGE_INNER_INTERVALS as f64;
        let z: Vec<f64> = (0..=RANGE_INNER_INTERVALS)
            .map(|i| -RANGE_Z_LIMIT + i as f64 * h)
            .collect();
        let pdf = z.iter().map(|&z| normal_pdf(z)).collect();
        let cdf = z.iter().map(|&z| normal_cdf(z)).collect();
        Self { k, z, pdf, cdf }
    }

    /// P(range of k standard normals <= w).
    fn range_cdf(&self, w: f64) -> f64 {
        if w <= 0.0 {
            return 0.0;
        }
        let h = 2.0 * RANGE_Z_LIMIT / RANGE_INNER_INTERVALS as f64;
        let exponent = (self.k - 1) as i32;
        let sum: f64 = (0..=RANGE_INNER_INTERVALS)
            .map(|i| {
                let inner = (self.cdf[i] - normal_cdf(self.z[i] - w)).max(0.0);
                simpson_weight(i, RANGE_INNER_INTERVALS) * self.pdf[i] * inner.powi(exponent)
            })
            .sum();
        (self.k as f64 * sum * h / 3.0).min(1.0)
    }
}

fn simpson_weight(i: usize, intervals: usize) -> f64 {
    if i == 0 || i == intervals {
        1.0
    } else if i % 2 == 1 {
        4.0
    } else {
        2.0
    }
}

fn simpson(lower: f64, upper: f64, intervals: usize, f: impl Fn(f64) -> f64) -> f64 {
    let h = (upper - lower) / intervals as f64;
    let sum: f64 = (0..=intervals)
        .map(|i| simpson_weight(i, intervals) * f(lower + i as f64 * h))
        .sum();
    sum * h / 3.0
}
