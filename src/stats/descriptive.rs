//! Descriptive statistics over slices.
//!
//! Empty input gives NaN rather than an error; callers check sizes first.

/// Arithmetic mean. NaN for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
#[must_use]
pub fn sum_of_squares(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
///
/// NaN when `values.len() <= ddof`.
#[must_use]
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return f64::NAN;
    }
    sum_of_squares(values) / (values.len() - ddof) as f64
}

/// Standard deviation with `ddof` delta degrees of freedom.
#[must_use]
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

/// Median. NaN for an empty slice.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Whether every value equals the first one.
#[must_use]
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Ranks with ties given their average rank (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Rank of each input value, in input order.
    pub ranks: Vec<f64>,
    /// Σ (t³ − t) over groups of `t` tied values.
    pub tie_sum: f64,
}

/// Average ranks of `values`.
///
/// # Algorithm
/// Sort indices by value, walk runs of equal values and give every member of
/// a run the mean of the positions it spans.
#[must_use]
pub fn rank_average(values: &[f64]) -> Ranking {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut tie_sum = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        let t = (end - start) as f64;
        tie_sum += t.powi(3) - t;
        start = end;
    }

    Ranking { ranks, tie_sum }
}

/// Pearson product-moment correlation.
///
/// `None` when fewer than two pairs are given or either side has zero
/// variance.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 || is_constant(x) || is_constant(y) {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Spearman rank correlation: Pearson over average ranks.
#[must_use]
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    pearson(&rank_average(&x[..n]).ranks, &rank_average(&y[..n]).ranks)
}
