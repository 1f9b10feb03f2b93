//! Variance inflation factors of the training design.

use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::types::{VIFEntry, VIFLevel};
use crate::error::Result;
use crate::stats::linalg::lstsq;

/// Name of the constant column in the VIF table.
pub const CONSTANT_TERM: &str = "const";

/// 1 − R² below which a column is treated as perfectly collinear.
const COLLINEARITY_TOLERANCE: f64 = 1e-10;

/// VIF of every column of `[1, x]`, constant first.
///
/// # Arguments
/// * `x` - Unscaled, imputed training predictors
/// * `names` - Predictor names, one per column of `x`
///
/// # Algorithm
/// For each design column j, regress it on the remaining columns by least
/// squares and take VIFⱼ = 1 / (1 − R²ⱼ). R² is centered when the
/// remaining columns contain a constant, uncentered otherwise. A column that
/// the others reproduce exactly (or one with no variation to explain) gets
/// an infinite VIF.
///
/// # Errors
/// `NumericalInstability` if an auxiliary regression cannot be solved.
pub fn variance_inflation(x: ArrayView2<'_, f64>, names: &[String]) -> Result<Vec<VIFEntry>> {
    let n = x.nrows();
    let mut design = Array2::<f64>::ones((n, x.ncols() + 1));
    design.slice_mut(ndarray::s![.., 1..]).assign(&x);

    let constant_columns: Vec<bool> = design
        .columns()
        .into_iter()
        .map(|c| {
            c.first()
                .map_or(false, |&first| first != 0.0 && c.iter().all(|&v| v == first))
        })
        .collect();

    (0..design.ncols())
        .map(|j| {
            let others: Vec<usize> = (0..design.ncols()).filter(|&k| k != j).collect();
            let centered = others.iter().any(|&k| constant_columns[k]);
            let r2 = auxiliary_r2(&design, j, &others, centered)?;
            let vif = if 1.0 - r2 < COLLINEARITY_TOLERANCE || r2.is_nan() {
                f64::INFINITY
            } else {
                (1.0 / (1.0 - r2)).max(1.0)
            };
            let (variable, constant) = if j == 0 {
                (CONSTANT_TERM.to_string(), true)
            } else {
                (names[j - 1].clone(), false)
            };
            Ok(VIFEntry {
                variable,
                vif,
                defined: vif.is_finite(),
                level: VIFLevel::from_vif(vif),
                constant,
            })
        })
        .collect()
}

fn auxiliary_r2(design: &Array2<f64>, j: usize, others: &[usize], centered: bool) -> Result<f64> {
    let target = design.column(j);
    let total: f64 = if centered {
        let mean = target.sum() / target.len().max(1) as f64;
        target.iter().map(|v| (v - mean).powi(2)).sum()
    } else {
        target.iter().map(|v| v * v).sum()
    };
    if total <= f64::EPSILON * target.iter().map(|v| v * v).sum::<f64>() {
        return Ok(f64::NAN);
    }

    let regressors = design.select(Axis(1), others);
    let fit = lstsq(regressors.view(), target)?;
    let predicted: Array1<f64> = regressors.dot(&fit.coefficients);
    let residual: f64 = target
        .iter()
        .zip(predicted.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok(1.0 - residual / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_orthogonal_predictors_have_unit_vif() {
        // Centered, orthogonal columns
        let x = array![[1.0, 1.0], [1.0, -1.0], [-1.0, 1.0], [-1.0, -1.0]];
        let table = variance_inflation(x.view(), &names(&["a", "b"])).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table[0].variable, CONSTANT_TERM);
        assert!(table[0].constant);
        for entry in &table[1..] {
            assert!((entry.vif - 1.0).abs() < 1e-9);
            assert_eq!(entry.level, VIFLevel::Low);
        }
    }

    #[test]
    fn test_duplicate_predictor_is_infinite() {
        let x = array![
            [1.0, 1.0, 0.3],
            [2.0, 2.0, 0.1],
            [3.0, 3.0, 0.4],
            [4.0, 4.0, 0.1],
            [5.0, 5.0, 0.5]
        ];
        let table = variance_inflation(x.view(), &names(&["a", "a_copy", "c"])).unwrap();

        assert!(table[1].vif.is_infinite() && !table[1].defined);
        assert!(table[2].vif.is_infinite() && !table[2].defined);
        assert_eq!(table[1].level, VIFLevel::High);
        assert!(table[3].defined);
        assert!(table.iter().all(|e| e.vif >= 1.0));
    }

    #[test]
    fn test_correlated_predictors_inflate() {
        let x = array![
            [1.0, 1.1],
            [2.0, 1.9],
            [3.0, 3.2],
            [4.0, 3.9],
            [5.0, 5.1],
            [6.0, 5.8]
        ];
        let table = variance_inflation(x.view(), &names(&["a", "b"])).unwrap();
        assert!(table[1].vif > 10.0);
        assert_eq!(table[1].level, VIFLevel::High);
        assert!((table[1].vif - table[2].vif).abs() < 1e-6);
    }

    #[test]
    fn test_levels() {
        assert_eq!(VIFLevel::from_vif(1.0), VIFLevel::Low);
        assert_eq!(VIFLevel::from_vif(5.0), VIFLevel::Moderate);
        assert_eq!(VIFLevel::from_vif(9.99), VIFLevel::Moderate);
        assert_eq!(VIFLevel::from_vif(10.0), VIFLevel::High);
        assert_eq!(VIFLevel::from_vif(f64::INFINITY), VIFLevel::High);
    }
}
