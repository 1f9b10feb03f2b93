//! Correlation engine.
//!
//! Computes the pairwise correlation matrix of the numeric variables and
//! ranks every variable by the strength of its correlation with a target.
//!
//! ## Quick Start
//!
//! ```rust
//! use agrostat::correlation::{correlate, CorrelationConfig};
//! use agrostat::table::{TableBuilder, YIELD};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = TableBuilder::new()
//!     .numeric_column("umidade_solo", vec![10.0, 20.0, 30.0, 40.0, 50.0])
//!     .numeric_column("ph", vec![6.1, 5.9, 6.4, 6.0, 6.2])
//!     .numeric_column(YIELD, vec![1.0, 2.0, 3.0, 4.0, 5.0])
//!     .build()?;
//!
//! let result = correlate(&table, YIELD, &CorrelationConfig::default())?;
//! assert_eq!(result.ranked()[0].variable, "umidade_solo");
//! # Ok(())
//! # }
//! ```

mod types;

pub use types::{CorrelationConfig, CorrelationEntry, CorrelationMethod, CorrelationResult};

use ndarray::Array2;
use tracing::debug;

use crate::error::{Error, Result};
use crate::stats::{pearson, rank_average, t_two_sided_p_value};
use crate::table::ObservationTable;

/// Correlate every numeric variable with `target`.
///
/// # Arguments
/// * `table` - Observation table
/// * `target` - Numeric variable to rank the others against
/// * `config` - Method and optional variable subset
///
/// # Returns
/// * The full matrix plus the target's row, ranked by |coefficient|
///
/// # Algorithm
/// 1. Select the numeric variables (configured subset or all with at least
///    one observed value), always including the target
/// 2. Keep the rows complete for every selected variable
/// 3. Replace values by average ranks for Spearman
/// 4. Fill the upper triangle, mirror it, set the diagonal to exactly 1
///
/// # Errors
/// * `InsufficientData` if the target is absent or not numeric, or no row
///   is complete
/// * `UnknownVariable` / `KindMismatch` for a bad configured variable
pub fn correlate(
    table: &ObservationTable,
    target: &str,
    config: &CorrelationConfig,
) -> Result<CorrelationResult> {
    if !table.is_numeric(target) {
        return Err(Error::insufficient_data(format!(
            "target '{target}' is not a numeric variable of the table"
        )));
    }

    let variables = select_variables(table, target, config)?;
    let names: Vec<&str> = variables.iter().map(String::as_str).collect();
    let rows = table.complete_rows(&names)?;
    if rows.is_empty() {
        return Err(Error::insufficient_data(
            "no row is complete for the correlated variables",
        ));
    }

    let data = table.numeric_matrix(&names, &rows)?;
    let columns: Vec<Vec<f64>> = data
        .columns()
        .into_iter()
        .map(|column| match config.method {
            CorrelationMethod::Pearson => column.to_vec(),
            CorrelationMethod::Spearman => rank_average(&column.to_vec()).ranks,
        })
        .collect();

    let matrix = correlation_matrix(&columns);
    let n = rows.len();
    let target_idx = names.iter().position(|&v| v == target).unwrap_or_default();

    let mut entries: Vec<CorrelationEntry> = variables
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != target_idx)
        .map(|(j, variable)| {
            let value = matrix[[target_idx, j]];
            let coefficient = (!value.is_nan()).then_some(value);
            CorrelationEntry {
                variable: variable.clone(),
                coefficient,
                p_value: coefficient.and_then(|r| coefficient_p_value(r, n)),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        let key = |e: &CorrelationEntry| e.coefficient.map_or(-1.0, f64::abs);
        key(b).total_cmp(&key(a))
    });

    debug!(
        method = %config.method,
        rows = n,
        variables = variables.len(),
        "correlation matrix computed"
    );

    Ok(CorrelationResult {
        target: target.to_string(),
        method: config.method,
        rows: n,
        variables,
        matrix,
        entries,
    })
}

fn select_variables(
    table: &ObservationTable,
    target: &str,
    config: &CorrelationConfig,
) -> Result<Vec<String>> {
    let mut variables: Vec<String> = match &config.variables {
        Some(subset) => {
            for name in subset {
                table.numeric(name)?;
            }
            table
                .schema()
                .numeric_names()
                .filter(|name| subset.iter().any(|s| s == name))
                .map(str::to_string)
                .collect()
        }
        None => table
            .schema()
            .numeric_names()
            .filter(|name| {
                let observed = table
                    .numeric(name)
                    .map(|column| column.iter().any(|v| v.is_some()))
                    .unwrap_or(false);
                if !observed {
                    debug!(variable = *name, "variable has no observed value, excluded");
                }
                observed
            })
            .map(str::to_string)
            .collect(),
    };

    if !variables.iter().any(|v| v == target) {
        variables.push(target.to_string());
    }
    Ok(variables)
}

/// Symmetric correlation matrix of the given columns.
///
/// The diagonal is exactly 1.0; undefined off-diagonal entries are NaN.
fn correlation_matrix(columns: &[Vec<f64>]) -> Array2<f64> {
    let k = columns.len();
    let mut corr = Array2::from_elem((k, k), f64::NAN);
    for i in 0..k {
        corr[[i, i]] = 1.0;
        for j in i + 1..k {
            let r = pearson(&columns[i], &columns[j]).unwrap_or(f64::NAN);
            corr[[i, j]] = r;
            corr[[j, i]] = r;
        }
    }
    corr
}

/// Two-sided p-value of a correlation coefficient over `n` pairs.
fn coefficient_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 {
        return None;
    }
    let df = (n - 2) as f64;
    if (1.0 - r.abs()) <= f64::EPSILON {
        return Some(0.0);
    }
    let t = r * (df / (1.0 - r * r)).sqrt();
    Some(t_two_sided_p_value(t, df))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{TableBuilder, YIELD};

    fn linear_table() -> ObservationTable {
        TableBuilder::new()
            .numeric_column(
                "umidade_solo",
                vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0],
            )
            .numeric_column("ph", vec![6.0, 6.5, 5.5, 6.2, 6.8, 5.9, 6.1, 6.3, 6.0])
            .numeric_column("pressao", vec![1013.0; 9])
            .numeric_column(YIELD, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0])
            .categorical_column("cultura", vec!["milho"; 9])
            .build()
            .unwrap()
    }

    #[test]
    fn test_perfect_linear_relation() {
        let result = correlate(&linear_table(), YIELD, &CorrelationConfig::default()).unwrap();
        assert_eq!(result.method, CorrelationMethod::Pearson);
        assert_eq!(result.rows, 9);

        let top = &result.ranked()[0];
        assert_eq!(top.variable, "umidade_solo");
        assert!((top.coefficient.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(top.p_value, Some(0.0));
    }

    #[test]
    fn test_matrix_diagonal_and_symmetry() {
        let result = correlate(&linear_table(), YIELD, &CorrelationConfig::default()).unwrap();
        let k = result.variables.len();
        assert_eq!(result.matrix.dim(), (k, k));

        for i in 0..k {
            assert_eq!(result.matrix[[i, i]], 1.0);
            for j in 0..k {
                let (a, b) = (result.matrix[[i, j]], result.matrix[[j, i]]);
                assert!(a.to_bits() == b.to_bits(), "asymmetric at ({i}, {j})");
            }
        }
        assert_eq!(result.pair(YIELD, YIELD), Some(1.0));
    }

    #[test]
    fn test_zero_variance_is_undefined_and_last() {
        let result = correlate(&linear_table(), YIELD, &CorrelationConfig::default()).unwrap();
        let last = result.ranked().last().unwrap();
        assert_eq!(last.variable, "pressao");
        assert_eq!(last.coefficient, None);
        assert_eq!(last.p_value, None);
        // Diagonal stays exact even for the constant column
        assert_eq!(result.pair("pressao", "pressao"), Some(1.0));
    }

    #[test]
    fn test_ranked_by_absolute_value() {
        let table = TableBuilder::new()
            .numeric_column("a", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .numeric_column("b", vec![5.0, 4.0, 3.0, 2.0, 1.0])
            .numeric_column("c", vec![1.0, 3.0, 2.0, 5.0, 4.0])
            .numeric_column("y", vec![1.1, 2.0, 2.9, 4.2, 5.0])
            .build()
            .unwrap();
        let result = correlate(&table, "y", &CorrelationConfig::default()).unwrap();

        let coefficients: Vec<f64> = result
            .ranked()
            .iter()
            .map(|e| e.coefficient.unwrap().abs())
            .collect();
        assert!(coefficients.windows(2).all(|w| w[0] >= w[1]));
        assert!(result.coefficient("b").unwrap() < -0.99);
        assert!(result.ranked().iter().all(|e| e.variable != "y"));
    }

    #[test]
    fn test_spearman_on_monotone_curve() {
        let table = TableBuilder::new()
            .numeric_column("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .numeric_column("y", vec![1.0, 4.0, 9.0, 16.0, 250.0, 1000.0])
            .build()
            .unwrap();
        let config = CorrelationConfig {
            method: CorrelationMethod::Spearman,
            ..Default::default()
        };
        let result = correlate(&table, "y", &config).unwrap();
        assert!((result.coefficient("x").unwrap() - 1.0).abs() < 1e-12);

        let pearson = correlate(&table, "y", &CorrelationConfig::default()).unwrap();
        assert!(pearson.coefficient("x").unwrap() < 0.95);
    }

    #[test]
    fn test_unsupported_method_falls_back() {
        assert_eq!(CorrelationMethod::from("kendall"), CorrelationMethod::Pearson);
        assert_eq!(CorrelationMethod::from("Spearman"), CorrelationMethod::Spearman);
    }

    #[test]
    fn test_missing_rows_dropped_per_analysis() {
        let table = TableBuilder::new()
            .numeric_column("x", vec![Some(1.0), None, Some(3.0), Some(4.0)])
            .numeric_column("y", vec![2.0, 100.0, 6.0, 8.0])
            .numeric_column("empty", vec![None::<f64>; 4])
            .build()
            .unwrap();
        let result = correlate(&table, "y", &CorrelationConfig::default()).unwrap();
        assert_eq!(result.rows, 3);
        assert!((result.coefficient("x").unwrap() - 1.0).abs() < 1e-12);
        assert!(!result.variables.iter().any(|v| v == "empty"));
    }

    #[test]
    fn test_configured_subset() {
        let config = CorrelationConfig {
            variables: Some(vec!["ph".to_string()]),
            ..Default::default()
        };
        let result = correlate(&linear_table(), YIELD, &config).unwrap();
        assert_eq!(result.variables, vec!["ph".to_string(), YIELD.to_string()]);

        let config = CorrelationConfig {
            variables: Some(vec!["cultura".to_string()]),
            ..Default::default()
        };
        assert!(matches!(
            correlate(&linear_table(), YIELD, &config),
            Err(Error::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_target_must_be_numeric() {
        let table = linear_table();
        let config = CorrelationConfig::default();
        assert!(matches!(
            correlate(&table, "cultura", &config),
            Err(Error::InsufficientData { .. })
        ));
        assert!(matches!(
            correlate(&table, "nao_existe", &config),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_no_complete_rows() {
        let table = TableBuilder::new()
            .numeric_column("x", vec![Some(1.0), None])
            .numeric_column("y", vec![None, Some(2.0)])
            .build()
            .unwrap();
        assert!(matches!(
            correlate(&table, "y", &CorrelationConfig::default()),
            Err(Error::InsufficientData { .. })
        ));
    }
}
