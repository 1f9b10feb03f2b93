//! Python bindings for agrostat.
//!
//! This module exposes the analysis entry points to Python using PyO3.
//! Enable the `python` feature to use this.
//!
//! Records and reports cross the boundary as JSON: a list of objects keyed
//! by variable name in, a serialized report out.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::anova::one_way;
use crate::report::{analyze, AnalysisConfig};
use crate::table::{ObservationTable, Record, Schema, TableBuilder, YIELD};

fn value_error(e: impl ToString) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Load agronomic records, keeping rows with a yield and attaching the
/// condition classes.
fn load_records(records_json: &str) -> PyResult<ObservationTable> {
    let records: Vec<Record> = serde_json::from_str(records_json).map_err(value_error)?;
    TableBuilder::new()
        .schema(Schema::agronomic())
        .require(YIELD)
        .records(records)
        .with_condition_classes()
        .build()
        .map_err(value_error)
}

/// Run the full analysis and return the report as JSON.
#[pyfunction]
#[pyo3(signature = (records_json, config_json=None))]
fn analyze_json(records_json: &str, config_json: Option<&str>) -> PyResult<String> {
    let table = load_records(records_json)?;
    let config: AnalysisConfig = match config_json {
        Some(json) => serde_json::from_str(json).map_err(value_error)?,
        None => AnalysisConfig::default(),
    };
    let report = analyze(&table, &config).map_err(value_error)?;
    serde_json::to_string(&report).map_err(value_error)
}

/// Run a one-way ANOVA and return the result as JSON.
#[pyfunction]
#[pyo3(signature = (records_json, grouping, response=YIELD))]
fn one_way_anova_json(records_json: &str, grouping: &str, response: &str) -> PyResult<String> {
    let table = load_records(records_json)?;
    let result = one_way(&table, grouping, response).map_err(value_error)?;
    serde_json::to_string(&result).map_err(value_error)
}

/// The agrostat Python module.
#[pymodule]
fn agrostat(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze_json, m)?)?;
    m.add_function(wrap_pyfunction!(one_way_anova_json, m)?)?;
    Ok(())
}
