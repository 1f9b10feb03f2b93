//! Observation table: the typed, columnar dataset every engine reads.
//!
//! A [`Schema`] fixes the variable names and their kinds once, at load time.
//! Engines never look values up by free-form name inside a row; they ask the
//! table for a [`NumericColumn`] or [`CategoricalColumn`] view and get a typed
//! error back if the variable is unknown or of the other kind.
//!
//! Rows are never removed globally after loading. Each analysis picks the rows
//! that are complete for the variables it uses (see
//! [`ObservationTable::complete_rows`]).

mod builder;
mod classify;

pub use builder::TableBuilder;
pub use classify::{
    ConditionClass, PhClass, SoilMoistureClass, SoilTemperatureClass, MOISTURE_CLASS_COLUMN,
    PH_CLASS_COLUMN, TEMPERATURE_CLASS_COLUMN,
};

use std::collections::HashMap;
use std::fmt;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Name of the yield variable in the agronomic sensor table.
pub const YIELD: &str = "producao_kg";

/// Kind of values a variable holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VariableKind {
    /// Floating point measurements.
    Numeric,
    /// Text labels (crop, phenological stage, condition class).
    Categorical,
}

impl VariableKind {
    /// Lower-case name used in error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed variable of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// Column name.
    pub name: String,
    /// Value kind.
    pub kind: VariableKind,
}

/// Ordered set of variables a table is validated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    variables: Vec<Variable>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a numeric variable. Redeclaring a name replaces its kind.
    #[must_use]
    pub fn numeric(mut self, name: impl Into<String>) -> Self {
        self.declare(name.into(), VariableKind::Numeric);
        self
    }

    /// Declare a categorical variable. Redeclaring a name replaces its kind.
    #[must_use]
    pub fn categorical(mut self, name: impl Into<String>) -> Self {
        self.declare(name.into(), VariableKind::Categorical);
        self
    }

    /// The soil/air/plant sensor table collected by the field stations.
    #[must_use]
    pub fn agronomic() -> Self {
        const NUMERIC: [&str; 19] = [
            "temperatura_solo",
            "umidade_solo",
            "condutividade_solo",
            "ph",
            "npk_n",
            "npk_p",
            "npk_k",
            "temperatura_ar",
            "pressao",
            "altitude",
            "umidade_relativa",
            "radiacao_solar",
            "indice_uv",
            "velocidade_vento",
            "pluviometria_mm",
            "altura_planta",
            "biomassa_estimada",
            "area_foliar_lai",
            YIELD,
        ];

        let schema = NUMERIC
            .iter()
            .fold(Self::new(), |schema, name| schema.numeric(*name));
        schema.categorical("cultura").categorical("estagio_fenologico")
    }

    /// All variables in declaration order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Number of declared variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether no variable is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Kind of a variable, if declared.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<VariableKind> {
        self.position(name).map(|idx| self.variables[idx].kind)
    }

    /// Names of the numeric variables, in declaration order.
    pub fn numeric_names(&self) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .filter(|v| v.kind == VariableKind::Numeric)
            .map(|v| v.name.as_str())
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    fn declare(&mut self, name: String, kind: VariableKind) {
        match self.position(&name) {
            Some(idx) => self.variables[idx].kind = kind,
            None => self.variables.push(Variable { name, kind }),
        }
    }
}

/// A single cell of an incoming record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// A measurement.
    Numeric(f64),
    /// A label.
    Categorical(String),
    /// No value (SQL `NULL`, JSON `null`).
    Missing,
}

impl Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Categorical(_) => "categorical",
            Self::Missing => "missing",
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Numeric(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Missing, Self::Numeric)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Categorical(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Categorical(v)
    }
}

impl From<Option<&str>> for Value {
    fn from(v: Option<&str>) -> Self {
        v.map_or(Self::Missing, Self::from)
    }
}

/// One incoming observation, keyed by variable name.
pub type Record = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Column {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    fn is_present(&self, row: usize) -> bool {
        match self {
            Self::Numeric(values) => values[row].is_some(),
            Self::Categorical(values) => values[row].is_some(),
        }
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        fn retain<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut idx = 0;
            values.retain(|_| {
                let kept = keep[idx];
                idx += 1;
                kept
            });
        }
        match self {
            Self::Numeric(values) => retain(values, keep),
            Self::Categorical(values) => retain(values, keep),
        }
    }
}

/// Read-only view of a numeric column.
#[derive(Debug, Clone, Copy)]
pub struct NumericColumn<'a> {
    name: &'a str,
    values: &'a [Option<f64>],
}

impl<'a> NumericColumn<'a> {
    /// Variable name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Value at `row`, `None` when missing or out of range.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<f64> {
        self.values.get(row).copied().flatten()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the cells.
    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + 'a {
        self.values.iter().copied()
    }
}

/// Read-only view of a categorical column.
#[derive(Debug, Clone, Copy)]
pub struct CategoricalColumn<'a> {
    name: &'a str,
    values: &'a [Option<String>],
}

impl<'a> CategoricalColumn<'a> {
    /// Variable name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Label at `row`, `None` when missing or out of range.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&'a str> {
        self.values.get(row).and_then(|v| v.as_deref())
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A validated, columnar table of observations.
///
/// Build one with [`TableBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    schema: Schema,
    columns: Vec<Column>,
    rows: usize,
}

impl ObservationTable {
    pub(crate) fn from_parts(schema: Schema, columns: Vec<Column>, rows: usize) -> Self {
        Self {
            schema,
            columns,
            rows,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The schema the table was validated against.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether `name` is a numeric variable of this table.
    #[must_use]
    pub fn is_numeric(&self, name: &str) -> bool {
        self.schema.kind_of(name) == Some(VariableKind::Numeric)
    }

    /// Typed view of a numeric variable.
    ///
    /// # Errors
    /// `UnknownVariable` if the name is not in the schema, `KindMismatch` if
    /// the variable is categorical.
    pub fn numeric(&self, name: &str) -> Result<NumericColumn<'_>> {
        let idx = self.index(name)?;
        match &self.columns[idx] {
            Column::Numeric(values) => Ok(NumericColumn {
                name: self.schema.variables[idx].name.as_str(),
                values,
            }),
            Column::Categorical(_) => Err(Error::KindMismatch {
                variable: name.to_string(),
                expected: "numeric",
                actual: "categorical",
            }),
        }
    }

    /// Typed view of a categorical variable.
    ///
    /// # Errors
    /// `UnknownVariable` if the name is not in the schema, `KindMismatch` if
    /// the variable is numeric.
    pub fn categorical(&self, name: &str) -> Result<CategoricalColumn<'_>> {
        let idx = self.index(name)?;
        match &self.columns[idx] {
            Column::Categorical(values) => Ok(CategoricalColumn {
                name: self.schema.variables[idx].name.as_str(),
                values,
            }),
            Column::Numeric(_) => Err(Error::KindMismatch {
                variable: name.to_string(),
                expected: "categorical",
                actual: "numeric",
            }),
        }
    }

    /// Indices of the rows where every listed variable is present.
    ///
    /// # Errors
    /// `UnknownVariable` if any name is not in the schema.
    pub fn complete_rows(&self, names: &[&str]) -> Result<Vec<usize>> {
        let indices = names
            .iter()
            .map(|name| self.index(name))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.rows)
            .filter(|&row| indices.iter().all(|&idx| self.columns[idx].is_present(row)))
            .collect())
    }

    /// Dense `rows × names` matrix of numeric values for complete rows.
    ///
    /// # Errors
    /// `UnknownVariable` / `KindMismatch` for a bad variable,
    /// `InsufficientData` if a requested row is missing one of the values.
    pub fn numeric_matrix(&self, names: &[&str], rows: &[usize]) -> Result<Array2<f64>> {
        let columns = names
            .iter()
            .map(|name| self.numeric(name))
            .collect::<Result<Vec<_>>>()?;

        let mut data = Array2::zeros((rows.len(), columns.len()));
        for (i, &row) in rows.iter().enumerate() {
            for (j, column) in columns.iter().enumerate() {
                data[[i, j]] = column.get(row).ok_or_else(|| {
                    Error::insufficient_data(format!(
                        "row {row} has no value for '{}'",
                        column.name()
                    ))
                })?;
            }
        }
        Ok(data)
    }

    /// Attach a categorical column computed from existing rows.
    pub(crate) fn push_categorical(&mut self, name: &str, values: Vec<Option<String>>) {
        debug_assert_eq!(values.len(), self.rows);
        match self.schema.position(name) {
            Some(idx) => {
                self.schema.variables[idx].kind = VariableKind::Categorical;
                self.columns[idx] = Column::Categorical(values);
            }
            None => {
                self.schema = std::mem::take(&mut self.schema).categorical(name);
                self.columns.push(Column::Categorical(values));
            }
        }
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.schema
            .position(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }
}
