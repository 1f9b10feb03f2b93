//! Builder pattern for loading observation tables.
//!
//! The builder is the collaborator boundary: rows may come from a database
//! query, a file, or an API payload. Whatever the source, the builder checks
//! every value against the [`Schema`] once, drops rows missing a required
//! variable, and optionally attaches the derived condition classes.
//!
//! # Example
//!
//! ```
//! use agrostat::table::{Schema, TableBuilder, Value, YIELD};
//! use std::collections::HashMap;
//!
//! let mut record = HashMap::new();
//! record.insert("umidade_solo".to_string(), Value::from(42.0));
//! record.insert(YIELD.to_string(), Value::from(3.5));
//! record.insert("cultura".to_string(), Value::from("milho"));
//!
//! let table = TableBuilder::new()
//!     .schema(Schema::agronomic())
//!     .require(YIELD)
//!     .record(record)
//!     .with_condition_classes()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.rows(), 1);
//! assert_eq!(table.categorical("categoria_umidade").unwrap().get(0), Some("Ideal"));
//! ```

use tracing::debug;

use super::classify::{attach, PhClass, SoilMoistureClass, SoilTemperatureClass};
use super::{Column, ObservationTable, Record, Schema, Value, VariableKind};
use crate::error::{Error, Result};

/// Builder for [`ObservationTable`].
///
/// Input is either row-oriented ([`record`](Self::record)) or
/// column-oriented ([`numeric_column`](Self::numeric_column),
/// [`categorical_column`](Self::categorical_column)); the two cannot be
/// mixed in one table.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    schema: Option<Schema>,
    required: Vec<String>,
    records: Vec<Record>,
    columns: Vec<(String, VariableKind, Vec<Value>)>,
    condition_classes: bool,
}

impl TableBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema records are validated against.
    ///
    /// Columns added with the column methods extend this schema.
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Drop rows where `name` is missing.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Add one row.
    #[must_use]
    pub fn record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Add many rows.
    #[must_use]
    pub fn records(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.records.extend(records);
        self
    }

    /// Add a numeric column.
    #[must_use]
    pub fn numeric_column<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.columns.push((
            name.into(),
            VariableKind::Numeric,
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Add a categorical column.
    #[must_use]
    pub fn categorical_column<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.columns.push((
            name.into(),
            VariableKind::Categorical,
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Attach `categoria_umidade`, `categoria_ph` and `categoria_temperatura`
    /// for whichever source measurements the table has.
    #[must_use]
    pub fn with_condition_classes(mut self) -> Self {
        self.condition_classes = true;
        self
    }

    /// Validate the input and build the table.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Rows and columns were both supplied, or columns differ in length
    /// - A required variable is not in the schema
    /// - A value has the wrong kind for its variable
    pub fn build(self) -> Result<ObservationTable> {
        if !self.records.is_empty() && !self.columns.is_empty() {
            return Err(Error::invalid_params(
                "records and columns cannot be mixed in one table",
            ));
        }

        let mut schema = self.schema.unwrap_or_default();
        for (name, kind, _) in &self.columns {
            schema = match kind {
                VariableKind::Numeric => schema.numeric(name.as_str()),
                VariableKind::Categorical => schema.categorical(name.as_str()),
            };
        }

        if schema.is_empty() {
            return Err(Error::invalid_params("schema must declare at least one variable"));
        }
        for name in &self.required {
            if schema.position(name).is_none() {
                return Err(Error::UnknownVariable(name.clone()));
            }
        }

        let (rows, cells) = if self.columns.is_empty() {
            gather_records(&schema, &self.records)
        } else {
            gather_columns(&schema, self.columns)?
        };

        let mut columns = schema
            .variables()
            .iter()
            .zip(cells)
            .map(|(variable, values)| typed_column(&variable.name, variable.kind, values))
            .collect::<Result<Vec<_>>>()?;

        // Required-field filter
        let required: Vec<usize> = self
            .required
            .iter()
            .filter_map(|name| schema.position(name))
            .collect();
        let keep: Vec<bool> = (0..rows)
            .map(|row| required.iter().all(|&idx| columns[idx].is_present(row)))
            .collect();
        let kept = keep.iter().filter(|&&k| k).count();
        if kept < rows {
            debug!(
                dropped = rows - kept,
                "dropped rows missing a required variable"
            );
            for column in &mut columns {
                column.retain_rows(&keep);
            }
        }

        let mut table = ObservationTable::from_parts(schema, columns, kept);
        if self.condition_classes {
            attach::<SoilMoistureClass>(&mut table);
            attach::<PhClass>(&mut table);
            attach::<SoilTemperatureClass>(&mut table);
        }
        Ok(table)
    }
}

fn gather_records(schema: &Schema, records: &[Record]) -> (usize, Vec<Vec<Value>>) {
    let unknown = records
        .iter()
        .flat_map(|record| record.keys())
        .filter(|key| schema.position(key).is_none())
        .count();
    if unknown > 0 {
        debug!(fields = unknown, "ignored record fields outside the schema");
    }

    let cells = schema
        .variables()
        .iter()
        .map(|variable| {
            records
                .iter()
                .map(|record| record.get(&variable.name).cloned().unwrap_or(Value::Missing))
                .collect()
        })
        .collect();
    (records.len(), cells)
}

fn gather_columns(
    schema: &Schema,
    columns: Vec<(String, VariableKind, Vec<Value>)>,
) -> Result<(usize, Vec<Vec<Value>>)> {
    let rows = columns[0].2.len();
    if let Some((name, _, values)) = columns.iter().find(|(_, _, v)| v.len() != rows) {
        return Err(Error::DimensionMismatch {
            expected: format!("{rows} rows"),
            actual: format!("{} rows in '{name}'", values.len()),
        });
    }

    let mut cells: Vec<Vec<Value>> = vec![vec![Value::Missing; rows]; schema.len()];
    for (name, _, values) in columns {
        if let Some(idx) = schema.position(&name) {
            cells[idx] = values;
        }
    }
    Ok((rows, cells))
}

fn typed_column(name: &str, kind: VariableKind, values: Vec<Value>) -> Result<Column> {
    let mismatch = |value: &Value| Error::KindMismatch {
        variable: name.to_string(),
        expected: kind.as_str(),
        actual: value.kind_name(),
    };

    match kind {
        VariableKind::Numeric => values
            .into_iter()
            .map(|value| match value {
                Value::Numeric(v) if v.is_finite() => Ok(Some(v)),
                Value::Numeric(_) | Value::Missing => Ok(None),
                other @ Value::Categorical(_) => Err(mismatch(&other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(Column::Numeric),
        VariableKind::Categorical => values
            .into_iter()
            .map(|value| match value {
                Value::Categorical(s) => Ok(Some(s)),
                Value::Missing => Ok(None),
                other @ Value::Numeric(_) => Err(mismatch(&other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(Column::Categorical),
    }
}
