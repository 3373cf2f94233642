// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::clause::{Clause, DataType, FilterTarget};
use crate::data::metadata::{DatasetMetadata, MetadataProvider};
use crate::data::profiler::{ColumnKind, DataProfiler};
use crate::data::table::Table;
use crate::data::value::Value;
use crate::error::{DataError, DataResult, Result};
use indexmap::IndexMap;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(String);
impl DatasetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn from_string(id: String) -> Self {
        Self(id)
    }
}
impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl AsRef<str> for DatasetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
/// A table together with the metadata snapshot every pipeline stage reads.
/// Cloning is cheap; both halves are shared.
#[derive(Debug, Clone)]
pub struct AnnotatedDataset {
    id: DatasetId,
    name: String,
    table: Arc<Table>,
    metadata: Arc<DatasetMetadata>,
}
impl AnnotatedDataset {
    /// Profiles every column with the default [`DataProfiler`].
    pub fn from_table(name: impl Into<String>, table: Table) -> Result<Self> {
        Self::from_table_with_profiler(name, table, &DataProfiler::new())
    }
    pub fn from_table_with_profiler(
        name: impl Into<String>,
        table: Table,
        profiler: &DataProfiler,
    ) -> Result<Self> {
        let kinds: IndexMap<String, ColumnKind> = table
            .columns()
            .map(|(column, values)| (column.to_string(), DataProfiler::infer_kind(values)))
            .collect();
        let (table, types) = profiler.annotate(table, &kinds)?;
        Ok(Self::from_table_with_types(name, table, types))
    }
    /// Trusts the caller's types; columns missing from `types` are nominal.
    pub fn from_table_with_types(
        name: impl Into<String>,
        table: Table,
        types: IndexMap<String, DataType>,
    ) -> Self {
        let metadata = DatasetMetadata::compute(&table, &types);
        let dataset = Self {
            id: DatasetId::new(),
            name: name.into(),
            table: Arc::new(table),
            metadata: Arc::new(metadata),
        };
        debug!(
            dataset = %dataset.id,
            rows = dataset.len(),
            columns = dataset.table.width(),
            "annotated dataset"
        );
        dataset
    }
    pub fn from_dataframe(name: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let (table, types) = DataProfiler::new().profile_dataframe(df)?;
        Ok(Self::from_table_with_types(name, table, types))
    }
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_csv_with_profiler(path, &DataProfiler::new())
    }
    pub fn from_csv_with_profiler<P: AsRef<Path>>(
        path: P,
        profiler: &DataProfiler,
    ) -> Result<Self> {
        let name = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "dataset".to_string());
        let (table, types) = profiler.profile_csv(path)?;
        Ok(Self::from_table_with_types(name, table, types))
    }
    /// Overrides one column's semantic type and recomputes the metadata
    /// snapshot. Temporal overrides parse text cells into timestamps.
    pub fn set_data_type(&mut self, column: &str, data_type: DataType) -> DataResult<()> {
        if !self.table.contains(column) {
            return Err(DataError::ColumnNotFound {
                column: column.to_string(),
            });
        }
        let mut types = self.metadata.data_types().clone();
        types.insert(column.to_string(), data_type);
        let mut table = Table::new();
        for (name, values) in self.table.columns() {
            let values = if name == column && data_type == DataType::Temporal {
                values
                    .iter()
                    .map(|v| match v {
                        Value::Text(_) => v.as_timestamp().map_or(Value::Null, Value::Timestamp),
                        other => other.clone(),
                    })
                    .collect()
            } else {
                values.to_vec()
            };
            table.push_column(name, values)?;
        }
        self.metadata = Arc::new(DatasetMetadata::compute(&table, &types));
        self.table = Arc::new(table);
        Ok(())
    }
    pub fn id(&self) -> &DatasetId {
        &self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn table(&self) -> &Table {
        &self.table
    }
    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }
    pub fn len(&self) -> usize {
        self.table.height()
    }
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
impl MetadataProvider for AnnotatedDataset {
    fn columns(&self) -> &[String] {
        self.metadata.columns()
    }
    fn data_type(&self, attribute: &str) -> Option<DataType> {
        self.metadata.data_type(attribute)
    }
    fn unique_values(&self, attribute: &str) -> &[Value] {
        self.metadata.unique_values(attribute)
    }
    fn min_max(&self, attribute: &str) -> Option<(f64, f64)> {
        self.metadata.min_max(attribute)
    }
    fn row_count(&self) -> usize {
        self.metadata.row_count()
    }
}
/// Builds a [`Table`] column by column for programmatic datasets and tests.
#[derive(Debug, Default)]
pub struct TableBuilder {
    columns: Vec<(String, Vec<Value>)>,
    types: IndexMap<String, DataType>,
}
impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn column<V, I>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.columns
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }
    /// Adds a column with a fixed semantic type, bypassing inference for it.
    pub fn typed_column<V, I>(
        mut self,
        name: impl Into<String>,
        data_type: DataType,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let name = name.into();
        self.types.insert(name.clone(), data_type);
        self.column(name, values)
    }
    pub fn build_table(self) -> DataResult<Table> {
        Table::from_columns(self.columns)
    }
    /// Profiles untyped columns and keeps the explicit types of the rest.
    pub fn build(self, name: impl Into<String>) -> Result<AnnotatedDataset> {
        let explicit = self.types.clone();
        let table = Table::from_columns(self.columns)?;
        let mut dataset = AnnotatedDataset::from_table(name, table)?;
        for (column, data_type) in explicit {
            if dataset.data_type(&column) != Some(data_type) {
                dataset.set_data_type(&column, data_type)?;
            }
        }
        Ok(dataset)
    }
}
/// Rows passing every filter clause. Clauses are ANDed; a multi-valued
/// target matches any of its values.
pub fn filter_rows(table: &Table, filters: &[Clause]) -> DataResult<Vec<usize>> {
    let mut predicates = Vec::new();
    for clause in filters {
        let Some(filter) = &clause.filter else {
            continue;
        };
        let Some(attribute) = clause.attribute_name() else {
            continue;
        };
        if matches!(filter.target, FilterTarget::Wildcard) {
            continue;
        }
        predicates.push((table.try_column(attribute)?, filter.op, filter.target.values()));
    }
    Ok(table.filter_indices(|row| {
        predicates.iter().all(|(column, op, targets)| {
            let cell = &column[row];
            targets.iter().any(|target| op.matches(cell, target))
        })
    }))
}
pub fn filtered_row_count(table: &Table, filters: &[Clause]) -> DataResult<usize> {
    filter_rows(table, filters).map(|rows| rows.len())
}
