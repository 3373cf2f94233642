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

use crate::clause::{DataModel, DataType};
use crate::data::table::Table;
use crate::data::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Read-only view of a dataset's schema and summary statistics. One
/// snapshot is valid for a whole compile/execute/score pass.
pub trait MetadataProvider: Send + Sync {
    fn columns(&self) -> &[String];
    fn data_type(&self, attribute: &str) -> Option<DataType>;
    fn unique_values(&self, attribute: &str) -> &[Value];
    fn min_max(&self, attribute: &str) -> Option<(f64, f64)>;
    fn row_count(&self) -> usize;
    fn contains(&self, attribute: &str) -> bool {
        self.columns().iter().any(|c| c == attribute)
    }
    fn data_model(&self, attribute: &str) -> Option<DataModel> {
        self.data_type(attribute).map(DataType::default_model)
    }
    fn cardinality(&self, attribute: &str) -> usize {
        self.unique_values(attribute).len()
    }
    fn attributes_of_type(&self, data_type: DataType) -> Vec<String> {
        self.columns()
            .iter()
            .filter(|c| self.data_type(c) == Some(data_type))
            .cloned()
            .collect()
    }
    fn attributes_of_model(&self, data_model: DataModel) -> Vec<String> {
        self.columns()
            .iter()
            .filter(|c| self.data_model(c) == Some(data_model))
            .cloned()
            .collect()
    }
}
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetMetadata {
    columns: Vec<String>,
    data_types: IndexMap<String, DataType>,
    /// Sorted ascending, nulls excluded.
    unique_values: IndexMap<String, Vec<Value>>,
    min_max: IndexMap<String, (f64, f64)>,
    row_count: usize,
}
impl DatasetMetadata {
    pub fn compute(table: &Table, data_types: &IndexMap<String, DataType>) -> Self {
        let mut metadata = DatasetMetadata {
            row_count: table.height(),
            ..Default::default()
        };
        for (name, values) in table.columns() {
            let data_type = data_types
                .get(name)
                .copied()
                .unwrap_or(DataType::Nominal);
            let distinct: BTreeSet<&Value> = values.iter().filter(|v| !v.is_null()).collect();
            metadata
                .unique_values
                .insert(name.to_string(), distinct.into_iter().cloned().collect());
            let numeric: Vec<f64> = values
                .iter()
                .filter_map(|v| match v {
                    Value::Number(n) if n.is_finite() => Some(*n),
                    _ => None,
                })
                .collect();
            if !numeric.is_empty() {
                let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                metadata.min_max.insert(name.to_string(), (min, max));
            }
            metadata.columns.push(name.to_string());
            metadata.data_types.insert(name.to_string(), data_type);
        }
        metadata
    }
    pub fn data_types(&self) -> &IndexMap<String, DataType> {
        &self.data_types
    }
}
impl MetadataProvider for DatasetMetadata {
    fn columns(&self) -> &[String] {
        &self.columns
    }
    fn data_type(&self, attribute: &str) -> Option<DataType> {
        self.data_types.get(attribute).copied()
    }
    fn unique_values(&self, attribute: &str) -> &[Value] {
        self.unique_values
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
    fn min_max(&self, attribute: &str) -> Option<(f64, f64)> {
        self.min_max.get(attribute).copied()
    }
    fn row_count(&self) -> usize {
        self.row_count
    }
}
