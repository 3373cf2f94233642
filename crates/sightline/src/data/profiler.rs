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

use crate::clause::DataType;
use crate::data::table::Table;
use crate::data::value::{parse_timestamp, Value};
use crate::error::{ConfigError, DataError, Result};
use indexmap::IndexMap;
use polars::prelude::{DataFrame, DataType as PolarsType, SerReader};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilingConfig {
    pub temporal_formats: Vec<String>,
    pub type_confidence_threshold: f64,
    pub temporal_sample_size: usize,
    pub temporal_name_hints: Vec<String>,
    pub nominal_integer_ratio: f64,
    pub nominal_integer_cardinality: usize,
    pub id_min_cardinality: usize,
    pub id_uniqueness: f64,
    pub id_name_pattern: String,
}
impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            temporal_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M:%S%.f".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%SZ".to_string(),
                "%m/%d/%Y".to_string(),
                "%d/%m/%Y".to_string(),
                "%Y%m%d".to_string(),
            ],
            type_confidence_threshold: 0.8,
            temporal_sample_size: 100,
            temporal_name_hints: ["month", "year", "day", "date", "time"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            nominal_integer_ratio: 0.4,
            nominal_integer_cardinality: 20,
            id_min_cardinality: 500,
            id_uniqueness: 0.98,
            id_name_pattern: "(?i)id".to_string(),
        }
    }
}
impl ProfilingConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.type_confidence_threshold) {
            return Err("type_confidence_threshold must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.nominal_integer_ratio) {
            return Err("nominal_integer_ratio must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.id_uniqueness) {
            return Err("id_uniqueness must be between 0.0 and 1.0".to_string());
        }
        if self.temporal_sample_size == 0 {
            return Err("temporal_sample_size must be greater than 0".to_string());
        }
        if self.temporal_formats.is_empty() {
            return Err("at least one temporal format is required".to_string());
        }
        Regex::new(&self.id_name_pattern).map_err(|e| format!("id_name_pattern: {e}"))?;
        Ok(())
    }
    /// Treats only explicit date columns as temporal.
    pub fn strict_temporal() -> Self {
        Self {
            type_confidence_threshold: 1.0,
            temporal_name_hints: Vec::new(),
            ..Default::default()
        }
    }
    pub fn for_large_datasets() -> Self {
        Self {
            temporal_sample_size: 50,
            id_min_cardinality: 5_000,
            ..Default::default()
        }
    }
}
/// Physical storage class of a column before semantic typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float,
    Integer,
    Text,
    Temporal,
    Boolean,
}
pub struct DataProfiler {
    config: ProfilingConfig,
}
impl DataProfiler {
    pub fn new() -> Self {
        Self {
            config: ProfilingConfig::default(),
        }
    }
    pub fn with_config(config: ProfilingConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &ProfilingConfig {
        &self.config
    }
    pub fn profile_csv<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<(Table, IndexMap<String, DataType>)> {
        let path_str = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(|source| DataError::DataFileIo {
            path: path_str.clone(),
            source,
        })?;
        let df = polars::prelude::CsvReader::new(file)
            .finish()
            .map_err(|e| DataError::DataFileError {
                path: path_str,
                source: e,
            })?;
        self.profile_dataframe(&df)
    }
    pub fn profile_dataframe(&self, df: &DataFrame) -> Result<(Table, IndexMap<String, DataType>)> {
        let (table, kinds) = self.table_from_dataframe(df)?;
        self.annotate(table, &kinds)
    }
    /// Converts a polars frame into a [`Table`], remembering each column's
    /// physical kind for type inference.
    pub fn table_from_dataframe(
        &self,
        df: &DataFrame,
    ) -> Result<(Table, IndexMap<String, ColumnKind>)> {
        let converted: Vec<(String, ColumnKind, Vec<Value>)> = df
            .get_columns()
            .par_iter()
            .map(|column| {
                let series = column.as_materialized_series();
                let name = series.name().to_string();
                let profiling_error =
                    |source: polars::error::PolarsError| DataError::ColumnProfilingError {
                        column: name.clone(),
                        source,
                    };
                let kind = match series.dtype() {
                    PolarsType::Float32 | PolarsType::Float64 => ColumnKind::Float,
                    PolarsType::Int32
                    | PolarsType::Int64
                    | PolarsType::UInt32
                    | PolarsType::UInt64 => ColumnKind::Integer,
                    PolarsType::Boolean => ColumnKind::Boolean,
                    PolarsType::Date | PolarsType::Datetime(_, _) => ColumnKind::Temporal,
                    _ => ColumnKind::Text,
                };
                let values: Vec<Value> = match kind {
                    ColumnKind::Float | ColumnKind::Integer => {
                        let cast = series
                            .cast(&PolarsType::Float64)
                            .map_err(profiling_error)?;
                        let floats = cast.f64().map_err(profiling_error)?;
                        floats
                            .into_iter()
                            .map(|v| v.map_or(Value::Null, Value::Number))
                            .collect()
                    }
                    _ => {
                        let cast = series.cast(&PolarsType::String).map_err(profiling_error)?;
                        let strings = cast.str().map_err(profiling_error)?;
                        strings
                            .into_iter()
                            .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
                            .collect()
                    }
                };
                Ok((name, kind, values))
            })
            .collect::<std::result::Result<_, DataError>>()?;
        let mut table = Table::new();
        let mut kinds = IndexMap::new();
        for (name, kind, values) in converted {
            kinds.insert(name.clone(), kind);
            table.push_column(name, values)?;
        }
        Ok((table, kinds))
    }
    /// Physical kind of a column built in memory.
    pub fn infer_kind(values: &[Value]) -> ColumnKind {
        let mut saw_number = false;
        let mut all_integral = true;
        for value in values {
            match value {
                Value::Null => {}
                Value::Number(n) => {
                    saw_number = true;
                    all_integral &= n.fract() == 0.0;
                }
                Value::Timestamp(_) => return ColumnKind::Temporal,
                Value::Text(_) => return ColumnKind::Text,
            }
        }
        match (saw_number, all_integral) {
            (true, true) => ColumnKind::Integer,
            (true, false) => ColumnKind::Float,
            (false, _) => ColumnKind::Text,
        }
    }
    /// Infers a semantic type for every column, converting date-like text
    /// into timestamps along the way.
    pub fn annotate(
        &self,
        table: Table,
        kinds: &IndexMap<String, ColumnKind>,
    ) -> Result<(Table, IndexMap<String, DataType>)> {
        let id_pattern = Regex::new(&self.config.id_name_pattern).map_err(|e| {
            ConfigError::ValidationFailed {
                reason: format!("invalid id_name_pattern: {e}"),
            }
        })?;
        let row_count = table.height();
        let columns: Vec<(&str, &[Value])> = table.columns().collect();
        let profiled: Vec<(String, DataType, Vec<Value>)> = columns
            .par_iter()
            .map(|(name, values)| {
                let kind = kinds
                    .get(*name)
                    .copied()
                    .unwrap_or_else(|| Self::infer_kind(values));
                let (data_type, converted) =
                    self.classify(name, values, kind, row_count, &id_pattern);
                (name.to_string(), data_type, converted)
            })
            .collect();
        let mut annotated = Table::new();
        let mut types = IndexMap::new();
        for (name, data_type, values) in profiled {
            debug!(column = %name, data_type = %data_type, "profiled column");
            types.insert(name.clone(), data_type);
            annotated.push_column(name, values)?;
        }
        Ok((annotated, types))
    }
    fn classify(
        &self,
        name: &str,
        values: &[Value],
        kind: ColumnKind,
        row_count: usize,
        id_pattern: &Regex,
    ) -> (DataType, Vec<Value>) {
        let cardinality = values
            .iter()
            .filter(|v| !v.is_null())
            .collect::<HashSet<_>>()
            .len();
        match kind {
            ColumnKind::Temporal => return (DataType::Temporal, self.to_timestamps(name, values)),
            ColumnKind::Text => {
                if self.temporal_confidence(values) >= self.config.type_confidence_threshold {
                    return (DataType::Temporal, self.to_timestamps(name, values));
                }
            }
            _ => {}
        }
        let lowered = name.to_lowercase();
        if self.config.temporal_name_hints.iter().any(|h| *h == lowered) {
            return (DataType::Temporal, values.to_vec());
        }
        let data_type = match kind {
            ColumnKind::Float => DataType::Quantitative,
            ColumnKind::Integer => {
                let ratio = if row_count > 0 {
                    cardinality as f64 / row_count as f64
                } else {
                    0.0
                };
                let base = if ratio < self.config.nominal_integer_ratio
                    && cardinality < self.config.nominal_integer_cardinality
                {
                    DataType::Nominal
                } else {
                    DataType::Quantitative
                };
                if self.is_id_like(name, values, kind, cardinality, row_count, id_pattern) {
                    DataType::Id
                } else {
                    base
                }
            }
            ColumnKind::Text => {
                if self.is_id_like(name, values, kind, cardinality, row_count, id_pattern) {
                    DataType::Id
                } else {
                    DataType::Nominal
                }
            }
            ColumnKind::Boolean | ColumnKind::Temporal => DataType::Nominal,
        };
        (data_type, values.to_vec())
    }
    fn temporal_confidence(&self, values: &[Value]) -> f64 {
        let sample: Vec<&str> = values
            .iter()
            .filter_map(|v| match v {
                Value::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .take(self.config.temporal_sample_size)
            .collect();
        if sample.is_empty() {
            return 0.0;
        }
        // plain numbers parse under %Y%m%d; they are not dates
        if sample.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
            return 0.0;
        }
        let parsed = sample
            .iter()
            .filter(|s| parse_timestamp(s, &self.config.temporal_formats).is_some())
            .count();
        parsed as f64 / sample.len() as f64
    }
    fn to_timestamps(&self, name: &str, values: &[Value]) -> Vec<Value> {
        let mut unparsed = 0usize;
        let converted = values
            .iter()
            .map(|v| match v {
                Value::Text(s) => match parse_timestamp(s, &self.config.temporal_formats) {
                    Some(ts) => Value::Timestamp(ts),
                    None => {
                        unparsed += 1;
                        Value::Null
                    }
                },
                other => other.clone(),
            })
            .collect();
        if unparsed > 0 {
            warn!(column = name, unparsed, "temporal values could not be parsed");
        }
        converted
    }
    fn is_id_like(
        &self,
        name: &str,
        values: &[Value],
        kind: ColumnKind,
        cardinality: usize,
        row_count: usize,
        id_pattern: &Regex,
    ) -> bool {
        if cardinality <= self.config.id_min_cardinality {
            return false;
        }
        let named_id = id_pattern.is_match(name);
        let rows = row_count as f64;
        match kind {
            ColumnKind::Text => {
                let almost_unique = cardinality as f64 >= self.config.id_uniqueness * rows;
                let lengths: Vec<f64> = values
                    .iter()
                    .filter_map(|v| match v {
                        Value::Text(s) => Some(s.chars().count() as f64),
                        _ => None,
                    })
                    .take(50)
                    .collect();
                (named_id || almost_unique) && std_dev(&lengths) < 3.0
            }
            _ => {
                let uniqueness = if named_id { 0.75 } else { self.config.id_uniqueness };
                let almost_unique = cardinality as f64 >= uniqueness * rows;
                let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
                let evenly_spaced = numbers.len() < 3
                    || numbers
                        .windows(2)
                        .map(|w| w[1] - w[0])
                        .all(|d| d == numbers[1] - numbers[0]);
                almost_unique || evenly_spaced
            }
        }
    }
}
impl Default for DataProfiler {
    fn default() -> Self {
        Self::new()
    }
}
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(table: Table) -> IndexMap<String, DataType> {
        DataProfiler::new()
            .annotate(table, &IndexMap::new())
            .unwrap()
            .1
    }

    #[test]
    fn test_small_integer_domain_is_nominal() {
        let cylinders: Vec<Value> = (0..50)
            .map(|i| Value::from((4 + 2 * (i % 3)) as i64))
            .collect();
        let horsepower: Vec<Value> = (0..50)
            .map(|i| Value::from(60.0 + i as f64 * 1.5))
            .collect();
        let types = profile(
            Table::from_columns(vec![("Cylinders", cylinders), ("Horsepower", horsepower)])
                .unwrap(),
        );
        assert_eq!(types["Cylinders"], DataType::Nominal);
        assert_eq!(types["Horsepower"], DataType::Quantitative);
    }

    #[test]
    fn test_date_strings_become_timestamps() {
        let dates = vec![
            Value::from("2020-01-01"),
            Value::from("2020-02-01"),
            Value::from("2020-03-01"),
        ];
        let (table, types) = DataProfiler::new()
            .annotate(Table::from_columns(vec![("Sold", dates)]).unwrap(), &IndexMap::new())
            .unwrap();
        assert_eq!(types["Sold"], DataType::Temporal);
        assert!(matches!(table.get("Sold", 0), Some(Value::Timestamp(_))));
    }

    #[test]
    fn test_name_hint_marks_year_temporal() {
        let years: Vec<Value> = (0..30).map(|i| Value::from(1970 + (i % 13) as i64)).collect();
        let types = profile(Table::from_columns(vec![("Year", years)]).unwrap());
        assert_eq!(types["Year"], DataType::Temporal);
    }

    #[test]
    fn test_sequential_integer_key_is_id() {
        let ids: Vec<Value> = (0..600).map(|i| Value::from(i as i64)).collect();
        let types = profile(Table::from_columns(vec![("row", ids)]).unwrap());
        assert_eq!(types["row"], DataType::Id);
    }

    #[test]
    fn test_polars_frame_conversion() {
        let df = polars::df!(
            "Origin" => ["USA", "Japan", "USA"],
            "Weight" => [3504.0, 2372.0, 4354.0]
        )
        .unwrap();
        let profiler = DataProfiler::new();
        let (table, kinds) = profiler.table_from_dataframe(&df).unwrap();
        assert_eq!(kinds["Origin"], ColumnKind::Text);
        assert_eq!(kinds["Weight"], ColumnKind::Float);
        assert_eq!(table.get("Weight", 1), Some(&Value::Number(2372.0)));
    }
}
