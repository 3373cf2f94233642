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

use crate::data::value::Value;
use crate::error::{DataError, DataResult};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Ordered columnar table. All columns share one length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Vec<Value>>,
    height: usize,
}
impl Table {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_columns<I, S>(columns: I) -> DataResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> DataResult<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(DataError::DuplicateColumn { column: name });
        }
        if self.columns.is_empty() {
            self.height = values.len();
        } else if values.len() != self.height {
            return Err(DataError::LengthMismatch {
                column: name,
                expected: self.height,
                found: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn width(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.height == 0
    }
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }
    pub fn try_column(&self, name: &str) -> DataResult<&[Value]> {
        self.column(name).ok_or_else(|| DataError::ColumnNotFound {
            column: name.to_string(),
        })
    }
    pub fn get(&self, name: &str, row: usize) -> Option<&Value> {
        self.columns.get(name).and_then(|values| values.get(row))
    }
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
    pub fn select(&self, names: &[&str]) -> DataResult<Table> {
        let mut out = Table::new();
        for name in names {
            out.push_column(*name, self.try_column(name)?.to_vec())?;
        }
        if names.is_empty() {
            out.height = self.height;
        }
        Ok(out)
    }
    pub fn take(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let picked = indices
                    .iter()
                    .map(|&i| values.get(i).cloned().unwrap_or(Value::Null))
                    .collect();
                (name.clone(), picked)
            })
            .collect();
        Table {
            columns,
            height: indices.len(),
        }
    }
    pub fn filter_indices<P>(&self, predicate: P) -> Vec<usize>
    where
        P: Fn(usize) -> bool,
    {
        (0..self.height).filter(|&i| predicate(i)).collect()
    }
    /// Row indices per distinct key, in first-seen order. Rows with a null
    /// key component are dropped.
    pub fn group_indices(&self, keys: &[&str]) -> DataResult<IndexMap<Vec<Value>, Vec<usize>>> {
        let key_columns = keys
            .iter()
            .map(|k| self.try_column(k))
            .collect::<DataResult<Vec<_>>>()?;
        let mut groups: IndexMap<Vec<Value>, Vec<usize>> = IndexMap::new();
        for i in 0..self.height {
            let key: Vec<Value> = key_columns.iter().map(|c| c[i].clone()).collect();
            if key.iter().any(Value::is_null) {
                continue;
            }
            groups.entry(key).or_default().push(i);
        }
        Ok(groups)
    }
    pub fn numeric(&self, name: &str) -> DataResult<Vec<f64>> {
        Ok(self
            .try_column(name)?
            .iter()
            .filter_map(Value::as_f64)
            .collect())
    }
    /// Stable sort of all rows by one column, ascending.
    pub fn sort_by_column(&self, name: &str) -> DataResult<Table> {
        let column = self.try_column(name)?;
        let mut order: Vec<usize> = (0..self.height).collect();
        order.sort_by(|&a, &b| column[a].cmp(&column[b]));
        Ok(self.take(&order))
    }
}
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.height))?;
        for row in 0..self.height {
            seq.serialize_element(&Row { table: self, row })?;
        }
        seq.end()
    }
}
struct Row<'a> {
    table: &'a Table,
    row: usize,
}
impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.width()))?;
        for (name, values) in &self.table.columns {
            map.serialize_entry(name, &values[self.row])?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            (
                "Origin",
                vec![
                    Value::from("USA"),
                    Value::from("Japan"),
                    Value::from("USA"),
                    Value::Null,
                ],
            ),
            (
                "Horsepower",
                vec![
                    Value::from(130.0),
                    Value::from(95.0),
                    Value::from(150.0),
                    Value::from(88.0),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let mut table = sample();
        let err = table.push_column("Weight", vec![Value::from(1.0)]).unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { expected: 4, .. }));
    }

    #[test]
    fn test_group_indices_skips_null_keys() {
        let groups = sample().group_indices(&["Origin"]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&vec![Value::from("USA")]], vec![0, 2]);
    }

    #[test]
    fn test_serialises_as_records() {
        let table = sample().take(&[1]);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[0]["Origin"], "Japan");
        assert_eq!(json[0]["Horsepower"], 95.0);
    }
}
