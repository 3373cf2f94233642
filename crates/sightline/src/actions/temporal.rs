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

use super::{ActionContext, Recommendation};
use crate::clause::{Clause, DataType};
use crate::collection::VisualizationCollection;
use crate::compiler::IntentCompiler;
use crate::data::{AnnotatedDataset, MetadataProvider, Table, Value};
use crate::error::Result;
use chrono::Datelike;
use indexmap::IndexMap;
use tracing::warn;

pub const NAME: &str = "Temporal";
const DATE_PRIORITY: f64 = 2.0;
const YEAR_PRIORITY: f64 = 1.0;

/// Line charts of record counts over every temporal column. Scores are fixed
/// so the whole-date chart always precedes its year roll-up.
pub fn temporal(ctx: &ActionContext<'_>) -> Result<Recommendation> {
    let description = "Show trends over time-related attributes.";
    if ctx.dataset.row_count() < ctx.config.min_rows_for_temporal {
        warn!(
            rows = ctx.dataset.row_count(),
            "too few rows for temporal trends, skipping"
        );
        return Ok(ctx.empty(NAME, description));
    }
    let mut collection = VisualizationCollection::new().with_source(ctx.dataset.id().clone());
    for column in ctx.dataset.attributes_of_type(DataType::Temporal) {
        let mut lines = ctx.evaluate(&[Clause::attribute(column.as_str())])?;
        for vis in lines.iter_mut() {
            vis.score = DATE_PRIORITY;
        }
        collection.extend(lines);
        if let Some(years) = year_dataset(ctx.dataset.table(), &column)? {
            let mut lines = evaluate_derived(ctx, &years)?;
            for vis in lines.iter_mut() {
                vis.score = YEAR_PRIORITY;
            }
            collection.extend(lines);
        }
    }
    collection.sort(true, true);
    Ok(Recommendation::new(
        NAME,
        description,
        collection.top_k(ctx.config.top_k),
    ))
}
/// A one-column dataset of calendar years, present only when every
/// non-null cell of `column` is a full date.
fn year_dataset(table: &Table, column: &str) -> Result<Option<AnnotatedDataset>> {
    let values = table.try_column(column)?;
    let mut years = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Null => years.push(Value::Null),
            Value::Timestamp(ts) => years.push(Value::Number(f64::from(ts.year()))),
            _ => return Ok(None),
        }
    }
    if years.iter().all(Value::is_null) {
        return Ok(None);
    }
    let name = format!("{column} (year)");
    let derived = Table::from_columns(vec![(name.clone(), years)])?;
    let mut types = IndexMap::new();
    types.insert(name.clone(), DataType::Temporal);
    Ok(Some(AnnotatedDataset::from_table_with_types(name, derived, types)))
}
fn evaluate_derived(
    ctx: &ActionContext<'_>,
    dataset: &AnnotatedDataset,
) -> Result<VisualizationCollection> {
    let Some(column) = dataset.columns().first() else {
        return Ok(VisualizationCollection::new());
    };
    let mut collection = IntentCompiler::with_config(ctx.config)
        .compile(&[Clause::attribute(column.as_str())], dataset)?;
    ctx.executor.execute(&mut collection, dataset)?;
    Ok(collection)
}
