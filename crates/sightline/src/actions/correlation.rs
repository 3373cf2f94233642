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

use super::{describe_intent, ActionContext, Recommendation};
use crate::clause::{Clause, DataModel};
use crate::collection::VisualizationCollection;
use crate::data::MetadataProvider;
use crate::error::Result;
use std::collections::HashSet;
use tracing::warn;

pub const NAME: &str = "Correlation";

/// Scatter plots over every pair of measures, strongest relationship first.
pub fn correlation(ctx: &ActionContext<'_>) -> Result<Recommendation> {
    let description = format!(
        "Show relationships between two quantitative attributes{}.",
        match describe_intent(ctx) {
            s if s.is_empty() => String::new(),
            s => format!(" given {s}"),
        }
    );
    if ctx.dataset.row_count() < ctx.config.min_rows_for_actions {
        warn!(
            rows = ctx.dataset.row_count(),
            "too few rows for correlation, skipping"
        );
        return Ok(ctx.empty(NAME, description));
    }
    let mut intent = vec![
        Clause::wildcard().with_data_model(DataModel::Measure),
        Clause::wildcard().with_data_model(DataModel::Measure),
    ];
    intent.extend(ctx.filters());
    let mut collection = ctx.compile(&intent)?;
    drop_transposed(&mut collection);
    ctx.execute_and_score(&mut collection)?;
    collection.sort(true, true);
    Ok(Recommendation::new(
        NAME,
        description,
        collection.top_k(ctx.config.top_k),
    ))
}
/// Keeps the first of each (x, y) pair and its mirror image under the same
/// filter.
fn drop_transposed(collection: &mut VisualizationCollection) {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    collection.retain(|vis| {
        let names: Vec<&str> = vis.attributes().filter_map(Clause::attribute_name).collect();
        let [x, y] = names.as_slice() else {
            return true;
        };
        let filter = vis
            .filters()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",");
        if seen.contains(&(y.to_string(), x.to_string(), filter.clone())) {
            return false;
        }
        seen.insert((x.to_string(), y.to_string(), filter));
        true
    });
}
