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
use crate::clause::{Clause, DataType, FilterOp, FilterTarget};
use crate::data::{MetadataProvider, Value};
use crate::error::Result;
use std::collections::HashSet;
use tracing::debug;

pub const NAME: &str = "Filter";

/// Views of the current chart over different subsets of rows. A single
/// filter is varied in place; otherwise low-cardinality columns outside the
/// intent are each split into one filter per value.
pub fn add_filter(ctx: &ActionContext<'_>) -> Result<Recommendation> {
    let filters = ctx.filters();
    let mut intent = ctx.attributes();
    let description = match filters.as_slice() {
        [only] => {
            let Some(alternative) = alternative_filter(ctx, only) else {
                debug!(filter = %only, "no alternative filter values");
                return Ok(ctx.empty(NAME, "Changing the filter on the current chart."));
            };
            intent.push(alternative);
            format!("Changing the {only} filter to an alternative value.")
        }
        _ => {
            let used: HashSet<&str> = ctx
                .intent
                .iter()
                .flat_map(|c| c.attribute.names())
                .collect();
            let mut added = 0;
            for column in ctx.dataset.columns() {
                let cardinality = ctx.dataset.cardinality(column);
                if used.contains(column.as_str())
                    || cardinality <= 1
                    || cardinality >= ctx.config.filter_cardinality_max
                {
                    continue;
                }
                intent.push(Clause::filter(
                    column.as_str(),
                    FilterOp::Eq,
                    FilterTarget::AnyOf(ctx.dataset.unique_values(column).to_vec()),
                ));
                added += 1;
            }
            if added == 0 {
                return Ok(ctx.empty(NAME, "Applying filters to the current chart."));
            }
            format!(
                "Seeing how {} varies across subsets of the data.",
                describe_intent(ctx)
            )
        }
    };
    let mut collection = ctx.evaluate(&intent)?;
    collection.sort(true, true);
    Ok(Recommendation::new(
        NAME,
        description,
        collection.top_k(ctx.config.top_k),
    ))
}
/// Quantitative filters flip to the complementary range; any other filter
/// tries every value it does not already select.
fn alternative_filter(ctx: &ActionContext<'_>, current: &Clause) -> Option<Clause> {
    let filter = current.filter.as_ref()?;
    let attribute = current.attribute_name()?;
    if ctx.dataset.data_type(attribute) == Some(DataType::Quantitative) {
        let op = filter.op.complement()?;
        return Some(Clause::filter(attribute, op, filter.target.clone()));
    }
    let selected: Vec<&Value> = filter.target.values();
    let others: Vec<Value> = ctx
        .dataset
        .unique_values(attribute)
        .iter()
        .filter(|v| !selected.iter().any(|s| s.loose_eq(v)))
        .cloned()
        .collect();
    if others.is_empty() {
        return None;
    }
    Some(Clause::filter(attribute, filter.op, FilterTarget::AnyOf(others)))
}
