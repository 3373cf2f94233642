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
use crate::clause::Clause;
use crate::collection::VisualizationCollection;
use crate::error::Result;

pub const NAME: &str = "Generalize";
const OVERALL: &str = "Overall";
const MAX_ATTRIBUTES: usize = 4;

/// Drops one attribute or one filter from the current chart to show a more
/// general trend. Attribute removals come before filter removals.
pub fn generalize(ctx: &ActionContext<'_>) -> Result<Recommendation> {
    let description = format!(
        "Remove an attribute or filter from {}.",
        describe_intent(ctx)
    );
    let attributes = ctx.attributes();
    if attributes.is_empty() || attributes.len() > MAX_ATTRIBUTES {
        return Ok(ctx.empty(NAME, description));
    }
    let mut collection = VisualizationCollection::new().with_source(ctx.dataset.id().clone());
    if attributes.len() > 1 {
        for removed in &attributes {
            let intent: Vec<Clause> = ctx
                .intent
                .iter()
                .filter(|c| *c != removed)
                .cloned()
                .collect();
            collection.extend(ctx.compile(&intent)?);
        }
    }
    if let Some(current) = ctx.current_vis.get(0) {
        for removed in ctx.filters() {
            let names = removed.attribute.names();
            let intent: Vec<Clause> = current
                .intent
                .iter()
                .filter(|c| {
                    !(c.is_filter() && c.attribute_name().is_some_and(|n| names.contains(&n)))
                })
                .cloned()
                .collect();
            collection.extend(
                ctx.compile(&intent)?
                    .into_iter()
                    .map(|vis| vis.with_title(OVERALL)),
            );
        }
    }
    ctx.execute_and_score(&mut collection)?;
    collection.remove_duplicates();
    collection.sort(true, true);
    collection.retain(|vis| vis.is_valid());
    Ok(Recommendation::new(NAME, description, collection))
}
