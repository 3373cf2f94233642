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
use crate::error::Result;
use tracing::debug;

pub const NAME: &str = "Enhance";

/// Adds one more attribute to the current chart.
pub fn enhance(ctx: &ActionContext<'_>) -> Result<Recommendation> {
    let attributes = ctx.attributes();
    let description = format!(
        "Augmenting current {} with additional attribute.",
        describe_intent(ctx)
    );
    if attributes.is_empty() || attributes.len() > 2 {
        debug!(
            attributes = attributes.len(),
            "enhance needs one or two attributes"
        );
        return Ok(ctx.empty(NAME, description));
    }
    let mut intent = ctx.filters();
    intent.extend(attributes.into_iter().map(|mut clause| {
        clause.channel = None;
        clause
    }));
    intent.push(Clause::wildcard());
    let mut collection = ctx.evaluate(&intent)?;
    collection.sort(true, true);
    Ok(Recommendation::new(
        NAME,
        description,
        collection.top_k(ctx.config.top_k),
    ))
}
