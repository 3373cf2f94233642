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
use crate::data::MetadataProvider;
use crate::error::Result;
use tracing::{debug, warn};

pub const DISTRIBUTION: &str = "Distribution";
pub const OCCURRENCE: &str = "Occurrence";

/// Histograms of every quantitative column, most skewed first.
pub fn distribution(ctx: &ActionContext<'_>) -> Result<Recommendation> {
    univariate(
        ctx,
        DISTRIBUTION,
        DataType::Quantitative,
        "Show univariate histograms of quantitative attributes.",
    )
}
/// Bar charts of category counts for every nominal column, most uneven first.
pub fn occurrence(ctx: &ActionContext<'_>) -> Result<Recommendation> {
    univariate(
        ctx,
        OCCURRENCE,
        DataType::Nominal,
        "Show frequency of occurrence for categorical attributes.",
    )
}
fn univariate(
    ctx: &ActionContext<'_>,
    action: &str,
    data_type: DataType,
    description: &str,
) -> Result<Recommendation> {
    if ctx.dataset.row_count() < ctx.config.min_rows_for_actions {
        warn!(
            action,
            rows = ctx.dataset.row_count(),
            "too few rows for univariate action, skipping"
        );
        return Ok(ctx.empty(action, description));
    }
    let columns = ctx.dataset.attributes_of_type(data_type);
    if columns.is_empty() {
        debug!(action, data_type = %data_type, "no columns of this type");
        return Ok(ctx.empty(action, description));
    }
    let mut intent = vec![Clause::any_of(columns).with_data_type(data_type)];
    intent.extend(ctx.filters());
    let mut collection = ctx.evaluate(&intent)?;
    collection.sort(true, true);
    Ok(Recommendation::new(
        action,
        description,
        collection.top_k(ctx.config.top_k),
    ))
}
