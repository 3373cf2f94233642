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
use crate::clause::{Channel, Clause};
use crate::collection::VisualizationCollection;
use crate::data::Value;
use crate::error::Result;
use crate::interestingness::euclidean;
use crate::vis::Visualization;
use indexmap::IndexMap;
use tracing::{debug, warn};

pub const NAME: &str = "Similarity";

/// Ranks the current visualizations by how closely their shape follows the
/// chart described by `query_intent`, which must carry exactly one filter.
pub fn similar_pattern(
    ctx: &ActionContext<'_>,
    query_intent: &[Clause],
    top_k: Option<usize>,
) -> Result<Recommendation> {
    let description = "Show other charts that are visually similar to the current chart.";
    let filters = query_intent.iter().filter(|c| c.is_filter()).count();
    if filters != 1 {
        warn!(filters, "similarity query needs exactly one filter");
        return Ok(ctx.empty(NAME, description));
    }
    let mut query = ctx.compile(query_intent)?;
    ctx.executor.execute(&mut query, ctx.dataset)?;
    let points = ctx.config.similarity_points;
    let Some(query_shape) = query.get(0).and_then(|vis| shape(vis, points)) else {
        warn!("similarity query produced no comparable chart");
        return Ok(ctx.empty(NAME, description));
    };
    let mut candidates = Vec::with_capacity(ctx.current_vis.len());
    for vis in ctx.current_vis {
        let mut vis = vis.clone();
        if vis.data.is_none() {
            ctx.executor.execute_one(&mut vis, ctx.dataset)?;
        }
        match shape(&vis, points) {
            Some(candidate) => {
                vis.score = euclidean(&query_shape, &candidate);
                candidates.push(vis);
            }
            None => debug!(vis = %vis, "skipping chart without a numeric y series"),
        }
    }
    let mut collection =
        VisualizationCollection::from_vec(candidates).with_source(ctx.dataset.id().clone());
    collection.normalize_score(true);
    if let Some(k) = top_k {
        collection = collection.top_k(k);
    }
    Ok(Recommendation::new(NAME, description, collection))
}
/// Mean y per x, resampled to `points` evenly spaced positions and scaled to
/// [0, 1] unless the spread is below one.
fn shape(vis: &Visualization, points: usize) -> Option<Vec<f64>> {
    let data = vis.data.as_ref()?;
    let x = data.column(vis.get_by_channel(Channel::X)?.attribute_name()?)?;
    let y = data.column(vis.get_by_channel(Channel::Y)?.attribute_name()?)?;
    let mut groups: IndexMap<Value, (f64, usize)> = IndexMap::new();
    for (key, value) in x.iter().zip(y) {
        let (Some(value), false) = (value.as_f64(), key.is_null()) else {
            continue;
        };
        let entry = groups.entry(key.clone()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    if groups.is_empty() {
        return None;
    }
    groups.sort_keys();
    let numeric = groups.keys().all(|k| matches!(k, Value::Number(_)));
    let series: Vec<(f64, f64)> = groups
        .iter()
        .enumerate()
        .map(|(i, (key, (sum, n)))| {
            let position = if numeric {
                key.as_f64().unwrap_or(i as f64)
            } else {
                i as f64
            };
            (position, sum / *n as f64)
        })
        .collect();
    let mut resampled = interpolate(&series, points);
    let lo = resampled.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = resampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi - lo >= 1.0 {
        for v in &mut resampled {
            *v = (*v - lo) / (hi - lo);
        }
    }
    Some(resampled)
}
/// Linear interpolation over a series sorted by x.
fn interpolate(series: &[(f64, f64)], points: usize) -> Vec<f64> {
    let (Some(&(first_x, first_y)), Some(&(last_x, _))) = (series.first(), series.last()) else {
        return Vec::new();
    };
    if points < 2 || series.len() < 2 || last_x == first_x {
        return vec![first_y; points];
    }
    let step = (last_x - first_x) / (points - 1) as f64;
    let mut segment = 1;
    (0..points)
        .map(|i| {
            let target = first_x + i as f64 * step;
            while segment < series.len() - 1 && series[segment].0 < target {
                segment += 1;
            }
            let (x0, y0) = series[segment - 1];
            let (x1, y1) = series[segment];
            if x1 == x0 {
                y1
            } else {
                y0 + (target - x0) / (x1 - x0) * (y1 - y0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_hits_endpoints() {
        let series = vec![(0.0, 0.0), (2.0, 4.0), (4.0, 0.0)];
        let resampled = interpolate(&series, 5);
        assert_eq!(resampled, vec![0.0, 2.0, 4.0, 2.0, 0.0]);
    }

    #[test]
    fn test_interpolate_single_point_is_flat() {
        assert_eq!(interpolate(&[(3.0, 7.0)], 3), vec![7.0, 7.0, 7.0]);
    }
}
