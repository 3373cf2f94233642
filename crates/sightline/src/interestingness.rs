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

use crate::clause::{Channel, Clause, RECORD};
use crate::collection::VisualizationCollection;
use crate::config::RecommendationConfig;
use crate::data::dataset::filtered_row_count;
use crate::data::{AnnotatedDataset, MetadataProvider, Table, Value};
use crate::error::{PreconditionError, Result};
use crate::executor::Executor;
use crate::vis::{Mark, Visualization, COUNT_COLUMN};
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Fixed score for a scatter coloured by a third measure.
const THREE_MEASURE_SCORE: f64 = 0.1;
const COLORED_LINE_SCORE: f64 = 0.15;
const COLORED_BAR_CAP: f64 = 0.1;

/// Ranks executed visualizations by how far their data departs from an
/// unremarkable baseline. Shapes with no heuristic, or too little data,
/// score -1.
pub struct InterestingnessScorer<'a> {
    dataset: &'a AnnotatedDataset,
    executor: &'a dyn Executor,
    min_scatter_points: usize,
    color_cardinality_max: usize,
    parallel_threshold: usize,
}
impl<'a> InterestingnessScorer<'a> {
    pub fn new(
        dataset: &'a AnnotatedDataset,
        executor: &'a dyn Executor,
        config: &RecommendationConfig,
    ) -> Self {
        Self {
            dataset,
            executor,
            min_scatter_points: config.min_scatter_points,
            color_cardinality_max: config.color_cardinality_max,
            parallel_threshold: config.parallel_threshold,
        }
    }
    pub fn score_collection(&self, collection: &mut VisualizationCollection) -> Result<()> {
        let assign = |vis: &mut Visualization| -> Result<()> {
            vis.score = self.score(vis)?;
            Ok(())
        };
        if collection.len() >= self.parallel_threshold {
            collection.as_mut_slice().par_iter_mut().try_for_each(assign)?;
        } else {
            collection.iter_mut().try_for_each(assign)?;
        }
        debug!(scored = collection.len(), "scored visualizations");
        Ok(())
    }
    /// Fails when the visualization has not been executed yet.
    pub fn score(&self, vis: &Visualization) -> Result<f64> {
        let Some(data) = &vis.data else {
            return Err(PreconditionError {
                title: vis.to_string(),
            }
            .into());
        };
        let Some(mark) = vis.mark else {
            return Ok(-1.0);
        };
        let rows = data.height();
        if rows < 2 {
            return Ok(-1.0);
        }
        let n_filter = vis.n_filter();
        let score = match (vis.n_dim(), vis.n_msr()) {
            (1, 0..=1) => {
                let measure = measure_column(vis);
                if n_filter == 0 {
                    self.unevenness(vis, data, measure)?
                } else if n_filter == 1 {
                    self.deviation_from_overall(vis, data, measure)?
                } else {
                    -1.0
                }
            }
            (0, 1) => {
                if !data.contains(COUNT_COLUMN) {
                    -1.0
                } else if n_filter == 0 {
                    skewness(&data.numeric(COUNT_COLUMN)?)
                } else if n_filter == 1 {
                    self.deviation_from_overall(vis, data, COUNT_COLUMN)?
                } else {
                    -1.0
                }
            }
            (0, 2) => {
                if rows < self.min_scatter_points {
                    -1.0
                } else {
                    let significance = if n_filter == 0 {
                        1.0
                    } else {
                        self.significance(vis)?
                    };
                    match monotonicity(vis, data)? {
                        Some(m) => significance * m,
                        None => -1.0,
                    }
                }
            }
            (1, 2) => {
                if rows < self.min_scatter_points {
                    -1.0
                } else {
                    let cardinality = vis
                        .get_by_channel(Channel::Color)
                        .and_then(Clause::attribute_name)
                        .map_or(0, |color| self.dataset.cardinality(color));
                    if cardinality > 0 && cardinality < self.color_cardinality_max {
                        1.0 / cardinality as f64
                    } else {
                        -1.0
                    }
                }
            }
            (0, 3) => THREE_MEASURE_SCORE,
            (2, 0..=1) if mark == Mark::Line => COLORED_LINE_SCORE,
            (2, 0..=1) if mark == Mark::Bar => self.colored_bar(vis, data)?,
            _ => -1.0,
        };
        Ok(if score.is_finite() { score } else { -1.0 })
    }
    /// Share of the dataset's rows that pass the chart's filters.
    fn significance(&self, vis: &Visualization) -> Result<f64> {
        let total = self.dataset.len();
        if total == 0 {
            return Ok(0.0);
        }
        let filtered = filtered_row_count(self.dataset.table(), &vis.filter_clauses())?;
        Ok(filtered as f64 / total as f64)
    }
    fn unevenness(&self, vis: &Visualization, data: &Table, measure: &str) -> Result<f64> {
        let Some(dimension) = dimension_column(vis) else {
            return Ok(-1.0);
        };
        let cardinality = self.dataset.cardinality(dimension);
        if cardinality == 0 {
            return Ok(-1.0);
        }
        let values = normalise(&data.numeric(measure)?).unwrap_or_else(|| vec![0.0; data.height()]);
        let uniform = vec![1.0 / cardinality as f64; values.len()];
        Ok(0.5f64.powi(cardinality as i32) * euclidean(&values, &uniform))
    }
    /// Compares the filtered chart with the same chart drawn over every row.
    fn deviation_from_overall(
        &self,
        vis: &Visualization,
        data: &Table,
        measure: &str,
    ) -> Result<f64> {
        let filtered_raw = data.numeric(measure)?;
        let Some(filtered) = normalise(&filtered_raw) else {
            return Ok(0.0);
        };
        let mut overall = Visualization::new(vis.attributes().cloned().collect());
        overall.mark = vis.mark;
        self.executor.execute_one(&mut overall, self.dataset)?;
        let overall_raw = match &overall.data {
            Some(table) => table.numeric(measure)?,
            None => return Ok(-1.0),
        };
        let Some(unfiltered) = normalise(&overall_raw) else {
            return Ok(0.0);
        };
        if unfiltered.len() != filtered.len() {
            warn!(
                vis = %vis,
                filtered = filtered.len(),
                overall = unfiltered.len(),
                "filtered and overall charts differ in length"
            );
            return Ok(-1.0);
        }
        let mut rank_change = 1.0;
        if vis.mark == Some(Mark::Bar) {
            let categories = dimension_column(vis).map_or(0, |d| self.dataset.cardinality(d));
            if categories > 0 {
                let overall_ranks = average_ranks(&overall_raw);
                let filtered_ranks = average_ranks(&filtered_raw);
                for r in 0..categories - 1 {
                    if overall_ranks.get(r) != filtered_ranks.get(r) {
                        rank_change += 1.0;
                    }
                }
                rank_change /= categories as f64;
            }
        }
        Ok(self.significance(vis)? * rank_change * euclidean(&unfiltered, &filtered))
    }
    /// Chi-square statistic of the group-by-color table, discounted by the
    /// number of categories and capped.
    fn colored_bar(&self, vis: &Visualization, data: &Table) -> Result<f64> {
        let Some(color) = vis
            .get_by_channel(Channel::Color)
            .and_then(Clause::attribute_name)
        else {
            return Ok(-1.0);
        };
        let Some(group) = vis
            .dimensions()
            .into_iter()
            .filter_map(Clause::attribute_name)
            .find(|name| *name != color)
        else {
            return Ok(-1.0);
        };
        let measure = measure_column(vis);
        let (groups, colors, measures) = (
            data.try_column(group)?,
            data.try_column(color)?,
            data.try_column(measure)?,
        );
        let mut cells: IndexMap<(&Value, &Value), f64> = IndexMap::new();
        let mut row_totals: IndexMap<&Value, f64> = IndexMap::new();
        let mut col_totals: IndexMap<&Value, f64> = IndexMap::new();
        for i in 0..data.height() {
            let value = measures[i].as_f64().unwrap_or(0.0);
            *cells.entry((&groups[i], &colors[i])).or_default() += value;
            *row_totals.entry(&groups[i]).or_default() += value;
            *col_totals.entry(&colors[i]).or_default() += value;
        }
        let grand: f64 = row_totals.values().sum();
        if grand <= 0.0
            || row_totals.values().any(|t| *t == 0.0)
            || col_totals.values().any(|t| *t == 0.0)
        {
            return Ok(-1.0);
        }
        let mut chi2 = 0.0;
        for (g, row_total) in &row_totals {
            for (c, col_total) in &col_totals {
                let expected = row_total * col_total / grand;
                let observed = cells.get(&(*g, *c)).copied().unwrap_or(0.0);
                chi2 += (observed - expected).powi(2) / expected;
            }
        }
        let categories = self.dataset.cardinality(group) + self.dataset.cardinality(color);
        Ok((chi2 * 0.9f64.powi(categories as i32)).min(COLORED_BAR_CAP))
    }
}
fn measure_column(vis: &Visualization) -> &str {
    vis.attributes()
        .find(|c| c.is_measure())
        .and_then(Clause::attribute_name)
        .unwrap_or(RECORD)
}
fn dimension_column(vis: &Visualization) -> Option<&str> {
    vis.dimensions().into_iter().find_map(Clause::attribute_name)
}
/// Squared Spearman correlation of the two plotted measures. `None` for a
/// self-comparison or when the correlation is undefined.
fn monotonicity(vis: &Visualization, data: &Table) -> Result<Option<f64>> {
    let measures: Vec<&str> = vis
        .measures()
        .into_iter()
        .filter_map(Clause::attribute_name)
        .collect();
    let [first, second] = measures.as_slice() else {
        return Ok(None);
    };
    if first == second {
        return Ok(None);
    }
    let (xs, ys) = (data.try_column(first)?, data.try_column(second)?);
    let (x, y): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter_map(|(a, b)| Some((a.as_f64()?, b.as_f64()?)))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .unzip();
    if x.len() < 2 {
        return Ok(None);
    }
    Ok(pearson(&average_ranks(&x), &average_ranks(&y)).map(|r| r * r))
}
fn normalise(values: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = values.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| v / total).collect())
}
pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
/// 1-based ranks with ties sharing their average rank.
pub(crate) fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        cov += (a - mean_x) * (b - mean_y);
        var_x += (a - mean_x).powi(2);
        var_y += (b - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}
/// Population skewness; a constant series has none.
pub(crate) fn skewness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    if m2 == 0.0 {
        0.0
    } else {
        m3 / m2.powf(1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_ranks_share_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 10.0, 5.0]), vec![2.5, 4.0, 2.5, 1.0]);
    }

    #[test]
    fn test_skewness() {
        assert_eq!(skewness(&[3.0, 3.0, 3.0]), 0.0);
        assert!(skewness(&[1.0, 1.0, 1.0, 10.0]) > 0.0);
        assert!(skewness(&[10.0, 10.0, 10.0, 1.0]) < 0.0);
    }

    #[test]
    fn test_pearson_of_ranks() {
        let x = average_ranks(&[1.0, 2.0, 3.0, 4.0]);
        let y = average_ranks(&[1.0, 4.0, 9.0, 16.0]);
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[2.0, 2.0, 2.0, 2.0]), None);
    }
}
