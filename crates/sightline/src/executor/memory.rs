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
use crate::config::RecommendationConfig;
use crate::data::{filter_rows, AnnotatedDataset, MetadataProvider, Table, Value};
use crate::error::{ExecutionError, Result};
use crate::executor::Executor;
use crate::vis::{Mark, Visualization, COUNT_COLUMN};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Reference executor over an [`AnnotatedDataset`] held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryExecutor {
    sample_cap: usize,
    sample_seed: u64,
    parallel_threshold: usize,
}
impl InMemoryExecutor {
    pub fn new() -> Self {
        Self::with_config(&RecommendationConfig::default())
    }
    pub fn with_config(config: &RecommendationConfig) -> Self {
        Self {
            sample_cap: config.sample_cap,
            sample_seed: config.sample_seed,
            parallel_threshold: config.parallel_threshold,
        }
    }
    fn project(&self, vis: &Visualization, dataset: &AnnotatedDataset) -> Result<Table> {
        let table = dataset.table();
        let rows = filter_rows(table, &vis.filter_clauses())?;
        let mut columns: Vec<&str> = Vec::new();
        for name in vis
            .attributes()
            .filter(|c| !c.is_record())
            .filter_map(Clause::attribute_name)
        {
            if !table.contains(name) {
                return Err(ExecutionError::MissingColumn {
                    title: label(vis),
                    column: name.to_string(),
                }
                .into());
            }
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        Ok(table.select(&columns)?.take(&rows))
    }
    /// Groups by the unaggregated channel (and color), reduces the measure,
    /// and zero-fills every known category.
    fn aggregate(
        &self,
        vis: &Visualization,
        data: Table,
        dataset: &AnnotatedDataset,
    ) -> Result<Table> {
        let x = channel(vis, Channel::X)?;
        let y = channel(vis, Channel::Y)?;
        let (group, measure, function) =
            match (x.aggregation.function(), y.aggregation.function()) {
                (Some(function), _) => (y, x, function),
                (None, Some(function)) => (x, y, function),
                (None, None) => return Ok(data),
            };
        let group_name = group.attribute_name().unwrap_or_default();
        let color_name = vis
            .get_by_channel(Channel::Color)
            .and_then(Clause::attribute_name);
        let measure_name = measure.attribute_name().unwrap_or(RECORD);
        let mut keys = vec![group_name];
        keys.extend(color_name);
        let groups = data.group_indices(&keys)?;
        let measure_values = if measure.is_record() {
            None
        } else {
            Some(data.try_column(measure_name)?)
        };
        let reduce = |indices: &[usize]| match measure_values {
            None => indices.len() as f64,
            Some(column) => {
                let values: Vec<f64> = indices.iter().filter_map(|&i| column[i].as_f64()).collect();
                function.apply(&values)
            }
        };
        let group_values = dataset.unique_values(group_name);
        let mut grid: Vec<Vec<Value>> = match color_name {
            Some(color) => {
                let color_values = dataset.unique_values(color);
                group_values
                    .iter()
                    .flat_map(|g| color_values.iter().map(move |c| vec![g.clone(), c.clone()]))
                    .collect()
            }
            None => group_values.iter().map(|g| vec![g.clone()]).collect(),
        };
        let known: HashSet<&Vec<Value>> = grid.iter().collect();
        let unseen: Vec<Vec<Value>> = groups
            .keys()
            .filter(|key| !known.contains(key))
            .cloned()
            .collect();
        grid.extend(unseen);
        let mut group_column = Vec::with_capacity(grid.len());
        let mut color_column = Vec::with_capacity(grid.len());
        let mut measure_column = Vec::with_capacity(grid.len());
        for key in grid {
            let reduced = groups.get(&key).map_or(0.0, |indices| reduce(indices));
            let mut key = key.into_iter();
            group_column.push(key.next().unwrap_or(Value::Null));
            if color_name.is_some() {
                color_column.push(key.next().unwrap_or(Value::Null));
            }
            measure_column.push(Value::Number(reduced));
        }
        let mut result = Table::new();
        result.push_column(group_name, group_column)?;
        if let Some(color) = color_name {
            result.push_column(color, color_column)?;
        }
        result.push_column(measure_name, measure_column)?;
        Ok(result.sort_by_column(group_name)?)
    }
    /// Equal-width bins over the column's full range so filtered and
    /// unfiltered histograms share bin edges.
    fn bin(&self, vis: &Visualization, data: &Table, dataset: &AnnotatedDataset) -> Result<Table> {
        let clause = vis
            .attributes()
            .find(|c| c.bin_size > 0 && !c.is_record())
            .map_or_else(|| channel(vis, Channel::X), Ok)?;
        let name = clause.attribute_name().unwrap_or_default();
        let bins = clause.bin_size.max(1);
        let values: Vec<f64> = data
            .numeric(name)?
            .into_iter()
            .filter(|v| v.is_finite())
            .collect();
        let observed = values.iter().copied().fold(None, |range: Option<(f64, f64)>, v| {
            Some(range.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
        });
        let (min, max) = dataset
            .min_max(name)
            .or(observed)
            .ok_or_else(|| ExecutionError::NoNumericRange {
                column: name.to_string(),
            })?;
        let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
        let width = (hi - lo) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in values {
            if v < lo || v > hi {
                continue;
            }
            let index = (((v - lo) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }
        let centers: Vec<Value> = (0..bins)
            .map(|i| Value::Number(lo + width * (i as f64 + 0.5)))
            .collect();
        let counts: Vec<Value> = counts.into_iter().map(|c| Value::Number(c as f64)).collect();
        Ok(Table::from_columns(vec![(name, centers), (COUNT_COLUMN, counts)])?)
    }
    /// Reproducible uniform sample, original row order preserved.
    fn sample(&self, vis: &Visualization, data: Table) -> Table {
        if data.height() <= self.sample_cap {
            return data;
        }
        warn!(
            vis = %label(vis),
            rows = data.height(),
            cap = self.sample_cap,
            "sampling scatter data"
        );
        let mut rng = StdRng::seed_from_u64(self.sample_seed);
        let mut picked =
            rand::seq::index::sample(&mut rng, data.height(), self.sample_cap).into_vec();
        picked.sort_unstable();
        data.take(&picked)
    }
}
impl Default for InMemoryExecutor {
    fn default() -> Self {
        Self::new()
    }
}
impl Executor for InMemoryExecutor {
    fn name(&self) -> &str {
        "in-memory"
    }
    fn execute_one(&self, vis: &mut Visualization, dataset: &AnnotatedDataset) -> Result<()> {
        let projected = self.project(vis, dataset)?;
        let data = match vis.mark {
            Some(Mark::Bar) | Some(Mark::Line) => self.aggregate(vis, projected, dataset)?,
            Some(Mark::Histogram) => self.bin(vis, &projected, dataset)?,
            Some(Mark::Scatter) => self.sample(vis, projected),
            None => projected,
        };
        debug!(vis = %label(vis), rows = data.height(), "executed visualization");
        vis.data = Some(data);
        Ok(())
    }
    fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}
fn channel(vis: &Visualization, channel: Channel) -> Result<&Clause> {
    vis.get_by_channel(channel).ok_or_else(|| {
        ExecutionError::MissingChannel {
            title: label(vis),
            channel: channel.to_string(),
        }
        .into()
    })
}
fn label(vis: &Visualization) -> String {
    if vis.title.is_empty() {
        vis.to_string()
    } else {
        vis.title.clone()
    }
}
