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

pub mod encoding;
use crate::clause::{
    AggregateFunction, Aggregation, AttributeSpec, Clause, DataModel, DataType, FilterTarget,
};
use crate::collection::VisualizationCollection;
use crate::config::RecommendationConfig;
use crate::data::{MetadataProvider, Value};
use crate::error::Result;
use crate::vis::Visualization;
pub use encoding::{enforce_channels, infer_encoding};
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Turns an intent into encoded candidate visualizations: wildcard
/// expansion, type backfill, pruning of invalid shapes, encoding.
#[derive(Debug, Clone)]
pub struct IntentCompiler {
    default_bin_size: usize,
    parallel_threshold: usize,
}
impl IntentCompiler {
    pub fn new() -> Self {
        Self::with_config(&RecommendationConfig::default())
    }
    pub fn with_config(config: &RecommendationConfig) -> Self {
        Self {
            default_bin_size: config.default_bin_size,
            parallel_threshold: config.parallel_threshold,
        }
    }
    /// A channel conflict on any candidate aborts the whole batch.
    pub fn compile<M: MetadataProvider + ?Sized>(
        &self,
        intent: &[Clause],
        metadata: &M,
    ) -> Result<VisualizationCollection> {
        let candidates = self.enumerate(intent, metadata);
        let enumerated = candidates.len();
        let mut candidates: Vec<Visualization> = candidates
            .into_iter()
            .map(|mut vis| {
                backfill_types(&mut vis, metadata);
                vis
            })
            .filter(is_valid_combination)
            .collect();
        debug!(
            enumerated,
            surviving = candidates.len(),
            "pruned candidate visualizations"
        );
        let bin_size = self.default_bin_size;
        if candidates.len() >= self.parallel_threshold {
            candidates
                .par_iter_mut()
                .try_for_each(|vis| infer_encoding(vis, metadata, bin_size))?;
        } else {
            candidates
                .iter_mut()
                .try_for_each(|vis| infer_encoding(vis, metadata, bin_size))?;
        }
        Ok(VisualizationCollection::from_vec(candidates))
    }
    /// Cartesian product of the attribute slots, crossed with the union of
    /// all filter options so each candidate carries at most one filter.
    pub fn enumerate<M: MetadataProvider + ?Sized>(
        &self,
        intent: &[Clause],
        metadata: &M,
    ) -> Vec<Visualization> {
        let mut slots: Vec<Vec<Clause>> = Vec::new();
        let mut filters: Vec<Clause> = Vec::new();
        for clause in intent {
            if clause.is_filter() {
                filters.extend(filter_options(clause, metadata));
            } else {
                slots.push(attribute_options(clause, metadata));
            }
        }
        if slots.is_empty() {
            return Vec::new();
        }
        let combinations: Vec<Vec<Clause>> = slots
            .into_iter()
            .map(Vec::into_iter)
            .multi_cartesian_product()
            .collect();
        if filters.is_empty() {
            return combinations.into_iter().map(Visualization::new).collect();
        }
        let mut candidates = Vec::with_capacity(combinations.len() * filters.len());
        for combination in &combinations {
            for filter in &filters {
                let mut resolved = combination.clone();
                resolved.push(filter.clone());
                candidates.push(Visualization::new(resolved).with_title(filter.to_string()));
            }
        }
        candidates
    }
}
impl Default for IntentCompiler {
    fn default() -> Self {
        Self::new()
    }
}
/// Compiles with default settings.
pub fn compile<M: MetadataProvider + ?Sized>(
    intent: &[Clause],
    metadata: &M,
) -> Result<VisualizationCollection> {
    IntentCompiler::new().compile(intent, metadata)
}
fn attribute_options<M: MetadataProvider + ?Sized>(clause: &Clause, metadata: &M) -> Vec<Clause> {
    let names: Vec<String> = match &clause.attribute {
        AttributeSpec::Wildcard => metadata
            .columns()
            .iter()
            .filter(|c| {
                clause
                    .data_type
                    .map_or(true, |t| metadata.data_type(c) == Some(t))
                    && clause
                        .data_model
                        .map_or(true, |m| metadata.data_model(c) == Some(m))
            })
            .cloned()
            .collect(),
        AttributeSpec::Name(name) => vec![name.clone()],
        AttributeSpec::AnyOf(names) => names.clone(),
    };
    names
        .iter()
        .filter(|name| !clause.exclude.contains(name))
        .map(|name| clause.resolved(name))
        .collect()
}
fn filter_options<M: MetadataProvider + ?Sized>(clause: &Clause, metadata: &M) -> Vec<Clause> {
    let Some(filter) = &clause.filter else {
        return Vec::new();
    };
    let mut options = Vec::new();
    for attribute in clause.attribute.names() {
        let values: Vec<Value> = match &filter.target {
            FilterTarget::Wildcard => metadata.unique_values(attribute).to_vec(),
            FilterTarget::Value(value) => vec![value.clone()],
            FilterTarget::AnyOf(values) => values.clone(),
        };
        for value in values {
            if clause.exclude.contains(&value.to_string()) {
                continue;
            }
            options.push(clause.resolved(attribute).with_filter_value(value));
        }
    }
    options
}
/// Fills unset types and models from metadata. Id and geographical columns
/// are treated as nominal.
fn backfill_types<M: MetadataProvider + ?Sized>(vis: &mut Visualization, metadata: &M) {
    for clause in &mut vis.intent {
        if clause.is_record() {
            clause.data_type.get_or_insert(DataType::Quantitative);
            clause.data_model.get_or_insert(DataModel::Measure);
            if clause.aggregation == Aggregation::Unset {
                clause.aggregation = Aggregation::Function(AggregateFunction::Count);
            }
            continue;
        }
        if clause.data_type.is_none() {
            clause.data_type = clause
                .attribute_name()
                .and_then(|name| metadata.data_type(name));
        }
        clause.data_type = clause.data_type.map(DataType::normalized);
        if clause.data_model.is_none() {
            clause.data_model = clause.data_type.map(DataType::default_model);
        }
    }
}
/// Rejects repeated attributes, two or more temporal clauses, and a
/// temporal clause alongside two measures.
fn is_valid_combination(vis: &Visualization) -> bool {
    let mut seen = HashSet::new();
    let mut temporal = 0;
    for clause in &vis.intent {
        if !seen.insert(clause.attribute.to_string()) {
            return false;
        }
        if clause.data_type == Some(DataType::Temporal) {
            temporal += 1;
        }
    }
    temporal < 2 && !(temporal == 1 && vis.n_msr() == 2)
}
