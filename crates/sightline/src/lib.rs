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

pub mod actions;
pub mod clause;
pub mod collection;
pub mod compiler;
pub mod config;
pub mod data;
pub mod error;
pub mod executor;
pub mod interestingness;
pub mod parser;
pub mod validator;
pub mod vis;

pub use actions::{ActionContext, ActionRegistry, Recommendation};
pub use clause::{
    AggregateFunction, Aggregation, AttributeSpec, Channel, Clause, DataModel, DataType, FilterOp,
    FilterTarget, SortOrder, RECORD, WILDCARD,
};
pub use collection::VisualizationCollection;
pub use compiler::{compile, IntentCompiler};
pub use config::RecommendationConfig;
pub use data::{
    AnnotatedDataset, DataProfiler, DatasetId, DatasetMetadata, MetadataProvider, ProfilingConfig,
    Table, TableBuilder, Value,
};
pub use error::{ErrorReporter, RecommendationError, Result};
pub use executor::{Executor, InMemoryExecutor};
pub use interestingness::InterestingnessScorer;
pub use parser::{parse, RawClause};
pub use validator::validate;
pub use vis::{Mark, Visualization};
use error::ConfigError;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RecommendationSystem {
    config: RecommendationConfig,
    registry: ActionRegistry,
    executor: Arc<dyn Executor>,
}
impl RecommendationSystem {
    pub fn new() -> Self {
        let config = RecommendationConfig::default();
        Self {
            executor: Arc::new(InMemoryExecutor::with_config(&config)),
            registry: ActionRegistry::with_defaults(),
            config,
        }
    }
    pub fn with_config(config: RecommendationConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|reason| ConfigError::ValidationFailed { reason })?;
        Ok(Self {
            executor: Arc::new(InMemoryExecutor::with_config(&config)),
            registry: ActionRegistry::with_defaults(),
            config,
        })
    }
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }
    pub fn with_registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = registry;
        self
    }
    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }
    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }
    pub fn registry_mut(&mut self) -> &mut ActionRegistry {
        &mut self.registry
    }
    /// Parses and validates a raw intent against the dataset.
    pub fn parse_intent(
        &self,
        dataset: &AnnotatedDataset,
        raw_intent: &[RawClause],
    ) -> Result<Vec<Clause>> {
        let intent = parse(raw_intent);
        validate(&intent, dataset)?;
        Ok(intent)
    }
    /// The visualizations the intent itself describes, executed and scored.
    pub fn compile_intent(
        &self,
        dataset: &AnnotatedDataset,
        raw_intent: &[RawClause],
    ) -> Result<VisualizationCollection> {
        let intent = self.parse_intent(dataset, raw_intent)?;
        self.current_vis(dataset, &intent)
    }
    fn current_vis(
        &self,
        dataset: &AnnotatedDataset,
        intent: &[Clause],
    ) -> Result<VisualizationCollection> {
        let mut collection = IntentCompiler::with_config(&self.config).compile(intent, dataset)?;
        collection.set_source(dataset.id().clone());
        self.executor.execute(&mut collection, dataset)?;
        InterestingnessScorer::new(dataset, self.executor.as_ref(), &self.config)
            .score_collection(&mut collection)?;
        Ok(collection)
    }
    /// Runs every registered action whose display condition holds, in
    /// registration order.
    pub fn recommend(
        &self,
        dataset: &AnnotatedDataset,
        raw_intent: &[RawClause],
    ) -> Result<IndexMap<String, Recommendation>> {
        let intent = self.parse_intent(dataset, raw_intent)?;
        let current_vis = self.current_vis(dataset, &intent)?;
        let ctx = self.context(dataset, &intent, &current_vis);
        let mut recommendations = IndexMap::new();
        for action in self.registry.iter() {
            if !action.should_display(&ctx) {
                debug!(action = action.name(), "action not applicable");
                continue;
            }
            let recommendation = action.generate(&ctx)?;
            debug!(
                action = action.name(),
                visualizations = recommendation.collection.len(),
                "generated recommendation"
            );
            recommendations.insert(action.name().to_string(), recommendation);
        }
        info!(
            dataset = %dataset.id(),
            current = current_vis.len(),
            actions = recommendations.len(),
            "recommendation run complete"
        );
        Ok(recommendations)
    }
    /// Ranks the visualizations of `raw_intent` by similarity to the chart
    /// described by `raw_query`.
    pub fn similar_pattern(
        &self,
        dataset: &AnnotatedDataset,
        raw_intent: &[RawClause],
        raw_query: &[RawClause],
        top_k: Option<usize>,
    ) -> Result<Recommendation> {
        let intent = self.parse_intent(dataset, raw_intent)?;
        let query = self.parse_intent(dataset, raw_query)?;
        let current_vis = self.current_vis(dataset, &intent)?;
        let ctx = self.context(dataset, &intent, &current_vis);
        actions::similar_pattern(&ctx, &query, top_k)
    }
    fn context<'a>(
        &'a self,
        dataset: &'a AnnotatedDataset,
        intent: &'a [Clause],
        current_vis: &'a VisualizationCollection,
    ) -> ActionContext<'a> {
        ActionContext {
            dataset,
            intent,
            current_vis,
            executor: self.executor.as_ref(),
            config: &self.config,
        }
    }
}
impl Default for RecommendationSystem {
    fn default() -> Self {
        Self::new()
    }
}
