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

pub mod correlation;
pub mod enhance;
pub mod filter;
pub mod generalize;
pub mod similarity;
pub mod temporal;
pub mod univariate;
use crate::clause::{Clause, DataType};
use crate::collection::VisualizationCollection;
use crate::compiler::IntentCompiler;
use crate::config::RecommendationConfig;
use crate::data::{AnnotatedDataset, MetadataProvider};
use crate::error::{ActionError, Result};
use crate::executor::Executor;
use crate::interestingness::InterestingnessScorer;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
pub use similarity::similar_pattern;

/// Everything an action may read: the dataset, the caller's intent and the
/// visualizations it currently produces.
pub struct ActionContext<'a> {
    pub dataset: &'a AnnotatedDataset,
    pub intent: &'a [Clause],
    pub current_vis: &'a VisualizationCollection,
    pub executor: &'a dyn Executor,
    pub config: &'a RecommendationConfig,
}
impl<'a> ActionContext<'a> {
    pub fn filters(&self) -> Vec<Clause> {
        self.intent.iter().filter(|c| c.is_filter()).cloned().collect()
    }
    /// Plotted clauses of the intent, the row count excluded.
    pub fn attributes(&self) -> Vec<Clause> {
        self.intent
            .iter()
            .filter(|c| !c.is_filter() && !c.is_record())
            .cloned()
            .collect()
    }
    pub fn has_temporal_column(&self) -> bool {
        !self.dataset.attributes_of_type(DataType::Temporal).is_empty()
    }
    pub fn scorer(&self) -> InterestingnessScorer<'_> {
        InterestingnessScorer::new(self.dataset, self.executor, self.config)
    }
    pub fn compile(&self, intent: &[Clause]) -> Result<VisualizationCollection> {
        let mut collection =
            IntentCompiler::with_config(self.config).compile(intent, self.dataset)?;
        collection.set_source(self.dataset.id().clone());
        Ok(collection)
    }
    pub fn execute_and_score(&self, collection: &mut VisualizationCollection) -> Result<()> {
        self.executor.execute(collection, self.dataset)?;
        self.scorer().score_collection(collection)
    }
    /// Compiles, executes and scores an intent over the context's dataset.
    pub fn evaluate(&self, intent: &[Clause]) -> Result<VisualizationCollection> {
        let mut collection = self.compile(intent)?;
        self.execute_and_score(&mut collection)?;
        Ok(collection)
    }
    pub fn empty(&self, action: &str, description: impl Into<String>) -> Recommendation {
        Recommendation::new(action, description, VisualizationCollection::new())
    }
}
/// One titled, ranked group of charts.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub action: String,
    pub description: String,
    pub collection: VisualizationCollection,
}
impl Recommendation {
    pub fn new(
        action: impl Into<String>,
        description: impl Into<String>,
        collection: VisualizationCollection,
    ) -> Self {
        Self {
            action: action.into(),
            description: description.into(),
            collection,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}
pub type ActionFn = Arc<dyn Fn(&ActionContext<'_>) -> Result<Recommendation> + Send + Sync>;
pub type DisplayCondition = Arc<dyn Fn(&ActionContext<'_>) -> bool + Send + Sync>;
#[derive(Clone)]
pub struct RegisteredAction {
    name: String,
    generator: ActionFn,
    condition: Option<DisplayCondition>,
}
impl RegisteredAction {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn should_display(&self, ctx: &ActionContext<'_>) -> bool {
        self.condition.as_ref().map_or(true, |condition| condition(ctx))
    }
    pub fn generate(&self, ctx: &ActionContext<'_>) -> Result<Recommendation> {
        (self.generator)(ctx)
    }
}
impl fmt::Debug for RegisteredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredAction")
            .field("name", &self.name)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}
/// Named recommendation actions, run in registration order.
#[derive(Clone, Debug, Default)]
pub struct ActionRegistry {
    actions: IndexMap<String, RegisteredAction>,
}
impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    /// Correlation, Distribution, Occurrence and Temporal when nothing is
    /// plotted yet; Enhance, Filter and Generalize around a single chart.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults: [(&str, ActionFn, DisplayCondition); 7] = [
            ("Correlation", Arc::new(correlation::correlation), Arc::new(no_vis)),
            ("Distribution", Arc::new(univariate::distribution), Arc::new(no_vis)),
            ("Occurrence", Arc::new(univariate::occurrence), Arc::new(no_vis)),
            (
                "Temporal",
                Arc::new(temporal::temporal),
                Arc::new(|ctx: &ActionContext<'_>| no_vis(ctx) && ctx.has_temporal_column()),
            ),
            ("Enhance", Arc::new(enhance::enhance), Arc::new(one_current_vis)),
            ("Filter", Arc::new(filter::add_filter), Arc::new(one_current_vis)),
            ("Generalize", Arc::new(generalize::generalize), Arc::new(one_current_vis)),
        ];
        for (name, generator, condition) in defaults {
            registry.actions.insert(
                name.to_string(),
                RegisteredAction {
                    name: name.to_string(),
                    generator,
                    condition: Some(condition),
                },
            );
        }
        registry
    }
    /// Registers an action shown on every run.
    pub fn register_action<F>(
        &mut self,
        name: impl Into<String>,
        generator: F,
    ) -> std::result::Result<(), ActionError>
    where
        F: Fn(&ActionContext<'_>) -> Result<Recommendation> + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(generator), None)
    }
    /// Registers an action shown only when `condition` holds.
    pub fn register_action_when<F, C>(
        &mut self,
        name: impl Into<String>,
        generator: F,
        condition: C,
    ) -> std::result::Result<(), ActionError>
    where
        F: Fn(&ActionContext<'_>) -> Result<Recommendation> + Send + Sync + 'static,
        C: Fn(&ActionContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(generator), Some(Arc::new(condition)))
    }
    fn insert(
        &mut self,
        name: String,
        generator: ActionFn,
        condition: Option<DisplayCondition>,
    ) -> std::result::Result<(), ActionError> {
        if self.actions.contains_key(&name) {
            return Err(ActionError::DuplicateAction { name });
        }
        self.actions.insert(
            name.clone(),
            RegisteredAction {
                name,
                generator,
                condition,
            },
        );
        Ok(())
    }
    pub fn remove_action(&mut self, name: &str) -> std::result::Result<(), ActionError> {
        self.actions
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| ActionError::UnknownAction {
                name: name.to_string(),
            })
    }
    pub fn get(&self, name: &str) -> Option<&RegisteredAction> {
        self.actions.get(name)
    }
    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredAction> {
        self.actions.values()
    }
    pub fn len(&self) -> usize {
        self.actions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
pub fn no_vis(ctx: &ActionContext<'_>) -> bool {
    ctx.current_vis.is_empty()
}
pub fn one_current_vis(ctx: &ActionContext<'_>) -> bool {
    ctx.current_vis.len() == 1
}
fn describe_intent(ctx: &ActionContext<'_>) -> String {
    ctx.attributes()
        .iter()
        .chain(ctx.filters().iter())
        .map(Clause::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
