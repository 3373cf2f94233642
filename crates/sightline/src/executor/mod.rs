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

pub mod memory;
use crate::collection::VisualizationCollection;
use crate::data::AnnotatedDataset;
use crate::error::Result;
use crate::vis::Visualization;
pub use memory::InMemoryExecutor;
use rayon::prelude::*;

/// Populates `Visualization::data`. Backends must produce row-equivalent
/// results for filtering, aggregation and binning.
pub trait Executor: Send + Sync {
    fn name(&self) -> &str;
    fn execute_one(&self, vis: &mut Visualization, dataset: &AnnotatedDataset) -> Result<()>;
    /// Collections at least this long are executed on the rayon pool.
    fn parallel_threshold(&self) -> usize {
        usize::MAX
    }
    fn execute(
        &self,
        collection: &mut VisualizationCollection,
        dataset: &AnnotatedDataset,
    ) -> Result<()> {
        if collection.len() >= self.parallel_threshold() {
            collection
                .as_mut_slice()
                .par_iter_mut()
                .try_for_each(|vis| self.execute_one(vis, dataset))
        } else {
            collection
                .iter_mut()
                .try_for_each(|vis| self.execute_one(vis, dataset))
        }
    }
}
