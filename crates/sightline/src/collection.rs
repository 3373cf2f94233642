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

use crate::data::DatasetId;
use crate::vis::Visualization;
use serde::Serialize;
use std::ops::{Index, IndexMut};

/// Ordered list of visualizations over one dataset. Duplicates are kept
/// until [`VisualizationCollection::remove_duplicates`] is called.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisualizationCollection {
    visualizations: Vec<Visualization>,
    #[serde(skip)]
    source: Option<DatasetId>,
}
impl VisualizationCollection {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_vec(visualizations: Vec<Visualization>) -> Self {
        Self {
            visualizations,
            source: None,
        }
    }
    pub fn with_source(mut self, source: DatasetId) -> Self {
        self.source = Some(source);
        self
    }
    pub fn source(&self) -> Option<&DatasetId> {
        self.source.as_ref()
    }
    pub fn set_source(&mut self, source: DatasetId) {
        self.source = Some(source);
    }
    pub fn len(&self) -> usize {
        self.visualizations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.visualizations.is_empty()
    }
    pub fn push(&mut self, vis: Visualization) {
        self.visualizations.push(vis);
    }
    pub fn extend<I: IntoIterator<Item = Visualization>>(&mut self, iter: I) {
        self.visualizations.extend(iter);
    }
    pub fn get(&self, index: usize) -> Option<&Visualization> {
        self.visualizations.get(index)
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Visualization> {
        self.visualizations.iter()
    }
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Visualization> {
        self.visualizations.iter_mut()
    }
    pub fn as_slice(&self) -> &[Visualization] {
        &self.visualizations
    }
    pub fn as_mut_slice(&mut self) -> &mut [Visualization] {
        &mut self.visualizations
    }
    pub fn into_vec(self) -> Vec<Visualization> {
        self.visualizations
    }
    pub fn retain<F: FnMut(&Visualization) -> bool>(&mut self, f: F) {
        self.visualizations.retain(f);
    }
    pub fn scores(&self) -> Vec<f64> {
        self.visualizations.iter().map(|v| v.score).collect()
    }
    /// Drops -1 scores when `remove_invalid`, then stable-sorts by score.
    pub fn sort(&mut self, remove_invalid: bool, descending: bool) {
        if remove_invalid {
            self.visualizations.retain(Visualization::is_valid);
        }
        if descending {
            self.visualizations
                .sort_by(|a, b| b.score.total_cmp(&a.score));
        } else {
            self.visualizations
                .sort_by(|a, b| a.score.total_cmp(&b.score));
        }
    }
    pub fn top_k(&self, k: usize) -> VisualizationCollection {
        self.ranked(k, true)
    }
    pub fn bottom_k(&self, k: usize) -> VisualizationCollection {
        self.ranked(k, false)
    }
    fn ranked(&self, k: usize, descending: bool) -> VisualizationCollection {
        let mut sorted = self.clone();
        sorted.sort(true, descending);
        sorted.visualizations.truncate(k);
        sorted
    }
    /// Scales valid scores by their maximum; `invert` maps each to
    /// `1 - score` so a smaller raw value ranks higher. Excluded charts keep
    /// their `-1`.
    pub fn normalize_score(&mut self, invert: bool) {
        let max = self
            .visualizations
            .iter()
            .filter(|v| v.is_valid())
            .map(|v| v.score)
            .fold(f64::NEG_INFINITY, f64::max);
        let scale = max.is_finite() && max != 0.0;
        for vis in self.visualizations.iter_mut().filter(|v| v.is_valid()) {
            if scale {
                vis.score /= max;
            }
            if invert {
                vis.score = 1.0 - vis.score;
            }
        }
    }
    /// Keeps the first of every group of charts with equal clauses and mark.
    pub fn remove_duplicates(&mut self) {
        let mut kept: Vec<Visualization> = Vec::with_capacity(self.visualizations.len());
        for vis in self.visualizations.drain(..) {
            if !kept.iter().any(|k| k.same_chart(&vis)) {
                kept.push(vis);
            }
        }
        self.visualizations = kept;
    }
}
impl Index<usize> for VisualizationCollection {
    type Output = Visualization;
    fn index(&self, index: usize) -> &Self::Output {
        &self.visualizations[index]
    }
}
impl IndexMut<usize> for VisualizationCollection {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.visualizations[index]
    }
}
impl IntoIterator for VisualizationCollection {
    type Item = Visualization;
    type IntoIter = std::vec::IntoIter<Visualization>;
    fn into_iter(self) -> Self::IntoIter {
        self.visualizations.into_iter()
    }
}
impl<'a> IntoIterator for &'a VisualizationCollection {
    type Item = &'a Visualization;
    type IntoIter = std::slice::Iter<'a, Visualization>;
    fn into_iter(self) -> Self::IntoIter {
        self.visualizations.iter()
    }
}
impl FromIterator<Visualization> for VisualizationCollection {
    fn from_iter<I: IntoIterator<Item = Visualization>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Clause;

    fn scored(name: &str, score: f64) -> Visualization {
        let mut vis = Visualization::new(vec![Clause::attribute(name)]).with_title(name);
        vis.score = score;
        vis
    }

    #[test]
    fn test_sort_is_stable_and_drops_invalid() {
        let mut collection: VisualizationCollection = vec![
            scored("a", 0.5),
            scored("b", -1.0),
            scored("c", 0.9),
            scored("d", 0.5),
        ]
        .into_iter()
        .collect();
        collection.sort(true, true);
        let titles: Vec<&str> = collection.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "d"]);
    }

    #[test]
    fn test_bottom_k() {
        let collection: VisualizationCollection =
            vec![scored("a", 0.2), scored("b", 0.1), scored("c", 0.3)]
                .into_iter()
                .collect();
        let bottom = collection.bottom_k(2);
        assert_eq!(bottom[0].title, "b");
        assert_eq!(bottom[1].title, "a");
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_normalize_score_inverted() {
        let mut collection: VisualizationCollection =
            vec![scored("a", 2.0), scored("b", 4.0)].into_iter().collect();
        collection.normalize_score(true);
        assert_eq!(collection.scores(), vec![0.5, 0.0]);
    }

    #[test]
    fn test_normalize_score_leaves_excluded_charts() {
        let mut collection: VisualizationCollection =
            vec![scored("a", -1.0), scored("b", 2.0), scored("c", 1.0)]
                .into_iter()
                .collect();
        collection.normalize_score(false);
        assert_eq!(collection.scores(), vec![-1.0, 1.0, 0.5]);
        collection.normalize_score(true);
        assert_eq!(collection.scores(), vec![-1.0, 0.0, 0.5]);
        let ranked = collection.top_k(3);
        assert_eq!(ranked.scores(), vec![0.5, 0.0]);
    }

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let mut collection: VisualizationCollection =
            vec![scored("a", 0.1), scored("a", 0.7), scored("b", 0.2)]
                .into_iter()
                .collect();
        collection.remove_duplicates();
        assert_eq!(collection.scores(), vec![0.1, 0.2]);
    }
}
