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

use proptest::prelude::*;
use sightline::{Clause, Mark, Visualization, VisualizationCollection};

fn vis(name: &str, score: f64) -> Visualization {
    let mut vis = Visualization::new(vec![Clause::attribute(name)]).with_mark(Mark::Bar);
    vis.score = score;
    vis
}

fn collection(scores: &[f64]) -> VisualizationCollection {
    scores
        .iter()
        .enumerate()
        .map(|(i, score)| vis(&format!("c{i}"), *score))
        .collect()
}

fn score_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(-1.0), Just(0.0), -5.0f64..5.0]
}

proptest! {
    #[test]
    fn test_sort_orders_and_drops_invalid(
        scores in prop::collection::vec(score_strategy(), 0..40),
    ) {
        let mut sorted = collection(&scores);
        sorted.sort(true, true);
        let expected = scores.iter().filter(|s| **s != -1.0).count();
        prop_assert_eq!(sorted.len(), expected);
        prop_assert!(sorted.scores().windows(2).all(|w| w[0] >= w[1]));
        prop_assert!(sorted.iter().all(Visualization::is_valid));
    }

    #[test]
    fn test_sort_is_stable_for_ties(n in 1usize..20) {
        let mut tied = collection(&vec![0.5; n]);
        tied.sort(false, true);
        let titles: Vec<String> = tied.iter().map(|v| v.intent[0].to_string()).collect();
        let expected: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
        prop_assert_eq!(titles, expected);
    }

    #[test]
    fn test_top_k_is_a_prefix_of_the_sorted_collection(
        scores in prop::collection::vec(score_strategy(), 0..40),
        k in 0usize..50,
    ) {
        let original = collection(&scores);
        let mut sorted = original.clone();
        sorted.sort(true, true);
        let top = original.top_k(k);
        prop_assert_eq!(top.len(), k.min(sorted.len()));
        prop_assert_eq!(top.scores(), sorted.scores()[..top.len()].to_vec());
        prop_assert_eq!(original.len(), scores.len());
    }
}
