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

mod common;

use common::cars;
use sightline::{
    compile, parse, AnnotatedDataset, Channel, Clause, DataModel, DataType, Executor,
    InMemoryExecutor, InterestingnessScorer, Mark, RawClause, RecommendationConfig,
    RecommendationError, TableBuilder, Visualization, VisualizationCollection,
};
use sightline::vis::COUNT_COLUMN;

fn scored(dataset: &AnnotatedDataset, raw: &[&str]) -> VisualizationCollection {
    let raw: Vec<RawClause> = raw.iter().map(|s| RawClause::from(*s)).collect();
    let config = RecommendationConfig::default();
    let executor = InMemoryExecutor::new();
    let mut collection = compile(&parse(&raw), dataset).unwrap();
    executor.execute(&mut collection, dataset).unwrap();
    InterestingnessScorer::new(dataset, &executor, &config)
        .score_collection(&mut collection)
        .unwrap();
    collection
}

fn measure(name: &str, channel: Channel) -> Clause {
    Clause::attribute(name)
        .with_channel(channel)
        .with_data_type(DataType::Quantitative)
        .with_data_model(DataModel::Measure)
        .with_aggregation(sightline::Aggregation::Disabled)
}

#[test]
fn test_single_row_bar_is_invalid_and_sorted_out() {
    let dataset = TableBuilder::new()
        .typed_column("Origin", DataType::Nominal, vec!["USA", "USA", "USA", "USA"])
        .typed_column(
            "Horsepower",
            DataType::Quantitative,
            vec![130.0, 165.0, 150.0, 95.0],
        )
        .build("one-origin")
        .unwrap();
    let mut collection = scored(&dataset, &["Horsepower", "Origin"]);
    assert_eq!(collection[0].score, -1.0);
    collection.sort(true, true);
    assert!(collection.is_empty());
}

#[test]
fn test_self_scatter_is_invalid() {
    let dataset = cars();
    let config = RecommendationConfig::default();
    let executor = InMemoryExecutor::new();
    let mut vis = Visualization::new(vec![
        measure("Horsepower", Channel::X),
        measure("Horsepower", Channel::Y),
    ])
    .with_mark(Mark::Scatter);
    executor.execute_one(&mut vis, &dataset).unwrap();
    let score = InterestingnessScorer::new(&dataset, &executor, &config)
        .score(&vis)
        .unwrap();
    assert_eq!(score, -1.0);
}

#[test]
fn test_scoring_before_execution_fails() {
    let dataset = cars();
    let config = RecommendationConfig::default();
    let executor = InMemoryExecutor::new();
    let collection = compile(&parse(&[RawClause::from("Horsepower")]), &dataset).unwrap();
    let err = InterestingnessScorer::new(&dataset, &executor, &config)
        .score(&collection[0])
        .unwrap_err();
    assert!(matches!(err, RecommendationError::Precondition(_)));
}

#[test]
fn test_correlated_measures_score_high() {
    let dataset = cars();
    let collection = scored(&dataset, &["Horsepower", "Weight"]);
    let score = collection[0].score;
    assert!(score > 0.5 && score <= 1.0, "score was {score}");
}

#[test]
fn test_sparse_scatter_is_invalid() {
    let dataset = cars();
    let collection = scored(&dataset, &["Horsepower", "Weight", "Origin=USA"]);
    assert_eq!(collection[0].score, -1.0);
}

#[test]
fn test_filtered_bar_deviation_is_non_negative() {
    let dataset = cars();
    let collection = scored(&dataset, &["Horsepower", "Origin", "Year=1970"]);
    assert!(collection[0].score >= 0.0);
}

#[test]
fn test_unevenness_prefers_skewed_counts() {
    let dataset = TableBuilder::new()
        .typed_column(
            "Even",
            DataType::Nominal,
            vec!["a", "b", "c", "a", "b", "c"],
        )
        .typed_column(
            "Skewed",
            DataType::Nominal,
            vec!["a", "a", "a", "a", "a", "b"],
        )
        .build("counts")
        .unwrap();
    let even = scored(&dataset, &["Even"]);
    let skewed = scored(&dataset, &["Skewed"]);
    assert!(even[0].score.abs() < 1e-12);
    assert!(skewed[0].score > even[0].score);
}

#[test]
fn test_colored_line_has_fixed_score() {
    let dataset = cars();
    let collection = scored(&dataset, &["Horsepower", "Origin", "Year"]);
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Line));
    assert_eq!(
        vis.get_by_channel(Channel::Color).unwrap().attribute_name(),
        Some("Origin")
    );
    assert_eq!(vis.score, 0.15);
}

#[test]
fn test_unencodable_shape_scores_invalid() {
    let dataset = cars();
    let collection = scored(
        &dataset,
        &["Horsepower", "Weight", "Acceleration", "Origin", "Year"],
    );
    assert_eq!(collection.len(), 1);
    assert_eq!(collection[0].mark, None);
    assert_eq!(collection[0].score, -1.0);
}

#[test]
fn test_histogram_scores_skewness_of_bin_counts() {
    let dataset = TableBuilder::new()
        .typed_column("Delay", DataType::Quantitative, vec![0.0, 0.0, 0.0, 1.0, 10.0])
        .build("delays")
        .unwrap();
    let collection = scored(&dataset, &["Delay"]);
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Histogram));
    let counts = vis.data.as_ref().unwrap().numeric(COUNT_COLUMN).unwrap();
    assert_eq!(counts, vec![3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    // mean 0.5, m2 0.85, m3 1.5
    assert!((vis.score - 1.914_092_274_870_496).abs() < 1e-9, "score was {}", vis.score);
}

#[test]
fn test_filtered_histogram_deviates_from_overall() {
    let dataset = TableBuilder::new()
        .typed_column(
            "Delay",
            DataType::Quantitative,
            vec![0.0, 0.0, 1.0, 10.0, 10.0, 10.0],
        )
        .typed_column("Gate", DataType::Nominal, vec!["a", "a", "a", "a", "b", "b"])
        .build("delays")
        .unwrap();
    let collection = scored(&dataset, &["Delay", "Gate=a"]);
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Histogram));
    // (4/6) * |[2,1,..,1]/4 - [2,1,..,3]/6|
    assert!((vis.score - 0.207_869_854_820_774_5).abs() < 1e-9, "score was {}", vis.score);
}

#[test]
fn test_filtered_bar_counts_rank_changes() {
    let dataset = TableBuilder::new()
        .typed_column(
            "Price",
            DataType::Quantitative,
            vec![1.0, 2.0, 3.0, 11.0, 4.0, 1.0],
        )
        .typed_column("Store", DataType::Nominal, vec!["a", "b", "c", "a", "b", "c"])
        .typed_column("Season", DataType::Nominal, vec!["x", "x", "x", "y", "y", "y"])
        .build("prices")
        .unwrap();
    let collection = scored(&dataset, &["Price", "Store", "Season=x"]);
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Bar));
    // overall means [6,3,2] rank [3,2,1]; filtered [1,2,3] rank [1,2,3].
    // One of the first two ranks moves, so the factor is (1 + 1) / 3.
    let distance = (0.378_787_878_787_878_8f64.powi(2)
        + 0.060_606_060_606_060_6f64.powi(2)
        + 0.318_181_818_181_818_2f64.powi(2))
    .sqrt();
    let expected = 0.5 * (2.0 / 3.0) * distance;
    assert!((vis.score - expected).abs() < 1e-9, "score was {}", vis.score);
    assert!((vis.score - 0.166_130_143_468_672).abs() < 1e-9);
}

#[test]
fn test_colored_scatter_scores_inverse_cardinality() {
    let dataset = cars();
    let collection = scored(&dataset, &["Horsepower", "Weight", "Origin"]);
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Scatter));
    assert!((vis.score - 1.0 / 3.0).abs() < 1e-12);
}

fn colored_points(categories: usize) -> AnnotatedDataset {
    let xs: Vec<f64> = (0..40).map(f64::from).collect();
    let ys: Vec<f64> = xs.iter().map(|x| x * 2.0 + 1.0).collect();
    let groups: Vec<String> = (0..40).map(|i| format!("g{}", i % categories)).collect();
    TableBuilder::new()
        .typed_column("X", DataType::Quantitative, xs)
        .typed_column("Y", DataType::Quantitative, ys)
        .typed_column("Group", DataType::Nominal, groups)
        .build("points")
        .unwrap()
}

#[test]
fn test_colored_scatter_cardinality_boundary() {
    let legible = scored(&colored_points(39), &["X", "Y", "Group"]);
    assert!((legible[0].score - 1.0 / 39.0).abs() < 1e-12);
    let crowded = scored(&colored_points(40), &["X", "Y", "Group"]);
    assert_eq!(crowded[0].mark, Some(Mark::Scatter));
    assert_eq!(crowded[0].score, -1.0);
}

#[test]
fn test_three_measures_have_fixed_score() {
    let dataset = cars();
    let collection = scored(&dataset, &["Horsepower", "Weight", "Acceleration"]);
    assert_eq!(collection[0].mark, Some(Mark::Scatter));
    assert_eq!(collection[0].score, 0.1);
}

fn single_car() -> AnnotatedDataset {
    TableBuilder::new()
        .typed_column("Horsepower", DataType::Quantitative, vec![130.0])
        .typed_column("Weight", DataType::Quantitative, vec![3504.0])
        .typed_column("Acceleration", DataType::Quantitative, vec![12.0])
        .typed_column("Origin", DataType::Nominal, vec!["USA"])
        .typed_column("Cylinders", DataType::Nominal, vec!["8"])
        .typed_column("Year", DataType::Temporal, vec![1970.0])
        .build("single")
        .unwrap()
}

#[test]
fn test_single_row_charts_are_excluded_for_every_shape() {
    let dataset = single_car();
    let cases: [(&[&str], Mark); 3] = [
        (&["Horsepower", "Weight", "Acceleration"], Mark::Scatter),
        (&["Horsepower", "Year", "Origin"], Mark::Line),
        (&["Horsepower", "Origin", "Cylinders"], Mark::Bar),
    ];
    for (intent, mark) in cases {
        let mut collection = scored(&dataset, intent);
        assert_eq!(collection[0].mark, Some(mark), "intent {intent:?}");
        assert_eq!(collection[0].data.as_ref().unwrap().height(), 1);
        assert_eq!(collection[0].score, -1.0, "intent {intent:?}");
        collection.sort(true, true);
        assert!(collection.is_empty());
    }
}
