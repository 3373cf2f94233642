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
    compile, parse, AggregateFunction, Aggregation, Channel, Clause, DataType, Executor,
    InMemoryExecutor, IntentCompiler, InterestingnessScorer, Mark, MetadataProvider, RawClause,
    RecommendationConfig, RecommendationError, SortOrder, TableBuilder,
};

fn intent(raw: &[&str]) -> Vec<Clause> {
    let raw: Vec<RawClause> = raw.iter().map(|s| RawClause::from(*s)).collect();
    parse(&raw)
}

#[test]
fn test_measure_by_dimension_is_a_mean_bar() {
    let dataset = cars();
    let collection = compile(&intent(&["Horsepower", "Origin"]), &dataset).unwrap();
    assert_eq!(collection.len(), 1);
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Bar));
    let x = vis.get_by_channel(Channel::X).unwrap();
    assert_eq!(x.attribute_name(), Some("Horsepower"));
    assert_eq!(
        x.aggregation,
        Aggregation::Function(AggregateFunction::Mean)
    );
    let y = vis.get_by_channel(Channel::Y).unwrap();
    assert_eq!(y.attribute_name(), Some("Origin"));
    assert_eq!(y.sort, None);
}

#[test]
fn test_end_to_end_bar_has_one_row_per_category() {
    let dataset = cars();
    let config = RecommendationConfig::default();
    let executor = InMemoryExecutor::new();
    let mut collection = compile(&intent(&["Horsepower", "Origin"]), &dataset).unwrap();
    executor.execute(&mut collection, &dataset).unwrap();
    InterestingnessScorer::new(&dataset, &executor, &config)
        .score_collection(&mut collection)
        .unwrap();
    let vis = &collection[0];
    assert_eq!(vis.data.as_ref().unwrap().height(), 3);
    assert!(vis.score >= 0.0);
}

#[test]
fn test_compile_is_idempotent() {
    let dataset = cars();
    let raw = intent(&["?", "Origin=?"]);
    let first = compile(&raw, &dataset).unwrap();
    let second = compile(&raw, &dataset).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.intent, b.intent);
        assert_eq!(a.mark, b.mark);
        assert_eq!(a.title, b.title);
    }
}

#[test]
fn test_lone_wildcard_yields_one_chart_per_column() {
    let dataset = cars();
    let collection = compile(&intent(&["?"]), &dataset).unwrap();
    assert_eq!(collection.len(), dataset.columns().len());
    assert!(collection.iter().all(|vis| vis.mark.is_some()));
}

#[test]
fn test_repeated_attribute_is_pruned() {
    let dataset = cars();
    let collection = compile(&intent(&["Horsepower", "?"]), &dataset).unwrap();
    assert_eq!(collection.len(), dataset.columns().len() - 1);
    for vis in &collection {
        let names: Vec<&str> = vis.attributes().filter_map(Clause::attribute_name).collect();
        assert_ne!(names.first(), names.get(1));
    }
}

#[test]
fn test_three_temporal_clauses_yield_nothing() {
    let dataset = TableBuilder::new()
        .typed_column("Start", DataType::Temporal, vec![1.0, 2.0, 3.0])
        .typed_column("End", DataType::Temporal, vec![2.0, 3.0, 4.0])
        .typed_column("Due", DataType::Temporal, vec![3.0, 4.0, 5.0])
        .build("schedule")
        .unwrap();
    let collection = compile(&intent(&["Start", "End", "Due"]), &dataset).unwrap();
    assert!(collection.is_empty());
}

#[test]
fn test_single_measure_is_a_ten_bin_histogram() {
    let dataset = cars();
    let mut collection = compile(&intent(&["Horsepower"]), &dataset).unwrap();
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Histogram));
    assert_eq!(vis.get_by_channel(Channel::X).unwrap().bin_size, 10);
    InMemoryExecutor::new().execute(&mut collection, &dataset).unwrap();
    assert_eq!(collection[0].data.as_ref().unwrap().height(), 10);
}

#[test]
fn test_two_measures_are_an_unaggregated_scatter() {
    let dataset = cars();
    let collection = compile(&intent(&["Horsepower", "Weight"]), &dataset).unwrap();
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Scatter));
    for channel in [Channel::X, Channel::Y] {
        assert_eq!(
            vis.get_by_channel(channel).unwrap().aggregation,
            Aggregation::Disabled
        );
    }
}

#[test]
fn test_explicit_channels_override_inference() {
    let dataset = cars();
    let intent = vec![
        Clause::attribute("Horsepower").with_channel(Channel::Y),
        Clause::attribute("Weight").with_channel(Channel::X),
    ];
    let collection = compile(&intent, &dataset).unwrap();
    let vis = &collection[0];
    assert_eq!(
        vis.get_by_channel(Channel::X).unwrap().attribute_name(),
        Some("Weight")
    );
    assert_eq!(
        vis.get_by_channel(Channel::Y).unwrap().attribute_name(),
        Some("Horsepower")
    );
}

#[test]
fn test_channel_conflict_aborts_compilation() {
    let dataset = cars();
    let intent = vec![
        Clause::attribute("Horsepower").with_channel(Channel::X),
        Clause::attribute("Weight").with_channel(Channel::X),
    ];
    let err = compile(&intent, &dataset).unwrap_err();
    assert!(matches!(err, RecommendationError::ChannelConflict(_)));
}

#[test]
fn test_filter_options_are_crossed_one_at_a_time() {
    let dataset = cars();
    let collection = compile(&intent(&["Horsepower", "Origin=?"]), &dataset).unwrap();
    let titles: Vec<&str> = collection.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, vec!["Origin=Europe", "Origin=Japan", "Origin=USA"]);
    assert!(collection.iter().all(|vis| vis.n_filter() == 1));

    let collection =
        compile(&intent(&["Horsepower", "Origin=USA", "Year=1970"]), &dataset).unwrap();
    assert_eq!(collection.len(), 2);
    assert!(collection.iter().all(|vis| vis.n_filter() == 1));
}

#[test]
fn test_wide_nominal_bars_are_sorted() {
    let dataset = TableBuilder::new()
        .typed_column(
            "Brand",
            DataType::Nominal,
            vec!["amc", "bmw", "chevy", "dodge", "ford", "honda", "amc"],
        )
        .typed_column(
            "Price",
            DataType::Quantitative,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        )
        .build("brands")
        .unwrap();
    let collection = compile(&intent(&["Price", "Brand"]), &dataset).unwrap();
    assert_eq!(
        collection[0].get_by_channel(Channel::Y).unwrap().sort,
        Some(SortOrder::Ascending)
    );
}

#[test]
fn test_temporal_dimension_draws_a_line() {
    let dataset = cars();
    let collection = IntentCompiler::new()
        .compile(&intent(&["Horsepower", "Year"]), &dataset)
        .unwrap();
    let vis = &collection[0];
    assert_eq!(vis.mark, Some(Mark::Line));
    assert_eq!(
        vis.get_by_channel(Channel::X).unwrap().attribute_name(),
        Some("Year")
    );
}
