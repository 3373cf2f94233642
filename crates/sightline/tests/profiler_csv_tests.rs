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

use sightline::error::{ConfigError, DataError};
use sightline::{
    AnnotatedDataset, DataProfiler, DataType, MetadataProvider, ProfilingConfig, RawClause,
    RecommendationConfig, RecommendationError, RecommendationSystem, Value,
};
use std::io::Write;
use tempfile::NamedTempFile;

const CARS_CSV: &str = "\
Name,Horsepower,Cylinders,Origin,Date
chevrolet chevelle,130.0,8,USA,1970-01-01
buick skylark,165.0,8,USA,1970-01-01
plymouth satellite,150.0,8,USA,1971-01-01
toyota corona,95.0,4,Japan,1971-01-01
datsun pl510,88.0,4,Japan,1972-01-01
vw 1131,46.0,4,Europe,1972-01-01
peugeot 504,87.0,4,Europe,1973-01-01
audi 100ls,90.0,4,Europe,1973-01-01
saab 99e,95.0,4,Europe,1974-01-01
ford pinto,,4,USA,1974-01-01
";

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_csv_columns_are_typed() {
    let file = csv_file(CARS_CSV);
    let dataset = AnnotatedDataset::from_csv(file.path()).unwrap();
    assert_eq!(dataset.len(), 10);
    assert_eq!(dataset.data_type("Horsepower"), Some(DataType::Quantitative));
    assert_eq!(dataset.data_type("Cylinders"), Some(DataType::Nominal));
    assert_eq!(dataset.data_type("Origin"), Some(DataType::Nominal));
    assert_eq!(dataset.data_type("Name"), Some(DataType::Nominal));
    assert_eq!(dataset.data_type("Date"), Some(DataType::Temporal));
    assert!(matches!(
        dataset.table().get("Date", 0),
        Some(Value::Timestamp(_))
    ));
    assert_eq!(dataset.table().get("Horsepower", 9), Some(&Value::Null));
    assert_eq!(dataset.min_max("Horsepower"), Some((46.0, 165.0)));
    assert_eq!(dataset.cardinality("Origin"), 3);
}

#[test]
fn test_data_type_override_recomputes_metadata() {
    let file = csv_file(CARS_CSV);
    let profiler = DataProfiler::with_config(ProfilingConfig::strict_temporal());
    let mut dataset = AnnotatedDataset::from_csv_with_profiler(file.path(), &profiler).unwrap();
    assert_eq!(dataset.data_type("Date"), Some(DataType::Temporal));
    dataset.set_data_type("Cylinders", DataType::Quantitative).unwrap();
    assert_eq!(dataset.data_type("Cylinders"), Some(DataType::Quantitative));
    assert_eq!(dataset.min_max("Cylinders"), Some((4.0, 8.0)));
    dataset.set_data_type("Date", DataType::Nominal).unwrap();
    assert_eq!(dataset.data_type("Date"), Some(DataType::Nominal));
    assert!(dataset.set_data_type("Torque", DataType::Nominal).is_err());
}

#[test]
fn test_missing_csv_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AnnotatedDataset::from_csv(dir.path().join("absent.csv")).unwrap_err();
    match &err {
        RecommendationError::Data(DataError::DataFileIo { path, .. }) => {
            assert!(path.ends_with("absent.csv"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.category(), "Data");
}

#[test]
fn test_recommend_from_csv() {
    let file = csv_file(CARS_CSV);
    let dataset = AnnotatedDataset::from_csv(file.path()).unwrap();
    let recommendations = RecommendationSystem::new()
        .recommend(&dataset, &[RawClause::from("Horsepower"), RawClause::from("Origin")])
        .unwrap();
    assert!(recommendations.contains_key("Enhance"));
    assert!(recommendations.contains_key("Filter"));
}

#[test]
fn test_config_round_trips_through_yaml_file() {
    let config = RecommendationConfig {
        top_k: 7,
        sample_seed: 42,
        ..RecommendationConfig::for_exploration()
    };
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(config.to_yaml().unwrap().as_bytes()).unwrap();
    file.flush().unwrap();
    assert_eq!(RecommendationConfig::from_yaml_file(file.path()).unwrap(), config);
    let err = RecommendationConfig::from_yaml_file(file.path().with_extension("missing"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::ConfigFileError { .. }));
}
