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

use crate::data::ProfilingConfig;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the compile, execute, score and recommend pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub top_k: usize,
    pub sample_cap: usize,
    pub sample_seed: u64,
    pub default_bin_size: usize,
    pub min_rows_for_actions: usize,
    pub min_rows_for_temporal: usize,
    pub filter_cardinality_max: usize,
    pub similarity_points: usize,
    pub min_scatter_points: usize,
    pub color_cardinality_max: usize,
    pub parallel_threshold: usize,
    pub profiling: ProfilingConfig,
}
impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            top_k: 15,
            sample_cap: 10_000,
            sample_seed: 1,
            default_bin_size: 10,
            min_rows_for_actions: 5,
            min_rows_for_temporal: 3,
            filter_cardinality_max: 30,
            similarity_points: 100,
            min_scatter_points: 10,
            color_cardinality_max: 40,
            parallel_threshold: 64,
            profiling: ProfilingConfig::default(),
        }
    }
}
impl RecommendationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be greater than 0".to_string());
        }
        if self.sample_cap == 0 {
            return Err("sample_cap must be greater than 0".to_string());
        }
        if self.default_bin_size == 0 {
            return Err("default_bin_size must be greater than 0".to_string());
        }
        if self.similarity_points < 2 {
            return Err("similarity_points must be at least 2".to_string());
        }
        if self.filter_cardinality_max < 3 {
            return Err("filter_cardinality_max must be at least 3".to_string());
        }
        if self.color_cardinality_max == 0 {
            return Err("color_cardinality_max must be greater than 0".to_string());
        }
        if self.parallel_threshold == 0 {
            return Err("parallel_threshold must be greater than 0".to_string());
        }
        self.profiling.validate()
    }
    pub fn for_performance() -> Self {
        Self {
            top_k: 5,
            sample_cap: 2_000,
            filter_cardinality_max: 10,
            similarity_points: 50,
            parallel_threshold: 16,
            profiling: ProfilingConfig::for_large_datasets(),
            ..Default::default()
        }
    }
    pub fn for_exploration() -> Self {
        Self {
            top_k: 30,
            sample_cap: 50_000,
            filter_cardinality_max: 50,
            color_cardinality_max: 60,
            ..Default::default()
        }
    }
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config
            .validate()
            .map_err(|reason| ConfigError::ValidationFailed { reason })?;
        Ok(config)
    }
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
