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

use crate::clause::{Aggregation, Channel, Clause, DataModel};
use crate::data::{MetadataProvider, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

pub const COUNT_COLUMN: &str = "Number of Records";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bar,
    Line,
    Scatter,
    Histogram,
}
impl Mark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Bar => "bar",
            Mark::Line => "line",
            Mark::Scatter => "scatter",
            Mark::Histogram => "histogram",
        }
    }
}
impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
/// One candidate chart. Starts as resolved clauses only; encoding sets the
/// mark and channels, execution fills `data`, scoring sets `score`.
#[derive(Debug, Clone, Serialize)]
pub struct Visualization {
    pub intent: Vec<Clause>,
    pub mark: Option<Mark>,
    pub title: String,
    #[serde(skip)]
    pub data: Option<Table>,
    /// -1 marks a chart excluded from ranking.
    pub score: f64,
    pub min_max: IndexMap<String, (f64, f64)>,
}
impl Visualization {
    pub fn new(intent: Vec<Clause>) -> Self {
        Self {
            intent,
            mark: None,
            title: String::new(),
            data: None,
            score: 0.0,
            min_max: IndexMap::new(),
        }
    }
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.mark = Some(mark);
        self
    }
    /// Plotted clauses, filters excluded.
    pub fn attributes(&self) -> impl Iterator<Item = &Clause> {
        self.intent.iter().filter(|c| !c.is_filter())
    }
    pub fn filters(&self) -> Vec<&Clause> {
        self.intent.iter().filter(|c| c.is_filter()).collect()
    }
    pub fn filter_clauses(&self) -> Vec<Clause> {
        self.filters().into_iter().cloned().collect()
    }
    pub fn get_by_channel(&self, channel: Channel) -> Option<&Clause> {
        self.attributes().find(|c| c.channel == Some(channel))
    }
    pub fn get_by_attribute(&self, attribute: &str) -> Vec<&Clause> {
        self.intent
            .iter()
            .filter(|c| c.attribute_name() == Some(attribute))
            .collect()
    }
    pub fn get_by_data_model(&self, data_model: DataModel) -> Vec<&Clause> {
        self.attributes()
            .filter(|c| c.data_model == Some(data_model))
            .collect()
    }
    pub fn dimensions(&self) -> Vec<&Clause> {
        self.get_by_data_model(DataModel::Dimension)
    }
    /// Measures, the synthetic row count excluded.
    pub fn measures(&self) -> Vec<&Clause> {
        self.attributes()
            .filter(|c| c.is_measure() && !c.is_record())
            .collect()
    }
    pub fn n_dim(&self) -> usize {
        self.dimensions().len()
    }
    pub fn n_msr(&self) -> usize {
        self.measures().len()
    }
    pub fn n_filter(&self) -> usize {
        self.filters().len()
    }
    pub fn is_encoded(&self) -> bool {
        self.mark.is_some()
    }
    pub fn is_valid(&self) -> bool {
        self.score != -1.0
    }
    /// Same resolved clauses drawn with the same mark.
    pub fn same_chart(&self, other: &Visualization) -> bool {
        self.mark == other.mark && self.intent == other.intent
    }
    /// Copies min/max for every plotted measure from the metadata snapshot.
    pub fn refresh_min_max<M: MetadataProvider + ?Sized>(&mut self, metadata: &M) {
        self.min_max = self
            .attributes()
            .filter(|c| !c.is_record())
            .filter_map(|c| c.attribute_name())
            .filter_map(|name| metadata.min_max(name).map(|range| (name.to_string(), range)))
            .collect();
    }
    /// Renderer-neutral description of the chart.
    pub fn to_spec(&self) -> serde_json::Value {
        let mut encoding = serde_json::Map::new();
        for channel in Channel::ALL {
            let Some(clause) = self.get_by_channel(channel) else {
                continue;
            };
            let aggregation = match clause.aggregation {
                Aggregation::Function(f) => json!(f.as_str()),
                _ => serde_json::Value::Null,
            };
            encoding.insert(
                channel.as_str().to_string(),
                json!({
                    "attribute": clause.attribute.to_string(),
                    "data_type": clause.data_type,
                    "aggregation": aggregation,
                    "bin_size": (clause.bin_size > 0).then_some(clause.bin_size),
                    "sort": clause.sort,
                }),
            );
        }
        let filters: Vec<String> = self.filters().iter().map(|c| c.to_string()).collect();
        json!({
            "mark": self.mark,
            "title": self.title,
            "score": self.score,
            "encoding": encoding,
            "filters": filters,
            "min_max": self.min_max,
            "data": self.data,
        })
    }
}
impl fmt::Display for Visualization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels: Vec<String> = self
            .attributes()
            .map(|c| match c.channel {
                Some(channel) => format!("{channel}: {}", c.attribute),
                None => c.attribute.to_string(),
            })
            .collect();
        write!(f, "<Vis ({})", channels.join(", "))?;
        let filters = self.filters();
        if !filters.is_empty() {
            let filters: Vec<String> = filters.iter().map(|c| c.to_string()).collect();
            write!(f, " -- [{}]", filters.join(", "))?;
        }
        match self.mark {
            Some(mark) => write!(f, " mark: {mark}, score: {:.4}>", self.score),
            None => write!(f, " mark: -, score: {:.4}>", self.score),
        }
    }
}
