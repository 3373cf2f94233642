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

use crate::data::Value;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const WILDCARD: &str = "?";
/// Pseudo-attribute standing for "count of rows".
pub const RECORD: &str = "Record";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Nominal,
    Quantitative,
    Ordinal,
    Temporal,
    Id,
    Geographical,
}
impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Nominal => "nominal",
            DataType::Quantitative => "quantitative",
            DataType::Ordinal => "ordinal",
            DataType::Temporal => "temporal",
            DataType::Id => "id",
            DataType::Geographical => "geographical",
        }
    }
    /// Id and geographical attributes count as nominal dimensions.
    pub fn normalized(self) -> Self {
        match self {
            DataType::Id | DataType::Geographical => DataType::Nominal,
            other => other,
        }
    }
    pub fn default_model(self) -> DataModel {
        match self {
            DataType::Quantitative => DataModel::Measure,
            _ => DataModel::Dimension,
        }
    }
}
impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for DataType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nominal" => Ok(DataType::Nominal),
            "quantitative" => Ok(DataType::Quantitative),
            "ordinal" => Ok(DataType::Ordinal),
            "temporal" => Ok(DataType::Temporal),
            "id" => Ok(DataType::Id),
            "geographical" => Ok(DataType::Geographical),
            other => Err(format!("unknown data type '{other}'")),
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataModel {
    Dimension,
    Measure,
}
impl DataModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataModel::Dimension => "dimension",
            DataModel::Measure => "measure",
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    Color,
}
impl Channel {
    pub const ALL: [Channel; 3] = [Channel::X, Channel::Y, Channel::Color];
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Color => "color",
        }
    }
}
impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}
impl FilterOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Gt => ">",
            FilterOp::Le => "<=",
            FilterOp::Ge => ">=",
        }
    }
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(FilterOp::Eq),
            "!=" => Some(FilterOp::Ne),
            "<" => Some(FilterOp::Lt),
            ">" => Some(FilterOp::Gt),
            "<=" => Some(FilterOp::Le),
            ">=" => Some(FilterOp::Ge),
            _ => None,
        }
    }
    /// Operator selecting exactly the rows this one rejects, for inequalities.
    pub fn complement(&self) -> Option<Self> {
        match self {
            FilterOp::Gt => Some(FilterOp::Le),
            FilterOp::Lt => Some(FilterOp::Ge),
            FilterOp::Ge => Some(FilterOp::Lt),
            FilterOp::Le => Some(FilterOp::Gt),
            FilterOp::Eq | FilterOp::Ne => None,
        }
    }
    pub fn matches(&self, cell: &Value, target: &Value) -> bool {
        use std::cmp::Ordering::*;
        match (self, cell.loose_cmp(target)) {
            (FilterOp::Ne, None) => !cell.is_null(),
            (_, None) => false,
            (FilterOp::Eq, Some(ord)) => ord == Equal,
            (FilterOp::Ne, Some(ord)) => ord != Equal,
            (FilterOp::Lt, Some(ord)) => ord == Less,
            (FilterOp::Gt, Some(ord)) => ord == Greater,
            (FilterOp::Le, Some(ord)) => ord != Greater,
            (FilterOp::Ge, Some(ord)) => ord != Less,
        }
    }
}
impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Mean,
    Sum,
    Count,
    Min,
    Max,
    Median,
}
impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Mean => "mean",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Median => "median",
        }
    }
    /// Reduces a group. Empty groups reduce to 0 so zero-filled rows and
    /// fully filtered groups agree.
    pub fn apply(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            AggregateFunction::Mean => values.iter().sum::<f64>() / values.len() as f64,
            AggregateFunction::Sum => values.iter().sum(),
            AggregateFunction::Count => values.len() as f64,
            AggregateFunction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            AggregateFunction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregateFunction::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
        }
    }
}
impl FromStr for AggregateFunction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" | "avg" | "average" => Ok(AggregateFunction::Mean),
            "sum" => Ok(AggregateFunction::Sum),
            "count" => Ok(AggregateFunction::Count),
            "min" => Ok(AggregateFunction::Min),
            "max" => Ok(AggregateFunction::Max),
            "median" => Ok(AggregateFunction::Median),
            other => Err(format!("unknown aggregation '{other}'")),
        }
    }
}
/// `Unset` lets inference pick a default; `Disabled` explicitly suppresses
/// aggregation (scatter plots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Unset,
    Disabled,
    Function(AggregateFunction),
}
impl Aggregation {
    pub fn function(&self) -> Option<AggregateFunction> {
        match self {
            Aggregation::Function(f) => Some(*f),
            _ => None,
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeSpec {
    Wildcard,
    Name(String),
    /// Any one of these attributes; expands to one candidate per entry.
    AnyOf(Vec<String>),
}
impl AttributeSpec {
    pub fn names(&self) -> Vec<&str> {
        match self {
            AttributeSpec::Wildcard => Vec::new(),
            AttributeSpec::Name(name) => vec![name.as_str()],
            AttributeSpec::AnyOf(names) => names.iter().map(String::as_str).collect(),
        }
    }
}
impl fmt::Display for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeSpec::Wildcard => f.write_str(WILDCARD),
            AttributeSpec::Name(name) => f.write_str(name),
            AttributeSpec::AnyOf(names) => f.write_str(&names.join("|")),
        }
    }
}
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTarget {
    Wildcard,
    Value(Value),
    /// Admissible values joined with OR; expands to one filter per value.
    AnyOf(Vec<Value>),
}
impl FilterTarget {
    pub fn values(&self) -> Vec<&Value> {
        match self {
            FilterTarget::Wildcard => Vec::new(),
            FilterTarget::Value(v) => vec![v],
            FilterTarget::AnyOf(values) => values.iter().collect(),
        }
    }
}
impl fmt::Display for FilterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterTarget::Wildcard => f.write_str(WILDCARD),
            FilterTarget::Value(v) => write!(f, "{v}"),
            FilterTarget::AnyOf(values) => {
                let parts: Vec<String> = values.iter().map(Value::to_string).collect();
                f.write_str(&parts.join("|"))
            }
        }
    }
}
impl Serialize for AttributeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeSpec::Wildcard => serializer.serialize_str(WILDCARD),
            AttributeSpec::Name(name) => serializer.serialize_str(name),
            AttributeSpec::AnyOf(names) => names.serialize(serializer),
        }
    }
}
impl Serialize for FilterTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterTarget::Wildcard => serializer.serialize_str(WILDCARD),
            FilterTarget::Value(value) => value.serialize(serializer),
            FilterTarget::AnyOf(values) => values.serialize(serializer),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub op: FilterOp,
    pub target: FilterTarget,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Attribute,
    Filter,
}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    pub attribute: AttributeSpec,
    /// Present exactly when this clause filters rows.
    pub filter: Option<Filter>,
    pub channel: Option<Channel>,
    pub data_type: Option<DataType>,
    pub data_model: Option<DataModel>,
    pub aggregation: Aggregation,
    /// 0 means unset.
    pub bin_size: usize,
    pub sort: Option<SortOrder>,
    pub exclude: Vec<String>,
    pub weight: f64,
}
impl Clause {
    fn with_spec(attribute: AttributeSpec) -> Self {
        Self {
            attribute,
            filter: None,
            channel: None,
            data_type: None,
            data_model: None,
            aggregation: Aggregation::Unset,
            bin_size: 0,
            sort: None,
            exclude: Vec::new(),
            weight: 1.0,
        }
    }
    pub fn attribute(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == WILDCARD {
            Self::wildcard()
        } else {
            Self::with_spec(AttributeSpec::Name(name))
        }
    }
    pub fn wildcard() -> Self {
        Self::with_spec(AttributeSpec::Wildcard)
    }
    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_spec(AttributeSpec::AnyOf(
            names.into_iter().map(Into::into).collect(),
        ))
    }
    pub fn filter(attribute: impl Into<String>, op: FilterOp, target: FilterTarget) -> Self {
        let mut clause = Self::attribute(attribute);
        clause.filter = Some(Filter { op, target });
        clause
    }
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::filter(attribute, FilterOp::Eq, FilterTarget::Value(value.into()))
    }
    /// Synthetic row-count measure.
    pub fn record() -> Self {
        let mut clause = Self::with_spec(AttributeSpec::Name(RECORD.to_string()));
        clause.data_type = Some(DataType::Quantitative);
        clause.data_model = Some(DataModel::Measure);
        clause.aggregation = Aggregation::Function(AggregateFunction::Count);
        clause
    }
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
    pub fn with_data_model(mut self, data_model: DataModel) -> Self {
        self.data_model = Some(data_model);
        self
    }
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }
    pub fn with_bin_size(mut self, bin_size: usize) -> Self {
        self.bin_size = bin_size;
        self
    }
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }
    pub fn kind(&self) -> ClauseKind {
        if self.filter.is_some() {
            ClauseKind::Filter
        } else {
            ClauseKind::Attribute
        }
    }
    pub fn is_filter(&self) -> bool {
        self.kind() == ClauseKind::Filter
    }
    pub fn is_wildcard(&self) -> bool {
        matches!(self.attribute, AttributeSpec::Wildcard)
    }
    /// The single resolved attribute name, if there is one.
    pub fn attribute_name(&self) -> Option<&str> {
        match &self.attribute {
            AttributeSpec::Name(name) => Some(name),
            _ => None,
        }
    }
    pub fn is_record(&self) -> bool {
        self.attribute_name() == Some(RECORD)
    }
    pub fn is_measure(&self) -> bool {
        self.data_model == Some(DataModel::Measure)
    }
    pub fn is_dimension(&self) -> bool {
        self.data_model == Some(DataModel::Dimension)
    }
    /// Copy with a concrete attribute, used when expanding wildcards.
    pub fn resolved(&self, attribute: &str) -> Self {
        let mut clause = self.clone();
        clause.attribute = AttributeSpec::Name(attribute.to_string());
        clause
    }
    /// Copy with a concrete filter value.
    pub fn with_filter_value(&self, value: Value) -> Self {
        let mut clause = self.clone();
        if let Some(filter) = clause.filter.as_mut() {
            filter.target = FilterTarget::Value(value);
        }
        clause
    }
}
impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}{}{}", self.attribute, filter.op, filter.target),
            None => write!(f, "{}", self.attribute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_kinds() {
        assert_eq!(Clause::attribute("Horsepower").kind(), ClauseKind::Attribute);
        assert_eq!(Clause::equals("Origin", "USA").kind(), ClauseKind::Filter);
        assert!(Clause::attribute("?").is_wildcard());
    }

    #[test]
    fn test_filter_display_has_no_spaces() {
        let clause = Clause::filter(
            "Horsepower",
            FilterOp::Gt,
            FilterTarget::Value(Value::Number(150.0)),
        );
        assert_eq!(clause.to_string(), "Horsepower>150");
    }

    #[test]
    fn test_operator_matching() {
        let five = Value::Number(5.0);
        assert!(FilterOp::Le.matches(&five, &Value::Number(5.0)));
        assert!(!FilterOp::Lt.matches(&five, &Value::Number(5.0)));
        assert!(FilterOp::Ne.matches(&Value::from("USA"), &Value::from("Japan")));
        assert!(!FilterOp::Eq.matches(&Value::Null, &Value::Number(5.0)));
        assert_eq!(FilterOp::Gt.complement(), Some(FilterOp::Le));
    }

    #[test]
    fn test_aggregate_functions() {
        let values = [1.0, 4.0, 2.0, 3.0];
        assert_eq!(AggregateFunction::Mean.apply(&values), 2.5);
        assert_eq!(AggregateFunction::Median.apply(&values), 2.5);
        assert_eq!(AggregateFunction::Max.apply(&values), 4.0);
        assert_eq!(AggregateFunction::Sum.apply(&[]), 0.0);
    }
}
