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

use crate::clause::{Clause, FilterOp, FilterTarget, WILDCARD};
use crate::data::Value;
use once_cell::sync::Lazy;
use regex::Regex;

static OPERATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"<=|>=|!=|=|<|>").unwrap());

/// One element of a caller-supplied intent before canonicalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawClause {
    /// `"Horsepower"`, `"A|B"`, `"Origin=USA"`, `"Horsepower>150"`.
    Text(String),
    /// Explicit attribute list.
    List(Vec<String>),
    Clause(Clause),
}
impl From<&str> for RawClause {
    fn from(s: &str) -> Self {
        RawClause::Text(s.to_string())
    }
}
impl From<String> for RawClause {
    fn from(s: String) -> Self {
        RawClause::Text(s)
    }
}
impl From<Vec<String>> for RawClause {
    fn from(list: Vec<String>) -> Self {
        RawClause::List(list)
    }
}
impl From<Vec<&str>> for RawClause {
    fn from(list: Vec<&str>) -> Self {
        RawClause::List(list.into_iter().map(str::to_string).collect())
    }
}
impl From<Clause> for RawClause {
    fn from(clause: Clause) -> Self {
        RawClause::Clause(clause)
    }
}
/// Canonicalises a raw intent. Never fails; unknown names are left for
/// the validator to report.
pub fn parse(raw_intent: &[RawClause]) -> Vec<Clause> {
    raw_intent.iter().map(parse_one).collect()
}
pub fn parse_one(raw: &RawClause) -> Clause {
    match raw {
        RawClause::Clause(clause) => clause.clone(),
        RawClause::List(names) => attribute_list(names.iter().map(String::as_str)),
        RawClause::Text(text) => parse_text(text),
    }
}
fn parse_text(text: &str) -> Clause {
    if let Some(found) = OPERATOR.find(text) {
        let attribute = text[..found.start()].trim();
        let value = text[found.end()..].trim();
        let op = FilterOp::from_symbol(found.as_str()).unwrap_or(FilterOp::Eq);
        if value.is_empty() {
            return Clause::attribute(attribute);
        }
        let target = if value == WILDCARD {
            FilterTarget::Wildcard
        } else if value.contains('|') {
            FilterTarget::AnyOf(value.split('|').map(|v| Value::coerce(v.trim())).collect())
        } else {
            FilterTarget::Value(Value::coerce(value))
        };
        return Clause::filter(attribute, op, target);
    }
    if text.contains('|') {
        return attribute_list(text.split('|'));
    }
    Clause::attribute(text.trim())
}
fn attribute_list<'a>(names: impl Iterator<Item = &'a str>) -> Clause {
    let names: Vec<&str> = names.map(str::trim).filter(|n| !n.is_empty()).collect();
    match names.as_slice() {
        [single] => Clause::attribute(*single),
        _ => Clause::any_of(names),
    }
}
