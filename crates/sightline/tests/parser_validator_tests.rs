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
use proptest::prelude::*;
use sightline::error::IntentValidationError;
use sightline::{parse, validate, Clause, FilterTarget, RawClause, Value};

fn parsed(raw: &[&str]) -> Vec<Clause> {
    let raw: Vec<RawClause> = raw.iter().map(|s| RawClause::from(*s)).collect();
    parse(&raw)
}

#[test]
fn test_valid_intent_passes() {
    let dataset = cars();
    let intent = parsed(&["Horsepower", "?", "Origin=USA|Japan", "Weight>3000"]);
    assert_eq!(validate(&intent, &dataset), Ok(()));
}

#[test]
fn test_unknown_attribute_is_rejected() {
    let dataset = cars();
    let err = validate(&parsed(&["Horsepwer"]), &dataset).unwrap_err();
    assert_eq!(
        err,
        IntentValidationError::MissingAttribute {
            attribute: "Horsepwer".to_string()
        }
    );
    let err = validate(&parsed(&["Horsepower|Torque"]), &dataset).unwrap_err();
    assert!(matches!(err, IntentValidationError::MissingAttribute { .. }));
}

#[test]
fn test_unknown_filter_value_is_rejected() {
    let dataset = cars();
    let err = validate(&parsed(&["Origin=Mars"]), &dataset).unwrap_err();
    assert_eq!(
        err,
        IntentValidationError::MissingValue {
            attribute: "Origin".to_string(),
            value: "Mars".to_string()
        }
    );
}

#[test]
fn test_exempt_filters_pass() {
    let dataset = cars();
    let intent = parsed(&["Year=1969", "Horsepower>9999", "Origin=?", "Horsepower=130"]);
    assert_eq!(validate(&intent, &dataset), Ok(()));
    assert_eq!(validate(&[Clause::record()], &dataset), Ok(()));
}

#[test]
fn test_filter_attribute_must_be_single() {
    let dataset = cars();
    assert_eq!(
        validate(&parsed(&["?=USA"]), &dataset),
        Err(IntentValidationError::WildcardFilterAttribute)
    );
    let mut ambiguous = Clause::equals("Origin", "USA");
    ambiguous.attribute = Clause::any_of(["Origin", "Year"]).attribute;
    assert!(matches!(
        validate(&[ambiguous], &dataset),
        Err(IntentValidationError::AmbiguousFilterAttribute { .. })
    ));
}

proptest! {
    #[test]
    fn test_parse_accepts_any_text(raw in "\\PC{0,24}") {
        let clauses = parse(&[RawClause::from(raw.as_str())]);
        prop_assert_eq!(clauses.len(), 1);
    }

    #[test]
    fn test_operator_free_text_is_an_attribute(raw in "[A-Za-z][A-Za-z _]{0,12}") {
        let clause = &parse(&[RawClause::from(raw.as_str())])[0];
        prop_assert!(!clause.is_filter());
        prop_assert_eq!(clause.attribute_name(), Some(raw.trim()));
    }

    #[test]
    fn test_filter_text_round_trips(
        attribute in "[A-Za-z]{1,8}",
        op in prop::sample::select(vec!["=", "!=", "<", ">", "<=", ">="]),
        value in "[A-Za-z][A-Za-z0-9]{0,7}",
    ) {
        let clause = &parse(&[RawClause::from(format!("{attribute}{op}{value}"))])[0];
        let filter = clause.filter.as_ref().unwrap();
        prop_assert_eq!(clause.attribute_name(), Some(attribute.as_str()));
        prop_assert_eq!(filter.op.symbol(), op);
        prop_assert_eq!(&filter.target, &FilterTarget::Value(Value::text(value.as_str())));
    }
}
