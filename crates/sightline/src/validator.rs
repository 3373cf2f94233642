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

use crate::clause::{AttributeSpec, Clause, DataType, FilterOp, FilterTarget, RECORD};
use crate::data::MetadataProvider;
use crate::error::IntentValidationError;

/// Checks that every clause refers to real columns, and that equality
/// filters refer to values the column actually holds. Temporal filter values
/// are exempt because they may be written at a coarser granularity.
pub fn validate<M: MetadataProvider + ?Sized>(
    intent: &[Clause],
    metadata: &M,
) -> Result<(), IntentValidationError> {
    for clause in intent {
        validate_clause(clause, metadata)?;
    }
    Ok(())
}
fn validate_clause<M: MetadataProvider + ?Sized>(
    clause: &Clause,
    metadata: &M,
) -> Result<(), IntentValidationError> {
    let Some(filter) = &clause.filter else {
        for name in clause.attribute.names() {
            check_attribute(name, metadata)?;
        }
        return Ok(());
    };
    let attribute = match &clause.attribute {
        AttributeSpec::Name(name) => name,
        AttributeSpec::Wildcard => return Err(IntentValidationError::WildcardFilterAttribute),
        AttributeSpec::AnyOf(names) => {
            return Err(IntentValidationError::AmbiguousFilterAttribute {
                attribute: names.join("|"),
            })
        }
    };
    check_attribute(attribute, metadata)?;
    if filter.op != FilterOp::Eq || matches!(filter.target, FilterTarget::Wildcard) {
        return Ok(());
    }
    let temporal = clause.data_type == Some(DataType::Temporal)
        || metadata.data_type(attribute) == Some(DataType::Temporal);
    if temporal || attribute == RECORD {
        return Ok(());
    }
    let known = metadata.unique_values(attribute);
    for value in filter.target.values() {
        if !known.iter().any(|k| k.loose_eq(value)) {
            return Err(IntentValidationError::MissingValue {
                attribute: attribute.clone(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}
fn check_attribute<M: MetadataProvider + ?Sized>(
    name: &str,
    metadata: &M,
) -> Result<(), IntentValidationError> {
    if name == RECORD || metadata.contains(name) {
        Ok(())
    } else {
        Err(IntentValidationError::MissingAttribute {
            attribute: name.to_string(),
        })
    }
}
