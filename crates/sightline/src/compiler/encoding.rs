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

use crate::clause::{AggregateFunction, Aggregation, Channel, Clause, DataType, SortOrder};
use crate::data::MetadataProvider;
use crate::error::ChannelConflictError;
use crate::vis::{Mark, Visualization};

/// Bars with more categories than this are sorted so they stay legible.
const SORT_CARDINALITY: usize = 5;

type ChannelPlan = Vec<(Channel, Clause)>;

/// Chooses a mark and channel bindings from the chart's shape, then applies
/// any channels the caller fixed explicitly. Shapes without a rule are left
/// unencoded.
pub fn infer_encoding<M: MetadataProvider + ?Sized>(
    vis: &mut Visualization,
    metadata: &M,
    default_bin_size: usize,
) -> Result<(), ChannelConflictError> {
    let attributes: Vec<Clause> = vis.attributes().cloned().collect();
    check_explicit_channels(&attributes)?;
    let dims: Vec<Clause> = attributes.iter().filter(|c| c.is_dimension()).cloned().collect();
    let measures: Vec<Clause> = attributes
        .iter()
        .filter(|c| c.is_measure() && !c.is_record())
        .cloned()
        .collect();
    let record = attributes.iter().find(|c| c.is_record()).cloned();
    let count = || record.clone().unwrap_or_else(Clause::record);
    let plan = match (dims.as_slice(), measures.as_slice()) {
        ([], [measure]) => {
            let mut measure = measure.clone();
            if measure.bin_size == 0 {
                measure.bin_size = default_bin_size;
            }
            Some((Mark::Histogram, vec![(Channel::X, measure), (Channel::Y, count())]))
        }
        ([dimension], rest) if rest.len() <= 1 => {
            let measure = rest.first().cloned().unwrap_or_else(count);
            Some(line_or_bar(dimension.clone(), measure, metadata))
        }
        ([d1, d2], rest) if rest.len() <= 1 => {
            let (dimension, color) = if metadata.cardinality(attribute_of(d1))
                < metadata.cardinality(attribute_of(d2))
            {
                (d2.clone(), d1.clone())
            } else {
                (d1.clone(), d2.clone())
            };
            let measure = rest.first().cloned().unwrap_or_else(count);
            let (mark, mut channels) = line_or_bar(dimension, measure, metadata);
            channels.push((Channel::Color, color));
            Some((mark, channels))
        }
        ([], [m1, m2]) => Some((
            Mark::Scatter,
            vec![(Channel::X, unaggregated(m1)), (Channel::Y, unaggregated(m2))],
        )),
        ([dimension], [m1, m2]) => Some((
            Mark::Scatter,
            vec![
                (Channel::X, unaggregated(m1)),
                (Channel::Y, unaggregated(m2)),
                (Channel::Color, dimension.clone()),
            ],
        )),
        ([], [m1, m2, m3]) => Some((
            Mark::Scatter,
            vec![
                (Channel::X, unaggregated(m1)),
                (Channel::Y, unaggregated(m2)),
                (Channel::Color, unaggregated(m3)),
            ],
        )),
        _ => None,
    };
    let Some((mark, plan)) = plan else {
        return Ok(());
    };
    let mut encoded = enforce_channels(plan)?;
    encoded.extend(vis.filter_clauses());
    vis.intent = encoded;
    vis.mark = Some(mark);
    vis.refresh_min_max(metadata);
    Ok(())
}
fn attribute_of(clause: &Clause) -> &str {
    clause.attribute_name().unwrap_or_default()
}
fn unaggregated(clause: &Clause) -> Clause {
    clause.clone().with_aggregation(Aggregation::Disabled)
}
fn line_or_bar<M: MetadataProvider + ?Sized>(
    mut dimension: Clause,
    mut measure: Clause,
    metadata: &M,
) -> (Mark, ChannelPlan) {
    if measure.aggregation == Aggregation::Unset {
        measure.aggregation = Aggregation::Function(AggregateFunction::Mean);
    }
    match dimension.data_type {
        Some(DataType::Temporal) | Some(DataType::Ordinal) => (
            Mark::Line,
            vec![(Channel::X, dimension), (Channel::Y, measure)],
        ),
        _ => {
            if dimension.sort.is_none()
                && metadata.cardinality(attribute_of(&dimension)) > SORT_CARDINALITY
            {
                dimension.sort = Some(SortOrder::Ascending);
            }
            (Mark::Bar, vec![(Channel::X, measure), (Channel::Y, dimension)])
        }
    }
}
fn check_explicit_channels(attributes: &[Clause]) -> Result<(), ChannelConflictError> {
    for (i, first) in attributes.iter().enumerate() {
        let Some(channel) = first.channel else {
            continue;
        };
        if let Some(second) = attributes[i + 1..]
            .iter()
            .find(|c| c.channel == Some(channel))
        {
            return Err(conflict(channel, first, second));
        }
    }
    Ok(())
}
fn conflict(channel: Channel, first: &Clause, second: &Clause) -> ChannelConflictError {
    ChannelConflictError {
        channel: channel.to_string(),
        first: first.attribute.to_string(),
        second: second.attribute.to_string(),
    }
}
/// Explicit channels win their slot; the remaining planned clauses fill the
/// free slots in plan order.
pub fn enforce_channels(plan: ChannelPlan) -> Result<Vec<Clause>, ChannelConflictError> {
    let channels: Vec<Channel> = plan.iter().map(|(channel, _)| *channel).collect();
    let mut assigned: Vec<Option<Clause>> = vec![None; channels.len()];
    let mut leftovers = Vec::new();
    for (_, clause) in plan {
        let slot = clause
            .channel
            .and_then(|explicit| channels.iter().position(|c| *c == explicit));
        match slot {
            Some(slot) => {
                if let Some(existing) = &assigned[slot] {
                    return Err(conflict(channels[slot], existing, &clause));
                }
                assigned[slot] = Some(clause);
            }
            None => leftovers.push(clause),
        }
    }
    let mut leftovers = leftovers.into_iter();
    let mut encoded = Vec::with_capacity(channels.len());
    for (slot, channel) in channels.iter().enumerate() {
        let clause = match assigned[slot].take() {
            Some(clause) => clause,
            None => match leftovers.next() {
                Some(clause) => clause,
                None => continue,
            },
        };
        encoded.push(clause.with_channel(*channel));
    }
    Ok(encoded)
}
