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

#![allow(dead_code)]

use sightline::{AnnotatedDataset, DataType, TableBuilder};

pub const ORIGINS: [&str; 12] = [
    "USA", "USA", "USA", "Japan", "Japan", "Japan", "Europe", "Europe", "Europe", "Japan", "USA",
    "Europe",
];

/// Twelve cars with three measures, one nominal and one temporal column.
pub fn cars() -> AnnotatedDataset {
    TableBuilder::new()
        .typed_column(
            "Horsepower",
            DataType::Quantitative,
            vec![130.0, 165.0, 150.0, 95.0, 97.0, 88.0, 46.0, 87.0, 90.0, 113.0, 200.0, 110.0],
        )
        .typed_column(
            "Weight",
            DataType::Quantitative,
            vec![
                3504.0, 3693.0, 3436.0, 2372.0, 2130.0, 2130.0, 1835.0, 2672.0, 2430.0, 2234.0,
                4000.0, 2800.0,
            ],
        )
        .typed_column(
            "Acceleration",
            DataType::Quantitative,
            vec![12.0, 11.5, 11.0, 15.0, 14.5, 14.0, 20.5, 17.5, 14.5, 12.5, 9.5, 16.0],
        )
        .typed_column("Origin", DataType::Nominal, ORIGINS)
        .typed_column(
            "Year",
            DataType::Temporal,
            vec![
                1970.0, 1970.0, 1971.0, 1971.0, 1972.0, 1972.0, 1973.0, 1973.0, 1974.0, 1974.0,
                1975.0, 1975.0,
            ],
        )
        .build("cars")
        .unwrap()
}
