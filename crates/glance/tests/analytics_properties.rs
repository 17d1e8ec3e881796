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

use glance::{analytics, loader::Table, profile, ColumnKind};
use polars::prelude::*;
use proptest::prelude::*;

fn numeric_frame(values: Vec<f64>, labels: Vec<String>) -> Table {
    let df = df!(
        "value" => values,
        "label" => labels
    )
    .unwrap();
    Table::new(df)
}

proptest! {
    #[test]
    fn partition_is_total_and_disjoint(
        values in prop::collection::vec(-1e6f64..1e6, 1..50),
        labels in prop::collection::vec("[a-e]", 1..50)
    ) {
        let n = values.len().min(labels.len());
        let table = numeric_frame(values[..n].to_vec(), labels[..n].to_vec());
        let schema = table.schema();
        let numeric = schema.numeric_columns();
        let categorical = schema.categorical_columns();
        prop_assert_eq!(numeric.len() + categorical.len(), schema.len());
        for name in &numeric {
            prop_assert!(!categorical.contains(name));
        }
        prop_assert_eq!(schema.kind_of("value"), Some(ColumnKind::Numeric));
        prop_assert_eq!(schema.kind_of("label"), Some(ColumnKind::Categorical));
    }

    #[test]
    fn value_counts_sum_to_row_count(labels in prop::collection::vec("[a-e]", 1..100)) {
        let rows = labels.len();
        let table = Table::new(df!("label" => labels).unwrap());
        let counts = analytics::value_counts(&table, "label", None).unwrap();
        let total: usize = counts.iter().map(|(_, c)| c).sum();
        prop_assert_eq!(total, rows);
        for window in counts.windows(2) {
            prop_assert!(window[0].1 >= window[1].1);
        }
    }

    #[test]
    fn top_n_is_a_prefix_of_full_counts(
        labels in prop::collection::vec("[a-j]", 1..100),
        n in 1usize..5
    ) {
        let table = Table::new(df!("label" => labels).unwrap());
        let full = analytics::value_counts(&table, "label", None).unwrap();
        let top = analytics::value_counts(&table, "label", Some(n)).unwrap();
        prop_assert_eq!(top.len(), full.len().min(n));
        prop_assert_eq!(&top[..], &full[..top.len()]);
    }

    #[test]
    fn correlation_matrix_is_symmetric_and_bounded(
        xs in prop::collection::vec(-1e3f64..1e3, 3..40),
        ys in prop::collection::vec(-1e3f64..1e3, 3..40)
    ) {
        let n = xs.len().min(ys.len());
        let table = Table::new(
            df!(
                "x" => xs[..n].to_vec(),
                "y" => ys[..n].to_vec()
            )
            .unwrap(),
        );
        let matrix = analytics::correlation_matrix(&table, &["x", "y"]).unwrap();
        for i in 0..matrix.len() {
            for j in 0..matrix.len() {
                let r = matrix.get(i, j);
                prop_assert!(r.is_nan() || (-1.0..=1.0).contains(&r));
                let mirrored = matrix.get(j, i);
                prop_assert!(
                    (r.is_nan() && mirrored.is_nan()) || r == mirrored,
                    "matrix not symmetric at ({}, {})", i, j
                );
            }
        }
    }

    #[test]
    fn null_counts_total_matches_overview(
        values in prop::collection::vec(prop::option::of(-1e3f64..1e3), 1..50)
    ) {
        let table = Table::new(df!("value" => values).unwrap());
        let nulls = profile::null_counts(&table);
        let total: usize = nulls.values().sum();
        prop_assert_eq!(total, profile::overview(&table).missing_cells);
    }
}

#[test]
fn mean_of_overall_equals_weighted_group_means() {
    let table = Table::new(
        df!(
            "g" => ["a", "a", "b", "b", "b"],
            "v" => [10.0f64, 20.0, 30.0, 40.0, 50.0]
        )
        .unwrap(),
    );
    let means = analytics::grouped_mean(&table, "g", "v").unwrap();
    assert_eq!(means["a"], 15.0);
    assert_eq!(means["b"], 40.0);
    let weighted = (means["a"] * 2.0 + means["b"] * 3.0) / 5.0;
    assert_eq!(weighted, 30.0);
}
