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

use crate::error::{AnalyticsError, Result};
use crate::loader::{ColumnKind, Table};
use indexmap::IndexMap;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub histogram_bins: usize,
    pub top_n: usize,
    pub max_preview_rows: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 30,
            top_n: 10,
            max_preview_rows: 5,
        }
    }
}

impl AnalyticsConfig {
    pub fn for_small_datasets() -> Self {
        Self {
            histogram_bins: 20,
            ..Default::default()
        }
    }
    pub fn for_detail() -> Self {
        Self {
            histogram_bins: 40,
            max_preview_rows: 20,
            ..Default::default()
        }
    }
}

/// Occurrence count per distinct value, in first-seen order.
pub fn count_values(table: &Table, column: &str) -> Result<IndexMap<String, usize>> {
    let series = table.column(column)?;
    let as_str = series
        .cast(&DataType::String)
        .map_err(|e| AnalyticsError::Statistics {
            column: column.to_string(),
            source: e,
        })?;
    let ca = as_str.str().map_err(|e| AnalyticsError::Statistics {
        column: column.to_string(),
        source: e,
    })?;
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Occurrence counts descending, ties broken by first appearance in the
/// data. Truncated to `top_n` entries when given.
pub fn value_counts(
    table: &Table,
    column: &str,
    top_n: Option<usize>,
) -> Result<Vec<(String, usize)>> {
    let mut pairs: Vec<(String, usize)> = count_values(table, column)?.into_iter().collect();
    // Stable sort keeps first-seen order among equal counts.
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(n) = top_n {
        pairs.truncate(n);
    }
    Ok(pairs)
}

/// Pairwise Pearson correlation over the given numeric columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub fn correlation_matrix(table: &Table, columns: &[&str]) -> Result<CorrelationMatrix> {
    if columns.len() < 2 {
        return Err(AnalyticsError::InsufficientColumns {
            needed: 2,
            available: columns.len(),
        }
        .into());
    }
    let mut data: Vec<Vec<Option<f64>>> = Vec::with_capacity(columns.len());
    for name in columns {
        data.push(numeric_series(table, name)?);
    }
    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for (i, row) in data.iter().enumerate() {
        values[i][i] = if column_variance(row) > 0.0 { 1.0 } else { f64::NAN };
        for j in (i + 1)..n {
            let r = pearson(row, &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

fn column_variance(values: &[Option<f64>]) -> f64 {
    let present: Vec<f64> = values.iter().copied().flatten().collect();
    if present.len() < 2 {
        return 0.0;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    present.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
}

fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

/// Mean of `value_column` per distinct `group_column` value, first-seen group
/// order, rows with a missing value on either side skipped.
pub fn grouped_mean(
    table: &Table,
    group_column: &str,
    value_column: &str,
) -> Result<IndexMap<String, f64>> {
    match table.schema().kind_of(value_column) {
        None => {
            return Err(AnalyticsError::ColumnNotFound {
                column: value_column.to_string(),
            }
            .into())
        }
        Some(kind) if !kind.is_numeric() => {
            return Err(AnalyticsError::TypeMismatch {
                column: value_column.to_string(),
                expected: ColumnKind::Numeric.label().to_string(),
                found: kind.label().to_string(),
            }
            .into())
        }
        Some(_) => {}
    }
    let groups = table.column(group_column)?;
    let groups_str = groups
        .cast(&DataType::String)
        .map_err(|e| AnalyticsError::Statistics {
            column: group_column.to_string(),
            source: e,
        })?;
    let groups_ca = groups_str.str().map_err(|e| AnalyticsError::Statistics {
        column: group_column.to_string(),
        source: e,
    })?;
    let values = numeric_series(table, value_column)?;

    let mut sums: IndexMap<String, (f64, usize)> = IndexMap::new();
    for (group, value) in groups_ca.into_iter().zip(values) {
        let (Some(group), Some(value)) = (group, value) else {
            continue;
        };
        let entry = sums.entry(group.to_string()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    Ok(sums
        .into_iter()
        .map(|(group, (sum, count))| (group, sum / count as f64))
        .collect())
}

/// Column values as `Option<f64>` in row order, preserving nulls so callers
/// can pair rows across columns.
pub(crate) fn numeric_series(table: &Table, name: &str) -> Result<Vec<Option<f64>>> {
    let series = table.column(name)?;
    let as_float = series
        .cast(&DataType::Float64)
        .map_err(|e| AnalyticsError::Statistics {
            column: name.to_string(),
            source: e,
        })?;
    let ca = as_float.f64().map_err(|e| AnalyticsError::Statistics {
        column: name.to_string(),
        source: e,
    })?;
    Ok(ca.into_iter().collect())
}

/// Non-null column values in row order.
pub(crate) fn numeric_values(table: &Table, name: &str) -> Result<Vec<f64>> {
    Ok(numeric_series(table, name)?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlanceError;

    #[test]
    fn value_counts_descending_with_first_seen_ties() {
        let table = Table::new(
            df!("cond" => ["Flu", "Asthma", "Flu", "Diabetes", "Asthma", "Flu"]).unwrap(),
        );
        let counts = value_counts(&table, "cond", None).unwrap();
        assert_eq!(
            counts,
            vec![
                ("Flu".to_string(), 3),
                ("Asthma".to_string(), 2),
                ("Diabetes".to_string(), 1)
            ]
        );
    }

    #[test]
    fn value_counts_truncates_to_top_n() {
        let table = Table::new(df!("c" => ["a", "b", "c", "a", "b", "a"]).unwrap());
        let counts = value_counts(&table, "c", Some(2)).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0], ("a".to_string(), 3));
    }

    #[test]
    fn count_values_keeps_natural_order() {
        let table = Table::new(df!("c" => ["b", "a", "b", "c"]).unwrap());
        let counts = count_values(&table, "c").unwrap();
        let keys: Vec<&String> = counts.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn correlation_of_scaled_column_is_exactly_one() {
        let table = Table::new(
            df!(
                "a" => [20.0f64, 30.0, 40.0, 50.0, 60.0],
                "b" => [40.0f64, 60.0, 80.0, 100.0, 120.0]
            )
            .unwrap(),
        );
        let matrix = correlation_matrix(&table, &["a", "b"]).unwrap();
        assert_eq!(matrix.get(0, 1), 1.0);
        assert_eq!(matrix.get(1, 0), 1.0);
        assert_eq!(matrix.get(0, 0), 1.0);
    }

    #[test]
    fn correlation_zero_variance_yields_nan() {
        let table = Table::new(
            df!(
                "a" => [1.0f64, 2.0, 3.0],
                "b" => [5.0f64, 5.0, 5.0]
            )
            .unwrap(),
        );
        let matrix = correlation_matrix(&table, &["a", "b"]).unwrap();
        assert!(matrix.get(0, 1).is_nan());
        assert!(matrix.get(1, 1).is_nan());
        assert_eq!(matrix.get(0, 0), 1.0);
    }

    #[test]
    fn correlation_requires_two_columns() {
        let table = Table::new(df!("a" => [1.0f64, 2.0]).unwrap());
        let err = correlation_matrix(&table, &["a"]).unwrap_err();
        assert!(matches!(
            err,
            GlanceError::Analytics(AnalyticsError::InsufficientColumns { .. })
        ));
    }

    #[test]
    fn grouped_mean_skips_missing_and_keeps_group_order() {
        let table = Table::new(
            df!(
                "g" => ["x", "y", "x", "y", "x"],
                "v" => [Some(10.0f64), Some(20.0), None, Some(40.0), Some(30.0)]
            )
            .unwrap(),
        );
        let means = grouped_mean(&table, "g", "v").unwrap();
        let entries: Vec<(&String, &f64)> = means.iter().collect();
        assert_eq!(entries[0], (&"x".to_string(), &20.0));
        assert_eq!(entries[1], (&"y".to_string(), &30.0));
    }

    #[test]
    fn grouped_mean_rejects_categorical_values() {
        let table = Table::new(
            df!(
                "g" => ["x", "y"],
                "v" => ["a", "b"]
            )
            .unwrap(),
        );
        let err = grouped_mean(&table, "g", "v").unwrap_err();
        assert!(matches!(
            err,
            GlanceError::Analytics(AnalyticsError::TypeMismatch { .. })
        ));
    }
}
