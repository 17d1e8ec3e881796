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
use polars::prelude::QuantileMethod;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Standard descriptive statistics for one numeric column. `count` is the
/// number of non-missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Dataset-level metrics for the overview page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOverview {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub numeric_count: usize,
    pub categorical_count: usize,
}

impl TableOverview {
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str("Dataset Overview\n================\n");
        report.push_str(&format!("Rows: {}\n", self.rows));
        report.push_str(&format!("Columns: {}\n", self.columns));
        report.push_str(&format!("  - Numeric: {}\n", self.numeric_count));
        report.push_str(&format!("  - Categorical: {}\n", self.categorical_count));
        report.push_str(&format!("Missing Values: {}\n", self.missing_cells));
        report
    }
}

impl std::fmt::Display for TableOverview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows x {} columns ({} numeric, {} categorical), {} missing",
            self.rows, self.columns, self.numeric_count, self.categorical_count, self.missing_cells
        )
    }
}

pub fn overview(table: &Table) -> TableOverview {
    let schema = table.schema();
    let missing_cells = table
        .dataframe()
        .get_columns()
        .iter()
        .map(|c| c.null_count())
        .sum();
    TableOverview {
        rows: table.height(),
        columns: table.width(),
        missing_cells,
        numeric_count: schema.numeric_columns().len(),
        categorical_count: schema.categorical_columns().len(),
    }
}

/// Missing-value count per column, in schema order.
pub fn null_counts(table: &Table) -> IndexMap<String, usize> {
    table
        .dataframe()
        .get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.null_count()))
        .collect()
}

/// Descriptive statistics for the given numeric columns, in the order given.
pub fn summary_statistics(
    table: &Table,
    columns: &[&str],
) -> Result<IndexMap<String, ColumnSummary>> {
    let summaries: Vec<(String, ColumnSummary)> = columns
        .par_iter()
        .map(|name| Ok((name.to_string(), summarize_column(table, name)?)))
        .collect::<Result<_>>()?;
    Ok(summaries.into_iter().collect())
}

fn summarize_column(table: &Table, name: &str) -> Result<ColumnSummary> {
    match table.schema().kind_of(name) {
        None => {
            return Err(AnalyticsError::ColumnNotFound {
                column: name.to_string(),
            }
            .into())
        }
        Some(kind) if !kind.is_numeric() => {
            return Err(AnalyticsError::TypeMismatch {
                column: name.to_string(),
                expected: ColumnKind::Numeric.label().to_string(),
                found: kind.label().to_string(),
            }
            .into())
        }
        Some(_) => {}
    }
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
    let count = ca.len() - ca.null_count();
    if count == 0 {
        return Err(AnalyticsError::EmptyColumn {
            column: name.to_string(),
        }
        .into());
    }
    Ok(ColumnSummary {
        count,
        mean: ca.mean(),
        std: ca.std(1),
        min: ca.min(),
        q25: ca.quantile(0.25, QuantileMethod::Linear).ok().flatten(),
        median: ca.median(),
        q75: ca.quantile(0.75, QuantileMethod::Linear).ok().flatten(),
        max: ca.max(),
    })
}

pub fn export_overview_json(overview: &TableOverview) -> Result<String> {
    Ok(serde_json::to_string_pretty(overview)?)
}

pub fn export_summaries_json(summaries: &IndexMap<String, ColumnSummary>) -> Result<String> {
    Ok(serde_json::to_string_pretty(summaries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GlanceError;

    fn age_table() -> Table {
        Table::new(
            df!(
                "Age" => [20i64, 30, 40, 50, 60],
                "Gender" => ["M", "F", "M", "F", "M"]
            )
            .unwrap(),
        )
    }

    #[test]
    fn summary_matches_known_values() {
        let table = age_table();
        let summaries = summary_statistics(&table, &["Age"]).unwrap();
        let age = &summaries["Age"];
        assert_eq!(age.count, 5);
        assert_eq!(age.mean, Some(40.0));
        assert_eq!(age.min, Some(20.0));
        assert_eq!(age.max, Some(60.0));
        assert_eq!(age.median, Some(40.0));
    }

    #[test]
    fn summary_rejects_categorical_column() {
        let table = age_table();
        let err = summary_statistics(&table, &["Gender"]).unwrap_err();
        assert!(matches!(
            err,
            GlanceError::Analytics(AnalyticsError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn summary_rejects_all_null_column() {
        let table = Table::new(df!("empty" => [None::<f64>, None, None]).unwrap());
        let err = summary_statistics(&table, &["empty"]).unwrap_err();
        assert!(matches!(
            err,
            GlanceError::Analytics(AnalyticsError::EmptyColumn { .. })
        ));
    }

    #[test]
    fn overview_counts_missing_cells() {
        let table = Table::new(
            df!(
                "a" => [Some(1i64), None, Some(3)],
                "b" => [None::<&str>, Some("x"), None]
            )
            .unwrap(),
        );
        let ov = overview(&table);
        assert_eq!(ov.rows, 3);
        assert_eq!(ov.columns, 2);
        assert_eq!(ov.missing_cells, 3);
        assert_eq!(ov.numeric_count, 1);
        assert_eq!(ov.categorical_count, 1);
    }
}
