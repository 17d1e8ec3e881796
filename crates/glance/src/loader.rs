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

use crate::error::{AnalyticsError, DataError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Declared value kind of a column, derived from the polars dtype at load
/// time. The split is total and disjoint: every column is exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }
    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnKind::Categorical)
    }
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
        }
    }
    fn from_dtype(dtype: &DataType) -> Self {
        if matches!(
            dtype,
            DataType::Float64 | DataType::Int64 | DataType::Float32 | DataType::Int32
        ) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column-name → kind mapping computed once per table. Chart
/// requirement checks and column dropdowns read this instead of re-inspecting
/// dtypes per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnMeta>,
}

impl TableSchema {
    fn from_dataframe(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|column| ColumnMeta {
                name: column.name().to_string(),
                kind: ColumnKind::from_dtype(column.dtype()),
            })
            .collect();
        Self { columns }
    }
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.as_str())
            .collect()
    }
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_of_kind(ColumnKind::Numeric)
    }
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns_of_kind(ColumnKind::Categorical)
    }
    pub fn first_of_kind(&self, kind: ColumnKind) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.name.as_str())
    }
}

/// An immutable columnar dataset plus its load-time schema. Shared as
/// `Arc<Table>`; never mutated after construction.
#[derive(Debug)]
pub struct Table {
    df: DataFrame,
    schema: TableSchema,
    source: Option<PathBuf>,
}

impl Table {
    pub fn new(df: DataFrame) -> Self {
        let schema = TableSchema::from_dataframe(&df);
        Self {
            df,
            schema,
            source: None,
        }
    }
    pub fn with_source(df: DataFrame, source: PathBuf) -> Self {
        let mut table = Self::new(df);
        table.source = Some(source);
        table
    }
    pub fn height(&self) -> usize {
        self.df.height()
    }
    pub fn width(&self) -> usize {
        self.df.width()
    }
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .ok()
            .map(|c| c.as_materialized_series())
            .ok_or_else(|| {
                AnalyticsError::ColumnNotFound {
                    column: name.to_string(),
                }
                .into()
            })
    }

    /// First `n` rows rendered as strings, for dataset preview grids.
    pub fn preview(&self, n: usize) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let take = n.min(self.height());
        let headers: Vec<String> = self.schema.columns().iter().map(|c| c.name.clone()).collect();
        let mut by_column: Vec<Vec<String>> = Vec::with_capacity(self.width());
        for meta in self.schema.columns() {
            let series = self.column(&meta.name)?;
            let head = series.head(Some(take));
            let rendered = head
                .cast(&DataType::String)
                .map_err(|e| AnalyticsError::Statistics {
                    column: meta.name.clone(),
                    source: e,
                })?;
            let str_chunked = rendered.str().map_err(|e| AnalyticsError::Statistics {
                column: meta.name.clone(),
                source: e,
            })?;
            by_column.push(
                str_chunked
                    .into_iter()
                    .map(|opt| opt.map_or_else(|| "null".to_string(), String::from))
                    .collect(),
            );
        }
        let rows = (0..take)
            .map(|row| by_column.iter().map(|col| col[row].clone()).collect())
            .collect();
        Ok((headers, rows))
    }
}

/// Loads CSV files into `Table`s, at most once per path. Repeated loads of
/// the same path return the cached `Arc` without touching the filesystem.
#[derive(Debug, Default)]
pub struct DatasetLoader {
    cache: RwLock<HashMap<PathBuf, Arc<Table>>>,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Table>> {
        let path = path.as_ref();
        {
            let cache = self.cache.read().map_err(|_| DataError::Cache {
                reason: "failed to acquire read lock".to_string(),
            })?;
            if let Some(table) = cache.get(path) {
                return Ok(Arc::clone(table));
            }
        }
        if !path.exists() {
            return Err(DataError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let file = File::open(path).map_err(DataError::Io)?;
        let df = CsvReader::new(file).finish().map_err(|e| DataError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        let table = Arc::new(Table::with_source(df, path.to_path_buf()));
        log::debug!(
            "loaded dataset '{}' ({} rows x {} columns)",
            path.display(),
            table.height(),
            table.width()
        );
        let mut cache = self.cache.write().map_err(|_| DataError::Cache {
            reason: "failed to acquire write lock".to_string(),
        })?;
        Ok(Arc::clone(
            cache.entry(path.to_path_buf()).or_insert(table),
        ))
    }

    pub fn evict<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut cache = self.cache.write().map_err(|_| DataError::Cache {
            reason: "failed to acquire write lock".to_string(),
        })?;
        cache.remove(path.as_ref());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let mut cache = self.cache.write().map_err(|_| DataError::Cache {
            reason: "failed to acquire write lock".to_string(),
        })?;
        cache.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_partition_follows_dtype() {
        let df = df!(
            "Age" => [20i64, 30, 40],
            "Billing_Amount" => [120.5f64, 89.0, 240.75],
            "Gender" => ["M", "F", "M"]
        )
        .unwrap();
        let table = Table::new(df);
        assert_eq!(table.schema().numeric_columns(), vec!["Age", "Billing_Amount"]);
        assert_eq!(table.schema().categorical_columns(), vec!["Gender"]);
        assert_eq!(table.schema().kind_of("Gender"), Some(ColumnKind::Categorical));
        assert_eq!(table.schema().kind_of("missing"), None);
    }

    #[test]
    fn preview_renders_nulls() {
        let df = df!(
            "a" => [Some(1i64), None, Some(3)],
            "b" => ["x", "y", "z"]
        )
        .unwrap();
        let table = Table::new(df);
        let (headers, rows) = table.preview(2).unwrap();
        assert_eq!(headers, vec!["a", "b"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "null");
        assert_eq!(rows[0][1], "x");
    }
}
