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

//! Exploratory data analysis over tabular CSV datasets.
//!
//! The crate loads a CSV into an immutable [`Table`], partitions its columns
//! into numeric and categorical kinds at load time, and exposes descriptive
//! statistics, frequency analysis and correlation over that partition. A
//! declarative [`ChartCatalog`] maps chart kinds to the column kinds they
//! need; charts whose requirements the dataset cannot meet degrade to
//! warnings instead of failing the session.
//!
//! [`Explorer`] ties the pieces together for interactive front ends:
//!
//! ```no_run
//! use glance::{ChartKind, ChartRequest, Explorer};
//!
//! fn main() -> glance::Result<()> {
//!     let explorer = Explorer::open("healthcare_dataset.csv")?;
//!     println!("{}", explorer.overview().report());
//!     let outcome = explorer.render(&ChartRequest::new(ChartKind::Histogram))?;
//!     if let Some(warning) = outcome.warning() {
//!         println!("chart unavailable: {warning}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod catalog;
pub mod error;
pub mod loader;
pub mod profile;
pub mod render;

pub use analytics::{AnalyticsConfig, CorrelationMatrix};
pub use catalog::{ChartCatalog, ChartKind, ChartSpec, ColumnRequirement};
pub use error::{
    AnalyticsError, CatalogError, DataError, ErrorReporter, ErrorSeverity, GlanceError, Result,
};
pub use loader::{ColumnKind, ColumnMeta, DatasetLoader, Table, TableSchema};
pub use profile::{ColumnSummary, TableOverview};
pub use render::{
    AxisLabels, BoxSummary, ChartData, ChartOutcome, ChartRequest, HistogramBin, RenderedChart,
};

use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// One loaded dataset plus the catalog and tunables needed to explore it.
/// Front ends hold one `Explorer` per open dataset; there is no process-wide
/// state.
pub struct Explorer {
    table: Arc<Table>,
    catalog: ChartCatalog,
    config: AnalyticsConfig,
}

impl Explorer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let loader = DatasetLoader::new();
        Ok(Self::from_table(loader.load(path)?))
    }

    pub fn from_table(table: Arc<Table>) -> Self {
        Self {
            table,
            catalog: ChartCatalog::builtin(),
            config: AnalyticsConfig::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: ChartCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ChartCatalog {
        &self.catalog
    }

    pub fn overview(&self) -> TableOverview {
        profile::overview(&self.table)
    }

    pub fn null_counts(&self) -> IndexMap<String, usize> {
        profile::null_counts(&self.table)
    }

    /// Descriptive statistics for every numeric column.
    pub fn summary_statistics(&self) -> Result<IndexMap<String, ColumnSummary>> {
        let numeric = self.table.schema().numeric_columns();
        profile::summary_statistics(&self.table, &numeric)
    }

    pub fn value_counts(&self, column: &str) -> Result<Vec<(String, usize)>> {
        analytics::value_counts(&self.table, column, None)
    }

    pub fn top_values(&self, column: &str) -> Result<Vec<(String, usize)>> {
        analytics::value_counts(&self.table, column, Some(self.config.top_n))
    }

    /// Pearson correlation across every numeric column.
    pub fn correlation_matrix(&self) -> Result<CorrelationMatrix> {
        let numeric = self.table.schema().numeric_columns();
        analytics::correlation_matrix(&self.table, &numeric)
    }

    pub fn grouped_mean(&self, group: &str, value: &str) -> Result<IndexMap<String, f64>> {
        analytics::grouped_mean(&self.table, group, value)
    }

    pub fn render(&self, request: &ChartRequest) -> Result<ChartOutcome> {
        render::render(&self.table, &self.catalog, &self.config, request)
    }

    /// Chart specs the current dataset can satisfy, in catalog order.
    pub fn available_charts(&self) -> Vec<&ChartSpec> {
        self.catalog.available(self.table.schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn explorer_surfaces_available_charts() {
        let table = Table::new(
            df!(
                "Age" => [20i64, 30, 40],
                "Gender" => ["M", "F", "M"]
            )
            .unwrap(),
        );
        let explorer = Explorer::from_table(Arc::new(table));
        let kinds: Vec<ChartKind> = explorer
            .available_charts()
            .iter()
            .map(|s| s.kind)
            .collect();
        assert!(kinds.contains(&ChartKind::Histogram));
        assert!(kinds.contains(&ChartKind::GroupedBar));
        // one numeric column cannot satisfy scatter or the heatmap
        assert!(!kinds.contains(&ChartKind::Scatter));
        assert!(!kinds.contains(&ChartKind::CorrelationHeatmap));
    }

    #[test]
    fn explorer_summary_covers_numeric_columns_only() {
        let table = Table::new(
            df!(
                "Age" => [20i64, 30, 40],
                "Billing" => [10.0f64, 20.0, 30.0],
                "Gender" => ["M", "F", "M"]
            )
            .unwrap(),
        );
        let explorer = Explorer::from_table(Arc::new(table));
        let summaries = explorer.summary_statistics().unwrap();
        let keys: Vec<&String> = summaries.keys().collect();
        assert_eq!(keys, vec!["Age", "Billing"]);
    }
}
