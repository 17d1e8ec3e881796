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

use crate::analytics::{
    self, correlation_matrix, grouped_mean, value_counts, AnalyticsConfig, CorrelationMatrix,
};
use crate::catalog::{ChartCatalog, ChartKind};
use crate::error::{AnalyticsError, CatalogError, GlanceError, Result};
use crate::loader::{ColumnKind, Table};
use serde::{Deserialize, Serialize};

/// What the caller wants drawn. Column choices are optional; unset roles
/// fall back to the first column of the required kind in schema order.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl ChartRequest {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            primary: None,
            secondary: None,
        }
    }
    pub fn with_primary(mut self, column: &str) -> Self {
        self.primary = Some(column.to_string());
        self
    }
    pub fn with_secondary(mut self, column: &str) -> Self {
        self.secondary = Some(column.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
}

/// Chart geometry ready for a drawing surface, no rendering backend implied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChartData {
    Histogram {
        bins: Vec<HistogramBin>,
    },
    Bar {
        categories: Vec<(String, f64)>,
    },
    HorizontalBar {
        categories: Vec<(String, f64)>,
    },
    Box {
        summary: BoxSummary,
    },
    Scatter {
        points: Vec<(f64, f64)>,
    },
    Heatmap {
        matrix: CorrelationMatrix,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub title: String,
    pub axes: AxisLabels,
    pub data: ChartData,
}

/// A chart either renders or degrades to a warning. Dataset shape never
/// aborts the session.
#[derive(Debug, Clone)]
pub enum ChartOutcome {
    Rendered(RenderedChart),
    Unavailable(String),
}

impl ChartOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, ChartOutcome::Rendered(_))
    }
    pub fn warning(&self) -> Option<&str> {
        match self {
            ChartOutcome::Unavailable(message) => Some(message),
            ChartOutcome::Rendered(_) => None,
        }
    }
}

/// Renders `request` against `table`, degrading unmet preconditions to
/// `ChartOutcome::Unavailable`. Internal failures still propagate as errors.
pub fn render(
    table: &Table,
    catalog: &ChartCatalog,
    config: &AnalyticsConfig,
    request: &ChartRequest,
) -> Result<ChartOutcome> {
    let kind = request.kind;
    let spec = catalog.get(kind).ok_or_else(|| CatalogError::UnknownKind {
        name: kind.label().to_string(),
    })?;
    if let Some(warning) = spec.unmet_requirement(table.schema()) {
        log::warn!("chart unavailable: {warning}");
        return Ok(ChartOutcome::Unavailable(warning));
    }
    let result = match kind {
        ChartKind::Histogram => render_histogram(table, config, request),
        ChartKind::CategoricalBar => render_categorical_bar(table, request),
        ChartKind::TopNBar => render_top_n_bar(table, config, request),
        ChartKind::BoxPlot => render_box_plot(table, request),
        ChartKind::Scatter => render_scatter(table, request),
        ChartKind::GroupedBar => render_grouped_bar(table, request),
        ChartKind::CorrelationHeatmap => render_heatmap(table),
    };
    match result {
        Ok(chart) => Ok(ChartOutcome::Rendered(chart)),
        Err(GlanceError::Analytics(e)) if e.is_recoverable() => {
            let warning = e.to_string();
            log::warn!("chart degraded to warning: {warning}");
            Ok(ChartOutcome::Unavailable(warning))
        }
        Err(e) => Err(e),
    }
}

/// Column for a role: the explicit request if set, otherwise the first
/// schema column of the required kind. Columns are interchangeable within
/// a kind; nothing is keyed to a hard-coded name.
fn resolve_column(
    table: &Table,
    requested: Option<&str>,
    kind: ColumnKind,
    exclude: Option<&str>,
) -> Result<String> {
    if let Some(name) = requested {
        return match table.schema().kind_of(name) {
            Some(found) if found == kind => Ok(name.to_string()),
            Some(found) => Err(AnalyticsError::TypeMismatch {
                column: name.to_string(),
                expected: kind.label().to_string(),
                found: found.label().to_string(),
            }
            .into()),
            None => Err(AnalyticsError::ColumnNotFound {
                column: name.to_string(),
            }
            .into()),
        };
    }
    table
        .schema()
        .columns_of_kind(kind)
        .into_iter()
        .find(|name| Some(*name) != exclude)
        .map(String::from)
        .ok_or_else(|| {
            AnalyticsError::InsufficientColumns {
                needed: 1,
                available: 0,
            }
            .into()
        })
}

fn render_histogram(
    table: &Table,
    config: &AnalyticsConfig,
    request: &ChartRequest,
) -> Result<RenderedChart> {
    let column = resolve_column(table, request.primary.as_deref(), ColumnKind::Numeric, None)?;
    let values = analytics::numeric_values(table, &column)?;
    if values.is_empty() {
        return Err(AnalyticsError::EmptyColumn { column }.into());
    }
    let bins = bin_values(&values, config.histogram_bins);
    Ok(RenderedChart {
        kind: ChartKind::Histogram,
        title: format!("Distribution of {column}"),
        axes: AxisLabels {
            x: column,
            y: "Count".to_string(),
        },
        data: ChartData::Histogram { bins },
    })
}

fn bin_values(values: &[f64], bin_count: usize) -> Vec<HistogramBin> {
    let bin_count = bin_count.max(1);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        // Degenerate constant column: one bin holding everything.
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }
    let width = (max - min) / bin_count as f64;
    let mut counts = vec![0usize; bin_count];
    for &value in values {
        let idx = (((value - min) / width) as usize).min(bin_count - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

fn render_categorical_bar(table: &Table, request: &ChartRequest) -> Result<RenderedChart> {
    let column = resolve_column(
        table,
        request.primary.as_deref(),
        ColumnKind::Categorical,
        None,
    )?;
    let counts = analytics::count_values(table, &column)?;
    if counts.is_empty() {
        return Err(AnalyticsError::EmptyColumn { column }.into());
    }
    let categories = counts
        .into_iter()
        .map(|(name, count)| (name, count as f64))
        .collect();
    Ok(RenderedChart {
        kind: ChartKind::CategoricalBar,
        title: format!("Distribution of {column}"),
        axes: AxisLabels {
            x: column,
            y: "Count".to_string(),
        },
        data: ChartData::Bar { categories },
    })
}

fn render_top_n_bar(
    table: &Table,
    config: &AnalyticsConfig,
    request: &ChartRequest,
) -> Result<RenderedChart> {
    let column = resolve_column(
        table,
        request.primary.as_deref(),
        ColumnKind::Categorical,
        None,
    )?;
    let counts = value_counts(table, &column, Some(config.top_n))?;
    if counts.is_empty() {
        return Err(AnalyticsError::EmptyColumn { column }.into());
    }
    let categories = counts
        .into_iter()
        .map(|(name, count)| (name, count as f64))
        .collect();
    Ok(RenderedChart {
        kind: ChartKind::TopNBar,
        title: format!("Top Categories in {column}"),
        axes: AxisLabels {
            x: "Count".to_string(),
            y: column,
        },
        data: ChartData::HorizontalBar { categories },
    })
}

fn render_box_plot(table: &Table, request: &ChartRequest) -> Result<RenderedChart> {
    let column = resolve_column(table, request.primary.as_deref(), ColumnKind::Numeric, None)?;
    let mut values = analytics::numeric_values(table, &column)?;
    if values.is_empty() {
        return Err(AnalyticsError::EmptyColumn { column }.into());
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let summary = box_summary(&values);
    Ok(RenderedChart {
        kind: ChartKind::BoxPlot,
        title: format!("Box Plot of {column}"),
        axes: AxisLabels {
            x: String::new(),
            y: column,
        },
        data: ChartData::Box { summary },
    })
}

// Linear interpolation quantile over a sorted slice, matching the
// QuantileMethod::Linear convention used for summary statistics.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn box_summary(sorted: &[f64]) -> BoxSummary {
    let q25 = quantile_sorted(sorted, 0.25);
    let median = quantile_sorted(sorted, 0.5);
    let q75 = quantile_sorted(sorted, 0.75);
    let iqr = q75 - q25;
    let low_fence = q25 - 1.5 * iqr;
    let high_fence = q75 + 1.5 * iqr;
    let whisker_low = sorted
        .iter()
        .copied()
        .find(|v| *v >= low_fence)
        .unwrap_or(sorted[0]);
    let whisker_high = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= high_fence)
        .unwrap_or(sorted[sorted.len() - 1]);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();
    BoxSummary {
        min: sorted[0],
        q25,
        median,
        q75,
        max: sorted[sorted.len() - 1],
        whisker_low,
        whisker_high,
        outliers,
    }
}

fn render_scatter(table: &Table, request: &ChartRequest) -> Result<RenderedChart> {
    let x_column = resolve_column(table, request.primary.as_deref(), ColumnKind::Numeric, None)?;
    let y_column = resolve_column(
        table,
        request.secondary.as_deref(),
        ColumnKind::Numeric,
        Some(&x_column),
    )?;
    let xs = analytics::numeric_series(table, &x_column)?;
    let ys = analytics::numeric_series(table, &y_column)?;
    let points: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect();
    Ok(RenderedChart {
        kind: ChartKind::Scatter,
        title: format!("{y_column} vs {x_column}"),
        axes: AxisLabels {
            x: x_column,
            y: y_column,
        },
        data: ChartData::Scatter { points },
    })
}

fn render_grouped_bar(table: &Table, request: &ChartRequest) -> Result<RenderedChart> {
    let group_column = resolve_column(
        table,
        request.primary.as_deref(),
        ColumnKind::Categorical,
        None,
    )?;
    let value_column = resolve_column(
        table,
        request.secondary.as_deref(),
        ColumnKind::Numeric,
        None,
    )?;
    let means = grouped_mean(table, &group_column, &value_column)?;
    if means.is_empty() {
        return Err(AnalyticsError::EmptyColumn {
            column: group_column,
        }
        .into());
    }
    Ok(RenderedChart {
        kind: ChartKind::GroupedBar,
        title: format!("Mean {value_column} by {group_column}"),
        axes: AxisLabels {
            x: group_column,
            y: format!("Mean {value_column}"),
        },
        data: ChartData::Bar {
            categories: means.into_iter().collect(),
        },
    })
}

fn render_heatmap(table: &Table) -> Result<RenderedChart> {
    let numeric = table.schema().numeric_columns();
    let matrix = correlation_matrix(table, &numeric)?;
    Ok(RenderedChart {
        kind: ChartKind::CorrelationHeatmap,
        title: "Correlation Heatmap".to_string(),
        axes: AxisLabels {
            x: String::new(),
            y: String::new(),
        },
        data: ChartData::Heatmap { matrix },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample_table() -> Table {
        Table::new(
            df!(
                "Age" => [20i64, 30, 40, 50, 60],
                "Billing" => [100.0f64, 200.0, 300.0, 400.0, 500.0],
                "Gender" => ["M", "F", "M", "F", "M"]
            )
            .unwrap(),
        )
    }

    fn render_kind(table: &Table, kind: ChartKind) -> ChartOutcome {
        render(
            table,
            &ChartCatalog::builtin(),
            &AnalyticsConfig::default(),
            &ChartRequest::new(kind),
        )
        .unwrap()
    }

    #[test]
    fn histogram_renders_with_defaulted_column() {
        let outcome = render_kind(&sample_table(), ChartKind::Histogram);
        let ChartOutcome::Rendered(chart) = outcome else {
            panic!("expected rendered chart");
        };
        assert_eq!(chart.title, "Distribution of Age");
        let ChartData::Histogram { bins } = chart.data else {
            panic!("expected histogram data");
        };
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
    }

    #[test]
    fn histogram_degrades_without_numeric_columns() {
        let table = Table::new(df!("Gender" => ["M", "F"]).unwrap());
        let outcome = render_kind(&table, ChartKind::Histogram);
        let warning = outcome.warning().expect("expected warning");
        assert!(warning.contains("numeric"));
    }

    #[test]
    fn scatter_degrades_with_one_numeric_column() {
        let table = Table::new(
            df!(
                "Age" => [20i64, 30],
                "Gender" => ["M", "F"]
            )
            .unwrap(),
        );
        let outcome = render_kind(&table, ChartKind::Scatter);
        assert!(!outcome.is_rendered());
    }

    #[test]
    fn scatter_picks_distinct_default_columns() {
        let outcome = render_kind(&sample_table(), ChartKind::Scatter);
        let ChartOutcome::Rendered(chart) = outcome else {
            panic!("expected rendered chart");
        };
        assert_eq!(chart.title, "Billing vs Age");
        let ChartData::Scatter { points } = chart.data else {
            panic!("expected scatter data");
        };
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], (20.0, 100.0));
    }

    #[test]
    fn explicit_wrong_kind_column_degrades() {
        let table = sample_table();
        let outcome = render(
            &table,
            &ChartCatalog::builtin(),
            &AnalyticsConfig::default(),
            &ChartRequest::new(ChartKind::Histogram).with_primary("Gender"),
        )
        .unwrap();
        let warning = outcome.warning().expect("expected warning");
        assert!(warning.contains("Gender"));
    }

    #[test]
    fn grouped_bar_titles_follow_columns() {
        let outcome = render_kind(&sample_table(), ChartKind::GroupedBar);
        let ChartOutcome::Rendered(chart) = outcome else {
            panic!("expected rendered chart");
        };
        assert_eq!(chart.title, "Mean Age by Gender");
    }

    #[test]
    fn constant_column_yields_single_bin() {
        let bins = bin_values(&[5.0, 5.0, 5.0], 30);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn box_summary_flags_outliers() {
        let mut values: Vec<f64> = (1..=20).map(f64::from).collect();
        values.push(1000.0);
        values.sort_by(|a, b| a.total_cmp(b));
        let summary = box_summary(&values);
        assert_eq!(summary.outliers, vec![1000.0]);
        assert_eq!(summary.max, 1000.0);
        assert!(summary.whisker_high <= 20.0);
    }
}
