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

use crate::error::{CatalogError, Result};
use crate::loader::{ColumnKind, TableSchema};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Histogram,
    CategoricalBar,
    TopNBar,
    BoxPlot,
    Scatter,
    GroupedBar,
    CorrelationHeatmap,
}

impl ChartKind {
    pub fn all() -> [ChartKind; 7] {
        [
            ChartKind::Histogram,
            ChartKind::CategoricalBar,
            ChartKind::TopNBar,
            ChartKind::BoxPlot,
            ChartKind::Scatter,
            ChartKind::GroupedBar,
            ChartKind::CorrelationHeatmap,
        ]
    }
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "Numeric Distribution",
            ChartKind::CategoricalBar => "Categorical Distribution",
            ChartKind::TopNBar => "Top Categories",
            ChartKind::BoxPlot => "Box Plot",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::GroupedBar => "Grouped Mean",
            ChartKind::CorrelationHeatmap => "Correlation Heatmap",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn default_min_count() -> usize {
    1
}

/// One row of a chart's requirement table: a named role filled by a column
/// of the given kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRequirement {
    pub role: String,
    pub kind: ColumnKind,
    #[serde(default = "default_min_count")]
    pub min_count: usize,
}

impl ColumnRequirement {
    pub fn new(role: &str, kind: ColumnKind) -> Self {
        Self {
            role: role.to_string(),
            kind,
            min_count: 1,
        }
    }
    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub label: String,
    pub description: String,
    pub requires: Vec<ColumnRequirement>,
}

impl ChartSpec {
    /// Columns of `kind` this chart needs in total, across all roles.
    pub fn required_count(&self, kind: ColumnKind) -> usize {
        self.requires
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.min_count)
            .sum()
    }

    pub fn roles_of_kind(&self, kind: ColumnKind) -> Vec<&str> {
        self.requires
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.role.as_str())
            .collect()
    }

    /// The first unsatisfied requirement against `schema`, as a
    /// user-visible warning, or `None` when the chart can be rendered.
    pub fn unmet_requirement(&self, schema: &TableSchema) -> Option<String> {
        for kind in [ColumnKind::Numeric, ColumnKind::Categorical] {
            let needed = self.required_count(kind);
            let available = schema.columns_of_kind(kind).len();
            if needed > available {
                return Some(format!(
                    "{} requires {} {} column{}; the dataset has {}",
                    self.label,
                    needed,
                    kind.label(),
                    if needed == 1 { "" } else { "s" },
                    available
                ));
            }
        }
        None
    }

    pub fn is_available(&self, schema: &TableSchema) -> bool {
        self.unmet_requirement(schema).is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogConfig {
    charts: Vec<ChartSpec>,
}

/// The declarative chart table: kind → required column kinds. New chart
/// kinds are rows here, not new dispatch branches.
#[derive(Debug, Clone)]
pub struct ChartCatalog {
    specs: Vec<ChartSpec>,
    by_kind: HashMap<ChartKind, usize>,
}

static BUILTIN: Lazy<ChartCatalog> = Lazy::new(|| {
    use ColumnKind::{Categorical, Numeric};
    let specs = vec![
        ChartSpec {
            kind: ChartKind::Histogram,
            label: ChartKind::Histogram.label().to_string(),
            description: "Binned frequency count of one numeric column".to_string(),
            requires: vec![ColumnRequirement::new("x", Numeric)],
        },
        ChartSpec {
            kind: ChartKind::CategoricalBar,
            label: ChartKind::CategoricalBar.label().to_string(),
            description: "Value counts of one categorical column, natural order".to_string(),
            requires: vec![ColumnRequirement::new("x", Categorical)],
        },
        ChartSpec {
            kind: ChartKind::TopNBar,
            label: ChartKind::TopNBar.label().to_string(),
            description: "Most frequent categories, descending, truncated".to_string(),
            requires: vec![ColumnRequirement::new("y", Categorical)],
        },
        ChartSpec {
            kind: ChartKind::BoxPlot,
            label: ChartKind::BoxPlot.label().to_string(),
            description: "Quartile, whisker and outlier summary of one numeric column"
                .to_string(),
            requires: vec![ColumnRequirement::new("y", Numeric)],
        },
        ChartSpec {
            kind: ChartKind::Scatter,
            label: ChartKind::Scatter.label().to_string(),
            description: "Raw paired values of two numeric columns".to_string(),
            requires: vec![
                ColumnRequirement::new("x", Numeric),
                ColumnRequirement::new("y", Numeric),
            ],
        },
        ChartSpec {
            kind: ChartKind::GroupedBar,
            label: ChartKind::GroupedBar.label().to_string(),
            description: "Mean of a numeric column per category".to_string(),
            requires: vec![
                ColumnRequirement::new("group", Categorical),
                ColumnRequirement::new("value", Numeric),
            ],
        },
        ChartSpec {
            kind: ChartKind::CorrelationHeatmap,
            label: ChartKind::CorrelationHeatmap.label().to_string(),
            description: "Pairwise Pearson correlation of the numeric columns".to_string(),
            requires: vec![ColumnRequirement::new("columns", Numeric).with_min_count(2)],
        },
    ];
    ChartCatalog::from_specs(specs).expect("built-in chart catalog is valid")
});

impl ChartCatalog {
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn from_specs(specs: Vec<ChartSpec>) -> Result<Self> {
        let mut by_kind = HashMap::new();
        for (idx, spec) in specs.iter().enumerate() {
            if spec.requires.is_empty() {
                return Err(CatalogError::EmptyRequirements {
                    name: spec.label.clone(),
                }
                .into());
            }
            if by_kind.insert(spec.kind, idx).is_some() {
                return Err(CatalogError::DuplicateChart {
                    name: spec.label.clone(),
                }
                .into());
            }
        }
        Ok(Self { specs, by_kind })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: CatalogConfig =
            serde_yaml::from_str(yaml).map_err(|source| CatalogError::Yaml { source })?;
        Self::from_specs(config.charts)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| CatalogError::CatalogFile {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Self::from_yaml_str(&content)
    }

    pub fn specs(&self) -> &[ChartSpec] {
        &self.specs
    }

    pub fn get(&self, kind: ChartKind) -> Option<&ChartSpec> {
        self.by_kind.get(&kind).map(|&idx| &self.specs[idx])
    }

    /// Specs whose requirements `schema` satisfies, in catalog order.
    pub fn available<'a>(&'a self, schema: &TableSchema) -> Vec<&'a ChartSpec> {
        self.specs
            .iter()
            .filter(|spec| spec.is_available(schema))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Table;
    use polars::prelude::*;

    #[test]
    fn builtin_covers_every_kind() {
        let catalog = ChartCatalog::builtin();
        for kind in ChartKind::all() {
            assert!(catalog.get(kind).is_some(), "missing spec for {kind:?}");
        }
    }

    #[test]
    fn availability_follows_partition() {
        let table = Table::new(df!("Gender" => ["M", "F"]).unwrap());
        let catalog = ChartCatalog::builtin();
        let available: Vec<ChartKind> = catalog
            .available(table.schema())
            .iter()
            .map(|s| s.kind)
            .collect();
        assert_eq!(available, vec![ChartKind::CategoricalBar, ChartKind::TopNBar]);
        let scatter = catalog.get(ChartKind::Scatter).unwrap();
        let warning = scatter.unmet_requirement(table.schema()).unwrap();
        assert!(warning.contains("2 numeric columns"));
        assert!(warning.contains("has 0"));
    }

    #[test]
    fn yaml_catalog_round_trips() {
        let yaml = r#"
charts:
  - kind: histogram
    label: Numeric Distribution
    description: Binned frequency count
    requires:
      - role: x
        kind: Numeric
  - kind: correlation-heatmap
    label: Correlation Heatmap
    description: Pairwise correlation
    requires:
      - role: columns
        kind: Numeric
        min_count: 2
"#;
        let catalog = ChartCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.specs().len(), 2);
        let heatmap = catalog.get(ChartKind::CorrelationHeatmap).unwrap();
        assert_eq!(heatmap.required_count(ColumnKind::Numeric), 2);
        // omitted min_count defaults to 1
        let histogram = catalog.get(ChartKind::Histogram).unwrap();
        assert_eq!(histogram.required_count(ColumnKind::Numeric), 1);
    }

    #[test]
    fn duplicate_kinds_rejected() {
        let specs = vec![
            ChartSpec {
                kind: ChartKind::Histogram,
                label: "a".to_string(),
                description: String::new(),
                requires: vec![ColumnRequirement::new("x", ColumnKind::Numeric)],
            },
            ChartSpec {
                kind: ChartKind::Histogram,
                label: "b".to_string(),
                description: String::new(),
                requires: vec![ColumnRequirement::new("x", ColumnKind::Numeric)],
            },
        ];
        assert!(ChartCatalog::from_specs(specs).is_err());
    }
}
