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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlanceError {
    #[error("dataset error: {0}")]
    Data(#[from] DataError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("chart catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("dataset file not found: '{path}'")]
    NotFound { path: String },
    #[error("failed to parse dataset '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset cache unavailable: {reason}")]
    Cache { reason: String },
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("column '{column}' has no non-missing values")]
    EmptyColumn { column: String },
    #[error("operation needs at least {needed} numeric columns, {available} available")]
    InsufficientColumns { needed: usize, available: usize },
    #[error("column '{column}' is {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },
    #[error("column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("failed to calculate statistics for column '{column}': {source}")]
    Statistics {
        column: String,
        #[source]
        source: polars::error::PolarsError,
    },
}

impl AnalyticsError {
    /// Precondition failures are recovered locally and surfaced as chart
    /// warnings; only internal statistics failures are hard errors.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AnalyticsError::Statistics { .. })
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to parse chart catalog YAML: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("failed to read chart catalog file '{path}': {source}")]
    CatalogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("duplicate chart kind in catalog: '{name}'")]
    DuplicateChart { name: String },
    #[error("chart '{name}' declares no column requirements")]
    EmptyRequirements { name: String },
    #[error("chart kind '{name}' not present in catalog")]
    UnknownKind { name: String },
}

pub type Result<T> = std::result::Result<T, GlanceError>;

impl GlanceError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            GlanceError::Analytics(e) => e.is_recoverable(),
            _ => false,
        }
    }
    pub fn category(&self) -> &'static str {
        match self {
            GlanceError::Data(_) => "Data",
            GlanceError::Analytics(_) => "Analytics",
            GlanceError::Catalog(_) => "Catalog",
            GlanceError::Io(_) => "I/O",
            GlanceError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            GlanceError::Data(DataError::NotFound { path }) => {
                format!("The dataset file '{path}' could not be found. Place the CSV next to the application or pick another file.")
            }
            GlanceError::Data(DataError::Parse { path, .. }) => {
                format!("The dataset file '{path}' is not a readable CSV. Check the delimiter and that every row matches the header.")
            }
            GlanceError::Analytics(e) => e.to_string(),
            _ => self.to_string(),
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            GlanceError::Data(DataError::NotFound { .. }) => vec![
                "Check the file path spelling".to_string(),
                "Use the file picker to locate the dataset".to_string(),
            ],
            GlanceError::Analytics(AnalyticsError::InsufficientColumns { .. }) => vec![
                "Pick a chart that matches the dataset's column types".to_string(),
                "Verify numeric columns were not read as text".to_string(),
            ],
            GlanceError::Analytics(AnalyticsError::TypeMismatch { .. }) => vec![
                "Select a column of the kind the chart requires".to_string(),
            ],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
    }
}

pub fn error_severity(error: &GlanceError) -> ErrorSeverity {
    match error {
        GlanceError::Analytics(e) if e.is_recoverable() => ErrorSeverity::Warning,
        GlanceError::Data(DataError::NotFound { .. }) => ErrorSeverity::Critical,
        GlanceError::Data(DataError::Parse { .. }) => ErrorSeverity::Critical,
        _ => ErrorSeverity::Error,
    }
}

pub struct ErrorReporter {
    pub show_suggestions: bool,
    pub colored_output: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            show_suggestions: true,
            colored_output: true,
        }
    }
    pub fn report(&self, error: &GlanceError) -> String {
        let severity = error_severity(error);
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!(
            "[{}] {}\n",
            severity.as_str(),
            error.user_message()
        ));
        if self.colored_output {
            output.push_str("\x1b[0m");
        }
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
