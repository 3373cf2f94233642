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
pub enum RecommendationError {
    #[error("Intent validation error: {0}")]
    IntentValidation(#[from] IntentValidationError),
    #[error("Channel conflict: {0}")]
    ChannelConflict(#[from] ChannelConflictError),
    #[error("Scoring precondition failed: {0}")]
    Precondition(#[from] PreconditionError),
    #[error("Action registry error: {0}")]
    Action(#[from] ActionError),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
}
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntentValidationError {
    #[error("The input attribute '{attribute}' does not exist in the dataset")]
    MissingAttribute { attribute: String },
    #[error("The input value '{value}' does not exist for attribute '{attribute}'")]
    MissingValue { attribute: String, value: String },
    #[error("Filter clause on '{attribute}' must name exactly one attribute")]
    AmbiguousFilterAttribute { attribute: String },
    #[error("Attribute wildcard is not allowed in a filter clause")]
    WildcardFilterAttribute,
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("channel '{channel}' is claimed by both '{first}' and '{second}'")]
pub struct ChannelConflictError {
    pub channel: String,
    pub first: String,
    pub second: String,
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("visualization '{title}' has no data; run the executor before scoring")]
pub struct PreconditionError {
    pub title: String,
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Action '{name}' is already registered")]
    DuplicateAction { name: String },
    #[error("Action '{name}' is not registered")]
    UnknownAction { name: String },
}
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to open data file '{path}': {source}")]
    DataFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read data file '{path}': {source}")]
    DataFileError {
        path: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Failed to profile column '{column}': {source}")]
    ColumnProfilingError {
        column: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Duplicate column name '{column}'")]
    DuplicateColumn { column: String },
}
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Visualization '{title}' is missing its {channel} channel")]
    MissingChannel { title: String, channel: String },
    #[error("Column '{column}' required by '{title}' is absent from the source data")]
    MissingColumn { title: String, column: String },
    #[error("Histogram column '{column}' has no numeric range")]
    NoNumericRange { column: String },
    #[error("Executor backend failure: {reason}")]
    Backend { reason: String },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
}
#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    JsonSerialisationError {
        #[from]
        source: serde_json::Error,
    },
}
pub type Result<T> = std::result::Result<T, RecommendationError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
impl From<serde_json::Error> for RecommendationError {
    fn from(err: serde_json::Error) -> Self {
        RecommendationError::Serialisation(SerialisationError::JsonSerialisationError {
            source: err,
        })
    }
}
impl RecommendationError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RecommendationError::IntentValidation(_)
                | RecommendationError::ChannelConflict(_)
                | RecommendationError::Action(_)
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            RecommendationError::IntentValidation(_) => "Intent",
            RecommendationError::ChannelConflict(_) => "Encoding",
            RecommendationError::Precondition(_) => "Scoring",
            RecommendationError::Action(_) => "Action",
            RecommendationError::Data(_) => "Data",
            RecommendationError::Execution(_) => "Execution",
            RecommendationError::Config(_) => "Configuration",
            RecommendationError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            RecommendationError::IntentValidation(IntentValidationError::MissingAttribute {
                ..
            }) => vec![
                "Check the attribute spelling against the dataset columns".to_string(),
                "Use \"?\" to let every column be considered".to_string(),
            ],
            RecommendationError::IntentValidation(IntentValidationError::MissingValue {
                ..
            }) => vec![
                "Check the filter value against the column's unique values".to_string(),
                "Use \"?\" as the value to enumerate every value".to_string(),
            ],
            RecommendationError::ChannelConflict(_) => vec![
                "Assign each of x, y and color to at most one clause".to_string(),
                "Leave the channel unset to let encoding inference choose".to_string(),
            ],
            RecommendationError::Precondition(_) => {
                vec!["Execute the visualizations before scoring them".to_string()]
            }
            RecommendationError::Action(ActionError::DuplicateAction { .. }) => {
                vec!["Remove the existing action first or pick another name".to_string()]
            }
            RecommendationError::Action(ActionError::UnknownAction { .. }) => {
                vec!["List the registered action names to see valid options".to_string()]
            }
            RecommendationError::Data(DataError::ColumnNotFound { .. }) => {
                vec!["List the dataset columns to see valid names".to_string()]
            }
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            RecommendationError::IntentValidation(err) => {
                format!("{err}. Please check your intent and try again.")
            }
            RecommendationError::Data(
                DataError::DataFileError { path, .. } | DataError::DataFileIo { path, .. },
            ) => {
                format!("Could not load '{path}'. Please check the file exists and is valid CSV.")
            }
            _ => self.to_string(),
        }
    }
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RecommendationError::IntentValidation(_) | RecommendationError::ChannelConflict(_) => {
                ErrorSeverity::Warning
            }
            RecommendationError::Action(_) => ErrorSeverity::Warning,
            RecommendationError::Execution(ExecutionError::Backend { .. }) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::Error,
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}
impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "\x1b[36m",
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
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
    pub fn plain() -> Self {
        Self {
            show_suggestions: true,
            colored_output: false,
        }
    }
    pub fn report(&self, error: &RecommendationError) -> String {
        let severity = error.severity();
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!(
            "[{}] {}: {}\n",
            severity.as_str(),
            error.category(),
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
