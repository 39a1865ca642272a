use serde::Serialize;
use thiserror::Error;

use crate::dsl::ast::SourceLocation;

/// Lowering failure. The orchestrator stops at the first one.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum TransformError {
    #[error("{message}")]
    InvalidTimeline {
        message: String,
        location: SourceLocation,
    },
    #[error("{message}")]
    InvalidEvent {
        message: String,
        location: SourceLocation,
    },
    #[error("{message}")]
    ValidationError {
        message: String,
        location: SourceLocation,
    },
    #[error("{message}")]
    InvalidExpression {
        message: String,
        location: SourceLocation,
    },
}

impl TransformError {
    pub fn invalid_timeline(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::InvalidTimeline {
            message: message.into(),
            location,
        }
    }

    pub fn invalid_event(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::InvalidEvent {
            message: message.into(),
            location,
        }
    }

    pub fn validation(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::ValidationError {
            message: message.into(),
            location,
        }
    }

    pub fn invalid_expression(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::InvalidExpression {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            Self::InvalidTimeline { location, .. }
            | Self::InvalidEvent { location, .. }
            | Self::ValidationError { location, .. }
            | Self::InvalidExpression { location, .. } => *location,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTimeline { .. } => "InvalidTimeline",
            Self::InvalidEvent { .. } => "InvalidEvent",
            Self::ValidationError { .. } => "ValidationError",
            Self::InvalidExpression { .. } => "InvalidExpression",
        }
    }

    /// Format the error with its source position, e.g. `[ValidationError] line 4:9: ...`.
    pub fn format_with_location(&self) -> String {
        let location = self.location();
        if location.is_unknown() {
            format!("[{}] {}", self.kind(), self)
        } else {
            format!(
                "[{}] line {}:{}: {}",
                self.kind(),
                location.line,
                location.column,
                self
            )
        }
    }
}

/// Parameter mapping failure, always attributable to one parameter.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum MappingError {
    #[error("Operation '{operation}' expects {} argument(s), got {actual}", arity_text(.min, .max))]
    ParameterCount {
        operation: String,
        min: usize,
        max: usize,
        actual: usize,
    },
    #[error("Parameter '{parameter}' of operation '{operation}' expects {}, got {actual}", .expected.join(" | "))]
    ParameterType {
        operation: String,
        parameter: String,
        expected: Vec<String>,
        actual: String,
    },
}

/// Call-site check against the registry.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum OperationError {
    #[error("Unknown operation '{name}'{}", suggestion_text(.suggestions))]
    UnknownOperation {
        name: String,
        suggestions: Vec<String>,
    },
    #[error("Operation '{operation}' expects {} argument(s), got {actual}", arity_text(.min, .max))]
    ParameterCount {
        operation: String,
        min: usize,
        max: usize,
        actual: usize,
    },
}

/// An operation reads a value no earlier operation in its sequence produced.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("Operation '{operation}' requires '{dependency}', which no earlier operation provides. {hint}")]
pub struct MissingDependencyError {
    pub operation: String,
    pub dependency: String,
    pub hint: String,
}

/// Structural problem in the final configuration.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{path}: {message}")]
pub struct TypeError {
    pub path: String,
    pub message: String,
}

impl TypeError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Settings could not be read.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported settings version {0}")]
    Version(u32),
}

/// Everything `dsl::compile` can report.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("Configuration failed structural checks: {}", join_type_errors(.0))]
    Type(Vec<TypeError>),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Could not load '{path}': {message}")]
    Document { path: String, message: String },
}

impl From<Vec<TypeError>> for CompileError {
    fn from(errors: Vec<TypeError>) -> Self {
        CompileError::Type(errors)
    }
}

fn arity_text(min: &usize, max: &usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{min}..={max}")
    }
}

/// `". Did you mean: a, b?"`, or nothing when there are no suggestions.
pub(crate) fn suggestion_text(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(". Did you mean: {}?", suggestions.join(", "))
    }
}

fn join_type_errors(errors: &[TypeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_location_prefix() {
        let err = TransformError::validation("boom", SourceLocation::new(4, 9, 3));
        assert_eq!(err.format_with_location(), "[ValidationError] line 4:9: boom");

        let err = TransformError::invalid_timeline("no timeline", SourceLocation::default());
        assert_eq!(err.format_with_location(), "[InvalidTimeline] no timeline");
    }

    #[test]
    fn arity_messages() {
        let exact = OperationError::ParameterCount {
            operation: "addClass".into(),
            min: 1,
            max: 1,
            actual: 0,
        };
        assert_eq!(exact.to_string(), "Operation 'addClass' expects 1 argument(s), got 0");

        let ranged = MappingError::ParameterCount {
            operation: "selectElement".into(),
            min: 1,
            max: 2,
            actual: 3,
        };
        assert!(ranged.to_string().contains("1..=2"));
    }

    #[test]
    fn unknown_operation_lists_suggestions() {
        let err = OperationError::UnknownOperation {
            name: "addClas".into(),
            suggestions: vec!["addClass".into()],
        };
        assert_eq!(err.to_string(), "Unknown operation 'addClas'. Did you mean: addClass?");
    }

    #[test]
    fn errors_serialize_with_code_tag() {
        let err = TransformError::invalid_event("bad range", SourceLocation::new(1, 2, 0));
        let value = serde_json::to_value(&err).unwrap_or_default();
        assert_eq!(value["code"], "InvalidEvent");
        assert_eq!(value["detail"]["message"], "bad range");
    }
}
