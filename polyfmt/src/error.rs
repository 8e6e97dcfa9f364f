//! Error types for the formatting core.
//!
//! [`FormatError`] is the boundary taxonomy a transport sees. Each variant maps
//! to one [`ErrorCategory`], so callers branch on the category instead of
//! parsing tool output.

use crate::language::{Language, Unsupported};
use crate::outcome::ExecutionOutcome;
use serde::Serialize;
use std::{fmt, time::Duration};

/// Rejection raised before any executor runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("request code is empty")]
    EmptyCode,
    #[error("request language is empty")]
    EmptyLanguage,
    #[error("unsupported language '{}'", .0.language)]
    Unsupported(Unsupported),
}

/// Configuration problems detected while loading or applying a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown language '{0}' in [tools] section")]
    UnknownLanguage(String),

    #[error("Language '{0}' is formatted in-process and cannot be given an external tool")]
    NotOverridable(Language),

    #[error("Tool command for '{0}' is empty")]
    EmptyCommand(String),

    #[error("timeout_seconds must be greater than zero")]
    ZeroTimeout,

    #[error(
        "timeout_seconds must be at most {}, got {}",
        crate::config::MAX_TIMEOUT_SECONDS,
        .0
    )]
    TimeoutTooLarge(u64),

    #[error("indent_width must be between 1 and 16, got {0}")]
    IndentWidth(u8),
}

/// Category surfaced at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Validation,
    UnsupportedLanguage,
    ToolUnavailable,
    ToolFailure,
    Timeout,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::UnsupportedLanguage => "unsupported-language",
            ErrorCategory::ToolUnavailable => "tool-unavailable",
            ErrorCategory::ToolFailure => "tool-failure",
            ErrorCategory::Timeout => "timeout",
        }
    }

    /// HTTP status a transport should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCategory::Validation
            | ErrorCategory::UnsupportedLanguage
            | ErrorCategory::ToolFailure => 400,
            ErrorCategory::ToolUnavailable => 500,
            ErrorCategory::Timeout => 504,
        }
    }

    /// Process exit code for the CLI (sysexits.h values).
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Validation | ErrorCategory::ToolFailure => 65,
            ErrorCategory::UnsupportedLanguage => 64,
            ErrorCategory::ToolUnavailable => 69,
            ErrorCategory::Timeout => 75,
        }
    }

    /// True for deployment faults rather than bad input.
    pub fn is_server_fault(self) -> bool {
        matches!(self, ErrorCategory::ToolUnavailable | ErrorCategory::Timeout)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed format call, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Missing required fields: \"code\" and \"language\" are required.")]
    InvalidRequest { detail: String },

    #[error(
        "Unsupported language: \"{language}\". Supported languages are: {}.",
        .supported.join(", ")
    )]
    UnsupportedLanguage {
        language: String,
        supported: Vec<&'static str>,
    },

    #[error("Input is {actual} bytes, larger than the {limit} byte limit.")]
    InputTooLarge { limit: usize, actual: usize },

    #[error("Syntax validation failed.")]
    Syntax { detail: String },

    #[error(
        "Failed to start the formatter process for \"{command}\". Is it installed and in your PATH?"
    )]
    ToolUnavailable { command: String, detail: String },

    #[error("Formatter exited with error code {exit_code}.")]
    ToolFailure { exit_code: i32, detail: String },

    #[error("Formatter \"{command}\" timed out after {}s.", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },
}

impl FormatError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FormatError::InvalidRequest { .. }
            | FormatError::InputTooLarge { .. }
            | FormatError::Syntax { .. } => ErrorCategory::Validation,
            FormatError::UnsupportedLanguage { .. } => ErrorCategory::UnsupportedLanguage,
            FormatError::ToolUnavailable { .. } => ErrorCategory::ToolUnavailable,
            FormatError::ToolFailure { .. } => ErrorCategory::ToolFailure,
            FormatError::Timeout { .. } => ErrorCategory::Timeout,
        }
    }

    /// Underlying diagnostic text, passed through verbatim.
    pub fn detail(&self) -> Option<&str> {
        match self {
            FormatError::InvalidRequest { detail }
            | FormatError::Syntax { detail }
            | FormatError::ToolUnavailable { detail, .. }
            | FormatError::ToolFailure { detail, .. } => Some(detail),
            FormatError::UnsupportedLanguage { .. }
            | FormatError::InputTooLarge { .. }
            | FormatError::Timeout { .. } => None,
        }
    }

    /// Serializable body for transports.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            category: self.category(),
            message: self.to_string(),
            detail: self.detail().map(str::to_string),
        }
    }

    /// Maps a non-success executor outcome onto the boundary taxonomy.
    ///
    /// `command` names the external tool for process strategies and the parser
    /// profile for library strategies. Returns `None` for `Success`.
    pub fn from_outcome(
        outcome: ExecutionOutcome,
        command: &str,
        timeout: Duration,
    ) -> Option<Self> {
        match outcome {
            ExecutionOutcome::Success { .. } => None,
            ExecutionOutcome::ValidationFailure { detail } => Some(FormatError::Syntax { detail }),
            ExecutionOutcome::ToolUnavailable { detail } => Some(FormatError::ToolUnavailable {
                command: command.to_string(),
                detail,
            }),
            ExecutionOutcome::ToolFailure { exit_code, detail } => {
                Some(FormatError::ToolFailure { exit_code, detail })
            }
            ExecutionOutcome::Timeout => Some(FormatError::Timeout {
                command: command.to_string(),
                timeout,
            }),
        }
    }
}

impl From<RequestError> for FormatError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Unsupported(Unsupported {
                language,
                supported,
            }) => FormatError::UnsupportedLanguage {
                language,
                supported,
            },
            other => FormatError::InvalidRequest {
                detail: other.to_string(),
            },
        }
    }
}

/// JSON error body: `{ category, message, detail? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
