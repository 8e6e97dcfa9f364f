//! Result type shared by every strategy executor.

use serde::Serialize;

/// Detail used when a failing tool wrote nothing to stderr.
pub const NO_DIAGNOSTIC_FALLBACK: &str = "no diagnostic output — likely a syntax error";

/// Outcome of running one strategy against one snippet.
///
/// Executors produce it, the dispatcher passes it through untouched and only
/// the boundary mapping in [`crate::error::FormatError`] interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The formatter accepted the input.
    Success { formatted: String },
    /// The library rejected the input as malformed.
    ValidationFailure { detail: String },
    /// The external executable could not be started.
    ToolUnavailable { detail: String },
    /// The external executable ran and exited non-zero.
    ToolFailure { exit_code: i32, detail: String },
    /// The external executable overran its time budget and was killed.
    Timeout,
}

impl ExecutionOutcome {
    pub fn success(formatted: impl Into<String>) -> Self {
        ExecutionOutcome::Success {
            formatted: formatted.into(),
        }
    }

    pub fn validation_failure(detail: impl Into<String>) -> Self {
        ExecutionOutcome::ValidationFailure {
            detail: detail.into(),
        }
    }

    pub fn tool_unavailable(detail: impl Into<String>) -> Self {
        ExecutionOutcome::ToolUnavailable {
            detail: detail.into(),
        }
    }

    /// Builds a `ToolFailure`, substituting [`NO_DIAGNOSTIC_FALLBACK`] for a
    /// blank stderr.
    pub fn tool_failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        let detail = if stderr.trim().is_empty() {
            NO_DIAGNOSTIC_FALLBACK.to_string()
        } else {
            stderr
        };
        ExecutionOutcome::ToolFailure { exit_code, detail }
    }

    /// Formatted code, if the run succeeded.
    pub fn formatted(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Success { formatted } => Some(formatted),
            _ => None,
        }
    }
}
