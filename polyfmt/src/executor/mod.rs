//! # Strategy Executors
//!
//! An executor carries out one [`FormatStrategy`] against one snippet and reports
//! an [`ExecutionOutcome`]. Two implementations exist:
//!
//! - **[`LibraryExecutor`]**: calls an embedded formatting library in-process.
//!   It performs no I/O and cannot hang.
//! - **[`ProcessExecutor`]**: pipes the snippet through an external formatter,
//!   draining its output concurrently and killing it when it overruns its
//!   time budget.
//!
//! Both sit behind [`StrategyExecutor`], which is what the dispatcher holds.
//! Handing an executor a strategy of the other family is reported as
//! `ToolUnavailable` rather than panicking.

mod library;
mod process;

pub use library::{FormatStyle, LibraryExecutor};
pub use process::{CANCELLED_DETAIL, DEFAULT_PROCESS_TIMEOUT, ProcessExecutor};

use crate::language::FormatStrategy;
use crate::outcome::ExecutionOutcome;
use async_trait::async_trait;

/// Common contract for library and subprocess executors.
#[async_trait]
pub trait StrategyExecutor: Send + Sync + std::fmt::Debug {
    /// Formats `code` with `strategy`. Never fails outside the outcome type.
    async fn run(&self, code: &str, strategy: &FormatStrategy) -> ExecutionOutcome;
}
