//! # polyfmt
//!
//! One entry point for formatting source code in many languages.
//!
//! A request names a language and carries a snippet. The dispatcher resolves
//! the language through a table of aliases and hands the snippet to one of two
//! strategy families:
//!
//! - **Library**: JavaScript/TypeScript, JSON, HTML and CSS are formatted
//!   in-process by embedded libraries.
//! - **External process**: Python, Java, C/C++ and XML are piped through an
//!   external formatter over stdin. Output is drained concurrently, runs are
//!   bounded by a timeout, and overrunning tools are killed.
//!
//! Every call ends in one of five outcomes (success, validation failure, tool
//! unavailable, tool failure, timeout), which the boundary maps onto
//! categorized errors with HTTP statuses and CLI exit codes.
//!
//! ## Modules
//!
//! - **`language`**: alias table and [`LanguageRegistry`].
//! - **`executor`**: [`LibraryExecutor`] and [`ProcessExecutor`].
//! - **`dispatcher`**: validation, routing and response mapping.
//! - **`config`**: optional `polyfmt.toml` (timeout, style, tool overrides).
//! - **`tool_availability`**: concurrent probes for external formatters.
//! - **`shell`**: the `polyfmt` command-line interface.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod language;
pub mod outcome;
pub mod shell;
pub mod tool_availability;
pub mod utils;

// Re-export main types for easier use
pub use config::FormatterConfig;
pub use dispatcher::{Dispatcher, FormatRequest, FormatResponse};
pub use error::{ErrorBody, ErrorCategory, FormatError, RequestError};
pub use executor::{FormatStyle, LibraryExecutor, ProcessExecutor, StrategyExecutor};
pub use language::{FormatStrategy, Language, LanguageRegistry, ParserProfile};
pub use outcome::ExecutionOutcome;
