//! # Shell Module
//!
//! Entry point and CLI logic for the `polyfmt` binary: argument parsing,
//! config discovery and the four modes (format, list languages, check tools,
//! print config schema).

pub mod cli;

pub use cli::{Cli, run, run_with};
