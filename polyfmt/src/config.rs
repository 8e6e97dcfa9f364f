//! # Formatter Configuration
//!
//! Settings for the dispatcher, read from an optional `polyfmt.toml`. Everything
//! has a default, so an empty file (or no file at all) yields a working setup.
//!
//! ## Layout
//!
//! ```toml
//! timeout_seconds = 10
//! indent_width = 4
//! line_width = 80
//!
//! [tools.python]
//! command = "black"
//! args = ["-q", "-"]
//! version_args = ["--version"]
//! install_instructions = "pip install black"
//! ```
//!
//! - **Top level**: subprocess time budget and the fixed style handed to the
//!   in-process libraries.
//! - **`[tools.<language>]`**: replaces the external command for a language that
//!   is formatted by a subprocess. Keys may be canonical names or aliases.
//!   Languages formatted in-process cannot be overridden.

use crate::error::ConfigError;
use crate::language::LanguageRegistry;
use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

/// File name picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "polyfmt.toml";

/// Longest accepted subprocess budget, in seconds.
pub const MAX_TIMEOUT_SECONDS: u64 = 3600;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_INDENT_WIDTH: u8 = 4;
const DEFAULT_LINE_WIDTH: u32 = 80;

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_indent_width() -> u8 {
    DEFAULT_INDENT_WIDTH
}

fn default_line_width() -> u32 {
    DEFAULT_LINE_WIDTH
}

fn default_version_args() -> Vec<String> {
    vec!["--version".to_string()]
}

/// Complete dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FormatterConfig {
    /// Wall-clock budget for one external formatter run, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Indentation width used by the in-process formatters.
    #[serde(default = "default_indent_width")]
    pub indent_width: u8,
    /// Preferred maximum line width for the in-process formatters.
    #[serde(default = "default_line_width")]
    pub line_width: u32,
    /// External tool overrides keyed by language.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, ToolOverride>,
}

/// Replacement command for an externally formatted language.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ToolOverride {
    /// Executable name or path.
    pub command: String,
    /// Arguments passed on every run. Code is always delivered on stdin.
    #[serde(default)]
    pub args: Vec<String>,
    /// Arguments used by `--check-tools` to probe the executable.
    #[serde(default = "default_version_args")]
    pub version_args: Vec<String>,
    /// Installation guidance shown when the probe fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_instructions: Option<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            indent_width: DEFAULT_INDENT_WIDTH,
            line_width: DEFAULT_LINE_WIDTH,
            tools: BTreeMap::new(),
        }
    }
}

impl FormatterConfig {
    /// Parses and validates a TOML document.
    pub fn load_from_str(contents: &str) -> Result<Self> {
        let config: FormatterConfig =
            toml::from_str(contents).context("Failed to parse formatter configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::load_from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Loads `explicit` if given, else `polyfmt.toml` from `working_dir` if it
    /// exists, else the defaults.
    pub fn discover(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        let candidate: PathBuf = working_dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Using config file {}", candidate.display());
            Self::load_from_file(&candidate)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Checks value ranges and that every tool override targets a language
    /// formatted by a subprocess.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(ConfigError::TimeoutTooLarge(self.timeout_seconds));
        }
        if !(1..=16).contains(&self.indent_width) {
            return Err(ConfigError::IndentWidth(self.indent_width));
        }
        for (language, tool) in &self.tools {
            if tool.command.trim().is_empty() {
                return Err(ConfigError::EmptyCommand(language.clone()));
            }
        }
        LanguageRegistry::from_config(self).map(|_| ())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Looks up the override for a canonical language name or any alias.
    pub fn tool_override(&self, language: &str) -> Option<&ToolOverride> {
        let registry = LanguageRegistry::builtin();
        let target = registry.resolve(language).ok()?.language;
        self.tools.iter().find_map(|(key, tool)| {
            let resolved = registry.resolve(key).ok()?;
            (resolved.language == target).then_some(tool)
        })
    }

    /// JSON schema of the config file.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(FormatterConfig)).unwrap_or_default()
    }
}
