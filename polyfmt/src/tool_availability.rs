//! Availability probes for external formatters.
//!
//! Every language formatted by a subprocess gets one probe: its command run with
//! version arguments and empty input. Probes run concurrently through the same
//! [`ProcessExecutor`](crate::executor::ProcessExecutor) used for real format
//! calls, so a missing binary, a hang and a failing exit are classified exactly
//! the way a format request would see them.

use std::fmt::Write;

use crate::config::FormatterConfig;
use crate::language::{Language, LanguageRegistry};

mod engine;

/// An external formatter whose probe failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTool {
    pub language: Language,
    pub command: String,
    /// Human-readable message describing the failure.
    pub message: String,
    /// Optional install guidance for the tool.
    pub install_instructions: Option<String>,
}

/// An external formatter that answered its probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableTool {
    pub language: Language,
    pub command: String,
    /// First line the tool printed, usually its version.
    pub version: Option<String>,
}

/// Aggregate results of running availability probes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilitySummary {
    pub available: Vec<AvailableTool>,
    pub missing: Vec<MissingTool>,
}

impl AvailabilitySummary {
    pub fn all_available(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Probes every externally formatted language in `registry`.
pub async fn probe_tools(
    registry: &LanguageRegistry,
    config: &FormatterConfig,
) -> AvailabilitySummary {
    engine::probe_tools_impl(registry, config).await
}

fn write_item(output: &mut String, name: &str, message: &str, install_instructions: Option<&str>) {
    let _ = writeln!(output, "- {}: {}", name, message);
    if let Some(trimmed) = install_instructions
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let _ = writeln!(output, "  install: {}", trimmed);
    }
}

/// Human-readable report for `--check-tools`.
pub fn format_report(summary: &AvailabilitySummary) -> String {
    let mut output = String::new();

    for tool in &summary.available {
        let _ = writeln!(
            output,
            "ok {} ({}){}",
            tool.language,
            tool.command,
            tool.version
                .as_deref()
                .map(|v| format!(": {v}"))
                .unwrap_or_default()
        );
    }

    if summary.missing.is_empty() {
        output.push_str("All external formatters are available.");
        return output;
    }

    if !output.is_empty() {
        output.push('\n');
    }
    output.push_str("Formatters requiring attention:\n");
    for tool in &summary.missing {
        write_item(
            &mut output,
            tool.language.name(),
            &tool.message,
            tool.install_instructions.as_deref(),
        );
    }

    output.trim_end().to_string()
}
