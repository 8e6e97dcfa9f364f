//! In-process formatting through embedded libraries.
//!
//! Each [`ParserProfile`] maps to one library:
//!
//! | profile | library |
//! |---|---|
//! | `TypeScript` | `dprint-plugin-typescript`, parsed as TSX so plain JS, TS and JSX all work |
//! | `Json` | validated by `serde_json`, then re-indented token by token so key order, number text and string escapes stay as written |
//! | `Html` | `markup_fmt` |
//! | `Css` | `malva`, parsed as SCSS which also accepts plain CSS |
//!
//! The style is fixed when the executor is built, so identical input always
//! produces identical output. Parse errors become `ValidationFailure` with the
//! library's message untouched.

use super::StrategyExecutor;
use crate::config::FormatterConfig;
use crate::language::{FormatStrategy, ParserProfile};
use crate::outcome::ExecutionOutcome;
use async_trait::async_trait;
use dprint_plugin_typescript::configuration::{
    Configuration as ScriptConfiguration, ConfigurationBuilder, UseBraces,
};
use std::{convert::Infallible, fmt, path::Path};

/// File name handed to the script formatter; the extension selects its parser.
const SCRIPT_FILE_NAME: &str = "input.tsx";

/// Fixed layout settings shared by every library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatStyle {
    pub indent_width: u8,
    pub line_width: u32,
}

impl Default for FormatStyle {
    fn default() -> Self {
        Self {
            indent_width: 4,
            line_width: 80,
        }
    }
}

impl From<&FormatterConfig> for FormatStyle {
    fn from(config: &FormatterConfig) -> Self {
        Self {
            indent_width: config.indent_width,
            line_width: config.line_width,
        }
    }
}

/// Executor for [`FormatStrategy::Library`].
#[derive(Clone)]
pub struct LibraryExecutor {
    style: FormatStyle,
    script: ScriptConfiguration,
    stylesheet: malva::config::FormatOptions,
    markup: markup_fmt::config::FormatOptions,
}

impl LibraryExecutor {
    pub fn new(style: FormatStyle) -> Self {
        let mut builder = ConfigurationBuilder::new();
        builder
            .indent_width(style.indent_width)
            .line_width(style.line_width)
            // Braces are structure, not layout; keep them as written.
            .use_braces(UseBraces::Maintain);
        let script = builder.build();

        let stylesheet = malva::config::FormatOptions {
            layout: malva::config::LayoutOptions {
                indent_width: usize::from(style.indent_width),
                print_width: style.line_width as usize,
                ..Default::default()
            },
            ..Default::default()
        };

        let markup = markup_fmt::config::FormatOptions {
            layout: markup_fmt::config::LayoutOptions {
                indent_width: usize::from(style.indent_width),
                print_width: style.line_width as usize,
                ..Default::default()
            },
            ..Default::default()
        };

        Self {
            style,
            script,
            stylesheet,
            markup,
        }
    }

    /// Formats `code` with the library behind `profile`.
    pub fn format(&self, code: &str, profile: ParserProfile) -> ExecutionOutcome {
        tracing::debug!("Formatting {} bytes in-process as {}", code.len(), profile);
        let result = match profile {
            ParserProfile::TypeScript => self.format_script(code),
            ParserProfile::Json => self.format_json(code),
            ParserProfile::Html => self.format_markup(code),
            ParserProfile::Css => self.format_stylesheet(code),
        };
        match result {
            Ok(formatted) => ExecutionOutcome::success(formatted),
            Err(detail) => {
                tracing::debug!("{} formatter rejected input: {}", profile, detail);
                ExecutionOutcome::validation_failure(detail)
            }
        }
    }

    fn format_script(&self, code: &str) -> Result<String, String> {
        let formatted = dprint_plugin_typescript::format_text(
            dprint_plugin_typescript::FormatTextOptions {
                path: Path::new(SCRIPT_FILE_NAME),
                extension: None,
                text: code.to_string(),
                config: &self.script,
                external_formatter: None,
            },
        )
        .map_err(|err| err.to_string())?;
        // `None` means the input is already formatted.
        Ok(formatted.unwrap_or_else(|| code.to_string()))
    }

    fn format_json(&self, code: &str) -> Result<String, String> {
        // Syntax check only; the output is built from the original tokens.
        serde_json::from_str::<serde::de::IgnoredAny>(code).map_err(|err| err.to_string())?;
        let indent = " ".repeat(usize::from(self.style.indent_width));
        Ok(reindent_json(code, &indent))
    }

    fn format_markup(&self, code: &str) -> Result<String, String> {
        // Embedded <style>/<script> bodies are kept as written.
        markup_fmt::format_text(
            code,
            markup_fmt::Language::Html,
            &self.markup,
            |embedded, _| Ok::<_, Infallible>(embedded.into()),
        )
        .map_err(|err| err.to_string())
    }

    fn format_stylesheet(&self, code: &str) -> Result<String, String> {
        malva::format_text(code, malva::Syntax::Scss, &self.stylesheet)
            .map_err(|err| err.to_string())
    }
}

impl fmt::Debug for LibraryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryExecutor")
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

/// Lays out a syntactically valid JSON document one member per line.
///
/// Strings and scalars are copied byte for byte; only whitespace between
/// tokens changes. Empty containers stay on one line (`{}`, `[]`).
fn reindent_json(code: &str, indent: &str) -> String {
    fn newline(out: &mut String, indent: &str, depth: usize) {
        out.push('\n');
        for _ in 0..depth {
            out.push_str(indent);
        }
    }

    let mut out = String::with_capacity(code.len() + code.len() / 2);
    let mut depth = 0usize;
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                out.push(c);
                while let Some(s) = chars.next() {
                    out.push(s);
                    match s {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '{' | '[' => {
                let close = if c == '{' { '}' } else { ']' };
                while chars.next_if(|n| is_json_whitespace(*n)).is_some() {}
                out.push(c);
                if chars.next_if_eq(&close).is_some() {
                    out.push(close);
                } else {
                    depth += 1;
                    newline(&mut out, indent, depth);
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, indent, depth);
                out.push(c);
            }
            ',' => {
                out.push(c);
                newline(&mut out, indent, depth);
            }
            ':' => out.push_str(": "),
            c if is_json_whitespace(c) => {}
            other => out.push(other),
        }
    }

    out.push('\n');
    out
}

fn is_json_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

impl Default for LibraryExecutor {
    fn default() -> Self {
        Self::new(FormatStyle::default())
    }
}

#[async_trait]
impl StrategyExecutor for LibraryExecutor {
    async fn run(&self, code: &str, strategy: &FormatStrategy) -> ExecutionOutcome {
        match strategy {
            FormatStrategy::Library { profile } => self.format(code, *profile),
            FormatStrategy::ExternalProcess { command, .. } => {
                ExecutionOutcome::tool_unavailable(format!(
                    "library executor cannot run external command '{command}'"
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_configured_indent() {
        let executor = LibraryExecutor::new(FormatStyle {
            indent_width: 2,
            line_width: 80,
        });
        let outcome = executor.format(r#"{"a":[1,2]}"#, ParserProfile::Json);
        assert_eq!(
            outcome.formatted(),
            Some("{\n  \"a\": [\n    1,\n    2\n  ]\n}\n")
        );
    }

    #[test]
    fn test_json_keeps_key_order_and_number_text() {
        let executor = LibraryExecutor::default();
        let outcome = executor.format(r#"{"z":1.50,"a":1e3}"#, ParserProfile::Json);
        assert_eq!(
            outcome.formatted(),
            Some("{\n    \"z\": 1.50,\n    \"a\": 1e3\n}\n")
        );
    }

    #[test]
    fn test_json_syntax_error_is_validation_failure() {
        let executor = LibraryExecutor::default();
        let outcome = executor.format(r#"{"a":}"#, ParserProfile::Json);
        match outcome {
            ExecutionOutcome::ValidationFailure { detail } => {
                assert!(detail.contains("line 1"), "unexpected detail: {detail}");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_json_keeps_strings_and_empty_containers() {
        let executor = LibraryExecutor::default();
        let outcome = executor.format(
            r#"{ "s" : "a,b:{\"c\"}\u00e9", "o":{ }, "l":[ ] }"#,
            ParserProfile::Json,
        );
        assert_eq!(
            outcome.formatted(),
            Some("{\n    \"s\": \"a,b:{\\\"c\\\"}\\u00e9\",\n    \"o\": {},\n    \"l\": []\n}\n")
        );
    }

    #[test]
    fn test_json_scalar_document() {
        let executor = LibraryExecutor::default();
        assert_eq!(
            executor.format("  -0.10E+2 ", ParserProfile::Json).formatted(),
            Some("-0.10E+2\n")
        );
    }

    #[test]
    fn test_debug_shows_style() {
        let rendered = format!("{:?}", LibraryExecutor::default());
        assert!(rendered.starts_with("LibraryExecutor { style: FormatStyle"));
    }

    #[tokio::test]
    async fn test_external_strategy_is_rejected() {
        let executor = LibraryExecutor::default();
        let strategy = FormatStrategy::external("black", &["-"]);
        let outcome = executor.run("x = 1", &strategy).await;
        assert!(matches!(outcome, ExecutionOutcome::ToolUnavailable { .. }));
    }
}
