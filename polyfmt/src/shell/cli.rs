//! # polyfmt CLI
//!
//! Command-line definition and mode dispatch. Formatted code goes to stdout and
//! diagnostics to stderr, so the binary can sit in a pipe. Failures exit with
//! the sysexits-style code of their category.

use crate::{
    config::{FormatterConfig, MAX_TIMEOUT_SECONDS},
    dispatcher::{Dispatcher, FormatRequest},
    error::FormatError,
    language::LanguageRegistry,
    tool_availability,
    utils::logging::init_logging,
};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tokio::io::AsyncReadExt;

/// Request bodies above this size are rejected unless `--max-input-bytes` says
/// otherwise.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Exit code for `--check-tools` when a formatter is missing (EX_UNAVAILABLE).
const EXIT_TOOLS_MISSING: i32 = 69;

/// polyfmt: format source code in many languages from one entry point.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "polyfmt formats a snippet of source code and prints the result.

JavaScript/TypeScript, JSON, HTML and CSS are formatted in-process. Python,
Java, C/C++ and XML are piped through external formatters (black,
google-java-format, clang-format, xmllint), which can be replaced in
polyfmt.toml.

Examples:
  echo '{\"a\":1}' | polyfmt --language json
  polyfmt --language py script.py
  polyfmt --check-tools"
)]
pub struct Cli {
    /// Language of the input (any alias, e.g. js, ts, py, c++, htm)
    #[arg(
        long,
        short = 'l',
        required_unless_present_any = ["list_languages", "check_tools", "print_config_schema"]
    )]
    pub language: Option<String>,

    /// File to format; stdin when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Print the success or error body as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Timeout for external formatters in seconds (overrides the config file)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECONDS))]
    pub timeout: Option<u64>,

    /// Path to the config file (default: ./polyfmt.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Largest accepted input in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_INPUT_BYTES)]
    pub max_input_bytes: usize,

    /// List supported languages, their aliases and formatters, then exit
    #[arg(long)]
    pub list_languages: bool,

    /// Probe every external formatter and report which are missing
    #[arg(long)]
    pub check_tools: bool,

    /// Print the JSON schema of the config file and exit
    #[arg(long)]
    pub print_config_schema: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Log to a daily rolling file in the user cache directory instead of stderr
    #[arg(long)]
    pub log_to_file: bool,
}

/// Parses the process arguments and runs. Returns the process exit code.
pub async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let log_level = if cli.debug { "debug" } else { "warn" };
    init_logging(log_level, cli.log_to_file)?;
    run_with(cli).await
}

/// Runs an already parsed command line. Logging is left to the caller.
pub async fn run_with(cli: Cli) -> Result<i32> {
    if cli.print_config_schema {
        let schema = serde_json::to_string_pretty(&FormatterConfig::json_schema())?;
        write_stdout(&format!("{schema}\n"))?;
        return Ok(0);
    }

    let config = load_config(&cli)?;
    let dispatcher = Dispatcher::from_config(&config)?;

    if cli.list_languages {
        list_languages(dispatcher.registry(), cli.json)?;
        return Ok(0);
    }

    if cli.check_tools {
        return check_tools(dispatcher.registry(), &config, cli.json).await;
    }

    let language = cli
        .language
        .clone()
        .ok_or_else(|| anyhow!("--language is required"))?;
    let result = match read_input(cli.file.as_deref(), cli.max_input_bytes).await? {
        Ok(code) => {
            dispatcher
                .format(&FormatRequest::new(code, language))
                .await
        }
        Err(too_large) => Err(too_large),
    };

    match result {
        Ok(response) => {
            if cli.json {
                write_stdout(&format!("{}\n", serde_json::to_string(&response)?))?;
            } else {
                write_stdout(&response.formatted_code)?;
            }
            Ok(0)
        }
        Err(err) => {
            report_error(&err, cli.json)?;
            Ok(err.category().exit_code())
        }
    }
}

fn load_config(cli: &Cli) -> Result<FormatterConfig> {
    let working_dir = std::env::current_dir().context("Failed to get current working directory")?;
    let mut config = FormatterConfig::discover(cli.config.as_deref(), &working_dir)?;
    if let Some(timeout) = cli.timeout {
        tracing::debug!("Timeout overridden on the command line: {}s", timeout);
        config.timeout_seconds = timeout;
    }
    Ok(config)
}

/// Reads the whole input. The outer error is an I/O failure; the inner one is a
/// size-limit rejection reported like any other format error.
async fn read_input(
    file: Option<&Path>,
    max_input_bytes: usize,
) -> Result<Result<String, FormatError>> {
    let bytes = match file {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = Vec::new();
            // One byte past the limit is enough to know it was exceeded.
            let limit = u64::try_from(max_input_bytes)
                .unwrap_or(u64::MAX)
                .saturating_add(1);
            tokio::io::stdin()
                .take(limit)
                .read_to_end(&mut buffer)
                .await
                .context("Failed to read stdin")?;
            buffer
        }
    };

    if bytes.len() > max_input_bytes {
        return Ok(Err(FormatError::InputTooLarge {
            limit: max_input_bytes,
            actual: bytes.len(),
        }));
    }
    let code = String::from_utf8(bytes).context("Input is not valid UTF-8")?;
    Ok(Ok(code))
}

fn report_error(err: &FormatError, json: bool) -> Result<()> {
    if err.category().is_server_fault() {
        tracing::warn!("Format failed ({}): {}", err.category(), err);
    } else {
        tracing::debug!("Format failed ({}): {}", err.category(), err);
    }
    if json {
        write_stdout(&format!("{}\n", serde_json::to_string(&err.to_body())?))?;
        return Ok(());
    }
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "polyfmt: {err}")?;
    if let Some(detail) = err.detail().map(str::trim_end).filter(|d| !d.is_empty()) {
        writeln!(stderr, "{detail}")?;
    }
    Ok(())
}

fn list_languages(registry: &LanguageRegistry, json: bool) -> Result<()> {
    let languages = registry.languages();
    if json {
        write_stdout(&format!("{}\n", serde_json::to_string_pretty(&languages)?))?;
        return Ok(());
    }
    let mut output = String::new();
    for info in &languages {
        output.push_str(&format!(
            "{:<12} {:<40} {}\n",
            info.language.name(),
            info.aliases.join(", "),
            info.strategy.describe()
        ));
    }
    write_stdout(&output)
}

async fn check_tools(
    registry: &LanguageRegistry,
    config: &FormatterConfig,
    json: bool,
) -> Result<i32> {
    tracing::info!("Probing external formatters");
    let summary = tool_availability::probe_tools(registry, config).await;
    if json {
        let missing: Vec<_> = summary
            .missing
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "language": tool.language,
                    "command": tool.command,
                    "message": tool.message,
                    "installInstructions": tool.install_instructions,
                })
            })
            .collect();
        let available: Vec<_> = summary
            .available
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "language": tool.language,
                    "command": tool.command,
                    "version": tool.version,
                })
            })
            .collect();
        let body = serde_json::json!({ "available": available, "missing": missing });
        write_stdout(&format!("{}\n", serde_json::to_string_pretty(&body)?))?;
    } else {
        write_stdout(&format!("{}\n", tool_availability::format_report(&summary)))?;
    }
    Ok(if summary.all_available() {
        0
    } else {
        EXIT_TOOLS_MISSING
    })
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
