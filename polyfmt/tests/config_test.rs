//! Config discovery and how overrides reshape the language table.

use polyfmt::config::{DEFAULT_CONFIG_FILE, FormatterConfig};
use polyfmt::dispatcher::Dispatcher;
use polyfmt::language::{FormatStrategy, Language, LanguageRegistry};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_discover_without_file_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let config = FormatterConfig::discover(None, temp.path()).unwrap();
    assert_eq!(config, FormatterConfig::default());
}

#[test]
fn test_discover_picks_up_working_directory_file() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(DEFAULT_CONFIG_FILE),
        "timeout_seconds = 3\nindent_width = 2\n",
    )
    .unwrap();
    let config = FormatterConfig::discover(None, temp.path()).unwrap();
    assert_eq!(config.timeout(), Duration::from_secs(3));
    assert_eq!(config.indent_width, 2);
    assert_eq!(config.line_width, 80);
}

#[test]
fn test_explicit_path_wins_and_must_exist() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(DEFAULT_CONFIG_FILE), "timeout_seconds = 3\n").unwrap();
    let explicit = temp.path().join("other.toml");
    std::fs::write(&explicit, "timeout_seconds = 7\n").unwrap();

    let config = FormatterConfig::discover(Some(&explicit), temp.path()).unwrap();
    assert_eq!(config.timeout_seconds, 7);

    let missing = temp.path().join("missing.toml");
    let err = FormatterConfig::discover(Some(&missing), temp.path()).unwrap_err();
    assert!(format!("{err:#}").contains("missing.toml"));
}

#[test]
fn test_tool_override_replaces_strategy() {
    let config = FormatterConfig::load_from_str(
        r#"
        [tools.c]
        command = "/opt/llvm/bin/clang-format"
        args = ["--style=LLVM"]
        "#,
    )
    .unwrap();
    let registry = LanguageRegistry::from_config(&config).unwrap();
    assert_eq!(
        registry.strategy(Language::Cpp),
        Some(&FormatStrategy::external(
            "/opt/llvm/bin/clang-format",
            &["--style=LLVM"]
        ))
    );
    // Other languages keep their defaults.
    assert_eq!(
        registry.resolve("xml").unwrap().strategy,
        FormatStrategy::external("xmllint", &["--format", "-"])
    );
}

#[test]
fn test_library_language_cannot_be_overridden() {
    let err = FormatterConfig::load_from_str(
        r#"
        [tools.json]
        command = "jq"
        "#,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("formatted in-process"));
}

#[test]
fn test_unknown_keys_and_languages_rejected() {
    assert!(FormatterConfig::load_from_str("timeout = 5").is_err());
    assert!(FormatterConfig::load_from_str("[tools.cobol]\ncommand = \"x\"").is_err());
    assert!(FormatterConfig::load_from_str("[tools.python]\ncommand = \"  \"").is_err());
    assert!(FormatterConfig::load_from_str("indent_width = 0").is_err());
}

#[test]
fn test_timeout_is_bounded() {
    let err = FormatterConfig::load_from_str("timeout_seconds = 9223372036854775807").unwrap_err();
    assert!(format!("{err:#}").contains("timeout_seconds must be at most 3600"));

    let config = FormatterConfig::load_from_str("timeout_seconds = 3600").unwrap();
    let dispatcher = Dispatcher::from_config(&config).unwrap();
    assert!(dispatcher.registry().resolve("py").is_ok());
}

#[tokio::test]
async fn test_configured_style_reaches_library_formatters() {
    let config = FormatterConfig::load_from_str("indent_width = 2").unwrap();
    let dispatcher = Dispatcher::from_config(&config).unwrap();
    let response = dispatcher
        .format(&polyfmt::FormatRequest::new(r#"{"a":1}"#, "json"))
        .await
        .unwrap();
    assert_eq!(response.formatted_code, "{\n  \"a\": 1\n}\n");
}
