//! # Language Resolution
//!
//! Maps a caller-supplied language identifier onto the [`FormatStrategy`] that
//! formats it. Resolution is a table lookup: every alias points at one canonical
//! [`Language`], and every canonical language owns exactly one strategy.
//!
//! The table is built once, either from the built-in defaults
//! ([`LanguageRegistry::builtin`]) or from defaults patched by configuration
//! ([`LanguageRegistry::from_config`]). Adding a language means adding a row to
//! [`LANGUAGE_TABLE`], not another branch.

use crate::config::FormatterConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Canonical languages understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Json,
    Html,
    Css,
    Python,
    Java,
    #[serde(rename = "c++")]
    Cpp,
    Xml,
}

impl Language {
    /// Canonical name, as shown to users and used as a config key.
    pub fn name(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Json => "json",
            Language::Html => "html",
            Language::Css => "css",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "c++",
            Language::Xml => "xml",
        }
    }

    /// All canonical languages in display order.
    pub fn all() -> impl Iterator<Item = Language> {
        LANGUAGE_TABLE.iter().map(|entry| entry.language)
    }

    /// Looks up a canonical language by its canonical name (not by alias).
    pub fn from_name(name: &str) -> Option<Language> {
        Language::all().find(|language| language.name() == name)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parser profile handed to the in-process formatting library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserProfile {
    /// JavaScript, TypeScript and their JSX flavours.
    TypeScript,
    Json,
    Html,
    /// CSS and its SCSS/Less dialects.
    Css,
}

impl fmt::Display for ParserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParserProfile::TypeScript => "typescript",
            ParserProfile::Json => "json",
            ParserProfile::Html => "html",
            ParserProfile::Css => "css",
        };
        f.write_str(name)
    }
}

/// How a language gets formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatStrategy {
    /// In-process library call.
    Library { profile: ParserProfile },
    /// External formatter fed over stdin.
    ExternalProcess { command: String, args: Vec<String> },
}

impl FormatStrategy {
    pub fn library(profile: ParserProfile) -> Self {
        FormatStrategy::Library { profile }
    }

    pub fn external(command: impl Into<String>, args: &[&str]) -> Self {
        FormatStrategy::ExternalProcess {
            command: command.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, FormatStrategy::ExternalProcess { .. })
    }

    /// Short human description, used by `--list-languages`.
    pub fn describe(&self) -> String {
        match self {
            FormatStrategy::Library { profile } => format!("library ({profile})"),
            FormatStrategy::ExternalProcess { command, args } if args.is_empty() => {
                format!("process ({command})")
            }
            FormatStrategy::ExternalProcess { command, args } => {
                format!("process ({} {})", command, args.join(" "))
            }
        }
    }
}

/// One row of the built-in language table.
struct LanguageEntry {
    language: Language,
    aliases: &'static [&'static str],
    default_strategy: fn() -> FormatStrategy,
}

/// Built-in languages. The first alias of each row is its canonical name.
const LANGUAGE_TABLE: &[LanguageEntry] = &[
    LanguageEntry {
        language: Language::JavaScript,
        aliases: &[
            "javascript",
            "js",
            "jsx",
            "mjs",
            "cjs",
            "typescript",
            "ts",
            "tsx",
        ],
        default_strategy: || FormatStrategy::library(ParserProfile::TypeScript),
    },
    LanguageEntry {
        language: Language::Json,
        aliases: &["json"],
        default_strategy: || FormatStrategy::library(ParserProfile::Json),
    },
    LanguageEntry {
        language: Language::Html,
        aliases: &["html", "htm"],
        default_strategy: || FormatStrategy::library(ParserProfile::Html),
    },
    LanguageEntry {
        language: Language::Css,
        aliases: &["css", "scss", "less"],
        default_strategy: || FormatStrategy::library(ParserProfile::Css),
    },
    LanguageEntry {
        language: Language::Python,
        aliases: &["python", "py"],
        default_strategy: || FormatStrategy::external("black", &["-q", "-"]),
    },
    LanguageEntry {
        language: Language::Java,
        aliases: &["java"],
        default_strategy: || FormatStrategy::external("google-java-format", &["-"]),
    },
    LanguageEntry {
        language: Language::Cpp,
        aliases: &["c++", "cpp", "c", "cc", "h", "hpp"],
        default_strategy: || FormatStrategy::external("clang-format", &[]),
    },
    LanguageEntry {
        language: Language::Xml,
        aliases: &["xml"],
        default_strategy: || FormatStrategy::external("xmllint", &["--format", "-"]),
    },
];

/// A language identifier that has no mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    /// The identifier exactly as the caller supplied it.
    pub language: String,
    /// Canonical names of every supported language.
    pub supported: Vec<&'static str>,
}

/// Resolved row: canonical language plus its strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub language: Language,
    pub strategy: FormatStrategy,
}

/// Listing row for `--list-languages`.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    pub language: Language,
    pub aliases: Vec<&'static str>,
    pub strategy: FormatStrategy,
}

/// Immutable alias and strategy table.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    aliases: HashMap<&'static str, Language>,
    strategies: HashMap<Language, FormatStrategy>,
}

impl LanguageRegistry {
    /// Registry with the built-in strategy for every language.
    pub fn builtin() -> Self {
        let mut aliases = HashMap::new();
        let mut strategies = HashMap::new();
        for entry in LANGUAGE_TABLE {
            for alias in entry.aliases {
                aliases.insert(*alias, entry.language);
            }
            strategies.insert(entry.language, (entry.default_strategy)());
        }
        Self {
            aliases,
            strategies,
        }
    }

    /// Registry with external tool commands replaced by `config.tools`.
    ///
    /// # Errors
    ///
    /// Fails when an override names an unknown language or a language that is
    /// formatted in-process.
    pub fn from_config(config: &FormatterConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::builtin();
        for (key, tool) in &config.tools {
            let language = registry
                .lookup(key)
                .ok_or_else(|| ConfigError::UnknownLanguage(key.clone()))?;
            let strategy = registry
                .strategies
                .get_mut(&language)
                .ok_or_else(|| ConfigError::UnknownLanguage(key.clone()))?;
            if !strategy.is_external() {
                return Err(ConfigError::NotOverridable(language));
            }
            tracing::debug!(
                "Overriding formatter for '{}' with '{}' {:?}",
                language,
                tool.command,
                tool.args
            );
            *strategy = FormatStrategy::ExternalProcess {
                command: tool.command.clone(),
                args: tool.args.clone(),
            };
        }
        Ok(registry)
    }

    fn lookup(&self, identifier: &str) -> Option<Language> {
        let normalized = identifier.trim().to_lowercase();
        self.aliases.get(normalized.as_str()).copied()
    }

    /// Resolves an identifier (any alias, any case, surrounding whitespace
    /// ignored) to its canonical language and strategy.
    pub fn resolve(&self, identifier: &str) -> Result<Resolved, Unsupported> {
        let resolved = self.lookup(identifier).and_then(|language| {
            self.strategies.get(&language).map(|strategy| Resolved {
                language,
                strategy: strategy.clone(),
            })
        });
        resolved.ok_or_else(|| Unsupported {
            language: identifier.to_string(),
            supported: self.canonical_names(),
        })
    }

    /// Strategy for a canonical language.
    pub fn strategy(&self, language: Language) -> Option<&FormatStrategy> {
        self.strategies.get(&language)
    }

    /// Canonical names in display order.
    pub fn canonical_names(&self) -> Vec<&'static str> {
        Language::all().map(Language::name).collect()
    }

    /// Every language with its aliases and current strategy, in display order.
    pub fn languages(&self) -> Vec<LanguageInfo> {
        LANGUAGE_TABLE
            .iter()
            .filter_map(|entry| {
                self.strategies.get(&entry.language).map(|strategy| LanguageInfo {
                    language: entry.language,
                    aliases: entry.aliases.to_vec(),
                    strategy: strategy.clone(),
                })
            })
            .collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
