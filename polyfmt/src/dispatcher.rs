//! # Dispatcher
//!
//! The entry point of the formatting core. A call goes through four steps:
//!
//! 1. **Validate**: code and language must be non-empty after trimming. Empty
//!    input is rejected before any executor is touched.
//! 2. **Resolve**: the [`LanguageRegistry`] maps the identifier to a strategy or
//!    reports it as unsupported together with the supported names.
//! 3. **Execute**: exactly one executor runs, chosen by the strategy's family.
//! 4. **Report**: [`Dispatcher::dispatch`] hands back the executor's
//!    [`ExecutionOutcome`] untouched; [`Dispatcher::format`] turns it into a
//!    [`FormatResponse`] or a categorized [`FormatError`].
//!
//! The dispatcher keeps no mutable state, so one instance can serve any number
//! of concurrent calls and several instances can coexist in a process.

use crate::config::FormatterConfig;
use crate::error::{ConfigError, FormatError, RequestError};
use crate::executor::{FormatStyle, LibraryExecutor, ProcessExecutor, StrategyExecutor};
use crate::language::{FormatStrategy, Language, LanguageRegistry};
use crate::outcome::ExecutionOutcome;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

/// Inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRequest {
    pub code: String,
    pub language: String,
}

impl FormatRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
        }
    }
}

/// Success body: `{ formattedCode, language, inputChars, outputChars }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatResponse {
    pub formatted_code: String,
    /// Canonical language the request resolved to.
    pub language: Language,
    pub input_chars: usize,
    pub output_chars: usize,
}

/// Resolves, selects an executor and runs it.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: LanguageRegistry,
    library: Arc<dyn StrategyExecutor>,
    process: Arc<dyn StrategyExecutor>,
    process_timeout: Duration,
}

impl Dispatcher {
    /// Dispatcher with built-in languages and default settings.
    pub fn new() -> Self {
        Self::with_executors(
            LanguageRegistry::builtin(),
            Arc::new(LibraryExecutor::default()),
            Arc::new(ProcessExecutor::default()),
            ProcessExecutor::default().timeout(),
        )
    }

    /// Dispatcher built from a validated configuration.
    pub fn from_config(config: &FormatterConfig) -> Result<Self, ConfigError> {
        let registry = LanguageRegistry::from_config(config)?;
        let process = ProcessExecutor::new(config.timeout());
        Ok(Self::with_executors(
            registry,
            Arc::new(LibraryExecutor::new(FormatStyle::from(config))),
            Arc::new(process),
            config.timeout(),
        ))
    }

    /// Dispatcher with caller-supplied executors. `process_timeout` is only
    /// used to word timeout errors.
    pub fn with_executors(
        registry: LanguageRegistry,
        library: Arc<dyn StrategyExecutor>,
        process: Arc<dyn StrategyExecutor>,
        process_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            library,
            process,
            process_timeout,
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Runs the request and returns the executor's outcome unchanged.
    ///
    /// # Errors
    ///
    /// Empty code, empty language and unsupported languages are rejected here,
    /// before any executor runs.
    pub async fn dispatch(
        &self,
        request: &FormatRequest,
    ) -> Result<ExecutionOutcome, RequestError> {
        let (_, strategy) = self.prepare(request)?;
        Ok(self.execute(&request.code, &strategy).await)
    }

    /// Runs the request and maps the outcome onto the boundary types.
    pub async fn format(&self, request: &FormatRequest) -> Result<FormatResponse, FormatError> {
        let (language, strategy) = self.prepare(request)?;
        let outcome = self.execute(&request.code, &strategy).await;

        let subject = match &strategy {
            FormatStrategy::ExternalProcess { command, .. } => command.clone(),
            FormatStrategy::Library { profile } => profile.to_string(),
        };
        match outcome {
            ExecutionOutcome::Success { formatted } => Ok(FormatResponse {
                input_chars: request.code.chars().count(),
                output_chars: formatted.chars().count(),
                formatted_code: formatted,
                language,
            }),
            failure => Err(FormatError::from_outcome(failure, &subject, self.process_timeout)
                .unwrap_or_else(|| FormatError::InvalidRequest {
                    detail: "formatter reported success without output".to_string(),
                })),
        }
    }

    fn prepare(&self, request: &FormatRequest) -> Result<(Language, FormatStrategy), RequestError> {
        if request.code.trim().is_empty() {
            return Err(RequestError::EmptyCode);
        }
        if request.language.trim().is_empty() {
            return Err(RequestError::EmptyLanguage);
        }
        let resolved = self
            .registry
            .resolve(&request.language)
            .map_err(RequestError::Unsupported)?;
        tracing::debug!(
            "Resolved language '{}' to {} via {}",
            request.language,
            resolved.language,
            resolved.strategy.describe()
        );
        Ok((resolved.language, resolved.strategy))
    }

    async fn execute(&self, code: &str, strategy: &FormatStrategy) -> ExecutionOutcome {
        let executor = match strategy {
            FormatStrategy::Library { .. } => &self.library,
            FormatStrategy::ExternalProcess { .. } => &self.process,
        };
        executor.run(code, strategy).await
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
