use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::FormatterConfig;
use crate::executor::ProcessExecutor;
use crate::language::{FormatStrategy, Language, LanguageRegistry};
use crate::outcome::ExecutionOutcome;

use super::{AvailabilitySummary, AvailableTool, MissingTool};

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct ProbePlan {
    language: Language,
    command: String,
    version_args: Vec<String>,
    timeout: Duration,
    install_instructions: Option<String>,
}

#[derive(Debug)]
struct ProbeOutcome {
    plan: ProbePlan,
    outcome: ExecutionOutcome,
}

pub(super) async fn probe_tools_impl(
    registry: &LanguageRegistry,
    config: &FormatterConfig,
) -> AvailabilitySummary {
    let plans = build_probe_plans(registry, config);
    debug!("Prepared {} availability probe plans", plans.len());

    if plans.is_empty() {
        return AvailabilitySummary::default();
    }

    let outcomes = execute_probes(plans).await;
    process_probe_outcomes(outcomes)
}

fn build_probe_plans(registry: &LanguageRegistry, config: &FormatterConfig) -> Vec<ProbePlan> {
    Language::all()
        .filter_map(|language| {
            let FormatStrategy::ExternalProcess { command, .. } = registry.strategy(language)?
            else {
                return None;
            };
            let tool = config.tool_override(language.name());
            Some(ProbePlan {
                language,
                command: command.clone(),
                version_args: tool
                    .map(|t| t.version_args.clone())
                    .unwrap_or_else(|| vec!["--version".to_string()]),
                timeout: DEFAULT_PROBE_TIMEOUT.min(config.timeout()),
                install_instructions: tool
                    .and_then(|t| t.install_instructions.clone())
                    .or_else(|| default_install_instructions(language).map(str::to_string)),
            })
        })
        .collect()
}

fn default_install_instructions(language: Language) -> Option<&'static str> {
    match language {
        Language::Python => Some("pip install black"),
        Language::Java => Some(
            "Download google-java-format from https://github.com/google/google-java-format/releases",
        ),
        Language::Cpp => Some("Install clang-format (e.g. apt install clang-format)"),
        Language::Xml => Some("Install libxml2 utilities (e.g. apt install libxml2-utils)"),
        _ => None,
    }
}

async fn execute_probes(plans: Vec<ProbePlan>) -> Vec<ProbeOutcome> {
    let probe_tasks: Vec<_> = plans
        .into_iter()
        .map(|plan| tokio::spawn(async move { run_probe(plan).await }))
        .collect();

    futures::future::join_all(probe_tasks)
        .await
        .into_iter()
        .filter_map(|result| result.ok())
        .collect()
}

async fn run_probe(plan: ProbePlan) -> ProbeOutcome {
    let executor = ProcessExecutor::new(plan.timeout);
    let outcome = executor
        .run_command("", &plan.command, &plan.version_args)
        .await;
    ProbeOutcome { plan, outcome }
}

fn process_probe_outcomes(outcomes: Vec<ProbeOutcome>) -> AvailabilitySummary {
    let mut summary = AvailabilitySummary::default();

    for ProbeOutcome { plan, outcome } in outcomes {
        let failure = match outcome {
            ExecutionOutcome::Success { formatted } => {
                let version = formatted
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(str::to_string);
                debug!(
                    "Probe success for '{}' ({}): {}",
                    plan.language,
                    plan.command,
                    version.as_deref().unwrap_or("<empty>")
                );
                summary.available.push(AvailableTool {
                    language: plan.language,
                    command: plan.command,
                    version,
                });
                continue;
            }
            ExecutionOutcome::ToolUnavailable { detail } => {
                format!("command not found or not executable ({})", detail.trim())
            }
            ExecutionOutcome::ToolFailure { exit_code, detail } => {
                format!("probe exited with code {} ({})", exit_code, detail.trim())
            }
            ExecutionOutcome::Timeout => {
                format!("probe timed out after {}ms", plan.timeout.as_millis())
            }
            ExecutionOutcome::ValidationFailure { detail } => detail,
        };

        let message = build_failure_message(&plan, &failure);
        log_probe_failure(plan.language, &message, plan.install_instructions.as_deref());
        summary.missing.push(MissingTool {
            language: plan.language,
            command: plan.command,
            message,
            install_instructions: plan.install_instructions,
        });
    }

    summary
}

fn build_failure_message(plan: &ProbePlan, failure: &str) -> String {
    format!(
        "Formatter '{}' unavailable. Probe {:?} {:?} failed: {}",
        plan.command, plan.command, plan.version_args, failure
    )
}

fn log_probe_failure(language: Language, message: &str, install_instructions: Option<&str>) {
    warn!("{message}");
    if let Some(instructions) = install_instructions {
        info!("Install hint for '{}': {}", language, instructions.trim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plans_cover_external_languages_only() {
        let registry = LanguageRegistry::builtin();
        let plans = build_probe_plans(&registry, &FormatterConfig::default());
        let languages: Vec<_> = plans.iter().map(|p| p.language).collect();
        assert_eq!(
            languages,
            vec![Language::Python, Language::Java, Language::Cpp, Language::Xml]
        );
        assert!(plans.iter().all(|p| p.install_instructions.is_some()));
    }

    #[test]
    fn test_override_supplies_probe_arguments() {
        let config = FormatterConfig::load_from_str(
            r#"
            [tools.py]
            command = "ruff"
            args = ["format", "-"]
            version_args = ["version"]
            install_instructions = "pipx install ruff"
            "#,
        )
        .unwrap();
        let registry = LanguageRegistry::from_config(&config).unwrap();
        let plans = build_probe_plans(&registry, &config);
        let python = plans
            .iter()
            .find(|p| p.language == Language::Python)
            .unwrap();
        assert_eq!(python.command, "ruff");
        assert_eq!(python.version_args, vec!["version".to_string()]);
        assert_eq!(python.install_instructions.as_deref(), Some("pipx install ruff"));
    }

    #[test]
    fn test_timeout_outcome_is_reported_missing() {
        let plan = ProbePlan {
            language: Language::Java,
            command: "google-java-format".to_string(),
            version_args: vec!["--version".to_string()],
            timeout: Duration::from_millis(250),
            install_instructions: None,
        };
        let summary = process_probe_outcomes(vec![ProbeOutcome {
            plan,
            outcome: ExecutionOutcome::Timeout,
        }]);
        assert!(summary.available.is_empty());
        assert!(summary.missing[0].message.contains("timed out after 250ms"));
    }
}
