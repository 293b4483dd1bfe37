//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::format_push_string)]

use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[cfg(feature = "agent")]
use crate::cli::output::format_response;
use crate::cli::output::{
    OutputFormat, format_classification, format_prompt, format_quality_report,
};
use crate::cli::parser::{Cli, Commands};
use crate::core::{IntentClassifier, PersonaSet, PromptComposer, QualityScorer, QueryCategory};
use crate::error::{CommandError, Result};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Classify { question } => cmd_classify(question, format),
        Commands::Score {
            category,
            question,
            answer_file,
        } => cmd_score(
            category.as_deref(),
            question,
            answer_file.as_deref(),
            format,
        ),
        Commands::Prompt {
            question,
            category,
            context_file,
            prompt_dir,
        } => cmd_prompt(
            question,
            category.as_deref(),
            context_file.as_deref(),
            prompt_dir.as_deref(),
            format,
        ),
        #[cfg(feature = "agent")]
        Commands::Ask {
            question,
            consensus,
            context_file,
            timeout,
            model,
            prompt_dir,
            log_file,
        } => {
            let params = AskParams {
                question,
                consensus: *consensus,
                context_file: context_file.as_deref(),
                timeout_secs: *timeout,
                model: model.as_deref(),
                prompt_dir: prompt_dir.as_deref(),
                log_file: log_file.as_deref(),
            };
            cmd_ask(&params, format)
        }
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

fn cmd_classify(question: &str, format: OutputFormat) -> Result<String> {
    let result = IntentClassifier::new().classify_detailed(question);
    Ok(format_classification(&result, format))
}

fn cmd_score(
    category: Option<&str>,
    question: &str,
    answer_file: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let category = match category {
        Some(name) => parse_category(name)?,
        None => IntentClassifier::new().classify(question),
    };

    let answer = match answer_file {
        Some(path) => read_text(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let report = QualityScorer::new().score(&answer, category, question);
    Ok(format_quality_report(&report, category, format))
}

fn cmd_prompt(
    question: &str,
    category: Option<&str>,
    context_file: Option<&Path>,
    prompt_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    if question.trim().is_empty() {
        return Err(CommandError::InvalidArgument("question cannot be empty".to_string()).into());
    }

    let category = match category {
        Some(name) => parse_category(name)?,
        None => IntentClassifier::new().classify(question),
    };
    let context = context_file.map(read_text).transpose()?;

    let composer = PromptComposer::new(PersonaSet::load(prompt_dir));
    let prompt = composer.compose(category, question, context.as_deref());
    Ok(format_prompt(&prompt, category, format))
}

/// Parameters for the ask command.
#[cfg(feature = "agent")]
#[derive(Debug, Clone)]
struct AskParams<'a> {
    question: &'a str,
    consensus: bool,
    context_file: Option<&'a Path>,
    timeout_secs: Option<u64>,
    model: Option<&'a str>,
    prompt_dir: Option<&'a Path>,
    log_file: Option<&'a Path>,
}

#[cfg(feature = "agent")]
fn cmd_ask(params: &AskParams<'_>, format: OutputFormat) -> Result<String> {
    use std::sync::Arc;

    use crate::agent::{AgentConfig, JsonlSink, Orchestrator, StaticContext, create_provider};

    let mut builder = AgentConfig::builder().from_env();
    if let Some(model) = params.model {
        builder = builder.model(model);
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    if let Some(secs) = params.timeout_secs {
        if secs == 0 {
            return Err(
                CommandError::InvalidArgument("--timeout must be at least 1 second".to_string())
                    .into(),
            );
        }
        builder = builder.timeout(std::time::Duration::from_secs(secs));
    }
    let config = builder.build()?;
    let provider = create_provider(&config)?;

    let mut orchestrator = Orchestrator::new(provider, config);
    if let Some(path) = params.context_file {
        let retriever = StaticContext::from_file(path).map_err(|e| {
            CommandError::ExecutionFailed(format!(
                "Failed to read context file {}: {e}",
                path.display()
            ))
        })?;
        orchestrator = orchestrator.with_retriever(Arc::new(retriever));
    }
    if let Some(path) = params.log_file {
        orchestrator = orchestrator.with_sink(Arc::new(JsonlSink::new(path)));
    }

    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    let response = runtime.block_on(
        orchestrator.consult_or_fallback(params.question, params.consensus),
    )?;

    Ok(format_response(&response, format))
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PersonaSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PersonaSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                Ok(output)
            }
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            let json = serde_json::json!({
                "directory": target_dir.display().to_string(),
                "written": written
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
            });
            Ok(format.to_json(&json))
        }
    }
}

/// Parses a category argument.
fn parse_category(name: &str) -> Result<QueryCategory> {
    QueryCategory::parse(name).ok_or_else(|| {
        CommandError::InvalidArgument(format!(
            "unknown category '{name}' (expected one of: {})",
            QueryCategory::ALL
                .iter()
                .map(QueryCategory::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ))
        .into()
    })
}

/// Reads a UTF-8 text file with a path-bearing error.
fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to read {}: {e}", path.display())).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args).unwrap_or_else(|_| unreachable!());
        execute(&cli)
    }

    #[test]
    fn test_classify_text() {
        let out = run(&["consult-rs", "classify", "Can you explain how a root canal works?"])
            .unwrap_or_default();
        assert!(out.starts_with("Category: procedure"));
    }

    #[test]
    fn test_score_from_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let path = dir.path().join("answer.txt");
        std::fs::write(&path, "").unwrap_or_else(|_| unreachable!());

        let out = run(&[
            "consult-rs",
            "--format",
            "json",
            "score",
            "--category",
            "general",
            "--answer-file",
            path.to_str().unwrap_or_default(),
        ])
        .unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap_or_default();
        assert_eq!(value["overall_score"], 0.0);
        assert_eq!(value["category"], "general");
    }

    #[test]
    fn test_unknown_category_is_invalid_argument() {
        let result = run(&[
            "consult-rs",
            "prompt",
            "Hello",
            "--category",
            "cosmetic",
        ]);
        assert!(matches!(
            result,
            Err(crate::error::Error::Command(CommandError::InvalidArgument(_)))
        ));
    }

    #[test]
    fn test_prompt_embeds_context_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let context = dir.path().join("context.txt");
        std::fs::write(&context, "Fluoride varnish strengthens enamel.")
            .unwrap_or_else(|_| unreachable!());

        let out = run(&[
            "consult-rs",
            "prompt",
            "How can I prevent cavities?",
            "--context-file",
            context.to_str().unwrap_or_default(),
            "--prompt-dir",
            dir.path().to_str().unwrap_or_default(),
        ])
        .unwrap_or_default();
        assert!(out.contains("Fluoride varnish strengthens enamel."));
        assert!(out.contains("PATIENT QUESTION: How can I prevent cavities?"));
    }

    #[test]
    fn test_missing_context_file_fails() {
        let result = run(&[
            "consult-rs",
            "prompt",
            "Hello",
            "--context-file",
            "/nonexistent/context.txt",
        ]);
        assert!(matches!(
            result,
            Err(crate::error::Error::Command(CommandError::ExecutionFailed(_)))
        ));
    }

    #[test]
    fn test_init_prompts_writes_once() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let target = dir.path().join("prompts");
        let target_str = target.to_str().unwrap_or_default();

        let first = run(&["consult-rs", "init-prompts", "--dir", target_str]).unwrap_or_default();
        assert!(first.starts_with("Wrote 7 prompt template(s)"));
        assert!(target.join("persona.md").exists());
        assert!(target.join("emergency.md").exists());

        let second = run(&["consult-rs", "init-prompts", "--dir", target_str]).unwrap_or_default();
        assert!(second.starts_with("All prompt templates already exist"));
    }
}
