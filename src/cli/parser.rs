//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// consult-rs: specialist orchestration with quality-gated generation.
///
/// Classifies patient questions, routes them to a category specialist,
/// and refines generated answers until they pass a structural rubric.
#[derive(Parser, Debug)]
#[command(name = "consult-rs")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, ndjson).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a question into a specialist category.
    ///
    /// Prints the routed category and the keyword hits per category.
    #[command(after_help = r#"Examples:
  consult-rs classify "My tooth hurts when I drink cold water"
  consult-rs --format json classify "Is my swollen face an emergency?"
"#)]
    Classify {
        /// Question text.
        question: String,
    },

    /// Score an answer against a category rubric.
    ///
    /// Reads the answer from `--answer-file`, or from stdin when omitted.
    #[command(after_help = r#"Examples:
  consult-rs score --category diagnosis --answer-file answer.md
  cat answer.md | consult-rs score --question "Why does my gum bleed?"
  consult-rs --format json score -c emergency -f reply.txt | jq .overall_score
"#)]
    Score {
        /// Rubric category. Classified from `--question` when omitted.
        #[arg(short, long)]
        category: Option<String>,

        /// The question the answer responds to (enables the topical check).
        #[arg(short, long, default_value = "")]
        question: String,

        /// File containing the answer text.
        #[arg(short = 'f', long)]
        answer_file: Option<PathBuf>,
    },

    /// Print the prompt a specialist would send for a question.
    #[command(after_help = r#"Examples:
  consult-rs prompt "How can I prevent cavities?"
  consult-rs prompt "Do I need a crown?" --category treatment
  consult-rs prompt "Why is my gum swollen?" --context-file notes.txt
"#)]
    Prompt {
        /// Question text.
        question: String,

        /// Force a category instead of classifying the question.
        #[arg(short, long)]
        category: Option<String>,

        /// Knowledge-base context to embed in the prompt.
        #[arg(long)]
        context_file: Option<PathBuf>,

        /// Directory containing persona and template overrides.
        #[arg(long, env = "CONSULT_PROMPT_DIR")]
        prompt_dir: Option<PathBuf>,
    },

    /// Answer a question with a refining specialist.
    ///
    /// Requires an API key (OPENAI_API_KEY or CONSULT_API_KEY).
    #[cfg(feature = "agent")]
    #[command(after_help = r#"Examples:
  consult-rs ask "What are my options for a missing tooth?"
  consult-rs ask "Should I get a root canal?" --consensus
  consult-rs ask "My jaw is swollen" --timeout 30 --log-file consults.jsonl
  consult-rs --format json ask "How do I floss properly?" | jq .confidence
"#)]
    Ask {
        /// Question text.
        question: String,

        /// Arbitrate the routed specialist against the general specialist.
        #[arg(long)]
        consensus: bool,

        /// Knowledge-base context served for the question.
        #[arg(long)]
        context_file: Option<PathBuf>,

        /// Abort the consultation after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Override the model name.
        #[arg(long, env = "CONSULT_MODEL")]
        model: Option<String>,

        /// Directory containing persona and template overrides.
        #[arg(long, env = "CONSULT_PROMPT_DIR")]
        prompt_dir: Option<PathBuf>,

        /// Append each finished consultation as a JSON line to this file.
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Write default persona and template files for customization.
    ///
    /// Existing files are never overwritten.
    #[command(after_help = r#"Examples:
  consult-rs init-prompts                  # ~/.config/consult-rs/prompts
  consult-rs init-prompts --dir ./prompts  # Custom directory
"#)]
    InitPrompts {
        /// Target directory (defaults to ~/.config/consult-rs/prompts).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_classify() {
        let cli = Cli::try_parse_from(["consult-rs", "classify", "My tooth hurts"])
            .unwrap_or_else(|_| unreachable!());
        assert!(!cli.verbose);
        assert_eq!(cli.format, "text");
        assert!(matches!(
            cli.command,
            Commands::Classify { ref question } if question == "My tooth hurts"
        ));
    }

    #[test]
    fn test_parse_score_flags() {
        let cli = Cli::try_parse_from([
            "consult-rs",
            "--format",
            "json",
            "score",
            "-c",
            "emergency",
            "-f",
            "answer.md",
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Score {
                category,
                question,
                answer_file,
            } => {
                assert_eq!(category.as_deref(), Some("emergency"));
                assert!(question.is_empty());
                assert_eq!(answer_file, Some(PathBuf::from("answer.md")));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["consult-rs", "init-prompts", "-v", "--format", "json"])
            .unwrap_or_else(|_| unreachable!());
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
        assert!(matches!(cli.command, Commands::InitPrompts { dir: None }));
    }

    #[test]
    fn test_missing_question_is_rejected() {
        assert!(Cli::try_parse_from(["consult-rs", "classify"]).is_err());
    }

    #[cfg(feature = "agent")]
    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "consult-rs",
            "ask",
            "Is this urgent?",
            "--consensus",
            "--timeout",
            "30",
        ])
        .unwrap_or_else(|_| unreachable!());
        match cli.command {
            Commands::Ask {
                question,
                consensus,
                timeout,
                ..
            } => {
                assert_eq!(question, "Is this urgent?");
                assert!(consensus);
                assert_eq!(timeout, Some(30));
            }
            _ => unreachable!(),
        }
    }
}
