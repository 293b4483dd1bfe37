//! Output formatting for CLI commands.
//!
//! Every command renders either human-readable text or JSON.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::format_push_string)]

use serde::Serialize;
use serde_json::json;

#[cfg(feature = "agent")]
use crate::agent::AgentResponse;
use crate::core::{ClassificationResult, Prompt, QualityReport, QueryCategory};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// Single-line JSON, one document per invocation.
    Ndjson,
}

impl OutputFormat {
    /// Parses a format name, falling back to text for unknown names.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" => Self::Ndjson,
            _ => Self::Text,
        }
    }

    /// Serializes a value for the JSON formats.
    ///
    /// Text format also yields pretty JSON; callers only reach this for
    /// the JSON arms.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = match self {
            Self::Ndjson => serde_json::to_string(value),
            Self::Text | Self::Json => serde_json::to_string_pretty(value),
        };
        let mut out = rendered
            .unwrap_or_else(|e| json!({ "error": format!("serialization failed: {e}") }).to_string());
        out.push('\n');
        out
    }
}

/// Renders a classification with per-category hit counts.
#[must_use]
pub fn format_classification(result: &ClassificationResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!("Category: {}\n", result.category);
            if result.emergency_preempted {
                output.push_str("Emergency keywords matched; other categories not scored.\n");
            }
            output.push_str("Keyword hits:\n");
            for score in &result.scores {
                output.push_str(&format!("  {:<10} {}\n", score.category.as_str(), score.hits));
            }
            output
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(result),
    }
}

/// Renders a quality report for a category.
#[must_use]
pub fn format_quality_report(
    report: &QualityReport,
    category: QueryCategory,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!(
                "Category: {}\nScore: {:.1}/100\n",
                category, report.overall_score
            );
            if report.is_clean() {
                output.push_str("No defects found.\n");
            } else {
                output.push_str(&format!("Defects ({}):\n", report.defects.len()));
                for defect in &report.defects {
                    output.push_str(&format!("  - {}\n", defect.label()));
                }
            }
            output
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(&json!({
            "category": category,
            "overall_score": report.overall_score,
            "defects": report.defects,
            "labels": report.defects.iter().map(|d| d.label()).collect::<Vec<_>>(),
        })),
    }
}

/// Renders a composed prompt.
#[must_use]
pub fn format_prompt(prompt: &Prompt, category: QueryCategory, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = prompt.as_str().to_string();
            if !output.ends_with('\n') {
                output.push('\n');
            }
            output
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(&json!({
            "category": category,
            "length": prompt.len(),
            "prompt": prompt.as_str(),
        })),
    }
}

/// Renders a specialist answer.
#[cfg(feature = "agent")]
#[must_use]
pub fn format_response(response: &AgentResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = response.content.trim_end().to_string();
            output.push_str("\n\n");
            output.push_str(&format!(
                "[{} specialist | quality {:.1} | confidence {:.2} | attempts {}]\n",
                response.category,
                response.quality_score,
                response.confidence,
                response.attempts_used
            ));
            output
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(response),
    }
}
