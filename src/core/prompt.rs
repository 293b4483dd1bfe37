//! Prompt composition for specialist agents.
//!
//! Prompts are built fresh for every round and never mutated. Composition
//! is deterministic: identical inputs always yield byte-identical output,
//! so the only difference between a first-round prompt and a reprompt is
//! the appended answer and defect list.

use std::fmt::Write;
use std::sync::Arc;

use super::category::QueryCategory;
use super::persona::PersonaSet;
use super::quality::DefectKind;

/// Formatting rules appended to every prompt.
pub const FORMATTING_RULES: &str = "CRITICAL RESPONSE REQUIREMENTS:
- For SIMPLE questions: 2-3 sentences maximum, no lists
- For conditions, procedures, or multi-step guidance: a short introduction, then bullet points (•) for each item
- Whenever you list three or more items, put each on its own bullet line
- Answer the question directly in the first sentence
- Use line breaks between the introduction, the list, and the closing
- Use \"I\" statements naturally (I recommend, I've seen, I do)
- End with a thoughtful follow-up question when the format calls for one";

/// Instructions appended to a reprompt after the defect list.
const REPROMPT_INSTRUCTIONS: &str = "Rewrite your answer so that it fixes every issue listed above while keeping:
1. The same persona and warm, first-person voice
2. A direct answer in the first sentence
3. Bullet points (•) on separate lines for any list of three or more items
4. The response format and formatting rules given earlier
5. A closing follow-up question when the format calls for one";

/// A fully composed prompt handed to the completion provider.
///
/// Opaque text; construct via [`PromptComposer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prompt(String);

impl Prompt {
    /// The prompt text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the prompt, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Prompt length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the prompt is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds role-conditioned, reasoning-structured prompts.
#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    personas: Arc<PersonaSet>,
}

impl PromptComposer {
    /// Creates a composer over a persona set.
    #[must_use]
    pub fn new(personas: PersonaSet) -> Self {
        Self {
            personas: Arc::new(personas),
        }
    }

    /// The persona set backing this composer.
    #[must_use]
    pub fn personas(&self) -> &PersonaSet {
        &self.personas
    }

    /// Composes the first-round prompt for a category.
    ///
    /// Section order: persona, specialization, retrieved context (only
    /// when non-blank), response template, formatting rules, question.
    #[must_use]
    pub fn compose(&self, category: QueryCategory, question: &str, context: Option<&str>) -> Prompt {
        let persona = self.personas.get(category);
        let mut prompt = String::with_capacity(
            persona.role.len() + persona.specialization.len() + persona.template.len() + 1024,
        );

        let _ = write!(prompt, "{}\n\n{}\n\n", persona.role, persona.specialization);

        if let Some(ctx) = context.map(str::trim).filter(|c| !c.is_empty()) {
            let _ = write!(
                prompt,
                "RELEVANT CONTEXT FROM KNOWLEDGE BASE:\n<context>\n{ctx}\n</context>\n\
                 Use the context where it helps; do not mention that it was provided.\n\n"
            );
        }

        let _ = write!(
            prompt,
            "{template}\n\n{FORMATTING_RULES}\n\n\
             PATIENT QUESTION: {question}\n\n\
             Now provide your well-formatted response:",
            template = persona.template,
            question = question.trim(),
        );

        Prompt(prompt)
    }

    /// Composes a corrective prompt from an earlier prompt and its answer.
    ///
    /// The original prompt is carried verbatim, so persona and formatting
    /// rules are unchanged; only the previous answer and an itemized
    /// defect list are appended.
    #[must_use]
    pub fn compose_reprompt(
        &self,
        original: &Prompt,
        previous_answer: &str,
        defects: &[DefectKind],
    ) -> Prompt {
        let mut prompt = String::with_capacity(original.len() + previous_answer.len() + 1024);
        prompt.push_str(original.as_str());
        prompt.push_str("\n\nYOUR PREVIOUS RESPONSE:\n<previous_response>\n");
        prompt.push_str(previous_answer.trim());
        prompt.push_str("\n</previous_response>\n\nQUALITY ISSUES TO FIX:\n");

        if defects.is_empty() {
            prompt.push_str("- Improve clarity and structure\n");
        }
        for defect in defects {
            let _ = writeln!(prompt, "- {}", defect.instruction());
        }

        let _ = write!(prompt, "\n{REPROMPT_INSTRUCTIONS}\n\nIMPROVED RESPONSE:");
        Prompt(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persona::BASE_PERSONA;
    use proptest::prelude::*;

    #[test]
    fn test_compose_section_order() {
        let composer = PromptComposer::default();
        let prompt = composer.compose(
            QueryCategory::Emergency,
            "My face is swollen",
            Some("Abscesses can spread."),
        );
        let text = prompt.as_str();

        let role = text.find(BASE_PERSONA).unwrap_or(usize::MAX);
        let specialization = text.find("EMERGENCY SPECIALIZATION").unwrap_or(usize::MAX);
        let ctx = text.find("Abscesses can spread.").unwrap_or(usize::MAX);
        let template = text.find("EMERGENCY ASSESSMENT PROTOCOL").unwrap_or(usize::MAX);
        let rules = text.find("CRITICAL RESPONSE REQUIREMENTS").unwrap_or(usize::MAX);
        let question = text.find("PATIENT QUESTION: My face is swollen").unwrap_or(usize::MAX);

        assert_eq!(role, 0);
        assert!(role < specialization && specialization < ctx && ctx < template);
        assert!(template < rules && rules < question);
        assert!(question < usize::MAX);
    }

    #[test]
    fn test_compose_omits_blank_context() {
        let composer = PromptComposer::default();
        let none = composer.compose(QueryCategory::General, "Hi", None);
        let blank = composer.compose(QueryCategory::General, "Hi", Some("  \n "));
        assert_eq!(none, blank);
        assert!(!none.as_str().contains("RELEVANT CONTEXT"));
    }

    #[test]
    fn test_compose_uses_category_template() {
        let composer = PromptComposer::default();
        let treatment = composer.compose(QueryCategory::Treatment, "Do you do crowns?", None);
        assert!(treatment.as_str().contains("BRIEF AND CLEAR"));
        assert!(!treatment.as_str().contains("EMERGENCY ASSESSMENT PROTOCOL"));
    }

    #[test]
    fn test_reprompt_preserves_original_and_lists_defects() {
        let composer = PromptComposer::default();
        let original = composer.compose(QueryCategory::Diagnosis, "Why do my gums bleed?", None);
        let defects = [DefectKind::MissingFollowUpQuestion, DefectKind::MissingFirstPersonVoice];
        let reprompt = composer.compose_reprompt(&original, "Gingivitis.", &defects);

        assert!(reprompt.as_str().starts_with(original.as_str()));
        assert!(reprompt.as_str().contains("<previous_response>\nGingivitis.\n</previous_response>"));
        for defect in &defects {
            assert!(reprompt.as_str().contains(&defect.instruction()));
        }
        assert!(reprompt.as_str().ends_with("IMPROVED RESPONSE:"));
    }

    #[test]
    fn test_reprompt_differs_only_by_suffix() {
        let composer = PromptComposer::default();
        let original = composer.compose(QueryCategory::Prevention, "How do I stop cavities?", None);
        let a = composer.compose_reprompt(&original, "Brush.", &[DefectKind::EmptyResponse]);
        let b = composer.compose_reprompt(&original, "Brush.", &[DefectKind::EmptyResponse]);
        assert_eq!(a, b);
        assert_eq!(&a.as_str()[..original.len()], original.as_str());
    }

    fn any_category() -> impl Strategy<Value = QueryCategory> {
        proptest::sample::select(QueryCategory::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_compose_is_deterministic(
            category in any_category(),
            question in ".{0,200}",
            context in proptest::option::of(".{0,200}"),
        ) {
            let composer = PromptComposer::default();
            let first = composer.compose(category, &question, context.as_deref());
            let second = composer.compose(category, &question, context.as_deref());
            prop_assert_eq!(first, second);
        }
    }
}
