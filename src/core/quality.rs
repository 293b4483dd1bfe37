//! Rule-based quality scoring of candidate answers.
//!
//! [`QualityScorer::score`] is a pure function of `(answer, category,
//! question)`. Each applicable rubric check carries a weight; the overall
//! score is the passed weight over the applicable weight, scaled to
//! 0–100. Every failed check contributes exactly one [`DefectKind`], in
//! a fixed check order, so identical inputs always yield identical
//! reports.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use super::category::QueryCategory;

/// Weight of the list-formatting check.
const LIST_FORMAT_WEIGHT: u32 = 20;
/// Weight of the sentence-budget check (short categories).
const SENTENCE_BUDGET_WEIGHT: u32 = 20;
/// Weight of the introduction check (detailed categories).
const INTRODUCTION_WEIGHT: u32 = 10;
/// Weight of the list-depth check (detailed categories).
const LIST_DEPTH_WEIGHT: u32 = 20;
/// Weight of each required section.
const SECTION_WEIGHT: u32 = 10;
/// Weight of the closing follow-up question check.
const FOLLOW_UP_WEIGHT: u32 = 20;
/// Weight of the first-person voice check.
const VOICE_WEIGHT: u32 = 15;
/// Weight of the topical-overlap check.
const TOPICAL_WEIGHT: u32 = 15;

/// Inline enumerations at or above this size must be bullet lists.
const ENUMERATION_ITEMS: usize = 3;
/// Longest segment (in words) still treated as a list item in prose.
const MAX_ITEM_WORDS: usize = 4;

/// Words that start a trailing qualifier after an item's head noun.
const QUALIFIERS: &[&str] = &[
    "after", "at", "because", "before", "for", "from", "if", "in", "of", "on", "that", "to",
    "when", "which", "with",
];

/// Words that open a clause rather than a list item.
const CLAUSE_OPENERS: &[&str] = &["he", "i", "it", "she", "that", "they", "this", "we", "you"];

static FIRST_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bI(?:['’](?:m|ve|d|ll))?\b|\b(?:[Mm]y|[Mm]e|[Ww]e|[Oo]ur)\b")
        .unwrap_or_else(|e| unreachable!("built-in pattern: {e}"))
});

static ITEM_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:[,;]|\band\b|\bor\b)\s*")
        .unwrap_or_else(|e| unreachable!("built-in pattern: {e}"))
});

/// Words ignored when checking that an answer addresses the question.
const STOPWORDS: &[&str] = &[
    "about", "after", "also", "anything", "been", "before", "being", "could", "does", "doing",
    "doctor", "dentist", "every", "from", "have", "having", "hello", "into", "just", "know",
    "like", "make", "more", "much", "need", "please", "really", "should", "some", "still", "tell",
    "than", "thank", "thanks", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "very", "want", "were", "what", "when", "where", "which", "while", "will", "with",
    "would", "your",
];

/// A required part of a structured answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Whether the situation is an emergency.
    UrgencyAssessment,
    /// Immediate pain control.
    PainManagement,
    /// What can go wrong without treatment.
    RiskEvaluation,
    /// What to do right now.
    UrgentAction,
    /// What happens after immediate care.
    FollowUpCare,
}

impl Section {
    /// Every emergency-protocol section, in answer order.
    pub const EMERGENCY_PROTOCOL: [Self; 5] = [
        Self::UrgencyAssessment,
        Self::PainManagement,
        Self::RiskEvaluation,
        Self::UrgentAction,
        Self::FollowUpCare,
    ];

    /// Human-readable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UrgencyAssessment => "urgency assessment",
            Self::PainManagement => "pain management",
            Self::RiskEvaluation => "risk evaluation",
            Self::UrgentAction => "urgent action",
            Self::FollowUpCare => "follow-up care",
        }
    }

    /// Lowercase phrases, any of which marks the section as present.
    ///
    /// Phrases match whole words only, so `call` does not match `typically`.
    #[must_use]
    pub const fn markers(&self) -> &'static [&'static str] {
        match self {
            Self::UrgencyAssessment => &["emergency", "urgent", "urgently", "urgency"],
            Self::PainManagement => &[
                "pain",
                "painful",
                "discomfort",
                "ibuprofen",
                "acetaminophen",
                "cold compress",
            ],
            Self::RiskEvaluation => &[
                "risk",
                "risks",
                "complication",
                "complications",
                "spread",
                "spreads",
                "worsen",
                "worsens",
                "get worse",
                "untreated",
            ],
            Self::UrgentAction => &[
                "right now",
                "immediately",
                "as soon as possible",
                "today",
                "call",
                "go to",
                "seek",
                "visit",
            ],
            Self::FollowUpCare => &[
                "follow-up",
                "follow up",
                "afterward",
                "after treatment",
                "next step",
                "next steps",
                "check-up",
                "checkup",
            ],
        }
    }

    /// Whether any marker appears as whole words in lowercase text.
    #[must_use]
    pub fn is_present(&self, lowered: &str) -> bool {
        self.markers().iter().any(|m| contains_phrase(lowered, m))
    }
}

/// A named way an answer fails the rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefectKind {
    /// The answer is empty or whitespace.
    EmptyResponse,
    /// Three or more items were enumerated inline instead of as a list.
    MissingListFormatting {
        /// Items in the largest inline enumeration.
        items: usize,
    },
    /// A short-form answer ran past its sentence ceiling.
    ExceedsSentenceBudget {
        /// Sentences found.
        sentences: usize,
        /// Ceiling for the category.
        limit: usize,
    },
    /// A detailed answer opens with a list instead of a direct answer.
    MissingIntroduction,
    /// A detailed answer has too few list items.
    InsufficientListItems {
        /// List lines found.
        found: usize,
        /// Minimum for the category.
        required: usize,
    },
    /// A required protocol section is absent.
    MissingSection {
        /// The missing section.
        section: Section,
    },
    /// The answer does not close with a follow-up question.
    MissingFollowUpQuestion,
    /// The answer lacks first-person framing.
    MissingFirstPersonVoice,
    /// The answer shares no content words with the question.
    OffTopic,
}

impl DefectKind {
    /// Short label, stable across releases.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::EmptyResponse => "empty response".to_string(),
            Self::MissingListFormatting { .. } => {
                "no bullet formatting for multi-item list".to_string()
            }
            Self::ExceedsSentenceBudget { .. } => {
                "answer exceeds length budget for simple question".to_string()
            }
            Self::MissingIntroduction => "missing direct introduction".to_string(),
            Self::InsufficientListItems { .. } => "insufficient structural depth".to_string(),
            Self::MissingSection { section } => format!("missing {} section", section.as_str()),
            Self::MissingFollowUpQuestion => "missing follow-up question".to_string(),
            Self::MissingFirstPersonVoice => "missing first-person voice".to_string(),
            Self::OffTopic => "does not address the question".to_string(),
        }
    }

    /// Corrective instruction used when reprompting.
    #[must_use]
    pub fn instruction(&self) -> String {
        match self {
            Self::EmptyResponse => "The previous response was empty. Write a complete answer.".to_string(),
            Self::MissingListFormatting { items } => format!(
                "You listed {items} items inline. Put each item on its own bullet line (•)."
            ),
            Self::ExceedsSentenceBudget { sentences, limit } => format!(
                "The answer has {sentences} sentences. Keep it to at most {limit} sentences."
            ),
            Self::MissingIntroduction => {
                "Open with one or two sentences that answer the question directly before any list."
                    .to_string()
            }
            Self::InsufficientListItems { found, required } => format!(
                "Only {found} bullet points were given. Give at least {required} bullet points."
            ),
            Self::MissingSection { section } => format!(
                "Add an explicit {} step to the answer.",
                section.as_str()
            ),
            Self::MissingFollowUpQuestion => {
                "End with a thoughtful follow-up question to the patient.".to_string()
            }
            Self::MissingFirstPersonVoice => {
                "Speak in the first person (I recommend, I've seen, I do).".to_string()
            }
            Self::OffTopic => {
                "Answer the patient's actual question in the first sentence.".to_string()
            }
        }
    }
}

impl std::fmt::Display for DefectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Result of scoring one answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// Weighted score in `0.0..=100.0`.
    pub overall_score: f64,
    /// Failed checks, in rubric order.
    pub defects: Vec<DefectKind>,
}

impl QualityReport {
    /// Whether every applicable check passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }

    /// Whether the score meets an acceptance threshold.
    #[must_use]
    pub fn meets(&self, threshold: f64) -> bool {
        self.overall_score >= threshold
    }
}

/// Structural expectations for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRubric {
    /// Sentence ceiling for short-form answers.
    pub sentence_limit: Option<usize>,
    /// Minimum bullet/numbered lines for detailed answers.
    pub min_list_items: Option<usize>,
    /// Whether the answer must open with prose before any list.
    pub require_introduction: bool,
    /// Sections that must each be present.
    pub required_sections: &'static [Section],
    /// Whether the last line must ask a follow-up question.
    pub require_follow_up: bool,
}

impl CategoryRubric {
    /// Compiled-in rubric for a category.
    #[must_use]
    pub const fn for_category(category: QueryCategory) -> Self {
        match category {
            QueryCategory::Diagnosis | QueryCategory::Prevention | QueryCategory::Procedure => {
                Self {
                    sentence_limit: None,
                    min_list_items: Some(3),
                    require_introduction: true,
                    required_sections: &[],
                    require_follow_up: true,
                }
            }
            QueryCategory::Treatment => Self {
                sentence_limit: Some(4),
                min_list_items: None,
                require_introduction: false,
                required_sections: &[],
                require_follow_up: true,
            },
            QueryCategory::Emergency => Self {
                sentence_limit: None,
                min_list_items: None,
                require_introduction: false,
                required_sections: &Section::EMERGENCY_PROTOCOL,
                require_follow_up: false,
            },
            QueryCategory::General => Self {
                sentence_limit: Some(5),
                min_list_items: None,
                require_introduction: false,
                required_sections: &[],
                require_follow_up: false,
            },
        }
    }
}

/// Evaluates answers against per-category rubrics.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    rubrics: [CategoryRubric; 6],
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self {
            rubrics: QueryCategory::ALL.map(CategoryRubric::for_category),
        }
    }
}

impl QualityScorer {
    /// Creates a scorer with the compiled-in rubrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rubric for one category.
    #[must_use]
    pub fn with_rubric(mut self, category: QueryCategory, rubric: CategoryRubric) -> Self {
        self.rubrics[category.index()] = rubric;
        self
    }

    /// Rubric for a category.
    #[must_use]
    pub const fn rubric(&self, category: QueryCategory) -> &CategoryRubric {
        &self.rubrics[category.index()]
    }

    /// Scores an answer. Total over any input, including empty text.
    #[must_use]
    pub fn score(&self, answer: &str, category: QueryCategory, question: &str) -> QualityReport {
        if answer.trim().is_empty() {
            return QualityReport {
                overall_score: 0.0,
                defects: vec![DefectKind::EmptyResponse],
            };
        }

        let rubric = self.rubric(category);
        let shape = AnswerShape::analyze(answer);
        let mut tally = Tally::default();

        tally.check(LIST_FORMAT_WEIGHT, || {
            (shape.inline_enumeration >= ENUMERATION_ITEMS).then_some(
                DefectKind::MissingListFormatting {
                    items: shape.inline_enumeration,
                },
            )
        });

        if let Some(limit) = rubric.sentence_limit {
            tally.check(SENTENCE_BUDGET_WEIGHT, || {
                (shape.sentences > limit).then_some(DefectKind::ExceedsSentenceBudget {
                    sentences: shape.sentences,
                    limit,
                })
            });
        }

        if rubric.require_introduction {
            tally.check(INTRODUCTION_WEIGHT, || {
                (!shape.has_introduction).then_some(DefectKind::MissingIntroduction)
            });
        }

        if let Some(required) = rubric.min_list_items {
            tally.check(LIST_DEPTH_WEIGHT, || {
                (shape.list_items < required).then_some(DefectKind::InsufficientListItems {
                    found: shape.list_items,
                    required,
                })
            });
        }

        let lowered = answer.to_lowercase();
        for &section in rubric.required_sections {
            tally.check(SECTION_WEIGHT, || {
                (!section.is_present(&lowered)).then_some(DefectKind::MissingSection { section })
            });
        }

        if rubric.require_follow_up {
            tally.check(FOLLOW_UP_WEIGHT, || {
                (!shape.ends_with_question).then_some(DefectKind::MissingFollowUpQuestion)
            });
        }

        tally.check(VOICE_WEIGHT, || {
            (!FIRST_PERSON.is_match(answer)).then_some(DefectKind::MissingFirstPersonVoice)
        });

        let topic_words = content_words(question);
        if !topic_words.is_empty() {
            tally.check(TOPICAL_WEIGHT, || {
                let on_topic = topic_words.iter().any(|w| lowered.contains(&stem(w)));
                (!on_topic).then_some(DefectKind::OffTopic)
            });
        }

        tally.into_report()
    }
}

/// Accumulates weighted pass/fail results in check order.
#[derive(Default)]
struct Tally {
    applicable: u32,
    passed: u32,
    defects: Vec<DefectKind>,
}

impl Tally {
    fn check(&mut self, weight: u32, failed: impl FnOnce() -> Option<DefectKind>) {
        self.applicable += weight;
        match failed() {
            Some(defect) => self.defects.push(defect),
            None => self.passed += weight,
        }
    }

    fn into_report(self) -> QualityReport {
        let overall_score = if self.applicable == 0 {
            100.0
        } else {
            let raw = f64::from(self.passed) * 100.0 / f64::from(self.applicable);
            (raw * 10.0).round() / 10.0
        };
        QualityReport {
            overall_score,
            defects: self.defects,
        }
    }
}

/// Structural facts about an answer, computed once per score call.
struct AnswerShape {
    sentences: usize,
    list_items: usize,
    has_introduction: bool,
    ends_with_question: bool,
    inline_enumeration: usize,
}

impl AnswerShape {
    fn analyze(answer: &str) -> Self {
        let lines: Vec<&str> = answer
            .lines()
            .map(str::trim)
            .filter(|l| l.chars().any(char::is_alphanumeric))
            .collect();

        let list_items = lines.iter().filter(|l| is_list_line(l)).count();
        let has_introduction = lines.first().is_some_and(|l| !is_list_line(l));
        let ends_with_question = lines.last().is_some_and(|l| l.contains('?'));

        // A run of list lines counts as one sentence.
        let mut sentences = 0;
        let mut in_list = false;
        for line in &lines {
            if is_list_line(line) {
                if !in_list {
                    sentences += 1;
                }
                in_list = true;
            } else {
                in_list = false;
                sentences += line
                    .unicode_sentences()
                    .filter(|s| s.chars().any(char::is_alphanumeric))
                    .count();
            }
        }

        let inline_enumeration = lines
            .iter()
            .filter(|l| !is_list_line(l))
            .flat_map(|l| l.unicode_sentences())
            .map(inline_items)
            .max()
            .unwrap_or(0);

        Self {
            sentences,
            list_items,
            has_introduction,
            ends_with_question,
            inline_enumeration,
        }
    }
}

/// Returns `true` if a line starts with a bullet or an ordinal numeral.
///
/// Recognizes `•`-style glyphs, `-`/`*`/`–` followed by whitespace, and
/// `1.` / `1)` style ordinals of up to two digits.
#[must_use]
pub fn is_list_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some('•' | '●' | '▪' | '◦' | '‣') => true,
        Some('-' | '*' | '–') => chars.next().is_some_and(char::is_whitespace),
        Some(c) if c.is_ascii_digit() => {
            let rest = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
            let digits = trimmed.len() - rest.len();
            let mut tail = rest.chars();
            digits <= 2
                && matches!(tail.next(), Some('.' | ')'))
                && tail.next().is_some_and(char::is_whitespace)
        }
        _ => false,
    }
}

/// Counts items enumerated inline in one sentence.
///
/// After a colon every separated segment counts. Without a colon the
/// first segment is a lead-in, and the sentence only counts as an
/// enumeration when every following segment looks like an item.
fn inline_items(sentence: &str) -> usize {
    let (tail, after_colon) = sentence
        .rsplit_once(':')
        .map_or((sentence, false), |(_, tail)| (tail, true));

    let segments: Vec<&str> = ITEM_SEPARATOR
        .split(tail)
        .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|s| !s.is_empty())
        .collect();

    if after_colon {
        return segments.len();
    }
    let rest = segments.get(1..).unwrap_or_default();
    if rest.len() >= 2 && rest.iter().all(|s| is_item(s)) {
        segments.len()
    } else {
        0
    }
}

/// Whether a segment reads as a list item rather than a clause.
///
/// Words from the first qualifier on (`dentures for a missing tooth`)
/// do not count toward the item length.
fn is_item(segment: &str) -> bool {
    let mut words = segment.split_whitespace().map(str::to_lowercase);
    let Some(first) = words.next() else {
        return false;
    };
    let opener = first.split(['\'', '’']).next().unwrap_or_default();
    if CLAUSE_OPENERS.contains(&opener) {
        return false;
    }
    let head = 1 + words
        .take_while(|w| !QUALIFIERS.contains(&w.as_str()))
        .count();
    head <= MAX_ITEM_WORDS
}

/// Whether `phrase` occurs in `text` bounded by non-alphanumerics.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Lowercase content words (four letters or more, not stopwords).
fn content_words(question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();
    let mut words: Vec<String> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect();
    words.dedup();
    words
}

/// Crude prefix stem so `cavities` matches `cavity` and `bleeding` matches `bleed`.
fn stem(word: &str) -> String {
    word.chars().take(5).collect()
}
