//! Keyword-based intent classification.
//!
//! Classification is a total, pure function: lowercase the question,
//! short-circuit on any emergency keyword, otherwise count keyword hits
//! per category and pick the strict maximum with a fixed tie order.

use serde::Serialize;

use super::category::QueryCategory;

/// Keywords that route a question to [`QueryCategory::Diagnosis`].
const DIAGNOSIS_KEYWORDS: &[&str] = &[
    "pain",
    "hurt",
    "ache",
    "swollen",
    "bleeding",
    "sensitive",
    "symptoms",
    "what's wrong",
    "diagnosis",
    "problem",
    "issue",
    "concern",
    "feels like",
];

/// Keywords that route a question to [`QueryCategory::Treatment`].
const TREATMENT_KEYWORDS: &[&str] = &[
    "treatment",
    "fix",
    "repair",
    "cure",
    "heal",
    "options",
    "what can be done",
    "how to treat",
    "therapy",
    "medication",
    "surgery",
];

/// Keywords that route a question to [`QueryCategory::Prevention`].
const PREVENTION_KEYWORDS: &[&str] = &[
    "prevent",
    "avoid",
    "stop",
    "care",
    "maintenance",
    "hygiene",
    "brush",
    "floss",
    "diet",
    "habits",
    "routine",
    "protect",
];

/// Keywords that force [`QueryCategory::Emergency`] regardless of anything else.
const EMERGENCY_KEYWORDS: &[&str] = &[
    "emergency",
    "urgent",
    "severe",
    "unbearable",
    "can't sleep",
    "swelling",
    "infection",
    "trauma",
    "accident",
    "broken",
    "knocked out",
];

/// Keywords that route a question to [`QueryCategory::Procedure`].
const PROCEDURE_KEYWORDS: &[&str] = &[
    "procedure",
    "surgery",
    "operation",
    "implant",
    "crown",
    "filling",
    "root canal",
    "extraction",
    "cleaning",
    "whitening",
    "braces",
];

/// Per-category keyword sets, indexed by [`QueryCategory::index`].
///
/// General has no keywords; it is the zero-hit fallback.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    sets: [Vec<String>; 6],
}

impl Default for KeywordTable {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| (*w).to_string()).collect();
        Self {
            sets: [
                owned(DIAGNOSIS_KEYWORDS),
                owned(TREATMENT_KEYWORDS),
                owned(PREVENTION_KEYWORDS),
                owned(EMERGENCY_KEYWORDS),
                owned(PROCEDURE_KEYWORDS),
                Vec::new(),
            ],
        }
    }
}

impl KeywordTable {
    /// Replaces the keyword set for one category.
    ///
    /// Keywords are lowercased so matching stays case-insensitive.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, category: QueryCategory, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sets[category.index()] = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    /// Keywords for a category.
    #[must_use]
    pub fn keywords(&self, category: QueryCategory) -> &[String] {
        &self.sets[category.index()]
    }

    fn hits(&self, category: QueryCategory, normalized: &str) -> usize {
        self.keywords(category)
            .iter()
            .filter(|k| normalized.contains(k.as_str()))
            .count()
    }
}

/// Keyword hits recorded for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    /// The scored category.
    pub category: QueryCategory,
    /// Number of distinct keywords found as substrings.
    pub hits: usize,
}

/// Outcome of classifying one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    /// The routed category.
    pub category: QueryCategory,
    /// Raw hit counts per category, in [`QueryCategory::ALL`] order.
    ///
    /// When an emergency keyword short-circuits scoring, only the
    /// emergency count is filled in; the rest stay zero.
    pub scores: Vec<CategoryScore>,
    /// Whether the emergency short-circuit fired.
    pub emergency_preempted: bool,
}

impl ClassificationResult {
    /// Hit count for a category.
    #[must_use]
    pub fn hits(&self, category: QueryCategory) -> usize {
        self.scores
            .iter()
            .find(|s| s.category == category)
            .map_or(0, |s| s.hits)
    }
}

/// Scores free text against weighted keyword sets.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    table: KeywordTable,
}

impl IntentClassifier {
    /// Creates a classifier with the compiled-in keyword tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a classifier over a custom keyword table.
    #[must_use]
    pub const fn with_table(table: KeywordTable) -> Self {
        Self { table }
    }

    /// Returns the category for a question.
    #[must_use]
    pub fn classify(&self, question: &str) -> QueryCategory {
        self.classify_detailed(question).category
    }

    /// Classifies a question and keeps the raw scores for diagnostics.
    #[must_use]
    pub fn classify_detailed(&self, question: &str) -> ClassificationResult {
        let normalized = question.to_lowercase();
        let mut scores: Vec<CategoryScore> = QueryCategory::ALL
            .iter()
            .map(|&category| CategoryScore { category, hits: 0 })
            .collect();

        let emergency_hits = self.table.hits(QueryCategory::Emergency, &normalized);
        scores[QueryCategory::Emergency.index()].hits = emergency_hits;
        if emergency_hits > 0 {
            return ClassificationResult {
                category: QueryCategory::Emergency,
                scores,
                emergency_preempted: true,
            };
        }

        for &category in &QueryCategory::TIE_PRIORITY {
            scores[category.index()].hits = self.table.hits(category, &normalized);
        }

        // Strictly greater wins, so earlier entries in TIE_PRIORITY keep ties.
        let mut best = QueryCategory::General;
        let mut best_hits = 0;
        for &category in &QueryCategory::TIE_PRIORITY {
            let hits = scores[category.index()].hits;
            if hits > best_hits {
                best = category;
                best_hits = hits;
            }
        }

        ClassificationResult {
            category: best,
            scores,
            emergency_preempted: false,
        }
    }
}
