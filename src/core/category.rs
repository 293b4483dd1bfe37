//! Query category assigned to every consultation.
//!
//! Categories key the specialist dispatch table, so they are a closed
//! enum with a dense index rather than a string.

use serde::{Deserialize, Serialize};

/// Intent of a user question.
///
/// Immutable once assigned to a request; every other per-category table
/// in the crate is indexed by [`QueryCategory::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryCategory {
    /// Symptom analysis and likely causes.
    Diagnosis,
    /// Treatment options and next steps.
    Treatment,
    /// Preventive care and hygiene.
    Prevention,
    /// Urgent conditions needing immediate triage.
    Emergency,
    /// How a procedure works.
    Procedure,
    /// Anything else.
    General,
}

impl QueryCategory {
    /// Every category, in index order.
    pub const ALL: [Self; 6] = [
        Self::Diagnosis,
        Self::Treatment,
        Self::Prevention,
        Self::Emergency,
        Self::Procedure,
        Self::General,
    ];

    /// Order used to break keyword-count ties during classification.
    ///
    /// Emergency is absent because it never competes on counts, and
    /// General is absent because it is only the zero-hit fallback.
    pub const TIE_PRIORITY: [Self; 4] = [
        Self::Diagnosis,
        Self::Treatment,
        Self::Prevention,
        Self::Procedure,
    ];

    /// Dense index into per-category tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Diagnosis => 0,
            Self::Treatment => 1,
            Self::Prevention => 2,
            Self::Emergency => 3,
            Self::Procedure => 4,
            Self::General => 5,
        }
    }

    /// Parses a category name (case-insensitive).
    ///
    /// Accepts the `diagnostic` spelling as an alias for `diagnosis`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "diagnosis" | "diagnostic" => Some(Self::Diagnosis),
            "treatment" => Some(Self::Treatment),
            "prevention" => Some(Self::Prevention),
            "emergency" => Some(Self::Emergency),
            "procedure" => Some(Self::Procedure),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Diagnosis => "diagnosis",
            Self::Treatment => "treatment",
            Self::Prevention => "prevention",
            Self::Emergency => "emergency",
            Self::Procedure => "procedure",
            Self::General => "general",
        }
    }

    /// Whether answers in this category must stay short.
    ///
    /// Short categories are held to a sentence ceiling; the rest must
    /// show structural depth instead.
    #[must_use]
    pub const fn is_short_form(self) -> bool {
        matches!(self, Self::Treatment | Self::General)
    }
}

impl std::fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
