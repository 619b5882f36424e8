//! Information categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of information kinds the pipeline deals with.
///
/// Only `PersonalIdentifiers`, `Medication` and `Symptom` are extraction
/// targets. The rest name the auxiliary schemas (classifier output,
/// recommendation, bare error report).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InformationCategory {
    /// Name, email, date of birth.
    PersonalIdentifiers,
    /// Medications the patient takes.
    Medication,
    /// Symptoms the patient reports.
    Symptom,
    /// Which categories are present in a text.
    PresenceSummary,
    /// Clinical recommendation for an assembled form.
    Recommendation,
    /// Error report only.
    ErrorOnly,
}

impl InformationCategory {
    /// Every category.
    pub const ALL: [Self; 6] = [
        Self::PersonalIdentifiers,
        Self::Medication,
        Self::Symptom,
        Self::PresenceSummary,
        Self::Recommendation,
        Self::ErrorOnly,
    ];

    /// Categories a form can be populated with.
    pub const EXTRACTION_TARGETS: [Self; 3] =
        [Self::PersonalIdentifiers, Self::Medication, Self::Symptom];

    /// Returns the snake_case name, also used as the schema name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonalIdentifiers => "personal_identifiers",
            Self::Medication => "medication",
            Self::Symptom => "symptom",
            Self::PresenceSummary => "presence_summary",
            Self::Recommendation => "recommendation",
            Self::ErrorOnly => "error_only",
        }
    }

    /// Whether the form builder extracts this category.
    #[must_use]
    pub fn is_extraction_target(&self) -> bool {
        Self::EXTRACTION_TARGETS.contains(self)
    }
}

impl fmt::Display for InformationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError {
    /// The rejected name.
    pub name: String,
}

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown information category '{}'", self.name)
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for InformationCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseCategoryError {
                name: s.to_string(),
            })
    }
}
