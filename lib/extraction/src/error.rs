//! Error types for the extraction crate.

use crate::category::InformationCategory;
use clinical_intake_ai::{PromptError, QueryError};
use std::fmt;

/// Errors from form and recommendation building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// The intent classifier's query failed.
    Classification(QueryError),
    /// Extraction of one detected category failed; the whole form is lost.
    Extraction {
        /// Category whose extraction failed.
        category: InformationCategory,
        /// The query engine failure.
        source: QueryError,
    },
    /// The recommendation query failed.
    Recommendation(QueryError),
    /// A prompt could not be rendered.
    Prompt(PromptError),
    /// The form handed to the recommendation step is unusable.
    InvalidForm { reason: String },
}

impl FormError {
    /// Returns the underlying query engine failure, if any.
    #[must_use]
    pub fn query_error(&self) -> Option<&QueryError> {
        match self {
            Self::Classification(e) | Self::Recommendation(e) => Some(e),
            Self::Extraction { source, .. } => Some(source),
            Self::Prompt(_) | Self::InvalidForm { .. } => None,
        }
    }

    /// Returns the category the failure belongs to.
    #[must_use]
    pub fn category(&self) -> Option<InformationCategory> {
        match self {
            Self::Classification(_) => Some(InformationCategory::PresenceSummary),
            Self::Extraction { category, .. } => Some(*category),
            Self::Recommendation(_) => Some(InformationCategory::Recommendation),
            Self::Prompt(_) | Self::InvalidForm { .. } => None,
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification(e) => write!(f, "intent classification failed: {e}"),
            Self::Extraction { category, source } => {
                write!(f, "extraction of '{category}' failed: {source}")
            }
            Self::Recommendation(e) => write!(f, "recommendation failed: {e}"),
            Self::Prompt(e) => write!(f, "prompt rendering failed: {e}"),
            Self::InvalidForm { reason } => write!(f, "invalid patient form: {reason}"),
        }
    }
}

impl std::error::Error for FormError {}

impl From<PromptError> for FormError {
    fn from(e: PromptError) -> Self {
        Self::Prompt(e)
    }
}

/// Errors validating the intent label map at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelMapError {
    /// No labels configured.
    Empty,
    /// A label is blank.
    BlankLabel,
    /// A label maps to something that is not an extraction category.
    UnmappedLabel { label: String, target: String },
}

impl fmt::Display for LabelMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "intent label map is empty"),
            Self::BlankLabel => write!(f, "intent label map contains a blank label"),
            Self::UnmappedLabel { label, target } => write!(
                f,
                "intent label '{label}' maps to '{target}', which is not an extraction category"
            ),
        }
    }
}

impl std::error::Error for LabelMapError {}
