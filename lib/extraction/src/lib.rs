//! Clinical form extraction for clinical-intake.
//!
//! - **Schemas**: the validated shapes providers must return
//! - **Registry**: category to schema and prompt dispatch
//! - **Intent classifier**: which categories a text contains
//! - **Form builder**: classification, per-category extraction, assembly,
//!   and recommendations for assembled forms

pub mod builder;
pub mod category;
pub mod classifier;
pub mod error;
pub mod labels;
mod prompts;
pub mod registry;
pub mod schema;

#[cfg(test)]
mod test_support;

pub use builder::{BuildPhase, FormBuilder, parse_form};
pub use category::{InformationCategory, ParseCategoryError};
pub use classifier::{IntentClassifier, IntentLabel, IntentSet};
pub use error::{FormError, LabelMapError};
pub use labels::IntentLabelMap;
pub use registry::{SchemaEntry, lookup};
pub use schema::{
    DEFAULT_INTENT_LABELS, ErrorMixin, Medication, MedicationExtraction, PatientForm,
    PersonalIdentifiers, PresenceSummary, RecommendationResult, Symptom, SymptomExtraction,
};
