//! Extraction schemas.
//!
//! Every schema deserializes from the provider's JSON, then `validate`
//! enforces the constraints serde types cannot: non-empty names, email
//! shape, strictly positive counts, intensity in 1..=5. A response that
//! fails either step is a structural failure and triggers roster fallback.
//! The embedded `ErrorMixin` is the separate, model-reported failure channel.

use crate::category::InformationCategory;
use chrono::NaiveDate;
use clinical_intake_ai::{ReportedError, StructuredOutput};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Labels the classifier asks for when no label map is configured.
pub const DEFAULT_INTENT_LABELS: [&str; 3] =
    ["Personally identifiable information", "Medication", "Symptoms"];

/// Model-reported failure flag embedded in every schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMixin {
    /// True if the model could not satisfy the request.
    #[serde(default)]
    pub error: bool,
    /// User-facing explanation from the model.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ErrorMixin {
    /// Creates a set error flag with a message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            error_message: Some(message.into()),
        }
    }

    /// Returns the reported error if the flag is set.
    #[must_use]
    pub fn reported(&self) -> Option<ReportedError> {
        self.error.then(|| ReportedError {
            message: self.error_message.clone(),
        })
    }

    fn schema_fragment() -> JsonValue {
        serde_json::json!({
            "type": "object",
            "description": "Set error to true only if the requested information cannot be extracted.",
            "properties": {
                "error": {"type": "boolean"},
                "error_message": {
                    "type": ["string", "null"],
                    "description": "A user friendly error message to drive better user prompting"
                }
            },
            "required": ["error", "error_message"]
        })
    }
}

impl StructuredOutput for ErrorMixin {
    fn schema_name() -> &'static str {
        InformationCategory::ErrorOnly.as_str()
    }

    fn json_schema() -> JsonValue {
        ErrorMixin::schema_fragment()
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        Ok(())
    }

    fn reported_error(&self) -> Option<ReportedError> {
        self.reported()
    }
}

/// Patient identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalIdentifiers {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Date of birth (ISO-8601).
    pub date_of_birth: NaiveDate,
    /// Model-reported failure.
    pub error: ErrorMixin,
}

impl StructuredOutput for PersonalIdentifiers {
    fn schema_name() -> &'static str {
        InformationCategory::PersonalIdentifiers.as_str()
    }

    fn json_schema() -> JsonValue {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "email": {"type": "string", "format": "email"},
                "date_of_birth": {"type": "string", "format": "date"},
                "error": ErrorMixin::schema_fragment()
            },
            "required": ["name", "email", "date_of_birth", "error"]
        })
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        require_name(&mut violations, "name", &self.name);
        if !is_plausible_email(&self.email) {
            violations.push(format!("email '{}' is not a valid address", self.email));
        }
        finish(violations)
    }

    fn reported_error(&self) -> Option<ReportedError> {
        self.error.reported()
    }
}

/// One medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Medication name.
    pub name: String,
    /// Strength in mg.
    pub strength: u32,
    /// Doses per day.
    pub frequency: u32,
    /// Duration in days.
    pub duration: u32,
    /// Model-reported failure.
    pub error: ErrorMixin,
}

impl Medication {
    fn json_schema() -> JsonValue {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "strength": {"type": "integer", "exclusiveMinimum": 0, "description": "Strength in mg."},
                "frequency": {"type": "integer", "exclusiveMinimum": 0},
                "duration": {"type": "integer", "exclusiveMinimum": 0, "description": "Duration in days"},
                "error": ErrorMixin::schema_fragment()
            },
            "required": ["name", "strength", "frequency", "duration", "error"]
        })
    }

    fn check(&self, index: usize, violations: &mut Vec<String>) {
        let at = format!("medications[{index}]");
        require_name(violations, &format!("{at}.name"), &self.name);
        require_positive(violations, &format!("{at}.strength"), self.strength);
        require_positive(violations, &format!("{at}.frequency"), self.frequency);
        require_positive(violations, &format!("{at}.duration"), self.duration);
    }
}

/// Medication category output: every medication found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationExtraction {
    /// Medications found, possibly none.
    pub medications: Vec<Medication>,
    /// Model-reported failure.
    pub error: ErrorMixin,
}

impl StructuredOutput for MedicationExtraction {
    fn schema_name() -> &'static str {
        InformationCategory::Medication.as_str()
    }

    fn json_schema() -> JsonValue {
        serde_json::json!({
            "type": "object",
            "properties": {
                "medications": {"type": "array", "items": Medication::json_schema()},
                "error": ErrorMixin::schema_fragment()
            },
            "required": ["medications", "error"]
        })
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        for (index, medication) in self.medications.iter().enumerate() {
            medication.check(index, &mut violations);
        }
        finish(violations)
    }

    fn reported_error(&self) -> Option<ReportedError> {
        self.error
            .reported()
            .or_else(|| self.medications.iter().find_map(|m| m.error.reported()))
    }
}

/// One symptom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptom {
    /// Symptom name.
    pub name: String,
    /// Duration in days.
    pub duration: u32,
    /// Intensity, 1 (mild) to 5 (severe).
    pub intensity: u8,
    /// Whether the symptom recurs.
    pub recurrence: bool,
    /// Model-reported failure.
    pub error: ErrorMixin,
}

impl Symptom {
    fn json_schema() -> JsonValue {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "duration": {"type": "integer", "exclusiveMinimum": 0, "description": "Duration in days"},
                "intensity": {"type": "integer", "enum": [1, 2, 3, 4, 5], "description": "Symptom intensity"},
                "recurrence": {"type": "boolean"},
                "error": ErrorMixin::schema_fragment()
            },
            "required": ["name", "duration", "intensity", "recurrence", "error"]
        })
    }

    fn check(&self, index: usize, violations: &mut Vec<String>) {
        let at = format!("symptoms[{index}]");
        require_name(violations, &format!("{at}.name"), &self.name);
        require_positive(violations, &format!("{at}.duration"), self.duration);
        if !(1..=5).contains(&self.intensity) {
            violations.push(format!(
                "{at}.intensity must be between 1 and 5, got {}",
                self.intensity
            ));
        }
    }
}

/// Symptom category output: every symptom found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomExtraction {
    /// Symptoms found, possibly none.
    pub symptoms: Vec<Symptom>,
    /// Model-reported failure.
    pub error: ErrorMixin,
}

impl StructuredOutput for SymptomExtraction {
    fn schema_name() -> &'static str {
        InformationCategory::Symptom.as_str()
    }

    fn json_schema() -> JsonValue {
        serde_json::json!({
            "type": "object",
            "properties": {
                "symptoms": {"type": "array", "items": Symptom::json_schema()},
                "error": ErrorMixin::schema_fragment()
            },
            "required": ["symptoms", "error"]
        })
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        for (index, symptom) in self.symptoms.iter().enumerate() {
            symptom.check(index, &mut violations);
        }
        finish(violations)
    }

    fn reported_error(&self) -> Option<ReportedError> {
        self.error
            .reported()
            .or_else(|| self.symptoms.iter().find_map(|s| s.error.reported()))
    }
}

/// Intent classifier output: the labels present in a text.
///
/// Labels are kept as raw strings here; mapping them to categories is the
/// classifier's job, so an unexpected label survives validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSummary {
    /// Labels present, `None` or empty when nothing was recognized.
    #[serde(default)]
    pub intent: Option<Vec<String>>,
    /// Model-reported failure.
    pub error: ErrorMixin,
}

impl PresenceSummary {
    /// JSON schema constraining `intent` to the given labels.
    #[must_use]
    pub fn json_schema_for(labels: &[&str]) -> JsonValue {
        serde_json::json!({
            "type": "object",
            "properties": {
                "intent": {
                    "type": ["array", "null"],
                    "items": {"type": "string", "enum": labels},
                    "description": "If you recognise that one or more of the labels exist in the text, include them."
                },
                "error": ErrorMixin::schema_fragment()
            },
            "required": ["intent", "error"]
        })
    }
}

impl StructuredOutput for PresenceSummary {
    fn schema_name() -> &'static str {
        InformationCategory::PresenceSummary.as_str()
    }

    fn json_schema() -> JsonValue {
        Self::json_schema_for(&DEFAULT_INTENT_LABELS)
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        Ok(())
    }

    fn reported_error(&self) -> Option<ReportedError> {
        self.error.reported()
    }
}

/// Recommendation output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Recommendation text.
    #[serde(default)]
    pub recommendation: Option<String>,
    /// Model-reported failure.
    #[serde(default)]
    pub error: Option<ErrorMixin>,
}

impl StructuredOutput for RecommendationResult {
    fn schema_name() -> &'static str {
        InformationCategory::Recommendation.as_str()
    }

    fn json_schema() -> JsonValue {
        serde_json::json!({
            "type": "object",
            "properties": {
                "recommendation": {"type": ["string", "null"]},
                "error": ErrorMixin::schema_fragment()
            },
            "required": ["recommendation", "error"]
        })
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let flagged = self.error.as_ref().is_some_and(|e| e.error);
        let has_text = self
            .recommendation
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty());
        if flagged || has_text {
            Ok(())
        } else {
            Err(vec!["recommendation is empty and no error is reported".to_string()])
        }
    }

    fn reported_error(&self) -> Option<ReportedError> {
        self.error.as_ref().and_then(ErrorMixin::reported)
    }
}

/// Composite patient form.
///
/// `None` means the category was not detected and therefore not asked for;
/// `Some(vec![])` means it was asked for and nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientForm {
    /// Patient identity, if detected.
    #[serde(default)]
    pub personal_identifiers: Option<PersonalIdentifiers>,
    /// Medications, if detected.
    #[serde(default)]
    pub medications: Option<Vec<Medication>>,
    /// Symptoms, if detected.
    #[serde(default)]
    pub symptoms: Option<Vec<Symptom>>,
    /// Form-level error.
    #[serde(default)]
    pub error: Option<ErrorMixin>,
}

impl PatientForm {
    /// Returns the categories this form has populated.
    #[must_use]
    pub fn populated_categories(&self) -> Vec<InformationCategory> {
        let mut categories = Vec::with_capacity(3);
        if self.personal_identifiers.is_some() {
            categories.push(InformationCategory::PersonalIdentifiers);
        }
        if self.medications.is_some() {
            categories.push(InformationCategory::Medication);
        }
        if self.symptoms.is_some() {
            categories.push(InformationCategory::Symptom);
        }
        categories
    }

    /// Checks the same constraints extraction enforces, for forms that
    /// arrive from outside the pipeline.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        if let Some(pii) = &self.personal_identifiers
            && let Err(mut found) = pii.validate()
        {
            violations.append(&mut found);
        }
        for (index, medication) in self.medications.iter().flatten().enumerate() {
            medication.check(index, &mut violations);
        }
        for (index, symptom) in self.symptoms.iter().flatten().enumerate() {
            symptom.check(index, &mut violations);
        }
        finish(violations)
    }
}

fn require_name(violations: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        violations.push(format!("{field} must not be empty"));
    }
}

fn require_positive(violations: &mut Vec<String>, field: &str, value: u32) {
    if value == 0 {
        violations.push(format!("{field} must be greater than 0"));
    }
}

fn finish(violations: Vec<String>) -> Result<(), Vec<String>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Syntactically valid address with a dotted domain.
fn is_plausible_email(email: &str) -> bool {
    let dotted = |domain: &str| {
        domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
    };
    validator::validate_email(email) && email.rsplit_once('@').is_some_and(|(_, d)| dotted(d))
}
