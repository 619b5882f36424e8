//! Form builder.
//!
//! Orchestrates one request: classify the text, extract every detected
//! category in turn, assemble the form. The first failing step aborts the
//! request and nothing extracted so far is returned.

use crate::category::InformationCategory;
use crate::classifier::IntentClassifier;
use crate::error::FormError;
use crate::labels::IntentLabelMap;
use crate::registry;
use crate::schema::{
    MedicationExtraction, PatientForm, PersonalIdentifiers, RecommendationResult,
    SymptomExtraction,
};
use clinical_intake_ai::QueryEngine;
use clinical_intake_core::{FormRequestId, RecommendationRequestId};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Phase of one form build.
///
/// `Start → Classifying → Extracting(c)* → Assembled`, with any working
/// phase allowed to drop to `Failed`. Categories are extracted in the
/// order the classifier reported them, each at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    /// Nothing done yet.
    Start,
    /// Intent classification in flight.
    Classifying,
    /// Extraction of one category in flight.
    Extracting(InformationCategory),
    /// Form complete.
    Assembled,
    /// Aborted at the given step.
    Failed(InformationCategory),
}

impl BuildPhase {
    /// Whether `next` is a legal successor of this phase.
    #[must_use]
    pub fn can_advance_to(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Start, Self::Classifying) => true,
            (Self::Classifying, Self::Extracting(_) | Self::Assembled) => true,
            (Self::Classifying, Self::Failed(category)) => {
                *category == InformationCategory::PresenceSummary
            }
            (Self::Extracting(current), Self::Extracting(following)) => current != following,
            (Self::Extracting(_), Self::Assembled) => true,
            (Self::Extracting(current), Self::Failed(category)) => current == category,
            _ => false,
        }
    }

    /// True for `Assembled` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Assembled | Self::Failed(_))
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Classifying => write!(f, "classifying"),
            Self::Extracting(category) => write!(f, "extracting({category})"),
            Self::Assembled => write!(f, "assembled"),
            Self::Failed(category) => write!(f, "failed({category})"),
        }
    }
}

/// Current phase of one build, advanced through checked transitions.
#[derive(Debug)]
struct BuildProgress {
    phase: BuildPhase,
    extracted: Vec<InformationCategory>,
}

impl BuildProgress {
    fn new() -> Self {
        Self {
            phase: BuildPhase::Start,
            extracted: Vec::with_capacity(3),
        }
    }

    /// Whether `next` follows the current phase without revisiting a
    /// category.
    fn permits(&self, next: &BuildPhase) -> bool {
        let revisit = matches!(next, BuildPhase::Extracting(c) if self.extracted.contains(c));
        self.phase.can_advance_to(next) && !revisit
    }

    fn advance(&mut self, next: BuildPhase) {
        let legal = self.permits(&next);
        debug_assert!(legal, "illegal build transition {} -> {next}", self.phase);
        if !legal {
            warn!(from = %self.phase, to = %next, "Illegal build transition");
        }
        debug!(from = %self.phase, to = %next, "Build phase");
        if let BuildPhase::Extracting(category) = next {
            self.extracted.push(category);
        }
        self.phase = next;
    }
}

/// Builds patient forms and recommendations.
#[derive(Debug, Clone)]
pub struct FormBuilder {
    engine: QueryEngine,
    classifier: IntentClassifier,
}

impl FormBuilder {
    /// Creates a builder; the classifier shares the same engine.
    #[must_use]
    pub fn new(engine: QueryEngine, labels: Arc<IntentLabelMap>) -> Self {
        Self {
            classifier: IntentClassifier::new(engine.clone(), labels),
            engine,
        }
    }

    /// Returns the query engine.
    #[must_use]
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Builds a patient form from free text.
    ///
    /// Categories that were not detected stay `None`.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error: classification, prompt
    /// rendering, or extraction of a detected category.
    #[instrument(skip_all, fields(request_id = %FormRequestId::new(), text_len = text.len()))]
    pub async fn build_form(&self, text: &str) -> Result<PatientForm, FormError> {
        let mut progress = BuildProgress::new();

        progress.advance(BuildPhase::Classifying);
        let intents = match self.classifier.detect(text).await {
            Ok(intents) => intents,
            Err(e) => {
                progress.advance(BuildPhase::Failed(InformationCategory::PresenceSummary));
                return Err(e);
            }
        };

        let targets = intents
            .categories()
            .iter()
            .copied()
            .filter(InformationCategory::is_extraction_target);

        let mut form = PatientForm::default();
        for category in targets {
            progress.advance(BuildPhase::Extracting(category));
            if let Err(e) = self.extract_into(&mut form, category, text).await {
                progress.advance(BuildPhase::Failed(category));
                warn!(%category, error = %e, "Extraction failed, discarding form");
                return Err(e);
            }
        }

        progress.advance(BuildPhase::Assembled);
        info!(
            categories = ?form.populated_categories(),
            unclassifiable = intents.unclassifiable().len(),
            "Patient form assembled"
        );
        Ok(form)
    }

    async fn extract_into(
        &self,
        form: &mut PatientForm,
        category: InformationCategory,
        text: &str,
    ) -> Result<(), FormError> {
        let entry = registry::lookup(category);
        let call = entry.call(entry.render(text)?);
        let failed = move |source| FormError::Extraction { category, source };

        match category {
            InformationCategory::PersonalIdentifiers => {
                let pii: PersonalIdentifiers =
                    self.engine.execute_call(call).await.map_err(failed)?;
                form.personal_identifiers = Some(pii);
            }
            InformationCategory::Medication => {
                let found: MedicationExtraction =
                    self.engine.execute_call(call).await.map_err(failed)?;
                form.medications = Some(found.medications);
            }
            InformationCategory::Symptom => {
                let found: SymptomExtraction =
                    self.engine.execute_call(call).await.map_err(failed)?;
                form.symptoms = Some(found.symptoms);
            }
            InformationCategory::PresenceSummary
            | InformationCategory::Recommendation
            | InformationCategory::ErrorOnly => {
                debug!(%category, "Not an extraction target, skipped");
            }
        }
        Ok(())
    }

    /// Asks for a clinical recommendation for an assembled form.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Recommendation` with the query engine's failure
    /// unchanged.
    #[instrument(skip_all, fields(request_id = %RecommendationRequestId::new()))]
    pub async fn build_recommendation(
        &self,
        form: &PatientForm,
    ) -> Result<RecommendationResult, FormError> {
        let serialized = serde_json::to_string(form).map_err(|e| FormError::InvalidForm {
            reason: e.to_string(),
        })?;
        let entry = registry::lookup(InformationCategory::Recommendation);
        let call = entry.call(entry.render(&serialized)?);

        let result: RecommendationResult = self
            .engine
            .execute_call(call)
            .await
            .map_err(FormError::Recommendation)?;
        info!("Recommendation produced");
        Ok(result)
    }
}

/// Parses and checks a serialized patient form from outside the pipeline.
///
/// # Errors
///
/// Returns `FormError::InvalidForm` if the payload is not a patient form
/// or breaks one of its constraints.
pub fn parse_form(payload: &str) -> Result<PatientForm, FormError> {
    let form: PatientForm =
        serde_json::from_str(payload).map_err(|e| FormError::InvalidForm {
            reason: e.to_string(),
        })?;
    form.validate().map_err(|violations| FormError::InvalidForm {
        reason: violations.join("; "),
    })?;
    Ok(form)
}
