//! Intent classifier.
//!
//! Asks the roster which kinds of information a text contains, then maps
//! the returned labels to categories through the configured label map.

use crate::category::InformationCategory;
use crate::error::FormError;
use crate::labels::IntentLabelMap;
use crate::registry;
use crate::schema::PresenceSummary;
use clinical_intake_ai::{OutputSchema, QueryEngine, StructuredOutput};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// One label returned by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentLabel {
    /// The label maps to a category.
    Detected(InformationCategory),
    /// The label is not in the label map.
    Unclassifiable(String),
}

/// Outcome of intent detection.
///
/// An empty set with no unclassifiable labels means the model found
/// nothing; unclassifiable labels mean it returned something the label map
/// does not know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSet {
    categories: Vec<InformationCategory>,
    unclassifiable: Vec<String>,
}

impl IntentSet {
    /// Builds a set from classified labels. Repeated categories are
    /// dropped, first occurrence wins.
    #[must_use]
    pub fn from_labels(labels: impl IntoIterator<Item = IntentLabel>) -> Self {
        let mut set = Self::default();
        for label in labels {
            match label {
                IntentLabel::Detected(category) => {
                    if !set.categories.contains(&category) {
                        set.categories.push(category);
                    }
                }
                IntentLabel::Unclassifiable(label) => set.unclassifiable.push(label),
            }
        }
        set
    }

    /// Detected categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> &[InformationCategory] {
        &self.categories
    }

    /// Labels that did not map to any category.
    #[must_use]
    pub fn unclassifiable(&self) -> &[String] {
        &self.unclassifiable
    }

    /// Whether `category` was detected.
    #[must_use]
    pub fn contains(&self, category: InformationCategory) -> bool {
        self.categories.contains(&category)
    }

    /// True if no category was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Detects which categories a text contains.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    engine: QueryEngine,
    labels: Arc<IntentLabelMap>,
}

impl IntentClassifier {
    /// Creates a classifier.
    #[must_use]
    pub fn new(engine: QueryEngine, labels: Arc<IntentLabelMap>) -> Self {
        Self { engine, labels }
    }

    /// Maps one raw label to an intent label. Exact match only.
    #[must_use]
    pub fn classify_label(&self, label: &str) -> IntentLabel {
        match self.labels.resolve(label) {
            Some(category) => IntentLabel::Detected(category),
            None => IntentLabel::Unclassifiable(label.to_string()),
        }
    }

    /// Runs the presence-summary query for `text`.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Classification` with the query engine's failure
    /// unchanged, or `FormError::Prompt` if the prompt cannot be rendered.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub async fn detect(&self, text: &str) -> Result<IntentSet, FormError> {
        let labels = self.labels.labels();
        let entry = registry::lookup(InformationCategory::PresenceSummary);
        let prompt = entry.render_with(
            text,
            HashMap::from([("labels".to_string(), JsonValue::from(labels.join(", ")))]),
        )?;

        let mut call = entry.call(prompt);
        call.output_schema = Some(OutputSchema::new(
            PresenceSummary::schema_name(),
            PresenceSummary::json_schema_for(&labels),
        ));

        let summary: PresenceSummary = self
            .engine
            .execute_call(call)
            .await
            .map_err(FormError::Classification)?;

        let set = IntentSet::from_labels(
            summary
                .intent
                .unwrap_or_default()
                .iter()
                .map(|label| self.classify_label(label)),
        );

        for label in set.unclassifiable() {
            warn!(label = %label, "Classifier returned unknown intent label");
        }
        debug!(categories = ?set.categories(), "Intents detected");

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedBackend, call_log, calls, engine, intents, no_error};
    use clinical_intake_ai::{LlmError, QueryError};

    fn classifier(reply: serde_json::Value) -> IntentClassifier {
        let log = call_log();
        let backend = ScriptedBackend::new("m1", &log)
            .reply("presence_summary", reply)
            .build();
        IntentClassifier::new(engine(vec![backend]), Arc::new(IntentLabelMap::default()))
    }

    #[tokio::test]
    async fn maps_labels_to_categories() {
        let set = classifier(intents(&["Medication", "Symptoms"]))
            .detect("patient takes ibuprofen and reports a headache")
            .await
            .expect("detect");
        assert_eq!(
            set.categories(),
            [InformationCategory::Medication, InformationCategory::Symptom]
        );
        assert!(set.unclassifiable().is_empty());
        assert!(!set.contains(InformationCategory::PersonalIdentifiers));
    }

    #[tokio::test]
    async fn null_intent_means_nothing_detected() {
        let set = classifier(serde_json::json!({"intent": null, "error": no_error()}))
            .detect("")
            .await
            .expect("detect");
        assert!(set.is_empty());
        assert!(set.unclassifiable().is_empty());
    }

    #[tokio::test]
    async fn unknown_labels_are_kept_apart() {
        let set = classifier(intents(&["Allergies", "Medication", "medication"]))
            .detect("allergic to penicillin, takes metformin")
            .await
            .expect("detect");
        assert_eq!(set.categories(), [InformationCategory::Medication]);
        assert_eq!(set.unclassifiable(), ["Allergies", "medication"]);
    }

    #[tokio::test]
    async fn duplicate_labels_collapse() {
        let set = classifier(intents(&["Symptoms", "Medication", "Symptoms"]))
            .detect("text")
            .await
            .expect("detect");
        assert_eq!(
            set.categories(),
            [InformationCategory::Symptom, InformationCategory::Medication]
        );
    }

    #[tokio::test]
    async fn prompt_lists_configured_labels() {
        let log = call_log();
        let backend = ScriptedBackend::new("m1", &log)
            .reply("presence_summary", intents(&[]))
            .build();
        let labels = IntentLabelMap::from_config(&HashMap::from([
            ("Drugs".to_string(), "medication".to_string()),
            ("Complaints".to_string(), "symptom".to_string()),
        ]))
        .expect("labels");
        let classifier = IntentClassifier::new(engine(vec![backend]), Arc::new(labels));

        classifier.detect("feeling dizzy").await.expect("detect");

        let recorded = log.lock().unwrap();
        assert!(recorded[0].prompt.contains("Complaints, Drugs"));
        assert!(recorded[0].prompt.ends_with("feeling dizzy"));
    }

    #[tokio::test]
    async fn engine_failure_propagates_unchanged() {
        let log = call_log();
        let backend = ScriptedBackend::new("m1", &log)
            .fail("presence_summary", LlmError::Timeout)
            .build();
        let classifier =
            IntentClassifier::new(engine(vec![backend]), Arc::new(IntentLabelMap::default()));

        let err = classifier.detect("text").await.expect_err("exhausted");
        match err {
            FormError::Classification(QueryError::FallbackExhausted { schema, attempts }) => {
                assert_eq!(schema, "presence_summary");
                assert_eq!(attempts.len(), 1);
            }
            other => panic!("expected classification exhaustion, got {other:?}"),
        }
        assert_eq!(calls(&log), [("m1".to_string(), "presence_summary".to_string())]);
    }
}
