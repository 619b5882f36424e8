//! Intent label map.
//!
//! The classifier asks the model for a list of human-readable labels; this
//! map turns them back into categories. Matching is exact, so a label the
//! map does not know is surfaced as unclassifiable rather than guessed.

use crate::category::InformationCategory;
use crate::error::LabelMapError;
use crate::schema::DEFAULT_INTENT_LABELS;
use std::collections::HashMap;

/// Validated mapping from classifier label to extraction category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentLabelMap {
    entries: Vec<(String, InformationCategory)>,
}

impl Default for IntentLabelMap {
    fn default() -> Self {
        let [pii, medication, symptoms] = DEFAULT_INTENT_LABELS;
        Self {
            entries: vec![
                (pii.to_string(), InformationCategory::PersonalIdentifiers),
                (medication.to_string(), InformationCategory::Medication),
                (symptoms.to_string(), InformationCategory::Symptom),
            ],
        }
    }
}

impl IntentLabelMap {
    /// Builds a map from configuration, label to category name.
    ///
    /// Labels are kept in sorted order so the classifier prompt is stable.
    ///
    /// # Errors
    ///
    /// Fails if the map is empty, a label is blank, or a label names
    /// anything other than an extraction category.
    pub fn from_config(
        labels: &HashMap<String, String>,
    ) -> clinical_intake_core::Result<Self, LabelMapError> {
        if labels.is_empty() {
            return Err(LabelMapError::Empty.into());
        }

        let mut entries = Vec::with_capacity(labels.len());
        for (label, target) in labels {
            if label.trim().is_empty() {
                return Err(LabelMapError::BlankLabel.into());
            }
            let category = target
                .parse::<InformationCategory>()
                .ok()
                .filter(InformationCategory::is_extraction_target)
                .ok_or_else(|| LabelMapError::UnmappedLabel {
                    label: label.clone(),
                    target: target.clone(),
                })?;
            entries.push((label.clone(), category));
        }
        entries.sort();

        Ok(Self { entries })
    }

    /// Returns the category for an exact label match.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<InformationCategory> {
        self.entries
            .iter()
            .find(|(known, _)| known == label)
            .map(|(_, category)| *category)
    }

    /// Returns the labels in prompt order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; an empty map cannot be built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(label, target)| ((*label).to_string(), (*target).to_string()))
            .collect()
    }

    #[test]
    fn default_map_covers_extraction_targets() {
        let map = IntentLabelMap::default();
        assert_eq!(
            map.resolve("Personally identifiable information"),
            Some(InformationCategory::PersonalIdentifiers)
        );
        assert_eq!(map.resolve("Medication"), Some(InformationCategory::Medication));
        assert_eq!(map.resolve("Symptoms"), Some(InformationCategory::Symptom));
        assert_eq!(map.labels(), DEFAULT_INTENT_LABELS);
    }

    #[test]
    fn resolve_is_exact() {
        let map = IntentLabelMap::default();
        assert_eq!(map.resolve("medication"), None);
        assert_eq!(map.resolve("Symptoms "), None);
        assert_eq!(map.resolve("Allergies"), None);
    }

    #[test]
    fn from_config_sorts_labels() {
        let map = IntentLabelMap::from_config(&config(&[
            ("Symptoms", "symptom"),
            ("Drugs", "medication"),
        ]))
        .expect("valid map");
        assert_eq!(map.labels(), ["Drugs", "Symptoms"]);
        assert_eq!(map.resolve("Drugs"), Some(InformationCategory::Medication));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn from_config_rejects_non_extraction_targets() {
        for target in ["recommendation", "presence_summary", "allergy", "Medication"] {
            let result = IntentLabelMap::from_config(&config(&[("Label", target)]));
            assert!(result.is_err(), "target '{target}' must be rejected");
        }
    }

    #[test]
    fn from_config_rejects_empty_and_blank() {
        assert!(IntentLabelMap::from_config(&HashMap::new()).is_err());
        assert!(IntentLabelMap::from_config(&config(&[(" ", "symptom")])).is_err());
    }
}
