//! Schema registry.
//!
//! Maps every `InformationCategory` to the schema sent to providers and the
//! prompt that asks for it. The mapping is a `match` over the closed enum,
//! built once and shared.

use crate::category::InformationCategory;
use crate::prompts;
use crate::schema::{
    ErrorMixin, MedicationExtraction, PersonalIdentifiers, PresenceSummary, RecommendationResult,
    SymptomExtraction,
};
use clinical_intake_ai::{LlmCall, OutputSchema, PromptError, PromptTemplate, StructuredOutput};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Schema and prompt of one category.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    /// The category this entry serves.
    pub category: InformationCategory,
    /// Structured-output constraint sent to providers.
    pub output_schema: OutputSchema,
    /// Prompt template taking `{{text}}`.
    pub template: PromptTemplate,
}

impl SchemaEntry {
    fn of<S: StructuredOutput>(category: InformationCategory, template: PromptTemplate) -> Self {
        Self {
            category,
            output_schema: S::output_schema(),
            template,
        }
    }

    /// Renders the prompt for `text`.
    ///
    /// # Errors
    ///
    /// Returns `PromptError` if the template needs a variable that is not
    /// supplied.
    pub fn render(&self, text: &str) -> Result<String, PromptError> {
        self.render_with(text, HashMap::new())
    }

    /// Renders the prompt for `text` with extra template variables.
    ///
    /// # Errors
    ///
    /// Returns `PromptError` if a required variable is missing.
    pub fn render_with(
        &self,
        text: &str,
        mut variables: HashMap<String, JsonValue>,
    ) -> Result<String, PromptError> {
        variables.insert("text".to_string(), JsonValue::from(text));
        self.template.render(&variables)
    }

    /// Wraps a rendered prompt into a call constrained to this entry's
    /// schema.
    #[must_use]
    pub fn call(&self, prompt: impl Into<String>) -> LlmCall {
        let mut call = LlmCall::new(prompt).with_output_schema(self.output_schema.clone());
        if let Some(system) = &self.template.system_prompt {
            call = call.with_system_prompt(system.clone());
        }
        call
    }
}

static PERSONAL_IDENTIFIERS: LazyLock<SchemaEntry> = LazyLock::new(|| {
    SchemaEntry::of::<PersonalIdentifiers>(
        InformationCategory::PersonalIdentifiers,
        prompts::personal_identifiers(),
    )
});

static MEDICATION: LazyLock<SchemaEntry> = LazyLock::new(|| {
    SchemaEntry::of::<MedicationExtraction>(InformationCategory::Medication, prompts::medication())
});

static SYMPTOM: LazyLock<SchemaEntry> = LazyLock::new(|| {
    SchemaEntry::of::<SymptomExtraction>(InformationCategory::Symptom, prompts::symptom())
});

static PRESENCE_SUMMARY: LazyLock<SchemaEntry> = LazyLock::new(|| {
    SchemaEntry::of::<PresenceSummary>(
        InformationCategory::PresenceSummary,
        prompts::presence_summary(),
    )
});

static RECOMMENDATION: LazyLock<SchemaEntry> = LazyLock::new(|| {
    SchemaEntry::of::<RecommendationResult>(
        InformationCategory::Recommendation,
        prompts::recommendation(),
    )
});

static ERROR_ONLY: LazyLock<SchemaEntry> = LazyLock::new(|| {
    SchemaEntry::of::<ErrorMixin>(InformationCategory::ErrorOnly, prompts::error_only())
});

/// Returns the schema and prompt for a category.
#[must_use]
pub fn lookup(category: InformationCategory) -> &'static SchemaEntry {
    match category {
        InformationCategory::PersonalIdentifiers => &PERSONAL_IDENTIFIERS,
        InformationCategory::Medication => &MEDICATION,
        InformationCategory::Symptom => &SYMPTOM,
        InformationCategory::PresenceSummary => &PRESENCE_SUMMARY,
        InformationCategory::Recommendation => &RECOMMENDATION,
        InformationCategory::ErrorOnly => &ERROR_ONLY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_an_entry() {
        for category in InformationCategory::ALL {
            let entry = lookup(category);
            assert_eq!(entry.category, category);
            assert_eq!(entry.output_schema.name, category.as_str());
            assert_eq!(entry.template.name, category.as_str());
            assert!(entry.render("sample").expect("render").contains("sample"));
        }
    }

    #[test]
    fn call_carries_schema_and_system_prompt() {
        let entry = lookup(InformationCategory::Symptom);
        let request = entry
            .call(entry.render("fever for 2 days").expect("render"))
            .build_request();
        assert_eq!(
            request.output_schema.map(|s| s.name),
            Some("symptom".to_string())
        );
        assert!(request.system.is_some());
        assert!(request.prompt.ends_with("fever for 2 days"));
    }

    #[test]
    fn error_only_uses_bare_error_schema() {
        let entry = lookup(InformationCategory::ErrorOnly);
        assert_eq!(
            entry.output_schema.schema["required"],
            serde_json::json!(["error", "error_message"])
        );
    }
}
