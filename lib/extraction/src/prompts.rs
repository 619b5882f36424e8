//! Prompt templates, one per information category.
//!
//! Every template takes the source text as `{{text}}`.

use clinical_intake_ai::{PromptTemplate, VariableDefinition};

const SYSTEM_PROMPT: &str = "You extract structured clinical information from patient text. \
Only report what the text states. If the requested information cannot be \
extracted, set error.error to true and explain why in error.error_message.";

fn text_variable() -> VariableDefinition {
    VariableDefinition::required("Patient text to analyse")
}

fn template(name: &str, content: &str) -> PromptTemplate {
    PromptTemplate::new(name, content)
        .with_version("1")
        .with_system_prompt(SYSTEM_PROMPT)
        .with_variable("text", text_variable())
}

pub(crate) fn personal_identifiers() -> PromptTemplate {
    template(
        "personal_identifiers",
        "Extract any personally identifiable information from the following text:\n{{text}}",
    )
}

pub(crate) fn medication() -> PromptTemplate {
    template(
        "medication",
        "Extract medications mentioned in the following text:\n{{text}}",
    )
}

pub(crate) fn symptom() -> PromptTemplate {
    template(
        "symptom",
        "Extract symptoms mentioned in the following text:\n{{text}}",
    )
}

/// Takes `{{labels}}` as well: the labels the classifier may answer with.
pub(crate) fn presence_summary() -> PromptTemplate {
    template(
        "presence_summary",
        "Which of the following kinds of information are present in the text below? \
Answer only with labels from this list: {{labels}}. If none are present, \
return null for intent.\n{{text}}",
    )
    .with_variable(
        "labels",
        VariableDefinition::optional("Comma-separated intent labels").with_default(
            serde_json::json!("Personally identifiable information, Medication, Symptoms"),
        ),
    )
}

/// `{{text}}` is the serialized patient form.
pub(crate) fn recommendation() -> PromptTemplate {
    template(
        "recommendation",
        "Given the following patient form, give a short clinical recommendation \
for the patient:\n{{text}}",
    )
}

pub(crate) fn error_only() -> PromptTemplate {
    template(
        "error_only",
        "Decide whether the following text can be processed as a patient \
intake. If it cannot, report why:\n{{text}}",
    )
}
