//! Prompt templates.
//!
//! Templates use `{{variable_name}}` placeholders. Required variables must
//! be supplied at render time; optional ones may carry a default.

use crate::error::PromptError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Definition of a template variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Description of what this variable is for.
    pub description: String,
    /// Whether this variable is required.
    pub required: bool,
    /// Default value if not provided.
    pub default: Option<JsonValue>,
}

impl VariableDefinition {
    /// Creates a required variable definition.
    #[must_use]
    pub fn required(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// Creates an optional variable definition.
    #[must_use]
    pub fn optional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: false,
            default: None,
        }
    }

    /// Sets a default value.
    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// A named prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Template name.
    pub name: String,
    /// Semantic version.
    pub version: String,
    /// Template content with placeholders.
    pub content: String,
    /// Optional system prompt (not templated).
    pub system_prompt: Option<String>,
    /// Variable definitions (name -> definition).
    pub variables: HashMap<String, VariableDefinition>,
}

impl PromptTemplate {
    /// Creates a new prompt template.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "0.1.0".to_string(),
            content: content.into(),
            system_prompt: None,
            variables: HashMap::new(),
        }
    }

    /// Sets the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Adds a variable definition.
    #[must_use]
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        definition: VariableDefinition,
    ) -> Self {
        self.variables.insert(name.into(), definition);
        self
    }

    /// Renders the template with the given variables.
    ///
    /// Placeholders are substituted in a single left-to-right pass, so
    /// braces inside a substituted value are never expanded again.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::MissingVariable` if a required variable without
    /// a default is absent.
    pub fn render(&self, variables: &HashMap<String, JsonValue>) -> Result<String, PromptError> {
        self.validate_variables(variables)?;

        let mut result = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();
        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            let name = &rest[start + 2..start + 2 + len];
            result.push_str(&rest[..start]);
            match self.value_for(name, variables) {
                Some(value) => result.push_str(&value),
                None => result.push_str(&rest[start..start + len + 4]),
            }
            rest = &rest[start + len + 4..];
        }
        result.push_str(rest);

        Ok(result)
    }

    fn value_for(&self, name: &str, variables: &HashMap<String, JsonValue>) -> Option<String> {
        let value = variables
            .get(name)
            .or_else(|| self.variables.get(name).and_then(|def| def.default.as_ref()))?;
        Some(match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Validates that all required variables are provided.
    ///
    /// # Errors
    ///
    /// Returns the first missing required variable, by name order.
    pub fn validate_variables(
        &self,
        variables: &HashMap<String, JsonValue>,
    ) -> Result<(), PromptError> {
        let mut missing: Vec<&String> = self
            .variables
            .iter()
            .filter(|(_, def)| def.required && def.default.is_none())
            .filter(|(name, _)| !variables.contains_key(*name))
            .map(|(name, _)| name)
            .collect();
        missing.sort();

        match missing.first() {
            None => Ok(()),
            Some(variable) => Err(PromptError::MissingVariable {
                template: self.name.clone(),
                variable: (*variable).clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, JsonValue> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), JsonValue::String((*v).to_string())))
            .collect()
    }

    #[test]
    fn template_rendering() {
        let template = PromptTemplate::new(
            "medication",
            "Extract medications mentioned in the following text:\n{{text}}",
        )
        .with_variable("text", VariableDefinition::required("Consultation text"));

        let rendered = template
            .render(&vars(&[("text", "takes ibuprofen 200mg")]))
            .expect("render");
        assert!(rendered.ends_with("takes ibuprofen 200mg"));
    }

    #[test]
    fn template_with_defaults() {
        let template = PromptTemplate::new("greeting", "Labels: {{labels}}. Text: {{text}}")
            .with_variable("text", VariableDefinition::required("Input"))
            .with_variable(
                "labels",
                VariableDefinition::optional("Labels").with_default(serde_json::json!("A, B")),
            );

        let rendered = template.render(&vars(&[("text", "x")])).expect("render");
        assert_eq!(rendered, "Labels: A, B. Text: x");
    }

    #[test]
    fn missing_required_variable_is_rejected() {
        let template = PromptTemplate::new("symptom", "{{text}}")
            .with_variable("text", VariableDefinition::required("Input"));

        let err = template.render(&HashMap::new()).expect_err("missing text");
        assert_eq!(
            err,
            PromptError::MissingVariable {
                template: "symptom".to_string(),
                variable: "text".to_string(),
            }
        );
    }

    #[test]
    fn substituted_values_are_not_re_expanded() {
        let template = PromptTemplate::new("t", "{{text}} / {{other}}")
            .with_variable("text", VariableDefinition::required("Input"));

        let rendered = template
            .render(&vars(&[("text", "literal {{other}}"), ("other", "o")]))
            .expect("render");
        assert_eq!(rendered, "literal {{other}} / o");
    }

    #[test]
    fn unknown_placeholders_are_left_in_place() {
        let template = PromptTemplate::new("t", "a {{unknown}} b {{");
        let rendered = template.render(&HashMap::new()).expect("render");
        assert_eq!(rendered, "a {{unknown}} b {{");
    }
}
