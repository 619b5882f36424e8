//! LLM Call primitive.
//!
//! Single-shot inference configuration. The query engine turns one `LlmCall`
//! into one `LlmRequest` and sends that same request to each provider in
//! roster order.

use crate::backend::{LlmRequest, OutputSchema};
use serde::{Deserialize, Serialize};

/// An LLM call description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCall {
    /// The fully rendered prompt.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Optional output schema for structured output.
    pub output_schema: Option<OutputSchema>,
}

impl LlmCall {
    /// Creates a new LLM Call with the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            output_schema: None,
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Adds an output schema for structured output.
    #[must_use]
    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Builds an LLM request from this call.
    #[must_use]
    pub fn build_request(&self) -> LlmRequest {
        let mut request = LlmRequest::new(self.prompt.clone());

        if let Some(ref system) = self.system_prompt {
            request = request.with_system(system.clone());
        }

        if let Some(ref schema) = self.output_schema {
            request = request.with_output_schema(schema.clone());
        }

        request
    }
}
