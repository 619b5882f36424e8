//! Typed structured output.
//!
//! A `StructuredOutput` type is the contract a provider response must meet:
//! it deserializes from the response JSON, passes `validate`, and can then
//! be checked for a model-reported error flag.

use crate::backend::OutputSchema;
use crate::error::AttemptFailure;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// An error the model reported inside an otherwise valid response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportedError {
    /// Human-readable message supplied by the model.
    pub message: Option<String>,
}

/// A response shape the query engine can validate.
pub trait StructuredOutput: DeserializeOwned + Send {
    /// Name of the schema, used as the provider's response-format name and
    /// in error reports.
    fn schema_name() -> &'static str;

    /// JSON Schema sent to providers as the output constraint.
    fn json_schema() -> JsonValue;

    /// Checks constraints serde cannot express (ranges, formats).
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    fn validate(&self) -> Result<(), Vec<String>>;

    /// Returns the model-reported error, if the error flag is set.
    fn reported_error(&self) -> Option<ReportedError>;

    /// Returns the named output schema for requests.
    fn output_schema() -> OutputSchema {
        OutputSchema::new(Self::schema_name(), Self::json_schema())
    }
}

/// Deserializes and validates a raw JSON value against `S`.
///
/// # Errors
///
/// Returns `AttemptFailure::Validation` if the value does not match the
/// shape of `S` or violates one of its constraints.
pub fn decode<S: StructuredOutput>(raw: JsonValue) -> Result<S, AttemptFailure> {
    let value: S = serde_json::from_value(raw).map_err(|e| AttemptFailure::Validation {
        reason: format!("does not match '{}': {e}", S::schema_name()),
    })?;
    value
        .validate()
        .map_err(|violations| AttemptFailure::Validation {
            reason: violations.join("; "),
        })?;
    Ok(value)
}
