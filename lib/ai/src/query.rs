//! Validating query engine.
//!
//! Sends one structured-output request to each roster provider in order and
//! returns the first response that passes structural validation. Providers
//! are tried strictly one after another; a later provider is only billed
//! when every earlier one failed.
//!
//! Outcomes of one `execute` call:
//! 1. A provider's response validates and its error flag is clear: `Ok`.
//! 2. A provider's response validates but its error flag is set:
//!    `QueryError::DomainReported`, no further providers are tried.
//! 3. Every provider fails transport or validation:
//!    `QueryError::FallbackExhausted` with one attempt per provider.

use crate::backend::{LlmProvider, LlmResponse};
use crate::error::{AttemptFailure, QueryError};
use crate::llm_call::LlmCall;
use crate::output::{StructuredOutput, decode};
use crate::roster::ProviderRoster;
use clinical_intake_core::LlmInvocationId;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Record of one provider attempt that did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    /// Invocation id, matching the attempt's log lines.
    pub invocation_id: LlmInvocationId,
    /// Provider that was called.
    pub provider: LlmProvider,
    /// Model that was called.
    pub model: String,
    /// Why the attempt was discarded.
    pub failure: AttemptFailure,
}

/// Query engine over a shared, read-only provider roster.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    roster: Arc<ProviderRoster>,
}

impl QueryEngine {
    /// Creates an engine over the given roster.
    #[must_use]
    pub fn new(roster: Arc<ProviderRoster>) -> Self {
        Self { roster }
    }

    /// Returns the roster this engine falls back through.
    #[must_use]
    pub fn roster(&self) -> &ProviderRoster {
        &self.roster
    }

    /// Runs `prompt` against the roster and returns the first valid `S`.
    ///
    /// # Errors
    ///
    /// See [`QueryEngine::execute_call`].
    pub async fn execute<S: StructuredOutput>(
        &self,
        prompt: impl Into<String>,
    ) -> Result<S, QueryError> {
        self.execute_call(LlmCall::new(prompt)).await
    }

    /// Runs a prepared call against the roster and returns the first valid
    /// `S`. If the call carries no output schema, `S`'s schema is used.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::DomainReported` when the first valid response
    /// has its error flag set, and `QueryError::FallbackExhausted` when no
    /// provider produced a valid response.
    #[instrument(skip_all, fields(schema = S::schema_name(), providers = self.roster.len()))]
    pub async fn execute_call<S: StructuredOutput>(&self, mut call: LlmCall) -> Result<S, QueryError> {
        if call.output_schema.is_none() {
            call.output_schema = Some(S::output_schema());
        }
        let request = call.build_request();
        let mut attempts = Vec::new();

        for (position, entry) in self.roster.iter().enumerate() {
            let config = entry.config();
            let invocation_id = LlmInvocationId::new();
            let started = Instant::now();

            let outcome = entry
                .backend()
                .generate(&request)
                .await
                .map_err(AttemptFailure::from)
                .and_then(|response| {
                    let tokens = response.usage.total();
                    decode::<S>(structured_json(response)?).map(|value| (value, tokens))
                });
            let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match outcome {
                Ok((value, tokens)) => {
                    if let Some(reported) = value.reported_error() {
                        warn!(
                            %invocation_id,
                            provider = %config.provider,
                            model = %config.model,
                            latency_ms,
                            message = reported.message.as_deref().unwrap_or(""),
                            "Provider reported extraction failure"
                        );
                        return Err(QueryError::DomainReported {
                            schema: S::schema_name().to_string(),
                            provider: config.provider,
                            model: config.model.clone(),
                            message: reported.message,
                        });
                    }

                    info!(
                        %invocation_id,
                        provider = %config.provider,
                        model = %config.model,
                        position,
                        latency_ms,
                        tokens,
                        "Validated provider response"
                    );
                    return Ok(value);
                }
                Err(failure) => {
                    warn!(
                        %invocation_id,
                        provider = %config.provider,
                        model = %config.model,
                        position,
                        latency_ms,
                        error = %failure,
                        "Provider attempt failed, falling back"
                    );
                    attempts.push(ProviderAttempt {
                        invocation_id,
                        provider: config.provider,
                        model: config.model.clone(),
                        failure,
                    });
                }
            }
        }

        debug!(attempts = attempts.len(), "Provider roster exhausted");
        Err(QueryError::FallbackExhausted {
            schema: S::schema_name().to_string(),
            attempts,
        })
    }
}

/// Extracts the JSON value a response carries.
fn structured_json(response: LlmResponse) -> Result<JsonValue, AttemptFailure> {
    match response.structured_output {
        Some(value) => Ok(value),
        None => serde_json::from_str(response.content.trim()).map_err(|e| {
            AttemptFailure::Validation {
                reason: format!("response is not JSON: {e}"),
            }
        }),
    }
}
