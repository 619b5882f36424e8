//! Error types for the AI crate.
//!
//! - `LlmError`: low-level backend failures (one provider, one call)
//! - `AttemptFailure`: why a single roster attempt was discarded
//! - `QueryError`: terminal outcome of a query across the whole roster
//! - `PromptError`: prompt template rendering
//! - `ConfigError`: roster construction, reported through rootcause at startup

use crate::backend::LlmProvider;
use crate::query::ProviderAttempt;
use std::fmt;

/// Errors from LLM backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Provider is unavailable.
    ProviderUnavailable { provider: String, reason: String },
    /// Request failed.
    RequestFailed { reason: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "LLM provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Why one provider's attempt did not produce a usable value.
///
/// Always non-fatal: the query engine records it and moves to the next
/// provider in the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The call itself failed (connection, HTTP status, timeout).
    Transport(LlmError),
    /// The response arrived but does not satisfy the target schema.
    Validation { reason: String },
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport failure: {e}"),
            Self::Validation { reason } => write!(f, "validation failure: {reason}"),
        }
    }
}

impl std::error::Error for AttemptFailure {}

impl From<LlmError> for AttemptFailure {
    fn from(e: LlmError) -> Self {
        Self::Transport(e)
    }
}

/// Terminal failure of a query engine call.
///
/// Exactly one of these fires per failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No provider in the roster produced a structurally valid response.
    FallbackExhausted {
        /// Schema (category) that was requested.
        schema: String,
        /// Every attempt, in roster order.
        attempts: Vec<ProviderAttempt>,
    },
    /// A provider returned a valid response with its error flag set.
    DomainReported {
        /// Schema (category) that was requested.
        schema: String,
        /// Provider that reported the failure.
        provider: LlmProvider,
        /// Model that reported the failure.
        model: String,
        /// Message supplied by the model, if any.
        message: Option<String>,
    },
}

impl QueryError {
    /// Returns the schema name the failed call targeted.
    #[must_use]
    pub fn schema(&self) -> &str {
        match self {
            Self::FallbackExhausted { schema, .. } | Self::DomainReported { schema, .. } => schema,
        }
    }

    /// Returns true for the fallback-exhaustion outcome.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::FallbackExhausted { .. })
    }

    /// Returns the model-supplied message of a domain-reported failure.
    #[must_use]
    pub fn domain_message(&self) -> Option<&str> {
        match self {
            Self::DomainReported { message, .. } => message.as_deref(),
            Self::FallbackExhausted { .. } => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FallbackExhausted { schema, attempts } => {
                write!(
                    f,
                    "no validated response for '{schema}' after {} provider attempt(s)",
                    attempts.len()
                )
            }
            Self::DomainReported {
                schema,
                provider,
                model,
                message,
            } => {
                write!(f, "{provider}/{model} reported '{schema}' extraction failure")?;
                if let Some(message) = message {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// Errors from prompt operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// Missing required variable.
    MissingVariable { template: String, variable: String },
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable { template, variable } => {
                write!(
                    f,
                    "missing required variable '{variable}' in template '{template}'"
                )
            }
        }
    }
}

impl std::error::Error for PromptError {}

/// Errors building the provider roster from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No providers were configured.
    EmptyRoster,
    /// A provider entry cannot be used.
    InvalidProvider {
        /// Position in the configured roster.
        index: usize,
        /// Model identifier of the entry.
        model: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRoster => write!(f, "provider roster is empty"),
            Self::InvalidProvider {
                index,
                model,
                reason,
            } => {
                write!(f, "provider #{index} ('{model}') is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
