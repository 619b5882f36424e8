//! Inference primitives for clinical-intake.
//!
//! - **Backends**: the `LlmBackend` trait and an OpenAI-compatible HTTP
//!   implementation
//! - **Provider roster**: ordered fallback list, built once at startup
//! - **Query engine**: schema-validated structured output with roster
//!   fallback
//!
//! Extraction schemas, prompts and orchestration live in
//! `clinical-intake-extraction`, built on top of these.

pub mod backend;
pub mod error;
pub mod llm_call;
pub mod openai;
pub mod output;
pub mod prompt;
pub mod query;
pub mod roster;

pub use backend::{
    LlmBackend, LlmBackendConfig, LlmProvider, LlmRequest, LlmResponse, OutputSchema, TokenUsage,
};
pub use error::{AttemptFailure, ConfigError, LlmError, PromptError, QueryError};
pub use llm_call::LlmCall;
pub use openai::OpenAiBackend;
pub use output::{ReportedError, StructuredOutput};
pub use prompt::{PromptTemplate, VariableDefinition};
pub use query::{ProviderAttempt, QueryEngine};
pub use roster::{ProviderConfig, ProviderRoster, RosterEntry};
