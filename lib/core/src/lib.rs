//! Core types shared by the clinical-intake crates.
//!
//! Provides the rootcause-backed `Result` alias and the ULID identifiers used
//! to correlate log lines across one extraction request.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{FormRequestId, LlmInvocationId, RecommendationRequestId};
