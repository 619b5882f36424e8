//! Provider roster.
//!
//! The ordered list of inference backends a query falls back through. Built
//! once at startup and shared read-only; its order is the fallback contract.

use crate::backend::{LlmBackend, LlmBackendConfig, LlmProvider};
use crate::error::ConfigError;
use crate::openai::OpenAiBackend;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Provider handle plus model identifier of one roster position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider handle.
    pub provider: LlmProvider,
    /// Model identifier.
    pub model: String,
}

impl ProviderConfig {
    /// Creates a provider config.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl fmt::Display for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// One roster position.
#[derive(Clone)]
pub struct RosterEntry {
    config: ProviderConfig,
    backend: Arc<dyn LlmBackend>,
}

impl RosterEntry {
    /// Creates an entry for a backend, taking the config from the backend.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            config: ProviderConfig::new(backend.provider(), backend.model()),
            backend,
        }
    }

    /// Returns the provider config.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &dyn LlmBackend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for RosterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RosterEntry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable list of providers. Never empty.
#[derive(Debug, Clone)]
pub struct ProviderRoster {
    entries: Vec<RosterEntry>,
}

impl ProviderRoster {
    /// Creates a roster from backends, in priority order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyRoster` if `backends` is empty.
    pub fn new(backends: Vec<Arc<dyn LlmBackend>>) -> Result<Self, Report<ConfigError>> {
        if backends.is_empty() {
            return Err(ConfigError::EmptyRoster.into());
        }
        Ok(Self {
            entries: backends.into_iter().map(RosterEntry::new).collect(),
        })
    }

    /// Creates a roster of HTTP backends from configuration, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or an entry is unusable
    /// (missing model, base URL or required API key).
    pub fn from_configs(
        configs: &[LlmBackendConfig],
        timeout: Duration,
    ) -> Result<Self, Report<ConfigError>> {
        let mut backends: Vec<Arc<dyn LlmBackend>> = Vec::with_capacity(configs.len());
        for (index, config) in configs.iter().enumerate() {
            let backend = OpenAiBackend::new(config.clone(), timeout).map_err(|e| {
                ConfigError::InvalidProvider {
                    index,
                    model: config.model.clone(),
                    reason: e.to_string(),
                }
            })?;
            backends.push(Arc::new(backend));
        }
        Self::new(backends)
    }

    /// Iterates entries in fallback order.
    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }

    /// Returns the provider configs in fallback order.
    #[must_use]
    pub fn configs(&self) -> Vec<&ProviderConfig> {
        self.entries.iter().map(RosterEntry::config).collect()
    }

    /// Returns the number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; an empty roster cannot be built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LlmRequest, LlmResponse};
    use crate::error::LlmError;
    use async_trait::async_trait;

    struct NamedBackend(&'static str);

    #[async_trait]
    impl LlmBackend for NamedBackend {
        async fn generate(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            Err(LlmError::Timeout)
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::OpenAiCompatible
        }

        fn model(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn empty_roster_is_rejected() {
        assert!(ProviderRoster::new(Vec::new()).is_err());
        assert!(ProviderRoster::from_configs(&[], Duration::from_secs(1)).is_err());
    }

    #[test]
    fn roster_preserves_order() {
        let roster = ProviderRoster::new(vec![
            Arc::new(NamedBackend("first")),
            Arc::new(NamedBackend("second")),
            Arc::new(NamedBackend("third")),
        ])
        .expect("roster");

        let models: Vec<&str> = roster.iter().map(|e| e.config().model.as_str()).collect();
        assert_eq!(models, ["first", "second", "third"]);
        assert_eq!(roster.len(), 3);
        assert!(!roster.is_empty());
    }

    #[test]
    fn from_configs_builds_http_backends() {
        let roster = ProviderRoster::from_configs(
            &[
                LlmBackendConfig::open_ai("sk-test", "gpt-3.5-turbo"),
                LlmBackendConfig::ollama("http://localhost:11434", "llama3.1"),
            ],
            Duration::from_secs(5),
        )
        .expect("roster");

        assert_eq!(
            roster.configs(),
            [
                &ProviderConfig::new(LlmProvider::OpenAi, "gpt-3.5-turbo"),
                &ProviderConfig::new(LlmProvider::Ollama, "llama3.1"),
            ]
        );
    }

    #[test]
    fn from_configs_rejects_open_ai_without_key() {
        let config = LlmBackendConfig {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key: None,
        };
        assert!(ProviderRoster::from_configs(&[config], Duration::from_secs(5)).is_err());
    }

    #[test]
    fn provider_config_display() {
        let config = ProviderConfig::new(LlmProvider::OpenAi, "gpt-4o-mini");
        assert_eq!(config.to_string(), "open_ai/gpt-4o-mini");
    }
}
