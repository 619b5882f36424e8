//! Centralized server configuration.
//!
//! Loaded via the `config` crate, in order of increasing precedence:
//! - `clinical-intake.toml` in the working directory, or the file named by
//!   `CLINICAL_INTAKE_CONFIG` (required when set)
//! - environment variables prefixed `CLINICAL_INTAKE_`, with `__` between
//!   nested keys
//!
//! Environment variables come from the process, merged over a `.env` file
//! in the working directory. When no providers are configured,
//! `OPENAI_API_KEY` yields the default roster.

use clinical_intake_ai::LlmBackendConfig;
use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "CLINICAL_INTAKE_CONFIG";

/// Models of the default roster, in fallback order.
pub const DEFAULT_OPENAI_MODELS: [&str; 2] = ["gpt-3.5-turbo", "gpt-4o-mini"];

const DEFAULT_CONFIG_FILE: &str = "clinical-intake.toml";

const ENV_FILE: &str = ".env";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Upper bound on one outbound inference call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Provider roster, in fallback order.
    #[serde(default)]
    pub providers: Vec<LlmBackendConfig>,

    /// Classifier label to category name. The built-in labels apply when
    /// unset.
    #[serde(default)]
    pub intent_labels: Option<HashMap<String, String>>,

    /// OpenAI key for the default roster.
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_timeout_secs: default_request_timeout_secs(),
            providers: Vec::new(),
            intent_labels: None,
            openai_api_key: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the default file locations, `.env` and
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `.env` or an explicitly named file is
    /// unreadable, or any source is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let process = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Self::load_from_env(merged_env(Path::new(ENV_FILE), process)?)
    }

    /// Loads configuration with `vars` standing in for the environment:
    /// `CLINICAL_INTAKE_CONFIG` and `OPENAI_API_KEY` are read from it, as
    /// are the `CLINICAL_INTAKE_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the named file is missing or a source is
    /// malformed.
    pub fn load_from_env(vars: Map<String, String>) -> Result<Self, ConfigError> {
        let path = vars.get(CONFIG_PATH_VAR).cloned();
        let openai_api_key = vars.get("OPENAI_API_KEY").cloned();
        let file = match path.as_deref() {
            Some(path) => File::new(path, FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("CLINICAL_INTAKE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars)),
            )
            .set_override_option("openai_api_key", openai_api_key.filter(|k| !k.is_empty()))?
            .build()?
            .try_deserialize()
    }

    /// Returns the provider roster configuration, falling back to the
    /// OpenAI default roster when none is configured.
    #[must_use]
    pub fn roster(&self) -> Vec<LlmBackendConfig> {
        if !self.providers.is_empty() {
            return self.providers.clone();
        }
        match &self.openai_api_key {
            Some(key) => DEFAULT_OPENAI_MODELS
                .iter()
                .map(|model| LlmBackendConfig::open_ai(key.clone(), *model))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reads `env_file` and overlays `process` on it. A missing file
/// contributes nothing.
fn merged_env(
    env_file: &Path,
    process: impl IntoIterator<Item = (String, String)>,
) -> Result<Map<String, String>, ConfigError> {
    let mut vars: Map<String, String> = match dotenvy::from_path_iter(env_file) {
        Ok(entries) => entries
            .collect::<Result<_, _>>()
            .map_err(|e| ConfigError::Foreign(Box::new(e)))?,
        Err(e) if e.not_found() => Map::new(),
        Err(e) => return Err(ConfigError::Foreign(Box::new(e))),
    };
    vars.extend(process);
    Ok(vars)
}
