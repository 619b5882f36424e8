//! Scripted backends for pipeline tests.

use async_trait::async_trait;
use clinical_intake_ai::{
    LlmBackend, LlmError, LlmProvider, LlmRequest, LlmResponse, ProviderRoster, QueryEngine,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One call a scripted backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCall {
    pub model: String,
    pub schema: String,
    pub prompt: String,
}

pub(crate) type CallLog = Arc<Mutex<Vec<RecordedCall>>>;

pub(crate) fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// `(model, schema)` pairs in call order.
pub(crate) fn calls(log: &CallLog) -> Vec<(String, String)> {
    log.lock()
        .unwrap()
        .iter()
        .map(|call| (call.model.clone(), call.schema.clone()))
        .collect()
}

/// Backend that answers by requested schema name. Unscripted schemas fail
/// with a transport error.
pub(crate) struct ScriptedBackend {
    model: String,
    replies: HashMap<String, Result<LlmResponse, LlmError>>,
    log: CallLog,
}

impl ScriptedBackend {
    pub(crate) fn new(model: &str, log: &CallLog) -> Self {
        Self {
            model: model.to_string(),
            replies: HashMap::new(),
            log: Arc::clone(log),
        }
    }

    pub(crate) fn reply(mut self, schema: &str, output: JsonValue) -> Self {
        let response = LlmResponse::structured(self.model.clone(), output);
        self.replies.insert(schema.to_string(), Ok(response));
        self
    }

    pub(crate) fn fail(mut self, schema: &str, error: LlmError) -> Self {
        self.replies.insert(schema.to_string(), Err(error));
        self
    }

    pub(crate) fn build(self) -> Arc<dyn LlmBackend> {
        Arc::new(self)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let schema = request
            .output_schema
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        self.log.lock().unwrap().push(RecordedCall {
            model: self.model.clone(),
            schema: schema.clone(),
            prompt: request.prompt.clone(),
        });
        self.replies
            .get(&schema)
            .cloned()
            .unwrap_or_else(|| {
                Err(LlmError::RequestFailed {
                    reason: format!("no scripted reply for '{schema}'"),
                })
            })
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAiCompatible
    }

    fn model(&self) -> &str {
        &self.model
    }
}

pub(crate) fn engine(backends: Vec<Arc<dyn LlmBackend>>) -> QueryEngine {
    QueryEngine::new(Arc::new(ProviderRoster::new(backends).expect("roster")))
}

pub(crate) fn no_error() -> JsonValue {
    serde_json::json!({"error": false, "error_message": null})
}

pub(crate) fn intents(labels: &[&str]) -> JsonValue {
    serde_json::json!({"intent": labels, "error": no_error()})
}

pub(crate) fn ibuprofen() -> JsonValue {
    serde_json::json!({
        "medications": [{
            "name": "ibuprofen",
            "strength": 200,
            "frequency": 3,
            "duration": 5,
            "error": no_error()
        }],
        "error": no_error()
    })
}

pub(crate) fn headache() -> JsonValue {
    serde_json::json!({
        "symptoms": [{
            "name": "headache",
            "duration": 2,
            "intensity": 3,
            "recurrence": false,
            "error": no_error()
        }],
        "error": no_error()
    })
}

pub(crate) fn alice() -> JsonValue {
    serde_json::json!({
        "name": "Alice Smith",
        "email": "alice@example.com",
        "date_of_birth": "1990-04-12",
        "error": no_error()
    })
}
