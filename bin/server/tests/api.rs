//! End-to-end tests of the HTTP API over scripted providers.

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use clinical_intake_ai::{
    LlmBackend, LlmError, LlmProvider, LlmRequest, LlmResponse, ProviderRoster, QueryEngine,
};
use clinical_intake_extraction::{FormBuilder, IntentLabelMap};
use clinical_intake_server::{AppState, router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Answers by requested schema name and records every schema it was asked
/// for.
struct ScriptedBackend {
    model: &'static str,
    replies: HashMap<&'static str, Value>,
    asked: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let schema = request
            .output_schema
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        self.asked.lock().unwrap().push(schema.clone());
        match self.replies.get(schema.as_str()) {
            Some(reply) => Ok(LlmResponse::structured(self.model, reply.clone())),
            None => Err(LlmError::Timeout),
        }
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAiCompatible
    }

    fn model(&self) -> &str {
        self.model
    }
}

fn app(replies: &[(&'static str, Value)]) -> (axum::Router, Arc<Mutex<Vec<String>>>) {
    let asked = Arc::new(Mutex::new(Vec::new()));
    let backend = ScriptedBackend {
        model: "scripted",
        replies: replies.iter().cloned().collect(),
        asked: Arc::clone(&asked),
    };
    let roster = ProviderRoster::new(vec![Arc::new(backend)]).expect("roster");
    let builder = FormBuilder::new(
        QueryEngine::new(Arc::new(roster)),
        Arc::new(IntentLabelMap::default()),
    );
    (router(Arc::new(AppState::new(builder))), asked)
}

fn no_error() -> Value {
    json!({"error": false, "error_message": null})
}

async fn get(app: axum::Router, path: &str, text: &str) -> (StatusCode, Value) {
    let uri = format!("{path}?text={}", urlencoding::encode(text));
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn get_form_returns_detected_categories() {
    let (app, asked) = app(&[
        ("presence_summary", json!({"intent": ["Medication"], "error": no_error()})),
        (
            "medication",
            json!({
                "medications": [{"name": "paracetamol", "strength": 500, "frequency": 4, "duration": 3, "error": no_error()}],
                "error": no_error()
            }),
        ),
    ]);

    let (status, body) = get(app, "/get_form", "I take paracetamol 500mg four times a day").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["personal_identifiers"], Value::Null);
    assert_eq!(body["symptoms"], Value::Null);
    assert_eq!(body["medications"][0]["name"], "paracetamol");
    assert_eq!(body["medications"][0]["strength"], 500);
    assert_eq!(*asked.lock().unwrap(), ["presence_summary", "medication"]);
}

#[tokio::test]
async fn trailing_slash_is_accepted() {
    let (app, _) = app(&[("presence_summary", json!({"intent": null, "error": no_error()}))]);
    let (status, body) = get(app, "/get_form/", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"personal_identifiers": null, "medications": null, "symptoms": null, "error": null})
    );
}

#[tokio::test]
async fn exhaustion_maps_to_bad_gateway() {
    let (app, _) = app(&[("presence_summary", json!({"intent": ["Symptoms"], "error": no_error()}))]);

    let (status, body) = get(app, "/get_form", "I have a fever").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["kind"], "fallback_exhausted");
    assert_eq!(body["error"]["category"], "symptom");
}

#[tokio::test]
async fn domain_error_maps_to_unprocessable() {
    let (app, _) = app(&[(
        "presence_summary",
        json!({"intent": null, "error": {"error": true, "error_message": "Please describe your condition."}}),
    )]);

    let (status, body) = get(app, "/get_form", "asdf").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["kind"], "domain_reported");
    assert_eq!(body["error"]["message"], "Please describe your condition.");
    assert_eq!(body["error"]["category"], "presence_summary");
}

#[tokio::test]
async fn get_recommendation_returns_result() {
    let (app, asked) = app(&[(
        "recommendation",
        json!({"recommendation": "See a doctor if the fever persists.", "error": no_error()}),
    )]);
    let form = json!({
        "symptoms": [{"name": "fever", "duration": 2, "intensity": 3, "recurrence": false, "error": no_error()}]
    });

    let (status, body) = get(app, "/get_recommendation", &form.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendation"], "See a doctor if the fever persists.");
    assert_eq!(*asked.lock().unwrap(), ["recommendation"]);
}

#[tokio::test]
async fn malformed_form_is_rejected_without_provider_calls() {
    let (app, asked) = app(&[]);

    let (status, body) = get(app, "/get_recommendation", "fever for two days").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_form");
    assert!(asked.lock().unwrap().is_empty());
}
