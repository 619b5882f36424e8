//! Application state and routing.

use crate::routes;
use axum::Router;
use axum::routing::get;
use clinical_intake_extraction::FormBuilder;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    /// Form and recommendation builder over the provider roster.
    pub builder: FormBuilder,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(builder: FormBuilder) -> Self {
        Self { builder }
    }
}

/// Builds the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/get_form", get(routes::get_form))
        .route("/get_form/", get(routes::get_form))
        .route("/get_recommendation", get(routes::get_recommendation))
        .route("/get_recommendation/", get(routes::get_recommendation))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
