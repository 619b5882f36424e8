//! HTTP handlers.

use crate::app::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::{Query, State};
use clinical_intake_extraction::{PatientForm, RecommendationResult, parse_form};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters shared by both endpoints.
#[derive(Debug, Deserialize)]
pub struct TextQuery {
    /// Free text for `/get_form`, a serialized patient form for
    /// `/get_recommendation`.
    pub text: String,
}

/// Builds a patient form from free text.
pub async fn get_form(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TextQuery>,
) -> Result<Json<PatientForm>, ApiError> {
    let form = state.builder.build_form(&query.text).await?;
    Ok(Json(form))
}

/// Produces a recommendation for a serialized patient form.
pub async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TextQuery>,
) -> Result<Json<RecommendationResult>, ApiError> {
    let form = parse_form(&query.text)?;
    let recommendation = state.builder.build_recommendation(&form).await?;
    Ok(Json(recommendation))
}
