pub mod config;
pub mod error;
pub mod gemini;
pub mod speech;
pub mod travel;
pub mod wav;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    ApiError, SpeechRequest, SpeechResponse, TravelQueryRequest, TravelQueryResponse,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ModelSettings;
use crate::error::Service;
use crate::gemini::GenerativeModel;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn GenerativeModel>,
    pub settings: Arc<ModelSettings>,
}

impl AppState {
    pub fn new(model: Arc<dyn GenerativeModel>, settings: ModelSettings) -> Self {
        Self {
            model,
            settings: Arc::new(settings),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/travel", post(travel_handler))
        .route("/api/speech", post(speech_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn travel_handler(
    State(state): State<AppState>,
    Json(req): Json<TravelQueryRequest>,
) -> Result<Json<TravelQueryResponse>, (StatusCode, Json<ApiError>)> {
    travel::get_travel_info(
        state.model.as_ref(),
        &state.settings.travel_model,
        &req.prompt,
        req.location,
    )
    .await
    .map(Json)
    .map_err(|err| err.into_api_error(Service::Travel))
}

async fn speech_handler(
    State(state): State<AppState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<SpeechResponse>, (StatusCode, Json<ApiError>)> {
    speech::text_to_speech(
        state.model.as_ref(),
        &state.settings.tts_model,
        &state.settings.tts_voice,
        &req.text,
    )
    .await
    .map(Json)
    .map_err(|err| err.into_api_error(Service::Speech))
}
