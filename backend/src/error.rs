use axum::{http::StatusCode, Json};
use shared::ApiError;
use thiserror::Error;

use crate::gemini::GeminiError;

pub const INVALID_FORMAT_MESSAGE: &str =
    "La IA devolvió un formato de datos no válido. Por favor, intenta reformular tu solicitud.";
pub const NO_RESPONSE_MESSAGE: &str =
    "No se pudo obtener una respuesta de la IA. Por favor, inténtalo de nuevo.";
pub const SPEECH_FAILED_MESSAGE: &str = "No se pudo generar audio a partir del texto.";

/// Which service produced the error; decides the user-facing wording of
/// upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Travel,
    Speech,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("model returned no text")]
    MissingText,
    #[error("model returned malformed travel data: {0}")]
    InvalidFormat(#[from] serde_json::Error),
    #[error("no audio data received from the TTS API")]
    MissingAudio,
    #[error("upstream error: {0}")]
    Upstream(#[from] GeminiError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn user_message(&self, service: Service) -> String {
        match (service, self) {
            (_, ServiceError::InvalidInput(reason)) => (*reason).to_string(),
            (Service::Speech, _) => SPEECH_FAILED_MESSAGE.to_string(),
            (Service::Travel, ServiceError::MissingText | ServiceError::InvalidFormat(_)) => {
                INVALID_FORMAT_MESSAGE.to_string()
            }
            (Service::Travel, _) => NO_RESPONSE_MESSAGE.to_string(),
        }
    }

    pub fn into_api_error(self, service: Service) -> (StatusCode, Json<ApiError>) {
        match &self {
            ServiceError::InvalidInput(_) => tracing::debug!(?service, error = %self, "rejected request"),
            _ => tracing::error!(?service, error = %self, "service call failed"),
        }
        (
            self.status(),
            Json(ApiError {
                message: self.user_message(service),
            }),
        )
    }
}
