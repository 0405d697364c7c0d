use seed::prelude::*;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    ApiError, SpeechRequest, SpeechResponse, TravelQueryRequest, TravelQueryResponse,
};

const NO_RESPONSE: &str = "No se pudo obtener una respuesta de la IA. Por favor, inténtalo de nuevo.";
const SPEECH_FAILED: &str = "No se pudo generar audio a partir del texto.";

fn api_root() -> String {
    if let Some(url) = option_env!("FRONTEND_API_ROOT") {
        return url.trim_end_matches('/').to_string();
    }
    "http://localhost:8080/api".to_string()
}

pub async fn fetch_travel_info(payload: TravelQueryRequest) -> Result<TravelQueryResponse, String> {
    web_sys::console::debug_1(
        &format!(
            "[frontend] sending travel query at ({:.5},{:.5})",
            payload.location.lat, payload.location.lng
        )
        .into(),
    );
    post_json("travel", &payload, NO_RESPONSE).await
}

pub async fn fetch_speech(text: String) -> Result<SpeechResponse, String> {
    post_json("speech", &SpeechRequest { text }, SPEECH_FAILED).await
}

/// POSTs `payload` to the backend. Errors carry the backend's user-facing
/// message when it sent one, `fallback` otherwise; the raw cause goes to the
/// console.
async fn post_json<Req, Resp>(path: &str, payload: &Req, fallback: &str) -> Result<Resp, String>
where
    Req: Serialize,
    Resp: DeserializeOwned + 'static,
{
    let fail = |cause: String| {
        web_sys::console::error_1(&format!("[frontend] /{path} failed: {cause}").into());
        fallback.to_string()
    };

    let request = Request::new(format!("{}/{path}", api_root()))
        .method(Method::Post)
        .json(payload)
        .map_err(|err| fail(format!("{err:?}")))?;
    let response = request.fetch().await.map_err(|err| fail(format!("{err:?}")))?;

    let status = response.status();
    if !status.is_ok() {
        return Err(match response.json::<ApiError>().await {
            Ok(api_error) if !api_error.message.is_empty() => api_error.message,
            _ => fail(format!("HTTP {}", status.code)),
        });
    }

    response
        .json::<Resp>()
        .await
        .map_err(|err| fail(format!("{err:?}")))
}
