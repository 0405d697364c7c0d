use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Request,
    Router,
};
use hyper::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;
use travel_backend::{
    config::ModelSettings,
    create_router,
    gemini::{GenerateContentRequest, GenerateContentResponse, GeminiError, GenerativeModel},
    AppState,
};

/// Model double that replays a canned reply and records what it was asked.
pub struct ScriptedModel {
    reply: Box<dyn Fn() -> Result<GenerateContentResponse, GeminiError> + Send + Sync>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedModel {
    pub fn replying(body: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(move || Ok(serde_json::from_value(body.clone()).expect("response"))),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(move || {
                Err(GeminiError::Status {
                    status,
                    message: "upstream unavailable".into(),
                })
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), serde_json::to_value(request).unwrap()));
        (self.reply)()
    }
}

pub fn test_app(model: Arc<ScriptedModel>) -> Router {
    create_router(AppState::new(model, ModelSettings::default()))
}

pub async fn post_json<T: DeserializeOwned>(
    app: Router,
    uri: &str,
    payload: &Value,
) -> (StatusCode, T) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// A `generateContent` reply whose only text part is `text`.
pub fn text_reply(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}
