use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_backend::{
    config::{Config, ModelSettings},
    create_router,
    gemini::GeminiClient,
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let client = GeminiClient::new(&config.api_base, &config.api_key, config.request_timeout())
        .expect("build Gemini HTTP client");
    tracing::info!(
        travel_model = %config.travel_model,
        tts_model = %config.tts_model,
        "using Gemini at {}",
        config.api_base
    );

    let state = AppState::new(Arc::new(client), ModelSettings::from(&config));
    let app = create_router(state);

    tracing::info!("starting backend on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("bind listener");
    axum::serve(listener, app).await.expect("serve backend");
}
