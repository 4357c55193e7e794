pub mod pages;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::analysis::EmotionAnalyzer;
use crate::config::Config;
use crate::error::{MoodreelError, Result};

pub fn create_router(analyzer: Arc<EmotionAnalyzer>) -> Router {
    Router::new()
        .route("/", get(index_html))
        .route("/analyze_emotion", post(analyze_emotion))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(analyzer)
}

pub async fn start_server(analyzer: Arc<EmotionAnalyzer>, config: Arc<Config>) -> Result<()> {
    let app = create_router(analyzer);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MoodreelError::ServerError(format!("Failed to bind {}: {}", addr, e)))?;
    info!("Web UI listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .map_err(|e| MoodreelError::ServerError(format!("Server stopped: {}", e)))?;

    Ok(())
}

async fn index_html() -> impl IntoResponse {
    Html(include_str!("static/index.html"))
}

async fn health() -> &'static str {
    "ok"
}

async fn analyze_emotion(State(analyzer): State<Arc<EmotionAnalyzer>>) -> Response {
    info!("Emotion analysis requested");
    match analyzer.analyze().await {
        Ok(outcome) => Html(pages::render_result(&outcome)).into_response(),
        Err(e) => {
            error!("Emotion analysis failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::render_error())).into_response()
        }
    }
}
