use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method, Request},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::state::AppState;

/// Build the application router with all routes and middleware
pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let origin = state
        .config
        .frontend_origin
        .parse::<HeaderValue>()
        .context("FRONTEND_ORIGIN is not a valid header value")?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let api = Router::new()
        .merge(crate::auth::router())
        .merge(crate::admin::router())
        .merge(crate::students::router())
        .merge(crate::interventions::router());

    let app = Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::response::Response,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", response.status().as_u16());
                        tracing::info!(latency_ms = latency.as_millis(), "request completed");
                    },
                ),
        );

    Ok(app)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Bind to the configured host/port and serve until shutdown
pub async fn serve(app: Router) -> anyhow::Result<()> {
    let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8000);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
