use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use llm_market::api;
use llm_market::config::Config;
use llm_market::redis::RedisManager;
use llm_market::service::AssistantService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Arc::new(Config::load());

    // Initialize RedisManager
    let redis_manager = Arc::new(RedisManager::new_with_config(&config).await?);

    // Create the assistant service (rehydrates the cart)
    let service = Arc::new(AssistantService::new(&config, redis_manager).await?);

    let bind: SocketAddr = config.server.bind.parse()?;

    // Optional bearer token auth for the API routes
    let bearer_token = std::env::var("LM_BEARER_TOKEN").ok();

    let mut router = api::router(service);
    if let Some(expected) = bearer_token.clone() {
        let expected = Arc::new(expected);
        router = router.layer(middleware::from_fn_with_state(
            expected.clone(),
            require_bearer,
        ));
    }

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        %bind,
        auth = %bearer_token.as_deref().map(|_| "bearer").unwrap_or("none"),
        "Starting LLM Market server"
    );

    axum::serve(listener, router).await?;
    Ok(())
}

async fn require_bearer(
    State(expected): State<Arc<String>>,
    req: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    if req.uri().path().eq("/health") {
        return next.run(req).await;
    }
    let headers: &HeaderMap = req.headers();
    let authorized = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", expected.as_str()));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    next.run(req).await
}
