use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use crate::error::LlmMarketError;
use crate::models::Product;
use crate::service::AssistantService;

pub type AppState = Arc<AssistantService>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<Product>,
    pub total: f64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/cart", get(get_cart))
        .route("/api/cart/:id", delete(remove_cart_item))
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
}

async fn chat(
    State(service): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    match service.handle_input(&request.input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(LlmMarketError::InvalidInput(message)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody { error: message }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("chat handler error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Failed to process input".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn get_cart(State(service): State<AppState>) -> Json<CartResponse> {
    let (items, total) = service.cart_contents().await;
    Json(CartResponse { items, total })
}

async fn remove_cart_item(
    State(service): State<AppState>,
    Path(id): Path<u32>,
) -> Json<CartResponse> {
    let removed = service.remove_from_cart(id).await;
    tracing::info!(id, removed, "Cart item removal requested");
    let (items, total) = service.cart_contents().await;
    Json(CartResponse { items, total })
}
