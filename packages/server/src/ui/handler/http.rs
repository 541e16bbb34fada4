//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::domain::ChannelScope;
use crate::infrastructure::dto::http::StoredMessageDto;
use crate::ui::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Query parameters for the history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub garden: Option<String>,
    pub channel: Option<String>,
}

/// Get stored message history, optionally restricted to one channel.
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<StoredMessageDto>>, StatusCode> {
    let scope = match (query.garden, query.channel) {
        (Some(garden), Some(channel)) => match ChannelScope::new(garden, channel) {
            Ok(scope) => Some(scope),
            Err(_) => return Err(StatusCode::BAD_REQUEST),
        },
        (None, None) => None,
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    match state.get_history_usecase.execute(scope.as_ref()).await {
        Ok(messages) => Ok(Json(messages.into_iter().map(Into::into).collect())),
        Err(e) => {
            tracing::error!("Failed to read message history: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
