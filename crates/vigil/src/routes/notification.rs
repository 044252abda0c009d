//! Notification service endpoints.

use axum::Json;
use serde_json::Value;

/// Echo whatever JSON was delivered
pub async fn receive_data(Json(body): Json<Value>) -> Json<Value> {
    tracing::info!(body = %body, "Received data");
    Json(body)
}
