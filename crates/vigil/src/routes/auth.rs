//! Auth service endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use vigil_common::ServiceName;

use crate::state::AppState;

#[derive(Serialize)]
struct ForwardFailure {
    error: Value,
    data: Value,
}

/// Forward a fixed demo payload to the notification service through the
/// cache gate
pub async fn send_data_to_notification(State(state): State<AppState>) -> Response {
    let payload = json!({ "hello": "world" });
    let target = ServiceName::notification();

    match state.forwarder.forward(&target, &payload).await {
        Ok(mut body) => match take_error(&mut body) {
            Some(error) => {
                tracing::warn!(target_service = %target, error = %error, "Target replied with an error");
                failure(StatusCode::INTERNAL_SERVER_ERROR, error, body)
            }
            None => Json(body).into_response(),
        },
        Err(e) => {
            tracing::debug!(
                target_service = %target,
                gate_tripped = e.is_gate_tripped(),
                "Forward failed"
            );
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            failure(status, Value::String(e.to_string()), json!({}))
        }
    }
}

fn failure(status: StatusCode, error: Value, data: Value) -> Response {
    (status, Json(ForwardFailure { error, data })).into_response()
}

/// Split an `error` field off a reply body.
///
/// The field is always removed; it is returned only when set to a truthy
/// value (not null, false, zero or an empty string).
fn take_error(body: &mut Value) -> Option<Value> {
    let error = body.as_object_mut()?.remove("error")?;
    let set = match &error {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    set.then_some(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_error() {
        let mut body = json!({ "error": "queue full", "id": 7 });
        assert_eq!(take_error(&mut body), Some(json!("queue full")));
        assert_eq!(body, json!({ "id": 7 }));

        let mut body = json!({ "error": "", "ok": true });
        assert_eq!(take_error(&mut body), None);
        assert_eq!(body, json!({ "ok": true }));

        let mut body = json!([1, 2]);
        assert_eq!(take_error(&mut body), None);
        assert_eq!(body, json!([1, 2]));
    }
}
