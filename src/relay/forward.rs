use super::RelayState;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Forward a `generateContent` body upstream with the server-held key.
///
/// The upstream status and JSON are passed through; a top-level `text` field
/// is added when the first candidate carries text.
pub async fn forward(State(state): State<Arc<RelayState>>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {e}"));
        }
    };

    let upstream = state
        .client
        .post(state.upstream_url.clone())
        .header("x-goog-api-key", &state.api_key)
        .json(&payload)
        .send()
        .await;

    let response = match upstream {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Upstream request failed");
            return error_response(StatusCode::BAD_GATEWAY, "Upstream request failed");
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut data: Value = match response.json().await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, %status, "Upstream returned a non-JSON body");
            return error_response(StatusCode::BAD_GATEWAY, "Upstream returned an invalid response");
        }
    };

    if !status.is_success() {
        tracing::warn!(%status, "Upstream returned an error status");
    }

    attach_text(&mut data);
    (status, Json(data)).into_response()
}

/// Text of the first candidate, all text parts joined
pub fn candidate_text(data: &Value) -> Option<String> {
    let parts = data.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

fn attach_text(data: &mut Value) {
    if data.get("text").is_some() {
        return;
    }
    if let Some(text) = candidate_text(data)
        && let Some(object) = data.as_object_mut()
    {
        object.insert("text".to_string(), Value::String(text));
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
