use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use innkeep_infra::EngineError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Every engine/store failure surfaces as a client error; the body carries
/// the distinguishing code.
pub fn engine_error_to_response(err: EngineError) -> Response {
    match &err {
        EngineError::Storage(_) | EngineError::DeadlineExceeded => {
            tracing::warn!(error = %err, "request failed");
        }
        _ => tracing::debug!(error = %err, "request rejected"),
    }
    json_error(StatusCode::BAD_REQUEST, err.code(), err.to_string())
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
}

pub fn query_rejection_to_response(rejection: QueryRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
}

pub fn not_found(what: &str) -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}
