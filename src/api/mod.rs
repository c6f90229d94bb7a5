//! REST API handlers and shared response helpers

pub mod health;
pub mod metrics;
pub mod user;

use crate::form::TemplateData;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Form keys whose submitted values are never sent back
const SECRET_FORM_KEYS: &[&str] = &["password", "retype"];

pub(crate) fn without_secrets(mut data: TemplateData) -> TemplateData {
    for key in SECRET_FORM_KEYS {
        data.remove(*key);
    }
    data
}

/// 422 response carrying the projected form data
pub(crate) fn unprocessable(data: TemplateData) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(Value::Object(without_secrets(data))),
    )
        .into_response()
}
