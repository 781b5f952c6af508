//! Standard response envelope helpers.
//!
//! Every endpoint answers `{code, msg, data?, pagination?}`; `code == 0` is success.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const SUCCESS_MSG: &str = "success";

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

/// Pagination block attached to list responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            code: 0,
            msg: SUCCESS_MSG.to_string(),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Envelope {
            code,
            msg: msg.into(),
            data: None,
            pagination: None,
        }
    }
}

pub fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope::ok(data))).into_response()
}

pub fn success_with_pagination<T: Serialize>(data: T, pagination: PaginationMeta) -> Response {
    let mut body = Envelope::ok(data);
    body.pagination = Some(pagination);
    (StatusCode::OK, Json(body)).into_response()
}

/// Error envelope sent with HTTP 200; only the body carries the failure.
pub fn error(code: i32, msg: impl Into<String>) -> Response {
    error_with_status(StatusCode::OK, code, msg)
}

pub fn error_with_status(status: StatusCode, code: i32, msg: impl Into<String>) -> Response {
    let body: Envelope<()> = Envelope::error(code, msg);
    (status, Json(body)).into_response()
}

fn status_error(status: StatusCode, msg: impl Into<String>) -> Response {
    error_with_status(status, i32::from(status.as_u16()), msg)
}

pub fn bad_request(msg: impl Into<String>) -> Response {
    status_error(StatusCode::BAD_REQUEST, msg)
}

pub fn unauthorized(msg: impl Into<String>) -> Response {
    status_error(StatusCode::UNAUTHORIZED, msg)
}

pub fn forbidden(msg: impl Into<String>) -> Response {
    status_error(StatusCode::FORBIDDEN, msg)
}

pub fn not_found(msg: impl Into<String>) -> Response {
    status_error(StatusCode::NOT_FOUND, msg)
}

pub fn internal_server_error(msg: impl Into<String>) -> Response {
    status_error(StatusCode::INTERNAL_SERVER_ERROR, msg)
}
