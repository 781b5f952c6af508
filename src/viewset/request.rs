//! Per-request input handed to viewset operations: path params, query params, raw body.

use crate::entity::Row;
use crate::error::AppError;
use crate::query::QueryParams;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{Method, StatusCode},
};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct ViewRequest {
    pub method: Method,
    /// Matched path parameters, e.g. `id`.
    pub params: HashMap<String, String>,
    pub query: QueryParams,
    pub body: Bytes,
}

impl ViewRequest {
    /// Request with only a query string; used by callers driving operations directly.
    pub fn with_query(raw: &str) -> Self {
        ViewRequest {
            query: QueryParams::parse(raw),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.params.insert("id".into(), id.to_string());
        self
    }

    pub fn with_body(mut self, body: &Value) -> Self {
        self.body = Bytes::from(body.to_string());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    /// The `:id` path parameter as a positive integer.
    pub fn id(&self) -> Result<i64, AppError> {
        let raw = self
            .param("id")
            .ok_or_else(|| AppError::BadRequest("missing id".into()))?;
        raw.parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::BadRequest(format!("invalid id: {}", raw)))
    }

    /// Body as a JSON object. Anything else (empty, malformed, array, scalar) is a bad request.
    pub fn json_object(&self) -> Result<Row, AppError> {
        if self.body.is_empty() {
            return Err(AppError::BadRequest("request body is required".into()));
        }
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
            Err(e) => Err(AppError::BadRequest(format!("invalid request body: {}", e))),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for ViewRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        // Routes without parameters reject `Path`; treat that as no params.
        let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, state)
            .await
            .map(|Path(p)| p)
            .unwrap_or_default();
        let query = QueryParams::from_uri(&parts.uri);
        let method = parts.method.clone();
        let body = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge(e.body_text())
                } else {
                    AppError::BadRequest(e.body_text())
                }
            })?;
        Ok(ViewRequest {
            method,
            params,
            query,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_must_be_positive_integer() {
        assert!(matches!(ViewRequest::default().id(), Err(AppError::BadRequest(m)) if m == "missing id"));
        assert_eq!(ViewRequest::default().with_id(7).id().unwrap(), 7);
        let mut req = ViewRequest::default();
        req.params.insert("id".into(), "abc".into());
        assert!(matches!(req.id(), Err(AppError::BadRequest(_))));
        req.params.insert("id".into(), "0".into());
        assert!(req.id().is_err());
    }

    #[test]
    fn json_object_rejects_non_objects() {
        let req = ViewRequest::default();
        assert!(req.json_object().is_err());
        let req = ViewRequest::default().with_body(&json!([1, 2]));
        assert!(req.json_object().is_err());
        let mut req = ViewRequest::default();
        req.body = Bytes::from_static(b"{not json");
        assert!(req.json_object().is_err());
        let req = ViewRequest::default().with_body(&json!({"name": "A"}));
        assert_eq!(req.json_object().unwrap()["name"], json!("A"));
    }
}
