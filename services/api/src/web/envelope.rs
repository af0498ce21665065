//! services/api/src/web/envelope.rs
//!
//! Every response body, successful or not, is wrapped as `{ code, msg, data }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn failure(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            msg: msg.into(),
            data: None,
        }
    }
}

/// A successful response: status code plus payload, rendered inside the envelope.
pub struct Reply<T> {
    status: StatusCode,
    msg: &'static str,
    data: T,
}

impl<T> Reply<T> {
    pub fn ok(msg: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            msg,
            data,
        }
    }

    pub fn created(msg: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            msg,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            code: self.status.as_u16(),
            msg: self.msg.to_string(),
            data: Some(self.data),
        };
        (self.status, Json(body)).into_response()
    }
}
