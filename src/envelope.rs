//! Response envelope shared by every endpoint.
//!
//! Successful calls serialize their payload as-is. Failures always carry the
//! same shape, so clients can branch on `status` without looking at the code:
//!
//! ```json
//! {"status":"Error","error":"field name is a required field"}
//! ```

use std::fmt::Display;

use serde::Serialize;

use crate::response::{Response, ResponseBuilder};
use crate::status::Status;

pub const STATUS_ERROR: &str = "Error";

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub status: &'a str,
    pub error: &'a str,
}

/// Serializes `value` as the JSON body of a `status` response.
pub fn json<T: Serialize + ?Sized>(status: Status, value: &T) -> Response {
    encode(Response::builder().status(status), value)
}

/// `201 Created` pointing at the new resource.
pub fn created<T: Serialize + ?Sized>(location: &str, value: &T) -> Response {
    encode(Response::builder().status(Status::Created).header("location", location), value)
}

fn encode<T: Serialize + ?Sized>(builder: ResponseBuilder, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => builder.json(body),
        Err(e) => {
            tracing::error!("failed to encode response body: {e}");
            error(Status::InternalServerError, "failed to encode response")
        }
    }
}

/// Error envelope with a human-readable message.
pub fn error(status: Status, message: impl Display) -> Response {
    let message = message.to_string();
    let body = ErrorBody { status: STATUS_ERROR, error: &message };
    // Two string fields cannot fail to serialize.
    let bytes = serde_json::to_vec(&body)
        .unwrap_or_else(|_| br#"{"status":"Error","error":"internal error"}"#.to_vec());
    Response::builder().status(status).json(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_shape() {
        let res = error(Status::BadRequest, "empty body");
        assert_eq!(res.status_code(), 400);
        assert_eq!(res.header("content-type"), Some("application/json"));

        let v: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(v, serde_json::json!({"status": "Error", "error": "empty body"}));
    }

    #[test]
    fn created_sets_location() {
        let res = created("/api/students/7", &serde_json::json!({"id": 7}));
        assert_eq!(res.status_code(), 201);
        assert_eq!(res.header("location"), Some("/api/students/7"));
        assert_eq!(res.body(), br#"{"id":7}"#);
    }

    #[test]
    fn json_keeps_payload_unwrapped() {
        let res = json(Status::Created, &serde_json::json!({"id": 7}));
        assert_eq!(res.status_code(), 201);
        assert_eq!(res.body(), br#"{"id":7}"#);
    }
}
