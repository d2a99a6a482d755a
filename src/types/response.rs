//! JSON-RPC responses
//!
//! Modeled as two distinct wire shapes rather than one struct with optional
//! `result`/`error` fields, so a [`Message`](crate::types::Message) can never
//! represent a response that is simultaneously (or neither) a success and a
//! failure.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::error::{Error, ErrorCode};
use crate::types::RequestId;

/// A successful JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// JSON-RPC protocol version.
    ///
    /// > Note: always 2.0.
    pub jsonrpc: String,

    /// Request identifier matching the original request.
    pub id: RequestId,

    /// The result of the method invocation.
    pub result: Value,
}

/// An error JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// JSON-RPC protocol version.
    ///
    /// > Note: always 2.0.
    pub jsonrpc: String,

    /// Request identifier matching the original request.
    ///
    /// Per JSON-RPC 2.0, this is `null` when the error occurred before the
    /// request's id could be determined (e.g. a parse error).
    pub id: Option<RequestId>,

    /// Error details.
    pub error: ErrorDetails,
}

/// Detailed error information carried by an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Integer error code.
    pub code: ErrorCode,

    /// Short description of the error.
    pub message: String,

    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<Error> for ErrorDetails {
    #[inline]
    fn from(err: Error) -> Self {
        Self {
            code: err.code,
            message: err.to_string(),
            data: None,
        }
    }
}

impl Response {
    /// Creates a successful response.
    pub fn new(id: RequestId, result: Value) -> Self {
        Self { jsonrpc: crate::JSONRPC_VERSION.into(), id, result }
    }

    /// Unwraps the result into `T`.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, Error> {
        serde_json::from_value(self.result).map_err(Into::into)
    }
}

impl ErrorResponse {
    /// Creates an error response for a known request id.
    pub fn new(id: RequestId, error: Error) -> Self {
        Self { jsonrpc: crate::JSONRPC_VERSION.into(), id: Some(id), error: error.into() }
    }

    /// Creates an error response for a message whose id could not be
    /// determined (e.g. malformed JSON).
    pub fn without_id(error: Error) -> Self {
        Self { jsonrpc: crate::JSONRPC_VERSION.into(), id: None, error: error.into() }
    }
}

/// Converts an arbitrary outcome into a [`Response`] or [`ErrorResponse`].
pub trait IntoResponse {
    fn into_response(self, id: RequestId) -> Result<Response, ErrorResponse>;
}

impl IntoResponse for Value {
    #[inline]
    fn into_response(self, id: RequestId) -> Result<Response, ErrorResponse> {
        Ok(Response::new(id, self))
    }
}

impl IntoResponse for Error {
    #[inline]
    fn into_response(self, id: RequestId) -> Result<Response, ErrorResponse> {
        Err(ErrorResponse::new(id, self))
    }
}

impl IntoResponse for ErrorCode {
    #[inline]
    fn into_response(self, id: RequestId) -> Result<Response, ErrorResponse> {
        Err(ErrorResponse::new(id, self.into()))
    }
}

impl<L: IntoResponse, R: IntoResponse> IntoResponse for crate::shared::Either<L, R> {
    #[inline]
    fn into_response(self, id: RequestId) -> Result<Response, ErrorResponse> {
        match self {
            crate::shared::Either::Left(l) => l.into_response(id),
            crate::shared::Either::Right(r) => r.into_response(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_serializes_success_without_error_field() {
        let resp = Response::new(RequestId::Number(42), serde_json::json!({ "key": "test" }));
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":42,"result":{"key":"test"}}"#);
    }

    #[test]
    fn it_serializes_error_without_result_field() {
        let resp = ErrorResponse::new(
            RequestId::String("id".into()),
            Error::new(ErrorCode::InternalError, "boom"),
        );
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":"id","error":{"code":-32603,"message":"boom"}}"#);
    }

    #[test]
    fn it_serializes_null_id_when_unknown() {
        let resp = ErrorResponse::without_id(Error::new(ErrorCode::ParseError, "bad json"));
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"bad json"}}"#);
    }

    #[test]
    fn it_round_trips_into_result() {
        let resp = Response::new(RequestId::Number(1), serde_json::json!(["a", "b"]));
        let result: Vec<String> = resp.into_result().unwrap();
        assert_eq!(result, vec!["a".to_string(), "b".to_string()]);
    }
}
