//! JSON-RPC and application error codes

use std::fmt::Display;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::error::Error;

/// Standard JSON-RPC codes plus the application codes the engine raises.
///
/// Application codes all sit at or below -32000, the range JSON-RPC 2.0
/// reserves for implementation-defined server errors.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorCode {
    /// The peer sent invalid JSON.
    ParseError = -32700,

    /// The JSON sent is not a valid Request object.
    InvalidRequest = -32600,

    /// The method does not exist / is not available.
    MethodNotFound = -32601,

    /// Invalid method parameter(s).
    InvalidParams = -32602,

    /// Internal JSON-RPC error.
    #[default]
    InternalError = -32603,

    /// An outbound request's pending deadline (soft or hard) elapsed
    /// before a response arrived.
    RequestTimeout = -32000,

    /// An operation was attempted in a state that forbids it — e.g.
    /// registering a capability after `connect()`.
    StateError = -32001,

    /// The peer asserted a capability that was never negotiated.
    CapabilityError = -32002,

    /// A message violated the wire protocol (malformed `_meta`, an
    /// unknown task method, a response with no matching pending request).
    ProtocolError = -32003,

    /// A task-sub-protocol operation failed (unknown task id, invalid
    /// status transition, already-terminal task).
    TaskError = -32004,

    /// The request was cancelled via `notifications/cancelled`.
    RequestCancelled = -32005,
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code as i32
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = ();

    #[inline]
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -32700 => Ok(ErrorCode::ParseError),
            -32600 => Ok(ErrorCode::InvalidRequest),
            -32601 => Ok(ErrorCode::MethodNotFound),
            -32602 => Ok(ErrorCode::InvalidParams),
            -32603 => Ok(ErrorCode::InternalError),
            -32000 => Ok(ErrorCode::RequestTimeout),
            -32001 => Ok(ErrorCode::StateError),
            -32002 => Ok(ErrorCode::CapabilityError),
            -32003 => Ok(ErrorCode::ProtocolError),
            -32004 => Ok(ErrorCode::TaskError),
            -32005 => Ok(ErrorCode::RequestCancelled),
            _ => Err(()),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let code: i32 = (*self).into();
        serializer.serialize_i32(code)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<ErrorCode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i32::deserialize(deserializer)?;
        ErrorCode::try_from(value).map_err(|_| {
            serde::de::Error::custom(format!("invalid error code: {value}"))
        })
    }
}

impl Display for ErrorCode {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::ParseError => write!(f, "Parse error"),
            ErrorCode::InvalidRequest => write!(f, "Invalid request"),
            ErrorCode::MethodNotFound => write!(f, "Method not found"),
            ErrorCode::InvalidParams => write!(f, "Invalid parameters"),
            ErrorCode::InternalError => write!(f, "Internal error"),
            ErrorCode::RequestTimeout => write!(f, "Request timed out"),
            ErrorCode::StateError => write!(f, "Invalid engine state"),
            ErrorCode::CapabilityError => write!(f, "Capability not negotiated"),
            ErrorCode::ProtocolError => write!(f, "Protocol violation"),
            ErrorCode::TaskError => write!(f, "Task error"),
            ErrorCode::RequestCancelled => write!(f, "Request cancelled"),
        }
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Error::new(code, code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_round_trips_through_i32() {
        let codes = [
            (-32700, ErrorCode::ParseError),
            (-32600, ErrorCode::InvalidRequest),
            (-32601, ErrorCode::MethodNotFound),
            (-32602, ErrorCode::InvalidParams),
            (-32603, ErrorCode::InternalError),
            (-32000, ErrorCode::RequestTimeout),
            (-32001, ErrorCode::StateError),
            (-32002, ErrorCode::CapabilityError),
            (-32003, ErrorCode::ProtocolError),
            (-32004, ErrorCode::TaskError),
            (-32005, ErrorCode::RequestCancelled),
        ];

        for (code, val) in codes {
            let error: ErrorCode = code.try_into().unwrap();
            assert_eq!(error, val);

            let int: i32 = val.into();
            assert_eq!(int, code);
        }
    }

    #[test]
    fn it_rejects_unknown_codes() {
        assert!(ErrorCode::try_from(1).is_err());
    }

    #[test]
    fn it_serializes_as_i32() {
        let json = serde_json::to_string(&ErrorCode::TaskError).unwrap();
        assert_eq!(json, "-32004");

        let code: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, ErrorCode::TaskError);
    }

    #[test]
    fn it_rejects_invalid_json_code() {
        let result: Result<ErrorCode, _> = serde_json::from_str("1");
        assert!(result.is_err());
    }
}
