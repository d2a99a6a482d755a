//! Engine error type

use std::convert::Infallible;
use std::fmt;
use std::error::Error as StdError;

pub use error_code::ErrorCode;

pub mod error_code;

type BoxError = Box<
    dyn StdError
    + Send
    + Sync
>;

/// An engine-level error: a stable [`ErrorCode`] plus the underlying cause.
#[derive(Debug)]
pub struct Error {
    pub code: ErrorCode,
    inner: BoxError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Self {
            inner: err.into(),
            code: ErrorCode::ParseError,
        }
    }
}

impl From<Infallible> for Error {
    fn from(infallible: Infallible) -> Error {
        match infallible {}
    }
}

impl Error {
    /// Creates a new [`Error`] from anything that converts to an [`ErrorCode`]
    /// (an `ErrorCode` itself, or a raw `i32` which falls back to
    /// [`ErrorCode::InternalError`] if it isn't a known code).
    #[inline]
    pub fn new(code: impl TryInto<ErrorCode>, err: impl Into<BoxError>) -> Error {
        Self {
            inner: err.into(),
            code: code
                .try_into()
                .unwrap_or_default(),
        }
    }
}
