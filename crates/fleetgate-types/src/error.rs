//! Structured error surfaced by the membership-fetch boundary.
//!
//! Resolution itself never fails. The only errors that reach callers come
//! from fetching the membership payload, and they all share one shape:
//! `{ code, title, detail }`.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error code.
///
/// Serialized as the upper snake case wire string (`PERM_DENIED`, ...).
/// Unrecognized wire codes decode to [`ErrorCode::UnknownError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ErrorCode {
    /// The session is authenticated but lacks access to the tenant.
    PermDenied,
    /// The session is missing or expired; callers typically redirect to login.
    Unauthorized,
    /// The tenant or membership does not exist.
    NotFound,
    /// The fetch exceeded its deadline.
    Timeout,
    /// Anything else, including malformed responses.
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::PermDenied => "PERM_DENIED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Maps an HTTP status to the closest code.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::PermDenied,
            404 => ErrorCode::NotFound,
            408 | 504 => ErrorCode::Timeout,
            _ => ErrorCode::UnknownError,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "PERM_DENIED" => ErrorCode::PermDenied,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "NOT_FOUND" => ErrorCode::NotFound,
            "TIMEOUT" => ErrorCode::Timeout,
            _ => ErrorCode::UnknownError,
        })
    }
}

impl From<String> for ErrorCode {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(code) => code,
            Err(never) => match never {},
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

/// Error returned by a membership fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {title}: {detail}")]
pub struct FetchError {
    pub code: ErrorCode,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

impl FetchError {
    pub fn new(code: ErrorCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            detail: detail.into(),
        }
    }

    /// Access to the tenant was refused.
    pub fn permission_denied(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermDenied, "Permission denied", detail)
    }

    /// The session is not (or no longer) authenticated.
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, "Unauthorized", detail)
    }

    /// The fetch did not complete within `timeout_ms`.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::new(
            ErrorCode::Timeout,
            "Membership fetch timed out",
            format!("no response within {timeout_ms} ms"),
        )
    }

    /// Catch-all for transport and decoding failures.
    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownError, "Unknown error", detail)
    }

    /// Returns `true` when callers should send the user back to login.
    pub fn is_unauthorized(&self) -> bool {
        self.code == ErrorCode::Unauthorized
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::UnknownError,
            "Malformed membership payload",
            e.to_string(),
        )
    }
}
