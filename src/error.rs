// src/error.rs
//! Typed errors for the PnL pipeline and their HTTP mapping.
//!
//! Every failure crossing the service boundary becomes a `{"error": ...}`
//! body; authentication problems map to 401, everything else to 500 so a
//! caller can tell "re-authenticate" apart from "retry later".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials rejected at the initial handshake. Never retried.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A pipeline operation was invoked without an authenticated session.
    /// Rejected before any remote call is made.
    #[error("not authenticated")]
    Unauthenticated,

    /// The trading API reported a failure: network, rate-limit rejection
    /// or a malformed response. Aborts the whole run, no partial result.
    #[error("upstream API error: {0}")]
    Upstream(String),

    /// A trade record carried a numeric field that does not parse.
    #[error("malformed trade data: {0}")]
    Data(String),
}

impl ApiError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    /// True when retrying the whole operation later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Authentication(_) | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) | Self::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
