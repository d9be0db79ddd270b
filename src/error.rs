//! HTTP-facing errors for the webhook routes.
//!
//! Slack Web API failures never surface here: they happen in background tasks and
//! are reported to the channel instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use crate::slack::signature::DecodeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("request signature verification failed")]
    VerificationFailure,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::VerificationFailure => StatusCode::UNAUTHORIZED,
            Self::Decode(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self, "rejecting slack request");
        // Details stay in the log; Slack only needs the status.
        let body = match &self {
            Self::VerificationFailure => "invalid signature",
            Self::Decode(_) | Self::BadRequest(_) => "bad request",
        };
        (status, body).into_response()
    }
}
