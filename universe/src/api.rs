use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum IngestResponseCode {
    /// The notification was normalized and handed to the feed sink.
    Ok = 1,
    /// The notification was deliberately dropped: unclassifiable, suppressed
    /// by a parser, or sourced from a private forum topic. Not an error.
    Ignored = 2,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngestResponse {
    pub status: IngestResponseCode,
}

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("failed to parse request: {0}")]
    RequestParsingError(#[from] serde_json::Error),

    #[error("notification could not be classified")]
    UnclassifiedEvent,
    #[error("unsupported payload shape: {0}")]
    UnsupportedEvent(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("event produced with an empty \"{0}\" field")]
    InvalidEvent(&'static str),

    #[error("post comes from a private forum topic")]
    PrivateSource,
    #[error("forum topic lookup failed: {0}")]
    UpstreamFetchError(String),

    #[error("transient sink error, please retry")]
    RetryableSinkError,
    #[error("invalid event could not be delivered")]
    NonRetryableSinkError,
}

impl IntoResponse for NormalizeError {
    fn into_response(self) -> Response {
        match self {
            NormalizeError::RequestParsingError(_)
            | NormalizeError::UnclassifiedEvent
            | NormalizeError::UnsupportedEvent(_)
            | NormalizeError::MalformedPayload(_)
            | NormalizeError::InvalidEvent(_)
            | NormalizeError::NonRetryableSinkError => (StatusCode::BAD_REQUEST, self.to_string()),

            NormalizeError::PrivateSource => (StatusCode::FORBIDDEN, self.to_string()),

            NormalizeError::UpstreamFetchError(_) => (StatusCode::BAD_GATEWAY, self.to_string()),

            NormalizeError::RetryableSinkError => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
        }
        .into_response()
    }
}
