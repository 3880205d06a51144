use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed variant declaration at offset {offset}: {reason}")]
    MalformedDeclaration { offset: usize, reason: String },

    #[error("Playlist contains no usable variant streams")]
    EmptyVariantSet,

    #[error("Response body is not valid UTF-8 text")]
    NonTextualBody,

    #[error("Failed to substitute response body: {0}")]
    SubstitutionFailure(String),

    #[error("Failed to fetch URL: {url} - {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Fetch timeout for URL: {0}")]
    FetchTimeout(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header encoding: {0}")]
    InvalidHeaderEncoding(String),

    #[error("Missing or invalid URL signature")]
    InvalidSignature,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl Error {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedDeclaration {
            offset,
            reason: reason.into(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedDeclaration { .. } => "MALFORMED_DECLARATION",
            Self::EmptyVariantSet => "EMPTY_VARIANT_SET",
            Self::NonTextualBody => "NON_TEXTUAL_BODY",
            Self::SubstitutionFailure(_) => "SUBSTITUTION_FAILURE",
            Self::FetchFailed { .. } => "FETCH_FAILED",
            Self::FetchTimeout(_) => "FETCH_TIMEOUT",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InvalidHeaderEncoding(_) => "INVALID_HEADER_ENCODING",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InvalidUrl(_) | Self::InvalidHeaderEncoding(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::MalformedDeclaration { .. }
            | Self::EmptyVariantSet
            | Self::NonTextualBody
            | Self::SubstitutionFailure(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::FetchTimeout(e.url().map(|u| u.to_string()).unwrap_or_default())
        } else {
            Self::FetchFailed {
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                reason: e.to_string(),
            }
        }
    }
}
