//! Error types for backend API operations.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the backend REST client.
///
/// `NotFound` and `Conflict` are expected control-flow signals (fallback
/// lookups, "already signed up"), not failures. Everything else is fatal to
/// the current handler step.
#[derive(Debug, Error, Diagnostic)]
pub enum ApiError {
    /// Backend returned 404, or a list filter matched nothing.
    #[error("{resource} not found")]
    #[diagnostic(code(fullrestore_api::not_found))]
    NotFound { resource: &'static str },

    /// Backend returned 409: the resource already exists.
    #[error("{resource} already exists")]
    #[diagnostic(code(fullrestore_api::conflict))]
    Conflict { resource: &'static str },

    /// Any other non-success status.
    #[error("unexpected status {status} from backend: {body}")]
    #[diagnostic(
        code(fullrestore_api::status),
        help("Check the backend logs; the sent payload is logged at debug level")
    )]
    Status { status: u16, body: String },

    /// Transport-level failure (connect, timeout, malformed body).
    #[error("HTTP request failed: {0}")]
    #[diagnostic(code(fullrestore_api::http))]
    Http(#[from] reqwest::Error),

    /// Configured base URL does not parse.
    #[error("invalid API base URL: {url}")]
    #[diagnostic(
        code(fullrestore_api::invalid_base_url),
        help("Set API_BASEURL to an absolute http(s) URL")
    )]
    InvalidBaseUrl { url: String },

    /// Required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    #[diagnostic(code(fullrestore_api::missing_env))]
    MissingEnv { name: &'static str },

    /// Configured credential contains bytes that cannot go in a header.
    #[error("credential for header {header} is not a valid header value")]
    #[diagnostic(code(fullrestore_api::invalid_header))]
    InvalidHeader { header: &'static str },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }
}
