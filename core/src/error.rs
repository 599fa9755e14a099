//! Error types for the API builder.
//!
//! # Design
//! `ApiError` is what a request site records in its error cell, so it is
//! `Clone` and carries only owned strings. `NotFound` gets a dedicated
//! variant because callers routinely branch on it; every other non-2xx
//! response lands in `HttpError` with the raw status and body.

/// Errors produced while performing a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be decoded into the payload type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request body could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The transport could not complete the exchange at all.
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Errors raised while configuring an `ApiBuilder`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error("no transport configured for the API builder")]
    MissingTransport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_includes_status_and_body() {
        let err = ApiError::HttpError {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
