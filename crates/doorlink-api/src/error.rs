use thiserror::Error;

/// Top-level error type for the `doorlink-api` crate.
///
/// Covers every failure mode of a gateway exchange: transport, HTTP
/// status, body parsing, and field/value contract validation.
/// `doorlink-core` maps these into reconciliation-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction failed (bad host or path in the endpoint config).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The `reqwest::Client` could not be built from the endpoint config.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Response contract ───────────────────────────────────────────
    /// The device answered outside the 2xx range.
    #[error("The status code of the HTTP response was unexpected: {code}")]
    Status { code: u16 },

    /// The response body was not valid JSON. The raw body is preserved
    /// for logging.
    #[error("The JSON body of the HTTP response could not be parsed: {message}")]
    Parse { message: String, body: String },

    /// The parsed JSON body lacks the expected field.
    #[error("The JSON body of the HTTP response does not contain the field: {field}")]
    FieldMissing { field: String, body: String },

    /// The expected field is present but holds the wrong value.
    #[error("The JSON field value of the HTTP response was unexpected: \
             {field} = {actual} (expected {expected})")]
    FieldValueMismatch {
        field: String,
        expected: String,
        actual: String,
    },
}

impl Error {
    /// Returns `true` if this is a transient transport failure that the
    /// next poll cycle may recover from.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The raw response body, when this error preserved one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Parse { body, .. } | Self::FieldMissing { body, .. } => Some(body),
            _ => None,
        }
    }
}
