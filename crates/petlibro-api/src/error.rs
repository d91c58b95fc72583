use thiserror::Error;

/// Top-level error type for the `petlibro-api` crate.
///
/// Covers every failure mode of the PETLIBRO cloud API: authentication,
/// transport, envelope decoding, and vendor error codes.
/// `petlibro-core` maps these into host-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API rejected the email/password pair (vendor code 1102).
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The session token is no longer accepted (vendor code 1009).
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// Login or re-login failed for a reason other than bad credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// No session token is installed on the client.
    #[error("Not authenticated -- login required")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with something other than HTTP 200.
    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Vendor API ──────────────────────────────────────────────────
    /// Any other non-zero `code` in the `{code, msg, data}` envelope.
    #[error("PETLIBRO API error (code {code}): {message}")]
    Api { code: i64, message: String },
}

impl Error {
    /// Returns `true` if this is a transport-class failure.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::HttpStatus { .. } | Self::Deserialization { .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying on the next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
