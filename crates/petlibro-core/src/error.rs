// ── Core error types ──
//
// Host-facing errors from petlibro-core. Hosts never see envelope codes,
// HTTP statuses, or JSON parse failures directly; the
// `From<petlibro_api::Error>` impl folds them into this taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The session expired and could not be renewed (no cached credentials).
    #[error("Session expired -- log in again")]
    SessionExpired,

    // ── Remote ───────────────────────────────────────────────────────
    #[error("Cannot reach the PETLIBRO API: {message}")]
    Transport { message: String, transient: bool },

    #[error("PETLIBRO API error (code {code}): {message}")]
    RemoteApi { code: i64, message: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("Unsupported device product: {product}")]
    UnsupportedDevice { product: String },

    #[error("Device not found: {serial}")]
    DeviceNotFound { serial: String },

    #[error("Operation not supported: {operation} on {kind}")]
    Unsupported { operation: String, kind: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if the next poll may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { transient: true, .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<petlibro_api::Error> for CoreError {
    fn from(err: petlibro_api::Error) -> Self {
        use petlibro_api::Error as Api;

        match err {
            Api::InvalidCredentials => CoreError::AuthenticationFailed {
                message: "Invalid email or password".into(),
            },
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "Not logged in".into(),
            },
            Api::SessionExpired => CoreError::SessionExpired,
            ref e @ (Api::Transport(_) | Api::HttpStatus { .. }) => CoreError::Transport {
                message: e.to_string(),
                transient: e.is_transient(),
            },
            Api::Deserialization { message, body: _ } => CoreError::Transport {
                message: format!("Unreadable response: {message}"),
                transient: false,
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Api { code, message } => CoreError::RemoteApi { code, message },
        }
    }
}
