//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use petlibro_core::CoreError;

use crate::config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("No PETLIBRO credentials configured")]
    #[diagnostic(
        code(petlibro::no_credentials),
        help(
            "Set PETLIBRO_EMAIL and PETLIBRO_PASSWORD, or add email/password to\n\
             {path}"
        )
    )]
    NoCredentials { path: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(petlibro::auth_failed),
        help("Check the email and password of your PETLIBRO app account.")
    )]
    AuthFailed { message: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("Device '{serial}' not found")]
    #[diagnostic(
        code(petlibro::not_found),
        help("Run: petlibro devices to see available serials")
    )]
    DeviceNotFound { serial: String },

    #[error("'{operation}' is not supported by {kind}")]
    #[diagnostic(code(petlibro::unsupported))]
    Unsupported { operation: String, kind: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("Could not reach the PETLIBRO API")]
    #[diagnostic(
        code(petlibro::connection_failed),
        help("{message}\nCheck your network connection and try again.")
    )]
    ConnectionFailed { message: String },

    #[error("PETLIBRO API error ({code}): {message}")]
    #[diagnostic(code(petlibro::api_error))]
    ApiError { code: i64, message: String },

    // ── Input & configuration ────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(petlibro::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(petlibro::config))]
    Config(#[from] ConfigError),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(petlibro::output))]
    Output(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(petlibro::io))]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    #[diagnostic(code(petlibro::internal))]
    Internal { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCredentials { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ApiError { .. }
            | Self::Config(_)
            | Self::Output(_)
            | Self::Io(_)
            | Self::Internal { .. } => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::SessionExpired => CliError::AuthFailed {
                message: "session expired".into(),
            },
            CoreError::Transport { message, .. } => CliError::ConnectionFailed { message },
            CoreError::RemoteApi { code, message } => CliError::ApiError { code, message },
            CoreError::DeviceNotFound { serial } => CliError::DeviceNotFound { serial },
            CoreError::UnsupportedDevice { product } => CliError::Unsupported {
                operation: "device control".into(),
                kind: product,
            },
            CoreError::Unsupported { operation, kind } => CliError::Unsupported { operation, kind },
            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_exit_with_auth_code() {
        let err = CliError::from(CoreError::AuthenticationFailed {
            message: "bad".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn transport_errors_exit_with_connection_code() {
        let err = CliError::from(CoreError::Transport {
            message: "timeout".into(),
            transient: true,
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn unsupported_commands_keep_their_operation() {
        let err = CliError::from(CoreError::Unsupported {
            operation: "manual feed".into(),
            kind: "Dockstream Smart Fountain".into(),
        });
        assert_eq!(err.exit_code(), exit_code::UNSUPPORTED);
        assert_eq!(
            err.to_string(),
            "'manual feed' is not supported by Dockstream Smart Fountain"
        );
    }
}
