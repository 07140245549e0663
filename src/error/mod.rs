//! Error Types
//!
//! Error hierarchy for the MercadoLibre client. Each concern has its own enum
//! with a stable `reason()` code; `MeliError` is the root that callers of the
//! facade and the CLI deal with.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result alias for fallible client operations.
pub type MeliResult<T> = Result<T, MeliError>;

/// Root error type.
#[derive(Error, Debug)]
pub enum MeliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl MeliError {
    /// Stable reason code for logs and CLI output.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Auth(e) => e.reason(),
            Self::Api(e) => e.reason(),
            Self::Storage(_) => "storage_error",
            Self::Export(_) => "export_error",
        }
    }

    /// What the caller should do about this failure.
    pub fn action(&self) -> ErrorAction {
        match self {
            Self::Auth(e) => e.action(),
            Self::Api(e) => e.action(),
            _ => ErrorAction::Abort,
        }
    }
}

/// Caller-facing classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Run a grant again (authorization code or client credentials).
    Reauthenticate,
    /// The same call may succeed later.
    Retry,
    /// Retrying will not help.
    Abort,
}

/// Transport-level failure, before any HTTP status was received.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Failed to read response body: {message}")]
    Body { message: String },
}

/// Token authenticator failures.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token exchange failed with status {status}: {body}")]
    ExchangeFailed { status: u16, body: String },

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Not authenticated; run an authorization grant first")]
    Unauthenticated,

    #[error("Token refresh failed: {body}")]
    RefreshFailed { status: Option<u16>, body: String },

    #[error("Authentication is invalid after a failed grant or refresh; authenticate again")]
    Invalidated,

    #[error("Missing client credentials: {field}")]
    MissingCredentials { field: &'static str },

    #[error("No pending PKCE verifier; generate an authorization URL first")]
    PkceNotFound,

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid token response: {message}")]
    InvalidResponse { message: String },
}

impl AuthError {
    /// Stable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ExchangeFailed { .. } => "exchange_failed",
            Self::NoRefreshToken => "no_refresh_token",
            Self::Unauthenticated => "unauthenticated",
            Self::RefreshFailed { .. } => "refresh_failed",
            Self::Invalidated => "invalidated",
            Self::MissingCredentials { .. } => "missing_credentials",
            Self::PkceNotFound => "pkce_not_found",
            Self::Network(_) => "network_error",
            Self::Storage(_) => "storage_error",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }

    /// Check if error requires re-authentication.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::NoRefreshToken
                | Self::Unauthenticated
                | Self::RefreshFailed { .. }
                | Self::Invalidated
                | Self::PkceNotFound
                | Self::ExchangeFailed { .. }
        )
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn action(&self) -> ErrorAction {
        if self.is_retryable() {
            ErrorAction::Retry
        } else if self.needs_reauth() {
            ErrorAction::Reauthenticate
        } else {
            ErrorAction::Abort
        }
    }
}

/// Request executor failures.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Network error: {cause}")]
    Network { cause: NetworkError },

    #[error("Rate limited; gave up after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },
}

impl ApiError {
    /// Stable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http_error",
            Self::AuthFailed { .. } => "auth_failed",
            Self::Network { .. } => "network_error",
            Self::RateLimitExhausted { .. } => "rate_limited",
            Self::Auth(e) => e.reason(),
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Decode { .. } => "decode_error",
        }
    }

    /// HTTP status, when the failure came from an upstream response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::RateLimitExhausted { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Auth(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if error requires re-authentication.
    pub fn needs_reauth(&self) -> bool {
        match self {
            Self::AuthFailed { .. } => true,
            Self::Auth(e) => e.needs_reauth(),
            _ => false,
        }
    }

    pub fn action(&self) -> ErrorAction {
        if self.needs_reauth() {
            ErrorAction::Reauthenticate
        } else if self.is_retryable() {
            ErrorAction::Retry
        } else {
            ErrorAction::Abort
        }
    }
}

impl From<NetworkError> for ApiError {
    fn from(cause: NetworkError) -> Self {
        Self::Network { cause }
    }
}

/// Token and PKCE file failures.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupted file {path}: {message}")]
    Corrupted { path: PathBuf, message: String },
}

/// Configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Export failures.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(
            AuthError::ExchangeFailed {
                status: 400,
                body: "bad".into()
            }
            .reason(),
            "exchange_failed"
        );
        assert_eq!(AuthError::NoRefreshToken.reason(), "no_refresh_token");
        assert_eq!(AuthError::Unauthenticated.reason(), "unauthenticated");
        assert_eq!(
            ApiError::Http {
                status: 404,
                body: String::new()
            }
            .reason(),
            "http_error"
        );
        assert_eq!(
            ApiError::AuthFailed {
                message: "x".into()
            }
            .reason(),
            "auth_failed"
        );
        assert_eq!(
            ApiError::RateLimitExhausted { attempts: 4 }.reason(),
            "rate_limited"
        );
    }

    #[test]
    fn test_action_classification() {
        let network = ApiError::from(NetworkError::Timeout {
            timeout: Duration::from_secs(30),
        });
        assert_eq!(network.action(), ErrorAction::Retry);
        assert_eq!(network.reason(), "network_error");

        let auth = ApiError::AuthFailed {
            message: "refresh failed".into(),
        };
        assert_eq!(auth.action(), ErrorAction::Reauthenticate);

        let not_found = ApiError::Http {
            status: 404,
            body: "{}".into(),
        };
        assert_eq!(not_found.action(), ErrorAction::Abort);

        let server = ApiError::Http {
            status: 503,
            body: String::new(),
        };
        assert_eq!(server.action(), ErrorAction::Retry);
    }

    #[test]
    fn test_root_error_delegates() {
        let err: MeliError = AuthError::Invalidated.into();
        assert_eq!(err.reason(), "invalidated");
        assert_eq!(err.action(), ErrorAction::Reauthenticate);

        let err: MeliError = ConfigError::MissingRequired {
            field: "client_id".into(),
        }
        .into();
        assert_eq!(err.action(), ErrorAction::Abort);
    }
}
