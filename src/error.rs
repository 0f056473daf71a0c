//! Error types and handling for Sonic
//!
//! This module defines the error taxonomy shared by the session, resolver,
//! command and dispatch layers, plus the ambient configuration and I/O
//! failures of the companion process.

use thiserror::Error;

/// Result type alias for Sonic operations
pub type Result<T> = std::result::Result<T, SonicError>;

/// Main error type for Sonic
#[derive(Debug, Error)]
pub enum SonicError {
    /// A refresh was needed but no refresh token is stored
    #[error("No refresh token available, re-authentication required")]
    NoRefreshToken,

    /// The authorization endpoint rejected the refresh token
    #[error("Session expired, refresh token rejected")]
    SessionExpired,

    /// Transport-level failure; nothing was mutated and the user may retry
    #[error("Network error: {message}")]
    Network { message: String },

    /// A resource call answered 401
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// The account has no vehicles
    #[error("No vehicles found on the account")]
    NoVehicles,

    /// A vehicle-scoped action was attempted with no vehicle resolved
    #[error("No vehicle selected")]
    NoVehicle,

    /// A success response carried a body we could not understand
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// The vehicle is asleep (HTTP 408)
    #[error("Vehicle is asleep")]
    VehicleAsleep,

    /// The vehicle received the command and declined it
    #[error("Command rejected: {reason}")]
    Rejected { reason: String },

    /// Any other non-2xx status from the remote API
    #[error("Remote error: HTTP {status}")]
    Remote { status: u16 },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },
}

impl SonicError {
    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        SonicError::Network {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        SonicError::Auth {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        SonicError::Parse {
            message: message.into(),
        }
    }

    /// Create a new rejection carrying the vehicle's reason
    pub fn rejected<S: Into<String>>(reason: S) -> Self {
        SonicError::Rejected {
            reason: reason.into(),
        }
    }

    /// Create a new remote status error
    pub fn remote(status: u16) -> Self {
        SonicError::Remote { status }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SonicError::Config {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        SonicError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        SonicError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Errors after which the local session has been (or must be) discarded
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            SonicError::NoRefreshToken | SonicError::SessionExpired | SonicError::Auth { .. }
        )
    }

    /// Errors that leave every piece of local state untouched
    pub fn is_transient(&self) -> bool {
        matches!(self, SonicError::Network { .. })
    }
}

impl From<std::io::Error> for SonicError {
    fn from(err: std::io::Error) -> Self {
        SonicError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SonicError {
    fn from(err: serde_yaml::Error) -> Self {
        SonicError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SonicError {
    fn from(err: serde_json::Error) -> Self {
        SonicError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for SonicError {
    fn from(err: reqwest::Error) -> Self {
        SonicError::network(err.to_string())
    }
}

impl From<url::ParseError> for SonicError {
    fn from(err: url::ParseError) -> Self {
        SonicError::config(format!("Invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SonicError::remote(503);
        assert_eq!(format!("{}", err), "Remote error: HTTP 503");

        let err = SonicError::rejected("user_present");
        assert_eq!(format!("{}", err), "Command rejected: user_present");

        let err = SonicError::validation("api.timeout_secs", "must be positive");
        assert_eq!(
            format!("{}", err),
            "Validation error: api.timeout_secs - must be positive"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(SonicError::NoRefreshToken.is_auth_failure());
        assert!(SonicError::SessionExpired.is_auth_failure());
        assert!(SonicError::auth("401").is_auth_failure());
        assert!(!SonicError::network("down").is_auth_failure());

        assert!(SonicError::network("down").is_transient());
        assert!(!SonicError::VehicleAsleep.is_transient());
        assert!(!SonicError::remote(500).is_transient());
    }
}
