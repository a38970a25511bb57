//! Error types and handling for the GET2WURK service

use thiserror::Error;

/// Main error type for the GET2WURK service
#[derive(Error, Debug)]
pub enum Get2WurkError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A collaborator the request cannot do without failed or timed out
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },

    /// A valid negative answer about the physical world
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Get2WurkError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new upstream-unavailable error for the named collaborator
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Short machine-readable code used in HTTP error bodies
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Get2WurkError::Config { .. } => "config",
            Get2WurkError::Validation { .. } => "invalid_input",
            Get2WurkError::UpstreamUnavailable { .. } => "upstream_unavailable",
            Get2WurkError::NotFound { .. } => "not_found",
            Get2WurkError::Io { .. } => "io",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Get2WurkError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            Get2WurkError::Validation { message } => format!("Invalid input: {message}"),
            Get2WurkError::UpstreamUnavailable { service, .. } => {
                format!("{service} is currently unavailable. Please try again shortly.")
            }
            Get2WurkError::NotFound { message } => message.clone(),
            Get2WurkError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = Get2WurkError::config("missing port");
        assert!(matches!(config_err, Get2WurkError::Config { .. }));

        let upstream_err = Get2WurkError::upstream("Station feed", "timed out");
        assert!(matches!(upstream_err, Get2WurkError::UpstreamUnavailable { .. }));
        assert_eq!(upstream_err.to_string(), "Station feed unavailable: timed out");

        let not_found = Get2WurkError::not_found("no nearby stations");
        assert!(matches!(not_found, Get2WurkError::NotFound { .. }));
    }

    #[test]
    fn test_user_messages() {
        let validation_err = Get2WurkError::validation("latitude 91 out of range");
        assert!(validation_err.user_message().contains("latitude 91"));

        let upstream_err = Get2WurkError::upstream("Station feed", "HTTP 503");
        assert!(upstream_err.user_message().starts_with("Station feed"));
        assert!(!upstream_err.user_message().contains("503"));

        let not_found = Get2WurkError::not_found("Address not found: nowhere");
        assert_eq!(not_found.user_message(), "Address not found: nowhere");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: Get2WurkError = io_err.into();
        assert!(matches!(err, Get2WurkError::Io { .. }));
        assert_eq!(err.code(), "io");
    }
}
