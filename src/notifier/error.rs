//! Notifier error types

use std::time::Duration;
use thiserror::Error;

/// Errors from an email transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Could not build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Transport configuration error: {0}")]
    Config(String),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Errors from rendering or dispatching one notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_surface_as_is() {
        let err: NotifyError = TransportError::Smtp("421 try later".to_string()).into();
        assert_eq!(err.to_string(), "Transport error: SMTP error: 421 try later");
        assert_eq!(
            NotifyError::Timeout(Duration::from_secs(30)).to_string(),
            "Timeout after 30s"
        );
    }
}
