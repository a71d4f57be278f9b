//! EmailTransport trait and the log-only transport

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::error::TransportError;
use super::smtp::SmtpTransport;
use crate::config::EmailConfig;

/// One rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Capability to deliver a single email
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Deliver one message
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError>;

    /// Transport name for logs
    fn name(&self) -> &str;
}

/// Transport that logs messages instead of delivering them
#[derive(Debug, Default, Clone)]
pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        debug!(to = %message.to, "LogTransport::send: called");
        info!(
            to = %message.to,
            subject = %message.subject,
            body_len = message.html_body.len(),
            "Email (not sent, log transport)"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Create an email transport based on the transport named in config
///
/// Supports "smtp" and "log".
pub fn build_transport(config: &EmailConfig) -> Result<Arc<dyn EmailTransport>, TransportError> {
    debug!(transport = %config.transport, "build_transport: called");
    match config.transport.as_str() {
        "smtp" => {
            debug!(host = %config.smtp_host, port = config.smtp_port, "build_transport: creating SMTP transport");
            Ok(Arc::new(SmtpTransport::from_config(config)?))
        }
        "log" => {
            debug!("build_transport: creating log transport");
            Ok(Arc::new(LogTransport::new()))
        }
        other => {
            debug!(transport = %other, "build_transport: unknown transport");
            Err(TransportError::Config(format!(
                "Unknown email transport: '{}'. Supported: smtp, log",
                other
            )))
        }
    }
}
