//! SMTP transport over lettre (STARTTLS relay)

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::error::TransportError;
use super::transport::{EmailMessage, EmailTransport};
use crate::config::EmailConfig;

/// Sends mail through an authenticated STARTTLS relay
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    /// Create a transport from config, reading credentials from the environment
    pub fn from_config(config: &EmailConfig) -> Result<Self, TransportError> {
        debug!(host = %config.smtp_host, "SmtpTransport::from_config: called");
        let username = read_env(&config.username_env)?;
        let password = read_env(&config.password_env)?;
        let from = parse_mailbox(config.from.as_deref().unwrap_or(&username))?;

        Self::new(&config.smtp_host, config.smtp_port, Credentials::new(username, password), from)
    }

    pub fn new(host: &str, port: u16, credentials: Credentials, from: Mailbox) -> Result<Self, TransportError> {
        debug!(%host, port, "SmtpTransport::new: called");
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| TransportError::Config(format!("SMTP relay {}: {}", host, e)))?
            .port(port)
            .credentials(credentials)
            .build();

        Ok(Self { mailer, from })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, TransportError> {
        let to = parse_mailbox(&message.to)?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .map_err(|e| TransportError::Build(e.to_string()))
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        debug!(to = %message.to, "SmtpTransport::send: called");
        let email = self.build_message(message)?;

        match self.mailer.send(email).await {
            Ok(response) => {
                debug!(code = %response.code(), "SmtpTransport::send: accepted");
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "SmtpTransport::send: rejected");
                Err(TransportError::Smtp(e.to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

fn read_env(var: &str) -> Result<String, TransportError> {
    std::env::var(var).map_err(|_| TransportError::Config(format!("Environment variable {} is not set", var)))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address.parse::<Mailbox>().map_err(|e| TransportError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}
