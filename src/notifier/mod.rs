//! Notifier - render and send one notification email
//!
//! Given a task, a notification kind and a recipient address, renders the
//! subject and HTML body from the kind's templates and hands the message to
//! an [`EmailTransport`]. Holds no state between calls.

use std::sync::Arc;

use tracing::{debug, info};

mod embedded;
mod error;
mod smtp;
mod templates;
mod transport;

pub use error::{NotifyError, TransportError};
pub use smtp::SmtpTransport;
pub use templates::{TemplateContext, TemplatePart, TemplateSet};
pub use transport::{EmailMessage, EmailTransport, LogTransport, build_transport};

use crate::domain::{NotificationKind, Task};

/// Renders and dispatches notification emails
pub struct Notifier {
    templates: TemplateSet,
    transport: Arc<dyn EmailTransport>,
}

impl Notifier {
    pub fn new(templates: TemplateSet, transport: Arc<dyn EmailTransport>) -> Self {
        Self { templates, transport }
    }

    /// Build the email for a task without sending it
    pub fn render(&self, task: &Task, kind: NotificationKind, to: &str) -> Result<EmailMessage, NotifyError> {
        debug!(task_id = %task.id, %kind, "Notifier::render: called");
        if task.title.trim().is_empty() {
            return Err(NotifyError::InvalidTask(format!("task {} has an empty title", task.id)));
        }
        if to.trim().is_empty() {
            return Err(NotifyError::InvalidRecipient(format!(
                "no email address for owner of task {}",
                task.id
            )));
        }

        let context = TemplateContext::new(task, kind);
        let subject = self.templates.render(kind, TemplatePart::Subject, &context)?;
        let html_body = self.templates.render(kind, TemplatePart::Html, &context)?;

        Ok(EmailMessage {
            to: to.to_string(),
            subject: subject.trim().to_string(),
            html_body,
        })
    }

    /// Render and send exactly one email
    pub async fn notify(&self, task: &Task, kind: NotificationKind, to: &str) -> Result<(), NotifyError> {
        debug!(task_id = %task.id, %kind, "Notifier::notify: called");
        let message = self.render(task, kind, to)?;
        self.transport.send(&message).await?;
        info!(task_id = %task.id, %kind, transport = self.transport.name(), "Notification sent");
        Ok(())
    }
}
