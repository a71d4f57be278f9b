//! Email templates
//!
//! Loads subject and HTML body templates per notification kind, preferring
//! override files in the configured templates directory and falling back to
//! the embedded defaults.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use handlebars::{Handlebars, RenderError};
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::{NotificationKind, Task};

/// Timestamp format used in email bodies
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Which half of an email a template produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePart {
    Subject,
    Html,
}

impl TemplatePart {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Html => "html",
        }
    }
}

/// Template name, also the override file stem: `reminder.subject`, `overdue.html`, ...
fn template_name(kind: NotificationKind, part: TemplatePart) -> String {
    format!("{}.{}", kind.name(), part.suffix())
}

fn embedded_template(kind: NotificationKind, part: TemplatePart) -> &'static str {
    match (kind, part) {
        (NotificationKind::Reminder, TemplatePart::Subject) => embedded::REMINDER_SUBJECT,
        (NotificationKind::Reminder, TemplatePart::Html) => embedded::REMINDER_HTML,
        (NotificationKind::Overdue, TemplatePart::Subject) => embedded::OVERDUE_SUBJECT,
        (NotificationKind::Overdue, TemplatePart::Html) => embedded::OVERDUE_HTML,
        (NotificationKind::StalledUnfinished, TemplatePart::Subject) => embedded::STALLED_SUBJECT,
        (NotificationKind::StalledUnfinished, TemplatePart::Html) => embedded::STALLED_HTML,
    }
}

/// Values available to every template
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub kind: String,
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub reminder_time: String,
    pub created_at: String,
    pub priority: String,
    pub category: String,
}

impl TemplateContext {
    pub fn new(task: &Task, kind: NotificationKind) -> Self {
        Self {
            kind: kind.name().to_string(),
            task_id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: format_time(task.deadline),
            reminder_time: format_time(task.reminder_time),
            created_at: format_time(task.created_at),
            priority: task.priority.to_string(),
            category: task.category.clone(),
        }
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// Compiled templates for all notification kinds
pub struct TemplateSet {
    hbs: Handlebars<'static>,
}

impl TemplateSet {
    /// Load templates, checking `{dir}/{kind}.{part}.hbs` before the embedded default
    pub fn load(templates_dir: Option<&Path>) -> Result<Self> {
        debug!(?templates_dir, "TemplateSet::load: called");
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);

        for kind in NotificationKind::ALL {
            for part in [TemplatePart::Subject, TemplatePart::Html] {
                let name = template_name(kind, part);
                let source = match templates_dir.map(|dir| override_path(dir, &name)) {
                    Some(path) if path.exists() => {
                        info!("Loading email template override: {}", path.display());
                        std::fs::read_to_string(&path)
                            .map_err(|e| eyre!("Failed to read template {}: {}", path.display(), e))?
                    }
                    _ => {
                        debug!(%name, "TemplateSet::load: using embedded template");
                        embedded_template(kind, part).to_string()
                    }
                };

                hbs.register_template_string(&name, source)
                    .map_err(|e| eyre!("Failed to compile template {}: {}", name, e))?;
            }
        }

        Ok(Self { hbs })
    }

    /// Templates compiled from the embedded defaults only
    pub fn embedded() -> Result<Self> {
        Self::load(None)
    }

    /// Render one part of the email for a task
    pub fn render(&self, kind: NotificationKind, part: TemplatePart, context: &TemplateContext) -> Result<String, RenderError> {
        self.hbs.render(&template_name(kind, part), context)
    }
}

fn override_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.hbs", name))
}
