//! TaskNotify configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scheduler::SchedulerConfig;

/// Main TaskNotify configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tick cadence, condition windows, timeouts
    pub scheduler: SchedulerConfig,

    /// Outbound email settings
    pub email: EmailConfig,

    /// Task store location
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks scheduler settings and, for the SMTP transport, that the
    /// credential environment variables are set. Call this early in startup
    /// so the loop never starts with an unusable configuration.
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;

        match self.email.transport.as_str() {
            "smtp" => {
                for var in [&self.email.username_env, &self.email.password_env] {
                    if std::env::var(var).is_err() {
                        return Err(eyre::eyre!("SMTP credentials not found. Set the {} environment variable.", var));
                    }
                }
            }
            "log" => {}
            other => {
                return Err(eyre::eyre!("Unknown email transport: '{}'. Supported: smtp, log", other));
            }
        }

        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tasknotify.yml
        let local_config = PathBuf::from(".tasknotify.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tasknotify/tasknotify.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tasknotify").join("tasknotify.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Outbound email configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Transport name: "smtp" or "log"
    pub transport: String,

    /// SMTP relay host (STARTTLS)
    #[serde(rename = "smtp-host")]
    pub smtp_host: String,

    /// SMTP submission port
    #[serde(rename = "smtp-port")]
    pub smtp_port: u16,

    /// Environment variable holding the SMTP username
    #[serde(rename = "username-env")]
    pub username_env: String,

    /// Environment variable holding the SMTP password
    #[serde(rename = "password-env")]
    pub password_env: String,

    /// Sender address; defaults to the SMTP username
    pub from: Option<String>,

    /// Directory with `{kind}.subject.hbs` / `{kind}.html.hbs` overrides
    #[serde(rename = "templates-dir")]
    pub templates_dir: Option<PathBuf>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: "smtp".to_string(),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username_env: "EMAIL_USER".to_string(),
            password_env: "EMAIL_PASSWORD".to_string(),
            from: None,
            templates_dir: None,
        }
    }
}

impl EmailConfig {
    /// Templates directory with a leading `~/` expanded
    pub fn expanded_templates_dir(&self) -> Option<PathBuf> {
        self.templates_dir.as_ref().map(|p| expand_home(p))
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding users and tasks
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/tasknotify on Linux)
        let db_path = dirs::data_dir()
            .map(|d| d.join("tasknotify"))
            .unwrap_or_else(|| PathBuf::from(".tasknotify"))
            .join("tasks.db");

        Self { db_path }
    }
}

impl StorageConfig {
    /// Database path with a leading `~/` expanded
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.scheduler.tick_interval_secs, 300);
        assert_eq!(config.email.transport, "smtp");
        assert_eq!(config.email.smtp_host, "smtp.gmail.com");
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.email.username_env, "EMAIL_USER");
        assert!(config.storage.db_path.ends_with("tasks.db"));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
scheduler:
  tick-interval-secs: 60
  reminder-lookahead-secs: 1800
  rearm-after-secs: 86400

email:
  transport: log
  smtp-host: mail.example.com
  smtp-port: 2525
  from: tasks@example.com
  templates-dir: /etc/tasknotify/templates

storage:
  db-path: /var/lib/tasknotify/tasks.db
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.scheduler.tick_interval_secs, 60);
        assert_eq!(config.scheduler.reminder_lookahead_secs, 1800);
        assert_eq!(config.scheduler.stalled_threshold_secs, 86400);
        assert_eq!(config.scheduler.rearm_after_secs, Some(86400));
        assert_eq!(config.email.transport, "log");
        assert_eq!(config.email.smtp_port, 2525);
        assert_eq!(config.email.from.as_deref(), Some("tasks@example.com"));
        assert_eq!(
            config.email.templates_dir,
            Some(PathBuf::from("/etc/tasknotify/templates"))
        );
        assert_eq!(config.storage.db_path, PathBuf::from("/var/lib/tasknotify/tasks.db"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
email:
  transport: log
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.email.transport, "log");
        assert_eq!(config.email.password_env, "EMAIL_PASSWORD");
        assert_eq!(config.scheduler, SchedulerConfig::default());
    }

    #[test]
    fn test_validate_log_transport() {
        let mut config = Config::default();
        config.email.transport = "log".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_transport() {
        let mut config = Config::default();
        config.email.transport = "carrier-pigeon".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_validate_rejects_bad_scheduler_settings() {
        let mut config = Config::default();
        config.email.transport = "log".to_string();
        config.scheduler.send_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("send-timeout-secs"));
    }

    #[test]
    #[serial]
    fn test_validate_smtp_requires_credentials() {
        let mut config = Config::default();
        config.email.username_env = "TASKNOTIFY_TEST_SMTP_USER".to_string();
        config.email.password_env = "TASKNOTIFY_TEST_SMTP_PASSWORD".to_string();

        unsafe {
            std::env::remove_var("TASKNOTIFY_TEST_SMTP_USER");
            std::env::remove_var("TASKNOTIFY_TEST_SMTP_PASSWORD");
        }
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TASKNOTIFY_TEST_SMTP_USER"));

        unsafe {
            std::env::set_var("TASKNOTIFY_TEST_SMTP_USER", "bot@example.com");
            std::env::set_var("TASKNOTIFY_TEST_SMTP_PASSWORD", "secret");
        }
        assert!(config.validate().is_ok());

        unsafe {
            std::env::remove_var("TASKNOTIFY_TEST_SMTP_USER");
            std::env::remove_var("TASKNOTIFY_TEST_SMTP_PASSWORD");
        }
    }

    #[test]
    fn test_load_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasknotify.yml");
        std::fs::write(&path, "scheduler:\n  tick-interval-secs: 42\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.scheduler.tick_interval_secs, 42);
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_expand_home() {
        let storage = StorageConfig {
            db_path: PathBuf::from("/tmp/tasks.db"),
        };
        assert_eq!(storage.expanded_db_path(), PathBuf::from("/tmp/tasks.db"));

        if let Some(home) = dirs::home_dir() {
            let storage = StorageConfig {
                db_path: PathBuf::from("~/data/tasks.db"),
            };
            assert_eq!(storage.expanded_db_path(), home.join("data/tasks.db"));
        }
    }
}
