//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::SchedulerError;

/// Upper limit for any calendar window
const MAX_WINDOW_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between evaluation ticks
    #[serde(default = "default_tick_interval_secs", rename = "tick-interval-secs")]
    pub tick_interval_secs: u64,

    /// How far ahead of now a reminder time may be and still trigger a reminder
    #[serde(default = "default_reminder_lookahead_secs", rename = "reminder-lookahead-secs")]
    pub reminder_lookahead_secs: u64,

    /// Age after which an open task counts as stalled
    #[serde(default = "default_stalled_threshold_secs", rename = "stalled-threshold-secs")]
    pub stalled_threshold_secs: u64,

    /// Timeout for one repository call (range query or owner lookup)
    #[serde(default = "default_query_timeout_secs", rename = "query-timeout-secs")]
    pub query_timeout_secs: u64,

    /// Timeout for handing one rendered email to the transport
    #[serde(default = "default_send_timeout_secs", rename = "send-timeout-secs")]
    pub send_timeout_secs: u64,

    /// Max sends in flight per notification kind
    #[serde(default = "default_max_concurrent_sends", rename = "max-concurrent-sends")]
    pub max_concurrent_sends: usize,

    /// Re-send a still-qualifying notification after this many seconds.
    /// Unset means one email per task and kind for the life of the process.
    #[serde(default, rename = "rearm-after-secs")]
    pub rearm_after_secs: Option<u64>,
}

fn default_tick_interval_secs() -> u64 {
    5 * 60
}

fn default_reminder_lookahead_secs() -> u64 {
    60 * 60
}

fn default_stalled_threshold_secs() -> u64 {
    24 * 60 * 60
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_send_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_sends() -> usize {
    8
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            reminder_lookahead_secs: default_reminder_lookahead_secs(),
            stalled_threshold_secs: default_stalled_threshold_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            send_timeout_secs: default_send_timeout_secs(),
            max_concurrent_sends: default_max_concurrent_sends(),
            rearm_after_secs: None,
        }
    }
}

impl SchedulerConfig {
    /// Reject settings the loop cannot run with
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let positive = [
            ("tick-interval-secs", self.tick_interval_secs),
            ("reminder-lookahead-secs", self.reminder_lookahead_secs),
            ("stalled-threshold-secs", self.stalled_threshold_secs),
            ("query-timeout-secs", self.query_timeout_secs),
            ("send-timeout-secs", self.send_timeout_secs),
            ("max-concurrent-sends", self.max_concurrent_sends as u64),
        ];

        for (parameter, value) in positive {
            if value == 0 {
                return Err(SchedulerError::config_invalid(parameter, "must be greater than zero"));
            }
        }

        if self.rearm_after_secs == Some(0) {
            return Err(SchedulerError::config_invalid(
                "rearm-after-secs",
                "must be greater than zero when set",
            ));
        }

        let windows = [
            ("reminder-lookahead-secs", Some(self.reminder_lookahead_secs)),
            ("stalled-threshold-secs", Some(self.stalled_threshold_secs)),
            ("rearm-after-secs", self.rearm_after_secs),
        ];

        for (parameter, value) in windows {
            if value.is_some_and(|secs| secs > MAX_WINDOW_SECS) {
                return Err(SchedulerError::config_invalid(parameter, "must not exceed ten years"));
            }
        }

        Ok(())
    }

    /// Get the tick interval as a Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Get the query timeout as a Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Get the send timeout as a Duration
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Reminder lookahead as a calendar duration
    pub fn reminder_lookahead(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.reminder_lookahead_secs as i64)
    }

    /// Stalled threshold as a calendar duration
    pub fn stalled_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stalled_threshold_secs as i64)
    }

    /// Re-arm period, if re-alerting is enabled
    pub fn rearm_after(&self) -> Option<chrono::Duration> {
        self.rearm_after_secs.map(|secs| chrono::Duration::seconds(secs as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.tick_interval_secs, 300);
        assert_eq!(config.reminder_lookahead_secs, 3600);
        assert_eq!(config.stalled_threshold_secs, 86400);
        assert_eq!(config.rearm_after_secs, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_durations() {
        let config = SchedulerConfig {
            tick_interval_secs: 120,
            rearm_after_secs: Some(7200),
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_secs(120));
        assert_eq!(config.reminder_lookahead(), chrono::Duration::hours(1));
        assert_eq!(config.stalled_threshold(), chrono::Duration::hours(24));
        assert_eq!(config.rearm_after(), Some(chrono::Duration::hours(2)));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = SchedulerConfig {
            tick_interval_secs: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(SchedulerError::ConfigInvalid { parameter, .. }) => assert_eq!(parameter, "tick-interval-secs"),
            other => panic!("Expected ConfigInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_rearm() {
        let config = SchedulerConfig {
            rearm_after_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SchedulerError::ConfigInvalid { parameter, .. }) if parameter == "rearm-after-secs"
        ));
    }

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let config: SchedulerConfig = serde_yaml::from_str("tick-interval-secs: 60\nrearm-after-secs: 3600\n").unwrap();
        assert_eq!(config.tick_interval_secs, 60);
        assert_eq!(config.reminder_lookahead_secs, 3600);
        assert_eq!(config.rearm_after_secs, Some(3600));
    }
}
