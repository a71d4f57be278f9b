//! Per-tick outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::NotificationKind;

/// Outcome of one condition within a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindReport {
    pub kind: NotificationKind,
    /// Tasks returned by the repository pre-filter
    pub candidates: usize,
    /// Candidates the evaluator confirmed at the tick's `now`
    pub confirmed: usize,
    pub sent: usize,
    /// Confirmed but already sent or in flight
    pub skipped: usize,
    pub failed: usize,
    /// Sent keys dropped because their task left Active status
    pub evicted: usize,
    pub query_failed: bool,
}

impl KindReport {
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            candidates: 0,
            confirmed: 0,
            sent: 0,
            skipped: 0,
            failed: 0,
            evicted: 0,
            query_failed: false,
        }
    }
}

/// Outcome of one full evaluation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub now: DateTime<Utc>,
    /// The Active-status query failed, so nothing was evicted this tick
    pub active_query_failed: bool,
    pub kinds: Vec<KindReport>,
}

impl TickReport {
    /// Report for one kind
    pub fn kind(&self, kind: NotificationKind) -> Option<&KindReport> {
        self.kinds.iter().find(|r| r.kind == kind)
    }

    pub fn total_sent(&self) -> usize {
        self.kinds.iter().map(|r| r.sent).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.kinds.iter().map(|r| r.failed).sum()
    }

    /// Conditions whose repository query failed this tick
    pub fn failed_queries(&self) -> Vec<NotificationKind> {
        self.kinds.iter().filter(|r| r.query_failed).map(|r| r.kind).collect()
    }
}

impl std::fmt::Display for TickReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tick at {}", self.now.format("%Y-%m-%d %H:%M:%S UTC"))?;
        if self.active_query_failed {
            writeln!(f, "  active task query failed, eviction skipped")?;
        }
        for r in &self.kinds {
            if r.query_failed {
                writeln!(f, "  {:<9} query failed", r.kind.name())?;
            } else {
                writeln!(
                    f,
                    "  {:<9} candidates={} confirmed={} sent={} skipped={} failed={} evicted={}",
                    r.kind.name(),
                    r.candidates,
                    r.confirmed,
                    r.sent,
                    r.skipped,
                    r.failed,
                    r.evicted
                )?;
            }
        }
        Ok(())
    }
}
