//! Notification ledger - which (task, kind) pairs have fired
//!
//! Every read-check-then-write happens under one lock, so two overlapping
//! ticks can never both win the claim for the same key. A key moves
//! `InFlight -> Sent` on a successful send and is dropped again on failure,
//! leaving the task eligible for the next tick.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::NotificationKind;

type LedgerKey = (String, NotificationKind);

/// State of one tracked key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEntry {
    /// A send is underway; `last_sent` is kept so a failed re-alert keeps its history
    InFlight {
        claimed_at: DateTime<Utc>,
        last_sent: Option<DateTime<Utc>>,
    },
    Sent {
        sent_at: DateTime<Utc>,
    },
}

/// A successful send, as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRecord {
    pub task_id: String,
    pub kind: NotificationKind,
    pub sent_at: DateTime<Utc>,
}

/// Process-lifetime dedup table owned by one scheduler
#[derive(Debug, Default)]
pub struct NotificationLedger {
    entries: Mutex<HashMap<LedgerKey, LedgerEntry>>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically reserve a key for sending
    ///
    /// Returns false if a send is already in flight, or if the key was sent
    /// and either re-alerting is off or `rearm` has not yet elapsed.
    pub fn claim(&self, task_id: &str, kind: NotificationKind, now: DateTime<Utc>, rearm: Option<Duration>) -> bool {
        let mut entries = self.lock();
        let key = (task_id.to_string(), kind);

        let last_sent = match entries.get(&key) {
            None => None,
            Some(LedgerEntry::InFlight { .. }) => {
                debug!(%task_id, %kind, "NotificationLedger::claim: already in flight");
                return false;
            }
            Some(LedgerEntry::Sent { sent_at }) => match rearm {
                Some(period) if now - *sent_at >= period => Some(*sent_at),
                _ => {
                    debug!(%task_id, %kind, "NotificationLedger::claim: already sent");
                    return false;
                }
            },
        };

        entries.insert(
            key,
            LedgerEntry::InFlight {
                claimed_at: now,
                last_sent,
            },
        );
        true
    }

    /// Record a successful send
    pub fn confirm(&self, task_id: &str, kind: NotificationKind, sent_at: DateTime<Utc>) {
        debug!(%task_id, %kind, "NotificationLedger::confirm: called");
        self.lock()
            .insert((task_id.to_string(), kind), LedgerEntry::Sent { sent_at });
    }

    /// Give up a claim after a failed send
    pub fn release(&self, task_id: &str, kind: NotificationKind) {
        debug!(%task_id, %kind, "NotificationLedger::release: called");
        let mut entries = self.lock();
        let key = (task_id.to_string(), kind);

        if let Some(LedgerEntry::InFlight { last_sent, .. }) = entries.get(&key).copied() {
            match last_sent {
                Some(sent_at) => {
                    entries.insert(key, LedgerEntry::Sent { sent_at });
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
    }

    /// Drop sent keys of `kind` whose task is not in `live`
    ///
    /// In-flight keys are left to their owner to confirm or release.
    /// Returns the number of evicted keys.
    pub fn retain(&self, kind: NotificationKind, live: &HashSet<String>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(task_id, k), entry| {
            *k != kind || matches!(entry, LedgerEntry::InFlight { .. }) || live.contains(task_id)
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(%kind, evicted, "NotificationLedger::retain: evicted");
        }
        evicted
    }

    /// Last successful send for a key, if any
    pub fn record(&self, task_id: &str, kind: NotificationKind) -> Option<NotificationRecord> {
        match self.lock().get(&(task_id.to_string(), kind)) {
            Some(LedgerEntry::Sent { sent_at })
            | Some(LedgerEntry::InFlight {
                last_sent: Some(sent_at),
                ..
            }) => Some(NotificationRecord {
                task_id: task_id.to_string(),
                kind,
                sent_at: *sent_at,
            }),
            _ => None,
        }
    }

    /// All successful sends, ordered by task ID then kind
    pub fn records(&self) -> Vec<NotificationRecord> {
        let mut records: Vec<_> = self
            .lock()
            .iter()
            .filter_map(|((task_id, kind), entry)| match entry {
                LedgerEntry::Sent { sent_at } => Some(NotificationRecord {
                    task_id: task_id.clone(),
                    kind: *kind,
                    sent_at: *sent_at,
                }),
                LedgerEntry::InFlight { .. } => None,
            })
            .collect();
        records.sort_by(|a, b| (&a.task_id, a.kind).cmp(&(&b.task_id, b.kind)));
        records
    }

    /// Number of tracked keys, in flight or sent
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<LedgerKey, LedgerEntry>> {
        // Entries are plain values; a panicked holder cannot leave one half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_claim_is_exclusive() {
        let ledger = NotificationLedger::new();
        assert!(ledger.claim("t1", NotificationKind::Overdue, now(), None));
        assert!(!ledger.claim("t1", NotificationKind::Overdue, now(), None));

        // Other kinds and tasks are independent keys
        assert!(ledger.claim("t1", NotificationKind::StalledUnfinished, now(), None));
        assert!(ledger.claim("t2", NotificationKind::Overdue, now(), None));
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_confirm_then_no_resend() {
        let ledger = NotificationLedger::new();
        assert!(ledger.claim("t1", NotificationKind::Reminder, now(), None));
        ledger.confirm("t1", NotificationKind::Reminder, now());

        assert!(!ledger.claim("t1", NotificationKind::Reminder, now() + Duration::days(30), None));
        assert_eq!(
            ledger.record("t1", NotificationKind::Reminder),
            Some(NotificationRecord {
                task_id: "t1".to_string(),
                kind: NotificationKind::Reminder,
                sent_at: now(),
            })
        );
    }

    #[test]
    fn test_release_makes_key_claimable() {
        let ledger = NotificationLedger::new();
        assert!(ledger.claim("t1", NotificationKind::Overdue, now(), None));
        ledger.release("t1", NotificationKind::Overdue);

        assert!(ledger.is_empty());
        assert!(ledger.record("t1", NotificationKind::Overdue).is_none());
        assert!(ledger.claim("t1", NotificationKind::Overdue, now(), None));
    }

    #[test]
    fn test_rearm_after_period() {
        let ledger = NotificationLedger::new();
        let rearm = Some(Duration::hours(6));
        assert!(ledger.claim("t1", NotificationKind::Overdue, now(), rearm));
        ledger.confirm("t1", NotificationKind::Overdue, now());

        assert!(!ledger.claim("t1", NotificationKind::Overdue, now() + Duration::hours(5), rearm));
        assert!(ledger.claim("t1", NotificationKind::Overdue, now() + Duration::hours(6), rearm));
    }

    #[test]
    fn test_failed_rearm_keeps_previous_send() {
        let ledger = NotificationLedger::new();
        let rearm = Some(Duration::hours(1));
        ledger.confirm("t1", NotificationKind::Overdue, now());

        assert!(ledger.claim("t1", NotificationKind::Overdue, now() + Duration::hours(2), rearm));
        ledger.release("t1", NotificationKind::Overdue);

        let record = ledger.record("t1", NotificationKind::Overdue).unwrap();
        assert_eq!(record.sent_at, now());
    }

    #[test]
    fn test_retain_evicts_sent_keys_of_one_kind() {
        let ledger = NotificationLedger::new();
        ledger.confirm("done", NotificationKind::Overdue, now());
        ledger.confirm("open", NotificationKind::Overdue, now());
        ledger.confirm("done", NotificationKind::StalledUnfinished, now());
        assert!(ledger.claim("busy", NotificationKind::Overdue, now(), None));

        let live: HashSet<String> = ["open".to_string()].into_iter().collect();
        assert_eq!(ledger.retain(NotificationKind::Overdue, &live), 1);

        assert!(ledger.record("done", NotificationKind::Overdue).is_none());
        assert!(ledger.record("open", NotificationKind::Overdue).is_some());
        assert!(ledger.record("done", NotificationKind::StalledUnfinished).is_some());
        // In-flight keys survive eviction
        assert!(!ledger.claim("busy", NotificationKind::Overdue, now(), None));
    }

    #[test]
    fn test_records_sorted() {
        let ledger = NotificationLedger::new();
        ledger.confirm("b", NotificationKind::Reminder, now());
        ledger.confirm("a", NotificationKind::StalledUnfinished, now());
        ledger.confirm("a", NotificationKind::Overdue, now());
        assert!(ledger.claim("c", NotificationKind::Overdue, now(), None));

        let keys: Vec<_> = ledger.records().into_iter().map(|r| (r.task_id, r.kind)).collect();
        assert_eq!(
            keys,
            vec![
                ("a".to_string(), NotificationKind::Overdue),
                ("a".to_string(), NotificationKind::StalledUnfinished),
                ("b".to_string(), NotificationKind::Reminder),
            ]
        );
    }
}
