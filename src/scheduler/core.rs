//! Scheduler loop implementation

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::config::SchedulerConfig;
use super::error::SchedulerError;
use super::ledger::NotificationLedger;
use super::report::{KindReport, TickReport};
use crate::domain::{NotificationKind, Task, TaskQuery, TaskStatus, TimeField};
use crate::evaluator::Evaluator;
use crate::notifier::{NotifyError, Notifier};
use crate::repository::{RepositoryError, TaskRepository};

/// The NotificationScheduler drives the evaluator against the repository
/// on a fixed cadence and dispatches each (task, kind) notification once.
pub struct NotificationScheduler {
    config: SchedulerConfig,
    evaluator: Evaluator,
    repo: Arc<dyn TaskRepository>,
    notifier: Arc<Notifier>,
    clock: Arc<dyn Clock>,
    ledger: NotificationLedger,
    last_tick: watch::Sender<Option<TickReport>>,
}

impl NotificationScheduler {
    /// Create a scheduler; fails with `ConfigInvalid` before anything runs
    pub fn new(
        config: SchedulerConfig,
        repo: Arc<dyn TaskRepository>,
        notifier: Arc<Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SchedulerError> {
        debug!(?config, "NotificationScheduler::new: called");
        config.validate()?;

        let (last_tick, _) = watch::channel(None);
        Ok(Self {
            evaluator: Evaluator::from_config(&config),
            config,
            repo,
            notifier,
            clock,
            ledger: NotificationLedger::new(),
            last_tick,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Sent and in-flight notifications tracked by this instance
    pub fn ledger(&self) -> &NotificationLedger {
        &self.ledger
    }

    /// Run one evaluation pass over all three conditions
    ///
    /// `now` is read once and shared by every query and evaluation in the
    /// pass. Conditions run concurrently and fail independently. Sent keys
    /// are only evicted for tasks missing from a successful Active-status
    /// query, so moving a task's times while it stays Active never re-sends.
    pub async fn tick(&self) -> TickReport {
        let now = self.clock.now();
        debug!(%now, "NotificationScheduler::tick: called");

        let active = match self.active_task_ids().await {
            Ok(ids) => Some(ids),
            Err(e) => {
                error!(error = %e, "Active task query failed, skipping eviction");
                None
            }
        };

        let (reminder, overdue, stalled) = tokio::join!(
            self.process_kind(NotificationKind::Reminder, now, active.as_ref()),
            self.process_kind(NotificationKind::Overdue, now, active.as_ref()),
            self.process_kind(NotificationKind::StalledUnfinished, now, active.as_ref()),
        );

        TickReport {
            now,
            active_query_failed: active.is_none(),
            kinds: vec![reminder, overdue, stalled],
        }
    }

    async fn active_task_ids(&self) -> Result<HashSet<String>, RepositoryError> {
        let query = TaskQuery::new(TaskStatus::Active, TimeField::CreatedAt);
        let tasks = self.timed_query(&query).await?;
        Ok(tasks.into_iter().map(|task| task.id).collect())
    }

    async fn process_kind(
        &self,
        kind: NotificationKind,
        now: DateTime<Utc>,
        active: Option<&HashSet<String>>,
    ) -> KindReport {
        debug!(%kind, "NotificationScheduler::process_kind: called");
        let mut report = KindReport::new(kind);

        // Completed and deleted tasks drop out of the Active set
        if let Some(active) = active {
            report.evicted = self.ledger.retain(kind, active);
        }

        let query = self.evaluator.candidate_query(kind, now);
        let candidates = match self.timed_query(&query).await {
            Ok(tasks) => tasks,
            Err(source) => {
                let e = SchedulerError::RepositoryQueryFailed { kind, source };
                error!(error = %e, %kind, "Candidate query failed, retrying next tick");
                report.query_failed = true;
                return report;
            }
        };
        report.candidates = candidates.len();

        let confirmed: Vec<Task> = candidates
            .into_iter()
            .filter(|task| self.evaluator.applies(kind, task, now))
            .collect();
        report.confirmed = confirmed.len();

        let rearm = self.config.rearm_after();
        let claimed: Vec<Task> = confirmed
            .into_iter()
            .filter(|task| self.ledger.claim(&task.id, kind, now, rearm))
            .collect();
        report.skipped = report.confirmed - claimed.len();

        let outcomes: Vec<bool> = stream::iter(claimed)
            .map(|task| self.dispatch(task, kind, now))
            .buffer_unordered(self.config.max_concurrent_sends)
            .collect()
            .await;

        report.sent = outcomes.iter().filter(|ok| **ok).count();
        report.failed = outcomes.len() - report.sent;

        debug!(?report, "NotificationScheduler::process_kind: done");
        report
    }

    async fn timed_query(&self, query: &TaskQuery) -> Result<Vec<Task>, RepositoryError> {
        let timeout = self.config.query_timeout();
        match tokio::time::timeout(timeout, self.repo.find_by_status_and_time_range(query)).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(timeout)),
        }
    }

    /// Send one claimed notification and settle its ledger key
    async fn dispatch(&self, task: Task, kind: NotificationKind, now: DateTime<Utc>) -> bool {
        match self.send(&task, kind).await {
            Ok(()) => {
                self.ledger.confirm(&task.id, kind, now);
                true
            }
            Err(e) => {
                self.ledger.release(&task.id, kind);
                warn!(error = %e, task_id = %task.id, %kind, "Notification not sent, retrying next tick");
                false
            }
        }
    }

    async fn send(&self, task: &Task, kind: NotificationKind) -> Result<(), SchedulerError> {
        let lookup_timeout = self.config.query_timeout();
        let to = match tokio::time::timeout(lookup_timeout, self.repo.resolve_owner_email(task)).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(lookup_timeout)),
        }
        .map_err(|source| SchedulerError::OwnerLookupFailed {
            task_id: task.id.clone(),
            source,
        })?;

        let send_timeout = self.config.send_timeout();
        match tokio::time::timeout(send_timeout, self.notifier.notify(task, kind, &to)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(send_timeout)),
        }
        .map_err(|source| SchedulerError::SendFailed {
            task_id: task.id.clone(),
            kind,
            source,
        })
    }

    /// Watch the report of the most recent tick run by [`run`](Self::run)
    pub fn subscribe(&self) -> watch::Receiver<Option<TickReport>> {
        self.last_tick.subscribe()
    }

    /// Run ticks on the configured interval until shutdown is signalled
    ///
    /// The first tick runs immediately. Missed ticks are skipped rather
    /// than bunched up. A tick in progress finishes before the loop exits.
    pub async fn run(&self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            interval_secs = self.config.tick_interval_secs,
            rearm_after_secs = ?self.config.rearm_after_secs,
            "NotificationScheduler started"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.tick().await;
                    let failed_queries = report.failed_queries();
                    info!(
                        sent = report.total_sent(),
                        failed = report.total_failed(),
                        ?failed_queries,
                        active_query_failed = report.active_query_failed,
                        tracked = self.ledger.len(),
                        "Tick complete"
                    );
                    self.last_tick.send_replace(Some(report));
                }
            }
        }

        info!("NotificationScheduler stopped");
    }

    /// Start the loop on a background task
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        debug!("NotificationScheduler::spawn: called");
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let reports = self.subscribe();
        let join = tokio::spawn(async move { self.run(shutdown_rx).await });
        SchedulerHandle {
            shutdown_tx,
            reports,
            join,
        }
    }
}

/// Stop hook for a spawned scheduler
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    reports: watch::Receiver<Option<TickReport>>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Receiver that changes after every completed tick
    pub fn reports(&self) -> watch::Receiver<Option<TickReport>> {
        self.reports.clone()
    }

    /// Signal shutdown and wait for the loop (and any in-flight tick) to end
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        debug!("SchedulerHandle::shutdown: called");
        // A closed channel means the loop already exited
        let _ = self.shutdown_tx.send(()).await;
        self.join.await
    }
}
