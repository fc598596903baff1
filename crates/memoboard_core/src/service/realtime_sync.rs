//! Realtime adapter between a change subscription and a memo store.
//!
//! # Responsibility
//! - Drain pending change events and fold them into the store.
//! - Recover from a lagged subscription by reloading the full list.
//!
//! # Invariants
//! - Events are applied in delivery order under the newer-version-wins rule.
//! - A closed subscription is reported once and never polled again.

use crate::repo::change_feed::{ChangeSubscription, FeedPoll};
use crate::repo::memo_repo::MemoRepository;
use crate::service::memo_store::{MemoStore, StoreResult};
use crate::service::reconcile::MergeOutcome;
use log::{info, warn};

/// Counters for one [`RealtimeSync::pump`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Inserts and updates that changed local state.
    pub applied: usize,
    /// Stale events and deletes for unknown ids.
    pub ignored: usize,
    /// Delete events that removed a local memo.
    pub removed: usize,
    /// The subscription lagged and the store reloaded from the backend.
    pub reloaded: bool,
    /// The subscription closed during this call.
    pub disconnected: bool,
}

impl SyncReport {
    /// Returns whether local state may have changed.
    pub fn changed(&self) -> bool {
        self.applied > 0 || self.removed > 0 || self.reloaded
    }
}

/// Live subscription for one store owner.
pub struct RealtimeSync {
    subscription: Option<ChangeSubscription>,
}

impl RealtimeSync {
    /// Subscribes to the store's backend for the store's owner.
    ///
    /// Subscribe before the initial load so no write between the two is
    /// missed; replayed events are harmless under version precedence.
    pub fn connect<R: MemoRepository>(store: &MemoStore<R>) -> Self {
        let subscription = store.repository().subscribe(store.owner());
        info!(
            "event=realtime_connect module=sync status=ok owner={}",
            store.owner()
        );
        Self {
            subscription: Some(subscription),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_some()
    }

    /// Applies every pending event without blocking.
    ///
    /// # Errors
    /// - Returns the load error when a lag-triggered reload fails.
    pub fn pump<R: MemoRepository>(&mut self, store: &mut MemoStore<R>) -> StoreResult<SyncReport> {
        let mut report = SyncReport::default();
        let Some(subscription) = self.subscription.as_mut() else {
            return Ok(report);
        };

        loop {
            match subscription.try_next() {
                FeedPoll::Event(event) => match store.apply_remote(event) {
                    MergeOutcome::Inserted | MergeOutcome::Replaced => report.applied += 1,
                    MergeOutcome::Removed => report.removed += 1,
                    MergeOutcome::IgnoredStale | MergeOutcome::Absent => report.ignored += 1,
                },
                FeedPoll::Empty => break,
                FeedPoll::Lagged(skipped) => {
                    warn!("event=realtime_lag module=sync status=reload skipped={skipped}");
                    store.load()?;
                    report.reloaded = true;
                }
                FeedPoll::Closed => {
                    warn!("event=realtime_disconnect module=sync status=closed");
                    report.disconnected = true;
                    self.subscription = None;
                    break;
                }
            }
        }

        if report.changed() {
            info!(
                "event=realtime_pump module=sync status=ok applied={} removed={} ignored={} reloaded={}",
                report.applied, report.removed, report.ignored, report.reloaded
            );
        }
        Ok(report)
    }

    /// Drops the subscription.
    pub fn disconnect(&mut self) {
        if self.subscription.take().is_some() {
            info!("event=realtime_disconnect module=sync status=ok");
        }
    }
}
