//! Last-writer-wins replication of the whole state document
//!
//! Every device persists the entire [`AppState`] after each change and
//! receives other devices' documents through a subscription. A remote
//! document replaces the local one only when its `updatedAt` is strictly newer
//! than the last one applied here. Concurrent edits to different events are not
//! merged: the later document wins wholesale.

use crate::config::GearConfig;
use crate::model::AppState;
use chrono::{DateTime, Duration, Utc};
use crossbeam_channel::{Receiver, Sender};

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Create a bounded feed that a subscription pushes remote documents into.
#[must_use]
pub fn feed(capacity: usize) -> (Sender<AppState>, Receiver<AppState>) {
    crossbeam_channel::bounded(capacity)
}

/// Feed sized by the configured `replication_buffer`.
#[must_use]
pub fn feed_from_config(config: &GearConfig) -> (Sender<AppState>, Receiver<AppState>) {
    feed(config.replication_buffer)
}

/// Tracks the newest document applied locally.
#[derive(Debug, Clone, Default)]
pub struct Replicator {
    last_applied: Option<DateTime<Utc>>,
}

impl Replicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_applied(&self) -> Option<DateTime<Utc>> {
        self.last_applied
    }

    /// Remember a local write stamped `at`.
    pub fn record_local(&mut self, at: DateTime<Utc>) {
        if self.last_applied.map_or(true, |last| at > last) {
            self.last_applied = Some(at);
        }
    }

    /// Stamp for the next local write: `now`, or just after the last applied
    /// stamp when the clock has not moved past it.
    #[must_use]
    pub fn next_stamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.last_applied {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        }
    }

    /// Whether `remote` would replace the local document.
    #[must_use]
    pub fn is_newer(&self, remote: &AppState) -> bool {
        match (remote.updated_at, self.last_applied) {
            (Some(remote_at), Some(last)) => remote_at > last,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }

    /// Accept `remote` if it is newer than anything applied so far.
    pub fn accept(&mut self, remote: AppState) -> Option<AppState> {
        let accepted = self.is_newer(&remote);
        #[cfg(feature = "metrics")]
        METRICS.record_remote(accepted);

        if !accepted {
            log::debug!(
                "remote document stamped {:?} is not newer than {:?}; discarded",
                remote.updated_at,
                self.last_applied
            );
            return None;
        }
        if let Some(at) = remote.updated_at {
            self.last_applied = Some(at);
        }
        Some(remote)
    }

    /// Drain every pending document from `feed` without blocking and return
    /// the newest accepted one.
    pub fn drain(&mut self, feed: &Receiver<AppState>) -> Option<AppState> {
        let mut latest = None;
        for remote in feed.try_iter() {
            if let Some(accepted) = self.accept(remote) {
                latest = Some(accepted);
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(secs: i64) -> AppState {
        AppState {
            updated_at: Some(DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(secs)),
            ..AppState::default()
        }
    }

    #[test]
    fn test_feed_capacity_follows_config() {
        let config = GearConfig {
            replication_buffer: 3,
            ..GearConfig::default()
        };
        let (tx, _rx) = feed_from_config(&config);
        assert_eq!(tx.capacity(), Some(3));
        for secs in 0..3 {
            tx.try_send(stamped(secs)).unwrap();
        }
        assert!(tx.try_send(stamped(3)).is_err());
    }

    #[test]
    fn test_equal_stamp_is_not_newer() {
        let mut replicator = Replicator::new();
        assert!(replicator.accept(stamped(10)).is_some());
        assert!(replicator.accept(stamped(10)).is_none());
        assert!(replicator.accept(stamped(9)).is_none());
        assert!(replicator.accept(stamped(11)).is_some());
    }

    #[test]
    fn test_unstamped_remote_only_accepted_when_nothing_applied() {
        let mut replicator = Replicator::new();
        assert!(replicator.accept(AppState::default()).is_some());
        assert!(replicator.last_applied().is_none());
        replicator.record_local(stamped(1).updated_at.unwrap());
        assert!(replicator.accept(AppState::default()).is_none());
    }

    #[test]
    fn test_next_stamp_is_strictly_increasing() {
        let mut replicator = Replicator::new();
        let at = stamped(5).updated_at.unwrap();
        replicator.record_local(at);
        let next = replicator.next_stamp(at);
        assert!(next > at);
        let later = at + Duration::seconds(1);
        assert_eq!(replicator.next_stamp(later), later);
    }

    #[test]
    fn test_drain_keeps_newest_accepted() {
        let (tx, rx) = feed(8);
        let mut replicator = Replicator::new();
        replicator.record_local(stamped(5).updated_at.unwrap());
        for secs in [3, 7, 6, 9, 8] {
            tx.send(stamped(secs)).unwrap();
        }
        let latest = replicator.drain(&rx).unwrap();
        assert_eq!(latest, stamped(9));
        assert_eq!(replicator.last_applied(), stamped(9).updated_at);
        assert!(replicator.drain(&rx).is_none());
    }
}
