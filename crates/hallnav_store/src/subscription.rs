//! Live collection snapshots.
//!
//! Every mutation publishes the whole collection. A slow subscriber only ever
//! sees the latest snapshot; intermediate ones are skipped.

use hallnav_protocol::HallRecord;
use std::sync::Arc;
use tokio::sync::watch;

/// An immutable view of the collection, ordered by name then id.
pub type Snapshot = Arc<Vec<HallRecord>>;

/// Producer side, owned by a store backend.
#[derive(Debug)]
pub struct Publisher {
    tx: watch::Sender<Snapshot>,
}

impl Publisher {
    pub fn new(initial: Vec<HallRecord>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(sorted(initial)));
        Self { tx }
    }

    /// Replace the published snapshot. Subscribers are woken even when no one
    /// is currently listening.
    pub fn publish(&self, records: Vec<HallRecord>) {
        self.tx.send_replace(Arc::new(sorted(records)));
    }

    /// Publish only when the collection differs from the last snapshot.
    pub fn publish_if_changed(&self, records: Vec<HallRecord>) -> bool {
        let records = sorted(records);
        let changed = self.tx.borrow().as_slice() != records.as_slice();
        if changed {
            self.tx.send_replace(Arc::new(records));
        }
        changed
    }

    pub fn current(&self) -> Snapshot {
        Arc::clone(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            primed: false,
        }
    }
}

/// A standing query against the collection. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<Snapshot>,
    primed: bool,
}

impl Subscription {
    /// Latest snapshot without waiting.
    pub fn current(&self) -> Snapshot {
        Arc::clone(&self.rx.borrow())
    }

    /// Next snapshot. The first call yields the current collection right
    /// away; later calls wait for a change. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if !self.primed {
            self.primed = true;
            return Some(Arc::clone(&self.rx.borrow_and_update()));
        }
        self.rx.changed().await.ok()?;
        Some(Arc::clone(&self.rx.borrow_and_update()))
    }
}

/// Snapshot order for every backend: name, then id, compared bytewise.
fn sorted(mut records: Vec<HallRecord>) -> Vec<HallRecord> {
    records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use hallnav_protocol::{HallDraft, HallId};

    fn record(id: &str, name: &str) -> HallRecord {
        HallRecord::from_draft(HallId::new(id), HallDraft::new(name, "loc", "desc").unwrap())
    }

    #[tokio::test]
    async fn test_first_next_is_immediate() {
        let publisher = Publisher::new(vec![record("b", "LT3 & 4"), record("a", "LT1 & 2")]);
        let mut sub = publisher.subscribe();

        let snap = sub.next().await.unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].name, "LT1 & 2");
    }

    #[tokio::test]
    async fn test_latest_snapshot_wins() {
        let publisher = Publisher::new(Vec::new());
        let mut sub = publisher.subscribe();
        let _ = sub.next().await;

        publisher.publish(vec![record("a", "One")]);
        publisher.publish(vec![record("a", "One"), record("b", "Two")]);

        let snap = sub.next().await.unwrap();
        assert_eq!(snap.len(), 2);
    }

    #[tokio::test]
    async fn test_next_ends_when_publisher_dropped() {
        let publisher = Publisher::new(Vec::new());
        let mut sub = publisher.subscribe();
        let _ = sub.next().await;
        drop(publisher);
        assert!(sub.next().await.is_none());
    }

    #[test]
    fn test_publish_if_changed() {
        let publisher = Publisher::new(vec![record("a", "One")]);
        assert!(!publisher.publish_if_changed(vec![record("a", "One")]));
        assert!(publisher.publish_if_changed(vec![record("a", "Uno")]));
        assert_eq!(publisher.current()[0].name, "Uno");
    }
}
