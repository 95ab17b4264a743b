//! Fan-out of newly registered item facts to live listeners.
//!
//! A thin wrapper around a [`broadcast`](tokio::sync::broadcast) channel.
//! Publication is fire-and-forget: a slow listener lags (and eventually
//! drops messages), a disconnected listener is simply gone, and neither can
//! block the merge engine or each other. The bus holds no durable state;
//! replay for late joiners is the websocket layer's job, reading straight
//! from the registry.

use packrat_registry::RegistryRecord;
use tokio::sync::broadcast;
use tracing::trace;

/// How many registry facts a newly connected listener gets replayed before
/// live updates begin.
pub const REPLAY_LIMIT: usize = 16;

// Per-listener buffer of in-flight records. A listener further than this
// behind loses the oldest records, not the connection.
const CAPACITY: usize = 256;

/// Broadcast handle. Cheap to clone; all clones publish into the same
/// channel.
#[derive(Debug, Clone)]
pub struct Bus {
    tx: broadcast::Sender<RegistryRecord>,
}

impl Bus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// Deliver a record to every currently connected listener.
    ///
    /// Having no listeners at all is the normal idle state, not an error.
    pub fn publish(&self, record: RegistryRecord) {
        let delivered = self.tx.send(record).unwrap_or(0);
        trace!(delivered, "published registry fact");
    }

    /// Subscribe to records published from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryRecord> {
        self.tx.subscribe()
    }

    /// Number of currently connected listeners.
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::UtcDateTime;

    fn fact(item: &str, model: i64) -> RegistryRecord {
        RegistryRecord::new(item, model, "hash", UtcDateTime::from_unix_timestamp(1000).unwrap())
    }

    #[tokio::test]
    async fn test_publish_reaches_all_listeners() {
        let bus = Bus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(fact("bow", 1));
        assert_eq!(a.recv().await.unwrap().item_name, "bow");
        assert_eq!(b.recv().await.unwrap().item_name, "bow");
    }

    #[tokio::test]
    async fn test_publish_without_listeners_is_a_noop() {
        let bus = Bus::new();
        bus.publish(fact("bow", 1));
        // A listener subscribing afterwards sees nothing; replay is the
        // registry's job.
        let mut rx = bus.subscribe();
        bus.publish(fact("crossbow", 2));
        assert_eq!(rx.recv().await.unwrap().item_name, "crossbow");
    }

    #[tokio::test]
    async fn test_listener_count() {
        let bus = Bus::new();
        assert_eq!(bus.listeners(), 0);
        let _rx = bus.subscribe();
        assert_eq!(bus.listeners(), 1);
    }
}
