//! Client-side handle to the shared document store
//!
//! Every call is fire-and-forget: it queues an operation and returns. Results
//! come back only as change events on the subscription feed.

use log::error;
use shared::{Document, Packet, Path, StoreOp};
use tokio::sync::mpsc;

pub trait Store {
    fn submit(&mut self, op: StoreOp);

    /// Whole-document replace
    fn write(&mut self, path: Path, document: Document) {
        self.submit(StoreOp::Write { path, document });
    }

    /// Partial field update
    fn patch(&mut self, path: Path, fields: Document) {
        self.submit(StoreOp::Patch { path, fields });
    }

    fn delete(&mut self, path: Path) {
        self.submit(StoreOp::Delete { path });
    }

    fn subscribe(&mut self, collection: &str) {
        self.submit(StoreOp::Subscribe {
            collection: collection.to_string(),
        });
    }

    /// Asks the store to delete `path` once this connection is gone
    fn on_disconnect_delete(&mut self, path: Path) {
        self.submit(StoreOp::OnDisconnectDelete { path });
    }
}

/// Queues operations as packets for the network loop to send
pub struct RemoteStore {
    outbox: mpsc::UnboundedSender<Packet>,
}

impl RemoteStore {
    pub fn new(outbox: mpsc::UnboundedSender<Packet>) -> Self {
        Self { outbox }
    }
}

impl Store for RemoteStore {
    fn submit(&mut self, op: StoreOp) {
        if let Err(e) = self.outbox.send(Packet::Op { op }) {
            error!("Failed to queue store operation: {}", e);
        }
    }
}

/// Keeps every submitted operation; useful for asserting on side effects
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub ops: Vec<StoreOp>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<StoreOp> {
        std::mem::take(&mut self.ops)
    }
}

impl Store for RecordingStore {
    fn submit(&mut self, op: StoreOp) {
        self.ops.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Coin, COINS};

    #[test]
    fn test_remote_store_queues_op_packets() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = RemoteStore::new(tx);

        store.subscribe(COINS);
        store.delete(Coin::new(2, 9).path());

        match rx.try_recv().unwrap() {
            Packet::Op {
                op: StoreOp::Subscribe { collection },
            } => assert_eq!(collection, "coins"),
            other => panic!("Unexpected packet {:?}", other),
        }
        match rx.try_recv().unwrap() {
            Packet::Op {
                op: StoreOp::Delete { path },
            } => assert_eq!(path.to_string(), "coins/2x9"),
            other => panic!("Unexpected packet {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_remote_store_survives_closed_outbox() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut store = RemoteStore::new(tx);

        // logged, not propagated
        store.subscribe(COINS);
    }

    #[test]
    fn test_recording_store_take_drains() {
        let mut store = RecordingStore::new();
        store.subscribe(COINS);
        assert_eq!(store.take().len(), 1);
        assert!(store.ops.is_empty());
    }
}
