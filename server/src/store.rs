//! In-memory keyed document store with subscription fan-out
//!
//! Every mutation returns the notifications it produced, addressed by
//! connection id, so the network layer decides how to deliver them. The
//! store also owns the per-connection disconnect directives: dropping a
//! connection runs its queued deletes exactly like client-issued ones.

use log::{debug, info};
use shared::{Document, Path, StoreEvent, StoreOp};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A change event addressed to a single connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: u32,
    pub event: StoreEvent,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    collections: HashMap<String, BTreeMap<String, Document>>,
    subscribers: HashMap<String, HashSet<u32>>,
    disconnect_directives: HashMap<u32, Vec<Path>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Document> {
        self.collections
            .get(&path.collection)
            .and_then(|entries| entries.get(&path.key))
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }

    pub fn apply(&mut self, conn_id: u32, op: StoreOp) -> Vec<Notification> {
        match op {
            StoreOp::Write { path, document } => self.write(path, document),
            StoreOp::Patch { path, fields } => self.patch(path, fields),
            StoreOp::Delete { path } => self.delete(&path),
            StoreOp::Subscribe { collection } => self.subscribe(conn_id, collection),
            StoreOp::OnDisconnectDelete { path } => {
                debug!("Connection {} registered disconnect delete of {}", conn_id, path);
                self.disconnect_directives.entry(conn_id).or_default().push(path);
                Vec::new()
            }
        }
    }

    /// Drops a connection's subscriptions and runs its disconnect directives
    pub fn disconnect(&mut self, conn_id: u32) -> Vec<Notification> {
        for subscribers in self.subscribers.values_mut() {
            subscribers.remove(&conn_id);
        }

        let directives = self.disconnect_directives.remove(&conn_id).unwrap_or_default();
        let mut notifications = Vec::new();
        for path in directives {
            info!("Connection {} gone, deleting {}", conn_id, path);
            notifications.extend(self.delete(&path));
        }
        notifications
    }

    fn write(&mut self, path: Path, document: Document) -> Vec<Notification> {
        let entries = self.collections.entry(path.collection.clone()).or_default();
        let previous = entries.insert(path.key.clone(), document.clone());

        let mut events = Vec::new();
        match previous {
            None => events.push(StoreEvent::ChildAdded {
                collection: path.collection.clone(),
                key: path.key,
                document,
            }),
            Some(old) if old == document => return Vec::new(),
            Some(_) => {}
        }
        events.push(self.snapshot(&path.collection));
        self.fan_out(&path.collection, events)
    }

    fn patch(&mut self, path: Path, fields: Document) -> Vec<Notification> {
        let merged = match self.get(&path) {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.merge(fields);
                merged
            }
            None => fields,
        };
        self.write(path, merged)
    }

    fn delete(&mut self, path: &Path) -> Vec<Notification> {
        let removed = self
            .collections
            .get_mut(&path.collection)
            .and_then(|entries| entries.remove(&path.key));

        match removed {
            Some(document) => {
                let events = vec![
                    StoreEvent::ChildRemoved {
                        collection: path.collection.clone(),
                        key: path.key.clone(),
                        document,
                    },
                    self.snapshot(&path.collection),
                ];
                self.fan_out(&path.collection, events)
            }
            None => Vec::new(),
        }
    }

    fn subscribe(&mut self, conn_id: u32, collection: String) -> Vec<Notification> {
        self.subscribers
            .entry(collection.clone())
            .or_default()
            .insert(conn_id);

        let mut notifications: Vec<Notification> = self
            .collections
            .get(&collection)
            .into_iter()
            .flat_map(|entries| entries.iter())
            .map(|(key, document)| Notification {
                to: conn_id,
                event: StoreEvent::ChildAdded {
                    collection: collection.clone(),
                    key: key.clone(),
                    document: document.clone(),
                },
            })
            .collect();

        notifications.push(Notification {
            to: conn_id,
            event: self.snapshot(&collection),
        });
        notifications
    }

    fn snapshot(&self, collection: &str) -> StoreEvent {
        StoreEvent::Snapshot {
            collection: collection.to_string(),
            entries: self.collections.get(collection).cloned().unwrap_or_default(),
        }
    }

    fn fan_out(&self, collection: &str, events: Vec<StoreEvent>) -> Vec<Notification> {
        let Some(subscribers) = self.subscribers.get(collection) else {
            return Vec::new();
        };

        let mut ids: Vec<u32> = subscribers.iter().copied().collect();
        ids.sort_unstable();

        let mut notifications = Vec::with_capacity(ids.len() * events.len());
        for to in ids {
            for event in &events {
                notifications.push(Notification {
                    to,
                    event: event.clone(),
                });
            }
        }
        notifications
    }
}
