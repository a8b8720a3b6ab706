use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod document;
pub mod grid;
pub mod model;

pub use document::{Document, DocumentError, Path, PathError, Value};
pub use grid::{GridError, MapData, MAX_SPOT_ATTEMPTS};
pub use model::{
    clamp_name, create_name, key_string, player_path, Coin, Direction, Player, PlayerColor,
    COINS, MAX_NAME_CHARS, PLAYERS,
};

pub const PROTOCOL_VERSION: u32 = 1;

/// Receive buffer size; a full player snapshot must fit in one datagram
pub const MAX_PACKET_SIZE: usize = 16 * 1024;

/// Default connection cap; the players snapshot is sized against it
pub const DEFAULT_MAX_CLIENTS: usize = 32;

/// Mutations and registrations a client asks the store to perform
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Write { path: Path, document: Document },
    Patch { path: Path, fields: Document },
    Delete { path: Path },
    Subscribe { collection: String },
    OnDisconnectDelete { path: Path },
}

/// Change notifications fanned out to subscribers of a collection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Snapshot {
        collection: String,
        entries: BTreeMap<String, Document>,
    },
    ChildAdded {
        collection: String,
        key: String,
        document: Document,
    },
    ChildRemoved {
        collection: String,
        key: String,
        document: Document,
    },
}

impl StoreEvent {
    pub fn collection(&self) -> &str {
        match self {
            StoreEvent::Snapshot { collection, .. }
            | StoreEvent::ChildAdded { collection, .. }
            | StoreEvent::ChildRemoved { collection, .. } => collection,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    SignInAnonymously {
        client_version: u32,
    },
    Op {
        op: StoreOp,
    },
    Heartbeat,
    Disconnect,

    Authenticated {
        uid: String,
    },
    AuthFailed {
        reason: String,
    },
    Event {
        event: StoreEvent,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_serialization_sign_in() {
        let packet = Packet::SignInAnonymously { client_version: 42 };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::SignInAnonymously { client_version } => assert_eq!(client_version, 42),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_write_op() {
        let player = Player::new("uid-1", "HIP BEAR", PlayerColor::Green, 3, 8);
        let packet = Packet::Op {
            op: StoreOp::Write {
                path: player.path(),
                document: player.to_document(),
            },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Op {
                op: StoreOp::Write { path, document },
            } => {
                assert_eq!(path.to_string(), "players/uid-1");
                assert_eq!(Player::from_document(&document).unwrap(), player);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_snapshot() {
        let mut entries = BTreeMap::new();
        entries.insert("3x5".to_string(), Coin::new(3, 5).to_document());
        entries.insert("9x10".to_string(), Coin::new(9, 10).to_document());

        let packet = Packet::Event {
            event: StoreEvent::Snapshot {
                collection: COINS.to_string(),
                entries,
            },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Event {
                event: StoreEvent::Snapshot { collection, entries },
            } => {
                assert_eq!(collection, "coins");
                assert_eq!(entries.len(), 2);
                assert_eq!(
                    Coin::from_document(&entries["9x10"]).unwrap(),
                    Coin::new(9, 10)
                );
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_event_collection() {
        let event = StoreEvent::ChildRemoved {
            collection: PLAYERS.to_string(),
            key: "uid-1".to_string(),
            document: Document::new(),
        };
        assert_eq!(event.collection(), "players");
    }

    #[test]
    fn test_truncated_packet_rejected() {
        let packet = Packet::Authenticated {
            uid: "0b7e8c1e-uid".to_string(),
        };
        let data = bincode::serialize(&packet).unwrap();
        let result: Result<Packet, _> = bincode::deserialize(&data[..data.len() / 2]);
        assert!(result.is_err());
    }
    #[test]
    fn test_worst_case_player_snapshot_fits_one_datagram() {
        // uuid-length ids, names of 4-byte chars at the cap, widest numbers
        let entries: BTreeMap<String, Document> = (0..DEFAULT_MAX_CLIENTS)
            .map(|i| {
                let id = format!("{:0>36}", i);
                let name = "\u{1D538}".repeat(MAX_NAME_CHARS);
                let mut player = Player::new(id.clone(), name, PlayerColor::Purple, i32::MIN, i32::MIN);
                player.coins = u32::MAX;
                (id, player.to_document())
            })
            .collect();

        let packet = Packet::Event {
            event: StoreEvent::Snapshot {
                collection: PLAYERS.to_string(),
                entries,
            },
        };
        let size = bincode::serialized_size(&packet).unwrap() as usize;
        assert!(size <= MAX_PACKET_SIZE, "snapshot is {} bytes", size);
    }
}
