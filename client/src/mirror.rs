//! Reconciliation of the local mirrors with the store's change feed
//!
//! Raw store events are decoded into per-collection events first, which the
//! network loop queues on separate channels. Applying an event mutates the
//! `SessionState` and yields the render updates it implies.
//!
//! Player snapshots replace the whole player mirror; they are idempotent and
//! are the single source of truth for what gets drawn, apart from our own
//! unconfirmed writes which are laid back on top. Coins are tracked
//! purely through added/removed events, and coin snapshots are ignored.

use crate::rendering::RenderUpdate;
use crate::session::SessionState;
use log::{debug, warn};
use shared::{Coin, Player, StoreEvent, COINS, PLAYERS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Snapshot(Vec<Player>),
    Added(Player),
    Removed { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinEvent {
    Added(Coin),
    Removed(Coin),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    Player(PlayerEvent),
    Coin(CoinEvent),
}

/// Decodes a store event; malformed documents are logged and skipped
pub fn translate(event: StoreEvent) -> Option<MirrorEvent> {
    match event {
        StoreEvent::Snapshot {
            collection,
            entries,
        } if collection == PLAYERS => {
            let players = entries
                .iter()
                .filter_map(|(key, document)| match Player::from_document(document) {
                    Ok(player) => Some(player),
                    Err(e) => {
                        warn!("Skipping malformed player {}: {}", key, e);
                        None
                    }
                })
                .collect();
            Some(MirrorEvent::Player(PlayerEvent::Snapshot(players)))
        }
        StoreEvent::ChildAdded {
            collection,
            key,
            document,
        } if collection == PLAYERS => match Player::from_document(&document) {
            Ok(player) => Some(MirrorEvent::Player(PlayerEvent::Added(player))),
            Err(e) => {
                warn!("Skipping malformed player {}: {}", key, e);
                None
            }
        },
        StoreEvent::ChildRemoved { collection, key, .. } if collection == PLAYERS => {
            Some(MirrorEvent::Player(PlayerEvent::Removed { id: key }))
        }
        StoreEvent::ChildAdded {
            collection,
            key,
            document,
        } if collection == COINS => decode_coin(&key, &document).map(|c| MirrorEvent::Coin(CoinEvent::Added(c))),
        StoreEvent::ChildRemoved {
            collection,
            key,
            document,
        } if collection == COINS => decode_coin(&key, &document).map(|c| MirrorEvent::Coin(CoinEvent::Removed(c))),
        StoreEvent::Snapshot { collection, .. } if collection == COINS => {
            debug!("Ignoring coin snapshot");
            None
        }
        other => {
            warn!("Event for unknown collection {}", other.collection());
            None
        }
    }
}

fn decode_coin(key: &str, document: &shared::Document) -> Option<Coin> {
    match Coin::from_document(document) {
        Ok(coin) => Some(coin),
        Err(e) => {
            warn!("Skipping malformed coin {}: {}", key, e);
            None
        }
    }
}

pub fn apply_player_event(session: &mut SessionState, event: PlayerEvent) -> Vec<RenderUpdate> {
    match event {
        PlayerEvent::Snapshot(players) => {
            session.players = players
                .into_iter()
                .map(|player| (player.id.clone(), player))
                .collect();
            session.reconcile();

            let mut ids: Vec<&String> = session.players.keys().collect();
            ids.sort();
            ids.into_iter()
                .map(|id| RenderUpdate::PlayerState(session.players[id].clone()))
                .collect()
        }
        PlayerEvent::Added(player) => {
            let is_local = session.is_local(&player.id);
            vec![RenderUpdate::PlayerJoined { player, is_local }]
        }
        PlayerEvent::Removed { id } => {
            session.players.remove(&id);
            vec![RenderUpdate::PlayerLeft { id }]
        }
    }
}

pub fn apply_coin_event(session: &mut SessionState, event: CoinEvent) -> Vec<RenderUpdate> {
    match event {
        CoinEvent::Added(coin) => {
            session.coins.insert(coin.key(), coin);
            vec![RenderUpdate::CoinAdded {
                x: coin.x,
                y: coin.y,
            }]
        }
        CoinEvent::Removed(coin) => {
            session.coins.remove(&coin.key());
            vec![RenderUpdate::CoinRemoved {
                x: coin.x,
                y: coin.y,
            }]
        }
    }
}
