//! # Coin Grid Client Library
//!
//! This library provides the synchronization core of the multiplayer coin
//! grid. Every client talks to a shared keyed document store, mirrors the
//! `players` and `coins` collections locally, and applies gameplay rules to
//! its own avatar. There is no game server: the store only relays documents.
//!
//! ## Architecture Overview
//!
//! ### Optimistic Local Control
//! A move is validated against the static map on the client and written as
//! a whole player record. The local mirror is updated immediately, and the
//! next player snapshot from the store overwrites it with the shared view.
//!
//! ### Snapshot Reconciliation
//! Player snapshots replace the whole player mirror. Applying the same
//! snapshot twice yields the same state, so duplicated or reordered
//! snapshots never corrupt the view.
//!
//! ### Connection-Scoped Presence
//! The local player record is registered for deletion when the connection
//! ends. The store runs that delete on an explicit disconnect or when the
//! client stops sending heartbeats.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! `GameClient` coordinates a session: joining, intents, store events and
//! the coin spawn timer.
//!
//! ### Mirror Module (`mirror`)
//! Decodes store events into per-collection events and applies them to the
//! `SessionState`, producing render updates.
//!
//! ### Movement, Coins and Presence (`movement`, `coins`, `presence`)
//! The gameplay rules: step validation, coin spawning and pickup, and
//! avatar provisioning.
//!
//! ### Store Module (`store`)
//! The `Store` trait seam. `RemoteStore` queues operations as packets for
//! the network loop.
//!
//! ### Network Module (`network`)
//! UDP session with the store server and the single-threaded dispatch loop.
//!
//! ### Rendering and Input (`rendering`, `input`)
//! A terminal view behind the `RenderBridge` trait and a line-based command
//! reader.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::ClientConfig;
//! use client::network::Client;
//! use client::rendering::ConsoleRenderer;
//! use shared::MapData;
//! use std::time::Duration;
//!
//! # async fn play() -> Result<(), client::error::ClientError> {
//! let map = MapData::sample();
//! let renderer = ConsoleRenderer::new(map.clone());
//! let mut client = Client::new(
//!     "127.0.0.1:8080",
//!     map,
//!     ClientConfig::default(),
//!     Duration::from_secs(1),
//!     renderer,
//! )
//! .await?;
//!
//! let session = client.run().await?;
//! println!("Saw {} players", session.players.len());
//! # Ok(())
//! # }
//! ```

pub mod coins;
pub mod error;
pub mod game;
pub mod input;
pub mod mirror;
pub mod movement;
pub mod network;
pub mod presence;
pub mod rendering;
pub mod session;
pub mod store;
