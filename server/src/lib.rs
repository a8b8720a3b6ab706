//! # Shared Document Store Server
//!
//! This library provides the real-time keyed document store that every game
//! client replicates through. It holds no game rules: players and coins are
//! opaque documents to it. What it guarantees is ordering per connection,
//! change fan-out, and cleanup when a connection goes away.
//!
//! ## Core Responsibilities
//!
//! ### Document Storage
//! Documents live at two-segment paths (`<collection>/<key>`). Clients can
//! replace a whole document, merge fields into it, or delete it.
//!
//! ### Subscription Fan-Out
//! A client subscribed to a collection receives three kinds of events:
//! - `ChildAdded` when a key first appears
//! - `ChildRemoved` when a key disappears, carrying its last value
//! - `Snapshot` with the complete collection after every change
//!
//! Subscribing replays existing children as `ChildAdded` followed by one
//! `Snapshot`, so late joiners converge without special handling.
//!
//! ### Presence
//! Clients register disconnect directives ("delete this path when I am
//! gone"). The server runs them when a connection ends for any reason:
//! explicit `Disconnect`, a heartbeat timeout, or a fresh sign-in from the
//! same address.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! All store mutations happen on one task, in arrival order. Helper tasks
//! only move bytes (receive, send) or watch clocks (timeouts) and talk to
//! the main loop over channels.
//!
//! ### UDP-Based Communication
//! Packets are `bincode`-encoded `shared::Packet` values, one per datagram.
//!
//! ## Module Organization
//!
//! ### Sessions Module (`sessions`)
//! Anonymous sign-in, uid assignment, liveness tracking, capacity limits.
//!
//! ### Store Module (`store`)
//! The pure document store: mutations in, addressed notifications out.
//!
//! ### Network Module (`network`)
//! Socket tasks, packet dispatch, and routing notifications to addresses.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // Up to 32 clients, dropped after 5 seconds of silence
//!     let mut server = Server::new("127.0.0.1:8080", 32, Duration::from_secs(5)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Security Considerations
//!
//! The store trusts clients with their own documents. Nothing stops a client
//! from writing another player's record or inflating its coin count; any
//! such rules belong in a separate authority, not here.

pub mod network;
pub mod sessions;
pub mod store;
