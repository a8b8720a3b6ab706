//! Client-side game coordination
//!
//! `GameClient` owns the session and every collaborator the gameplay rules
//! need, and exposes one method per thing that can happen to a client: the
//! store authenticating us, a player intent, a store event, a spawn timer.
//! It never touches the network; store calls go through the `Store` seam.

use crate::coins::{try_collect, CoinAuthority, CoinSpawner, SPAWN_DELAYS};
use crate::mirror::{self, CoinEvent, MirrorEvent, PlayerEvent};
use crate::movement::{try_move, Intent};
use crate::presence;
use crate::rendering::RenderUpdate;
use crate::session::SessionState;
use crate::store::Store;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{clamp_name, create_name, Coin, Document, GridError, MapData, Player, PlayerColor, StoreEvent, COINS, PLAYERS};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Display name for the avatar; a random one is generated when absent
    pub name: Option<String>,
    pub coin_authority: CoinAuthority,
    pub spawn_delays: Vec<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: None,
            coin_authority: CoinAuthority::default(),
            spawn_delays: SPAWN_DELAYS.to_vec(),
        }
    }
}

pub struct GameClient<S: Store> {
    session: SessionState,
    map: MapData,
    store: S,
    spawner: CoinSpawner,
    rng: StdRng,
    config: ClientConfig,
}

impl<S: Store> GameClient<S> {
    pub fn new(store: S, map: MapData, config: ClientConfig) -> Self {
        Self::with_rng(store, map, config, StdRng::from_entropy())
    }

    pub fn with_rng(store: S, map: MapData, config: ClientConfig, rng: StdRng) -> Self {
        Self {
            session: SessionState::new(),
            map,
            store,
            spawner: CoinSpawner::new(config.spawn_delays.clone()),
            rng,
            config,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn map(&self) -> &MapData {
        &self.map
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn is_joined(&self) -> bool {
        self.session.local_player().is_some()
    }

    /// Joins the world under the identity the store handed out
    pub fn on_authenticated(&mut self, uid: String, now: Instant) -> Result<Player, GridError> {
        let player = presence::provision(
            &mut self.session,
            &mut self.store,
            &self.map,
            &mut self.rng,
            uid,
            self.config.name.clone(),
        )?;

        self.store.subscribe(PLAYERS);
        self.store.subscribe(COINS);
        self.spawner.start(now);

        Ok(player)
    }

    /// Applies a directional intent; returns the predicted state on success
    pub fn handle_intent(&mut self, intent: Intent) -> Option<Player> {
        let current = self.session.local_player()?;
        let (dx, dy) = intent.delta();

        let next = match try_move(&self.map, current, dx, dy) {
            Ok(next) => next,
            Err(e) => {
                debug!("Move rejected: {}", e);
                return None;
            }
        };

        self.store.write(next.path(), next.to_document());
        self.session.predict(
            Document::new()
                .with("x", next.x)
                .with("y", next.y)
                .with("direction", next.direction.as_str()),
        );

        try_collect(
            &mut self.session,
            &mut self.store,
            self.config.coin_authority,
            next.x,
            next.y,
        );

        Some(next)
    }

    /// Renames the local player; blank input picks a generated name and
    /// long input is cut to `MAX_NAME_CHARS`
    pub fn rename(&mut self, name: &str) -> Option<String> {
        let path = self.session.local_player()?.path();
        let name = clamp_name(name).unwrap_or_else(|| create_name(&mut self.rng));

        let fields = Document::new().with("name", name.as_str());
        self.store.patch(path, fields.clone());
        self.session.predict(fields);
        info!("Renamed to {}", name);
        Some(name)
    }

    pub fn cycle_color(&mut self) -> Option<PlayerColor> {
        let local = self.session.local_player()?;
        let color = local.color.next();
        let path = local.path();

        let fields = Document::new().with("color", color.as_str());
        self.store.patch(path, fields.clone());
        self.session.predict(fields);
        Some(color)
    }

    pub fn handle_player_event(&mut self, event: PlayerEvent) -> Vec<RenderUpdate> {
        mirror::apply_player_event(&mut self.session, event)
    }

    pub fn handle_coin_event(&mut self, event: CoinEvent) -> Vec<RenderUpdate> {
        mirror::apply_coin_event(&mut self.session, event)
    }

    /// Decodes and applies a raw store event in one step
    pub fn handle_store_event(&mut self, event: StoreEvent) -> Vec<RenderUpdate> {
        match mirror::translate(event) {
            Some(MirrorEvent::Player(event)) => self.handle_player_event(event),
            Some(MirrorEvent::Coin(event)) => self.handle_coin_event(event),
            None => Vec::new(),
        }
    }

    pub fn next_spawn_deadline(&self) -> Option<Instant> {
        self.spawner.next_deadline()
    }

    pub fn on_spawn_timer(&mut self, now: Instant) -> Option<Coin> {
        match self
            .spawner
            .poll(now, &self.map, &mut self.store, &mut self.rng)
        {
            Ok(coin) => coin,
            Err(e) => {
                warn!("Skipping coin spawn: {}", e);
                None
            }
        }
    }

    /// Stops all timers; the store connection is ended by the caller
    pub fn shutdown(&mut self) {
        self.spawner.cancel();
        info!("Game stopped");
    }
}
