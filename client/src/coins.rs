//! Coin spawning and collection
//!
//! Every client runs its own spawner; there is no leader, so the total spawn
//! rate grows with the number of players. Spawning never checks for an
//! existing coin: a spawn onto an occupied cell simply overwrites it.

use crate::session::SessionState;
use crate::store::Store;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{key_string, Coin, Document, GridError, MapData, Path, COINS};
use std::time::{Duration, Instant};

pub const SPAWN_DELAYS: [Duration; 4] = [
    Duration::from_secs(2),
    Duration::from_secs(3),
    Duration::from_secs(4),
    Duration::from_secs(5),
];

/// Who is allowed to credit coin pickups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CoinAuthority {
    /// The collecting client bumps its own counter (trusts clients)
    #[default]
    Client,
    /// Clients only remove coins; an outside arbiter does the crediting
    External,
}

/// Self-rescheduling coin placement driven by explicit timestamps
#[derive(Debug)]
pub struct CoinSpawner {
    delays: Vec<Duration>,
    next_spawn: Option<Instant>,
}

impl CoinSpawner {
    pub fn new(delays: Vec<Duration>) -> Self {
        let delays = if delays.is_empty() {
            warn!("No spawn delays configured, using defaults");
            SPAWN_DELAYS.to_vec()
        } else {
            delays
        };

        Self {
            delays,
            next_spawn: None,
        }
    }

    /// Arms the spawner so the first coin drops at `now`
    pub fn start(&mut self, now: Instant) {
        self.next_spawn = Some(now);
    }

    pub fn cancel(&mut self) {
        self.next_spawn = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_spawn.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_spawn
    }

    /// Places a coin if one is due, then schedules the next one
    pub fn poll<S, R>(
        &mut self,
        now: Instant,
        map: &MapData,
        store: &mut S,
        rng: &mut R,
    ) -> Result<Option<Coin>, GridError>
    where
        S: Store + ?Sized,
        R: Rng + ?Sized,
    {
        match self.next_spawn {
            Some(due) if now >= due => {}
            _ => return Ok(None),
        }

        let delay = self.delays.choose(rng).copied().unwrap_or(SPAWN_DELAYS[0]);
        self.next_spawn = Some(now + delay);

        let (x, y) = map.pick_safe_spot(rng)?;
        let coin = Coin::new(x, y);
        store.write(coin.path(), coin.to_document());
        debug!("Placed coin at {}, next in {:?}", coin.key(), delay);

        Ok(Some(coin))
    }
}

/// Collects the coin under the local avatar, if the mirror shows one.
///
/// The counter increment is read-modify-write on the mirrored value. The new
/// count is predicted locally, so back-to-back pickups build on each other
/// instead of on a stale snapshot.
pub fn try_collect<S: Store + ?Sized>(
    session: &mut SessionState,
    store: &mut S,
    authority: CoinAuthority,
    x: i32,
    y: i32,
) -> bool {
    let key = key_string(x, y);
    // spent locally before the delete is echoed back
    if session.coins.remove(&key).is_none() {
        return false;
    }

    store.delete(Path::new(COINS, key));

    if authority == CoinAuthority::Client {
        let credit = session
            .local_player()
            .map(|player| (player.path(), player.coins.saturating_add(1)));
        if let Some((path, coins)) = credit {
            let fields = Document::new().with("coins", coins);
            store.patch(path, fields.clone());
            session.predict(fields);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordingStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{Player, PlayerColor, StoreOp};

    fn session_with_coin(x: i32, y: i32) -> SessionState {
        let mut session = SessionState::new();
        let mut me = Player::new("me", "DOPE MULE", PlayerColor::Purple, x, y);
        me.coins = 4;
        session.player_id = Some(me.id.clone());
        session.players.insert(me.id.clone(), me);
        let coin = Coin::new(x, y);
        session.coins.insert(coin.key(), coin);
        session
    }

    #[test]
    fn test_spawner_idle_until_started() {
        let mut spawner = CoinSpawner::new(SPAWN_DELAYS.to_vec());
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(3);

        let placed = spawner
            .poll(Instant::now(), &MapData::sample(), &mut store, &mut rng)
            .unwrap();

        assert!(placed.is_none());
        assert!(store.ops.is_empty());
        assert!(!spawner.is_running());
    }

    #[test]
    fn test_spawner_places_then_reschedules() {
        let map = MapData::sample();
        let mut spawner = CoinSpawner::new(SPAWN_DELAYS.to_vec());
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(11);
        let start = Instant::now();

        spawner.start(start);
        let coin = spawner.poll(start, &map, &mut store, &mut rng).unwrap().unwrap();

        assert!(!map.is_blocked(coin.x, coin.y));
        assert_eq!(
            store.take(),
            vec![StoreOp::Write {
                path: coin.path(),
                document: coin.to_document()
            }]
        );

        let next = spawner.next_deadline().unwrap();
        let delay = next - start;
        assert!(SPAWN_DELAYS.contains(&delay), "unexpected delay {:?}", delay);

        // not due yet
        let early = spawner.poll(next - Duration::from_millis(1), &map, &mut store, &mut rng);
        assert_eq!(early, Ok(None));
        assert!(store.ops.is_empty());

        assert!(spawner.poll(next, &map, &mut store, &mut rng).unwrap().is_some());
    }

    #[test]
    fn test_spawner_simulated_minute() {
        let map = MapData::sample();
        let mut spawner = CoinSpawner::new(SPAWN_DELAYS.to_vec());
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();
        spawner.start(start);

        let mut placed = 0;
        for second in 0..=60 {
            if spawner
                .poll(start + Duration::from_secs(second), &map, &mut store, &mut rng)
                .unwrap()
                .is_some()
            {
                placed += 1;
            }
        }

        // one every 2 to 5 seconds
        assert!((12..=31).contains(&placed), "placed {}", placed);
    }

    #[test]
    fn test_spawner_cancel_stops_spawning() {
        let map = MapData::sample();
        let mut spawner = CoinSpawner::new(SPAWN_DELAYS.to_vec());
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();

        spawner.start(start);
        spawner.cancel();

        let later = start + Duration::from_secs(60);
        assert_eq!(spawner.poll(later, &map, &mut store, &mut rng), Ok(None));
        assert!(spawner.next_deadline().is_none());
    }

    #[test]
    fn test_spawner_reports_saturated_map() {
        let map = MapData::new(0, 1, 0, 1, [(0, 0)]).unwrap();
        let mut spawner = CoinSpawner::new(vec![Duration::from_secs(2)]);
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();

        spawner.start(start);
        assert!(spawner.poll(start, &map, &mut store, &mut rng).is_err());
        // still rescheduled, so a full map does not spin the loop
        assert_eq!(spawner.next_deadline(), Some(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_spawn_overwrites_existing_coin_cell() {
        // Known limitation: spawning does not check for an existing coin.
        let map = MapData::new(0, 1, 0, 1, []).unwrap();
        let mut spawner = CoinSpawner::new(vec![Duration::from_secs(2)]);
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(5);
        let start = Instant::now();

        spawner.start(start);
        spawner.poll(start, &map, &mut store, &mut rng).unwrap();
        spawner
            .poll(start + Duration::from_secs(2), &map, &mut store, &mut rng)
            .unwrap();

        let ops = store.take();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], ops[1]);
    }

    #[test]
    fn test_empty_delays_fall_back_to_defaults() {
        let spawner = CoinSpawner::new(Vec::new());
        assert_eq!(spawner.delays, SPAWN_DELAYS.to_vec());
    }

    #[test]
    fn test_collect_present_coin() {
        let mut session = session_with_coin(6, 5);
        let mut store = RecordingStore::new();

        assert!(try_collect(&mut session, &mut store, CoinAuthority::Client, 6, 5));

        let ops = store.take();
        let deletes: Vec<_> = ops
            .iter()
            .filter(|op| matches!(op, StoreOp::Delete { path } if path.to_string() == "coins/6x5"))
            .collect();
        let increments: Vec<_> = ops
            .iter()
            .filter(|op| matches!(op, StoreOp::Patch { path, fields }
                if path.to_string() == "players/me" && fields.int("coins") == Ok(5)))
            .collect();

        assert_eq!(ops.len(), 2);
        assert_eq!(deletes.len(), 1);
        assert_eq!(increments.len(), 1);
        assert_eq!(session.local_player().map(|p| p.coins), Some(5));

        // the delete has not been echoed yet, but the cell is already spent
        assert!(!session.has_coin_at(6, 5));
        assert!(!try_collect(&mut session, &mut store, CoinAuthority::Client, 6, 5));
        assert!(store.ops.is_empty());
    }

    #[test]
    fn test_collect_absent_coin_does_nothing() {
        let mut session = session_with_coin(6, 5);
        let mut store = RecordingStore::new();

        assert!(!try_collect(&mut session, &mut store, CoinAuthority::Client, 7, 5));
        assert!(store.ops.is_empty());
    }

    #[test]
    fn test_collect_with_external_authority_skips_credit() {
        let mut session = session_with_coin(6, 5);
        let mut store = RecordingStore::new();

        assert!(try_collect(&mut session, &mut store, CoinAuthority::External, 6, 5));
        assert_eq!(
            store.take(),
            vec![StoreOp::Delete {
                path: Path::new(COINS, "6x5")
            }]
        );
        assert_eq!(session.local_player().map(|p| p.coins), Some(4));
    }

    #[test]
    fn test_back_to_back_pickups_both_credit() {
        // no snapshot arrives between the two pickups
        let mut session = session_with_coin(6, 5);
        let second = Coin::new(7, 5);
        session.coins.insert(second.key(), second);
        let mut store = RecordingStore::new();

        try_collect(&mut session, &mut store, CoinAuthority::Client, 6, 5);
        try_collect(&mut session, &mut store, CoinAuthority::Client, 7, 5);

        let credited: Vec<i64> = store
            .ops
            .iter()
            .filter_map(|op| match op {
                StoreOp::Patch { fields, .. } => fields.int("coins").ok(),
                _ => None,
            })
            .collect();
        assert_eq!(credited, vec![5, 6]);
    }
}
