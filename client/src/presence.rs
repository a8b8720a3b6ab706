use crate::session::SessionState;
use crate::store::Store;
use log::info;
use rand::Rng;
use shared::{clamp_name, create_name, GridError, MapData, Player, PlayerColor};

/// Creates the local avatar once the store has given us an identity.
///
/// The record is tied to the connection: the store deletes it when the
/// connection ends, however it ends. No heartbeat is sent from here.
pub fn provision<S, R>(
    session: &mut SessionState,
    store: &mut S,
    map: &MapData,
    rng: &mut R,
    uid: String,
    name: Option<String>,
) -> Result<Player, GridError>
where
    S: Store + ?Sized,
    R: Rng + ?Sized,
{
    let (x, y) = map.pick_safe_spot(rng)?;
    let name = match name.as_deref().and_then(clamp_name) {
        Some(name) => name,
        None => create_name(rng),
    };

    let player = Player::new(uid.clone(), name, PlayerColor::random(rng), x, y);
    store.write(player.path(), player.to_document());
    store.on_disconnect_delete(player.path());

    info!("Joined as {} ({}) at ({}, {})", player.name, uid, x, y);
    session.player_id = Some(uid);
    session.players.insert(player.id.clone(), player.clone());

    Ok(player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordingStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{Direction, StoreOp, MAX_NAME_CHARS};

    #[test]
    fn test_provision_writes_then_registers_disconnect() {
        let map = MapData::sample();
        let mut session = SessionState::new();
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(21);

        let player = provision(&mut session, &mut store, &map, &mut rng, "uid-7".to_string(), None).unwrap();

        assert!(!map.is_blocked(player.x, player.y));
        assert_eq!(player.coins, 0);
        assert_eq!(player.direction, Direction::Right);
        assert_eq!(player.name.split(' ').count(), 2);

        assert_eq!(
            store.take(),
            vec![
                StoreOp::Write {
                    path: player.path(),
                    document: player.to_document()
                },
                StoreOp::OnDisconnectDelete {
                    path: player.path()
                },
            ]
        );
        assert_eq!(session.local_player(), Some(&player));
    }

    #[test]
    fn test_provision_keeps_given_name() {
        let mut session = SessionState::new();
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(21);

        let player = provision(
            &mut session,
            &mut store,
            &MapData::sample(),
            &mut rng,
            "uid".to_string(),
            Some("ada".to_string()),
        )
        .unwrap();
        assert_eq!(player.name, "ada");
    }

    #[test]
    fn test_provision_blank_name_generates_one() {
        let mut session = SessionState::new();
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(21);

        let player = provision(
            &mut session,
            &mut store,
            &MapData::sample(),
            &mut rng,
            "uid".to_string(),
            Some("   ".to_string()),
        )
        .unwrap();
        assert_ne!(player.name.trim(), "");
    }

    #[test]
    fn test_provision_cuts_long_name() {
        let mut session = SessionState::new();
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(21);

        let player = provision(
            &mut session,
            &mut store,
            &MapData::sample(),
            &mut rng,
            "uid".to_string(),
            Some(format!("  {}", "\u{e9}".repeat(100))),
        )
        .unwrap();
        assert_eq!(player.name, "\u{e9}".repeat(MAX_NAME_CHARS));
    }

    #[test]
    fn test_provision_fails_on_saturated_map() {
        let map = MapData::new(0, 1, 0, 1, [(0, 0)]).unwrap();
        let mut session = SessionState::new();
        let mut store = RecordingStore::new();
        let mut rng = StdRng::seed_from_u64(21);

        let result = provision(&mut session, &mut store, &map, &mut rng, "uid".to_string(), None);

        assert!(result.is_err());
        assert!(store.ops.is_empty());
        assert!(session.player_id.is_none());
    }
}
