use log::warn;
use shared::{key_string, Coin, Document, Player};
use std::collections::HashMap;

/// Everything one client knows about the shared world
///
/// The mirrors are refreshed from the store's change feed and are never
/// authoritative. Fields of our own avatar that we wrote but have not yet
/// seen echoed back are kept in `pending` and laid over every snapshot, so
/// a later whole-record write never reverts them.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    pub player_id: Option<String>,
    pub players: HashMap<String, Player>,
    pub coins: HashMap<String, Coin>,
    pending: Document,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.player_id
            .as_ref()
            .and_then(|id| self.players.get(id))
    }

    pub fn is_local(&self, id: &str) -> bool {
        self.player_id.as_deref() == Some(id)
    }

    pub fn has_coin_at(&self, x: i32, y: i32) -> bool {
        self.coins.contains_key(&key_string(x, y))
    }

    /// Records fields just written for the local player and shows them now
    pub fn predict(&mut self, fields: Document) {
        if self.player_id.is_none() {
            return;
        }
        self.pending.merge(fields);
        self.overlay_pending();
    }

    /// Drops predictions the mirror now confirms and re-applies the rest
    pub fn reconcile(&mut self) {
        let Some(confirmed) = self.local_player().map(Player::to_document) else {
            return;
        };
        self.pending
            .retain(|field, value| confirmed.get(field) != Some(value));
        self.overlay_pending();
    }

    pub fn pending(&self) -> &Document {
        &self.pending
    }

    fn overlay_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let Some(id) = self.player_id.as_ref() else {
            return;
        };
        let Some(local) = self.players.get_mut(id) else {
            return;
        };

        let mut document = local.to_document();
        document.merge(self.pending.clone());
        match Player::from_document(&document) {
            Ok(predicted) => *local = predicted,
            Err(e) => {
                warn!("Discarding local prediction: {}", e);
                self.pending = Document::new();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PlayerColor;

    #[test]
    fn test_local_player_lookup() {
        let mut session = SessionState::new();
        assert!(session.local_player().is_none());

        session.player_id = Some("me".to_string());
        session
            .players
            .insert("me".to_string(), Player::new("me", "SOFT LION", PlayerColor::Blue, 2, 5));

        assert_eq!(session.local_player().map(|p| p.x), Some(2));
        assert!(session.is_local("me"));
        assert!(!session.is_local("you"));
    }

    #[test]
    fn test_coin_presence() {
        let mut session = SessionState::new();
        let coin = Coin::new(4, 8);
        session.coins.insert(coin.key(), coin);

        assert!(session.has_coin_at(4, 8));
        assert!(!session.has_coin_at(8, 4));
    }

    fn joined() -> SessionState {
        let mut session = SessionState::new();
        session.player_id = Some("me".to_string());
        session
            .players
            .insert("me".to_string(), Player::new("me", "SOFT LION", PlayerColor::Blue, 2, 5));
        session
    }

    #[test]
    fn test_prediction_survives_stale_snapshot() {
        let mut session = joined();
        let stale = session.local_player().unwrap().clone();

        session.predict(Document::new().with("coins", 1u32));
        session.predict(Document::new().with("name", "ZED"));
        assert_eq!(session.local_player().map(|p| p.coins), Some(1));

        // a snapshot from before either patch landed
        session.players.insert("me".to_string(), stale.clone());
        session.reconcile();

        let local = session.local_player().unwrap();
        assert_eq!((local.coins, local.name.as_str()), (1, "ZED"));
        assert_eq!(session.pending().len(), 2);
    }

    #[test]
    fn test_confirmed_prediction_is_dropped() {
        let mut session = joined();
        let mut echoed = session.local_player().unwrap().clone();
        echoed.coins = 1;

        session.predict(Document::new().with("coins", 1u32));
        session.predict(Document::new().with("x", 3i32));
        session.players.insert("me".to_string(), echoed.clone());
        session.reconcile();

        // x is still in flight
        assert_eq!(session.pending().len(), 1);
        assert_eq!(session.local_player().map(|p| (p.x, p.coins)), Some((3, 1)));

        echoed.x = 3;
        session.players.insert("me".to_string(), echoed.clone());
        session.reconcile();
        assert!(session.pending().is_empty());

        // a later authoritative change is no longer masked
        echoed.coins = 9;
        session.players.insert("me".to_string(), echoed);
        session.reconcile();
        assert_eq!(session.local_player().map(|p| p.coins), Some(9));
    }

    #[test]
    fn test_prediction_needs_identity() {
        let mut session = SessionState::new();
        session.predict(Document::new().with("coins", 1u32));
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_invalid_prediction_discarded() {
        let mut session = joined();
        session.predict(Document::new().with("color", "plaid"));

        assert!(session.pending().is_empty());
        assert_eq!(session.local_player().map(|p| p.color), Some(PlayerColor::Blue));
    }
}
