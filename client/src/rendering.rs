use shared::{Direction, MapData, Player};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// What the sync core tells the view layer; nothing else crosses this seam
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderUpdate {
    PlayerJoined { player: Player, is_local: bool },
    PlayerState(Player),
    PlayerLeft { id: String },
    CoinAdded { x: i32, y: i32 },
    CoinRemoved { x: i32, y: i32 },
}

pub trait RenderBridge {
    fn apply(&mut self, update: &RenderUpdate);

    /// Called once after a batch of updates
    fn present(&mut self) {}
}

/// Terminal view: an ASCII map plus a scoreboard
pub struct ConsoleRenderer {
    map: MapData,
    local_id: Option<String>,
    players: BTreeMap<String, Player>,
    coins: BTreeSet<(i32, i32)>,
}

impl ConsoleRenderer {
    pub fn new(map: MapData) -> Self {
        Self {
            map,
            local_id: None,
            players: BTreeMap::new(),
            coins: BTreeSet::new(),
        }
    }

    pub fn frame(&self) -> String {
        let mut out = String::new();

        for y in self.map.min_y - 1..=self.map.max_y {
            for x in self.map.min_x - 1..=self.map.max_x {
                out.push(self.glyph(x, y));
            }
            out.push('\n');
        }

        for player in self.players.values() {
            let marker = if self.local_id.as_deref() == Some(player.id.as_str()) {
                " (you)"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "{}{} [{}] {} coins",
                player.name, marker, player.color, player.coins
            );
        }
        out
    }

    fn glyph(&self, x: i32, y: i32) -> char {
        if let Some(player) = self.players.values().find(|p| p.x == x && p.y == y) {
            let local = self.local_id.as_deref() == Some(player.id.as_str());
            return match (local, player.direction) {
                (true, Direction::Left) => '{',
                (true, Direction::Right) => '}',
                (false, Direction::Left) => '<',
                (false, Direction::Right) => '>',
            };
        }
        if self.coins.contains(&(x, y)) {
            return 'o';
        }
        if self.map.is_blocked(x, y) {
            '#'
        } else {
            '.'
        }
    }
}

impl RenderBridge for ConsoleRenderer {
    fn apply(&mut self, update: &RenderUpdate) {
        match update {
            RenderUpdate::PlayerJoined { player, is_local } => {
                if *is_local {
                    self.local_id = Some(player.id.clone());
                }
                self.players.insert(player.id.clone(), player.clone());
            }
            RenderUpdate::PlayerState(player) => {
                self.players.insert(player.id.clone(), player.clone());
            }
            RenderUpdate::PlayerLeft { id } => {
                self.players.remove(id);
            }
            RenderUpdate::CoinAdded { x, y } => {
                self.coins.insert((*x, *y));
            }
            RenderUpdate::CoinRemoved { x, y } => {
                self.coins.remove(&(*x, *y));
            }
        }
    }

    fn present(&mut self) {
        println!("{}", self.frame());
    }
}
