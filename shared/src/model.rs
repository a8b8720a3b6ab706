use crate::document::{Document, DocumentError, Path};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PLAYERS: &str = "players";
pub const COINS: &str = "coins";

/// Longest display name kept, in characters; keeps a full player snapshot
/// inside one datagram
pub const MAX_NAME_CHARS: usize = 24;

const NAME_PREFIXES: &[&str] = &[
    "COOL", "SUPER", "HIP", "SMUG", "SILKY", "GOOD", "SAFE", "DEAR", "DAMP", "MOIST", "WARM",
    "RICH", "LONG", "DARK", "SOFT", "BUFF", "DOPE",
];

const NAME_ANIMALS: &[&str] = &[
    "BEAR", "DOG", "CAT", "FOX", "LAMB", "LION", "BOAR", "GOAT", "VOLE", "SEAL", "PUMA", "MULE",
    "BULL", "BIRD", "BUG",
];

/// Store key for a grid cell, e.g. `3x5`
pub fn key_string(x: i32, y: i32) -> String {
    format!("{}x{}", x, y)
}

/// Random display name made of an adjective and an animal
pub fn create_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let prefix = NAME_PREFIXES.choose(rng).copied().unwrap_or("COOL");
    let animal = NAME_ANIMALS.choose(rng).copied().unwrap_or("FOX");
    format!("{} {}", prefix, animal)
}

/// Trims a requested name and cuts it to `MAX_NAME_CHARS`.
///
/// Returns `None` when nothing printable is left.
pub fn clamp_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    let name = name.trim_end();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Horizontal facing; vertical moves keep whatever was last set
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl FromStr for Direction {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(DocumentError::InvalidValue {
                field: "direction",
                value: other.to_string(),
            }),
        }
    }
}

/// Palette in sprite-sheet order
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PlayerColor {
    Blue,
    Red,
    Orange,
    Yellow,
    Green,
    Purple,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; 6] = [
        PlayerColor::Blue,
        PlayerColor::Red,
        PlayerColor::Orange,
        PlayerColor::Yellow,
        PlayerColor::Green,
        PlayerColor::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerColor::Blue => "blue",
            PlayerColor::Red => "red",
            PlayerColor::Orange => "orange",
            PlayerColor::Yellow => "yellow",
            PlayerColor::Green => "green",
            PlayerColor::Purple => "purple",
        }
    }

    /// Next palette entry, wrapping from the last back to the first
    pub fn next(&self) -> PlayerColor {
        let index = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> PlayerColor {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl FromStr for PlayerColor {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| DocumentError::InvalidValue {
                field: "color",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One connected avatar, written only by its owning client
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub color: PlayerColor,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub coins: u32,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: PlayerColor, x: i32, y: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color,
            x,
            y,
            direction: Direction::Right,
            coins: 0,
        }
    }

    pub fn path(&self) -> Path {
        player_path(&self.id)
    }

    pub fn to_document(&self) -> Document {
        Document::new()
            .with("id", self.id.as_str())
            .with("name", self.name.as_str())
            .with("color", self.color.as_str())
            .with("direction", self.direction.as_str())
            .with("x", self.x)
            .with("y", self.y)
            .with("coins", self.coins)
    }

    pub fn from_document(doc: &Document) -> Result<Self, DocumentError> {
        let coins = doc.int("coins")?;

        Ok(Self {
            id: doc.text("id")?.to_string(),
            name: doc.text("name")?.to_string(),
            color: doc.text("color")?.parse()?,
            direction: doc.text("direction")?.parse()?,
            x: coordinate(doc, "x")?,
            y: coordinate(doc, "y")?,
            coins: u32::try_from(coins).map_err(|_| DocumentError::InvalidValue {
                field: "coins",
                value: coins.to_string(),
            })?,
        })
    }
}

pub fn player_path(id: &str) -> Path {
    Path::new(PLAYERS, id)
}

/// Coin pickup; its cell is also its identity
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coin {
    pub x: i32,
    pub y: i32,
}

impl Coin {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn key(&self) -> String {
        key_string(self.x, self.y)
    }

    pub fn path(&self) -> Path {
        Path::new(COINS, self.key())
    }

    pub fn to_document(&self) -> Document {
        Document::new().with("x", self.x).with("y", self.y)
    }

    pub fn from_document(doc: &Document) -> Result<Self, DocumentError> {
        Ok(Self {
            x: coordinate(doc, "x")?,
            y: coordinate(doc, "y")?,
        })
    }
}

fn coordinate(doc: &Document, field: &'static str) -> Result<i32, DocumentError> {
    let raw = doc.int(field)?;
    i32::try_from(raw).map_err(|_| DocumentError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}
