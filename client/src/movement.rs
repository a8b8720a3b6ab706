use shared::{Direction, MapData, Player};
use thiserror::Error;

/// Directional intent from any input source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Up,
    Down,
    Left,
    Right,
}

impl Intent {
    /// Grid delta; y grows downwards
    pub fn delta(self) -> (i32, i32) {
        match self {
            Intent::Up => (0, -1),
            Intent::Down => (0, 1),
            Intent::Left => (-1, 0),
            Intent::Right => (1, 0),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("destination ({x}, {y}) is blocked")]
    Blocked { x: i32, y: i32 },
}

/// Validates a step and returns the player's next state.
///
/// Only horizontal steps change facing. The caller commits the result as a
/// whole-record write; a rejection needs no write at all.
pub fn try_move(map: &MapData, current: &Player, dx: i32, dy: i32) -> Result<Player, MoveError> {
    let x = current.x + dx;
    let y = current.y + dy;
    if map.is_blocked(x, y) {
        return Err(MoveError::Blocked { x, y });
    }

    let mut next = current.clone();
    next.x = x;
    next.y = y;
    match dx {
        1 => next.direction = Direction::Right,
        -1 => next.direction = Direction::Left,
        _ => {}
    }
    Ok(next)
}
