use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

/// Sampling attempts before `pick_safe_spot` gives up on a saturated map
pub const MAX_SPOT_ATTEMPTS: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("map bounds [{min_x},{max_x})x[{min_y},{max_y}) contain no cells")]
    EmptyBounds {
        min_x: i32,
        max_x: i32,
        min_y: i32,
        max_y: i32,
    },
    #[error("no unblocked cell found after {0} attempts")]
    NoSafeSpot(usize),
}

/// Static map geometry: half-open bounds plus a fixed set of blocked cells
#[derive(Debug, Clone)]
pub struct MapData {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    blocked: HashSet<(i32, i32)>,
}

impl MapData {
    pub fn new(
        min_x: i32,
        max_x: i32,
        min_y: i32,
        max_y: i32,
        blocked: impl IntoIterator<Item = (i32, i32)>,
    ) -> Result<Self, GridError> {
        if min_x >= max_x || min_y >= max_y {
            return Err(GridError::EmptyBounds {
                min_x,
                max_x,
                min_y,
                max_y,
            });
        }

        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
            blocked: blocked.into_iter().collect(),
        })
    }

    /// The shipped arena: 13x8 playable cells with a few walls and ledges
    pub fn sample() -> Self {
        Self {
            min_x: 1,
            max_x: 14,
            min_y: 4,
            max_y: 12,
            blocked: [
                (7, 4),
                (1, 11),
                (12, 10),
                (4, 7),
                (5, 7),
                (6, 7),
                (8, 6),
                (9, 6),
                (10, 6),
                (7, 9),
                (8, 9),
                (9, 9),
            ]
            .into_iter()
            .collect(),
        }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        !self.in_bounds(x, y) || self.blocked.contains(&(x, y))
    }

    pub fn blocked_cells(&self) -> impl Iterator<Item = &(i32, i32)> {
        self.blocked.iter()
    }

    /// Draws uniformly from the in-bounds cells until one is not blocked.
    ///
    /// Only static obstacles are avoided; the returned cell may already hold
    /// a player or a coin.
    pub fn pick_safe_spot<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(i32, i32), GridError> {
        for _ in 0..MAX_SPOT_ATTEMPTS {
            let x = rng.gen_range(self.min_x..self.max_x);
            let y = rng.gen_range(self.min_y..self.max_y);
            if !self.is_blocked(x, y) {
                return Ok((x, y));
            }
        }
        Err(GridError::NoSafeSpot(MAX_SPOT_ATTEMPTS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_map_cells() {
        let map = MapData::sample();
        assert!(map.is_blocked(7, 4));
        assert!(!map.is_blocked(1, 5));
        assert_eq!(map.blocked_cells().count(), 12);
    }

    #[test]
    fn test_bounds_are_half_open() {
        let map = MapData::sample();
        assert!(!map.is_blocked(1, 4));
        assert!(!map.is_blocked(13, 11));
        assert!(map.is_blocked(0, 5));
        assert!(map.is_blocked(14, 5));
        assert!(map.is_blocked(5, 3));
        assert!(map.is_blocked(5, 12));
    }

    #[test]
    fn test_is_blocked_matches_definition_everywhere() {
        let map = MapData::sample();
        let blocked: HashSet<(i32, i32)> = map.blocked_cells().copied().collect();

        for x in -2..17 {
            for y in 0..15 {
                let expected = !(1..14).contains(&x) || !(4..12).contains(&y) || blocked.contains(&(x, y));
                assert_eq!(map.is_blocked(x, y), expected, "cell ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_pick_safe_spot_never_blocked() {
        let map = MapData::sample();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..2000 {
            let (x, y) = map.pick_safe_spot(&mut rng).unwrap();
            assert!(map.in_bounds(x, y));
            assert!(!map.is_blocked(x, y));
        }
    }

    #[test]
    fn test_pick_safe_spot_fully_blocked_map() {
        let map = MapData::new(0, 2, 0, 1, [(0, 0), (1, 0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            map.pick_safe_spot(&mut rng),
            Err(GridError::NoSafeSpot(MAX_SPOT_ATTEMPTS))
        );
    }

    #[test]
    fn test_empty_bounds_rejected() {
        assert!(matches!(
            MapData::new(3, 3, 0, 5, []),
            Err(GridError::EmptyBounds { .. })
        ));
    }
}
