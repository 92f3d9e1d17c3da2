//! Demo input source.

use emberlink::session::MoveIntent;

/// Walks a square: east, north, west, south, repeat.
#[derive(Debug, Default)]
pub struct SquareWalk {
    heading: MoveIntent,
}

impl SquareWalk {
    /// Turns to the next leg and returns the new intent.
    pub fn turn(&mut self) -> MoveIntent {
        let (x, y) = match (self.heading.x, self.heading.y) {
            (1, _) => (0, 1),
            (_, 1) => (-1, 0),
            (-1, _) => (0, -1),
            _ => (1, 0),
        };
        self.heading = MoveIntent::planar(x, y);
        self.heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_cycles_through_square() {
        let mut walk = SquareWalk::default();
        let legs: Vec<(i8, i8)> = (0..5)
            .map(|_| {
                let intent = walk.turn();
                (intent.x, intent.y)
            })
            .collect();
        assert_eq!(legs, vec![(1, 0), (0, 1), (-1, 0), (0, -1), (1, 0)]);
    }
}
