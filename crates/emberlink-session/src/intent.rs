//! Outbound movement: turning per-tick intent into `Move` messages.
//!
//! The server treats every `Move` as a toggle ("start moving +X", "stop
//! moving on X"). Sending the same start twice would be read as two
//! separate presses, so the encoder only ever reports *changes*.

use emberlink_protocol::{Axis, Message, Sign};

/// Where the player wants to go this tick, one value per axis.
///
/// Values are signed directions: `0` is idle, any positive value is the
/// positive direction and any negative value the negative one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MoveIntent {
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

impl MoveIntent {
    pub const IDLE: Self = Self { x: 0, y: 0, z: 0 };

    pub fn new(x: i8, y: i8, z: i8) -> Self {
        Self { x, y, z }
    }

    /// Intent on the ground plane.
    pub fn planar(x: i8, y: i8) -> Self {
        Self { x, y, z: 0 }
    }

    pub fn get(&self, axis: Axis) -> i8 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: i8) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }
}

/// Diffs successive intents and emits one `Move` per changed axis.
///
/// | previous | current | emitted                         |
/// |----------|---------|---------------------------------|
/// | `v`      | `v`     | nothing                         |
/// | `0`      | `+1`    | `Move { sign: Pos, start: true }`  |
/// | `+1`     | `-1`    | `Move { sign: Neg, start: true }`  |
/// | `+1`     | `0`     | `Move { sign: Pos, start: false }` |
///
/// A stop carries the sign of the direction being released. Axes are
/// visited in [`Axis::ALL`] order so output is deterministic.
#[derive(Debug, Clone, Default)]
pub struct IntentEncoder {
    last: MoveIntent,
}

impl IntentEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages needed to bring the server from the last sent
    /// intent to `current`, and remembers `current` as sent.
    pub fn encode(&mut self, current: MoveIntent) -> Vec<Message> {
        let mut out = Vec::new();
        for axis in Axis::ALL {
            let before = self.last.get(axis);
            let now = current.get(axis);
            if before == now {
                continue;
            }
            let direction = if now != 0 { now } else { before };
            out.push(Message::move_axis(axis, Sign::of(direction), now != 0));
            self.last.set(axis, now);
        }
        if !out.is_empty() {
            tracing::debug!(?current, moves = out.len(), "intent changed");
        }
        out
    }

    /// The intent the server currently believes in.
    pub fn last_sent(&self) -> MoveIntent {
        self.last
    }
}
