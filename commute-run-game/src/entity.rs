//! Lanes and the entities that travel down them.
use serde::{Deserialize, Serialize};

use crate::catalog::EntityKind;
use crate::constants::{LANE_COUNT, REMOVED_POSITION, START_LANE};

/// One of the three horizontal tracks, 0 = left, 1 = middle, 2 = right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Lane(u8);

impl Lane {
    pub const LEFT: Self = Self(0);
    pub const MIDDLE: Self = Self(1);
    pub const RIGHT: Self = Self(2);
    pub const ALL: [Self; LANE_COUNT as usize] = [Self::LEFT, Self::MIDDLE, Self::RIGHT];

    /// Build a lane, clamping out-of-range indices onto the nearest edge.
    #[must_use]
    pub const fn clamped(index: u8) -> Self {
        if index >= LANE_COUNT {
            Self(LANE_COUNT - 1)
        } else {
            Self(index)
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn left(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    #[must_use]
    pub const fn right(self) -> Self {
        Self::clamped(self.0.saturating_add(1))
    }

    /// Absolute lane distance between two lanes.
    #[must_use]
    pub const fn distance(self, other: Self) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl Default for Lane {
    fn default() -> Self {
        Self(START_LANE)
    }
}

impl TryFrom<u8> for Lane {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value < LANE_COUNT {
            Ok(Self(value))
        } else {
            Err(format!("lane {value} out of range 0..{LANE_COUNT}"))
        }
    }
}

impl From<Lane> for u8 {
    fn from(value: Lane) -> Self {
        value.0
    }
}

/// Identifier assigned at spawn; unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

/// A collectible or obstacle on the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub lane: Lane,
    /// Vertical position in percent of the visible track; grows downward.
    pub position: f32,
}

impl Entity {
    #[must_use]
    pub const fn new(id: EntityId, kind: EntityKind, lane: Lane, position: f32) -> Self {
        Self {
            id,
            kind,
            lane,
            position,
        }
    }

    /// Move the entity past the visible track so the exit sweep drops it.
    pub fn consume(&mut self) {
        self.position = REMOVED_POSITION;
    }

    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.position >= REMOVED_POSITION
    }
}
