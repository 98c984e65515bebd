//! Fixed catalog of collectibles and obstacles with their payloads.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    BATTERY_ECO, BATTERY_SCORE, FUEL_ECO, FUEL_SCORE, LEAF_ECO, LEAF_SCORE, SOLAR_ECO, SOLAR_SCORE,
};
use crate::effects::PulseKind;

/// Packed `0xRRGGBB` color carried by pulses for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub u32);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0x00FF_FFFF)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectibleKind {
    Solar,
    Battery,
    Leaf,
}

impl CollectibleKind {
    pub const ALL: [Self; 3] = [Self::Solar, Self::Battery, Self::Leaf];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solar => "solar",
            Self::Battery => "battery",
            Self::Leaf => "leaf",
        }
    }

    /// Score and eco delta granted on pickup.
    #[must_use]
    pub const fn reward(self) -> (i32, i32) {
        match self {
            Self::Solar => (SOLAR_SCORE, SOLAR_ECO),
            Self::Battery => (BATTERY_SCORE, BATTERY_ECO),
            Self::Leaf => (LEAF_SCORE, LEAF_ECO),
        }
    }

    #[must_use]
    pub const fn pulse(self) -> PulseKind {
        match self {
            Self::Solar => PulseKind::Glow,
            Self::Battery => PulseKind::Spark,
            Self::Leaf => PulseKind::Bloom,
        }
    }

    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            Self::Solar => Rgb(0x00fb_bf24),
            Self::Battery => Rgb(0x003b_82f6),
            Self::Leaf => Rgb(0x0010_b981),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Fuel,
    Smoke,
    Traffic,
}

impl ObstacleKind {
    pub const ALL: [Self; 3] = [Self::Fuel, Self::Smoke, Self::Traffic];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fuel => "fuel",
            Self::Smoke => "smoke",
            Self::Traffic => "traffic",
        }
    }

    /// Score and eco delta applied on impact. Only fuel carries a penalty;
    /// traffic is a cosmetic shake.
    #[must_use]
    pub const fn penalty(self) -> (i32, i32) {
        match self {
            Self::Fuel => (FUEL_SCORE, FUEL_ECO),
            Self::Smoke | Self::Traffic => (0, 0),
        }
    }

    /// Whether impact opens a slow-down window.
    #[must_use]
    pub const fn slows(self) -> bool {
        matches!(self, Self::Smoke)
    }

    #[must_use]
    pub const fn pulse(self) -> PulseKind {
        match self {
            Self::Fuel => PulseKind::Hit,
            Self::Smoke => PulseKind::Slow,
            Self::Traffic => PulseKind::Shake,
        }
    }

    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            Self::Fuel => Rgb(0x00ef_4444),
            Self::Smoke => Rgb(0x006b_7280),
            Self::Traffic => Rgb(0x00f9_7316),
        }
    }
}

/// Anything that can fall down a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "class", content = "kind", rename_all = "lowercase")]
pub enum EntityKind {
    Collectible(CollectibleKind),
    Obstacle(ObstacleKind),
}

impl EntityKind {
    #[must_use]
    pub const fn is_obstacle(self) -> bool {
        matches!(self, Self::Obstacle(_))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collectible(kind) => kind.as_str(),
            Self::Obstacle(kind) => kind.as_str(),
        }
    }

    #[must_use]
    pub const fn payload(self) -> Payload {
        let ((score, eco), slows) = match self {
            Self::Collectible(kind) => (kind.reward(), false),
            Self::Obstacle(kind) => (kind.penalty(), kind.slows()),
        };
        Payload { score, eco, slows }
    }

    #[must_use]
    pub const fn pulse(self) -> PulseKind {
        match self {
            Self::Collectible(kind) => kind.pulse(),
            Self::Obstacle(kind) => kind.pulse(),
        }
    }

    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            Self::Collectible(kind) => kind.color(),
            Self::Obstacle(kind) => kind.color(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect applied once when an entity reaches the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub score: i32,
    pub eco: i32,
    pub slows: bool,
}
