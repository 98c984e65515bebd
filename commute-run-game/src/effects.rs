//! Short-lived effect pulses emitted on collisions.
//!
//! Pulses expire on their own deadline measured on the simulation clock and
//! are independent of the motion tick; several may be active at once.
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::catalog::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseKind {
    Glow,
    Spark,
    Bloom,
    Hit,
    Slow,
    Shake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PulseId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectPulse {
    pub id: PulseId,
    pub kind: PulseKind,
    pub color: Rgb,
    pub expires_at: Duration,
}

/// Active pulses plus the id counter for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PulseSet {
    active: Vec<EffectPulse>,
    next_id: u64,
}

impl PulseSet {
    /// Add a pulse that lives for `ttl` starting at `now`.
    pub fn emit(&mut self, kind: PulseKind, color: Rgb, now: Duration, ttl: Duration) -> PulseId {
        let id = PulseId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.active.push(EffectPulse {
            id,
            kind,
            color,
            expires_at: now.saturating_add(ttl),
        });
        id
    }

    /// Drop every pulse whose deadline has passed, returning how many expired.
    pub fn expire(&mut self, now: Duration) -> usize {
        let before = self.active.len();
        self.active.retain(|pulse| pulse.expires_at > now);
        before - self.active.len()
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.next_id = 0;
    }

    #[must_use]
    pub fn active(&self) -> &[EffectPulse] {
        &self.active
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn contains(&self, kind: PulseKind) -> bool {
        self.active.iter().any(|pulse| pulse.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(500);

    #[test]
    fn pulses_expire_at_their_deadline() {
        let mut set = PulseSet::default();
        set.emit(PulseKind::Glow, Rgb(0xfbbf24), Duration::ZERO, TTL);
        set.emit(PulseKind::Hit, Rgb(0xef4444), Duration::from_millis(200), TTL);
        assert_eq!(set.len(), 2);

        assert_eq!(set.expire(Duration::from_millis(499)), 0);
        assert_eq!(set.expire(Duration::from_millis(500)), 1);
        assert!(set.contains(PulseKind::Hit));
        assert!(!set.contains(PulseKind::Glow));
        assert_eq!(set.expire(Duration::from_millis(700)), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn ids_are_unique_until_cleared() {
        let mut set = PulseSet::default();
        let a = set.emit(PulseKind::Shake, Rgb(0), Duration::ZERO, TTL);
        let b = set.emit(PulseKind::Shake, Rgb(0), Duration::ZERO, TTL);
        assert_ne!(a, b);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.emit(PulseKind::Slow, Rgb(0), Duration::ZERO, TTL), PulseId(0));
    }
}
