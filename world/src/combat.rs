//! Projectiles in flight and the geometry of their hits.

use std::time::Duration;

use castle_defence_core::{AttackProfile, Point, UnitId};

const FLIGHT_MS_PER_PIXEL: f32 = 4.0;
const MIN_FLIGHT_MS: f32 = 120.0;
const MAX_FLIGHT_MS: f32 = 400.0;

/// Shot travelling toward an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Projectile {
    pub(crate) target: UnitId,
    pub(crate) attack: AttackProfile,
    pub(crate) damage: f32,
    pub(crate) remaining: Duration,
    /// Where the target stood when last seen; splash lands here if it died.
    pub(crate) last_seen: Point,
}

/// Time a projectile needs to cover `distance` pixels.
pub(crate) fn flight_time(distance: f32) -> Duration {
    let millis = (distance * FLIGHT_MS_PER_PIXEL).clamp(MIN_FLIGHT_MS, MAX_FLIGHT_MS);
    Duration::from_millis(millis.round() as u64)
}
