//! Enemy state owned by the world.

use std::time::Duration;

use castle_defence_core::{
    Behavior, EnemyKind, Path, Point, SpawnRequest, UnitId, UnitSnapshot,
};

/// Share of forward progress kept while an enemy staggers.
const DIZZY_PROGRESS: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Slow {
    factor: f32,
    remaining: Duration,
}

/// Outcome of a chilling effect such as a frost hit or the slow-time power.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ChillOutcome {
    Slowed,
    Healed(f32),
    Unaffected,
}

/// Live enemy walking one of the installed paths.
#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: Point,
    pub(crate) hp: f32,
    pub(crate) max_hp: f32,
    pub(crate) path_index: usize,
    pub(crate) bounty: u32,
    pub(crate) campaign_points: u32,
    base_speed: f32,
    next_waypoint: usize,
    slow: Option<Slow>,
    dizzy_for: Duration,
    splash_timer: Duration,
}

impl Unit {
    pub(crate) fn spawn(id: UnitId, request: SpawnRequest, path_index: usize, path: &Path) -> Self {
        let kind = EnemyKind::for_spawn(request);
        let stats = kind.stats(request.wave);
        Self {
            id,
            kind,
            position: path.start(),
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            path_index,
            bounty: stats.bounty,
            campaign_points: stats.campaign_points,
            base_speed: stats.speed,
            next_waypoint: 1,
            slow: None,
            dizzy_for: Duration::ZERO,
            splash_timer: Duration::ZERO,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Speed after slows, in pixels per second.
    pub(crate) fn speed(&self) -> f32 {
        match self.slow {
            Some(slow) => self.base_speed * slow.factor,
            None => self.base_speed,
        }
    }

    pub(crate) fn is_dizzy(&self) -> bool {
        !self.dizzy_for.is_zero()
    }

    /// Counts down active status effects.
    pub(crate) fn tick_effects(&mut self, dt: Duration) {
        self.dizzy_for = self.dizzy_for.saturating_sub(dt);
        if let Some(slow) = &mut self.slow {
            slow.remaining = slow.remaining.saturating_sub(dt);
            if slow.remaining.is_zero() {
                self.slow = None;
            }
        }
    }

    /// Walks along `path` for `dt`; returns `true` once the castle is reached.
    pub(crate) fn advance(&mut self, path: &Path, dt: Duration) -> bool {
        let mut budget = self.speed() * dt.as_secs_f32();
        if self.is_dizzy() {
            budget *= DIZZY_PROGRESS;
        }

        let points = path.points();
        while budget > 0.0 {
            let Some(&waypoint) = points.get(self.next_waypoint) else {
                return true;
            };
            let distance = self.position.distance(waypoint);
            if distance > budget {
                self.position = self.position.step_toward(waypoint, budget);
                return false;
            }
            budget -= distance;
            self.position = waypoint;
            self.next_waypoint += 1;
        }
        self.next_waypoint >= points.len()
    }

    /// Removes hit points, returning what is left.
    pub(crate) fn take_damage(&mut self, amount: f32) -> f32 {
        self.hp = (self.hp - amount).max(0.0);
        self.hp
    }

    /// Applies a chilling effect according to the unit's behaviours.
    pub(crate) fn chill(&mut self, factor: f32, duration: Duration) -> ChillOutcome {
        for behavior in self.kind.behaviors() {
            if let Behavior::HealsFromFrost { amount } = *behavior {
                let healed = amount.min(self.max_hp - self.hp).max(0.0);
                self.hp += healed;
                return ChillOutcome::Healed(healed);
            }
        }

        if !self.kind.has_behavior(|behavior| *behavior == Behavior::Slowable) {
            return ChillOutcome::Unaffected;
        }

        self.slow = Some(match self.slow {
            Some(active) => Slow {
                factor: active.factor.min(factor),
                remaining: active.remaining.max(duration),
            },
            None => Slow {
                factor,
                remaining: duration,
            },
        });
        ChillOutcome::Slowed
    }

    /// Makes the unit stagger; returns `false` when it is immune.
    pub(crate) fn daze(&mut self, duration: Duration) -> bool {
        if !self.kind.has_behavior(|behavior| *behavior == Behavior::Dizziable) {
            return false;
        }
        self.dizzy_for = self.dizzy_for.max(duration);
        true
    }

    /// Advances the tower splash timer; returns `true` when a splash is due.
    pub(crate) fn splash_due(&mut self, dt: Duration, interval: Duration) -> bool {
        self.splash_timer = self.splash_timer.saturating_add(dt);
        if self.splash_timer < interval {
            return false;
        }
        self.splash_timer = Duration::ZERO;
        true
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            hp: self.hp,
            max_hp: self.max_hp,
            speed: self.speed(),
            path_index: self.path_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castle_defence_core::{SpawnKind, WaveNumber};

    fn corner_path() -> Path {
        Path::new(vec![
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 300.0),
        ])
        .expect("two or more points")
    }

    fn grunt() -> Unit {
        let request = SpawnRequest {
            wave: WaveNumber::new(1),
            kind: SpawnKind::Regular { ordinal: 0 },
        };
        Unit::spawn(UnitId::new(0), request, 0, &corner_path())
    }

    fn beer() -> Unit {
        let request = SpawnRequest {
            wave: WaveNumber::new(4),
            kind: SpawnKind::Regular { ordinal: 6 },
        };
        Unit::spawn(UnitId::new(1), request, 0, &corner_path())
    }

    #[test]
    fn grunt_follows_waypoints_around_corners() {
        let path = corner_path();
        let mut unit = grunt();
        assert_eq!(unit.speed(), 73.0);

        assert!(!unit.advance(&path, Duration::from_secs(2)));
        assert_eq!(unit.position, Point::new(100.0, 146.0));

        assert!(unit.advance(&path, Duration::from_secs(3)));
        assert_eq!(unit.position, Point::new(100.0, 300.0));
    }

    #[test]
    fn slows_and_dizziness_reduce_progress() {
        let path = corner_path();
        let mut unit = grunt();
        assert_eq!(unit.chill(0.5, Duration::from_secs(10)), ChillOutcome::Slowed);
        assert_eq!(unit.speed(), 36.5);
        assert!(unit.daze(Duration::from_secs(5)));

        assert!(!unit.advance(&path, Duration::from_secs(1)));
        assert!((unit.position.x() - 10.95).abs() < 1e-3);

        unit.tick_effects(Duration::from_secs(10));
        assert!(!unit.is_dizzy());
        assert_eq!(unit.speed(), 73.0);
    }

    #[test]
    fn angry_beer_heals_instead_of_slowing() {
        let mut unit = beer();
        assert_eq!(unit.kind, EnemyKind::AngryBeer);
        let _ = unit.take_damage(250.0);

        assert_eq!(unit.chill(0.5, Duration::from_secs(10)), ChillOutcome::Healed(100.0));
        assert_eq!(unit.hp, unit.max_hp - 150.0);
        assert_eq!(unit.speed(), 70.0);
        assert_eq!(unit.chill(0.5, Duration::from_secs(10)), ChillOutcome::Healed(100.0));
        assert_eq!(unit.chill(0.5, Duration::from_secs(10)), ChillOutcome::Healed(50.0));
        assert_eq!(unit.hp, unit.max_hp);
    }

    #[test]
    fn damage_never_drops_below_zero() {
        let mut unit = grunt();
        assert_eq!(unit.take_damage(500.0), 0.0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn splash_timer_fires_on_interval() {
        let mut unit = beer();
        let interval = Duration::from_secs(15);
        assert!(!unit.splash_due(Duration::from_secs(14), interval));
        assert!(unit.splash_due(Duration::from_secs(1), interval));
        assert!(!unit.splash_due(Duration::from_secs(1), interval));
    }
}
