#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system steering the castle's protector.
//!
//! The protector chases whichever enemy is closest to the castle, keeping a
//! safe gap, and periodically dusts every enemy in range so it staggers.
//! With the field clear it drifts home and patrols around the castle.

use std::{f32::consts::TAU, time::Duration};

use castle_defence_core::{Command, Event, Point, UnitSnapshot, UnitView};
use castle_defence_system_target_selection::{LinearScan, TargetSelector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tunables of the protector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Radius within which dust reaches enemies.
    pub range: f32,
    /// Time between two dust bursts.
    pub dust_interval: Duration,
    /// How long dusted enemies stay dizzy.
    pub dizzy_duration: Duration,
    /// Travel speed in pixels per second.
    pub speed: f32,
    /// Gap kept between the protector and any enemy.
    pub keep_away: f32,
    /// Distance of patrol points from the castle.
    pub patrol_radius: f32,
    /// Distance from the castle under which the protector starts patrolling.
    pub home_radius: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            range: 150.0,
            dust_interval: Duration::from_secs(5),
            dizzy_duration: Duration::from_secs(5),
            speed: 80.0,
            keep_away: 60.0,
            patrol_radius: 150.0,
            home_radius: 50.0,
        }
    }
}

/// Protector steering system.
#[derive(Debug)]
pub struct Protector<R = ChaCha8Rng> {
    config: Config,
    rng: R,
    selector: LinearScan,
    since_dust: Duration,
    patrol_target: Option<Point>,
}

impl Protector {
    /// Creates a protector whose patrol points derive from `seed`.
    #[must_use]
    pub fn from_seed(config: Config, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Protector<R> {
    /// Creates a protector drawing patrol points from `rng`.
    #[must_use]
    pub fn with_rng(config: Config, rng: R) -> Self {
        Self {
            config,
            rng,
            selector: LinearScan,
            since_dust: Duration::ZERO,
            patrol_target: None,
        }
    }

    /// Tunables in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reacts to the time reported in `events`.
    ///
    /// Emits `Command::MoveProtector` when the protector moves and one
    /// `Command::ApplyDizzy` per enemy in range whenever the dust is due.
    pub fn handle(
        &mut self,
        events: &[Event],
        position: Point,
        castle: Point,
        units: &UnitView,
        out: &mut Vec<Command>,
    ) {
        let dt = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);
        if dt.is_zero() {
            return;
        }

        let next = self.step(position, castle, units, dt);
        if next != position {
            out.push(Command::MoveProtector { position: next });
        }

        self.since_dust = self.since_dust.saturating_add(dt);
        if self.since_dust >= self.config.dust_interval {
            self.since_dust = Duration::ZERO;
            self.dust(next, units, out);
        }
    }

    fn step(&mut self, position: Point, castle: Point, units: &UnitView, dt: Duration) -> Point {
        let target = match self.selector.select_nearest_to_anchor(castle, units.iter()) {
            Some(threat) => {
                self.patrol_target = None;
                self.keep_distance(position, threat.position)
            }
            None => self.idle_target(position, castle),
        };

        let travel = self.config.speed * dt.as_secs_f32();
        let next = position.step_toward(target, travel);
        if next == position || self.too_close(next, units) {
            return position;
        }
        next
    }

    /// Point on the line to `threat` that leaves exactly the safe gap.
    fn keep_distance(&self, position: Point, threat: Point) -> Point {
        let dx = threat.x() - position.x();
        let dy = threat.y() - position.y();
        let distance = position.distance(threat);
        let keep_away = self.config.keep_away;

        if distance > keep_away {
            let ratio = (distance - keep_away) / distance;
            Point::new(position.x() + dx * ratio, position.y() + dy * ratio)
        } else {
            let ratio = (keep_away - distance) / if distance > 0.0 { distance } else { 1.0 };
            Point::new(position.x() - dx * ratio, position.y() - dy * ratio)
        }
    }

    fn idle_target(&mut self, position: Point, castle: Point) -> Point {
        if position.distance(castle) >= self.config.home_radius {
            self.patrol_target = None;
            return castle;
        }

        if let Some(target) = self.patrol_target {
            if target != position {
                return target;
            }
        }

        let angle = self.rng.gen_range(0.0..TAU);
        let radius = self.config.patrol_radius;
        let target = Point::new(
            castle.x() + angle.cos() * radius,
            castle.y() + angle.sin() * radius,
        );
        self.patrol_target = Some(target);
        target
    }

    fn too_close(&self, candidate: Point, units: &UnitView) -> bool {
        units
            .iter()
            .any(|unit| candidate.distance(unit.position) < self.config.keep_away)
    }

    fn dust(&self, position: Point, units: &UnitView, out: &mut Vec<Command>) {
        let in_range = units
            .iter()
            .filter(|unit: &&UnitSnapshot| position.distance(unit.position) <= self.config.range);
        for unit in in_range {
            out.push(Command::ApplyDizzy {
                unit: unit.id,
                duration: self.config.dizzy_duration,
            });
        }
    }
}
