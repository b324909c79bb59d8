#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Castle Defence.
//!
//! The world owns every mutable piece of a session: the economy, installed
//! paths, live enemies, towers, projectiles and the protector. It changes
//! only through [`apply`], which reports each effect as an [`Event`].

mod combat;
mod towers;
mod units;

use std::{collections::BTreeSet, time::Duration};

use castle_defence_core::{
    AttackProfile, Behavior, Bonuses, Command, Event, PathLayout, PlacementError, Point,
    RemovalCause, SessionStatus, SpawnRequest, StatusEffect, TowerId, TowerKind, TowerLevel,
    UnitId, UpgradeError, WaveNumber, WELCOME_BANNER,
};
use tracing::{debug, info};

use combat::{flight_time, Projectile};
use towers::{snap_to_grid, TowerRegistry};
use units::{ChillOutcome, Unit};

/// Minimum distance between a tower and the centreline of any path.
const PATH_CLEARANCE: f32 = 24.0;

const SLOW_EVENT_COST: u32 = 50;
const SLOW_EVENT_FACTOR: f32 = 0.5;
const SLOW_EVENT_DURATION: Duration = Duration::from_secs(10);

/// Running totals of a session, used for summaries and campaign awards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Enemies killed.
    pub kills: u32,
    /// Enemies that reached the castle.
    pub escaped: u32,
    /// Gold collected from bounties.
    pub gold_earned: u32,
    /// Campaign points collected from kills.
    pub campaign_points: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct MapSize {
    width: f32,
    height: f32,
}

/// Represents the authoritative Castle Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    status: SessionStatus,
    bonuses: Bonuses,
    unlocked_towers: BTreeSet<TowerKind>,
    gold: u32,
    lives: u32,
    map: Option<MapSize>,
    layout: Option<PathLayout>,
    wave: WaveNumber,
    units: Vec<Unit>,
    next_unit_id: u32,
    spawn_counter: usize,
    towers: TowerRegistry,
    projectiles: Vec<Projectile>,
    protector: Option<Point>,
    slow_event_for: Duration,
    stats: SessionStats,
}

impl World {
    /// Creates a world with default resources and no installed paths.
    #[must_use]
    pub fn new() -> Self {
        let bonuses = Bonuses::default();
        Self {
            banner: WELCOME_BANNER,
            status: SessionStatus::Running,
            gold: bonuses.starting_gold,
            lives: bonuses.starting_lives,
            bonuses,
            unlocked_towers: BTreeSet::from([TowerKind::Basic]),
            map: None,
            layout: None,
            wave: WaveNumber::FIRST,
            units: Vec::new(),
            next_unit_id: 0,
            spawn_counter: 0,
            towers: TowerRegistry::new(),
            projectiles: Vec::new(),
            protector: None,
            slow_event_for: Duration::ZERO,
            stats: SessionStats::default(),
        }
    }

    fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id && unit.is_alive())
    }

    fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units
            .iter_mut()
            .find(|unit| unit.id == id && unit.is_alive())
    }

    fn set_status(&mut self, status: SessionStatus, out_events: &mut Vec<Event>) {
        if self.status == status {
            return;
        }
        self.status = status;
        out_events.push(Event::StatusChanged { status });
    }

    fn start_session(
        &mut self,
        bonuses: Bonuses,
        unlocked_towers: Vec<TowerKind>,
        out_events: &mut Vec<Event>,
    ) {
        self.bonuses = bonuses;
        self.gold = bonuses.starting_gold;
        self.lives = bonuses.starting_lives;
        self.unlocked_towers = unlocked_towers
            .into_iter()
            .chain([TowerKind::Basic])
            .collect();
        self.wave = WaveNumber::FIRST;
        self.clear_units(out_events);
        self.next_unit_id = 0;
        self.spawn_counter = 0;
        self.towers.clear();
        self.projectiles.clear();
        self.protector = self.layout.as_ref().map(PathLayout::castle);
        self.slow_event_for = Duration::ZERO;
        self.stats = SessionStats::default();

        info!(gold = self.gold, lives = self.lives, "session started");
        out_events.push(Event::SessionStarted {
            gold: self.gold,
            lives: self.lives,
        });
        self.set_status(SessionStatus::Running, out_events);
    }

    fn install_paths(
        &mut self,
        layout: PathLayout,
        width: f32,
        height: f32,
        out_events: &mut Vec<Event>,
    ) {
        let path_count = layout.path_count();
        self.clear_units(out_events);
        self.projectiles.clear();
        self.spawn_counter = 0;
        self.protector = Some(layout.castle());
        self.layout = Some(layout);
        self.map = Some(MapSize { width, height });
        debug!(path_count, width, height, "paths installed");
        out_events.push(Event::PathsInstalled { path_count });
    }

    /// Drops every live enemy, reporting each one so unit counts elsewhere stay true.
    fn clear_units(&mut self, out_events: &mut Vec<Event>) {
        for unit in self.units.drain(..) {
            out_events.push(Event::UnitRemoved {
                unit: unit.id,
                kind: unit.kind,
                cause: RemovalCause::Cleared,
            });
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.status != SessionStatus::Running {
            return;
        }
        out_events.push(Event::TimeAdvanced { dt });

        self.slow_event_for = self.slow_event_for.saturating_sub(dt);
        self.towers.tick(dt);
        self.run_behaviors(dt, out_events);
        self.move_units(dt, out_events);
        if self.status != SessionStatus::Running {
            return;
        }
        self.resolve_projectiles(dt, out_events);
    }

    fn run_behaviors(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        for unit in &mut self.units {
            unit.tick_effects(dt);
            for behavior in unit.kind.behaviors() {
                let Behavior::SplashesTowers {
                    interval,
                    range,
                    disable_for,
                } = *behavior
                else {
                    continue;
                };
                if !unit.splash_due(dt, interval) {
                    continue;
                }
                let Some(tower_id) = self.towers.nearest_within(unit.position, range) else {
                    continue;
                };
                if let Some(tower) = self.towers.get_mut(tower_id) {
                    tower.disabled_for = tower.disabled_for.max(disable_for);
                    debug!(unit = unit.id.get(), tower = tower_id.get(), "tower splashed");
                    out_events.push(Event::TowerIncapacitated {
                        tower: tower_id,
                        duration: disable_for,
                    });
                }
            }
        }
    }

    fn move_units(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };

        let mut escaped = Vec::new();
        for unit in &mut self.units {
            let Some(path) = layout.path(unit.path_index) else {
                continue;
            };
            if unit.advance(path, dt) {
                escaped.push(unit.id);
            }
        }

        for id in escaped {
            self.remove_escaped(id, out_events);
        }
    }

    fn remove_escaped(&mut self, id: UnitId, out_events: &mut Vec<Event>) {
        let Some(index) = self.units.iter().position(|unit| unit.id == id) else {
            return;
        };
        let unit = self.units.remove(index);
        self.stats.escaped += 1;
        out_events.push(Event::UnitRemoved {
            unit: id,
            kind: unit.kind,
            cause: RemovalCause::Escaped,
        });

        if self.lives > 0 {
            self.lives -= 1;
            out_events.push(Event::LivesChanged { lives: self.lives });
        }
        if self.lives == 0 && self.status != SessionStatus::Defeated {
            info!(wave = self.wave.get(), "castle fell");
            self.set_status(SessionStatus::Defeated, out_events);
        }
    }

    fn spawn(&mut self, request: SpawnRequest, out_events: &mut Vec<Event>) {
        if self.status == SessionStatus::Defeated {
            out_events.push(Event::SpawnRejected { request });
            return;
        }
        let Some(layout) = self.layout.as_ref() else {
            out_events.push(Event::SpawnRejected { request });
            return;
        };
        let path_index = self.spawn_counter % layout.path_count().max(1);
        let Some(path) = layout.path(path_index) else {
            out_events.push(Event::SpawnRejected { request });
            return;
        };
        self.spawn_counter += 1;

        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id += 1;
        let unit = Unit::spawn(id, request, path_index, path);
        debug!(unit = id.get(), kind = ?unit.kind, path_index, "unit spawned");
        out_events.push(Event::UnitSpawned {
            unit: id,
            kind: unit.kind,
            path_index,
        });
        self.units.push(unit);
    }

    fn place_tower(&mut self, kind: TowerKind, position: Point) -> Result<(TowerId, Point), PlacementError> {
        if self.status == SessionStatus::Defeated {
            return Err(PlacementError::Inactive);
        }
        if !self.unlocked_towers.contains(&kind) {
            return Err(PlacementError::Locked);
        }
        let (Some(map), Some(layout)) = (self.map, self.layout.as_ref()) else {
            return Err(PlacementError::OutOfBounds);
        };
        let inside = (0.0..=map.width).contains(&position.x())
            && (0.0..=map.height).contains(&position.y());
        if !inside {
            return Err(PlacementError::OutOfBounds);
        }

        let snapped = snap_to_grid(position, map.width, map.height);
        if layout.distance_to_paths(snapped) < PATH_CLEARANCE {
            return Err(PlacementError::OnPath);
        }
        if self.towers.is_occupied(snapped) {
            return Err(PlacementError::Occupied);
        }
        let cost = self.bonuses.cost(kind.build_cost());
        if self.gold < cost {
            return Err(PlacementError::InsufficientGold);
        }

        self.gold -= cost;
        Ok((self.towers.insert(kind, snapped), snapped))
    }

    fn upgrade_tower(&mut self, tower: TowerId) -> Result<TowerLevel, UpgradeError> {
        let Some(state) = self.towers.get(tower) else {
            return Err(UpgradeError::MissingTower);
        };
        let Some(next) = state.level.next() else {
            return Err(UpgradeError::MaxLevel);
        };
        let cost = self.bonuses.cost(state.kind.level_stats(next).cost);
        if self.gold < cost {
            return Err(UpgradeError::InsufficientGold);
        }

        self.gold -= cost;
        if let Some(state) = self.towers.get_mut(tower) {
            state.level = next;
        }
        Ok(next)
    }

    fn fire(&mut self, tower_id: TowerId, target: UnitId, out_events: &mut Vec<Event>) {
        if self.status != SessionStatus::Running {
            return;
        }
        let Some(tower) = self.towers.get(tower_id) else {
            return;
        };
        if !tower.can_fire() {
            return;
        }
        let Some(unit) = self.unit(target) else {
            return;
        };
        let distance = tower.position.distance(unit.position);
        if distance > tower.range(&self.bonuses) {
            return;
        }

        let attack = tower.kind.attack();
        let damage = tower.damage(&self.bonuses);
        let interval = tower.kind.level_stats(tower.level).fire_interval;
        let aim = unit.position;
        if let Some(tower) = self.towers.get_mut(tower_id) {
            tower.ready_in = interval;
        }

        if attack == AttackProfile::Hitscan {
            out_events.push(Event::ProjectileFired {
                tower: tower_id,
                target,
                flight: Duration::ZERO,
            });
            self.land(attack, damage, target, aim, out_events);
            self.reap(out_events);
            return;
        }

        let flight = flight_time(distance);
        out_events.push(Event::ProjectileFired {
            tower: tower_id,
            target,
            flight,
        });
        self.projectiles.push(Projectile {
            target,
            attack,
            damage,
            remaining: flight,
            last_seen: aim,
        });
    }

    fn resolve_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.projectiles.is_empty() {
            return;
        }

        let mut landed = Vec::new();
        self.projectiles.retain_mut(|projectile| {
            projectile.remaining = projectile.remaining.saturating_sub(dt);
            if projectile.remaining.is_zero() {
                landed.push(*projectile);
                return false;
            }
            true
        });

        for projectile in landed {
            self.land(
                projectile.attack,
                projectile.damage,
                projectile.target,
                projectile.last_seen,
                out_events,
            );
        }
        self.reap(out_events);
    }

    /// Applies a hit; homing shots strike the target wherever it stands now.
    fn land(
        &mut self,
        attack: AttackProfile,
        damage: f32,
        target: UnitId,
        last_seen: Point,
        out_events: &mut Vec<Event>,
    ) {
        let impact = self.unit(target).map_or(last_seen, |unit| unit.position);
        match attack {
            AttackProfile::Single | AttackProfile::Hitscan => {
                let _ = self.damage_unit(target, damage, out_events);
            }
            AttackProfile::Splash { radius } => {
                let caught: Vec<UnitId> = self
                    .units
                    .iter()
                    .filter(|unit| unit.is_alive() && unit.position.distance(impact) <= radius)
                    .map(|unit| unit.id)
                    .collect();
                for id in caught {
                    let _ = self.damage_unit(id, damage, out_events);
                }
            }
            AttackProfile::Chain { jumps, radius } => {
                if !self.damage_unit(target, damage, out_events) {
                    return;
                }
                let mut struck = vec![target];
                let mut from = impact;
                let mut jump_damage = damage;
                for _ in 0..jumps {
                    jump_damage /= 2.0;
                    let Some((id, position)) = self.nearest_unstruck(from, radius, &struck) else {
                        break;
                    };
                    let _ = self.damage_unit(id, jump_damage, out_events);
                    struck.push(id);
                    from = position;
                }
            }
            AttackProfile::Frost {
                slow_factor,
                duration,
            } => {
                if self.damage_unit(target, damage, out_events) {
                    self.chill_unit(target, slow_factor, duration, out_events);
                }
            }
        }
    }

    fn nearest_unstruck(&self, from: Point, radius: f32, struck: &[UnitId]) -> Option<(UnitId, Point)> {
        let mut best: Option<(f32, UnitId, Point)> = None;
        for unit in &self.units {
            if !unit.is_alive() || struck.contains(&unit.id) {
                continue;
            }
            let distance = unit.position.distance(from);
            if distance > radius {
                continue;
            }
            if best.map_or(true, |(closest, _, _)| distance < closest) {
                best = Some((distance, unit.id, unit.position));
            }
        }
        best.map(|(_, id, position)| (id, position))
    }

    /// Deals damage to a live unit; returns `false` when it is gone.
    fn damage_unit(&mut self, id: UnitId, amount: f32, out_events: &mut Vec<Event>) -> bool {
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        if amount > 0.0 {
            let remaining = unit.take_damage(amount);
            out_events.push(Event::UnitDamaged {
                unit: id,
                amount,
                remaining,
            });
        }
        true
    }

    fn chill_unit(&mut self, id: UnitId, factor: f32, duration: Duration, out_events: &mut Vec<Event>) {
        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        match unit.chill(factor, duration) {
            ChillOutcome::Slowed => out_events.push(Event::StatusApplied {
                unit: id,
                effect: StatusEffect::Slowed { factor },
                duration,
            }),
            ChillOutcome::Healed(amount) if amount > 0.0 => {
                out_events.push(Event::UnitHealed { unit: id, amount });
            }
            ChillOutcome::Healed(_) | ChillOutcome::Unaffected => {}
        }
    }

    /// Removes dead units and pays their bounties.
    fn reap(&mut self, out_events: &mut Vec<Event>) {
        let mut index = 0;
        while index < self.units.len() {
            if self.units[index].is_alive() {
                index += 1;
                continue;
            }
            let unit = self.units.remove(index);
            let bounty = self.bonuses.bounty(unit.bounty);
            self.gold = self.gold.saturating_add(bounty);
            self.stats.kills += 1;
            self.stats.gold_earned = self.stats.gold_earned.saturating_add(bounty);
            self.stats.campaign_points = self.stats.campaign_points.saturating_add(unit.campaign_points);
            out_events.push(Event::UnitRemoved {
                unit: unit.id,
                kind: unit.kind,
                cause: RemovalCause::Killed,
            });
            out_events.push(Event::GoldChanged { gold: self.gold });
        }
    }

    fn trigger_slow_event(&mut self, out_events: &mut Vec<Event>) {
        if self.status != SessionStatus::Running || self.gold < SLOW_EVENT_COST {
            out_events.push(Event::SlowEventRejected {
                cost: SLOW_EVENT_COST,
            });
            return;
        }

        self.gold -= SLOW_EVENT_COST;
        self.slow_event_for = SLOW_EVENT_DURATION;
        out_events.push(Event::GoldChanged { gold: self.gold });
        out_events.push(Event::SlowEventStarted {
            duration: SLOW_EVENT_DURATION,
        });

        let ids: Vec<UnitId> = self.units.iter().map(|unit| unit.id).collect();
        for id in ids {
            self.chill_unit(id, SLOW_EVENT_FACTOR, SLOW_EVENT_DURATION, out_events);
        }
    }

    fn daze_unit(&mut self, id: UnitId, duration: Duration, out_events: &mut Vec<Event>) {
        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        if unit.daze(duration) {
            out_events.push(Event::StatusApplied {
                unit: id,
                effect: StatusEffect::Dizzy,
                duration,
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartSession {
            bonuses,
            unlocked_towers,
        } => world.start_session(bonuses, unlocked_towers, out_events),
        Command::InstallPaths {
            layout,
            width,
            height,
        } => world.install_paths(layout, width, height, out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SetPaused { paused } => {
            if world.status != SessionStatus::Defeated {
                let status = if paused {
                    SessionStatus::Paused
                } else {
                    SessionStatus::Running
                };
                world.set_status(status, out_events);
            }
        }
        Command::BeginWave { wave } => {
            world.wave = wave;
            out_events.push(Event::WaveStarted { wave });
        }
        Command::SpawnEnemy { request } => world.spawn(request, out_events),
        Command::PlaceTower { kind, position } => match world.place_tower(kind, position) {
            Ok((tower, snapped)) => {
                debug!(tower = tower.get(), ?kind, "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    kind,
                    position: snapped,
                });
                out_events.push(Event::GoldChanged { gold: world.gold });
            }
            Err(reason) => out_events.push(Event::TowerPlacementRejected {
                kind,
                position,
                reason,
            }),
        },
        Command::UpgradeTower { tower } => match world.upgrade_tower(tower) {
            Ok(level) => {
                out_events.push(Event::TowerUpgraded { tower, level });
                out_events.push(Event::GoldChanged { gold: world.gold });
            }
            Err(reason) => out_events.push(Event::TowerUpgradeRejected { tower, reason }),
        },
        Command::FireProjectile { tower, target } => world.fire(tower, target, out_events),
        Command::TriggerSlowEvent => world.trigger_slow_event(out_events),
        Command::MoveProtector { position } => {
            if world.protector.is_some() {
                world.protector = Some(position);
                out_events.push(Event::ProtectorMoved { position });
            }
        }
        Command::ApplyDizzy { unit, duration } => world.daze_unit(unit, duration, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{SessionStats, World};
    use castle_defence_core::{
        Bonuses, PathLayout, Point, SessionStatus, TowerKind, TowerView, UnitView, WaveNumber,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Whether the session is running, paused or lost.
    #[must_use]
    pub fn status(world: &World) -> SessionStatus {
        world.status
    }

    /// Gold available to the player.
    #[must_use]
    pub fn gold(world: &World) -> u32 {
        world.gold
    }

    /// Lives protecting the castle.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Most recently started wave.
    #[must_use]
    pub fn wave(world: &World) -> WaveNumber {
        world.wave
    }

    /// Modifiers active for the session.
    #[must_use]
    pub fn bonuses(world: &World) -> Bonuses {
        world.bonuses
    }

    /// Tower kinds the player may build.
    #[must_use]
    pub fn unlocked_towers(world: &World) -> Vec<TowerKind> {
        world.unlocked_towers.iter().copied().collect()
    }

    /// Installed path layout, if any.
    #[must_use]
    pub fn layout(world: &World) -> Option<&PathLayout> {
        world.layout.as_ref()
    }

    /// Position of the protector; present once paths are installed.
    #[must_use]
    pub fn protector(world: &World) -> Option<Point> {
        world.protector
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(&world.bonuses))
                .collect(),
        )
    }

    /// Number of projectiles still travelling.
    #[must_use]
    pub fn projectiles_in_flight(world: &World) -> usize {
        world.projectiles.len()
    }

    /// Time left on the slow-time power.
    #[must_use]
    pub fn slow_event_remaining(world: &World) -> Duration {
        world.slow_event_for
    }

    /// Running totals of the session.
    #[must_use]
    pub fn session_stats(world: &World) -> SessionStats {
        world.stats
    }
}
