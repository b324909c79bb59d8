#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Castle Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

mod catalog;
mod geometry;
mod progression;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use catalog::{
    AttackProfile, Behavior, EnemyKind, EnemyStats, TowerKind, TowerLevel, TowerLevelStats,
};
pub use geometry::{CrossingZone, Lane, Path, PathLayout, Point, Route, StartEdge};
pub use progression::{Bonuses, Skill, Unlockable};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Castle Defence.";

/// Describes whether the session currently advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Ticks advance the simulation.
    Running,
    /// Ticks are ignored until the session resumes.
    Paused,
    /// The castle ran out of lives; ticks are ignored for good.
    Defeated,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Resets the economy and unlocks for a fresh session.
    StartSession {
        /// Modifiers granted by campaign skills.
        bonuses: Bonuses,
        /// Tower kinds the player may build.
        unlocked_towers: Vec<TowerKind>,
    },
    /// Installs the paths enemies walk along.
    InstallPaths {
        /// Layout produced by path generation.
        layout: PathLayout,
        /// Width of the playable map in pixels.
        width: f32,
        /// Height of the playable map in pixels.
        height: f32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Pauses or resumes the simulation.
    SetPaused {
        /// Whether ticks should be ignored.
        paused: bool,
    },
    /// Announces that a new wave has begun.
    BeginWave {
        /// Number of the wave that started.
        wave: WaveNumber,
    },
    /// Materialises an enemy at the start of one of the installed paths.
    SpawnEnemy {
        /// Request emitted by the wave director.
        request: SpawnRequest,
    },
    /// Requests placement of a tower at the provided map position.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Requested position; the world snaps it to the placement grid.
        position: Point,
    },
    /// Requests that a tower advance to its next level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests that a tower fire at the provided enemy.
    FireProjectile {
        /// Tower firing the shot.
        tower: TowerId,
        /// Enemy targeted by the shot.
        target: UnitId,
    },
    /// Buys the slow-time power, slowing every enemy for a while.
    TriggerSlowEvent,
    /// Moves the protector to a new position.
    MoveProtector {
        /// Destination of the move.
        position: Point,
    },
    /// Makes an enemy stagger for the provided duration.
    ApplyDizzy {
        /// Enemy affected by the dust.
        unit: UnitId,
        /// How long the effect lasts.
        duration: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new session started with the provided resources.
    SessionStarted {
        /// Gold available to the player.
        gold: u32,
        /// Lives protecting the castle.
        lives: u32,
    },
    /// Confirms that paths were installed.
    PathsInstalled {
        /// Number of paths now available for spawning.
        path_count: usize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces a change of session status.
    StatusChanged {
        /// Status that became active.
        status: SessionStatus,
    },
    /// Announces that a new wave started.
    WaveStarted {
        /// Number of the wave.
        wave: WaveNumber,
    },
    /// Confirms that an enemy entered the map.
    UnitSpawned {
        /// Identifier assigned to the enemy.
        unit: UnitId,
        /// Kind of enemy spawned.
        kind: EnemyKind,
        /// Index of the path the enemy walks.
        path_index: usize,
    },
    /// Reports that a spawn request could not be honoured.
    SpawnRejected {
        /// Request that was dropped.
        request: SpawnRequest,
    },
    /// Reports damage dealt to an enemy.
    UnitDamaged {
        /// Enemy that was hit.
        unit: UnitId,
        /// Damage dealt by the hit.
        amount: f32,
        /// Hit points left after the hit.
        remaining: f32,
    },
    /// Reports that an enemy regained hit points.
    UnitHealed {
        /// Enemy that healed.
        unit: UnitId,
        /// Hit points restored.
        amount: f32,
    },
    /// Reports that a status effect was applied to an enemy.
    StatusApplied {
        /// Enemy affected.
        unit: UnitId,
        /// Effect applied.
        effect: StatusEffect,
        /// How long the effect lasts.
        duration: Duration,
    },
    /// Reports that an enemy left play.
    UnitRemoved {
        /// Enemy removed from the world.
        unit: UnitId,
        /// Kind of the removed enemy.
        kind: EnemyKind,
        /// Why the enemy left play.
        cause: RemovalCause,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Snapped position of the tower.
        position: Point,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Position provided in the placement request.
        position: Point,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower advanced a level.
    TowerUpgraded {
        /// Tower that was upgraded.
        tower: TowerId,
        /// Level reached.
        level: TowerLevel,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Tower targeted by the request.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Reports that a tower was disabled by an enemy ability.
    TowerIncapacitated {
        /// Tower that was disabled.
        tower: TowerId,
        /// How long the tower stays disabled.
        duration: Duration,
    },
    /// Confirms that a tower fired.
    ProjectileFired {
        /// Tower that fired.
        tower: TowerId,
        /// Enemy targeted.
        target: UnitId,
        /// Time until the hit lands; zero for hitscan towers.
        flight: Duration,
    },
    /// Reports the player's gold after it changed.
    GoldChanged {
        /// Gold now available.
        gold: u32,
    },
    /// Reports the castle's lives after they changed.
    LivesChanged {
        /// Lives remaining.
        lives: u32,
    },
    /// Confirms that the slow-time power was bought.
    SlowEventStarted {
        /// How long every enemy stays slowed.
        duration: Duration,
    },
    /// Reports that the slow-time power could not be bought.
    SlowEventRejected {
        /// Gold required for the power.
        cost: u32,
    },
    /// Confirms that the protector moved.
    ProtectorMoved {
        /// Position after the move.
        position: Point,
    },
}

/// Status effects that can be applied to enemies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatusEffect {
    /// Speed multiplied by the factor.
    Slowed {
        /// Multiplier applied to the base speed.
        factor: f32,
    },
    /// Forward progress reduced while the enemy staggers.
    Dizzy,
}

/// Why an enemy left play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Hit points dropped to zero.
    Killed,
    /// Reached the castle.
    Escaped,
    /// Dropped because the session restarted or new paths were installed.
    Cleared,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based wave counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// The opening wave.
    pub const FIRST: Self = Self(1);

    /// Creates a wave number, clamping zero to the first wave.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value == 0 {
            Self::FIRST
        } else {
            Self(value)
        }
    }

    /// Numeric value of the wave.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Every fifth wave is a boss wave.
    #[must_use]
    pub const fn is_boss_wave(self) -> bool {
        self.0 % 5 == 0
    }

    /// Number of spawn requests the wave issues.
    ///
    /// Boss waves issue exactly one; regular waves `6 + floor(1.5 n)`.
    #[must_use]
    pub const fn spawn_count(self) -> u32 {
        if self.is_boss_wave() {
            1
        } else {
            6 + self.0 * 3 / 2
        }
    }
}

/// Flavour of a spawn request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnKind {
    /// Regular enemy; `ordinal` counts spawns within the wave from zero.
    Regular {
        /// Position of the spawn inside its wave.
        ordinal: u32,
    },
    /// The single boss of a boss wave.
    Boss,
}

/// Request to materialise an enemy, emitted by the wave director.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Wave the spawn belongs to.
    pub wave: WaveNumber,
    /// Regular or boss spawn.
    pub kind: SpawnKind,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: UnitId,
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// Current map position.
    pub position: Point,
    /// Remaining hit points.
    pub hp: f32,
    /// Maximum hit points.
    pub max_hp: f32,
    /// Effective speed in pixels per second, effects included.
    pub speed: f32,
    /// Index of the path the enemy walks.
    pub path_index: usize,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemies were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Current upgrade level.
    pub level: TowerLevel,
    /// Snapped map position.
    pub position: Point,
    /// Targeting radius with bonuses applied.
    pub range: f32,
    /// Time left until the tower may fire again.
    pub ready_in: Duration,
    /// Time left until the tower recovers from being disabled.
    pub disabled_for: Duration,
}

impl TowerSnapshot {
    /// Reports whether the tower may fire right now.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.ready_in.is_zero() && self.disabled_for.is_zero()
    }
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Finds the snapshot of `tower`, if it exists.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Target assignment computed for a tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that owns the assignment.
    pub tower: TowerId,
    /// Enemy chosen as the target.
    pub unit: UnitId,
    /// Position of the tower.
    pub tower_position: Point,
    /// Position of the enemy when it was selected.
    pub unit_position: Point,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The tower kind has not been unlocked.
    Locked,
    /// The snapped position falls outside the map.
    OutOfBounds,
    /// The snapped position lies on or next to a path.
    OnPath,
    /// Another tower already occupies the snapped position.
    Occupied,
    /// The player cannot afford the tower.
    InsufficientGold,
    /// The session is not accepting orders.
    Inactive,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The tower already reached its highest level.
    MaxLevel,
    /// The player cannot afford the upgrade.
    InsufficientGold,
}
