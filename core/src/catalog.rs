//! Static enemy and tower catalogues.
//!
//! Enemies are plain stat blocks plus a fixed set of [`Behavior`] modules
//! that the world evaluates every tick. Towers are described by a five-level
//! upgrade table and an [`AttackProfile`] that decides how a hit lands.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{SpawnKind, SpawnRequest, WaveNumber};

/// Kinds of enemies that walk the paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline foot soldier.
    Grunt,
    /// Fragile and fast.
    Imp,
    /// Tank that shrugs off frost and splashes towers.
    AngryBeer,
    /// Boss unit that closes every fifth wave.
    Warlord,
}

/// Stats of an enemy scaled to a specific wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Starting and maximum hit points.
    pub max_hp: f32,
    /// Travel speed in pixels per second.
    pub speed: f32,
    /// Gold awarded when the enemy is killed.
    pub bounty: u32,
    /// Campaign points awarded when the enemy is killed.
    pub campaign_points: u32,
}

/// Behaviour module attached to an enemy kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Behavior {
    /// Frost hits and slow events reduce the unit's speed.
    Slowable,
    /// Protector dust makes the unit stagger.
    Dizziable,
    /// Frost hits restore hit points instead of slowing.
    HealsFromFrost {
        /// Hit points restored per frost hit.
        amount: f32,
    },
    /// Periodically disables the nearest tower within range.
    SplashesTowers {
        /// Time between splashes.
        interval: Duration,
        /// Maximum distance to the splashed tower.
        range: f32,
        /// How long the splashed tower stays disabled.
        disable_for: Duration,
    },
}

const GRUNT_BEHAVIORS: &[Behavior] = &[Behavior::Slowable, Behavior::Dizziable];
const BEER_BEHAVIORS: &[Behavior] = &[
    Behavior::Dizziable,
    Behavior::HealsFromFrost { amount: 100.0 },
    Behavior::SplashesTowers {
        interval: Duration::from_secs(15),
        range: 150.0,
        disable_for: Duration::from_secs(10),
    },
];
const WARLORD_BEHAVIORS: &[Behavior] = &[Behavior::Slowable];

impl EnemyKind {
    /// Picks the enemy kind materialised for a spawn request.
    ///
    /// Imps join from wave 3 as every fourth regular spawn and angry beers
    /// from wave 4 as every seventh; everything else is a grunt.
    #[must_use]
    pub fn for_spawn(request: SpawnRequest) -> Self {
        match request.kind {
            SpawnKind::Boss => Self::Warlord,
            SpawnKind::Regular { ordinal } => {
                let wave = request.wave.get();
                if wave >= 4 && ordinal % 7 == 6 {
                    Self::AngryBeer
                } else if wave >= 3 && ordinal % 4 == 3 {
                    Self::Imp
                } else {
                    Self::Grunt
                }
            }
        }
    }

    /// Stats of the enemy when spawned during `wave`.
    #[must_use]
    pub fn stats(self, wave: WaveNumber) -> EnemyStats {
        let w = wave.get() as f32;
        match self {
            Self::Grunt => EnemyStats {
                max_hp: 30.0 + 10.0 * w,
                speed: 70.0 + 3.0 * w,
                bounty: 10,
                campaign_points: 1,
            },
            Self::Imp => EnemyStats {
                max_hp: 15.0 + 5.0 * w,
                speed: 100.0 + 5.0 * w,
                bounty: 10,
                campaign_points: 1,
            },
            Self::AngryBeer => EnemyStats {
                max_hp: 300.0 + 50.0 * w,
                speed: 60.0 + 2.5 * w,
                bounty: 10,
                campaign_points: 3,
            },
            Self::Warlord => EnemyStats {
                max_hp: 6_000.0 + 60.0 * w,
                speed: 10.0 + (1.5 * w).floor(),
                bounty: 100,
                campaign_points: 25,
            },
        }
    }

    /// Behaviour modules attached to the kind.
    #[must_use]
    pub fn behaviors(self) -> &'static [Behavior] {
        match self {
            Self::Grunt | Self::Imp => GRUNT_BEHAVIORS,
            Self::AngryBeer => BEER_BEHAVIORS,
            Self::Warlord => WARLORD_BEHAVIORS,
        }
    }

    /// Reports whether the kind carries a behaviour matching `predicate`.
    #[must_use]
    pub fn has_behavior(self, predicate: impl Fn(&Behavior) -> bool) -> bool {
        self.behaviors().iter().any(predicate)
    }
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Cheap all-rounder, always unlocked.
    Basic,
    /// Very long range, slow, heavy single hits.
    Sniper,
    /// Short range hitscan with a tiny fire interval.
    Rapid,
    /// Explodes on impact, damaging everything nearby.
    Aoe,
    /// Hits jump between nearby enemies.
    Chain,
    /// Slows its target for a while.
    Frost,
}

/// Upgrade tier of a tower, `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerLevel(u8);

impl TowerLevel {
    /// Level every tower is built at.
    pub const FIRST: Self = Self(1);
    /// Highest reachable level.
    pub const MAX: Self = Self(5);

    /// Creates a level, returning `None` outside `1..=5`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::FIRST.0 && value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Numeric value of the level.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Following level, or `None` at the maximum.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

/// Stats of a tower at one upgrade level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerLevelStats {
    /// Targeting radius in pixels.
    pub range: f32,
    /// Minimum time between shots.
    pub fire_interval: Duration,
    /// Damage dealt per hit.
    pub damage: f32,
    /// Gold paid to build (level 1) or upgrade into this level.
    pub cost: u32,
}

const fn level(range: f32, fire_interval_ms: u64, damage: f32, cost: u32) -> TowerLevelStats {
    TowerLevelStats {
        range,
        fire_interval: Duration::from_millis(fire_interval_ms),
        damage,
        cost,
    }
}

const BASIC_LEVELS: [TowerLevelStats; 5] = [
    level(200.0, 3_000, 50.0, 50),
    level(240.0, 2_600, 100.0, 60),
    level(260.0, 2_200, 150.0, 110),
    level(290.0, 1_800, 200.0, 160),
    level(360.0, 1_000, 250.0, 200),
];
const SNIPER_LEVELS: [TowerLevelStats; 5] = [
    level(1_000.0, 3_000, 1_200.0, 200),
    level(1_200.0, 2_800, 1_400.0, 300),
    level(1_400.0, 2_400, 1_600.0, 400),
    level(1_600.0, 2_000, 1_800.0, 500),
    level(2_000.0, 1_500, 2_000.0, 600),
];
const RAPID_LEVELS: [TowerLevelStats; 5] = [
    level(80.0, 8, 100.0, 150),
    level(100.0, 6, 150.0, 180),
    level(120.0, 4, 200.0, 210),
    level(140.0, 2, 250.0, 240),
    level(160.0, 1, 300.0, 270),
];
const AOE_LEVELS: [TowerLevelStats; 5] = [
    level(140.0, 2_000, 500.0, 150),
    level(160.0, 1_800, 800.0, 200),
    level(180.0, 1_600, 1_100.0, 250),
    level(200.0, 1_400, 1_400.0, 300),
    level(240.0, 1_000, 2_000.0, 350),
];
const CHAIN_LEVELS: [TowerLevelStats; 5] = [
    level(800.0, 400, 300.0, 250),
    level(900.0, 2_600, 400.0, 300),
    level(1_000.0, 2_200, 500.0, 400),
    level(1_200.0, 1_800, 600.0, 500),
    level(1_400.0, 1_000, 700.0, 600),
];
const FROST_LEVELS: [TowerLevelStats; 5] = [
    level(200.0, 3_000, 0.0, 200),
    level(240.0, 2_600, 10.0, 300),
    level(260.0, 2_200, 20.0, 400),
    level(290.0, 1_800, 30.0, 500),
    level(360.0, 1_000, 40.0, 600),
];

/// How a tower's hit is applied once it lands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttackProfile {
    /// A projectile that damages only its target.
    Single,
    /// Damage applied on the same tick the tower fires.
    Hitscan,
    /// Damages every enemy within `radius` of the impact.
    Splash {
        /// Blast radius around the impact point.
        radius: f32,
    },
    /// Jumps to the nearest unhit enemy, halving damage per jump.
    Chain {
        /// Additional enemies hit after the primary target.
        jumps: u32,
        /// Maximum distance covered by one jump.
        radius: f32,
    },
    /// Damages and slows the target.
    Frost {
        /// Multiplier applied to the target's speed.
        slow_factor: f32,
        /// How long the slow lasts.
        duration: Duration,
    },
}

impl TowerKind {
    /// Every tower kind in catalogue order.
    pub const ALL: [TowerKind; 6] = [
        Self::Basic,
        Self::Sniper,
        Self::Rapid,
        Self::Aoe,
        Self::Chain,
        Self::Frost,
    ];

    /// Stats of the tower at `level`.
    #[must_use]
    pub fn level_stats(self, level: TowerLevel) -> TowerLevelStats {
        let table = match self {
            Self::Basic => &BASIC_LEVELS,
            Self::Sniper => &SNIPER_LEVELS,
            Self::Rapid => &RAPID_LEVELS,
            Self::Aoe => &AOE_LEVELS,
            Self::Chain => &CHAIN_LEVELS,
            Self::Frost => &FROST_LEVELS,
        };
        table[usize::from(level.get() - 1)]
    }

    /// Gold required to build the tower.
    #[must_use]
    pub fn build_cost(self) -> u32 {
        self.level_stats(TowerLevel::FIRST).cost
    }

    /// How hits from this tower land.
    #[must_use]
    pub const fn attack(self) -> AttackProfile {
        match self {
            Self::Basic | Self::Sniper => AttackProfile::Single,
            Self::Rapid => AttackProfile::Hitscan,
            Self::Aoe => AttackProfile::Splash { radius: 60.0 },
            Self::Chain => AttackProfile::Chain {
                jumps: 3,
                radius: 120.0,
            },
            Self::Frost => AttackProfile::Frost {
                slow_factor: 0.5,
                duration: Duration::from_secs(10),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(wave: u32, ordinal: u32) -> SpawnRequest {
        SpawnRequest {
            wave: WaveNumber::new(wave),
            kind: SpawnKind::Regular { ordinal },
        }
    }

    #[test]
    fn early_waves_only_spawn_grunts() {
        for ordinal in 0..10 {
            assert_eq!(EnemyKind::for_spawn(regular(1, ordinal)), EnemyKind::Grunt);
        }
    }

    #[test]
    fn later_waves_mix_in_imps_and_beers() {
        assert_eq!(EnemyKind::for_spawn(regular(3, 3)), EnemyKind::Imp);
        assert_eq!(EnemyKind::for_spawn(regular(4, 6)), EnemyKind::AngryBeer);
        assert_eq!(EnemyKind::for_spawn(regular(3, 6)), EnemyKind::Grunt);
    }

    #[test]
    fn boss_request_spawns_warlord() {
        let request = SpawnRequest {
            wave: WaveNumber::new(10),
            kind: SpawnKind::Boss,
        };
        assert_eq!(EnemyKind::for_spawn(request), EnemyKind::Warlord);
    }

    #[test]
    fn enemy_stats_scale_with_wave() {
        let grunt = EnemyKind::Grunt.stats(WaveNumber::new(7));
        assert_eq!(grunt.max_hp, 100.0);
        assert_eq!(grunt.speed, 91.0);

        let warlord = EnemyKind::Warlord.stats(WaveNumber::new(5));
        assert_eq!(warlord.max_hp, 6_300.0);
        assert_eq!(warlord.speed, 17.0);
        assert_eq!(warlord.bounty, 100);
    }

    #[test]
    fn angry_beer_heals_from_frost_instead_of_slowing() {
        let kind = EnemyKind::AngryBeer;
        assert!(!kind.has_behavior(|b| matches!(b, Behavior::Slowable)));
        assert!(kind.has_behavior(|b| matches!(b, Behavior::HealsFromFrost { .. })));
    }

    #[test]
    fn tower_levels_are_bounded() {
        assert!(TowerLevel::new(0).is_none());
        assert!(TowerLevel::new(6).is_none());
        assert_eq!(TowerLevel::MAX.next(), None);
        assert_eq!(TowerLevel::FIRST.next(), TowerLevel::new(2));
    }

    #[test]
    fn level_table_matches_catalogue() {
        let sniper = TowerKind::Sniper.level_stats(TowerLevel::MAX);
        assert_eq!(sniper.range, 2_000.0);
        assert_eq!(sniper.fire_interval, Duration::from_millis(1_500));
        assert_eq!(TowerKind::Basic.build_cost(), 50);
        assert_eq!(TowerKind::Frost.build_cost(), 200);
    }
}
