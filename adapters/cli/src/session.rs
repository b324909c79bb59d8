//! Headless session controller wiring the world to its systems.

use std::time::Duration;

use anyhow::{Context, Result};
use castle_defence_core::{
    Bonuses, Command, Event, PathLayout, PlacementError, Point, SessionStatus, TowerKind,
    TowerTarget,
};
use castle_defence_system_path_planning::{PathConfig, PathPlanner};
use castle_defence_system_protector::{Config as ProtectorConfig, Protector};
use castle_defence_system_target_selection::TowerTargeting;
use castle_defence_system_tower_combat::TowerCombat;
use castle_defence_system_wave_director::{Config as WaveConfig, WaveDirector};
use castle_defence_world::{self as world, query, World};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;

const GRID_SIZE: f32 = 32.0;
/// Auto-placed towers stand between these distances from the nearest path.
const AUTO_SITE_MIN_DISTANCE: f32 = 24.0;
const AUTO_SITE_MAX_DISTANCE: f32 = 64.0;

/// Why a session stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Outcome {
    WavesCleared,
    Defeated,
    TimeLimit,
}

/// Result of a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Summary {
    pub(crate) outcome: Outcome,
    pub(crate) waves_cleared: u32,
    pub(crate) ticks: u64,
    pub(crate) events: u64,
    pub(crate) kills: u32,
    pub(crate) escaped: u32,
    pub(crate) gold: u32,
    pub(crate) lives: u32,
    pub(crate) towers: usize,
    pub(crate) campaign_points: u32,
}

/// Owns the world and drives every system from its events.
#[derive(Debug)]
pub(crate) struct Session {
    config: SessionConfig,
    world: World,
    director: WaveDirector,
    targeting: TowerTargeting,
    combat: TowerCombat,
    protector: Protector,
    targets: Vec<TowerTarget>,
    auto_sites: Vec<Point>,
    next_auto_site: usize,
    auto_placed: u32,
    ticks: u64,
    events: u64,
}

impl Session {
    /// Generates the map, opens the session and starts the first wave.
    pub(crate) fn new(
        config: SessionConfig,
        bonuses: Bonuses,
        unlocked_towers: Vec<TowerKind>,
    ) -> Result<Self> {
        config.validate()?;
        let layout = PathPlanner::from_seed(PathConfig::default(), config.seed)
            .generate_paths(config.width, config.height)
            .context("failed to generate paths")?;
        info!(
            paths = layout.path_count(),
            seed = config.seed,
            "paths generated"
        );

        let auto_sites = auto_sites(&layout, config.width, config.height);
        let protector = Protector::from_seed(ProtectorConfig::default(), config.seed.wrapping_add(1));
        let mut session = Self {
            world: World::new(),
            director: WaveDirector::new(WaveConfig::default()),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            protector,
            targets: Vec::new(),
            auto_sites,
            next_auto_site: 0,
            auto_placed: 0,
            ticks: 0,
            events: 0,
            config,
        };

        let mut commands = vec![
            Command::StartSession {
                bonuses,
                unlocked_towers,
            },
            Command::InstallPaths {
                layout,
                width: session.config.width,
                height: session.config.height,
            },
        ];
        commands.extend(session.config.towers.iter().map(|placement| Command::PlaceTower {
            kind: placement.kind,
            position: placement.position(),
        }));
        session.director.start(&mut commands);

        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut session.world, command, &mut events);
        }
        for event in &events {
            if let Event::TowerPlacementRejected {
                kind,
                position,
                reason,
            } = event
            {
                warn!(?kind, ?position, ?reason, "configured tower rejected");
            }
        }
        session.pump(events);
        Ok(session)
    }

    /// Ticks until the wave cap, defeat, or the time limit.
    pub(crate) fn run(mut self) -> Summary {
        let tick = self.config.tick();
        let max_ticks = self.config.max_ticks();
        let outcome = loop {
            if query::status(&self.world) == SessionStatus::Defeated {
                break Outcome::Defeated;
            }
            if self.waves_cleared() >= self.config.waves {
                break Outcome::WavesCleared;
            }
            if self.ticks >= max_ticks {
                break Outcome::TimeLimit;
            }
            self.step(tick);
        };

        let summary = self.summary(outcome);
        info!(
            ?outcome,
            waves = summary.waves_cleared,
            kills = summary.kills,
            escaped = summary.escaped,
            "session finished"
        );
        summary
    }

    /// Advances the world by one tick and lets every system react.
    pub(crate) fn step(&mut self, dt: Duration) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        self.ticks += 1;
        self.pump(events);
    }

    pub(crate) fn summary(&self, outcome: Outcome) -> Summary {
        let stats = query::session_stats(&self.world);
        Summary {
            outcome,
            waves_cleared: self.waves_cleared(),
            ticks: self.ticks,
            events: self.events,
            kills: stats.kills,
            escaped: stats.escaped,
            gold: query::gold(&self.world),
            lives: query::lives(&self.world),
            towers: query::tower_view(&self.world).iter().count(),
            campaign_points: stats.campaign_points,
        }
    }

    fn waves_cleared(&self) -> u32 {
        self.director.wave().get().saturating_sub(1)
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        loop {
            if events.is_empty() {
                break;
            }
            self.events += events.len() as u64;

            let mut commands = Vec::new();
            self.director.handle(&events, &mut commands);

            let units = query::unit_view(&self.world);
            let castle = query::layout(&self.world).map(PathLayout::castle);
            if let (Some(position), Some(castle)) = (query::protector(&self.world), castle) {
                self.protector
                    .handle(&events, position, castle, &units, &mut commands);
            }

            let time_advanced = events
                .iter()
                .any(|event| matches!(event, Event::TimeAdvanced { .. }));
            if time_advanced {
                let status = query::status(&self.world);
                let towers = query::tower_view(&self.world);
                self.targeting
                    .handle(status, &towers, &units, &mut self.targets);
                self.combat
                    .handle(status, &towers, &self.targets, &mut commands);
            }

            let wave_started = events
                .iter()
                .any(|event| matches!(event, Event::WaveStarted { .. }));
            events.clear();
            if wave_started {
                self.auto_place(&mut events);
            }
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    /// Buys towers next to the paths until the target count or the gold runs out.
    fn auto_place(&mut self, out_events: &mut Vec<Event>) {
        let kind = self.config.auto_tower_kind;
        while self.auto_placed < self.config.auto_towers {
            let Some(&position) = self.auto_sites.get(self.next_auto_site) else {
                return;
            };

            let mut events = Vec::new();
            world::apply(
                &mut self.world,
                Command::PlaceTower { kind, position },
                &mut events,
            );
            let rejection = events.iter().find_map(|event| match event {
                Event::TowerPlacementRejected { reason, .. } => Some(*reason),
                _ => None,
            });
            out_events.extend(events);

            match rejection {
                None => {
                    debug!(?kind, ?position, "tower auto-placed");
                    self.auto_placed += 1;
                    self.next_auto_site += 1;
                }
                Some(PlacementError::InsufficientGold) => return,
                Some(PlacementError::Locked | PlacementError::Inactive) => {
                    warn!(?kind, "auto-placement disabled");
                    self.auto_placed = self.config.auto_towers;
                    return;
                }
                Some(_) => self.next_auto_site += 1,
            }
        }
    }
}

/// Grid cells hugging the paths, closest to the castle first.
fn auto_sites(layout: &PathLayout, width: f32, height: f32) -> Vec<Point> {
    let half = GRID_SIZE / 2.0;
    let mut sites = Vec::new();
    let mut y = half;
    while y <= height - half {
        let mut x = half;
        while x <= width - half {
            let point = Point::new(x, y);
            let distance = layout.distance_to_paths(point);
            if (AUTO_SITE_MIN_DISTANCE..=AUTO_SITE_MAX_DISTANCE).contains(&distance) {
                sites.push(point);
            }
            x += GRID_SIZE;
        }
        y += GRID_SIZE;
    }

    let castle = layout.castle();
    sites.sort_by(|a, b| a.distance(castle).total_cmp(&b.distance(castle)));
    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TowerPlacement;
    use castle_defence_core::{Lane, Path, Route, StartEdge};

    fn quick_config() -> SessionConfig {
        SessionConfig {
            seed: 11,
            waves: 2,
            auto_towers: 3,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn sessions_replay_deterministically() {
        let first = Session::new(quick_config(), Bonuses::default(), Vec::new())
            .expect("session starts")
            .run();
        let second = Session::new(quick_config(), Bonuses::default(), Vec::new())
            .expect("session starts")
            .run();

        assert_eq!(first, second, "replay diverged between runs");
        assert_eq!(first.outcome, Outcome::WavesCleared);
        assert_eq!(first.waves_cleared, 2);
        assert_eq!(first.kills + first.escaped, 7 + 9);
        assert_eq!(first.lives, 20 - first.escaped);
        assert!(first.towers >= 1);
    }

    #[test]
    fn time_limit_stops_a_session() {
        let config = SessionConfig {
            time_limit_secs: 1,
            ..quick_config()
        };
        let summary = Session::new(config, Bonuses::default(), Vec::new())
            .expect("session starts")
            .run();

        assert_eq!(summary.outcome, Outcome::TimeLimit);
        assert_eq!(summary.ticks, 62);
        assert_eq!(summary.waves_cleared, 0);
    }

    #[test]
    fn configured_towers_are_placed_before_auto_placement() {
        let config = SessionConfig {
            auto_towers: 0,
            towers: vec![TowerPlacement {
                kind: TowerKind::Frost,
                x: 10.0,
                y: 10.0,
            }],
            ..quick_config()
        };
        let bonuses = Bonuses {
            starting_gold: 500,
            ..Bonuses::default()
        };
        let session =
            Session::new(config, bonuses, vec![TowerKind::Frost]).expect("session starts");
        let summary = session.summary(Outcome::TimeLimit);

        assert_eq!(summary.towers, 1);
        assert_eq!(summary.gold, 300);
    }

    #[test]
    fn invalid_maps_are_reported() {
        let config = SessionConfig {
            width: 0.0,
            ..quick_config()
        };
        assert!(Session::new(config, Bonuses::default(), Vec::new()).is_err());
    }

    #[test]
    fn auto_sites_hug_the_path_nearest_the_castle_first() {
        let path = Path::new(vec![Point::new(0.0, 208.0), Point::new(640.0, 208.0)])
            .expect("two waypoints");
        let layout = PathLayout::new(
            vec![Route {
                path,
                start_edge: StartEdge::Left,
                lane: Lane::new(150.0, 250.0),
            }],
            Point::new(640.0, 208.0),
            Vec::new(),
        );

        let sites = auto_sites(&layout, 640.0, 400.0);
        assert!(!sites.is_empty());
        assert!(sites.iter().all(|site| {
            let distance = layout.distance_to_paths(*site);
            (24.0..=64.0).contains(&distance)
        }));
        assert_eq!(sites[0].x(), 624.0);
    }
}
