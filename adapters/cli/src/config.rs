//! Session configuration loaded from TOML.

use std::{fs, path::Path, time::Duration};

use anyhow::{ensure, Context, Result};
use castle_defence_core::{Point, TowerKind};
use serde::{Deserialize, Serialize};

/// Tower requested at a fixed position before the first wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerPlacement {
    pub(crate) kind: TowerKind,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl TowerPlacement {
    pub(crate) fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Parameters of a headless session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionConfig {
    /// Map width in pixels.
    pub(crate) width: f32,
    /// Map height in pixels.
    pub(crate) height: f32,
    /// Seed shared by path generation and the protector.
    pub(crate) seed: u64,
    /// Simulated milliseconds per tick.
    pub(crate) tick_ms: u64,
    /// Session ends once this many waves were cleared.
    pub(crate) waves: u32,
    /// Hard limit on simulated time.
    pub(crate) time_limit_secs: u64,
    /// Towers placed before the first wave.
    pub(crate) towers: Vec<TowerPlacement>,
    /// Towers the session keeps buying next to the paths at every wave start.
    pub(crate) auto_towers: u32,
    /// Kind bought by auto-placement.
    pub(crate) auto_tower_kind: TowerKind,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            seed: 0,
            tick_ms: 16,
            waves: 10,
            time_limit_secs: 3_600,
            towers: Vec::new(),
            auto_towers: 4,
            auto_tower_kind: TowerKind::Basic,
        }
    }
}

impl SessionConfig {
    /// Reads and validates a configuration file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid session config at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse session config toml contents")?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.tick_ms > 0, "tick_ms must be positive");
        ensure!(self.waves > 0, "waves must be positive");
        ensure!(self.time_limit_secs > 0, "time_limit_secs must be positive");
        Ok(())
    }

    pub(crate) fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Number of ticks that fit into the time limit.
    pub(crate) fn max_ticks(&self) -> u64 {
        self.time_limit_secs.saturating_mul(1_000) / self.tick_ms.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = SessionConfig::parse("").expect("empty config parses");
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.tick(), Duration::from_millis(16));
        assert_eq!(config.max_ticks(), 225_000);
    }

    #[test]
    fn placements_and_overrides_are_read() {
        let config = SessionConfig::parse(
            r#"
            seed = 42
            waves = 3
            auto_tower_kind = "frost"

            [[towers]]
            kind = "basic"
            x = 100.0
            y = 64.0
        "#,
        )
        .expect("config parses");

        assert_eq!(config.seed, 42);
        assert_eq!(config.waves, 3);
        assert_eq!(config.auto_tower_kind, TowerKind::Frost);
        assert_eq!(
            config.towers,
            vec![TowerPlacement {
                kind: TowerKind::Basic,
                x: 100.0,
                y: 64.0,
            }]
        );
        assert_eq!(config.width, 1280.0);
    }

    #[test]
    fn unknown_keys_and_zero_ticks_are_rejected() {
        assert!(SessionConfig::parse("speed = 3").is_err());
        assert!(SessionConfig::parse("tick_ms = 0").is_err());
    }
}
