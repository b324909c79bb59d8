//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use castle_defence_core::{Bonuses, Point, TowerId, TowerKind, TowerLevel, TowerSnapshot};

/// Edge length of a placement cell in pixels.
pub(crate) const GRID_SIZE: f32 = 32.0;

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Current upgrade level.
    pub(crate) level: TowerLevel,
    /// Centre of the occupied placement cell.
    pub(crate) position: Point,
    /// Time left until the next shot.
    pub(crate) ready_in: Duration,
    /// Time left until the tower recovers from being splashed.
    pub(crate) disabled_for: Duration,
}

impl TowerState {
    pub(crate) fn can_fire(&self) -> bool {
        self.ready_in.is_zero() && self.disabled_for.is_zero()
    }

    pub(crate) fn range(&self, bonuses: &Bonuses) -> f32 {
        bonuses.range(self.kind.level_stats(self.level).range)
    }

    pub(crate) fn damage(&self, bonuses: &Bonuses) -> f32 {
        bonuses.damage(self.kind.level_stats(self.level).damage)
    }

    pub(crate) fn snapshot(&self, bonuses: &Bonuses) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            level: self.level,
            position: self.position,
            range: self.range(bonuses),
            ready_in: self.ready_in,
            disabled_for: self.disabled_for,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a new level-one tower, returning its identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, position: Point) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get() + 1);
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                level: TowerLevel::FIRST,
                position,
                ready_in: Duration::ZERO,
                disabled_for: Duration::ZERO,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn is_occupied(&self, position: Point) -> bool {
        self.entries.values().any(|tower| tower.position == position)
    }

    /// Counts down cooldowns and incapacitation.
    pub(crate) fn tick(&mut self, dt: Duration) {
        for tower in self.entries.values_mut() {
            tower.ready_in = tower.ready_in.saturating_sub(dt);
            tower.disabled_for = tower.disabled_for.saturating_sub(dt);
        }
    }

    /// Tower nearest to `point` within `range`; the lower id wins ties.
    pub(crate) fn nearest_within(&self, point: Point, range: f32) -> Option<TowerId> {
        let mut best: Option<(f32, TowerId)> = None;
        for tower in self.entries.values() {
            let distance = point.distance(tower.position);
            if distance > range {
                continue;
            }
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, tower.id));
            }
        }
        best.map(|(_, id)| id)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_tower_id = TowerId::new(0);
    }
}

/// Snaps `position` to the centre of its placement cell, kept inside the map.
pub(crate) fn snap_to_grid(position: Point, width: f32, height: f32) -> Point {
    let half = GRID_SIZE / 2.0;
    let snap = |value: f32, limit: f32| {
        let centred = (value / GRID_SIZE).floor() * GRID_SIZE + half;
        centred.min(limit - half).max(half)
    };
    Point::new(snap(position.x(), width), snap(position.y(), height))
}
