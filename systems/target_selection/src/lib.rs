#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Nearest-target selection shared by towers and the protector.
//!
//! Selection is isolated behind the [`TargetSelector`] trait so the linear
//! scan can be swapped for a spatial index without touching callers.

use castle_defence_core::{
    Point, SessionStatus, TowerId, TowerTarget, TowerView, UnitId, UnitSnapshot, UnitView,
};

/// Anything that occupies a position on the map.
pub trait Positioned {
    /// Current map position.
    fn position(&self) -> Point;
}

impl Positioned for Point {
    fn position(&self) -> Point {
        *self
    }
}

impl Positioned for UnitSnapshot {
    fn position(&self) -> Point {
        self.position
    }
}

impl<T: Positioned + ?Sized> Positioned for &T {
    fn position(&self) -> Point {
        (**self).position()
    }
}

/// Strategy used to pick a target among candidates.
///
/// Both operations return the first candidate, in iteration order, whose
/// distance is strictly smaller than every candidate before it.
pub trait TargetSelector {
    /// Candidate nearest to `origin` with distance at most `max_range`.
    fn select_nearest<'a, T, I>(&self, origin: Point, candidates: I, max_range: f32) -> Option<&'a T>
    where
        T: Positioned + 'a,
        I: IntoIterator<Item = &'a T>;

    /// Candidate nearest to `anchor`, without any range limit.
    fn select_nearest_to_anchor<'a, T, I>(&self, anchor: Point, candidates: I) -> Option<&'a T>
    where
        T: Positioned + 'a,
        I: IntoIterator<Item = &'a T>;
}

/// Selector that inspects every candidate once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinearScan;

impl TargetSelector for LinearScan {
    fn select_nearest<'a, T, I>(&self, origin: Point, candidates: I, max_range: f32) -> Option<&'a T>
    where
        T: Positioned + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        if max_range.is_nan() || max_range < 0.0 {
            return None;
        }
        let max_distance_sq = max_range * max_range;
        nearest_by(candidates, |candidate| {
            let distance_sq = origin.distance_squared(candidate.position());
            (distance_sq <= max_distance_sq).then_some(distance_sq)
        })
    }

    fn select_nearest_to_anchor<'a, T, I>(&self, anchor: Point, candidates: I) -> Option<&'a T>
    where
        T: Positioned + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        nearest_by(candidates, |candidate| {
            Some(anchor.distance_squared(candidate.position()))
        })
    }
}

fn nearest_by<'a, T, I, F>(candidates: I, mut distance_sq: F) -> Option<&'a T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: FnMut(&T) -> Option<f32>,
{
    let mut best: Option<(f32, &'a T)> = None;
    for candidate in candidates {
        let Some(distance) = distance_sq(candidate) else {
            continue;
        };
        let closer = best.map_or(true, |(best_distance, _)| distance < best_distance);
        if closer {
            best = Some((distance, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

/// Nearest candidate within `max_range` of `origin`, using [`LinearScan`].
#[must_use]
pub fn select_nearest<'a, T>(origin: Point, candidates: &'a [T], max_range: f32) -> Option<&'a T>
where
    T: Positioned,
{
    LinearScan.select_nearest(origin, candidates, max_range)
}

/// Nearest candidate to `anchor`, using [`LinearScan`].
#[must_use]
pub fn select_nearest_to_anchor<T>(anchor: Point, candidates: &[T]) -> Option<&T>
where
    T: Positioned,
{
    LinearScan.select_nearest_to_anchor(anchor, candidates)
}

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting<S = LinearScan> {
    selector: S,
    tower_workspace: Vec<TowerWorkspace>,
    unit_workspace: Vec<UnitCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: TargetSelector> TowerTargeting<S> {
    /// Creates a targeting system driven by a custom selector.
    #[must_use]
    pub fn with_selector(selector: S) -> Self {
        Self {
            selector,
            tower_workspace: Vec::new(),
            unit_workspace: Vec::new(),
        }
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Incapacitated towers receive no assignment.
    pub fn handle(
        &mut self,
        status: SessionStatus,
        towers: &TowerView,
        units: &UnitView,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        if status != SessionStatus::Running {
            return;
        }

        if units.is_empty() {
            return;
        }

        self.prepare_tower_workspace(towers);
        if self.tower_workspace.is_empty() {
            return;
        }

        self.prepare_unit_workspace(units);

        for tower in &self.tower_workspace {
            let chosen = self.selector.select_nearest(
                tower.position,
                &self.unit_workspace,
                tower.range,
            );
            if let Some(candidate) = chosen {
                out.push(TowerTarget {
                    tower: tower.id,
                    unit: candidate.id,
                    tower_position: tower.position,
                    unit_position: candidate.position,
                });
            }
        }
    }

    fn prepare_tower_workspace(&mut self, towers: &TowerView) {
        self.tower_workspace.clear();
        for snapshot in towers.iter() {
            if !snapshot.disabled_for.is_zero() {
                continue;
            }
            self.tower_workspace.push(TowerWorkspace {
                id: snapshot.id,
                position: snapshot.position,
                range: snapshot.range,
            });
        }
    }

    fn prepare_unit_workspace(&mut self, units: &UnitView) {
        self.unit_workspace.clear();
        self.unit_workspace.reserve(units.len());
        for snapshot in units.iter() {
            if snapshot.hp <= 0.0 {
                continue;
            }
            self.unit_workspace.push(UnitCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerWorkspace {
    id: TowerId,
    position: Point,
    range: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct UnitCandidate {
    id: UnitId,
    position: Point,
}

impl Positioned for UnitCandidate {
    fn position(&self) -> Point {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castle_defence_core::{EnemyKind, TowerKind, TowerLevel, TowerSnapshot};
    use std::time::Duration;

    fn unit(id: u32, x: f32, y: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            kind: EnemyKind::Grunt,
            position: Point::new(x, y),
            hp: 40.0,
            max_hp: 40.0,
            speed: 73.0,
            path_index: 0,
        }
    }

    fn tower(id: u32, x: f32, y: f32, range: f32) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Basic,
            level: TowerLevel::FIRST,
            position: Point::new(x, y),
            range,
            ready_in: Duration::ZERO,
            disabled_for: Duration::ZERO,
        }
    }

    #[test]
    fn first_of_equally_near_candidates_wins() {
        let origin = Point::new(0.0, 0.0);
        let candidates = [
            Point::new(150.0, 0.0),
            Point::new(80.0, 0.0),
            Point::new(0.0, 80.0),
        ];
        let chosen = select_nearest(origin, &candidates, 100.0);
        assert_eq!(chosen, Some(&candidates[1]));
        assert_eq!(select_nearest(origin, &candidates[..1], 100.0), None);
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let origin = Point::new(0.0, 0.0);
        let candidates = [Point::new(30.0, 40.0)];
        assert!(select_nearest(origin, &candidates, 50.0).is_some());
        assert!(select_nearest(origin, &candidates, 49.9).is_none());
    }

    #[test]
    fn empty_or_out_of_range_yields_nothing() {
        let origin = Point::new(0.0, 0.0);
        let empty: [Point; 0] = [];
        assert!(select_nearest(origin, &empty, 100.0).is_none());

        let far = [Point::new(500.0, 0.0), Point::new(0.0, 300.0)];
        assert!(select_nearest(origin, &far, 100.0).is_none());
        assert!(select_nearest(origin, &far, -1.0).is_none());
    }

    #[test]
    fn anchor_selection_ignores_range() {
        let castle = Point::new(1000.0, 300.0);
        let units = [unit(1, 100.0, 300.0), unit(2, 900.0, 320.0), unit(3, 920.0, 300.0)];
        let chosen = select_nearest_to_anchor(castle, &units);
        assert_eq!(chosen.map(|unit| unit.id), Some(UnitId::new(3)));

        let empty: [UnitSnapshot; 0] = [];
        assert!(select_nearest_to_anchor(castle, &empty).is_none());
    }

    #[test]
    fn targets_nearest_unit_within_range() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, 100.0, 100.0, 120.0)]);
        let units = UnitView::from_snapshots(vec![
            unit(4, 300.0, 100.0),
            unit(2, 160.0, 100.0),
            unit(3, 100.0, 190.0),
        ]);

        let mut out = Vec::new();
        system.handle(SessionStatus::Running, &towers, &units, &mut out);

        assert_eq!(
            out,
            vec![TowerTarget {
                tower: TowerId::new(1),
                unit: UnitId::new(2),
                tower_position: Point::new(100.0, 100.0),
                unit_position: Point::new(160.0, 100.0),
            }]
        );
    }

    #[test]
    fn smaller_unit_id_is_preferred_when_distances_match() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, 0.0, 0.0, 200.0)]);
        let units = UnitView::from_snapshots(vec![unit(20, 50.0, 0.0), unit(10, 0.0, 50.0)]);

        let mut out = Vec::new();
        system.handle(SessionStatus::Running, &towers, &units, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].unit, UnitId::new(10));
    }

    #[test]
    fn incapacitated_towers_are_skipped() {
        let mut system = TowerTargeting::new();
        let mut stunned = tower(1, 0.0, 0.0, 200.0);
        stunned.disabled_for = Duration::from_secs(3);
        let towers = TowerView::from_snapshots(vec![stunned, tower(2, 10.0, 0.0, 200.0)]);
        let units = UnitView::from_snapshots(vec![unit(1, 40.0, 0.0)]);

        let mut out = Vec::new();
        system.handle(SessionStatus::Running, &towers, &units, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tower, TowerId::new(2));
    }

    #[test]
    fn paused_session_clears_output() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, 0.0, 0.0, 200.0)]);
        let units = UnitView::from_snapshots(vec![unit(1, 40.0, 0.0)]);

        let mut out = vec![TowerTarget {
            tower: TowerId::new(99),
            unit: UnitId::new(99),
            tower_position: Point::new(0.0, 0.0),
            unit_position: Point::new(0.0, 0.0),
        }];
        system.handle(SessionStatus::Paused, &towers, &units, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_collections_produce_no_targets() {
        let mut system = TowerTargeting::new();
        let mut out = Vec::new();

        let towers = TowerView::from_snapshots(Vec::new());
        let units = UnitView::from_snapshots(vec![unit(1, 1.0, 1.0)]);
        system.handle(SessionStatus::Running, &towers, &units, &mut out);
        assert!(out.is_empty());

        let towers = TowerView::from_snapshots(vec![tower(1, 0.0, 0.0, 200.0)]);
        let units = UnitView::from_snapshots(Vec::new());
        system.handle(SessionStatus::Running, &towers, &units, &mut out);
        assert!(out.is_empty());
    }
}
