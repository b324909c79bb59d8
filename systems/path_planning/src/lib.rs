#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural generation of the orthogonal paths enemies walk.
//!
//! The planner places a castle on the right map edge, then grows one or two
//! paths from the left edge toward it by alternating horizontal and vertical
//! steps. Paths keep to their own lane except inside crossing zones, never
//! produce segments shorter than the configured minimum, and always enter the
//! castle horizontally. Every coordinate is a whole pixel so segment lengths
//! compare exactly.

mod optimize;

use castle_defence_core::{CrossingZone, Lane, Path, PathLayout, Point, Route, StartEdge};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

pub use optimize::optimize_waypoints;

/// Tuning knobs controlling the shape of generated paths.
#[derive(Clone, Debug)]
pub struct PathConfig {
    /// Distance kept from the map edges; the last `margin` pixels before the castle form the approach.
    pub margin: f32,
    /// Height of the top UI band that paths must avoid.
    pub top_ui_height: f32,
    /// Height of the bottom UI band that paths must avoid.
    pub bottom_ui_height: f32,
    /// Shortest random step, as a fraction of the map dimension along the step.
    pub min_line_fraction: f32,
    /// Longest random step, as a fraction of the map dimension along the step.
    pub max_line_fraction: f32,
    /// No accepted step is shorter than this; also drives waypoint simplification.
    /// Must not exceed half of `margin` so the castle approach can absorb a hook.
    pub min_segment_length: f32,
    /// Minimum gap between the castle and the top of the safe band.
    pub castle_top_inset: f32,
    /// Minimum gap between the castle and the bottom of the safe band.
    pub castle_bottom_inset: f32,
    /// Smallest turn budget drawn per path.
    pub min_turns: u32,
    /// Largest turn budget drawn per path.
    pub max_turns: u32,
    /// Vertical gap kept between the two lanes.
    pub separation_buffer: f32,
    /// Width of each crossing zone.
    pub crossing_zone_width: f32,
    /// Maximum horizontal offset applied to a crossing zone's evenly spaced centre.
    pub crossing_zone_jitter: i32,
    /// Upper bound on the number of crossing zones.
    pub max_crossing_zones: u32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            margin: 50.0,
            top_ui_height: 70.0,
            bottom_ui_height: 90.0,
            min_line_fraction: 0.05,
            max_line_fraction: 0.25,
            min_segment_length: 20.0,
            castle_top_inset: 43.0,
            castle_bottom_inset: 30.0,
            min_turns: 7,
            max_turns: 10,
            separation_buffer: 80.0,
            crossing_zone_width: 100.0,
            crossing_zone_jitter: 50,
            max_crossing_zones: 3,
        }
    }
}

/// Failures reported by path generation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    /// Width or height is zero, negative, or not finite.
    #[error("map dimensions must be positive and finite, got {width}x{height}")]
    InvalidDimensions {
        /// Requested map width.
        width: f32,
        /// Requested map height.
        height: f32,
    },
    /// The area left between the UI bands cannot hold the lanes.
    #[error("map {width}x{height} leaves no room for paths between the UI bands")]
    MapTooSmall {
        /// Requested map width.
        width: f32,
        /// Requested map height.
        height: f32,
    },
    /// Only one or two paths can be generated.
    #[error("cannot generate {requested} paths; one or two are supported")]
    UnsupportedPathCount {
        /// Number of paths that was requested.
        requested: usize,
    },
    /// A path failed to reach the castle within its iteration cap.
    #[error("path {path_index} made no progress after {iterations} iterations")]
    Stalled {
        /// Index of the path being generated.
        path_index: usize,
        /// Iterations spent before giving up.
        iterations: u32,
    },
}

/// Generates path layouts from a seeded random source.
#[derive(Debug)]
pub struct PathPlanner<R = ChaCha8Rng> {
    config: PathConfig,
    rng: R,
}

impl PathPlanner<ChaCha8Rng> {
    /// Creates a planner whose output is fully determined by `seed`.
    #[must_use]
    pub fn from_seed(config: PathConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> PathPlanner<R> {
    /// Creates a planner drawing from the provided random source.
    #[must_use]
    pub fn with_rng(config: PathConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Configuration used by the planner.
    #[must_use]
    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Generates one or two paths, chosen with equal probability.
    ///
    /// Maps whose safe band is too short for two separated lanes always get
    /// a single path.
    pub fn generate_paths(&mut self, width: f32, height: f32) -> Result<PathLayout, PathError> {
        let mut path_count = self.rng.gen_range(1..=2);
        if path_count == 2 {
            let bounds = MapBounds::measure(&self.config, width, height, 1)?;
            if !bounds.fits(&self.config, 2) {
                debug!(width, height, "no room for two lanes, generating one path");
                path_count = 1;
            }
        }
        self.generate(width, height, path_count)
    }

    /// Generates exactly `path_count` paths sharing one castle.
    pub fn generate(
        &mut self,
        width: f32,
        height: f32,
        path_count: usize,
    ) -> Result<PathLayout, PathError> {
        if !(1..=2).contains(&path_count) {
            return Err(PathError::UnsupportedPathCount {
                requested: path_count,
            });
        }

        let bounds = MapBounds::measure(&self.config, width, height, path_count)?;
        let castle = self.place_castle(&bounds);
        let zones = if path_count == 2 {
            self.place_crossing_zones(width)
        } else {
            Vec::new()
        };

        let mut routes = Vec::with_capacity(path_count);
        for path_index in 0..path_count {
            let lane = bounds.lane(path_index, path_count, self.config.separation_buffer);
            let start_edge = self.start_edge(path_index, path_count);
            let start_y = match start_edge {
                StartEdge::Top => bounds.min_y,
                StartEdge::Bottom => bounds.max_y,
                StartEdge::Left => whole_between(&mut self.rng, bounds.min_y, bounds.max_y),
            };
            let turns = self
                .rng
                .gen_range(self.config.min_turns..=self.config.max_turns.max(self.config.min_turns));

            let builder = RouteBuilder {
                config: &self.config,
                bounds: &bounds,
                zones: &zones,
                crossings_enabled: path_count > 1,
                lane,
                castle,
                x: 0.0,
                y: start_y,
                turns_remaining: turns,
                points: vec![Point::new(0.0, start_y)],
            };
            let waypoints = builder.build(&mut self.rng, path_index)?;
            let optimized = optimize_waypoints(&waypoints, self.config.min_segment_length);
            let path = Path::new(optimized).ok_or(PathError::Stalled {
                path_index,
                iterations: 0,
            })?;
            debug!(
                path_index,
                ?start_edge,
                waypoints = path.points().len(),
                length = path.length(),
                "generated path"
            );
            routes.push(Route {
                path,
                start_edge,
                lane,
            });
        }

        debug!(
            paths = routes.len(),
            crossing_zones = zones.len(),
            castle_y = castle.y(),
            "path layout ready"
        );
        Ok(PathLayout::new(routes, castle, zones))
    }

    fn place_castle(&mut self, bounds: &MapBounds) -> Point {
        let low = bounds.min_y + self.config.castle_top_inset;
        let high = (bounds.max_y - self.config.castle_bottom_inset).max(low);
        Point::new(bounds.width, whole_between(&mut self.rng, low, high))
    }

    fn place_crossing_zones(&mut self, width: f32) -> Vec<CrossingZone> {
        let count = self.rng.gen_range(0..=self.config.max_crossing_zones);
        let spacing = width / (count + 2) as f32;
        let jitter = self.config.crossing_zone_jitter.abs();
        (0..count)
            .map(|index| {
                let offset = self.rng.gen_range(-jitter..=jitter) as f32;
                let center = (spacing * (index + 1) as f32).round() + offset;
                CrossingZone::new(center, self.config.crossing_zone_width)
            })
            .collect()
    }

    fn start_edge(&mut self, path_index: usize, path_count: usize) -> StartEdge {
        if path_count > 1 {
            return if path_index == 0 {
                StartEdge::Top
            } else {
                StartEdge::Bottom
            };
        }
        match self.rng.gen_range(0..4) {
            0 => StartEdge::Top,
            1 => StartEdge::Bottom,
            _ => StartEdge::Left,
        }
    }
}

/// Safe band and approach line derived from the map size.
#[derive(Clone, Copy, Debug)]
struct MapBounds {
    width: f32,
    height: f32,
    min_y: f32,
    max_y: f32,
    approach_x: f32,
}

impl MapBounds {
    fn measure(
        config: &PathConfig,
        width: f32,
        height: f32,
        path_count: usize,
    ) -> Result<Self, PathError> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(PathError::InvalidDimensions { width, height });
        }

        let bounds = Self {
            width,
            height,
            min_y: (config.top_ui_height + config.margin).ceil(),
            max_y: (height - config.bottom_ui_height - config.margin).floor(),
            approach_x: (width - config.margin).floor(),
        };

        if !bounds.fits(config, path_count) {
            return Err(PathError::MapTooSmall {
                width: bounds.width,
                height: bounds.height,
            });
        }
        Ok(bounds)
    }

    // One lane must hold the castle plus a finishing jog below it; two lanes
    // also need the separation buffer between them.
    fn fits(&self, config: &PathConfig, path_count: usize) -> bool {
        let min_segment = config.min_segment_length;
        let band_needed = if path_count < 2 {
            (config.castle_top_inset + min_segment).max(2.0 * min_segment)
        } else {
            config.separation_buffer + 2.0 * min_segment
        };
        self.max_y - self.min_y >= band_needed && self.approach_x >= 2.0 * min_segment
    }

    fn lane(&self, path_index: usize, path_count: usize, separation: f32) -> Lane {
        if path_count < 2 {
            return Lane::new(self.min_y, self.max_y);
        }
        let middle = ((self.min_y + self.max_y) / 2.0).floor();
        let half_gap = (separation / 2.0).round();
        if path_index == 0 {
            Lane::new(self.min_y, middle - half_gap)
        } else {
            Lane::new(middle + half_gap, self.max_y)
        }
    }
}

struct RouteBuilder<'a> {
    config: &'a PathConfig,
    bounds: &'a MapBounds,
    zones: &'a [CrossingZone],
    crossings_enabled: bool,
    lane: Lane,
    castle: Point,
    x: f32,
    y: f32,
    turns_remaining: u32,
    points: Vec<Point>,
}

impl RouteBuilder<'_> {
    fn build<R: Rng>(mut self, rng: &mut R, path_index: usize) -> Result<Vec<Point>, PathError> {
        let limit = self.iteration_limit();
        let mut horizontal = true;
        let mut iterations = 0;

        while self.x < self.bounds.approach_x {
            if iterations >= limit {
                return Err(PathError::Stalled {
                    path_index,
                    iterations,
                });
            }
            iterations += 1;

            let moved = if horizontal {
                self.step_horizontal(rng)
            } else {
                self.step_vertical(rng)
            };
            if moved {
                self.turns_remaining = self.turns_remaining.saturating_sub(1);
            }
            horizontal = !horizontal;
        }

        self.finish();
        Ok(self.points)
    }

    // Every horizontal attempt advances by at least one minimum segment.
    fn iteration_limit(&self) -> u32 {
        let advances = (self.bounds.approach_x / self.config.min_segment_length).ceil() as u32;
        2 * advances + 2 * self.config.max_turns + 8
    }

    fn step_horizontal<R: Rng>(&mut self, rng: &mut R) -> bool {
        let min_segment = self.config.min_segment_length;
        let approach_x = self.bounds.approach_x;
        let length = self.line_length(rng, self.bounds.width);

        let limit = if self.lane.contains(self.y) {
            approach_x
        } else {
            self.crossing_exit(self.x).unwrap_or(self.x)
        };

        let mut target = (self.x + length).min(limit);
        if approach_x - target < min_segment {
            target = if limit >= approach_x {
                approach_x
            } else {
                approach_x - min_segment
            };
        }
        if target - self.x < min_segment {
            return false;
        }

        self.x = target;
        self.points.push(Point::new(self.x, self.y));
        true
    }

    fn step_vertical<R: Rng>(&mut self, rng: &mut R) -> bool {
        let min_segment = self.config.min_segment_length;
        let length = self.line_length(rng, self.bounds.height);
        let toward_castle = if self.castle.y() > self.y { 1.0 } else { -1.0 };

        let target = if self.may_cross() {
            let free = if rng.gen_bool(0.5) && (self.castle.y() - self.y).abs() > length {
                self.y + toward_castle * length
            } else {
                let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                self.y + direction * (length * 0.6).round()
            };
            free.clamp(self.bounds.min_y, self.bounds.max_y)
        } else if !self.lane.contains(self.y) {
            let toward_lane = if self.y < self.lane.min_y() { 1.0 } else { -1.0 };
            self.lane.clamp(self.y + toward_lane * length)
        } else if self.turns_remaining > 0 {
            self.lane
                .clamp(self.y + toward_castle * (length * 0.4).round())
        } else {
            self.lane.clamp(self.castle.y())
        };

        if (target - self.y).abs() < min_segment {
            return false;
        }

        self.y = target;
        self.points.push(Point::new(self.x, self.y));
        true
    }

    fn may_cross(&self) -> bool {
        self.crossings_enabled
            && self.turns_remaining > 0
            && self
                .crossing_exit(self.x)
                .map_or(false, |exit| exit - self.x >= self.config.min_segment_length)
    }

    // Furthest x a path may travel outside its lane, starting inside a zone at `x`.
    fn crossing_exit(&self, x: f32) -> Option<f32> {
        let right = self
            .zones
            .iter()
            .filter(|zone| zone.contains(x))
            .map(CrossingZone::right)
            .reduce(f32::max)?;

        let approach_x = self.bounds.approach_x;
        let min_segment = self.config.min_segment_length;
        if right >= approach_x {
            Some(approach_x)
        } else if approach_x - right < min_segment {
            Some(approach_x - min_segment)
        } else {
            Some(right)
        }
    }

    fn line_length<R: Rng>(&self, rng: &mut R, dimension: f32) -> f32 {
        let low = (self.config.min_line_fraction * dimension).round().max(0.0);
        let high = (self.config.max_line_fraction * dimension).round().max(low);
        let length = if self.turns_remaining > 0 {
            rng.gen_range(low as u32..=high as u32) as f32
        } else {
            low
        };
        length.max(self.config.min_segment_length)
    }

    // Aligns with the castle on the approach line, then runs into it horizontally.
    fn finish(&mut self) {
        let min_segment = self.config.min_segment_length;
        let castle = self.castle;
        let offset = castle.y() - self.y;

        if offset.abs() >= min_segment {
            self.points.push(Point::new(self.x, castle.y()));
        } else if offset != 0.0 {
            let overshoot = castle.y() + offset.signum() * min_segment;
            let jog_x = self.x + min_segment;
            self.points.push(Point::new(self.x, overshoot));
            self.points.push(Point::new(jog_x, overshoot));
            self.points.push(Point::new(jog_x, castle.y()));
        }
        self.points.push(castle);
    }
}

fn whole_between<R: Rng>(rng: &mut R, low: f32, high: f32) -> f32 {
    let low = low.ceil() as i64;
    let high = (high.floor() as i64).max(low);
    rng.gen_range(low..=high) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner(seed: u64) -> PathPlanner {
        PathPlanner::from_seed(PathConfig::default(), seed)
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let mut planner = planner(1);
        assert!(matches!(
            planner.generate_paths(0.0, 720.0),
            Err(PathError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            planner.generate_paths(1280.0, -5.0),
            Err(PathError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            planner.generate_paths(f32::NAN, 720.0),
            Err(PathError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn rejects_maps_without_room_for_lanes() {
        let mut planner = planner(1);
        assert!(matches!(
            planner.generate_paths(1280.0, 270.0),
            Err(PathError::MapTooSmall { .. })
        ));
        assert!(matches!(
            planner.generate_paths(401.0, 281.0),
            Err(PathError::MapTooSmall { .. })
        ));
        assert!(matches!(
            planner.generate_paths(60.0, 720.0),
            Err(PathError::MapTooSmall { .. })
        ));
    }

    #[test]
    fn short_maps_fall_back_to_a_single_path() {
        assert!(matches!(
            planner(1).generate(400.0, 330.0, 2),
            Err(PathError::MapTooSmall { .. })
        ));

        for seed in 0..32 {
            let layout = planner(seed)
                .generate_paths(400.0, 330.0)
                .expect("one lane fits");
            assert_eq!(layout.path_count(), 1);
            assert!(layout.crossing_zones().is_empty());
            for point in layout.paths().flat_map(|path| path.points().iter()) {
                assert!((120.0..=190.0).contains(&point.y()), "{point:?} left the band");
            }
        }
    }

    #[test]
    fn rejects_unsupported_path_counts() {
        let mut planner = planner(1);
        assert_eq!(
            planner.generate(1280.0, 720.0, 3),
            Err(PathError::UnsupportedPathCount { requested: 3 })
        );
    }

    #[test]
    fn castle_sits_on_right_edge_inside_safe_band() {
        for seed in 0..32 {
            let layout = planner(seed)
                .generate_paths(1280.0, 720.0)
                .expect("layout");
            let castle = layout.castle();
            assert_eq!(castle.x(), 1280.0);
            assert!(castle.y() >= 120.0 + 43.0);
            assert!(castle.y() <= 580.0 - 30.0);
        }
    }

    #[test]
    fn two_path_layouts_start_top_and_bottom() {
        let layout = planner(9).generate(1280.0, 720.0, 2).expect("layout");
        let routes = layout.routes();
        assert_eq!(routes[0].start_edge, StartEdge::Top);
        assert_eq!(routes[1].start_edge, StartEdge::Bottom);
        assert_eq!(routes[0].path.start(), Point::new(0.0, 120.0));
        assert_eq!(routes[1].path.start(), Point::new(0.0, 580.0));
        assert!(routes[1].lane.min_y() - routes[0].lane.max_y() >= 80.0);
    }

    #[test]
    fn single_path_layouts_have_no_crossing_zones() {
        let layout = planner(4).generate(1280.0, 720.0, 1).expect("layout");
        assert_eq!(layout.path_count(), 1);
        assert!(layout.crossing_zones().is_empty());
        assert_eq!(layout.routes()[0].lane, Lane::new(120.0, 580.0));
    }

    #[test]
    fn crossing_zones_are_bounded() {
        for seed in 0..64 {
            let layout = planner(seed).generate(1280.0, 720.0, 2).expect("layout");
            assert!(layout.crossing_zones().len() <= 3);
            for zone in layout.crossing_zones() {
                assert_eq!(zone.width(), 100.0);
            }
        }
    }

    #[test]
    fn same_seed_produces_same_layout() {
        let first = planner(77).generate_paths(1600.0, 900.0).expect("layout");
        let second = planner(77).generate_paths(1600.0, 900.0).expect("layout");
        assert_eq!(first, second);
    }

    #[test]
    fn paths_enter_the_castle_horizontally() {
        for seed in 0..64 {
            let layout = planner(seed).generate_paths(1280.0, 720.0).expect("layout");
            for path in layout.paths() {
                let points = path.points();
                let last = points[points.len() - 1];
                let before = points[points.len() - 2];
                assert_eq!(last, layout.castle());
                assert_eq!(before.y(), last.y());
                assert!(before.x() < last.x());
            }
        }
    }
}
