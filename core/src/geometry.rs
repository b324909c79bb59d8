//! Map-space geometry shared by the planner, the world, and targeting systems.

use serde::{Deserialize, Serialize};

/// Location on the map expressed in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point from its horizontal and vertical components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component measured from the left map edge.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component measured from the top map edge.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Moves toward `target` by at most `step`, stopping on the target.
    #[must_use]
    pub fn step_toward(self, target: Point, step: f32) -> Point {
        let distance = self.distance(target);
        if distance <= step || distance <= f32::EPSILON {
            return target;
        }
        let ratio = step / distance;
        Point::new(
            self.x + (target.x - self.x) * ratio,
            self.y + (target.y - self.y) * ratio,
        )
    }

    /// Distance from this point to the segment spanning `start` and `end`.
    #[must_use]
    pub fn distance_to_segment(self, start: Point, end: Point) -> f32 {
        let length_sq = start.distance_squared(end);
        if length_sq <= f32::EPSILON {
            return self.distance(start);
        }
        let projection = ((self.x - start.x) * (end.x - start.x)
            + (self.y - start.y) * (end.y - start.y))
            / length_sq;
        let t = projection.clamp(0.0, 1.0);
        let closest = Point::new(
            start.x + (end.x - start.x) * t,
            start.y + (end.y - start.y) * t,
        );
        self.distance(closest)
    }
}

/// Ordered polyline travelled by enemies from a spawn edge to the castle.
///
/// A path always holds at least two points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
}

impl Path {
    /// Wraps the provided points, returning `None` when fewer than two exist.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self { points })
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// First waypoint, located on the spawn edge.
    #[must_use]
    pub fn start(&self) -> Point {
        self.points[0]
    }

    /// Final waypoint, the castle anchor.
    #[must_use]
    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Iterator over consecutive waypoint pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Total travel length of the path.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.segments().map(|(from, to)| from.distance(to)).sum()
    }

    /// Shortest distance between `point` and any segment of the path.
    #[must_use]
    pub fn distance_to(&self, point: Point) -> f32 {
        self.segments()
            .map(|(from, to)| point.distance_to_segment(from, to))
            .fold(f32::INFINITY, f32::min)
    }

    /// Consumes the path, yielding its waypoints.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

/// Horizontal band in which two paths may ignore lane separation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossingZone {
    center_x: f32,
    width: f32,
}

impl CrossingZone {
    /// Creates a crossing zone centred on `center_x`.
    #[must_use]
    pub const fn new(center_x: f32, width: f32) -> Self {
        Self { center_x, width }
    }

    /// Horizontal centre of the zone.
    #[must_use]
    pub const fn center_x(&self) -> f32 {
        self.center_x
    }

    /// Full width of the zone.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Left boundary of the zone.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.center_x - self.width / 2.0
    }

    /// Right boundary of the zone.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.center_x + self.width / 2.0
    }

    /// Reports whether `x` falls inside the zone, boundaries included.
    #[must_use]
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left() && x <= self.right()
    }
}

/// Vertical band a path is confined to outside crossing zones.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    min_y: f32,
    max_y: f32,
}

impl Lane {
    /// Creates a lane spanning `min_y..=max_y`.
    #[must_use]
    pub const fn new(min_y: f32, max_y: f32) -> Self {
        Self { min_y, max_y }
    }

    /// Upper bound of the lane (smallest y).
    #[must_use]
    pub const fn min_y(&self) -> f32 {
        self.min_y
    }

    /// Lower bound of the lane (largest y).
    #[must_use]
    pub const fn max_y(&self) -> f32 {
        self.max_y
    }

    /// Vertical extent of the lane.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Reports whether `y` lies inside the lane, boundaries included.
    #[must_use]
    pub fn contains(&self, y: f32) -> bool {
        y >= self.min_y && y <= self.max_y
    }

    /// Clamps `y` into the lane.
    #[must_use]
    pub fn clamp(&self, y: f32) -> f32 {
        y.clamp(self.min_y, self.max_y)
    }
}

/// Map edge a path starts from. Every start lies on the `x = 0` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartEdge {
    /// Starts somewhere along the left edge.
    Left,
    /// Starts in the top-left corner of the safe band.
    Top,
    /// Starts in the bottom-left corner of the safe band.
    Bottom,
}

/// Single generated path together with the constraints it was built under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Waypoints from the spawn edge to the castle.
    pub path: Path,
    /// Edge the path starts from.
    pub start_edge: StartEdge,
    /// Lane the path honours outside crossing zones.
    pub lane: Lane,
}

/// Complete output of path generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathLayout {
    routes: Vec<Route>,
    castle: Point,
    crossing_zones: Vec<CrossingZone>,
}

impl PathLayout {
    /// Assembles a layout from its generated parts.
    #[must_use]
    pub fn new(routes: Vec<Route>, castle: Point, crossing_zones: Vec<CrossingZone>) -> Self {
        Self {
            routes,
            castle,
            crossing_zones,
        }
    }

    /// Routes in path-index order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Iterator over the generated paths in path-index order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.routes.iter().map(|route| &route.path)
    }

    /// Path stored at `index`, if any.
    #[must_use]
    pub fn path(&self, index: usize) -> Option<&Path> {
        self.routes.get(index).map(|route| &route.path)
    }

    /// Number of generated paths.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.routes.len()
    }

    /// Shared end point of every path.
    #[must_use]
    pub const fn castle(&self) -> Point {
        self.castle
    }

    /// Zones where lane separation is relaxed.
    #[must_use]
    pub fn crossing_zones(&self) -> &[CrossingZone] {
        &self.crossing_zones
    }

    /// Shortest distance from `point` to any path.
    #[must_use]
    pub fn distance_to_paths(&self, point: Point) -> f32 {
        self.paths()
            .map(|path| path.distance_to(point))
            .fold(f32::INFINITY, f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_requires_two_points() {
        assert!(Path::new(vec![Point::new(0.0, 0.0)]).is_none());
        assert!(Path::new(vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)]).is_some());
    }

    #[test]
    fn path_length_sums_segments() {
        let path = Path::new(vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 40.0),
        ])
        .expect("valid path");
        assert!((path.length() - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn distance_to_segment_projects_onto_interior() {
        let point = Point::new(10.0, 7.0);
        let distance = point.distance_to_segment(Point::new(0.0, 0.0), Point::new(20.0, 0.0));
        assert!((distance - 7.0).abs() < 1e-5);
    }

    #[test]
    fn distance_to_segment_clamps_to_endpoints() {
        let point = Point::new(-3.0, 4.0);
        let distance = point.distance_to_segment(Point::new(0.0, 0.0), Point::new(20.0, 0.0));
        assert!((distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn step_toward_stops_on_target() {
        let start = Point::new(0.0, 0.0);
        let target = Point::new(10.0, 0.0);
        assert_eq!(start.step_toward(target, 25.0), target);
        assert_eq!(start.step_toward(target, 4.0), Point::new(4.0, 0.0));
    }

    #[test]
    fn crossing_zone_contains_its_boundaries() {
        let zone = CrossingZone::new(300.0, 100.0);
        assert!(zone.contains(250.0));
        assert!(zone.contains(350.0));
        assert!(!zone.contains(351.0));
    }

    #[test]
    fn lane_clamps_into_band() {
        let lane = Lane::new(100.0, 200.0);
        assert_eq!(lane.clamp(50.0), 100.0);
        assert_eq!(lane.clamp(250.0), 200.0);
        assert_eq!(lane.clamp(150.0), 150.0);
    }
}
