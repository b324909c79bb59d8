//! Waypoint simplification applied to every generated path.

use castle_defence_core::Point;

/// Removes interior waypoints that add nothing to an orthogonal polyline.
///
/// A waypoint is dropped when its two adjacent segments run along the same
/// axis in the same direction, or when either adjacent segment is shorter
/// than `min_segment` and its neighbours share an axis (so the polyline stays
/// orthogonal). The first and last points are always kept.
///
/// The pass is stack based: every point is pushed once and popped at most
/// once, so it runs in linear time. Each adjacent triple of the result was
/// checked against exactly the same points it holds afterwards, which makes
/// the function idempotent.
#[must_use]
pub fn optimize_waypoints(points: &[Point], min_segment: f32) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut kept: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        while kept.len() >= 2 {
            let previous = kept[kept.len() - 2];
            let middle = kept[kept.len() - 1];
            if !is_redundant(previous, middle, point, min_segment) {
                break;
            }
            let _ = kept.pop();
        }
        kept.push(point);
    }
    kept
}

fn is_redundant(previous: Point, middle: Point, next: Point, min_segment: f32) -> bool {
    continues_straight(previous, middle, next)
        || (spans_short_segment(previous, middle, next, min_segment)
            && shares_axis(previous, next)
            && previous != next)
}

fn continues_straight(previous: Point, middle: Point, next: Point) -> bool {
    let horizontal = previous.y() == middle.y()
        && middle.y() == next.y()
        && (middle.x() - previous.x()) * (next.x() - middle.x()) > 0.0;
    let vertical = previous.x() == middle.x()
        && middle.x() == next.x()
        && (middle.y() - previous.y()) * (next.y() - middle.y()) > 0.0;
    horizontal || vertical
}

fn spans_short_segment(previous: Point, middle: Point, next: Point, min_segment: f32) -> bool {
    previous.distance(middle) < min_segment || middle.distance(next) < min_segment
}

fn shares_axis(a: Point, b: Point) -> bool {
    a.x() == b.x() || a.y() == b.y()
}
