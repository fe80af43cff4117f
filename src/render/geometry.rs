//! Geometry helpers: chop calculations, arrowheads and SVG path data.
//!
//! Chopping and arrowheads work in layout space (inches, Y up) so the
//! global extent can account for them. Path data is built in canvas
//! pixels (Y down).

use std::fmt::Write as _;

use glam::{DVec2, dvec2};

use crate::ast::EdgePoint;
use crate::types::fmt_num;

/// Compass point a ray from the centre points at, in eight 45 degree
/// sectors. `half` normalises non-square shapes so the sectors follow the
/// diagonals.
pub fn compass_toward(delta: DVec2, half: DVec2) -> EdgePoint {
    let dx = if half.x > 0.0 {
        delta.x * half.y / half.x
    } else {
        delta.x
    };
    let dy = delta.y;
    if dx > 0.0 {
        if dy >= 2.414 * dx {
            EdgePoint::North
        } else if dy > 0.414 * dx {
            EdgePoint::NorthEast
        } else if dy > -0.414 * dx {
            EdgePoint::East
        } else if dy > -2.414 * dx {
            EdgePoint::SouthEast
        } else {
            EdgePoint::South
        }
    } else if dx < 0.0 {
        if dy >= -2.414 * dx {
            EdgePoint::North
        } else if dy > -0.414 * dx {
            EdgePoint::NorthWest
        } else if dy > 0.414 * dx {
            EdgePoint::West
        } else if dy > 2.414 * dx {
            EdgePoint::SouthWest
        } else {
            EdgePoint::South
        }
    } else if dy >= 0.0 {
        EdgePoint::North
    } else {
        EdgePoint::South
    }
}

/// Where a ray from `center` toward `toward` leaves the ellipse with the
/// given half axes.
pub fn chop_ellipse(center: DVec2, half: DVec2, toward: DVec2) -> Option<DVec2> {
    if half.x <= 0.0 || half.y <= 0.0 {
        return None;
    }
    let delta = toward - center;
    if delta.length_squared() < f64::EPSILON {
        return None;
    }
    let denom = (delta.x * delta.x) / (half.x * half.x) + (delta.y * delta.y) / (half.y * half.y);
    Some(center + delta / denom.sqrt())
}

/// Move `end` back toward `from` by `amount`, stopping at the midpoint.
pub fn pull_back(from: DVec2, end: DVec2, amount: f64) -> DVec2 {
    let delta = end - from;
    let len = delta.length();
    if len <= 0.0 {
        return end;
    }
    if amount * 2.0 > len {
        return (from + end) * 0.5;
    }
    end - delta / len * amount
}

/// Triangle for an arrowhead whose tip is at `tip`, pointing away from
/// `from`. Returns the tip and the two base corners.
pub fn arrowhead(from: DVec2, tip: DVec2, length: f64, half_width: f64) -> Option<[DVec2; 3]> {
    let unit = (tip - from).try_normalize()?;
    let base = tip - unit * length;
    let perp = dvec2(-unit.y, unit.x) * half_width;
    Some([tip, base + perp, base - perp])
}

/// Control point of the quadratic curve used for arcs: the chord
/// midpoint pushed half a chord sideways. Layout space, Y up.
pub fn arc_control_point(clockwise: bool, from: DVec2, to: DVec2) -> DVec2 {
    let midpoint = (from + to) * 0.5;
    let delta = to - from;
    let perp = dvec2(delta.y, -delta.x);
    if clockwise {
        midpoint - perp * 0.5
    } else {
        midpoint + perp * 0.5
    }
}

/// Point `r` before `to` on the way from `from`, or the midpoint when the
/// segment is shorter than `2r`.
fn radius_midpoint(from: DVec2, to: DVec2, r: f64) -> DVec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= 0.0 {
        to
    } else if r > 0.5 * dist {
        (from + to) * 0.5
    } else {
        to - delta / dist * r
    }
}

/// Fluent builder for the `d` attribute of a `<path>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathData {
    d: String,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(mut self, cmd: char, args: &[f64]) -> Self {
        self.d.push(cmd);
        for (i, arg) in args.iter().enumerate() {
            let sep = if i == 0 { "" } else if i % 2 == 1 { "," } else { " " };
            let _ = write!(self.d, "{sep}{}", fmt_num(*arg));
        }
        self
    }

    pub fn m(self, p: DVec2) -> Self {
        self.command('M', &[p.x, p.y])
    }

    pub fn l(self, p: DVec2) -> Self {
        self.command('L', &[p.x, p.y])
    }

    pub fn q(self, control: DVec2, p: DVec2) -> Self {
        self.command('Q', &[control.x, control.y, p.x, p.y])
    }

    /// Elliptical arc with no rotation and the small-arc flag.
    pub fn a(mut self, rx: f64, ry: f64, sweep: bool, p: DVec2) -> Self {
        let _ = write!(
            self.d,
            "A{},{} 0 0 {} {},{}",
            fmt_num(rx),
            fmt_num(ry),
            u8::from(sweep),
            fmt_num(p.x),
            fmt_num(p.y)
        );
        self
    }

    pub fn z(mut self) -> Self {
        self.d.push('Z');
        self
    }

    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }

    pub fn into_string(self) -> String {
        self.d
    }
}

/// Straight segments through every point.
pub fn polyline_path(points: &[DVec2], close: bool) -> PathData {
    let Some((first, rest)) = points.split_first() else {
        return PathData::new();
    };
    let path = rest.iter().fold(PathData::new().m(*first), |path, p| path.l(*p));
    if close { path.z() } else { path }
}

/// Segments through the waypoints with corners rounded by quadratic
/// curves of radius `r`.
pub fn rounded_polyline_path(points: &[DVec2], r: f64, close: bool) -> PathData {
    if points.len() < 3 || r <= 0.0 {
        return polyline_path(points, close);
    }
    let n = points.len();
    let corners = if close { 1..n } else { 1..n - 1 };
    let first = if close {
        radius_midpoint(points[1], points[0], r)
    } else {
        points[0]
    };
    let mut path = PathData::new().m(first);
    for i in corners {
        let before = radius_midpoint(points[i - 1], points[i], r);
        let after = radius_midpoint(points[(i + 1) % n], points[i], r);
        path = path.l(before).q(points[i], after);
    }
    if close {
        let before = radius_midpoint(points[n - 1], points[0], r);
        path.l(before).q(points[0], first).z()
    } else {
        path.l(points[n - 1])
    }
}

/// Spline through the waypoints: each interior vertex is a control point
/// and the curve passes through the segment midpoints.
pub fn spline_path(points: &[DVec2]) -> PathData {
    if points.len() < 3 {
        return polyline_path(points, false);
    }
    let n = points.len();
    let mut path = PathData::new().m(points[0]);
    for i in 1..n - 1 {
        let end = if i == n - 2 {
            points[n - 1]
        } else {
            (points[i] + points[i + 1]) * 0.5
        };
        if i == 1 {
            path = path.l((points[0] + points[1]) * 0.5);
        }
        path = path.q(points[i], end);
    }
    path
}

/// Box with corners rounded by `r`, given top-left and bottom-right.
pub fn rounded_box_path(tl: DVec2, br: DVec2, r: f64) -> PathData {
    let (x1, y1, x2, y2) = (tl.x, tl.y, br.x, br.y);
    PathData::new()
        .m(dvec2(x1 + r, y2))
        .l(dvec2(x2 - r, y2))
        .a(r, r, false, dvec2(x2, y2 - r))
        .l(dvec2(x2, y1 + r))
        .a(r, r, false, dvec2(x2 - r, y1))
        .l(dvec2(x1 + r, y1))
        .a(r, r, false, dvec2(x1, y1 + r))
        .l(dvec2(x1, y2 - r))
        .a(r, r, false, dvec2(x1 + r, y2))
        .z()
}

/// Diamond through the four edge midpoints.
pub fn diamond_path(center: DVec2, w2: f64, h2: f64) -> PathData {
    PathData::new()
        .m(dvec2(center.x - w2, center.y))
        .l(dvec2(center.x, center.y + h2))
        .l(dvec2(center.x + w2, center.y))
        .l(dvec2(center.x, center.y - h2))
        .z()
}

/// Cylinder body with the bottom arc and both halves of the top ellipse.
pub fn cylinder_path(center: DVec2, w2: f64, h2: f64, ry: f64) -> PathData {
    let top = center.y - h2 + ry;
    let bottom = center.y + h2 - ry;
    let left = center.x - w2;
    let right = center.x + w2;
    PathData::new()
        .m(dvec2(left, top))
        .l(dvec2(left, bottom))
        .a(w2, ry, false, dvec2(right, bottom))
        .l(dvec2(right, top))
        .a(w2, ry, false, dvec2(left, top))
        .a(w2, ry, false, dvec2(right, top))
}

/// File outline with the top-right corner folded, and the crease.
pub fn file_paths(center: DVec2, w2: f64, h2: f64, fold: f64) -> (PathData, PathData) {
    let left = center.x - w2;
    let right = center.x + w2;
    let top = center.y - h2;
    let bottom = center.y + h2;
    let outline = PathData::new()
        .m(dvec2(left, bottom))
        .l(dvec2(right, bottom))
        .l(dvec2(right, top + fold))
        .l(dvec2(right - fold, top))
        .l(dvec2(left, top))
        .z();
    let crease = PathData::new()
        .m(dvec2(right - fold, top))
        .l(dvec2(right - fold, top + fold))
        .l(dvec2(right, top + fold));
    (outline, crease)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==== Chop tests ====

    #[test]
    fn sectors_follow_the_diagonals() {
        let half = dvec2(1.0, 1.0);
        assert_eq!(compass_toward(dvec2(1.0, 0.1), half), EdgePoint::East);
        assert_eq!(compass_toward(dvec2(1.0, 1.0), half), EdgePoint::NorthEast);
        assert_eq!(compass_toward(dvec2(-0.1, -1.0), half), EdgePoint::South);
        assert_eq!(compass_toward(dvec2(-1.0, 0.9), half), EdgePoint::NorthWest);
    }

    #[test]
    fn wide_shapes_stretch_the_sectors() {
        // (2, 1) is the corner of a 4x2 box
        assert_eq!(compass_toward(dvec2(2.0, 1.0), dvec2(2.0, 1.0)), EdgePoint::NorthEast);
    }

    #[test]
    fn ellipse_chop_lands_on_the_boundary() {
        let p = chop_ellipse(DVec2::ZERO, dvec2(2.0, 1.0), dvec2(10.0, 0.0)).unwrap();
        assert!((p - dvec2(2.0, 0.0)).length() < 1e-12);
        let p = chop_ellipse(DVec2::ZERO, dvec2(1.0, 1.0), dvec2(3.0, 3.0)).unwrap();
        assert!((p.length() - 1.0).abs() < 1e-12);
        assert!(chop_ellipse(DVec2::ZERO, dvec2(1.0, 1.0), DVec2::ZERO).is_none());
    }

    #[test]
    fn pull_back_stops_at_the_midpoint() {
        assert_eq!(pull_back(DVec2::ZERO, dvec2(4.0, 0.0), 1.0), dvec2(3.0, 0.0));
        assert_eq!(pull_back(DVec2::ZERO, dvec2(1.0, 0.0), 1.0), dvec2(0.5, 0.0));
    }

    #[test]
    fn arrowhead_points_along_the_segment() {
        let [tip, a, b] = arrowhead(DVec2::ZERO, dvec2(1.0, 0.0), 0.08, 0.03).unwrap();
        assert_eq!(tip, dvec2(1.0, 0.0));
        assert!((a - dvec2(0.92, 0.03)).length() < 1e-12);
        assert!((b - dvec2(0.92, -0.03)).length() < 1e-12);
        assert!(arrowhead(DVec2::ZERO, DVec2::ZERO, 0.08, 0.03).is_none());
    }

    #[test]
    fn arc_control_sits_on_the_turning_corner() {
        // right then up
        let c = arc_control_point(false, DVec2::ZERO, dvec2(1.0, 1.0));
        assert_eq!(c, dvec2(1.0, 0.0));
        // right then down
        let c = arc_control_point(true, DVec2::ZERO, dvec2(1.0, -1.0));
        assert_eq!(c, dvec2(1.0, 0.0));
    }

    // ==== Path data tests ====

    #[test]
    fn path_data_formatting() {
        let d = PathData::new()
            .m(dvec2(1.0, 2.5))
            .l(dvec2(3.0, 4.0))
            .q(dvec2(5.0, 6.0), dvec2(7.0, 8.0))
            .a(2.0, 2.0, false, dvec2(9.0, 10.0))
            .z()
            .into_string();
        insta::assert_snapshot!(d, @"M1,2.5L3,4Q5,6 7,8A2,2 0 0 0 9,10Z");
    }

    #[test]
    fn straight_polylines() {
        let d = polyline_path(&[dvec2(0.0, 0.0), dvec2(10.0, 0.0), dvec2(10.0, 10.0)], true);
        assert_eq!(d.into_string(), "M0,0L10,0L10,10Z");
        assert!(polyline_path(&[], false).is_empty());
    }

    #[test]
    fn spline_passes_through_midpoints() {
        let d = spline_path(&[dvec2(0.0, 0.0), dvec2(10.0, 0.0), dvec2(10.0, 10.0)]);
        assert_eq!(d.into_string(), "M0,0L5,0Q10,0 10,10");
    }

    #[test]
    fn rounded_corners() {
        let d = rounded_polyline_path(&[dvec2(0.0, 0.0), dvec2(10.0, 0.0), dvec2(10.0, 10.0)], 2.0, false);
        assert_eq!(d.into_string(), "M0,0L8,0Q10,0 10,2L10,10");
    }
}
