//! Waypoint accumulation for line-like objects.
//!
//! Direction moves fold into the open segment until an axis is reused or a
//! `then` is seen, so `right 1 up 1` is a single diagonal leg while
//! `right 1 then up 1` is two legs. Heading and compass moves always open a
//! new leg. `to` places an absolute point and closes the leg.

use crate::types::{Direction, Length as Inches, OffsetIn, PtIn, UnitVec};

/// Which coordinates of the open waypoint a move has already written.
#[derive(Debug, Clone, Copy, Default)]
struct CoordFlags {
    value: u8,
}

impl CoordFlags {
    const X_SET: u8 = 1;
    const Y_SET: u8 = 2;
    const BOTH_SET: u8 = 3;

    fn x_is_set(self) -> bool {
        self.value & Self::X_SET != 0
    }

    fn y_is_set(self) -> bool {
        self.value & Self::Y_SET != 0
    }

    fn both_set(self) -> bool {
        self.value == Self::BOTH_SET
    }

    fn mark(&mut self, horizontal: bool) {
        self.value |= if horizontal { Self::X_SET } else { Self::Y_SET };
    }

    fn reset(&mut self) {
        self.value = 0;
    }

    fn set_both(&mut self) {
        self.value = Self::BOTH_SET;
    }
}

#[derive(Debug, Clone)]
pub struct PathBuilder {
    points: Vec<PtIn>,
    flags: CoordFlags,
    then_flag: bool,
    saw_to: bool,
    direction: Direction,
}

impl PathBuilder {
    pub fn new(start: PtIn, direction: Direction) -> Self {
        PathBuilder {
            points: vec![start],
            flags: CoordFlags::default(),
            then_flag: false,
            saw_to: false,
            direction,
        }
    }

    fn current(&self) -> PtIn {
        self.points[self.points.len() - 1]
    }

    fn current_mut(&mut self) -> &mut PtIn {
        let last = self.points.len() - 1;
        &mut self.points[last]
    }

    fn push_point(&mut self) {
        let current = self.current();
        self.points.push(current);
        self.flags.reset();
    }

    /// Open a new waypoint when the previous leg is closed.
    fn begin_move(&mut self) {
        if self.points.len() == 1 || self.then_flag || self.flags.both_set() {
            self.push_point();
        }
        self.then_flag = false;
    }

    pub fn mark_then(&mut self) {
        self.then_flag = true;
    }

    /// Move the start point. Relative moves already recorded follow it
    /// unless an absolute `to` pinned the path.
    pub fn set_start(&mut self, start: PtIn) {
        if self.saw_to {
            self.points[0] = start;
            return;
        }
        let by = start - self.points[0];
        for p in &mut self.points {
            *p = *p + by;
        }
    }

    pub fn add_direction(&mut self, dir: Direction, distance: Inches) {
        self.begin_move();
        let horizontal = dir.is_horizontal();
        let reused = if horizontal {
            self.flags.x_is_set()
        } else {
            self.flags.y_is_set()
        };
        if reused {
            self.push_point();
        }
        let moved = self.current() + dir.unit() * distance;
        *self.current_mut() = moved;
        self.flags.mark(horizontal);
        self.direction = dir;
    }

    /// Move along `dir` until level with `target`.
    pub fn set_even_with(&mut self, dir: Direction, target: PtIn) {
        self.begin_move();
        let horizontal = dir.is_horizontal();
        let reused = if horizontal {
            self.flags.x_is_set()
        } else {
            self.flags.y_is_set()
        };
        if reused {
            self.push_point();
        }
        let p = self.current_mut();
        if horizontal {
            p.x = target.x;
        } else {
            p.y = target.y;
        }
        self.flags.mark(horizontal);
        self.direction = dir;
    }

    /// Move along an arbitrary unit vector. Always a leg of its own.
    pub fn add_vector(&mut self, unit: UnitVec, distance: Inches) {
        self.push_point();
        self.then_flag = false;
        let moved = self.current() + unit * distance;
        *self.current_mut() = moved;
        self.flags.set_both();
        self.direction = nearest_direction(unit);
    }

    /// Compass heading in degrees, 0 is north.
    pub fn add_heading(&mut self, degrees: f64, distance: Inches) {
        self.add_vector(UnitVec::from_heading(degrees), distance);
    }

    /// `to P`: append an absolute point.
    pub fn set_endpoint(&mut self, point: PtIn) {
        if self.points.len() == 1 || self.then_flag || self.flags.both_set() {
            self.push_point();
        }
        *self.current_mut() = point;
        self.flags.set_both();
        self.then_flag = false;
        self.saw_to = true;
    }

    pub fn has_movement(&self) -> bool {
        self.points.len() > 1
    }

    pub fn start(&self) -> PtIn {
        self.points[0]
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The finished waypoints with consecutive duplicates collapsed.
    pub fn build(self) -> Vec<PtIn> {
        let mut out: Vec<PtIn> = Vec::with_capacity(self.points.len());
        for p in self.points {
            let duplicate = out
                .last()
                .is_some_and(|last| (p - *last).dx.abs().raw() < 1e-9 && (p - *last).dy.abs().raw() < 1e-9);
            if !duplicate {
                out.push(p);
            }
        }
        out
    }

    /// Offsets of every waypoint from the start, for `same`.
    pub fn relative(points: &[PtIn]) -> Vec<OffsetIn> {
        match points.first() {
            Some(start) => points.iter().map(|p| *p - *start).collect(),
            None => Vec::new(),
        }
    }
}

/// The layout heading closest to a vector, favouring vertical on ties.
pub fn nearest_direction(unit: UnitVec) -> Direction {
    if unit.dy().abs() >= unit.dx().abs() {
        if unit.dy() >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    } else if unit.dx() > 0.0 {
        Direction::Right
    } else {
        Direction::Left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> PtIn {
        PtIn::inches(x, y)
    }

    fn assert_points(actual: &[PtIn], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (a, (x, y)) in actual.iter().zip(expected) {
            assert!((a.x.raw() - x).abs() < 1e-9, "{actual:?}");
            assert!((a.y.raw() - y).abs() < 1e-9, "{actual:?}");
        }
    }

    // ==== Direction tests ====

    #[test]
    fn single_move() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.add_direction(Direction::Right, Inches(1.0));
        assert_points(&b.build(), &[(0.0, 0.0), (1.0, 0.0)]);
    }

    #[test]
    fn crossing_axes_fold_into_one_leg() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.add_direction(Direction::Right, Inches(1.0));
        b.add_direction(Direction::Up, Inches(1.0));
        assert_points(&b.build(), &[(0.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn then_opens_a_new_leg() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.add_direction(Direction::Right, Inches(1.0));
        b.mark_then();
        b.add_direction(Direction::Up, Inches(1.0));
        assert_eq!(b.direction(), Direction::Up);
        assert_points(&b.build(), &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn reusing_an_axis_opens_a_new_leg() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.add_direction(Direction::Right, Inches(1.0));
        b.add_direction(Direction::Left, Inches(0.5));
        assert_points(&b.build(), &[(0.0, 0.0), (1.0, 0.0), (0.5, 0.0)]);
    }

    #[test]
    fn even_with_sets_one_coordinate() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.add_direction(Direction::Down, Inches(1.0));
        b.mark_then();
        b.set_even_with(Direction::Right, pt(3.0, 7.0));
        assert_points(&b.build(), &[(0.0, 0.0), (0.0, -1.0), (3.0, -1.0)]);
    }

    // ==== Absolute point tests ====

    #[test]
    fn from_translates_relative_moves() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.add_direction(Direction::Right, Inches(1.0));
        b.set_start(pt(2.0, 2.0));
        assert_points(&b.build(), &[(2.0, 2.0), (3.0, 2.0)]);
    }

    #[test]
    fn from_to_is_a_single_segment() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.set_start(pt(1.0, 1.0));
        assert!(!b.has_movement());
        b.set_endpoint(pt(2.0, 3.0));
        b.set_endpoint(pt(4.0, 3.0));
        assert_points(&b.build(), &[(1.0, 1.0), (2.0, 3.0), (4.0, 3.0)]);
    }

    #[test]
    fn heading_moves_are_separate_legs() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.add_heading(90.0, Inches(1.0));
        b.add_heading(180.0, Inches(1.0));
        assert_eq!(b.direction(), Direction::Down);
        assert_points(&b.build(), &[(0.0, 0.0), (1.0, 0.0), (1.0, -1.0)]);
    }

    #[test]
    fn duplicates_collapse() {
        let mut b = PathBuilder::new(pt(0.0, 0.0), Direction::Right);
        b.set_endpoint(pt(0.0, 0.0));
        assert_points(&b.build(), &[(0.0, 0.0)]);
    }

    #[test]
    fn relative_offsets_start_at_zero() {
        let offsets = PathBuilder::relative(&[pt(1.0, 1.0), pt(2.0, 1.5)]);
        assert_eq!(offsets[0], OffsetIn::inches(0.0, 0.0));
        assert_eq!(offsets[1], OffsetIn::inches(1.0, 0.5));
    }
}
