//! Strongly-typed numeric primitives for layout and rendering.
//!
//! Layout works in inches with the Y axis pointing up. Pixels only appear
//! once a [`Scaler`] maps a finished diagram onto the SVG canvas, where Y
//! points down.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Output pixels per inch.
pub const PX_PER_INCH: f64 = 144.0;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is negative when non-negative required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Length in inches, the canonical internal unit.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
#[repr(transparent)]
pub struct Length(pub f64);

impl Length {
    pub const ZERO: Length = Length(0.0);

    #[inline]
    pub const fn inches(val: f64) -> Length {
        Length(val)
    }

    /// Create a Length with validation (rejects NaN/infinite)
    #[inline]
    pub fn try_new(val: f64) -> Result<Length, NumericError> {
        if val.is_nan() {
            Err(NumericError::NaN)
        } else if val.is_infinite() {
            Err(NumericError::Infinite)
        } else {
            Ok(Length(val))
        }
    }

    /// Create a non-negative Length with validation
    #[inline]
    pub fn try_non_negative(val: f64) -> Result<Length, NumericError> {
        let len = Length::try_new(val)?;
        if len.0 < 0.0 {
            Err(NumericError::Negative)
        } else {
            Ok(len)
        }
    }

    #[inline]
    pub fn abs(self) -> Length {
        Length(self.0.abs())
    }

    #[inline]
    pub fn min(self, other: Length) -> Length {
        Length(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Length) -> Length {
        Length(self.0.max(other.0))
    }

    /// Get the raw value in inches
    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }

    /// Ratio of two lengths, `None` when the divisor is zero.
    #[inline]
    pub fn checked_div(self, rhs: Length) -> Option<f64> {
        if rhs.0 == 0.0 {
            None
        } else {
            Some(self.0 / rhs.0)
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Length {
        Length(self.0 + rhs.0)
    }
}

impl Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Length {
        Length(self.0 - rhs.0)
    }
}

impl Mul<f64> for Length {
    type Output = Length;
    fn mul(self, rhs: f64) -> Length {
        Length(self.0 * rhs)
    }
}

impl Div<f64> for Length {
    type Output = Length;
    fn div(self, rhs: f64) -> Length {
        Length(self.0 / rhs)
    }
}

// NOTE: Length / Length goes through checked_div so a zero divisor can't
// silently produce infinity in layout math.

impl Neg for Length {
    type Output = Length;
    fn neg(self) -> Length {
        Length(-self.0)
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Length) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}in", fmt_num(self.0))
    }
}

/// Pixels after applying the output scale
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Px(pub f64);

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", fmt_num(self.0))
    }
}

/// Format a number for SVG output: six significant digits, no trailing
/// zeros, no negative zero.
pub fn fmt_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value == 0.0 || value.abs() < 1e-9 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (5 - magnitude).clamp(0, 9) as usize;
    let mut s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Maps inch coordinates (Y-up) onto the pixel canvas (Y-down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaler {
    pub r_scale: f64,
    /// Inch x that lands on pixel column 0.
    pub origin_x: Length,
    /// Inch y that lands on pixel row 0.
    pub top_y: Length,
}

impl Scaler {
    pub fn new(r_scale: f64, origin_x: Length, top_y: Length) -> Self {
        Scaler {
            r_scale,
            origin_x,
            top_y,
        }
    }

    /// Convert a length in inches to raw pixels.
    #[inline]
    pub fn px(&self, l: Length) -> f64 {
        l.0 * self.r_scale
    }

    pub fn len(&self, l: Length) -> Px {
        Px(self.px(l))
    }

    /// Convert an absolute point into canvas pixels, flipping Y.
    pub fn point(&self, p: PtIn) -> Point<Px> {
        Point {
            x: Px((p.x - self.origin_x).0 * self.r_scale),
            y: Px((self.top_y - p.y).0 * self.r_scale),
        }
    }
}

/// Generic 2D point
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Point { x, y }
    }
}

impl Point<Length> {
    pub const ORIGIN: PtIn = Point {
        x: Length::ZERO,
        y: Length::ZERO,
    };

    pub fn inches(x: f64, y: f64) -> Self {
        Point {
            x: Length(x),
            y: Length(y),
        }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn distance(self, other: Self) -> Length {
        let d = other - self;
        Length(d.dx.0.hypot(d.dy.0))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn to_dvec2(self) -> glam::DVec2 {
        glam::DVec2::new(self.x.0, self.y.0)
    }

    pub fn from_dvec2(v: glam::DVec2) -> Self {
        Point::inches(v.x, v.y)
    }
}

impl fmt::Display for Point<Length> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", fmt_num(self.x.0), fmt_num(self.y.0))
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size<T> {
    pub w: T,
    pub h: T,
}

impl Size<Length> {
    pub fn inches(w: f64, h: f64) -> Self {
        Size {
            w: Length(w),
            h: Length(h),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox<T> {
    pub min: Point<T>,
    pub max: Point<T>,
}

impl Default for BBox<Length> {
    fn default() -> Self {
        Self::new()
    }
}

impl BBox<Length> {
    /// Create an empty bounding box (will expand on first point)
    pub fn new() -> Self {
        BBox {
            min: Point {
                x: Length(f64::MAX),
                y: Length(f64::MAX),
            },
            max: Point {
                x: Length(f64::MIN),
                y: Length(f64::MIN),
            },
        }
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x.0 > self.max.x.0 || self.min.y.0 > self.max.y.0
    }

    pub fn expand_point(&mut self, p: PtIn) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Expand to include a rectangle defined by center and size
    pub fn expand_rect(&mut self, center: PtIn, size: Size<Length>) {
        let hw = size.w / 2.0;
        let hh = size.h / 2.0;
        self.expand_point(Point {
            x: center.x - hw,
            y: center.y - hh,
        });
        self.expand_point(Point {
            x: center.x + hw,
            y: center.y + hh,
        });
    }

    pub fn expand_bbox(&mut self, other: &BoxIn) {
        if !other.is_empty() {
            self.expand_point(other.min);
            self.expand_point(other.max);
        }
    }

    /// Grow every side outward by `amount`.
    pub fn inflate(&mut self, amount: Length) {
        if self.is_empty() {
            return;
        }
        self.min.x -= amount;
        self.min.y -= amount;
        self.max.x += amount;
        self.max.y += amount;
    }

    pub fn contains(&self, p: PtIn, tolerance: Length) -> bool {
        p.x.0 >= self.min.x.0 - tolerance.0
            && p.x.0 <= self.max.x.0 + tolerance.0
            && p.y.0 >= self.min.y.0 - tolerance.0
            && p.y.0 <= self.max.y.0 + tolerance.0
    }

    pub fn width(&self) -> Length {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> Length {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Size<Length> {
        Size {
            w: self.width(),
            h: self.height(),
        }
    }

    pub fn center(&self) -> PtIn {
        Point {
            x: (self.min.x + self.max.x) / 2.0,
            y: (self.min.y + self.max.y) / 2.0,
        }
    }
}

/// A displacement vector; Point + Offset = Point
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Offset<T> {
    pub dx: T,
    pub dy: T,
}

impl<T> Offset<T> {
    pub fn new(dx: T, dy: T) -> Self {
        Offset { dx, dy }
    }
}

impl Offset<Length> {
    pub fn inches(dx: f64, dy: f64) -> Self {
        Offset {
            dx: Length(dx),
            dy: Length(dy),
        }
    }
}

impl Neg for Offset<Length> {
    type Output = Offset<Length>;
    fn neg(self) -> Self {
        Offset {
            dx: -self.dx,
            dy: -self.dy,
        }
    }
}

pub type OffsetIn = Offset<Length>;

/// A unit direction vector in layout space (Y-up).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct UnitVec {
    dx: f64,
    dy: f64,
}

const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

impl UnitVec {
    pub const ZERO: UnitVec = UnitVec { dx: 0.0, dy: 0.0 };
    pub const NORTH: UnitVec = UnitVec { dx: 0.0, dy: 1.0 };
    pub const SOUTH: UnitVec = UnitVec { dx: 0.0, dy: -1.0 };
    pub const EAST: UnitVec = UnitVec { dx: 1.0, dy: 0.0 };
    pub const WEST: UnitVec = UnitVec { dx: -1.0, dy: 0.0 };
    pub const NORTH_EAST: UnitVec = UnitVec {
        dx: FRAC_1_SQRT_2,
        dy: FRAC_1_SQRT_2,
    };
    pub const NORTH_WEST: UnitVec = UnitVec {
        dx: -FRAC_1_SQRT_2,
        dy: FRAC_1_SQRT_2,
    };
    pub const SOUTH_EAST: UnitVec = UnitVec {
        dx: FRAC_1_SQRT_2,
        dy: -FRAC_1_SQRT_2,
    };
    pub const SOUTH_WEST: UnitVec = UnitVec {
        dx: -FRAC_1_SQRT_2,
        dy: -FRAC_1_SQRT_2,
    };

    /// Create a normalized unit vector from components.
    /// Returns None if the input has zero length.
    pub fn normalized(dx: f64, dy: f64) -> Option<Self> {
        let len = dx.hypot(dy);
        if len == 0.0 || !len.is_finite() {
            None
        } else {
            Some(UnitVec {
                dx: dx / len,
                dy: dy / len,
            })
        }
    }

    /// Compass heading in degrees: 0 is north, 90 is east.
    pub fn from_heading(degrees: f64) -> Self {
        let rad = degrees.to_radians();
        UnitVec {
            dx: rad.sin(),
            dy: rad.cos(),
        }
    }

    pub fn dx(self) -> f64 {
        self.dx
    }

    pub fn dy(self) -> f64 {
        self.dy
    }
}

impl Mul<Length> for UnitVec {
    type Output = Offset<Length>;
    fn mul(self, len: Length) -> Offset<Length> {
        Offset {
            dx: Length(self.dx * len.0),
            dy: Length(self.dy * len.0),
        }
    }
}

impl Add<Offset<Length>> for Point<Length> {
    type Output = Point<Length>;
    fn add(self, rhs: Offset<Length>) -> Point<Length> {
        Point {
            x: self.x + rhs.dx,
            y: self.y + rhs.dy,
        }
    }
}

impl Sub<Offset<Length>> for Point<Length> {
    type Output = Point<Length>;
    fn sub(self, rhs: Offset<Length>) -> Point<Length> {
        Point {
            x: self.x - rhs.dx,
            y: self.y - rhs.dy,
        }
    }
}

impl Sub<Point<Length>> for Point<Length> {
    type Output = Offset<Length>;
    fn sub(self, rhs: Point<Length>) -> Offset<Length> {
        Offset {
            dx: self.x - rhs.x,
            dy: self.y - rhs.y,
        }
    }
}

/// The four layout headings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub enum Direction {
    #[default]
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub fn unit(self) -> UnitVec {
        match self {
            Direction::Right => UnitVec::EAST,
            Direction::Down => UnitVec::SOUTH,
            Direction::Left => UnitVec::WEST,
            Direction::Up => UnitVec::NORTH,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
        }
    }

    /// Heading after a quarter turn, clockwise or counter-clockwise.
    pub fn turn(self, clockwise: bool) -> Direction {
        match (self, clockwise) {
            (Direction::Right, true) | (Direction::Left, false) => Direction::Down,
            (Direction::Down, true) | (Direction::Up, false) => Direction::Left,
            (Direction::Left, true) | (Direction::Right, false) => Direction::Up,
            (Direction::Up, true) | (Direction::Down, false) => Direction::Right,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Up => "up",
        })
    }
}

/// Convenient aliases
pub type PtIn = Point<Length>;
pub type PtPx = Point<Px>;
pub type BoxIn = BBox<Length>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Length tests ====================

    #[test]
    fn length_try_new_rejects_nan_and_infinity() {
        assert!(Length::try_new(-1.0).is_ok());
        assert_eq!(Length::try_new(f64::NAN), Err(NumericError::NaN));
        assert_eq!(Length::try_new(f64::INFINITY), Err(NumericError::Infinite));
        assert_eq!(
            Length::try_new(f64::NEG_INFINITY),
            Err(NumericError::Infinite)
        );
    }

    #[test]
    fn length_try_non_negative_rejects_negative() {
        assert!(Length::try_non_negative(0.0).is_ok());
        assert_eq!(Length::try_non_negative(-1.0), Err(NumericError::Negative));
    }

    #[test]
    fn length_arithmetic() {
        let a = Length(3.0);
        let b = Length(2.0);

        assert_eq!(a + b, Length(5.0));
        assert_eq!(a - b, Length(1.0));
        assert_eq!(a * 2.0, Length(6.0));
        assert_eq!(a / 2.0, Length(1.5));
        assert_eq!(-a, Length(-3.0));
        assert_eq!(a.min(b), b);
        assert_eq!(a.max(b), a);
    }

    #[test]
    fn length_checked_div() {
        assert_eq!(Length(6.0).checked_div(Length(2.0)), Some(3.0));
        assert_eq!(Length(6.0).checked_div(Length::ZERO), None);
    }

    // ==================== fmt_num tests ====================

    #[test]
    fn fmt_num_trims_trailing_zeros() {
        assert_eq!(fmt_num(108.0), "108");
        assert_eq!(fmt_num(2.5), "2.5");
        assert_eq!(fmt_num(0.1 + 0.2), "0.3");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt_num(1e-12), "0");
    }

    #[test]
    fn fmt_num_keeps_six_significant_digits() {
        assert_eq!(fmt_num(123.456789), "123.457");
        assert_eq!(fmt_num(0.000123456789), "0.000123457");
        assert_eq!(fmt_num(-7.25), "-7.25");
    }

    // ==================== Scaler tests ====================

    #[test]
    fn scaler_flips_y_axis() {
        let scaler = Scaler::new(PX_PER_INCH, Length(-1.0), Length(2.0));
        let p = scaler.point(Point::inches(0.0, 1.0));
        assert_eq!(p.x, Px(144.0));
        assert_eq!(p.y, Px(144.0));
        assert_eq!(scaler.px(Length(0.5)), 72.0);
    }

    // ==================== UnitVec tests ====================

    #[test]
    fn unitvec_diagonals_are_unit_length() {
        for dir in [
            UnitVec::NORTH_EAST,
            UnitVec::NORTH_WEST,
            UnitVec::SOUTH_EAST,
            UnitVec::SOUTH_WEST,
        ] {
            let len = dir.dx().hypot(dir.dy());
            assert!((len - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn unitvec_normalized() {
        let v = UnitVec::normalized(3.0, 4.0).unwrap();
        assert!((v.dx() - 0.6).abs() < 1e-10);
        assert!((v.dy() - 0.8).abs() < 1e-10);
        assert_eq!(UnitVec::normalized(0.0, 0.0), None);
    }

    #[test]
    fn heading_zero_points_north() {
        let v = UnitVec::from_heading(0.0);
        assert!(v.dx().abs() < 1e-12);
        assert!((v.dy() - 1.0).abs() < 1e-12);
        let east = UnitVec::from_heading(90.0);
        assert!((east.dx() - 1.0).abs() < 1e-12);
    }

    // ==================== Point/Offset tests ====================

    #[test]
    fn point_offset_arithmetic() {
        let p = Point::inches(1.0, 2.0);
        let o = Offset::inches(3.0, 4.0);
        assert_eq!(p + o, Point::inches(4.0, 6.0));
        assert_eq!((p + o) - p, o);
        assert_eq!(p.midpoint(Point::inches(3.0, 4.0)), Point::inches(2.0, 3.0));
        assert_eq!(p.lerp(Point::inches(3.0, 2.0), 0.25), Point::inches(1.5, 2.0));
    }

    // ==================== BBox tests ====================

    #[test]
    fn bbox_new_is_empty() {
        assert!(BBox::<Length>::new().is_empty());
    }

    #[test]
    fn bbox_expand_rect() {
        let mut bb = BBox::new();
        bb.expand_rect(Point::inches(5.0, 5.0), Size::inches(4.0, 2.0));

        assert_eq!(bb.min, Point::inches(3.0, 4.0));
        assert_eq!(bb.max, Point::inches(7.0, 6.0));
        assert_eq!(bb.center(), Point::inches(5.0, 5.0));
        assert_eq!(bb.size(), Size::inches(4.0, 2.0));
    }

    #[test]
    fn bbox_inflate_skips_empty_boxes() {
        let mut empty = BBox::new();
        empty.inflate(Length(1.0));
        assert!(empty.is_empty());

        let mut bb = BBox::new();
        bb.expand_point(Point::ORIGIN);
        bb.inflate(Length(0.5));
        assert_eq!(bb.width(), Length(1.0));
        assert!(bb.contains(Point::inches(0.5, -0.5), Length::ZERO));
    }

    // ==================== Direction tests ====================

    #[test]
    fn direction_turns() {
        assert_eq!(Direction::Right.turn(false), Direction::Up);
        assert_eq!(Direction::Right.turn(true), Direction::Down);
        assert_eq!(Direction::Up.turn(true), Direction::Right);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }
}
