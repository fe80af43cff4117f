//! Laid-out objects and their anchors.

use crate::ast::{ClassName, EdgePoint, NthClass, TextAttr, TextSpec};
use crate::lexer::Span;
use crate::render::shapes::{Shape, ShapeKind};
use crate::types::{BoxIn, Direction, Length as Inches, OffsetIn, PtIn, Size};

/// Handle into the object arena. Also the declaration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

impl ObjectId {
    /// 1-based number used in element ids.
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Shape(ClassName),
    Sublist,
}

impl ObjectClass {
    pub fn name(self) -> &'static str {
        match self {
            ObjectClass::Shape(class) => class.as_str(),
            ObjectClass::Sublist => "[]",
        }
    }

    pub fn is_line_like(self) -> bool {
        matches!(self, ObjectClass::Shape(class) if class.is_line_like())
    }

    pub fn matches(self, filter: NthClass) -> bool {
        match (self, filter) {
            (ObjectClass::Shape(a), NthClass::Class(b)) => a == b,
            (ObjectClass::Sublist, NthClass::Sublist) => true,
            _ => false,
        }
    }
}

/// `dashed` and `dotted` with their resolved gap width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dash {
    Dashed(Inches),
    Dotted(Inches),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    /// 0xRRGGBB; `None` means no stroke.
    pub stroke: Option<u32>,
    pub fill: Option<u32>,
    pub thickness: Inches,
    pub dash: Option<Dash>,
    pub invisible: bool,
    pub arrow_start: bool,
    pub arrow_end: bool,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            stroke: Some(0),
            fill: None,
            thickness: Inches(0.015),
            dash: None,
            invisible: false,
            arrow_start: false,
            arrow_end: false,
        }
    }
}

/// Turn a colour value from the variable table into a colour. Negative
/// values mean "none".
pub fn color_from_value(value: f64) -> Option<u32> {
    if value < 0.0 {
        None
    } else {
        Some((value as i64).clamp(0, 0xff_ffff) as u32)
    }
}

/// Vertical slot a label occupies relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextSlot {
    Above2,
    Above,
    Center,
    Below,
    Below2,
}

/// One text label attached to an object.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLabel {
    pub value: String,
    pub above: bool,
    pub below: bool,
    pub center: bool,
    pub ljust: bool,
    pub rjust: bool,
    pub bold: bool,
    pub italic: bool,
    pub mono: bool,
    pub aligned: bool,
    /// Each `big` multiplies by 1.25, each `small` by 0.8.
    pub scale: f64,
}

impl From<&TextSpec> for TextLabel {
    fn from(spec: &TextSpec) -> Self {
        let mut label = TextLabel {
            value: spec.value.clone(),
            above: false,
            below: false,
            center: false,
            ljust: false,
            rjust: false,
            bold: false,
            italic: false,
            mono: false,
            aligned: false,
            scale: 1.0,
        };
        for attr in &spec.attrs {
            match attr {
                TextAttr::Above => label.above = true,
                TextAttr::Below => label.below = true,
                TextAttr::Center => label.center = true,
                TextAttr::LJust => label.ljust = true,
                TextAttr::RJust => label.rjust = true,
                TextAttr::Bold => label.bold = true,
                TextAttr::Italic => label.italic = true,
                TextAttr::Mono => label.mono = true,
                TextAttr::Big => label.scale *= 1.25,
                TextAttr::Small => label.scale *= 0.8,
                TextAttr::Aligned => label.aligned = true,
            }
        }
        label
    }
}

/// A placed object. Geometry is absolute, in inches, Y up.
#[derive(Clone, Debug)]
pub struct Object {
    pub id: ObjectId,
    pub class: ObjectClass,
    pub shape: ShapeKind,
    pub label: Option<String>,
    pub line: u32,
    pub span: Span,
    pub center: PtIn,
    pub width: Inches,
    pub height: Inches,
    /// Corner radius for boxes, radius for circles and arcs, fold size
    /// for files, cap height for cylinders.
    pub radius: Inches,
    /// Waypoints of line-like objects.
    pub path: Vec<PtIn>,
    pub closed: bool,
    pub clockwise: bool,
    pub style: Style,
    pub text: Vec<TextLabel>,
    /// Members of a sublist, in declaration order.
    pub children: Vec<ObjectId>,
    /// Heading when the object was declared.
    pub direction: Direction,
    /// Heading the cursor continues in after this object.
    pub exit_direction: Direction,
}

impl Object {
    pub fn new(id: ObjectId, class: ObjectClass, line: u32, span: Span, direction: Direction) -> Self {
        Object {
            id,
            class,
            shape: ShapeKind::for_class(class),
            label: None,
            line,
            span,
            center: PtIn::ORIGIN,
            width: Inches::ZERO,
            height: Inches::ZERO,
            radius: Inches::ZERO,
            path: Vec::new(),
            closed: false,
            clockwise: false,
            style: Style::default(),
            text: Vec::new(),
            children: Vec::new(),
            direction,
            exit_direction: direction,
        }
    }

    pub fn is_line_like(&self) -> bool {
        self.class.is_line_like()
    }

    pub fn size(&self) -> Size<Inches> {
        Size {
            w: self.width,
            h: self.height,
        }
    }

    /// First text label, used to find unlabelled objects by name.
    pub fn first_text(&self) -> Option<&str> {
        self.text.first().map(|t| t.value.as_str())
    }

    pub fn start(&self) -> PtIn {
        match self.path.first() {
            Some(p) if self.is_line_like() => *p,
            _ => self.anchor(EdgePoint::facing(self.direction.opposite())),
        }
    }

    pub fn end(&self) -> PtIn {
        match self.path.last() {
            Some(p) if self.is_line_like() => *p,
            _ => self.anchor(EdgePoint::facing(self.exit_direction)),
        }
    }

    /// Absolute position of a compass point, `.c`, `.start` or `.end`.
    pub fn anchor(&self, edge: EdgePoint) -> PtIn {
        match edge {
            EdgePoint::Center => self.center,
            EdgePoint::Start => self.start(),
            EdgePoint::End => self.end(),
            _ => self.center + self.anchor_offset(edge),
        }
    }

    /// Offset of a compass point from the center. Line-like objects use
    /// the box around their waypoints.
    pub fn anchor_offset(&self, edge: EdgePoint) -> OffsetIn {
        match edge {
            EdgePoint::Start => self.start() - self.center,
            EdgePoint::End => self.end() - self.center,
            EdgePoint::Center => OffsetIn::default(),
            _ if self.is_line_like() => box_offset(self.width, self.height, Inches::ZERO, edge),
            _ => self.shape.offset(self, edge),
        }
    }

    /// The `n`th waypoint, counting from the front (`from_end == false`)
    /// or the back. 1-based.
    pub fn vertex(&self, n: usize, from_end: bool) -> Option<PtIn> {
        if n == 0 || n > self.path.len() {
            return None;
        }
        let index = if from_end { self.path.len() - n } else { n - 1 };
        self.path.get(index).copied()
    }

    /// Extent of the object's own geometry, without text or arrowheads.
    pub fn bbox(&self) -> BoxIn {
        let mut bbox = BoxIn::new();
        if self.is_line_like() {
            for p in &self.path {
                bbox.expand_point(*p);
            }
        } else {
            bbox.expand_rect(self.center, self.size());
        }
        bbox
    }

    /// Recompute `center`, `width` and `height` from the waypoints.
    pub fn fit_to_path(&mut self) {
        let bbox = self.bbox();
        if bbox.is_empty() {
            return;
        }
        self.center = bbox.center();
        self.width = bbox.width();
        self.height = bbox.height();
    }

    pub fn translate(&mut self, by: OffsetIn) {
        self.center = self.center + by;
        for p in &mut self.path {
            *p = *p + by;
        }
    }
}

/// Compass offsets of a rectangle whose corners are rounded by `rad`.
pub fn box_offset(width: Inches, height: Inches, rad: Inches, edge: EdgePoint) -> OffsetIn {
    let w2 = width.raw() / 2.0;
    let h2 = height.raw() / 2.0;
    let rad = rad.raw().min(w2).min(h2).max(0.0);
    // distance a 45 degree point on the rounded corner sits inside the corner
    let rx = rad * (1.0 - std::f64::consts::FRAC_1_SQRT_2);
    let (dx, dy) = match edge {
        EdgePoint::North => (0.0, h2),
        EdgePoint::South => (0.0, -h2),
        EdgePoint::East => (w2, 0.0),
        EdgePoint::West => (-w2, 0.0),
        EdgePoint::NorthEast => (w2 - rx, h2 - rx),
        EdgePoint::NorthWest => (-w2 + rx, h2 - rx),
        EdgePoint::SouthEast => (w2 - rx, -h2 + rx),
        EdgePoint::SouthWest => (-w2 + rx, -h2 + rx),
        EdgePoint::Center | EdgePoint::Start | EdgePoint::End => (0.0, 0.0),
    };
    OffsetIn::inches(dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(class: ClassName, w: f64, h: f64) -> Object {
        let mut obj = Object::new(
            ObjectId(0),
            ObjectClass::Shape(class),
            1,
            Span::default(),
            Direction::Right,
        );
        obj.width = Inches(w);
        obj.height = Inches(h);
        obj
    }

    #[test]
    fn box_anchors() {
        let mut obj = block(ClassName::Box, 2.0, 1.0);
        obj.center = PtIn::inches(1.0, 1.0);
        assert_eq!(obj.anchor(EdgePoint::North), PtIn::inches(1.0, 1.5));
        assert_eq!(obj.anchor(EdgePoint::West), PtIn::inches(0.0, 1.0));
        assert_eq!(obj.anchor(EdgePoint::SouthEast), PtIn::inches(2.0, 0.5));
        assert_eq!(obj.start(), PtIn::inches(0.0, 1.0));
        assert_eq!(obj.end(), PtIn::inches(2.0, 1.0));
    }

    #[test]
    fn exit_follows_the_exit_direction() {
        let mut obj = block(ClassName::Box, 2.0, 1.0);
        obj.exit_direction = Direction::Down;
        assert_eq!(obj.end(), PtIn::inches(0.0, -0.5));
    }

    #[test]
    fn rounded_corners_pull_diagonals_in() {
        let offset = box_offset(Inches(2.0), Inches(2.0), Inches(1.0), EdgePoint::NorthEast);
        assert!((offset.dx.raw() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn line_geometry_comes_from_waypoints() {
        let mut obj = block(ClassName::Line, 0.0, 0.0);
        obj.path = vec![PtIn::inches(0.0, 0.0), PtIn::inches(2.0, 0.0), PtIn::inches(2.0, 1.0)];
        obj.fit_to_path();
        assert_eq!(obj.center, PtIn::inches(1.0, 0.5));
        assert_eq!(obj.start(), PtIn::inches(0.0, 0.0));
        assert_eq!(obj.end(), PtIn::inches(2.0, 1.0));
        assert_eq!(obj.anchor(EdgePoint::North), PtIn::inches(1.0, 1.0));
        assert_eq!(obj.vertex(2, false), Some(PtIn::inches(2.0, 0.0)));
        assert_eq!(obj.vertex(1, true), Some(PtIn::inches(2.0, 1.0)));
        assert_eq!(obj.vertex(4, false), None);
    }

    #[test]
    fn text_attributes_stack() {
        let label = TextLabel::from(&TextSpec {
            value: "hi".into(),
            attrs: vec![TextAttr::Big, TextAttr::Big, TextAttr::Bold, TextAttr::Above],
        });
        assert!((label.scale - 1.5625).abs() < 1e-12);
        assert!(label.bold && label.above);
    }

    #[test]
    fn negative_colors_mean_none() {
        assert_eq!(color_from_value(-1.0), None);
        assert_eq!(color_from_value(0xff0000 as f64), Some(0xff0000));
    }
}
