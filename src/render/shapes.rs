//! Shape types for rendering
//!
//! Each object class maps to a zero-sized shape type that knows how to:
//! - find its compass points
//! - chop a line that ends at its centre
//! - report the extent of its outline
//! - draw itself as SVG
//!
//! The geometry itself lives on [`Object`]; shapes only interpret it.

use enum_dispatch::enum_dispatch;
use glam::{DVec2, dvec2};
use svg::node::element::{Circle, Ellipse, Path, Rectangle};

use crate::ast::{ClassName, EdgePoint};
use crate::layout::object::box_offset;
use crate::layout::{Object, ObjectClass};
use crate::types::{BoxIn, Length as Inches, OffsetIn, PtIn, fmt_num};

use super::geometry::{
    PathData, arc_control_point, chop_ellipse, compass_toward, cylinder_path, diamond_path,
    file_paths, polyline_path, pull_back, rounded_box_path, rounded_polyline_path, spline_path,
};
use super::svg::{DrawCtx, Node, apply, arrowheads, head_size, stroke_attrs};

/// Common behavior for all shapes
#[enum_dispatch]
pub trait Shape {
    /// Offset of a compass point from the centre. Bounding box by default.
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        box_offset(obj.width, obj.height, Inches::ZERO, edge)
    }

    /// Round shapes chop against their outline instead of a compass point.
    fn is_round(&self) -> bool {
        false
    }

    /// Where a line from `toward` to this object's centre should stop.
    fn chop(&self, obj: &Object, toward: PtIn) -> PtIn {
        let center = obj.center.to_dvec2();
        let half = dvec2(obj.width.raw() / 2.0, obj.height.raw() / 2.0);
        let toward = toward.to_dvec2();
        if self.is_round() {
            return chop_ellipse(center, half, toward)
                .map(PtIn::from_dvec2)
                .unwrap_or(obj.center);
        }
        let delta = toward - center;
        if delta == DVec2::ZERO {
            return obj.center;
        }
        obj.anchor(compass_toward(delta, half))
    }

    /// Extent of the outline, without stroke, text or arrowheads.
    fn extent(&self, obj: &Object) -> BoxIn {
        obj.bbox()
    }

    /// The object's own primitives. Text is drawn separately.
    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node>;
}

#[enum_dispatch(Shape)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    BoxShape,
    CircleShape,
    EllipseShape,
    OvalShape,
    DiamondShape,
    CylinderShape,
    FileShape,
    DotShape,
    TextShape,
    LineShape,
    SplineShape,
    ArcShape,
    SublistShape,
}

impl ShapeKind {
    pub fn for_class(class: ObjectClass) -> ShapeKind {
        let ObjectClass::Shape(class) = class else {
            return SublistShape.into();
        };
        match class {
            ClassName::Box => BoxShape.into(),
            ClassName::Circle => CircleShape.into(),
            ClassName::Ellipse => EllipseShape.into(),
            ClassName::Oval => OvalShape.into(),
            ClassName::Diamond => DiamondShape.into(),
            ClassName::Cylinder => CylinderShape.into(),
            ClassName::File => FileShape.into(),
            ClassName::Dot => DotShape.into(),
            ClassName::Text => TextShape.into(),
            ClassName::Line | ClassName::Arrow | ClassName::Move => LineShape.into(),
            ClassName::Spline => SplineShape.into(),
            ClassName::Arc => ArcShape.into(),
        }
    }
}

/// Half width and half height in inches.
fn half(obj: &Object) -> (f64, f64) {
    (obj.width.raw() / 2.0, obj.height.raw() / 2.0)
}

/// Compass points on an ellipse: diagonals sit on the outline.
fn ellipse_offset(obj: &Object, edge: EdgePoint) -> OffsetIn {
    let (w2, h2) = half(obj);
    let unit = edge.unit();
    OffsetIn::inches(unit.dx() * w2, unit.dy() * h2)
}

// ============================================================================
// Block shapes
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxShape;

impl Shape for BoxShape {
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        box_offset(obj.width, obj.height, obj.radius, edge)
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible {
            return Vec::new();
        }
        let (w2, h2) = half(obj);
        let tl = ctx.px(obj.center + OffsetIn::inches(-w2, h2));
        let br = ctx.px(obj.center + OffsetIn::inches(w2, -h2));
        let attrs = stroke_attrs(obj, ctx, true);
        let rad = obj.radius.raw().min(w2).min(h2);
        if rad > 0.0 {
            let d = rounded_box_path(tl, br, ctx.len(Inches(rad)));
            return vec![apply(Path::new().set("d", d.into_string()), &attrs).into()];
        }
        let rect = Rectangle::new()
            .set("x", fmt_num(tl.x))
            .set("y", fmt_num(tl.y))
            .set("width", fmt_num(br.x - tl.x))
            .set("height", fmt_num(br.y - tl.y));
        vec![apply(rect, &attrs).into()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircleShape;

impl Shape for CircleShape {
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        ellipse_offset(obj, edge)
    }

    fn is_round(&self) -> bool {
        true
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible {
            return Vec::new();
        }
        vec![draw_circle(obj, ctx)]
    }
}

fn draw_circle(obj: &Object, ctx: &DrawCtx<'_>) -> Node {
    let c = ctx.px(obj.center);
    let circle = Circle::new()
        .set("cx", fmt_num(c.x))
        .set("cy", fmt_num(c.y))
        .set("r", fmt_num(ctx.len(obj.width) / 2.0));
    apply(circle, &stroke_attrs(obj, ctx, true)).into()
}

/// A small filled circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DotShape;

impl Shape for DotShape {
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        ellipse_offset(obj, edge)
    }

    fn is_round(&self) -> bool {
        true
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible {
            return Vec::new();
        }
        vec![draw_circle(obj, ctx)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EllipseShape;

impl Shape for EllipseShape {
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        ellipse_offset(obj, edge)
    }

    fn is_round(&self) -> bool {
        true
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible {
            return Vec::new();
        }
        let c = ctx.px(obj.center);
        let ellipse = Ellipse::new()
            .set("cx", fmt_num(c.x))
            .set("cy", fmt_num(c.y))
            .set("rx", fmt_num(ctx.len(obj.width) / 2.0))
            .set("ry", fmt_num(ctx.len(obj.height) / 2.0));
        vec![apply(ellipse, &stroke_attrs(obj, ctx, true)).into()]
    }
}

/// Box with fully rounded ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OvalShape;

impl Shape for OvalShape {
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        let (w2, h2) = half(obj);
        box_offset(obj.width, obj.height, Inches(w2.min(h2)), edge)
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible {
            return Vec::new();
        }
        let (w2, h2) = half(obj);
        let tl = ctx.px(obj.center + OffsetIn::inches(-w2, h2));
        let rad = fmt_num(ctx.len(Inches(w2.min(h2))));
        let rect = Rectangle::new()
            .set("x", fmt_num(tl.x))
            .set("y", fmt_num(tl.y))
            .set("width", fmt_num(ctx.len(obj.width)))
            .set("height", fmt_num(ctx.len(obj.height)))
            .set("rx", rad.clone())
            .set("ry", rad);
        vec![apply(rect, &stroke_attrs(obj, ctx, true)).into()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiamondShape;

impl Shape for DiamondShape {
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        let (w2, h2) = half(obj);
        let (w4, h4) = (w2 / 2.0, h2 / 2.0);
        let (dx, dy) = match edge {
            EdgePoint::North => (0.0, h2),
            EdgePoint::South => (0.0, -h2),
            EdgePoint::East => (w2, 0.0),
            EdgePoint::West => (-w2, 0.0),
            EdgePoint::NorthEast => (w4, h4),
            EdgePoint::NorthWest => (-w4, h4),
            EdgePoint::SouthEast => (w4, -h4),
            EdgePoint::SouthWest => (-w4, -h4),
            EdgePoint::Center | EdgePoint::Start | EdgePoint::End => (0.0, 0.0),
        };
        OffsetIn::inches(dx, dy)
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible {
            return Vec::new();
        }
        let d = diamond_path(ctx.px(obj.center), ctx.len(obj.width) / 2.0, ctx.len(obj.height) / 2.0);
        vec![apply(Path::new().set("d", d.into_string()), &stroke_attrs(obj, ctx, true)).into()]
    }
}

/// Cylinder; `radius` is the height of the end caps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CylinderShape;

impl Shape for CylinderShape {
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        let (w2, h2) = half(obj);
        let inner = h2 - obj.radius.raw();
        let (dx, dy) = match edge {
            EdgePoint::North => (0.0, h2),
            EdgePoint::South => (0.0, -h2),
            EdgePoint::East => (w2, 0.0),
            EdgePoint::West => (-w2, 0.0),
            EdgePoint::NorthEast => (w2, inner),
            EdgePoint::NorthWest => (-w2, inner),
            EdgePoint::SouthEast => (w2, -inner),
            EdgePoint::SouthWest => (-w2, -inner),
            EdgePoint::Center | EdgePoint::Start | EdgePoint::End => (0.0, 0.0),
        };
        OffsetIn::inches(dx, dy)
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible {
            return Vec::new();
        }
        let (_, h2) = half(obj);
        let ry = obj.radius.raw().clamp(0.0, h2);
        let d = cylinder_path(
            ctx.px(obj.center),
            ctx.len(obj.width) / 2.0,
            ctx.len(obj.height) / 2.0,
            ctx.len(Inches(ry)),
        );
        vec![apply(Path::new().set("d", d.into_string()), &stroke_attrs(obj, ctx, true)).into()]
    }
}

/// Page with a folded corner; `radius` is the fold size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileShape;

impl FileShape {
    fn fold(obj: &Object) -> f64 {
        let (w2, h2) = half(obj);
        let mn = w2.min(h2);
        obj.radius.raw().min(mn).max(mn * 0.25)
    }
}

impl Shape for FileShape {
    fn offset(&self, obj: &Object, edge: EdgePoint) -> OffsetIn {
        let (w2, h2) = half(obj);
        let rx = FileShape::fold(obj) * 0.5;
        let (dx, dy) = match edge {
            EdgePoint::North => (0.0, h2),
            EdgePoint::South => (0.0, -h2),
            EdgePoint::East => (w2, 0.0),
            EdgePoint::West => (-w2, 0.0),
            EdgePoint::NorthEast => (w2 - rx, h2 - rx),
            EdgePoint::NorthWest => (-w2, h2),
            EdgePoint::SouthEast => (w2, -h2),
            EdgePoint::SouthWest => (-w2, -h2),
            EdgePoint::Center | EdgePoint::Start | EdgePoint::End => (0.0, 0.0),
        };
        OffsetIn::inches(dx, dy)
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible {
            return Vec::new();
        }
        let (outline, crease) = file_paths(
            ctx.px(obj.center),
            ctx.len(obj.width) / 2.0,
            ctx.len(obj.height) / 2.0,
            ctx.len(Inches(FileShape::fold(obj))),
        );
        let attrs = stroke_attrs(obj, ctx, true);
        let mut crease_attrs = stroke_attrs(obj, ctx, false);
        crease_attrs[0].1 = format!("{}-fold", ctx.id);
        vec![
            apply(Path::new().set("d", outline.into_string()), &attrs).into(),
            apply(Path::new().set("d", crease.into_string()), &crease_attrs).into(),
        ]
    }
}

/// Text with no outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextShape;

impl Shape for TextShape {
    fn draw(&self, _obj: &Object, _ctx: &DrawCtx<'_>) -> Vec<Node> {
        Vec::new()
    }
}

/// `[ ... ]`; its members draw themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SublistShape;

impl Shape for SublistShape {
    fn draw(&self, _obj: &Object, _ctx: &DrawCtx<'_>) -> Vec<Node> {
        Vec::new()
    }
}

// ============================================================================
// Line shapes
// ============================================================================

/// Waypoints in layout space with arrowhead ends pulled back by half the
/// head, so the stroke does not poke through the tip.
fn trimmed_path(obj: &Object, ctx: &DrawCtx<'_>, start_from: DVec2, end_from: DVec2) -> Vec<DVec2> {
    let mut points: Vec<DVec2> = obj.path.iter().map(|p| p.to_dvec2()).collect();
    let n = points.len();
    if n < 2 {
        return points;
    }
    let (length, _) = head_size(obj, ctx.settings);
    if obj.style.arrow_start {
        points[0] = pull_back(start_from, points[0], length / 2.0);
    }
    if obj.style.arrow_end {
        points[n - 1] = pull_back(end_from, points[n - 1], length / 2.0);
    }
    points
}

/// `line`, `arrow` and `move`. Corners round off when `radius` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineShape;

impl Shape for LineShape {
    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible || obj.class == ObjectClass::Shape(ClassName::Move) || obj.path.len() < 2 {
            return Vec::new();
        }
        let n = obj.path.len();
        let trimmed = trimmed_path(obj, ctx, obj.path[1].to_dvec2(), obj.path[n - 2].to_dvec2());
        let points: Vec<DVec2> = trimmed.iter().map(|p| ctx.px_vec(*p)).collect();
        let d = rounded_polyline_path(&points, ctx.len(obj.radius), obj.closed);
        let attrs = stroke_attrs(obj, ctx, obj.closed);
        let mut nodes: Vec<Node> = vec![apply(Path::new().set("d", d.into_string()), &attrs).into()];
        nodes.extend(arrowheads(obj, ctx));
        nodes
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplineShape;

impl Shape for SplineShape {
    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        if obj.style.invisible || obj.path.len() < 2 {
            return Vec::new();
        }
        let n = obj.path.len();
        let trimmed = trimmed_path(obj, ctx, obj.path[1].to_dvec2(), obj.path[n - 2].to_dvec2());
        let points: Vec<DVec2> = trimmed.iter().map(|p| ctx.px_vec(*p)).collect();
        let d = if obj.closed {
            polyline_path(&points, true)
        } else {
            spline_path(&points)
        };
        let attrs = stroke_attrs(obj, ctx, obj.closed);
        let mut nodes: Vec<Node> = vec![apply(Path::new().set("d", d.into_string()), &attrs).into()];
        nodes.extend(arrowheads(obj, ctx));
        nodes
    }
}

/// Quarter turn drawn as one quadratic curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArcShape;

impl ArcShape {
    fn control(obj: &Object) -> Option<DVec2> {
        let first = obj.path.first()?.to_dvec2();
        let last = obj.path.last()?.to_dvec2();
        Some(arc_control_point(obj.clockwise, first, last))
    }
}

impl Shape for ArcShape {
    fn extent(&self, obj: &Object) -> BoxIn {
        let mut bbox = obj.bbox();
        if let Some(control) = ArcShape::control(obj) {
            bbox.expand_point(PtIn::from_dvec2(control));
        }
        bbox
    }

    fn draw(&self, obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
        let Some(control) = ArcShape::control(obj) else {
            return Vec::new();
        };
        if obj.style.invisible || obj.path.len() < 2 {
            return Vec::new();
        }
        let trimmed = trimmed_path(obj, ctx, control, control);
        let start = ctx.px_vec(trimmed[0]);
        let end = ctx.px_vec(trimmed[trimmed.len() - 1]);
        let d = PathData::new().m(start).q(ctx.px_vec(control), end);
        let attrs = stroke_attrs(obj, ctx, false);
        let mut nodes: Vec<Node> = vec![apply(Path::new().set("d", d.into_string()), &attrs).into()];
        nodes.extend(arrowheads(obj, ctx));
        nodes
    }
}
