//! SVG element helpers: the per-object drawing context, stroke styling,
//! arrowheads and text.

use glam::{DVec2, dvec2};
use svg::node::element::{Polygon, Text};

use crate::ast::ClassName;
use crate::layout::{Dash, Object, ObjectClass, Settings};
use crate::types::{Length as Inches, PtIn, Scaler, fmt_num};

use super::Options;
use super::color::{Role, rgb};
use super::geometry::{arc_control_point, arrowhead};
use super::text::PlacedLabel;

/// Boxed SVG node, as every shape returns a list of them.
pub type Node = Box<dyn svg::Node>;

/// Everything a shape needs to draw one object.
pub struct DrawCtx<'a> {
    pub scaler: Scaler,
    pub settings: &'a Settings,
    pub options: &'a Options,
    /// Element id for the object's main primitive.
    pub id: String,
}

impl DrawCtx<'_> {
    /// Canvas position of a layout point.
    pub fn px(&self, p: PtIn) -> DVec2 {
        let q = self.scaler.point(p);
        dvec2(q.x.0, q.y.0)
    }

    /// Canvas position of a layout-space vector.
    pub fn px_vec(&self, v: DVec2) -> DVec2 {
        self.px(PtIn::from_dvec2(v))
    }

    pub fn len(&self, l: Inches) -> f64 {
        self.scaler.px(l)
    }

    pub fn color(&self, value: u32, role: Role) -> String {
        rgb(value, self.options.dark_mode, role)
    }
}

/// Attribute list, applied to whichever element type a shape builds.
pub type Attrs = Vec<(&'static str, String)>;

pub fn apply<N: svg::Node>(mut node: N, attrs: &[(&'static str, String)]) -> N {
    for (name, value) in attrs {
        node.assign(*name, value.clone());
    }
    node
}

/// Stroke, fill and dash attributes. `filled` is false for open paths.
pub fn stroke_attrs(obj: &Object, ctx: &DrawCtx<'_>, filled: bool) -> Attrs {
    let style = &obj.style;
    let sw = ctx.len(style.thickness);
    let fill = match style.fill {
        Some(fill) if filled => ctx.color(fill, Role::Background),
        _ => "none".to_string(),
    };
    let stroke = match style.stroke {
        Some(stroke) => ctx.color(stroke, Role::Foreground),
        None => "none".to_string(),
    };
    let mut attrs = vec![
        ("id", ctx.id.clone()),
        ("fill", fill),
        ("stroke", stroke),
        ("stroke-width", fmt_num(sw)),
    ];
    match style.dash {
        Some(Dash::Dashed(width)) => {
            let w = fmt_num(ctx.len(width));
            attrs.push(("stroke-dasharray", format!("{w},{w}")));
        }
        Some(Dash::Dotted(width)) => {
            let gap = fmt_num(ctx.len(width));
            attrs.push(("stroke-dasharray", format!("{},{gap}", fmt_num(sw))));
        }
        None => {}
    }
    attrs
}

/// Length and half width of this object's arrowheads, in inches. Heads
/// scale with the stroke relative to the diagram's default thickness.
pub fn head_size(obj: &Object, settings: &Settings) -> (f64, f64) {
    let factor = if settings.thickness.raw() > 0.0 {
        obj.style.thickness.raw() / settings.thickness.raw()
    } else {
        1.0
    };
    (
        settings.arrowht.raw() * factor,
        settings.arrowwid.raw() / 2.0 * factor,
    )
}

/// Points the first and last segments come from: the neighbouring
/// waypoint, or the curve's control point for arcs.
pub fn arrow_tails(obj: &Object) -> Option<(DVec2, DVec2)> {
    let n = obj.path.len();
    if n < 2 {
        return None;
    }
    let first = obj.path[0].to_dvec2();
    let last = obj.path[n - 1].to_dvec2();
    if obj.class == ObjectClass::Shape(ClassName::Arc) {
        let control = arc_control_point(obj.clockwise, first, last);
        return Some((control, control));
    }
    Some((obj.path[1].to_dvec2(), obj.path[n - 2].to_dvec2()))
}

/// Arrowhead triangles in layout space, start head first.
pub fn arrow_polygons(obj: &Object, settings: &Settings) -> Vec<(&'static str, [DVec2; 3])> {
    let Some((start_from, end_from)) = arrow_tails(obj) else {
        return Vec::new();
    };
    let (length, half_width) = head_size(obj, settings);
    let mut heads = Vec::new();
    if obj.style.arrow_start {
        let tip = obj.path[0].to_dvec2();
        if let Some(tri) = arrowhead(start_from, tip, length, half_width) {
            heads.push(("arrow-start", tri));
        }
    }
    if obj.style.arrow_end {
        let tip = obj.path[obj.path.len() - 1].to_dvec2();
        if let Some(tri) = arrowhead(end_from, tip, length, half_width) {
            heads.push(("arrow-end", tri));
        }
    }
    heads
}

/// Filled polygons for the object's arrowheads.
pub fn arrowheads(obj: &Object, ctx: &DrawCtx<'_>) -> Vec<Node> {
    let Some(stroke) = obj.style.stroke else {
        return Vec::new();
    };
    let fill = ctx.color(stroke, Role::Foreground);
    arrow_polygons(obj, ctx.settings)
        .into_iter()
        .map(|(suffix, tri)| {
            let points = tri
                .iter()
                .map(|p| {
                    let q = ctx.px_vec(*p);
                    format!("{},{}", fmt_num(q.x), fmt_num(q.y))
                })
                .collect::<Vec<_>>()
                .join(" ");
            Polygon::new()
                .set("id", format!("{}-{suffix}", ctx.id))
                .set("points", points)
                .set("fill", fill.clone())
                .into()
        })
        .collect()
}

/// One `<text>` element per placed label.
pub fn labels(obj: &Object, placed: &[PlacedLabel], ctx: &DrawCtx<'_>) -> Vec<Node> {
    let fill = ctx.color(obj.style.stroke.unwrap_or(0), Role::Foreground);
    obj.text
        .iter()
        .zip(placed)
        .enumerate()
        .map(|(k, (label, place))| {
            let at = ctx.px(place.anchor);
            let mut text = Text::new(label.value.clone())
                .set("id", format!("{}-text-{}", ctx.id, k + 1))
                .set("x", fmt_num(at.x))
                .set("y", fmt_num(at.y))
                .set("text-anchor", place.align.as_str())
                .set("dominant-baseline", "central")
                .set("fill", fill.clone());
            let scale = label.scale * ctx.settings.fontscale;
            if (scale - 1.0).abs() > 1e-6 {
                text = text.set("font-size", format!("{}%", fmt_num(scale * 100.0)));
            }
            if label.bold {
                text = text.set("font-weight", "bold");
            }
            if label.italic {
                text = text.set("font-style", "italic");
            }
            if label.mono {
                text = text.set("font-family", "monospace");
            }
            if place.angle != 0.0 {
                text = text.set(
                    "transform",
                    format!("rotate({} {},{})", fmt_num(-place.angle), fmt_num(at.x), fmt_num(at.y)),
                );
            }
            text.into()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(settings: &'a Settings, options: &'a Options) -> DrawCtx<'a> {
        DrawCtx {
            scaler: Scaler::new(144.0, Inches(0.0), Inches(1.0)),
            settings,
            options,
            id: "pikdraw-1".to_string(),
        }
    }

    #[test]
    fn canvas_flips_y() {
        let settings = Settings::default();
        let options = Options::default();
        let ctx = ctx(&settings, &options);
        assert_eq!(ctx.px(PtIn::inches(1.0, 1.0)), dvec2(144.0, 0.0));
        assert_eq!(ctx.px(PtIn::inches(0.5, 0.0)), dvec2(72.0, 144.0));
    }

    #[test]
    fn thicker_lines_get_bigger_heads() {
        let d = crate::layout("arrow thick").unwrap();
        let (len, half) = head_size(&d.objects[0], &d.settings);
        assert!((len - 0.12).abs() < 1e-12);
        assert!((half - 0.045).abs() < 1e-12);
    }

    #[test]
    fn double_headed_arrows() {
        let d = crate::layout("line <->").unwrap();
        let heads = arrow_polygons(&d.objects[0], &d.settings);
        assert_eq!(heads.len(), 2);
        assert_eq!(heads[0].0, "arrow-start");
        assert_eq!(heads[0].1[0], dvec2(0.0, 0.0));
        assert_eq!(heads[1].1[0], dvec2(0.5, 0.0));
    }

    #[test]
    fn dashes_use_the_gap_width() {
        let d = crate::layout("box dashed 0.1").unwrap();
        let settings = Settings::default();
        let options = Options::default();
        let attrs = stroke_attrs(&d.objects[0], &ctx(&settings, &options), true);
        let dash = attrs.iter().find(|(name, _)| *name == "stroke-dasharray");
        assert_eq!(dash.map(|(_, v)| v.as_str()), Some("14.4,14.4"));
    }
}
