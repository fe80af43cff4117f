//! SVG rendering for laid-out diagrams
//!
//! This module is organized into submodules:
//! - `shapes`: per-class outlines, compass points and chopping
//! - `geometry`: chop math, arrowheads and path data
//! - `text`: label metrics and slot placement
//! - `color`: colour output and dark mode
//! - `svg`: element helpers shared by the shapes
//!
//! Rendering never fails on geometry; the only error is the canvas guard.

pub mod color;
pub mod geometry;
pub mod shapes;
pub mod svg;
pub mod text;

use ::svg::Document;

use crate::errors::{Error, LimitKind, ResourceLimit};
use crate::layout::{Diagram, Object, Settings};
use crate::log::debug;
use crate::types::{BoxIn, Length as Inches, PtIn, Scaler, fmt_num};

use self::shapes::Shape;
use self::svg::{DrawCtx, arrow_polygons, labels};

/// Output pixels per inch.
pub const PX_PER_INCH: f64 = 144.0;

/// Element id and class prefix when none is configured.
const DEFAULT_PREFIX: &str = "pikdraw";

/// Caller-side rendering options.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Prefix for element ids, also set as the root `class`.
    pub class_prefix: Option<String>,
    /// Largest width or height in pixels before rendering gives up.
    pub max_dimension: Option<f64>,
    /// Invert colours for display on a dark background.
    pub dark_mode: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            class_prefix: None,
            max_dimension: Some(100_000.0),
            dark_mode: false,
        }
    }
}

/// A rendered document.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    /// `print` lines followed by the SVG document.
    pub svg: String,
    /// Display width in inches, after `scale`.
    pub width: Inches,
    /// Display height in inches, after `scale`.
    pub height: Inches,
    /// Lines produced by `print`, without the `<br>` markup.
    pub printed: Vec<String>,
}

impl Rendered {
    pub fn width_px(&self) -> f64 {
        self.width.raw() * PX_PER_INCH
    }

    pub fn height_px(&self) -> f64 {
        self.height.raw() * PX_PER_INCH
    }
}

/// Render a diagram to SVG.
pub fn render(diagram: &Diagram, options: &Options) -> Result<Rendered, Error> {
    let mut out = String::new();
    for line in &diagram.printed {
        out.push_str(line);
        out.push_str("<br>\n");
    }
    if diagram.is_empty() {
        out.push_str("<!-- empty pikchr diagram -->\n");
        return Ok(Rendered {
            svg: out,
            width: Inches::ZERO,
            height: Inches::ZERO,
            printed: diagram.printed.clone(),
        });
    }

    let settings = &diagram.settings;
    let mut bounds = diagram.bbox;
    let margin = settings.margin + settings.thickness;
    bounds.min.x -= margin + settings.left_margin;
    bounds.max.x += margin + settings.right_margin;
    bounds.min.y -= margin + settings.bottom_margin;
    bounds.max.y += margin + settings.top_margin;

    let scaler = Scaler::new(PX_PER_INCH, bounds.min.x, bounds.max.y);
    let view_w = scaler.px(bounds.width());
    let view_h = scaler.px(bounds.height());
    let width = view_w * settings.scale;
    let height = view_h * settings.scale;
    debug!(
        view_w,
        view_h,
        width,
        height,
        scale = settings.scale,
        "canvas"
    );

    if let Some(limit) = options.max_dimension {
        if width > limit || height > limit {
            let culprit = largest_object(diagram);
            return Err(ResourceLimit {
                kind: LimitKind::Canvas {
                    width,
                    height,
                    limit,
                },
                line: culprit.map_or(1, |o| o.line),
                span: culprit.map_or(Default::default(), |o| o.span).into(),
            }
            .into());
        }
    }

    let prefix = options.class_prefix.as_deref().unwrap_or(DEFAULT_PREFIX);
    let mut document = Document::new()
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set("viewBox", format!("0 0 {} {}", fmt_num(view_w), fmt_num(view_h)))
        .set("width", fmt_num(width))
        .set("height", fmt_num(height));
    if let Some(class) = &options.class_prefix {
        document = document.set("class", class.clone());
    }

    for obj in &diagram.objects {
        let ctx = DrawCtx {
            scaler,
            settings,
            options,
            id: format!("{prefix}-{}", obj.id.number()),
        };
        for node in obj.shape.draw(obj, &ctx) {
            document = document.add(node);
        }
        let placed = text::place(obj, settings);
        for node in labels(obj, &placed, &ctx) {
            document = document.add(node);
        }
    }

    out.push_str(&document.to_string());
    out.push('\n');
    Ok(Rendered {
        svg: out,
        width: Inches(width / PX_PER_INCH),
        height: Inches(height / PX_PER_INCH),
        printed: diagram.printed.clone(),
    })
}

/// The object whose extent has the biggest side, for the canvas guard.
fn largest_object(diagram: &Diagram) -> Option<&Object> {
    let side = |o: &Object| {
        let e = object_extent(o, &diagram.settings);
        e.width().raw().max(e.height().raw())
    };
    diagram
        .objects
        .iter()
        .max_by(|a, b| side(a).total_cmp(&side(b)))
}

/// Everything an object puts on the canvas: outline plus half its stroke,
/// arrowheads and estimated text.
pub fn object_extent(obj: &Object, settings: &Settings) -> BoxIn {
    let mut extent = obj.shape.extent(obj);
    if !obj.style.invisible && obj.style.stroke.is_some() && !extent.is_empty() {
        extent.inflate(obj.style.thickness / 2.0);
    }
    if !obj.style.invisible {
        for (_, tri) in arrow_polygons(obj, settings) {
            for p in tri {
                extent.expand_point(PtIn::from_dvec2(p));
            }
        }
    }
    for label in text::place(obj, settings) {
        extent.expand_bbox(&label.extent());
    }
    extent
}
