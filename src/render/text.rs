//! Text metrics and vertical slot assignment.
//!
//! There is no font engine: widths come from a table of proportional
//! advances in hundredths of `charwid`, so layout never depends on the
//! fonts installed where the SVG is viewed.

use glam::{DVec2, dvec2};

use crate::ast::ClassName;
use crate::layout::{Object, ObjectClass, Settings, TextLabel, TextSlot};
use crate::types::{BoxIn, PtIn};

/// Proportional advances for printable ASCII, `' '` through `'~'`.
#[rustfmt::skip]
pub const AW_CHAR: [u8; 95] = [
    45,  55,  62, 115,  90, 132, 125,  40,
    55,  55,  71, 115,  45,  48,  45,  50,
    91,  91,  91,  91,  91,  91,  91,  91,
    91,  91,  50,  50, 120, 120, 120,  78,
   142, 102, 105, 110, 115, 105,  98, 105,
   125,  58,  58, 107,  95, 145, 125, 115,
    95, 115, 107,  95,  97, 118, 102, 150,
   100,  93, 100,  58,  50,  58, 119,  72,
    72,  86,  92,  80,  92,  85,  52,  92,
    92,  47,  47,  88,  48, 135,  92,  86,
    92,  92,  69,  75,  58,  92,  80, 121,
    81,  80,  76,  91,  49,  91, 118,
];

/// Fixed advance for monospace text.
const MONO_ADVANCE: u32 = 82;

/// Advance for anything outside printable ASCII.
const WIDE_ADVANCE: u32 = 100;

/// Sum of advances in hundredths of `charwid`.
pub fn text_length(text: &str, mono: bool) -> u32 {
    text.chars()
        .map(|c| match c {
            _ if mono => MONO_ADVANCE,
            ' '..='~' => u32::from(AW_CHAR[c as usize - 0x20]),
            _ => WIDE_ADVANCE,
        })
        .sum()
}

/// Estimated width of one label in inches.
pub fn label_width(label: &TextLabel, charwid: f64) -> f64 {
    let mut width = f64::from(text_length(&label.value, label.mono)) * charwid * 0.01;
    if label.bold {
        width *= 1.1;
    }
    width * label.scale
}

/// Width of the widest label and the summed height of all of them.
pub fn block_size(labels: &[TextLabel], charwid: f64, charht: f64) -> (f64, f64) {
    labels.iter().fold((0.0_f64, 0.0), |(w, h), label| {
        (w.max(label_width(label, charwid)), h + label.scale * charht)
    })
}

/// Assign each label a vertical slot. Explicit `above`/`below`/`center`
/// win; the rest spread out from the middle.
pub fn slots(labels: &[TextLabel]) -> Vec<TextSlot> {
    use TextSlot::*;
    let unmarked = labels
        .iter()
        .filter(|l| !(l.above || l.below || l.center))
        .count();
    let spread: &[TextSlot] = match unmarked {
        0 => &[],
        1 => &[Center],
        2 => &[Above, Below],
        3 => &[Above, Center, Below],
        4 => &[Above2, Above, Below, Below2],
        _ => &[Above2, Above, Center, Below, Below2],
    };
    let mut next = spread.iter().copied();
    labels
        .iter()
        .map(|label| {
            if label.above {
                Above
            } else if label.below {
                Below
            } else if label.center {
                Center
            } else {
                next.next().unwrap_or(Center)
            }
        })
        .collect()
}

/// Vertical offset of each label from its anchor, in inches, Y up.
/// `floor` reserves room in the centre row, as a line's stroke does.
pub fn slot_offsets(labels: &[TextLabel], slots: &[TextSlot], charht: f64, floor: f64) -> Vec<f64> {
    let (mut a2, mut a1, mut c, mut b1, mut b2) = (0.0_f64, 0.0_f64, floor, 0.0_f64, 0.0_f64);
    for (label, slot) in labels.iter().zip(slots) {
        let h = label.scale * charht;
        match slot {
            TextSlot::Above2 => a2 = a2.max(h),
            TextSlot::Above => a1 = a1.max(h),
            TextSlot::Center => c = c.max(h),
            TextSlot::Below => b1 = b1.max(h),
            TextSlot::Below2 => b2 = b2.max(h),
        }
    }
    slots
        .iter()
        .map(|slot| match slot {
            TextSlot::Above2 => 0.5 * c + a1 + 0.5 * a2,
            TextSlot::Above => 0.5 * c + 0.5 * a1,
            TextSlot::Center => 0.0,
            TextSlot::Below => -(0.5 * c + 0.5 * b1),
            TextSlot::Below2 => -(0.5 * c + b1 + 0.5 * b2),
        })
        .collect()
}

/// Horizontal anchoring of a placed label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Start,
    Middle,
    End,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Start => "start",
            Align::Middle => "middle",
            Align::End => "end",
        }
    }
}

/// A label with its final anchor point and estimated size, in inches.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLabel {
    pub anchor: PtIn,
    pub align: Align,
    pub width: f64,
    pub height: f64,
    /// Counter-clockwise rotation in degrees, for `aligned`.
    pub angle: f64,
}

impl PlacedLabel {
    /// Box covering the label, rotated about its anchor.
    pub fn extent(&self) -> BoxIn {
        let x0 = match self.align {
            Align::Start => 0.0,
            Align::Middle => -self.width / 2.0,
            Align::End => -self.width,
        };
        let h2 = self.height / 2.0;
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let origin = self.anchor.to_dvec2();
        let mut bbox = BoxIn::new();
        for corner in [dvec2(x0, -h2), dvec2(x0 + self.width, -h2), dvec2(x0, h2), dvec2(x0 + self.width, h2)] {
            let rotated = dvec2(corner.x * cos - corner.y * sin, corner.x * sin + corner.y * cos);
            bbox.expand_point(PtIn::from_dvec2(origin + rotated));
        }
        bbox
    }
}

/// Final positions of every label on an object.
pub fn place(obj: &Object, settings: &Settings) -> Vec<PlacedLabel> {
    if obj.text.is_empty() {
        return Vec::new();
    }
    let charht = settings.charht.raw() * settings.fontscale;
    let charwid = settings.charwid.raw() * settings.fontscale;
    let floor = if obj.is_line_like() {
        obj.style.thickness.raw() * 1.5
    } else {
        0.0
    };
    let slots = slots(&obj.text);
    let offsets = slot_offsets(&obj.text, &slots, charht, floor);
    let y_base = match obj.class {
        ObjectClass::Shape(ClassName::Cylinder) if obj.radius.raw() > 0.0 => -0.75 * obj.radius.raw(),
        _ => 0.0,
    };
    let angle = line_angle(obj);
    obj.text
        .iter()
        .zip(offsets)
        .map(|(label, dy)| {
            let align = if label.rjust {
                Align::End
            } else if label.ljust {
                Align::Start
            } else {
                Align::Middle
            };
            let angle = if label.aligned { angle } else { 0.0 };
            let (sin, cos) = angle.to_radians().sin_cos();
            // slots stack perpendicular to rotated text
            let shift = dvec2(-sin, cos) * (dy + y_base);
            PlacedLabel {
                anchor: PtIn::from_dvec2(obj.center.to_dvec2() + shift),
                align,
                width: label_width(label, charwid),
                height: label.scale * charht,
                angle,
            }
        })
        .collect()
}

/// Direction of a line from its first to its last waypoint, in degrees.
fn line_angle(obj: &Object) -> f64 {
    match (obj.path.first(), obj.path.last()) {
        (Some(first), Some(last)) if obj.is_line_like() => {
            let d: DVec2 = last.to_dvec2() - first.to_dvec2();
            if d == DVec2::ZERO {
                0.0
            } else {
                d.y.atan2(d.x).to_degrees()
            }
        }
        _ => 0.0,
    }
}
