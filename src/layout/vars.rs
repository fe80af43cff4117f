//! Variable table with the built-in defaults, and colour names.

use std::collections::HashMap;
use std::str::FromStr;

use color::{DynamicColor, Srgb};

/// Built-in variables and their defaults. Lengths are in inches.
pub const BUILTINS: &[(&str, f64)] = &[
    ("arcrad", 0.25),
    ("arrowht", 0.08),
    ("arrowwid", 0.06),
    ("boxht", 0.5),
    ("boxrad", 0.0),
    ("boxwid", 0.75),
    ("charht", 0.14),
    ("charwid", 0.08),
    ("circlerad", 0.25),
    ("color", 0.0),
    ("cylht", 0.5),
    ("cylrad", 0.075),
    ("cylwid", 0.75),
    ("dashwid", 0.05),
    ("diamondht", 0.75),
    ("diamondwid", 1.0),
    ("dotrad", 0.015),
    ("ellipseht", 0.5),
    ("ellipsewid", 0.75),
    ("fileht", 0.75),
    ("filerad", 0.15),
    ("filewid", 0.5),
    ("fill", -1.0),
    ("fontscale", 1.0),
    ("lineht", 0.5),
    ("linerad", 0.0),
    ("linewid", 0.5),
    ("margin", 0.0),
    ("movewid", 0.5),
    ("ovalht", 0.5),
    ("ovalwid", 1.0),
    ("scale", 1.0),
    ("spacing", 0.0),
    ("textht", 0.5),
    ("textwid", 0.75),
    ("thickness", 0.015),
];

/// Name to value map, seeded with [`BUILTINS`]. Cloned on entry to a
/// sublist so assignments inside stay local.
#[derive(Clone, Debug)]
pub struct Variables {
    values: HashMap<String, f64>,
}

impl Default for Variables {
    fn default() -> Self {
        Variables {
            values: BUILTINS
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }
}

impl Variables {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value of a variable that always exists (built-ins, margins).
    pub fn number(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

/// Look up a CSS colour name, ignoring case. `none` and `off` are -1.
pub fn color_by_name(name: &str) -> Option<f64> {
    let lower = name.to_ascii_lowercase();
    if lower == "none" || lower == "off" {
        return Some(-1.0);
    }
    if !lower.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let parsed = DynamicColor::from_str(&lower).ok()?;
    let rgba = parsed.to_alpha_color::<Srgb>().to_rgba8();
    let packed = (u32::from(rgba.r) << 16) | (u32::from(rgba.g) << 8) | u32::from(rgba.b);
    Some(f64::from(packed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seeded() {
        let vars = Variables::default();
        assert_eq!(vars.get("boxwid"), Some(0.75));
        assert_eq!(vars.get("cylrad"), Some(0.075));
        assert_eq!(vars.get("spacing"), Some(0.0));
        assert_eq!(vars.get("$nope"), None);
    }

    #[test]
    fn clones_are_independent() {
        let outer = Variables::default();
        let mut inner = outer.clone();
        inner.set("boxwid", 2.0);
        assert_eq!(outer.get("boxwid"), Some(0.75));
        assert_eq!(inner.get("boxwid"), Some(2.0));
    }

    #[test]
    fn color_names_ignore_case() {
        assert_eq!(color_by_name("Red"), Some(f64::from(0xff0000u32)));
        assert_eq!(color_by_name("lightgray"), Some(f64::from(0xd3d3d3u32)));
        assert_eq!(color_by_name("WHITE"), Some(f64::from(0xffffffu32)));
        assert_eq!(color_by_name("None"), Some(-1.0));
        assert_eq!(color_by_name("off"), Some(-1.0));
        assert_eq!(color_by_name("C"), None);
        assert_eq!(color_by_name("notacolor"), None);
    }
}
