//! Fixture-driven tests.
//!
//! Every `tests/diagrams/*.pikchr` file must compile, render the same way
//! twice and keep its coordinates, path data included, inside the view
//! box. Every `tests/failures/*.pikchr` file starts with
//! `# expect: <category> line <N>` and must fail exactly that way.

use camino::Utf8Path;
use pikdraw::{Options, compile};
use regex_lite::Regex;
use tracing_subscriber::EnvFilter;

/// Slack for stroke edges and rounding to six significant digits.
const TOLERANCE: f64 = 0.05;

/// Honour `RUST_LOG` when debugging a fixture. Only the first call wins.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Coordinate pairs of a path `d` attribute. An arc contributes only its
/// end point, since its radii and flags are not positions.
fn path_points(d: &str) -> datatest_stable::Result<Vec<(f64, f64)>> {
    let segment = Regex::new(r"([MLQAZ])([^MLQAZ]*)")?;
    let mut points = Vec::new();
    for c in segment.captures_iter(d) {
        let args = c[2]
            .split([',', ' '])
            .filter(|a| !a.is_empty())
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()?;
        let coords = if &c[1] == "A" {
            &args[args.len().saturating_sub(2)..]
        } else {
            &args[..]
        };
        points.extend(coords.chunks_exact(2).map(|xy| (xy[0], xy[1])));
    }
    Ok(points)
}

fn check_diagram(path: &Utf8Path) -> datatest_stable::Result<()> {
    init_tracing();
    let source = std::fs::read_to_string(path)?;
    let options = Options::default();
    let first = compile(&source, &options).map_err(|e| format!("{path}: {e}"))?;
    let second = compile(&source, &options).map_err(|e| format!("{path}: {e}"))?;
    if first != second {
        return Err(format!("{path}: output differs between runs").into());
    }

    let view_box = Regex::new(r#"viewBox="0 0 ([\d.e+-]+) ([\d.e+-]+)""#)?;
    let Some(caps) = view_box.captures(&first.svg) else {
        return Err(format!("{path}: no viewBox in output").into());
    };
    let w: f64 = caps[1].parse()?;
    let h: f64 = caps[2].parse()?;
    tracing::debug!(%path, w, h, "view box");

    let x_attr = Regex::new(r#"\s(?:x|cx)="(-?[\d.e+-]+)""#)?;
    let y_attr = Regex::new(r#"\s(?:y|cy)="(-?[\d.e+-]+)""#)?;
    for (re, limit, axis) in [(&x_attr, w, "x"), (&y_attr, h, "y")] {
        for c in re.captures_iter(&first.svg) {
            let v: f64 = c[1].parse()?;
            if v < -TOLERANCE || v > limit + TOLERANCE {
                return Err(format!("{path}: {axis} = {v} outside 0..{limit}").into());
            }
        }
    }

    let points = Regex::new(r#"points="([^"]*)""#)?;
    for c in points.captures_iter(&first.svg) {
        for pair in c[1].split(' ') {
            let Some((x, y)) = pair.split_once(',') else {
                continue;
            };
            let (x, y): (f64, f64) = (x.parse()?, y.parse()?);
            if x < -TOLERANCE || x > w + TOLERANCE || y < -TOLERANCE || y > h + TOLERANCE {
                return Err(format!("{path}: arrowhead point {x},{y} outside the view box").into());
            }
        }
    }

    let data = Regex::new(r#"\sd="([^"]*)""#)?;
    for c in data.captures_iter(&first.svg) {
        for (x, y) in path_points(&c[1])? {
            if x < -TOLERANCE || x > w + TOLERANCE || y < -TOLERANCE || y > h + TOLERANCE {
                return Err(format!("{path}: path point {x},{y} outside the view box").into());
            }
        }
    }
    Ok(())
}

fn check_failure(path: &Utf8Path) -> datatest_stable::Result<()> {
    init_tracing();
    let source = std::fs::read_to_string(path)?;
    let header = Regex::new(r"^# expect: ([a-z-]+) line (\d+)")?;
    let Some(caps) = header.captures(&source) else {
        return Err(format!("{path}: missing `# expect:` header").into());
    };
    let category = &caps[1];
    let line: u32 = caps[2].parse()?;

    match compile(&source, &Options::default()) {
        Ok(_) => Err(format!("{path}: compiled, expected {category} on line {line}").into()),
        Err(e) if e.category() == category && e.line() == line => Ok(()),
        Err(e) => Err(format!(
            "{path}: expected {category} on line {line}, got {} on line {}: {e}",
            e.category(),
            e.line()
        )
        .into()),
    }
}

datatest_stable::harness! {
    { test = check_diagram, root = "tests/diagrams", pattern = r"\.pikchr$" },
    { test = check_failure, root = "tests/failures", pattern = r"\.pikchr$" },
}
