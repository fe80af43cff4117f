//! End-to-end properties of compiled diagrams, checked on the SVG text.

use pikdraw::{Options, compile, layout, render};
use regex_lite::Regex;
use std::collections::HashMap;

const TOLERANCE: f64 = 1e-3;

/// Attributes of every element with the given tag, in document order.
fn elements(svg: &str, tag: &str) -> Vec<HashMap<String, String>> {
    let element = Regex::new(&format!(r"<{tag}\s([^>]*)>")).unwrap();
    let attr = Regex::new(r#"([\w-]+)="([^"]*)""#).unwrap();
    element
        .captures_iter(svg)
        .map(|c| {
            attr.captures_iter(&c[1])
                .map(|a| (a[1].to_string(), a[2].to_string()))
                .collect()
        })
        .collect()
}

fn num(attrs: &HashMap<String, String>, name: &str) -> f64 {
    attrs[name].parse().unwrap()
}

/// Coordinate pairs in path data. Arcs only contribute their end point.
fn path_points(d: &str) -> Vec<(f64, f64)> {
    let segment = Regex::new(r"([MLQAZ])([^MLQAZ]*)").unwrap();
    let mut points = Vec::new();
    for c in segment.captures_iter(d) {
        let args: Vec<f64> = c[2]
            .split([',', ' '])
            .filter(|a| !a.is_empty())
            .map(|a| a.parse().unwrap())
            .collect();
        let skip = if &c[1] == "A" { args.len().saturating_sub(2) } else { 0 };
        points.extend(args[skip..].chunks_exact(2).map(|xy| (xy[0], xy[1])));
    }
    points
}

fn compile_default(source: &str) -> String {
    compile(source, &Options::default()).unwrap().svg
}

// ==== Determinism tests ====

#[test]
fn compiling_twice_is_byte_identical() {
    let source = r#"
        A: box "one" fill 0xccddee
        arrow "go" above
        circle "two" rad 0.3
        spline up then right then down
        B: [ box; ellipse ]
        arrow from A.s down 0.5 then to B.s
    "#;
    assert_eq!(compile_default(source), compile_default(source));
}

#[test]
fn rendering_a_diagram_twice_is_identical() {
    let diagram = layout("box \"x\"; arrow; cylinder; file").unwrap();
    let options = Options::default();
    let first = render(&diagram, &options).unwrap();
    let second = render(&diagram, &options).unwrap();
    assert_eq!(first, second);
}

// ==== Completeness tests ====

#[test]
fn every_object_is_concrete() {
    let diagram = layout(
        "A: box\nB: circle at A.ne + (1, 1)\nline from A to B chop\ntext \"t\" at 1/3 between A and B",
    )
    .unwrap();
    assert_eq!(diagram.objects.len(), 4);
    for obj in &diagram.objects {
        assert!(obj.center.is_finite(), "{obj:?}");
        assert!(obj.width.is_finite() && obj.height.is_finite(), "{obj:?}");
        assert!(obj.path.iter().all(|p| p.is_finite()), "{obj:?}");
    }
}

// ==== Bounding box tests ====

#[test]
fn primitives_stay_inside_the_view_box() {
    let svg = compile_default(
        "box; circle rad 0.4; ellipse; oval; diamond; dot; arc; arc cw\n\
         spline up then right then down; cylinder; file; arrow",
    );
    let root = &elements(&svg, "svg")[0];
    let view: Vec<f64> = root["viewBox"]
        .split(' ')
        .map(|v| v.parse().unwrap())
        .collect();
    let (w, h) = (view[2], view[3]);
    for rect in elements(&svg, "rect") {
        let (x, y) = (num(&rect, "x"), num(&rect, "y"));
        assert!(x >= -TOLERANCE && y >= -TOLERANCE);
        assert!(x + num(&rect, "width") <= w + TOLERANCE);
        assert!(y + num(&rect, "height") <= h + TOLERANCE);
    }
    for circle in elements(&svg, "circle") {
        let (cx, cy, r) = (num(&circle, "cx"), num(&circle, "cy"), num(&circle, "r"));
        assert!(cx - r >= -TOLERANCE && cx + r <= w + TOLERANCE);
        assert!(cy - r >= -TOLERANCE && cy + r <= h + TOLERANCE);
    }
    for ellipse in elements(&svg, "ellipse") {
        let (cx, rx) = (num(&ellipse, "cx"), num(&ellipse, "rx"));
        assert!(cx - rx >= -TOLERANCE && cx + rx <= w + TOLERANCE);
    }
    let paths = elements(&svg, "path");
    assert!(paths.len() >= 6, "{svg}");
    for path in paths {
        for (x, y) in path_points(&path["d"]) {
            assert!(x >= -TOLERANCE && x <= w + TOLERANCE, "x {x} in {}", path["d"]);
            assert!(y >= -TOLERANCE && y <= h + TOLERANCE, "y {y} in {}", path["d"]);
        }
    }
}

// ==== Chaining tests ====

#[test]
fn chained_boxes_touch() {
    let svg = compile_default("box; box");
    let rects = elements(&svg, "rect");
    assert_eq!(rects.len(), 2);
    let first_right = num(&rects[0], "x") + num(&rects[0], "width");
    assert!((num(&rects[1], "x") - first_right).abs() < TOLERANCE);
    assert_eq!(rects[0]["y"], rects[1]["y"]);
}

#[test]
fn right_of_places_the_left_edge_at_the_right_edge() {
    let svg = compile_default("box \"A\"; box \"B\" right of A");
    let rects = elements(&svg, "rect");
    let a_right = num(&rects[0], "x") + num(&rects[0], "width");
    assert!((num(&rects[1], "x") - a_right).abs() < TOLERANCE);
    assert!((num(&rects[1], "y") - num(&rects[0], "y")).abs() < TOLERANCE);
}

// ==== Rejection tests ====

#[test]
fn forward_references_are_rejected() {
    let err = compile("line to C\nbox \"C\"", &Options::default()).unwrap_err();
    assert_eq!(err.category(), "unresolved");
    assert_eq!(err.line(), 1);
    assert!(err.to_string().contains("`C`"), "{err}");
}

#[test]
fn zero_length_lines_are_rejected() {
    let err = compile("box\nline from (1, 1) to (1, 1)", &Options::default()).unwrap_err();
    assert_eq!(err.category(), "degenerate");
    assert_eq!(err.line(), 2);
}
