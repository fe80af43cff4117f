//! A PIC-like diagram language that compiles to SVG.
//!
//! Source goes through four passes: the lexer and macro expander produce
//! tokens, the parser builds a [`Program`](ast::Program), layout places
//! every object, and the renderer writes the SVG.

pub mod ast;
pub mod errors;
pub mod layout;
pub mod lexer;
pub mod log;
pub mod macros;
pub mod parse;
pub mod render;
pub mod types;

pub use errors::Error;
pub use layout::Diagram;
pub use render::{Options, Rendered, render};
pub use types::Length;

/// Lex, parse and lay out a complete source text.
pub fn layout(source: &str) -> Result<Diagram, Error> {
    let program = parse::parse(source)?;
    layout::layout(&program)
}

/// Compile source text to a rendered SVG document.
pub fn compile(source: &str, options: &Options) -> Result<Rendered, Error> {
    let diagram = layout(source)?;
    render(&diagram, options)
}

/// Render source to SVG with default options.
///
/// Returns the SVG string on success, or a report with the offending
/// source snippet attached.
pub fn pikchr(source: &str) -> Result<String, miette::Report> {
    compile(source, &Options::default())
        .map(|rendered| rendered.svg)
        .map_err(|e| {
            miette::Report::new(e)
                .with_source_code(miette::NamedSource::new("diagram.pikchr", source.to_string()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiles(input: &str) {
        let result = compile(input, &Options::default());
        assert!(result.is_ok(), "Failed to compile: {:?}", result.err());
    }

    #[test]
    fn compile_simple_box() {
        compiles(r#"box "Hello""#);
    }

    #[test]
    fn compile_arrow() {
        compiles("arrow");
    }

    #[test]
    fn compile_multiple_statements() {
        compiles(
            r#"
            box "One"
            arrow
            box "Two"
        "#,
        );
    }

    #[test]
    fn compile_sublist() {
        compiles(
            r#"
            A: [
                box "inner"
                arrow
            ]
        "#,
        );
    }

    #[test]
    fn compile_variable_assignment() {
        compiles("$x = 10\nbox width $x / 10");
    }

    #[test]
    fn compile_edge_of_position() {
        compiles("C2: circle\ncircle at 1 ne of C2");
    }

    #[test]
    fn compile_last_arrow() {
        compiles("arrow\nbox at last arrow");
    }

    #[test]
    fn compile_nth_object() {
        compiles("box\nbox\ncircle at 2nd box");
    }

    #[test]
    fn forward_references_fail() {
        let err = compile("box at C\nC: circle", &Options::default()).unwrap_err();
        assert_eq!(err.category(), "unresolved");
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn reports_carry_the_source() {
        let report = pikchr("box\nbox at Nowhere").unwrap_err();
        assert!(report.to_string().starts_with("line 2:"));
        assert!(report.source_code().is_some());
    }
}
