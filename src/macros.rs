//! Macro expansion
//!
//! Handles `define name { body }` and macro invocations on the token stream,
//! before parsing. Invocations may pass arguments in parentheses that follow
//! the name immediately; `$1` to `$9` in the body are replaced textually.

use std::collections::HashMap;

use crate::errors::{Error, LimitKind, ParseError, ResourceLimit};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};
use crate::log::trace;

pub const MAX_EXPANSION_DEPTH: usize = 10;

/// Macro definition
#[derive(Debug, Clone)]
struct MacroDef {
    body: String,
}

/// Where expanded tokens are reported: the outermost invocation.
#[derive(Clone, Copy)]
struct Origin {
    line: u32,
    span: Span,
}

#[derive(Default)]
struct Expander {
    macros: HashMap<String, MacroDef>,
    output: Vec<Token>,
}

/// Lex `source` and expand every macro in it. The result always ends with
/// an [`TokenKind::Eof`] token.
pub fn expand_macros(source: &str) -> Result<Vec<Token>, Error> {
    let mut expander = Expander::default();
    expander.process(source, None, 0)?;

    let end = source.len();
    let line = expander.output.last().map(|t| t.line).unwrap_or(1);
    expander.output.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        value: None,
        line,
        span: Span::new(end, end),
    });
    Ok(expander.output)
}

impl Expander {
    fn process(&mut self, text: &str, origin: Option<Origin>, depth: usize) -> Result<(), Error> {
        let tokens = Lexer::new(text).tokenize().map_err(|mut e| {
            if let Some(o) = origin {
                e.line = o.line;
                e.span = o.span.into();
            }
            e
        })?;

        let mut i = 0;
        while i < tokens.len() {
            let tok = relocate(&tokens[i], origin);
            match tok.kind {
                TokenKind::Keyword(Keyword::Define) => {
                    i = self.define(text, &tokens, i, origin)?;
                }
                TokenKind::Ident | TokenKind::PlaceName if self.macros.contains_key(&tok.text) => {
                    i = self.expand_macro_call(text, &tokens, i, origin, depth)?;
                }
                _ => {
                    self.output.push(tok);
                    i += 1;
                }
            }
        }
        Ok(())
    }

    /// Record a definition and emit `define NAME <body>` for the parser.
    fn define(
        &mut self,
        text: &str,
        tokens: &[Token],
        at: usize,
        origin: Option<Origin>,
    ) -> Result<usize, Error> {
        let name = match tokens.get(at + 1) {
            Some(t) if matches!(t.kind, TokenKind::Ident | TokenKind::PlaceName) => t,
            other => return Err(unexpected("macro name", other, &tokens[at], origin)),
        };
        let open = match tokens.get(at + 2) {
            Some(t) if t.kind == TokenKind::LBrace => t,
            other => return Err(unexpected("`{`", other, name, origin)),
        };
        let close = matching_brace(tokens, at + 2)
            .ok_or_else(|| unexpected("`}`", None, open, origin))?;

        let body = text[open.span.end..tokens[close].span.start].to_string();
        trace!(name = %name.text, body = %body, "define macro");
        self.macros
            .insert(name.text.clone(), MacroDef { body: body.clone() });

        self.output.push(relocate(&tokens[at], origin));
        self.output.push(relocate(name, origin));
        let whole = relocate(open, origin);
        self.output.push(Token {
            kind: TokenKind::MacroBody,
            text: body,
            value: None,
            line: whole.line,
            span: whole.span.to(relocate(&tokens[close], origin).span),
        });
        Ok(close + 1)
    }

    /// Replace the invocation at `at` with its expansion.
    fn expand_macro_call(
        &mut self,
        text: &str,
        tokens: &[Token],
        at: usize,
        origin: Option<Origin>,
        depth: usize,
    ) -> Result<usize, Error> {
        let call = &tokens[at];
        let here = origin.unwrap_or(Origin {
            line: call.line,
            span: call.span,
        });
        if depth >= MAX_EXPANSION_DEPTH {
            return Err(ResourceLimit {
                kind: LimitKind::MacroDepth {
                    name: call.text.clone(),
                    limit: MAX_EXPANSION_DEPTH,
                },
                line: here.line,
                span: here.span.into(),
            }
            .into());
        }

        let (args, next) = match tokens.get(at + 1) {
            Some(open) if open.kind == TokenKind::LParen && open.span.start == call.span.end => {
                collect_args(text, tokens, at + 1)
                    .ok_or_else(|| unexpected("`)`", None, open, origin))?
            }
            _ => (Vec::new(), at + 1),
        };

        let Some(def) = self.macros.get(&call.text) else {
            return Ok(next);
        };
        let expanded = substitute(&def.body, &args);
        trace!(name = %call.text, depth, expansion = %expanded, "expand macro");
        self.process(&expanded, Some(here), depth + 1)?;
        Ok(next)
    }
}

fn relocate(tok: &Token, origin: Option<Origin>) -> Token {
    let mut tok = tok.clone();
    if let Some(o) = origin {
        tok.line = o.line;
        tok.span = o.span;
    }
    tok
}

fn unexpected(expected: &str, found: Option<&Token>, after: &Token, origin: Option<Origin>) -> Error {
    let at = found.unwrap_or(after);
    let at = relocate(at, origin);
    ParseError {
        expected: expected.to_string(),
        found: found
            .map(|t| t.describe())
            .unwrap_or_else(|| "end of input".to_string()),
        line: at.line,
        span: at.span.into(),
    }
    .into()
}

fn matching_brace(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split the raw text of a parenthesised argument list at top-level commas.
/// Returns the arguments and the index just past the closing paren.
fn collect_args(text: &str, tokens: &[Token], open: usize) -> Option<(Vec<String>, usize)> {
    let mut depth = 0usize;
    let mut args = Vec::new();
    let mut arg_start = tokens[open].span.end;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth -= 1;
                if depth == 0 {
                    args.push(text[arg_start..tok.span.start].trim().to_string());
                    if args.len() == 1 && args[0].is_empty() {
                        args.clear();
                    }
                    return Some((args, i + 1));
                }
            }
            TokenKind::Comma if depth == 1 => {
                args.push(text[arg_start..tok.span.start].trim().to_string());
                arg_start = tok.span.end;
            }
            _ => {}
        }
    }
    None
}

/// Replace `$1`..`$9` with the matching argument; missing ones become empty.
fn substitute(body: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(d) = chars.peek().and_then(|d| d.to_digit(10)).filter(|d| *d > 0) {
                chars.next();
                if let Some(arg) = args.get(d as usize - 1) {
                    out.push_str(arg);
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(src: &str) -> Vec<String> {
        expand_macros(src)
            .unwrap()
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Eos | TokenKind::Eof))
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn plain_macro_expands_in_place() {
        let out = texts("define blob { circle fill red }\nblob");
        assert_eq!(out, vec!["define", "blob", " circle fill red ", "circle", "fill", "red"]);
    }

    #[test]
    fn arguments_substitute() {
        let out = texts("define pair { box $1; box $2 }\npair(\"a\", wid (1+2))");
        assert_eq!(
            &out[3..],
            &["box", "a", "box", "wid", "(", "1", "+", "2", ")"]
        );
    }

    #[test]
    fn expanded_tokens_report_the_invocation_line() {
        let toks = expand_macros("define two {\nbox\nbox\n}\n\ntwo").unwrap();
        let boxes: Vec<_> = toks
            .iter()
            .filter(|t| t.is_keyword(Keyword::Box))
            .map(|t| t.line)
            .collect();
        assert_eq!(boxes, vec![6, 6]);
    }

    #[test]
    fn redefinition_replaces_the_body() {
        let out = texts("define m {box}\ndefine m {circle}\nm");
        assert_eq!(out.last().map(String::as_str), Some("circle"));
    }

    #[test]
    fn recursion_hits_the_depth_limit() {
        let err = expand_macros("define loop { loop }\nloop").unwrap_err();
        match err {
            Error::ResourceLimit(limit) => {
                assert_eq!(limit.line, 2);
                assert!(matches!(limit.kind, LimitKind::MacroDepth { .. }));
            }
            other => panic!("expected resource limit, got {other:?}"),
        }
    }

    #[test]
    fn missing_brace_is_a_parse_error() {
        let err = expand_macros("define m box").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn substitute_leaves_other_dollars() {
        assert_eq!(substitute("$x + $1 + $0", &["7".into()]), "$x + 7 + $0");
    }
}
