//! Scanner that turns source text into [`Token`]s.
//!
//! The lexer is a lazy iterator. It holds no state outside itself, so
//! cloning it yields an independent scanner that restarts from the same
//! point.

mod token;

pub use token::{ArrowKind, AssignOp, Keyword, Span, Token, TokenKind};

use crate::errors::{LexError, LexErrorKind};
use crate::log::trace;

/// Unit suffixes and their size in inches.
const UNITS: &[(&str, f64)] = &[
    ("in", 1.0),
    ("cm", 1.0 / 2.54),
    ("mm", 1.0 / 25.4),
    ("px", 1.0 / 96.0),
    ("pt", 1.0 / 72.0),
    ("pc", 1.0 / 6.0),
];

const ORDINAL_SUFFIXES: &[&str] = &["st", "nd", "rd", "th"];

#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    /// Newlines inside parentheses don't end a statement.
    paren_depth: u32,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            pos: 0,
            line: 1,
            paren_depth: 0,
            done: false,
        }
    }

    /// Scan everything, stopping at the first error.
    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        self.collect()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn error(&self, kind: LexErrorKind, line: u32, start: usize) -> LexError {
        LexError {
            kind,
            line,
            span: Span::new(start, self.pos.max(start)).into(),
        }
    }

    /// Skip blanks, comments and escaped newlines. Stops in front of a
    /// newline that ends a statement.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\u{c}') => {
                    self.bump();
                }
                Some('\n') if self.paren_depth > 0 => {
                    self.bump();
                }
                Some('\\') if matches!(self.peek_at(1), Some('\n')) => {
                    self.bump();
                    self.bump();
                }
                Some('\\') if self.peek_at(1) == Some('\r') && self.peek_at(2) == Some('\n') => {
                    self.bump();
                    self.bump();
                    self.bump();
                }
                Some('#') => self.eat_while(|c| c != '\n'),
                Some('/') if self.peek_at(1) == Some('/') => self.eat_while(|c| c != '\n'),
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn make(&self, kind: TokenKind, start: usize, line: u32) -> Token {
        Token {
            kind,
            text: self.src[start..self.pos].to_string(),
            value: None,
            line,
            span: Span::new(start, self.pos),
        }
    }

    fn scan_token(&mut self) -> Option<Result<Token, LexError>> {
        self.skip_trivia();
        let start = self.pos;
        let line = self.line;
        let c = self.bump()?;

        let kind = match c {
            '\n' | ';' => TokenKind::Eos,
            '"' => return Some(self.scan_string(start, line)),
            '0'..='9' => return Some(self.scan_number(start, line)),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                return Some(self.scan_number(start, line));
            }
            'a'..='z' | 'A'..='Z' | '_' => return Some(Ok(self.scan_word(start, line))),
            '$' | '@' => {
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                if self.pos == start + 1 {
                    return Some(Err(self.error(LexErrorKind::UnexpectedChar(c), line, start)));
                }
                TokenKind::Variable
            }
            '(' => {
                self.paren_depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RParen
            }
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '*' => self.with_assign(AssignOp::Mul, TokenKind::Star),
            '/' => self.with_assign(AssignOp::Div, TokenKind::Slash),
            '+' => self.with_assign(AssignOp::Add, TokenKind::Plus),
            '-' => {
                if self.peek() == Some('>') {
                    self.bump();
                    TokenKind::Arrow(ArrowKind::Right)
                } else {
                    self.with_assign(AssignOp::Sub, TokenKind::Minus)
                }
            }
            '<' => {
                if self.peek() == Some('-') && self.peek_at(1) == Some('>') {
                    self.bump();
                    self.bump();
                    TokenKind::Arrow(ArrowKind::Both)
                } else if self.peek() == Some('-') {
                    self.bump();
                    TokenKind::Arrow(ArrowKind::Left)
                } else {
                    TokenKind::Lt
                }
            }
            '>' => TokenKind::Gt,
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign(AssignOp::Set)
                }
            }
            '→' => TokenKind::Arrow(ArrowKind::Right),
            '←' => TokenKind::Arrow(ArrowKind::Left),
            '↔' => TokenKind::Arrow(ArrowKind::Both),
            other => {
                return Some(Err(self.error(
                    LexErrorKind::UnexpectedChar(other),
                    line,
                    start,
                )));
            }
        };
        Some(Ok(self.make(kind, start, line)))
    }

    fn with_assign(&mut self, op: AssignOp, plain: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.bump();
            TokenKind::Assign(op)
        } else {
            plain
        }
    }

    fn scan_word(&mut self, start: usize, line: u32) -> Token {
        self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let word = &self.src[start..self.pos];
        let kind = if let Some(kw) = Keyword::from_word(word) {
            TokenKind::Keyword(kw)
        } else if word.starts_with(|c: char| c.is_ascii_uppercase()) {
            TokenKind::PlaceName
        } else {
            TokenKind::Ident
        };
        self.make(kind, start, line)
    }

    fn scan_string(&mut self, start: usize, line: u32) -> Result<Token, LexError> {
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(self.error(LexErrorKind::UnterminatedString, line, start));
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        Some(c @ ('"' | '\\')) => {
                            self.bump();
                            text.push(c);
                        }
                        // other escapes are kept for the renderer
                        _ => text.push('\\'),
                    }
                }
                Some(c) => {
                    self.bump();
                    text.push(c);
                }
            }
        }
        Ok(Token {
            kind: TokenKind::String,
            text,
            value: None,
            line,
            span: Span::new(start, self.pos),
        })
    }

    fn scan_number(&mut self, start: usize, line: u32) -> Result<Token, LexError> {
        let is_hex = self.src[start..].starts_with("0x") || self.src[start..].starts_with("0X");
        if is_hex {
            self.bump();
            self.eat_while(|c| c.is_ascii_hexdigit());
            let digits = &self.src[start + 2..self.pos];
            let value = i64::from_str_radix(digits, 16).map_err(|_| {
                self.error(
                    LexErrorKind::InvalidNumber(self.src[start..self.pos].to_string()),
                    line,
                    start,
                )
            })?;
            let mut tok = self.make(TokenKind::Number, start, line);
            tok.value = Some(value as f64);
            return Ok(tok);
        }

        self.eat_while(|c| c.is_ascii_digit());
        let mut is_integer = !self.src[start..self.pos].contains('.');
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
            is_integer = false;
        } else if self.peek() == Some('.')
            && !self.peek_at(1).is_some_and(|c| c.is_ascii_alphabetic())
        {
            // "1." is a valid number; "1.x" is a number followed by ".x"
            self.bump();
            is_integer = false;
        }
        // exponent, but only when digits follow: "2e" is a suffix, not an exponent
        if matches!(self.peek(), Some('e' | 'E')) {
            let digit_at = match self.peek_at(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                self.eat_while(|c| c.is_ascii_digit());
                is_integer = false;
            }
        }
        let literal_end = self.pos;
        let literal = &self.src[start..literal_end];
        let value: f64 = literal.parse().map_err(|_| {
            self.error(LexErrorKind::InvalidNumber(literal.to_string()), line, start)
        })?;

        if self.peek() == Some('%') {
            self.bump();
            let mut tok = self.make(TokenKind::Percent, start, line);
            tok.value = Some(value);
            return Ok(tok);
        }

        let suffix_start = self.pos;
        self.eat_while(|c| c.is_ascii_alphabetic());
        let suffix = &self.src[suffix_start..self.pos];
        if suffix.is_empty() {
            let mut tok = self.make(TokenKind::Number, start, line);
            tok.value = Some(value);
            return Ok(tok);
        }
        if let Some((_, scale)) = UNITS.iter().find(|(name, _)| *name == suffix) {
            let mut tok = self.make(TokenKind::Number, start, line);
            tok.value = Some(value * scale);
            return Ok(tok);
        }
        if is_integer && ORDINAL_SUFFIXES.contains(&suffix) {
            let mut tok = self.make(TokenKind::Ordinal, start, line);
            tok.value = Some(value);
            return Ok(tok);
        }
        Err(LexError {
            kind: LexErrorKind::InvalidSuffix(suffix.to_string()),
            line,
            span: Span::new(suffix_start, self.pos).into(),
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.scan_token();
        match &item {
            Some(Ok(tok)) => {
                trace!(kind = ?tok.kind, text = %tok.text, line = tok.line, "token");
            }
            Some(Err(_)) | None => self.done = true,
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn dump(src: &str) -> String {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .iter()
            .map(|t| match t.value {
                Some(v) => format!("{}:{}={}", t.line, t.kind, v),
                None => format!("{}:{} {:?}", t.line, t.kind, t.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ==================== Token shape tests ====================

    #[test]
    fn simple_statement() {
        insta::assert_snapshot!(dump("A: box \"hi\" wid 2in"), @r#"
        1:place name "A"
        1:`:` ":"
        1:`box` "box"
        1:string "hi"
        1:`width` "wid"
        1:number=2
        "#);
    }

    #[test]
    fn capitalised_words_are_place_names() {
        assert_eq!(
            kinds("line -> C"),
            vec![
                TokenKind::Keyword(Keyword::Line),
                TokenKind::Arrow(ArrowKind::Right),
                TokenKind::PlaceName,
            ]
        );
        assert_eq!(kinds("c")[0], TokenKind::Keyword(Keyword::Center));
    }

    #[test]
    fn operators_and_arrows() {
        assert_eq!(
            kinds("<-> <- -> < > == = += -= *= /= → ← ↔"),
            vec![
                TokenKind::Arrow(ArrowKind::Both),
                TokenKind::Arrow(ArrowKind::Left),
                TokenKind::Arrow(ArrowKind::Right),
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::EqEq,
                TokenKind::Assign(AssignOp::Set),
                TokenKind::Assign(AssignOp::Add),
                TokenKind::Assign(AssignOp::Sub),
                TokenKind::Assign(AssignOp::Mul),
                TokenKind::Assign(AssignOp::Div),
                TokenKind::Arrow(ArrowKind::Right),
                TokenKind::Arrow(ArrowKind::Left),
                TokenKind::Arrow(ArrowKind::Both),
            ]
        );
    }

    #[test]
    fn variables() {
        let toks = Lexer::new("$x @y").tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Variable);
        assert_eq!(toks[0].text, "$x");
        assert_eq!(toks[1].text, "@y");
    }

    // ==================== Number tests ====================

    fn value(src: &str) -> f64 {
        Lexer::new(src).tokenize().unwrap()[0].value.unwrap()
    }

    #[test]
    fn units_convert_to_inches() {
        assert_eq!(value("1in"), 1.0);
        assert!((value("2.54cm") - 1.0).abs() < 1e-12);
        assert!((value("25.4mm") - 1.0).abs() < 1e-12);
        assert_eq!(value("96px"), 1.0);
        assert_eq!(value("72pt"), 1.0);
        assert_eq!(value("6pc"), 1.0);
        assert_eq!(value(".5"), 0.5);
        assert_eq!(value("1e2"), 100.0);
        assert_eq!(value("0xff0000"), 16711680.0);
    }

    #[test]
    fn percent_and_ordinals() {
        let toks = Lexer::new("50% 2nd 3rd 1st 4th").tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Percent);
        assert_eq!(toks[0].value, Some(50.0));
        assert!(toks[1..].iter().all(|t| t.kind == TokenKind::Ordinal));
        assert_eq!(toks[1].value, Some(2.0));
    }

    #[test]
    fn number_followed_by_dot_edge() {
        assert_eq!(
            kinds("1.x"),
            vec![TokenKind::Number, TokenKind::Dot, TokenKind::Ident]
        );
    }

    #[test]
    fn invalid_suffix_is_an_error() {
        let err = Lexer::new("box\nbox wid 3furlongs").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidSuffix("furlongs".into()));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn ordinal_suffix_requires_an_integer() {
        let err = Lexer::new("1.5th").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidSuffix("th".into()));
    }

    // ==================== String tests ====================

    #[test]
    fn string_escapes() {
        let toks = Lexer::new(r#""say \"hi\" \\ \n""#).tokenize().unwrap();
        assert_eq!(toks[0].text, r#"say "hi" \ \n"#);
    }

    #[test]
    fn unterminated_string_reports_its_line() {
        let err = Lexer::new("box\n\"oops\nbox").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.line, 2);
        assert_eq!(err.to_string(), "line 2: unterminated string");
    }

    // ==================== Trivia tests ====================

    #[test]
    fn comments_and_continuations() {
        let src = "box # comment\n// another\n/* block\ncomment */ circle \\\n  fill red";
        let toks = Lexer::new(src).tokenize().unwrap();
        let words: Vec<_> = toks
            .iter()
            .filter(|t| t.kind != TokenKind::Eos)
            .map(|t| (t.text.as_str(), t.line))
            .collect();
        assert_eq!(
            words,
            vec![("box", 1), ("circle", 4), ("fill", 5), ("red", 5)]
        );
    }

    #[test]
    fn newlines_inside_parens_are_not_separators() {
        assert!(!kinds("(1,\n2)").contains(&TokenKind::Eos));
        assert_eq!(kinds("a\nb")[1], TokenKind::Eos);
    }

    #[test]
    fn unexpected_character() {
        let err = Lexer::new("box ^").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedChar('^'));
    }

    #[test]
    fn clones_restart_independently() {
        let mut lexer = Lexer::new("box circle");
        let restart = lexer.clone();
        assert_eq!(lexer.next().unwrap().unwrap().text, "box");
        assert_eq!(lexer.next().unwrap().unwrap().text, "circle");
        assert!(lexer.next().is_none());
        let again: Vec<_> = restart.map(|t| t.unwrap().text).collect();
        assert_eq!(again, vec!["box", "circle"]);
    }

    #[test]
    fn iteration_stops_after_the_first_error() {
        let items: Vec<_> = Lexer::new("box ^ circle").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "box");
        assert!(items[1].is_err());
    }
}
