//! Recursive-descent parser.
//!
//! Works on the fully expanded token vector (see [`crate::macros`]), so it
//! can back up a few tokens when a position and an expression start the
//! same way. There is no error recovery: the first violation ends parsing.

mod expr;

use crate::ast::*;
use crate::errors::{Error, ParseError};
use crate::lexer::{ArrowKind, Keyword, Token, TokenKind};
use crate::macros::expand_macros;
use crate::types::Direction;

/// Lex, expand and parse a complete source text.
pub fn parse(source: &str) -> Result<Program, Error> {
    let tokens = expand_macros(source)?;
    Parser::new(&tokens).parse_program()
}

pub struct Parser<'t> {
    tokens: &'t [Token],
    current: usize,
}

impl<'t> Parser<'t> {
    /// `tokens` must end with [`TokenKind::Eof`].
    pub fn new(tokens: &'t [Token]) -> Self {
        Parser { tokens, current: 0 }
    }

    pub fn parse_program(&mut self) -> Result<Program, Error> {
        let statements = self.parse_statements(false)?;
        Ok(Program { statements })
    }

    // =========================================================================
    // TOKEN ACCESS
    // =========================================================================

    fn peek(&self) -> &'t Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &'t Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.current + n).min(last)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_at(&self, n: usize, kind: TokenKind) -> bool {
        self.peek_at(n).kind == kind
    }

    fn check_kw(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    fn keyword(&self) -> Option<Keyword> {
        match self.peek().kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    fn advance(&mut self) -> &'t Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.current += 1;
        }
        tok
    }

    fn previous(&self) -> &'t Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_kw(&mut self, kw: Keyword) -> bool {
        self.match_kind(TokenKind::Keyword(kw))
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&'t Token, Error> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_kw(&mut self, kw: Keyword) -> Result<&'t Token, Error> {
        self.expect(TokenKind::Keyword(kw), &format!("`{}`", kw.as_str()))
    }

    fn error(&self, expected: &str) -> Error {
        let tok = self.peek();
        ParseError {
            expected: expected.to_string(),
            found: tok.describe(),
            line: tok.line,
            span: tok.span.into(),
        }
        .into()
    }

    /// Run `f`, rewinding to the starting token if it fails.
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Option<T> {
        let save = self.current;
        match f(self) {
            Ok(v) => Some(v),
            Err(_) => {
                self.current = save;
                None
            }
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Eos | TokenKind::Eof | TokenKind::RBracket
        )
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn parse_statements(&mut self, in_sublist: bool) -> Result<Vec<Statement>, Error> {
        let mut statements = Vec::new();
        loop {
            while self.match_kind(TokenKind::Eos) {}
            match self.peek().kind {
                TokenKind::Eof if in_sublist => return Err(self.error("`]`")),
                TokenKind::Eof => break,
                TokenKind::RBracket if in_sublist => break,
                _ => {}
            }
            statements.push(self.parse_statement()?);
            let ends = match self.peek().kind {
                TokenKind::Eos | TokenKind::Eof => true,
                TokenKind::RBracket => in_sublist,
                _ => false,
            };
            if !ends {
                return Err(self.error("end of statement"));
            }
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, Error> {
        let first = self.peek();
        let kind = match first.kind {
            TokenKind::Keyword(Keyword::Define) => self.parse_define()?,
            TokenKind::Keyword(Keyword::Print) => self.parse_print()?,
            TokenKind::Keyword(Keyword::Assert) => self.parse_assert()?,
            TokenKind::Keyword(kw) if kw.is_direction() && self.direction_stands_alone() => {
                self.advance();
                StatementKind::Direction(direction_of(kw))
            }
            TokenKind::PlaceName if self.check_at(1, TokenKind::Colon) => {
                let label = self.advance().text.clone();
                self.advance();
                if self.starts_object() {
                    StatementKind::Object(self.parse_object(Some(label))?)
                } else {
                    let position = self.parse_position()?;
                    StatementKind::PlaceLabel { label, position }
                }
            }
            _ if self.starts_assignment() => self.parse_assignment()?,
            _ if self.starts_object() => StatementKind::Object(self.parse_object(None)?),
            _ if self.starts_refinement() => StatementKind::Refine(self.parse_clauses()?),
            _ => return Err(self.error("statement")),
        };
        Ok(Statement {
            kind,
            line: first.line,
            span: first.span.to(self.previous().span),
        })
    }

    fn direction_stands_alone(&self) -> bool {
        matches!(
            self.peek_at(1).kind,
            TokenKind::Eos | TokenKind::Eof | TokenKind::RBracket
        )
    }

    fn starts_assignment(&self) -> bool {
        let name_ok = match self.peek().kind {
            TokenKind::Variable | TokenKind::Ident => true,
            TokenKind::Keyword(kw) => {
                matches!(kw, Keyword::Fill | Keyword::Color | Keyword::Thickness)
            }
            _ => false,
        };
        name_ok && matches!(self.peek_at(1).kind, TokenKind::Assign(_))
    }

    fn starts_object(&self) -> bool {
        match self.peek().kind {
            TokenKind::Keyword(kw) => kw.is_class(),
            TokenKind::String | TokenKind::LBracket => true,
            _ => false,
        }
    }

    fn starts_refinement(&self) -> bool {
        match self.peek().kind {
            TokenKind::Arrow(_) => true,
            TokenKind::Keyword(Keyword::Left | Keyword::Right) => {
                self.check_at(1, TokenKind::Keyword(Keyword::Of))
            }
            TokenKind::Keyword(kw) => matches!(
                kw,
                Keyword::Width
                    | Keyword::Height
                    | Keyword::Radius
                    | Keyword::Diameter
                    | Keyword::Thickness
                    | Keyword::Dashed
                    | Keyword::Dotted
                    | Keyword::Fill
                    | Keyword::Color
                    | Keyword::Cw
                    | Keyword::Ccw
                    | Keyword::Invisible
                    | Keyword::Thick
                    | Keyword::Thin
                    | Keyword::Solid
                    | Keyword::Chop
                    | Keyword::Fit
                    | Keyword::Close
                    | Keyword::At
                    | Keyword::With
                    | Keyword::Same
                    | Keyword::Above
                    | Keyword::Below
            ),
            _ => false,
        }
    }

    fn parse_define(&mut self) -> Result<StatementKind, Error> {
        self.expect_kw(Keyword::Define)?;
        let name = match self.peek().kind {
            TokenKind::Ident | TokenKind::PlaceName => self.advance().text.clone(),
            _ => return Err(self.error("macro name")),
        };
        let body = self.expect(TokenKind::MacroBody, "macro body")?.text.clone();
        Ok(StatementKind::Define(Define { name, body }))
    }

    fn parse_print(&mut self) -> Result<StatementKind, Error> {
        self.expect_kw(Keyword::Print)?;
        let mut args = Vec::new();
        loop {
            if self.check(TokenKind::String) {
                args.push(PrintArg::String(self.advance().text.clone()));
            } else {
                args.push(PrintArg::Expr(self.parse_expr()?));
            }
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        Ok(StatementKind::Print(args))
    }

    fn parse_assert(&mut self) -> Result<StatementKind, Error> {
        self.expect_kw(Keyword::Assert)?;
        self.expect(TokenKind::LParen, "`(`")?;
        let positions = self.attempt(|p| {
            let left = p.parse_position()?;
            p.expect(TokenKind::EqEq, "`==`")?;
            let right = p.parse_position()?;
            p.expect(TokenKind::RParen, "`)`")?;
            Ok(AssertCondition::SamePosition(left, right))
        });
        if let Some(condition) = positions {
            return Ok(StatementKind::Assert(condition));
        }
        let left = self.parse_expr()?;
        self.expect(TokenKind::EqEq, "`==`")?;
        let right = self.parse_expr()?;
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(StatementKind::Assert(AssertCondition::Equal(left, right)))
    }

    fn parse_assignment(&mut self) -> Result<StatementKind, Error> {
        let name = match self.advance().kind {
            TokenKind::Keyword(kw) => kw.as_str().to_string(),
            _ => self.previous().text.clone(),
        };
        let op = match self.advance().kind {
            TokenKind::Assign(op) => assign_op(op),
            _ => return Err(self.error("assignment operator")),
        };
        let value = self.parse_expr()?;
        Ok(StatementKind::Assignment(Assignment { name, op, value }))
    }

    fn parse_object(&mut self, label: Option<String>) -> Result<ObjectDecl, Error> {
        let base = match self.peek().kind {
            TokenKind::Keyword(kw) if kw.is_class() => {
                self.advance();
                BaseType::Class(class_of(kw))
            }
            TokenKind::String => BaseType::Text(self.parse_text_spec()?),
            TokenKind::LBracket => {
                self.advance();
                let body = self.parse_statements(true)?;
                self.expect(TokenKind::RBracket, "`]`")?;
                BaseType::Sublist(body)
            }
            _ => return Err(self.error("object class")),
        };
        let clauses = self.parse_clauses()?;
        Ok(ObjectDecl {
            label,
            base,
            clauses,
        })
    }

    // =========================================================================
    // CLAUSES
    // =========================================================================

    fn parse_clauses(&mut self) -> Result<Vec<Clause>, Error> {
        let mut clauses = Vec::new();
        while !self.at_statement_end() {
            clauses.push(self.parse_clause()?);
        }
        Ok(clauses)
    }

    fn parse_clause(&mut self) -> Result<Clause, Error> {
        if let TokenKind::Arrow(kind) = self.peek().kind {
            self.advance();
            return Ok(Clause::Flag(match kind {
                ArrowKind::Right => Flag::ArrowRight,
                ArrowKind::Left => Flag::ArrowLeft,
                ArrowKind::Both => Flag::ArrowBoth,
            }));
        }
        if self.check(TokenKind::String) {
            return Ok(Clause::Text(self.parse_text_spec()?));
        }

        let Some(kw) = self.keyword() else {
            return self.parse_leading_expr_clause();
        };
        let clause = match kw {
            Keyword::Width | Keyword::Height | Keyword::Radius | Keyword::Diameter
                if self.check_at(1, TokenKind::Keyword(Keyword::Of)) =>
            {
                return self.parse_leading_expr_clause();
            }
            Keyword::Width
            | Keyword::Height
            | Keyword::Radius
            | Keyword::Diameter
            | Keyword::Thickness => {
                self.advance();
                Clause::Dimension(dimension_of(kw), self.parse_rel_expr()?)
            }
            Keyword::Dashed | Keyword::Dotted => {
                self.advance();
                let style = if kw == Keyword::Dashed {
                    DashStyle::Dashed
                } else {
                    DashStyle::Dotted
                };
                let width = if self.starts_expr() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Clause::Dash(style, width)
            }
            Keyword::Fill => {
                self.advance();
                Clause::Fill(self.parse_expr()?)
            }
            Keyword::Color => {
                self.advance();
                Clause::Color(self.parse_expr()?)
            }
            Keyword::Cw
            | Keyword::Ccw
            | Keyword::Invisible
            | Keyword::Thick
            | Keyword::Thin
            | Keyword::Solid
            | Keyword::Chop
            | Keyword::Fit
            | Keyword::Close => {
                self.advance();
                Clause::Flag(flag_of(kw))
            }
            Keyword::Then => {
                self.advance();
                Clause::Then
            }
            Keyword::Go => {
                self.advance();
                self.parse_movement()?
            }
            Keyword::Left | Keyword::Right
                if self.check_at(1, TokenKind::Keyword(Keyword::Of)) =>
            {
                let relation = if kw == Keyword::Left {
                    Relation::LeftOf
                } else {
                    Relation::RightOf
                };
                self.advance();
                self.advance();
                Clause::Beside(relation, None, self.parse_position()?)
            }
            Keyword::Above | Keyword::Below => {
                self.advance();
                let relation = if kw == Keyword::Above {
                    Relation::Above
                } else {
                    Relation::Below
                };
                Clause::Beside(relation, None, self.parse_position()?)
            }
            Keyword::Up | Keyword::Down | Keyword::Left | Keyword::Right | Keyword::Heading => {
                self.parse_movement()?
            }
            _ if is_compass(kw) => self.parse_movement()?,
            Keyword::From => {
                self.advance();
                Clause::From(self.parse_position()?)
            }
            Keyword::To => {
                self.advance();
                Clause::To(self.parse_position()?)
            }
            Keyword::At => {
                self.advance();
                Clause::At(self.parse_position()?)
            }
            Keyword::With => {
                self.advance();
                self.match_kind(TokenKind::Dot);
                let edge = self.parse_edge()?;
                self.expect_kw(Keyword::At)?;
                Clause::With(edge, self.parse_position()?)
            }
            Keyword::Same => {
                self.advance();
                if self.match_kw(Keyword::As) {
                    Clause::Same(Some(self.parse_object_ref()?))
                } else {
                    Clause::Same(None)
                }
            }
            _ => return self.parse_leading_expr_clause(),
        };
        Ok(clause)
    }

    /// Movement after an optional `go`: `right 2`, `right even with B`,
    /// `2 heading 45`, `heading 45`, `ne`, `1cm sw`.
    fn parse_movement(&mut self) -> Result<Clause, Error> {
        match self.keyword() {
            Some(kw) if kw.is_direction() => {
                self.advance();
                let dir = direction_of(kw);
                if self.check_kw(Keyword::Until) || self.check_kw(Keyword::Even) {
                    self.match_kw(Keyword::Until);
                    self.expect_kw(Keyword::Even)?;
                    self.expect_kw(Keyword::With)?;
                    return Ok(Clause::EvenWith(dir, self.parse_position()?));
                }
                let distance = if self.starts_expr() {
                    Some(self.parse_rel_expr()?)
                } else {
                    None
                };
                Ok(Clause::Move(dir, distance))
            }
            Some(Keyword::Heading) => {
                self.advance();
                Ok(Clause::Heading(None, self.parse_expr()?))
            }
            Some(kw) if is_compass(kw) => {
                self.advance();
                Ok(Clause::Compass(None, edge_of(kw)))
            }
            _ if self.starts_expr() => self.parse_leading_expr_clause(),
            _ => Err(self.error("direction")),
        }
    }

    /// Clauses that open with an expression: a bare distance, a gap before
    /// a relative placement, or a distance before a heading.
    fn parse_leading_expr_clause(&mut self) -> Result<Clause, Error> {
        if !self.starts_expr() {
            return Err(self.error("attribute"));
        }
        let rel = self.parse_rel_expr()?;
        match self.keyword() {
            Some(Keyword::Above | Keyword::Below) => {
                let relation = if self.check_kw(Keyword::Above) {
                    Relation::Above
                } else {
                    Relation::Below
                };
                self.advance();
                Ok(Clause::Beside(relation, Some(rel.expr), self.parse_position()?))
            }
            Some(kw @ (Keyword::Left | Keyword::Right))
                if self.check_at(1, TokenKind::Keyword(Keyword::Of)) =>
            {
                self.advance();
                self.advance();
                let relation = if kw == Keyword::Left {
                    Relation::LeftOf
                } else {
                    Relation::RightOf
                };
                Ok(Clause::Beside(relation, Some(rel.expr), self.parse_position()?))
            }
            Some(Keyword::Heading) => {
                self.advance();
                Ok(Clause::Heading(Some(rel), self.parse_expr()?))
            }
            Some(kw) if is_compass(kw) => {
                self.advance();
                Ok(Clause::Compass(Some(rel), edge_of(kw)))
            }
            _ => Ok(Clause::Distance(rel)),
        }
    }

    fn parse_text_spec(&mut self) -> Result<TextSpec, Error> {
        let value = self.expect(TokenKind::String, "string")?.text.clone();
        let mut attrs = Vec::new();
        while let Some(kw) = self.keyword() {
            if !kw.is_text_attr() {
                break;
            }
            // "B" above A places the object; "B" above styles the text
            if matches!(kw, Keyword::Above | Keyword::Below) && self.place_follows(1) {
                break;
            }
            self.advance();
            attrs.push(match kw {
                Keyword::Above => TextAttr::Above,
                Keyword::Below => TextAttr::Below,
                Keyword::Center => TextAttr::Center,
                Keyword::Ljust => TextAttr::LJust,
                Keyword::Rjust => TextAttr::RJust,
                Keyword::Bold => TextAttr::Bold,
                Keyword::Italic => TextAttr::Italic,
                Keyword::Mono => TextAttr::Mono,
                Keyword::Big => TextAttr::Big,
                Keyword::Small => TextAttr::Small,
                _ => TextAttr::Aligned,
            });
        }
        Ok(TextSpec { value, attrs })
    }

    fn place_follows(&self, n: usize) -> bool {
        match self.peek_at(n).kind {
            TokenKind::PlaceName | TokenKind::Ordinal | TokenKind::LParen => true,
            TokenKind::Keyword(kw) => matches!(
                kw,
                Keyword::Last | Keyword::First | Keyword::Previous | Keyword::This
            ),
            _ => false,
        }
    }

    fn parse_edge(&mut self) -> Result<EdgePoint, Error> {
        match self.keyword() {
            Some(kw) if kw.is_edge() => {
                self.advance();
                Ok(edge_of(kw))
            }
            _ => Err(self.error("compass point")),
        }
    }
}

fn direction_of(kw: Keyword) -> Direction {
    match kw {
        Keyword::Up => Direction::Up,
        Keyword::Down => Direction::Down,
        Keyword::Left => Direction::Left,
        _ => Direction::Right,
    }
}

/// Compass points that can also be used as a movement: `line ne`.
fn is_compass(kw: Keyword) -> bool {
    matches!(
        kw,
        Keyword::North
            | Keyword::South
            | Keyword::East
            | Keyword::West
            | Keyword::NorthEast
            | Keyword::NorthWest
            | Keyword::SouthEast
            | Keyword::SouthWest
    )
}

fn edge_of(kw: Keyword) -> EdgePoint {
    match kw {
        Keyword::North => EdgePoint::North,
        Keyword::South => EdgePoint::South,
        Keyword::East | Keyword::Right => EdgePoint::East,
        Keyword::West | Keyword::Left => EdgePoint::West,
        Keyword::NorthEast => EdgePoint::NorthEast,
        Keyword::NorthWest => EdgePoint::NorthWest,
        Keyword::SouthEast => EdgePoint::SouthEast,
        Keyword::SouthWest => EdgePoint::SouthWest,
        Keyword::Start => EdgePoint::Start,
        Keyword::End => EdgePoint::End,
        _ => EdgePoint::Center,
    }
}

fn class_of(kw: Keyword) -> ClassName {
    match kw {
        Keyword::Arc => ClassName::Arc,
        Keyword::Arrow => ClassName::Arrow,
        Keyword::Circle => ClassName::Circle,
        Keyword::Cylinder => ClassName::Cylinder,
        Keyword::Diamond => ClassName::Diamond,
        Keyword::Dot => ClassName::Dot,
        Keyword::Ellipse => ClassName::Ellipse,
        Keyword::File => ClassName::File,
        Keyword::Line => ClassName::Line,
        Keyword::Move => ClassName::Move,
        Keyword::Oval => ClassName::Oval,
        Keyword::Spline => ClassName::Spline,
        Keyword::Text => ClassName::Text,
        _ => ClassName::Box,
    }
}

fn dimension_of(kw: Keyword) -> Dimension {
    match kw {
        Keyword::Height => Dimension::Height,
        Keyword::Radius => Dimension::Radius,
        Keyword::Diameter => Dimension::Diameter,
        Keyword::Thickness => Dimension::Thickness,
        _ => Dimension::Width,
    }
}

fn flag_of(kw: Keyword) -> Flag {
    match kw {
        Keyword::Cw => Flag::Clockwise,
        Keyword::Ccw => Flag::CounterClockwise,
        Keyword::Invisible => Flag::Invisible,
        Keyword::Thick => Flag::Thick,
        Keyword::Thin => Flag::Thin,
        Keyword::Solid => Flag::Solid,
        Keyword::Chop => Flag::Chop,
        Keyword::Fit => Flag::Fit,
        _ => Flag::Close,
    }
}

fn assign_op(op: crate::lexer::AssignOp) -> AssignOp {
    use crate::lexer::AssignOp as Lex;
    match op {
        Lex::Set => AssignOp::Set,
        Lex::Add => AssignOp::Add,
        Lex::Sub => AssignOp::Sub,
        Lex::Mul => AssignOp::Mul,
        Lex::Div => AssignOp::Div,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(src: &str) -> Vec<StatementKind> {
        parse(src)
            .unwrap()
            .statements
            .into_iter()
            .map(|s| s.kind)
            .collect()
    }

    fn object(src: &str) -> ObjectDecl {
        match statements(src).pop() {
            Some(StatementKind::Object(decl)) => decl,
            other => panic!("expected an object, got {other:?}"),
        }
    }

    // ==================== Statement tests ====================

    #[test]
    fn statement_kinds() {
        let kinds = statements(
            "right\n$x = 1\nboxwid *= 2\nfill = Red\nprint \"x\", $x\nA: (1, 2)\nbox\nfill blue",
        );
        assert!(matches!(kinds[0], StatementKind::Direction(Direction::Right)));
        assert!(matches!(&kinds[1], StatementKind::Assignment(a) if a.name == "$x"));
        assert!(
            matches!(&kinds[2], StatementKind::Assignment(a) if a.name == "boxwid" && a.op == AssignOp::Mul)
        );
        assert!(matches!(&kinds[3], StatementKind::Assignment(a) if a.name == "fill"));
        assert!(matches!(&kinds[4], StatementKind::Print(args) if args.len() == 2));
        assert!(matches!(&kinds[5], StatementKind::PlaceLabel { label, .. } if label == "A"));
        assert!(matches!(&kinds[6], StatementKind::Object(_)));
        assert!(matches!(&kinds[7], StatementKind::Refine(c) if c.len() == 1));
    }

    #[test]
    fn statement_lines_are_recorded() {
        let program = parse("box\n\n  circle; line").unwrap();
        let lines: Vec<_> = program.statements.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 3, 3]);
    }

    #[test]
    fn labelled_object() {
        let decl = object("Main: box \"hi\" bold");
        assert_eq!(decl.label.as_deref(), Some("Main"));
        assert!(matches!(decl.base, BaseType::Class(ClassName::Box)));
        assert!(
            matches!(&decl.clauses[0], Clause::Text(t) if t.value == "hi" && t.attrs == vec![TextAttr::Bold])
        );
    }

    #[test]
    fn string_statement_is_a_text_object() {
        let decl = object("\"hello\" ljust");
        assert!(matches!(decl.base, BaseType::Text(ref t) if t.attrs == vec![TextAttr::LJust]));
    }

    #[test]
    fn sublists_nest() {
        let decl = object("[ box; circle\n line ] fill red");
        match decl.base {
            BaseType::Sublist(body) => assert_eq!(body.len(), 3),
            other => panic!("expected sublist, got {other:?}"),
        }
        assert_eq!(decl.clauses.len(), 1);
    }

    #[test]
    fn define_survives_as_a_statement() {
        let kinds = statements("define blob { circle }\nblob");
        assert!(matches!(&kinds[0], StatementKind::Define(d) if d.name == "blob"));
        assert!(matches!(&kinds[1], StatementKind::Object(_)));
    }

    // ==================== Clause tests ====================

    #[test]
    fn line_clauses() {
        let decl = object("arrow from A.s right 1cm then down 50% then to (1,2) chop ->");
        let names: Vec<_> = decl.clauses.iter().map(Clause::name).collect();
        assert_eq!(
            names,
            vec!["from", "direction", "then", "direction", "then", "to", "chop", "->"]
        );
        assert!(matches!(&decl.clauses[3], Clause::Move(Direction::Down, Some(r)) if r.is_percent));
    }

    #[test]
    fn relative_placement() {
        let decl = object("box \"B\" right of A");
        assert!(matches!(&decl.clauses[0], Clause::Text(t) if t.attrs.is_empty()));
        assert!(matches!(&decl.clauses[1], Clause::Beside(Relation::RightOf, None, _)));

        let decl = object("box \"B\" above A");
        assert!(matches!(&decl.clauses[1], Clause::Beside(Relation::Above, None, _)));

        let decl = object("box \"B\" above");
        assert!(matches!(&decl.clauses[0], Clause::Text(t) if t.attrs == vec![TextAttr::Above]));

        let decl = object("circle 1cm below last box");
        assert!(matches!(&decl.clauses[0], Clause::Beside(Relation::Below, Some(_), _)));
    }

    #[test]
    fn movement_forms() {
        let decl = object("line go 1 heading 45 then ne then 2cm sw right until even with B");
        let names: Vec<_> = decl.clauses.iter().map(Clause::name).collect();
        assert_eq!(
            names,
            vec!["heading", "then", "compass move", "then", "compass move", "even with"]
        );
    }

    #[test]
    fn style_clauses() {
        let decl = object("box wid 2 ht 1 rad 0.1 dashed dotted 0.02 fill 0xff0000 color Red thick invis same");
        assert_eq!(decl.clauses.len(), 10);
        assert!(matches!(&decl.clauses[3], Clause::Dash(DashStyle::Dashed, None)));
        assert!(matches!(&decl.clauses[4], Clause::Dash(DashStyle::Dotted, Some(_))));
    }

    #[test]
    fn with_clause_accepts_both_spellings() {
        for src in ["box with .n at (0,0)", "box with n at (0,0)", "box with .start at A"] {
            let decl = object(src);
            assert!(matches!(decl.clauses[0], Clause::With(..)), "{src}");
        }
    }

    #[test]
    fn same_as_reference() {
        let decl = object("circle same as 2nd last circle");
        assert!(matches!(
            &decl.clauses[0],
            Clause::Same(Some(ObjectRef::Nth(Ordinal::Last(2), Some(NthClass::Class(ClassName::Circle)))))
        ));
    }

    // ==================== Error tests ====================

    #[test]
    fn errors_name_the_expected_class_and_line() {
        let err = parse("box\nbox at").unwrap_err();
        assert_eq!(err.line(), 2);
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("expected"), "{err}");

        let err = parse("box wid 1 )").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 1: expected attribute, found `)`"
        );
    }

    #[test]
    fn unclosed_sublist() {
        let err = parse("[ box").unwrap_err();
        assert_eq!(err.to_string(), "line 1: expected `]`, found end of input");
    }

    #[test]
    fn lex_errors_pass_through() {
        let err = parse("box \"open").unwrap_err();
        assert!(matches!(err, Error::Lex(_)));
    }
}
