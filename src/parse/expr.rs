//! Expressions, positions, places and object references.

use super::{Parser, edge_of};
use crate::ast::*;
use crate::errors::Error;
use crate::lexer::{Keyword, TokenKind};

impl Parser<'_> {
    /// Whether the next token can begin an optional expression.
    ///
    /// Attribute keywords that double as variables (`fill`, `thickness`)
    /// only count when an expression is mandatory.
    pub(super) fn starts_expr(&self) -> bool {
        match self.peek().kind {
            TokenKind::Number
            | TokenKind::Percent
            | TokenKind::Variable
            | TokenKind::Ident
            | TokenKind::PlaceName
            | TokenKind::Ordinal
            | TokenKind::LParen
            | TokenKind::Minus
            | TokenKind::Plus => true,
            TokenKind::Keyword(kw) => match kw {
                Keyword::Last | Keyword::First | Keyword::Previous | Keyword::This => true,
                Keyword::Dist => true,
                Keyword::Width | Keyword::Height | Keyword::Radius | Keyword::Diameter => {
                    self.check_at(1, TokenKind::Keyword(Keyword::Of))
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// An expression that may be written as a bare percentage.
    pub(super) fn parse_rel_expr(&mut self) -> Result<RelExpr, Error> {
        if self.check(TokenKind::Percent) {
            let tok = self.advance();
            return Ok(RelExpr {
                expr: Expr::Number(tok.value.unwrap_or(0.0)),
                is_percent: true,
            });
        }
        Ok(RelExpr {
            expr: self.parse_expr()?,
            is_percent: false,
        })
    }

    pub(super) fn parse_expr(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_primary(),
        };
        self.advance();
        Ok(Expr::Unary(op, Box::new(self.parse_unary()?)))
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Number(tok.value.unwrap_or(0.0)))
            }
            TokenKind::Variable => {
                self.advance();
                Ok(Expr::Variable(tok.text.clone()))
            }
            TokenKind::Ident => match Function::from_name(&tok.text) {
                Some(function) if self.check_at(1, TokenKind::LParen) => self.parse_call(function),
                _ => {
                    self.advance();
                    Ok(Expr::Variable(tok.text.clone()))
                }
            },
            TokenKind::PlaceName if !self.check_at(1, TokenKind::Dot) => {
                self.advance();
                Ok(Expr::Variable(tok.text.clone()))
            }
            TokenKind::PlaceName | TokenKind::Ordinal => self.parse_object_suffix(),
            TokenKind::Keyword(Keyword::Last | Keyword::First | Keyword::Previous | Keyword::This) => {
                self.parse_object_suffix()
            }
            TokenKind::Keyword(kw @ (Keyword::Fill | Keyword::Color | Keyword::Thickness)) => {
                self.advance();
                Ok(Expr::Variable(kw.as_str().to_string()))
            }
            TokenKind::Keyword(
                kw @ (Keyword::Width | Keyword::Height | Keyword::Radius | Keyword::Diameter),
            ) => {
                self.advance();
                self.expect_kw(Keyword::Of)?;
                let object = self.parse_object_ref()?;
                Ok(Expr::Property(object, super::dimension_of(kw)))
            }
            TokenKind::Keyword(Keyword::Dist) => {
                self.advance();
                self.expect(TokenKind::LParen, "`(`")?;
                let a = self.parse_position()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let b = self.parse_position()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(Expr::Dist(Box::new(a), Box::new(b)))
            }
            TokenKind::LParen => {
                let grouped = self.attempt(|p| {
                    p.advance();
                    let inner = p.parse_expr()?;
                    p.expect(TokenKind::RParen, "`)`")?;
                    Ok(inner)
                });
                if let Some(inner) = grouped {
                    return Ok(inner);
                }
                // `(A, B).x`, `(1, 2).y`
                let position = self.parse_paren_position()?;
                let coord = self.parse_coord_suffix()?;
                Ok(Expr::Coord(Box::new(position), coord))
            }
            _ => Err(self.error("expression")),
        }
    }

    fn parse_call(&mut self, function: Function) -> Result<Expr, Error> {
        self.advance();
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = vec![self.parse_expr()?];
        while self.match_kind(TokenKind::Comma) {
            args.push(self.parse_expr()?);
        }
        if args.len() != function.arity() {
            return Err(self.error(&format!(
                "{} argument(s) to {}",
                function.arity(),
                function.as_str()
            )));
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(Expr::Call(function, args))
    }

    /// An object reference used as a value: `A.x`, `last box.wid`,
    /// `B.ne.y`.
    fn parse_object_suffix(&mut self) -> Result<Expr, Error> {
        let object = self.parse_object_ref()?;
        self.expect(TokenKind::Dot, "`.`")?;
        match self.keyword() {
            Some(kw @ (Keyword::Width
            | Keyword::Height
            | Keyword::Radius
            | Keyword::Diameter
            | Keyword::Thickness)) => {
                self.advance();
                Ok(Expr::Property(object, super::dimension_of(kw)))
            }
            Some(kw) if kw.is_edge() => {
                self.advance();
                let coord = self.parse_coord_suffix()?;
                let place = Place::Edge(object, edge_of(kw));
                Ok(Expr::Coord(Box::new(Position::Place(place)), coord))
            }
            _ => {
                let coord = self.parse_coord()?;
                Ok(Expr::Coord(
                    Box::new(Position::Place(Place::Object(object))),
                    coord,
                ))
            }
        }
    }

    fn parse_coord_suffix(&mut self) -> Result<Coord, Error> {
        self.expect(TokenKind::Dot, "`.x` or `.y`")?;
        self.parse_coord()
    }

    fn parse_coord(&mut self) -> Result<Coord, Error> {
        let tok = self.peek();
        let coord = match (tok.kind, tok.text.as_str()) {
            (TokenKind::Ident, "x") => Coord::X,
            (TokenKind::Ident, "y") => Coord::Y,
            _ => return Err(self.error("`x` or `y`")),
        };
        self.advance();
        Ok(coord)
    }

    /// A `.x`, `.y` or `.wid`-style suffix follows: what looked like a
    /// place is really the start of an expression.
    fn at_value_suffix(&self) -> bool {
        if !self.check(TokenKind::Dot) {
            return false;
        }
        let next = self.peek_at(1);
        match next.kind {
            TokenKind::Ident => matches!(next.text.as_str(), "x" | "y"),
            TokenKind::Keyword(kw) => matches!(
                kw,
                Keyword::Width
                    | Keyword::Height
                    | Keyword::Radius
                    | Keyword::Diameter
                    | Keyword::Thickness
            ),
            _ => false,
        }
    }

    // =========================================================================
    // POSITIONS
    // =========================================================================

    pub(super) fn parse_position(&mut self) -> Result<Position, Error> {
        if self.starts_place() {
            let place = self.attempt(|p| {
                let place = p.parse_place()?;
                if p.at_value_suffix() {
                    return Err(p.error("position"));
                }
                Ok(place)
            });
            if let Some(place) = place {
                return self.parse_position_tail(Position::Place(place));
            }
        }
        if self.check(TokenKind::LParen) {
            let paren = self.attempt(|p| {
                let position = p.parse_paren_position()?;
                if p.check(TokenKind::Dot) {
                    return Err(p.error("position"));
                }
                p.parse_position_tail(position)
            });
            if let Some(position) = paren {
                return Ok(position);
            }
        }
        let leading = self.parse_expr()?;
        let position = self.parse_expr_position(leading)?;
        self.parse_position_tail(position)
    }

    /// `( position )` or `( position , position )`.
    fn parse_paren_position(&mut self) -> Result<Position, Error> {
        self.expect(TokenKind::LParen, "`(`")?;
        let first = self.parse_position()?;
        let position = if self.match_kind(TokenKind::Comma) {
            let second = self.parse_position()?;
            Position::Tuple(Box::new(first), Box::new(second))
        } else {
            first
        };
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(position)
    }

    /// Everything that can follow a leading expression in a position.
    fn parse_expr_position(&mut self, leading: Expr) -> Result<Position, Error> {
        match self.peek().kind {
            TokenKind::Comma => {
                self.advance();
                let y = self.parse_expr()?;
                Ok(Position::Coords(leading, y))
            }
            TokenKind::Lt => {
                self.advance();
                let a = self.parse_position()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let b = self.parse_position()?;
                self.expect(TokenKind::Gt, "`>`")?;
                Ok(Position::Between(leading, Box::new(a), Box::new(b)))
            }
            TokenKind::Keyword(Keyword::Between) => {
                self.advance();
                self.parse_between(leading)
            }
            TokenKind::Keyword(Keyword::Of) if self.check_at(1, TokenKind::Keyword(Keyword::The)) => {
                self.advance();
                self.advance();
                self.expect_kw(Keyword::Way)?;
                self.expect_kw(Keyword::Between)?;
                self.parse_between(leading)
            }
            TokenKind::Keyword(kw @ (Keyword::Above | Keyword::Below)) => {
                self.advance();
                let relation = if kw == Keyword::Above {
                    Relation::Above
                } else {
                    Relation::Below
                };
                let base = self.parse_position()?;
                Ok(Position::Relative(leading, relation, Box::new(base)))
            }
            TokenKind::Keyword(kw @ (Keyword::Left | Keyword::Right))
                if self.check_at(1, TokenKind::Keyword(Keyword::Of)) =>
            {
                self.advance();
                self.advance();
                let relation = if kw == Keyword::Left {
                    Relation::LeftOf
                } else {
                    Relation::RightOf
                };
                let base = self.parse_position()?;
                Ok(Position::Relative(leading, relation, Box::new(base)))
            }
            TokenKind::Keyword(Keyword::Heading) => {
                self.advance();
                self.parse_heading_from(leading)
            }
            TokenKind::Keyword(Keyword::At) if self.check_at(1, TokenKind::Keyword(Keyword::Angle)) => {
                self.advance();
                self.advance();
                self.parse_heading_from(leading)
            }
            TokenKind::Keyword(kw)
                if kw.is_edge() && self.check_at(1, TokenKind::Keyword(Keyword::Of)) =>
            {
                self.advance();
                self.advance();
                let base = self.parse_position()?;
                Ok(Position::CompassOf(leading, edge_of(kw), Box::new(base)))
            }
            _ => Err(self.error("position")),
        }
    }

    fn parse_between(&mut self, fraction: Expr) -> Result<Position, Error> {
        let a = self.parse_position()?;
        self.expect_kw(Keyword::And)?;
        let b = self.parse_position()?;
        Ok(Position::Between(fraction, Box::new(a), Box::new(b)))
    }

    fn parse_heading_from(&mut self, distance: Expr) -> Result<Position, Error> {
        let angle = self.parse_expr()?;
        self.expect_kw(Keyword::From)?;
        let base = self.parse_position()?;
        Ok(Position::Heading(distance, angle, Box::new(base)))
    }

    /// `position + (dx, dy)`, `position - dx, dy`, repeated.
    fn parse_position_tail(&mut self, mut position: Position) -> Result<Position, Error> {
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(position),
            };
            self.advance();
            let pair = if self.check(TokenKind::LParen) {
                self.attempt(|p| {
                    p.advance();
                    let dx = p.parse_expr()?;
                    p.expect(TokenKind::Comma, "`,`")?;
                    let dy = p.parse_expr()?;
                    p.expect(TokenKind::RParen, "`)`")?;
                    Ok((dx, dy))
                })
            } else {
                None
            };
            let (dx, dy) = match pair {
                Some(pair) => pair,
                None => {
                    let dx = self.parse_expr()?;
                    self.expect(TokenKind::Comma, "`,`")?;
                    (dx, self.parse_expr()?)
                }
            };
            position = Position::Offset(Box::new(position), op, dx, dy);
        }
    }

    // =========================================================================
    // PLACES AND OBJECT REFERENCES
    // =========================================================================

    fn starts_place(&self) -> bool {
        match self.peek().kind {
            TokenKind::PlaceName | TokenKind::Ordinal => true,
            TokenKind::Keyword(kw) => match kw {
                Keyword::Last | Keyword::First | Keyword::Previous | Keyword::This => true,
                _ => {
                    kw.is_edge()
                        && !matches!(kw, Keyword::Left | Keyword::Right)
                        && self.check_at(1, TokenKind::Keyword(Keyword::Of))
                }
            },
            _ => false,
        }
    }

    fn parse_place(&mut self) -> Result<Place, Error> {
        // `n of A`, `start of last arrow`
        if let Some(kw) = self.keyword() {
            if kw.is_edge() && self.check_at(1, TokenKind::Keyword(Keyword::Of)) {
                self.advance();
                self.advance();
                let object = self.parse_object_ref()?;
                return Ok(Place::Edge(object, edge_of(kw)));
            }
        }

        // `2nd vertex of A`, `last vertex of A`
        let vertex_ordinal = match self.peek().kind {
            TokenKind::Ordinal if self.check_at(1, TokenKind::Keyword(Keyword::Vertex)) => {
                Some(Ordinal::First(self.ordinal_value()))
            }
            TokenKind::Keyword(Keyword::First)
                if self.check_at(1, TokenKind::Keyword(Keyword::Vertex)) =>
            {
                Some(Ordinal::First(1))
            }
            TokenKind::Keyword(Keyword::Last)
                if self.check_at(1, TokenKind::Keyword(Keyword::Vertex)) =>
            {
                Some(Ordinal::Last(1))
            }
            _ => None,
        };
        if let Some(ordinal) = vertex_ordinal {
            self.advance();
            self.advance();
            self.expect_kw(Keyword::Of)?;
            let object = self.parse_object_ref()?;
            return Ok(Place::Vertex(ordinal, object));
        }

        let object = self.parse_object_ref()?;
        if self.check(TokenKind::Dot) {
            if let TokenKind::Keyword(kw) = self.peek_at(1).kind {
                if kw.is_edge() {
                    self.advance();
                    self.advance();
                    return Ok(Place::Edge(object, edge_of(kw)));
                }
            }
        }
        Ok(Place::Object(object))
    }

    fn ordinal_value(&self) -> u32 {
        self.peek().value.map(|v| v as u32).unwrap_or(1).max(1)
    }

    pub(super) fn parse_object_ref(&mut self) -> Result<ObjectRef, Error> {
        match self.peek().kind {
            TokenKind::PlaceName => {
                let mut path = vec![self.advance().text.clone()];
                while self.check(TokenKind::Dot) && self.check_at(1, TokenKind::PlaceName) {
                    self.advance();
                    path.push(self.advance().text.clone());
                }
                Ok(ObjectRef::Named(path))
            }
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                Ok(ObjectRef::This)
            }
            TokenKind::Keyword(Keyword::Previous) => {
                self.advance();
                Ok(ObjectRef::Previous)
            }
            TokenKind::Keyword(Keyword::First) => {
                self.advance();
                Ok(ObjectRef::Nth(Ordinal::First(1), self.parse_nth_class()))
            }
            TokenKind::Keyword(Keyword::Last) => {
                self.advance();
                Ok(ObjectRef::Nth(Ordinal::Last(1), self.parse_nth_class()))
            }
            TokenKind::Ordinal => {
                let n = self.ordinal_value();
                self.advance();
                let ordinal = if self.match_kw(Keyword::Last) {
                    Ordinal::Last(n)
                } else {
                    Ordinal::First(n)
                };
                Ok(ObjectRef::Nth(ordinal, self.parse_nth_class()))
            }
            _ => Err(self.error("object reference")),
        }
    }

    fn parse_nth_class(&mut self) -> Option<NthClass> {
        match self.peek().kind {
            TokenKind::Keyword(kw) if kw.is_class() => {
                self.advance();
                Some(NthClass::Class(super::class_of(kw)))
            }
            TokenKind::LBracket if self.check_at(1, TokenKind::RBracket) => {
                self.advance();
                self.advance();
                Some(NthClass::Sublist)
            }
            _ => None,
        }
    }
}
