//! Expression and position evaluation.
//!
//! Everything resolves against the objects already in the arena: a name
//! that is not there yet is an error on the referencing line.

use crate::ast::{
    BinaryOp, Coord, Dimension, Expr, Function, NthClass, ObjectRef, Ordinal, Place, Position,
    UnaryOp,
};
use crate::errors::{Error, EvalErrorKind};
use crate::types::{Length as Inches, OffsetIn, Point, PtIn, UnitVec};

use super::object::ObjectId;
use super::vars::color_by_name;
use super::{Engine, Symbol};

impl Engine {
    pub(super) fn eval_expr(&self, expr: &Expr) -> Result<f64, Error> {
        let value = match expr {
            Expr::Number(value) => *value,
            Expr::Variable(name) => self.variable(name)?,
            Expr::Call(function, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg)?);
                }
                self.call(*function, &values)?
            }
            Expr::Dist(a, b) => {
                let a = self.eval_position(a)?;
                let b = self.eval_position(b)?;
                a.distance(b).raw()
            }
            Expr::Property(object, dimension) => {
                let obj = &self.objects[self.resolve_object(object)?.0];
                match dimension {
                    Dimension::Width => obj.width.raw(),
                    Dimension::Height => obj.height.raw(),
                    Dimension::Radius => obj.radius.raw(),
                    Dimension::Diameter => obj.radius.raw() * 2.0,
                    Dimension::Thickness => obj.style.thickness.raw(),
                }
            }
            Expr::Coord(position, coord) => {
                let p = self.eval_position(position)?;
                match coord {
                    Coord::X => p.x.raw(),
                    Coord::Y => p.y.raw(),
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                let l = self.eval_expr(lhs)?;
                let r = self.eval_expr(rhs)?;
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(self.eval_error(EvalErrorKind::DivisionByZero));
                        }
                        l / r
                    }
                }
            }
            Expr::Unary(UnaryOp::Neg, operand) => -self.eval_expr(operand)?,
            Expr::Unary(UnaryOp::Pos, operand) => self.eval_expr(operand)?,
        };
        self.finite(value)
    }

    pub(super) fn finite(&self, value: f64) -> Result<f64, Error> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.eval_error(EvalErrorKind::NotFinite))
        }
    }

    fn variable(&self, name: &str) -> Result<f64, Error> {
        if let Some(value) = self.vars.get(name) {
            return Ok(value);
        }
        if let Some(value) = color_by_name(name) {
            return Ok(value);
        }
        let help = self.lookup_name(name).map(|_| {
            format!("`{name}` names an object; use `{name}.x` or `{name}.wid` to read its geometry")
        });
        Err(self.unresolved(name, help))
    }

    fn call(&self, function: Function, args: &[f64]) -> Result<f64, Error> {
        let x = args.first().copied().unwrap_or(0.0);
        let y = args.get(1).copied().unwrap_or(0.0);
        Ok(match function {
            Function::Abs => x.abs(),
            Function::Cos => x.to_radians().cos(),
            Function::Sin => x.to_radians().sin(),
            Function::Int => x.trunc(),
            Function::Sqrt => {
                if x < 0.0 {
                    return Err(self.eval_error(EvalErrorKind::Domain {
                        function: "sqrt",
                        value: x,
                    }));
                }
                x.sqrt()
            }
            Function::Max => x.max(y),
            Function::Min => x.min(y),
        })
    }

    pub(super) fn eval_position(&self, position: &Position) -> Result<PtIn, Error> {
        let point = match position {
            Position::Coords(x, y) => PtIn::inches(self.eval_expr(x)?, self.eval_expr(y)?),
            Position::Tuple(a, b) => {
                Point::new(self.eval_position(a)?.x, self.eval_position(b)?.y)
            }
            Position::Place(place) => self.eval_place(place)?,
            Position::Offset(base, op, dx, dy) => {
                let base = self.eval_position(base)?;
                let by = OffsetIn::inches(self.eval_expr(dx)?, self.eval_expr(dy)?);
                match op {
                    BinaryOp::Sub => base - by,
                    _ => base + by,
                }
            }
            Position::Between(fraction, a, b) => {
                let t = self.eval_expr(fraction)?;
                self.eval_position(a)?.lerp(self.eval_position(b)?, t)
            }
            Position::Relative(distance, relation, base) => {
                let d = Inches(self.eval_expr(distance)?);
                self.eval_position(base)? + relation.direction().unit() * d
            }
            Position::Heading(distance, angle, base) => {
                let d = Inches(self.eval_expr(distance)?);
                let unit = UnitVec::from_heading(self.eval_expr(angle)?);
                self.eval_position(base)? + unit * d
            }
            Position::CompassOf(distance, edge, base) => {
                let d = Inches(self.eval_expr(distance)?);
                self.eval_position(base)? + edge.unit() * d
            }
        };
        if point.is_finite() {
            Ok(point)
        } else {
            Err(self.eval_error(EvalErrorKind::NotFinite))
        }
    }

    fn eval_place(&self, place: &Place) -> Result<PtIn, Error> {
        match place {
            Place::Object(object) => match self.resolve(object)? {
                Symbol::Object(id) => Ok(self.objects[id.0].center),
                Symbol::Place(point) => Ok(point),
            },
            Place::Edge(object, edge) => match self.resolve(object)? {
                Symbol::Object(id) => Ok(self.objects[id.0].anchor(*edge)),
                Symbol::Place(point) => Ok(point),
            },
            Place::Vertex(ordinal, object) => {
                let obj = &self.objects[self.resolve_object(object)?.0];
                let vertex = match *ordinal {
                    Ordinal::First(n) => obj.vertex(n as usize, false),
                    Ordinal::Last(n) => obj.vertex(n as usize, true),
                };
                vertex.ok_or_else(|| {
                    let name = format!("{} vertex of {}", ordinal_name(*ordinal), describe(object));
                    let help = format!("it has {} vertices", obj.path.len());
                    self.unresolved(&name, Some(help))
                })
            }
        }
    }

    /// The object a position names directly, if it is a bare object
    /// reference. Used for chopping and for `right of X`.
    pub(super) fn object_at(&self, position: &Position) -> Result<Option<ObjectId>, Error> {
        match position {
            Position::Place(Place::Object(object)) => match self.resolve(object)? {
                Symbol::Object(id) => Ok(Some(id)),
                Symbol::Place(_) => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub(super) fn resolve_object(&self, object: &ObjectRef) -> Result<ObjectId, Error> {
        match self.resolve(object)? {
            Symbol::Object(id) => Ok(id),
            Symbol::Place(_) => Err(self.unresolved(
                &describe(object),
                Some("this names a position, not an object".to_string()),
            )),
        }
    }

    fn resolve(&self, object: &ObjectRef) -> Result<Symbol, Error> {
        let found = match object {
            ObjectRef::Named(path) => return self.resolve_path(path),
            ObjectRef::Nth(ordinal, class) => self.nth(*ordinal, *class),
            ObjectRef::Previous => self.scope.members.last().copied(),
            ObjectRef::This => self.building,
        };
        found
            .map(Symbol::Object)
            .ok_or_else(|| self.unresolved(&describe(object), None))
    }

    fn resolve_path(&self, path: &[String]) -> Result<Symbol, Error> {
        let Some((first, rest)) = path.split_first() else {
            return Err(self.unresolved("", None));
        };
        let mut symbol = self
            .lookup_name(first)
            .ok_or_else(|| self.unresolved(first, None))?;
        for name in rest {
            let Symbol::Object(parent) = symbol else {
                return Err(self.unresolved(&path.join("."), None));
            };
            let child = self
                .find_child(parent, name)
                .ok_or_else(|| self.unresolved(&path.join("."), None))?;
            symbol = Symbol::Object(child);
        }
        Ok(symbol)
    }

    /// Innermost scope first; within a scope labels win over text.
    pub(super) fn lookup_name(&self, name: &str) -> Option<Symbol> {
        let scopes = std::iter::once(&self.scope).chain(self.outer.iter().rev());
        for scope in scopes {
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(*symbol);
            }
            let by_text = scope
                .members
                .iter()
                .rev()
                .find(|id| self.objects[id.0].first_text() == Some(name));
            if let Some(id) = by_text {
                return Some(Symbol::Object(*id));
            }
        }
        None
    }

    fn find_child(&self, parent: ObjectId, name: &str) -> Option<ObjectId> {
        let children = &self.objects[parent.0].children;
        children
            .iter()
            .rev()
            .find(|id| self.objects[id.0].label.as_deref() == Some(name))
            .or_else(|| {
                children
                    .iter()
                    .rev()
                    .find(|id| self.objects[id.0].first_text() == Some(name))
            })
            .copied()
    }

    fn nth(&self, ordinal: Ordinal, class: Option<NthClass>) -> Option<ObjectId> {
        let mut matching = self
            .scope
            .members
            .iter()
            .copied()
            .filter(|id| class.is_none_or(|c| self.objects[id.0].class.matches(c)));
        match ordinal {
            Ordinal::First(n) => matching.nth((n as usize).checked_sub(1)?),
            Ordinal::Last(n) => matching.rev().nth((n as usize).checked_sub(1)?),
        }
    }
}

/// `1st`, `2nd`, `3rd`, `11th`...
fn ordinal_suffix(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn ordinal_name(ordinal: Ordinal) -> String {
    match ordinal {
        Ordinal::First(1) => "first".to_string(),
        Ordinal::Last(1) => "last".to_string(),
        Ordinal::First(n) => ordinal_suffix(n),
        Ordinal::Last(n) => format!("{} last", ordinal_suffix(n)),
    }
}

/// How a reference reads in a diagnostic.
pub(super) fn describe(object: &ObjectRef) -> String {
    match object {
        ObjectRef::Named(path) => path.join("."),
        ObjectRef::Nth(ordinal, None) => ordinal_name(*ordinal),
        ObjectRef::Nth(ordinal, Some(NthClass::Class(class))) => {
            format!("{} {}", ordinal_name(*ordinal), class.as_str())
        }
        ObjectRef::Nth(ordinal, Some(NthClass::Sublist)) => format!("{} []", ordinal_name(*ordinal)),
        ObjectRef::Previous => "previous".to_string(),
        ObjectRef::This => "this".to_string(),
    }
}
