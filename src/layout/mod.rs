//! Layout: statements in, placed objects out.
//!
//! Objects are appended to an arena as their statements are reached, so
//! every reference resolves eagerly against what is already placed. The
//! cursor, scopes and variable table are threaded through an [`Engine`]
//! that lives for one compilation.

mod cursor;
mod eval;
pub mod object;
mod path_builder;
pub mod vars;

use std::collections::HashMap;

use crate::ast::{
    AssertCondition, AssignOp, Assignment, BaseType, ClassName, Clause, DashStyle, Dimension,
    EdgePoint, Flag, ObjectDecl, ObjectRef, Position, PrintArg, Program, Relation, RelExpr,
    Statement, StatementKind,
};
use crate::errors::{
    AssertionFailed, DegenerateGeometry, DegenerateKind, Error, EvalError, EvalErrorKind,
    LimitKind, ResourceLimit, UnresolvedReference,
};
use crate::lexer::Span;
use crate::log::debug;
use crate::render::shapes::Shape;
use crate::types::{fmt_num, BoxIn, Direction, Length as Inches, OffsetIn, PtIn};

pub use cursor::Cursor;
pub use object::{
    color_from_value, Dash, Object, ObjectClass, ObjectId, Style, TextLabel, TextSlot,
};
pub use path_builder::PathBuilder;
pub use vars::Variables;

/// Largest coordinate or size, in inches, an object may have. Past this,
/// sizes vanish next to positions when the canvas is computed.
const MAX_COORDINATE: f64 = 1e9;

/// Diagram-wide values read from the variable table once layout is done.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub charht: Inches,
    pub charwid: Inches,
    pub arrowht: Inches,
    pub arrowwid: Inches,
    pub dashwid: Inches,
    pub thickness: Inches,
    pub margin: Inches,
    pub left_margin: Inches,
    pub right_margin: Inches,
    pub top_margin: Inches,
    pub bottom_margin: Inches,
    pub scale: f64,
    pub fontscale: f64,
}

impl Settings {
    pub fn from_vars(vars: &Variables) -> Self {
        let len = |name: &str| Inches(vars.number(name));
        let positive = |name: &str| match vars.number(name) {
            v if v > 0.0 => v,
            _ => 1.0,
        };
        Settings {
            charht: len("charht"),
            charwid: len("charwid"),
            arrowht: len("arrowht"),
            arrowwid: len("arrowwid"),
            dashwid: len("dashwid"),
            thickness: len("thickness"),
            margin: len("margin"),
            left_margin: len("leftmargin"),
            right_margin: len("rightmargin"),
            top_margin: len("topmargin"),
            bottom_margin: len("bottommargin"),
            scale: positive("scale"),
            fontscale: positive("fontscale"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from_vars(&Variables::default())
    }
}

/// A fully resolved diagram. Every coordinate is a concrete number.
#[derive(Clone, Debug)]
pub struct Diagram {
    /// All objects in declaration order, sublist members included.
    pub objects: Vec<Object>,
    /// Extent of everything drawn, before margins.
    pub bbox: BoxIn,
    pub settings: Settings,
    /// Output of `print` statements, in order.
    pub printed: Vec<String>,
}

impl Diagram {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    /// Most recent object with this label or first text.
    pub fn find(&self, name: &str) -> Option<&Object> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.label.as_deref() == Some(name))
            .or_else(|| self.objects.iter().rev().find(|o| o.first_text() == Some(name)))
    }
}

/// Lay out a parsed program.
pub fn layout(program: &Program) -> Result<Diagram, Error> {
    let mut engine = Engine::new();
    for statement in &program.statements {
        engine.statement(statement)?;
    }
    engine.finish()
}

#[derive(Clone, Copy, Debug)]
enum Symbol {
    Object(ObjectId),
    Place(PtIn),
}

/// Members and names declared at one nesting level.
#[derive(Debug, Default)]
struct Scope {
    members: Vec<ObjectId>,
    symbols: HashMap<String, Symbol>,
}

/// Which dimensions a statement set explicitly.
#[derive(Debug, Default)]
struct Sizing {
    width: bool,
    height: bool,
    fit: bool,
}

#[derive(Clone, Copy, Debug)]
enum Placement {
    At(PtIn),
    With(EdgePoint, PtIn),
}

struct Engine {
    objects: Vec<Object>,
    scope: Scope,
    /// Enclosing scopes, outermost first.
    outer: Vec<Scope>,
    vars: Variables,
    cursor: Cursor,
    printed: Vec<String>,
    /// Object whose statement is being processed, for `this`.
    building: Option<ObjectId>,
    line: u32,
    span: Span,
}

impl Engine {
    fn new() -> Self {
        Engine {
            objects: Vec::new(),
            scope: Scope::default(),
            outer: Vec::new(),
            vars: Variables::default(),
            cursor: Cursor::default(),
            printed: Vec::new(),
            building: None,
            line: 1,
            span: Span::default(),
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn eval_error(&self, kind: EvalErrorKind) -> Error {
        EvalError {
            kind,
            line: self.line,
            span: self.span.into(),
        }
        .into()
    }

    fn unresolved(&self, name: &str, help: Option<String>) -> Error {
        UnresolvedReference {
            name: name.to_string(),
            line: self.line,
            span: self.span.into(),
            help,
        }
        .into()
    }

    fn degenerate(&self, kind: DegenerateKind) -> Error {
        DegenerateGeometry {
            kind,
            line: self.line,
            span: self.span.into(),
        }
        .into()
    }

    fn invalid_clause(&self, id: ObjectId, clause: &Clause) -> Error {
        self.eval_error(EvalErrorKind::InvalidClause {
            clause: clause.name(),
            class: self.objects[id.0].class.name(),
        })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statement(&mut self, statement: &Statement) -> Result<(), Error> {
        self.line = statement.line;
        self.span = statement.span;
        match &statement.kind {
            StatementKind::Direction(direction) => {
                self.turn(*direction);
                Ok(())
            }
            StatementKind::Assignment(assignment) => self.assign(assignment),
            // bodies were spliced in by the macro expander
            StatementKind::Define(_) => Ok(()),
            StatementKind::Assert(condition) => self.check(condition),
            StatementKind::Print(args) => self.print(args),
            StatementKind::PlaceLabel { label, position } => {
                let point = self.eval_position(position)?;
                self.scope
                    .symbols
                    .insert(label.clone(), Symbol::Place(point));
                Ok(())
            }
            StatementKind::Object(decl) => self.declare(decl).map(drop),
            StatementKind::Refine(clauses) => self.refine(clauses),
        }
    }

    fn turn(&mut self, direction: Direction) {
        self.cursor.direction = direction;
        if let Some(&previous) = self.scope.members.last() {
            let obj = &mut self.objects[previous.0];
            if !obj.is_line_like() {
                obj.exit_direction = direction;
                self.cursor.position = obj.anchor(EdgePoint::facing(direction));
            }
        }
        debug!(%direction, cursor = %self.cursor.position, "direction changed");
    }

    fn assign(&mut self, assignment: &Assignment) -> Result<(), Error> {
        let value = self.eval_expr(&assignment.value)?;
        let result = match assignment.op {
            AssignOp::Set => value,
            op => {
                let current = self
                    .vars
                    .get(&assignment.name)
                    .ok_or_else(|| self.unresolved(&assignment.name, None))?;
                match op {
                    AssignOp::Add => current + value,
                    AssignOp::Sub => current - value,
                    AssignOp::Mul => current * value,
                    AssignOp::Div if value == 0.0 => {
                        return Err(self.eval_error(EvalErrorKind::DivisionByZero));
                    }
                    AssignOp::Div => current / value,
                    AssignOp::Set => value,
                }
            }
        };
        let result = self.finite(result)?;
        debug!(name = %assignment.name, value = result, "assign");
        self.vars.set(&assignment.name, result);
        Ok(())
    }

    fn print(&mut self, args: &[PrintArg]) -> Result<(), Error> {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(match arg {
                PrintArg::String(text) => text.clone(),
                PrintArg::Expr(expr) => fmt_num(self.eval_expr(expr)?),
            });
        }
        self.printed.push(parts.join(" "));
        Ok(())
    }

    fn check(&mut self, condition: &AssertCondition) -> Result<(), Error> {
        let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0);
        let (holds, left, right) = match condition {
            AssertCondition::Equal(a, b) => {
                let a = self.eval_expr(a)?;
                let b = self.eval_expr(b)?;
                (close(a, b), fmt_num(a), fmt_num(b))
            }
            AssertCondition::SamePosition(a, b) => {
                let a = self.eval_position(a)?;
                let b = self.eval_position(b)?;
                let holds = close(a.x.raw(), b.x.raw()) && close(a.y.raw(), b.y.raw());
                (holds, a.to_string(), b.to_string())
            }
        };
        if holds {
            return Ok(());
        }
        Err(AssertionFailed {
            left,
            right,
            line: self.line,
            span: self.span.into(),
        }
        .into())
    }

    // ========================================================================
    // Objects
    // ========================================================================

    fn declare(&mut self, decl: &ObjectDecl) -> Result<ObjectId, Error> {
        let class = match &decl.base {
            BaseType::Class(class) => ObjectClass::Shape(*class),
            BaseType::Text(_) => ObjectClass::Shape(ClassName::Text),
            BaseType::Sublist(_) => ObjectClass::Sublist,
        };
        let id = ObjectId(self.objects.len());
        let mut obj = Object::new(id, class, self.line, self.span, self.cursor.direction);
        obj.label = decl.label.clone();
        self.apply_defaults(&mut obj);
        if let BaseType::Text(spec) = &decl.base {
            obj.text.push(TextLabel::from(spec));
        }
        self.objects.push(obj);

        if let BaseType::Sublist(body) = &decl.base {
            self.sublist(id, body)?;
        }

        let outer = self.building.replace(id);
        let built = if class.is_line_like() {
            self.build_line(id, &decl.clauses)
        } else {
            self.build_block(id, &decl.clauses, true)
        };
        self.building = outer;
        built?;

        self.scope.members.push(id);
        if let Some(label) = &decl.label {
            self.scope.symbols.insert(label.clone(), Symbol::Object(id));
        }
        debug!(
            id = id.number(),
            class = self.objects[id.0].class.name(),
            center = %self.objects[id.0].center,
            width = %self.objects[id.0].width,
            height = %self.objects[id.0].height,
            cursor = %self.cursor.position,
            "placed object"
        );
        Ok(id)
    }

    fn apply_defaults(&self, obj: &mut Object) {
        let len = |name: &str| Inches(self.vars.number(name));
        obj.style.thickness = len("thickness");
        obj.style.stroke = color_from_value(self.vars.number("color"));
        obj.style.fill = color_from_value(self.vars.number("fill"));
        let ObjectClass::Shape(class) = obj.class else {
            return;
        };
        let (width, height, radius) = match class {
            ClassName::Box => (len("boxwid"), len("boxht"), len("boxrad")),
            ClassName::Circle => {
                let r = len("circlerad");
                (r * 2.0, r * 2.0, r)
            }
            ClassName::Cylinder => (len("cylwid"), len("cylht"), len("cylrad")),
            ClassName::Diamond => (len("diamondwid"), len("diamondht"), Inches::ZERO),
            ClassName::Dot => {
                let r = len("dotrad");
                (r * 2.0, r * 2.0, r)
            }
            ClassName::Ellipse => (len("ellipsewid"), len("ellipseht"), Inches::ZERO),
            ClassName::File => (len("filewid"), len("fileht"), len("filerad")),
            ClassName::Oval => (len("ovalwid"), len("ovalht"), Inches::ZERO),
            ClassName::Text => (len("textwid"), len("textht"), Inches::ZERO),
            ClassName::Arc => (Inches::ZERO, Inches::ZERO, len("arcrad")),
            ClassName::Line | ClassName::Arrow | ClassName::Spline | ClassName::Move => {
                (Inches::ZERO, Inches::ZERO, len("linerad"))
            }
        };
        obj.width = width;
        obj.height = height;
        obj.radius = radius;
        match class {
            ClassName::Dot => obj.style.fill = obj.style.stroke,
            ClassName::Arrow => obj.style.arrow_end = true,
            ClassName::Move => obj.style.invisible = true,
            _ => {}
        }
    }

    /// Lay out `[ ... ]` in a scope of its own. The sublist object takes
    /// the extent of its members.
    fn sublist(&mut self, id: ObjectId, body: &[Statement]) -> Result<(), Error> {
        let saved_vars = self.vars.clone();
        let saved_cursor = self.cursor;
        let (line, span) = (self.line, self.span);
        let enclosing = std::mem::take(&mut self.scope);
        self.outer.push(enclosing);
        self.cursor = saved_cursor.nested();

        let result = body.iter().try_for_each(|statement| self.statement(statement));

        let restored = self.outer.pop().unwrap_or_default();
        let inner = std::mem::replace(&mut self.scope, restored);
        self.vars = saved_vars;
        self.cursor = saved_cursor;
        self.line = line;
        self.span = span;
        result?;

        let mut bbox = BoxIn::new();
        for child in &inner.members {
            bbox.expand_bbox(&self.objects[child.0].bbox());
        }
        let obj = &mut self.objects[id.0];
        obj.children = inner.members;
        if !bbox.is_empty() {
            obj.center = bbox.center();
            obj.width = bbox.width();
            obj.height = bbox.height();
        }
        Ok(())
    }

    /// Build (or refine) a block object. Position clauses are collected
    /// and applied once the size is final.
    fn build_block(&mut self, id: ObjectId, clauses: &[Clause], fresh: bool) -> Result<(), Error> {
        let mut sizing = Sizing::default();
        let mut placement = None;
        for clause in clauses {
            match clause {
                Clause::At(_) | Clause::With(..) | Clause::Beside(..) => {
                    placement = Some(self.placement(clause)?);
                }
                Clause::Move(..)
                | Clause::EvenWith(..)
                | Clause::Heading(..)
                | Clause::Compass(..)
                | Clause::Distance(_)
                | Clause::Then
                | Clause::From(_)
                | Clause::To(_) => return Err(self.invalid_clause(id, clause)),
                _ => self.apply_attribute(id, clause, &mut sizing)?,
            }
        }
        self.size_to_text(id, &sizing);

        let obj = &self.objects[id.0];
        let center = match placement {
            Some(Placement::At(point)) => point,
            Some(Placement::With(edge, point)) => point - obj.anchor_offset(edge),
            None if fresh => {
                let gap = if self.scope.members.is_empty() {
                    Inches::ZERO
                } else {
                    Inches(self.vars.number("spacing"))
                };
                let entry = obj.anchor_offset(EdgePoint::facing(self.cursor.direction.opposite()));
                self.cursor.ahead(gap) - entry
            }
            None => obj.center,
        };
        let by = center - obj.center;
        self.translate_tree(id, by);

        let direction = self.cursor.direction;
        let obj = &mut self.objects[id.0];
        if fresh {
            obj.exit_direction = direction;
        }
        self.cursor.position = obj.anchor(EdgePoint::facing(obj.exit_direction));
        Ok(())
    }

    fn translate_tree(&mut self, id: ObjectId, by: OffsetIn) {
        self.objects[id.0].translate(by);
        let children = self.objects[id.0].children.clone();
        for child in children {
            self.translate_tree(child, by);
        }
    }

    /// Size text objects to their labels, and apply `fit`.
    fn size_to_text(&mut self, id: ObjectId, sizing: &Sizing) {
        let charwid = self.vars.number("charwid");
        let charht = self.vars.number("charht");
        let obj = &mut self.objects[id.0];
        if obj.text.is_empty() {
            return;
        }
        let (text_w, text_h) = crate::render::text::block_size(&obj.text, charwid, charht);
        if obj.class == ObjectClass::Shape(ClassName::Text) {
            if !sizing.width {
                obj.width = Inches(text_w);
            }
            if !sizing.height {
                obj.height = Inches(text_h);
            }
        }
        if !sizing.fit {
            return;
        }
        let mut w = text_w + 2.0 * charwid;
        let mut h = text_h + 0.5 * charht;
        match obj.class {
            ObjectClass::Shape(ClassName::Circle) => {
                let d = w.hypot(h);
                w = d;
                h = d;
                obj.radius = Inches(d / 2.0);
            }
            ObjectClass::Shape(ClassName::Ellipse) => {
                w *= std::f64::consts::SQRT_2;
                h *= std::f64::consts::SQRT_2;
            }
            _ => {}
        }
        if !sizing.width {
            obj.width = Inches(w);
        }
        if !sizing.height {
            obj.height = Inches(h);
        }
    }

    /// Build a line-like object from its path clauses.
    fn build_line(&mut self, id: ObjectId, clauses: &[Clause]) -> Result<(), Error> {
        let class = self.objects[id.0].class;
        let heading = self.cursor.direction;
        let mut path = PathBuilder::new(self.cursor.position, heading);
        let mut sizing = Sizing::default();
        let mut placement = None;
        let mut chop = false;
        let mut from_object = None;
        let mut to_object = None;
        let mut same_as = None;

        for clause in clauses {
            match clause {
                Clause::Move(direction, distance) => {
                    let length = self.move_length(class, *direction, distance.as_ref())?;
                    path.add_direction(*direction, length);
                }
                Clause::Distance(distance) => {
                    let direction = path.direction();
                    let length = self.move_length(class, direction, Some(distance))?;
                    path.add_direction(direction, length);
                }
                Clause::EvenWith(direction, position) => {
                    let target = self.eval_position(position)?;
                    path.set_even_with(*direction, target);
                }
                Clause::Heading(distance, angle) => {
                    let length = self.move_length(class, Direction::Right, distance.as_ref())?;
                    let angle = self.eval_expr(angle)?;
                    path.add_heading(angle, length);
                }
                Clause::Compass(distance, edge) => {
                    let length = self.move_length(class, Direction::Right, distance.as_ref())?;
                    path.add_vector(edge.unit(), length);
                }
                Clause::Then => path.mark_then(),
                Clause::From(position) => {
                    from_object = self.object_at(position)?;
                    path.set_start(self.eval_position(position)?);
                }
                Clause::To(position) => {
                    to_object = self.object_at(position)?;
                    path.set_endpoint(self.eval_position(position)?);
                }
                Clause::At(_) | Clause::With(..) | Clause::Beside(..) => {
                    placement = Some(self.placement(clause)?);
                }
                Clause::Flag(Flag::Chop) => chop = true,
                Clause::Flag(Flag::Close) => self.objects[id.0].closed = true,
                Clause::Same(object) => {
                    same_as = Some(self.apply_same(id, object.as_ref(), &mut sizing)?);
                }
                _ => self.apply_attribute(id, clause, &mut sizing)?,
            }
        }

        let mut exit = path.direction();
        if !path.has_movement() {
            let start = path.start();
            let copied = same_as
                .map(|source| &self.objects[source.0])
                .filter(|source| source.path.len() > 1);
            if let Some(source) = copied {
                for offset in PathBuilder::relative(&source.path).into_iter().skip(1) {
                    path.set_endpoint(start + offset);
                }
                exit = source.exit_direction;
            } else if class == ObjectClass::Shape(ClassName::Arc) {
                let obj = &self.objects[id.0];
                let turned = heading.turn(obj.clockwise);
                path.set_endpoint(start + heading.unit() * obj.radius + turned.unit() * obj.radius);
                exit = turned;
            } else {
                let length = self.default_length(class, heading);
                path.add_direction(heading, length);
                exit = heading;
            }
        }

        let mut points = path.build();
        if chop && points.len() >= 2 {
            if let Some(from) = from_object {
                let obj = &self.objects[from.0];
                points[0] = obj.shape.chop(obj, points[1]);
            }
            let n = points.len();
            if let Some(to) = to_object {
                let obj = &self.objects[to.0];
                points[n - 1] = obj.shape.chop(obj, points[n - 2]);
            }
        }
        if points.len() < 2 && class != ObjectClass::Shape(ClassName::Move) {
            return Err(self.degenerate(DegenerateKind::ZeroLength {
                class: class.name(),
            }));
        }

        let obj = &mut self.objects[id.0];
        obj.path = points;
        obj.fit_to_path();
        obj.exit_direction = exit;
        if let Some(placement) = placement {
            let by = match placement {
                Placement::At(point) => point - obj.center,
                Placement::With(edge, point) => point - obj.anchor(edge),
            };
            obj.translate(by);
        }
        self.cursor.position = obj.end();
        self.cursor.direction = exit;
        Ok(())
    }

    fn default_length(&self, class: ObjectClass, direction: Direction) -> Inches {
        let name = match class {
            ObjectClass::Shape(ClassName::Move) => "movewid",
            _ if direction.is_horizontal() => "linewid",
            _ => "lineht",
        };
        Inches(self.vars.number(name))
    }

    fn move_length(
        &self,
        class: ObjectClass,
        direction: Direction,
        distance: Option<&RelExpr>,
    ) -> Result<Inches, Error> {
        let default = self.default_length(class, direction);
        let Some(distance) = distance else {
            return Ok(default);
        };
        let value = self.eval_expr(&distance.expr)?;
        Ok(if distance.is_percent {
            default * (value / 100.0)
        } else {
            Inches(value)
        })
    }

    /// Resolve `at`, `with` and `[gap] right of X` into a placement.
    fn placement(&self, clause: &Clause) -> Result<Placement, Error> {
        match clause {
            Clause::At(position) => Ok(Placement::At(self.eval_position(position)?)),
            Clause::With(edge, position) => {
                Ok(Placement::With(*edge, self.eval_position(position)?))
            }
            Clause::Beside(relation, gap, position) => self.beside(*relation, gap.as_ref(), position),
            _ => Ok(Placement::At(self.cursor.position)),
        }
    }

    /// The new object's facing edge goes at the reference's opposite edge
    /// plus the gap. A bare point stands in for the reference edge.
    fn beside(
        &self,
        relation: Relation,
        gap: Option<&crate::ast::Expr>,
        position: &Position,
    ) -> Result<Placement, Error> {
        let direction = relation.direction();
        let gap = match gap {
            Some(expr) => self.eval_expr(expr)?,
            None => self.vars.number("spacing"),
        };
        let reference = match self.object_at(position)? {
            Some(id) => self.objects[id.0].anchor(EdgePoint::facing(direction)),
            None => self.eval_position(position)?,
        };
        Ok(Placement::With(
            EdgePoint::facing(direction.opposite()),
            reference + direction.unit() * Inches(gap),
        ))
    }

    /// Style, size and text clauses shared by every object class.
    fn apply_attribute(
        &mut self,
        id: ObjectId,
        clause: &Clause,
        sizing: &mut Sizing,
    ) -> Result<(), Error> {
        match clause {
            Clause::Dimension(dimension, value) => self.apply_dimension(id, *dimension, value, sizing),
            Clause::Dash(style, width) => {
                let width = match width {
                    Some(expr) => Inches(self.eval_expr(expr)?),
                    None => Inches(self.vars.number("dashwid")),
                };
                self.objects[id.0].style.dash = Some(match style {
                    DashStyle::Dashed => Dash::Dashed(width),
                    DashStyle::Dotted => Dash::Dotted(width),
                });
                Ok(())
            }
            Clause::Fill(expr) => {
                let value = self.eval_expr(expr)?;
                self.objects[id.0].style.fill = color_from_value(value);
                Ok(())
            }
            Clause::Color(expr) => {
                let value = self.eval_expr(expr)?;
                let obj = &mut self.objects[id.0];
                obj.style.stroke = color_from_value(value);
                if obj.class == ObjectClass::Shape(ClassName::Dot) {
                    obj.style.fill = obj.style.stroke;
                }
                Ok(())
            }
            Clause::Flag(flag) => self.apply_flag(id, clause, *flag, sizing),
            Clause::Text(spec) => {
                self.objects[id.0].text.push(TextLabel::from(spec));
                Ok(())
            }
            Clause::Same(object) => self.apply_same(id, object.as_ref(), sizing).map(drop),
            _ => Err(self.invalid_clause(id, clause)),
        }
    }

    fn apply_dimension(
        &mut self,
        id: ObjectId,
        dimension: Dimension,
        value: &RelExpr,
        sizing: &mut Sizing,
    ) -> Result<(), Error> {
        let raw = self.eval_expr(&value.expr)?;
        let obj = &self.objects[id.0];
        let current = match dimension {
            Dimension::Width => obj.width,
            Dimension::Height => obj.height,
            Dimension::Radius => obj.radius,
            Dimension::Diameter => obj.radius * 2.0,
            Dimension::Thickness => obj.style.thickness,
        };
        let amount = if value.is_percent {
            current * (raw / 100.0)
        } else {
            Inches(raw)
        };
        if obj.is_line_like() && matches!(dimension, Dimension::Width | Dimension::Height) {
            return Err(self.eval_error(EvalErrorKind::InvalidClause {
                clause: dimension.as_str(),
                class: obj.class.name(),
            }));
        }
        if amount.raw() < 0.0 && dimension != Dimension::Thickness {
            return Err(self.degenerate(DegenerateKind::NegativeSize {
                class: obj.class.name(),
                attribute: dimension.as_str(),
            }));
        }
        let round = matches!(
            obj.class,
            ObjectClass::Shape(ClassName::Circle | ClassName::Dot)
        );
        let obj = &mut self.objects[id.0];
        match dimension {
            Dimension::Width => {
                obj.width = amount;
                sizing.width = true;
            }
            Dimension::Height => {
                obj.height = amount;
                sizing.height = true;
            }
            Dimension::Radius | Dimension::Diameter => {
                let radius = if dimension == Dimension::Radius {
                    amount
                } else {
                    amount / 2.0
                };
                obj.radius = radius;
                if round {
                    obj.width = radius * 2.0;
                    obj.height = radius * 2.0;
                    sizing.width = true;
                    sizing.height = true;
                }
            }
            Dimension::Thickness => obj.style.thickness = amount,
        }
        Ok(())
    }

    fn apply_flag(
        &mut self,
        id: ObjectId,
        clause: &Clause,
        flag: Flag,
        sizing: &mut Sizing,
    ) -> Result<(), Error> {
        let obj = &mut self.objects[id.0];
        let line_like = obj.is_line_like();
        match flag {
            Flag::Invisible => obj.style.invisible = true,
            Flag::Thick => obj.style.thickness = obj.style.thickness * 1.5,
            Flag::Thin => obj.style.thickness = obj.style.thickness * 0.67,
            Flag::Solid => {
                obj.style.dash = None;
                obj.style.invisible = false;
            }
            Flag::ArrowRight | Flag::ArrowLeft | Flag::ArrowBoth if line_like => {
                obj.style.arrow_start = flag != Flag::ArrowRight;
                obj.style.arrow_end = flag != Flag::ArrowLeft;
            }
            Flag::Clockwise => obj.clockwise = true,
            Flag::CounterClockwise => obj.clockwise = false,
            Flag::Fit if !line_like => sizing.fit = true,
            _ => return Err(self.invalid_clause(id, clause)),
        }
        Ok(())
    }

    /// Copy size and style from the named object, or from the last one of
    /// the same class. Returns the source.
    fn apply_same(
        &mut self,
        id: ObjectId,
        object: Option<&ObjectRef>,
        sizing: &mut Sizing,
    ) -> Result<ObjectId, Error> {
        let class = self.objects[id.0].class;
        let source = match object {
            Some(object) => self.resolve_object(object)?,
            None => self
                .scope
                .members
                .iter()
                .rev()
                .copied()
                .find(|m| self.objects[m.0].class == class)
                .ok_or_else(|| self.unresolved(&format!("last {}", class.name()), None))?,
        };
        let src = &self.objects[source.0];
        let (width, height, radius, style, clockwise, closed) = (
            src.width,
            src.height,
            src.radius,
            src.style,
            src.clockwise,
            src.closed,
        );
        let obj = &mut self.objects[id.0];
        if !obj.is_line_like() {
            obj.width = width;
            obj.height = height;
            sizing.width = true;
            sizing.height = true;
        }
        obj.radius = radius;
        obj.style = style;
        obj.clockwise = clockwise;
        obj.closed = closed;
        Ok(source)
    }

    /// Bare clauses restyle or move the previous object.
    fn refine(&mut self, clauses: &[Clause]) -> Result<(), Error> {
        let id = self.scope.members.last().copied().ok_or_else(|| {
            self.unresolved(
                "previous",
                Some("there is no earlier object for these attributes".to_string()),
            )
        })?;
        let outer = self.building.replace(id);
        let result = if self.objects[id.0].is_line_like() {
            self.refine_line(id, clauses)
        } else {
            self.build_block(id, clauses, false)
        };
        self.building = outer;
        result
    }

    fn refine_line(&mut self, id: ObjectId, clauses: &[Clause]) -> Result<(), Error> {
        let mut sizing = Sizing::default();
        let mut placement = None;
        for clause in clauses {
            match clause {
                Clause::At(_) | Clause::With(..) | Clause::Beside(..) => {
                    placement = Some(self.placement(clause)?);
                }
                Clause::Flag(Flag::Close) => self.objects[id.0].closed = true,
                Clause::Move(..)
                | Clause::EvenWith(..)
                | Clause::Heading(..)
                | Clause::Compass(..)
                | Clause::Distance(_)
                | Clause::Then
                | Clause::From(_)
                | Clause::To(_)
                | Clause::Flag(Flag::Chop) => return Err(self.invalid_clause(id, clause)),
                _ => self.apply_attribute(id, clause, &mut sizing)?,
            }
        }
        if let Some(placement) = placement {
            let obj = &mut self.objects[id.0];
            let by = match placement {
                Placement::At(point) => point - obj.center,
                Placement::With(edge, point) => point - obj.anchor(edge),
            };
            obj.translate(by);
            self.cursor.position = obj.end();
        }
        Ok(())
    }

    // ========================================================================
    // Resolution pass
    // ========================================================================

    /// Check every number is concrete and compute the global extent.
    fn finish(self) -> Result<Diagram, Error> {
        let settings = Settings::from_vars(&self.vars);
        let mut bbox = BoxIn::new();
        for obj in &self.objects {
            let concrete = obj.center.is_finite()
                && obj.width.is_finite()
                && obj.height.is_finite()
                && obj.radius.is_finite()
                && obj.path.iter().all(|p| p.is_finite());
            if !concrete {
                return Err(EvalError {
                    kind: EvalErrorKind::NotFinite,
                    line: obj.line,
                    span: obj.span.into(),
                }
                .into());
            }
            let within = |v: Inches| v.raw().abs() <= MAX_COORDINATE;
            let bounded = within(obj.center.x)
                && within(obj.center.y)
                && within(obj.width)
                && within(obj.height)
                && obj.path.iter().all(|p| within(p.x) && within(p.y));
            if !bounded {
                return Err(ResourceLimit {
                    kind: LimitKind::Coordinates {
                        limit: MAX_COORDINATE,
                    },
                    line: obj.line,
                    span: obj.span.into(),
                }
                .into());
            }
            bbox.expand_bbox(&crate::render::object_extent(obj, &settings));
        }
        debug!(
            objects = self.objects.len(),
            width = %bbox.width(),
            height = %bbox.height(),
            "layout finished"
        );
        Ok(Diagram {
            objects: self.objects,
            bbox,
            settings,
            printed: self.printed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Diagram {
        match crate::layout(source) {
            Ok(diagram) => diagram,
            Err(e) => panic!("{source}: {e}"),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn assert_at(obj: &Object, x: f64, y: f64) {
        assert!(
            close(obj.center.x.raw(), x) && close(obj.center.y.raw(), y),
            "{} at {}, expected ({x}, {y})",
            obj.class.name(),
            obj.center
        );
    }

    // ==== Chaining tests ====

    #[test]
    fn boxes_chain_to_the_right() {
        let d = run("box; box");
        assert_at(&d.objects[0], 0.375, 0.0);
        assert_at(&d.objects[1], 1.125, 0.0);
    }

    #[test]
    fn spacing_separates_chained_blocks() {
        let d = run("spacing = 0.25\nbox; box");
        let gap = d.objects[1].anchor(EdgePoint::West).x - d.objects[0].anchor(EdgePoint::East).x;
        assert!(close(gap.raw(), 0.25));
    }

    #[test]
    fn direction_statement_turns_the_chain() {
        let d = run("box\ndown\nbox");
        assert_at(&d.objects[1], 0.375, -0.5);
        assert_eq!(d.objects[0].exit_direction, Direction::Down);
    }

    #[test]
    fn lines_continue_from_the_previous_exit() {
        let d = run("box; arrow; circle");
        assert_eq!(d.objects[1].path, vec![PtIn::inches(0.75, 0.0), PtIn::inches(1.25, 0.0)]);
        assert!(d.objects[1].style.arrow_end);
        assert_at(&d.objects[2], 1.5, 0.0);
    }

    // ==== Placement tests ====

    #[test]
    fn right_of_aligns_centers() {
        let d = run("box \"A\"\nbox \"B\" at (5, 5)\nbox \"C\" right of A");
        let a = &d.objects[0];
        let c = &d.objects[2];
        assert!(close(c.anchor(EdgePoint::West).x.raw(), a.anchor(EdgePoint::East).x.raw()));
        assert!(close(c.center.y.raw(), a.center.y.raw()));
    }

    #[test]
    fn explicit_gap_and_above() {
        let d = run("A: box\nbox 0.5 above A");
        let b = &d.objects[1];
        assert!(close(b.anchor(EdgePoint::South).y.raw(), 0.75));
        assert!(close(b.center.x.raw(), 0.375));
    }

    #[test]
    fn with_puts_the_anchor_on_the_point() {
        let d = run("box with .nw at (1, 1)");
        assert_at(&d.objects[0], 1.375, 0.75);
    }

    #[test]
    fn at_centres_lines() {
        let d = run("line right 2 at (0, 0)");
        assert_eq!(d.objects[0].path, vec![PtIn::inches(-1.0, 0.0), PtIn::inches(1.0, 0.0)]);
    }

    // ==== Path tests ====

    #[test]
    fn chained_moves_build_waypoints() {
        let d = run("line right 1 then down 1 then left 1");
        let path = &d.objects[0].path;
        assert_eq!(path.len(), 4);
        assert_eq!(path[3], PtIn::inches(0.0, -1.0));
        assert_eq!(d.objects[0].exit_direction, Direction::Left);
    }

    #[test]
    fn from_to_with_chop() {
        let d = run("A: circle at (0, 0)\nB: circle at (2, 0)\nline from A to B chop");
        let path = &d.objects[2].path;
        assert!(close(path[0].x.raw(), 0.25));
        assert!(close(path[1].x.raw(), 1.75));
    }

    #[test]
    fn percent_distance_is_relative_to_the_default() {
        let d = run("line right 50%");
        assert!(close(d.objects[0].width.raw(), 0.25));
    }

    #[test]
    fn arcs_turn_counter_clockwise_by_default() {
        let d = run("arc");
        assert_eq!(d.objects[0].path, vec![PtIn::ORIGIN, PtIn::inches(0.25, 0.25)]);
        assert_eq!(d.objects[0].exit_direction, Direction::Up);
        let d = run("arc cw");
        assert_eq!(d.objects[0].path[1], PtIn::inches(0.25, -0.25));
    }

    #[test]
    fn zero_length_lines_are_rejected() {
        let err = crate::layout("line from (1, 1) to (1, 1)").unwrap_err();
        assert_eq!(err.category(), "degenerate");
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn moves_may_be_empty() {
        let d = run("move to (0, 0)");
        assert_eq!(d.objects[0].path.len(), 1);
        assert!(d.objects[0].style.invisible);
    }

    // ==== Attribute tests ====

    #[test]
    fn dimensions_and_percentages() {
        let d = run("box width 2 height 50%\ncircle radius 1\ncircle diameter 1");
        assert!(close(d.objects[0].width.raw(), 2.0));
        assert!(close(d.objects[0].height.raw(), 0.25));
        assert!(close(d.objects[1].width.raw(), 2.0));
        assert!(close(d.objects[2].radius.raw(), 0.5));
    }

    #[test]
    fn negative_sizes_are_degenerate() {
        let err = crate::layout("box\nbox width -1").unwrap_err();
        assert_eq!(err.to_string(), "line 2: box width is negative");
    }

    #[test]
    fn arrowheads_only_on_lines() {
        let err = crate::layout("box ->").unwrap_err();
        assert_eq!(err.to_string(), "line 1: `->` cannot be applied to box");
    }

    #[test]
    fn style_clauses() {
        let d = run("box fill Red color blue dashed thick\nline <->");
        let style = d.objects[0].style;
        assert_eq!(style.fill, Some(0xff0000));
        assert_eq!(style.stroke, Some(0x0000ff));
        assert_eq!(style.dash, Some(Dash::Dashed(Inches(0.05))));
        assert!(close(style.thickness.raw(), 0.0225));
        assert!(d.objects[1].style.arrow_start && d.objects[1].style.arrow_end);
    }

    #[test]
    fn same_copies_the_last_of_its_class() {
        let d = run("box width 2 fill Red\ncircle\nbox same");
        assert!(close(d.objects[2].width.raw(), 2.0));
        assert_eq!(d.objects[2].style.fill, Some(0xff0000));
    }

    #[test]
    fn same_copies_a_line_path() {
        let d = run("line right 1 then up 1\nline same");
        let path = &d.objects[1].path;
        assert_eq!(path.len(), 3);
        assert_eq!(path[2] - path[0], OffsetIn::inches(1.0, 1.0));
    }

    #[test]
    fn fit_sizes_to_text() {
        let d = run("box \"Hi\" fit");
        let text_w = crate::render::text::block_size(&d.objects[0].text, 0.08, 0.14).0;
        assert!(close(d.objects[0].width.raw(), text_w + 0.16));
        assert!(close(d.objects[0].height.raw(), 0.14 + 0.07));
    }

    #[test]
    fn text_objects_size_to_their_text() {
        let d = run("\"one\" \"two\"");
        assert!(close(d.objects[0].height.raw(), 0.28));
    }

    #[test]
    fn refinement_applies_to_the_previous_object() {
        let d = run("box\nfill Red\nwidth 2");
        assert_eq!(d.objects[0].style.fill, Some(0xff0000));
        assert!(close(d.objects[0].width.raw(), 2.0));
        assert_at(&d.objects[0], 0.375, 0.0);
    }

    #[test]
    fn chop_cannot_refine() {
        let err = crate::layout("line\nchop").unwrap_err();
        assert_eq!(err.to_string(), "line 2: `chop` cannot be applied to line");
    }

    // ==== Sublist tests ====

    #[test]
    fn sublists_wrap_their_members() {
        let d = run("S: [ box; box ]\nbox");
        let s = &d.objects[0];
        assert_eq!(s.children, vec![ObjectId(1), ObjectId(2)]);
        assert!(close(s.width.raw(), 1.5));
        assert_at(s, 0.75, 0.0);
        assert_at(&d.objects[1], 0.375, 0.0);
        assert_at(&d.objects[3], 1.875, 0.0);
    }

    #[test]
    fn sublist_variables_are_local() {
        let d = run("[ boxwid = 2; box ]\nbox");
        assert!(close(d.objects[1].width.raw(), 2.0));
        assert!(close(d.objects[2].width.raw(), 0.75));
    }

    #[test]
    fn sublists_move_with_their_placement() {
        let d = run("[ box ] at (5, 5)");
        assert_at(&d.objects[1], 5.0, 5.0);
    }

    // ==== Statement tests ====

    #[test]
    fn print_and_assert() {
        let d = run("A: box\nprint \"w\", A.wid\nassert(A.wid == 0.75)\nassert(A.e == (0.75, 0))");
        assert_eq!(d.printed, vec!["w 0.75"]);
    }

    #[test]
    fn failed_assert_shows_both_sides() {
        let err = crate::layout("box\nassert(1 + 1 == 3)").unwrap_err();
        assert_eq!(err.to_string(), "line 2: assertion failed: 2 != 3");
    }

    #[test]
    fn labelled_positions() {
        let d = run("P: (1, 2)\ncircle at P");
        assert_at(&d.objects[0], 1.0, 2.0);
    }

    #[test]
    fn huge_coordinates_hit_a_resource_limit() {
        let err = crate::layout("box\nbox at (1e308, 1e308)").unwrap_err();
        assert_eq!(err.category(), "resource-limit");
        assert_eq!(err.line(), 2);
        assert!(err.to_string().contains("1000000000 inches"), "{err}");

        let err = crate::layout("line from (0, 0) to (0, -1e12)").unwrap_err();
        assert_eq!(err.category(), "resource-limit");
        run("box at (1e6, 1e6)");
    }

    #[test]
    fn settings_follow_the_variables() {
        let d = run("margin = 0.5\nscale = 2\nbox");
        assert_eq!(d.settings.margin, Inches(0.5));
        assert_eq!(d.settings.scale, 2.0);
        assert!(!d.bbox.is_empty());
    }
}
