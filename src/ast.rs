//! Syntax tree produced by the parser and consumed once by layout.
//!
//! Lengths are stored in inches: unit suffixes are resolved by the lexer.

use crate::lexer::Span;
use crate::types::{Direction, UnitVec};

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A statement together with where it came from.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    /// 1-based line of the first token.
    pub line: u32,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    /// `up`, `down`, `left`, `right` on their own
    Direction(Direction),
    /// `$x = 10`, `boxwid *= 2`, `fill = Red`
    Assignment(Assignment),
    /// `define name { body }`; the body has already been expanded
    Define(Define),
    /// `assert(x == y)`
    Assert(AssertCondition),
    /// `print "hello", $x`
    Print(Vec<PrintArg>),
    /// `A: (1, 2)` names a position rather than an object
    PlaceLabel { label: String, position: Position },
    /// `box "hello" width 2`, optionally labelled
    Object(ObjectDecl),
    /// Bare clauses that refine the previous object: `fill red`
    Refine(Vec<Clause>),
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub name: String,
    pub op: AssignOp,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone)]
pub struct Define {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub enum AssertCondition {
    Equal(Expr, Expr),
    SamePosition(Position, Position),
}

#[derive(Debug, Clone)]
pub enum PrintArg {
    String(String),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct ObjectDecl {
    pub label: Option<String>,
    pub base: BaseType,
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
pub enum BaseType {
    Class(ClassName),
    /// A statement that starts with a string is a text object.
    Text(TextSpec),
    /// `[ statements ]`
    Sublist(Vec<Statement>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassName {
    Arc,
    Arrow,
    Box,
    Circle,
    Cylinder,
    Diamond,
    Dot,
    Ellipse,
    File,
    Line,
    Move,
    Oval,
    Spline,
    Text,
}

impl ClassName {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassName::Arc => "arc",
            ClassName::Arrow => "arrow",
            ClassName::Box => "box",
            ClassName::Circle => "circle",
            ClassName::Cylinder => "cylinder",
            ClassName::Diamond => "diamond",
            ClassName::Dot => "dot",
            ClassName::Ellipse => "ellipse",
            ClassName::File => "file",
            ClassName::Line => "line",
            ClassName::Move => "move",
            ClassName::Oval => "oval",
            ClassName::Spline => "spline",
            ClassName::Text => "text",
        }
    }

    /// Objects defined by a path of waypoints rather than a center and size.
    pub fn is_line_like(self) -> bool {
        matches!(
            self,
            ClassName::Line
                | ClassName::Arrow
                | ClassName::Spline
                | ClassName::Move
                | ClassName::Arc
        )
    }
}

/// One clause of an object statement, applied left to right.
#[derive(Debug, Clone)]
pub enum Clause {
    /// `width 2`, `ht 50%`
    Dimension(Dimension, RelExpr),
    /// `dashed`, `dotted 0.1`
    Dash(DashStyle, Option<Expr>),
    Fill(Expr),
    Color(Expr),
    Flag(Flag),
    /// `[go] right [2cm]`
    Move(Direction, Option<RelExpr>),
    /// `right [until] even with B`
    EvenWith(Direction, Position),
    /// `[go] [2cm] heading 45`
    Heading(Option<RelExpr>, Expr),
    /// `[go] [2cm] ne`
    Compass(Option<RelExpr>, EdgePoint),
    /// Bare distance in the current direction: `line 2cm`
    Distance(RelExpr),
    Then,
    From(Position),
    To(Position),
    At(Position),
    /// `with .n at B.s`
    With(EdgePoint, Position),
    /// `[gap] right of A`, `above A`
    Beside(Relation, Option<Expr>, Position),
    /// `same`, `same as last box`
    Same(Option<ObjectRef>),
    Text(TextSpec),
}

impl Clause {
    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Clause::Dimension(d, _) => d.as_str(),
            Clause::Dash(DashStyle::Dashed, _) => "dashed",
            Clause::Dash(DashStyle::Dotted, _) => "dotted",
            Clause::Fill(_) => "fill",
            Clause::Color(_) => "color",
            Clause::Flag(f) => f.as_str(),
            Clause::Move(..) => "direction",
            Clause::EvenWith(..) => "even with",
            Clause::Heading(..) => "heading",
            Clause::Compass(..) => "compass move",
            Clause::Distance(_) => "distance",
            Clause::Then => "then",
            Clause::From(_) => "from",
            Clause::To(_) => "to",
            Clause::At(_) => "at",
            Clause::With(..) => "with",
            Clause::Beside(..) => "relative placement",
            Clause::Same(_) => "same",
            Clause::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
    Radius,
    Diameter,
    Thickness,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Width => "width",
            Dimension::Height => "height",
            Dimension::Radius => "radius",
            Dimension::Diameter => "diameter",
            Dimension::Thickness => "thickness",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashStyle {
    Dashed,
    Dotted,
}

/// Attributes that take no argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Clockwise,
    CounterClockwise,
    Invisible,
    Thick,
    Thin,
    Solid,
    ArrowRight,
    ArrowLeft,
    ArrowBoth,
    Chop,
    Fit,
    Close,
}

impl Flag {
    pub fn as_str(self) -> &'static str {
        match self {
            Flag::Clockwise => "cw",
            Flag::CounterClockwise => "ccw",
            Flag::Invisible => "invisible",
            Flag::Thick => "thick",
            Flag::Thin => "thin",
            Flag::Solid => "solid",
            Flag::ArrowRight => "->",
            Flag::ArrowLeft => "<-",
            Flag::ArrowBoth => "<->",
            Flag::Chop => "chop",
            Flag::Fit => "fit",
            Flag::Close => "close",
        }
    }
}

/// Placement of a new object beside an existing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Above,
    Below,
    LeftOf,
    RightOf,
}

impl Relation {
    /// Heading from the reference toward the placed object.
    pub fn direction(self) -> Direction {
        match self {
            Relation::Above => Direction::Up,
            Relation::Below => Direction::Down,
            Relation::LeftOf => Direction::Left,
            Relation::RightOf => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub value: String,
    pub attrs: Vec<TextAttr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAttr {
    Above,
    Below,
    Center,
    LJust,
    RJust,
    Bold,
    Italic,
    Mono,
    Big,
    Small,
    Aligned,
}

/// An expression with an optional `%` suffix.
#[derive(Debug, Clone)]
pub struct RelExpr {
    pub expr: Expr,
    pub is_percent: bool,
}

#[derive(Debug, Clone)]
pub enum Expr {
    /// Inches, or a plain number
    Number(f64),
    /// `$x`, `@x`, `boxwid`, `Red`
    Variable(String),
    Call(Function, Vec<Expr>),
    Dist(Box<Position>, Box<Position>),
    /// `A.wid`, `width of A`
    Property(ObjectRef, Dimension),
    /// `A.x`, `A.n.y`, `(1, 2).x`
    Coord(Box<Position>, Coord),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coord {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Cos,
    Sin,
    Int,
    Sqrt,
    Max,
    Min,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        Some(match name {
            "abs" => Function::Abs,
            "cos" => Function::Cos,
            "sin" => Function::Sin,
            "int" => Function::Int,
            "sqrt" => Function::Sqrt,
            "max" => Function::Max,
            "min" => Function::Min,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Cos => "cos",
            Function::Sin => "sin",
            Function::Int => "int",
            Function::Sqrt => "sqrt",
            Function::Max => "max",
            Function::Min => "min",
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Function::Max | Function::Min => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone)]
pub enum Position {
    /// `(x, y)` or `x, y`
    Coords(Expr, Expr),
    /// `(A, B)`: x from A, y from B
    Tuple(Box<Position>, Box<Position>),
    Place(Place),
    /// `B + (1, 2)`, `B - 1, 2`
    Offset(Box<Position>, BinaryOp, Expr, Expr),
    /// `0.5 between A and B`, `0.5 of the way between A and B`, `0.5 <A, B>`
    Between(Expr, Box<Position>, Box<Position>),
    /// `1cm above B`, `1cm right of B`
    Relative(Expr, Relation, Box<Position>),
    /// `1cm heading 45 from B`, `1cm at angle 45 from B`
    Heading(Expr, Expr, Box<Position>),
    /// `1cm ne of B`
    CompassOf(Expr, EdgePoint, Box<Position>),
}

#[derive(Debug, Clone)]
pub enum Place {
    /// `B` or `last box`
    Object(ObjectRef),
    /// `B.n`, `n of B`
    Edge(ObjectRef, EdgePoint),
    /// `2nd vertex of B`
    Vertex(Ordinal, ObjectRef),
}

/// A way of naming an already-declared object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectRef {
    /// `A`, or `A.B` reaching into a sublist. May also name a labelled
    /// position.
    Named(Vec<String>),
    /// `2nd box`, `last circle`, `first`, `last []`
    Nth(Ordinal, Option<NthClass>),
    Previous,
    This,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordinal {
    /// 1-based from the front
    First(u32),
    /// 1-based from the back
    Last(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NthClass {
    Class(ClassName),
    Sublist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePoint {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
    Center,
    Start,
    End,
}

impl EdgePoint {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgePoint::North => "n",
            EdgePoint::South => "s",
            EdgePoint::East => "e",
            EdgePoint::West => "w",
            EdgePoint::NorthEast => "ne",
            EdgePoint::NorthWest => "nw",
            EdgePoint::SouthEast => "se",
            EdgePoint::SouthWest => "sw",
            EdgePoint::Center => "c",
            EdgePoint::Start => "start",
            EdgePoint::End => "end",
        }
    }

    /// Unit vector from the center toward this compass point. `c`,
    /// `start` and `end` have no fixed direction.
    pub fn unit(self) -> UnitVec {
        match self {
            EdgePoint::North => UnitVec::NORTH,
            EdgePoint::South => UnitVec::SOUTH,
            EdgePoint::East => UnitVec::EAST,
            EdgePoint::West => UnitVec::WEST,
            EdgePoint::NorthEast => UnitVec::NORTH_EAST,
            EdgePoint::NorthWest => UnitVec::NORTH_WEST,
            EdgePoint::SouthEast => UnitVec::SOUTH_EAST,
            EdgePoint::SouthWest => UnitVec::SOUTH_WEST,
            EdgePoint::Center | EdgePoint::Start | EdgePoint::End => UnitVec::ZERO,
        }
    }

    /// The compass point that faces the given heading.
    pub fn facing(dir: Direction) -> EdgePoint {
        match dir {
            Direction::Right => EdgePoint::East,
            Direction::Down => EdgePoint::South,
            Direction::Left => EdgePoint::West,
            Direction::Up => EdgePoint::North,
        }
    }
}
