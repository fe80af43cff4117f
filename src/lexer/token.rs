//! Token definitions.

use std::fmt;

/// Byte range into the text a token was scanned from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Smallest span covering both.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A scanned token. Immutable once produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal text; for strings, the unescaped content.
    pub text: String,
    /// Numeric value in inches, percent, or ordinal position.
    pub value: Option<f64>,
    /// 1-based source line.
    pub line: u32,
    pub span: Span,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    /// How the token reads in a diagnostic.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eos if self.text == "\n" => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::String => format!("string \"{}\"", self.text),
            TokenKind::MacroBody => "macro body".to_string(),
            _ => format!("`{}`", self.text),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal, already converted to inches.
    Number,
    /// Numeric literal with a `%` suffix.
    Percent,
    /// `1st`, `2nd`, `3rd`, `4th` ...
    Ordinal,
    String,
    /// Lowercase-initial name: variables and function names.
    Ident,
    /// Uppercase-initial name: object labels and colour names.
    PlaceName,
    /// `$name` or `@name`.
    Variable,
    Keyword(Keyword),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    EqEq,
    Assign(AssignOp),
    Arrow(ArrowKind),
    /// Statement separator: a newline or `;`.
    Eos,
    /// Raw body text of a macro definition.
    MacroBody,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number => f.write_str("number"),
            TokenKind::Percent => f.write_str("percentage"),
            TokenKind::Ordinal => f.write_str("ordinal"),
            TokenKind::String => f.write_str("string"),
            TokenKind::Ident => f.write_str("identifier"),
            TokenKind::PlaceName => f.write_str("place name"),
            TokenKind::Variable => f.write_str("variable"),
            TokenKind::Keyword(kw) => write!(f, "`{}`", kw.as_str()),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
            TokenKind::LBracket => f.write_str("`[`"),
            TokenKind::RBracket => f.write_str("`]`"),
            TokenKind::LBrace => f.write_str("`{`"),
            TokenKind::RBrace => f.write_str("`}`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Colon => f.write_str("`:`"),
            TokenKind::Dot => f.write_str("`.`"),
            TokenKind::Plus => f.write_str("`+`"),
            TokenKind::Minus => f.write_str("`-`"),
            TokenKind::Star => f.write_str("`*`"),
            TokenKind::Slash => f.write_str("`/`"),
            TokenKind::Lt => f.write_str("`<`"),
            TokenKind::Gt => f.write_str("`>`"),
            TokenKind::EqEq => f.write_str("`==`"),
            TokenKind::Assign(op) => write!(f, "`{}`", op.as_str()),
            TokenKind::Arrow(a) => write!(f, "`{}`", a.as_str()),
            TokenKind::Eos => f.write_str("end of statement"),
            TokenKind::MacroBody => f.write_str("macro body"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }
}

/// Arrowhead markers: `->`, `<-`, `<->`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowKind {
    Right,
    Left,
    Both,
}

impl ArrowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArrowKind::Right => "->",
            ArrowKind::Left => "<-",
            ArrowKind::Both => "<->",
        }
    }
}

macro_rules! keywords {
    ($($variant:ident => [$($word:literal),+]),* $(,)?) => {
        /// Reserved words. Aliases (`wid`, `width`) share one variant.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant),*
        }

        impl Keyword {
            /// Case-sensitive lookup: keywords are always lowercase.
            pub fn from_word(word: &str) -> Option<Keyword> {
                match word {
                    $($($word)|+ => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            /// Canonical spelling.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => keywords!(@first $($word),+),)*
                }
            }
        }
    };
    (@first $first:literal $(, $rest:literal)*) => { $first };
}

keywords! {
    // object classes
    Arc => ["arc"],
    Arrow => ["arrow"],
    Box => ["box"],
    Circle => ["circle"],
    Cylinder => ["cylinder"],
    Diamond => ["diamond"],
    Dot => ["dot"],
    Ellipse => ["ellipse"],
    File => ["file"],
    Line => ["line"],
    Move => ["move"],
    Oval => ["oval"],
    Spline => ["spline"],
    Text => ["text"],
    // headings
    Up => ["up"],
    Down => ["down"],
    Left => ["left"],
    Right => ["right"],
    // text attributes
    Above => ["above"],
    Below => ["below"],
    Center => ["center", "centre", "c"],
    Ljust => ["ljust"],
    Rjust => ["rjust"],
    Bold => ["bold"],
    Italic => ["italic"],
    Mono => ["mono", "monospace"],
    Big => ["big"],
    Small => ["small"],
    Aligned => ["aligned"],
    // compass points
    North => ["north", "n", "top", "t"],
    South => ["south", "s", "bottom"],
    East => ["east", "e"],
    West => ["west", "w"],
    NorthEast => ["ne"],
    NorthWest => ["nw"],
    SouthEast => ["se"],
    SouthWest => ["sw"],
    Start => ["start"],
    End => ["end"],
    // clauses
    At => ["at"],
    With => ["with"],
    Same => ["same"],
    As => ["as"],
    From => ["from"],
    To => ["to"],
    Then => ["then"],
    Go => ["go"],
    Heading => ["heading"],
    Angle => ["angle"],
    Until => ["until"],
    Even => ["even"],
    Chop => ["chop"],
    Close => ["close"],
    Fit => ["fit"],
    Invisible => ["invisible", "invis"],
    Solid => ["solid"],
    Dashed => ["dashed"],
    Dotted => ["dotted"],
    Cw => ["cw"],
    Ccw => ["ccw"],
    Thick => ["thick"],
    Thin => ["thin"],
    Color => ["color", "colour"],
    Fill => ["fill"],
    Thickness => ["thickness"],
    Width => ["width", "wid"],
    Height => ["height", "ht"],
    Radius => ["radius", "rad"],
    Diameter => ["diameter", "diam"],
    // references and positions
    Of => ["of"],
    The => ["the"],
    Way => ["way"],
    Between => ["between"],
    And => ["and"],
    Last => ["last"],
    First => ["first"],
    Previous => ["previous"],
    This => ["this"],
    Vertex => ["vertex"],
    Dist => ["dist"],
    // statements
    Print => ["print"],
    Assert => ["assert"],
    Define => ["define"],
}

impl Keyword {
    pub fn is_class(self) -> bool {
        matches!(
            self,
            Keyword::Arc
                | Keyword::Arrow
                | Keyword::Box
                | Keyword::Circle
                | Keyword::Cylinder
                | Keyword::Diamond
                | Keyword::Dot
                | Keyword::Ellipse
                | Keyword::File
                | Keyword::Line
                | Keyword::Move
                | Keyword::Oval
                | Keyword::Spline
                | Keyword::Text
        )
    }

    pub fn is_direction(self) -> bool {
        matches!(
            self,
            Keyword::Up | Keyword::Down | Keyword::Left | Keyword::Right
        )
    }

    /// Keywords that name a compass point when they follow a `.`.
    pub fn is_edge(self) -> bool {
        matches!(
            self,
            Keyword::North
                | Keyword::South
                | Keyword::East
                | Keyword::West
                | Keyword::NorthEast
                | Keyword::NorthWest
                | Keyword::SouthEast
                | Keyword::SouthWest
                | Keyword::Center
                | Keyword::Start
                | Keyword::End
                | Keyword::Left
                | Keyword::Right
        )
    }

    pub fn is_text_attr(self) -> bool {
        matches!(
            self,
            Keyword::Above
                | Keyword::Below
                | Keyword::Center
                | Keyword::Ljust
                | Keyword::Rjust
                | Keyword::Bold
                | Keyword::Italic
                | Keyword::Mono
                | Keyword::Big
                | Keyword::Small
                | Keyword::Aligned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_case_sensitive() {
        assert_eq!(Keyword::from_word("box"), Some(Keyword::Box));
        assert_eq!(Keyword::from_word("Box"), None);
        assert_eq!(Keyword::from_word("C"), None);
        assert_eq!(Keyword::from_word("c"), Some(Keyword::Center));
    }

    #[test]
    fn aliases_share_a_variant() {
        assert_eq!(Keyword::from_word("wid"), Some(Keyword::Width));
        assert_eq!(Keyword::from_word("invis"), Some(Keyword::Invisible));
        assert_eq!(Keyword::from_word("top"), Some(Keyword::North));
        assert_eq!(Keyword::Width.as_str(), "width");
        assert_eq!(Keyword::North.as_str(), "north");
    }
}
