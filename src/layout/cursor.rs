//! The drawing cursor threaded through layout.

use crate::types::{Direction, Length as Inches, PtIn};

/// Where the next chained object goes and which way it faces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    pub position: PtIn,
    pub direction: Direction,
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor {
            position: PtIn::ORIGIN,
            direction: Direction::Right,
        }
    }
}

impl Cursor {
    /// A fresh cursor for a sublist: origin, inherited heading.
    pub fn nested(&self) -> Self {
        Cursor {
            position: PtIn::ORIGIN,
            direction: self.direction,
        }
    }

    /// Point `distance` ahead along the current heading.
    pub fn ahead(&self, distance: Inches) -> PtIn {
        self.position + self.direction.unit() * distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_origin_facing_right() {
        let cursor = Cursor::default();
        assert_eq!(cursor.position, PtIn::ORIGIN);
        assert_eq!(cursor.direction, Direction::Right);
        assert_eq!(cursor.ahead(Inches(1.0)), PtIn::inches(1.0, 0.0));
    }

    #[test]
    fn nested_cursor_keeps_heading() {
        let cursor = Cursor {
            position: PtIn::inches(3.0, 4.0),
            direction: Direction::Down,
        };
        let inner = cursor.nested();
        assert_eq!(inner.position, PtIn::ORIGIN);
        assert_eq!(inner.direction, Direction::Down);
        assert_eq!(inner.ahead(Inches(2.0)), PtIn::inches(0.0, -2.0));
    }
}
