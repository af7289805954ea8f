use std::fmt;

/// A location in the submitted text.
///
/// `row` and `column` are zero-based; the `Display` impl prints them one-based
/// because that's what people expect to read in an error message.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub byte: usize,
    pub row: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.row + 1, self.column + 1)
    }
}

/// The text of one program unit, together with a read cursor.
///
/// Each submission replaces the text wholesale: a unit never continues where
/// the previous one stopped.
#[derive(Debug, Default)]
pub struct Source {
    text: Vec<u8>,
    pos: Position,
}

impl Source {
    pub fn new(text: &str) -> Source {
        Source {
            text: text.as_bytes().to_vec(),
            pos: Position::default(),
        }
    }

    /// Replace the buffered text and rewind the cursor.
    pub fn replace(&mut self, text: &str) {
        self.text.clear();
        self.text.extend_from_slice(text.as_bytes());
        self.pos = Position::default();
    }

    /// Consume the next byte, or return `None` once the text is exhausted.
    pub fn next_char(&mut self) -> Option<u8> {
        let c = *self.text.get(self.pos.byte)?;
        if c == b'\n' {
            self.pos.row += 1;
            self.pos.column = 0;
        } else {
            self.pos.column += 1;
        }
        self.pos.byte += 1;
        Some(c)
    }

    /// The position of the next byte that [`Source::next_char`] will return.
    pub fn position(&self) -> Position {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_rows_and_columns() {
        let mut src = Source::new("ab\nc");
        assert_eq!(src.next_char(), Some(b'a'));
        assert_eq!(src.next_char(), Some(b'b'));
        assert_eq!(
            src.position(),
            Position {
                byte: 2,
                row: 0,
                column: 2
            }
        );
        assert_eq!(src.next_char(), Some(b'\n'));
        assert_eq!(
            src.position(),
            Position {
                byte: 3,
                row: 1,
                column: 0
            }
        );
        assert_eq!(src.next_char(), Some(b'c'));
        assert_eq!(src.next_char(), None);
        assert_eq!(src.next_char(), None);
        assert_eq!(src.position().byte, 4);
    }

    #[test]
    fn replace_rewinds() {
        let mut src = Source::new("xyz");
        src.next_char();
        src.next_char();
        src.replace("q");
        assert_eq!(src.position(), Position::default());
        assert_eq!(src.next_char(), Some(b'q'));
        assert_eq!(src.next_char(), None);
    }

    #[test]
    fn display_is_one_based() {
        let pos = Position {
            byte: 7,
            row: 2,
            column: 4,
        };
        assert_eq!(pos.to_string(), "line 3, column 5");
    }
}
