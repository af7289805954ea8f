use crate::source::Position;

/// Everything that can go wrong with a program unit.
///
/// Parse failures discard the whole unit; runtime failures stop it at the
/// failing statement. Either way the message ends up in the error log.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{pos}: unrecognized token")]
    InvalidToken { pos: Position },
    #[error("{pos}: expected {expected}, found {found}")]
    Expected {
        pos: Position,
        expected: &'static str,
        found: String,
    },
    #[error("{pos}: reached end of text while looking for {expected}")]
    UnexpectedEnd {
        pos: Position,
        expected: &'static str,
    },
    #[error("{pos}: \"{name}\" is a procedure, not a variable")]
    NotAVariable { pos: Position, name: String },
    #[error("{pos}: procedure definitions can't be nested (inside \"{outer}\")")]
    NestedDefinition { pos: Position, outer: String },

    #[error("division by zero")]
    DivisionByZero,
    #[error("can't sleep for a negative time ({ms} ms)")]
    NegativeSleep { ms: i32 },
    #[error("{name} didn't output a value")]
    NoOutput { name: String },
    #[error("{pos}: {name} has no value")]
    UnknownVariable { pos: Position, name: String },
    #[error("{pos}: I don't know how to {name}")]
    UnknownProcedure { pos: Position, name: String },
    #[error("{pos}: {name} takes {expected} inputs, but was given {found}")]
    WrongArity {
        pos: Position,
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("{pos}: no value was provided for {name}")]
    NoInput { pos: Position, name: String },
    #[error("call stack too deep (calling {name})")]
    StackOverflow { name: String },
}

impl Error {
    /// Where the error was detected, if it can be tied to a token.
    ///
    /// For runtime errors this is the position within the unit that the failing code came from,
    /// which may be an earlier unit than the one being run.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::InvalidToken { pos }
            | Error::Expected { pos, .. }
            | Error::UnexpectedEnd { pos, .. }
            | Error::NotAVariable { pos, .. }
            | Error::NestedDefinition { pos, .. }
            | Error::UnknownVariable { pos, .. }
            | Error::UnknownProcedure { pos, .. }
            | Error::WrongArity { pos, .. }
            | Error::NoInput { pos, .. } => Some(*pos),
            _ => None,
        }
    }
}
