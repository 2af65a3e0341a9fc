use std::fmt;

/// A 1-based `(line, column)` location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// Errors reported by parsing or execution.
///
/// Every variant carries the position of the offending instruction or
/// character. The first fault aborts the current parse or run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `>` or `<` would move the data pointer off the tape.
    #[error("Data pointer is out of bounds: {position}")]
    DataPointerOutOfBounds { position: Position },

    /// A `[` was never closed before the end of input.
    #[error("Unclosed loop start: {position}")]
    UnclosedLoopStart { position: Position },

    /// A `]` appeared with no pending `[`.
    #[error("Unexpected loop end: {position}")]
    UnmatchedLoopEnd { position: Position },

    /// Writing to the output sink failed.
    #[error("I/O error at {position}: {source}")]
    Io {
        position: Position,
        #[source]
        source: std::io::Error,
    },
}

/// Fieldless view of an [`Error`], for callers that only switch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    DataPointerOutOfBounds,
    UnclosedLoopStart,
    UnmatchedLoopEnd,
    Io,
}

impl Error {
    pub fn position(&self) -> Position {
        match self {
            Error::DataPointerOutOfBounds { position }
            | Error::UnclosedLoopStart { position }
            | Error::UnmatchedLoopEnd { position }
            | Error::Io { position, .. } => *position,
        }
    }

    pub fn status(&self) -> StatusKind {
        match self {
            Error::DataPointerOutOfBounds { .. } => StatusKind::DataPointerOutOfBounds,
            Error::UnclosedLoopStart { .. } => StatusKind::UnclosedLoopStart,
            Error::UnmatchedLoopEnd { .. } => StatusKind::UnmatchedLoopEnd,
            Error::Io { .. } => StatusKind::Io,
        }
    }

    /// `true` for faults detected while parsing.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::UnclosedLoopStart { .. } | Error::UnmatchedLoopEnd { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
