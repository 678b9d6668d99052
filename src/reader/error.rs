use crate::error::ParseError;
use thiserror::Error;

#[doc = r#"
A set of errors that can occur while reading bytes into the midi
representation.
"#]
#[derive(Debug, Error)]
#[error("reading at position {position}, {kind}")]
pub struct ReaderError {
    position: usize,
    pub(crate) kind: ReaderErrorKind,
}

/// A kind of error that a reader can produce.
#[derive(Debug, Error)]
pub enum ReaderErrorKind {
    /// Parsing errors
    #[error("parsing {0}")]
    Parse(#[from] ParseError),
    /// The buffer ended mid-read.
    #[error("input truncated")]
    TruncatedInput,
}

impl ReaderError {
    /// Create a reader error from a position and kind.
    pub const fn new(position: usize, kind: ReaderErrorKind) -> Self {
        Self { position, kind }
    }

    /// Create a new truncated-input error.
    pub const fn truncated(position: usize) -> Self {
        Self {
            position,
            kind: ReaderErrorKind::TruncatedInput,
        }
    }

    /// Create a new parse error.
    pub const fn parse_error(position: usize, error: ParseError) -> Self {
        Self {
            position,
            kind: ReaderErrorKind::Parse(error),
        }
    }

    /// True if the buffer ended before the read completed.
    pub const fn is_truncated(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::TruncatedInput)
    }

    /// Returns the error kind of the reader.
    pub fn error_kind(&self) -> &ReaderErrorKind {
        &self.kind
    }

    /// Returns the position where the read error occurred.
    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn is_unrecognized_event(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::Parse(ParseError::Event(_)))
    }
}

/// The read result type (see [`ReaderError`]).
pub type ReadResult<T> = Result<T, ReaderError>;
