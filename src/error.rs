#![doc = r#"
Errors produced while parsing, mutating and writing MIDI data.

Each domain owns a small error enum; [`ParseError`] composes the ones that can
surface while decoding bytes. Errors raised by the byte reader additionally
carry the buffer position, see [`ReaderError`](crate::reader::ReaderError).
"#]

use thiserror::Error;

/// A set of errors that can occur while parsing bytes into the midi
/// representation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Chunk-level errors (bad identifier)
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    /// File header errors
    #[error(transparent)]
    Header(#[from] HeaderError),
    /// Event identification errors
    #[error(transparent)]
    Event(#[from] EventError),
    /// Variable-length quantity errors
    #[error(transparent)]
    VarLen(#[from] VarLenError),
}

/// An error identifying a chunk.
///
/// Fatal for the chunk it occurred in; the file-level decode skips the chunk
/// and continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    /// The 4-byte identifier was not the one expected at this position.
    #[error("chunk identifier {0:02X?} did not match the expected identifier")]
    InvalidIdentifier([u8; 4]),
}

/// An error in the file header chunk.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// The declared header length was not 6.
    #[error("declared header length {0} is not 6")]
    Length(u32),
    /// SMPTE division timing is not supported; only ticks per quarter note.
    #[error("SMPTE division {0:02X?} is not supported")]
    SmpteDivision([u8; 2]),
}

/// An error identifying a single event.
///
/// Recoverable: the event is skipped with a diagnostic and decoding continues
/// from the next byte.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// No status byte could be determined for the leading byte, and no
    /// running status was in effect.
    #[error("no status could be determined for leading byte {0:#04X}")]
    UnrecognizedStatus(u8),
}

/// An error encoding or decoding a variable-length quantity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VarLenError {
    /// The value does not fit in the four-byte (28-bit) encoding.
    ///
    /// On the encode path this indicates a logic error upstream, such as a
    /// non-monotonic tick sequence producing an oversized delta.
    #[error("value {0} cannot be encoded in four variable-length bytes")]
    ValueOutOfRange(u64),
    /// Four continuation bytes were read without a terminating byte.
    #[error("no terminating byte within four variable-length bytes")]
    MissingTerminator,
}

/// An error mutating a track.
///
/// The track state is left unchanged by a failed mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    /// The track already contains an end-of-track marker.
    #[error("cannot add an event to a closed track")]
    Closed,
    /// An end-of-track marker must land after every event currently present.
    #[error("end of track must come after every existing event")]
    EndOfTrackNotLast,
    /// A recomputed delta-time did not fit its encoding.
    #[error(transparent)]
    Delta(#[from] VarLenError),
}

/// An error writing midi data to a sink.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The sink failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Closing the track before writing failed.
    #[error(transparent)]
    Track(#[from] TrackError),
}
