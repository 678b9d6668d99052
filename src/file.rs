#![doc = r#"
The `MThd` file container: a resolution plus an ordered list of tracks.

The header carries the format (derived from the track count), the number of
tracks and the division. Only tick-per-quarter-note division is supported;
SMPTE division is rejected at parse time.
"#]

use crate::{
    error::{ChunkError, HeaderError, WriteError},
    reader::{ReadResult, Reader},
    track::MidiTrack,
};
use std::io::Write;
use tracing::{debug, warn};

/// A standard MIDI file: resolution and tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidiFile {
    resolution: u16,
    tracks: Vec<MidiTrack>,
}

impl MidiFile {
    /// The 4-byte header chunk identifier.
    pub const IDENTIFIER: [u8; 4] = *b"MThd";

    /// The conventional default resolution, in pulses per quarter note.
    pub const DEFAULT_RESOLUTION: u16 = 480;

    /// Create an empty file with the given resolution.
    ///
    /// The resolution is masked to 15 bits (the high division bit selects
    /// SMPTE timing, which this engine does not produce).
    pub fn new(resolution: u16) -> Self {
        Self {
            resolution: resolution & 0x7FFF,
            tracks: Vec::new(),
        }
    }

    /// Returns the resolution in pulses per quarter note.
    pub const fn resolution(&self) -> u16 {
        self.resolution
    }

    /// Append a track.
    pub fn add_track(&mut self, track: MidiTrack) {
        self.tracks.push(track);
    }

    /// Returns the tracks in file order.
    pub fn tracks(&self) -> &[MidiTrack] {
        &self.tracks
    }

    /// Returns the tracks mutably.
    pub fn tracks_mut(&mut self) -> &mut [MidiTrack] {
        &mut self.tracks
    }

    /// Returns the number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Parse a file from bytes.
    ///
    /// Unknown chunks are skipped over their declared size with a warning.
    /// A track that fails to decode abandons the remaining chunks but keeps
    /// every track decoded before it.
    pub fn parse(bytes: &[u8]) -> ReadResult<Self> {
        let mut reader = Reader::from_byte_slice(bytes);

        let identifier: [u8; 4] = reader.read_exact_size()?;
        if identifier != Self::IDENTIFIER {
            return Err(reader.parse_err(ChunkError::InvalidIdentifier(identifier)));
        }
        let length = u32::from_be_bytes(reader.read_exact_size()?);
        if length != 6 {
            return Err(reader.parse_err(HeaderError::Length(length)));
        }
        let _format = u16::from_be_bytes(reader.read_exact_size()?);
        let declared_tracks = u16::from_be_bytes(reader.read_exact_size()?);
        let division: [u8; 2] = reader.read_exact_size()?;
        if division[0] & 0x80 != 0 {
            return Err(reader.parse_err(HeaderError::SmpteDivision(division)));
        }

        let mut file = Self::new(u16::from_be_bytes(division));

        while !reader.is_empty() {
            match reader.peek_slice(4) {
                Some(identifier) if identifier == MidiTrack::IDENTIFIER => {
                    match MidiTrack::parse(&mut reader) {
                        Ok(track) => file.tracks.push(track),
                        Err(e) => {
                            warn!(error = %e, "abandoning remaining chunks");
                            break;
                        }
                    }
                }
                Some(_) => {
                    let identifier: [u8; 4] = reader.read_exact_size()?;
                    let Ok(size) = reader.read_exact_size::<4>() else {
                        warn!("truncated chunk header");
                        break;
                    };
                    let size = u32::from_be_bytes(size);
                    warn!(identifier = ?identifier, size, "skipping unknown chunk");
                    if reader.skip(size as usize).is_err() {
                        warn!("unknown chunk overruns the buffer");
                        break;
                    }
                }
                None => {
                    warn!(trailing = reader.remaining(), "trailing bytes after last chunk");
                    break;
                }
            }
        }

        if file.tracks.len() != usize::from(declared_tracks) {
            debug!(
                declared = declared_tracks,
                decoded = file.tracks.len(),
                "track count differs from header"
            );
        }
        Ok(file)
    }

    /// Write the header and every track, closing open tracks as they are
    /// written.
    pub fn write_to<W: Write>(&mut self, sink: &mut W) -> Result<(), WriteError> {
        let format: u16 = if self.tracks.len() > 1 { 1 } else { 0 };

        sink.write_all(&Self::IDENTIFIER)?;
        sink.write_all(&6u32.to_be_bytes())?;
        sink.write_all(&format.to_be_bytes())?;
        sink.write_all(&(self.tracks.len() as u16).to_be_bytes())?;
        sink.write_all(&self.resolution.to_be_bytes())?;

        for track in &mut self.tracks {
            track.write_to(sink)?;
        }
        Ok(())
    }
}
