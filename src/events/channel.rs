#![doc = r#"
Channel voice events.

A channel voice event owns a status byte whose high nibble identifies the
kind and whose low nibble carries the channel, followed by one or two data
bytes depending on the kind. Under running status the status byte of a
repeated kind/channel pair is elided on the wire.
"#]

use crate::reader::{ReadResult, Reader};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::io::{self, Write};

/// The kind of a channel voice event, as the high nibble of its status byte.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ChannelKind {
    /// `0x8n`: key released
    NoteOff = 0x8,
    /// `0x9n`: key pressed (velocity 0 doubles as note-off)
    NoteOn = 0x9,
    /// `0xAn`: polyphonic key pressure
    NoteAftertouch = 0xA,
    /// `0xBn`: controller change
    Controller = 0xB,
    /// `0xCn`: program change
    ProgramChange = 0xC,
    /// `0xDn`: channel pressure
    ChannelAftertouch = 0xD,
    /// `0xEn`: pitch bend
    PitchBend = 0xE,
}

impl ChannelKind {
    /// The number of data bytes that follow the status byte.
    pub const fn data_bytes(&self) -> usize {
        match self {
            Self::ProgramChange | Self::ChannelAftertouch => 1,
            _ => 2,
        }
    }
}

/// A channel voice event: kind, channel and its one or two data bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelEvent {
    kind: ChannelKind,
    channel: u8,
    data1: u8,
    data2: u8,
}

impl ChannelEvent {
    /// Create a channel voice event.
    ///
    /// The channel is masked to its low four bits. For single-data-byte
    /// kinds, `data2` is ignored on the wire.
    pub const fn new(kind: ChannelKind, channel: u8, data1: u8, data2: u8) -> Self {
        Self {
            kind,
            channel: channel & 0x0F,
            data1,
            data2,
        }
    }

    /// A note-on for `pitch` at `velocity`.
    pub const fn note_on(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::new(ChannelKind::NoteOn, channel, pitch, velocity)
    }

    /// A note-off for `pitch`.
    pub const fn note_off(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::new(ChannelKind::NoteOff, channel, pitch, velocity)
    }

    /// Returns the kind of the event.
    pub const fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Returns the channel (0-15).
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Returns the first data byte (pitch, controller number, program, ...).
    pub const fn data1(&self) -> u8 {
        self.data1
    }

    /// Returns the second data byte (velocity, controller value, ...).
    pub const fn data2(&self) -> u8 {
        self.data2
    }

    /// The status byte: kind in the high nibble, channel in the low.
    pub fn status_byte(&self) -> u8 {
        (u8::from(self.kind) << 4) | self.channel
    }

    /// Encoded size including the status byte, excluding the delta-time.
    pub const fn event_size(&self) -> usize {
        1 + self.kind.data_bytes()
    }

    pub(crate) fn parse(kind: ChannelKind, channel: u8, reader: &mut Reader<'_>) -> ReadResult<Self> {
        let data1 = reader.read_byte()?;
        let data2 = if kind.data_bytes() == 2 {
            reader.read_byte()?
        } else {
            0
        };
        Ok(Self::new(kind, channel, data1, data2))
    }

    pub(crate) fn write_payload<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(&[self.data1])?;
        if self.kind.data_bytes() == 2 {
            sink.write_all(&[self.data2])?;
        }
        Ok(())
    }
}
