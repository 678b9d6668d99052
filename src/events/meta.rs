#![doc = r#"
Meta events.

A meta event is stored as the status byte `0xFF`, a one-byte type selector, a
variable-length payload length and the payload itself. The types the engine
understands get first-class representations; anything else round-trips
through [`GenericMeta`] with its raw bytes unchanged.
"#]

use crate::{
    reader::{ReadResult, Reader},
    varlen::VariableLengthQuantity,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::io::{self, Write};

/// A meta event payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaEvent {
    /// `0x51`: tempo in microseconds per quarter note
    Tempo(Tempo),
    /// `0x58`: time signature and metronome meter
    TimeSignature(TimeSignature),
    /// `0x59`: key and scale
    KeySignature(KeySignature),
    /// `0x20`: channel prefix for subsequent meta/sysex events
    ChannelPrefix(ChannelPrefix),
    /// `0x2F`: end-of-track marker
    EndOfTrack,
    /// Any unrecognized meta type, kept byte-for-byte
    Generic(GenericMeta),
}

impl MetaEvent {
    /// Type byte for tempo events.
    pub const TEMPO: u8 = 0x51;
    /// Type byte for time signature events.
    pub const TIME_SIGNATURE: u8 = 0x58;
    /// Type byte for key signature events.
    pub const KEY_SIGNATURE: u8 = 0x59;
    /// Type byte for channel prefix events.
    pub const CHANNEL_PREFIX: u8 = 0x20;
    /// Type byte for the end-of-track marker.
    pub const END_OF_TRACK: u8 = 0x2F;

    /// Returns the type selector byte.
    pub const fn type_byte(&self) -> u8 {
        match self {
            Self::Tempo(_) => Self::TEMPO,
            Self::TimeSignature(_) => Self::TIME_SIGNATURE,
            Self::KeySignature(_) => Self::KEY_SIGNATURE,
            Self::ChannelPrefix(_) => Self::CHANNEL_PREFIX,
            Self::EndOfTrack => Self::END_OF_TRACK,
            Self::Generic(generic) => generic.type_byte,
        }
    }

    /// Encoded size including the `0xFF` status and type bytes, excluding
    /// the delta-time.
    pub fn event_size(&self) -> usize {
        match self {
            Self::Tempo(_) => 6,
            Self::TimeSignature(_) => 7,
            Self::KeySignature(_) => 5,
            Self::ChannelPrefix(_) => 4,
            Self::EndOfTrack => 3,
            Self::Generic(generic) => {
                1 + 1 + generic.length.byte_count() + generic.data.len()
            }
        }
    }

    /// Parse the bytes following a `0xFF` status byte.
    ///
    /// A recognized type whose payload has an unexpected length or an
    /// out-of-range field falls back to [`MetaEvent::Generic`] so the bytes
    /// survive a round trip.
    pub(crate) fn parse(reader: &mut Reader<'_>) -> ReadResult<Self> {
        let type_byte = reader.read_byte()?;
        let length = VariableLengthQuantity::parse(reader)?;
        let data = reader.read_exact(length.value() as usize)?;

        let event = match (type_byte, data) {
            (Self::TEMPO, &[a, b, c]) => Self::Tempo(Tempo::from_bytes([a, b, c])),
            (Self::TIME_SIGNATURE, &[numerator, pow, meter, thirty_seconds]) => {
                match Meter::try_from(meter) {
                    Ok(meter) => Self::TimeSignature(TimeSignature {
                        numerator,
                        denominator_pow: pow,
                        meter,
                        thirty_seconds,
                    }),
                    Err(_) => Self::generic(type_byte, length, data),
                }
            }
            (Self::KEY_SIGNATURE, &[key, scale]) => match Scale::try_from(scale) {
                Ok(scale) => Self::KeySignature(KeySignature {
                    key: key as i8,
                    scale,
                }),
                Err(_) => Self::generic(type_byte, length, data),
            },
            (Self::CHANNEL_PREFIX, &[channel]) => {
                Self::ChannelPrefix(ChannelPrefix { channel })
            }
            (Self::END_OF_TRACK, &[]) => Self::EndOfTrack,
            _ => Self::generic(type_byte, length, data),
        };
        Ok(event)
    }

    fn generic(type_byte: u8, length: VariableLengthQuantity, data: &[u8]) -> Self {
        Self::Generic(GenericMeta {
            type_byte,
            length,
            data: data.to_vec(),
        })
    }

    /// Write the type byte, length and payload. The `0xFF` status byte is
    /// written by the owning event.
    pub(crate) fn write_payload<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(&[self.type_byte()])?;
        match self {
            Self::Tempo(tempo) => {
                sink.write_all(&[0x03])?;
                sink.write_all(&tempo.bytes())
            }
            Self::TimeSignature(signature) => {
                sink.write_all(&[
                    0x04,
                    signature.numerator,
                    signature.denominator_pow,
                    signature.meter.into(),
                    signature.thirty_seconds,
                ])
            }
            Self::KeySignature(signature) => {
                sink.write_all(&[0x02, signature.key as u8, signature.scale.into()])
            }
            Self::ChannelPrefix(prefix) => sink.write_all(&[0x01, prefix.channel]),
            Self::EndOfTrack => sink.write_all(&[0x00]),
            Self::Generic(generic) => {
                sink.write_all(generic.length.bytes())?;
                sink.write_all(&generic.data)
            }
        }
    }
}

/// Tempo, stored as microseconds per quarter note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tempo {
    mpqn: u32,
}

impl Tempo {
    /// 500000 microseconds per quarter note, i.e. 120 BPM.
    pub const DEFAULT_MPQN: u32 = 500_000;
    /// The beats-per-minute equivalent of [`Self::DEFAULT_MPQN`].
    pub const DEFAULT_BPM: f32 = 120.0;

    /// Create a tempo from microseconds per quarter note.
    pub const fn new(mpqn: u32) -> Self {
        Self { mpqn }
    }

    /// Create a tempo from beats per minute.
    pub fn from_bpm(bpm: f32) -> Self {
        Self {
            mpqn: (60_000_000.0 / bpm) as u32,
        }
    }

    /// Returns the microseconds per quarter note.
    pub const fn mpqn(&self) -> u32 {
        self.mpqn
    }

    /// Returns the tempo in beats per minute.
    pub fn bpm(&self) -> f32 {
        60_000_000.0 / self.mpqn as f32
    }

    pub(crate) const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            mpqn: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        }
    }

    pub(crate) const fn bytes(&self) -> [u8; 3] {
        let [_, a, b, c] = self.mpqn.to_be_bytes();
        [a, b, c]
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MPQN)
    }
}

/// The metronome meter: MIDI clocks per metronome tick.
///
/// A quarter-note meter ticks once per beat (24 MIDI clocks).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Meter {
    /// Tick every eighth note
    Eighth = 12,
    /// Tick every quarter note
    Quarter = 24,
    /// Tick every half note
    Half = 48,
    /// Tick every whole note
    Whole = 96,
}

impl Meter {
    /// The metronome interval in ticks for the given resolution.
    pub const fn interval(&self, resolution: u16) -> u32 {
        let resolution = resolution as u32;
        match self {
            Self::Eighth => resolution / 2,
            Self::Quarter => resolution,
            Self::Half => resolution * 2,
            Self::Whole => resolution * 4,
        }
    }
}

/// Time signature and metronome configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    numerator: u8,
    denominator_pow: u8,
    meter: Meter,
    thirty_seconds: u8,
}

impl TimeSignature {
    /// The default number of thirty-second notes per quarter note.
    pub const DEFAULT_DIVISION: u8 = 8;

    /// Create a time signature.
    ///
    /// `denominator` is the real denominator (a power of two; other values
    /// are rounded down to one).
    pub const fn new(numerator: u8, denominator: u8, meter: Meter, thirty_seconds: u8) -> Self {
        Self {
            numerator,
            denominator_pow: if denominator == 0 {
                0
            } else {
                denominator.ilog2() as u8
            },
            meter,
            thirty_seconds,
        }
    }

    /// Returns the numerator.
    pub const fn numerator(&self) -> u8 {
        self.numerator
    }

    /// Returns the real denominator (2 raised to the stored power,
    /// saturating for powers a `u16` cannot hold).
    pub const fn denominator(&self) -> u16 {
        match 1u16.checked_shl(self.denominator_pow as u32) {
            Some(value) => value,
            None => u16::MAX,
        }
    }

    /// Returns the metronome meter.
    pub const fn meter(&self) -> Meter {
        self.meter
    }

    /// Returns the number of thirty-second notes per quarter note.
    pub const fn thirty_seconds(&self) -> u8 {
        self.thirty_seconds
    }
}

impl Default for TimeSignature {
    /// 4/4 with a quarter-note metronome.
    fn default() -> Self {
        Self::new(4, 4, Meter::Quarter, Self::DEFAULT_DIVISION)
    }
}

/// Major or minor, as the scale byte of a key signature.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Scale {
    /// Major scale
    Major = 0,
    /// Minor scale
    Minor = 1,
}

/// Key signature: accidentals count and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeySignature {
    key: i8,
    scale: Scale,
}

impl KeySignature {
    /// Create a key signature. Negative keys count flats, positive sharps.
    pub const fn new(key: i8, scale: Scale) -> Self {
        Self { key, scale }
    }

    /// Returns the key (-7 flats to +7 sharps).
    pub const fn key(&self) -> i8 {
        self.key
    }

    /// Returns the scale.
    pub const fn scale(&self) -> Scale {
        self.scale
    }
}

/// The channel that subsequent meta and sysex events apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelPrefix {
    channel: u8,
}

impl ChannelPrefix {
    /// Create a channel prefix.
    pub const fn new(channel: u8) -> Self {
        Self { channel }
    }

    /// Returns the channel.
    pub const fn channel(&self) -> u8 {
        self.channel
    }
}

/// An unrecognized meta event, preserved byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericMeta {
    pub(crate) type_byte: u8,
    pub(crate) length: VariableLengthQuantity,
    pub(crate) data: Vec<u8>,
}

impl GenericMeta {
    /// Create a generic meta event from a type byte and raw payload.
    pub fn new(type_byte: u8, data: Vec<u8>) -> Result<Self, crate::error::VarLenError> {
        let length = VariableLengthQuantity::new(data.len() as u32)?;
        Ok(Self {
            type_byte,
            length,
            data,
        })
    }

    /// Returns the type selector byte.
    pub const fn type_byte(&self) -> u8 {
        self.type_byte
    }

    /// Returns the raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
