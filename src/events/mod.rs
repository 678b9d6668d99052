#![doc = r#"
The event model.

Every event carries an absolute `tick` position and the variable-length
`delta` to its predecessor in the owning track; the payload is one of a
closed set of bodies: channel voice, meta, system exclusive, or the
synthetic metronome tick the playback processor emits.

# Identification

Decoding reads one leading byte. A high nibble in `0x8..=0xE` is a channel
voice status (channel in the low nibble); `0xFF` starts a meta event;
`0xF0`/`0xF7` a sysex event. Any byte below `0x80` is *not* consumed as a
status byte: it is re-examined as the first payload byte of an event reusing
the most recently seen status (running status). If no status has been seen
yet, identification fails and the caller skips a byte to resynchronize.
"#]

mod channel;
pub use channel::*;

mod meta;
pub use meta::*;

mod sysex;
pub use sysex::*;

use crate::{
    error::{EventError, VarLenError, WriteError},
    reader::{ReadResult, Reader},
    varlen::VariableLengthQuantity,
};
use core::cmp::Ordering;
use std::io::Write;

/// The payload of a [`MidiEvent`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventBody {
    /// A channel voice event
    ChannelVoice(ChannelEvent),
    /// A meta event
    Meta(MetaEvent),
    /// A system-exclusive event
    SystemExclusive(SysExEvent),
    /// A synthetic metronome tick; zero size, never written to a file
    MetronomeTick,
}

/// The concrete kind of an event, used as the listener registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// [`ChannelKind::NoteOff`]
    NoteOff,
    /// [`ChannelKind::NoteOn`]
    NoteOn,
    /// [`ChannelKind::NoteAftertouch`]
    NoteAftertouch,
    /// [`ChannelKind::Controller`]
    Controller,
    /// [`ChannelKind::ProgramChange`]
    ProgramChange,
    /// [`ChannelKind::ChannelAftertouch`]
    ChannelAftertouch,
    /// [`ChannelKind::PitchBend`]
    PitchBend,
    /// [`MetaEvent::Tempo`]
    Tempo,
    /// [`MetaEvent::TimeSignature`]
    TimeSignature,
    /// [`MetaEvent::KeySignature`]
    KeySignature,
    /// [`MetaEvent::ChannelPrefix`]
    ChannelPrefix,
    /// [`MetaEvent::EndOfTrack`]
    EndOfTrack,
    /// [`MetaEvent::Generic`]
    GenericMeta,
    /// [`EventBody::SystemExclusive`]
    SystemExclusive,
    /// [`EventBody::MetronomeTick`]
    MetronomeTick,
}

/// One MIDI event: an absolute tick, the delta-time to its predecessor, and
/// a payload body.
///
/// `delta` is derived state: the owning track recomputes it whenever
/// insertion or removal changes the event's neighbors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidiEvent {
    tick: u64,
    delta: VariableLengthQuantity,
    body: EventBody,
}

impl MidiEvent {
    /// Create an event at `tick` with a zero delta-time.
    ///
    /// The delta is set by the track on insertion.
    pub fn new(tick: u64, body: EventBody) -> Self {
        Self {
            tick,
            delta: VariableLengthQuantity::default(),
            body,
        }
    }

    /// A note-on for `pitch` at `velocity` on `channel`.
    pub fn note_on(tick: u64, channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::new(
            tick,
            EventBody::ChannelVoice(ChannelEvent::note_on(channel, pitch, velocity)),
        )
    }

    /// A note-off for `pitch` on `channel`.
    pub fn note_off(tick: u64, channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::new(
            tick,
            EventBody::ChannelVoice(ChannelEvent::note_off(channel, pitch, velocity)),
        )
    }

    /// A tempo event in microseconds per quarter note.
    pub fn tempo(tick: u64, mpqn: u32) -> Self {
        Self::new(tick, EventBody::Meta(MetaEvent::Tempo(Tempo::new(mpqn))))
    }

    /// A time signature event.
    pub fn time_signature(tick: u64, signature: TimeSignature) -> Self {
        Self::new(tick, EventBody::Meta(MetaEvent::TimeSignature(signature)))
    }

    /// An end-of-track marker.
    pub fn end_of_track(tick: u64) -> Self {
        Self::new(tick, EventBody::Meta(MetaEvent::EndOfTrack))
    }

    /// The synthetic metronome tick dispatched by the processor.
    pub fn metronome() -> Self {
        Self::new(0, EventBody::MetronomeTick)
    }

    /// Returns the absolute tick position.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Move the event to a new absolute tick.
    ///
    /// The owning track's deltas are only consistent again once the event is
    /// re-inserted.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Returns the delta-time to the predecessor event.
    pub const fn delta(&self) -> &VariableLengthQuantity {
        &self.delta
    }

    /// Replace the delta-time value.
    pub fn set_delta(&mut self, delta: u64) -> Result<(), VarLenError> {
        let value = u32::try_from(delta).map_err(|_| VarLenError::ValueOutOfRange(delta))?;
        self.delta.set_value(value)
    }

    /// Returns the payload body.
    pub const fn body(&self) -> &EventBody {
        &self.body
    }

    /// Returns the concrete kind tag.
    pub const fn kind(&self) -> EventKind {
        match &self.body {
            EventBody::ChannelVoice(event) => match event.kind() {
                ChannelKind::NoteOff => EventKind::NoteOff,
                ChannelKind::NoteOn => EventKind::NoteOn,
                ChannelKind::NoteAftertouch => EventKind::NoteAftertouch,
                ChannelKind::Controller => EventKind::Controller,
                ChannelKind::ProgramChange => EventKind::ProgramChange,
                ChannelKind::ChannelAftertouch => EventKind::ChannelAftertouch,
                ChannelKind::PitchBend => EventKind::PitchBend,
            },
            EventBody::Meta(meta) => match meta {
                MetaEvent::Tempo(_) => EventKind::Tempo,
                MetaEvent::TimeSignature(_) => EventKind::TimeSignature,
                MetaEvent::KeySignature(_) => EventKind::KeySignature,
                MetaEvent::ChannelPrefix(_) => EventKind::ChannelPrefix,
                MetaEvent::EndOfTrack => EventKind::EndOfTrack,
                MetaEvent::Generic(_) => EventKind::GenericMeta,
            },
            EventBody::SystemExclusive(_) => EventKind::SystemExclusive,
            EventBody::MetronomeTick => EventKind::MetronomeTick,
        }
    }

    /// True if this is the end-of-track marker.
    pub const fn is_end_of_track(&self) -> bool {
        matches!(&self.body, EventBody::Meta(MetaEvent::EndOfTrack))
    }

    /// Encoded size excluding the delta-time, including status/type bytes.
    ///
    /// The metronome tick has no wire form and reports zero.
    pub fn event_size(&self) -> usize {
        match &self.body {
            EventBody::ChannelVoice(event) => event.event_size(),
            EventBody::Meta(meta) => meta.event_size(),
            EventBody::SystemExclusive(sysex) => sysex.event_size(),
            EventBody::MetronomeTick => 0,
        }
    }

    /// Encoded size including the delta-time.
    pub fn total_size(&self) -> usize {
        match &self.body {
            EventBody::MetronomeTick => 0,
            _ => self.event_size() + self.delta.byte_count(),
        }
    }

    /// Whether this event must write its status byte when serialized after
    /// `previous`.
    ///
    /// Meta events always write `0xFF` and their type byte. A channel voice
    /// event elides its status byte exactly when the previous event is a
    /// channel voice event of the same kind on the same channel (running
    /// status).
    pub fn needs_status_byte(&self, previous: Option<&MidiEvent>) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        match (&self.body, &previous.body) {
            (EventBody::Meta(_), _) => true,
            (EventBody::ChannelVoice(this), EventBody::ChannelVoice(prev)) => {
                this.kind() != prev.kind() || this.channel() != prev.channel()
            }
            _ => true,
        }
    }

    /// Write the delta-time, the status byte when requested, and the
    /// payload. Metronome ticks write nothing.
    pub fn write_to<W: Write>(&self, sink: &mut W, write_status_byte: bool) -> Result<(), WriteError> {
        match &self.body {
            EventBody::MetronomeTick => Ok(()),
            EventBody::ChannelVoice(event) => {
                sink.write_all(self.delta.bytes())?;
                if write_status_byte {
                    sink.write_all(&[event.status_byte()])?;
                }
                Ok(event.write_payload(sink)?)
            }
            EventBody::Meta(meta) => {
                sink.write_all(self.delta.bytes())?;
                sink.write_all(&[0xFF])?;
                Ok(meta.write_payload(sink)?)
            }
            EventBody::SystemExclusive(sysex) => {
                sink.write_all(self.delta.bytes())?;
                sink.write_all(&[sysex.status()])?;
                Ok(sysex.write_payload(sink)?)
            }
        }
    }

    /// Classify and decode the next event.
    ///
    /// Any leading byte that fails to classify is consumed so the caller
    /// resumes at the following byte.
    pub(crate) fn parse(
        tick: u64,
        delta: VariableLengthQuantity,
        reader: &mut Reader<'_>,
        running: &mut RunningStatus,
    ) -> ReadResult<Self> {
        let Some(lead) = reader.peek_byte() else {
            return Err(crate::reader::ReaderError::truncated(reader.buffer_position()));
        };

        let status = if lead & 0x80 != 0 {
            reader.read_byte()?;
            running.status = Some(lead);
            lead
        } else {
            match running.status {
                Some(status) => status,
                None => {
                    // consume the stray data byte so decoding can resync
                    reader.read_byte()?;
                    return Err(reader.parse_err(EventError::UnrecognizedStatus(lead)));
                }
            }
        };

        let body = match status {
            0x80..=0xEF => {
                let Ok(kind) = ChannelKind::try_from(status >> 4) else {
                    return Err(reader.parse_err(EventError::UnrecognizedStatus(status)));
                };
                let channel = status & 0x0F;
                EventBody::ChannelVoice(ChannelEvent::parse(kind, channel, reader)?)
            }
            0xFF => EventBody::Meta(MetaEvent::parse(reader)?),
            0xF0 | 0xF7 => EventBody::SystemExclusive(SysExEvent::parse(status, reader)?),
            other => {
                return Err(reader.parse_err(EventError::UnrecognizedStatus(other)));
            }
        };

        Ok(Self { tick, delta, body })
    }

    /// The track's total order: tick ascending, then delta value descending
    /// (a lower delta sorts later), then body comparison.
    ///
    /// Ties are broken by the track keeping arrival order, so no two
    /// distinct events are ever collapsed into one.
    pub(crate) fn ordering(&self, other: &Self) -> Ordering {
        self.tick
            .cmp(&other.tick)
            .then_with(|| other.delta.value().cmp(&self.delta.value()))
            .then_with(|| self.body.cmp(&other.body))
    }
}

/// The most recently seen status byte, threaded through a track decode so
/// identification is reentrant per track.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunningStatus {
    status: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_one(bytes: &[u8], running: &mut RunningStatus) -> ReadResult<MidiEvent> {
        let mut reader = Reader::from_byte_slice(bytes);
        MidiEvent::parse(0, VariableLengthQuantity::default(), &mut reader, running)
    }

    #[test]
    fn classifies_channel_voice() {
        let mut running = RunningStatus::default();
        let event = parse_one(&[0x93, 0x3C, 0x64], &mut running).unwrap();
        assert_eq!(event.kind(), EventKind::NoteOn);
        let EventBody::ChannelVoice(voice) = event.body() else {
            panic!("expected channel voice");
        };
        assert_eq!(voice.channel(), 3);
        assert_eq!(voice.data1(), 0x3C);
    }

    #[test]
    fn reuses_running_status() {
        let mut running = RunningStatus::default();
        parse_one(&[0x90, 0x3C, 0x64], &mut running).unwrap();
        // no status byte: first byte is the pitch
        let event = parse_one(&[0x3E, 0x64], &mut running).unwrap();
        assert_eq!(event.kind(), EventKind::NoteOn);
    }

    #[test]
    fn fails_without_any_status() {
        let mut running = RunningStatus::default();
        let err = parse_one(&[0x3C, 0x64], &mut running).unwrap_err();
        assert!(err.is_unrecognized_event());
    }

    #[test]
    fn unknown_status_byte_is_consumed() {
        let mut running = RunningStatus::default();
        let mut reader = Reader::from_byte_slice(&[0x3C, 0x90]);
        let err = MidiEvent::parse(
            0,
            VariableLengthQuantity::default(),
            &mut reader,
            &mut running,
        )
        .unwrap_err();
        assert!(err.is_unrecognized_event());
        // the stray byte is gone; the next read sees the status byte
        assert_eq!(reader.peek_byte(), Some(0x90));
    }

    #[test]
    fn running_status_elision_rules() {
        let first = MidiEvent::note_on(0, 0, 60, 100);
        let second = MidiEvent::note_on(10, 0, 62, 100);
        let other_channel = MidiEvent::note_on(20, 1, 62, 100);
        let off = MidiEvent::note_off(30, 0, 60, 0);
        let tempo = MidiEvent::tempo(40, 500_000);

        assert!(first.needs_status_byte(None));
        assert!(!second.needs_status_byte(Some(&first)));
        assert!(other_channel.needs_status_byte(Some(&second)));
        assert!(off.needs_status_byte(Some(&second)));
        assert!(tempo.needs_status_byte(Some(&tempo)));
    }

    #[test]
    fn sizes_include_status_and_delta() {
        let mut event = MidiEvent::note_on(480, 0, 60, 100);
        event.set_delta(480).unwrap();
        assert_eq!(event.event_size(), 3);
        // delta 480 encodes in two bytes
        assert_eq!(event.total_size(), 5);
        assert_eq!(MidiEvent::metronome().total_size(), 0);
    }

    #[test]
    fn ordering_prefers_tick_then_inverted_delta() {
        let mut early = MidiEvent::note_on(100, 0, 60, 100);
        let mut late = MidiEvent::note_on(200, 0, 60, 100);
        assert_eq!(early.ordering(&late), Ordering::Less);

        // same tick: the higher delta sorts first
        late.set_tick(100);
        early.set_delta(240).unwrap();
        late.set_delta(0).unwrap();
        assert_eq!(early.ordering(&late), Ordering::Less);
    }
}
