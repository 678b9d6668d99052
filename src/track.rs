#![doc = r#"
The `MTrk` track chunk: an ordered, delta-consistent event container.

A track keeps its events totally ordered by tick and keeps every event's
delta-time equal to the tick distance from its predecessor, fixing up only
the immediate neighbors on each mutation. Once an end-of-track marker is
present the track is closed and rejects further insertion.

# Example
```rust
use midilib::prelude::*;

let mut track = MidiTrack::new();
track.insert(MidiEvent::note_on(480, 0, 60, 100))?;
track.insert(MidiEvent::note_on(0, 0, 64, 100))?;

let deltas: Vec<u32> = track.events().iter().map(|e| e.delta().value()).collect();
assert_eq!(deltas, vec![0, 480]);
# Ok::<(), midilib::error::TrackError>(())
```
"#]

use crate::{
    error::{ChunkError, TrackError, WriteError},
    events::{MidiEvent, RunningStatus},
    reader::{ReadResult, Reader},
    varlen::VariableLengthQuantity,
};
use core::cmp::Ordering;
use std::io::Write;
use tracing::{debug, warn};

/// An ordered collection of events for one track chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidiTrack {
    events: Vec<MidiEvent>,
    size: usize,
    size_dirty: bool,
    closed: bool,
}

impl MidiTrack {
    /// The 4-byte chunk identifier.
    pub const IDENTIFIER: [u8; 4] = *b"MTrk";

    /// Create an empty, open track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a track seeded with a default time signature and tempo at
    /// tick 0, the conventional first track of a multi-track file.
    pub fn tempo_track() -> Self {
        let mut track = Self::new();
        // fresh events at tick 0 cannot fail to insert
        let _ = track.insert(MidiEvent::tempo(0, crate::events::Tempo::DEFAULT_MPQN));
        let _ = track.insert(MidiEvent::time_signature(0, Default::default()));
        track
    }

    /// Returns the events in track order.
    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    /// Returns the number of events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Returns the tick of the last event, or 0 when empty.
    pub fn len_ticks(&self) -> u64 {
        self.events.last().map(MidiEvent::tick).unwrap_or(0)
    }

    /// True once an end-of-track marker is present.
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// The encoded byte size of the event data, recomputed if stale.
    ///
    /// Accounts for the one-byte saving of every elided running-status byte.
    pub fn size_bytes(&mut self) -> usize {
        if self.size_dirty {
            self.recalculate_size();
        }
        self.size
    }

    /// Insert an event at its ordered position, fixing up neighbor deltas.
    ///
    /// The event's delta is set from its predecessor (or its own tick when
    /// it becomes first), and the successor's delta is recomputed against
    /// the new event. Fails with [`TrackError::Closed`] on a closed track,
    /// and with [`TrackError::EndOfTrackNotLast`] if an end-of-track marker
    /// would land before an existing event. An inserted end-of-track marker
    /// closes the track.
    pub fn insert(&mut self, mut event: MidiEvent) -> Result<(), TrackError> {
        if self.closed {
            return Err(TrackError::Closed);
        }

        let index = self
            .events
            .iter()
            .position(|existing| existing.ordering(&event) == Ordering::Greater)
            .unwrap_or(self.events.len());

        let is_end = event.is_end_of_track();
        if is_end && index < self.events.len() {
            return Err(TrackError::EndOfTrackNotLast);
        }

        let delta = match index.checked_sub(1).and_then(|i| self.events.get(i)) {
            Some(prev) => event.tick() - prev.tick(),
            None => event.tick(),
        };
        event.set_delta(delta)?;

        self.size += event.total_size();
        self.size_dirty = true;
        self.events.insert(index, event);

        if index + 1 < self.events.len() {
            let inserted_tick = self.events[index].tick();
            let next_tick = self.events[index + 1].tick();
            self.events[index + 1].set_delta(next_tick - inserted_tick)?;
        }

        if is_end {
            self.closed = true;
        }
        Ok(())
    }

    /// Insert a note-on/note-off pair for one note.
    ///
    /// The note-off is a note-on at velocity 0, so the pair shares running
    /// status with surrounding note-ons when written.
    pub fn insert_note(
        &mut self,
        channel: u8,
        pitch: u8,
        velocity: u8,
        tick: u64,
        duration: u64,
    ) -> Result<(), TrackError> {
        self.insert(MidiEvent::note_on(tick, channel, pitch, velocity))?;
        self.insert(MidiEvent::note_on(tick + duration, channel, pitch, 0))
    }

    /// Append an event without neighbor fix-up.
    ///
    /// The caller guarantees the event belongs after everything present and
    /// already carries a consistent delta; used for bulk construction such
    /// as decoding. Appending to a closed track is dropped with a warning.
    pub fn append(&mut self, event: MidiEvent) {
        if self.closed {
            warn!("dropping event appended to a closed track");
            return;
        }
        let is_end = event.is_end_of_track();
        self.size += event.total_size();
        self.size_dirty = true;
        self.events.push(event);
        if is_end {
            self.closed = true;
        }
    }

    /// Remove an event, matching by equality.
    ///
    /// Returns `Ok(false)` when no matching event exists. The successor's
    /// delta is recomputed against the new predecessor, or against its own
    /// tick when it becomes first.
    pub fn remove(&mut self, event: &MidiEvent) -> Result<bool, TrackError> {
        let Some(index) = self.events.iter().position(|existing| existing == event) else {
            return Ok(false);
        };

        let removed = self.events.remove(index);
        self.size = self.size.saturating_sub(removed.total_size());
        self.size_dirty = true;

        if index < self.events.len() {
            let successor_tick = self.events[index].tick();
            let delta = match index.checked_sub(1).and_then(|i| self.events.get(i)) {
                Some(prev) => successor_tick - prev.tick(),
                None => successor_tick,
            };
            self.events[index].set_delta(delta)?;
        }
        Ok(true)
    }

    /// Close the track by inserting an end-of-track marker one tick past
    /// the last event (tick 0 when empty). A no-op when already closed.
    pub fn close(&mut self) -> Result<(), TrackError> {
        if self.closed {
            return Ok(());
        }
        let tick = match self.events.last() {
            Some(last) => last.tick() + 1,
            None => 0,
        };
        self.insert(MidiEvent::end_of_track(tick))
    }

    /// Write the chunk: identifier, 4-byte big-endian size, then every
    /// event in order, threading the previous event for running-status
    /// decisions. Closes the track first if it is still open.
    pub fn write_to<W: Write>(&mut self, sink: &mut W) -> Result<(), WriteError> {
        if !self.closed {
            self.close()?;
        }
        let size = self.size_bytes() as u32;

        sink.write_all(&Self::IDENTIFIER)?;
        sink.write_all(&size.to_be_bytes())?;

        let mut previous: Option<&MidiEvent> = None;
        for event in &self.events {
            event.write_to(sink, event.needs_status_byte(previous))?;
            previous = Some(event);
        }
        Ok(())
    }

    /// Decode a track chunk.
    ///
    /// The declared chunk size is informational. Events that fail to
    /// identify are skipped with a warning; decoding stops at the
    /// end-of-track marker, which is *not* kept, leaving the track open for
    /// further editing. Truncation mid-event aborts the track.
    pub fn parse(reader: &mut Reader<'_>) -> ReadResult<Self> {
        let identifier: [u8; 4] = reader.read_exact_size()?;
        if identifier != Self::IDENTIFIER {
            return Err(reader.parse_err(ChunkError::InvalidIdentifier(identifier)));
        }
        let declared_size = u32::from_be_bytes(reader.read_exact_size()?);
        let data_start = reader.buffer_position();

        let mut track = Self::new();
        let mut running = RunningStatus::default();
        let mut total_ticks = 0u64;

        loop {
            let delta = VariableLengthQuantity::parse(reader)?;
            total_ticks += u64::from(delta.value());

            match MidiEvent::parse(total_ticks, delta, reader, &mut running) {
                Ok(event) if event.is_end_of_track() => break,
                Ok(event) => track.append(event),
                Err(e) if e.is_unrecognized_event() => {
                    warn!(position = e.position(), "skipping unidentifiable event");
                }
                Err(e) => return Err(e),
            }
        }

        let consumed = reader.buffer_position() - data_start;
        if consumed != declared_size as usize {
            debug!(declared_size, consumed, "declared track size differs from bytes read");
        }
        Ok(track)
    }

    fn recalculate_size(&mut self) {
        let mut size = 0;
        let mut previous: Option<&MidiEvent> = None;
        for event in &self.events {
            size += event.total_size();
            if !event.needs_status_byte(previous) {
                size -= 1;
            }
            previous = Some(event);
        }
        self.size = size;
        self.size_dirty = false;
    }
}
