#![doc = r#"
A Standard MIDI File engine.

`midilib` decodes and re-encodes the binary `MTrk` track format, keeps an
in-memory, time-ordered representation of events that can be edited while
staying encodable, and replays files in soft real time against a listener
set at musical tempo.

# Reading and writing

```rust
use midilib::prelude::*;

let mut track = MidiTrack::new();
track.insert_note(0, 60, 100, 0, 480)?;
track.insert_note(0, 64, 100, 480, 480)?;

let mut file = MidiFile::new(MidiFile::DEFAULT_RESOLUTION);
file.add_track(track);

let mut bytes = Vec::new();
file.write_to(&mut bytes)?;

let decoded = MidiFile::parse(&bytes)?;
assert_eq!(decoded.resolution(), 480);
assert_eq!(decoded.tracks()[0].event_count(), 4);
# Ok::<(), Box<dyn std::error::Error>>(())
```

# Playback

[`MidiProcessor`](crate::processor::MidiProcessor) drives a file's tracks in
soft real time: it polls a wall clock, converts elapsed milliseconds to
ticks at the current tempo, and hands due events to registered
[`EventListener`](crate::processor::EventListener)s, along with synthetic
metronome ticks at the active meter.

Malformed input degrades gracefully everywhere: unidentifiable events are
skipped with a diagnostic, unknown chunks are stepped over, and a truncated
track never corrupts the tracks decoded before it.
"#]

pub mod error;
pub mod events;
pub mod file;
pub mod processor;
pub mod reader;
pub mod track;
pub mod varlen;

/// Common re-exports.
pub mod prelude {
    pub use crate::{
        error::{ChunkError, EventError, HeaderError, ParseError, TrackError, VarLenError, WriteError},
        events::{
            ChannelEvent, ChannelKind, ChannelPrefix, EventBody, EventKind, GenericMeta,
            KeySignature, MetaEvent, Meter, MidiEvent, Scale, SysExEvent, Tempo, TimeSignature,
        },
        file::MidiFile,
        processor::{
            ChannelForwarder, EventListener, ListenerId, MidiProcessor, PlaybackMessage,
        },
        reader::{ReadResult, Reader, ReaderError, ReaderErrorKind},
        track::MidiTrack,
        varlen::VariableLengthQuantity,
    };
}
