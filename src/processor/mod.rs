#![doc = r#"
Real-time playback of a [`MidiFile`].

The processor advances a tick clock from wall-clock time using the current
tempo and the file's resolution, emits synthetic metronome ticks at the
active meter, and dispatches due events to registered listeners. One
background thread runs the scheduling loop; `start`, `stop` and listener
registration may be called from any thread.

Tracks are drained one after another rather than merged by tick, so two
events at the same tick in different tracks are delivered in track order.

# Example
```rust,no_run
use midilib::prelude::*;
use std::sync::Arc;

let file = MidiFile::parse(&std::fs::read("song.mid")?)?;
let processor = MidiProcessor::new(Arc::new(file));

let (forwarder, receiver) = ChannelForwarder::new();
processor.add_listener_to_all(forwarder);
processor.start();

while let Ok(message) = receiver.recv() {
    if let PlaybackMessage::Stopped { .. } = message {
        break;
    }
}
# Ok::<(), Box<dyn std::error::Error>>(())
```
"#]

mod listener;
pub use listener::*;

use crate::{
    events::{EventKind, Meter, MetaEvent, MidiEvent, EventBody, Tempo},
    file::MidiFile,
};
use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};
use tracing::debug;

/// The scheduling loop's target polling interval.
const PROCESS_RATE_MS: u64 = 8;

/// Drives playback of one file against a set of listeners.
pub struct MidiProcessor {
    file: Arc<MidiFile>,
    shared: Arc<Shared>,
}

struct Shared {
    running: AtomicBool,
    registry: Mutex<ListenerRegistry>,
    state: Mutex<PlaybackState>,
}

struct PlaybackState {
    ticks_elapsed: f64,
    ms_elapsed: u64,
    mpqn: u32,
    resolution: u16,
    metronome_progress: f64,
    metronome_interval: u32,
    cursors: Vec<usize>,
}

/// The outcome of one clock advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    /// Less than one tick accrued; nothing consumed.
    Waiting,
    /// Time advanced, events may have been dispatched, more remain.
    Advanced,
    /// Every track cursor is exhausted.
    Finished,
}

impl MidiProcessor {
    /// Create a processor bound to a file.
    ///
    /// Tempo defaults to 120 BPM and the metronome to a quarter-note meter
    /// until Tempo/TimeSignature events are dispatched.
    pub fn new(file: Arc<MidiFile>) -> Self {
        let resolution = file.resolution();
        let cursors = vec![0; file.track_count()];
        Self {
            file,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                registry: Mutex::new(ListenerRegistry::default()),
                state: Mutex::new(PlaybackState {
                    ticks_elapsed: 0.0,
                    ms_elapsed: 0,
                    mpqn: Tempo::DEFAULT_MPQN,
                    resolution,
                    metronome_progress: 0.0,
                    metronome_interval: Meter::Quarter.interval(resolution),
                    cursors,
                }),
            }),
        }
    }

    /// Start the scheduling loop on a background thread.
    ///
    /// Idempotent while already running. A restart after [`stop`](Self::stop)
    /// resumes from the last elapsed-tick position; use
    /// [`reset`](Self::reset) to replay from the beginning.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let file = Arc::clone(&self.file);
        thread::spawn(move || run(shared, file));
    }

    /// Ask the loop to stop; observed at the top of its next iteration.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }

    /// Stop and rewind to the beginning.
    pub fn reset(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        let mut state = self.shared.state.lock();
        state.ticks_elapsed = 0.0;
        state.ms_elapsed = 0;
        state.metronome_progress = 0.0;
        for cursor in &mut state.cursors {
            *cursor = 0;
        }
    }

    /// True while the scheduling loop is running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// True once any playback time has elapsed.
    pub fn is_started(&self) -> bool {
        self.shared.state.lock().ticks_elapsed > 0.0
    }

    /// Register a listener for one concrete event kind.
    pub fn add_listener<L: EventListener + 'static>(&self, kind: EventKind, listener: L) -> ListenerId {
        self.shared.registry.lock().add(kind, Box::new(listener))
    }

    /// Register a listener for every dispatched event.
    pub fn add_listener_to_all<L: EventListener + 'static>(&self, listener: L) -> ListenerId {
        self.shared.registry.lock().add_to_all(Box::new(listener))
    }

    /// Unregister a listener. Returns false if the token is unknown.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.registry.lock().remove(id)
    }

    /// Unregister every listener.
    pub fn clear_listeners(&self) {
        self.shared.registry.lock().clear();
    }
}

/// The scheduling loop. Exactly one instance runs per processor, guarded by
/// the running flag.
fn run(shared: Arc<Shared>, file: Arc<MidiFile>) {
    let from_beginning = shared.state.lock().ticks_elapsed < 1.0;
    debug!(from_beginning, "playback loop starting");
    shared.registry.lock().fan_out_start(from_beginning);

    let mut last = Instant::now();
    let mut finished = false;

    while shared.running.load(Ordering::SeqCst) {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(last).as_millis() as u64;
        if elapsed_ms < PROCESS_RATE_MS {
            thread::yield_now();
            continue;
        }

        match shared.advance(&file, elapsed_ms) {
            Advance::Waiting => continue,
            Advance::Advanced => last = now,
            Advance::Finished => {
                finished = true;
                break;
            }
        }
    }

    shared.running.store(false, Ordering::SeqCst);
    debug!(finished, "playback loop stopped");
    shared.registry.lock().fan_out_stop(finished);
}

impl Shared {
    /// One iteration of the tick clock: convert elapsed wall-clock time to
    /// ticks at the current tempo, accrue the metronome phase, then drain
    /// every due event track by track.
    fn advance(&self, file: &MidiFile, elapsed_ms: u64) -> Advance {
        let mut due: Vec<MidiEvent> = Vec::new();
        let outcome;
        {
            let mut state = self.state.lock();
            let ticks = ms_to_ticks(elapsed_ms, state.mpqn, state.resolution);
            if ticks < 1.0 {
                // not a whole tick yet; the unconsumed time accrues
                return Advance::Waiting;
            }

            state.metronome_progress += ticks;
            let interval = f64::from(state.metronome_interval);
            if state.metronome_progress >= interval {
                state.metronome_progress %= interval;
                due.push(MidiEvent::metronome());
            }

            state.ms_elapsed += elapsed_ms;
            state.ticks_elapsed += ticks;

            let mut remaining = false;
            for (index, track) in file.tracks().iter().enumerate() {
                let events = track.events();
                while let Some(event) = events.get(state.cursors[index]) {
                    if event.tick() as f64 > state.ticks_elapsed {
                        break;
                    }
                    state.cursors[index] += 1;
                    due.push(event.clone());
                }
                if state.cursors[index] < events.len() {
                    remaining = true;
                }
            }
            outcome = if remaining {
                Advance::Advanced
            } else {
                Advance::Finished
            };
        }

        for event in &due {
            self.dispatch(event);
        }
        outcome
    }

    /// Apply tempo/meter side effects, then fan out to listeners.
    fn dispatch(&self, event: &MidiEvent) {
        match event.body() {
            EventBody::Meta(MetaEvent::Tempo(tempo)) => {
                self.state.lock().mpqn = tempo.mpqn();
            }
            EventBody::Meta(MetaEvent::TimeSignature(signature)) => {
                let mut state = self.state.lock();
                state.metronome_interval = signature.meter().interval(state.resolution);
            }
            _ => {}
        }
        let ms_elapsed = self.state.lock().ms_elapsed;
        self.registry.lock().dispatch(event, ms_elapsed);
    }
}

/// Convert elapsed milliseconds to elapsed ticks at the given tempo.
fn ms_to_ticks(ms: u64, mpqn: u32, resolution: u16) -> f64 {
    (ms as f64 * 1000.0 * f64::from(resolution)) / f64::from(mpqn)
}
