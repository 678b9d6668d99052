use crate::events::{EventKind, MidiEvent};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::HashMap;

/// Receives playback callbacks from a [`MidiProcessor`](super::MidiProcessor).
///
/// Callbacks run synchronously on the scheduling loop's thread: a slow
/// listener delays every later dispatch. Listeners must not register or
/// unregister other listeners from inside a callback.
pub trait EventListener: Send {
    /// The processor started. `from_beginning` is false when resuming from
    /// a previous elapsed-tick position.
    fn on_start(&mut self, from_beginning: bool) {
        let _ = from_beginning;
    }

    /// An event came due. `ms_elapsed` is the cumulative playback time.
    fn on_event(&mut self, event: &MidiEvent, ms_elapsed: u64);

    /// The processor stopped. `finished` is true when every track was
    /// drained rather than the run being stopped externally.
    fn on_stop(&mut self, finished: bool) {
        let _ = finished;
    }
}

/// A token identifying a registered listener, for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    by_kind: HashMap<EventKind, Vec<(ListenerId, Box<dyn EventListener>)>>,
    to_all: Vec<(ListenerId, Box<dyn EventListener>)>,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, kind: EventKind, listener: Box<dyn EventListener>) -> ListenerId {
        let id = self.next();
        self.by_kind.entry(kind).or_default().push((id, listener));
        id
    }

    pub(crate) fn add_to_all(&mut self, listener: Box<dyn EventListener>) -> ListenerId {
        let id = self.next();
        self.to_all.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.to_all.len();
        self.to_all.retain(|(own, _)| *own != id);
        if self.to_all.len() != before {
            return true;
        }
        for listeners in self.by_kind.values_mut() {
            let before = listeners.len();
            listeners.retain(|(own, _)| *own != id);
            if listeners.len() != before {
                return true;
            }
        }
        false
    }

    pub(crate) fn clear(&mut self) {
        self.by_kind.clear();
        self.to_all.clear();
    }

    /// Wildcard listeners first, then the ones registered for the kind.
    pub(crate) fn dispatch(&mut self, event: &MidiEvent, ms_elapsed: u64) {
        for (_, listener) in &mut self.to_all {
            listener.on_event(event, ms_elapsed);
        }
        if let Some(listeners) = self.by_kind.get_mut(&event.kind()) {
            for (_, listener) in listeners {
                listener.on_event(event, ms_elapsed);
            }
        }
    }

    pub(crate) fn fan_out_start(&mut self, from_beginning: bool) {
        for listeners in self.by_kind.values_mut() {
            for (_, listener) in listeners {
                listener.on_start(from_beginning);
            }
        }
        for (_, listener) in &mut self.to_all {
            listener.on_start(from_beginning);
        }
    }

    pub(crate) fn fan_out_stop(&mut self, finished: bool) {
        for listeners in self.by_kind.values_mut() {
            for (_, listener) in listeners {
                listener.on_stop(finished);
            }
        }
        for (_, listener) in &mut self.to_all {
            listener.on_stop(finished);
        }
    }

    fn next(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// A playback notification forwarded out of the scheduling loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackMessage {
    /// The processor started.
    Started {
        /// False when resuming mid-file.
        from_beginning: bool,
    },
    /// An event was dispatched.
    Event {
        /// The dispatched event.
        event: MidiEvent,
        /// Cumulative playback milliseconds at dispatch time.
        ms_elapsed: u64,
    },
    /// The processor stopped.
    Stopped {
        /// True when playback ran out of events.
        finished: bool,
    },
}

/// A listener that forwards every callback over a channel, for consumers on
/// other threads.
///
/// Send failures are ignored once the receiver is gone.
pub struct ChannelForwarder {
    sender: Sender<PlaybackMessage>,
}

impl ChannelForwarder {
    /// Create a forwarder and the receiving end of its channel.
    pub fn new() -> (Self, Receiver<PlaybackMessage>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl EventListener for ChannelForwarder {
    fn on_start(&mut self, from_beginning: bool) {
        let _ = self.sender.send(PlaybackMessage::Started { from_beginning });
    }

    fn on_event(&mut self, event: &MidiEvent, ms_elapsed: u64) {
        let _ = self.sender.send(PlaybackMessage::Event {
            event: event.clone(),
            ms_elapsed,
        });
    }

    fn on_stop(&mut self, finished: bool) {
        let _ = self.sender.send(PlaybackMessage::Stopped { finished });
    }
}
