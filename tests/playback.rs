use midilib::prelude::*;
use std::{sync::Arc, time::Duration};

fn short_file() -> MidiFile {
    // two events inside the first ~100 ms at 120 BPM / 480 PPQ
    let mut track = MidiTrack::new();
    track.insert(MidiEvent::note_on(48, 0, 60, 100)).unwrap();
    track.insert(MidiEvent::note_off(96, 0, 60, 0)).unwrap();
    let mut file = MidiFile::new(MidiFile::DEFAULT_RESOLUTION);
    file.add_track(track);
    file
}

#[test]
fn playback_runs_to_completion() {
    let processor = MidiProcessor::new(Arc::new(short_file()));
    let (forwarder, receiver) = ChannelForwarder::new();
    processor.add_listener_to_all(forwarder);

    processor.start();

    let mut messages = Vec::new();
    loop {
        let message = receiver
            .recv_timeout(Duration::from_secs(10))
            .expect("playback should finish well within the timeout");
        let stopped = matches!(message, PlaybackMessage::Stopped { .. });
        messages.push(message);
        if stopped {
            break;
        }
    }

    assert_eq!(
        messages.first(),
        Some(&PlaybackMessage::Started {
            from_beginning: true
        })
    );
    assert_eq!(
        messages.last(),
        Some(&PlaybackMessage::Stopped { finished: true })
    );

    let kinds: Vec<EventKind> = messages
        .iter()
        .filter_map(|message| match message {
            PlaybackMessage::Event { event, .. } => Some(event.kind()),
            _ => None,
        })
        .collect();
    let on = kinds.iter().position(|k| *k == EventKind::NoteOn);
    let off = kinds.iter().position(|k| *k == EventKind::NoteOff);
    assert!(on.is_some() && off.is_some());
    assert!(on < off);

    assert!(!processor.is_running());
    assert!(processor.is_started());
}

#[test]
fn stop_is_observed_between_iterations() {
    // a file long enough that it cannot finish on its own
    let mut track = MidiTrack::new();
    track.insert(MidiEvent::note_on(480_000, 0, 60, 100)).unwrap();
    let mut file = MidiFile::new(MidiFile::DEFAULT_RESOLUTION);
    file.add_track(track);

    let processor = MidiProcessor::new(Arc::new(file));
    let (forwarder, receiver) = ChannelForwarder::new();
    processor.add_listener_to_all(forwarder);

    processor.start();
    assert!(processor.is_running());
    processor.stop();

    let mut stopped = None;
    while let Ok(message) = receiver.recv_timeout(Duration::from_secs(10)) {
        if let PlaybackMessage::Stopped { finished } = message {
            stopped = Some(finished);
            break;
        }
    }
    assert_eq!(stopped, Some(false));
    assert!(!processor.is_running());
}

#[test]
fn listeners_can_be_removed_before_playback() {
    let processor = MidiProcessor::new(Arc::new(short_file()));

    let (kept, kept_rx) = ChannelForwarder::new();
    let (removed, removed_rx) = ChannelForwarder::new();
    processor.add_listener(EventKind::NoteOn, kept);
    let id = processor.add_listener(EventKind::NoteOn, removed);
    assert!(processor.remove_listener(id));

    processor.start();

    let mut saw_note_on = false;
    while let Ok(message) = kept_rx.recv_timeout(Duration::from_secs(10)) {
        match message {
            PlaybackMessage::Event { event, .. } if event.kind() == EventKind::NoteOn => {
                saw_note_on = true;
            }
            PlaybackMessage::Stopped { .. } => break,
            _ => {}
        }
    }
    assert!(saw_note_on);
    assert_eq!(
        removed_rx
            .try_iter()
            .filter(|m| matches!(m, PlaybackMessage::Event { .. }))
            .count(),
        0
    );
}
