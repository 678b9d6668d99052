use midilib::prelude::*;
use pretty_assertions::assert_eq;

fn serialize(file: &mut MidiFile) -> Vec<u8> {
    let mut bytes = Vec::new();
    file.write_to(&mut bytes).unwrap();
    bytes
}

#[test]
fn decode_then_reencode_is_byte_identical() {
    let mut track = MidiTrack::new();
    track.insert(MidiEvent::tempo(0, 500_000)).unwrap();
    track.insert(MidiEvent::note_on(0, 0, 60, 100)).unwrap();
    track
        .insert(MidiEvent::new(
            240,
            EventBody::ChannelVoice(ChannelEvent::new(ChannelKind::Controller, 0, 64, 127)),
        ))
        .unwrap();
    track.insert(MidiEvent::note_off(480, 0, 60, 0)).unwrap();

    let mut file = MidiFile::new(MidiFile::DEFAULT_RESOLUTION);
    file.add_track(track);

    let first = serialize(&mut file);
    let mut decoded = MidiFile::parse(&first).unwrap();
    let second = serialize(&mut decoded);

    assert_eq!(first, second);
}

#[test]
fn running_status_elides_repeated_status_bytes() {
    let mut track = MidiTrack::new();
    track.insert(MidiEvent::note_on(0, 0, 60, 100)).unwrap();
    track.insert(MidiEvent::note_on(480, 0, 64, 100)).unwrap();

    let mut bytes = Vec::new();
    track.write_to(&mut bytes).unwrap();

    assert_eq!(
        bytes,
        vec![
            b'M', b'T', b'r', b'k', 0x00, 0x00, 0x00, 0x0C,
            0x00, 0x90, 0x3C, 0x64, // first note-on carries its status byte
            0x83, 0x60, 0x40, 0x64, // second one elides it
            0x01, 0xFF, 0x2F, 0x00, // end of track, one tick later
        ]
    );
}

#[test]
fn differing_kinds_keep_their_status_bytes() {
    let mut track = MidiTrack::new();
    track.insert(MidiEvent::note_on(0, 0, 60, 100)).unwrap();
    track.insert(MidiEvent::note_off(480, 0, 60, 0)).unwrap();

    let mut bytes = Vec::new();
    track.write_to(&mut bytes).unwrap();

    // both status bytes present: 12 event bytes
    assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x0D]);
    assert_eq!(bytes[9], 0x90);
    assert_eq!(bytes[14], 0x80);
}

#[test]
fn running_status_is_not_shared_across_channels() {
    let mut track = MidiTrack::new();
    track.insert(MidiEvent::note_on(0, 0, 60, 100)).unwrap();
    track.insert(MidiEvent::note_on(480, 1, 60, 100)).unwrap();

    let mut bytes = Vec::new();
    track.write_to(&mut bytes).unwrap();

    assert_eq!(bytes[9], 0x90);
    assert_eq!(bytes[14], 0x91);
}

#[test]
fn meta_and_sysex_round_trip_through_a_file() {
    let mut track = MidiTrack::new();
    track
        .insert(MidiEvent::new(
            0,
            EventBody::Meta(MetaEvent::KeySignature(KeySignature::new(-2, Scale::Minor))),
        ))
        .unwrap();
    track
        .insert(MidiEvent::new(
            0,
            EventBody::Meta(MetaEvent::ChannelPrefix(ChannelPrefix::new(3))),
        ))
        .unwrap();
    track
        .insert(MidiEvent::new(
            120,
            EventBody::SystemExclusive(SysExEvent::new(0xF0, vec![0x43, 0x12, 0x00]).unwrap()),
        ))
        .unwrap();
    track
        .insert(MidiEvent::new(
            240,
            EventBody::Meta(MetaEvent::Generic(
                GenericMeta::new(0x01, b"take 7".to_vec()).unwrap(),
            )),
        ))
        .unwrap();

    let mut file = MidiFile::new(MidiFile::DEFAULT_RESOLUTION);
    file.add_track(track);

    let first = serialize(&mut file);
    let mut decoded = MidiFile::parse(&first).unwrap();

    let events = decoded.tracks()[0].events();
    assert_eq!(events.len(), 4);
    assert!(matches!(
        events[2].body(),
        EventBody::SystemExclusive(sysex) if sysex.data() == [0x43, 0x12, 0x00]
    ));
    assert!(matches!(
        events[3].body(),
        EventBody::Meta(MetaEvent::Generic(generic)) if generic.data() == b"take 7"
    ));

    let second = serialize(&mut decoded);
    assert_eq!(first, second);
}

#[test]
fn edits_after_a_round_trip_stay_encodable() {
    let mut track = MidiTrack::new();
    track.insert_note(0, 60, 100, 0, 480).unwrap();

    let mut file = MidiFile::new(MidiFile::DEFAULT_RESOLUTION);
    file.add_track(track);
    let bytes = serialize(&mut file);

    // the decoded track is open again: keep editing it
    let mut decoded = MidiFile::parse(&bytes).unwrap();
    let track = &mut decoded.tracks_mut()[0];
    assert!(!track.is_closed());
    track.insert_note(0, 64, 100, 240, 480).unwrap();

    let mut prev_tick = 0;
    for event in track.events() {
        assert_eq!(u64::from(event.delta().value()), event.tick() - prev_tick);
        prev_tick = event.tick();
    }

    let reencoded = serialize(&mut decoded);
    let redecoded = MidiFile::parse(&reencoded).unwrap();
    assert_eq!(redecoded.tracks()[0].event_count(), 4);
}
