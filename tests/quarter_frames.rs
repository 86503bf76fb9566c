mod utils;

use midi_timecode::core::{MtcRateCode, TimecodeTime};
use midi_timecode::mtc::{quarter_frame_payloads, Assembler};
use utils::enable_logging;

/// The two-byte wire messages for one timecode, in transmission order.
fn wire_messages(t: &TimecodeTime, rate: MtcRateCode) -> Vec<[u8; 2]> {
    quarter_frame_payloads(t, rate)
        .iter()
        .map(|&payload| [0xf1, payload])
        .collect()
}

/// A tiny deterministic generator so the dropped-piece property does not need a rand dependency.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

// Scenario: 25 fps, 01:02:03.04 must serialize to this exact byte stream.
#[test]
fn emitted_bytes_for_25fps_window() {
    enable_logging();
    let t = TimecodeTime::new(1, 2, 3, 4);
    let messages = wire_messages(&t, MtcRateCode::Fps25);
    let flat: Vec<u8> = messages.iter().flatten().copied().collect();
    assert_eq!(
        flat,
        vec![
            0xf1, 0x04, 0xf1, 0x10, 0xf1, 0x23, 0xf1, 0x30, 0xf1, 0x42, 0xf1, 0x50, 0xf1, 0x61,
            0xf1, 0x72,
        ]
    );
}

// Scenario: the same stream fed back emits exactly one record and nothing more until the next
// complete set.
#[test]
fn one_record_per_complete_set() {
    enable_logging();
    let mut assembler = Assembler::new();
    let t = TimecodeTime::new(1, 2, 3, 4);

    let mut emitted = Vec::new();
    for message in wire_messages(&t, MtcRateCode::Fps25) {
        if let Some(tc) = assembler.feed_message(&message) {
            emitted.push(tc);
        }
    }
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].hour, 1);
    assert_eq!(emitted[0].minute, 2);
    assert_eq!(emitted[0].second, 3);
    assert_eq!(emitted[0].frame, 4);
    assert_eq!(emitted[0].rate, MtcRateCode::Fps25);

    // a partial follow-up window emits nothing
    for message in wire_messages(&t, MtcRateCode::Fps25).iter().take(7) {
        assert!(assembler.feed_message(message).is_none());
    }
}

// Property: any well-formed 0..7 sequence reproduces its encoded values exactly.
#[test]
fn well_formed_sequences_round_trip() {
    enable_logging();
    let cases = [
        (TimecodeTime::new(0, 0, 0, 0), MtcRateCode::Fps24),
        (TimecodeTime::new(23, 59, 59, 23), MtcRateCode::Fps24),
        (TimecodeTime::new(12, 34, 56, 12), MtcRateCode::Fps25),
        (TimecodeTime::new(9, 58, 0, 29), MtcRateCode::Fps2997Drop),
        (TimecodeTime::new(16, 1, 30, 15), MtcRateCode::Fps30),
    ];
    let mut assembler = Assembler::new();
    for (t, rate) in cases.iter() {
        let mut emitted = Vec::new();
        for message in wire_messages(t, *rate) {
            if let Some(tc) = assembler.feed_message(&message) {
                emitted.push(tc);
            }
        }
        assert_eq!(emitted.len(), 1, "case {} {:?}", t, rate);
        let tc = emitted[0];
        assert_eq!(
            (tc.hour, tc.minute, tc.second, tc.frame, tc.rate),
            (t.hour, t.minute, t.second, t.frame, *rate)
        );
    }
}

// Property: with pieces dropped at random, a record appears exactly when all eight pieces have
// been seen since the last emission, never otherwise.
#[test]
fn dropped_pieces_never_produce_partial_records() {
    enable_logging();
    let mut assembler = Assembler::new();
    let mut rng = XorShift(0x1234_5678_9abc_def0);
    let t = TimecodeTime::new(4, 5, 6, 8);

    let mut seen: u8 = 0;
    let mut expected = 0usize;
    let mut emitted = 0usize;

    for _window in 0..500 {
        for (piece, message) in wire_messages(&t, MtcRateCode::Fps30).iter().enumerate() {
            // drop roughly one piece in five
            if rng.next() % 5 == 0 {
                continue;
            }
            seen |= 1 << piece;
            let result = assembler.feed_message(message);
            if piece == 7 && seen == 0xff {
                expected += 1;
                seen = 0;
                assert!(result.is_some());
            } else {
                assert!(result.is_none());
            }
            emitted += result.is_some() as usize;
        }
    }
    assert_eq!(emitted, expected);
    assert!(emitted > 0, "the drop pattern never let a window through");
}

// A reordered stream self-heals: after garbage interleaving, one clean 0..7 run emits.
#[test]
fn reordered_stream_self_heals() {
    enable_logging();
    let mut assembler = Assembler::new();
    let t = TimecodeTime::new(2, 2, 2, 2);
    let messages = wire_messages(&t, MtcRateCode::Fps25);

    // scrambled order: piece 7 arrives mid-window, so no emission happens even though every
    // piece was seen before it
    for &index in &[3usize, 1, 4, 0, 2, 6, 5] {
        assert!(assembler.feed_message(&messages[index]).is_none());
    }
    // piece 7 completes the mask; the scrambled window emits once
    assert!(assembler.feed_message(&messages[7]).is_some());

    // and a clean window afterwards behaves normally
    let emitted: Vec<_> = messages
        .iter()
        .filter_map(|m| assembler.feed_message(m))
        .collect();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].frame, 2);
}
