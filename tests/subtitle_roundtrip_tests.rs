//! Subtitle round-trip tests
//!
//! Parse/emit fidelity for SRT and VTT tracks, speaker and emotion
//! extraction, and conversion into render plans.

use voicestage::script::{
    emit_srt, emit_vtt, parse_srt, parse_vtt, plan_from_subtitles, SubtitleCue,
};
use voicestage::EmotionKind;

/// Round-trip fidelity is scoped to index, times (±1 ms), speaker and
/// text. Emotion annotations are stripped on parse and never
/// reinserted on emit, so they drop out of the comparison.
fn assert_cues_round_trip(original: &[SubtitleCue], reparsed: &[SubtitleCue]) {
    assert_eq!(original.len(), reparsed.len());
    for (a, b) in original.iter().zip(reparsed) {
        assert_eq!(a.index, b.index);
        assert!(a.start_ms.abs_diff(b.start_ms) <= 1);
        assert!(a.end_ms.abs_diff(b.end_ms) <= 1);
        assert_eq!(a.speaker, b.speaker);
        assert_eq!(a.text, b.text);
    }
}

const SRT_SAMPLE: &str = "\
1
00:00:01,000 --> 00:00:03,000
ALICE: Hello [happy]!

2
00:00:03,500 --> 00:00:05,250
BOB: Oh. It's you.

3
00:00:06,000 --> 00:00:08,000
<i>The door creaks shut.</i>
";

#[test]
fn srt_reference_block_parses() {
    let track = parse_srt(SRT_SAMPLE).unwrap();
    assert_eq!(track.cues.len(), 3);

    let first = &track.cues[0];
    assert_eq!(first.index, 1);
    assert_eq!(first.start_ms, 1000);
    assert_eq!(first.end_ms, 3000);
    assert_eq!(first.speaker.as_deref(), Some("ALICE"));
    assert_eq!(first.text, "Hello !");
    assert_eq!(first.emotion, Some(EmotionKind::Happy));

    let third = &track.cues[2];
    assert!(third.speaker.is_none());
    assert_eq!(third.text, "The door creaks shut.");
}

#[test]
fn srt_round_trip_preserves_entries() {
    let track = parse_srt(SRT_SAMPLE).unwrap();
    let emitted = emit_srt(&track);
    let reparsed = parse_srt(&emitted).unwrap();

    assert_cues_round_trip(&track.cues, &reparsed.cues);
    // the annotation removal itself is preserved: the emitted text
    // carries no tag to re-extract
    assert!(!emitted.contains("[happy]"));
    assert_eq!(reparsed.cues[0].emotion, None);
}

#[test]
fn srt_indices_emitted_sequential_from_one() {
    let mut track = parse_srt(SRT_SAMPLE).unwrap();
    track.cues.remove(0);
    let emitted = emit_srt(&track);
    let reparsed = parse_srt(&emitted).unwrap();
    let indices: Vec<usize> = reparsed.cues.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![1, 2]);
}

#[test]
fn srt_crlf_round_trip() {
    let crlf = SRT_SAMPLE.replace('\n', "\r\n");
    let track = parse_srt(&crlf).unwrap();
    let emitted = emit_srt(&track);
    assert!(emitted.contains("\r\n"));
    assert_cues_round_trip(&track.cues, &parse_srt(&emitted).unwrap().cues);
}

#[test]
fn vtt_round_trip_preserves_entries() {
    let vtt = "\
WEBVTT

00:00:01.000 --> 00:00:03.000
ALICE: Hello [sad].

cue-2
00:00:03.500 --> 00:00:05.250
BOB: What now?
";
    let track = parse_vtt(vtt).unwrap();
    assert_eq!(track.cues.len(), 2);
    assert_eq!(track.cues[0].emotion, Some(EmotionKind::Sad));
    assert_eq!(track.cues[1].start_ms, 3500);

    let emitted = emit_vtt(&track);
    assert!(emitted.starts_with("WEBVTT"));
    let reparsed = parse_vtt(&emitted).unwrap();
    assert_cues_round_trip(&track.cues, &reparsed.cues);
    assert_eq!(reparsed.cues[0].emotion, None);
}

#[test]
fn unknown_bracket_names_stay_in_text() {
    let srt = "1\n00:00:00,000 --> 00:00:01,000\nALICE: Stop [yelling] please\n";
    let track = parse_srt(srt).unwrap();
    assert_eq!(track.cues[0].text, "Stop [yelling] please");
    assert_eq!(track.cues[0].emotion, None);
}

#[test]
fn subtitle_track_becomes_valid_plan() {
    let track = parse_srt(SRT_SAMPLE).unwrap();
    let plan = plan_from_subtitles(&track);
    assert!(plan.validate().is_ok());

    // ALICE, BOB and the narrator for the unattributed cue
    assert_eq!(plan.characters.len(), 3);
    assert_eq!(plan.lines.len(), 3);
    assert_eq!(plan.lines[0].timing.start_ms, Some(1000));
    assert_eq!(plan.lines[0].timing.end_ms, Some(3000));
    let emotion = plan.lines[0].emotion.as_ref().unwrap();
    assert_eq!(emotion.kind, EmotionKind::Happy);
}
