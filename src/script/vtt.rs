//! WebVTT subtitle parsing and emission
//!
//! A VTT document begins with the literal line `WEBVTT`; timecodes use
//! a `.` millisecond separator; cue identifiers, when present, are
//! ignored. Everything else follows the SRT cue model.

use crate::core::error::{RenderError, Result};

use super::srt::{format_timecode, parse_timecode_line, split_cue_text};
use super::{LineEnding, SubtitleCue, SubtitleTrack};

/// Parse a WebVTT document
pub fn parse_vtt(input: &str) -> Result<SubtitleTrack> {
    let line_ending = LineEnding::detect(input);
    let normalized = input.replace("\r\n", "\n");

    let mut blocks = normalized.split("\n\n");
    let header = blocks.next().unwrap_or_default();
    if !header.trim_start().starts_with("WEBVTT") {
        return Err(RenderError::ScriptParse {
            line: 1,
            message: "missing WEBVTT header".to_string(),
        });
    }

    let mut cues = Vec::new();
    for (block_no, block) in blocks.enumerate() {
        let lines: Vec<&str> = block
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            continue;
        }
        // NOTE and STYLE blocks are metadata, not cues
        if lines[0].starts_with("NOTE") || lines[0] == "STYLE" {
            continue;
        }
        // an identifier line precedes the timecode when it lacks "-->"
        let timecode_idx = if lines[0].contains("-->") { 0 } else { 1 };
        if timecode_idx >= lines.len() {
            return Err(RenderError::ScriptParse {
                line: block_no + 1,
                message: format!("cue without timecode: {:?}", lines),
            });
        }
        let timecode_line = strip_cue_settings(lines[timecode_idx]);
        let (start_ms, end_ms) =
            parse_timecode_line(&timecode_line, '.').ok_or_else(|| {
                RenderError::ScriptParse {
                    line: block_no + 1,
                    message: format!("bad timecode line '{}'", lines[timecode_idx]),
                }
            })?;
        let raw_text = lines[timecode_idx + 1..].join(" ");
        let (speaker, text, emotion) = split_cue_text(&raw_text);

        cues.push(SubtitleCue {
            index: cues.len() + 1,
            start_ms,
            end_ms,
            speaker,
            text,
            emotion,
        });
    }

    Ok(SubtitleTrack { cues, line_ending })
}

/// Emit a WebVTT document with the preserved header
pub fn emit_vtt(track: &SubtitleTrack) -> String {
    let eol = track.line_ending.as_str();
    let mut out = String::from("WEBVTT");
    out.push_str(eol);
    out.push_str(eol);
    for cue in &track.cues {
        out.push_str(&format_timecode(cue.start_ms, '.'));
        out.push_str(" --> ");
        out.push_str(&format_timecode(cue.end_ms, '.'));
        out.push_str(eol);
        if let Some(ref speaker) = cue.speaker {
            out.push_str(speaker);
            out.push_str(": ");
        }
        out.push_str(&cue.text);
        out.push_str(eol);
        out.push_str(eol);
    }
    out
}

/// Drop cue settings (position, alignment) after the end timecode
fn strip_cue_settings(line: &str) -> String {
    match line.find("-->") {
        Some(arrow) => {
            let tail = &line[arrow + 3..];
            let end = tail
                .trim_start()
                .split_whitespace()
                .next()
                .unwrap_or_default();
            format!("{}--> {}", &line[..arrow], end)
        }
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionKind;

    const SAMPLE: &str = "WEBVTT\n\nintro\n00:00:01.000 --> 00:00:03.000\nALICE: Hello [happy]!\n\n00:00:03.500 --> 00:00:05.250 align:center\nBOB: Oh, hello.\n";

    #[test]
    fn test_parse_with_identifier_and_settings() {
        let track = parse_vtt(SAMPLE).unwrap();
        assert_eq!(track.cues.len(), 2);
        assert_eq!(track.cues[0].start_ms, 1000);
        assert_eq!(track.cues[0].speaker.as_deref(), Some("ALICE"));
        assert_eq!(track.cues[0].emotion, Some(EmotionKind::Happy));
        assert_eq!(track.cues[1].start_ms, 3500);
        assert_eq!(track.cues[1].end_ms, 5250);
        assert_eq!(track.cues[1].text, "Oh, hello.");
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(parse_vtt("1\n00:00:01.000 --> 00:00:02.000\nhi\n").is_err());
    }

    #[test]
    fn test_round_trip() {
        let track = parse_vtt(SAMPLE).unwrap();
        let emitted = emit_vtt(&track);
        assert!(emitted.starts_with("WEBVTT"));
        let reparsed = parse_vtt(&emitted).unwrap();
        // emotion tags are stripped on parse and not reinserted, so
        // round-trip equality is index, times, speaker and text
        assert_eq!(reparsed.cues.len(), track.cues.len());
        for (a, b) in track.cues.iter().zip(&reparsed.cues) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.start_ms, b.start_ms);
            assert_eq!(a.end_ms, b.end_ms);
            assert_eq!(a.speaker, b.speaker);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn test_note_blocks_skipped() {
        let input = "WEBVTT\n\nNOTE a comment\n\n00:00:00.000 --> 00:00:01.000\nhi\n";
        let track = parse_vtt(input).unwrap();
        assert_eq!(track.cues.len(), 1);
    }
}
