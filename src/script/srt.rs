//! SRT subtitle parsing and emission
//!
//! Blocks separated by blank lines: an integer index, a timecode line
//! `HH:MM:SS,mmm --> HH:MM:SS,mmm`, and one or more text lines. Text
//! may carry a `SPEAKER:` prefix (uppercase first token ending in a
//! colon) and bracketed emotion tags from the closed vocabulary.
//! Emission is reproducible: 1-based sequential indices and the
//! source's line-ending style.

use serde::{Deserialize, Serialize};

use crate::core::error::{RenderError, Result};
use crate::emotion::EmotionKind;

use super::{extract_emotion_tag, strip_markup, LineEnding};

/// One parsed subtitle cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// 1-based sequential index
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Uppercase speaker prefix, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Cue text with markup and emotion tags stripped
    pub text: String,
    /// Emotion extracted from a bracketed tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionKind>,
}

/// A parsed subtitle document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SubtitleTrack {
    pub cues: Vec<SubtitleCue>,
    /// Preserved for emission
    #[serde(default)]
    pub line_ending: LineEnding,
}

/// Parse an SRT document
pub fn parse_srt(input: &str) -> Result<SubtitleTrack> {
    let line_ending = LineEnding::detect(input);
    let normalized = input.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for (block_no, block) in normalized.split("\n\n").enumerate() {
        let lines: Vec<&str> = block
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            continue;
        }
        if lines.len() < 2 {
            return Err(RenderError::ScriptParse {
                line: block_no + 1,
                message: format!("incomplete subtitle block: {:?}", lines),
            });
        }
        let index: usize = lines[0].trim().parse().map_err(|_| RenderError::ScriptParse {
            line: block_no + 1,
            message: format!("expected cue index, found '{}'", lines[0]),
        })?;
        let (start_ms, end_ms) = parse_timecode_line(lines[1], ',').ok_or_else(|| {
            RenderError::ScriptParse {
                line: block_no + 1,
                message: format!("bad timecode line '{}'", lines[1]),
            }
        })?;
        let raw_text = lines[2..].join(" ");
        let (speaker, text, emotion) = split_cue_text(&raw_text);

        cues.push(SubtitleCue {
            index,
            start_ms,
            end_ms,
            speaker,
            text,
            emotion,
        });
    }

    Ok(SubtitleTrack { cues, line_ending })
}

/// Emit an SRT document. Indices are renumbered 1-based sequential.
pub fn emit_srt(track: &SubtitleTrack) -> String {
    let eol = track.line_ending.as_str();
    let mut out = String::new();
    for (i, cue) in track.cues.iter().enumerate() {
        out.push_str(&(i + 1).to_string());
        out.push_str(eol);
        out.push_str(&format_timecode(cue.start_ms, ','));
        out.push_str(" --> ");
        out.push_str(&format_timecode(cue.end_ms, ','));
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

/// Split cue text into speaker prefix, cleaned text, and emotion tag
pub(crate) fn split_cue_text(raw: &str) -> (Option<String>, String, Option<EmotionKind>) {
    let stripped = strip_markup(raw);
    let (speaker, rest) = take_speaker_prefix(&stripped);
    let (text, emotion) = extract_emotion_tag(&rest);
    (speaker, text.trim().to_string(), emotion)
}

/// Uppercase first token ending in ':' is a speaker prefix
fn take_speaker_prefix(text: &str) -> (Option<String>, String) {
    let trimmed = text.trim_start();
    if let Some(colon) = trimmed.find(':') {
        let candidate = &trimmed[..colon];
        let is_upper = !candidate.is_empty()
            && candidate.chars().all(|c| !c.is_alphabetic() || c.is_uppercase())
            && candidate.chars().any(|c| c.is_alphabetic())
            && !candidate.contains(char::is_whitespace);
        if is_upper {
            return (
                Some(candidate.to_string()),
                trimmed[colon + 1..].trim_start().to_string(),
            );
        }
    }
    (None, text.to_string())
}

/// Parse `HH:MM:SS<sep>mmm --> HH:MM:SS<sep>mmm`
pub(crate) fn parse_timecode_line(line: &str, sep: char) -> Option<(u64, u64)> {
    let mut parts = line.split("-->");
    let start = parse_timecode(parts.next()?.trim(), sep)?;
    let end = parse_timecode(parts.next()?.trim(), sep)?;
    if parts.next().is_some() || end < start {
        return None;
    }
    Some((start, end))
}

/// Parse `HH:MM:SS<sep>mmm` into milliseconds
pub(crate) fn parse_timecode(value: &str, sep: char) -> Option<u64> {
    let (clock, millis) = value.rsplit_once(sep)?;
    let millis: u64 = millis.trim().parse().ok()?;
    if millis >= 1000 {
        return None;
    }
    let fields: Vec<&str> = clock.split(':').collect();
    if fields.len() != 3 {
        return None;
    }
    let hours: u64 = fields[0].trim().parse().ok()?;
    let minutes: u64 = fields[1].trim().parse().ok()?;
    let seconds: u64 = fields[2].trim().parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Format milliseconds as `HH:MM:SS<sep>mmm`
pub(crate) fn format_timecode(ms: u64, sep: char) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, seconds, sep, millis
    )
}
