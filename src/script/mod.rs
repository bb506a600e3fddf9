//! Script and subtitle input
//!
//! Parses screenplay, play, chat and novel style scripts plus SRT/VTT
//! subtitle tracks into a single line stream carrying speaker, emotion
//! and timing hints, and converts that stream into a render plan.

pub mod dialogue;
pub mod srt;
pub mod vtt;

pub use dialogue::{detect_format, parse_auto, parse_script, ScriptFormat};
pub use srt::{parse_srt, emit_srt, SubtitleCue, SubtitleTrack};
pub use vtt::{parse_vtt, emit_vtt};

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionKind, EmotionProfile};
use crate::plan::{Character, Line, LineTiming, RenderPlan};

/// Line-ending style of a parsed document, preserved on emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }

    /// Detect from document content; CRLF wins when both appear
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::Crlf
        } else {
            LineEnding::Lf
        }
    }
}

/// One parsed utterance from any script format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    /// Speaker name as written in the source, if attributed
    pub speaker: Option<String>,
    /// Utterance text, tags stripped
    pub text: String,
    /// Emotion extracted from a bracketed annotation
    pub emotion: Option<EmotionKind>,
}

/// Extract the first bracketed emotion annotation from `text`.
///
/// Only the canonical emotion names count; any other bracketed name is
/// plain text and stays untouched. The matched tag is removed exactly,
/// surrounding whitespace preserved.
pub(crate) fn extract_emotion_tag(text: &str) -> (String, Option<EmotionKind>) {
    let mut search_from = 0;
    while let Some(open_rel) = text[search_from..].find('[') {
        let open = search_from + open_rel;
        let Some(close_rel) = text[open..].find(']') else {
            break;
        };
        let close = open + close_rel;
        let name = &text[open + 1..close];
        if let Some(kind) = canonical_emotion(name) {
            let mut cleaned = String::with_capacity(text.len());
            cleaned.push_str(&text[..open]);
            cleaned.push_str(&text[close + 1..]);
            return (cleaned, Some(kind));
        }
        search_from = close + 1;
    }
    (text.to_string(), None)
}

/// Match a name against the canonical emotion vocabulary only (no
/// synonyms).
pub(crate) fn canonical_emotion(name: &str) -> Option<EmotionKind> {
    let lower = name.to_lowercase();
    EmotionKind::all().iter().copied().find(|k| k.name() == lower)
}

/// Strip HTML/style tags (`<i>`, `<font ...>`, `{\an8}`) from subtitle
/// text.
pub(crate) fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                for ch in chars.by_ref() {
                    if ch == '>' {
                        break;
                    }
                }
            }
            '{' => {
                for ch in chars.by_ref() {
                    if ch == '}' {
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Build a render plan from a subtitle track. Distinct speakers become
/// characters (unattributed cues go to a narrator); cue times become
/// explicit line timing.
pub fn plan_from_subtitles(track: &SubtitleTrack) -> RenderPlan {
    let mut plan = RenderPlan::new();
    let mut known: Vec<String> = Vec::new();

    for cue in &track.cues {
        let speaker = cue.speaker.clone().unwrap_or_else(|| "NARRATOR".to_string());
        let id = speaker.to_lowercase().replace(char::is_whitespace, "_");
        if !known.contains(&id) {
            known.push(id.clone());
            plan = plan.with_character(Character::new(id.clone(), speaker.clone()));
        }
        let mut line = Line::new(
            format!("cue-{}", cue.index),
            id,
            cue.text.clone(),
        )
        .with_timing(LineTiming {
            start_ms: Some(cue.start_ms),
            end_ms: Some(cue.end_ms),
            ..Default::default()
        });
        if let Some(kind) = cue.emotion {
            line = line.with_emotion(EmotionProfile::new(kind, 0.7));
        }
        plan = plan.with_line(line);
    }
    plan
}

/// Build a render plan from a parsed script line stream. Timing is left
/// to the scheduler.
pub fn plan_from_script(lines: &[ScriptLine]) -> RenderPlan {
    let mut plan = RenderPlan::new();
    let mut known: Vec<String> = Vec::new();

    for (idx, script_line) in lines.iter().enumerate() {
        let speaker = script_line
            .speaker
            .clone()
            .unwrap_or_else(|| "NARRATOR".to_string());
        let id = speaker.to_lowercase().replace(char::is_whitespace, "_");
        if !known.contains(&id) {
            known.push(id.clone());
            plan = plan.with_character(Character::new(id.clone(), speaker.clone()));
        }
        let mut line = Line::new(format!("line-{}", idx + 1), id, script_line.text.clone());
        if let Some(kind) = script_line.emotion {
            line = line.with_emotion(EmotionProfile::new(kind, 0.7));
        }
        plan = plan.with_line(line);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_emotion_tag() {
        let (text, emotion) = extract_emotion_tag("Hello [happy]!");
        assert_eq!(text, "Hello !");
        assert_eq!(emotion, Some(EmotionKind::Happy));
    }

    #[test]
    fn test_unknown_bracket_is_plain_text() {
        let (text, emotion) = extract_emotion_tag("Hello [shouting]!");
        assert_eq!(text, "Hello [shouting]!");
        assert_eq!(emotion, None);
    }

    #[test]
    fn test_unknown_then_known_tag() {
        let (text, emotion) = extract_emotion_tag("[cue] so [sad] now");
        assert_eq!(text, "[cue] so  now");
        assert_eq!(emotion, Some(EmotionKind::Sad));
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<i>Hello</i> {\\an8}there"), "Hello there");
    }

    #[test]
    fn test_canonical_only() {
        assert_eq!(canonical_emotion("happy"), Some(EmotionKind::Happy));
        // synonyms are not part of the closed vocabulary
        assert_eq!(canonical_emotion("joyful"), None);
    }

    #[test]
    fn test_line_ending_detect() {
        assert_eq!(LineEnding::detect("a\r\nb"), LineEnding::Crlf);
        assert_eq!(LineEnding::detect("a\nb"), LineEnding::Lf);
    }

    #[test]
    fn test_plan_from_script_assigns_characters() {
        let lines = vec![
            ScriptLine {
                speaker: Some("ALICE".to_string()),
                text: "Hi".to_string(),
                emotion: None,
            },
            ScriptLine {
                speaker: None,
                text: "The room was quiet.".to_string(),
                emotion: None,
            },
            ScriptLine {
                speaker: Some("ALICE".to_string()),
                text: "Anyone here?".to_string(),
                emotion: Some(EmotionKind::Fearful),
            },
        ];
        let plan = plan_from_script(&lines);
        assert_eq!(plan.characters.len(), 2);
        assert_eq!(plan.lines.len(), 3);
        assert_eq!(plan.lines[2].character_id, "alice");
        assert!(plan.validate().is_ok());
    }
}
