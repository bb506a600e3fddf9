//! Script format parsing
//!
//! Extracts a speaker-attributed line stream from four text layouts:
//! screenplay (uppercase speaker cues), play (capitalized name followed
//! by a period), chat (`<name>` or `name:` prefixes), and novel prose
//! with quoted dialogue. Bracketed emotion annotations are recognized
//! in every format.

use serde::{Deserialize, Serialize};

use super::{extract_emotion_tag, ScriptLine};

/// Recognized script layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptFormat {
    Screenplay,
    Play,
    Chat,
    Novel,
}

/// Guess the layout from cue-shaped line counts; prose is the fallback
pub fn detect_format(text: &str) -> ScriptFormat {
    let mut screenplay_cues = 0;
    let mut play_cues = 0;
    let mut chat_cues = 0;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_screenplay_cue(trimmed) || uppercase_colon_prefix(trimmed).is_some() {
            screenplay_cues += 1;
        } else if angle_bracket_prefix(trimmed).is_some()
            || mixed_case_colon_prefix(trimmed).is_some()
        {
            chat_cues += 1;
        } else if play_cue_prefix(trimmed).is_some() {
            play_cues += 1;
        }
    }

    if screenplay_cues >= 2 && screenplay_cues >= chat_cues {
        ScriptFormat::Screenplay
    } else if chat_cues >= 2 {
        ScriptFormat::Chat
    } else if play_cues >= 2 {
        ScriptFormat::Play
    } else {
        ScriptFormat::Novel
    }
}

/// Detect the format, then parse
pub fn parse_auto(text: &str) -> Vec<ScriptLine> {
    parse_script(text, detect_format(text))
}

/// Parse with a known layout
pub fn parse_script(text: &str, format: ScriptFormat) -> Vec<ScriptLine> {
    match format {
        ScriptFormat::Screenplay => parse_screenplay(text),
        ScriptFormat::Play => parse_play(text),
        ScriptFormat::Chat => parse_chat(text),
        ScriptFormat::Novel => parse_novel(text),
    }
}

/// Standalone uppercase cue line, short, no terminal punctuation
fn is_screenplay_cue(line: &str) -> bool {
    !line.is_empty()
        && line.len() <= 30
        && line.chars().any(|c| c.is_alphabetic())
        && line
            .chars()
            .all(|c| c.is_uppercase() || c.is_whitespace() || c == '.')
        && !line.ends_with('.')
}

/// `NAME: text` with an uppercase name
fn uppercase_colon_prefix(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let name = &line[..colon];
    if !name.is_empty()
        && !name.contains(char::is_whitespace)
        && name.chars().any(|c| c.is_alphabetic())
        && name.chars().all(|c| !c.is_alphabetic() || c.is_uppercase())
    {
        Some((name, line[colon + 1..].trim_start()))
    } else {
        None
    }
}

/// `name: text` with a capitalized or lowercase name
fn mixed_case_colon_prefix(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let name = &line[..colon];
    if !name.is_empty()
        && name.len() <= 20
        && !name.contains(char::is_whitespace)
        && name.chars().all(char::is_alphanumeric)
    {
        Some((name, line[colon + 1..].trim_start()))
    } else {
        None
    }
}

/// `<name> text`
fn angle_bracket_prefix(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with('<') {
        return None;
    }
    let close = line.find('>')?;
    let name = &line[1..close];
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, line[close + 1..].trim_start()))
}

/// `Name. text` with a short capitalized name
fn play_cue_prefix(line: &str) -> Option<(&str, &str)> {
    let period = line.find('.')?;
    let name = &line[..period];
    let starts_upper = name.chars().next().is_some_and(|c| c.is_uppercase());
    if !name.is_empty()
        && name.len() <= 20
        && starts_upper
        && name.chars().all(|c| c.is_alphabetic())
        && !line[period + 1..].trim_start().is_empty()
    {
        Some((name, line[period + 1..].trim_start()))
    } else {
        None
    }
}

fn parse_screenplay(text: &str) -> Vec<ScriptLine> {
    let mut lines = Vec::new();
    let mut current_speaker: Option<String> = None;
    let mut pending: Vec<String> = Vec::new();

    fn flush(speaker: &Option<String>, pending: &mut Vec<String>, out: &mut Vec<ScriptLine>) {
        if pending.is_empty() {
            return;
        }
        let joined = pending.join(" ");
        pending.clear();
        let (cleaned, emotion) = extract_emotion_tag(&joined);
        out.push(ScriptLine {
            speaker: speaker.clone(),
            text: cleaned.trim().to_string(),
            emotion,
        });
    }

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&current_speaker, &mut pending, &mut lines);
            current_speaker = None;
            continue;
        }
        // stage directions
        if line.starts_with('(') && line.ends_with(')') {
            continue;
        }
        if is_screenplay_cue(line) {
            flush(&current_speaker, &mut pending, &mut lines);
            current_speaker = Some(line.trim_end_matches('.').to_string());
            continue;
        }
        if let Some((name, rest)) = uppercase_colon_prefix(line) {
            flush(&current_speaker, &mut pending, &mut lines);
            current_speaker = Some(name.to_string());
            pending.push(rest.to_string());
            continue;
        }
        pending.push(line.to_string());
    }
    flush(&current_speaker, &mut pending, &mut lines);
    lines
}

fn parse_play(text: &str) -> Vec<ScriptLine> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (speaker, body) = match play_cue_prefix(line) {
            Some((name, rest)) => (Some(name.to_string()), rest.to_string()),
            None => (None, line.to_string()),
        };
        let (cleaned, emotion) = extract_emotion_tag(&body);
        lines.push(ScriptLine {
            speaker,
            text: cleaned.trim().to_string(),
            emotion,
        });
    }
    lines
}

fn parse_chat(text: &str) -> Vec<ScriptLine> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (speaker, body) = if let Some((name, rest)) = angle_bracket_prefix(line) {
            (Some(name.to_string()), rest.to_string())
        } else if let Some((name, rest)) = mixed_case_colon_prefix(line) {
            (Some(name.to_string()), rest.to_string())
        } else {
            (None, line.to_string())
        };
        let (cleaned, emotion) = extract_emotion_tag(&body);
        lines.push(ScriptLine {
            speaker,
            text: cleaned.trim().to_string(),
            emotion,
        });
    }
    lines
}

/// Prose: paragraphs with quoted spans become attributed dialogue; the
/// rest is narration.
fn parse_novel(text: &str) -> Vec<ScriptLine> {
    let mut lines = Vec::new();
    let normalized = text.replace("\r\n", "\n");
    for paragraph in normalized.split("\n\n") {
        let flat = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.is_empty() {
            continue;
        }
        let quoted = quoted_spans(&flat);
        if quoted.is_empty() {
            let (cleaned, emotion) = extract_emotion_tag(&flat);
            lines.push(ScriptLine {
                speaker: None,
                text: cleaned.trim().to_string(),
                emotion,
            });
            continue;
        }
        let speaker = attribution(&flat);
        let dialogue = quoted.join(" ");
        let (cleaned, emotion) = extract_emotion_tag(&dialogue);
        lines.push(ScriptLine {
            speaker,
            text: cleaned.trim().to_string(),
            emotion,
        });
    }
    lines
}

/// Contents of straight or curly double-quoted spans
fn quoted_spans(text: &str) -> Vec<String> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut inside = false;
    for ch in text.chars() {
        match ch {
            '"' | '\u{201C}' | '\u{201D}' => {
                if inside {
                    if !current.trim().is_empty() {
                        spans.push(current.trim().to_string());
                    }
                    current.clear();
                }
                inside = !inside;
            }
            _ if inside => current.push(ch),
            _ => {}
        }
    }
    spans
}

/// Speaker from a `said Name` / `Name said` pattern outside the quotes
fn attribution(text: &str) -> Option<String> {
    const VERBS: &[&str] = &["said", "asked", "replied", "whispered", "shouted", "muttered"];
    let words: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .filter(|w| !w.is_empty())
        .collect();
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if !VERBS.contains(&lower.as_str()) {
            continue;
        }
        // prefer `said Name`, fall back to `Name said`
        if let Some(next) = words.get(i + 1) {
            if next.chars().next().is_some_and(|c| c.is_uppercase()) {
                return Some(next.trim_matches('"').to_string());
            }
        }
        if i > 0 {
            let prev = words[i - 1];
            if prev.chars().next().is_some_and(|c| c.is_uppercase())
                && !prev.contains('"')
            {
                return Some(prev.to_string());
            }
        }
    }
    None
}
