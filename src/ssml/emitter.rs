//! SSML document emission
//!
//! Produces a well-formed XML fragment rooted in `<speak>` containing
//! exactly one `<voice>` wrapping one `<prosody>` around the marked-up
//! text. Only `speak`, `voice`, `prosody`, `emphasis` and `break` tags
//! are ever emitted. Stochastic filler/catchphrase insertion runs off a
//! seeded generator and is disabled entirely in deterministic mode.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::emotion::EmotionProfile;
use crate::plan::{Character, EmphasisStyle, SpeechPatterns};
use crate::scene::SceneHints;
use crate::voice::Accent;

use super::prosody::{emotion_offsets, style_offsets, Prosody, ProsodyOffsets};

/// Emitter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsmlOptions {
    /// Disable stochastic insertions entirely
    #[serde(default = "default_deterministic")]
    pub deterministic: bool,
    /// Seed for the insertion generator
    #[serde(default)]
    pub seed: u64,
    /// Per-sentence filler insertion probability
    #[serde(default = "default_filler_probability")]
    pub filler_probability: f32,
    /// End-of-line catchphrase probability
    #[serde(default = "default_catchphrase_probability")]
    pub catchphrase_probability: f32,
    /// Fallback language when the accent implies none
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_deterministic() -> bool {
    true
}

fn default_filler_probability() -> f32 {
    0.05
}

fn default_catchphrase_probability() -> f32 {
    0.08
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for SsmlOptions {
    fn default() -> Self {
        Self {
            deterministic: default_deterministic(),
            seed: 0,
            filler_probability: default_filler_probability(),
            catchphrase_probability: default_catchphrase_probability(),
            language: default_language(),
        }
    }
}

/// Emphasis level after style adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    None,
    Moderate,
    Strong,
}

impl Emphasis {
    fn adjust(self, style: EmphasisStyle) -> Emphasis {
        match (style, self) {
            (EmphasisStyle::Reduced, Emphasis::Strong) => Emphasis::Moderate,
            (EmphasisStyle::Reduced, Emphasis::Moderate) => Emphasis::None,
            (EmphasisStyle::Strong, Emphasis::Moderate) => Emphasis::Strong,
            (_, level) => level,
        }
    }
}

/// Builds SSML documents for character speech
#[derive(Debug)]
pub struct SsmlEmitter {
    options: SsmlOptions,
    rng: StdRng,
}

impl SsmlEmitter {
    pub fn new(options: SsmlOptions) -> Self {
        let rng = StdRng::seed_from_u64(options.seed);
        Self { options, rng }
    }

    /// Emit a document for one utterance. `voice_id` names the backend
    /// voice when known.
    pub fn emit(
        &mut self,
        text: &str,
        character: &Character,
        emotion: Option<&EmotionProfile>,
        scene: Option<&SceneHints>,
        voice_id: Option<&str>,
    ) -> String {
        let mut offsets = style_offsets(&character.personality.speaking_style);
        if let Some(emotion) = emotion {
            offsets = offsets.combine(&emotion_offsets(emotion));
        }
        if let Some(hints) = scene {
            offsets = offsets.combine(&ProsodyOffsets {
                rate_delta: hints.rate_delta,
                pitch_pct: hints.pitch_pct,
                range_pct: 0.0,
                volume_db: hints.volume_db,
            });
        }
        // the delivery style's pace overrides the voice's when set
        let pace = match character.personality.speaking_style.pace {
            crate::voice::Pace::Normal => character.voice.pace,
            styled => styled,
        };
        let prosody = Prosody::resolve(pace, &offsets);

        let body = self.render_body(text, &character.speech_patterns);

        let mut doc = String::with_capacity(body.len() + 256);
        doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        doc.push_str(&format!(
            "<speak version=\"1.0\" xml:lang=\"{}\">",
            self.language_for(character.voice.accent)
        ));
        doc.push_str("<voice");
        doc.push_str(&format!(" gender=\"{}\"", character.voice.gender));
        doc.push_str(&format!(" age=\"{}\"", character.voice.age));
        doc.push_str(&format!(
            " xml:lang=\"{}\"",
            self.language_for(character.voice.accent)
        ));
        if let Some(id) = voice_id {
            doc.push_str(&format!(" name=\"{}\"", escape_attr(id)));
        }
        doc.push('>');

        doc.push_str("<prosody");
        doc.push_str(&format!(" rate=\"{}\"", prosody.rate_attr()));
        if prosody.pitch_pct.round() as i64 != 0 {
            doc.push_str(&format!(" pitch=\"{}\"", prosody.pitch_attr()));
        }
        if prosody.range_pct.round() as i64 != 0 {
            doc.push_str(&format!(" range=\"{}\"", prosody.range_attr()));
        }
        if prosody.volume_db.abs() >= 0.05 {
            doc.push_str(&format!(" volume=\"{}\"", prosody.volume_attr()));
        }
        doc.push('>');
        doc.push_str(&body);
        doc.push_str("</prosody></voice></speak>");
        doc
    }

    /// Language implied by the accent, or the configured fallback
    fn language_for(&self, accent: Accent) -> &str {
        match accent {
            Accent::British => "en-GB",
            Accent::American | Accent::Southern => "en-US",
            Accent::Australian => "en-AU",
            Accent::Irish => "en-IE",
            Accent::Scottish => "en-GB",
            Accent::Indian => "en-IN",
            Accent::French => "fr-FR",
            Accent::German => "de-DE",
            Accent::Neutral => &self.options.language,
        }
    }

    /// Token-by-token body rendering: emphasis, breaks, escapes, and
    /// seeded insertions.
    fn render_body(&mut self, text: &str, patterns: &SpeechPatterns) -> String {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut out = String::with_capacity(text.len() + 64);
        let mut sentence_start = true;

        for (i, token) in tokens.iter().enumerate() {
            if sentence_start {
                self.maybe_insert_filler(&mut out, patterns);
                sentence_start = false;
            }
            if i > 0 && !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }

            if *token == "--" {
                out.push_str("<break strength=\"medium\"/>");
                continue;
            }

            let (core, trailing) = split_trailing_punct(token);
            let rendered = self.render_token(core, patterns.emphasis_style);
            out.push_str(&rendered);
            out.push_str(&escape_text(trailing));

            if let Some(strength) = break_for(trailing) {
                out.push_str(&format!("<break strength=\"{}\"/>", strength));
            }
            if trailing.ends_with(['.', '!', '?']) {
                sentence_start = true;
            }
        }

        self.maybe_append_catchphrase(&mut out, patterns);
        out
    }

    /// Render one token core, applying emphasis markup
    fn render_token(&self, core: &str, style: EmphasisStyle) -> String {
        let (content, emphasis) = detect_emphasis(core);
        let escaped = escape_text(&content);
        match emphasis.adjust(style) {
            Emphasis::None => escaped,
            Emphasis::Moderate => {
                format!("<emphasis level=\"moderate\">{}</emphasis>", escaped)
            }
            Emphasis::Strong => {
                format!("<emphasis level=\"strong\">{}</emphasis>", escaped)
            }
        }
    }

    fn maybe_insert_filler(&mut self, out: &mut String, patterns: &SpeechPatterns) {
        if self.options.deterministic || patterns.fillers.is_empty() {
            return;
        }
        if self.rng.gen::<f32>() >= self.options.filler_probability {
            return;
        }
        let filler = &patterns.fillers[self.rng.gen_range(0..patterns.fillers.len())];
        if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
        out.push_str(&escape_text(filler));
        out.push(',');
        out.push_str("<break strength=\"weak\"/>");
        out.push(' ');
    }

    fn maybe_append_catchphrase(&mut self, out: &mut String, patterns: &SpeechPatterns) {
        if self.options.deterministic || patterns.catchphrases.is_empty() {
            return;
        }
        if self.rng.gen::<f32>() >= self.options.catchphrase_probability {
            return;
        }
        let phrase =
            &patterns.catchphrases[self.rng.gen_range(0..patterns.catchphrases.len())];
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&escape_text(phrase));
    }
}

/// Split a token into its core and trailing punctuation cluster
fn split_trailing_punct(token: &str) -> (&str, &str) {
    let end = token
        .char_indices()
        .rev()
        .take_while(|(_, c)| matches!(c, ',' | '.' | '!' | '?' | ';' | ':' | '-'))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    token.split_at(end)
}

/// Break strength implied by a trailing punctuation cluster
fn break_for(trailing: &str) -> Option<&'static str> {
    if trailing.is_empty() {
        return None;
    }
    if trailing.contains(['?', '!']) {
        Some("strong")
    } else if trailing.contains("--") {
        Some("medium")
    } else if trailing.contains(['.', ';', ':']) {
        Some("medium")
    } else if trailing.contains(',') {
        Some("weak")
    } else {
        None
    }
}

/// Detect ALL-CAPS (strong, lowercased) and `*word*` (moderate,
/// stripped) emphasis on a token core.
fn detect_emphasis(core: &str) -> (String, Emphasis) {
    if core.len() > 2 && core.starts_with('*') && core.ends_with('*') {
        return (
            core[1..core.len() - 1].to_string(),
            Emphasis::Moderate,
        );
    }
    let letters: Vec<char> = core.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase()) {
        return (core.to_lowercase(), Emphasis::Strong);
    }
    (core.to_string(), Emphasis::None)
}

/// Escape XML text content
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape XML attribute values
fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
