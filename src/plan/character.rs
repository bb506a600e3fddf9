//! Characters, personalities and the per-plan registry
//!
//! Characters are mutable only before synthesis begins; once a render
//! starts, the registry is borrowed immutably for its duration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionKind, EmotionProfile};
use crate::voice::{Pace, VoiceSpec};

/// Named trait with an intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTrait {
    pub name: String,
    pub intensity: f32,
}

/// How a character delivers speech. All values in [0,1] except pace,
/// which is enumerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakingStyle {
    #[serde(default)]
    pub pace: Pace,
    #[serde(default = "half")]
    pub formality: f32,
    #[serde(default = "half")]
    pub confidence: f32,
    #[serde(default = "half")]
    pub enthusiasm: f32,
    #[serde(default = "low")]
    pub interruption_tendency: f32,
}

fn half() -> f32 {
    0.5
}

fn low() -> f32 {
    0.2
}

impl Default for SpeakingStyle {
    fn default() -> Self {
        Self {
            pace: Pace::Normal,
            formality: 0.5,
            confidence: 0.5,
            enthusiasm: 0.5,
            interruption_tendency: 0.2,
        }
    }
}

/// A character's emotional envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalRange {
    /// Resting emotion kind
    #[serde(default)]
    pub baseline: EmotionKind,
    /// How quickly emotions swing, in [0,1]
    #[serde(default = "half")]
    pub volatility: f32,
    /// Ceiling on expressed intensity, in [0,1]
    #[serde(default = "full")]
    pub max_intensity: f32,
    /// Emotions this character tends toward
    #[serde(default)]
    pub dominant_emotions: Vec<EmotionKind>,
}

fn full() -> f32 {
    1.0
}

impl Default for EmotionalRange {
    fn default() -> Self {
        Self {
            baseline: EmotionKind::Neutral,
            volatility: 0.5,
            max_intensity: 1.0,
            dominant_emotions: Vec::new(),
        }
    }
}

/// Personality: traits, delivery style, emotional envelope, verbosity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    #[serde(default)]
    pub traits: Vec<PersonalityTrait>,
    #[serde(default)]
    pub speaking_style: SpeakingStyle,
    #[serde(default)]
    pub emotional_range: EmotionalRange,
    #[serde(default = "half")]
    pub verbosity: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            traits: Vec::new(),
            speaking_style: SpeakingStyle::default(),
            emotional_range: EmotionalRange::default(),
            verbosity: 0.5,
        }
    }
}

/// Emphasis rendering preference used by the markup emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmphasisStyle {
    Reduced,
    #[default]
    Moderate,
    Strong,
}

/// Verbal habits woven into synthesized speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpeechPatterns {
    /// Hesitation words occasionally inserted at sentence starts
    #[serde(default)]
    pub fillers: Vec<String>,
    /// Signature phrases occasionally appended
    #[serde(default)]
    pub catchphrases: Vec<String>,
    /// How aggressively emphasis markup is applied
    #[serde(default)]
    pub emphasis_style: EmphasisStyle,
}

/// A speaking character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Unique within a plan
    pub id: String,
    /// Display name
    pub name: String,
    /// Derived voice description
    #[serde(default)]
    pub voice: VoiceSpec,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub speech_patterns: SpeechPatterns,
    /// Emotion used when a line specifies none
    #[serde(default)]
    pub default_emotion: EmotionProfile,
}

impl Character {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            voice: VoiceSpec::default(),
            personality: Personality::default(),
            speech_patterns: SpeechPatterns::default(),
            default_emotion: EmotionProfile::neutral(),
        }
    }

    pub fn with_voice(mut self, voice: VoiceSpec) -> Self {
        self.default_emotion = voice.default_emotion.clone();
        self.voice = voice;
        self
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn with_speech_patterns(mut self, patterns: SpeechPatterns) -> Self {
        self.speech_patterns = patterns;
        self
    }

    pub fn with_default_emotion(mut self, emotion: EmotionProfile) -> Self {
        self.default_emotion = emotion;
        self
    }
}

/// Per-plan character lookup, preserving declaration order
#[derive(Debug, Clone, Default)]
pub struct CharacterRegistry {
    by_id: HashMap<String, Character>,
    order: Vec<String>,
}

impl CharacterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a character list; later duplicates replace earlier
    /// entries (plan validation rejects duplicates before this point).
    pub fn from_characters(characters: &[Character]) -> Self {
        let mut registry = Self::new();
        for character in characters {
            registry.insert(character.clone());
        }
        registry
    }

    pub fn insert(&mut self, character: Character) {
        if !self.by_id.contains_key(&character.id) {
            self.order.push(character.id.clone());
        }
        self.by_id.insert(character.id.clone(), character);
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Characters in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_preserves_order() {
        let registry = CharacterRegistry::from_characters(&[
            Character::new("c", "Carol"),
            Character::new("a", "Alice"),
            Character::new("b", "Bob"),
        ]);
        let ids: Vec<&str> = registry.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert!(registry.contains("a"));
        assert!(!registry.contains("d"));
    }

    #[test]
    fn test_with_voice_adopts_default_emotion() {
        use crate::voice::{PersonalityTag, VoiceSpec};
        let spec = VoiceSpec::new().with_personality(PersonalityTag::Cheerful);
        let spec = spec.clone().with_default_emotion(VoiceSpec::derive_default_emotion(
            &spec.personality,
        ));
        let character = Character::new("a", "Alice").with_voice(spec);
        assert_eq!(character.default_emotion.kind, EmotionKind::Happy);
    }

    #[test]
    fn test_speaking_style_defaults() {
        let style = SpeakingStyle::default();
        assert_eq!(style.pace, Pace::Normal);
        assert_eq!(style.formality, 0.5);
        assert_eq!(style.interruption_tendency, 0.2);
    }
}
