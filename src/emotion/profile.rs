//! Emotion values
//!
//! The canonical emotion model: eight kinds with intensity control and
//! optional named sub-shades. Backends map this model onto their own
//! emotion semantics; the pipeline never adopts a backend's.

use serde::{Deserialize, Serialize};

/// Canonical emotion kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmotionKind {
    Happy,
    Sad,
    Angry,
    Excited,
    Calm,
    Fearful,
    Surprised,
    #[default]
    Neutral,
}

impl EmotionKind {
    /// Get emotion name
    pub fn name(&self) -> &'static str {
        match self {
            EmotionKind::Happy => "happy",
            EmotionKind::Sad => "sad",
            EmotionKind::Angry => "angry",
            EmotionKind::Excited => "excited",
            EmotionKind::Calm => "calm",
            EmotionKind::Fearful => "fearful",
            EmotionKind::Surprised => "surprised",
            EmotionKind::Neutral => "neutral",
        }
    }

    /// Parse from string, accepting common synonyms
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "happy" | "joyful" | "cheerful" => Some(EmotionKind::Happy),
            "sad" | "melancholic" | "sorrowful" => Some(EmotionKind::Sad),
            "angry" | "furious" | "mad" => Some(EmotionKind::Angry),
            "excited" | "enthusiastic" | "thrilled" => Some(EmotionKind::Excited),
            "calm" | "peaceful" | "serene" => Some(EmotionKind::Calm),
            "fearful" | "scared" | "afraid" => Some(EmotionKind::Fearful),
            "surprised" | "amazed" | "astonished" => Some(EmotionKind::Surprised),
            "neutral" => Some(EmotionKind::Neutral),
            _ => None,
        }
    }

    /// All emotion kinds
    pub fn all() -> &'static [EmotionKind] {
        &[
            EmotionKind::Happy,
            EmotionKind::Sad,
            EmotionKind::Angry,
            EmotionKind::Excited,
            EmotionKind::Calm,
            EmotionKind::Fearful,
            EmotionKind::Surprised,
            EmotionKind::Neutral,
        ]
    }
}

impl std::fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Named sub-shade of an emotion with its own intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionVariation {
    pub name: String,
    pub intensity: f32,
}

/// The atomic emotion value: kind, intensity, optional variations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    /// Emotion kind
    pub kind: EmotionKind,
    /// Intensity in [0, 1]
    pub intensity: f32,
    /// Named sub-shades
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variations: Vec<EmotionVariation>,
}

impl EmotionProfile {
    /// Create a profile with the given kind and intensity (clamped)
    pub fn new(kind: EmotionKind, intensity: f32) -> Self {
        Self {
            kind,
            intensity: intensity.clamp(0.0, 1.0),
            variations: Vec::new(),
        }
    }

    /// Neutral at the standard baseline intensity
    pub fn neutral() -> Self {
        Self::new(EmotionKind::Neutral, 0.5)
    }

    /// Add a named variation
    pub fn with_variation(mut self, name: impl Into<String>, intensity: f32) -> Self {
        self.variations.push(EmotionVariation {
            name: name.into(),
            intensity: intensity.clamp(0.0, 1.0),
        });
        self
    }

    /// Replace the intensity (clamped)
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity.clamp(0.0, 1.0);
        self
    }
}

impl Default for EmotionProfile {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Preset emotion profiles resolvable by name
pub struct EmotionPresets;

impl EmotionPresets {
    /// Get preset profile by name
    pub fn get(name: &str) -> Option<EmotionProfile> {
        match name {
            "cheerful" => Some(EmotionProfile::new(EmotionKind::Happy, 0.8)),
            "melancholic" => Some(EmotionProfile::new(EmotionKind::Sad, 0.7)),
            "furious" => Some(EmotionProfile::new(EmotionKind::Angry, 0.9)),
            "serene" => Some(EmotionProfile::new(EmotionKind::Calm, 0.8)),
            "enthusiastic" => Some(EmotionProfile::new(EmotionKind::Excited, 0.85)),
            "anxious" => Some(EmotionProfile::new(EmotionKind::Fearful, 0.6)),
            "astonished" => Some(EmotionProfile::new(EmotionKind::Surprised, 0.75)),
            _ => None,
        }
    }

    /// List available preset names
    pub fn available() -> &'static [&'static str] {
        &[
            "cheerful",
            "melancholic",
            "furious",
            "serene",
            "enthusiastic",
            "anxious",
            "astonished",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(EmotionKind::from_str("happy"), Some(EmotionKind::Happy));
        assert_eq!(EmotionKind::from_str("ANGRY"), Some(EmotionKind::Angry));
        assert_eq!(EmotionKind::from_str("serene"), Some(EmotionKind::Calm));
        assert_eq!(EmotionKind::from_str("unknown"), None);
    }

    #[test]
    fn test_intensity_clamped() {
        let profile = EmotionProfile::new(EmotionKind::Excited, 1.4);
        assert_eq!(profile.intensity, 1.0);
        let profile = profile.with_intensity(-0.2);
        assert_eq!(profile.intensity, 0.0);
    }

    #[test]
    fn test_default_is_neutral() {
        let profile = EmotionProfile::default();
        assert_eq!(profile.kind, EmotionKind::Neutral);
        assert_eq!(profile.intensity, 0.5);
    }

    #[test]
    fn test_presets_resolve() {
        for &name in EmotionPresets::available() {
            assert!(EmotionPresets::get(name).is_some(), "missing preset {}", name);
        }
        assert!(EmotionPresets::get("nope").is_none());
    }
}
