//! Voice specification
//!
//! A `VoiceSpec` is a derived voice description, not a backend
//! identifier. Every field always has a defined value; the prompt
//! interpreter supplies defaults for anything a description omits.

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionKind, EmotionProfile};

/// Gender enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Neutral,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Age range enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgeRange {
    Child,
    Young,
    #[default]
    Adult,
    Senior,
}

impl AgeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRange::Child => "child",
            AgeRange::Young => "young",
            AgeRange::Adult => "adult",
            AgeRange::Senior => "senior",
        }
    }
}

impl std::fmt::Display for AgeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accent, normalized from free text to a fixed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    #[default]
    Neutral,
    British,
    American,
    Australian,
    Irish,
    Scottish,
    French,
    German,
    Indian,
    Southern,
}

impl Accent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accent::Neutral => "neutral",
            Accent::British => "british",
            Accent::American => "american",
            Accent::Australian => "australian",
            Accent::Irish => "irish",
            Accent::Scottish => "scottish",
            Accent::French => "french",
            Accent::German => "german",
            Accent::Indian => "indian",
            Accent::Southern => "southern",
        }
    }
}

impl std::fmt::Display for Accent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Voice timbre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timbre {
    Deep,
    #[default]
    Medium,
    High,
}

impl Timbre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timbre::Deep => "deep",
            Timbre::Medium => "medium",
            Timbre::High => "high",
        }
    }
}

impl std::fmt::Display for Timbre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Speaking pace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Slow => "slow",
            Pace::Normal => "normal",
            Pace::Fast => "fast",
        }
    }
}

impl std::fmt::Display for Pace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed personality vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalityTag {
    Cheerful,
    Calm,
    Energetic,
    Wise,
    Friendly,
    Professional,
    Dramatic,
    Mysterious,
    Confident,
    Gentle,
}

impl PersonalityTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalityTag::Cheerful => "cheerful",
            PersonalityTag::Calm => "calm",
            PersonalityTag::Energetic => "energetic",
            PersonalityTag::Wise => "wise",
            PersonalityTag::Friendly => "friendly",
            PersonalityTag::Professional => "professional",
            PersonalityTag::Dramatic => "dramatic",
            PersonalityTag::Mysterious => "mysterious",
            PersonalityTag::Confident => "confident",
            PersonalityTag::Gentle => "gentle",
        }
    }

    /// All tags in the vocabulary
    pub fn all() -> &'static [PersonalityTag] {
        &[
            PersonalityTag::Cheerful,
            PersonalityTag::Calm,
            PersonalityTag::Energetic,
            PersonalityTag::Wise,
            PersonalityTag::Friendly,
            PersonalityTag::Professional,
            PersonalityTag::Dramatic,
            PersonalityTag::Mysterious,
            PersonalityTag::Confident,
            PersonalityTag::Gentle,
        ]
    }
}

impl std::fmt::Display for PersonalityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived voice description. Every field has a defined value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VoiceSpec {
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub age: AgeRange,
    #[serde(default)]
    pub accent: Accent,
    #[serde(default)]
    pub timbre: Timbre,
    #[serde(default)]
    pub pace: Pace,
    #[serde(default)]
    pub personality: Vec<PersonalityTag>,
    #[serde(default)]
    pub default_emotion: EmotionProfile,
}

impl VoiceSpec {
    /// Builder entry point
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_age(mut self, age: AgeRange) -> Self {
        self.age = age;
        self
    }

    pub fn with_accent(mut self, accent: Accent) -> Self {
        self.accent = accent;
        self
    }

    pub fn with_timbre(mut self, timbre: Timbre) -> Self {
        self.timbre = timbre;
        self
    }

    pub fn with_pace(mut self, pace: Pace) -> Self {
        self.pace = pace;
        self
    }

    pub fn with_personality(mut self, tag: PersonalityTag) -> Self {
        if !self.personality.contains(&tag) {
            self.personality.push(tag);
        }
        self
    }

    pub fn with_default_emotion(mut self, emotion: EmotionProfile) -> Self {
        self.default_emotion = emotion;
        self
    }

    /// Default emotion implied by the personality tags. The first rule
    /// that matches wins; no tag match yields neutral.
    pub fn derive_default_emotion(tags: &[PersonalityTag]) -> EmotionProfile {
        let kind = if tags.contains(&PersonalityTag::Cheerful) {
            EmotionKind::Happy
        } else if tags.contains(&PersonalityTag::Calm) {
            EmotionKind::Calm
        } else if tags.contains(&PersonalityTag::Energetic)
            || tags.contains(&PersonalityTag::Dramatic)
        {
            EmotionKind::Excited
        } else {
            EmotionKind::Neutral
        };
        EmotionProfile::new(kind, 0.5)
    }

    /// Canonical prompt string: parsing it back yields this spec (for
    /// specs whose default emotion follows from their personality).
    /// Default-valued fields are omitted, since the interpreter restores
    /// them.
    pub fn render_prompt(&self) -> String {
        let mut head = Vec::new();
        if self.age != AgeRange::Adult {
            head.push(self.age.as_str().to_string());
        }
        if self.accent != Accent::Neutral {
            head.push(self.accent.as_str().to_string());
        }
        if self.gender != Gender::Neutral {
            head.push(self.gender.as_str().to_string());
        }
        head.push("voice".to_string());

        let mut parts = vec![head.join(" ")];
        for tag in &self.personality {
            parts.push(tag.as_str().to_string());
        }
        if self.timbre != Timbre::Medium {
            parts.push(format!("{} timbre", self.timbre));
        }
        if self.pace != Pace::Normal {
            parts.push(format!("{} pace", self.pace));
        }
        parts.join(", ")
    }
}

/// Preset voice designs resolvable by name
pub struct VoicePresets;

impl VoicePresets {
    /// Get available preset names
    pub fn available() -> &'static [&'static str] {
        &[
            "calm_narrator",
            "cheerful_child",
            "wise_senior",
            "professional_anchor",
            "energetic_host",
            "gentle_storyteller",
        ]
    }

    /// Get preset configuration
    pub fn get(name: &str) -> Option<VoiceSpec> {
        let spec = match name {
            "calm_narrator" => VoiceSpec::new()
                .with_timbre(Timbre::Deep)
                .with_pace(Pace::Slow)
                .with_personality(PersonalityTag::Calm)
                .with_personality(PersonalityTag::Wise),
            "cheerful_child" => VoiceSpec::new()
                .with_age(AgeRange::Child)
                .with_timbre(Timbre::High)
                .with_personality(PersonalityTag::Cheerful)
                .with_personality(PersonalityTag::Energetic),
            "wise_senior" => VoiceSpec::new()
                .with_gender(Gender::Male)
                .with_age(AgeRange::Senior)
                .with_timbre(Timbre::Deep)
                .with_pace(Pace::Slow)
                .with_personality(PersonalityTag::Wise)
                .with_personality(PersonalityTag::Gentle),
            "professional_anchor" => VoiceSpec::new()
                .with_personality(PersonalityTag::Professional)
                .with_personality(PersonalityTag::Confident),
            "energetic_host" => VoiceSpec::new()
                .with_age(AgeRange::Young)
                .with_timbre(Timbre::High)
                .with_pace(Pace::Fast)
                .with_personality(PersonalityTag::Energetic)
                .with_personality(PersonalityTag::Friendly),
            "gentle_storyteller" => VoiceSpec::new()
                .with_gender(Gender::Female)
                .with_pace(Pace::Slow)
                .with_personality(PersonalityTag::Gentle)
                .with_personality(PersonalityTag::Calm),
            _ => return None,
        };
        let emotion = VoiceSpec::derive_default_emotion(&spec.personality);
        Some(spec.with_default_emotion(emotion))
    }
}
