//! Prompt interpretation
//!
//! Maps natural-language voice descriptions to a fully populated
//! `VoiceSpec` by consulting lowercase keyword tables per field.
//! Conflicts resolve as: exclusion rules first (the token `female`
//! suppresses the `male` reading of its own substring), then the first
//! matching synonym group wins for enumerated fields; personality tags
//! accumulate. The interpreter never fails: an unmatched description
//! yields the default spec.

use super::spec::{Accent, AgeRange, Gender, Pace, PersonalityTag, Timbre, VoiceSpec};

/// Synonym groups for age, in precedence order
const AGE_GROUPS: &[(AgeRange, &[&str])] = &[
    (AgeRange::Child, &["child", "kid", "little"]),
    (AgeRange::Young, &["young", "teen", "youth"]),
    (AgeRange::Senior, &["senior", "elderly", "elder", "aged"]),
    (AgeRange::Adult, &["adult", "middle-aged", "grown"]),
];

/// Synonym groups for accent, in precedence order
const ACCENT_GROUPS: &[(Accent, &[&str])] = &[
    (Accent::British, &["british", "england", "english accent", "londoner"]),
    (Accent::American, &["american", "midwestern"]),
    (Accent::Australian, &["australian", "aussie"]),
    (Accent::Irish, &["irish"]),
    (Accent::Scottish, &["scottish", "scots"]),
    (Accent::French, &["french"]),
    (Accent::German, &["german"]),
    (Accent::Indian, &["indian"]),
    (Accent::Southern, &["southern", "drawl"]),
];

/// Synonym groups for timbre, in precedence order
const TIMBRE_GROUPS: &[(Timbre, &[&str])] = &[
    (Timbre::Deep, &["deep", "low pitch", "low-pitched", "bass", "husky"]),
    (Timbre::High, &["high pitch", "high-pitched", "high", "bright"]),
    (Timbre::Medium, &["medium"]),
];

/// Synonym groups for pace, in precedence order
const PACE_GROUPS: &[(Pace, &[&str])] = &[
    (Pace::Slow, &["slow", "slowly", "measured", "unhurried"]),
    (Pace::Fast, &["fast", "quick", "rapid", "brisk"]),
    (Pace::Normal, &["normal pace", "moderate pace"]),
];

/// Keywords per personality tag; tags accumulate rather than exclude
const PERSONALITY_GROUPS: &[(PersonalityTag, &[&str])] = &[
    (PersonalityTag::Cheerful, &["cheerful", "happy", "joyful", "upbeat"]),
    (PersonalityTag::Calm, &["calm", "soothing", "relaxed", "serene"]),
    (PersonalityTag::Energetic, &["energetic", "lively", "dynamic", "vibrant"]),
    (PersonalityTag::Wise, &["wise", "sage", "thoughtful"]),
    (PersonalityTag::Friendly, &["friendly", "warm", "kind", "approachable"]),
    (PersonalityTag::Professional, &["professional", "businesslike", "formal"]),
    (PersonalityTag::Dramatic, &["dramatic", "theatrical", "intense"]),
    (PersonalityTag::Mysterious, &["mysterious", "enigmatic", "cryptic"]),
    (PersonalityTag::Confident, &["confident", "assured", "assertive"]),
    (PersonalityTag::Gentle, &["gentle", "soft-spoken", "tender"]),
];

/// Keyword-table interpreter for voice descriptions
pub struct PromptInterpreter;

impl PromptInterpreter {
    /// Parse a natural-language description into a fully populated spec.
    /// Never fails; unmatched fields take their defaults.
    pub fn parse(description: &str) -> VoiceSpec {
        let lower = description.to_lowercase();

        let gender = Self::parse_gender(&lower);
        let age = first_group_match(&lower, AGE_GROUPS).unwrap_or_default();
        let accent = first_group_match(&lower, ACCENT_GROUPS).unwrap_or_default();
        let timbre = first_group_match(&lower, TIMBRE_GROUPS).unwrap_or_default();
        let pace = first_group_match(&lower, PACE_GROUPS).unwrap_or_default();

        let mut personality = Vec::new();
        for (tag, keywords) in PERSONALITY_GROUPS {
            if keywords.iter().any(|kw| lower.contains(kw)) {
                personality.push(*tag);
            }
        }

        let default_emotion = VoiceSpec::derive_default_emotion(&personality);

        VoiceSpec {
            gender,
            age,
            accent,
            timbre,
            pace,
            personality,
            default_emotion,
        }
    }

    /// Gender with the exclusion rule: `female` (and its synonyms) is
    /// checked first so the embedded substring `male` never misfires.
    fn parse_gender(lower: &str) -> Gender {
        const FEMALE: &[&str] = &["female", "woman", "girl", "lady", "feminine"];
        const MALE: &[&str] = &["male", "man ", " man", "boy", "masculine", "guy"];
        if FEMALE.iter().any(|kw| lower.contains(kw)) {
            return Gender::Female;
        }
        if MALE.iter().any(|kw| lower.contains(kw)) {
            return Gender::Male;
        }
        Gender::Neutral
    }
}

/// First matching synonym group wins, in table order
fn first_group_match<T: Copy>(lower: &str, groups: &[(T, &[&str])]) -> Option<T> {
    for (value, keywords) in groups {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return Some(*value);
        }
    }
    None
}
