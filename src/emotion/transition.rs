//! Emotion transitions and their triggers
//!
//! A transition is a time-bounded morph between two emotion profiles,
//! positioned on the line's time axis by a trigger and shaped by a
//! curve.

use serde::{Deserialize, Serialize};

use crate::core::error::{RenderError, Result};

use super::curves::{natural_shape, TransitionCurve};
use super::profile::EmotionProfile;

/// Characters per second used to convert text positions to time.
/// Equivalent to roughly 180 words per minute at average word length.
pub const CHARS_PER_SECOND: u64 = 15;

/// The condition positioning a transition on the line's time axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Case-insensitive whole-word match; fires at the word's first
    /// occurrence.
    Word(String),
    /// Absolute time in milliseconds
    TimeMs(u64),
    /// Character position within the line text
    Position(usize),
    /// Bracketed marker of the form `[NAME]`, matched literally at its
    /// first occurrence.
    Marker(String),
}

impl Trigger {
    /// Resolve the trigger to a time in milliseconds on the line's
    /// axis. Returns `None` when a word or marker does not occur.
    pub fn resolve_ms(&self, text: &str) -> Option<u64> {
        match self {
            Trigger::TimeMs(t) => Some(*t),
            Trigger::Word(word) => {
                find_word_char_offset(text, word).map(chars_to_ms)
            }
            Trigger::Position(pos) => Some(chars_to_ms(*pos)),
            Trigger::Marker(name) => {
                let needle = format!("[{}]", name);
                find_literal_char_offset(text, &needle).map(chars_to_ms)
            }
        }
    }
}

/// Convert a character offset to milliseconds at the fixed reading rate
fn chars_to_ms(chars: usize) -> u64 {
    (chars as u64) * 1000 / CHARS_PER_SECOND
}

/// Character offset of the first case-insensitive whole-word occurrence
fn find_word_char_offset(text: &str, word: &str) -> Option<usize> {
    if word.is_empty() {
        return None;
    }
    let haystack: Vec<char> = text.to_lowercase().chars().collect();
    let needle: Vec<char> = word.to_lowercase().chars().collect();
    if needle.len() > haystack.len() {
        return None;
    }
    for start in 0..=(haystack.len() - needle.len()) {
        if haystack[start..start + needle.len()] != needle[..] {
            continue;
        }
        let left_ok = start == 0 || !haystack[start - 1].is_alphanumeric();
        let end = start + needle.len();
        let right_ok = end == haystack.len() || !haystack[end].is_alphanumeric();
        if left_ok && right_ok {
            return Some(start);
        }
    }
    None
}

/// Character offset of the first literal occurrence
fn find_literal_char_offset(text: &str, needle: &str) -> Option<usize> {
    text.find(needle)
        .map(|byte_idx| text[..byte_idx].chars().count())
}

/// Wire-level trigger form. Input sources may populate several fields;
/// resolution applies the fixed precedence time > word > position >
/// marker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerSpec {
    #[serde(default)]
    pub time_ms: Option<u64>,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub marker: Option<String>,
}

impl TriggerSpec {
    /// Collapse to exactly one trigger by precedence
    pub fn resolve(&self) -> Option<Trigger> {
        if let Some(t) = self.time_ms {
            return Some(Trigger::TimeMs(t));
        }
        if let Some(ref w) = self.word {
            return Some(Trigger::Word(w.clone()));
        }
        if let Some(p) = self.position {
            return Some(Trigger::Position(p));
        }
        self.marker.as_ref().map(|m| Trigger::Marker(m.clone()))
    }
}

/// A time-bounded morph between two emotion profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionTransition {
    /// Starting emotion
    pub from: EmotionProfile,
    /// Destination emotion
    pub to: EmotionProfile,
    /// Transition window length, strictly positive
    pub duration_ms: u64,
    /// Easing curve
    #[serde(default)]
    pub curve: TransitionCurve,
    /// Required and only valid for the Bézier curve; coordinates in [0,1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_points: Option<[(f32, f32); 2]>,
    /// Shape intensity by the destination emotion's natural curve
    /// instead of the named one
    #[serde(default)]
    pub natural_shaping: bool,
    /// Positioning condition
    pub trigger: Trigger,
}

impl EmotionTransition {
    /// Create a transition with a linear curve
    pub fn new(
        from: EmotionProfile,
        to: EmotionProfile,
        duration_ms: u64,
        trigger: Trigger,
    ) -> Self {
        Self {
            from,
            to,
            duration_ms,
            curve: TransitionCurve::Linear,
            control_points: None,
            natural_shaping: false,
            trigger,
        }
    }

    /// Set the curve
    pub fn with_curve(mut self, curve: TransitionCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Set Bézier control points
    pub fn with_control_points(mut self, cp1: (f32, f32), cp2: (f32, f32)) -> Self {
        self.control_points = Some([cp1, cp2]);
        self
    }

    /// Shape by the destination emotion's natural curve
    pub fn with_natural_shaping(mut self) -> Self {
        self.natural_shaping = true;
        self
    }

    /// Evaluate the eased progress of this transition
    pub fn ease(&self, progress: f32) -> f32 {
        if self.natural_shaping {
            return natural_shape(self.to.kind, progress);
        }
        self.curve.ease(progress, self.control_points)
    }
}

/// Acceptance bounds for transitions. Transitions outside the bounds
/// are dropped with a warning; the render continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionLimits {
    /// Minimum transition window
    pub min_duration_ms: u64,
    /// Maximum transition window
    pub max_duration_ms: u64,
    /// Minimum |to.intensity − from.intensity| worth transitioning over
    pub intensity_threshold: f32,
}

impl Default for TransitionLimits {
    fn default() -> Self {
        Self {
            min_duration_ms: 500,
            max_duration_ms: 3000,
            intensity_threshold: 0.1,
        }
    }
}

impl TransitionLimits {
    /// Validate one transition against the bounds and its own internal
    /// consistency (Bézier control points).
    pub fn validate(&self, transition: &EmotionTransition) -> Result<()> {
        if transition.duration_ms < self.min_duration_ms
            || transition.duration_ms > self.max_duration_ms
        {
            return Err(RenderError::InvalidTransition {
                reason: format!(
                    "duration {}ms outside [{}ms, {}ms]",
                    transition.duration_ms, self.min_duration_ms, self.max_duration_ms
                ),
            });
        }
        let delta = (transition.to.intensity - transition.from.intensity).abs();
        if delta < self.intensity_threshold {
            return Err(RenderError::InvalidTransition {
                reason: format!(
                    "intensity delta {:.3} below threshold {:.3}",
                    delta, self.intensity_threshold
                ),
            });
        }
        match (transition.curve, transition.control_points) {
            (TransitionCurve::Bezier, None) => {
                return Err(RenderError::InvalidTransition {
                    reason: "bezier curve requires control points".to_string(),
                });
            }
            (TransitionCurve::Bezier, Some(points)) => {
                for (x, y) in points {
                    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
                        return Err(RenderError::InvalidTransition {
                            reason: format!(
                                "control point ({}, {}) outside [0,1]",
                                x, y
                            ),
                        });
                    }
                }
            }
            (_, Some(_)) => {
                return Err(RenderError::InvalidTransition {
                    reason: "control points are only valid with the bezier curve"
                        .to_string(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::profile::EmotionKind;

    fn transition(duration_ms: u64, from_i: f32, to_i: f32) -> EmotionTransition {
        EmotionTransition::new(
            EmotionProfile::new(EmotionKind::Calm, from_i),
            EmotionProfile::new(EmotionKind::Excited, to_i),
            duration_ms,
            Trigger::TimeMs(0),
        )
    }

    #[test]
    fn test_word_trigger_position() {
        let text = "I was calm, but then I became really excited!";
        let trigger = Trigger::Word("excited".to_string());
        // "excited" starts at char offset 37
        let expected = 37 * 1000 / 15;
        assert_eq!(trigger.resolve_ms(text), Some(expected));
    }

    #[test]
    fn test_word_trigger_whole_word_only() {
        let trigger = Trigger::Word("cite".to_string());
        assert_eq!(trigger.resolve_ms("really excited now"), None);
        let trigger = Trigger::Word("Excited".to_string());
        assert!(trigger.resolve_ms("so EXCITED!").is_some());
    }

    #[test]
    fn test_marker_trigger() {
        let trigger = Trigger::Marker("pause".to_string());
        assert_eq!(trigger.resolve_ms("well [pause] then"), Some(5 * 1000 / 15));
        assert_eq!(trigger.resolve_ms("no marker here"), None);
    }

    #[test]
    fn test_position_trigger_uses_reading_rate() {
        assert_eq!(Trigger::Position(30).resolve_ms("irrelevant"), Some(2000));
    }

    #[test]
    fn test_trigger_spec_precedence() {
        let spec = TriggerSpec {
            time_ms: Some(100),
            word: Some("later".to_string()),
            position: Some(5),
            marker: None,
        };
        assert_eq!(spec.resolve(), Some(Trigger::TimeMs(100)));

        let spec = TriggerSpec {
            time_ms: None,
            word: Some("now".to_string()),
            position: Some(5),
            marker: Some("m".to_string()),
        };
        assert_eq!(spec.resolve(), Some(Trigger::Word("now".to_string())));

        assert_eq!(TriggerSpec::default().resolve(), None);
    }

    #[test]
    fn test_duration_bounds() {
        let limits = TransitionLimits::default();
        assert!(limits.validate(&transition(500, 0.2, 0.8)).is_ok());
        assert!(limits.validate(&transition(3000, 0.2, 0.8)).is_ok());
        assert!(limits.validate(&transition(499, 0.2, 0.8)).is_err());
        assert!(limits.validate(&transition(3001, 0.2, 0.8)).is_err());
    }

    #[test]
    fn test_intensity_threshold() {
        let limits = TransitionLimits::default();
        assert!(limits.validate(&transition(1000, 0.5, 0.55)).is_err());
        assert!(limits.validate(&transition(1000, 0.5, 0.61)).is_ok());
    }

    #[test]
    fn test_natural_shaping_overrides_curve() {
        let transition = EmotionTransition::new(
            EmotionProfile::new(EmotionKind::Calm, 0.2),
            EmotionProfile::new(EmotionKind::Surprised, 0.9),
            1000,
            Trigger::TimeMs(0),
        )
        .with_natural_shaping();
        // the surprised shape peaks at one fifth of the window
        assert!((transition.ease(0.2) - 1.0).abs() < 1e-5);
        assert!(transition.ease(1.0) < 1.0);
    }

    #[test]
    fn test_bezier_control_point_rules() {
        let limits = TransitionLimits::default();
        let missing = transition(1000, 0.2, 0.8).with_curve(TransitionCurve::Bezier);
        assert!(limits.validate(&missing).is_err());

        let valid = transition(1000, 0.2, 0.8)
            .with_curve(TransitionCurve::Bezier)
            .with_control_points((0.4, 0.0), (0.6, 1.0));
        assert!(limits.validate(&valid).is_ok());

        let out_of_range = transition(1000, 0.2, 0.8)
            .with_curve(TransitionCurve::Bezier)
            .with_control_points((1.4, 0.0), (0.6, 1.0));
        assert!(limits.validate(&out_of_range).is_err());

        let stray = transition(1000, 0.2, 0.8)
            .with_control_points((0.4, 0.0), (0.6, 1.0));
        assert!(limits.validate(&stray).is_err());
    }
}
