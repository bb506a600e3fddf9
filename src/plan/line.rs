//! Lines and line timing
//!
//! A line is one utterance by one character, with optional emotion,
//! transitions, timing and effects.

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionProfile, EmotionTransition};

/// Scheduled simultaneous period between two lines, with the target
/// attenuated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    /// Line this one overlaps; must refer to another line in the plan
    pub target_line_id: String,
    /// Offset into the target at which this line starts
    pub offset_into_target_ms: u64,
    /// Length of the simultaneous window
    pub overlap_duration_ms: u64,
    /// How much the target is attenuated during the window, in [0,1]
    pub volume_attenuation: f32,
}

/// Reverb character for the codec collaborator. The pipeline carries
/// the hint through unaltered; applying it is post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReverbStyle {
    Room,
    Hall,
    Cathedral,
}

/// Per-line audio effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LineEffects {
    /// Gain applied before mixing, in decibels
    #[serde(default)]
    pub gain_db: f32,
    /// Reverb hint for the codec collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverb: Option<ReverbStyle>,
}

/// Timing directives for one line. Absent fields are computed by the
/// scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LineTiming {
    /// Explicit start on the master timeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,
    /// Explicit end on the master timeline; must be >= start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ms: Option<u64>,
    /// Silence before the line; defaults to the plan's inter-line pause
    /// (0 for the first line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_before_ms: Option<u64>,
    /// Silence after the line
    #[serde(default)]
    pub pause_after_ms: u64,
    /// Playback speed in [0.5, 2.0]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_multiplier: Option<f32>,
    /// Overlap directive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<Overlap>,
}

/// One utterance by one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Unique within the plan
    pub id: String,
    /// Speaking character; must exist in the plan's registry
    pub character_id: String,
    /// Utterance text
    pub text: String,
    /// Overrides the character's default emotion when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionProfile>,
    /// Emotion transitions across the line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<EmotionTransition>,
    /// Timing directives
    #[serde(default)]
    pub timing: LineTiming,
    /// Per-line audio effects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<LineEffects>,
}

impl Line {
    /// Create a line with computed timing
    pub fn new(
        id: impl Into<String>,
        character_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            character_id: character_id.into(),
            text: text.into(),
            emotion: None,
            transitions: Vec::new(),
            timing: LineTiming::default(),
            effects: None,
        }
    }

    pub fn with_emotion(mut self, emotion: EmotionProfile) -> Self {
        self.emotion = Some(emotion);
        self
    }

    pub fn with_transition(mut self, transition: EmotionTransition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_timing(mut self, timing: LineTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_effects(mut self, effects: LineEffects) -> Self {
        self.effects = Some(effects);
        self
    }

    /// Word count of the utterance
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl LineTiming {
    pub fn starting_at(start_ms: u64) -> Self {
        Self {
            start_ms: Some(start_ms),
            ..Default::default()
        }
    }

    pub fn with_pause_before(mut self, pause_ms: u64) -> Self {
        self.pause_before_ms = Some(pause_ms);
        self
    }

    pub fn with_pause_after(mut self, pause_ms: u64) -> Self {
        self.pause_after_ms = pause_ms;
        self
    }

    pub fn with_speed(mut self, multiplier: f32) -> Self {
        self.speed_multiplier = Some(multiplier);
        self
    }

    pub fn with_overlap(mut self, overlap: Overlap) -> Self {
        self.overlap = Some(overlap);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_builder() {
        let line = Line::new("l1", "alice", "Hello there, world")
            .with_timing(LineTiming::default().with_pause_after(250));
        assert_eq!(line.word_count(), 3);
        assert_eq!(line.timing.pause_after_ms, 250);
        assert!(line.timing.start_ms.is_none());
    }

    #[test]
    fn test_timing_round_trips_through_serde() {
        let timing = LineTiming::starting_at(1200)
            .with_speed(1.5)
            .with_overlap(Overlap {
                target_line_id: "l0".to_string(),
                offset_into_target_ms: 1000,
                overlap_duration_ms: 2000,
                volume_attenuation: 0.3,
            });
        let json = serde_json::to_string(&timing).unwrap();
        let back: LineTiming = serde_json::from_str(&json).unwrap();
        assert_eq!(back, timing);
    }
}
