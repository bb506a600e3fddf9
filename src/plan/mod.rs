//! Render plans
//!
//! The fully specified input to the pipeline: characters, ordered
//! lines, and global settings. Plans are validated up front; validation
//! failures are fatal and produce no result.

pub mod character;
pub mod line;

pub use character::{
    Character, CharacterRegistry, EmotionalRange, EmphasisStyle, Personality,
    PersonalityTrait, SpeakingStyle, SpeechPatterns,
};
pub use line::{Line, LineEffects, LineTiming, Overlap, ReverbStyle};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{RenderError, Result};

/// Plan-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Default silence between consecutive lines
    #[serde(default = "default_pause_between_lines")]
    pub pause_between_lines_ms: u64,
    /// Crossfade window at speaker changes; 0 disables
    #[serde(default)]
    pub crossfade_ms: u64,
    /// Master gain in [0, 2]
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,
    /// Estimate line durations from text when no explicit timing is
    /// given
    #[serde(default = "default_natural_timing")]
    pub natural_timing: bool,
}

fn default_pause_between_lines() -> u64 {
    500
}

fn default_master_volume() -> f32 {
    1.0
}

fn default_natural_timing() -> bool {
    true
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            pause_between_lines_ms: default_pause_between_lines(),
            crossfade_ms: 0,
            master_volume: default_master_volume(),
            natural_timing: default_natural_timing(),
        }
    }
}

/// Optional descriptive metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlanMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fully specified input to the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RenderPlan {
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub settings: GlobalSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PlanMetadata>,
}

impl RenderPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(mut self, character: Character) -> Self {
        self.characters.push(character);
        self
    }

    pub fn with_line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }

    pub fn with_settings(mut self, settings: GlobalSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_metadata(mut self, metadata: PlanMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Build the character registry for a render pass
    pub fn registry(&self) -> CharacterRegistry {
        CharacterRegistry::from_characters(&self.characters)
    }

    /// Validate the plan: unique character and line ids, every line's
    /// character known, overlap targets resolving to other lines, and
    /// all numeric ranges in bounds. Fatal on failure.
    pub fn validate(&self) -> Result<()> {
        let mut character_ids = HashSet::new();
        for character in &self.characters {
            if !character_ids.insert(character.id.as_str()) {
                return Err(RenderError::InvalidPlan {
                    reason: format!("duplicate character id '{}'", character.id),
                });
            }
        }

        let mut line_ids = HashSet::new();
        for line in &self.lines {
            if !line_ids.insert(line.id.as_str()) {
                return Err(RenderError::InvalidPlan {
                    reason: format!("duplicate line id '{}'", line.id),
                });
            }
            if !character_ids.contains(line.character_id.as_str()) {
                return Err(RenderError::InvalidPlan {
                    reason: format!(
                        "line '{}' references unknown character '{}'",
                        line.id, line.character_id
                    ),
                });
            }
        }

        if !(0.0..=2.0).contains(&self.settings.master_volume) {
            return Err(RenderError::InvalidPlan {
                reason: format!(
                    "master_volume {} outside [0, 2]",
                    self.settings.master_volume
                ),
            });
        }

        for line in &self.lines {
            if let (Some(start), Some(end)) = (line.timing.start_ms, line.timing.end_ms) {
                if end < start {
                    return Err(RenderError::InvalidPlan {
                        reason: format!(
                            "line '{}' has end_ms {} before start_ms {}",
                            line.id, end, start
                        ),
                    });
                }
            }
            if let Some(speed) = line.timing.speed_multiplier {
                if !(0.5..=2.0).contains(&speed) {
                    return Err(RenderError::InvalidPlan {
                        reason: format!(
                            "line '{}' speed_multiplier {} outside [0.5, 2.0]",
                            line.id, speed
                        ),
                    });
                }
            }
            if let Some(ref overlap) = line.timing.overlap {
                if overlap.target_line_id == line.id {
                    return Err(RenderError::InvalidPlan {
                        reason: format!("line '{}' overlaps itself", line.id),
                    });
                }
                if !line_ids.contains(overlap.target_line_id.as_str()) {
                    return Err(RenderError::InvalidPlan {
                        reason: format!(
                            "line '{}' overlap targets unknown line '{}'",
                            line.id, overlap.target_line_id
                        ),
                    });
                }
                if !(0.0..=1.0).contains(&overlap.volume_attenuation) {
                    return Err(RenderError::InvalidPlan {
                        reason: format!(
                            "line '{}' overlap attenuation {} outside [0, 1]",
                            line.id, overlap.volume_attenuation
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_line_plan() -> RenderPlan {
        RenderPlan::new()
            .with_character(Character::new("alice", "Alice"))
            .with_character(Character::new("bob", "Bob"))
            .with_line(Line::new("l1", "alice", "Hello there"))
            .with_line(Line::new("l2", "bob", "Hi back"))
    }

    #[test]
    fn test_valid_plan() {
        assert!(two_line_plan().validate().is_ok());
    }

    #[test]
    fn test_duplicate_character_id() {
        let plan = two_line_plan().with_character(Character::new("alice", "Other"));
        assert!(matches!(
            plan.validate(),
            Err(RenderError::InvalidPlan { .. })
        ));
    }

    #[test]
    fn test_unknown_character_reference() {
        let plan = two_line_plan().with_line(Line::new("l3", "carol", "Who am I?"));
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("carol"));
    }

    #[test]
    fn test_duplicate_line_id() {
        let plan = two_line_plan().with_line(Line::new("l1", "bob", "Again"));
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_overlap_target_must_exist() {
        let mut plan = two_line_plan();
        plan.lines[1].timing.overlap = Some(Overlap {
            target_line_id: "l9".to_string(),
            offset_into_target_ms: 500,
            overlap_duration_ms: 1000,
            volume_attenuation: 0.3,
        });
        assert!(plan.validate().is_err());

        plan.lines[1].timing.overlap.as_mut().unwrap().target_line_id = "l1".to_string();
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_speed_multiplier_bounds() {
        let mut plan = two_line_plan();
        plan.lines[0].timing.speed_multiplier = Some(2.5);
        assert!(plan.validate().is_err());
        plan.lines[0].timing.speed_multiplier = Some(2.0);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut plan = two_line_plan();
        plan.lines[0].timing.start_ms = Some(2000);
        plan.lines[0].timing.end_ms = Some(1000);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_master_volume_bounds() {
        let mut plan = two_line_plan();
        plan.settings.master_volume = 2.1;
        assert!(plan.validate().is_err());
    }
}
