//! Scene-aware delivery recommendation
//!
//! Maps a supplied scene context onto prosody, reverb and EQ hints.
//! The recommender consumes the context; it never derives one from
//! media. Prosody hints feed the markup emitter, reverb and EQ hints
//! feed the mixer and codec collaborator.

use serde::{Deserialize, Serialize};

use crate::plan::ReverbStyle;

/// Physical setting of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SceneSetting {
    #[default]
    Interior,
    Exterior,
    Hall,
    Vehicle,
    Studio,
}

/// Emotional register of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SceneMood {
    #[default]
    Neutral,
    Tense,
    Relaxed,
    Joyful,
    Somber,
    Mysterious,
}

/// Time of day, for delivery energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// How far the listener is from the speakers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListenerDistance {
    Intimate,
    #[default]
    Near,
    Far,
}

/// Supplied description of the scene being rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneContext {
    #[serde(default)]
    pub setting: SceneSetting,
    #[serde(default)]
    pub mood: SceneMood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    /// Background noise level in [0,1]
    #[serde(default)]
    pub ambience_level: f32,
    #[serde(default)]
    pub listener_distance: ListenerDistance,
}

/// Recommended delivery adjustments for a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneHints {
    /// Additive rate delta for the prosody stage
    pub rate_delta: f32,
    /// Pitch shift in percent
    pub pitch_pct: f32,
    /// Volume offset in decibels
    pub volume_db: f32,
    /// Reverb character for the codec collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverb: Option<ReverbStyle>,
    /// Spectral tilt in dB; positive brightens, negative darkens
    pub eq_tilt_db: f32,
}

/// Maps scene context to delivery hints
pub struct SceneRecommender;

impl SceneRecommender {
    /// Produce hints for a context. Pure and deterministic.
    pub fn recommend(context: &SceneContext) -> SceneHints {
        let mut hints = SceneHints::default();

        match context.setting {
            SceneSetting::Interior => {}
            SceneSetting::Exterior => {
                hints.volume_db += 1.5;
                hints.eq_tilt_db += 1.0;
            }
            SceneSetting::Hall => {
                hints.reverb = Some(ReverbStyle::Hall);
                hints.rate_delta -= 0.05;
            }
            SceneSetting::Vehicle => {
                hints.volume_db += 2.0;
                hints.eq_tilt_db += 2.0;
            }
            SceneSetting::Studio => {
                hints.eq_tilt_db -= 0.5;
            }
        }

        match context.mood {
            SceneMood::Neutral => {}
            SceneMood::Tense => {
                hints.rate_delta += 0.08;
                hints.pitch_pct += 5.0;
            }
            SceneMood::Relaxed => {
                hints.rate_delta -= 0.08;
                hints.pitch_pct -= 3.0;
            }
            SceneMood::Joyful => {
                hints.rate_delta += 0.05;
                hints.pitch_pct += 8.0;
            }
            SceneMood::Somber => {
                hints.rate_delta -= 0.10;
                hints.pitch_pct -= 8.0;
                hints.volume_db -= 1.5;
            }
            SceneMood::Mysterious => {
                hints.rate_delta -= 0.05;
                hints.pitch_pct -= 5.0;
                hints.volume_db -= 1.0;
            }
        }

        if let Some(time) = context.time_of_day {
            match time {
                TimeOfDay::Morning => hints.rate_delta += 0.02,
                TimeOfDay::Afternoon => {}
                TimeOfDay::Evening => hints.rate_delta -= 0.02,
                TimeOfDay::Night => {
                    hints.rate_delta -= 0.05;
                    hints.volume_db -= 1.0;
                }
            }
        }

        // compete with the ambience, up to +3 dB
        hints.volume_db += context.ambience_level.clamp(0.0, 1.0) * 3.0;

        match context.listener_distance {
            ListenerDistance::Intimate => {
                hints.volume_db -= 2.0;
                hints.reverb = None;
            }
            ListenerDistance::Near => {}
            ListenerDistance::Far => {
                hints.volume_db += 2.0;
                if hints.reverb.is_none() {
                    hints.reverb = Some(ReverbStyle::Room);
                }
            }
        }

        hints
    }
}
