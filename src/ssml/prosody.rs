//! Prosody derivation
//!
//! Maps pace, speaking style, emotion and scene hints onto prosody
//! attributes. The per-emotion offset table is fixed: coefficients are
//! scaled linearly by intensity. The same table backs both SSML
//! attribute emission and the numeric collapse used for backends
//! without emotion support.

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionKind, EmotionProfile};
use crate::plan::SpeakingStyle;
use crate::voice::Pace;

/// Prosody offsets relative to a neutral delivery
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProsodyOffsets {
    /// Additive rate delta; 0.2 means 20% faster
    pub rate_delta: f32,
    /// Pitch shift in percent
    pub pitch_pct: f32,
    /// Pitch range widening in percent
    pub range_pct: f32,
    /// Volume offset in decibels
    pub volume_db: f32,
}

impl ProsodyOffsets {
    /// Component-wise sum
    pub fn combine(&self, other: &ProsodyOffsets) -> ProsodyOffsets {
        ProsodyOffsets {
            rate_delta: self.rate_delta + other.rate_delta,
            pitch_pct: self.pitch_pct + other.pitch_pct,
            range_pct: self.range_pct + other.range_pct,
            volume_db: self.volume_db + other.volume_db,
        }
    }
}

/// Unit coefficients per emotion kind, applied at intensity 1.0:
/// (rate delta, pitch %, range %, volume dB)
const EMOTION_PROSODY: &[(EmotionKind, f32, f32, f32, f32)] = &[
    (EmotionKind::Happy, 0.20, 15.0, 25.0, 1.0),
    (EmotionKind::Sad, -0.30, -20.0, -15.0, -2.0),
    (EmotionKind::Angry, 0.15, 10.0, 30.0, 3.0),
    (EmotionKind::Excited, 0.30, 20.0, 35.0, 2.0),
    (EmotionKind::Calm, -0.15, -5.0, -20.0, -1.0),
    (EmotionKind::Fearful, 0.25, 25.0, -10.0, -1.0),
    (EmotionKind::Surprised, 0.10, 30.0, 40.0, 1.5),
    (EmotionKind::Neutral, 0.0, 0.0, 0.0, 0.0),
];

/// Offsets contributed by an emotion, linear in intensity
pub fn emotion_offsets(emotion: &EmotionProfile) -> ProsodyOffsets {
    let i = emotion.intensity.clamp(0.0, 1.0);
    let row = EMOTION_PROSODY
        .iter()
        .find(|(kind, ..)| *kind == emotion.kind)
        .copied()
        .unwrap_or((EmotionKind::Neutral, 0.0, 0.0, 0.0, 0.0));
    ProsodyOffsets {
        rate_delta: row.1 * i,
        pitch_pct: row.2 * i,
        range_pct: row.3 * i,
        volume_db: row.4 * i,
    }
}

/// Base rate multiplier for an enumerated pace
pub fn pace_rate(pace: Pace) -> f32 {
    match pace {
        Pace::Slow => 0.85,
        Pace::Normal => 1.0,
        Pace::Fast => 1.15,
    }
}

/// Offsets contributed by a character's speaking style
pub fn style_offsets(style: &SpeakingStyle) -> ProsodyOffsets {
    ProsodyOffsets {
        // enthusiasm speeds delivery up; pace is folded in separately
        rate_delta: (style.enthusiasm - 0.5) * 0.2,
        // confidence settles the voice slightly lower
        pitch_pct: (0.5 - style.confidence) * 6.0,
        // formality narrows the pitch range, enthusiasm widens it
        range_pct: (style.enthusiasm - style.formality) * 20.0,
        volume_db: (style.confidence - 0.5) * 3.0,
    }
}

/// Resolved prosody: base pace combined with accumulated offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    /// Rate multiplier, clamped to [0.5, 2.0]
    pub rate: f32,
    /// Pitch shift in percent, clamped to [-50, 50]
    pub pitch_pct: f32,
    /// Range widening in percent, clamped to [-50, 50]
    pub range_pct: f32,
    /// Volume offset in decibels, clamped to [-12, 12]
    pub volume_db: f32,
}

impl Prosody {
    /// Resolve pace plus offsets into clamped attribute values
    pub fn resolve(pace: Pace, offsets: &ProsodyOffsets) -> Self {
        Self {
            rate: (pace_rate(pace) + offsets.rate_delta).clamp(0.5, 2.0),
            pitch_pct: offsets.pitch_pct.clamp(-50.0, 50.0),
            range_pct: offsets.range_pct.clamp(-50.0, 50.0),
            volume_db: offsets.volume_db.clamp(-12.0, 12.0),
        }
    }

    /// True when every attribute sits at its neutral value
    pub fn is_neutral(&self) -> bool {
        (self.rate - 1.0).abs() < 1e-3
            && self.pitch_pct.abs() < 1e-3
            && self.range_pct.abs() < 1e-3
            && self.volume_db.abs() < 1e-3
    }

    /// `rate` attribute value, e.g. `112%`
    pub fn rate_attr(&self) -> String {
        format!("{}%", (self.rate * 100.0).round() as i64)
    }

    /// `pitch` attribute value, e.g. `+15%`
    pub fn pitch_attr(&self) -> String {
        format!("{:+}%", self.pitch_pct.round() as i64)
    }

    /// `range` attribute value, e.g. `+25%`
    pub fn range_attr(&self) -> String {
        format!("{:+}%", self.range_pct.round() as i64)
    }

    /// `volume` attribute value, e.g. `+1.5dB`
    pub fn volume_attr(&self) -> String {
        format!("{:+.1}dB", self.volume_db)
    }
}

/// Numeric collapse for backends without emotion support: the same
/// table expressed as plain rate/pitch/volume adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericProsody {
    /// Rate multiplier
    pub rate: f32,
    /// Pitch shift in percent
    pub pitch_pct: f32,
    /// Volume offset in decibels
    pub volume_db: f32,
}

/// Collapse an emotion into numeric rate/pitch/volume, deterministically
pub fn collapse_emotion(emotion: &EmotionProfile) -> NumericProsody {
    let offsets = emotion_offsets(emotion);
    NumericProsody {
        rate: (1.0 + offsets.rate_delta).clamp(0.5, 2.0),
        pitch_pct: offsets.pitch_pct.clamp(-50.0, 50.0),
        volume_db: offsets.volume_db.clamp(-12.0, 12.0),
    }
}
