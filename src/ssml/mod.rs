//! SSML markup emission
//!
//! Prosody derivation from pace, speaking style, emotion and scene
//! hints, plus the document builder. The emitted tag set is exactly
//! `speak`, `voice`, `prosody`, `emphasis`, `break`.

pub mod emitter;
pub mod prosody;

pub use emitter::{SsmlEmitter, SsmlOptions};
pub use prosody::{
    collapse_emotion, emotion_offsets, pace_rate, style_offsets, NumericProsody, Prosody,
    ProsodyOffsets,
};
