//! Emotion model and timeline engine
//!
//! The canonical emotion model for the pipeline:
//! - Eight emotion kinds with intensity control and named variations
//! - Easing curves and natural per-emotion shapes
//! - Triggered transitions with validation bounds
//! - Keyframe timelines compiled into per-token emotion segments

pub mod curves;
pub mod profile;
pub mod timeline;
pub mod transition;

pub use curves::{bezier, ease_in, ease_in_out, ease_out, lerp, natural_shape, TransitionCurve};
pub use profile::{EmotionKind, EmotionPresets, EmotionProfile, EmotionVariation};
pub use timeline::{
    CompiledTimeline, EmotionSegment, EmotionTimeline, Keyframe, TimelineEngine,
    WORDS_PER_MINUTE,
};
pub use transition::{
    EmotionTransition, TransitionLimits, Trigger, TriggerSpec, CHARS_PER_SECOND,
};
