//! Engine: orchestration and scheduling
//!
//! The voice engine drives single and batch synthesis requests through
//! the provider registry; the conversation scheduler turns whole render
//! plans into per-character tracks, a sorted event timeline, statistics
//! and an optional mixed master.

pub mod scheduler;
pub mod timeline;
pub mod voice_engine;

pub use scheduler::{
    ConversationScheduler, RenderOptions, RenderOutcome, RenderResult, RenderStatistics,
};
pub use timeline::{ConversationTimeline, TimelineEvent, TimelineEventKind};
pub use voice_engine::{
    LineSynthesis, SpeakRequest, VoiceEngine, VoiceEngineOptions, VoiceSelector,
};
