//! # VoiceStage - Dialogue Speech Renderer
//!
//! Converts annotated text - single utterances, multi-character scripts,
//! or subtitle tracks - into synchronized speech audio by driving remote
//! text-to-speech backends.
//!
//! ## Features
//!
//! - **Prompt-designed voices**: natural-language descriptions become
//!   structured voice specifications
//! - **Emotion timelines**: triggered transitions compile into keyframe
//!   curves and per-segment emotion states
//! - **Capability-based providers**: backends are selected per request
//!   by what they support, not by subclassing
//! - **Conversation scheduling**: per-line timing, overlap resolution,
//!   per-character track assembly
//! - **Deterministic mixing**: sample-accurate 16-bit summation with
//!   normalization, compression and crossfades
//! - **SSML emission**: prosody, emphasis and break markup derived from
//!   character state and emotion
//! - **Script and subtitle input**: screenplay/play/chat/novel formats
//!   plus round-trippable SRT and VTT
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use voicestage::audio::WavCodec;
//! use voicestage::engine::{ConversationScheduler, RenderOptions, VoiceEngine};
//! use voicestage::plan::{Character, Line, RenderPlan};
//! use voicestage::provider::{ExpressiveHttpProvider, ProviderConfig, ProviderRegistry};
//! use voicestage::voice::PromptInterpreter;
//! use voicestage::CancelToken;
//!
//! let registry = Arc::new(
//!     ProviderRegistry::builder()
//!         .register(Box::new(ExpressiveHttpProvider::new(ProviderConfig {
//!             name: "expressive".into(),
//!             api_key: key,
//!             base_url: "https://tts.example.com".into(),
//!             ..Default::default()
//!         })?))
//!         .build()
//!         .await,
//! );
//! let engine = VoiceEngine::new(registry, Arc::new(WavCodec::new()));
//!
//! let narrator = Character::new("narrator", "Narrator")
//!     .with_voice(PromptInterpreter::parse("calm deep male voice, wise"));
//! let plan = RenderPlan::new()
//!     .with_character(narrator)
//!     .with_line(Line::new("l1", "narrator", "It began, as these things do, with a door."));
//!
//! let registry = plan.registry();
//! let scheduler = ConversationScheduler::new(&engine, &registry);
//! let outcome = scheduler
//!     .render(&plan, &RenderOptions::with_master(), &CancelToken::never())
//!     .await?;
//! ```
//!
//! ## Subtitle Input
//!
//! ```rust,ignore
//! use voicestage::script::{parse_srt, plan_from_subtitles};
//!
//! let track = parse_srt(&std::fs::read_to_string("episode.srt")?)?;
//! let plan = plan_from_subtitles(&track);
//! ```

pub mod audio;
pub mod core;
pub mod emotion;
pub mod engine;
pub mod plan;
pub mod provider;
pub mod scene;
pub mod script;
pub mod ssml;
pub mod stage;
pub mod voice;

// Core re-exports
pub use crate::core::{
    cancel::{CancelSource, CancelToken},
    error::{CodecOperation, FailureKind, RenderError, Result, ResultExt},
};

// Emotion re-exports
pub use emotion::{
    CompiledTimeline, EmotionKind, EmotionProfile, EmotionSegment, EmotionTimeline,
    EmotionTransition, Keyframe, TimelineEngine, TransitionCurve, TransitionLimits, Trigger,
};

// Voice re-exports
pub use voice::{
    Accent, AgeRange, Gender, Pace, PersonalityTag, PromptInterpreter, Timbre, VoicePresets,
    VoiceSpec,
};

// Plan re-exports
pub use plan::{
    Character, CharacterRegistry, GlobalSettings, Line, LineTiming, Overlap, Personality,
    RenderPlan, SpeechPatterns,
};

// Provider re-exports
pub use provider::{
    ExpressiveHttpProvider, PlainHttpProvider, ProviderConfig, ProviderRegistry,
    SpeechProvider, SynthesisRequest, VoiceDescriptor,
};

// Audio re-exports
pub use audio::{
    Codec, ContainerFormat, Mixer, MixerOptions, PcmBuffer, WavCodec, CANONICAL_CHANNELS,
    CANONICAL_SAMPLE_RATE,
};

// Engine re-exports
pub use engine::{
    ConversationScheduler, ConversationTimeline, RenderOptions, RenderOutcome, RenderResult,
    RenderStatistics, SpeakRequest, VoiceEngine, VoiceSelector,
};

// Scene re-exports
pub use scene::{SceneContext, SceneHints, SceneRecommender};

// SSML re-exports
pub use ssml::{SsmlEmitter, SsmlOptions};

// Facade re-exports
pub use stage::{Stage, StageBuilder};

// Script re-exports
pub use script::{
    emit_srt, emit_vtt, parse_auto, parse_srt, parse_vtt, plan_from_script,
    plan_from_subtitles, ScriptFormat, ScriptLine, SubtitleCue, SubtitleTrack,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
