//! Stage facade - unified high-level API
//!
//! The `Stage` struct is the primary entry point for applications that
//! want speech out of text without wiring the pipeline themselves: it
//! owns the provider registry, codec and engine, and exposes one-call
//! renders for plans, scripts and subtitle tracks.
//!
//! # Example
//!
//! ```rust,ignore
//! use voicestage::stage::Stage;
//!
//! let stage = Stage::builder()
//!     .provider(Box::new(provider))
//!     .build()
//!     .await?;
//!
//! // one utterance
//! let audio = stage.say("Hello there", "warm female voice").await?;
//!
//! // a whole script
//! let outcome = stage.render_script("ALICE: Hi!\nBOB: Oh, hi.").await?;
//! ```

use std::sync::Arc;

use tracing::info;

use crate::audio::codec::{Codec, WavCodec};
use crate::audio::mixer::MixerOptions;
use crate::audio::pcm::PcmBuffer;
use crate::core::cancel::CancelToken;
use crate::core::error::Result;
use crate::engine::scheduler::{
    ConversationScheduler, RenderOptions, RenderOutcome,
};
use crate::engine::voice_engine::{SpeakRequest, VoiceEngine, VoiceEngineOptions};
use crate::plan::RenderPlan;
use crate::provider::{ProviderRegistry, SpeechProvider};
use crate::scene::SceneContext;
use crate::script::{parse_auto, parse_srt, parse_vtt, plan_from_script, plan_from_subtitles};
use crate::ssml::SsmlOptions;

/// High-level facade owning the whole pipeline
pub struct Stage {
    engine: VoiceEngine,
    render_options: RenderOptions,
}

impl Stage {
    /// Start building a stage
    pub fn builder() -> StageBuilder {
        StageBuilder::new()
    }

    /// The engine, for callers that need lower-level control
    pub fn engine(&self) -> &VoiceEngine {
        &self.engine
    }

    /// Registered provider names
    pub fn provider_names(&self) -> Vec<&str> {
        self.engine.provider_names()
    }

    /// Synthesize a single utterance with a prompt-designed voice
    pub async fn say(&self, text: &str, voice_prompt: &str) -> Result<PcmBuffer> {
        let request = SpeakRequest::new(text).with_voice_prompt(voice_prompt);
        self.engine.speak(&request).await
    }

    /// Render a full plan with the configured options
    pub async fn render(&self, plan: &RenderPlan) -> Result<RenderOutcome> {
        self.render_cancellable(plan, &CancelToken::never()).await
    }

    /// Render a full plan, cancellable at provider calls
    pub async fn render_cancellable(
        &self,
        plan: &RenderPlan,
        cancel: &CancelToken,
    ) -> Result<RenderOutcome> {
        let registry = plan.registry();
        let scheduler = ConversationScheduler::new(&self.engine, &registry);
        scheduler.render(plan, &self.render_options, cancel).await
    }

    /// Parse a script in any recognized format and render it
    pub async fn render_script(&self, script: &str) -> Result<RenderOutcome> {
        let lines = parse_auto(script);
        let plan = plan_from_script(&lines);
        info!(
            lines = plan.lines.len(),
            characters = plan.characters.len(),
            "script parsed"
        );
        self.render(&plan).await
    }

    /// Parse an SRT document and render it on its own timecodes
    pub async fn render_srt(&self, srt: &str) -> Result<RenderOutcome> {
        let track = parse_srt(srt)?;
        self.render(&plan_from_subtitles(&track)).await
    }

    /// Parse a WebVTT document and render it on its own timecodes
    pub async fn render_vtt(&self, vtt: &str) -> Result<RenderOutcome> {
        let track = parse_vtt(vtt)?;
        self.render(&plan_from_subtitles(&track)).await
    }
}

/// Builder assembling registry, codec and options into a [`Stage`]
pub struct StageBuilder {
    providers: Vec<Box<dyn SpeechProvider>>,
    codec: Arc<dyn Codec>,
    ssml: SsmlOptions,
    mixer: MixerOptions,
    scene: Option<SceneContext>,
    build_master: bool,
}

impl StageBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            codec: Arc::new(WavCodec::new()),
            ssml: SsmlOptions::default(),
            mixer: MixerOptions::default(),
            scene: None,
            build_master: true,
        }
    }

    /// Queue a provider; registration order is the fallback order
    pub fn provider(mut self, provider: Box<dyn SpeechProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Replace the codec collaborator
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Configure markup emission
    pub fn ssml_options(mut self, options: SsmlOptions) -> Self {
        self.ssml = options;
        self
    }

    /// Configure mixing
    pub fn mixer_options(mut self, options: MixerOptions) -> Self {
        self.mixer = options;
        self
    }

    /// Adapt delivery to a scene
    pub fn scene(mut self, scene: SceneContext) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Skip mixing a master; tracks only
    pub fn tracks_only(mut self) -> Self {
        self.build_master = false;
        self
    }

    /// Initialize providers and assemble the stage
    pub async fn build(self) -> Stage {
        let mut registry_builder = ProviderRegistry::builder();
        for provider in self.providers {
            registry_builder = registry_builder.register(provider);
        }
        let registry = Arc::new(registry_builder.build().await);
        let engine = VoiceEngine::with_options(
            registry,
            self.codec,
            VoiceEngineOptions {
                ssml: self.ssml,
                ..Default::default()
            },
        );
        Stage {
            engine,
            render_options: RenderOptions {
                build_master: self.build_master,
                mixer: self.mixer,
                scene: self.scene,
            },
        }
    }
}

impl Default for StageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{FailureKind, RenderError};
    use crate::provider::{SynthesisRequest, VoiceDescriptor};
    use crate::audio::pcm::CANONICAL_SAMPLE_RATE;
    use async_trait::async_trait;

    struct ToneProvider;

    #[async_trait]
    impl SpeechProvider for ToneProvider {
        fn name(&self) -> &str {
            "tone"
        }

        async fn initialize(&mut self) -> Result<()> {
            Ok(())
        }

        async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>> {
            Ok(vec![])
        }

        fn supports_emotions(&self) -> bool {
            true
        }

        fn supports_voice_cloning(&self) -> bool {
            false
        }

        async fn synthesize(&self, request: &SynthesisRequest) -> Result<PcmBuffer> {
            if request.text.is_empty() {
                return Err(RenderError::SynthesisFailed {
                    provider: "tone".to_string(),
                    kind: FailureKind::Backend,
                    message: "empty text".to_string(),
                });
            }
            let words = request.text.split_whitespace().count().max(1);
            let frames = words * CANONICAL_SAMPLE_RATE as usize / 3;
            Ok(PcmBuffer::new(
                vec![4000; frames * 2],
                CANONICAL_SAMPLE_RATE,
                2,
            ))
        }
    }

    async fn stage() -> Stage {
        Stage::builder().provider(Box::new(ToneProvider)).build().await
    }

    #[tokio::test]
    async fn test_say_produces_audio() {
        let stage = stage().await;
        let audio = stage.say("hello out there", "warm female voice").await.unwrap();
        assert!(!audio.is_empty());
        assert!(audio.is_canonical());
    }

    #[tokio::test]
    async fn test_render_script_end_to_end() {
        let stage = stage().await;
        let outcome = stage
            .render_script("ALICE: Morning all.\nBOB: Morning to you too.\n")
            .await
            .unwrap();
        let result = outcome.expect_completed();
        assert_eq!(result.tracks.len(), 2);
        assert!(result.master.is_some());
        assert_eq!(result.statistics.failed_segments, 0);
    }

    #[tokio::test]
    async fn test_render_srt_uses_cue_times() {
        let stage = stage().await;
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nALICE: Hi there\n";
        let result = stage.render_srt(srt).await.unwrap().expect_completed();
        assert_eq!(result.statistics.total_duration_ms, 2000);
    }

    #[tokio::test]
    async fn test_tracks_only_skips_master() {
        let stage = Stage::builder()
            .provider(Box::new(ToneProvider))
            .tracks_only()
            .build()
            .await;
        let outcome = stage.render_script("ALICE: Hello.\nBOB: Hi.\n").await.unwrap();
        let result = outcome.expect_completed();
        assert!(result.master.is_none());
        assert!(!result.tracks.is_empty());
    }
}
