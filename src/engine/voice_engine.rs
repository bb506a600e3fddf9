//! Voice engine
//!
//! Thin coordinator for single and batch synthesis requests: resolves
//! the voice, compiles the emotion timeline, builds one provider
//! request per emotion segment, dispatches, and concatenates the
//! returned PCM. Provider selection is capability-based and
//! deterministic.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::audio::codec::Codec;
use crate::audio::pcm::PcmBuffer;
use crate::core::error::{FailureKind, RenderError, Result};
use crate::emotion::{
    CompiledTimeline, EmotionProfile, EmotionTransition, TimelineEngine, TransitionLimits,
};
use crate::plan::{Character, Line};
use crate::provider::{ProviderRegistry, SpeechProvider, SynthesisRequest};
use crate::scene::SceneHints;
use crate::ssml::{collapse_emotion, SsmlEmitter, SsmlOptions};
use crate::voice::{PromptInterpreter, VoicePresets, VoiceSpec};

/// How a request names its voice
#[derive(Debug, Clone)]
pub enum VoiceSelector {
    /// A fully specified voice
    Spec(VoiceSpec),
    /// A natural-language description, run through the prompt
    /// interpreter
    Prompt(String),
    /// A named preset
    Preset(String),
}

impl Default for VoiceSelector {
    fn default() -> Self {
        VoiceSelector::Spec(VoiceSpec::default())
    }
}

/// A single engine-level synthesis request
#[derive(Debug, Clone, Default)]
pub struct SpeakRequest {
    pub text: String,
    pub voice: VoiceSelector,
    /// Backend voice identifier, when the caller knows one
    pub voice_id: Option<String>,
    /// Pre-resolved provider name
    pub provider: Option<String>,
    /// Overrides the voice's default emotion
    pub emotion: Option<EmotionProfile>,
    /// Emotion transitions across the text
    pub transitions: Vec<EmotionTransition>,
    /// Rate multiplier stacked onto prosody-derived rate
    pub speed: Option<f32>,
}

impl SpeakRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_voice_spec(mut self, spec: VoiceSpec) -> Self {
        self.voice = VoiceSelector::Spec(spec);
        self
    }

    pub fn with_voice_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.voice = VoiceSelector::Prompt(prompt.into());
        self
    }

    pub fn with_voice_preset(mut self, preset: impl Into<String>) -> Self {
        self.voice = VoiceSelector::Preset(preset.into());
        self
    }

    pub fn with_emotion(mut self, emotion: EmotionProfile) -> Self {
        self.emotion = Some(emotion);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_transition(mut self, transition: EmotionTransition) -> Self {
        self.transitions.push(transition);
        self
    }
}

/// Outcome of synthesizing one line for the scheduler
#[derive(Debug, Clone)]
pub struct LineSynthesis {
    /// Concatenated canonical PCM for the whole line
    pub audio: PcmBuffer,
    /// The compiled emotion timeline behind it
    pub compiled: CompiledTimeline,
    /// Per-segment failures, in segment order
    pub failures: Vec<FailureKind>,
    /// Provider that served the line
    pub provider: String,
}

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct VoiceEngineOptions {
    pub ssml: SsmlOptions,
    pub transition_limits: TransitionLimits,
}

/// The orchestrator. Constructed once; holds the process-wide provider
/// registry and the codec collaborator, both read-only.
pub struct VoiceEngine {
    registry: Arc<ProviderRegistry>,
    codec: Arc<dyn Codec>,
    timeline: TimelineEngine,
    options: VoiceEngineOptions,
}

impl VoiceEngine {
    pub fn new(registry: Arc<ProviderRegistry>, codec: Arc<dyn Codec>) -> Self {
        Self::with_options(registry, codec, VoiceEngineOptions::default())
    }

    pub fn with_options(
        registry: Arc<ProviderRegistry>,
        codec: Arc<dyn Codec>,
        options: VoiceEngineOptions,
    ) -> Self {
        Self {
            registry,
            codec: Arc::clone(&codec),
            timeline: TimelineEngine::new(options.transition_limits.clone()),
            options,
        }
    }

    /// The provider registry backing this engine
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The codec collaborator
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Registered provider names, in stable order
    pub fn provider_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// True when any registered provider supports emotion directly
    pub fn supports_emotions(&self) -> bool {
        self.registry.iter().any(|p| p.supports_emotions())
    }

    /// True when any registered provider supports voice cloning
    pub fn supports_voice_cloning(&self) -> bool {
        self.registry.iter().any(|p| p.supports_voice_cloning())
    }

    /// Selection policy: pre-resolved name first, then the first
    /// emotion-capable provider when emotion control is needed, then
    /// the first registered provider.
    pub fn select_provider(
        &self,
        provider: Option<&str>,
        needs_emotion: bool,
    ) -> Result<Arc<dyn SpeechProvider>> {
        if let Some(name) = provider {
            return self
                .registry
                .get(name)
                .ok_or(RenderError::NoProviderAvailable);
        }
        if needs_emotion {
            if let Some(provider) = self.registry.first_emotive() {
                return Ok(provider);
            }
        }
        self.registry.first().ok_or(RenderError::NoProviderAvailable)
    }

    /// Resolve a voice selector to a spec
    pub fn resolve_voice(&self, selector: &VoiceSelector) -> VoiceSpec {
        match selector {
            VoiceSelector::Spec(spec) => spec.clone(),
            VoiceSelector::Prompt(prompt) => PromptInterpreter::parse(prompt),
            VoiceSelector::Preset(name) => VoicePresets::get(name).unwrap_or_else(|| {
                warn!(preset = %name, "unknown voice preset, using defaults");
                VoiceSpec::default()
            }),
        }
    }

    /// Synthesize a single request. Per-segment failures abort the
    /// request; use [`Self::speak_batch`] or the scheduler for
    /// substitute-and-continue semantics.
    pub async fn speak(&self, request: &SpeakRequest) -> Result<PcmBuffer> {
        let spec = self.resolve_voice(&request.voice);
        let character = Character::new("speaker", "Speaker").with_voice(spec);
        let default_emotion = request
            .emotion
            .clone()
            .unwrap_or_else(|| character.default_emotion.clone());

        let compiled =
            self.timeline
                .compile(&request.text, &default_emotion, &request.transitions);
        let needs_emotion = segments_need_emotion(&compiled);
        let provider = self.select_provider(request.provider.as_deref(), needs_emotion)?;

        let mut audio = PcmBuffer::empty();
        for segment in &compiled.segments {
            let synthesis_request = self.build_segment_request(
                &character,
                &segment.text,
                &segment.emotion,
                request.voice_id.as_deref(),
                request.speed,
                provider.as_ref(),
                None,
            );
            let buffer = provider.synthesize(&synthesis_request).await?;
            let buffer = self.codec.canonicalize(buffer)?;
            audio.append(&buffer);
        }
        Ok(audio)
    }

    /// Batch synthesis: requests are independent; a failed request
    /// yields an empty buffer at its index.
    pub async fn speak_batch(&self, requests: &[SpeakRequest]) -> Vec<PcmBuffer> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            match self.speak(request).await {
                Ok(buffer) => results.push(buffer),
                Err(err) => {
                    warn!(error = %err, "batch item failed, substituting empty buffer");
                    results.push(PcmBuffer::empty());
                }
            }
        }
        results
    }

    /// Synthesize one plan line for the scheduler. Per-segment failures
    /// substitute zero-filled buffers of the segment's estimated
    /// duration and are reported, never propagated.
    pub async fn synthesize_line(
        &self,
        character: &Character,
        line: &Line,
        scene: Option<&SceneHints>,
    ) -> Result<LineSynthesis> {
        let default_emotion = line
            .emotion
            .clone()
            .unwrap_or_else(|| character.default_emotion.clone());
        let compiled = self
            .timeline
            .compile(&line.text, &default_emotion, &line.transitions);
        let needs_emotion = segments_need_emotion(&compiled);
        let provider = self.select_provider(None, needs_emotion)?;

        let mut audio = PcmBuffer::empty();
        let mut failures = Vec::new();
        for segment in &compiled.segments {
            let request = self.build_segment_request(
                character,
                &segment.text,
                &segment.emotion,
                None,
                line.timing.speed_multiplier,
                provider.as_ref(),
                scene,
            );
            match provider.synthesize(&request).await {
                Ok(buffer) => match self.codec.canonicalize(buffer) {
                    Ok(buffer) => audio.append(&buffer),
                    Err(err) => {
                        warn!(line = %line.id, error = %err, "canonicalization failed, substituting silence");
                        failures.push(FailureKind::InvalidResponse);
                        audio.append(&PcmBuffer::silence(
                            segment.end_ms.saturating_sub(segment.start_ms),
                        ));
                    }
                },
                Err(err) => {
                    let kind = failure_kind_of(&err);
                    warn!(line = %line.id, error = %err, "segment synthesis failed, substituting silence");
                    failures.push(kind);
                    audio.append(&PcmBuffer::silence(
                        segment.end_ms.saturating_sub(segment.start_ms),
                    ));
                }
            }
        }

        debug!(
            line = %line.id,
            segments = compiled.segments.len(),
            transitions = compiled.transition_count,
            provider = %provider.name(),
            "line synthesized"
        );

        Ok(LineSynthesis {
            audio,
            compiled,
            failures,
            provider: provider.name().to_string(),
        })
    }

    /// Build the provider request for one emotion segment
    #[allow(clippy::too_many_arguments)]
    fn build_segment_request(
        &self,
        character: &Character,
        text: &str,
        emotion: &EmotionProfile,
        voice_id: Option<&str>,
        speed: Option<f32>,
        provider: &dyn SpeechProvider,
        scene: Option<&SceneHints>,
    ) -> SynthesisRequest {
        let mut request = SynthesisRequest::new(text, voice_id.unwrap_or_default());
        request.rate = speed.unwrap_or(1.0);

        if provider.supports_ssml() {
            let mut emitter = SsmlEmitter::new(self.options.ssml.clone());
            request.ssml =
                Some(emitter.emit(text, character, Some(emotion), scene, voice_id));
        }

        if provider.supports_emotions() {
            request.emotion = Some(emotion.clone());
        } else {
            // same mapping as the markup table, applied numerically
            let collapsed = collapse_emotion(emotion);
            request.rate *= collapsed.rate;
            request.pitch_pct += collapsed.pitch_pct;
            request.volume_db += collapsed.volume_db;
        }
        request
    }
}

/// Whether any segment carries a non-neutral emotion
fn segments_need_emotion(compiled: &CompiledTimeline) -> bool {
    compiled
        .segments
        .iter()
        .any(|s| s.emotion.kind != crate::emotion::EmotionKind::Neutral)
}

/// Classify an error for failure statistics
fn failure_kind_of(err: &RenderError) -> FailureKind {
    match err {
        RenderError::SynthesisFailed { kind, .. } => *kind,
        _ => FailureKind::Backend,
    }
}
