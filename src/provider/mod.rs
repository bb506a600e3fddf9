//! Synthesis provider abstraction
//!
//! Defines the capability trait for remote TTS backends. Providers are
//! values owned by a registry; the engine selects one per request by
//! capability, never by subclassing.

pub mod expressive;
pub mod plain;
pub mod registry;

pub use expressive::ExpressiveHttpProvider;
pub use plain::PlainHttpProvider;
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::pcm::PcmBuffer;
use crate::core::error::Result;
use crate::emotion::EmotionProfile;
use crate::voice::{AgeRange, Gender};

/// Hint for the payload a provider should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    /// Raw interleaved 16-bit PCM
    #[default]
    Pcm16,
    /// RIFF/WAV container
    Wav,
}

/// One synthesis call to a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Plain text to speak
    pub text: String,
    /// Marked-up form, for backends that consume SSML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssml: Option<String>,
    /// Backend voice identifier
    pub voice_id: String,
    /// Emotion, for backends that support it directly. Collapsed into
    /// rate/pitch/volume before dispatch otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionProfile>,
    /// Rate multiplier
    #[serde(default = "default_rate")]
    pub rate: f32,
    /// Pitch shift in percent
    #[serde(default)]
    pub pitch_pct: f32,
    /// Volume offset in decibels
    #[serde(default)]
    pub volume_db: f32,
    /// Payload format hint
    #[serde(default)]
    pub format_hint: FormatHint,
    /// Pre-resolved provider name; bypasses capability selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Request id for tracking and log correlation
    #[serde(default = "new_request_id")]
    pub request_id: String,
}

fn default_rate() -> f32 {
    1.0
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ssml: None,
            voice_id: voice_id.into(),
            emotion: None,
            rate: 1.0,
            pitch_pct: 0.0,
            volume_db: 0.0,
            format_hint: FormatHint::Pcm16,
            provider: None,
            request_id: new_request_id(),
        }
    }

    pub fn with_ssml(mut self, ssml: impl Into<String>) -> Self {
        self.ssml = Some(ssml.into());
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

    /// True when the request needs emotion control
    pub fn needs_emotion(&self) -> bool {
        self.emotion
            .as_ref()
            .is_some_and(|e| e.kind != crate::emotion::EmotionKind::Neutral)
    }
}

/// A voice offered by a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Backend voice identifier
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<AgeRange>,
    /// BCP-47 language tag
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Capability trait for synthesis backends
///
/// Implementations are values registered with the engine's provider
/// registry; capability queries drive per-request selection.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Stable provider name
    fn name(&self) -> &str;

    /// One-time startup. A failing provider is excluded from the
    /// registry, not fatal to engine startup.
    async fn initialize(&mut self) -> Result<()>;

    /// Voices this backend offers
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>>;

    /// Whether the backend accepts emotion directly
    fn supports_emotions(&self) -> bool;

    /// Whether the backend can clone voices from reference audio
    fn supports_voice_cloning(&self) -> bool;

    /// Whether the backend consumes SSML input
    fn supports_ssml(&self) -> bool {
        false
    }

    /// Synthesize one request into PCM. The returned buffer reports its
    /// own rate and channel count; canonicalization happens downstream.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<PcmBuffer>;

    /// Cheap availability probe
    async fn health_check(&self) -> bool {
        true
    }
}

/// Shared configuration shape for the reference HTTP backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry name
    #[serde(default)]
    pub name: String,
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the service
    #[serde(default)]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Voice used when a request does not name one
    #[serde(default)]
    pub default_voice: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            api_key: String::new(),
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            default_voice: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionKind;

    #[test]
    fn test_request_builder() {
        let request = SynthesisRequest::new("Hello", "nova")
            .with_emotion(EmotionProfile::new(EmotionKind::Happy, 0.8))
            .with_provider("expressive");
        assert_eq!(request.voice_id, "nova");
        assert!(request.needs_emotion());
        assert_eq!(request.provider.as_deref(), Some("expressive"));
        assert_eq!(request.rate, 1.0);
    }

    #[test]
    fn test_neutral_emotion_needs_no_emotion_control() {
        let request = SynthesisRequest::new("Hello", "nova")
            .with_emotion(EmotionProfile::neutral());
        assert!(!request.needs_emotion());
        assert!(SynthesisRequest::new("Hi", "v").emotion.is_none());
    }

    #[test]
    fn test_provider_config_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.timeout_secs, 60);
        assert!(config.default_voice.is_none());
    }
}
