//! Plain HTTP backend without emotion support
//!
//! Reference implementation of a conventional synthesis service: it
//! accepts only text, voice and numeric rate/pitch/volume. The engine
//! collapses any emotion into those numbers before dispatch, so the
//! request reaching this provider never carries one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use crate::audio::pcm::PcmBuffer;
use crate::core::error::{RenderError, Result};
use crate::voice::{AgeRange, Gender};

use super::expressive::{build_client, dispatch_speech_request};
use super::{ProviderConfig, SpeechProvider, SynthesisRequest, VoiceDescriptor};

/// Plain backend speaking the reference JSON protocol, minus emotion
pub struct PlainHttpProvider {
    config: ProviderConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    input: &'a str,
    voice: &'a str,
    rate: f32,
    pitch: f32,
    volume: f32,
    sample_rate: u32,
    channels: u16,
    format: &'static str,
}

impl PlainHttpProvider {
    /// Create the provider from configuration
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RenderError::Validation {
                message: "plain provider requires an api key".to_string(),
                field: Some("api_key".to_string()),
            });
        }
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/speech", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechProvider for PlainHttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn initialize(&mut self) -> Result<()> {
        if self.config.base_url.is_empty() {
            return Err(RenderError::Validation {
                message: "plain provider requires a base url".to_string(),
                field: Some("base_url".to_string()),
            });
        }
        Ok(())
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>> {
        Ok(vec![
            VoiceDescriptor {
                id: "standard-a".to_string(),
                name: "Standard A".to_string(),
                gender: Some(Gender::Female),
                age: Some(AgeRange::Adult),
                language: "en-US".to_string(),
                tags: vec!["neutral".to_string()],
                preview_url: None,
            },
            VoiceDescriptor {
                id: "standard-b".to_string(),
                name: "Standard B".to_string(),
                gender: Some(Gender::Male),
                age: Some(AgeRange::Adult),
                language: "en-US".to_string(),
                tags: vec!["neutral".to_string()],
                preview_url: None,
            },
        ])
    }

    fn supports_emotions(&self) -> bool {
        false
    }

    fn supports_voice_cloning(&self) -> bool {
        false
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<PcmBuffer> {
        if request.emotion.is_some() {
            // the engine collapses emotion before dispatch; reaching
            // here with one means a caller bypassed it
            warn!(provider = %self.name(), "emotion on request to a non-emotive backend, ignoring");
        }
        let body = SpeechBody {
            input: &request.text,
            voice: if request.voice_id.is_empty() {
                self.config.default_voice.as_deref().unwrap_or("standard-a")
            } else {
                &request.voice_id
            },
            rate: request.rate,
            pitch: request.pitch_pct,
            volume: request.volume_db,
            sample_rate: 44_100,
            channels: 2,
            format: "pcm16",
        };
        dispatch_speech_request(
            &self.client,
            &self.endpoint(),
            &body,
            self.name(),
            Duration::from_secs(self.config.timeout_secs),
        )
        .await
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1/health", self.config.base_url.trim_end_matches('/'));
        let result = self
            .client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        result.is_ok_and(|r| r.status().is_success())
    }
}
