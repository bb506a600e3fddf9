//! Emotion-capable HTTP backend
//!
//! Reference implementation of an expressive synthesis service: JSON
//! over HTTP with bearer auth, accepting emotion directly and SSML
//! input, returning base64 raw PCM.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::audio::pcm::PcmBuffer;
use crate::core::error::{FailureKind, RenderError, Result};
use crate::voice::{AgeRange, Gender};

use super::{
    FormatHint, ProviderConfig, SpeechProvider, SynthesisRequest, VoiceDescriptor,
};

/// Expressive backend speaking the reference JSON protocol
pub struct ExpressiveHttpProvider {
    config: ProviderConfig,
    client: Client,
}

/// Request body for the speech endpoint
#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssml: Option<&'a str>,
    voice: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    emotion: Option<EmotionBody<'a>>,
    rate: f32,
    pitch: f32,
    volume: f32,
    sample_rate: u32,
    channels: u16,
    format: &'static str,
}

#[derive(Debug, Serialize)]
struct EmotionBody<'a> {
    kind: &'a str,
    intensity: f32,
}

/// Response payload
#[derive(Debug, Deserialize)]
struct SpeechResponse {
    audio: String,
    sample_rate: u32,
    #[serde(default = "default_channels")]
    channels: u16,
}

fn default_channels() -> u16 {
    1
}

/// Error payload shape
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ExpressiveHttpProvider {
    /// Create the provider from configuration
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RenderError::Validation {
                message: "expressive provider requires an api key".to_string(),
                field: Some("api_key".to_string()),
            });
        }
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/speech", self.config.base_url.trim_end_matches('/'))
    }

    fn body<'a>(&'a self, request: &'a SynthesisRequest) -> SpeechBody<'a> {
        let use_ssml = request.ssml.is_some();
        SpeechBody {
            input: if use_ssml { None } else { Some(&request.text) },
            ssml: request.ssml.as_deref(),
            voice: if request.voice_id.is_empty() {
                self.config.default_voice.as_deref().unwrap_or("aria")
            } else {
                &request.voice_id
            },
            emotion: request.emotion.as_ref().map(|e| EmotionBody {
                kind: e.kind.name(),
                intensity: e.intensity,
            }),
            rate: request.rate,
            pitch: request.pitch_pct,
            volume: request.volume_db,
            sample_rate: 44_100,
            channels: 2,
            format: match request.format_hint {
                FormatHint::Pcm16 => "pcm16",
                FormatHint::Wav => "wav",
            },
        }
    }
}

#[async_trait]
impl SpeechProvider for ExpressiveHttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn initialize(&mut self) -> Result<()> {
        if self.config.base_url.is_empty() {
            return Err(RenderError::Validation {
                message: "expressive provider requires a base url".to_string(),
                field: Some("base_url".to_string()),
            });
        }
        Ok(())
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>> {
        Ok(vec![
            VoiceDescriptor {
                id: "aria".to_string(),
                name: "Aria".to_string(),
                gender: Some(Gender::Female),
                age: Some(AgeRange::Adult),
                language: "en-US".to_string(),
                tags: vec!["expressive".to_string(), "warm".to_string()],
                preview_url: None,
            },
            VoiceDescriptor {
                id: "flint".to_string(),
                name: "Flint".to_string(),
                gender: Some(Gender::Male),
                age: Some(AgeRange::Adult),
                language: "en-US".to_string(),
                tags: vec!["deep".to_string(), "dramatic".to_string()],
                preview_url: None,
            },
            VoiceDescriptor {
                id: "wren".to_string(),
                name: "Wren".to_string(),
                gender: Some(Gender::Neutral),
                age: Some(AgeRange::Young),
                language: "en-GB".to_string(),
                tags: vec!["bright".to_string(), "energetic".to_string()],
                preview_url: None,
            },
        ])
    }

    fn supports_emotions(&self) -> bool {
        true
    }

    fn supports_voice_cloning(&self) -> bool {
        true
    }

    fn supports_ssml(&self) -> bool {
        true
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<PcmBuffer> {
        let body = self.body(request);
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

/// Shared HTTP client construction: bearer auth, JSON, request timeout
pub(crate) fn build_client(config: &ProviderConfig) -> Result<Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        format!("Bearer {}", config.api_key)
            .parse()
            .map_err(|_| RenderError::Validation {
                message: "api key contains invalid header characters".to_string(),
                field: Some("api_key".to_string()),
            })?,
    );
    headers.insert(
        reqwest::header::CONTENT_TYPE,
        "application/json".parse().expect("static header value"),
    );
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .default_headers(headers)
        .build()
        .map_err(|e| RenderError::Internal {
            message: format!("failed to build HTTP client: {}", e),
        })
}

/// Shared dispatch: POST the body, classify failures, decode base64 PCM
pub(crate) async fn dispatch_speech_request<B: Serialize>(
    client: &Client,
    endpoint: &str,
    body: &B,
    provider: &str,
    deadline: Duration,
) -> Result<PcmBuffer> {
    let send = client.post(endpoint).json(body).send();
    let response = match timeout(deadline, send).await {
        Err(_) => {
            return Err(RenderError::SynthesisFailed {
                provider: provider.to_string(),
                kind: FailureKind::Timeout,
                message: format!("no response within {:?}", deadline),
            });
        }
        Ok(Err(err)) => {
            let kind = if err.is_timeout() {
                FailureKind::Timeout
            } else {
                FailureKind::Network
            };
            return Err(RenderError::SynthesisFailed {
                provider: provider.to_string(),
                kind,
                message: err.to_string(),
            });
        }
        Ok(Ok(response)) => response,
    };

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(parsed) => format!("{}: {}", status, parsed.error.message),
            Err(_) => format!("{}: {}", status, text),
        };
        return Err(RenderError::SynthesisFailed {
            provider: provider.to_string(),
            kind: FailureKind::Backend,
            message,
        });
    }

    let payload: SpeechResponse =
        response
            .json()
            .await
            .map_err(|e| RenderError::SynthesisFailed {
                provider: provider.to_string(),
                kind: FailureKind::InvalidResponse,
                message: format!("unparseable response body: {}", e),
            })?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&payload.audio)
        .map_err(|e| RenderError::SynthesisFailed {
            provider: provider.to_string(),
            kind: FailureKind::InvalidResponse,
            message: format!("audio field is not valid base64: {}", e),
        })?;

    Ok(PcmBuffer::from_le_bytes(
        &bytes,
        payload.sample_rate,
        payload.channels,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{EmotionKind, EmotionProfile};

    fn config() -> ProviderConfig {
        ProviderConfig {
            name: "expressive".to_string(),
            api_key: "key".to_string(),
            base_url: "https://tts.example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let mut bad = config();
        bad.api_key.clear();
        assert!(ExpressiveHttpProvider::new(bad).is_err());
        assert!(ExpressiveHttpProvider::new(config()).is_ok());
    }

    #[test]
    fn test_capabilities() {
        let provider = ExpressiveHttpProvider::new(config()).unwrap();
        assert!(provider.supports_emotions());
        assert!(provider.supports_voice_cloning());
        assert!(provider.supports_ssml());
    }

    #[test]
    fn test_body_prefers_ssml() {
        let provider = ExpressiveHttpProvider::new(config()).unwrap();
        let request = SynthesisRequest::new("Hello", "aria")
            .with_ssml("<speak>Hello</speak>")
            .with_emotion(EmotionProfile::new(EmotionKind::Happy, 0.8));
        let body = provider.body(&request);
        assert!(body.input.is_none());
        assert_eq!(body.ssml, Some("<speak>Hello</speak>"));
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"kind\":\"happy\""));
        assert!(json.contains("\"sample_rate\":44100"));
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let mut cfg = config();
        cfg.base_url = "https://tts.example.com/".to_string();
        let provider = ExpressiveHttpProvider::new(cfg).unwrap();
        assert_eq!(provider.endpoint(), "https://tts.example.com/v1/speech");
    }
}
