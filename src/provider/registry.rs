//! Provider registry
//!
//! Providers are registered once during engine construction and the
//! set is read-only afterwards. Registration order is the stable
//! fallback order for selection. A provider whose initialization fails
//! is logged and excluded; it never aborts startup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::SpeechProvider;

/// Immutable, ordered set of initialized providers
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn SpeechProvider>>,
    by_name: HashMap<String, usize>,
}

impl ProviderRegistry {
    /// Start building a registry
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::new()
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn SpeechProvider>> {
        self.by_name
            .get(name)
            .map(|&idx| Arc::clone(&self.providers[idx]))
    }

    /// First registered provider, the stable fallback
    pub fn first(&self) -> Option<Arc<dyn SpeechProvider>> {
        self.providers.first().map(Arc::clone)
    }

    /// First registered provider reporting emotion support
    pub fn first_emotive(&self) -> Option<Arc<dyn SpeechProvider>> {
        self.providers
            .iter()
            .find(|p| p.supports_emotions())
            .map(Arc::clone)
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Iterate providers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SpeechProvider>> {
        self.providers.iter()
    }
}

/// Builder performing one-time provider initialization
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    pending: Vec<Box<dyn SpeechProvider>>,
}

impl ProviderRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a provider for initialization
    pub fn register(mut self, provider: Box<dyn SpeechProvider>) -> Self {
        self.pending.push(provider);
        self
    }

    /// Initialize every queued provider. Failures are logged and the
    /// provider is excluded; duplicates by name are rejected.
    pub async fn build(self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::default();
        for mut provider in self.pending {
            let name = provider.name().to_string();
            if registry.by_name.contains_key(&name) {
                warn!(provider = %name, "duplicate provider name, skipping");
                continue;
            }
            match provider.initialize().await {
                Ok(()) => {
                    info!(provider = %name, "provider initialized");
                    registry.by_name.insert(name, registry.providers.len());
                    registry.providers.push(Arc::from(provider));
                }
                Err(err) => {
                    warn!(provider = %name, error = %err, "provider initialization failed, excluding");
                }
            }
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::pcm::PcmBuffer;
    use crate::core::error::{RenderError, Result};
    use crate::provider::{SynthesisRequest, VoiceDescriptor};
    use async_trait::async_trait;

    struct FakeProvider {
        name: String,
        emotive: bool,
        fail_init: bool,
    }

    #[async_trait]
    impl SpeechProvider for FakeProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn initialize(&mut self) -> Result<()> {
            if self.fail_init {
                return Err(RenderError::Internal {
                    message: "no credentials".to_string(),
                });
            }
            Ok(())
        }

        async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>> {
            Ok(vec![])
        }

        fn supports_emotions(&self) -> bool {
            self.emotive
        }

        fn supports_voice_cloning(&self) -> bool {
            false
        }

        async fn synthesize(&self, _request: &SynthesisRequest) -> Result<PcmBuffer> {
            Ok(PcmBuffer::empty())
        }
    }

    fn fake(name: &str, emotive: bool, fail_init: bool) -> Box<dyn SpeechProvider> {
        Box::new(FakeProvider {
            name: name.to_string(),
            emotive,
            fail_init,
        })
    }

    #[tokio::test]
    async fn test_registration_order_is_stable() {
        let registry = ProviderRegistry::builder()
            .register(fake("plain", false, false))
            .register(fake("expressive", true, false))
            .build()
            .await;
        assert_eq!(registry.names(), vec!["plain", "expressive"]);
        assert_eq!(registry.first().unwrap().name(), "plain");
        assert_eq!(registry.first_emotive().unwrap().name(), "expressive");
    }

    #[tokio::test]
    async fn test_failed_init_excluded_not_fatal() {
        let registry = ProviderRegistry::builder()
            .register(fake("broken", false, true))
            .register(fake("working", false, false))
            .build()
            .await;
        assert_eq!(registry.len(), 1);
        assert!(registry.get("broken").is_none());
        assert!(registry.get("working").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let registry = ProviderRegistry::builder()
            .register(fake("dup", false, false))
            .register(fake("dup", true, false))
            .build()
            .await;
        assert_eq!(registry.len(), 1);
        assert!(!registry.first().unwrap().supports_emotions());
    }
}
