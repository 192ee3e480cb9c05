//! Provider configuration
//!
//! Chooses the speech-to-text backend and the knobs around it. Loaded from
//! JSON (the FFI shell) or from environment variables (the CLI).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::providers::{
    DeepgramProvider, OpenAIWhisperProvider, SimulatedTranscriptionProvider,
    TranscriptionAdapter, TranscriptionProvider,
};
use crate::types::ScoreBasis;

pub const ENV_PROVIDER: &str = "PRONOUNCE_PROVIDER";
pub const ENV_TIMEOUT_MS: &str = "PRONOUNCE_TIMEOUT_MS";
pub const ENV_LANGUAGE: &str = "PRONOUNCE_LANGUAGE";
pub const ENV_SEED: &str = "PRONOUNCE_SEED";

/// Speech-to-text backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Always simulate
    #[default]
    None,
    #[serde(rename = "openai")]
    OpenAI,
    Deepgram,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "none" | "simulated" => Ok(Self::None),
            "openai" | "whisper" => Ok(Self::OpenAI),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("Unknown provider: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub backend: ProviderKind,
    /// Falls back to OPENAI_API_KEY / DEEPGRAM_API_KEY when unset
    pub api_key: Option<String>,
    pub model: Option<String>,
    /// ISO 639-1 language hint
    pub language: Option<String>,
    pub timeout_ms: u64,
    /// Sample rate of the PCM audio handed to the adapter
    pub sample_rate: u32,
    pub simulation_seed: Option<u64>,
    /// Which score drives the quality tier and feedback text
    pub feedback_basis: ScoreBasis,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: ProviderKind::None,
            api_key: None,
            model: None,
            language: Some("en".to_string()),
            timeout_ms: 5000,
            sample_rate: 16000,
            simulation_seed: None,
            feedback_basis: ScoreBasis::Raw,
        }
    }
}

impl ProviderConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from `PRONOUNCE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(provider) = std::env::var(ENV_PROVIDER) {
            config.backend = ProviderKind::parse(&provider)?;
        }
        if let Ok(timeout) = std::env::var(ENV_TIMEOUT_MS) {
            config.timeout_ms = timeout
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_TIMEOUT_MS} must be an integer")))?;
        }
        if let Ok(language) = std::env::var(ENV_LANGUAGE) {
            config.language = Some(language);
        }
        if let Ok(seed) = std::env::var(ENV_SEED) {
            config.simulation_seed = Some(
                seed.parse()
                    .map_err(|_| Error::Config(format!("{ENV_SEED} must be an integer")))?,
            );
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_backend(mut self, backend: ProviderKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulation_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be positive".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(Error::Config("sample_rate must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured backend, or `None` when simulating
    pub fn build_provider(&self) -> Option<Arc<dyn TranscriptionProvider>> {
        let api_key = self.api_key.clone();

        let provider: Arc<dyn TranscriptionProvider> = match self.backend {
            ProviderKind::None => return None,
            ProviderKind::OpenAI => {
                let mut provider = OpenAIWhisperProvider::new(api_key);
                if let Some(model) = &self.model {
                    provider = provider.with_model(model.clone());
                }
                Arc::new(provider)
            }
            ProviderKind::Deepgram => {
                let mut provider = DeepgramProvider::new(api_key);
                if let Some(model) = &self.model {
                    provider = provider.with_model(model.clone());
                }
                Arc::new(provider)
            }
        };

        info!(
            "Transcription provider: {} (key: {})",
            provider.name(),
            if provider.is_configured() { "SET" } else { "NONE" }
        );

        Some(provider)
    }

    pub fn build_adapter(&self) -> TranscriptionAdapter {
        TranscriptionAdapter::new(
            self.build_provider(),
            SimulatedTranscriptionProvider::new(self.simulation_seed),
        )
        .with_timeout(self.timeout())
        .with_sample_rate(self.sample_rate)
        .with_language(self.language.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.backend, ProviderKind::None);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.feedback_basis, ScoreBasis::Raw);
        assert!(config.build_provider().is_none());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            ProviderConfig::from_json(r#"{"backend": "deepgram", "simulation_seed": 7}"#).unwrap();
        assert_eq!(config.backend, ProviderKind::Deepgram);
        assert_eq!(config.simulation_seed, Some(7));
        assert_eq!(config.sample_rate, 16000);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(ProviderConfig::from_json(r#"{"timeout_ms": 0}"#).is_err());
        assert!(ProviderConfig::from_json(r#"{"backend": "carrier-pigeon"}"#).is_err());
    }

    #[test]
    fn test_openai_serde_name() {
        let config = ProviderConfig::from_json(r#"{"backend": "openai"}"#).unwrap();
        assert_eq!(config.backend, ProviderKind::OpenAI);
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(ProviderKind::parse("OpenAI").unwrap(), ProviderKind::OpenAI);
        assert_eq!(ProviderKind::parse("whisper").unwrap(), ProviderKind::OpenAI);
        assert_eq!(ProviderKind::parse("").unwrap(), ProviderKind::None);
        assert!(ProviderKind::parse("bogus").is_err());
    }

    #[test]
    fn test_build_provider_names() {
        let config = ProviderConfig::default().with_backend(ProviderKind::Deepgram);
        let provider = config.build_provider().unwrap();
        assert_eq!(provider.name(), "Deepgram");

        let config = ProviderConfig::default().with_backend(ProviderKind::OpenAI);
        assert_eq!(config.build_provider().unwrap().name(), "OpenAI Whisper");
    }
}
