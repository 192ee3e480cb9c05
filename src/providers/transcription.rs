//! Transcription provider trait and types

use async_trait::async_trait;

use crate::AudioData;
use crate::error::Result;
use crate::types::ProviderResult;

/// Request for transcription of one practice attempt
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Raw audio data (16-bit PCM, mono)
    pub audio: AudioData,
    /// Sample rate of the audio
    pub sample_rate: u32,
    /// Word the learner is attempting, passed to backends as a recognition hint
    pub target_word: String,
    /// Optional language hint (ISO 639-1 code, e.g., "en")
    pub language: Option<String>,
}

impl TranscriptionRequest {
    pub fn new(audio: AudioData, sample_rate: u32, target_word: impl Into<String>) -> Self {
        Self {
            audio,
            sample_rate,
            target_word: target_word.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Trait for speech-to-text backends, real or simulated
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Transcribe audio into a normalized result
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<ProviderResult>;

    /// Check if the provider is configured and ready
    fn is_configured(&self) -> bool;
}
