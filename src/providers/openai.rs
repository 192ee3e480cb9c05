//! OpenAI Whisper transcription provider

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::audio::pcm_to_wav;
use crate::error::{Error, Result};
use crate::types::{ProviderResult, WordTiming};

use super::{TranscriptionProvider, TranscriptionRequest};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI Whisper transcription provider
///
/// Whisper reports no confidence directly; it is derived from the segments'
/// average log-probability.
pub struct OpenAIWhisperProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAIWhisperProvider {
    /// Create a new provider (API key loaded from environment if not provided)
    pub fn new(api_key: Option<String>) -> Self {
        let key = api_key.or_else(|| std::env::var("OPENAI_API_KEY").ok());

        Self {
            client: Client::new(),
            api_key: key,
            model: "whisper-1".to_string(),
            base_url: OPENAI_API_BASE.to_string(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a compatible endpoint instead of api.openai.com
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::ProviderUnavailable("OpenAI API key not set".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct WhisperVerboseResponse {
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    start: f32,
    end: f32,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    avg_logprob: f64,
}

/// Confidence in [0, 1] from the mean segment log-probability
fn confidence_from_segments(segments: &[WhisperSegment]) -> Option<f32> {
    if segments.is_empty() {
        return None;
    }

    let mean = segments.iter().map(|s| s.avg_logprob).sum::<f64>() / segments.len() as f64;
    Some(mean.exp().clamp(0.0, 1.0) as f32)
}

impl From<WhisperVerboseResponse> for ProviderResult {
    fn from(response: WhisperVerboseResponse) -> Self {
        let confidence = confidence_from_segments(&response.segments);
        let words = response
            .words
            .into_iter()
            .map(|w| WordTiming {
                word: w.word.trim().to_string(),
                confidence: None,
                start_time: w.start,
                end_time: w.end,
            })
            .collect();

        ProviderResult {
            transcript: response.text.trim().to_string(),
            confidence,
            words,
            alternatives: Vec::new(),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for OpenAIWhisperProvider {
    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }

    async fn transcribe(&self, request: TranscriptionRequest) -> Result<ProviderResult> {
        let api_key = self.api_key()?;

        // convert PCM to WAV format for the API
        let wav_data = pcm_to_wav(&request.audio, request.sample_rate, 1)?;

        let file_part = reqwest::multipart::Part::bytes(wav_data)
            .file_name("attempt.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Audio(format!("Failed to create form part: {e}")))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .text("timestamp_granularities[]", "segment")
            .text("prompt", request.target_word.clone());

        if let Some(lang) = &request.language {
            form = form.text("language", lang.clone());
        }

        debug!("Sending transcription request to OpenAI Whisper");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Whisper API error: {} - {}", status, error_text);
            return Err(Error::Provider {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let whisper_response: WhisperVerboseResponse = response.json().await?;
        Ok(whisper_response.into())
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_response_normalization() {
        let json = r#"{
            "task": "transcribe",
            "language": "english",
            "duration": 0.8,
            "text": " Banana.",
            "words": [{"word": " Banana", "start": 0.1, "end": 0.7}],
            "segments": [{"id": 0, "avg_logprob": -0.105}]
        }"#;

        let response: WhisperVerboseResponse = serde_json::from_str(json).unwrap();
        let result: ProviderResult = response.into();

        assert_eq!(result.transcript, "Banana.");
        assert_eq!(result.words.len(), 1);
        assert_eq!(result.words[0].word, "Banana");
        assert!(result.words[0].confidence.is_none());

        let confidence = result.confidence.unwrap();
        assert!((confidence - 0.9).abs() < 0.01);
    }

    #[test]
    fn test_plain_response_has_no_confidence() {
        let response: WhisperVerboseResponse =
            serde_json::from_str(r#"{"text": "cat"}"#).unwrap();
        let result: ProviderResult = response.into();

        assert_eq!(result.transcript, "cat");
        assert!(!result.has_confidence_data());
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let provider = OpenAIWhisperProvider {
            client: Client::new(),
            api_key: None,
            model: "whisper-1".to_string(),
            base_url: OPENAI_API_BASE.to_string(),
        };
        assert!(!provider.is_configured());

        let request = TranscriptionRequest::new(vec![0u8; 320], 16000, "cat");
        let err = provider.transcribe(request).await.unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable(_)));
    }
}
