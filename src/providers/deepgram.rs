//! Deepgram pre-recorded transcription provider

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, error};

use crate::audio::pcm_to_wav;
use crate::error::{Error, Result};
use crate::types::{ProviderResult, WordTiming};

use super::{TranscriptionProvider, TranscriptionRequest};

const DEEPGRAM_API_BASE: &str = "https://api.deepgram.com/v1";

/// Number of alternative transcripts requested per attempt
const REQUESTED_ALTERNATIVES: u8 = 3;

/// Deepgram transcription provider
///
/// Reports overall confidence, per-word confidence and timing, and extra
/// alternatives.
pub struct DeepgramProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl DeepgramProvider {
    /// Create a new provider (API key loaded from environment if not provided)
    pub fn new(api_key: Option<String>) -> Self {
        let key = api_key.or_else(|| std::env::var("DEEPGRAM_API_KEY").ok());

        Self {
            client: Client::new(),
            api_key: key,
            model: "nova-2".to_string(),
            base_url: DEEPGRAM_API_BASE.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::ProviderUnavailable("Deepgram API key not set".to_string()))
    }

    fn listen_url(&self, request: &TranscriptionRequest) -> Result<Url> {
        let alternatives = REQUESTED_ALTERNATIVES.to_string();
        let keyword = format!("{}:2", request.target_word);
        let mut params = vec![
            ("model", self.model.as_str()),
            ("punctuate", "false"),
            ("alternatives", alternatives.as_str()),
            ("keywords", keyword.as_str()),
        ];
        if let Some(lang) = &request.language {
            params.push(("language", lang.as_str()));
        }

        Url::parse_with_params(&format!("{}/listen", self.base_url), &params)
            .map_err(|e| Error::Config(format!("Invalid Deepgram URL: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: String,
    confidence: f32,
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct Word {
    word: String,
    start: f32,
    end: f32,
    confidence: f32,
}

impl TryFrom<ListenResponse> for ProviderResult {
    type Error = Error;

    fn try_from(response: ListenResponse) -> Result<Self> {
        let mut alternatives = response
            .results
            .channels
            .into_iter()
            .next()
            .map(|c| c.alternatives.into_iter())
            .ok_or_else(|| Error::Provider {
                status: 200,
                message: "Deepgram returned no channels".to_string(),
            })?;

        let best = alternatives.next().ok_or_else(|| Error::Provider {
            status: 200,
            message: "Deepgram returned no alternatives".to_string(),
        })?;

        let words = best
            .words
            .into_iter()
            .map(|w| WordTiming {
                word: w.word,
                confidence: Some(w.confidence),
                start_time: w.start,
                end_time: w.end,
            })
            .collect();

        let others = alternatives
            .map(|a| a.transcript)
            .filter(|t| !t.trim().is_empty() && *t != best.transcript)
            .collect();

        Ok(ProviderResult::from_transcript(best.transcript)
            .with_confidence(best.confidence)
            .with_words(words)
            .with_alternatives(others))
    }
}

#[async_trait]
impl TranscriptionProvider for DeepgramProvider {
    fn name(&self) -> &'static str {
        "Deepgram"
    }

    async fn transcribe(&self, request: TranscriptionRequest) -> Result<ProviderResult> {
        let api_key = self.api_key()?;
        let url = self.listen_url(&request)?;
        let wav_data = pcm_to_wav(&request.audio, request.sample_rate, 1)?;

        debug!("Sending transcription request to Deepgram");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Token {}", api_key))
            .header("Content-Type", "audio/wav")
            .body(wav_data)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Deepgram API error: {} - {}", status, error_text);
            return Err(Error::Provider {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let listen_response: ListenResponse = response.json().await?;
        listen_response.try_into()
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESPONSE: &str = r#"{
        "metadata": {"request_id": "abc"},
        "results": {
            "channels": [{
                "alternatives": [
                    {
                        "transcript": "banana",
                        "confidence": 0.97,
                        "words": [{"word": "banana", "start": 0.2, "end": 0.8, "confidence": 0.97}]
                    },
                    {"transcript": "bandana", "confidence": 0.41, "words": []},
                    {"transcript": "banana", "confidence": 0.30, "words": []}
                ]
            }]
        }
    }"#;

    #[test]
    fn test_response_normalization() {
        let response: ListenResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let result = ProviderResult::try_from(response).unwrap();

        assert_eq!(result.transcript, "banana");
        assert_eq!(result.confidence, Some(0.97));
        assert_eq!(result.words.len(), 1);
        assert_eq!(result.words[0].confidence, Some(0.97));
        // duplicate of the best transcript dropped
        assert_eq!(result.alternatives, vec!["bandana"]);
    }

    #[test]
    fn test_empty_channels_is_an_error() {
        let response: ListenResponse =
            serde_json::from_str(r#"{"results": {"channels": []}}"#).unwrap();
        assert!(ProviderResult::try_from(response).is_err());
    }

    #[test]
    fn test_listen_url_carries_hints() {
        let provider = DeepgramProvider {
            client: Client::new(),
            api_key: Some("key".to_string()),
            model: "nova-2".to_string(),
            base_url: DEEPGRAM_API_BASE.to_string(),
        };
        let request = TranscriptionRequest::new(Vec::new(), 16000, "banana").with_language("en");
        let url = provider.listen_url(&request).unwrap();

        let query = url.query().unwrap();
        assert!(url.path().ends_with("/listen"));
        assert!(query.contains("model=nova-2"));
        assert!(query.contains("keywords=banana%3A2"));
        assert!(query.contains("language=en"));
    }
}
