//! Provider adapter with transparent fallback to simulation
//!
//! Per attempt: `Idle -> Requesting -> Succeeded | Failed`, and `Failed` (or a
//! missing provider) moves on to `Simulated`. The scorer sees the same
//! `ProviderResult` either way. A failed request is never retried.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::AudioData;
use crate::error::Error;
use crate::types::{ProviderResult, TranscriptOrigin};

use super::{SimulatedTranscriptionProvider, TranscriptionProvider, TranscriptionRequest};

/// Default bound on one provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// State of one transcription attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    Idle,
    Requesting,
    Succeeded(ProviderResult),
    Failed(String),
    Simulated(ProviderResult),
}

impl AttemptState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
            Self::Simulated(_) => "simulated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Simulated(_))
    }
}

/// Final outcome of the adapter for one attempt
#[derive(Debug, Clone)]
pub struct AdapterOutcome {
    pub result: ProviderResult,
    pub origin: TranscriptOrigin,
    /// Every state the attempt passed through, ending in a terminal one
    pub states: Vec<AttemptState>,
}

impl AdapterOutcome {
    pub fn final_state(&self) -> Option<&AttemptState> {
        self.states.last()
    }
}

/// Tracks the state trail of a single attempt
struct Attempt {
    states: Vec<AttemptState>,
}

impl Attempt {
    fn new() -> Self {
        Self {
            states: vec![AttemptState::Idle],
        }
    }

    fn advance(&mut self, next: AttemptState) {
        if let Some(current) = self.states.last() {
            debug!("Attempt state: {} -> {}", current.label(), next.label());
        }
        self.states.push(next);
    }
}

/// Calls the configured backend once, falling back to simulation
pub struct TranscriptionAdapter {
    provider: Option<Arc<dyn TranscriptionProvider>>,
    simulator: SimulatedTranscriptionProvider,
    timeout: Duration,
    sample_rate: u32,
    language: Option<String>,
}

impl TranscriptionAdapter {
    pub fn new(
        provider: Option<Arc<dyn TranscriptionProvider>>,
        simulator: SimulatedTranscriptionProvider,
    ) -> Self {
        Self {
            provider,
            simulator,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            sample_rate: 16000,
            language: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Name of the real backend, if one is configured
    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider
            .as_ref()
            .filter(|p| p.is_configured())
            .map(|p| p.name())
    }

    /// Transcribe an attempt; never fails, degrading to a simulated transcript
    pub async fn transcribe(&self, audio: Option<AudioData>, target_word: &str) -> AdapterOutcome {
        let mut attempt = Attempt::new();

        let failure = match self.request(audio, target_word, &mut attempt).await {
            Ok((name, result)) => {
                attempt.advance(AttemptState::Succeeded(result.clone()));
                return AdapterOutcome {
                    result,
                    origin: TranscriptOrigin::Provider {
                        name: name.to_string(),
                    },
                    states: attempt.states,
                };
            }
            Err(e) => e,
        };

        match &failure {
            Error::ProviderUnavailable(reason) => {
                debug!("Provider unavailable ({}), simulating transcript", reason)
            }
            other => warn!("Transcription failed, simulating transcript: {}", other),
        }

        let result = self.simulator.simulate(target_word);
        attempt.advance(AttemptState::Simulated(result.clone()));

        AdapterOutcome {
            result,
            origin: TranscriptOrigin::Simulated {
                reason: failure.to_string(),
            },
            states: attempt.states,
        }
    }

    async fn request(
        &self,
        audio: Option<AudioData>,
        target_word: &str,
        attempt: &mut Attempt,
    ) -> Result<(&'static str, ProviderResult), Error> {
        let provider = self
            .provider
            .as_ref()
            .filter(|p| p.is_configured())
            .ok_or_else(|| Error::ProviderUnavailable("no speech-to-text backend".to_string()))?;

        let audio = audio
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::ProviderUnavailable("no audio captured".to_string()))?;

        let mut request = TranscriptionRequest::new(audio, self.sample_rate, target_word);
        if let Some(lang) = &self.language {
            request = request.with_language(lang.clone());
        }

        attempt.advance(AttemptState::Requesting);
        debug!("Requesting transcription from {}", provider.name());

        let outcome = match tokio::time::timeout(self.timeout, provider.transcribe(request)).await {
            Ok(Ok(result)) => Ok((provider.name(), result)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Timeout(self.timeout)),
        };

        if let Err(e) = &outcome {
            attempt.advance(AttemptState::Failed(e.to_string()));
        }
        outcome
    }
}
