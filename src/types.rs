//! Core types used throughout Pronounce

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for practice attempts
pub type AttemptId = Uuid;

/// Audio data as raw bytes (16-bit PCM, mono)
pub type AudioData = Vec<u8>;

/// A recognized word with timing, in seconds from the start of the clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    /// Confidence score (0.0 - 1.0) if the backend reports one
    #[serde(default)]
    pub confidence: Option<f32>,
    pub start_time: f32,
    pub end_time: f32,
}

impl WordTiming {
    pub fn duration_ms(&self) -> u64 {
        ((self.end_time - self.start_time).max(0.0) * 1000.0).round() as u64
    }
}

/// Normalized transcription result shared by every provider
///
/// Backends fill different optional fields; scoring must work with only
/// `transcript` present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub transcript: String,
    /// Overall confidence (0.0 - 1.0) if available
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub words: Vec<WordTiming>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl ProviderResult {
    pub fn from_transcript(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_words(mut self, words: Vec<WordTiming>) -> Self {
        self.words = words;
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Whether the backend reported any confidence, overall or per word
    pub fn has_confidence_data(&self) -> bool {
        self.confidence.is_some() || self.words.iter().any(|w| w.confidence.is_some())
    }

    /// Overall confidence, falling back to the mean word confidence
    pub fn overall_confidence(&self) -> Option<f32> {
        if let Some(c) = self.confidence {
            return Some(c.clamp(0.0, 1.0));
        }

        let scored: Vec<f32> = self.words.iter().filter_map(|w| w.confidence).collect();
        if scored.is_empty() {
            None
        } else {
            Some((scored.iter().sum::<f32>() / scored.len() as f32).clamp(0.0, 1.0))
        }
    }
}

/// Which score drives the quality tier and feedback text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBasis {
    #[default]
    Raw,
    Boosted,
}

/// Overall quality tier of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "fair")]
    Fair,
    #[serde(rename = "needs improvement")]
    NeedsImprovement,
}

impl QualityTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsImprovement => "needs improvement",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Qualitative analysis of an attempt (never affects the numeric score)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationAnalysis {
    pub overall_quality: QualityTier,
    pub specific_issues: Vec<String>,
    pub strengths: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Individual terms of the raw accuracy computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub core: f64,
    pub stress: f64,
    pub syllable: f64,
    pub accent_bonus: f64,
    /// Core term came from provider confidence rather than string similarity
    pub provider_informed: bool,
    pub raw: u8,
    pub boosted: u8,
}

/// Where the transcript of an attempt came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptOrigin {
    Provider { name: String },
    Simulated { reason: String },
}

impl TranscriptOrigin {
    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated { .. })
    }
}

/// Everything the caller receives for one attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub id: AttemptId,
    pub target_word: String,
    pub transcript: String,
    pub raw_accuracy: u8,
    pub boosted_accuracy: u8,
    pub analysis: PronunciationAnalysis,
    pub feedback_message: String,
    pub alternatives: Vec<String>,
    pub origin: TranscriptOrigin,
    pub breakdown: ScoreBreakdown,
    pub attempted_at: DateTime<Utc>,
}
