//! Practice session: the transcribe-and-score pipeline
//!
//! A session owns its provider adapter and attempt history explicitly, so
//! several sessions (or tests) can run side by side. Only one attempt may be
//! in flight per session at a time.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::feedback::{analyze, feedback_message};
use crate::phonetic::clean_word;
use crate::providers::TranscriptionAdapter;
use crate::scoring::score_attempt;
use crate::types::{
    AttemptId, AttemptOutcome, AudioData, ProviderResult, ScoreBasis, TranscriptOrigin,
};

/// Alternatives returned to the caller per attempt
pub const MAX_ALTERNATIVES: usize = 3;

/// Compact record of a past attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub id: AttemptId,
    pub target_word: String,
    pub transcript: String,
    pub raw_accuracy: u8,
    pub boosted_accuracy: u8,
    pub simulated: bool,
    pub attempted_at: DateTime<Utc>,
}

impl From<&AttemptOutcome> for AttemptSummary {
    fn from(outcome: &AttemptOutcome) -> Self {
        Self {
            id: outcome.id,
            target_word: outcome.target_word.clone(),
            transcript: outcome.transcript.clone(),
            raw_accuracy: outcome.raw_accuracy,
            boosted_accuracy: outcome.boosted_accuracy,
            simulated: outcome.origin.is_simulated(),
            attempted_at: outcome.attempted_at,
        }
    }
}

/// Score a transcript and build the full outcome
///
/// Pure apart from the generated id and timestamp.
pub fn evaluate(
    target_word: &str,
    result: &ProviderResult,
    origin: TranscriptOrigin,
    basis: ScoreBasis,
) -> AttemptOutcome {
    let breakdown = score_attempt(target_word, result);
    let shown = match basis {
        ScoreBasis::Raw => breakdown.raw,
        ScoreBasis::Boosted => breakdown.boosted,
    };

    let analysis = analyze(target_word, &result.transcript, shown, Some(result));
    let message = feedback_message(target_word, &result.transcript, shown);

    AttemptOutcome {
        id: Uuid::new_v4(),
        target_word: target_word.to_string(),
        transcript: result.transcript.clone(),
        raw_accuracy: breakdown.raw,
        boosted_accuracy: breakdown.boosted,
        analysis,
        feedback_message: message,
        alternatives: select_alternatives(&result.transcript, &result.alternatives),
        origin,
        breakdown,
        attempted_at: Utc::now(),
    }
}

/// Distinct non-empty alternatives that differ from the transcript
fn select_alternatives(transcript: &str, alternatives: &[String]) -> Vec<String> {
    let spoken = clean_word(transcript);
    let mut seen: Vec<String> = Vec::new();
    let mut selected = Vec::new();

    for alt in alternatives {
        let key = clean_word(alt);
        if key.is_empty() || key == spoken || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        selected.push(alt.trim().to_string());
        if selected.len() == MAX_ALTERNATIVES {
            break;
        }
    }

    selected
}

/// Clears the in-flight flag when an attempt finishes, even on early return
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::AttemptInFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One learner's practice session
pub struct PracticeSession {
    id: Uuid,
    adapter: TranscriptionAdapter,
    feedback_basis: ScoreBasis,
    in_flight: AtomicBool,
    closed: AtomicBool,
    attempts: Mutex<Vec<AttemptSummary>>,
}

impl PracticeSession {
    pub fn new(config: &ProviderConfig) -> Self {
        Self::with_adapter(config.build_adapter(), config.feedback_basis)
    }

    pub fn with_adapter(adapter: TranscriptionAdapter, feedback_basis: ScoreBasis) -> Self {
        let id = Uuid::new_v4();
        info!(
            "Practice session {} started (backend: {})",
            id,
            adapter.provider_name().unwrap_or("simulated")
        );

        Self {
            id,
            adapter,
            feedback_basis,
            in_flight: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Transcribe the attempt (or simulate it) and score it against the target
    ///
    /// Fails only when the session is closed or another attempt is running.
    pub async fn transcribe_and_score(
        &self,
        target_word: &str,
        audio: Option<AudioData>,
    ) -> Result<AttemptOutcome> {
        self.ensure_open()?;
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        debug!("Transcribing attempt at '{}'", target_word);
        let transcribed = self.adapter.transcribe(audio, target_word).await;

        Ok(self.record(evaluate(
            target_word,
            &transcribed.result,
            transcribed.origin,
            self.feedback_basis,
        )))
    }

    /// Score a transcript the caller already has
    pub fn score_transcript(
        &self,
        target_word: &str,
        result: ProviderResult,
        origin: TranscriptOrigin,
    ) -> Result<AttemptOutcome> {
        self.ensure_open()?;
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        Ok(self.record(evaluate(
            target_word,
            &result,
            origin,
            self.feedback_basis,
        )))
    }

    fn record(&self, outcome: AttemptOutcome) -> AttemptOutcome {
        info!(
            "Attempt at '{}': heard '{}', raw {} / boosted {}",
            outcome.target_word, outcome.transcript, outcome.raw_accuracy, outcome.boosted_accuracy
        );
        self.attempts.lock().push(AttemptSummary::from(&outcome));
        outcome
    }

    /// Whether an attempt is currently running
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn attempts(&self) -> Vec<AttemptSummary> {
        self.attempts.lock().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Best raw score recorded for a word, ignoring case and punctuation
    pub fn best_score(&self, target_word: &str) -> Option<u8> {
        let key = clean_word(target_word);
        self.attempts
            .lock()
            .iter()
            .filter(|a| clean_word(&a.target_word) == key)
            .map(|a| a.raw_accuracy)
            .max()
    }

    /// Forget all attempts; the session stays usable
    pub fn reset(&self) {
        let cleared = {
            let mut attempts = self.attempts.lock();
            let n = attempts.len();
            attempts.clear();
            n
        };
        debug!("Session {} reset ({} attempts cleared)", self.id, cleared);
    }

    /// End the session; later attempts fail with `SessionClosed`
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Practice session {} closed", self.id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
