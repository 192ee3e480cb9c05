//! Simulated transcription for when no real backend can answer
//!
//! Produces plausible transcripts of the target word using the variation
//! generators. Results carry no confidence, so scoring takes the pure string
//! similarity path.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::phonetic::{
    clean_word, generate_accent_variation, generate_common_mistake, generate_slight_variation,
};
use crate::types::ProviderResult;

use super::{TranscriptionProvider, TranscriptionRequest};

/// Alternatives attached to a simulated result
const MAX_SIMULATED_ALTERNATIVES: usize = 2;

/// Cumulative percentage thresholds for each simulated outcome
const EXACT_UNTIL: u32 = 40;
const ACCENT_UNTIL: u32 = 65;
const SLIGHT_UNTIL: u32 = 85;

/// Kind of transcript the simulator produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedOutcome {
    Exact,
    Accent,
    Slight,
    CommonMistake,
}

impl SimulatedOutcome {
    fn from_roll(roll: u32) -> Self {
        if roll < EXACT_UNTIL {
            Self::Exact
        } else if roll < ACCENT_UNTIL {
            Self::Accent
        } else if roll < SLIGHT_UNTIL {
            Self::Slight
        } else {
            Self::CommonMistake
        }
    }
}

/// Seedable stand-in for a speech-to-text backend
pub struct SimulatedTranscriptionProvider {
    rng: Mutex<StdRng>,
}

impl SimulatedTranscriptionProvider {
    /// Seeded for reproducible transcripts, entropy-seeded otherwise
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Produce a simulated result for the target word
    pub fn simulate(&self, target_word: &str) -> ProviderResult {
        let mut rng = self.rng.lock();
        let outcome = SimulatedOutcome::from_roll(rng.gen_range(0..100));
        let transcript = Self::transcript_for(outcome, target_word, &mut *rng);

        let mut alternatives: Vec<String> = Vec::new();
        for candidate in [
            clean_word(target_word),
            generate_accent_variation(target_word, &mut *rng),
            generate_slight_variation(target_word, &mut *rng),
            generate_common_mistake(target_word, &mut *rng),
        ] {
            if alternatives.len() == MAX_SIMULATED_ALTERNATIVES {
                break;
            }
            if candidate != transcript && !alternatives.contains(&candidate) {
                alternatives.push(candidate);
            }
        }

        ProviderResult::from_transcript(transcript).with_alternatives(alternatives)
    }

    fn transcript_for<R: Rng + ?Sized>(
        outcome: SimulatedOutcome,
        target_word: &str,
        rng: &mut R,
    ) -> String {
        match outcome {
            SimulatedOutcome::Exact => clean_word(target_word),
            SimulatedOutcome::Accent => generate_accent_variation(target_word, rng),
            SimulatedOutcome::Slight => generate_slight_variation(target_word, rng),
            SimulatedOutcome::CommonMistake => generate_common_mistake(target_word, rng),
        }
    }
}

impl Default for SimulatedTranscriptionProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl TranscriptionProvider for SimulatedTranscriptionProvider {
    fn name(&self) -> &'static str {
        "Simulated"
    }

    async fn transcribe(&self, request: TranscriptionRequest) -> Result<ProviderResult> {
        Ok(self.simulate(&request.target_word))
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonetic::{accent_variations, common_mistakes, slight_variations};

    #[test]
    fn test_outcome_distribution_thresholds() {
        assert_eq!(SimulatedOutcome::from_roll(0), SimulatedOutcome::Exact);
        assert_eq!(SimulatedOutcome::from_roll(39), SimulatedOutcome::Exact);
        assert_eq!(SimulatedOutcome::from_roll(40), SimulatedOutcome::Accent);
        assert_eq!(SimulatedOutcome::from_roll(65), SimulatedOutcome::Slight);
        assert_eq!(SimulatedOutcome::from_roll(85), SimulatedOutcome::CommonMistake);
        assert_eq!(SimulatedOutcome::from_roll(99), SimulatedOutcome::CommonMistake);
    }

    #[test]
    fn test_simulated_transcripts_are_reachable() {
        let word = "brother";
        let mut reachable = vec![word.to_string()];
        reachable.extend(accent_variations(word));
        reachable.extend(slight_variations(word));
        reachable.extend(common_mistakes(word));

        let provider = SimulatedTranscriptionProvider::new(Some(11));
        for _ in 0..50 {
            let result = provider.simulate(word);
            assert!(reachable.contains(&result.transcript), "{}", result.transcript);
            assert!(result.confidence.is_none());
            assert!(result.alternatives.len() <= MAX_SIMULATED_ALTERNATIVES);
            assert!(!result.alternatives.contains(&result.transcript));
        }
    }

    #[test]
    fn test_same_seed_same_transcripts() {
        let a = SimulatedTranscriptionProvider::new(Some(99));
        let b = SimulatedTranscriptionProvider::new(Some(99));
        for _ in 0..10 {
            assert_eq!(a.simulate("water"), b.simulate("water"));
        }
    }

    #[tokio::test]
    async fn test_trait_uses_target_word() {
        let provider = SimulatedTranscriptionProvider::new(Some(1));
        let request = TranscriptionRequest::new(Vec::new(), 16000, "Cat");
        let result = provider.transcribe(request).await.unwrap();
        assert!(!result.transcript.is_empty());
        assert!(provider.is_configured());
    }
}
