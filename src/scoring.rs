//! Pronunciation accuracy scoring
//!
//! Two stages:
//! 1. Raw accuracy: `core * 0.50 + stress * 0.25 + syllable * 0.25 + accent bonus`,
//!    clamped to [0, 100] and rounded. Exact matches short-circuit to 100.
//! 2. Encouragement: [`boost_score`] remaps raw scores upward. It is monotonic
//!    but intentionally not proportional, so tests comparing similarity against
//!    score ordering must use the raw value.

use tracing::debug;

use crate::phonetic::{
    ACCENT_RULES, VOWELS, clean_word, estimate_syllable_count, normalize_for_accents,
    vowel_sequence,
};
use crate::similarity::{
    character_containment_ratio, jaro_winkler_similarity, length_similarity,
    longest_common_subsequence, substring_containment_ratio,
};
use crate::types::{ProviderResult, ScoreBreakdown};

const CORE_WEIGHT: f64 = 0.50;
const STRESS_WEIGHT: f64 = 0.25;
const SYLLABLE_WEIGHT: f64 = 0.25;

/// Core score when the accent-normal forms agree
const NORMALIZED_MATCH_SCORE: f64 = 95.0;
/// Scale applied to lenient similarity in the core term
const SIMILARITY_SCALE: f64 = 0.9;

const STRESS_FLOOR: f64 = 60.0;
const STRESS_NO_VOWELS: f64 = 50.0;

const SYLLABLE_OFF_BY_ONE: f64 = 85.0;
const SYLLABLE_FLOOR: f64 = 50.0;

const ACCENT_RULE_BONUS: f64 = 15.0;
const LENGTH_BONUS: f64 = 10.0;
const LENGTH_BONUS_THRESHOLD: f64 = 0.7;
const CONTAINMENT_BONUS: f64 = 5.0;
const CONTAINMENT_BONUS_THRESHOLD: f64 = 0.6;
const ACCENT_BONUS_CAP: f64 = 25.0;

/// Provider-informed core: weight of overall confidence
const PROVIDER_CONFIDENCE_WEIGHT: f64 = 0.60;
/// Provider-informed core: weight of the target word's own confidence
const WORD_CONFIDENCE_WEIGHT: f64 = 0.25;
/// Provider-informed core: fixed share credited for the transcript itself
const TRANSCRIPT_WEIGHT: f64 = 0.15;

/// Highest raw score a non-identical transcript can reach
pub const NON_EXACT_CEILING: u8 = 98;

/// Raw scores at or above this are floored by the encouragement transform
pub const BOOST_THRESHOLD: u8 = 20;

/// Raw and boosted scores plus the terms that produced them
pub fn score_attempt(target: &str, result: &ProviderResult) -> ScoreBreakdown {
    let target_clean = clean_word(target);
    let spoken_clean = clean_word(&result.transcript);

    if target_clean.is_empty() || spoken_clean.is_empty() {
        return ScoreBreakdown::default();
    }

    if target_clean == spoken_clean {
        return ScoreBreakdown {
            core: 100.0,
            stress: 100.0,
            syllable: 100.0,
            accent_bonus: 0.0,
            provider_informed: false,
            raw: 100,
            boosted: 100,
        };
    }

    let (core, provider_informed) = match provider_core_accuracy(&target_clean, result) {
        Some(core) => (core, true),
        None => (core_word_accuracy(&target_clean, &spoken_clean), false),
    };
    let stress = stress_pattern_accuracy(&target_clean, &spoken_clean);
    let syllable = syllable_accuracy(&target_clean, &spoken_clean);
    let accent_bonus = accent_tolerance_bonus(&target_clean, &spoken_clean);

    let weighted = core * CORE_WEIGHT + stress * STRESS_WEIGHT + syllable * SYLLABLE_WEIGHT;
    let raw = ((weighted + accent_bonus).clamp(0.0, 100.0).round() as u8).min(NON_EXACT_CEILING);
    let boosted = boost_score(raw);

    let breakdown = ScoreBreakdown {
        core,
        stress,
        syllable,
        accent_bonus,
        provider_informed,
        raw,
        boosted,
    };

    debug!(word = %target_clean, spoken = %spoken_clean, ?breakdown, "Scored attempt");

    breakdown
}

/// Raw accuracy of a plain transcript (no provider confidence)
pub fn raw_accuracy(target: &str, transcript: &str) -> u8 {
    score_attempt(target, &ProviderResult::from_transcript(transcript)).raw
}

/// `max(jaro_winkler, substring containment) * 100`
pub fn lenient_similarity(a: &str, b: &str) -> f64 {
    jaro_winkler_similarity(a, b).max(substring_containment_ratio(a, b)) * 100.0
}

/// Similarity of the accent-normal forms, 95 when they agree
pub fn core_word_accuracy(target: &str, spoken: &str) -> f64 {
    let target_norm = normalize_for_accents(target);
    let spoken_norm = normalize_for_accents(spoken);

    if target_norm == spoken_norm {
        NORMALIZED_MATCH_SCORE
    } else {
        lenient_similarity(&target_norm, &spoken_norm) * SIMILARITY_SCALE
    }
}

/// Core term blended from provider confidence, or `None` without confidence data
///
/// `match * (0.60 * confidence + 0.25 * word_confidence + 0.15)` where `match`
/// is 100 for agreeing normal forms and lenient similarity otherwise.
pub fn provider_core_accuracy(target: &str, result: &ProviderResult) -> Option<f64> {
    if !result.has_confidence_data() {
        return None;
    }

    let confidence = f64::from(result.overall_confidence()?);
    let word_confidence = target_word_confidence(target, result)
        .map(f64::from)
        .unwrap_or(confidence);

    let target_norm = normalize_for_accents(target);
    let spoken_norm = normalize_for_accents(&result.transcript);
    let match_score = if target_norm == spoken_norm {
        100.0
    } else {
        lenient_similarity(&target_norm, &spoken_norm)
    };

    let blend = PROVIDER_CONFIDENCE_WEIGHT * confidence
        + WORD_CONFIDENCE_WEIGHT * word_confidence
        + TRANSCRIPT_WEIGHT;

    Some((match_score * blend).clamp(0.0, 100.0))
}

/// Confidence of the recognized word closest to the target
fn target_word_confidence(target: &str, result: &ProviderResult) -> Option<f32> {
    let target_norm = normalize_for_accents(target);

    result
        .words
        .iter()
        .filter_map(|w| {
            let confidence = w.confidence?;
            let similarity = jaro_winkler_similarity(&target_norm, &normalize_for_accents(&w.word));
            Some((similarity, confidence))
        })
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, confidence)| confidence)
}

/// LCS similarity of the vowel-letter sequences
///
/// Floored at 60 for any attempt with vowels on both sides, and 50 when either
/// side has none.
pub fn stress_pattern_accuracy(target: &str, spoken: &str) -> f64 {
    let target_vowels = vowel_sequence(target);
    let spoken_vowels = vowel_sequence(spoken);

    if target_vowels.is_empty() || spoken_vowels.is_empty() {
        return STRESS_NO_VOWELS;
    }

    let lcs = longest_common_subsequence(&target_vowels, &spoken_vowels);
    let longest = target_vowels.len().max(spoken_vowels.len());

    (lcs as f64 / longest as f64 * 100.0).max(STRESS_FLOOR)
}

pub fn syllable_accuracy(target: &str, spoken: &str) -> f64 {
    let target_count = estimate_syllable_count(target);
    let spoken_count = estimate_syllable_count(spoken);
    let diff = target_count.abs_diff(spoken_count);

    match diff {
        0 => 100.0,
        1 => SYLLABLE_OFF_BY_ONE,
        _ => {
            let most = target_count.max(spoken_count) as f64;
            (100.0 - (diff as f64 / most) * 50.0).max(SYLLABLE_FLOOR)
        }
    }
}

/// Bonus (0-25) for transcripts explained by dialectal substitutions
pub fn accent_tolerance_bonus(target: &str, spoken: &str) -> f64 {
    let mut bonus = 0.0;

    if matches_under_accent_rule(target, spoken) {
        bonus += ACCENT_RULE_BONUS;
    }
    if length_similarity(target, spoken) > LENGTH_BONUS_THRESHOLD {
        bonus += LENGTH_BONUS;
    }
    if character_containment_ratio(target, spoken) > CONTAINMENT_BONUS_THRESHOLD {
        bonus += CONTAINMENT_BONUS;
    }

    f64::min(bonus, ACCENT_BONUS_CAP)
}

/// Whether one accent rule applied to either side makes the words equal
pub fn matches_under_accent_rule(target: &str, spoken: &str) -> bool {
    let by_rule = ACCENT_RULES.iter().any(|rule| {
        rule.apply(target).as_deref() == Some(spoken)
            || rule.apply(spoken).as_deref() == Some(target)
    });

    by_rule || differs_by_single_vowel(target, spoken)
}

fn differs_by_single_vowel(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len() != b.len() {
        return false;
    }

    let mut diffs = a.iter().zip(&b).filter(|(x, y)| x != y);
    match (diffs.next(), diffs.next()) {
        (Some((x, y)), None) => VOWELS.contains(x) && VOWELS.contains(y),
        _ => false,
    }
}

/// Encouragement transform
///
/// Piecewise linear and monotonic non-decreasing. Every raw score of 20 or more
/// lands at 45 or higher, and no boosted score is below its raw score.
///
/// | raw      | boosted                  |
/// |----------|--------------------------|
/// | < 20     | unchanged                |
/// | [20, 30) | 45 + 0.5 * (raw - 20)    |
/// | [30, 40) | 50 + 1.5 * (raw - 30)    |
/// | [40, 70) | 65 + 2/3 * (raw - 40)    |
/// | [70, 85) | 85 + 7/15 * (raw - 70)   |
/// | >= 85    | 92 + 8/15 * (raw - 85)   |
pub fn boost_score(raw: u8) -> u8 {
    let r = f64::from(raw.min(100));

    let boosted = if raw < BOOST_THRESHOLD {
        r
    } else if raw < 30 {
        45.0 + 0.5 * (r - 20.0)
    } else if raw < 40 {
        50.0 + 1.5 * (r - 30.0)
    } else if raw < 70 {
        65.0 + (20.0 / 30.0) * (r - 40.0)
    } else if raw < 85 {
        85.0 + (7.0 / 15.0) * (r - 70.0)
    } else {
        92.0 + (8.0 / 15.0) * (r - 85.0)
    };

    boosted.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WordTiming;

    #[test]
    fn test_exact_match_is_100() {
        for word in ["banana", "cat", "strawberry", "Rhythm", "psst"] {
            let breakdown = score_attempt(word, &ProviderResult::from_transcript(word));
            assert_eq!(breakdown.raw, 100, "{word}");
            assert_eq!(breakdown.boosted, 100, "{word}");
        }
    }

    #[test]
    fn test_exact_match_ignores_case_and_punctuation() {
        assert_eq!(raw_accuracy("banana", "Banana."), 100);
        assert_eq!(raw_accuracy("ice cream", "icecream"), 100);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        assert_eq!(raw_accuracy("cat", ""), 0);
        assert_eq!(raw_accuracy("", "cat"), 0);
        assert_eq!(raw_accuracy("cat", "?!"), 0);
        assert_eq!(score_attempt("cat", &ProviderResult::default()).boosted, 0);
    }

    #[test]
    fn test_one_letter_off_is_between_0_and_100() {
        for (target, spoken) in [("cat", "bat"), ("dog", "dig"), ("house", "mouse")] {
            let raw = raw_accuracy(target, spoken);
            assert!(raw > 0 && raw < 100, "{target}/{spoken} -> {raw}");
        }
    }

    #[test]
    fn test_closer_transcript_scores_higher() {
        let close = raw_accuracy("computer", "komputer");
        let far = raw_accuracy("computer", "xyz");
        assert!(close > far, "{close} <= {far}");
    }

    #[test]
    fn test_raw_score_never_rises_as_transcript_degrades() {
        let ladder = ["computer", "komputer", "kompuxer", "xyz"];
        let scores: Vec<u8> = ladder.iter().map(|t| raw_accuracy("computer", t)).collect();

        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1], "{ladder:?} scored {scores:?}");
        }
        assert!(scores[0] > scores[3]);
    }

    #[test]
    fn test_r_dropping_gets_accent_bonus() {
        let breakdown = score_attempt("strawberry", &ProviderResult::from_transcript("stawbewy"));
        assert!(breakdown.accent_bonus > 0.0);
        assert!(breakdown.raw >= 70, "raw = {}", breakdown.raw);
        assert!(breakdown.raw < 100);
    }

    #[test]
    fn test_accent_rule_matching() {
        assert!(matches_under_accent_rule("three", "free"));
        assert!(matches_under_accent_rule("free", "three"));
        assert!(matches_under_accent_rule("car", "ca"));
        assert!(matches_under_accent_rule("very", "wery"));
        assert!(matches_under_accent_rule("zoo", "soo"));
        assert!(matches_under_accent_rule("jam", "yam"));
        assert!(matches_under_accent_rule("bit", "bet"));
        assert!(!matches_under_accent_rule("cat", "dog"));
        assert!(!matches_under_accent_rule("bit", "bot2"));
    }

    #[test]
    fn test_accent_bonus_capped() {
        // rule match + length + containment would be 30
        assert_eq!(accent_tolerance_bonus("very", "wery"), 25.0);
        assert_eq!(accent_tolerance_bonus("cat", "bubbling"), 0.0);
    }

    #[test]
    fn test_syllable_accuracy_table() {
        assert_eq!(syllable_accuracy("banana", "bandana"), 100.0);
        assert_eq!(syllable_accuracy("banana", "bana"), 85.0);
        // 1 vs 4 syllables: 100 - 3/4 * 50 = 62.5
        assert_eq!(syllable_accuracy("cat", "watermelon"), 62.5);
    }

    #[test]
    fn test_stress_pattern_floors() {
        assert_eq!(stress_pattern_accuracy("psst", "banana"), 50.0);
        assert_eq!(stress_pattern_accuracy("banana", "banana"), 100.0);
        assert_eq!(stress_pattern_accuracy("banana", "toot"), 60.0);
    }

    #[test]
    fn test_core_normalized_match() {
        assert_eq!(core_word_accuracy("phone", "fone"), 95.0);
        assert!(core_word_accuracy("phone", "table") < 95.0);
    }

    #[test]
    fn test_provider_confidence_exact_match_short_circuits() {
        let result = ProviderResult::from_transcript("banana").with_confidence(0.95);
        let breakdown = score_attempt("banana", &result);
        assert_eq!(breakdown.raw, 100);
        assert!(!breakdown.provider_informed);
    }

    #[test]
    fn test_provider_path_selected_only_with_confidence() {
        let plain = score_attempt("phone", &ProviderResult::from_transcript("fone"));
        assert!(!plain.provider_informed);

        let confident = score_attempt(
            "phone",
            &ProviderResult::from_transcript("fone").with_confidence(0.9),
        );
        assert!(confident.provider_informed);
        // 100 * (0.6 * 0.9 + 0.25 * 0.9 + 0.15)
        assert!((confident.core - 91.5).abs() < 1e-3);
    }

    #[test]
    fn test_provider_word_confidence_used() {
        let result = ProviderResult::from_transcript("fone").with_words(vec![WordTiming {
            word: "fone".to_string(),
            confidence: Some(0.4),
            start_time: 0.0,
            end_time: 0.5,
        }]);

        // overall falls back to the word mean: 100 * (0.6 * 0.4 + 0.25 * 0.4 + 0.15)
        let core = provider_core_accuracy("phone", &result).unwrap();
        assert!((core - 49.0).abs() < 1e-4);
    }

    #[test]
    fn test_boost_table() {
        assert_eq!(boost_score(0), 0);
        assert_eq!(boost_score(19), 19);
        assert_eq!(boost_score(20), 45);
        assert_eq!(boost_score(30), 50);
        assert_eq!(boost_score(40), 65);
        assert_eq!(boost_score(70), 85);
        assert_eq!(boost_score(85), 92);
        assert_eq!(boost_score(100), 100);
        assert_eq!(boost_score(98), 99);
    }

    #[test]
    fn test_boost_monotonic_and_never_below_raw() {
        let mut previous = 0;
        for raw in 0..=100u8 {
            let boosted = boost_score(raw);
            assert!(boosted >= previous, "not monotonic at {raw}");
            assert!(boosted <= 100);
            assert!(boosted >= raw, "boost below raw at {raw}");
            if raw >= BOOST_THRESHOLD {
                assert!(boosted >= 45);
            }
            previous = boosted;
        }
    }

    #[test]
    fn test_boost_caps_per_band() {
        assert!((30..40).all(|r| boost_score(r) <= 65));
        assert!((40..70).all(|r| boost_score(r) <= 85));
        assert!((70..85).all(|r| boost_score(r) <= 92));
    }
}
