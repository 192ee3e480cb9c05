//! Qualitative feedback for a scored attempt
//!
//! Everything here is informational and never changes the numeric score.

use crate::phonetic::{clean_word, estimate_syllable_count, normalize_for_accents};
use crate::similarity::jaro_winkler_similarity;
use crate::types::{PronunciationAnalysis, ProviderResult, QualityTier, WordTiming};

/// Minimum score for each tier, highest first
pub const QUALITY_TIERS: &[(u8, QualityTier)] = &[
    (90, QualityTier::Excellent),
    (80, QualityTier::Good),
    (50, QualityTier::Fair),
    (0, QualityTier::NeedsImprovement),
];

/// Scores below this always get a suggestion
const SUGGESTION_THRESHOLD: u8 = 80;

/// Provider word confidence below which a word counts as unclear
const UNCLEAR_WORD_CONFIDENCE: f32 = 0.6;

/// Provider confidence at or above which recognition counts as confident
const CONFIDENT_RECOGNITION: f32 = 0.8;

const RUSHED_WORD_MS: u64 = 150;
const DRAWN_OUT_WORD_MS: u64 = 2000;

pub fn quality_tier(score: u8) -> QualityTier {
    QUALITY_TIERS
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, tier)| *tier)
        .unwrap_or(QualityTier::NeedsImprovement)
}

/// What went wrong, in priority order for picking a suggestion
#[derive(Debug, Clone, PartialEq)]
enum Issue {
    NoSpeech,
    Opening { expected: char, heard: char },
    Ending { expected: char, heard: char },
    Syllables { expected: usize, heard: usize },
    MissingSounds(Vec<char>),
    ExtraSounds,
    Rushed,
    DrawnOut,
    Unclear { word: String, confidence: f32 },
}

impl Issue {
    fn describe(&self) -> String {
        match self {
            Self::NoSpeech => "No speech was detected".to_string(),
            Self::Opening { expected, heard } => {
                format!("The opening sound differs: expected '{expected}', heard '{heard}'")
            }
            Self::Ending { expected, heard } => {
                format!("The ending sound differs: expected '{expected}', heard '{heard}'")
            }
            Self::Syllables { expected, heard } => {
                format!("Heard {heard} {}, expected {expected}", plural(*heard, "syllable"))
            }
            Self::MissingSounds(letters) => {
                let letters: Vec<String> = letters.iter().map(|c| format!("'{c}'")).collect();
                format!("Some sounds were missing: {}", letters.join(", "))
            }
            Self::ExtraSounds => "Extra sounds were added to the word".to_string(),
            Self::Rushed => "The word was rushed".to_string(),
            Self::DrawnOut => "The word was drawn out".to_string(),
            Self::Unclear { word, confidence } => format!(
                "'{word}' was unclear ({:.0}% confidence)",
                confidence * 100.0
            ),
        }
    }

    fn suggestion(&self, target: &str) -> String {
        match self {
            Self::NoSpeech if target.trim().is_empty() => {
                "Speak clearly and close to the microphone, then try again".to_string()
            }
            Self::NoSpeech => {
                format!("Speak clearly and close to the microphone, then say \"{target}\" again")
            }
            Self::Opening { expected, .. } => {
                format!("Focus on the first sound: start with '{expected}'")
            }
            Self::Ending { expected, .. } => {
                format!("Finish the word fully, ending on '{expected}'")
            }
            Self::Syllables { expected, .. } => format!(
                "Break \"{target}\" into {expected} {} and say each one",
                plural(*expected, "syllable")
            ),
            Self::MissingSounds(letters) => match letters.first() {
                Some(c) => format!("Sound out every letter, especially '{c}'"),
                None => "Sound out every letter".to_string(),
            },
            Self::ExtraSounds => format!("Say only \"{target}\", without adding sounds"),
            Self::Rushed => "Say the word a little more slowly".to_string(),
            Self::DrawnOut => "Try a steadier, more natural pace".to_string(),
            Self::Unclear { .. } => "Speak a little louder and more clearly".to_string(),
        }
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

/// Build the analysis for an attempt
///
/// `provider` adds confidence and timing observations when the backend
/// reported them.
pub fn analyze(
    target: &str,
    transcript: &str,
    score: u8,
    provider: Option<&ProviderResult>,
) -> PronunciationAnalysis {
    let target_clean = clean_word(target);
    let spoken_clean = clean_word(transcript);
    // nothing to compare when either side is empty
    let empty_input = target_clean.is_empty() || spoken_clean.is_empty();

    let issues = if empty_input {
        vec![Issue::NoSpeech]
    } else if score >= 100 {
        Vec::new()
    } else {
        let mut issues = compare_words(&target_clean, &spoken_clean);
        if let Some(result) = provider {
            issues.extend(provider_issues(&target_clean, result));
        }
        issues
    };

    let mut strengths = if empty_input {
        Vec::new()
    } else {
        find_strengths(target, &target_clean, &spoken_clean, score, provider)
    };
    if strengths.is_empty() {
        strengths.push("Good effort. Every attempt builds confidence".to_string());
    }

    let suggestions = if score >= 100 {
        Vec::new()
    } else if let Some(first) = issues.first() {
        vec![first.suggestion(target)]
    } else if score < SUGGESTION_THRESHOLD {
        vec!["Listen to the example and repeat it slowly".to_string()]
    } else {
        Vec::new()
    };

    PronunciationAnalysis {
        overall_quality: quality_tier(score),
        specific_issues: issues.iter().map(Issue::describe).collect(),
        strengths,
        suggestions,
    }
}

fn compare_words(target: &str, spoken: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    let (t_first, s_first) = (target.chars().next(), spoken.chars().next());
    if let (Some(expected), Some(heard)) = (t_first, s_first)
        && expected != heard
        && normalize_for_accents(&expected.to_string()) != normalize_for_accents(&heard.to_string())
    {
        issues.push(Issue::Opening { expected, heard });
    }

    let (t_last, s_last) = (target.chars().next_back(), spoken.chars().next_back());
    if let (Some(expected), Some(heard)) = (t_last, s_last)
        && expected != heard
    {
        issues.push(Issue::Ending { expected, heard });
    }

    let expected = estimate_syllable_count(target);
    let heard = estimate_syllable_count(spoken);
    if expected != heard {
        issues.push(Issue::Syllables { expected, heard });
    }

    let missing = missing_letters(target, spoken);
    if !missing.is_empty() {
        issues.push(Issue::MissingSounds(missing));
    }

    if spoken.chars().count() >= target.chars().count() + 2 {
        issues.push(Issue::ExtraSounds);
    }

    issues
}

/// Distinct target letters not present in the spoken word, in target order
fn missing_letters(target: &str, spoken: &str) -> Vec<char> {
    let mut missing: Vec<char> = Vec::new();
    for c in target.chars() {
        if !spoken.contains(c) && !missing.contains(&c) {
            missing.push(c);
        }
    }
    missing
}

fn closest_word<'a>(target: &str, words: &'a [WordTiming]) -> Option<&'a WordTiming> {
    words.iter().max_by(|a, b| {
        let sa = jaro_winkler_similarity(target, &clean_word(&a.word));
        let sb = jaro_winkler_similarity(target, &clean_word(&b.word));
        sa.total_cmp(&sb)
    })
}

fn provider_issues(target: &str, result: &ProviderResult) -> Vec<Issue> {
    let mut issues = Vec::new();

    if let Some(word) = closest_word(target, &result.words) {
        let duration = word.duration_ms();
        if duration > 0 && duration < RUSHED_WORD_MS {
            issues.push(Issue::Rushed);
        } else if duration > DRAWN_OUT_WORD_MS {
            issues.push(Issue::DrawnOut);
        }
    }

    for word in &result.words {
        if let Some(confidence) = word.confidence
            && confidence < UNCLEAR_WORD_CONFIDENCE
        {
            issues.push(Issue::Unclear {
                word: word.word.clone(),
                confidence,
            });
        }
    }

    issues
}

fn find_strengths(
    target: &str,
    target_clean: &str,
    spoken_clean: &str,
    score: u8,
    provider: Option<&ProviderResult>,
) -> Vec<String> {
    let mut strengths = Vec::new();

    if score >= 90 {
        strengths.push(format!("Clear pronunciation of \"{target}\""));
    }
    if target_clean.chars().next() == spoken_clean.chars().next() {
        strengths.push("Strong start: the opening sound was right".to_string());
    }
    if target_clean.chars().next_back() == spoken_clean.chars().next_back() {
        strengths.push("Clean finish on the final sound".to_string());
    }

    let syllables = estimate_syllable_count(target_clean);
    if syllables == estimate_syllable_count(spoken_clean) {
        strengths.push(format!(
            "Correct rhythm with {syllables} {}",
            plural(syllables, "syllable")
        ));
    }

    if provider
        .and_then(ProviderResult::overall_confidence)
        .is_some_and(|c| c >= CONFIDENT_RECOGNITION)
    {
        strengths.push("Spoken clearly enough for confident recognition".to_string());
    }

    strengths
}

/// Short learner-facing message for the attempt
pub fn feedback_message(target: &str, transcript: &str, score: u8) -> String {
    if clean_word(target).is_empty() {
        return "We couldn't hear a word to score. Try again.".to_string();
    }
    if clean_word(transcript).is_empty() {
        return format!("We couldn't hear you. Try saying \"{target}\" again.");
    }

    match quality_tier(score) {
        QualityTier::Excellent => format!("Excellent! \"{target}\" sounded great."),
        QualityTier::Good => format!("Good job! \"{target}\" is nearly there."),
        QualityTier::Fair => format!("Not bad! Keep practicing \"{target}\"."),
        QualityTier::NeedsImprovement => {
            format!("Keep trying! Listen to \"{target}\" and give it another go.")
        }
    }
}
