//! Accent-tolerant normalization and synthetic mis-transcriptions
//!
//! Normalization collapses spelling-driven differences ("phone" vs "fone") so
//! scoring stays lenient. It is not a phonetic transcription.
//!
//! The variation generators pick one applicable [`Transformation`] at random.
//! Every transformation is deterministic; only the choice is random, and the
//! caller supplies the RNG so tests can seed it.

use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

/// Letters treated as vowels for syllable and stress heuristics
pub const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

static VOWEL_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[aeiouy]+").expect("valid vowel group pattern"));

/// Digraph reductions, applied in this order
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("ph", "f"),
    ("ck", "k"),
    ("qu", "kw"),
    ("x", "ks"),
    ("c", "k"),
    ("y", "i"),
];

/// Lowercase and drop everything that is not a letter or digit
pub fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn is_vowel(c: char) -> bool {
    VOWELS.contains(&c)
}

/// Map a word to an accent-tolerant normal form
///
/// Steps run in a fixed order: digraph reduction, double-letter collapse,
/// trailing silent `e` removal.
pub fn normalize_for_accents(word: &str) -> String {
    let mut normalized = clean_word(word);

    for (from, to) in SUBSTITUTIONS {
        normalized = normalized.replace(from, to);
    }

    let mut collapsed = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        if collapsed.chars().next_back() != Some(c) {
            collapsed.push(c);
        }
    }

    if ends_in_silent_e(&collapsed) && collapsed.chars().count() > 3 {
        collapsed.pop();
    }

    collapsed
}

/// Final `e` that follows a consonant
fn ends_in_silent_e(word: &str) -> bool {
    let mut tail = word.chars().rev();
    match (tail.next(), tail.next()) {
        (Some('e'), Some(prev)) => !is_vowel(prev),
        _ => false,
    }
}

/// Heuristic syllable count, always at least 1
pub fn estimate_syllable_count(word: &str) -> usize {
    let word = clean_word(word);
    let mut count = VOWEL_GROUPS.find_iter(&word).count();

    if count > 1 && ends_in_silent_e(&word) {
        count -= 1;
    }

    count.max(1)
}

/// The word's vowel letters in order
pub fn vowel_sequence(word: &str) -> Vec<char> {
    clean_word(word).chars().filter(|c| is_vowel(*c)).collect()
}

/// A deterministic rewrite producing a plausible mis-transcription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// Non-rhotic accents: "car" -> "ca"
    DropR,
    ThToD,
    ThToF,
    VToW,
    WToV,
    ZToS,
    JToY,
    /// First vowel moves to the next in a-e-i-o-u
    VowelShift,
    /// Keep the first two thirds of the word
    Truncate,
    Pluralize,
}

/// Dialectal substitutions the scorer forgives
pub const ACCENT_RULES: &[Transformation] = &[
    Transformation::DropR,
    Transformation::ThToD,
    Transformation::ThToF,
    Transformation::VToW,
    Transformation::WToV,
    Transformation::ZToS,
    Transformation::JToY,
];

const SLIGHT_VARIATIONS: &[Transformation] =
    &[Transformation::VowelShift, Transformation::Pluralize];

const COMMON_MISTAKES: &[Transformation] = &[
    Transformation::Truncate,
    Transformation::Pluralize,
    Transformation::ThToD,
];

impl Transformation {
    /// Apply to a cleaned word; `None` when the rule does not change it or empties it
    pub fn apply(self, word: &str) -> Option<String> {
        let out = match self {
            Self::DropR => word.replace('r', ""),
            Self::ThToD => word.replace("th", "d"),
            Self::ThToF => word.replace("th", "f"),
            Self::VToW => word.replace('v', "w"),
            Self::WToV => word.replace('w', "v"),
            Self::ZToS => word.replace('z', "s"),
            Self::JToY => word.replace('j', "y"),
            Self::VowelShift => shift_first_vowel(word)?,
            Self::Truncate => {
                let len = word.chars().count();
                if len <= 3 {
                    return None;
                }
                word.chars().take((len * 2).div_ceil(3)).collect()
            }
            Self::Pluralize => pluralize(word),
        };

        (!out.is_empty() && out != word).then_some(out)
    }
}

fn shift_first_vowel(word: &str) -> Option<String> {
    const CYCLE: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

    let (idx, vowel) = word.char_indices().find(|(_, c)| CYCLE.contains(c))?;
    let pos = CYCLE.iter().position(|v| *v == vowel)?;
    let next = CYCLE[(pos + 1) % CYCLE.len()];

    let mut shifted = String::with_capacity(word.len());
    shifted.push_str(&word[..idx]);
    shifted.push(next);
    shifted.push_str(&word[idx + vowel.len_utf8()..]);
    Some(shifted)
}

fn pluralize(word: &str) -> String {
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

/// All outputs reachable from `word` through the given rules
pub fn reachable_variations(word: &str, rules: &[Transformation]) -> Vec<String> {
    let word = clean_word(word);
    let mut out: Vec<String> = Vec::new();
    for rule in rules {
        if let Some(v) = rule.apply(&word)
            && !out.contains(&v)
        {
            out.push(v);
        }
    }
    out
}

fn generate_with<R: Rng + ?Sized>(word: &str, rules: &[Transformation], rng: &mut R) -> String {
    let candidates = reachable_variations(word, rules);
    candidates
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| clean_word(word))
}

/// Accent-driven variation ("three" -> "thee"/"dree"/"free"); the word itself if no rule applies
pub fn generate_accent_variation<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    generate_with(word, ACCENT_RULES, rng)
}

/// Near-miss variation: one vowel off or an added plural
pub fn generate_slight_variation<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    generate_with(word, SLIGHT_VARIATIONS, rng)
}

/// Typical learner mistake: cut short, pluralized, or "th" stopped to "d"
pub fn generate_common_mistake<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    generate_with(word, COMMON_MISTAKES, rng)
}

/// Every distinct accent variation of `word`
pub fn accent_variations(word: &str) -> Vec<String> {
    reachable_variations(word, ACCENT_RULES)
}

/// Every distinct near-miss variation of `word`
pub fn slight_variations(word: &str) -> Vec<String> {
    reachable_variations(word, SLIGHT_VARIATIONS)
}

/// Every distinct common-mistake variation of `word`
pub fn common_mistakes(word: &str) -> Vec<String> {
    reachable_variations(word, COMMON_MISTAKES)
}
