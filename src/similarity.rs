//! String similarity metrics
//!
//! Pure functions over strings and token sequences. Empty inputs never panic:
//! two empty strings are treated as a perfect match (similarity 1.0, distance 0),
//! and an empty string against a non-empty one has similarity 0.0.

use std::collections::HashMap;

/// Maximum prefix length rewarded by Jaro-Winkler
const WINKLER_PREFIX_CAP: usize = 4;

/// Prefix scaling factor for Jaro-Winkler
const WINKLER_SCALING: f64 = 0.1;

/// Classic edit distance with unit insertion, deletion and substitution costs
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Jaro similarity in [0, 1]
///
/// Matching window is `floor(max_len / 2) - 1`; half-transpositions are counted
/// among matched characters that appear out of order.
pub fn jaro_similarity(a: &str, b: &str) -> f64 {
    strsim::jaro(a, b)
}

/// Jaro-Winkler similarity in [0, 1]
///
/// Unlike `strsim::jaro_winkler`, the prefix bonus is applied at every Jaro
/// level, not only above 0.7.
pub fn jaro_winkler_similarity(a: &str, b: &str) -> f64 {
    let jaro = jaro_similarity(a, b);
    let prefix = common_prefix_len(a, b).min(WINKLER_PREFIX_CAP);

    (jaro + WINKLER_SCALING * prefix as f64 * (1.0 - jaro)).clamp(0.0, 1.0)
}

/// Length of the longest common subsequence of two token sequences
pub fn longest_common_subsequence<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for item in a {
        for j in 1..=b.len() {
            curr[j] = if *item == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Number of leading characters shared by both strings
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Ratio of the shorter string's length to the longer one when one contains the other
///
/// Returns 0.0 when neither string is a substring of the other.
pub fn substring_containment_ratio(a: &str, b: &str) -> f64 {
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    if a_len == 0 && b_len == 0 {
        return 1.0;
    }
    if a_len == 0 || b_len == 0 {
        return 0.0;
    }

    let (shorter, longer, short_len, long_len) = if a_len <= b_len {
        (a, b, a_len, b_len)
    } else {
        (b, a, b_len, a_len)
    };

    if longer.contains(shorter) {
        short_len as f64 / long_len as f64
    } else {
        0.0
    }
}

/// Fraction of `target` characters found in `spoken`, each spoken character used once
pub fn character_containment_ratio(target: &str, spoken: &str) -> f64 {
    let target_len = target.chars().count();
    if target_len == 0 {
        return if spoken.is_empty() { 1.0 } else { 0.0 };
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in spoken.chars() {
        *available.entry(c).or_insert(0) += 1;
    }

    let found = target
        .chars()
        .filter(|c| match available.get_mut(c) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        })
        .count();

    found as f64 / target_len as f64
}

/// Ratio of the shorter length to the longer length
pub fn length_similarity(a: &str, b: &str) -> f64 {
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    let longest = a_len.max(b_len);
    if longest == 0 {
        return 1.0;
    }

    a_len.min(b_len) as f64 / longest as f64
}
