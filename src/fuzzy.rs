//! Weighted string similarity on a 0-100 scale.
//!
//! The scorer combines a plain edit-distance ratio with partial (substring)
//! and token (word order) variants, so "body hot" still finds "hot body" and
//! "baby has fever" still finds "fever".

use strsim::normalized_levenshtein;

/// Length ratio above which partial (substring) alignment is considered
const PARTIAL_LENGTH_RATIO: f64 = 1.5;

/// Length ratio above which partial alignment is heavily discounted
const LONG_LENGTH_RATIO: f64 = 8.0;

const TOKEN_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Plain normalized Levenshtein similarity
pub fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Best `ratio` of the shorter string against every equal-length window of the longer one
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = shorter.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let longer_chars: Vec<char> = longer.chars().collect();
    let mut best = 0.0_f64;

    for window in longer_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        let score = ratio(shorter, &candidate);
        if score > best {
            best = score;
            // Early exit for exact substring
            if best >= 100.0 {
                break;
            }
        }
    }

    best
}

fn sorted_tokens(text: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens
}

fn join_sorted(text: &str) -> String {
    sorted_tokens(text).join(" ")
}

/// `ratio` after sorting the words of both sides
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&join_sorted(a), &join_sorted(b))
}

/// Compares the shared words of both sides against each side's remainder
///
/// Scores 100 whenever the words of one side are a subset of the other's.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = sorted_tokens(a);
    let tokens_b = sorted_tokens(b);

    let intersection: Vec<&str> = tokens_a
        .iter()
        .filter(|t| tokens_b.contains(t))
        .copied()
        .collect();
    let diff_a: Vec<&str> = tokens_a
        .iter()
        .filter(|t| !tokens_b.contains(t))
        .copied()
        .collect();
    let diff_b: Vec<&str> = tokens_b
        .iter()
        .filter(|t| !tokens_a.contains(t))
        .copied()
        .collect();

    if !intersection.is_empty() && (diff_a.is_empty() || diff_b.is_empty()) {
        return 100.0;
    }

    let sect = intersection.join(" ");
    let combined_a = [intersection.as_slice(), diff_a.as_slice()].concat().join(" ");
    let combined_b = [intersection.as_slice(), diff_b.as_slice()].concat().join(" ");

    let mut best = ratio(&combined_a, &combined_b);
    if !sect.is_empty() {
        best = best
            .max(ratio(&sect, &combined_a))
            .max(ratio(&sect, &combined_b));
    }
    best
}

/// Weighted similarity of two already-normalized strings, 0-100
///
/// Strings of similar length are compared whole and by word order; when one
/// side is at least 1.5x longer the shorter side is aligned against substrings
/// of the longer one instead, at a discount.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0;
    }

    let length_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let base = ratio(a, b);

    let score = if length_ratio < PARTIAL_LENGTH_RATIO {
        let token_score = token_sort_ratio(a, b).max(token_set_ratio(a, b));
        base.max(token_score * TOKEN_SCALE)
    } else {
        let scale = if length_ratio < LONG_LENGTH_RATIO {
            PARTIAL_SCALE
        } else {
            LONG_PARTIAL_SCALE
        };
        let partial = partial_ratio(a, b) * scale;
        let partial_token = partial_ratio(&join_sorted(a), &join_sorted(b)) * TOKEN_SCALE * scale;
        base.max(partial).max(partial_token)
    };

    score.round().clamp(0.0, 100.0) as u8
}

/// Best match of `query` among `choices`
///
/// Returns the index of the best choice and its score. Ties keep the earliest
/// choice; a perfect score stops the search. `None` when there are no choices.
pub fn extract_one<S: AsRef<str>>(query: &str, choices: &[S]) -> Option<(usize, u8)> {
    let mut best: Option<(usize, u8)> = None;

    for (idx, choice) in choices.iter().enumerate() {
        let score = weighted_ratio(query, choice.as_ref());
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((idx, score));
            if score == 100 {
                break;
            }
        }
    }

    best
}
