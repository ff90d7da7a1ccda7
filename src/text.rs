use once_cell::sync::Lazy;
use regex::Regex;

// Pre-compiled patterns (compiled once, used for every query)
static WHITESPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static CLAUSE_DELIMITER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;&]|\band\b").unwrap());

static NAME_PUNCTUATION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Abbreviations commonly found in crowd-sourced hospital names
const FACILITY_ABBREVIATIONS: &[(&str, &str)] = &[
    ("hosp", "hospital"),
    ("natl", "national"),
    ("univ", "university"),
    ("ctr", "centre"),
    ("ref", "referral"),
];

/// Normalizes free text for matching
///
/// Trims the input, collapses every run of whitespace into a single space and
/// lowercases everything. Never fails.
///
/// # Examples
/// - `"  Blue   LIPS "` → `"blue lips"`
/// - `"hot\tbody\n"` → `"hot body"`
pub fn normalize(text: &str) -> String {
    WHITESPACE_PATTERN
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Splits already-normalized text into symptom clauses
///
/// Clauses are separated by commas, semicolons, `&` or the standalone word
/// "and". Empty clauses are dropped.
pub fn split_clauses(normalized: &str) -> Vec<&str> {
    CLAUSE_DELIMITER_PATTERN
        .split(normalized)
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .collect()
}

/// Normalizes a hospital name before fuzzy comparison
///
/// Apostrophes are dropped ("Gertrude's" → "gertrudes"), remaining punctuation
/// becomes whitespace and common abbreviations are expanded so that
/// "Kenyatta Natl Hosp." compares equal to "Kenyatta National Hospital".
pub fn normalize_facility_name(name: &str) -> String {
    let lowered = normalize(name).replace(['\'', '\u{2019}'], "");
    let spaced = NAME_PUNCTUATION_PATTERN.replace_all(&lowered, " ");

    spaced
        .split_whitespace()
        .map(|token| {
            FACILITY_ABBREVIATIONS
                .iter()
                .find(|(short, _)| *short == token)
                .map(|(_, long)| *long)
                .unwrap_or(token)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes text for inclusion in an HTML popup
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Blue   LIPS "), "blue lips");
        assert_eq!(normalize("hot\tbody\n"), "hot body");
        assert_eq!(normalize("Weak\r\n  Suck"), "weak suck");
    }

    #[test]
    fn test_normalize_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("  Hard TO   breathe ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_split_clauses_on_delimiters() {
        assert_eq!(
            split_clauses("hot body, weak suck; grunting & blue lips and fever"),
            vec!["hot body", "weak suck", "grunting", "blue lips", "fever"]
        );
    }

    #[test]
    fn test_split_clauses_keeps_words_containing_and() {
        assert_eq!(split_clauses("hand is cold"), vec!["hand is cold"]);
        assert_eq!(split_clauses("fever,and grunting"), vec!["fever", "grunting"]);
    }

    #[test]
    fn test_split_clauses_drops_empty() {
        assert!(split_clauses("").is_empty());
        assert!(split_clauses(" , ; & and ").is_empty());
    }

    #[test]
    fn test_normalize_facility_name() {
        assert_eq!(
            normalize_facility_name("Kenyatta Natl. Hosp"),
            "kenyatta national hospital"
        );
        assert_eq!(
            normalize_facility_name("Gertrude's Children's Hospital"),
            "gertrudes childrens hospital"
        );
        assert_eq!(
            normalize_facility_name("Kenyatta National Hospital (KNH)"),
            "kenyatta national hospital knh"
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>Tom & Jerry's</b>"),
            "&lt;b&gt;Tom &amp; Jerry&#39;s&lt;/b&gt;"
        );
    }
}
