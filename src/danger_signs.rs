// Newborn danger-sign catalog and symptom classifier
// File: src/danger_signs.rs

use crate::fuzzy::extract_one;
use crate::settings::MatchSettings;
use crate::text::{normalize, split_clauses};
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Severity of a danger sign, ordered from least to most severe
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Advice,
    Monitor,
    Urgent,
    Emergency,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Advice => "advice",
            Urgency::Monitor => "monitor",
            Urgency::Urgent => "urgent",
            Urgency::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DangerSign {
    pub label: &'static str,
    pub advice: &'static str,
    pub urgency: Urgency,
    pub synonyms: &'static [&'static str],
}

pub const DANGER_SIGNS: &[DangerSign] = &[
    DangerSign {
        label: "fever",
        advice: "Your baby has a fever. In newborns this can be serious. Seek medical attention immediately.",
        urgency: Urgency::Urgent,
        synonyms: &["hot body", "high temperature", "temperature"],
    },
    DangerSign {
        label: "breathing difficulty",
        advice: "Difficulty breathing can be an emergency. Seek emergency care now.",
        urgency: Urgency::Emergency,
        synonyms: &[
            "trouble breathing",
            "hard to breathe",
            "respiratory distress",
            "grunting",
        ],
    },
    DangerSign {
        label: "blue lips",
        advice: "Bluish lips/tongue may signal poor oxygen levels and possible heart or lung issues. Go to emergency care.",
        urgency: Urgency::Emergency,
        synonyms: &["cyanosis", "bluish lips", "purple lips", "blue tongue"],
    },
    DangerSign {
        label: "poor feeding",
        advice: "Poor feeding or weak sucking can be concerning. Seek clinical evaluation today.",
        urgency: Urgency::Urgent,
        synonyms: &["not feeding", "refusing feeds", "weak suck"],
    },
];

/// Words and phrases that hint at a heart problem in a newborn
pub const CARDIAC_KEYWORDS: &[&str] = &[
    "blue",
    "cyanosis",
    "murmur",
    "sweating while feeding",
    "sweaty",
    "poor feeding",
    "fast breathing",
    "breathing difficulty",
    "heart",
    "chest retractions",
];

static CARDIAC_KEYWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| CARDIAC_KEYWORDS.iter().copied().collect());

/// Looks up a danger sign by its canonical label
pub fn find_sign(label: &str) -> Option<&'static DangerSign> {
    DANGER_SIGNS.iter().find(|sign| sign.label == label)
}

/// Flat list of every label and synonym, each paired with its owning sign
pub struct SymptomVocabulary {
    surfaces: Vec<&'static str>,
    owners: Vec<&'static DangerSign>,
}

impl SymptomVocabulary {
    pub fn new(catalog: &'static [DangerSign]) -> Self {
        let mut surfaces = Vec::new();
        let mut owners = Vec::new();

        for sign in catalog {
            surfaces.push(sign.label);
            owners.push(sign);
            for synonym in sign.synonyms {
                surfaces.push(*synonym);
                owners.push(sign);
            }
        }

        debug!("Built symptom vocabulary with {} entries", surfaces.len());

        Self { surfaces, owners }
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Best vocabulary entry for a clause: (surface, owning sign, score)
    pub fn best_match(&self, clause: &str) -> Option<(&'static str, &'static DangerSign, u8)> {
        extract_one(clause, &self.surfaces)
            .map(|(idx, score)| (self.surfaces[idx], self.owners[idx], score))
    }
}

static VOCABULARY: Lazy<SymptomVocabulary> = Lazy::new(|| SymptomVocabulary::new(DANGER_SIGNS));

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassificationResult {
    pub matched_labels: Vec<String>,
    pub worst_urgency: Urgency,
    pub advice_messages: Vec<String>,
}

impl ClassificationResult {
    pub fn is_empty(&self) -> bool {
        self.matched_labels.is_empty()
    }
}

/// Classifies free text with the default thresholds
pub fn classify_symptoms(text: &str) -> ClassificationResult {
    classify_symptoms_with(text, &MatchSettings::default())
}

/// Classifies free text into danger signs
///
/// Each clause is matched independently against the vocabulary and contributes
/// at most one sign. Signs are reported in the order they were first matched,
/// and the urgency is the most severe among them (`Advice` when nothing matched).
pub fn classify_symptoms_with(text: &str, settings: &MatchSettings) -> ClassificationResult {
    let normalized = normalize(text);
    let mut result = ClassificationResult::default();

    for clause in split_clauses(&normalized) {
        let Some((surface, sign, score)) = VOCABULARY.best_match(clause) else {
            continue;
        };

        if score < settings.symptom_threshold {
            debug!("Clause below threshold ({} < {})", score, settings.symptom_threshold);
            continue;
        }

        debug!("Clause matched '{}' -> {} (score {})", surface, sign.label, score);

        if !result.matched_labels.iter().any(|l| l == sign.label) {
            result.matched_labels.push(sign.label.to_string());
            result.advice_messages.push(sign.advice.to_string());
        }
    }

    result.worst_urgency = result
        .matched_labels
        .iter()
        .filter_map(|label| find_sign(label))
        .map(|sign| sign.urgency)
        .max()
        .unwrap_or_default();

    result
}

/// Whether the matched signs or the raw text suggest a cardiac cause
///
/// Exact containment only: a matched label must be a keyword, or a keyword must
/// appear in the normalized text.
pub fn looks_cardiac<S: AsRef<str>>(matched_labels: &[S], raw_text: &str) -> bool {
    if matched_labels
        .iter()
        .any(|label| CARDIAC_KEYWORD_SET.contains(label.as_ref()))
    {
        return true;
    }

    let raw = normalize(raw_text);
    CARDIAC_KEYWORDS.iter().any(|keyword| raw.contains(keyword))
}
