use crate::danger_signs::{classify_symptoms_with, looks_cardiac, ClassificationResult};
use crate::settings::AppSettings;
use crate::validation::validate_symptom_text;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub const DISCLAIMER: &str =
    "Educational aid - not a substitute for professional medical care. Seek care immediately if concerned.";

pub const NO_MATCH_MESSAGE: &str =
    "Couldn't confidently match danger signs. Seek care if concerned.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Assessment {
    #[serde(flatten)]
    pub classification: ClassificationResult,
    /// Default for the "specialty hospitals only" filter
    pub cardiac_suspected: bool,
}

impl Assessment {
    pub fn has_danger_signs(&self) -> bool {
        !self.classification.is_empty()
    }
}

pub fn check_symptoms(text: &str, settings: &AppSettings) -> Result<Assessment, String> {
    validate_symptom_text(text)?;
    debug!("Checking symptoms: {}", text);

    let classification = classify_symptoms_with(text, &settings.matching);
    let cardiac_suspected = looks_cardiac(&classification.matched_labels, text);

    info!(
        "Assessment: {} danger signs, urgency {}, cardiac={}",
        classification.matched_labels.len(),
        classification.worst_urgency,
        cardiac_suspected
    );

    Ok(Assessment {
        classification,
        cardiac_suspected,
    })
}

/// Plain-text rendering of an assessment for the terminal
pub fn render_assessment(assessment: &Assessment) -> String {
    let mut lines = vec![DISCLAIMER.to_string(), String::new()];

    if !assessment.has_danger_signs() {
        lines.push(NO_MATCH_MESSAGE.to_string());
        return lines.join("\n");
    }

    let result = &assessment.classification;
    lines.push("Assessment".to_string());
    lines.push(format!(
        "Matched danger signs: {}",
        result.matched_labels.join(", ")
    ));
    lines.push(format!(
        "Urgency: {}",
        result.worst_urgency.as_str().to_uppercase()
    ));
    for message in &result.advice_messages {
        lines.push(format!("- {}", message));
    }

    if assessment.cardiac_suspected {
        lines.push(String::new());
        lines.push(
            "Possible heart-related signs: nearby hospital search will default to pediatric cardiology / CHD facilities."
                .to_string(),
        );
    }

    lines.join("\n")
}
