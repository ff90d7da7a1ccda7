use crate::fuzzy::extract_one;
use crate::settings::MatchSettings;
use crate::text::{normalize, normalize_facility_name};
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityRecord {
    pub facility_name: &'static str,
    pub region: &'static str,
    pub has_pediatric_cardiologist: bool,
    pub has_chd_facilities: bool,
}

/// Manually verified hospitals with pediatric cardiology / CHD capability
pub const SPECIALTY_FACILITIES: &[FacilityRecord] = &[
    FacilityRecord {
        facility_name: "Kenyatta National Hospital",
        region: "Nairobi",
        has_pediatric_cardiologist: true,
        has_chd_facilities: true,
    },
    FacilityRecord {
        facility_name: "Aga Khan University Hospital Nairobi",
        region: "Nairobi",
        has_pediatric_cardiologist: true,
        has_chd_facilities: true,
    },
    FacilityRecord {
        facility_name: "Gertrude's Children's Hospital",
        region: "Nairobi",
        has_pediatric_cardiologist: true,
        has_chd_facilities: true,
    },
];

// Catalog names in comparison form, same order as SPECIALTY_FACILITIES
static NORMALIZED_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    SPECIALTY_FACILITIES
        .iter()
        .map(|record| normalize_facility_name(record.facility_name))
        .collect()
});

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct FacilityMatchResult {
    pub has_pediatric_cardiology: bool,
    pub has_chd_facility: bool,
    pub matched_facility_name: Option<String>,
    pub confidence_score: u8,
}

impl FacilityMatchResult {
    fn unmatched(score: u8) -> Self {
        Self {
            confidence_score: score,
            ..Self::default()
        }
    }

    /// True when either specialty flag is set
    pub fn is_specialty(&self) -> bool {
        self.has_pediatric_cardiology || self.has_chd_facility
    }
}

/// Matches a hospital name with the default thresholds
pub fn match_facility(name: &str, region_hint: Option<&str>) -> FacilityMatchResult {
    match_facility_with(name, region_hint, &MatchSettings::default())
}

/// Matches a free-text hospital name against the curated specialty list
///
/// Below the facility threshold the flags stay false but the score is still
/// reported. A region hint that disagrees with the catalog only lowers the
/// confidence; it never changes the flags.
pub fn match_facility_with(
    name: &str,
    region_hint: Option<&str>,
    settings: &MatchSettings,
) -> FacilityMatchResult {
    let query = normalize_facility_name(name);
    if query.is_empty() {
        return FacilityMatchResult::unmatched(0);
    }

    let Some((idx, score)) = extract_one(&query, NORMALIZED_NAMES.as_slice()) else {
        return FacilityMatchResult::unmatched(0);
    };

    if score < settings.facility_threshold {
        return FacilityMatchResult::unmatched(score);
    }

    let record = &SPECIALTY_FACILITIES[idx];
    let mut confidence = score;

    if let Some(hint) = region_hint {
        if normalize(hint) != normalize(record.region) {
            debug!(
                "Region '{}' differs from '{}' for {}, lowering confidence",
                hint, record.region, record.facility_name
            );
            confidence = confidence.saturating_sub(settings.region_penalty);
        }
    }

    FacilityMatchResult {
        has_pediatric_cardiology: record.has_pediatric_cardiologist,
        has_chd_facility: record.has_chd_facilities,
        matched_facility_name: Some(record.facility_name.to_string()),
        confidence_score: confidence,
    }
}
