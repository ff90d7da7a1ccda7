use super::hospitals::{find_hospitals, render_hospital_map, HospitalSearch};
use super::symptoms::{render_assessment, Assessment};
use crate::gis::{Geocoder, HospitalSource};
use crate::map::HospitalMap;
use crate::settings::AppSettings;
use log::{info, warn};
use serde::Serialize;

pub const SEARCH_SKIPPED_MESSAGE: &str =
    "No danger signs matched, so no hospital search was run.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub radius_km: u32,
    /// `None` follows the cardiac heuristic of the assessment
    pub specialty_only: Option<bool>,
}

impl SearchOptions {
    pub fn specialty_only_for(&self, cardiac_suspected: bool) -> bool {
        self.specialty_only.unwrap_or(cardiac_suspected)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SearchRequest {
    place: String,
    radius_km: u32,
    specialty_only: bool,
}

/// An assessment plus the outcome of the hospital search that may follow it
///
/// A failed search never replaces the assessment; the failure is kept as a
/// message next to it.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub assessment: Assessment,
    pub hospitals: Option<HospitalMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospitals_error: Option<String>,
    #[serde(skip)]
    search: Option<SearchRequest>,
}

impl CheckReport {
    pub fn new(assessment: Assessment) -> Self {
        Self {
            assessment,
            hospitals: None,
            hospitals_error: None,
            search: None,
        }
    }

    /// Whether a place was given but no danger sign matched
    pub fn search_skipped(&self) -> bool {
        self.search.is_some() && !self.assessment.has_danger_signs()
    }

    // Returns false when the search should not run
    fn begin_search(&mut self, place: &str, options: SearchOptions) -> bool {
        self.search = Some(SearchRequest {
            place: place.to_string(),
            radius_km: options.radius_km,
            specialty_only: options.specialty_only_for(self.assessment.cardiac_suspected),
        });

        if !self.assessment.has_danger_signs() {
            info!("No danger signs matched, skipping hospital search");
            return false;
        }
        true
    }

    /// Runs the hospital search for this assessment when danger signs matched
    pub fn search_hospitals(
        &mut self,
        place: &str,
        options: SearchOptions,
        geocoder: &dyn Geocoder,
        source: &dyn HospitalSource,
        settings: &AppSettings,
    ) {
        if !self.begin_search(place, options) {
            return;
        }

        let search = HospitalSearch {
            place,
            radius_km: options.radius_km,
            specialty_only: options.specialty_only_for(self.assessment.cardiac_suspected),
        };
        match find_hospitals(geocoder, source, &search, settings) {
            Ok(map) => self.hospitals = Some(map),
            Err(e) => {
                warn!("Hospital search failed, keeping assessment: {}", e);
                self.hospitals_error = Some(e);
            }
        }
    }

    /// Records a search that could not be started, e.g. when the HTTP clients failed to build
    pub fn record_search_error(&mut self, place: &str, options: SearchOptions, message: String) {
        if self.begin_search(place, options) {
            warn!("Hospital search unavailable: {}", message);
            self.hospitals_error = Some(message);
        }
    }
}

/// Assessment first, then the hospital listing or the reason it is missing
pub fn render_check_report(report: &CheckReport) -> String {
    let mut text = render_assessment(&report.assessment);

    if report.search_skipped() {
        text.push_str("\n\n");
        text.push_str(SEARCH_SKIPPED_MESSAGE);
    } else if let Some(error) = &report.hospitals_error {
        text.push_str("\n\n");
        text.push_str(error);
    } else if let (Some(map), Some(request)) = (&report.hospitals, &report.search) {
        let search = HospitalSearch {
            place: &request.place,
            radius_km: request.radius_km,
            specialty_only: request.specialty_only,
        };
        text.push_str("\n\n");
        text.push_str(&render_hospital_map(map, &search));
    }

    text
}
