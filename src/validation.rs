/// Input validation utilities for user-provided data
///
/// Free text from the user is checked before it reaches the classifier or is
/// sent to a third-party geocoding service:
/// - Empty or whitespace-only input
/// - Excessive length (memory use, abuse of the public geocoder)
/// - Control characters and null bytes
///
/// All validation functions return `Result<(), String>` where:
/// - `Ok(())` means the input is valid and safe to use
/// - `Err(String)` contains a human-readable error message
use crate::settings::{AppSettings, MatchSettings};

/// Maximum length of a symptom description
const MAX_SYMPTOM_TEXT_LENGTH: usize = 1000;

/// Maximum length of a place name sent to the geocoder
const MAX_PLACE_LENGTH: usize = 200;

/// Allowed hospital search radius in kilometres
pub const MIN_RADIUS_KM: u32 = 1;
pub const MAX_RADIUS_KM: u32 = 50;

fn has_invalid_control_chars(text: &str) -> bool {
    text.chars().any(|c| c.is_control() && !c.is_whitespace())
}

/// Validates a free-text symptom description
pub fn validate_symptom_text(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("Please describe the baby's symptoms".to_string());
    }

    if text.chars().count() > MAX_SYMPTOM_TEXT_LENGTH {
        return Err(format!(
            "Symptom description too long (max {} characters)",
            MAX_SYMPTOM_TEXT_LENGTH
        ));
    }

    if has_invalid_control_chars(text) {
        return Err("Symptom description contains invalid control characters".to_string());
    }

    Ok(())
}

/// Validates a place name before geocoding
pub fn validate_place(place: &str) -> Result<(), String> {
    if place.trim().is_empty() {
        return Err("Location cannot be empty".to_string());
    }

    if place.chars().count() > MAX_PLACE_LENGTH {
        return Err(format!(
            "Location too long (max {} characters)",
            MAX_PLACE_LENGTH
        ));
    }

    // Newlines are whitespace but make no sense in a place name
    if place.chars().any(|c| c.is_control()) {
        return Err("Location contains invalid control characters".to_string());
    }

    Ok(())
}

/// Validates the hospital search radius
pub fn validate_radius_km(radius_km: u32) -> Result<(), String> {
    if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
        return Err(format!(
            "Search radius must be between {} and {} km",
            MIN_RADIUS_KM, MAX_RADIUS_KM
        ));
    }
    Ok(())
}

/// Validates the matching thresholds
pub fn validate_match_settings(settings: &MatchSettings) -> Result<(), String> {
    if settings.symptom_threshold > 100 {
        return Err("Symptom threshold must be between 0 and 100".to_string());
    }
    if settings.facility_threshold > 100 {
        return Err("Facility threshold must be between 0 and 100".to_string());
    }
    if settings.region_penalty > 100 {
        return Err("Region penalty must be between 0 and 100".to_string());
    }
    Ok(())
}

/// Validates a whole settings object
pub fn validate_settings(settings: &AppSettings) -> Result<(), String> {
    validate_match_settings(&settings.matching)?;
    validate_radius_km(settings.search_radius_km)?;
    validate_place(&settings.default_place).map_err(|e| format!("Default place: {}", e))?;

    if settings.user_agent.trim().is_empty() {
        return Err("User agent cannot be empty".to_string());
    }

    if settings.http_timeout_secs == 0 {
        return Err("HTTP timeout must be at least one second".to_string());
    }

    Ok(())
}
