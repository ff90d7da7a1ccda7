use crate::gis::{Geocoder, HospitalSource};
use crate::map::{build_hospital_map, to_geojson, HospitalMap, MarkerColor};
use crate::settings::AppSettings;
use crate::validation::{validate_place, validate_radius_km};
use log::{error, info, warn};
use std::fs;
use std::path::Path;

pub const PLACE_NOT_FOUND_MESSAGE: &str =
    "Couldn't find that place. Try a nearby landmark or add county, e.g., 'Kahawa West, Nairobi'.";

pub struct HospitalSearch<'a> {
    pub place: &'a str,
    pub radius_km: u32,
    pub specialty_only: bool,
}

/// Geocodes a place and builds the annotated hospital map around it
///
/// Service failures are returned as user-facing messages rather than
/// propagated, so a failed lookup never ends the session.
pub fn find_hospitals(
    geocoder: &dyn Geocoder,
    source: &dyn HospitalSource,
    search: &HospitalSearch,
    settings: &AppSettings,
) -> Result<HospitalMap, String> {
    validate_place(search.place)?;
    validate_radius_km(search.radius_km)?;

    let location = match geocoder.geocode(search.place) {
        Ok(Some(location)) => location,
        Ok(None) => {
            warn!("Place not found by geocoder");
            return Err(PLACE_NOT_FOUND_MESSAGE.to_string());
        }
        Err(e) => {
            error!("Geocoding failed: {:#}", e);
            return Err(format!("Error while looking up that place: {:#}", e));
        }
    };

    let radius_m = search.radius_km * 1000;
    let features = source
        .hospitals_near(location, radius_m)
        .map_err(|e| {
            error!("Hospital query failed: {:#}", e);
            format!("Error while building the map: {:#}", e)
        })?;

    let map = build_hospital_map(
        location,
        &features,
        &settings.matching,
        search.specialty_only,
    );
    info!(
        "Built hospital map: {} markers ({} specialty) from {} features",
        map.markers.len(),
        map.specialty_count(),
        features.len()
    );

    Ok(map)
}

pub fn write_geojson(map: &HospitalMap, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&to_geojson(map))
        .map_err(|e| format!("Failed to serialize map: {}", e))?;
    fs::write(path, json).map_err(|e| format!("Failed to write map file: {}", e))?;
    info!("Wrote GeoJSON map to {:?}", path);
    Ok(())
}

/// Plain-text listing of the hospital map for the terminal
pub fn render_hospital_map(map: &HospitalMap, search: &HospitalSearch) -> String {
    let mut lines = vec![format!(
        "Hospitals within {} km of {} ({:.5}, {:.5}):",
        search.radius_km, search.place, map.user_location.lat, map.user_location.lon
    )];

    if map.markers.is_empty() {
        lines.push(if search.specialty_only {
            "No pediatric cardiology / CHD hospitals found. Try a larger radius or show all hospitals."
                .to_string()
        } else {
            "No hospitals found. Try a larger radius.".to_string()
        });
        return lines.join("\n");
    }

    for marker in &map.markers {
        let services = if marker.badges.is_empty() {
            "General hospital".to_string()
        } else {
            marker.badges.join(", ")
        };
        let tag = match marker.color {
            MarkerColor::Green => "[specialty]",
            _ => "[general]  ",
        };
        lines.push(format!(
            "{} {} - {} - {} ({:.5}, {:.5})",
            tag,
            marker.name,
            marker.region.as_deref().unwrap_or("Unknown region"),
            services,
            marker.position.lat,
            marker.position.lon
        ));
    }

    lines.push(String::new());
    lines.push("Green = Pediatric Cardiology / CHD. Orange = general hospital.".to_string());
    lines.join("\n")
}
