use crate::facilities::{match_facility_with, FacilityMatchResult};
use crate::gis::{Coordinates, HospitalFeature};
use crate::settings::MatchSettings;
use crate::text::escape_html;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const UNNAMED_HOSPITAL: &str = "Unnamed Hospital";
const UNKNOWN_REGION: &str = "Unknown";
const GENERAL_HOSPITAL_BADGE: &str = "General hospital";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Blue,
    Green,
    Orange,
}

impl MarkerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Blue => "blue",
            MarkerColor::Green => "green",
            MarkerColor::Orange => "orange",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HospitalMarker {
    pub name: String,
    pub region: Option<String>,
    pub position: Coordinates,
    pub color: MarkerColor,
    pub badges: Vec<String>,
    pub popup_html: String,
    pub specialty: FacilityMatchResult,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HospitalMap {
    pub user_location: Coordinates,
    pub markers: Vec<HospitalMarker>,
}

impl HospitalMap {
    pub fn specialty_count(&self) -> usize {
        self.markers
            .iter()
            .filter(|m| m.color == MarkerColor::Green)
            .count()
    }
}

/// Service badges shown in a marker popup
pub fn specialty_badges(result: &FacilityMatchResult) -> Vec<String> {
    let mut badges = Vec::new();
    if result.has_pediatric_cardiology {
        badges.push("Pediatric Cardiology".to_string());
    }
    if result.has_chd_facility {
        badges.push("CHD Facilities".to_string());
    }
    badges
}

fn popup_html(name: &str, region: Option<&str>, badges: &[String]) -> String {
    let services = if badges.is_empty() {
        GENERAL_HOSPITAL_BADGE.to_string()
    } else {
        badges.join(", ")
    };
    format!(
        "<b>{}</b><br/>Region: {}<br/>Services: {}",
        escape_html(name),
        escape_html(region.unwrap_or(UNKNOWN_REGION)),
        escape_html(&services)
    )
}

/// Builds one marker per hospital feature that has a usable geometry
///
/// Each name is matched against the curated specialty list; the feature's
/// region, when known, is passed as the region hint. With `specialty_only`
/// only hospitals with a confident specialty match are kept.
pub fn build_hospital_map(
    user_location: Coordinates,
    features: &[HospitalFeature],
    settings: &MatchSettings,
    specialty_only: bool,
) -> HospitalMap {
    let mut markers = Vec::new();

    for feature in features {
        let Some(position) = feature.geometry.as_ref().and_then(|g| g.centroid()) else {
            debug!("Skipping hospital without geometry: {:?}", feature.name);
            continue;
        };

        let name = feature
            .name
            .clone()
            .unwrap_or_else(|| UNNAMED_HOSPITAL.to_string());
        let specialty = match feature.name.as_deref() {
            Some(n) => match_facility_with(n, feature.region.as_deref(), settings),
            None => FacilityMatchResult::default(),
        };

        if specialty_only && !specialty.is_specialty() {
            continue;
        }

        let color = if specialty.is_specialty() {
            MarkerColor::Green
        } else {
            MarkerColor::Orange
        };
        let badges = specialty_badges(&specialty);
        let popup_html = popup_html(&name, feature.region.as_deref(), &badges);

        markers.push(HospitalMarker {
            name,
            region: feature.region.clone(),
            position,
            color,
            badges,
            popup_html,
            specialty,
        });
    }

    HospitalMap {
        user_location,
        markers,
    }
}

fn point_feature(position: Coordinates, properties: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            // GeoJSON positions are [longitude, latitude]
            "coordinates": [position.lon, position.lat],
        },
        "properties": properties,
    })
}

/// Renders the map as a GeoJSON FeatureCollection, user location first
pub fn to_geojson(map: &HospitalMap) -> Value {
    let mut features = vec![point_feature(
        map.user_location,
        json!({
            "name": "Your Location",
            "color": MarkerColor::Blue.as_str(),
            "popup": "Your Location",
        }),
    )];

    for marker in &map.markers {
        features.push(point_feature(
            marker.position,
            json!({
                "name": marker.name,
                "region": marker.region,
                "color": marker.color.as_str(),
                "badges": marker.badges,
                "popup": marker.popup_html,
                "matched_facility": marker.specialty.matched_facility_name,
                "confidence": marker.specialty.confidence_score,
            }),
        ));
    }

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gis::Geometry;

    fn feature(name: Option<&str>, region: Option<&str>, geometry: Option<Geometry>) -> HospitalFeature {
        HospitalFeature {
            name: name.map(str::to_string),
            region: region.map(str::to_string),
            geometry,
        }
    }

    fn sample_features() -> Vec<HospitalFeature> {
        vec![
            feature(
                Some("Kenyatta National Hosp"),
                Some("Nairobi"),
                Some(Geometry::Point(Coordinates::new(-1.30, 36.80))),
            ),
            feature(
                Some("Mater Hospital"),
                None,
                Some(Geometry::Point(Coordinates::new(-1.31, 36.84))),
            ),
            feature(None, None, Some(Geometry::Point(Coordinates::new(-1.20, 36.90)))),
            feature(Some("Ghost Hospital"), None, None),
        ]
    }

    #[test]
    fn test_build_hospital_map_colors() {
        let map = build_hospital_map(
            Coordinates::new(-1.28, 36.82),
            &sample_features(),
            &MatchSettings::default(),
            false,
        );

        assert_eq!(map.markers.len(), 3);
        assert_eq!(map.markers[0].color, MarkerColor::Green);
        assert_eq!(
            map.markers[0].badges,
            vec!["Pediatric Cardiology", "CHD Facilities"]
        );
        assert_eq!(map.markers[1].color, MarkerColor::Orange);
        assert!(map.markers[1].badges.is_empty());
        assert_eq!(map.markers[2].name, UNNAMED_HOSPITAL);
        assert_eq!(map.specialty_count(), 1);
    }

    #[test]
    fn test_build_hospital_map_specialty_only() {
        let map = build_hospital_map(
            Coordinates::new(-1.28, 36.82),
            &sample_features(),
            &MatchSettings::default(),
            true,
        );
        assert_eq!(map.markers.len(), 1);
        assert_eq!(
            map.markers[0].specialty.matched_facility_name.as_deref(),
            Some("Kenyatta National Hospital")
        );
    }

    #[test]
    fn test_popup_contents() {
        let map = build_hospital_map(
            Coordinates::new(-1.28, 36.82),
            &sample_features(),
            &MatchSettings::default(),
            false,
        );
        assert_eq!(
            map.markers[0].popup_html,
            "<b>Kenyatta National Hosp</b><br/>Region: Nairobi<br/>Services: Pediatric Cardiology, CHD Facilities"
        );
        assert_eq!(
            map.markers[1].popup_html,
            "<b>Mater Hospital</b><br/>Region: Unknown<br/>Services: General hospital"
        );
    }

    #[test]
    fn test_popup_escapes_names() {
        let features = vec![feature(
            Some("<script>St. Mary's</script>"),
            None,
            Some(Geometry::Point(Coordinates::new(0.0, 0.0))),
        )];
        let map = build_hospital_map(Coordinates::new(0.0, 0.0), &features, &MatchSettings::default(), false);
        assert!(!map.markers[0].popup_html.contains("<script>"));
    }

    #[test]
    fn test_to_geojson() {
        let map = build_hospital_map(
            Coordinates::new(-1.28, 36.82),
            &sample_features(),
            &MatchSettings::default(),
            false,
        );
        let geojson = to_geojson(&map);

        assert_eq!(geojson["type"], "FeatureCollection");
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(features[0]["properties"]["color"], "blue");
        assert_eq!(features[0]["geometry"]["coordinates"][0], 36.82);
        assert_eq!(features[0]["geometry"]["coordinates"][1], -1.28);
        assert_eq!(features[1]["properties"]["color"], "green");
        assert_eq!(
            features[1]["properties"]["matched_facility"],
            "Kenyatta National Hospital"
        );
        assert_eq!(features[2]["properties"]["region"], Value::Null);
    }
}
