//! Geocoding and hospital lookups against OpenStreetMap services.
//!
//! Both services sit behind small traits so the hospital finder can be driven
//! by stubs in tests. Response parsing is kept separate from transport.

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::settings::AppSettings;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinates),
    Polygon(Vec<Coordinates>),
}

impl Geometry {
    /// Representative point used for the map marker
    ///
    /// Polygons use the mean of their vertices, counting a repeated closing
    /// vertex once. Empty polygons have no centroid.
    pub fn centroid(&self) -> Option<Coordinates> {
        match self {
            Geometry::Point(point) => Some(*point),
            Geometry::Polygon(ring) => {
                let vertices = match ring.as_slice() {
                    [first, .., last] if first == last => &ring[..ring.len() - 1],
                    _ => ring.as_slice(),
                };
                if vertices.is_empty() {
                    return None;
                }
                let n = vertices.len() as f64;
                let lat = vertices.iter().map(|c| c.lat).sum::<f64>() / n;
                let lon = vertices.iter().map(|c| c.lon).sum::<f64>() / n;
                Some(Coordinates::new(lat, lon))
            }
        }
    }
}

/// A hospital returned by the map data source
#[derive(Debug, Clone, PartialEq)]
pub struct HospitalFeature {
    pub name: Option<String>,
    pub region: Option<String>,
    pub geometry: Option<Geometry>,
}

pub trait Geocoder {
    /// Resolves a free-text place; `Ok(None)` when the place is unknown
    fn geocode(&self, place: &str) -> Result<Option<Coordinates>>;
}

pub trait HospitalSource {
    fn hospitals_near(&self, center: Coordinates, radius_m: u32) -> Result<Vec<HospitalFeature>>;
}

/// Enforces a minimum delay between consecutive calls
pub struct RateLimiter {
    min_delay: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: Mutex::new(None),
        }
    }

    /// Blocks until the minimum delay since the previous call has passed
    pub fn wait(&self) {
        let mut last_call = self.last_call.lock();
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                let remaining = self.min_delay - elapsed;
                debug!("Rate limiting geocoder for {:?}", remaining);
                std::thread::sleep(remaining);
            }
        }
        *last_call = Some(Instant::now());
    }
}

fn build_http_client(settings: &AppSettings) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

#[derive(Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Parses a Nominatim `format=json` search response, taking the first hit
pub fn parse_nominatim_response(body: &str) -> Result<Option<Coordinates>> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).context("Failed to parse geocoder response")?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let lat: f64 = place
        .lat
        .parse()
        .with_context(|| format!("Invalid latitude '{}'", place.lat))?;
    let lon: f64 = place
        .lon
        .parse()
        .with_context(|| format!("Invalid longitude '{}'", place.lon))?;

    Ok(Some(Coordinates::new(lat, lon)))
}

pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
    limiter: RateLimiter,
}

impl NominatimGeocoder {
    pub fn new(settings: &AppSettings) -> Result<Self> {
        Ok(Self {
            client: build_http_client(settings)?,
            endpoint: settings.geocoder_url.clone(),
            limiter: RateLimiter::new(Duration::from_millis(settings.geocode_min_delay_ms)),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, place: &str) -> Result<Option<Coordinates>> {
        self.limiter.wait();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .context("Failed to reach geocoding service")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Geocoding service returned HTTP {}",
                response.status()
            ));
        }

        let body = response.text().context("Failed to read geocoder response")?;
        let coords = parse_nominatim_response(&body)?;
        info!("Geocoded place: found={}", coords.is_some());
        Ok(coords)
    }
}

#[derive(Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

impl From<&LatLon> for Coordinates {
    fn from(value: &LatLon) -> Self {
        Coordinates::new(value.lat, value.lon)
    }
}

#[derive(Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<LatLon>,
    geometry: Option<Vec<LatLon>>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

// Address tags that can serve as the region of a hospital, in order of preference
const REGION_TAGS: &[&str] = &["addr:county", "addr:state", "addr:city", "is_in:county"];

impl From<OverpassElement> for HospitalFeature {
    fn from(element: OverpassElement) -> Self {
        let geometry = match (&element.geometry, element.lat, element.lon, &element.center) {
            (Some(ring), _, _, _) if !ring.is_empty() => {
                Some(Geometry::Polygon(ring.iter().map(Coordinates::from).collect()))
            }
            (_, Some(lat), Some(lon), _) => Some(Geometry::Point(Coordinates::new(lat, lon))),
            (_, _, _, Some(center)) => Some(Geometry::Point(center.into())),
            _ => None,
        };

        let name = element
            .tags
            .get("name")
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let region = REGION_TAGS
            .iter()
            .find_map(|tag| element.tags.get(*tag))
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        HospitalFeature {
            name,
            region,
            geometry,
        }
    }
}

/// Parses an Overpass API JSON response into hospital features
pub fn parse_overpass_response(body: &str) -> Result<Vec<HospitalFeature>> {
    let response: OverpassResponse =
        serde_json::from_str(body).context("Failed to parse map data response")?;
    Ok(response.elements.into_iter().map(HospitalFeature::from).collect())
}

/// Overpass QL query for hospitals around a point
pub fn build_overpass_query(center: Coordinates, radius_m: u32) -> String {
    format!(
        "[out:json][timeout:25];nwr[\"amenity\"=\"hospital\"](around:{},{},{});out center tags;",
        radius_m, center.lat, center.lon
    )
}

pub struct OverpassClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(settings: &AppSettings) -> Result<Self> {
        Ok(Self {
            client: build_http_client(settings)?,
            endpoint: settings.overpass_url.clone(),
        })
    }
}

impl HospitalSource for OverpassClient {
    fn hospitals_near(&self, center: Coordinates, radius_m: u32) -> Result<Vec<HospitalFeature>> {
        let query = build_overpass_query(center, radius_m);
        debug!("Overpass query: {}", query);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()
            .context("Failed to reach map data service")?;

        if !response.status().is_success() {
            return Err(anyhow!("Map data service returned HTTP {}", response.status()));
        }

        let body = response.text().context("Failed to read map data response")?;
        let features = parse_overpass_response(&body)?;
        info!("Map data service returned {} hospitals", features.len());
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nominatim_response() {
        let body = r#"[{"place_id": 1, "lat": "-1.2863890", "lon": "36.8172230", "display_name": "Nairobi, Kenya"}]"#;
        let coords = parse_nominatim_response(body).unwrap().unwrap();
        assert!((coords.lat + 1.286389).abs() < 1e-9);
        assert!((coords.lon - 36.817223).abs() < 1e-9);
    }

    #[test]
    fn test_parse_nominatim_not_found() {
        assert_eq!(parse_nominatim_response("[]").unwrap(), None);
    }

    #[test]
    fn test_parse_nominatim_garbage() {
        assert!(parse_nominatim_response("<html>").is_err());
        assert!(parse_nominatim_response(r#"[{"lat": "north", "lon": "1"}]"#).is_err());
    }

    #[test]
    fn test_parse_overpass_response() {
        let body = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": -1.30, "lon": 36.80,
                 "tags": {"amenity": "hospital", "name": "Kenyatta National Hospital", "addr:city": "Nairobi"}},
                {"type": "way", "id": 2, "center": {"lat": -1.25, "lon": 36.82},
                 "tags": {"amenity": "hospital", "name": "  "}},
                {"type": "way", "id": 3,
                 "geometry": [{"lat": 0.0, "lon": 0.0}, {"lat": 0.0, "lon": 2.0}, {"lat": 2.0, "lon": 2.0}, {"lat": 2.0, "lon": 0.0}, {"lat": 0.0, "lon": 0.0}],
                 "tags": {"name": "Square Clinic", "addr:county": "Kiambu", "addr:city": "Thika"}},
                {"type": "relation", "id": 4, "tags": {"name": "No Geometry"}}
            ]
        }"#;

        let features = parse_overpass_response(body).unwrap();
        assert_eq!(features.len(), 4);

        assert_eq!(features[0].name.as_deref(), Some("Kenyatta National Hospital"));
        assert_eq!(features[0].region.as_deref(), Some("Nairobi"));
        assert_eq!(
            features[0].geometry,
            Some(Geometry::Point(Coordinates::new(-1.30, 36.80)))
        );

        assert_eq!(features[1].name, None);
        assert_eq!(features[1].region, None);

        assert_eq!(features[2].region.as_deref(), Some("Kiambu"));
        assert_eq!(
            features[2].geometry.as_ref().and_then(Geometry::centroid),
            Some(Coordinates::new(1.0, 1.0))
        );

        assert_eq!(features[3].geometry, None);
    }

    #[test]
    fn test_parse_overpass_without_elements() {
        assert!(parse_overpass_response("{}").unwrap().is_empty());
        assert!(parse_overpass_response("not json").is_err());
    }

    #[test]
    fn test_centroid_empty_polygon() {
        assert_eq!(Geometry::Polygon(Vec::new()).centroid(), None);
    }

    #[test]
    fn test_build_overpass_query() {
        let query = build_overpass_query(Coordinates::new(-1.5, 36.75), 15000);
        assert!(query.contains("around:15000,-1.5,36.75"));
        assert!(query.contains("\"amenity\"=\"hospital\""));
        assert!(query.starts_with("[out:json]"));
    }

    #[test]
    fn test_rate_limiter_spaces_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.wait();
        limiter.wait();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_rate_limiter_first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let start = Instant::now();
        limiter.wait();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
