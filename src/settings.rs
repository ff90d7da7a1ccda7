use log::{debug, info, warn};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// Accepts both the numeric format (1-5) and the string format ("trace", "debug", etc.)
impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LogLevelVisitor;

        impl<'de> Visitor<'de> for LogLevelVisitor {
            type Value = LogLevel;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or integer representing log level")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<LogLevel, E> {
                match value.to_lowercase().as_str() {
                    "trace" => Ok(LogLevel::Trace),
                    "debug" => Ok(LogLevel::Debug),
                    "info" => Ok(LogLevel::Info),
                    "warn" => Ok(LogLevel::Warn),
                    "error" => Ok(LogLevel::Error),
                    _ => Err(E::unknown_variant(
                        value,
                        &["trace", "debug", "info", "warn", "error"],
                    )),
                }
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<LogLevel, E> {
                match value {
                    1 => Ok(LogLevel::Trace),
                    2 => Ok(LogLevel::Debug),
                    3 => Ok(LogLevel::Info),
                    4 => Ok(LogLevel::Warn),
                    5 => Ok(LogLevel::Error),
                    _ => Err(E::invalid_value(de::Unexpected::Unsigned(value), &"1-5")),
                }
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<LogLevel, E> {
                match u64::try_from(value) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Signed(value), &"1-5")),
                }
            }
        }

        deserializer.deserialize_any(LogLevelVisitor)
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Thresholds used by the symptom classifier and the facility matcher
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSettings {
    #[serde(default = "default_symptom_threshold")]
    pub symptom_threshold: u8,
    #[serde(default = "default_facility_threshold")]
    pub facility_threshold: u8,
    #[serde(default = "default_region_penalty")]
    pub region_penalty: u8,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            symptom_threshold: default_symptom_threshold(),
            facility_threshold: default_facility_threshold(),
            region_penalty: default_region_penalty(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub matching: MatchSettings,
    #[serde(default = "default_place")]
    pub default_place: String,
    #[serde(default = "default_search_radius_km")]
    pub search_radius_km: u32,
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocode_min_delay_ms")]
    pub geocode_min_delay_ms: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

fn default_symptom_threshold() -> u8 {
    80
}

fn default_facility_threshold() -> u8 {
    85
}

fn default_region_penalty() -> u8 {
    5
}

fn default_place() -> String {
    "Nairobi, Kenya".to_string()
}

fn default_search_radius_km() -> u32 {
    15
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_user_agent() -> String {
    "newborn_danger_chatbot".to_string()
}

fn default_geocode_min_delay_ms() -> u64 {
    // Nominatim usage policy: at most one request per second
    1000
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> LogLevel {
    // WARN by default so symptom descriptions stay out of the logs
    LogLevel::Warn
}

pub fn get_default_settings() -> AppSettings {
    AppSettings {
        matching: MatchSettings::default(),
        default_place: default_place(),
        search_radius_km: default_search_radius_km(),
        geocoder_url: default_geocoder_url(),
        overpass_url: default_overpass_url(),
        user_agent: default_user_agent(),
        geocode_min_delay_ms: default_geocode_min_delay_ms(),
        http_timeout_secs: default_http_timeout_secs(),
        log_level: default_log_level(),
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        get_default_settings()
    }
}

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Per-OS location of the settings file
pub fn get_default_settings_path() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(format!(
            "{}/Library/Application Support/newborn-danger/{}",
            home, SETTINGS_FILE_NAME
        )))
    }
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").ok()?;
        Some(PathBuf::from(format!(
            "{}\\newborn-danger\\{}",
            appdata, SETTINGS_FILE_NAME
        )))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(format!(
            "{}/.config/newborn-danger/{}",
            home, SETTINGS_FILE_NAME
        )))
    }
}

fn store_settings(path: &Path, settings: &AppSettings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create directory: {}", e))?;
    }

    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;

    fs::write(path, json).map_err(|e| format!("Failed to write settings file: {}", e))
}

/// Loads settings from `path`, creating the file with defaults if it is missing
///
/// A file that cannot be parsed is left untouched and defaults are used instead.
pub fn load_or_create_app_settings(path: &Path) -> AppSettings {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppSettings>(&contents) {
            Ok(settings) => {
                debug!("Found existing settings: {:?}", settings);
                if let Err(e) = crate::validation::validate_settings(&settings) {
                    warn!("Invalid settings in {:?}, using defaults: {}", path, e);
                    return get_default_settings();
                }
                settings
            }
            Err(e) => {
                warn!("Failed to parse settings: {}", e);
                // Fall back to default settings if parsing fails
                get_default_settings()
            }
        },
        Err(_) => {
            let default_settings = get_default_settings();
            match store_settings(path, &default_settings) {
                Ok(()) => info!("Created default settings file at: {:?}", path),
                Err(e) => warn!("{}", e),
            }
            default_settings
        }
    }
}

pub fn write_settings(path: &Path, settings: &AppSettings) -> Result<(), String> {
    crate::validation::validate_settings(settings)?;
    store_settings(path, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn temp_settings_path() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join(SETTINGS_FILE_NAME);
        (dir, path)
    }

    #[test]
    fn test_default_thresholds() {
        let settings = get_default_settings();
        assert_eq!(settings.matching.symptom_threshold, 80);
        assert_eq!(settings.matching.facility_threshold, 85);
        assert_eq!(settings.matching.region_penalty, 5);
        assert_eq!(settings.search_radius_km, 15);
        assert_eq!(settings.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"matching": {"symptom_threshold": 70}}"#).unwrap();
        assert_eq!(settings.matching.symptom_threshold, 70);
        assert_eq!(settings.matching.facility_threshold, 85);
        assert_eq!(settings.default_place, "Nairobi, Kenya");
    }

    #[test]
    fn test_log_level_accepts_strings_and_numbers() {
        let from_str: AppSettings = serde_json::from_str(r#"{"log_level": "DEBUG"}"#).unwrap();
        assert_eq!(from_str.log_level, LogLevel::Debug);

        let from_num: AppSettings = serde_json::from_str(r#"{"log_level": 5}"#).unwrap();
        assert_eq!(from_num.log_level, LogLevel::Error);

        assert!(serde_json::from_str::<AppSettings>(r#"{"log_level": 9}"#).is_err());
        assert!(serde_json::from_str::<AppSettings>(r#"{"log_level": "loud"}"#).is_err());
    }

    #[test]
    fn test_log_level_into_filter() {
        let filter: log::LevelFilter = LogLevel::Info.into();
        assert_eq!(filter, log::LevelFilter::Info);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let (_dir, path) = temp_settings_path();

        let settings = load_or_create_app_settings(&path);
        assert_eq!(settings, get_default_settings());
        assert!(path.exists());
    }

    #[test]
    fn test_load_falls_back_on_garbage() {
        let (_dir, path) = temp_settings_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_or_create_app_settings(&path), get_default_settings());
        // The broken file is left for the user to fix
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_write_then_load() {
        let (_dir, path) = temp_settings_path();
        let mut settings = get_default_settings();
        settings.default_place = "Kisumu, Kenya".to_string();
        settings.matching.region_penalty = 10;

        write_settings(&path, &settings).unwrap();
        assert_eq!(load_or_create_app_settings(&path), settings);
    }

    #[test]
    fn test_write_rejects_invalid_settings() {
        let (_dir, path) = temp_settings_path();
        let mut settings = get_default_settings();
        settings.search_radius_km = 0;

        assert!(write_settings(&path, &settings).is_err());
        assert!(!path.exists());
    }
}
