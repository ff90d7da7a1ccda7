use anyhow::{anyhow, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use log::{debug, LevelFilter};
use std::path::{Path, PathBuf};

use crate::commands::{
    check_symptoms, find_hospitals, render_check_report, render_hospital_map, write_geojson,
    CheckReport, HospitalSearch, SearchOptions,
};
use crate::facilities::match_facility_with;
use crate::gis::{NominatimGeocoder, OverpassClient};
use crate::settings::{get_default_settings, get_default_settings_path, load_or_create_app_settings, AppSettings};

#[derive(Parser)]
#[command(author, version, about = "Newborn danger-sign checker and hospital finder", long_about = None)]
struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SearchArgs {
    /// Search radius in kilometres (1-50)
    #[arg(long)]
    radius_km: Option<u32>,
    /// Only show hospitals with pediatric cardiology / CHD capability
    #[arg(long, conflicts_with = "all_hospitals")]
    specialty_only: bool,
    /// Show every hospital even when cardiac signs were detected
    #[arg(long)]
    all_hospitals: bool,
    /// Also write the map as GeoJSON to this file
    #[arg(long)]
    geojson: Option<PathBuf>,
}

impl SearchArgs {
    fn options(&self, settings: &AppSettings) -> SearchOptions {
        let specialty_only = if self.all_hospitals {
            Some(false)
        } else if self.specialty_only {
            Some(true)
        } else {
            None
        };
        SearchOptions {
            radius_km: self.radius_km.unwrap_or(settings.search_radius_km),
            specialty_only,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check a description of the baby's symptoms for danger signs
    #[command(group(
        ArgGroup::new("search_flags")
            .args(["radius_km", "specialty_only", "all_hospitals", "geojson"])
            .multiple(true)
            .requires("place")
    ))]
    Check {
        /// Symptoms in everyday language, e.g. "blue lips, sweating while feeding"
        text: String,
        /// Search for hospitals near this place when danger signs are found
        #[arg(long)]
        place: Option<String>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Find hospitals near a place and flag specialty facilities
    Hospitals {
        /// Town, estate or landmark (defaults to the configured place)
        place: Option<String>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Match a single hospital name against the curated specialty list
    MatchFacility {
        name: String,
        /// Region the hospital is located in
        #[arg(long)]
        region: Option<String>,
    },
}

fn init_logging() -> bool {
    let env_override = std::env::var_os("RUST_LOG").is_some();
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Trace).parse_env("RUST_LOG");
    if builder.try_init().is_ok() && !env_override {
        // Until settings are loaded
        log::set_max_level(LevelFilter::Warn);
    }
    env_override
}

fn load_settings(config: Option<&Path>) -> AppSettings {
    match config.map(Path::to_path_buf).or_else(get_default_settings_path) {
        Some(path) => load_or_create_app_settings(&path),
        None => get_default_settings(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn run_check(text: &str, place: Option<&str>, args: &SearchArgs, settings: &AppSettings) -> Result<CheckReport> {
    let assessment = check_symptoms(text, settings).map_err(|e| anyhow!(e))?;
    let mut report = CheckReport::new(assessment);

    if let Some(place) = place {
        let options = args.options(settings);
        match (NominatimGeocoder::new(settings), OverpassClient::new(settings)) {
            (Ok(geocoder), Ok(source)) => {
                report.search_hospitals(place, options, &geocoder, &source, settings)
            }
            (Err(e), _) | (_, Err(e)) => report.record_search_error(
                place,
                options,
                format!("Error while building the map: {:#}", e),
            ),
        }
    }

    Ok(report)
}

fn run_hospitals(place: &str, args: &SearchArgs, settings: &AppSettings, json: bool) -> Result<()> {
    let options = args.options(settings);
    let search = HospitalSearch {
        place,
        radius_km: options.radius_km,
        specialty_only: options.specialty_only_for(false),
    };

    let geocoder = NominatimGeocoder::new(settings)?;
    let source = OverpassClient::new(settings)?;
    let map = find_hospitals(&geocoder, &source, &search, settings).map_err(|e| anyhow!(e))?;

    if json {
        print_json(&map)?;
    } else {
        println!("{}", render_hospital_map(&map, &search));
    }

    if let Some(path) = &args.geojson {
        write_geojson(&map, path).map_err(|e| anyhow!(e))?;
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let env_override = init_logging();

    let settings = load_settings(cli.config.as_deref());
    if !env_override {
        log::set_max_level(settings.log_level.into());
    }
    debug!("Using settings: {:?}", settings);

    match &cli.command {
        Commands::Check {
            text,
            place,
            search,
        } => {
            let report = run_check(text, place.as_deref(), search, &settings)?;

            if cli.json {
                print_json(&report)?;
            } else {
                println!("{}", render_check_report(&report));
            }

            // Only after the report is printed
            if let (Some(map), Some(path)) = (&report.hospitals, &search.geojson) {
                write_geojson(map, path).map_err(|e| anyhow!(e))?;
            }
        }
        Commands::Hospitals { place, search } => {
            let place = place.as_deref().unwrap_or(&settings.default_place);
            run_hospitals(place, search, &settings, cli.json)?;
        }
        Commands::MatchFacility { name, region } => {
            let result = match_facility_with(name, region.as_deref(), &settings.matching);
            if cli.json {
                print_json(&result)?;
            } else {
                match &result.matched_facility_name {
                    Some(matched) => println!(
                        "{} -> {} (confidence {}): pediatric cardiology={}, CHD facilities={}",
                        name,
                        matched,
                        result.confidence_score,
                        result.has_pediatric_cardiology,
                        result.has_chd_facility
                    ),
                    None => println!(
                        "{}: no confident match in the specialty list (best score {})",
                        name, result.confidence_score
                    ),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_with_place() {
        let cli = Cli::try_parse_from([
            "newborn-danger",
            "check",
            "blue lips",
            "--place",
            "Nairobi",
            "--radius-km",
            "20",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Check { text, place, search } => {
                assert_eq!(text, "blue lips");
                assert_eq!(place.as_deref(), Some("Nairobi"));
                assert_eq!(search.radius_km, Some(20));
                assert!(!search.specialty_only);
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_check_search_flags_need_place() {
        for flag in ["--specialty-only", "--all-hospitals"] {
            assert!(Cli::try_parse_from(["newborn-danger", "check", "blue lips", flag]).is_err());
        }
        assert!(Cli::try_parse_from(["newborn-danger", "check", "blue lips", "--radius-km", "5"]).is_err());
        assert!(Cli::try_parse_from([
            "newborn-danger",
            "check",
            "blue lips",
            "--geojson",
            "map.geojson"
        ])
        .is_err());

        assert!(Cli::try_parse_from([
            "newborn-danger",
            "check",
            "blue lips",
            "--place",
            "Nairobi",
            "--specialty-only"
        ])
        .is_ok());
        // Hospitals falls back to the configured place
        assert!(Cli::try_parse_from(["newborn-danger", "hospitals", "--specialty-only"]).is_ok());
    }

    #[test]
    fn test_search_args_options() {
        let settings = get_default_settings();
        let cli = Cli::try_parse_from([
            "newborn-danger",
            "check",
            "blue lips",
            "--place",
            "Nairobi",
            "--all-hospitals",
        ])
        .unwrap();
        let Commands::Check { search, .. } = cli.command else {
            panic!("expected check command");
        };
        let options = search.options(&settings);
        assert_eq!(options.radius_km, 15);
        assert!(!options.specialty_only_for(true));
    }

    #[test]
    fn test_specialty_flags_conflict() {
        assert!(Cli::try_parse_from([
            "newborn-danger",
            "hospitals",
            "--specialty-only",
            "--all-hospitals",
        ])
        .is_err());
    }
}
