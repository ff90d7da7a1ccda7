//! Newborn danger-sign checker.
//!
//! Classifies everyday descriptions of a newborn's symptoms against a small
//! table of danger signs, and flags nearby hospitals that appear in a curated
//! list of pediatric cardiology / congenital heart disease centres.
//!
//! Educational aid only: not a clinical decision-support system.

pub mod cli;
pub mod commands;
pub mod danger_signs;
pub mod facilities;
pub mod fuzzy;
pub mod gis;
pub mod map;
pub mod settings;
pub mod text;
pub mod validation;

pub use danger_signs::{classify_symptoms, looks_cardiac, ClassificationResult, Urgency};
pub use facilities::{match_facility, FacilityMatchResult};
pub use text::normalize;
