pub mod check;
pub mod hospitals;
pub mod symptoms;

pub use check::{render_check_report, CheckReport, SearchOptions};
pub use hospitals::{find_hospitals, render_hospital_map, write_geojson, HospitalSearch};
pub use symptoms::{check_symptoms, render_assessment, Assessment};
