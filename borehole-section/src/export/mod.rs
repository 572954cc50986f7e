//! Modules d'export (GeoJSON, PROJ)

pub mod geojson;
pub mod reproject;

pub use geojson::{export_locations, write_locations, write_section_line};
