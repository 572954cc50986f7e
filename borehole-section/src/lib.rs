//! # borehole-section
//!
//! Chargement de lots de fichiers AGS4, sélection spatiale des sondages et
//! dérivation de coupes géologiques.
//!
//! ## Features
//!
//! - Parsing parallèle des fichiers et fusion avec renommage des LOCA_ID
//! - Géolocalisation OSGB36 -> WGS84 (Rust pur, ou PROJ avec `reproject`)
//! - Sélection par rectangle, polygone, couloir autour d'une ligne ou clic
//! - Axe de coupe dessiné ou par analyse en composantes principales
//! - Export GeoJSON et rapport de chargement
//!
//! ## Exemple
//!
//! ```no_run
//! use borehole_section::{derive_section_line, filter_by_shape, load_paths};
//! use borehole_section::{Config, SelectionParams, SelectionShape, SmartReprojector};
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let transform = SmartReprojector::new(config.grid_bounds, config.use_proj)?;
//! let dataset = load_paths(&[PathBuf::from("site.ags")], &config, &transform)?;
//!
//! let shape = SelectionShape::from_geojson(r#"{"type":"LineString","coordinates":[[-0.13,51.5],[-0.12,51.5]]}"#);
//! let selected = filter_by_shape(shape.as_ref(), &dataset.spatial, &SelectionParams::from(&config));
//! let line = derive_section_line(&selected, shape.as_ref(), &transform, config.section_extension);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod geocode;
pub mod log;
pub mod logging;
pub mod merge;
pub mod report;
pub mod reproject_lite;
pub mod section;
pub mod selection;

pub use cache::{CachedSession, MemoCache};
pub use config::Config;
pub use dataset::{load_dataset, load_paths, Dataset, SourceFile};
pub use error::DatasetError;
pub use geocode::BoreholeLocation;
pub use log::BoreholeLog;
pub use report::{LoadReport, LoadStatus};
pub use reproject_lite::{GridTransform, NationalGridLite, SmartReprojector};
pub use section::{build_profile, derive_section_line, SectionLine, SectionProfile};
pub use selection::{filter_by_shape, select_by_ids, select_nearest, SelectionParams, SelectionShape};
