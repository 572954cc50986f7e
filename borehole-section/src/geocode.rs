//! Calcul des coordonnées WGS84 des sondages fusionnés
//!
//! Easting/Northing prioritaires ; sinon latitude/longitude directes,
//! recopiées après contrôle de plage. Une ligne non convertible est écartée
//! de l'ensemble spatial sans interrompre le lot.

use geo::Point;
use tracing::{debug, warn};

use crate::merge::LocationRecord;
use crate::report::LoadReport;
use crate::reproject_lite::GridTransform;

/// Sondage géolocalisé
#[derive(Debug, Clone, PartialEq)]
pub struct BoreholeLocation {
    pub loca_id: String,
    pub original_loca_id: String,
    pub source_file: String,
    pub ground_level: Option<f64>,
    pub final_depth: Option<f64>,
    /// OSGB36, absent si le fichier ne fournissait que lat/lon
    pub easting: Option<f64>,
    pub northing: Option<f64>,
    /// WGS84 (degrés)
    pub lat: f64,
    pub lon: f64,
}

impl BoreholeLocation {
    /// Point (lon, lat), ordre GeoJSON
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }

    /// Paire Easting/Northing complète
    pub fn grid(&self) -> Option<(f64, f64)> {
        self.easting.zip(self.northing)
    }
}

fn geographic_in_range(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Géolocalise un sondage, ou explique pourquoi c'est impossible
pub fn locate<T: GridTransform + ?Sized>(
    record: &LocationRecord,
    transform: &T,
) -> Result<BoreholeLocation, String> {
    let (lat, lon) = match (record.easting.zip(record.northing), record.lat.zip(record.lon)) {
        (Some((e, n)), _) => transform
            .to_geographic(e, n)
            .map_err(|err| format!("coordinate conversion failed: {}", err))?,
        (None, Some((lat, lon))) if geographic_in_range(lat, lon) => (lat, lon),
        (None, Some((lat, lon))) => {
            return Err(format!("latitude/longitude out of range: {}, {}", lat, lon))
        }
        (None, None) => return Err("no coordinates".to_string()),
    };

    Ok(BoreholeLocation {
        loca_id: record.loca_id.clone(),
        original_loca_id: record.original_loca_id.clone(),
        source_file: record.source_file.clone(),
        ground_level: record.ground_level,
        final_depth: record.final_depth,
        easting: record.easting.filter(|_| record.northing.is_some()),
        northing: record.northing.filter(|_| record.easting.is_some()),
        lat,
        lon,
    })
}

/// Géolocalise toutes les lignes LOCA ; les échecs sont consignés et écartés
pub fn geocode<T: GridTransform + ?Sized>(
    records: &[LocationRecord],
    transform: &T,
    report: &mut LoadReport,
) -> Vec<BoreholeLocation> {
    let located: Vec<BoreholeLocation> = records
        .iter()
        .filter_map(|record| match locate(record, transform) {
            Ok(location) => Some(location),
            Err(reason) => {
                warn!(
                    file = %record.source_file,
                    loca_id = %record.loca_id,
                    reason = %reason,
                    "location dropped from spatial set"
                );
                report.record_location_dropped(&record.source_file, &record.loca_id, &reason);
                None
            }
        })
        .collect();

    debug!(
        located = located.len(),
        dropped = records.len() - located.len(),
        "geocoded locations"
    );
    located
}
