//! Sélection par couloir autour d'une polyligne
//!
//! La ligne et les sondages sont projetés dans la zone UTM déterminée par la
//! médiane des positions candidates ; un sondage est retenu si sa distance
//! plane à la ligne est strictement inférieure à la demi-largeur.

use geo::{Coord, EuclideanDistance, LineString, Point};

use crate::geocode::BoreholeLocation;
use crate::reproject_lite::{geographic_to_utm, utm_zone_for, Geographic};

/// Médiane (moyenne des deux valeurs centrales pour un effectif pair)
pub(crate) fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Projection UTM figée pour une requête
#[derive(Debug, Clone, Copy)]
pub struct UtmFrame {
    pub zone: u32,
    pub south: bool,
}

impl UtmFrame {
    /// Zone de la position médiane des candidats
    pub fn for_candidates(candidates: &[BoreholeLocation]) -> Option<Self> {
        let lon = median(candidates.iter().map(|c| c.lon))?;
        let lat = median(candidates.iter().map(|c| c.lat))?;
        let (zone, south) = utm_zone_for(lon, lat);
        Some(Self { zone, south })
    }

    /// (lon, lat) -> (x, y) en mètres
    pub fn project(&self, coord: Coord) -> Coord {
        let (x, y) = geographic_to_utm(Geographic::from_degrees(coord.x, coord.y), self.zone, self.south);
        Coord { x, y }
    }
}

/// Test de couloir en coordonnées planes
pub(crate) fn within_corridor(line: &LineString, point: Point, half_width: f64) -> bool {
    point.euclidean_distance(line) < half_width
}

/// Sondages situés dans le couloir de la polyligne (lon, lat)
pub fn filter_by_corridor(
    line: &[Coord],
    candidates: &[BoreholeLocation],
    half_width_m: f64,
) -> Vec<BoreholeLocation> {
    let Some(frame) = UtmFrame::for_candidates(candidates) else {
        return Vec::new();
    };
    let line_utm: LineString = line.iter().map(|c| frame.project(*c)).collect();

    candidates
        .iter()
        .filter(|c| {
            let p = frame.project(Coord { x: c.lon, y: c.lat });
            within_corridor(&line_utm, Point::from(p), half_width_m)
        })
        .cloned()
        .collect()
}
