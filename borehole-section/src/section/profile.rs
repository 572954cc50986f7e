//! Données de coupe géologique prêtes à dessiner
//!
//! Altitude = cote du terrain naturel − |profondeur| ; cote absente : 0.0.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::section::SectionLine;

/// Intervalle géologique positionné en altitude
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileInterval {
    pub top: Option<f64>,
    pub base: Option<f64>,
    pub top_elevation: Option<f64>,
    pub base_elevation: Option<f64>,
    pub legend_code: String,
    pub description: Option<String>,
}

impl ProfileInterval {
    pub fn new(
        ground_level: f64,
        top: Option<f64>,
        base: Option<f64>,
        legend_code: &str,
        description: Option<&str>,
    ) -> Self {
        Self {
            top,
            base,
            top_elevation: top.map(|d| elevation(ground_level, d)),
            base_elevation: base.map(|d| elevation(ground_level, d)),
            legend_code: legend_code.to_string(),
            description: description.map(str::to_string),
        }
    }
}

pub fn elevation(ground_level: f64, depth: f64) -> f64 {
    ground_level - depth.abs()
}

/// Intervalles consécutifs de même code de légende
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LithologyUnit {
    pub legend_code: String,
    pub top_elevation: Option<f64>,
    pub base_elevation: Option<f64>,
    /// Milieu du groupe, position de l'étiquette
    pub label_elevation: Option<f64>,
    pub intervals: usize,
}

/// Regroupe les intervalles (déjà triés par toit) en unités
pub fn group_units(intervals: &[ProfileInterval]) -> Vec<LithologyUnit> {
    let mut units: Vec<LithologyUnit> = Vec::new();
    for interval in intervals {
        match units.last_mut() {
            Some(unit) if unit.legend_code == interval.legend_code => {
                unit.base_elevation = interval.base_elevation;
                unit.intervals += 1;
            }
            _ => units.push(LithologyUnit {
                legend_code: interval.legend_code.clone(),
                top_elevation: interval.top_elevation,
                base_elevation: interval.base_elevation,
                label_elevation: None,
                intervals: 1,
            }),
        }
    }
    for unit in &mut units {
        unit.label_elevation = unit
            .top_elevation
            .zip(unit.base_elevation)
            .map(|(top, base)| (top + base) / 2.0);
    }
    units
}

/// Colonne d'un sondage sur la coupe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileColumn {
    pub loca_id: String,
    /// Abscisse le long de l'axe (m)
    pub distance: f64,
    pub ground_level: f64,
    pub intervals: Vec<ProfileInterval>,
    pub units: Vec<LithologyUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub code: String,
    pub label: String,
}

/// Coupe complète, colonnes dans l'ordre de l'axe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionProfile {
    pub columns: Vec<ProfileColumn>,
    /// Codes dans l'ordre de première apparition
    pub legend: Vec<LegendEntry>,
    /// (min, max) des altitudes de toit et de base
    pub elevation_range: Option<(f64, f64)>,
}

/// Construit la coupe d'une sélection ordonnée
pub fn build_profile(line: &SectionLine, dataset: &Dataset) -> SectionProfile {
    let columns: Vec<ProfileColumn> = line
        .stations
        .iter()
        .map(|station| {
            let ground_level = dataset
                .location(&station.loca_id)
                .and_then(|l| l.ground_level)
                .unwrap_or(0.0);
            let intervals: Vec<ProfileInterval> = dataset
                .intervals_for(&station.loca_id)
                .into_iter()
                .map(|g| {
                    ProfileInterval::new(
                        ground_level,
                        g.top,
                        g.base,
                        &g.legend_code,
                        g.description.as_deref(),
                    )
                })
                .collect();
            let units = group_units(&intervals);
            ProfileColumn {
                loca_id: station.loca_id.clone(),
                distance: station.distance,
                ground_level,
                intervals,
                units,
            }
        })
        .collect();

    let mut legend: Vec<LegendEntry> = Vec::new();
    for interval in columns.iter().flat_map(|c| &c.intervals) {
        if !legend.iter().any(|e| e.code == interval.legend_code) {
            legend.push(LegendEntry {
                code: interval.legend_code.clone(),
                label: dataset.legend_label(&interval.legend_code),
            });
        }
    }

    let elevation_range = columns
        .iter()
        .flat_map(|c| &c.intervals)
        .flat_map(|i| [i.top_elevation, i.base_elevation])
        .flatten()
        .fold(None, |range: Option<(f64, f64)>, e| match range {
            Some((lo, hi)) => Some((lo.min(e), hi.max(e))),
            None => Some((e, e)),
        });

    SectionProfile {
        columns,
        legend,
        elevation_range,
    }
}
