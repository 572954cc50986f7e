//! Log d'un sondage isolé
//!
//! Le fichier source du sondage est reparsé (groupes LOCA et GEOL seuls)
//! pour retrouver ses intervalles sous l'identifiant d'origine.

use ags4::{contains_quoted, geol_rows, loca_rows, parse_group, AgsError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::error::DatasetError;
use crate::section::profile::{group_units, LegendEntry, ProfileInterval};
use crate::section::LithologyUnit;

/// Log vertical d'un sondage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoreholeLog {
    /// Identifiant demandé (éventuellement suffixé)
    pub loca_id: String,
    /// Identifiant dans le fichier source
    pub original_loca_id: String,
    pub source_file: String,
    pub ground_level: f64,
    /// Triés par toit croissant
    pub intervals: Vec<ProfileInterval>,
    pub units: Vec<LithologyUnit>,
    pub legend: Vec<LegendEntry>,
    /// (min, max) des altitudes, cote du terrain naturel comprise
    pub elevation_range: (f64, f64),
}

impl BoreholeLog {
    /// Construit le log de `loca_id`
    ///
    /// Le fichier est celui de la ligne LOCA fusionnée ; si l'identifiant n'y
    /// figure pas, le premier fichier contenant `"loca_id"` est utilisé.
    pub fn build(loca_id: &str, dataset: &Dataset) -> Result<Self, DatasetError> {
        let (file, original) = match dataset.location(loca_id) {
            Some(location) => (location.source_file.as_str(), location.original_loca_id.as_str()),
            None => dataset
                .sources
                .iter()
                .find(|s| contains_quoted(&s.content, loca_id))
                .map(|s| (s.name.as_str(), loca_id))
                .ok_or_else(|| DatasetError::BoreholeNotFound {
                    loca_id: loca_id.to_string(),
                })?,
        };
        let content = dataset
            .source_content(file)
            .ok_or_else(|| DatasetError::BoreholeNotFound {
                loca_id: loca_id.to_string(),
            })?;
        let no_data = || DatasetError::NoBoreholeData {
            loca_id: loca_id.to_string(),
            file: file.to_string(),
        };

        // Mêmes colonnes qu'au chargement : un groupe rejeté n'a pas de données
        let specs = &dataset.specs;
        let rejected = |e: AgsError| {
            warn!(file, loca_id, error = %e, "group rejected while building log");
            no_data()
        };
        let loca = match parse_group(file, content, "LOCA") {
            Some(table) => loca_rows(&table, &specs.loca).map_err(rejected)?,
            None => Vec::new(),
        };
        let mut geol = match parse_group(file, content, "GEOL") {
            Some(table) => geol_rows(&table, &specs.geol).map_err(rejected)?,
            None => Vec::new(),
        };
        geol.retain(|g| g.loca_id == original);
        let location = loca.iter().find(|l| l.loca_id == original).ok_or_else(no_data)?;
        if geol.is_empty() {
            return Err(no_data());
        }

        geol.sort_by(|a, b| {
            let key = |d: Option<f64>| d.unwrap_or(f64::INFINITY);
            key(a.top).total_cmp(&key(b.top))
        });
        let ground_level = location.ground_level.unwrap_or(0.0);
        let intervals: Vec<ProfileInterval> = geol
            .iter()
            .map(|g| ProfileInterval::new(ground_level, g.top, g.base, &g.legend_code, g.description.as_deref()))
            .collect();
        let units = group_units(&intervals);

        let mut legend: Vec<LegendEntry> = Vec::new();
        for interval in &intervals {
            if !legend.iter().any(|e| e.code == interval.legend_code) {
                legend.push(LegendEntry {
                    code: interval.legend_code.clone(),
                    label: dataset.legend_label(&interval.legend_code),
                });
            }
        }

        let elevation_range = intervals
            .iter()
            .flat_map(|i| [i.top_elevation, i.base_elevation])
            .flatten()
            .fold((ground_level, ground_level), |(lo, hi), e| (lo.min(e), hi.max(e)));

        debug!(loca_id, file, intervals = intervals.len(), "borehole log built");
        Ok(Self {
            loca_id: loca_id.to_string(),
            original_loca_id: original.to_string(),
            source_file: file.to_string(),
            ground_level,
            intervals,
            units,
            legend,
            elevation_range,
        })
    }

    /// Profondeur totale décrite (base max − toit min)
    pub fn total_depth(&self) -> Option<f64> {
        let tops = self.intervals.iter().filter_map(|i| i.top);
        let bases = self.intervals.iter().filter_map(|i| i.base);
        let min_top = tops.fold(None, |m: Option<f64>, t| Some(m.map_or(t, |m| m.min(t))))?;
        let max_base = bases.fold(None, |m: Option<f64>, b| Some(m.map_or(b, |m| m.max(b))))?;
        Some((max_base - min_top).abs())
    }
}
