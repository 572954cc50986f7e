//! Conversion des groupes LOCA, GEOL et ABBR en lignes typées

use tracing::warn;

use super::{materialize, ColumnSpec, Materialized};
use crate::types::{AbbrRow, GeolRow, GroupTable, LocaRow};
use crate::AgsError;

fn required_text(m: &Materialized, row: usize, column: &str) -> Option<String> {
    m.text(row, column).map(str::to_string)
}

/// Lignes LOCA typées (les lignes sans LOCA_ID sont ignorées)
pub fn loca_rows(table: &GroupTable, spec: &ColumnSpec) -> Result<Vec<LocaRow>, AgsError> {
    let m = materialize(table, spec)?;
    let mut rows = Vec::with_capacity(m.len());
    let mut out_of_range = 0usize;

    for i in 0..m.len() {
        let Some(loca_id) = required_text(&m, i, "LOCA_ID") else {
            warn!(group = %m.name, row = i, "LOCA row without LOCA_ID skipped");
            continue;
        };
        let row = LocaRow {
            loca_id,
            ground_level: m.number(i, "LOCA_GL"),
            final_depth: m.number(i, "LOCA_FDEP"),
            easting: m.number(i, "LOCA_NATE"),
            northing: m.number(i, "LOCA_NATN"),
            lat: m.number(i, "LOCA_LAT"),
            lon: m.number(i, "LOCA_LON"),
        };
        if row.grid().is_none() && row.geographic().is_some() && !row.geographic_in_range() {
            out_of_range += 1;
        }
        rows.push(row);
    }

    if out_of_range > 0 {
        warn!(rows = out_of_range, "LOCA latitude/longitude out of range");
    }
    Ok(rows)
}

/// Intervalles GEOL typés, dans l'ordre du fichier
pub fn geol_rows(table: &GroupTable, spec: &ColumnSpec) -> Result<Vec<GeolRow>, AgsError> {
    let m = materialize(table, spec)?;
    let mut rows = Vec::with_capacity(m.len());

    for i in 0..m.len() {
        let Some(loca_id) = required_text(&m, i, "LOCA_ID") else {
            warn!(group = %m.name, row = i, "GEOL row without LOCA_ID skipped");
            continue;
        };
        rows.push(GeolRow {
            loca_id,
            top: m.number(i, "GEOL_TOP"),
            base: m.number(i, "GEOL_BASE"),
            legend_code: required_text(&m, i, "GEOL_LEG").unwrap_or_default(),
            description: required_text(&m, i, "GEOL_DESC"),
        });
    }

    let inverted = rows.iter().filter(|r| r.is_inverted()).count();
    if inverted > 0 {
        warn!(rows = inverted, "GEOL intervals with base above top kept as is");
    }
    Ok(rows)
}

/// Entrées ABBR typées (les codes vides sont ignorés)
pub fn abbr_rows(table: &GroupTable, spec: &ColumnSpec) -> Result<Vec<AbbrRow>, AgsError> {
    let m = materialize(table, spec)?;
    Ok((0..m.len())
        .filter_map(|i| {
            Some(AbbrRow {
                code: required_text(&m, i, "ABBR_CODE")?,
                description: required_text(&m, i, "ABBR_DESC").unwrap_or_default(),
                heading: required_text(&m, i, "ABBR_HDNG"),
            })
        })
        .collect())
}
