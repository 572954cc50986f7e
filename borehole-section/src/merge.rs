//! Fusion multi-fichiers des tables LOCA, GEOL et ABBR
//!
//! Les fichiers sont traités dans l'ordre d'upload. Un LOCA_ID déjà vu est
//! renommé `{id}_{suffixe}` ; les lignes GEOL du même fichier suivent ce
//! renommage. Le résultat dépend donc de l'ordre des fichiers.
//!
//! Un LOCA_ID répété dans un même fichier est renommé comme une collision,
//! mais les lignes GEOL de ce fichier restent rattachées à sa première
//! occurrence : rien dans GEOL ne distingue les deux sondages. Un warning
//! est consigné dans le rapport.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ags4::FileTables;
use tracing::{debug, info, warn};

use crate::report::LoadReport;

/// Ligne LOCA fusionnée (coordonnées géographiques pas encore calculées)
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    /// Identifiant unique dans le lot
    pub loca_id: String,
    /// Identifiant tel qu'écrit dans le fichier source
    pub original_loca_id: String,
    pub source_file: String,
    pub ground_level: Option<f64>,
    pub final_depth: Option<f64>,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Intervalle géologique fusionné
#[derive(Debug, Clone, PartialEq)]
pub struct GeologyInterval {
    /// Identifiant du sondage après renommage
    pub loca_id: String,
    pub original_loca_id: String,
    pub source_file: String,
    /// Profondeurs sous le terrain naturel (m)
    pub top: Option<f64>,
    pub base: Option<f64>,
    pub legend_code: String,
    pub description: Option<String>,
}

/// Entrée de la table d'abréviations
#[derive(Debug, Clone, PartialEq)]
pub struct AbbreviationEntry {
    pub code: String,
    pub description: String,
    /// Colonne à laquelle s'applique le code (ABBR_HDNG)
    pub heading: Option<String>,
    pub source_file: String,
}

/// Tables fusionnées
#[derive(Debug, Default)]
pub struct MergedTables {
    pub locations: Vec<LocationRecord>,
    pub geology: Vec<GeologyInterval>,
    pub abbreviations: Vec<AbbreviationEntry>,
}

/// Suffixe de collision : nom de fichier sans extension, tronqué
pub fn file_suffix(file: &str, max_len: usize) -> String {
    let name = Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| file.into());
    let stem = match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => &name[..],
    };
    stem.chars().take(max_len).collect()
}

/// Identifiant libre dérivé de `id` pour un fichier de suffixe `suffix`
fn unique_id(id: &str, suffix: &str, taken: &HashSet<String>) -> String {
    let candidate = format!("{}_{}", id, suffix);
    if !taken.contains(&candidate) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let next = format!("{}_{}", candidate, n);
        if !taken.contains(&next) {
            return next;
        }
        n += 1;
    }
}

/// Fusionne les tables de chaque fichier, dans l'ordre donné
pub fn merge(
    files: Vec<(String, FileTables)>,
    suffix_max_len: usize,
    report: &mut LoadReport,
) -> MergedTables {
    let mut merged = MergedTables::default();
    let mut taken: HashSet<String> = HashSet::new();

    for (file, tables) in files {
        let suffix = file_suffix(&file, suffix_max_len);
        // Renommages propres à ce fichier : original -> nouvel identifiant
        let mut renamed: HashMap<String, String> = HashMap::new();

        if let Some(rows) = tables.loca {
            report.record_group("LOCA", rows.len());
            for row in rows {
                let loca_id = if taken.contains(&row.loca_id) {
                    let rewritten = unique_id(&row.loca_id, &suffix, &taken);
                    debug!(file = %file, from = %row.loca_id, to = %rewritten, "LOCA_ID collision");
                    report.record_id_rewrite(&file, &row.loca_id, &rewritten);
                    rewritten
                } else {
                    row.loca_id.clone()
                };
                taken.insert(loca_id.clone());
                if renamed.contains_key(&row.loca_id) {
                    warn!(file = %file, loca_id = %row.loca_id, "LOCA_ID repeated within file");
                    report.record_warning(
                        &file,
                        &format!(
                            "LOCA_ID {} repeated within file, GEOL rows stay with its first occurrence",
                            row.loca_id
                        ),
                    );
                } else {
                    renamed.insert(row.loca_id.clone(), loca_id.clone());
                }

                merged.locations.push(LocationRecord {
                    loca_id,
                    original_loca_id: row.loca_id,
                    source_file: file.clone(),
                    ground_level: row.ground_level,
                    final_depth: row.final_depth,
                    easting: row.easting,
                    northing: row.northing,
                    lat: row.lat,
                    lon: row.lon,
                });
            }
        }

        if let Some(rows) = tables.geol {
            report.record_group("GEOL", rows.len());
            merged.geology.extend(rows.into_iter().map(|row| GeologyInterval {
                loca_id: renamed
                    .get(&row.loca_id)
                    .cloned()
                    .unwrap_or_else(|| row.loca_id.clone()),
                original_loca_id: row.loca_id,
                source_file: file.clone(),
                top: row.top,
                base: row.base,
                legend_code: row.legend_code,
                description: row.description,
            }));
        }

        if let Some(rows) = tables.abbr {
            report.record_group("ABBR", rows.len());
            merged
                .abbreviations
                .extend(rows.into_iter().map(|row| AbbreviationEntry {
                    code: row.code,
                    description: row.description,
                    heading: row.heading,
                    source_file: file.clone(),
                }));
        }
    }

    info!(
        locations = merged.locations.len(),
        geology = merged.geology.len(),
        abbreviations = merged.abbreviations.len(),
        "merged AGS tables"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use ags4::{GeolRow, LocaRow};

    fn loca(id: &str) -> LocaRow {
        LocaRow {
            loca_id: id.to_string(),
            ground_level: None,
            final_depth: None,
            easting: Some(530000.0),
            northing: Some(180000.0),
            lat: None,
            lon: None,
        }
    }

    fn geol(id: &str) -> GeolRow {
        GeolRow {
            loca_id: id.to_string(),
            top: Some(0.0),
            base: Some(1.0),
            legend_code: "CLAY".to_string(),
            description: None,
        }
    }

    fn file(name: &str, ids: &[&str], geol_ids: &[&str]) -> (String, FileTables) {
        (
            name.to_string(),
            FileTables {
                loca: Some(ids.iter().map(|id| loca(id)).collect()),
                geol: Some(geol_ids.iter().map(|id| geol(id)).collect()),
                abbr: None,
                warnings: Vec::new(),
            },
        )
    }

    fn ids(merged: &MergedTables) -> Vec<&str> {
        merged.locations.iter().map(|l| l.loca_id.as_str()).collect()
    }

    #[test]
    fn test_file_suffix() {
        assert_eq!(file_suffix("B.ags", 19), "B");
        assert_eq!(file_suffix("dir/site.v2.ags", 19), "site.v2");
        assert_eq!(file_suffix("A_very_long_file_name_here.ags", 19), "A_very_long_file_na");
        assert_eq!(file_suffix("noext", 19), "noext");
        assert_eq!(file_suffix(".ags", 19), ".ags");
        assert_eq!(file_suffix("Forage-é.ags", 7), "Forage-");
    }

    #[test]
    fn test_collision_rewrites_later_file() {
        let mut report = LoadReport::new();
        let merged = merge(
            vec![file("A.ags", &["BH1", "BH2"], &[]), file("B.ags", &["BH1"], &[])],
            19,
            &mut report,
        );
        assert_eq!(ids(&merged), vec!["BH1", "BH2", "BH1_B"]);
        assert_eq!(merged.locations[0].original_loca_id, "BH1");
        assert_eq!(merged.locations[2].original_loca_id, "BH1");
        assert_eq!(merged.locations[2].source_file, "B.ags");
        assert_eq!(report.ids_rewritten, 1);
    }

    #[test]
    fn test_upload_order_decides_winner() {
        let mut report = LoadReport::new();
        let merged = merge(
            vec![file("B.ags", &["BH1"], &[]), file("A.ags", &["BH1", "BH2"], &[])],
            19,
            &mut report,
        );
        assert_eq!(ids(&merged), vec!["BH1", "BH1_A", "BH2"]);
    }

    #[test]
    fn test_rewritten_id_itself_taken() {
        let mut report = LoadReport::new();
        let merged = merge(
            vec![
                file("A.ags", &["BH1", "BH1_B"], &[]),
                file("B.ags", &["BH1"], &[]),
                file("B.ags", &["BH1"], &[]),
            ],
            19,
            &mut report,
        );
        assert_eq!(ids(&merged), vec!["BH1", "BH1_B", "BH1_B_2", "BH1_B_3"]);
    }

    #[test]
    fn test_duplicate_within_one_file() {
        let mut report = LoadReport::new();
        let merged = merge(
            vec![file("A.ags", &["BH1", "BH1"], &["BH1", "BH1"])],
            19,
            &mut report,
        );
        assert_eq!(ids(&merged), vec!["BH1", "BH1_A"]);
        assert!(merged.geology.iter().all(|g| g.loca_id == "BH1"));

        assert_eq!(report.ids_rewritten, 1);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.message.contains("repeated within file")));
    }

    #[test]
    fn test_geol_follows_file_scoped_rename() {
        let mut report = LoadReport::new();
        let merged = merge(
            vec![
                file("A.ags", &["BH1"], &["BH1"]),
                file("B.ags", &["BH1"], &["BH1", "BH9"]),
            ],
            19,
            &mut report,
        );
        let geology: Vec<(&str, &str)> = merged
            .geology
            .iter()
            .map(|g| (g.loca_id.as_str(), g.original_loca_id.as_str()))
            .collect();
        assert_eq!(
            geology,
            vec![("BH1", "BH1"), ("BH1_B", "BH1"), ("BH9", "BH9")]
        );
    }

    #[test]
    fn test_missing_groups_are_skipped() {
        let mut report = LoadReport::new();
        let tables = FileTables::default();
        let merged = merge(vec![("C.ags".to_string(), tables)], 19, &mut report);
        assert!(merged.locations.is_empty());
        assert!(merged.geology.is_empty());
        assert_eq!(report.total_rows(), 0);
    }
}
