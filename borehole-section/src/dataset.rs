//! Chargement d'un lot de fichiers AGS en un jeu de données unique
//!
//! Parsing par fichier en parallèle (pool rayon borné), puis fusion dans
//! l'ordre d'upload et géolocalisation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use rayon::prelude::*;
use regex::Regex;
use tracing::{info, warn};

use ags4::{AgsError, FileTables, GroupSpecs};

use crate::config::Config;
use crate::error::DatasetError;
use crate::geocode::{geocode, BoreholeLocation};
use crate::merge::{merge, AbbreviationEntry, GeologyInterval, LocationRecord};
use crate::report::LoadReport;
use crate::reproject_lite::GridTransform;

/// Fichier uploadé, déjà décodé
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Décode des octets bruts (UTF-8, ou UTF-16 avec BOM)
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self, AgsError> {
        let name = name.into();
        let content = ags4::decode::decode(&name, data)?;
        Ok(Self { name, content })
    }

    /// Lit un fichier depuis le disque ; le nom retenu est le nom de fichier
    pub fn read(path: &Path) -> Result<Self, AgsError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = std::fs::read(path)?;
        Self::from_bytes(name, &data)
    }
}

/// Jeu de données fusionné et géolocalisé
#[derive(Debug)]
pub struct Dataset {
    pub geology: Vec<GeologyInterval>,
    /// Toutes les lignes LOCA fusionnées, géolocalisées ou non
    pub locations: Vec<LocationRecord>,
    /// Sondages disposant d'une position WGS84
    pub spatial: Vec<BoreholeLocation>,
    pub abbreviations: Vec<AbbreviationEntry>,
    /// Fichiers sources dans l'ordre d'upload
    pub sources: Vec<SourceFile>,
    /// Colonnes appliquées au chargement, réutilisées pour reparser un sondage
    pub specs: GroupSpecs,
    pub report: LoadReport,
}

impl Dataset {
    /// Contenu d'un fichier source, pour reparser un sondage
    pub fn source_content(&self, name: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.content.as_str())
    }

    pub fn location(&self, loca_id: &str) -> Option<&LocationRecord> {
        self.locations.iter().find(|l| l.loca_id == loca_id)
    }

    pub fn spatial_location(&self, loca_id: &str) -> Option<&BoreholeLocation> {
        self.spatial.iter().find(|l| l.loca_id == loca_id)
    }

    /// Sondages géolocalisés, ou `NoLocations` s'il n'y en a aucun
    pub fn require_locations(&self) -> Result<&[BoreholeLocation], DatasetError> {
        if self.spatial.is_empty() {
            return Err(DatasetError::NoLocations {
                rows: self.locations.len(),
            });
        }
        Ok(&self.spatial)
    }

    /// Intervalles d'un sondage triés par toit croissant (toits inconnus en fin)
    pub fn intervals_for(&self, loca_id: &str) -> Vec<&GeologyInterval> {
        let mut intervals: Vec<&GeologyInterval> = self
            .geology
            .iter()
            .filter(|g| g.loca_id == loca_id)
            .collect();
        intervals.sort_by(|a, b| sort_key(a.top).total_cmp(&sort_key(b.top)));
        intervals
    }

    /// Libellé de légende « libellé (code) »
    ///
    /// Libellé : ABBR_DESC du code (de préférence pour GEOL_LEG), sinon les
    /// premiers mots en capitales d'une GEOL_DESC du code, sinon le code.
    pub fn legend_label(&self, code: &str) -> String {
        let matching = || self.abbreviations.iter().filter(|a| a.code == code);
        let abbr = matching()
            .find(|a| a.heading.as_deref().map_or(true, |h| h == "GEOL_LEG"))
            .or_else(|| matching().next())
            .filter(|a| !a.description.is_empty())
            .map(|a| a.description.clone());

        let label = abbr
            .or_else(|| {
                self.geology
                    .iter()
                    .filter(|g| g.legend_code == code)
                    .filter_map(|g| g.description.as_deref())
                    .find_map(capitalised_words)
            })
            .unwrap_or_else(|| code.to_string());
        format!("{} ({})", label, code)
    }

    /// Identifiants regroupés par fichier source, dans l'ordre d'upload
    pub fn ids_by_source(&self, ids: &[String]) -> Vec<(String, Vec<String>)> {
        let mut by_file: HashMap<&str, Vec<String>> = HashMap::new();
        for id in ids {
            if let Some(location) = self.location(id) {
                by_file
                    .entry(location.source_file.as_str())
                    .or_default()
                    .push(id.clone());
            }
        }

        self.sources
            .iter()
            .filter_map(|s| {
                by_file
                    .remove(s.name.as_str())
                    .map(|ids| (s.name.clone(), ids))
            })
            .collect()
    }
}

/// Premiers mots en capitales d'une description (« MADE GROUND », « CLAY »)
fn capitalised_words(description: &str) -> Option<String> {
    static CAPITALS: OnceLock<Option<Regex>> = OnceLock::new();
    let re = CAPITALS
        .get_or_init(|| Regex::new(r"[A-Z]{2,}(?: [A-Z]{2,})*").ok())
        .as_ref()?;
    re.find(description).map(|m| m.as_str().to_string())
}

fn sort_key(depth: Option<f64>) -> f64 {
    depth.unwrap_or(f64::INFINITY)
}

/// Parse chaque fichier dans un pool de `workers` threads, en conservant l'ordre
fn extract_all(
    sources: &[SourceFile],
    config: &Config,
) -> Result<Vec<(String, FileTables)>, DatasetError> {
    let specs = config.groups.specs();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()?;

    Ok(pool.install(|| {
        sources
            .par_iter()
            .map(|s| (s.name.clone(), ags4::extract(&s.name, &s.content, &specs)))
            .collect()
    }))
}

fn record_warnings(report: &mut LoadReport, file: &str, tables: &mut FileTables) {
    for warning in tables.warnings.drain(..) {
        match &warning {
            AgsError::MissingColumns { group, .. } => {
                report.record_group_rejected(file, group, &warning.to_string())
            }
            _ => report.record_warning(file, &warning.to_string()),
        }
    }
}

fn load_sources<T: GridTransform + ?Sized>(
    sources: Vec<SourceFile>,
    config: &Config,
    transform: &T,
    mut report: LoadReport,
    start: Instant,
) -> Result<Dataset, DatasetError> {
    let mut extracted = extract_all(&sources, config)?;
    for (file, tables) in &mut extracted {
        report.record_file_success();
        record_warnings(&mut report, file, tables);
    }

    let merged = merge(extracted, config.suffix_max_len, &mut report);

    let mut missing = Vec::new();
    if merged.geology.is_empty() {
        missing.push("GEOL");
    }
    if merged.locations.is_empty() {
        missing.push("LOCA");
    }
    if !missing.is_empty() {
        warn!(files = sources.len(), missing = ?missing, "no usable data in upload");
        report.record_fatal(&format!("no usable {} data", missing.join("/")));
        report.set_duration(start.elapsed());
        report.finalize();
        return Err(DatasetError::no_valid_data(missing, report));
    }

    let spatial = geocode(&merged.locations, transform, &mut report);

    report.set_duration(start.elapsed());
    report.finalize();
    info!(summary = %report.summary(), "dataset loaded");

    Ok(Dataset {
        geology: merged.geology,
        locations: merged.locations,
        spatial,
        abbreviations: merged.abbreviations,
        sources,
        specs: config.groups.specs(),
        report,
    })
}

/// Construit le jeu de données à partir de fichiers déjà décodés
///
/// Échoue avec `NoValidData` si, après fusion, GEOL ou LOCA est vide ; le
/// rapport `Failed` est joint à l'erreur.
pub fn load_dataset<T: GridTransform + ?Sized>(
    files: &[SourceFile],
    config: &Config,
    transform: &T,
) -> Result<Dataset, DatasetError> {
    load_sources(
        files.to_vec(),
        config,
        transform,
        LoadReport::new(),
        Instant::now(),
    )
}

/// Lit, décode et charge des fichiers du disque
///
/// Un fichier illisible est consigné dans le rapport sans interrompre le lot ;
/// l'erreur n'est propagée que si aucun fichier n'a pu être lu.
pub fn load_paths<T: GridTransform + ?Sized>(
    paths: &[PathBuf],
    config: &Config,
    transform: &T,
) -> Result<Dataset, DatasetError> {
    let start = Instant::now();
    let mut report = LoadReport::new();
    let mut sources = Vec::with_capacity(paths.len());
    let mut first_error = None;

    for path in paths {
        match SourceFile::read(path) {
            Ok(source) => sources.push(source),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read AGS file");
                report.record_file_failure(&path.display().to_string(), &e.to_string());
                first_error.get_or_insert(e);
            }
        }
    }

    if sources.is_empty() {
        if let Some(e) = first_error {
            return Err(e.into());
        }
    }

    load_sources(sources, config, transform, report, start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reproject_lite::NationalGridLite;

    const FILE_A: &str = concat!(
        "\"GROUP\",\"ABBR\"\n\"HEADING\",\"ABBR_HDNG\",\"ABBR_CODE\",\"ABBR_DESC\"\n",
        "\"DATA\",\"GEOL_LEG\",\"CL\",\"London Clay\"\n",
        "\"GROUP\",\"LOCA\"\n\"HEADING\",\"LOCA_ID\",\"LOCA_NATE\",\"LOCA_NATN\",\"LOCA_GL\"\n",
        "\"DATA\",\"BH1\",\"530000\",\"180000\",\"12.5\"\n",
        "\"DATA\",\"BH2\",\"530100\",\"180050\",\"12.1\"\n",
        "\"GROUP\",\"GEOL\"\n\"HEADING\",\"LOCA_ID\",\"GEOL_TOP\",\"GEOL_BASE\",\"GEOL_LEG\",\"GEOL_DESC\"\n",
        "\"DATA\",\"BH1\",\"1.5\",\"6.0\",\"CL\",\"Stiff CLAY\"\n",
        "\"DATA\",\"BH1\",\"0.0\",\"1.5\",\"MG\",\"MADE GROUND of brick\"\n",
        "\"DATA\",\"BH2\",\"0.0\",\"3.0\",\"SA\",\"\"\n",
    );

    const FILE_B: &str = concat!(
        "\"GROUP\",\"LOCA\"\n\"HEADING\",\"LOCA_ID\",\"LOCA_NATE\",\"LOCA_NATN\"\n",
        "\"DATA\",\"BH1\",\"530200\",\"180100\"\n",
        "\"GROUP\",\"GEOL\"\n\"HEADING\",\"LOCA_ID\",\"GEOL_TOP\",\"GEOL_BASE\",\"GEOL_LEG\"\n",
        "\"DATA\",\"BH1\",\"0.0\",\"2.0\",\"CL\"\n",
    );

    fn load(files: &[SourceFile]) -> Result<Dataset, DatasetError> {
        load_dataset(files, &Config::default(), &NationalGridLite::default())
    }

    fn two_files() -> Dataset {
        load(&[
            SourceFile::new("A.ags", FILE_A),
            SourceFile::new("B.ags", FILE_B),
        ])
        .unwrap()
    }

    #[test]
    fn test_merge_scenario() {
        let dataset = two_files();
        let ids: Vec<&str> = dataset.spatial.iter().map(|l| l.loca_id.as_str()).collect();
        assert_eq!(ids, vec!["BH1", "BH2", "BH1_B"]);
        assert!(dataset
            .spatial
            .iter()
            .all(|l| l.lat.is_finite() && l.lon.is_finite()));
        assert_eq!(dataset.report.ids_rewritten, 1);
    }

    #[test]
    fn test_source_map_and_grouping() {
        let dataset = two_files();
        assert_eq!(dataset.source_content("B.ags"), Some(FILE_B));
        assert_eq!(dataset.source_content("C.ags"), None);

        let grouped = dataset.ids_by_source(&[
            "BH1_B".to_string(),
            "BH2".to_string(),
            "BH1".to_string(),
            "ZZZ".to_string(),
        ]);
        assert_eq!(
            grouped,
            vec![
                ("A.ags".to_string(), vec!["BH2".to_string(), "BH1".to_string()]),
                ("B.ags".to_string(), vec!["BH1_B".to_string()]),
            ]
        );
    }

    #[test]
    fn test_intervals_sorted_by_top() {
        let dataset = two_files();
        let tops: Vec<Option<f64>> = dataset.intervals_for("BH1").iter().map(|g| g.top).collect();
        assert_eq!(tops, vec![Some(0.0), Some(1.5)]);
        assert_eq!(dataset.intervals_for("BH1_B").len(), 1);
    }

    #[test]
    fn test_legend_labels() {
        let dataset = two_files();
        assert_eq!(dataset.legend_label("CL"), "London Clay (CL)");
        assert_eq!(dataset.legend_label("MG"), "MADE GROUND (MG)");
        assert_eq!(dataset.legend_label("SA"), "SA (SA)");
    }

    #[test]
    fn test_missing_geol_is_no_valid_data() {
        let content = "\"GROUP\",\"LOCA\"\n\"HEADING\",\"LOCA_ID\"\n\"DATA\",\"TP1\"\n";
        let err = load(&[SourceFile::new("C.ags", content)]).unwrap_err();
        assert!(err.is_no_data());
        assert!(matches!(
            err,
            DatasetError::NoValidData { ref missing, .. } if missing == &["GEOL".to_string()]
        ));

        let report = err.report().unwrap();
        assert_eq!(report.status, crate::report::LoadStatus::Failed);
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.by_group["LOCA"].rows, 1);
        assert!(report
            .errors
            .iter()
            .any(|e| e.level == crate::report::IssueLevel::Fatal && e.message.contains("GEOL")));
    }

    #[test]
    fn test_empty_upload_is_no_valid_data() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::NoValidData { ref missing, .. } if missing.len() == 2
        ));
    }

    #[test]
    fn test_rejected_group_is_reported() {
        let broken = "\"GROUP\",\"GEOL\"\n\"HEADING\",\"LOCA_ID\",\"GEOL_TOP\"\n\"DATA\",\"BH1\",\"0\"\n";
        let dataset = load(&[
            SourceFile::new("A.ags", FILE_A),
            SourceFile::new("broken.ags", broken),
        ])
        .unwrap();
        assert_eq!(dataset.report.by_group["GEOL"].rejected, 1);
        assert_eq!(dataset.report.status, crate::report::LoadStatus::PartialSuccess);
    }

    #[test]
    fn test_unreadable_file_does_not_abort_batch() {
        let dir = std::env::temp_dir().join("borehole_section_load_paths");
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("A.ags");
        std::fs::write(&good, FILE_A).unwrap();
        let bad = dir.join("bad.ags");
        std::fs::write(&bad, b"\"GROUP\",\xFF\xFE\xFD").unwrap();
        let missing = dir.join("missing.ags");

        let dataset = load_paths(
            &[good, bad, missing.clone()],
            &Config::default(),
            &NationalGridLite::default(),
        )
        .unwrap();
        assert_eq!(dataset.report.files_failed, 2);
        assert_eq!(dataset.sources.len(), 1);

        let err = load_paths(&[missing], &Config::default(), &NationalGridLite::default())
            .unwrap_err();
        assert!(matches!(err, DatasetError::Ags(AgsError::Io(_))));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_non_spatial_locations_kept() {
        let content = concat!(
            "\"GROUP\",\"LOCA\"\n\"HEADING\",\"LOCA_ID\",\"LOCA_GL\"\n\"DATA\",\"TP1\",\"9.0\"\n",
            "\"GROUP\",\"GEOL\"\n\"HEADING\",\"LOCA_ID\",\"GEOL_TOP\",\"GEOL_BASE\",\"GEOL_LEG\"\n",
            "\"DATA\",\"TP1\",\"0\",\"1\",\"MG\"\n",
        );
        let dataset = load(&[SourceFile::new("C.ags", content)]).unwrap();
        assert_eq!(dataset.locations.len(), 1);
        assert!(dataset.spatial.is_empty());
        assert!(matches!(
            dataset.require_locations(),
            Err(DatasetError::NoLocations { rows: 1 })
        ));
    }
}
