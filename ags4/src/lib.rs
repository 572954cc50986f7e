//! # ags4
//!
//! Parser pour le format AGS4 (Association of Geotechnical and
//! Geoenvironmental Specialists) utilisé pour les données de sondages.
//!
//! ## Features
//!
//! - Tokenisation CSV (quotes RFC 4180) avec le crate `csv`
//! - Machine à états GROUP/HEADING/UNIT/TYPE/DATA tolérante aux défauts
//! - Coercition numérique pilotée par les codes de type AGS (`fast-float`)
//! - Décodage UTF-8 validé par SIMD (`simdutf8`), UTF-16 avec BOM
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ags4::{extract, GroupSpecs};
//!
//! let tables = extract("site.ags", &content, &GroupSpecs::default());
//! for row in tables.loca.iter().flatten() {
//!     println!("{}: {:?}", row.loca_id, row.grid());
//! }
//! ```

pub mod decode;
pub mod error;
pub mod materialize;
pub mod parser;
pub mod types;

pub use error::AgsError;
pub use materialize::{abbr_rows, geol_rows, loca_rows, materialize, ColumnSpec, Materialized, Value};
pub use parser::{parse_all, parse_group};
pub use types::{
    AbbrRow, CoordinateSource, GeolRow, GroupTable, LocaRow, ParseResult, RawRecord,
};

use memchr::memmem;
use tracing::warn;

/// Colonnes attendues pour les trois groupes exploités
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpecs {
    pub loca: ColumnSpec,
    pub geol: ColumnSpec,
    pub abbr: ColumnSpec,
}

impl Default for GroupSpecs {
    fn default() -> Self {
        Self {
            loca: ColumnSpec::loca(),
            geol: ColumnSpec::geol(),
            abbr: ColumnSpec::abbr(),
        }
    }
}

/// Tables typées d'un fichier. `None` = groupe absent ou rejeté.
#[derive(Debug, Default)]
pub struct FileTables {
    pub loca: Option<Vec<LocaRow>>,
    pub geol: Option<Vec<GeolRow>>,
    pub abbr: Option<Vec<AbbrRow>>,
    /// Défauts de structure et groupes rejetés
    pub warnings: Vec<AgsError>,
}

/// Parse un fichier et matérialise LOCA, GEOL et ABBR
///
/// Un groupe rejeté (colonne obligatoire manquante) ne contribue pas, les
/// autres groupes du fichier restent utilisables.
pub fn extract(file: &str, content: &str, specs: &GroupSpecs) -> FileTables {
    let mut parsed = parse_all(file, content);
    let mut warnings = std::mem::take(&mut parsed.warnings);

    let loca = parsed.group("LOCA").and_then(|t| {
        keep_group(file, "LOCA", materialize::loca_rows(t, &specs.loca), &mut warnings)
    });
    let geol = parsed.group("GEOL").and_then(|t| {
        keep_group(file, "GEOL", materialize::geol_rows(t, &specs.geol), &mut warnings)
    });
    let abbr = parsed.group("ABBR").and_then(|t| {
        keep_group(file, "ABBR", materialize::abbr_rows(t, &specs.abbr), &mut warnings)
    });

    FileTables {
        loca,
        geol,
        abbr,
        warnings,
    }
}

fn keep_group<T>(
    file: &str,
    group: &str,
    result: Result<T, AgsError>,
    warnings: &mut Vec<AgsError>,
) -> Option<T> {
    match result {
        Ok(rows) => Some(rows),
        Err(e) => {
            warn!(file = %file, group = %group, error = %e, "group excluded from merge");
            warnings.push(e);
            None
        }
    }
}

/// Cherche un identifiant entre guillemets dans le contenu brut
///
/// Sert à retrouver le fichier source d'un sondage sans reparser.
pub fn contains_quoted(content: &str, value: &str) -> bool {
    let needle = format!("\"{}\"", value);
    memmem::find(content.as_bytes(), needle.as_bytes()).is_some()
}
