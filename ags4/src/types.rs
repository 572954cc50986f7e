//! Types de données pour le crate ags4

use std::collections::HashMap;

use crate::AgsError;

/// Une ligne DATA brute : heading -> valeur (chaîne vide = null AGS)
pub type RawRecord = HashMap<String, String>;

/// Table extraite d'un groupe AGS nommé
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTable {
    /// Nom du groupe (LOCA, GEOL, ABBR...)
    pub name: String,

    /// Colonnes dans l'ordre de déclaration, sans doublon
    pub headings: Vec<String>,

    /// Unités par colonne (informatif)
    pub units: HashMap<String, String>,

    /// Codes de type AGS par colonne (pilotent la coercition numérique)
    pub types: HashMap<String, String>,

    /// Lignes DATA dans l'ordre du fichier
    pub records: Vec<RawRecord>,
}

impl GroupTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vérifie la présence d'une colonne
    pub fn has_column(&self, heading: &str) -> bool {
        self.headings.iter().any(|h| h == heading)
    }

    /// Colonnes de `required` absentes des headings, dans l'ordre demandé
    pub fn missing_columns<S: AsRef<str>>(&self, required: &[S]) -> Vec<String> {
        required
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| !self.has_column(c))
            .map(str::to_string)
            .collect()
    }

    /// Code de type AGS d'une colonne
    pub fn type_of(&self, heading: &str) -> Option<&str> {
        self.types.get(heading).map(String::as_str)
    }

    /// Valeurs brutes d'une colonne (chaîne vide si absente)
    pub fn column<'a>(&'a self, heading: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.records
            .iter()
            .map(move |r| r.get(heading).map(String::as_str).unwrap_or(""))
    }
}

/// Résultat du parsing de tous les groupes d'un fichier
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Groupes valides indexés par nom
    pub groups: HashMap<String, GroupTable>,

    /// Noms de groupes dans l'ordre de première apparition
    pub order: Vec<String>,

    /// Défauts de structure rencontrés (non fatals)
    pub warnings: Vec<AgsError>,
}

impl ParseResult {
    pub fn group(&self, name: &str) -> Option<&GroupTable> {
        self.groups.get(name)
    }

    /// Retire un groupe du résultat
    pub fn take(&mut self, name: &str) -> Option<GroupTable> {
        self.groups.remove(name)
    }
}

/// Ligne LOCA typée, telle que fournie par un fichier (avant fusion)
#[derive(Debug, Clone, PartialEq)]
pub struct LocaRow {
    pub loca_id: String,
    pub ground_level: Option<f64>,
    pub final_depth: Option<f64>,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl LocaRow {
    /// Paire Easting/Northing complète
    pub fn grid(&self) -> Option<(f64, f64)> {
        self.easting.zip(self.northing)
    }

    /// Paire latitude/longitude complète
    pub fn geographic(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }

    /// La paire géographique est dans [-90,90]x[-180,180]
    pub fn geographic_in_range(&self) -> bool {
        self.geographic()
            .is_some_and(|(lat, lon)| (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon))
    }

    /// Source de coordonnées retenue pour cette ligne
    pub fn coordinate_source(&self) -> CoordinateSource {
        if self.grid().is_some() {
            CoordinateSource::NationalGrid
        } else if self.geographic().is_some() {
            CoordinateSource::Geographic {
                in_range: self.geographic_in_range(),
            }
        } else {
            CoordinateSource::None
        }
    }
}

/// Origine des coordonnées d'une ligne LOCA, par ordre de priorité
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    /// Easting/Northing OSGB36
    NationalGrid,
    /// Latitude/longitude directes (hors plage = signalée, pas supprimée)
    Geographic { in_range: bool },
    /// Aucune paire exploitable : usage non spatial uniquement
    None,
}

/// Intervalle GEOL typé
#[derive(Debug, Clone, PartialEq)]
pub struct GeolRow {
    pub loca_id: String,
    pub top: Option<f64>,
    pub base: Option<f64>,
    pub legend_code: String,
    pub description: Option<String>,
}

impl GeolRow {
    /// Base au-dessus du toit (non vérifié par le format)
    pub fn is_inverted(&self) -> bool {
        matches!((self.top, self.base), (Some(t), Some(b)) if b < t)
    }
}

/// Entrée ABBR : code -> description
#[derive(Debug, Clone, PartialEq)]
pub struct AbbrRow {
    pub code: String,
    pub description: String,
    pub heading: Option<String>,
}
