//! Configuration du système

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

use anyhow::{Context, Result};

use ags4::{ColumnSpec, GroupSpecs};

use crate::reproject_lite::GridBounds;

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Colonnes attendues par groupe AGS
    pub groups: GroupsConfig,

    /// Taille du pool de parsing parallèle
    pub workers: usize,

    /// Longueur maximale du suffixe de fichier (caractères)
    pub suffix_max_len: usize,

    /// Demi-largeur du couloir de sélection (m)
    pub corridor_half_width_m: f64,

    /// Prolongement de la ligne de coupe, en fraction de l'étendue projetée
    pub section_extension: f64,

    /// Nombre maximal d'entrées par cache
    pub cache_max_entries: usize,

    /// Emprise de validité de la grille nationale
    pub grid_bounds: GridBounds,

    /// Utiliser PROJ plutôt que reproject_lite (feature `reproject`)
    pub use_proj: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groups: GroupsConfig::default(),
            workers: 4,
            suffix_max_len: 19,
            corridor_half_width_m: 50.0,
            section_extension: 0.2,
            cache_max_entries: 1000,
            grid_bounds: GridBounds::default(),
            use_proj: false,
        }
    }
}

/// Colonnes des groupes LOCA, GEOL et ABBR
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GroupsConfig {
    #[serde(rename = "LOCA")]
    pub loca: GroupColumns,
    #[serde(rename = "GEOL")]
    pub geol: GroupColumns,
    #[serde(rename = "ABBR")]
    pub abbr: GroupColumns,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            loca: ColumnSpec::loca().into(),
            geol: ColumnSpec::geol().into(),
            abbr: ColumnSpec::abbr().into(),
        }
    }
}

impl GroupsConfig {
    /// Spécifications de colonnes pour le parser
    pub fn specs(&self) -> GroupSpecs {
        GroupSpecs {
            loca: self.loca.clone().into(),
            geol: self.geol.clone().into(),
            abbr: self.abbr.clone().into(),
        }
    }
}

/// Colonnes d'un groupe
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GroupColumns {
    /// Colonnes obligatoires (groupe rejeté sinon)
    pub required: Vec<String>,

    /// Colonnes conservées si présentes
    #[serde(default)]
    pub optional: Vec<String>,

    /// Colonnes converties en nombre même sans ligne TYPE
    #[serde(default)]
    pub numeric: Vec<String>,
}

impl From<ColumnSpec> for GroupColumns {
    fn from(spec: ColumnSpec) -> Self {
        Self {
            required: spec.required,
            optional: spec.optional,
            numeric: spec.numeric,
        }
    }
}

impl From<GroupColumns> for ColumnSpec {
    fn from(columns: GroupColumns) -> Self {
        Self {
            required: columns.required,
            optional: columns.optional,
            numeric: columns.numeric,
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config
            .validate()
            .context(format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "strict" => Self::load_embedded(include_str!("presets/strict.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: default, strict", preset),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse embedded config")?;
        config.validate()?;
        Ok(config)
    }

    /// Charge la configuration depuis l'environnement (et `.env` s'il existe)
    ///
    /// `AGS_CONFIG` désigne un fichier JSON, sinon `AGS_PRESET` (défaut :
    /// `default`). `AGS_WORKERS`, `AGS_CORRIDOR_M` et `AGS_USE_PROJ`
    /// surchargent ensuite les valeurs chargées.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match std::env::var("AGS_CONFIG") {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => {
                let preset = std::env::var("AGS_PRESET").unwrap_or_else(|_| "default".into());
                Self::from_preset(&preset)?
            }
        };

        if let Some(workers) = std::env::var("AGS_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.workers = workers;
        }
        if let Some(width) = std::env::var("AGS_CORRIDOR_M")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.corridor_half_width_m = width;
        }
        if let Some(use_proj) = std::env::var("AGS_USE_PROJ")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.use_proj = use_proj;
        }

        config.validate()?;
        Ok(config)
    }

    /// Vérifie la cohérence des valeurs numériques
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.suffix_max_len == 0 {
            anyhow::bail!("suffix_max_len must be at least 1");
        }
        let b = &self.grid_bounds;
        let ordered = |min: f64, max: f64| min.partial_cmp(&max) == Some(Ordering::Less);
        if !ordered(b.min_easting, b.max_easting) || !ordered(b.min_northing, b.max_northing) {
            anyhow::bail!(
                "grid_bounds must satisfy min < max, got easting {}..{} northing {}..{}",
                b.min_easting,
                b.max_easting,
                b.min_northing,
                b.max_northing
            );
        }
        if self.corridor_half_width_m.is_nan() || self.corridor_half_width_m <= 0.0 {
            anyhow::bail!(
                "corridor_half_width_m must be positive, got {}",
                self.corridor_half_width_m
            );
        }
        if self.section_extension.is_nan() || self.section_extension < 0.0 {
            anyhow::bail!(
                "section_extension must be non-negative, got {}",
                self.section_extension
            );
        }
        Ok(())
    }
}
