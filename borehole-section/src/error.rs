//! Types d'erreurs pour le chargement d'un lot de fichiers

use thiserror::Error;

use crate::report::LoadReport;

/// Conditions terminales d'un chargement
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Aucune donnée GEOL ou LOCA exploitable après fusion
    ///
    /// Le rapport, au statut `Failed`, détaille les fichiers et groupes écartés.
    #[error("No valid data: missing {}", missing.join(", "))]
    NoValidData {
        missing: Vec<String>,
        report: Box<LoadReport>,
    },

    /// Aucun sondage géolocalisable
    #[error("No valid location data: none of {rows} LOCA rows could be geocoded")]
    NoLocations { rows: usize },

    /// Impossible de créer le pool de parsing
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Sondage absent de tous les fichiers du lot
    #[error("Borehole {loca_id} not found in any AGS file")]
    BoreholeNotFound { loca_id: String },

    /// Sondage trouvé mais sans ligne LOCA ou GEOL exploitable
    #[error("No data found for borehole {loca_id} in {file}")]
    NoBoreholeData { loca_id: String, file: String },

    /// Fichier illisible, propagé quand le lot n'en contient qu'un
    #[error(transparent)]
    Ags(#[from] ags4::AgsError),
}

impl DatasetError {
    /// Crée une erreur d'absence de données
    pub fn no_valid_data<S: Into<String>>(
        missing: impl IntoIterator<Item = S>,
        report: LoadReport,
    ) -> Self {
        Self::NoValidData {
            missing: missing.into_iter().map(Into::into).collect(),
            report: Box::new(report),
        }
    }

    /// Rapport de chargement joint à l'erreur, le cas échéant
    pub fn report(&self) -> Option<&LoadReport> {
        match self {
            Self::NoValidData { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Indique une absence de données (erreur utilisateur, pas environnementale)
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoValidData { .. } | Self::NoLocations { .. })
    }
}
