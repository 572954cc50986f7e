//! Types d'erreurs pour le crate ags4

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture d'un fichier AGS
///
/// Seules `Io` et `Encoding` sont fatales pour un fichier. Les autres variantes
/// décrivent des défauts de structure : elles sont collectées comme warnings
/// et n'interrompent jamais le parsing.
#[derive(Debug, Error)]
pub enum AgsError {
    /// Erreur d'I/O lors de la lecture du fichier
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Contenu non décodable en texte
    #[error("Invalid text encoding in {file}: {reason}")]
    Encoding { file: String, reason: String },

    /// Ligne CSV illisible (quotes non fermées, etc.)
    #[error("Malformed row {line} in {file}: {reason}")]
    MalformedRow {
        file: String,
        line: u64,
        reason: String,
    },

    /// Ligne GROUP sans nom de groupe
    #[error("GROUP row without group name at line {line}")]
    UnnamedGroup { line: u64 },

    /// Groupe contenant des lignes DATA mais aucune ligne HEADING
    #[error("Group {group} has {rows} DATA rows but no HEADING row")]
    MissingHeadings { group: String, rows: usize },

    /// Colonnes obligatoires absentes d'un groupe
    #[error("Group {group} is missing required columns: {}", columns.join(", "))]
    MissingColumns { group: String, columns: Vec<String> },

    /// Ligne HEADING redéfinie pour un groupe déjà ouvert
    #[error("Group {group} redefines its HEADING row: {reason}")]
    HeadingRedefined { group: String, reason: String },
}

impl AgsError {
    /// Crée une erreur d'encodage avec contexte
    pub fn encoding(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encoding {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de ligne malformée
    pub fn malformed_row(file: impl Into<String>, line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de colonnes manquantes
    pub fn missing_columns(group: impl Into<String>, columns: Vec<String>) -> Self {
        Self::MissingColumns {
            group: group.into(),
            columns,
        }
    }

    /// Indique si l'erreur doit interrompre le traitement du fichier
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Encoding { .. })
    }
}
