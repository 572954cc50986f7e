//! Rapport de chargement avec graceful degradation
//!
//! Collecte les fichiers en échec, les groupes rejetés, les lignes
//! abandonnées et les warnings de structure d'un lot de fichiers AGS.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

/// Statut global du chargement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    /// Chargement réussi sans erreur
    Success,
    /// Chargement réussi avec des erreurs non fatales
    PartialSuccess,
    /// Aucune donnée exploitable
    Failed,
}

/// Niveau de sévérité
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueLevel {
    /// Aucune donnée exploitable pour le lot
    Fatal,
    /// Fichier ou groupe écarté
    Error,
    /// Donnée conservée avec dégradation
    Warning,
}

/// Problème rencontré, avec son contexte
#[derive(Debug, Clone, Serialize)]
pub struct LoadIssue {
    pub level: IssueLevel,
    /// Fichier source (optionnel)
    pub file: Option<String>,
    /// Groupe AGS concerné (optionnel)
    pub group: Option<String>,
    /// Sondage concerné (optionnel)
    pub loca_id: Option<String>,
    pub message: String,
}

impl LoadIssue {
    fn new(level: IssueLevel, file: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level,
            file: file.map(str::to_string),
            group: None,
            loca_id: None,
            message: message.into(),
        }
    }
}

/// Statistiques par groupe AGS
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupStats {
    /// Fichiers ayant contribué ce groupe
    pub files: usize,
    /// Fichiers dont le groupe a été rejeté
    pub rejected: usize,
    /// Lignes fusionnées
    pub rows: usize,
}

/// Rapport complet de chargement
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Durée du chargement
    pub duration_secs: f64,
    /// Statut global
    pub status: LoadStatus,

    /// Nombre de fichiers traités
    pub files_processed: usize,
    /// Nombre de fichiers illisibles
    pub files_failed: usize,
    /// Identifiants LOCA renommés pour collision
    pub ids_rewritten: usize,
    /// Sondages écartés de l'ensemble spatial
    pub locations_dropped: usize,

    /// Statistiques par groupe
    pub by_group: HashMap<String, GroupStats>,

    /// Liste des erreurs
    pub errors: Vec<LoadIssue>,
    /// Liste des warnings
    pub warnings: Vec<LoadIssue>,
}

impl Default for LoadReport {
    fn default() -> Self {
        Self {
            duration_secs: 0.0,
            status: LoadStatus::Success,
            files_processed: 0,
            files_failed: 0,
            ids_rewritten: 0,
            locations_dropped: 0,
            by_group: HashMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre un fichier lu avec succès
    pub fn record_file_success(&mut self) {
        self.files_processed += 1;
    }

    /// Enregistre un fichier illisible (I/O ou encodage)
    pub fn record_file_failure(&mut self, file: &str, message: &str) {
        self.files_processed += 1;
        self.files_failed += 1;
        self.errors
            .push(LoadIssue::new(IssueLevel::Error, Some(file), message));
    }

    /// Enregistre la contribution d'un groupe
    pub fn record_group(&mut self, group: &str, rows: usize) {
        let stats = self.by_group.entry(group.to_string()).or_default();
        stats.files += 1;
        stats.rows += rows;
    }

    /// Enregistre un groupe rejeté pour un fichier
    pub fn record_group_rejected(&mut self, file: &str, group: &str, reason: &str) {
        self.by_group.entry(group.to_string()).or_default().rejected += 1;
        let mut issue = LoadIssue::new(IssueLevel::Error, Some(file), reason);
        issue.group = Some(group.to_string());
        self.errors.push(issue);
    }

    /// Enregistre un warning de structure
    pub fn record_warning(&mut self, file: &str, message: &str) {
        self.warnings
            .push(LoadIssue::new(IssueLevel::Warning, Some(file), message));
    }

    /// Enregistre un identifiant renommé
    pub fn record_id_rewrite(&mut self, file: &str, original: &str, rewritten: &str) {
        self.ids_rewritten += 1;
        let mut issue = LoadIssue::new(
            IssueLevel::Warning,
            Some(file),
            format!("LOCA_ID {} renamed to {}", original, rewritten),
        );
        issue.loca_id = Some(original.to_string());
        self.warnings.push(issue);
    }

    /// Enregistre un sondage écarté de l'ensemble spatial
    pub fn record_location_dropped(&mut self, file: &str, loca_id: &str, reason: &str) {
        self.locations_dropped += 1;
        let mut issue = LoadIssue::new(IssueLevel::Warning, Some(file), reason);
        issue.loca_id = Some(loca_id.to_string());
        self.warnings.push(issue);
    }

    /// Enregistre l'absence de données exploitables
    pub fn record_fatal(&mut self, message: &str) {
        self.errors
            .push(LoadIssue::new(IssueLevel::Fatal, None, message));
    }

    /// Définit la durée du chargement
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Nombre total de lignes fusionnées
    pub fn total_rows(&self) -> usize {
        self.by_group.values().map(|s| s.rows).sum()
    }

    /// Détermine le statut final basé sur les erreurs
    pub fn finalize(&mut self) {
        let has_fatal = self.errors.iter().any(|e| e.level == IssueLevel::Fatal);
        let has_errors = !self.errors.is_empty();
        let has_rows = self.total_rows() > 0;

        self.status = if has_fatal || (has_errors && !has_rows) {
            LoadStatus::Failed
        } else if has_errors {
            LoadStatus::PartialSuccess
        } else {
            LoadStatus::Success
        };
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        let rows = |group: &str| self.by_group.get(group).map_or(0, |s| s.rows);
        format!(
            "{:?}: {} files ({} failed), {} LOCA, {} GEOL, {} ABBR, {} renamed, {} dropped, {} errors, {} warnings",
            self.status,
            self.files_processed,
            self.files_failed,
            rows("LOCA"),
            rows("GEOL"),
            rows("ABBR"),
            self.ids_rewritten,
            self.locations_dropped,
            self.errors.len(),
            self.warnings.len()
        )
    }
}
