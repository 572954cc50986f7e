//! Machine à états GROUP -> HEADING/UNIT/TYPE -> DATA
//!
//! Un seul passage linéaire sur les lignes. En mode groupe cible, le scan
//! s'arrête au premier GROUP suivant le groupe cible. En mode complet, les
//! données s'accumulent par nom de groupe courant.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::tokenizer::{Row, RowKind, Tokenizer};
use crate::types::{GroupTable, ParseResult, RawRecord};
use crate::AgsError;

/// Accumulateur d'un groupe en cours de lecture
#[derive(Debug, Default)]
struct GroupBuilder {
    table: GroupTable,
    /// Dernière ligne HEADING : sert à l'alignement positionnel
    active: Vec<String>,
    /// Lignes DATA rencontrées avant toute ligne HEADING
    orphan_rows: usize,
}

impl GroupBuilder {
    fn new(name: &str) -> Self {
        Self {
            table: GroupTable::new(name),
            ..Default::default()
        }
    }

    fn headings(&mut self, cells: &[String], warnings: &mut Vec<AgsError>) {
        let mut active: Vec<String> = Vec::with_capacity(cells.len());
        for cell in cells {
            let heading = cell.trim().to_string();
            if active.contains(&heading) {
                warnings.push(AgsError::HeadingRedefined {
                    group: self.table.name.clone(),
                    reason: format!("duplicate column {}", heading),
                });
                continue;
            }
            active.push(heading);
        }

        if !self.table.headings.is_empty() && self.table.headings != active {
            warnings.push(AgsError::HeadingRedefined {
                group: self.table.name.clone(),
                reason: "columns merged with previous HEADING row".to_string(),
            });
        }

        // Union des colonnes : les lignes déjà lues reçoivent des valeurs vides
        for heading in &active {
            if !self.table.has_column(heading) {
                self.table.headings.push(heading.clone());
                for record in &mut self.table.records {
                    record.insert(heading.clone(), String::new());
                }
            }
        }

        self.active = active;
    }

    fn aligned(&self, cells: &[String]) -> HashMap<String, String> {
        self.active
            .iter()
            .zip(cells.iter())
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect()
    }

    fn data(&mut self, cells: &[String]) {
        if self.active.is_empty() {
            self.orphan_rows += 1;
            return;
        }

        // Troncature à la largeur des headings, complément par des vides
        let mut record: RawRecord = self
            .table
            .headings
            .iter()
            .map(|h| (h.clone(), String::new()))
            .collect();
        for (heading, value) in self.active.iter().zip(cells.iter()) {
            if let Some(slot) = record.get_mut(heading) {
                *slot = value.trim().to_string();
            }
        }
        self.table.records.push(record);
    }

    fn finish(self, warnings: &mut Vec<AgsError>) -> Option<GroupTable> {
        let name = self.table.name.clone();
        if self.orphan_rows > 0 {
            warn!(
                group = %name,
                rows = self.orphan_rows,
                "DATA rows before any HEADING row were skipped"
            );
            warnings.push(AgsError::MissingHeadings {
                group: name.clone(),
                rows: self.orphan_rows,
            });
        }

        if self.table.headings.is_empty() {
            if self.orphan_rows == 0 {
                warn!(group = %name, "group has no HEADING row");
                warnings.push(AgsError::MissingHeadings {
                    group: name,
                    rows: 0,
                });
            }
            return None;
        }

        Some(self.table)
    }
}

/// État du scan
struct Scanner<'a> {
    file: &'a str,
    target: Option<&'a str>,
    current: Option<String>,
    builders: HashMap<String, GroupBuilder>,
    order: Vec<String>,
    warnings: Vec<AgsError>,
}

impl<'a> Scanner<'a> {
    fn new(file: &'a str, target: Option<&'a str>) -> Self {
        Self {
            file,
            target,
            current: None,
            builders: HashMap::new(),
            order: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Retourne false quand le scan doit s'arrêter
    fn feed(&mut self, row: Row) -> bool {
        if row.kind == RowKind::Group {
            let Some(name) = row.group_name() else {
                debug!(file = %self.file, line = row.line, "GROUP row without name ignored");
                self.warnings.push(AgsError::UnnamedGroup { line: row.line });
                return true;
            };

            if let Some(target) = self.target {
                let was_in_target = self.current.as_deref() == Some(target);
                if was_in_target && name != target {
                    return false;
                }
                self.current = (name == target).then(|| name.to_string());
            } else {
                self.current = Some(name.to_string());
            }

            if let Some(current) = &self.current {
                if !self.builders.contains_key(current) {
                    self.order.push(current.clone());
                    self.builders
                        .insert(current.clone(), GroupBuilder::new(current));
                }
            }
            return true;
        }

        // Lignes hors groupe (ou hors groupe cible) : ignorées
        let Some(builder) = self
            .current
            .as_ref()
            .and_then(|name| self.builders.get_mut(name))
        else {
            return true;
        };

        match row.kind {
            RowKind::Heading => builder.headings(&row.cells, &mut self.warnings),
            RowKind::Unit => {
                let units = builder.aligned(&row.cells);
                builder.table.units.extend(units);
            }
            RowKind::Type => {
                let types = builder.aligned(&row.cells);
                builder.table.types.extend(types);
            }
            RowKind::Data => builder.data(&row.cells),
            RowKind::Group | RowKind::Other => {}
        }
        true
    }

    fn run(mut self, content: &str) -> ParseResult {
        let file = self.file;
        for row in Tokenizer::new(file, content) {
            match row {
                Ok(row) => {
                    if !self.feed(row) {
                        break;
                    }
                }
                Err(e) => {
                    warn!(file = %file, error = %e, "skipping unreadable row");
                    self.warnings.push(e);
                }
            }
        }

        let mut result = ParseResult::default();
        for name in self.order {
            if let Some(builder) = self.builders.remove(&name) {
                if let Some(table) = builder.finish(&mut self.warnings) {
                    result.order.push(name.clone());
                    result.groups.insert(name, table);
                }
            }
        }
        result.warnings = self.warnings;
        result
    }
}

/// Parse tous les groupes d'un contenu AGS
///
/// Ne retourne jamais d'erreur : les défauts de structure dégradent le
/// résultat et sont listés dans `ParseResult::warnings`.
pub fn parse_all(file: &str, content: &str) -> ParseResult {
    let result = Scanner::new(file, None).run(content);
    debug!(
        file = %file,
        groups = result.groups.len(),
        warnings = result.warnings.len(),
        "parsed AGS content"
    );
    result
}

/// Parse un seul groupe, avec arrêt anticipé après celui-ci
///
/// Retourne `None` si le groupe est absent ou sans données valides.
pub fn parse_group(file: &str, content: &str, group: &str) -> Option<GroupTable> {
    let mut result = Scanner::new(file, Some(group)).run(content);
    result.take(group)
}
