//! Découpage du texte AGS en lignes typées
//!
//! Chaque ligne physique est lue comme un enregistrement CSV indépendant
//! (quotes RFC 4180) dont la première cellule détermine le rôle. Une quote
//! non fermée n'affecte que sa propre ligne.

use std::iter::Enumerate;
use std::str::Lines;

use csv::{ReaderBuilder, StringRecord};
use memchr::memchr_iter;

use crate::AgsError;

/// Rôle d'une ligne AGS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Group,
    Heading,
    Unit,
    Type,
    Data,
    /// Première cellule inconnue ou vide : ignorée
    Other,
}

impl RowKind {
    fn from_descriptor(cell: &str) -> Self {
        match cell.trim() {
            "GROUP" => Self::Group,
            "HEADING" => Self::Heading,
            "UNIT" => Self::Unit,
            "TYPE" => Self::Type,
            "DATA" => Self::Data,
            _ => Self::Other,
        }
    }
}

/// Une ligne tokenisée
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Numéro de ligne (1-based) dans le fichier
    pub line: u64,
    pub kind: RowKind,
    /// Cellules après le descripteur
    pub cells: Vec<String>,
}

impl Row {
    /// Nom du groupe pour une ligne GROUP (None si absent ou vide)
    pub fn group_name(&self) -> Option<&str> {
        self.cells
            .first()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }
}

/// Nombre impair de quotes : champ ouvert jamais refermé
fn has_open_quote(line: &str) -> bool {
    memchr_iter(b'"', line.as_bytes()).count() % 2 == 1
}

/// Itérateur de lignes sur un contenu AGS
pub struct Tokenizer<'a> {
    file: &'a str,
    lines: Enumerate<Lines<'a>>,
    builder: ReaderBuilder,
    record: StringRecord,
}

impl<'a> Tokenizer<'a> {
    /// `file` sert uniquement aux diagnostics
    pub fn new(file: &'a str, content: &'a str) -> Self {
        let mut builder = ReaderBuilder::new();
        builder.has_headers(false).flexible(true);

        Self {
            file,
            lines: content.lines().enumerate(),
            builder,
            record: StringRecord::new(),
        }
    }

    fn to_row(record: &StringRecord, line: u64) -> Option<Row> {
        let mut fields = record.iter();
        let descriptor = fields.next()?;

        Some(Row {
            line,
            kind: RowKind::from_descriptor(descriptor),
            cells: fields.map(str::to_string).collect(),
        })
    }

    fn read_line(&mut self, line: &str, number: u64) -> Option<Result<Row, AgsError>> {
        if has_open_quote(line) {
            return Some(Err(AgsError::malformed_row(
                self.file,
                number,
                "unterminated quoted field",
            )));
        }

        let mut reader = self
            .builder
            .buffer_capacity(line.len().max(64))
            .from_reader(line.as_bytes());
        match reader.read_record(&mut self.record) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => return Some(Err(AgsError::malformed_row(self.file, number, e.to_string()))),
        }

        // Ligne vide : ignorée
        if self.record.iter().all(|c| c.trim().is_empty()) {
            return None;
        }
        Self::to_row(&self.record, number).map(Ok)
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Row, AgsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, line) = self.lines.next()?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(row) = self.read_line(line, index as u64 + 1) {
                return Some(row);
            }
        }
    }
}
