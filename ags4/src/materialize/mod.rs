//! Projection d'un groupe sur ses colonnes utiles et coercition numérique
//!
//! Un groupe auquel manque une colonne obligatoire est rejeté pour ce
//! fichier uniquement (`AgsError::MissingColumns`), jamais pour le lot.

pub mod numeric;
mod tables;

pub use numeric::{coerce, is_numeric_type};
pub use tables::{abbr_rows, geol_rows, loca_rows};

use std::collections::HashSet;

use tracing::debug;

use crate::types::GroupTable;
use crate::AgsError;

/// Colonnes attendues pour un groupe
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnSpec {
    /// Colonnes sans lesquelles le groupe est rejeté
    pub required: Vec<String>,
    /// Colonnes conservées si présentes
    pub optional: Vec<String>,
    /// Colonnes toujours numériques, même sans ligne TYPE
    pub numeric: Vec<String>,
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

impl ColumnSpec {
    pub fn new(required: &[&str], optional: &[&str], numeric: &[&str]) -> Self {
        Self {
            required: owned(required),
            optional: owned(optional),
            numeric: owned(numeric),
        }
    }

    /// Colonnes standard du groupe LOCA
    pub fn loca() -> Self {
        Self::new(
            &["LOCA_ID"],
            &["LOCA_GL", "LOCA_FDEP", "LOCA_NATE", "LOCA_NATN", "LOCA_LAT", "LOCA_LON"],
            &["LOCA_GL", "LOCA_FDEP", "LOCA_NATE", "LOCA_NATN", "LOCA_LAT", "LOCA_LON"],
        )
    }

    /// Colonnes standard du groupe GEOL
    pub fn geol() -> Self {
        Self::new(
            &["LOCA_ID", "GEOL_TOP", "GEOL_BASE", "GEOL_LEG"],
            &["GEOL_DESC"],
            &["GEOL_TOP", "GEOL_BASE"],
        )
    }

    /// Colonnes standard du groupe ABBR
    pub fn abbr() -> Self {
        Self::new(&["ABBR_CODE", "ABBR_DESC"], &["ABBR_HDNG"], &[])
    }
}

/// Valeur matérialisée
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    /// Valeur vide, ou numérique non interprétable
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Groupe projeté sur ses colonnes retenues
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub name: String,
    /// Colonnes obligatoires puis optionnelles présentes
    pub columns: Vec<String>,
    /// Lignes alignées sur `columns`
    pub rows: Vec<Vec<Value>>,
}

impl Materialized {
    fn index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Valeur d'une cellule (None si la colonne n'a pas été retenue)
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.index(column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.get(row, column).and_then(Value::as_f64)
    }

    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        self.get(row, column).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Projette un groupe sur `spec` et convertit ses colonnes numériques
pub fn materialize(table: &GroupTable, spec: &ColumnSpec) -> Result<Materialized, AgsError> {
    let missing = table.missing_columns(&spec.required);
    if !missing.is_empty() {
        debug!(group = %table.name, missing = ?missing, "group rejected");
        return Err(AgsError::missing_columns(&table.name, missing));
    }

    let columns: Vec<String> = spec
        .required
        .iter()
        .chain(spec.optional.iter().filter(|c| table.has_column(c)))
        .cloned()
        .collect();

    let numeric: HashSet<&str> = columns
        .iter()
        .filter(|c| {
            spec.numeric.contains(c) || table.type_of(c).is_some_and(is_numeric_type)
        })
        .map(String::as_str)
        .collect();

    let rows = table
        .records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    let raw = record.get(column).map(String::as_str).unwrap_or("");
                    if numeric.contains(column.as_str()) {
                        coerce(raw).map_or(Value::Null, Value::Number)
                    } else if raw.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(raw.to_string())
                    }
                })
                .collect()
        })
        .collect();

    Ok(Materialized {
        name: table.name.clone(),
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_group;

    const GEOL: &str = concat!(
        "\"GROUP\",\"GEOL\"\n",
        "\"HEADING\",\"LOCA_ID\",\"GEOL_TOP\",\"GEOL_BASE\",\"GEOL_LEG\",\"GEOL_DESC\",\"GEOL_REM\"\n",
        "\"TYPE\",\"ID\",\"2DP\",\"2DP\",\"PA\",\"X\",\"X\"\n",
        "\"DATA\",\"BH1\",\"0.00\",\"1.20\",\"101\",\"Made ground\",\"\"\n",
        "\"DATA\",\"BH1\",\"1.20\",\"?\",\"201\",\"\",\"\"\n",
    );

    #[test]
    fn test_projection_keeps_spec_columns() {
        let table = parse_group("t.ags", GEOL, "GEOL").unwrap();
        let m = materialize(&table, &ColumnSpec::geol()).unwrap();
        assert_eq!(
            m.columns,
            vec!["LOCA_ID", "GEOL_TOP", "GEOL_BASE", "GEOL_LEG", "GEOL_DESC"]
        );
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_unparsable_number_is_null_not_dropped() {
        let table = parse_group("t.ags", GEOL, "GEOL").unwrap();
        let m = materialize(&table, &ColumnSpec::geol()).unwrap();
        assert_eq!(m.number(0, "GEOL_BASE"), Some(1.2));
        assert_eq!(m.get(1, "GEOL_BASE"), Some(&Value::Null));
        assert_eq!(m.text(1, "GEOL_LEG"), Some("201"));
        assert_eq!(m.get(1, "GEOL_DESC"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_required_column_rejects_group() {
        let content = "\"GROUP\",\"GEOL\"\n\"HEADING\",\"LOCA_ID\",\"GEOL_TOP\"\n\"DATA\",\"BH1\",\"0\"\n";
        let table = parse_group("t.ags", content, "GEOL").unwrap();
        match materialize(&table, &ColumnSpec::geol()) {
            Err(AgsError::MissingColumns { group, columns }) => {
                assert_eq!(group, "GEOL");
                assert_eq!(columns, vec!["GEOL_BASE", "GEOL_LEG"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_type_row_drives_coercion() {
        let content = concat!(
            "\"GROUP\",\"LOCA\"\n",
            "\"HEADING\",\"LOCA_ID\",\"LOCA_REM\"\n",
            "\"TYPE\",\"ID\",\"1DP\"\n",
            "\"DATA\",\"BH1\",\"4.5\"\n",
        );
        let table = parse_group("t.ags", content, "LOCA").unwrap();
        let spec = ColumnSpec::new(&["LOCA_ID"], &["LOCA_REM"], &[]);
        let m = materialize(&table, &spec).unwrap();
        assert_eq!(m.number(0, "LOCA_REM"), Some(4.5));
        assert_eq!(m.text(0, "LOCA_ID"), Some("BH1"));
    }
}
