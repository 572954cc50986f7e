//! Formes dessinées par l'utilisateur
//!
//! Coordonnées en (lon, lat), convention GeoJSON. Une forme remplace
//! entièrement la précédente.

use geo::{Coord, LineString};
use geojson::{GeoJson, Geometry, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Forme de sélection
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionShape {
    /// Anneau d'un rectangle dessiné, traité comme emprise min/max
    Rectangle(Vec<Coord>),
    /// Anneau d'un polygone (fermeture implicite)
    Polygon(Vec<Coord>),
    /// Polyligne : couloir de sélection et axe de coupe
    LineString(Vec<Coord>),
    /// Cercle de rayon en mètres
    Circle { center: Coord, radius_m: f64 },
}

impl SelectionShape {
    /// Nom du type de forme
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rectangle(_) => "Rectangle",
            Self::Polygon(_) => "Polygon",
            Self::LineString(_) => "LineString",
            Self::Circle { .. } => "Circle",
        }
    }

    /// Polyligne (lon, lat) si la forme est une ligne
    pub fn as_line(&self) -> Option<LineString> {
        match self {
            Self::LineString(coords) => Some(LineString::new(coords.clone())),
            _ => None,
        }
    }

    /// Lit une forme depuis du GeoJSON
    ///
    /// Accepte une Feature ou une Geometry GeoJSON (Polygon, LineString,
    /// Point avec propriété `radius`) ainsi que la forme `{"type":
    /// "Rectangle", "coordinates": [...]}` émise par l'outil de dessin. Une
    /// Feature Polygon dont la propriété `shape` vaut `Rectangle` est un
    /// rectangle. Retourne `None` pour toute entrée non reconnue.
    pub fn from_geojson(input: &str) -> Option<Self> {
        let value: JsonValue = serde_json::from_str(input).ok()?;
        match value.get("type").and_then(JsonValue::as_str) {
            Some("Rectangle") => {
                let ring = value.get("coordinates")?.get(0)?;
                return Some(Self::Rectangle(json_positions(ring)?));
            }
            Some("Circle") => {
                let center = json_position(value.get("coordinates")?)?;
                let radius_m = value.get("radius")?.as_f64()?;
                return Some(Self::Circle { center, radius_m });
            }
            _ => {}
        }

        match GeoJson::from_json_value(value) {
            Ok(GeoJson::Feature(feature)) => {
                let shape = feature.property("shape").and_then(JsonValue::as_str);
                let radius = feature.property("radius").and_then(JsonValue::as_f64);
                Self::from_geometry(feature.geometry.as_ref()?, shape, radius)
            }
            Ok(GeoJson::Geometry(geometry)) => Self::from_geometry(&geometry, None, None),
            Ok(GeoJson::FeatureCollection(_)) => {
                debug!("FeatureCollection is not a single selection shape");
                None
            }
            Err(e) => {
                debug!(error = %e, "unreadable selection GeoJSON");
                None
            }
        }
    }

    fn from_geometry(geometry: &Geometry, shape: Option<&str>, radius: Option<f64>) -> Option<Self> {
        match &geometry.value {
            Value::Polygon(rings) => {
                let ring = positions(rings.first()?)?;
                if shape == Some("Rectangle") {
                    Some(Self::Rectangle(ring))
                } else {
                    Some(Self::Polygon(ring))
                }
            }
            Value::LineString(line) => Some(Self::LineString(positions(line)?)),
            Value::Point(point) => Some(Self::Circle {
                center: position(point)?,
                radius_m: radius?,
            }),
            _ => None,
        }
    }
}

fn position(p: &[f64]) -> Option<Coord> {
    match p {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn positions(ps: &[Vec<f64>]) -> Option<Vec<Coord>> {
    ps.iter().map(|p| position(p)).collect()
}

fn json_position(value: &JsonValue) -> Option<Coord> {
    let array = value.as_array()?;
    Some(Coord {
        x: array.first()?.as_f64()?,
        y: array.get(1)?.as_f64()?,
    })
}

fn json_positions(value: &JsonValue) -> Option<Vec<Coord>> {
    value.as_array()?.iter().map(json_position).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_rectangle() {
        let shape = SelectionShape::from_geojson(
            r#"{"type":"Rectangle","coordinates":[[[-0.13,51.50],[-0.12,51.50],[-0.12,51.51],[-0.13,51.51],[-0.13,51.50]]]}"#,
        )
        .unwrap();
        match shape {
            SelectionShape::Rectangle(ring) => assert_eq!(ring.len(), 5),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_feature_polygon_with_rectangle_property() {
        let shape = SelectionShape::from_geojson(
            r#"{"type":"Feature","properties":{"shape":"Rectangle"},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}"#,
        )
        .unwrap();
        assert_eq!(shape.kind(), "Rectangle");
    }

    #[test]
    fn test_geometry_polygon_and_line() {
        let polygon = SelectionShape::from_geojson(
            r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#,
        )
        .unwrap();
        assert_eq!(polygon.kind(), "Polygon");

        let line = SelectionShape::from_geojson(
            r#"{"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":[[-0.13,51.5],[-0.12,51.5]]}}"#,
        )
        .unwrap();
        assert_eq!(line.as_line().unwrap().0.len(), 2);
    }

    #[test]
    fn test_circle() {
        let shape = SelectionShape::from_geojson(
            r#"{"type":"Feature","properties":{"radius":25.5},"geometry":{"type":"Point","coordinates":[-0.12,51.5]}}"#,
        )
        .unwrap();
        assert_eq!(
            shape,
            SelectionShape::Circle {
                center: Coord { x: -0.12, y: 51.5 },
                radius_m: 25.5
            }
        );
        // Point sans rayon : pas une forme de sélection
        assert!(SelectionShape::from_geojson(r#"{"type":"Point","coordinates":[0,0]}"#).is_none());
    }

    #[test]
    fn test_unrecognised_input() {
        assert!(SelectionShape::from_geojson("not json").is_none());
        assert!(SelectionShape::from_geojson(r#"{"type":"MultiPoint","coordinates":[[0,0]]}"#).is_none());
        assert!(SelectionShape::from_geojson(r#"{"type":"Rectangle","coordinates":[]}"#).is_none());
        assert!(SelectionShape::from_geojson(r#"{"type":"FeatureCollection","features":[]}"#).is_none());
    }
}
