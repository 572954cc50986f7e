//! Sélection spatiale des sondages
//!
//! Fonctions pures : les candidats et les paramètres sont passés
//! explicitement, aucun état global n'est consulté. Une forme absente ou
//! invalide donne une sélection vide.

mod corridor;
mod shape;

pub use corridor::{filter_by_corridor, UtmFrame};
pub use shape::SelectionShape;

use geo::{Contains, Coord, HaversineDistance, LineString, Point, Polygon};
use tracing::{debug, warn};

use crate::config::Config;
use crate::geocode::BoreholeLocation;

/// Demi-largeur du couloir par défaut (m)
pub const DEFAULT_CORRIDOR_HALF_WIDTH_M: f64 = 50.0;

/// Paramètres d'une requête de sélection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionParams {
    pub corridor_half_width_m: f64,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            corridor_half_width_m: DEFAULT_CORRIDOR_HALF_WIDTH_M,
        }
    }
}

impl From<&Config> for SelectionParams {
    fn from(config: &Config) -> Self {
        Self {
            corridor_half_width_m: config.corridor_half_width_m,
        }
    }
}

fn finite(coords: &[Coord]) -> bool {
    coords.iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

/// Filtre les sondages selon la forme dessinée
///
/// - Rectangle : emprise min/max de l'anneau, bornes incluses
/// - Polygon : intérieur strict
/// - LineString : couloir UTM de demi-largeur `corridor_half_width_m`
/// - Circle : distance géodésique inférieure ou égale au rayon
///
/// L'ordre des candidats est conservé.
pub fn filter_by_shape(
    shape: Option<&SelectionShape>,
    candidates: &[BoreholeLocation],
    params: &SelectionParams,
) -> Vec<BoreholeLocation> {
    let Some(shape) = shape else {
        return Vec::new();
    };
    if candidates.is_empty() {
        return Vec::new();
    }

    let selected = match shape {
        SelectionShape::Rectangle(ring) => filter_by_rectangle(ring, candidates),
        SelectionShape::Polygon(ring) => filter_by_polygon(ring, candidates),
        SelectionShape::LineString(line) => {
            if line.len() < 2 || !finite(line) {
                warn!(points = line.len(), "invalid selection line");
                Vec::new()
            } else {
                filter_by_corridor(line, candidates, params.corridor_half_width_m)
            }
        }
        SelectionShape::Circle { center, radius_m } => filter_by_circle(*center, *radius_m, candidates),
    };

    debug!(
        shape = shape.kind(),
        candidates = candidates.len(),
        selected = selected.len(),
        "selection filtered"
    );
    selected
}

fn filter_by_rectangle(ring: &[Coord], candidates: &[BoreholeLocation]) -> Vec<BoreholeLocation> {
    if ring.is_empty() || !finite(ring) {
        warn!(points = ring.len(), "invalid selection rectangle");
        return Vec::new();
    }
    let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    for c in ring {
        min_lon = min_lon.min(c.x);
        max_lon = max_lon.max(c.x);
        min_lat = min_lat.min(c.y);
        max_lat = max_lat.max(c.y);
    }

    candidates
        .iter()
        .filter(|c| c.lat >= min_lat && c.lat <= max_lat && c.lon >= min_lon && c.lon <= max_lon)
        .cloned()
        .collect()
}

fn filter_by_polygon(ring: &[Coord], candidates: &[BoreholeLocation]) -> Vec<BoreholeLocation> {
    if ring.len() < 3 || !finite(ring) {
        warn!(points = ring.len(), "invalid selection polygon");
        return Vec::new();
    }
    let polygon = Polygon::new(LineString::new(ring.to_vec()), vec![]);

    candidates
        .iter()
        .filter(|c| polygon.contains(&c.point()))
        .cloned()
        .collect()
}

fn filter_by_circle(center: Coord, radius_m: f64, candidates: &[BoreholeLocation]) -> Vec<BoreholeLocation> {
    if !finite(&[center]) || radius_m.is_nan() || radius_m < 0.0 {
        warn!(radius_m, "invalid selection circle");
        return Vec::new();
    }
    let center = Point::from(center);

    candidates
        .iter()
        .filter(|c| c.point().haversine_distance(&center) <= radius_m)
        .cloned()
        .collect()
}

/// Sondage désigné par un clic
///
/// Parmi les sondages à moins de `radius_m` du point cliqué, retient le plus
/// proche en distance euclidienne sur les degrés ; à égalité, le premier.
pub fn select_nearest(
    center: Coord,
    radius_m: f64,
    candidates: &[BoreholeLocation],
) -> Option<BoreholeLocation> {
    filter_by_circle(center, radius_m, candidates)
        .into_iter()
        .map(|c| {
            let d = (c.lon - center.x).hypot(c.lat - center.y);
            (d, c)
        })
        .fold(None, |best: Option<(f64, BoreholeLocation)>, (d, c)| match best {
            Some((best_d, _)) if best_d <= d => best,
            _ => Some((d, c)),
        })
        .map(|(_, c)| c)
}

/// Sélection explicite par identifiants, dans l'ordre des candidats
pub fn select_by_ids<S: AsRef<str>>(ids: &[S], candidates: &[BoreholeLocation]) -> Vec<BoreholeLocation> {
    candidates
        .iter()
        .filter(|c| ids.iter().any(|id| id.as_ref() == c.loca_id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str, lat: f64, lon: f64) -> BoreholeLocation {
        BoreholeLocation {
            loca_id: id.to_string(),
            original_loca_id: id.to_string(),
            source_file: "A.ags".to_string(),
            ground_level: None,
            final_depth: None,
            easting: None,
            northing: None,
            lat,
            lon,
        }
    }

    fn ids(selection: &[BoreholeLocation]) -> Vec<&str> {
        selection.iter().map(|c| c.loca_id.as_str()).collect()
    }

    fn square() -> Vec<Coord> {
        vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 },
            Coord { x: 0.0, y: 10.0 },
            Coord { x: 0.0, y: 0.0 },
        ]
    }

    #[test]
    fn test_no_shape() {
        let candidates = vec![location("BH1", 5.0, 5.0)];
        assert!(filter_by_shape(None, &candidates, &SelectionParams::default()).is_empty());
    }

    #[test]
    fn test_rectangle_is_inclusive() {
        let candidates = vec![
            location("INSIDE", 5.0, 5.0),
            location("EDGE", 10.0, 5.0),
            location("CORNER", 0.0, 0.0),
            location("OUTSIDE", 10.5, 5.0),
        ];
        let shape = SelectionShape::Rectangle(square());
        let selected = filter_by_shape(Some(&shape), &candidates, &SelectionParams::default());
        assert_eq!(ids(&selected), vec!["INSIDE", "EDGE", "CORNER"]);
    }

    #[test]
    fn test_polygon_is_strict() {
        let candidates = vec![
            location("INSIDE", 5.0, 5.0),
            location("EDGE", 5.0, 10.0),
            location("VERTEX", 0.0, 0.0),
            location("OUTSIDE", 50.0, 50.0),
        ];
        let shape = SelectionShape::Polygon(square());
        let selected = filter_by_shape(Some(&shape), &candidates, &SelectionParams::default());
        assert_eq!(ids(&selected), vec!["INSIDE"]);
    }

    #[test]
    fn test_invalid_shapes_select_nothing() {
        let candidates = vec![location("BH1", 5.0, 5.0)];
        let params = SelectionParams::default();
        let bad = [
            SelectionShape::Rectangle(vec![]),
            SelectionShape::Polygon(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }]),
            SelectionShape::LineString(vec![Coord { x: 5.0, y: 5.0 }]),
            SelectionShape::Circle {
                center: Coord { x: 5.0, y: 5.0 },
                radius_m: f64::NAN,
            },
        ];
        for shape in &bad {
            assert!(filter_by_shape(Some(shape), &candidates, &params).is_empty(), "{:?}", shape);
        }
    }

    #[test]
    fn test_circle() {
        // 0.0001° de latitude ~ 11 m
        let candidates = vec![
            location("NEAR", 51.5001, -0.12),
            location("FAR", 51.501, -0.12),
        ];
        let shape = SelectionShape::Circle {
            center: Coord { x: -0.12, y: 51.5 },
            radius_m: 20.0,
        };
        let selected = filter_by_shape(Some(&shape), &candidates, &SelectionParams::default());
        assert_eq!(ids(&selected), vec!["NEAR"]);
    }

    #[test]
    fn test_select_nearest() {
        let candidates = vec![
            location("A", 51.50010, -0.12),
            location("B", 51.50005, -0.12),
            location("C", 51.49000, -0.12),
        ];
        let center = Coord { x: -0.12, y: 51.5 };
        assert_eq!(select_nearest(center, 25.0, &candidates).unwrap().loca_id, "B");
        assert!(select_nearest(center, 1.0, &candidates).is_none());
    }

    #[test]
    fn test_select_nearest_tie_keeps_first() {
        let candidates = vec![location("A", 0.0001, 0.0), location("B", -0.0001, 0.0)];
        let center = Coord { x: 0.0, y: 0.0 };
        assert_eq!(select_nearest(center, 50.0, &candidates).unwrap().loca_id, "A");
    }

    #[test]
    fn test_select_by_ids() {
        let candidates = vec![location("BH1", 0.0, 0.0), location("BH2", 0.0, 0.0), location("BH1_B", 0.0, 0.0)];
        let selected = select_by_ids(&["BH1_B", "BH1"], &candidates);
        assert_eq!(ids(&selected), vec!["BH1", "BH1_B"]);
    }
}
