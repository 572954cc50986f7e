//! Axe de coupe : ligne dessinée ou axe principal des sondages
//!
//! Les calculs se font en coordonnées planes de la grille nationale
//! (Easting, Northing).

use geo::{Coord, EuclideanLength, LineLocatePoint, LineString, Point};
use serde::Serialize;
use tracing::{debug, warn};

use crate::geocode::BoreholeLocation;
use crate::reproject_lite::GridTransform;
use crate::selection::SelectionShape;

/// Prolongement par défaut de l'axe principal, en fraction de l'étendue
pub const DEFAULT_EXTENSION: f64 = 0.2;

/// Géométrie de l'axe (E, N)
#[derive(Debug, Clone, PartialEq)]
pub enum SectionAxis {
    Segment { start: Coord, end: Coord },
    Polyline(LineString),
}

impl SectionAxis {
    pub fn to_line_string(&self) -> LineString {
        match self {
            Self::Segment { start, end } => LineString::new(vec![*start, *end]),
            Self::Polyline(line) => line.clone(),
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Self::Segment { start, end } => (end.x - start.x).hypot(end.y - start.y),
            Self::Polyline(line) => line.euclidean_length(),
        }
    }
}

/// Origine de l'axe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisSource {
    /// Polyligne dessinée par l'utilisateur
    Drawn,
    /// Premier axe principal des positions
    PrincipalAxis,
}

/// Position d'un sondage le long de l'axe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub loca_id: String,
    /// Abscisse le long de l'axe (m)
    pub distance: f64,
}

/// Axe de coupe et sondages ordonnés
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLine {
    pub axis: SectionAxis,
    /// Centre de gravité des sondages (axe principal uniquement)
    pub anchor: Option<Coord>,
    pub source: AxisSource,
    /// Triées par distance croissante
    pub stations: Vec<Station>,
}

impl SectionLine {
    pub fn ordered_ids(&self) -> Vec<&str> {
        self.stations.iter().map(|s| s.loca_id.as_str()).collect()
    }

    pub fn length(&self) -> f64 {
        self.axis.length()
    }
}

/// Position plane d'un sondage : E/N du fichier, sinon lat/lon converties
fn planar<T: GridTransform + ?Sized>(location: &BoreholeLocation, transform: &T) -> Option<Coord> {
    if let Some((x, y)) = location.grid() {
        return Some(Coord { x, y });
    }
    match transform.to_grid(location.lat, location.lon) {
        Ok((x, y)) => Some(Coord { x, y }),
        Err(e) => {
            debug!(loca_id = %location.loca_id, error = %e, "no planar position");
            None
        }
    }
}

/// Axe principal : direction de variance maximale, signe fixé pour que la
/// plus grande composante soit positive
fn principal_axis(points: &[Coord]) -> (Coord, Coord) {
    let n = points.len() as f64;
    let mean = Coord {
        x: points.iter().map(|p| p.x).sum::<f64>() / n,
        y: points.iter().map(|p| p.y).sum::<f64>() / n,
    };

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let (dx, dy) = (p.x - mean.x, p.y - mean.y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let mut dir = Coord { x: theta.cos(), y: theta.sin() };
    let dominant = if dir.x.abs() >= dir.y.abs() { dir.x } else { dir.y };
    if dominant < 0.0 {
        dir = Coord { x: -dir.x, y: -dir.y };
    }
    (mean, dir)
}

fn principal_section(points: &[Coord], extension: f64) -> (SectionAxis, Coord) {
    let (mean, dir) = principal_axis(points);
    let projected = points
        .iter()
        .map(|p| (p.x - mean.x) * dir.x + (p.y - mean.y) * dir.y);
    let (min, max) = projected.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let range = max - min;
    let at = |t: f64| Coord {
        x: mean.x + dir.x * t,
        y: mean.y + dir.y * t,
    };

    let axis = SectionAxis::Segment {
        start: at(min - extension * range),
        end: at(max + extension * range),
    };
    (axis, mean)
}

/// Abscisses le long de l'axe ; axe de longueur nulle : écart en Easting au
/// premier sondage
fn compute_stations(axis: &SectionAxis, positions: &[(&str, Coord)]) -> Vec<Station> {
    let length = axis.length();
    let distance = |p: Coord| -> f64 {
        match axis {
            SectionAxis::Segment { start, end } => {
                ((p.x - start.x) * (end.x - start.x) + (p.y - start.y) * (end.y - start.y)) / length
            }
            SectionAxis::Polyline(line) => {
                line.line_locate_point(&Point::from(p)).unwrap_or(0.0) * length
            }
        }
    };

    let mut stations: Vec<Station> = if length > 0.0 && length.is_finite() {
        positions
            .iter()
            .map(|(id, p)| Station {
                loca_id: id.to_string(),
                distance: distance(*p),
            })
            .collect()
    } else {
        debug!("degenerate section axis, using easting offsets");
        let origin = positions.first().map_or(0.0, |(_, p)| p.x);
        positions
            .iter()
            .map(|(id, p)| Station {
                loca_id: id.to_string(),
                distance: p.x - origin,
            })
            .collect()
    };

    stations.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    stations
}

/// Dérive l'axe de coupe d'une sélection
///
/// Une polyligne dessinée définit l'axe (segment pour deux sommets, sinon
/// polyligne). Autrement, l'axe principal des sondages disposant
/// d'Easting/Northing est prolongé de `extension` fois son étendue à chaque
/// extrémité ; il faut au moins deux tels sondages, sinon `None`.
pub fn derive_section_line<T: GridTransform + ?Sized>(
    selected: &[BoreholeLocation],
    drawn: Option<&SelectionShape>,
    transform: &T,
    extension: f64,
) -> Option<SectionLine> {
    if let Some(line) = drawn.and_then(SelectionShape::as_line) {
        match transform.line_to_grid(&line) {
            Ok(grid) if grid.0.len() >= 2 => {
                let positions: Vec<(&str, Coord)> = selected
                    .iter()
                    .filter_map(|l| planar(l, transform).map(|p| (l.loca_id.as_str(), p)))
                    .collect();
                let axis = if grid.0.len() == 2 {
                    SectionAxis::Segment {
                        start: grid.0[0],
                        end: grid.0[1],
                    }
                } else {
                    SectionAxis::Polyline(grid)
                };
                let stations = compute_stations(&axis, &positions);
                return Some(SectionLine {
                    axis,
                    anchor: None,
                    source: AxisSource::Drawn,
                    stations,
                });
            }
            Ok(_) => warn!("drawn section line has fewer than two vertices"),
            Err(e) => warn!(error = %e, "drawn section line could not be projected, using principal axis"),
        }
    }

    let positions: Vec<(&str, Coord)> = selected
        .iter()
        .filter_map(|l| l.grid().map(|(x, y)| (l.loca_id.as_str(), Coord { x, y })))
        .collect();
    if positions.len() < 2 {
        debug!(boreholes = positions.len(), "not enough boreholes for a section line");
        return None;
    }

    let points: Vec<Coord> = positions.iter().map(|(_, p)| *p).collect();
    let (axis, anchor) = principal_section(&points, extension);
    let stations = compute_stations(&axis, &positions);
    Some(SectionLine {
        axis,
        anchor: Some(anchor),
        source: AxisSource::PrincipalAxis,
        stations,
    })
}
