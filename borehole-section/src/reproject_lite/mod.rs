//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Couvre les deux systèmes manipulés par l'application :
//! - British National Grid / OSGB36 (EPSG:27700)
//! - WGS84 (EPSG:4326)
//!
//! Plus la projection UTM directe pour les calculs de distance en mètres.

mod ellipsoid;
mod osgb;
mod smart;
mod utm;

pub use osgb::{latlon_to_osgb36, osgb36_to_latlon, GridBounds};
pub use smart::SmartReprojector;
pub use utm::{geographic_to_utm, utm_zone_for};

use anyhow::Result;
use geo::{Coord, LineString};

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Conversion grille nationale <-> WGS84
///
/// Les positions géographiques sont en degrés, ordre (lat, lon) ; les
/// géométries `geo` suivent l'ordre GeoJSON (x = lon, y = lat).
pub trait GridTransform {
    /// OSGB36 (E, N) -> WGS84 (lat, lon)
    fn to_geographic(&self, easting: f64, northing: f64) -> Result<(f64, f64)>;

    /// WGS84 (lat, lon) -> OSGB36 (E, N)
    fn to_grid(&self, lat: f64, lon: f64) -> Result<(f64, f64)>;

    /// Ligne (lon, lat) -> ligne (E, N)
    fn line_to_grid(&self, line: &LineString) -> Result<LineString> {
        let coords: Result<Vec<Coord>> = line
            .coords()
            .map(|c| {
                let (x, y) = self.to_grid(c.y, c.x)?;
                Ok(Coord { x, y })
            })
            .collect();
        Ok(LineString::new(coords?))
    }

    /// Ligne (E, N) -> ligne (lon, lat)
    fn line_to_geographic(&self, line: &LineString) -> Result<LineString> {
        let coords: Result<Vec<Coord>> = line
            .coords()
            .map(|c| {
                let (lat, lon) = self.to_geographic(c.x, c.y)?;
                Ok(Coord { x: lon, y: lat })
            })
            .collect();
        Ok(LineString::new(coords?))
    }
}

/// Grille nationale en Rust pur
#[derive(Debug, Clone, Copy, Default)]
pub struct NationalGridLite {
    bounds: GridBounds,
}

impl NationalGridLite {
    pub fn new(bounds: GridBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }
}

impl GridTransform for NationalGridLite {
    fn to_geographic(&self, easting: f64, northing: f64) -> Result<(f64, f64)> {
        osgb36_to_latlon(easting, northing, &self.bounds)
    }

    fn to_grid(&self, lat: f64, lon: f64) -> Result<(f64, f64)> {
        latlon_to_osgb36(lat, lon)
    }
}
