//! British National Grid (OSGB36, EPSG:27700) <-> WGS84
//!
//! Mercator transverse sur l'ellipsoïde Airy 1830 (séries de l'Ordnance
//! Survey) et transformation de Helmert à 7 paramètres. Précision de la
//! transformation de datum : quelques mètres, suffisante pour la cartographie.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::ellipsoid::{Airy1830, WGS84};
use super::Geographic;

/// Facteur d'échelle au méridien central
const F0: f64 = 0.9996012717;
const LAT0_DEG: f64 = 49.0;
const LON0_DEG: f64 = -2.0;
const E0: f64 = 400000.0;
const N0: f64 = -100000.0;

/// Helmert WGS84 -> OSGB36 : translations (m), échelle (ppm), rotations (")
const TX: f64 = -446.448;
const TY: f64 = 125.157;
const TZ: f64 = -542.060;
const S_PPM: f64 = 20.4894;
const RX_SEC: f64 = -0.1502;
const RY_SEC: f64 = -0.2470;
const RZ_SEC: f64 = -0.8421;

/// Écart résiduel accepté lors de l'inversion (m)
const ROUND_TRIP_TOLERANCE: f64 = 1e-6;
const MAX_REFINEMENTS: usize = 20;

/// Emprise de validité de la grille nationale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_easting: f64,
    pub max_easting: f64,
    pub min_northing: f64,
    pub max_northing: f64,
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            min_easting: 0.0,
            max_easting: 700000.0,
            min_northing: 0.0,
            max_northing: 1300000.0,
        }
    }
}

impl GridBounds {
    pub fn contains(&self, easting: f64, northing: f64) -> bool {
        (self.min_easting..=self.max_easting).contains(&easting)
            && (self.min_northing..=self.max_northing).contains(&northing)
    }
}

/// Longueur d'arc de méridien depuis la latitude d'origine
fn meridional_arc(phi: f64) -> f64 {
    let b = Airy1830::B;
    let n = (Airy1830::A - b) / (Airy1830::A + b);
    let (n2, n3) = (n * n, n * n * n);
    let phi0 = LAT0_DEG.to_radians();
    let d = phi - phi0;
    let s = phi + phi0;

    b * F0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * d
            - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * d.sin() * s.cos()
            + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * d).sin() * (2.0 * s).cos()
            - 35.0 / 24.0 * n3 * (3.0 * d).sin() * (3.0 * s).cos())
}

/// Rayons de courbure (nu, rho) mis à l'échelle F0
fn curvatures(phi: f64) -> (f64, f64) {
    let a = Airy1830::A;
    let e2 = Airy1830::E2;
    let w = 1.0 - e2 * phi.sin().powi(2);
    (a * F0 / w.sqrt(), a * F0 * (1.0 - e2) / w.powf(1.5))
}

/// Projette une position Airy 1830 (radians) sur la grille nationale
pub fn airy_to_grid(geo: Geographic) -> (f64, f64) {
    let phi = geo.lat;
    let (sin_phi, cos_phi, tan_phi) = (phi.sin(), phi.cos(), phi.tan());
    let t2 = tan_phi * tan_phi;
    let (nu, rho) = curvatures(phi);
    let eta2 = nu / rho - 1.0;

    let i = meridional_arc(phi) + N0;
    let ii = nu / 2.0 * sin_phi * cos_phi;
    let iii = nu / 24.0 * sin_phi * cos_phi.powi(3) * (5.0 - t2 + 9.0 * eta2);
    let iiia = nu / 720.0 * sin_phi * cos_phi.powi(5) * (61.0 - 58.0 * t2 + t2 * t2);
    let iv = nu * cos_phi;
    let v = nu / 6.0 * cos_phi.powi(3) * (nu / rho - t2);
    let vi = nu / 120.0
        * cos_phi.powi(5)
        * (5.0 - 18.0 * t2 + t2 * t2 + 14.0 * eta2 - 58.0 * t2 * eta2);

    let dl = geo.lon - LON0_DEG.to_radians();
    let northing = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);
    let easting = E0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);
    (easting, northing)
}

/// Position Airy 1830 (radians) d'un point de la grille nationale
pub fn grid_to_airy(easting: f64, northing: f64) -> Geographic {
    let a = Airy1830::A;
    let phi0 = LAT0_DEG.to_radians();

    // Latitude du pied de la normale, à 0.01 mm près
    let mut phi = (northing - N0) / (a * F0) + phi0;
    let mut m = meridional_arc(phi);
    for _ in 0..100 {
        let residual = northing - N0 - m;
        if residual.abs() < 1e-5 {
            break;
        }
        phi += residual / (a * F0);
        m = meridional_arc(phi);
    }

    let (nu, rho) = curvatures(phi);
    let eta2 = nu / rho - 1.0;
    let tan_phi = phi.tan();
    let (t2, t4, t6) = (tan_phi.powi(2), tan_phi.powi(4), tan_phi.powi(6));
    let sec_phi = 1.0 / phi.cos();

    let vii = tan_phi / (2.0 * rho * nu);
    let viii = tan_phi / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * t2 + eta2 - 9.0 * t2 * eta2);
    let ix = tan_phi / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * t2 + 45.0 * t4);
    let x = sec_phi / nu;
    let xi = sec_phi / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * t2);
    let xii = sec_phi / (120.0 * nu.powi(5)) * (5.0 + 28.0 * t2 + 24.0 * t4);
    let xiia = sec_phi / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);

    let de = easting - E0;
    let lat = phi - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lon = LON0_DEG.to_radians() + x * de - xi * de.powi(3) + xii * de.powi(5)
        - xiia * de.powi(7);
    Geographic::new(lon, lat)
}

/// Coordonnées cartésiennes géocentriques (hauteur ellipsoïdale nulle)
fn to_cartesian(geo: Geographic, a: f64, e2: f64) -> [f64; 3] {
    let (sin_phi, cos_phi) = geo.lat.sin_cos();
    let nu = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    [
        nu * cos_phi * geo.lon.cos(),
        nu * cos_phi * geo.lon.sin(),
        (1.0 - e2) * nu * sin_phi,
    ]
}

fn from_cartesian([x, y, z]: [f64; 3], a: f64, e2: f64) -> Geographic {
    let p = x.hypot(y);
    let mut phi = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        let next = (z + e2 * nu * phi.sin()).atan2(p);
        let done = (next - phi).abs() < 1e-12;
        phi = next;
        if done {
            break;
        }
    }
    Geographic::new(y.atan2(x), phi)
}

/// Helmert à 7 paramètres ; `sign = -1.0` applique la transformation inverse approchée
fn helmert([x, y, z]: [f64; 3], sign: f64) -> [f64; 3] {
    let arcsec = (1.0f64 / 3600.0).to_radians();
    let (tx, ty, tz) = (sign * TX, sign * TY, sign * TZ);
    let s = 1.0 + sign * S_PPM * 1e-6;
    let (rx, ry, rz) = (
        sign * RX_SEC * arcsec,
        sign * RY_SEC * arcsec,
        sign * RZ_SEC * arcsec,
    );
    [
        tx + s * x - rz * y + ry * z,
        ty + rz * x + s * y - rx * z,
        tz - ry * x + rx * y + s * z,
    ]
}

/// WGS84 (degrés) -> grille nationale OSGB36 (E, N)
pub fn latlon_to_osgb36(lat: f64, lon: f64) -> Result<(f64, f64)> {
    if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
        bail!("Invalid WGS84 position: lat={}, lon={}", lat, lon);
    }
    let wgs = Geographic::from_degrees(lon, lat);
    let cartesian = helmert(to_cartesian(wgs, WGS84::A, WGS84::E2), 1.0);
    let airy = from_cartesian(cartesian, Airy1830::A, Airy1830::E2);
    Ok(airy_to_grid(airy))
}

/// Grille nationale OSGB36 (E, N) -> WGS84 (lat, lon) en degrés
///
/// La transformation inverse de Helmert est approchée ; le résultat est
/// ensuite affiné pour que `latlon_to_osgb36` retrouve (E, N) au µm près.
pub fn osgb36_to_latlon(easting: f64, northing: f64, bounds: &GridBounds) -> Result<(f64, f64)> {
    if !easting.is_finite() || !northing.is_finite() {
        bail!("Non-finite grid position: E={}, N={}", easting, northing);
    }
    if !bounds.contains(easting, northing) {
        bail!(
            "Grid position outside National Grid bounds: E={}, N={}",
            easting,
            northing
        );
    }

    let airy = grid_to_airy(easting, northing);
    let cartesian = helmert(to_cartesian(airy, Airy1830::A, Airy1830::E2), -1.0);
    let (mut lon, mut lat) = from_cartesian(cartesian, WGS84::A, WGS84::E2).to_degrees();

    for _ in 0..MAX_REFINEMENTS {
        let (e, n) = latlon_to_osgb36(lat, lon)?;
        let (de, dn) = (e - easting, n - northing);
        if de.abs() < ROUND_TRIP_TOLERANCE && dn.abs() < ROUND_TRIP_TOLERANCE {
            break;
        }
        // Correction au premier ordre avec les rayons de courbure locaux
        let sin_lat = lat.to_radians().sin();
        let w = 1.0 - WGS84::E2 * sin_lat * sin_lat;
        let nu = WGS84::A / w.sqrt();
        let rho = WGS84::A * (1.0 - WGS84::E2) / w.powf(1.5);
        lat -= (dn / rho).to_degrees();
        lon -= (de / (nu * lat.to_radians().cos())).to_degrees();
    }

    Ok((lat, lon))
}
