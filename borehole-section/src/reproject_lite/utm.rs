//! Projection UTM directe (WGS84), utilisée pour les calculs métriques locaux

use super::ellipsoid::WGS84;
use super::Geographic;

/// Facteur d'échelle au méridien central
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500000.0;
const FALSE_NORTHING_SOUTH: f64 = 10000000.0;

/// Zone UTM et hémisphère pour une position en degrés
pub fn utm_zone_for(lon_deg: f64, lat_deg: f64) -> (u32, bool) {
    let zone = ((lon_deg + 180.0) / 6.0).floor() as i64 + 1;
    (zone.clamp(1, 60) as u32, lat_deg < 0.0)
}

/// Convertit des coordonnées géographiques WGS84 en UTM (x, y)
pub fn geographic_to_utm(geo: Geographic, zone: u32, south: bool) -> (f64, f64) {
    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    // Longitude centrale de la zone
    let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();

    let phi = geo.lat;
    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let big_a = (geo.lon - lon0) * cos_phi;

    // Longueur d'arc de méridien
    let m = a
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

    let x = FALSE_EASTING
        + K0 * n
            * (big_a
                + (1.0 - t + c) * big_a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0);

    let y = K0
        * (m + n
            * tan_phi
            * (big_a.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * big_a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * big_a.powi(6) / 720.0));

    let y = if south { y + FALSE_NORTHING_SOUTH } else { y };
    (x, y)
}
