//! Définitions des ellipsoïdes

/// Ellipsoïde WGS84
pub struct WGS84;

impl WGS84 {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub const A: f64 = 6378137.0;

    /// Aplatissement
    pub const F: f64 = 1.0 / 298.257223563;

    /// Demi-petit axe (rayon polaire) en mètres
    pub const B: f64 = Self::A * (1.0 - Self::F);

    /// Première excentricité au carré
    pub const E2: f64 = 2.0 * Self::F - Self::F * Self::F;

    /// Deuxième excentricité au carré
    pub const EP2: f64 = Self::E2 / (1.0 - Self::E2);
}

/// Ellipsoïde Airy 1830 (datum OSGB36)
pub struct Airy1830;

impl Airy1830 {
    pub const A: f64 = 6377563.396;
    pub const B: f64 = 6356256.909;

    /// Première excentricité au carré
    pub const E2: f64 = 1.0 - (Self::B * Self::B) / (Self::A * Self::A);
}
