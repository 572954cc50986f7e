//! Reprojection intelligente : reproject_lite par défaut, PROJ sur demande
//!
//! PROJ n'est disponible qu'avec le feature `reproject`.

use anyhow::Result;
#[cfg(not(feature = "reproject"))]
use tracing::warn;

use super::{GridBounds, GridTransform, NationalGridLite};

/// Convertisseur grille nationale choisi à l'exécution
pub enum SmartReprojector {
    /// Reprojection légère (pure Rust)
    Lite(NationalGridLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(crate::export::reproject::NationalGridProj),
}

impl SmartReprojector {
    /// Crée un convertisseur ; `use_proj` est ignoré sans le feature `reproject`
    pub fn new(bounds: GridBounds, use_proj: bool) -> Result<Self> {
        if use_proj {
            #[cfg(feature = "reproject")]
            {
                let proj = crate::export::reproject::NationalGridProj::new(bounds)?;
                return Ok(Self::Proj(proj));
            }

            #[cfg(not(feature = "reproject"))]
            warn!("PROJ requested but the `reproject` feature is disabled, using reproject_lite");
        }

        Ok(Self::Lite(NationalGridLite::new(bounds)))
    }

    /// Retourne une description du convertisseur utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

impl GridTransform for SmartReprojector {
    fn to_geographic(&self, easting: f64, northing: f64) -> Result<(f64, f64)> {
        match self {
            Self::Lite(lite) => lite.to_geographic(easting, northing),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.to_geographic(easting, northing),
        }
    }

    fn to_grid(&self, lat: f64, lon: f64) -> Result<(f64, f64)> {
        match self {
            Self::Lite(lite) => lite.to_grid(lat, lon),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.to_grid(lat, lon),
        }
    }
}
