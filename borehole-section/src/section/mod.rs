//! Coupe géologique : axe de coupe et profils des sondages

pub mod line;
pub mod profile;

pub use line::{derive_section_line, AxisSource, SectionAxis, SectionLine, Station, DEFAULT_EXTENSION};
pub use profile::{build_profile, LithologyUnit, ProfileColumn, ProfileInterval, SectionProfile};
