//! Export vers GeoJSON avec geozero (streaming)
//!
//! Sondages et axe de coupe en WGS84 pour la superposition cartographique.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::Geometry;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use crate::geocode::BoreholeLocation;
use crate::reproject_lite::GridTransform;
use crate::section::SectionLine;

/// Écrit les sondages en FeatureCollection de points
pub fn write_locations<W: Write>(locations: &[BoreholeLocation], writer: &mut W) -> Result<()> {
    write!(writer, r#"{{"type":"FeatureCollection","features":["#)?;
    for (i, location) in locations.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_location(writer, location)?;
    }
    write!(writer, "]}}")?;
    Ok(())
}

/// Exporte les sondages dans un fichier
pub fn export_locations(locations: &[BoreholeLocation], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    write_locations(locations, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_location<W: Write>(writer: &mut W, location: &BoreholeLocation) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":"{}","#,
        escape_json(&location.loca_id)
    )?;

    write!(writer, r#""geometry":"#)?;
    write_geometry(writer, &Geometry::Point(location.point()))?;

    write!(
        writer,
        r#","properties":{{"loca_id":"{}","original_loca_id":"{}","source_file":"{}","ground_level":{},"final_depth":{}}}}}"#,
        escape_json(&location.loca_id),
        escape_json(&location.original_loca_id),
        escape_json(&location.source_file),
        serde_json::to_string(&location.ground_level)?,
        serde_json::to_string(&location.final_depth)?,
    )?;
    Ok(())
}

/// Écrit l'axe de coupe en Feature LineString (lon, lat)
pub fn write_section_line<W: Write, T: GridTransform + ?Sized>(
    line: &SectionLine,
    transform: &T,
    writer: &mut W,
) -> Result<()> {
    let geographic = transform
        .line_to_geographic(&line.axis.to_line_string())
        .context("Failed to convert section line to WGS84")?;

    write!(writer, r#"{{"type":"Feature","geometry":"#)?;
    write_geometry(writer, &Geometry::LineString(geographic))?;
    write!(
        writer,
        r#","properties":{{"source":{},"length_m":{},"stations":{}}}}}"#,
        serde_json::to_string(&line.source)?,
        serde_json::to_string(&line.length())?,
        serde_json::to_string(&line.stations)?,
    )?;
    Ok(())
}

fn write_geometry<W: Write>(writer: &mut W, geometry: &Geometry) -> Result<()> {
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;
    Ok(())
}

/// Échappe une chaîne pour JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
