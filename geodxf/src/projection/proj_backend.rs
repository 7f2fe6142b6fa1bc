//! Projection UTM avec PROJ
//!
//! Ce module est disponible uniquement avec la feature `proj`.

use proj::Proj;

use super::{Geographic, UtmZone};
use crate::error::ProjectionError;

/// Crée la transformation WGS84 → WGS84 / UTM pour un fuseau
fn utm_transform(zone: UtmZone) -> Result<Proj, ProjectionError> {
    let target = format!("EPSG:{}", zone.epsg());
    Proj::new_known_crs("EPSG:4326", &target, None).map_err(|e| {
        ProjectionError::Proj(format!(
            "Failed to create projection from EPSG:4326 to {}: {}",
            target, e
        ))
    })
}

/// Convertit des coordonnées géographiques vers UTM via PROJ
///
/// `new_known_crs` normalise l'ordre des axes : l'entrée est (lon, lat) en degrés.
pub fn geographic_to_utm(geo: Geographic, zone: UtmZone) -> Result<(f64, f64), ProjectionError> {
    let proj = utm_transform(zone)?;
    let (lon, lat) = geo.to_degrees();
    proj.convert((lon, lat))
        .map_err(|e| ProjectionError::Proj(format!("Coordinate transformation failed: {}", e)))
}
