//! Transformation d'un lot de coordonnées DMS vers UTM
//!
//! Tout ou rien : la première erreur interrompt le lot et aucune
//! coordonnée partielle n'est retournée.

use tracing::{debug, error, info};

use crate::error::ConversionError;
use crate::projection::{Geographic, Projector, UtmZone};
use crate::types::{GeodeticCoordinate, ProjectedCoordinate, RawCoordinate};

/// Projette une coordonnée ; `index` est la position 1-based
pub fn project_coordinate(
    projector: &Projector,
    coord: &GeodeticCoordinate,
    index: usize,
) -> Result<ProjectedCoordinate, ConversionError> {
    let lat = coord
        .latitude()
        .map_err(|source| ConversionError::InvalidNumber { index, source })?;
    let lon = coord
        .longitude()
        .map_err(|source| ConversionError::InvalidNumber { index, source })?;

    let zone = UtmZone::for_position(lon, lat);

    let (easting, northing) = projector
        .project(Geographic::from_degrees(lon, lat), zone)
        .map_err(|e| ConversionError::projection(index, e.to_string()))?;

    debug!(
        index,
        lat,
        lon,
        zone = %zone,
        easting,
        northing,
        "Projected coordinate"
    );

    Ok(ProjectedCoordinate {
        easting,
        northing,
        elevation: coord.amsl,
        zone,
    })
}

/// Convertit un lot de coordonnées avec un backend donné
pub fn process_coordinates_with(
    projector: &Projector,
    coords: &[GeodeticCoordinate],
) -> Result<Vec<ProjectedCoordinate>, ConversionError> {
    if coords.is_empty() {
        error!("Refusing to process an empty coordinate list");
        return Err(ConversionError::Empty);
    }

    info!(
        count = coords.len(),
        backend = projector.description(),
        "Starting coordinate processing"
    );

    let projected = coords
        .iter()
        .enumerate()
        .map(|(i, coord)| project_coordinate(projector, coord, i + 1))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            error!(index = ?e.index(), error = %e, "Coordinate processing failed");
            e
        })?;

    info!(count = projected.len(), "Coordinate processing complete");

    Ok(projected)
}

/// Convertit un lot de coordonnées (backend Rust pur)
pub fn process_coordinates(
    coords: &[GeodeticCoordinate],
) -> Result<Vec<ProjectedCoordinate>, ConversionError> {
    process_coordinates_with(&Projector::Lite, coords)
}

/// Vérifie un lot de coordonnées brutes sans projeter
pub fn check_raw_coordinates(
    raw: &[RawCoordinate],
) -> Result<Vec<GeodeticCoordinate>, ConversionError> {
    if raw.is_empty() {
        return Err(ConversionError::Empty);
    }

    raw.iter()
        .enumerate()
        .map(|(i, r)| r.to_geodetic(i + 1))
        .collect()
}

/// Vérifie puis convertit un lot de coordonnées brutes
pub fn process_raw_coordinates(
    projector: &Projector,
    raw: &[RawCoordinate],
) -> Result<Vec<ProjectedCoordinate>, ConversionError> {
    let coords = check_raw_coordinates(raw).map_err(|e| {
        error!(index = ?e.index(), error = %e, "Invalid coordinate input");
        e
    })?;
    process_coordinates_with(projector, &coords)
}
