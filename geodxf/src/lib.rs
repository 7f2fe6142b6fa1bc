//! # geodxf
//!
//! Conversion de points levés (degrés/minutes/secondes WGS84) en coordonnées
//! UTM et génération d'un dessin DXF (points, étiquettes, contour, tableau).
//!
//! ## Features
//!
//! - Projection UTM en Rust pur (par défaut) ou via PROJ (feature `proj`)
//! - Étiquetage alphabétique des points (A, B, …, Z, AA, …)
//! - Écriture DXF R2010 déterministe, en mémoire ou dans un fichier
//! - Types `geo` pour le contour et les emprises
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geodxf::{process_and_generate, DrawingStyle, RawCoordinate};
//!
//! let raw: Vec<RawCoordinate> = serde_json::from_str(input)?;
//! let conversion = process_and_generate(&raw, &DrawingStyle::default())?;
//! std::fs::write("coordinates.dxf", &conversion.dxf)?;
//! ```

pub mod dms;
pub mod drawing;
pub mod error;
pub mod label;
pub mod projection;
pub mod transform;
pub mod types;

pub use dms::{dms_to_decimal, Direction, DmsValue, LatitudeDirection, LongitudeDirection};
pub use drawing::{build_drawing, create_drawing, save_drawing, Drawing, DrawingStyle};
pub use error::{ConversionError, DmsError, DrawingGenerationError, GeodxfError, ProjectionError};
pub use label::point_label;
pub use projection::{Hemisphere, Projector, UtmZone};
pub use transform::{process_coordinates, process_coordinates_with, process_raw_coordinates};
pub use types::{GeodeticCoordinate, ProjectedCoordinate, RawCoordinate};

/// Résultat du pipeline complet
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Coordonnées projetées, dans l'ordre d'entrée
    pub projected: Vec<ProjectedCoordinate>,
    /// Fichier DXF
    pub dxf: Vec<u8>,
}

/// Valide, projette (backend Rust pur) et dessine un lot de coordonnées brutes
pub fn process_and_generate(
    raw: &[RawCoordinate],
    style: &DrawingStyle,
) -> Result<Conversion, GeodxfError> {
    process_and_generate_with(&Projector::Lite, raw, style)
}

/// Comme [`process_and_generate`], avec un backend de projection donné
pub fn process_and_generate_with(
    projector: &Projector,
    raw: &[RawCoordinate],
    style: &DrawingStyle,
) -> Result<Conversion, GeodxfError> {
    let projected = process_raw_coordinates(projector, raw)?;
    let dxf = build_drawing(&projected, style)?.to_dxf_bytes()?;

    Ok(Conversion { projected, dxf })
}
