//! Types d'erreurs pour le crate geodxf

use thiserror::Error;

/// Erreur sur une composante degrés/minutes/secondes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DmsError {
    /// La valeur ne peut pas être interprétée comme un nombre
    #[error("{component} is not a number: {value}")]
    NotANumber {
        component: &'static str,
        value: String,
    },
}

/// Erreur de projection d'un point
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// Le calcul a produit une valeur non finie (pôle, latitude hors plage)
    #[error("UTM projection is undefined at lon={lon}, lat={lat}")]
    Undefined { lon: f64, lat: f64 },

    /// Backend non disponible dans cette compilation
    #[error("Projection backend '{0}' is not available (build with --features proj)")]
    Unavailable(String),

    /// Erreur remontée par la bibliothèque PROJ
    #[error("PROJ error: {0}")]
    Proj(String),
}

/// Erreurs du transformateur de coordonnées
///
/// Toutes les variantes (sauf `Empty`) portent la position 1-based de la
/// coordonnée fautive dans le lot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Lot vide
    #[error("No coordinates provided")]
    Empty,

    /// Champs obligatoires absents
    #[error("Missing required fields in coordinate {index}: {}", fields.join(", "))]
    MissingFields {
        index: usize,
        fields: Vec<&'static str>,
    },

    /// Composante non numérique
    #[error("Invalid DMS value in coordinate {index}: {source}")]
    InvalidNumber {
        index: usize,
        #[source]
        source: DmsError,
    },

    /// Lettre de direction inconnue ou sur le mauvais axe
    #[error("Invalid {field} in coordinate {index}: {value:?}")]
    InvalidDirection {
        index: usize,
        field: &'static str,
        value: String,
    },

    /// Valeur hors plage
    #[error("Coordinate {index} out of range: {reason}")]
    OutOfRange { index: usize, reason: String },

    /// Échec de la projection UTM
    #[error("Error processing coordinate {index}: {reason}")]
    Projection { index: usize, reason: String },
}

impl ConversionError {
    /// Position 1-based de la coordonnée fautive
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::MissingFields { index, .. }
            | Self::InvalidNumber { index, .. }
            | Self::InvalidDirection { index, .. }
            | Self::OutOfRange { index, .. }
            | Self::Projection { index, .. } => Some(*index),
        }
    }

    /// Crée une erreur de projection avec contexte
    pub fn projection(index: usize, reason: impl Into<String>) -> Self {
        Self::Projection {
            index,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de plage avec contexte
    pub fn out_of_range(index: usize, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            index,
            reason: reason.into(),
        }
    }
}

/// Erreurs du générateur de dessin
#[derive(Debug, Error)]
pub enum DrawingGenerationError {
    /// Aucun point à dessiner
    #[error("Cannot generate a drawing without coordinates")]
    Empty,

    /// Erreur d'écriture sur le flux de sortie
    #[error("Error generating DXF file: {0}")]
    Io(#[from] std::io::Error),
}

/// Erreur du pipeline complet (conversion puis dessin)
#[derive(Debug, Error)]
pub enum GeodxfError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Drawing(#[from] DrawingGenerationError),
}
