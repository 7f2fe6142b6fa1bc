//! Certificats de levé : métadonnées + liste ordonnée des coordonnées
//!
//! Les étiquettes des points (A, B, …) sont positionnelles : réordonner la
//! liste change l'étiquette de chaque point. Le hash `coordinates_hash`
//! permet de détecter ce cas lors d'une mise à jour.

use blake3::Hasher;
use geodxf::transform::check_raw_coordinates;
use geodxf::{ConversionError, Direction, GeodeticCoordinate, RawCoordinate};
use serde::{Deserialize, Serialize};

/// Champs éditables d'un certificat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateDetails {
    pub survey_no: String,
    pub village_name: String,
    pub owner: String,
    pub facility: String,
    pub coordinates: Vec<GeodeticCoordinate>,
    pub certificate_type: String,
    #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(rename = "userAddress", default, skip_serializing_if = "Option::is_none")]
    pub user_address: Option<String>,
    #[serde(rename = "userPhone", default, skip_serializing_if = "Option::is_none")]
    pub user_phone: Option<String>,
    #[serde(rename = "userEmail", default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl CertificateDetails {
    /// Hash des coordonnées, dans leur ordre
    pub fn coordinates_hash(&self) -> String {
        coordinates_hash(&self.coordinates)
    }
}

/// Certificat enregistré
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(flatten)]
    pub details: CertificateDetails,
    pub coordinates_hash: String,
    /// Horodatage RFC 3339 (UTC)
    pub created_at: String,
    /// Horodatage RFC 3339 (UTC)
    pub updated_at: String,
}

/// Corps de requête de création / mise à jour, coordonnées non vérifiées
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateRequest {
    pub survey_no: String,
    pub village_name: String,
    pub owner: String,
    pub facility: String,
    #[serde(default)]
    pub coordinates: Vec<RawCoordinate>,
    pub certificate_type: String,
    #[serde(rename = "userName", default)]
    pub user_name: Option<String>,
    #[serde(rename = "userAddress", default)]
    pub user_address: Option<String>,
    #[serde(rename = "userPhone", default)]
    pub user_phone: Option<String>,
    #[serde(rename = "userEmail", default)]
    pub user_email: Option<String>,
}

impl CertificateRequest {
    /// Vérifie les coordonnées (présence, nombres, directions, plages)
    pub fn validate(self) -> Result<CertificateDetails, ConversionError> {
        let coordinates = validate_coordinates(&self.coordinates)?;

        Ok(CertificateDetails {
            survey_no: self.survey_no,
            village_name: self.village_name,
            owner: self.owner,
            facility: self.facility,
            coordinates,
            certificate_type: self.certificate_type,
            user_name: self.user_name,
            user_address: self.user_address,
            user_phone: self.user_phone,
            user_email: self.user_email,
        })
    }
}

/// Validation stricte d'une liste de coordonnées reçue d'un client
///
/// Liste vide → `ConversionError::Empty`. Les plages (degrés, minutes,
/// secondes) sont contrôlées ici et non dans le cœur de conversion.
pub fn validate_coordinates(
    raw: &[RawCoordinate],
) -> Result<Vec<GeodeticCoordinate>, ConversionError> {
    let coords = check_raw_coordinates(raw)?;
    for (i, coord) in coords.iter().enumerate() {
        coord.check_ranges(i + 1)?;
    }
    Ok(coords)
}

/// Hash BLAKE3 (hex) de la liste ordonnée des coordonnées
pub fn coordinates_hash(coords: &[GeodeticCoordinate]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(&(coords.len() as u64).to_le_bytes());

    for c in coords {
        for value in [c.lat_deg, c.lat_min, c.lat_sec] {
            hasher.update(&value.to_le_bytes());
        }
        hasher.update(Direction::from(c.lat_dir).to_string().as_bytes());
        for value in [c.lon_deg, c.lon_min, c.lon_sec] {
            hasher.update(&value.to_le_bytes());
        }
        hasher.update(Direction::from(c.lon_dir).to_string().as_bytes());
        hasher.update(&c.amsl.to_le_bytes());
    }

    hex::encode(hasher.finalize().as_bytes())
}
