//! Types de données pour le crate geodxf

use serde::{Deserialize, Serialize};

use crate::dms::{dms_to_decimal, Direction, DmsValue, LatitudeDirection, LongitudeDirection};
use crate::error::{ConversionError, DmsError};
use crate::projection::UtmZone;

/// Noms des neuf champs obligatoires d'une coordonnée
pub const REQUIRED_FIELDS: [&str; 9] = [
    "lat_deg", "lat_min", "lat_sec", "lat_dir", "lon_deg", "lon_min", "lon_sec", "lon_dir",
    "amsl",
];

/// Point levé en degrés/minutes/secondes avec altitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticCoordinate {
    pub lat_deg: f64,
    pub lat_min: f64,
    pub lat_sec: f64,
    pub lat_dir: LatitudeDirection,
    pub lon_deg: f64,
    pub lon_min: f64,
    pub lon_sec: f64,
    pub lon_dir: LongitudeDirection,
    /// Altitude au-dessus du niveau moyen de la mer (m)
    pub amsl: f64,
}

impl GeodeticCoordinate {
    /// Latitude en degrés décimaux (négative au sud)
    pub fn latitude(&self) -> Result<f64, DmsError> {
        dms_to_decimal(self.lat_deg, self.lat_min, self.lat_sec, self.lat_dir.into())
    }

    /// Longitude en degrés décimaux (négative à l'ouest)
    pub fn longitude(&self) -> Result<f64, DmsError> {
        dms_to_decimal(self.lon_deg, self.lon_min, self.lon_sec, self.lon_dir.into())
    }

    /// Liste les violations de plage (composantes, angle décimal, altitude)
    pub fn range_violations(&self) -> Vec<&'static str> {
        let mut violations = Vec::new();

        if !(0.0..=90.0).contains(&self.lat_deg) {
            violations.push("Latitude degrees must be between 0 and 90");
        } else if self.latitude().is_ok_and(|lat| lat.abs() > 90.0) {
            violations.push("Latitude must not exceed 90 degrees");
        }
        if !(0.0..=180.0).contains(&self.lon_deg) {
            violations.push("Longitude degrees must be between 0 and 180");
        } else if self.longitude().is_ok_and(|lon| lon.abs() > 180.0) {
            violations.push("Longitude must not exceed 180 degrees");
        }
        if !(0.0..60.0).contains(&self.lat_min) || !(0.0..60.0).contains(&self.lon_min) {
            violations.push("Minutes must be between 0 and 60");
        }
        if !(0.0..60.0).contains(&self.lat_sec) || !(0.0..60.0).contains(&self.lon_sec) {
            violations.push("Seconds must be between 0 and 60");
        }
        if !self.amsl.is_finite() {
            violations.push("AMSL must be a finite number");
        }

        violations
    }

    /// Validation stricte des plages, `index` est la position 1-based
    pub fn check_ranges(&self, index: usize) -> Result<(), ConversionError> {
        let violations = self.range_violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConversionError::out_of_range(index, violations.join("; ")))
        }
    }
}

/// Coordonnée telle que reçue d'un client : champs optionnels, nombres en JSON ou en texte
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCoordinate {
    pub lat_deg: Option<DmsValue>,
    pub lat_min: Option<DmsValue>,
    pub lat_sec: Option<DmsValue>,
    pub lat_dir: Option<String>,
    pub lon_deg: Option<DmsValue>,
    pub lon_min: Option<DmsValue>,
    pub lon_sec: Option<DmsValue>,
    pub lon_dir: Option<String>,
    pub amsl: Option<DmsValue>,
}

impl RawCoordinate {
    /// Champs obligatoires absents, dans l'ordre canonique
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.lat_deg.is_some(),
            self.lat_min.is_some(),
            self.lat_sec.is_some(),
            self.lat_dir.is_some(),
            self.lon_deg.is_some(),
            self.lon_min.is_some(),
            self.lon_sec.is_some(),
            self.lon_dir.is_some(),
            self.amsl.is_some(),
        ];

        REQUIRED_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Vérifie présence, numéricité et directions ; `index` est la position 1-based
    pub fn to_geodetic(&self, index: usize) -> Result<GeodeticCoordinate, ConversionError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ConversionError::MissingFields {
                index,
                fields: missing,
            });
        }

        let number = |value: &Option<DmsValue>, field: &'static str| {
            value
                .as_ref()
                .map(|v| v.to_f64(field))
                .unwrap_or_else(|| {
                    Err(DmsError::NotANumber {
                        component: field,
                        value: String::new(),
                    })
                })
                .map_err(|source| ConversionError::InvalidNumber { index, source })
        };

        let direction = |value: &Option<String>, field: &'static str| {
            let raw = value.as_deref().unwrap_or_default();
            raw.parse::<Direction>()
                .map_err(|_| ConversionError::InvalidDirection {
                    index,
                    field,
                    value: raw.to_string(),
                })
        };

        let lat_dir = direction(&self.lat_dir, "lat_dir")?;
        let lat_dir = LatitudeDirection::try_from(lat_dir).map_err(|d| {
            ConversionError::InvalidDirection {
                index,
                field: "lat_dir",
                value: d.to_string(),
            }
        })?;

        let lon_dir = direction(&self.lon_dir, "lon_dir")?;
        let lon_dir = LongitudeDirection::try_from(lon_dir).map_err(|d| {
            ConversionError::InvalidDirection {
                index,
                field: "lon_dir",
                value: d.to_string(),
            }
        })?;

        Ok(GeodeticCoordinate {
            lat_deg: number(&self.lat_deg, "lat_deg")?,
            lat_min: number(&self.lat_min, "lat_min")?,
            lat_sec: number(&self.lat_sec, "lat_sec")?,
            lat_dir,
            lon_deg: number(&self.lon_deg, "lon_deg")?,
            lon_min: number(&self.lon_min, "lon_min")?,
            lon_sec: number(&self.lon_sec, "lon_sec")?,
            lon_dir,
            amsl: number(&self.amsl, "amsl")?,
        })
    }
}

impl From<GeodeticCoordinate> for RawCoordinate {
    fn from(c: GeodeticCoordinate) -> Self {
        Self {
            lat_deg: Some(c.lat_deg.into()),
            lat_min: Some(c.lat_min.into()),
            lat_sec: Some(c.lat_sec.into()),
            lat_dir: Some(Direction::from(c.lat_dir).to_string()),
            lon_deg: Some(c.lon_deg.into()),
            lon_min: Some(c.lon_min.into()),
            lon_sec: Some(c.lon_sec.into()),
            lon_dir: Some(Direction::from(c.lon_dir).to_string()),
            amsl: Some(c.amsl.into()),
        }
    }
}

/// Point projeté en UTM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCoordinate {
    /// Easting (m)
    pub easting: f64,
    /// Northing (m)
    pub northing: f64,
    /// Altitude recopiée de `amsl`, sans conversion
    pub elevation: f64,
    /// Fuseau, sérialisé `"43N"`
    pub zone: UtmZone,
}
