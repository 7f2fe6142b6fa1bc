//! Projection géographique → UTM en Rust pur
//!
//! - Sélection du fuseau (1..=60) et de l'hémisphère par point
//! - Transverse Mercator sur l'ellipsoïde WGS84
//! - Backend PROJ optionnel (feature `proj`)

mod ellipsoid;
#[cfg(feature = "proj")]
mod proj_backend;
pub mod utm;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

pub use ellipsoid::{Ellipsoid, WGS84};

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés (lon, lat)
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Hémisphère UTM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Nord si `lat >= 0`, sud sinon
    pub fn from_latitude(lat_deg: f64) -> Self {
        if lat_deg >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    pub fn letter(self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        }
    }
}

/// Fuseau UTM : numéro 1..=60 et hémisphère, affiché `"43N"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UtmZone {
    number: u8,
    hemisphere: Hemisphere,
}

impl UtmZone {
    /// Crée un fuseau, `None` si le numéro n'est pas dans 1..=60
    pub fn new(number: u8, hemisphere: Hemisphere) -> Option<Self> {
        (1..=60)
            .contains(&number)
            .then_some(Self { number, hemisphere })
    }

    /// Fuseau d'un point (degrés décimaux)
    ///
    /// `floor((lon + 180) / 6) + 1`, replié dans 1..=60 : lon = 180° tombe
    /// dans le fuseau 1 comme lon = -180°.
    pub fn for_position(lon_deg: f64, lat_deg: f64) -> Self {
        // repli en flottant : une longitude hors plage ne doit pas déborder
        let number = ((lon_deg + 180.0) / 6.0).floor().rem_euclid(60.0) as u8 + 1;
        Self {
            number,
            hemisphere: Hemisphere::from_latitude(lat_deg),
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    pub fn is_south(&self) -> bool {
        self.hemisphere == Hemisphere::South
    }

    /// Méridien central en degrés (`zone * 6 - 183`)
    pub fn central_meridian(&self) -> f64 {
        f64::from(self.number) * 6.0 - 183.0
    }

    /// Code EPSG WGS84 / UTM (326zz nord, 327zz sud)
    pub fn epsg(&self) -> u32 {
        let base = match self.hemisphere {
            Hemisphere::North => 32600,
            Hemisphere::South => 32700,
        };
        base + u32::from(self.number)
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.hemisphere.letter())
    }
}

impl FromStr for UtmZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("Invalid UTM zone: {s:?}. Expected e.g. 43N or 40S");

        let letter = s.chars().last().ok_or_else(invalid)?;
        let hemisphere = match letter.to_ascii_uppercase() {
            'N' => Hemisphere::North,
            'S' => Hemisphere::South,
            _ => return Err(invalid()),
        };
        let number: u8 = s[..s.len() - 1].parse().map_err(|_| invalid())?;

        UtmZone::new(number, hemisphere).ok_or_else(invalid)
    }
}

impl TryFrom<String> for UtmZone {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<UtmZone> for String {
    fn from(zone: UtmZone) -> Self {
        zone.to_string()
    }
}

/// Backend de projection
///
/// `Lite` (Rust pur) par défaut ; `Proj` délègue à la bibliothèque PROJ
/// et n'est disponible qu'avec la feature `proj`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projector {
    #[default]
    Lite,
    Proj,
}

impl Projector {
    /// Projette un point géographique dans un fuseau donné
    pub fn project(&self, geo: Geographic, zone: UtmZone) -> Result<(f64, f64), ProjectionError> {
        match self {
            Self::Lite => utm::geographic_to_utm(geo, zone),
            #[cfg(feature = "proj")]
            Self::Proj => proj_backend::geographic_to_utm(geo, zone),
            #[cfg(not(feature = "proj"))]
            Self::Proj => Err(ProjectionError::Unavailable("proj".to_string())),
        }
    }

    /// Vérifie si le backend est compilé
    pub fn is_available(&self) -> bool {
        match self {
            Self::Lite => true,
            Self::Proj => cfg!(feature = "proj"),
        }
    }

    /// Retourne une description du backend utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Lite => "lite (pure Rust transverse Mercator)",
            Self::Proj => "proj (PROJ library)",
        }
    }
}

impl FromStr for Projector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lite" => Ok(Self::Lite),
            "proj" => Ok(Self::Proj),
            other => Err(format!("Unknown projection backend: {other}. Use: lite, proj")),
        }
    }
}
