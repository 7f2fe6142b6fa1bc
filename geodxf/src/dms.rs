//! Conversion degrés/minutes/secondes → degrés décimaux

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DmsError;

/// Indicateur d'hémisphère ou de côté du méridien d'origine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    N,
    S,
    E,
    W,
}

impl Direction {
    /// Sud et Ouest donnent une valeur négative
    pub fn is_negative(self) -> bool {
        matches!(self, Direction::S | Direction::W)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" => Ok(Direction::N),
            "S" => Ok(Direction::S),
            "E" => Ok(Direction::E),
            "W" => Ok(Direction::W),
            other => Err(format!("Unknown direction: {other:?}. Use N, S, E or W")),
        }
    }
}

/// Direction d'une latitude (N ou S)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatitudeDirection {
    N,
    S,
}

/// Direction d'une longitude (E ou W)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongitudeDirection {
    E,
    W,
}

impl From<LatitudeDirection> for Direction {
    fn from(d: LatitudeDirection) -> Self {
        match d {
            LatitudeDirection::N => Direction::N,
            LatitudeDirection::S => Direction::S,
        }
    }
}

impl From<LongitudeDirection> for Direction {
    fn from(d: LongitudeDirection) -> Self {
        match d {
            LongitudeDirection::E => Direction::E,
            LongitudeDirection::W => Direction::W,
        }
    }
}

impl TryFrom<Direction> for LatitudeDirection {
    type Error = Direction;

    fn try_from(d: Direction) -> Result<Self, Self::Error> {
        match d {
            Direction::N => Ok(LatitudeDirection::N),
            Direction::S => Ok(LatitudeDirection::S),
            other => Err(other),
        }
    }
}

impl TryFrom<Direction> for LongitudeDirection {
    type Error = Direction;

    fn try_from(d: Direction) -> Result<Self, Self::Error> {
        match d {
            Direction::E => Ok(LongitudeDirection::E),
            Direction::W => Ok(LongitudeDirection::W),
            other => Err(other),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::N => "N",
            Direction::S => "S",
            Direction::E => "E",
            Direction::W => "W",
        };
        f.write_str(s)
    }
}

/// Convertit des degrés/minutes/secondes en degrés décimaux
///
/// `degrees + minutes/60 + seconds/3600`, négatif pour S et W.
/// Aucune vérification de plage : un angle hors bornes est propagé tel quel.
///
/// # Errors
/// `DmsError::NotANumber` si une composante est NaN ou infinie.
pub fn dms_to_decimal(
    degrees: f64,
    minutes: f64,
    seconds: f64,
    direction: Direction,
) -> Result<f64, DmsError> {
    for (component, value) in [
        ("degrees", degrees),
        ("minutes", minutes),
        ("seconds", seconds),
    ] {
        if !value.is_finite() {
            return Err(DmsError::NotANumber {
                component,
                value: value.to_string(),
            });
        }
    }

    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;

    Ok(if direction.is_negative() {
        -decimal
    } else {
        decimal
    })
}

/// Valeur numérique brute telle que reçue (nombre JSON ou texte)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DmsValue {
    Number(f64),
    Text(String),
}

impl DmsValue {
    /// Interprète la valeur comme un nombre
    pub fn to_f64(&self, component: &'static str) -> Result<f64, DmsError> {
        let not_a_number = |value: String| DmsError::NotANumber { component, value };

        let value = match self {
            DmsValue::Number(n) => *n,
            DmsValue::Text(s) => {
                let trimmed = s.trim();
                fast_float::parse::<f64, _>(trimmed).map_err(|_| not_a_number(s.clone()))?
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(not_a_number(value.to_string()))
        }
    }
}

impl From<f64> for DmsValue {
    fn from(v: f64) -> Self {
        DmsValue::Number(v)
    }
}

impl From<&str> for DmsValue {
    fn from(v: &str) -> Self {
        DmsValue::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_north_east_positive() {
        let v = dms_to_decimal(12.0, 58.0, 17.4, Direction::N).unwrap();
        assert!((v - (12.0 + 58.0 / 60.0 + 17.4 / 3600.0)).abs() < EPS, "v={}", v);

        let v = dms_to_decimal(77.0, 35.0, 40.2, Direction::E).unwrap();
        assert!((v - (77.0 + 35.0 / 60.0 + 40.2 / 3600.0)).abs() < EPS, "v={}", v);
    }

    #[test]
    fn test_south_west_negated() {
        let v = dms_to_decimal(33.0, 52.0, 7.68, Direction::S).unwrap();
        assert!((v + 33.8688).abs() < EPS, "v={}", v);

        let v = dms_to_decimal(61.0, 4.0, 12.0, Direction::W).unwrap();
        assert!((v + 61.07).abs() < EPS, "v={}", v);
    }

    #[test]
    fn test_no_clamping() {
        // Hors plage : propagé sans correction
        let v = dms_to_decimal(95.0, 75.0, 0.0, Direction::N).unwrap();
        assert!((v - 96.25).abs() < EPS);
    }

    #[test]
    fn test_nan_rejected() {
        let err = dms_to_decimal(10.0, f64::NAN, 0.0, Direction::N).unwrap_err();
        assert!(matches!(err, DmsError::NotANumber { component: "minutes", .. }));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(" n ".parse::<Direction>().unwrap(), Direction::N);
        assert_eq!("w".parse::<Direction>().unwrap(), Direction::W);
        assert!("X".parse::<Direction>().is_err());
        assert!("".parse::<Direction>().is_err());
    }

    #[test]
    fn test_dms_value_text() {
        assert_eq!(DmsValue::from(" 12.5 ").to_f64("degrees").unwrap(), 12.5);
        assert_eq!(DmsValue::from(7.0).to_f64("degrees").unwrap(), 7.0);
        assert!(DmsValue::from("douze").to_f64("degrees").is_err());
        assert!(DmsValue::from("12abc").to_f64("degrees").is_err());
    }

    #[test]
    fn test_dms_value_deserialize() {
        let n: DmsValue = serde_json::from_str("42.5").unwrap();
        assert_eq!(n, DmsValue::Number(42.5));
        let t: DmsValue = serde_json::from_str("\"42.5\"").unwrap();
        assert_eq!(t, DmsValue::Text("42.5".to_string()));
    }
}
