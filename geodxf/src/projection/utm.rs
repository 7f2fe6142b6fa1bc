//! Projection UTM (Universal Transverse Mercator) sur WGS84
//!
//! Séries de Snyder (USGS Professional Paper 1395), précision millimétrique
//! dans la largeur d'un fuseau.

use super::ellipsoid::WGS84;
use super::{Geographic, Hemisphere, UtmZone};
use crate::error::ProjectionError;

/// Facteur d'échelle sur le méridien central
pub const K0: f64 = 0.9996;

/// False easting (m)
pub const FALSE_EASTING: f64 = 500_000.0;

/// False northing de l'hémisphère sud (m)
pub const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

fn false_northing(hemisphere: Hemisphere) -> f64 {
    match hemisphere {
        Hemisphere::North => 0.0,
        Hemisphere::South => FALSE_NORTHING_SOUTH,
    }
}

/// Écart de longitude au méridien central ramené dans [-π, π]
fn delta_lon(lon: f64, lon0: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    (lon - lon0 + 3.0 * std::f64::consts::PI).rem_euclid(two_pi) - std::f64::consts::PI
}

/// Convertit des coordonnées géographiques WGS84 vers UTM (easting, northing)
pub fn geographic_to_utm(geo: Geographic, zone: UtmZone) -> Result<(f64, f64), ProjectionError> {
    let e2 = WGS84.e2();
    let ep2 = WGS84.ep2();

    let phi = geo.lat;
    let lon0 = zone.central_meridian().to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = WGS84.a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = delta_lon(geo.lon, lon0) * cos_phi;
    let m = WGS84.meridian_arc(phi);

    let easting = FALSE_EASTING
        + K0 * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);

    let northing = false_northing(zone.hemisphere())
        + K0 * (m
            + n * tan_phi
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

    if !easting.is_finite() || !northing.is_finite() {
        let (lon, lat) = geo.to_degrees();
        return Err(ProjectionError::Undefined { lon, lat });
    }

    Ok((easting, northing))
}

/// Projection inverse UTM → WGS84, sert au contrôle d'aller-retour
#[cfg(test)]
fn utm_to_geographic(x: f64, y: f64, zone: UtmZone) -> Geographic {
    let a = WGS84.a;
    let e2 = WGS84.e2();
    let ep2 = WGS84.ep2();

    let lon0 = zone.central_meridian().to_radians();

    // Coordonnées réduites
    let x = x - FALSE_EASTING;
    let y = y - false_northing(zone.hemisphere());

    // Latitude de pied
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                    - 252.0 * ep2
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(lon: f64, lat: f64) -> (UtmZone, f64, f64) {
        let zone = UtmZone::for_position(lon, lat);
        let (e, n) = geographic_to_utm(Geographic::from_degrees(lon, lat), zone).unwrap();
        (zone, e, n)
    }

    #[test]
    fn test_bangalore_reference() {
        // 13°N 77.5°E : fuseau 43N
        let (zone, e, n) = project(77.5, 13.0);
        assert_eq!(zone.to_string(), "43N");
        assert!((e - 771_181.276).abs() < 1.0, "e={}", e);
        assert!((n - 1_438_467.212).abs() < 1.0, "n={}", n);
    }

    #[test]
    fn test_reunion() {
        // Saint-Denis : 40S
        let (zone, e, n) = project(55.45, -20.88);
        assert_eq!(zone.to_string(), "40S");
        assert!((e - 338_767.167).abs() < 1.0, "e={}", e);
        assert!((n - 7_690_355.572).abs() < 1.0, "n={}", n);
    }

    #[test]
    fn test_martinique() {
        // Fort-de-France : 20N
        let (zone, e, n) = project(-61.07, 14.6);
        assert_eq!(zone.to_string(), "20N");
        assert!((e - 707_904.647).abs() < 1.0, "e={}", e);
        assert!((n - 1_614_967.882).abs() < 1.0, "n={}", n);
    }

    #[test]
    fn test_central_meridian_on_equator() {
        let (zone, e, n) = project(3.0, 0.0);
        assert_eq!(zone.to_string(), "31N");
        assert!((e - FALSE_EASTING).abs() < 1e-6, "e={}", e);
        assert!(n.abs() < 1e-6, "n={}", n);
    }

    #[test]
    fn test_antimeridian_wraps_to_zone_1() {
        // lon = 180 : même méridien que -180, fuseau 1 (méridien central -177)
        let (zone, e, n) = project(180.0, 60.0);
        assert_eq!(zone.number(), 1);
        assert!((e - 332_705.179).abs() < 1.0, "e={}", e);
        assert!((n - 6_655_205.484).abs() < 1.0, "n={}", n);
    }

    #[test]
    fn test_roundtrip() {
        for &(lon, lat) in &[(77.5, 13.0), (55.45, -20.88), (2.35, 48.85), (151.2093, -33.8688)] {
            let zone = UtmZone::for_position(lon, lat);
            let (e, n) = geographic_to_utm(Geographic::from_degrees(lon, lat), zone).unwrap();
            let (lon2, lat2) = utm_to_geographic(e, n, zone).to_degrees();
            assert!((lon2 - lon).abs() < 1e-6, "lon={} lon2={}", lon, lon2);
            assert!((lat2 - lat).abs() < 1e-6, "lat={} lat2={}", lat, lat2);
        }
    }

    #[test]
    fn test_delta_lon_normalized() {
        let d = delta_lon(180f64.to_radians(), (-177f64).to_radians());
        assert!((d.to_degrees() - (-3.0)).abs() < 1e-9, "d={}", d.to_degrees());
    }
}
