//! Tests d'intégration du pipeline : coordonnées brutes → UTM → DXF

use geodxf::drawing::TABLE_HEADER;
use geodxf::{
    build_drawing, create_drawing, process_and_generate, process_coordinates, save_drawing,
    ConversionError, DrawingStyle, GeodeticCoordinate, GeodxfError, LatitudeDirection,
    LongitudeDirection, RawCoordinate,
};

/// Paires (code, valeur) d'un DXF ASCII
fn parse_pairs(dxf: &str) -> Vec<(i32, String)> {
    let lines: Vec<&str> = dxf.lines().collect();
    assert_eq!(lines.len() % 2, 0, "DXF must contain complete code/value pairs");
    lines
        .chunks(2)
        .map(|c| (c[0].trim().parse().expect("group code"), c[1].to_string()))
        .collect()
}

/// Entités de la section ENTITIES, chacune sous forme de liste de paires
fn entities(pairs: &[(i32, String)]) -> Vec<Vec<(i32, String)>> {
    let start = pairs
        .windows(2)
        .position(|w| w[0].1 == "SECTION" && w[1].1 == "ENTITIES")
        .expect("ENTITIES section")
        + 2;
    let end = start
        + pairs[start..]
            .iter()
            .position(|p| *p == (0, "ENDSEC".to_string()))
            .expect("ENDSEC");

    let mut result: Vec<Vec<(i32, String)>> = Vec::new();
    for pair in &pairs[start..end] {
        if pair.0 == 0 {
            result.push(Vec::new());
        }
        if let Some(current) = result.last_mut() {
            current.push(pair.clone());
        }
    }
    result
}

fn kind(entity: &[(i32, String)]) -> &str {
    &entity[0].1
}

fn value<'a>(entity: &'a [(i32, String)], code: i32) -> Option<&'a str> {
    entity.iter().find(|p| p.0 == code).map(|p| p.1.as_str())
}

fn survey() -> Vec<RawCoordinate> {
    serde_json::from_str(
        r#"[
            {"lat_deg": 12, "lat_min": 58, "lat_sec": 17.4, "lat_dir": "N",
             "lon_deg": 77, "lon_min": 35, "lon_sec": 40.2, "lon_dir": "E", "amsl": 920.5},
            {"lat_deg": "12", "lat_min": "58", "lat_sec": "20.1", "lat_dir": "n",
             "lon_deg": "77", "lon_min": "35", "lon_sec": "44.9", "lon_dir": "e", "amsl": "921"},
            {"lat_deg": 12, "lat_min": 58, "lat_sec": 12.0, "lat_dir": "N",
             "lon_deg": 77, "lon_min": 35, "lon_sec": 47.3, "lon_dir": "E", "amsl": 919.8},
            {"lat_deg": 12, "lat_min": 58, "lat_sec": 10.5, "lat_dir": "N",
             "lon_deg": 77, "lon_min": 35, "lon_sec": 39.0, "lon_dir": "E", "amsl": 920.1}
        ]"#,
    )
    .unwrap()
}

#[test]
fn test_full_pipeline_entities() {
    let raw = survey();
    let n = raw.len();
    let conversion = process_and_generate(&raw, &DrawingStyle::default()).unwrap();
    let dxf = String::from_utf8(conversion.dxf).unwrap();
    let pairs = parse_pairs(&dxf);
    let entities = entities(&pairs);

    let points: Vec<_> = entities.iter().filter(|e| kind(e) == "POINT").collect();
    let texts: Vec<_> = entities.iter().filter(|e| kind(e) == "TEXT").collect();
    let polylines: Vec<_> = entities.iter().filter(|e| kind(e) == "LWPOLYLINE").collect();

    assert_eq!(points.len(), n);
    // étiquettes + titre + en-tête + lignes
    assert_eq!(texts.len(), n + 1 + 1 + n);
    assert_eq!(polylines.len(), 1);

    let vertex_count: usize = value(polylines[0], 90).unwrap().parse().unwrap();
    assert_eq!(vertex_count, n + 1);
    let xs: Vec<&str> = polylines[0]
        .iter()
        .filter(|p| p.0 == 10)
        .map(|p| p.1.as_str())
        .collect();
    assert_eq!(xs.len(), n + 1);
    assert_eq!(xs.first(), xs.last());

    let contents: Vec<&str> = texts.iter().filter_map(|t| value(t, 1)).collect();
    assert_eq!(&contents[..4], &["Point A", "Point B", "Point C", "Point D"]);
    assert!(contents.contains(&"Coordinate Table"));
    assert!(contents.contains(&TABLE_HEADER));
    assert!(contents.iter().any(|c| c.starts_with("D      ") && c.ends_with("   43N")));
}

#[test]
fn test_point_elevation_carried_to_z() {
    let conversion = process_and_generate(&survey(), &DrawingStyle::default()).unwrap();
    let dxf = String::from_utf8(conversion.dxf).unwrap();
    let pairs = parse_pairs(&dxf);
    let entities = entities(&pairs);

    let zs: Vec<f64> = entities
        .iter()
        .filter(|e| kind(e) == "POINT")
        .map(|e| value(e, 30).unwrap().parse().unwrap())
        .collect();
    assert_eq!(zs, vec![920.5, 921.0, 919.8, 920.1]);
}

#[test]
fn test_header_extents_cover_table() {
    let conversion = process_and_generate(&survey(), &DrawingStyle::default()).unwrap();
    let dxf = String::from_utf8(conversion.dxf).unwrap();
    let pairs = parse_pairs(&dxf);

    let extmin_x: f64 = pairs
        .windows(2)
        .find(|w| w[0].1 == "$EXTMIN")
        .map(|w| w[1].1.parse().unwrap())
        .unwrap();
    let min_easting = conversion
        .projected
        .iter()
        .map(|p| p.easting)
        .fold(f64::INFINITY, f64::min);
    assert!((extmin_x - (min_easting - 50.0)).abs() < 1e-6);

    let insunits = pairs
        .windows(2)
        .find(|w| w[0].1 == "$INSUNITS")
        .map(|w| w[1].1.clone());
    assert_eq!(insunits.as_deref(), Some("6"));
}

#[test]
fn test_missing_field_reports_index() {
    let mut raw = survey();
    raw[2].amsl = None;
    let err = process_and_generate(&raw, &DrawingStyle::default()).unwrap_err();
    match err {
        GeodxfError::Conversion(ConversionError::MissingFields { index, fields }) => {
            assert_eq!(index, 3);
            assert_eq!(fields, vec!["amsl"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_create_drawing_matches_saved_file() {
    let geodetic = vec![GeodeticCoordinate {
        lat_deg: 20.0,
        lat_min: 52.0,
        lat_sec: 48.0,
        lat_dir: LatitudeDirection::S,
        lon_deg: 55.0,
        lon_min: 27.0,
        lon_sec: 0.0,
        lon_dir: LongitudeDirection::E,
        amsl: 12.0,
    }];
    let projected = process_coordinates(&geodetic).unwrap();
    assert_eq!(projected[0].zone.to_string(), "40S");

    let in_memory = create_drawing(&projected).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coordinates.dxf");
    let drawing = build_drawing(&projected, &DrawingStyle::default()).unwrap();
    save_drawing(&drawing, &path).unwrap();

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, in_memory);
}

#[test]
fn test_save_to_missing_directory_fails() {
    let projected = process_coordinates(&[GeodeticCoordinate {
        lat_deg: 13.0,
        lat_min: 0.0,
        lat_sec: 0.0,
        lat_dir: LatitudeDirection::N,
        lon_deg: 77.0,
        lon_min: 30.0,
        lon_sec: 0.0,
        lon_dir: LongitudeDirection::E,
        amsl: 0.0,
    }])
    .unwrap();
    let drawing = build_drawing(&projected, &DrawingStyle::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.dxf");
    let err = save_drawing(&drawing, &path).unwrap_err();
    assert!(err.to_string().starts_with("Error generating DXF file"));
}
