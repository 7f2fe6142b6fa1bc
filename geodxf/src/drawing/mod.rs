//! Génération du dessin : points, étiquettes, polygone fermé et tableau des coordonnées
//!
//! Le dessin est d'abord construit en mémoire (`Drawing`), puis sérialisé en
//! DXF par [`dxf::write_dxf`]. Aucune transformation numérique n'est appliquée
//! aux coordonnées : easting/northing/altitude sont reportés tels quels.

pub mod dxf;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::{BoundingRect, Coord, LineString, MultiPoint, Point, Rect};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DrawingGenerationError;
use crate::label::point_label;
use crate::types::ProjectedCoordinate;

/// Titre du tableau des coordonnées
pub const TABLE_TITLE: &str = "Coordinate Table";

/// Ligne d'en-tête des colonnes du tableau
pub const TABLE_HEADER: &str = "Point   Easting     Northing    Elevation   Zone";

/// Mise en page du dessin (unités du dessin = mètres)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingStyle {
    /// Décalage des étiquettes par rapport au point (en X et en Y)
    pub label_offset: f64,
    /// Hauteur du texte des étiquettes
    pub label_height: f64,
    /// Marge entre le coin bas-gauche des points et le tableau
    pub table_margin: f64,
    /// Hauteur du titre du tableau
    pub title_height: f64,
    /// Hauteur du texte des lignes du tableau
    pub row_height: f64,
    /// Interligne du tableau
    pub row_spacing: f64,
    /// Calque de toutes les entités
    pub layer: String,
}

impl Default for DrawingStyle {
    fn default() -> Self {
        Self {
            label_offset: 5.0,
            label_height: 2.5,
            table_margin: 50.0,
            title_height: 5.0,
            row_height: 3.0,
            row_spacing: 10.0,
            layer: "0".to_string(),
        }
    }
}

/// Rôle d'un texte dans le dessin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    /// Étiquette `Point X` à côté d'un point
    Label,
    /// Titre du tableau
    Title,
    /// En-tête des colonnes
    ColumnHeader,
    /// Ligne du tableau
    Row,
}

/// Texte simple sur une ligne
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub insert: Coord<f64>,
    pub height: f64,
    pub content: String,
    pub role: TextRole,
}

/// Point 3D (easting, northing, altitude)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Entité du dessin
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Point(Point3),
    Text(Text),
    /// Polyligne 2D ; le polygone est fermé en répétant le premier sommet
    Polyline(LineString<f64>),
}

/// Dessin en mémoire, dans l'ordre d'émission des entités
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub layer: String,
    pub entities: Vec<Entity>,
}

impl Drawing {
    /// Entités point
    pub fn points(&self) -> impl Iterator<Item = &Point3> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Point(p) => Some(p),
            _ => None,
        })
    }

    /// Textes d'un rôle donné
    pub fn texts(&self, role: TextRole) -> impl Iterator<Item = &Text> {
        self.entities.iter().filter_map(move |e| match e {
            Entity::Text(t) if t.role == role => Some(t),
            _ => None,
        })
    }

    /// Polylignes
    pub fn polylines(&self) -> impl Iterator<Item = &LineString<f64>> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Polyline(ls) => Some(ls),
            _ => None,
        })
    }

    /// Emprise 2D de toutes les positions d'insertion
    pub fn extents(&self) -> Option<Rect<f64>> {
        let mut positions: Vec<Point<f64>> = Vec::new();
        for entity in &self.entities {
            match entity {
                Entity::Point(p) => positions.push(Point::new(p.x, p.y)),
                Entity::Text(t) => positions.push(t.insert.into()),
                Entity::Polyline(ls) => positions.extend(ls.points()),
            }
        }
        MultiPoint::new(positions).bounding_rect()
    }

    /// Plage des altitudes des points (min, max)
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        self.points().fold(None, |acc, p| match acc {
            None => Some((p.z, p.z)),
            Some((lo, hi)) => Some((lo.min(p.z), hi.max(p.z))),
        })
    }

    /// Sérialise en DXF vers un flux
    pub fn write_dxf<W: Write>(&self, writer: W) -> Result<(), DrawingGenerationError> {
        dxf::write_dxf(self, writer)?;
        Ok(())
    }

    /// Sérialise en DXF en mémoire
    pub fn to_dxf_bytes(&self) -> Result<Vec<u8>, DrawingGenerationError> {
        let mut buffer = Vec::with_capacity(16 * 1024);
        self.write_dxf(&mut buffer)?;
        Ok(buffer)
    }
}

/// Ligne du tableau pour un point
pub fn table_row(label: &str, coord: &ProjectedCoordinate) -> String {
    format!(
        "{}      {:.2}   {:.2}   {:.2}   {}",
        label, coord.easting, coord.northing, coord.elevation, coord.zone
    )
}

/// Construit le dessin à partir des coordonnées projetées, dans leur ordre
pub fn build_drawing(
    projected: &[ProjectedCoordinate],
    style: &DrawingStyle,
) -> Result<Drawing, DrawingGenerationError> {
    if projected.is_empty() {
        return Err(DrawingGenerationError::Empty);
    }

    let mut entities = Vec::with_capacity(projected.len() * 3 + 3);

    // Points et étiquettes
    for (i, coord) in projected.iter().enumerate() {
        entities.push(Entity::Point(Point3 {
            x: coord.easting,
            y: coord.northing,
            z: coord.elevation,
        }));
        entities.push(Entity::Text(Text {
            insert: Coord {
                x: coord.easting + style.label_offset,
                y: coord.northing + style.label_offset,
            },
            height: style.label_height,
            content: format!("Point {}", point_label(i)),
            role: TextRole::Label,
        }));
    }

    // Polygone : tous les points dans l'ordre puis retour au premier
    let mut outline: Vec<Coord<f64>> = projected
        .iter()
        .map(|c| Coord {
            x: c.easting,
            y: c.northing,
        })
        .collect();
    outline.push(outline[0]);
    let outline = LineString::new(outline);

    // Ancre du tableau sous le coin bas-gauche des points
    let anchor = match outline.bounding_rect() {
        Some(rect) => Coord {
            x: rect.min().x - style.table_margin,
            y: rect.min().y - style.table_margin,
        },
        None => return Err(DrawingGenerationError::Empty),
    };

    entities.push(Entity::Polyline(outline));

    entities.push(Entity::Text(Text {
        insert: anchor,
        height: style.title_height,
        content: TABLE_TITLE.to_string(),
        role: TextRole::Title,
    }));
    entities.push(Entity::Text(Text {
        insert: Coord {
            x: anchor.x,
            y: anchor.y - style.row_spacing,
        },
        height: style.row_height,
        content: TABLE_HEADER.to_string(),
        role: TextRole::ColumnHeader,
    }));

    for (i, coord) in projected.iter().enumerate() {
        entities.push(Entity::Text(Text {
            insert: Coord {
                x: anchor.x,
                y: anchor.y - 2.0 * style.row_spacing - i as f64 * style.row_spacing,
            },
            height: style.row_height,
            content: table_row(&point_label(i), coord),
            role: TextRole::Row,
        }));
    }

    debug!(
        points = projected.len(),
        entities = entities.len(),
        table_x = anchor.x,
        table_y = anchor.y,
        "Drawing built"
    );

    Ok(Drawing {
        layer: style.layer.clone(),
        entities,
    })
}

/// Génère le fichier DXF en mémoire avec la mise en page par défaut
pub fn create_drawing(
    projected: &[ProjectedCoordinate],
) -> Result<Vec<u8>, DrawingGenerationError> {
    build_drawing(projected, &DrawingStyle::default())?.to_dxf_bytes()
}

/// Écrit le dessin dans un fichier DXF
///
/// Le fichier est fermé à la sortie de la fonction, y compris en cas d'erreur.
pub fn save_drawing(drawing: &Drawing, output_path: &Path) -> Result<(), DrawingGenerationError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    drawing.write_dxf(&mut writer)?;
    writer.flush()?;

    info!(path = %output_path.display(), entities = drawing.entities.len(), "DXF file written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> Vec<ProjectedCoordinate> {
        (0..n)
            .map(|i| ProjectedCoordinate {
                easting: 781_400.0 + 10.0 * i as f64,
                northing: 1_435_400.0 + if i % 2 == 0 { 0.0 } else { 15.0 },
                elevation: 900.0 + i as f64,
                zone: "43N".parse().unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_entity_counts() {
        let n = 5;
        let drawing = build_drawing(&sample(n), &DrawingStyle::default()).unwrap();

        assert_eq!(drawing.points().count(), n);
        assert_eq!(drawing.texts(TextRole::Label).count(), n);
        assert_eq!(drawing.texts(TextRole::Title).count(), 1);
        assert_eq!(drawing.texts(TextRole::ColumnHeader).count(), 1);
        assert_eq!(drawing.texts(TextRole::Row).count(), n);

        let polylines: Vec<_> = drawing.polylines().collect();
        assert_eq!(polylines.len(), 1);
        assert_eq!(polylines[0].0.len(), n + 1);
        assert_eq!(polylines[0].0.first(), polylines[0].0.last());
    }

    #[test]
    fn test_label_placement() {
        let coords = sample(2);
        let drawing = build_drawing(&coords, &DrawingStyle::default()).unwrap();
        let labels: Vec<&Text> = drawing.texts(TextRole::Label).collect();

        assert_eq!(labels[0].content, "Point A");
        assert_eq!(labels[1].content, "Point B");
        assert_eq!(labels[1].insert.x, coords[1].easting + 5.0);
        assert_eq!(labels[1].insert.y, coords[1].northing + 5.0);
        assert_eq!(labels[1].height, 2.5);
    }

    #[test]
    fn test_table_layout() {
        let coords = sample(3);
        let drawing = build_drawing(&coords, &DrawingStyle::default()).unwrap();

        let title = drawing.texts(TextRole::Title).next().unwrap();
        assert_eq!(title.insert.x, 781_400.0 - 50.0);
        assert_eq!(title.insert.y, 1_435_400.0 - 50.0);
        assert_eq!(title.height, 5.0);

        let header = drawing.texts(TextRole::ColumnHeader).next().unwrap();
        assert_eq!(header.insert.y, title.insert.y - 10.0);
        assert_eq!(header.content, TABLE_HEADER);

        let rows: Vec<&Text> = drawing.texts(TextRole::Row).collect();
        assert_eq!(rows[0].insert.y, title.insert.y - 20.0);
        assert_eq!(rows[2].insert.y, title.insert.y - 40.0);
        assert_eq!(rows[1].content, "B      781410.00   1435415.00   901.00   43N");
    }

    #[test]
    fn test_polyline_is_2d_in_input_order() {
        let coords = sample(3);
        let drawing = build_drawing(&coords, &DrawingStyle::default()).unwrap();
        let outline = drawing.polylines().next().unwrap();
        let xs: Vec<f64> = outline.0.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![781_400.0, 781_410.0, 781_420.0, 781_400.0]);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            build_drawing(&[], &DrawingStyle::default()),
            Err(DrawingGenerationError::Empty)
        ));
    }

    #[test]
    fn test_extents_include_table() {
        let drawing = build_drawing(&sample(2), &DrawingStyle::default()).unwrap();
        let rect = drawing.extents().unwrap();
        assert_eq!(rect.min().x, 781_350.0);
        assert_eq!(rect.max().y, 1_435_415.0 + 5.0);
        assert_eq!(drawing.elevation_range(), Some((900.0, 901.0)));
    }

    #[test]
    fn test_style_from_partial_json() {
        let style: DrawingStyle = serde_json::from_str(r#"{"label_height": 4.0}"#).unwrap();
        assert_eq!(style.label_height, 4.0);
        assert_eq!(style.label_offset, 5.0);
        assert_eq!(style.layer, "0");
    }
}
