//! Rapport de conversion : coordonnées projetées avec leur étiquette
//!
//! Affiché sur la console par la CLI, journalisé par le serveur HTTP et
//! sérialisable en JSON.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use geodxf::{point_label, ProjectedCoordinate};
use serde::Serialize;
use tracing::info;

/// Ligne du rapport
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub label: String,
    pub easting: f64,
    pub northing: f64,
    pub elevation: f64,
    pub zone: String,
}

/// Rapport d'une conversion
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    /// Durée de la conversion (projection + DXF)
    pub duration_secs: f64,
    /// Taille du fichier DXF produit
    pub dxf_bytes: usize,
    pub entries: Vec<ReportEntry>,
}

impl ConversionReport {
    /// Construit le rapport ; les étiquettes suivent l'ordre des points
    pub fn new(projected: &[ProjectedCoordinate]) -> Self {
        Self {
            entries: projected
                .iter()
                .enumerate()
                .map(|(i, p)| ReportEntry {
                    label: point_label(i),
                    easting: p.easting,
                    northing: p.northing,
                    elevation: p.elevation,
                    zone: p.zone.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    pub fn set_dxf_size(&mut self, bytes: usize) {
        self.dxf_bytes = bytes;
    }

    /// Zones UTM distinctes, dans l'ordre d'apparition
    pub fn zones(&self) -> Vec<&str> {
        let mut zones: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !zones.contains(&entry.zone.as_str()) {
                zones.push(&entry.zone);
            }
        }
        zones
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("CONVERTED COORDINATES");
        println!("{}", "=".repeat(60));

        for entry in &self.entries {
            println!("\nPoint {}:", entry.label);
            println!("  Easting: {:.2}m", entry.easting);
            println!("  Northing: {:.2}m", entry.northing);
            println!("  Elevation: {:.2}m", entry.elevation);
            println!("  Zone: {}", entry.zone);
        }

        let zones = self.zones();
        if zones.len() > 1 {
            println!("\nWarning: points span several UTM zones ({})", zones.join(", "));
        }

        println!("\n{}", self.summary());
        println!("{}", "=".repeat(60));
    }

    /// Journalise chaque point au niveau INFO
    pub fn log(&self) {
        for entry in &self.entries {
            info!(
                label = %entry.label,
                easting = entry.easting,
                northing = entry.northing,
                elevation = entry.elevation,
                zone = %entry.zone,
                "Converted coordinate"
            );
        }
        info!("{}", self.summary());
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} points converted ({}), {} bytes of DXF in {:.3}s",
            self.entries.len(),
            self.zones().join(", "),
            self.dxf_bytes,
            self.duration_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projected(zone: &str, easting: f64) -> ProjectedCoordinate {
        ProjectedCoordinate {
            easting,
            northing: 1_435_415.228,
            elevation: 920.5,
            zone: zone.parse().unwrap(),
        }
    }

    #[test]
    fn test_labels_follow_order() {
        let coords: Vec<_> = (0..28).map(|i| projected("43N", 781_000.0 + i as f64)).collect();
        let report = ConversionReport::new(&coords);

        assert_eq!(report.entries[0].label, "A");
        assert_eq!(report.entries[25].label, "Z");
        assert_eq!(report.entries[27].label, "AB");
        assert_eq!(report.entries[27].easting, 781_027.0);
    }

    #[test]
    fn test_zones() {
        let report = ConversionReport::new(&[
            projected("43N", 1.0),
            projected("44N", 2.0),
            projected("43N", 3.0),
        ]);
        assert_eq!(report.zones(), vec!["43N", "44N"]);
    }

    #[test]
    fn test_summary() {
        let mut report = ConversionReport::new(&[projected("43N", 781_470.277)]);
        report.set_dxf_size(4096);
        report.set_duration(Duration::from_millis(2));
        assert_eq!(report.summary(), "1 points converted (43N), 4096 bytes of DXF in 0.002s");
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        ConversionReport::new(&[projected("43N", 781_470.277)])
            .save_to_file(&path)
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["entries"][0]["label"], "A");
        assert_eq!(json["entries"][0]["zone"], "43N");
    }
}
