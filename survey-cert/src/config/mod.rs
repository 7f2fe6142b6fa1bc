//! Configuration du service
//!
//! Trois sources, de la plus faible à la plus forte : valeurs par défaut,
//! variables d'environnement (`BIND_ADDR`, `CORS_ORIGIN`), fichier JSON
//! optionnel, puis options de la ligne de commande.

use std::path::Path;

use anyhow::{Context, Result};
use geodxf::{DrawingStyle, Projector};
use serde::{Deserialize, Serialize};

/// Adresse d'écoute par défaut
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Origine CORS autorisée par défaut (frontend de développement)
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Configuration principale
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Mise en page du dessin DXF
    pub drawing: DrawingStyle,
    /// Section absente ou partielle : complétée par l'environnement
    #[serde(default = "ServerConfig::from_env")]
    pub server: ServerConfig,
    /// Backend de projection (`lite` ou `proj`)
    pub projection: Projector,
}

/// Configuration du serveur HTTP
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default = "ServerConfig::from_env")]
pub struct ServerConfig {
    pub bind: String,
    pub allowed_origin: String,
    /// Durée de cache des requêtes preflight (secondes)
    pub max_age: u32,
    /// Taille maximale d'un corps JSON (octets)
    pub json_limit: usize,
    /// Schéma PostgreSQL des certificats
    pub schema: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            allowed_origin: DEFAULT_ORIGIN.to_string(),
            max_age: 3600,
            json_limit: 1024 * 1024,
            schema: crate::store::DEFAULT_SCHEMA.to_string(),
        }
    }
}

impl ServerConfig {
    /// Valeurs par défaut surchargées par l'environnement
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(bind) = std::env::var("BIND_ADDR") {
            config.bind = bind;
        }
        if let Ok(origin) = std::env::var("CORS_ORIGIN") {
            config.allowed_origin = origin;
        }
        config
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_json(&content)
    }

    /// Parse une configuration JSON ; les sections absentes prennent leurs valeurs par défaut
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse config JSON")?;
        config.check()?;
        Ok(config)
    }

    /// Configuration effective : environnement, puis fichier s'il est fourni
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self {
                server: ServerConfig::from_env(),
                ..Default::default()
            }),
        }
    }

    fn check(&self) -> Result<()> {
        let style = &self.drawing;
        for (name, value) in [
            ("label_height", style.label_height),
            ("title_height", style.title_height),
            ("row_height", style.row_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                anyhow::bail!("drawing.{} must be a positive number, got {}", name, value);
            }
        }
        if style.layer.trim().is_empty() {
            anyhow::bail!("drawing.layer must not be empty");
        }
        if style.layer.chars().any(char::is_control) {
            anyhow::bail!("drawing.layer must not contain control characters");
        }
        if !self.projection.is_available() {
            anyhow::bail!(
                "Projection backend '{}' is not available in this build (enable the `proj` feature)",
                self.projection.description()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.server.allowed_origin, DEFAULT_ORIGIN);
        assert_eq!(config.server.max_age, 3600);
        assert_eq!(config.drawing, DrawingStyle::default());
        assert_eq!(config.projection, Projector::Lite);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_json(
            r#"{"drawing": {"table_margin": 80}, "server": {"bind": "127.0.0.1:8080"}}"#,
        )
        .unwrap();
        assert_eq!(config.drawing.table_margin, 80.0);
        assert_eq!(config.drawing.label_offset, 5.0);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.allowed_origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn test_rejects_bad_style() {
        assert!(Config::from_json(r#"{"drawing": {"row_height": 0}}"#).is_err());
        assert!(Config::from_json(r#"{"drawing": {"layer": " "}}"#).is_err());
        assert!(Config::from_json(r#"{"drawing": {"layer": "SURVEY\nPOINTS"}}"#).is_err());
    }

    #[test]
    fn test_file_keeps_environment() {
        std::env::set_var("BIND_ADDR", "127.0.0.1:5123");

        let dir = tempfile::tempdir().unwrap();
        let drawing_only = dir.path().join("drawing.json");
        std::fs::write(&drawing_only, r#"{"drawing": {"table_margin": 80}}"#).unwrap();
        let partial_server = dir.path().join("server.json");
        std::fs::write(&partial_server, r#"{"server": {"schema": "certs"}}"#).unwrap();

        let from_env = Config::resolve(None).unwrap();
        let drawing = Config::resolve(Some(&drawing_only)).unwrap();
        let server = Config::resolve(Some(&partial_server)).unwrap();
        std::env::remove_var("BIND_ADDR");

        assert_eq!(from_env.server.bind, "127.0.0.1:5123");
        assert_eq!(drawing.server.bind, "127.0.0.1:5123");
        assert_eq!(drawing.drawing.table_margin, 80.0);
        assert_eq!(server.server.bind, "127.0.0.1:5123");
        assert_eq!(server.server.schema, "certs");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.json");
        std::fs::write(&path, r#"{"server": {"schema": "certs"}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.schema, "certs");
        assert!(Config::load(&dir.path().join("missing.json")).is_err());
    }
}
