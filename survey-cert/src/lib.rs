//! # survey-cert
//!
//! Service autour de `geodxf` : conversion de points levés en DXF et gestion
//! des certificats de levé.
//!
//! ## Features
//!
//! - API HTTP (actix-web) : `/api/convert` et CRUD `/api/certificates`
//! - Stockage PostgreSQL avec pool de connexions
//! - Rapport de conversion console / JSON
//! - CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # Conversion d'un fichier de coordonnées
//! survey-cert convert --input points.json --output coordinates.dxf
//!
//! # Serveur HTTP (sans base de données)
//! survey-cert serve --no-db
//!
//! # Création du schéma PostgreSQL
//! survey-cert init-db
//! ```

pub mod certificate;
pub mod config;
pub mod report;
pub mod server;
pub mod store;

pub use certificate::{Certificate, CertificateDetails, CertificateRequest};
pub use config::Config;
pub use report::ConversionReport;
pub use server::{AppState, ApiError};
pub use store::{create_pool, CertificateStore, DatabaseConfig};
