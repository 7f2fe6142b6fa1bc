//! Définition et implémentation des commandes CLI
//!
//! - `convert` : fichier JSON de coordonnées → DXF (sans base)
//! - `serve` : API HTTP
//! - `init-db` : création du schéma PostgreSQL

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use geodxf::drawing::{build_drawing, save_drawing};
use geodxf::transform::process_coordinates_with;
use geodxf::RawCoordinate;
use serde::Deserialize;
use tracing::{info, warn};

use survey_cert::certificate::validate_coordinates;
use survey_cert::config::Config;
use survey_cert::report::ConversionReport;
use survey_cert::server::{spawn_server, AppState};
use survey_cert::store::{self, CertificateStore, DatabaseConfig, DatabaseOverrides, SslMode};

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a JSON coordinate file to a DXF drawing (no database required)
    Convert {
        /// JSON file: an array of coordinates or {"coordinates": [...]}
        #[arg(short, long)]
        input: PathBuf,

        /// Output DXF file
        #[arg(short, long, default_value = "coordinates.dxf")]
        output: PathBuf,

        /// Write the projected coordinates as JSON
        #[arg(long)]
        values: Option<PathBuf>,

        /// Write the conversion report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// JSON config file (drawing style, projection backend)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the HTTP API
    Serve {
        /// Listen address (défaut : env BIND_ADDR / 0.0.0.0:5000)
        #[arg(long)]
        bind: Option<String>,

        /// Allowed CORS origin (défaut : env CORS_ORIGIN / http://localhost:3000)
        #[arg(long)]
        origin: Option<String>,

        /// Run without database (certificate routes answer 503)
        #[arg(long)]
        no_db: bool,

        /// PostgreSQL schema holding the certificates table
        #[arg(long)]
        schema: Option<String>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Create the certificates schema, table and indexes
    InitDb {
        /// PostgreSQL schema
        #[arg(long, default_value = store::DEFAULT_SCHEMA)]
        schema: String,

        /// Drop schema before creation
        #[arg(long)]
        drop_schema: bool,

        #[command(flatten)]
        db: DbArgs,
    },
}

/// Options de connexion PostgreSQL
#[derive(Args, Debug, Clone, Default)]
pub struct DbArgs {
    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long)]
    host: Option<String>,

    /// PostgreSQL database name (défaut : env PGDATABASE / certificate_automation)
    #[arg(long)]
    database: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER / postgres)
    #[arg(long)]
    user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long)]
    port: Option<u16>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / disable)
    #[arg(long)]
    ssl: Option<SslMode>,
}

impl DbArgs {
    /// Configuration base : environnement puis options
    fn database_config(self) -> Result<DatabaseConfig> {
        let mut config = DatabaseConfig::from_env()?;
        config.apply_overrides(DatabaseOverrides {
            host: self.host,
            database: self.database,
            user: self.user,
            password: self.password,
            port: self.port,
            ssl: self.ssl,
        });
        Ok(config)
    }
}

/// Fichier d'entrée de `convert`
#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinateFile {
    List(Vec<RawCoordinate>),
    Wrapped { coordinates: Vec<RawCoordinate> },
}

impl CoordinateFile {
    fn into_coordinates(self) -> Vec<RawCoordinate> {
        match self {
            Self::List(coordinates) | Self::Wrapped { coordinates } => coordinates,
        }
    }
}

/// Lit un fichier de coordonnées
fn read_coordinates(path: &Path) -> Result<Vec<RawCoordinate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read coordinates: {}", path.display()))?;
    let file: CoordinateFile = serde_json::from_str(&content).with_context(|| {
        format!(
            "Invalid coordinate file {}: expected an array or {{\"coordinates\": [...]}}",
            path.display()
        )
    })?;
    Ok(file.into_coordinates())
}

/// Exécute la commande convert
pub async fn cmd_convert(
    input: &Path,
    output: &Path,
    values: Option<&Path>,
    report_path: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    let started = Instant::now();
    let config = Config::resolve(config)?;

    let raw = read_coordinates(input)?;
    info!(input = %input.display(), count = raw.len(), "Coordinates loaded");

    let coords = validate_coordinates(&raw).context("Invalid coordinates")?;
    let projected = process_coordinates_with(&config.projection, &coords)
        .context("Coordinate conversion failed")?;

    let drawing = build_drawing(&projected, &config.drawing)?;
    save_drawing(&drawing, output)?;

    if let Some(values) = values {
        let json = serde_json::to_string_pretty(&projected)?;
        std::fs::write(values, json)
            .with_context(|| format!("Failed to write values: {}", values.display()))?;
        info!(path = %values.display(), "Converted values written");
    }

    let mut report = ConversionReport::new(&projected);
    report.set_dxf_size(std::fs::metadata(output).map(|m| m.len() as usize).unwrap_or(0));
    report.set_duration(started.elapsed());
    report.display();

    if let Some(path) = report_path {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report written");
    }

    println!("DXF written to {}", output.display());
    Ok(())
}

/// Connecte le pool et vérifie la connexion
async fn connect(db: DbArgs, schema: &str) -> Result<CertificateStore> {
    let db_config = db.database_config()?;
    info!(database = %db_config.describe(), "Connecting to PostgreSQL");

    let pool = store::create_pool(&db_config).await?;
    store::test_connection(&pool)
        .await
        .with_context(|| format!("Cannot reach {}", db_config.describe()))?;

    CertificateStore::new(pool, schema)
}

/// Exécute la commande serve
pub async fn cmd_serve(
    bind: Option<String>,
    origin: Option<String>,
    no_db: bool,
    schema: Option<String>,
    config: Option<&Path>,
    db: DbArgs,
) -> Result<()> {
    let mut config = Config::resolve(config)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(origin) = origin {
        config.server.allowed_origin = origin;
    }
    if let Some(schema) = schema {
        config.server.schema = schema;
    }

    let store = if no_db {
        warn!("Running without database, certificate routes are disabled");
        None
    } else {
        let store = connect(db, &config.server.schema)
            .await
            .context("Database unavailable (use --no-db to serve conversions only)")?;
        store.create_schema(false).await?;
        Some(store)
    };

    info!(
        bind = %config.server.bind,
        origin = %config.server.allowed_origin,
        projection = config.projection.description(),
        database = store.is_some(),
        "Starting HTTP API"
    );

    let state = actix_web::web::Data::new(AppState::new(store, config));
    let server = spawn_server(state)?;

    for addr in server.addrs() {
        println!("Listening on http://{}", addr);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    tokio::task::spawn_blocking(move || server.stop())
        .await
        .context("HTTP server shutdown failed")?;

    Ok(())
}

/// Exécute la commande init-db
pub async fn cmd_init_db(schema: &str, drop_schema: bool, db: DbArgs) -> Result<()> {
    let store = connect(db, schema).await?;
    store.create_schema(drop_schema).await?;
    println!("Schema {} ready", store.schema());
    Ok(())
}
