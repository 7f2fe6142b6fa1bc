//! Pool de connexions PostgreSQL
//!
//! Les paramètres viennent de l'environnement (`PGHOST`, `PGPORT`,
//! `PGDATABASE`, `PGUSER`, `PGPASSWORD`, `PGSSLMODE`, `POOL_SIZE`) puis des
//! options de la ligne de commande. Une valeur illisible est une erreur.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime, Timeouts};
use tokio_postgres::NoTls;
use tokio_postgres_rustls::MakeRustlsConnect;

/// Base par défaut
pub const DEFAULT_DATABASE: &str = "certificate_automation";

/// Mode SSL demandé au serveur
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    /// Connexion en clair
    #[default]
    Disable,
    /// TLS si le serveur le propose, clair sinon
    Prefer,
    /// TLS obligatoire, échec si le serveur ne le propose pas
    Require,
}

impl FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" | "off" | "false" | "no" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" | "on" | "true" | "yes" => Ok(SslMode::Require),
            _ => Err(format!("Invalid SSL mode: {s:?}. Use: disable, prefer, require")),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        })
    }
}

impl From<SslMode> for deadpool_postgres::SslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => deadpool_postgres::SslMode::Disable,
            SslMode::Prefer => deadpool_postgres::SslMode::Prefer,
            SslMode::Require => deadpool_postgres::SslMode::Require,
        }
    }
}

/// Paramètres de connexion à la base des certificats
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub pool_size: usize,
    pub ssl_mode: SslMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            dbname: DEFAULT_DATABASE.into(),
            user: "postgres".into(),
            password: None,
            pool_size: 8,
            ssl_mode: SslMode::Disable,
        }
    }
}

/// Lit et parse une variable optionnelle
fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("Invalid {}={:?}: {}", key, raw, e))
        })
        .transpose()
}

impl DatabaseConfig {
    /// Valeurs par défaut surchargées par l'environnement du processus
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Valeurs par défaut surchargées par une source clé → valeur
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("PGHOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PGPORT")?.unwrap_or(defaults.port),
            dbname: lookup("PGDATABASE").unwrap_or(defaults.dbname),
            user: lookup("PGUSER").unwrap_or(defaults.user),
            password: lookup("PGPASSWORD"),
            pool_size: parsed(&lookup, "POOL_SIZE")?.unwrap_or(defaults.pool_size),
            ssl_mode: parsed(&lookup, "PGSSLMODE")?.unwrap_or(defaults.ssl_mode),
        })
    }

    /// Applique les surcharges passées en ligne de commande
    pub fn apply_overrides(&mut self, overrides: DatabaseOverrides) {
        let DatabaseOverrides {
            host,
            database,
            user,
            password,
            port,
            ssl,
        } = overrides;

        self.host = host.unwrap_or(std::mem::take(&mut self.host));
        self.dbname = database.unwrap_or(std::mem::take(&mut self.dbname));
        self.user = user.unwrap_or(std::mem::take(&mut self.user));
        self.password = password.or(self.password.take());
        self.port = port.unwrap_or(self.port);
        self.ssl_mode = ssl.unwrap_or(self.ssl_mode);
    }

    /// Description sans mot de passe, pour les logs
    pub fn describe(&self) -> String {
        format!(
            "{}@{}:{}/{} (sslmode={})",
            self.user, self.host, self.port, self.dbname, self.ssl_mode
        )
    }

    /// Configuration deadpool ; le mode SSL est transmis au client
    fn pool_config(&self) -> Config {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = self.password.clone();
        cfg.ssl_mode = Some(self.ssl_mode.into());
        cfg.pool = Some(PoolConfig {
            max_size: self.pool_size,
            timeouts: Timeouts {
                wait: Some(Duration::from_secs(30)),
                create: Some(Duration::from_secs(5)),
                recycle: Some(Duration::from_secs(30)),
            },
            ..Default::default()
        });
        cfg
    }
}

/// Surcharges optionnelles de la configuration base
#[derive(Debug, Clone, Default)]
pub struct DatabaseOverrides {
    pub host: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub ssl: Option<SslMode>,
}

/// Connecteur rustls sur les racines webpki
fn make_tls_connector() -> MakeRustlsConnect {
    let roots = rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    MakeRustlsConnect::new(config)
}

/// Crée un pool de connexions
pub async fn create_pool(config: &DatabaseConfig) -> Result<Pool> {
    let cfg = config.pool_config();

    match config.ssl_mode {
        SslMode::Disable => cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to create database pool"),
        SslMode::Prefer | SslMode::Require => cfg
            .create_pool(Some(Runtime::Tokio1), make_tls_connector())
            .with_context(|| {
                format!("Failed to create database pool (sslmode={})", config.ssl_mode)
            }),
    }
}

/// Vérifie qu'une connexion du pool répond
pub async fn test_connection(pool: &Pool) -> Result<()> {
    let client = pool
        .get()
        .await
        .context("Failed to get connection from pool")?;
    client
        .execute("SELECT 1", &[])
        .await
        .context("Connection test failed")?;
    Ok(())
}
