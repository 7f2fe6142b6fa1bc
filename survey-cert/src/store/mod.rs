//! Stockage PostgreSQL des certificats
//!
//! Les coordonnées sont stockées en JSONB dans leur ordre d'origine ; les
//! horodatages sont relus au format RFC 3339 UTC.

pub mod pool;

use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::{debug, info, warn};

use crate::certificate::{Certificate, CertificateDetails};
use geodxf::GeodeticCoordinate;

pub use pool::{create_pool, test_connection, DatabaseConfig, DatabaseOverrides, SslMode};

/// Schéma par défaut
pub const DEFAULT_SCHEMA: &str = "survey";

const TIMESTAMP_FORMAT: &str = r#"'YYYY-MM-DD"T"HH24:MI:SS.US"Z"'"#;

/// Liste des colonnes relues, préfixées par un alias de table
fn select_columns(alias: &str) -> String {
    format!(
        "{a}.id, {a}.survey_no, {a}.village_name, {a}.owner, {a}.facility, \
         {a}.coordinates::text, {a}.certificate_type, \
         {a}.user_name, {a}.user_address, {a}.user_phone, {a}.user_email, \
         {a}.coordinates_hash, \
         to_char({a}.created_at AT TIME ZONE 'UTC', {f}), \
         to_char({a}.updated_at AT TIME ZONE 'UTC', {f})",
        a = alias,
        f = TIMESTAMP_FORMAT
    )
}

/// Vérifie qu'un nom de schéma est un identifiant SQL simple
fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.len() <= 63;
    if !valid {
        anyhow::bail!("Invalid schema name: {:?}", name);
    }
    Ok(())
}

/// Résultat d'une mise à jour
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub certificate: Certificate,
    /// Hash des coordonnées avant la mise à jour
    pub previous_hash: String,
}

impl UpdateOutcome {
    /// Vrai quand la liste de coordonnées a changé (les étiquettes ont pu glisser)
    pub fn coordinates_changed(&self) -> bool {
        self.previous_hash != self.certificate.coordinates_hash
    }
}

/// Accès aux certificats
#[derive(Clone)]
pub struct CertificateStore {
    pool: Pool,
    schema: String,
}

impl CertificateStore {
    pub fn new(pool: Pool, schema: &str) -> Result<Self> {
        validate_identifier(schema)?;
        Ok(Self {
            pool,
            schema: schema.to_string(),
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn table(&self) -> String {
        format!("{}.certificates", self.schema)
    }

    /// Crée le schéma, la table et les index s'ils n'existent pas
    pub async fn create_schema(&self, drop_existing: bool) -> Result<()> {
        let client = self.pool.get().await?;

        if drop_existing {
            warn!(schema = %self.schema, "Dropping existing schema");
            client
                .execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema), &[])
                .await
                .context("Failed to drop schema")?;
        }

        client
            .execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema), &[])
            .await
            .context("Failed to create schema")?;

        let table = self.table();
        client
            .batch_execute(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id BIGSERIAL PRIMARY KEY,
                    survey_no TEXT NOT NULL,
                    village_name TEXT NOT NULL,
                    owner TEXT NOT NULL,
                    facility TEXT NOT NULL,
                    coordinates JSONB NOT NULL,
                    certificate_type TEXT NOT NULL,
                    user_name TEXT,
                    user_address TEXT,
                    user_phone TEXT,
                    user_email TEXT,
                    coordinates_hash TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );
                CREATE INDEX IF NOT EXISTS certificates_facility_idx ON {table} (facility);
                CREATE INDEX IF NOT EXISTS certificates_created_at_idx ON {table} (created_at);
                "#,
                table = table
            ))
            .await
            .with_context(|| format!("Failed to create table {}", table))?;

        info!(table = %table, "Certificate table ready");
        Ok(())
    }

    /// Liste les certificats, du plus récent au plus ancien
    pub async fn list(&self) -> Result<Vec<Certificate>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM {} c ORDER BY c.created_at DESC, c.id DESC",
            select_columns("c"),
            self.table()
        );
        let rows = client
            .query(&sql, &[])
            .await
            .context("Failed to list certificates")?;

        debug!(count = rows.len(), "Listed certificates");
        rows.iter().map(row_to_certificate).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<Certificate>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM {} c WHERE c.id = $1",
            select_columns("c"),
            self.table()
        );
        let row = client
            .query_opt(&sql, &[&id])
            .await
            .with_context(|| format!("Failed to fetch certificate {}", id))?;

        row.as_ref().map(row_to_certificate).transpose()
    }

    pub async fn create(&self, details: &CertificateDetails) -> Result<Certificate> {
        let client = self.pool.get().await?;
        let coordinates = serde_json::to_string(&details.coordinates)?;
        let hash = details.coordinates_hash();

        let sql = format!(
            "INSERT INTO {} AS c (survey_no, village_name, owner, facility, coordinates, \
             certificate_type, user_name, user_address, user_phone, user_email, coordinates_hash) \
             VALUES ($1, $2, $3, $4, $5::text::jsonb, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            self.table(),
            select_columns("c")
        );
        let row = client
            .query_one(
                &sql,
                &[
                    &details.survey_no,
                    &details.village_name,
                    &details.owner,
                    &details.facility,
                    &coordinates,
                    &details.certificate_type,
                    &details.user_name,
                    &details.user_address,
                    &details.user_phone,
                    &details.user_email,
                    &hash,
                ],
            )
            .await
            .context("Failed to insert certificate")?;

        let certificate = row_to_certificate(&row)?;
        info!(
            id = certificate.id,
            points = certificate.details.coordinates.len(),
            "Certificate created"
        );
        Ok(certificate)
    }

    /// Remplace les champs éditables et met à jour `updated_at`
    pub async fn update(
        &self,
        id: i64,
        details: &CertificateDetails,
    ) -> Result<Option<UpdateOutcome>> {
        let client = self.pool.get().await?;
        let coordinates = serde_json::to_string(&details.coordinates)?;
        let hash = details.coordinates_hash();

        let sql = format!(
            "WITH previous AS (SELECT id, coordinates_hash FROM {table} WHERE id = $1 FOR UPDATE) \
             UPDATE {table} AS c SET survey_no = $2, village_name = $3, owner = $4, facility = $5, \
             coordinates = $6::text::jsonb, certificate_type = $7, user_name = $8, \
             user_address = $9, user_phone = $10, user_email = $11, coordinates_hash = $12, \
             updated_at = NOW() \
             FROM previous WHERE c.id = previous.id \
             RETURNING {columns}, previous.coordinates_hash",
            table = self.table(),
            columns = select_columns("c")
        );
        let row = client
            .query_opt(
                &sql,
                &[
                    &id,
                    &details.survey_no,
                    &details.village_name,
                    &details.owner,
                    &details.facility,
                    &coordinates,
                    &details.certificate_type,
                    &details.user_name,
                    &details.user_address,
                    &details.user_phone,
                    &details.user_email,
                    &hash,
                ],
            )
            .await
            .with_context(|| format!("Failed to update certificate {}", id))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let outcome = UpdateOutcome {
            certificate: row_to_certificate(&row)?,
            previous_hash: row.try_get(14)?,
        };
        info!(id, "Certificate updated");
        Ok(Some(outcome))
    }

    /// Supprime un certificat ; faux s'il n'existait pas
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let client = self.pool.get().await?;
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table());
        let deleted = client
            .execute(&sql, &[&id])
            .await
            .with_context(|| format!("Failed to delete certificate {}", id))?;

        if deleted > 0 {
            info!(id, "Certificate deleted");
        }
        Ok(deleted > 0)
    }
}

fn row_to_certificate(row: &Row) -> Result<Certificate> {
    let id: i64 = row.try_get(0)?;
    let coordinates_json: String = row.try_get(5)?;
    let coordinates: Vec<GeodeticCoordinate> = serde_json::from_str(&coordinates_json)
        .with_context(|| format!("Invalid coordinates stored for certificate {}", id))?;

    Ok(Certificate {
        id,
        details: CertificateDetails {
            survey_no: row.try_get(1)?,
            village_name: row.try_get(2)?,
            owner: row.try_get(3)?,
            facility: row.try_get(4)?,
            coordinates,
            certificate_type: row.try_get(6)?,
            user_name: row.try_get(7)?,
            user_address: row.try_get(8)?,
            user_phone: row.try_get(9)?,
            user_email: row.try_get(10)?,
        },
        coordinates_hash: row.try_get(11)?,
        created_at: row.try_get(12)?,
        updated_at: row.try_get(13)?,
    })
}
