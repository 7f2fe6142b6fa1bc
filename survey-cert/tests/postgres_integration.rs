//! Tests d'intégration PostgreSQL
//!
//! Ces tests nécessitent une base PostgreSQL disponible.
//! Configuration via variables d'environnement:
//! - PGHOST, PGPORT, PGUSER, PGPASSWORD, PGDATABASE
//!
//! Exécution:
//! ```bash
//! # Avec PostgreSQL local
//! cargo test --test postgres_integration -- --ignored
//!
//! # Avec Docker
//! docker run -d --name postgres-test -e POSTGRES_PASSWORD=test -p 5432:5432 postgres:16
//! PGPASSWORD=test cargo test --test postgres_integration -- --ignored
//! ```

use anyhow::Result;
use serde_json::json;

use survey_cert::certificate::{CertificateDetails, CertificateRequest};
use survey_cert::store::{create_pool, CertificateStore, DatabaseConfig};

/// Configuration de test
fn test_config() -> DatabaseConfig {
    let mut config = DatabaseConfig::from_env().expect("database environment");
    if std::env::var("PGDATABASE").is_err() {
        config.dbname = "certificate_automation_test".into();
    }
    config.pool_size = 2;
    config
}

/// Crée un store sur un schéma de test vidé
async fn create_test_store(schema: &str) -> Result<CertificateStore> {
    let pool = create_pool(&test_config()).await?;
    let store = CertificateStore::new(pool, schema)?;
    store.create_schema(true).await?;
    Ok(store)
}

fn details(survey_no: &str, lat_secs: &[f64]) -> CertificateDetails {
    let coordinates: Vec<_> = lat_secs
        .iter()
        .map(|sec| {
            json!({
                "lat_deg": 12, "lat_min": 58, "lat_sec": sec, "lat_dir": "N",
                "lon_deg": 77, "lon_min": 35, "lon_sec": 40.2, "lon_dir": "E",
                "amsl": 920.5
            })
        })
        .collect();

    let request: CertificateRequest = serde_json::from_value(json!({
        "survey_no": survey_no,
        "village_name": "Hebbal",
        "owner": "Survey Office",
        "facility": "Tower",
        "coordinates": coordinates,
        "certificate_type": "NOC",
        "userEmail": "office@example.org"
    }))
    .unwrap();

    request.validate().unwrap()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_create_and_get() -> Result<()> {
    let store = create_test_store("survey_test_crud").await?;

    let created = store.create(&details("112/3", &[17.4, 20.1, 12.0])).await?;
    assert!(created.id > 0);
    assert_eq!(created.details.coordinates.len(), 3);
    assert_eq!(created.details.user_email.as_deref(), Some("office@example.org"));
    assert_eq!(created.coordinates_hash, created.details.coordinates_hash());
    assert!(created.created_at.ends_with('Z'));

    let fetched = store.get(created.id).await?.expect("certificate");
    assert_eq!(fetched, created);

    assert!(store.get(created.id + 1000).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_list_newest_first() -> Result<()> {
    let store = create_test_store("survey_test_list").await?;

    let first = store.create(&details("1", &[1.0])).await?;
    let second = store.create(&details("2", &[2.0])).await?;

    let listed = store.list().await?;
    let ids: Vec<i64> = listed.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_update_detects_reordering() -> Result<()> {
    let store = create_test_store("survey_test_update").await?;

    let created = store.create(&details("7", &[1.0, 2.0])).await?;

    // Mêmes points, même ordre
    let same = store
        .update(created.id, &details("7-bis", &[1.0, 2.0]))
        .await?
        .expect("certificate");
    assert!(!same.coordinates_changed());
    assert_eq!(same.certificate.details.survey_no, "7-bis");
    assert_eq!(same.certificate.created_at, created.created_at);

    // Ordre inversé : les étiquettes changent
    let reordered = store
        .update(created.id, &details("7-bis", &[2.0, 1.0]))
        .await?
        .expect("certificate");
    assert!(reordered.coordinates_changed());

    assert!(store.update(created.id + 1000, &details("x", &[1.0])).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_delete() -> Result<()> {
    let store = create_test_store("survey_test_delete").await?;

    let created = store.create(&details("9", &[1.0])).await?;
    assert!(store.delete(created.id).await?);
    assert!(!store.delete(created.id).await?);
    assert!(store.get(created.id).await?.is_none());
    Ok(())
}
