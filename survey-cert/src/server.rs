//! API HTTP (actix-web) : conversion de coordonnées et CRUD des certificats
//!
//! Le serveur tourne sur un thread dédié avec son propre système actix ;
//! le runtime tokio principal garde la main sur le pool PostgreSQL et
//! l'arrêt du processus.

use std::net::SocketAddr;
use std::time::Instant;

use actix_web::http::{header, Method, StatusCode};
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, ResponseError};
use anyhow::{Context, Result};
use geodxf::drawing::build_drawing;
use geodxf::transform::process_coordinates_with;
use geodxf::{
    ConversionError, DrawingGenerationError, DrawingStyle, GeodeticCoordinate, Projector,
    RawCoordinate,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::certificate::{validate_coordinates, CertificateRequest};
use crate::config::{Config, ServerConfig};
use crate::report::ConversionReport;
use crate::store::CertificateStore;

/// En-tête portant les coordonnées projetées (JSON)
pub const CONVERTED_VALUES_HEADER: &str = "X-Converted-Values";

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// État partagé des handlers
pub struct AppState {
    /// Absent en mode `--no-db`
    pub store: Option<CertificateStore>,
    pub style: DrawingStyle,
    pub projector: Projector,
    pub server: ServerConfig,
}

impl AppState {
    pub fn new(store: Option<CertificateStore>, config: Config) -> Self {
        Self {
            store,
            style: config.drawing,
            projector: config.projection,
            server: config.server,
        }
    }

    fn store(&self) -> Result<&CertificateStore, ApiError> {
        self.store.as_ref().ok_or(ApiError::DatabaseUnavailable)
    }
}

/// Erreurs renvoyées au client sous la forme `{"detail": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No coordinates provided")]
    NoCoordinates,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Conversion(ConversionError),

    #[error("Invalid certificate ID: {0}")]
    InvalidId(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Database not connected")]
    DatabaseUnavailable,

    #[error(transparent)]
    Drawing(#[from] DrawingGenerationError),

    #[error("{0}")]
    Internal(String),
}

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::Empty => Self::NoCoordinates,
            other => Self::Conversion(other),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Request failed: {:#}", err);
        Self::Internal(format!("{:#}", err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoCoordinates | Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) | Self::Conversion(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Drawing(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}

/// Corps de `POST /api/convert`
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    #[serde(default)]
    pub coordinates: Vec<RawCoordinate>,
}

/// En-têtes CORS ajoutés à toutes les réponses
pub fn cors_headers(config: &ServerConfig) -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, config.allowed_origin.clone()))
        .add((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"))
        .add((header::VARY, "Origin"))
}

/// Extracteur JSON : corps invalide → 422
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            warn!(error = %err, "Rejected request body");
            ApiError::Validation(err.to_string()).into()
        })
}

/// Enregistre l'état, l'extracteur JSON et les routes
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let limit = state.server.json_limit;
    cfg.app_data(state)
        .app_data(json_config(limit))
        .service(
            web::resource("/api/convert")
                .route(web::post().to(convert))
                .route(web::method(Method::OPTIONS).to(preflight)),
        )
        .service(
            web::resource("/api/certificates")
                .route(web::get().to(list_certificates))
                .route(web::post().to(create_certificate))
                .route(web::method(Method::OPTIONS).to(preflight)),
        )
        .service(
            web::resource("/api/certificates/{id}")
                .route(web::get().to(get_certificate))
                .route(web::put().to(update_certificate))
                .route(web::delete().to(delete_certificate))
                .route(web::method(Method::OPTIONS).to(preflight)),
        )
        .service(
            web::resource("/api/certificates/{id}/dxf")
                .route(web::get().to(certificate_dxf))
                .route(web::method(Method::OPTIONS).to(preflight)),
        )
        .default_service(web::to(fallback));
}

/// Réponse aux requêtes preflight CORS
async fn preflight(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let requested_headers = req
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("*")
        .to_string();

    HttpResponse::Ok()
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, requested_headers))
        .insert_header((header::ACCESS_CONTROL_MAX_AGE, state.server.max_age.to_string()))
        .json(json!({ "status": "ok" }))
}

async fn fallback(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    if req.method() == Method::OPTIONS {
        return Ok(preflight(req, state).await);
    }
    Err(ApiError::NotFound("Not Found"))
}

/// Projette, dessine et journalise ; renvoie le DXF avec les valeurs converties
fn render_dxf(
    state: &AppState,
    coords: &[GeodeticCoordinate],
    filename: &str,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();

    let projected = process_coordinates_with(&state.projector, coords)?;
    let dxf = build_drawing(&projected, &state.style)?.to_dxf_bytes()?;

    let mut report = ConversionReport::new(&projected);
    report.set_dxf_size(dxf.len());
    report.set_duration(started.elapsed());
    report.log();

    let values = serde_json::to_string(&projected)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize converted values: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type("application/dxf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .insert_header((CONVERTED_VALUES_HEADER, values))
        .insert_header((header::ACCESS_CONTROL_EXPOSE_HEADERS, CONVERTED_VALUES_HEADER))
        .body(dxf))
}

async fn convert(
    state: web::Data<AppState>,
    body: web::Json<ConvertRequest>,
) -> Result<HttpResponse, ApiError> {
    let coords = validate_coordinates(&body.coordinates).map_err(|e| {
        warn!(error = %e, "Rejected coordinates");
        e
    })?;
    info!(count = coords.len(), "Converting coordinates");
    render_dxf(&state, &coords, "coordinates.dxf")
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::InvalidId(raw.to_string()))
}

async fn list_certificates(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let certificates = state.store()?.list().await?;
    Ok(HttpResponse::Ok().json(certificates))
}

async fn create_certificate(
    state: web::Data<AppState>,
    body: web::Json<CertificateRequest>,
) -> Result<HttpResponse, ApiError> {
    let store = state.store()?;
    let details = body.into_inner().validate()?;
    let certificate = store.create(&details).await?;
    Ok(HttpResponse::Created().json(certificate))
}

async fn get_certificate(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let store = state.store()?;
    let id = parse_id(&path)?;
    let certificate = store
        .get(id)
        .await?
        .ok_or(ApiError::NotFound("Certificate not found"))?;
    Ok(HttpResponse::Ok().json(certificate))
}

async fn update_certificate(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CertificateRequest>,
) -> Result<HttpResponse, ApiError> {
    let store = state.store()?;
    let id = parse_id(&path)?;
    let details = body.into_inner().validate()?;

    let outcome = store
        .update(id, &details)
        .await?
        .ok_or(ApiError::NotFound("Certificate not found"))?;

    if outcome.coordinates_changed() {
        warn!(
            id,
            previous = %outcome.previous_hash,
            current = %outcome.certificate.coordinates_hash,
            "Coordinate list changed, point labels may have shifted"
        );
    }

    Ok(HttpResponse::Ok().json(outcome.certificate))
}

async fn delete_certificate(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let store = state.store()?;
    let id = parse_id(&path)?;
    if !store.delete(id).await? {
        return Err(ApiError::NotFound("Certificate not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Certificate deleted successfully" })))
}

async fn certificate_dxf(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let store = state.store()?;
    let id = parse_id(&path)?;
    let certificate = store
        .get(id)
        .await?
        .ok_or(ApiError::NotFound("Certificate not found"))?;

    render_dxf(
        &state,
        &certificate.details.coordinates,
        &format!("certificate-{}.dxf", certificate.id),
    )
}

/// Handle du thread serveur
pub struct ApiServer {
    addrs: Vec<SocketAddr>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ApiServer {
    /// Adresses effectivement écoutées
    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Demande l'arrêt et attend la fin du thread
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Démarre le serveur sur un thread dédié ; retourne une fois l'adresse liée
pub fn spawn_server(state: web::Data<AppState>) -> Result<ApiServer> {
    let bind = state.server.bind.clone();
    let bind_display = bind.clone();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<std::io::Result<Vec<SocketAddr>>>();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = std::thread::Builder::new()
        .name("survey-cert-http".into())
        .spawn(move || {
            let result = actix_web::rt::System::new().block_on(async move {
                let server = HttpServer::new(move || {
                    let state = state.clone();
                    App::new()
                        .wrap(cors_headers(&state.server))
                        .configure(|cfg| configure(cfg, state))
                })
                .disable_signals()
                .bind(bind.as_str());

                let server = match server {
                    Ok(server) => {
                        let _ = ready_tx.send(Ok(server.addrs()));
                        server.run()
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return Ok(());
                    }
                };

                let srv_handle = server.handle();
                actix_web::rt::spawn(async move {
                    let _ = shutdown_rx.await;
                    srv_handle.stop(true).await;
                });

                server.await
            });

            if let Err(err) = result {
                error!("HTTP server error: {err}");
            }
        })
        .context("Failed to spawn HTTP server thread")?;

    let addrs = ready_rx
        .recv()
        .context("HTTP server thread exited before binding")?
        .with_context(|| format!("Failed to bind {}", bind_display))?;

    info!(addrs = ?addrs, "HTTP server listening");

    Ok(ApiServer {
        addrs,
        shutdown: Some(shutdown_tx),
        handle: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id(" 7 ").unwrap(), 7);
        assert!(matches!(parse_id("0"), Err(ApiError::InvalidId(_))));
        assert!(matches!(parse_id("64b7f0"), Err(ApiError::InvalidId(_))));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NoCoordinates.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(ConversionError::Empty).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ConversionError::out_of_range(1, "bad")).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::DatabaseUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::DatabaseUnavailable.to_string(), "Database not connected");
    }
}
