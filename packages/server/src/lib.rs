#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident map.
//!
//! Serves report submission and triage, on-demand analysis, the archive of
//! generated analyses, and nearest-facility lookups. Reports are persisted
//! as JSON files under `INCIDENT_MAP_DATA_DIR` (default `data`).

mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use incident_map_ai::{AnalysisConfig, AnalysisPipeline, create_generator_from_env};
use incident_map_facility::FacilityFinder;
use incident_map_store::archive::ARCHIVE_FILE_NAME;
use incident_map_store::{GeneratedReportArchive, JsonFileReportStore, ReportStore};

/// Shared application state.
pub struct AppState {
    /// Report persistence.
    pub store: Arc<dyn ReportStore>,
    /// Analysis pipeline, with whatever collaborators were configured.
    pub pipeline: Arc<AnalysisPipeline>,
    /// Nearest-facility search, absent when no facility service is usable.
    pub facilities: Option<Arc<FacilityFinder>>,
    /// Archive of generated analyses.
    pub archive: Arc<GeneratedReportArchive>,
}

impl AppState {
    /// Default facility search radius, from the pipeline configuration.
    #[must_use]
    pub fn default_radius_km(&self) -> f64 {
        self.pipeline.config().facilities.radius_km
    }
}

/// Registers every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports", web::post().to(handlers::create_report))
            .route("/reports/statistics", web::get().to(handlers::statistics))
            .route(
                "/reports/{type}/{id}/status",
                web::put().to(handlers::update_status),
            )
            .route("/analyze", web::post().to(handlers::analyze))
            .route("/analyses", web::get().to(handlers::analyses))
            .route("/facilities/nearest", web::get().to(handlers::nearest_facility)),
    );
}

/// Builds the application state from environment variables.
///
/// * `INCIDENT_MAP_DATA_DIR`: report and archive directory (`data`)
/// * `INCIDENT_MAP_CONFIG`: optional analysis config TOML
/// * `AI_PROVIDER`, `*_API_KEY`, `AI_MODEL`: insight generator selection
///
/// A misconfigured insight generator or facility service is logged and
/// left out; analysis then falls back to local summaries.
///
/// # Errors
///
/// * If the data directory cannot be created
/// * If the archive file or the config file cannot be read
pub async fn state_from_env() -> Result<AppState, Box<dyn std::error::Error>> {
    let data_dir =
        PathBuf::from(std::env::var("INCIDENT_MAP_DATA_DIR").unwrap_or_else(|_| "data".to_string()));

    let config = match std::env::var("INCIDENT_MAP_CONFIG") {
        Ok(path) => AnalysisConfig::load(Path::new(&path))?,
        Err(_) => AnalysisConfig::embedded(),
    };

    let store = JsonFileReportStore::open(&data_dir).await?;
    let archive = GeneratedReportArchive::open(data_dir.join(ARCHIVE_FILE_NAME)).await?;

    let facilities = match FacilityFinder::from_registry() {
        Ok(finder) => Some(Arc::new(config.facilities.configure(finder))),
        Err(e) => {
            log::warn!("Facility lookups disabled: {e}");
            None
        }
    };

    let mut pipeline = AnalysisPipeline::new(config);
    match create_generator_from_env() {
        Ok(Some(generator)) => pipeline = pipeline.with_generator(generator),
        Ok(None) => {}
        Err(e) => log::warn!("Insight generator disabled: {e}"),
    }
    if let Some(finder) = &facilities {
        pipeline = pipeline.with_facility_finder(finder.clone());
    }

    Ok(AppState {
        store: Arc::new(store),
        pipeline: Arc::new(pipeline),
        facilities,
        archive: Arc::new(archive),
    })
}

/// Starts the incident map API server.
///
/// Reads `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default `8080`).
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// * If the application state cannot be built
/// * If the HTTP server fails to bind or encounters a runtime error
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let state = web::Data::new(state_from_env().await?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
