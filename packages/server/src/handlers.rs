//! HTTP handler functions for the incident map API.

use actix_web::{HttpResponse, web};
use incident_map_analytics_models::AnalysisOptions;
use incident_map_facility::FacilityError;
use incident_map_report_models::{Report, ReportType};
use incident_map_server_models::{
    AnalyzeRequest, ApiAnalysis, ApiError, ApiHealth, CreateReportRequest, NearestQueryParams,
    ReportsQueryParams, UpdateStatusRequest,
};
use incident_map_store::StoreError;

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        insight_provider: state.pipeline.generator_name().map(str::to_string),
        facilities_enabled: state.facilities.is_some(),
    })
}

/// `GET /api/reports`
///
/// Lists reports of one type, or of every type when `type` is omitted.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportsQueryParams>,
) -> HttpResponse {
    match load_reports(&state, params.report_type).await {
        Ok(reports) => HttpResponse::Ok().json(reports),
        Err(e) => store_error(&e),
    }
}

/// `POST /api/reports`
pub async fn create_report(
    state: web::Data<AppState>,
    body: web::Json<CreateReportRequest>,
) -> HttpResponse {
    let report = body.into_inner().into_report(chrono::Utc::now(), id_suffix());
    let id = report.id.clone();

    match state.store.save(report).await {
        Ok(saved) => {
            log::info!("Stored {} report {id}", saved.report_type);
            HttpResponse::Created().json(saved)
        }
        Err(e) => store_error(&e),
    }
}

/// `GET /api/reports/statistics`
pub async fn statistics(state: web::Data<AppState>) -> HttpResponse {
    match state.store.statistics().await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => store_error(&e),
    }
}

/// `PUT /api/reports/{type}/{id}/status`
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<(ReportType, String)>,
    body: web::Json<UpdateStatusRequest>,
) -> HttpResponse {
    let (report_type, id) = path.into_inner();

    match state.store.update_status(report_type, &id, body.status).await {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => store_error(&e),
    }
}

/// `POST /api/analyze`
///
/// Runs the analysis pipeline over the stored reports. Never fails on
/// empty input; the result then carries the "no reports" summary.
pub async fn analyze(
    state: web::Data<AppState>,
    body: Option<web::Json<AnalyzeRequest>>,
) -> HttpResponse {
    let request = body.map(web::Json::into_inner).unwrap_or_default();

    let reports = match load_reports(&state, request.report_type).await {
        Ok(reports) => reports,
        Err(e) => return store_error(&e),
    };

    let options = AnalysisOptions {
        date_range_days: request.date_range_days,
        reference_time: None,
    };
    let result = state.pipeline.analyze_reports(&reports, options).await;

    let archive_id = if request.archive {
        match state.archive.archive(result.clone()).await {
            Ok(archived) => Some(archived.id),
            Err(e) => {
                log::error!("Failed to archive analysis: {e}");
                None
            }
        }
    } else {
        None
    };

    HttpResponse::Ok().json(ApiAnalysis { archive_id, result })
}

/// `GET /api/analyses`
///
/// Archived analyses, newest first.
pub async fn analyses(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.archive.list().await)
}

/// `GET /api/facilities/nearest`
///
/// Nearest emergency facility plus ranked alternatives around a point.
pub async fn nearest_facility(
    state: web::Data<AppState>,
    params: web::Query<NearestQueryParams>,
) -> HttpResponse {
    let Some(finder) = &state.facilities else {
        return HttpResponse::ServiceUnavailable()
            .json(ApiError::new("Facility lookups are not configured"));
    };

    if !(-90.0..=90.0).contains(&params.lat) || !(-180.0..=180.0).contains(&params.lon) {
        return HttpResponse::BadRequest().json(ApiError::new(format!(
            "Invalid query location ({}, {})",
            params.lat, params.lon
        )));
    }

    let radius_km = params
        .radius_km
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or_else(|| state.default_radius_km());

    match finder
        .find_nearby(params.lat, params.lon, params.severity, radius_km)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => facility_error(&e),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_reports(
    state: &AppState,
    report_type: Option<ReportType>,
) -> Result<Vec<Report>, StoreError> {
    match report_type {
        Some(report_type) => state.store.get_all(report_type).await,
        None => state.store.get_all_types().await,
    }
}

/// Random three-digit disambiguator for server-minted report ids.
fn id_suffix() -> u16 {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    u16::from_le_bytes([bytes[0], bytes[1]])
}

fn store_error(e: &StoreError) -> HttpResponse {
    match e {
        StoreError::DuplicateId { .. } => HttpResponse::Conflict().json(ApiError::new(e.to_string())),
        StoreError::NotFound { .. } => HttpResponse::NotFound().json(ApiError::new(e.to_string())),
        StoreError::Io(_) | StoreError::Json(_) => {
            log::error!("Report store failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Report store failed"))
        }
    }
}

fn facility_error(e: &FacilityError) -> HttpResponse {
    match e {
        FacilityError::InvalidLocation { .. } => {
            HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
        }
        FacilityError::NoFacilitiesFound { .. } => {
            log::info!("Facility lookup: {e}");
            no_facilities_found()
        }
        FacilityError::Timeout { .. } | FacilityError::Unavailable { .. } => {
            log::warn!("Facility provider unavailable: {e}");
            no_facilities_found()
        }
        FacilityError::Http(_) | FacilityError::Parse { .. } => {
            log::error!("Facility lookup failed: {e}");
            no_facilities_found()
        }
    }
}

fn no_facilities_found() -> HttpResponse {
    HttpResponse::NotFound()
        .json(ApiError::new("No facilities found").with_hint("Increase the search radius"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use incident_map_ai::{AnalysisConfig, AnalysisPipeline};
    use incident_map_facility::{FacilityFinder, FacilityProvider};
    use incident_map_facility_models::Facility;
    use incident_map_report_models::{Location, ReportStatus};
    use incident_map_store::{GeneratedReportArchive, MemoryReportStore};
    use serde_json::{Value, json};

    use super::*;

    struct FixedProvider(Vec<Facility>);

    #[async_trait]
    impl FacilityProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn search(
            &self,
            _latitude: f64,
            _longitude: f64,
            _radius_km: f64,
        ) -> Result<Vec<Facility>, FacilityError> {
            Ok(self.0.clone())
        }
    }

    fn report(id: &str, report_type: ReportType, lat: f64, lon: f64) -> Report {
        Report {
            id: id.to_string(),
            report_type,
            location: Location::real(lat, lon),
            status: ReportStatus::Pending,
            severity: None,
            description: None,
            created_at: Utc::now() - Duration::hours(1),
        }
    }

    fn state(reports: Vec<Report>, facilities: Option<Vec<Facility>>) -> web::Data<AppState> {
        let facilities = facilities
            .map(|list| Arc::new(FacilityFinder::new(Arc::new(FixedProvider(list)))));
        web::Data::new(AppState {
            store: Arc::new(MemoryReportStore::with_reports(reports)),
            pipeline: Arc::new(AnalysisPipeline::new(AnalysisConfig::default())),
            facilities,
            archive: Arc::new(GeneratedReportArchive::in_memory()),
        })
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state).configure(crate::configure)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_collaborators() {
        let app = app!(state(vec![], None));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["healthy"], true);
        assert_eq!(body["facilitiesEnabled"], false);
        assert!(body["insightProvider"].is_null());
    }

    #[actix_web::test]
    async fn create_then_list_by_type() {
        let app = app!(state(vec![], None));

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({
                "type": "infrastructure",
                "location": { "latitude": 12.97, "longitude": 77.59, "isReal": true },
                "description": "Broken streetlight"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert!(created["id"].as_str().unwrap().starts_with("INF-"));
        assert_eq!(created["status"], "pending");

        let req = test::TestRequest::get().uri("/api/reports?type=infrastructure").to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);

        let req = test::TestRequest::get().uri("/api/reports?type=police").to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(listed.is_empty());
    }

    #[actix_web::test]
    async fn duplicate_id_conflicts() {
        let app = app!(state(vec![report("POL-1", ReportType::Police, 1.0, 1.0)], None));

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({
                "id": "POL-1",
                "type": "police",
                "location": { "latitude": 1.0, "longitude": 1.0 }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn status_update_and_statistics() {
        let app = app!(state(
            vec![
                report("MED-1", ReportType::Medical, 1.0, 1.0),
                report("POL-1", ReportType::Police, 1.0, 1.0),
            ],
            None
        ));

        let req = test::TestRequest::put()
            .uri("/api/reports/medical/MED-1/status")
            .set_json(json!({ "status": "resolved" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], "resolved");

        let req = test::TestRequest::put()
            .uri("/api/reports/medical/NOPE/status")
            .set_json(json!({ "status": "resolved" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/reports/statistics").to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["total"], 2);
        assert_eq!(stats["byStatus"]["resolved"], 1);
        assert_eq!(stats["byType"]["police"], 1);
    }

    #[actix_web::test]
    async fn analyze_empty_store_returns_placeholder() {
        let app = app!(state(vec![], None));
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["insightText"], "No reports available for analysis");
        assert_eq!(body["riskIndex"], 0);
    }

    #[actix_web::test]
    async fn analyze_and_archive() {
        let reports = (0..4)
            .map(|i| {
                report(
                    &format!("POL-{i}"),
                    ReportType::Police,
                    12.9716 + f64::from(i) * 0.0005,
                    77.5946,
                )
            })
            .collect();
        let app = app!(state(reports, None));

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(json!({ "dateRangeDays": 7, "archive": true }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["metadata"]["reportCount"], 4);
        assert_eq!(body["clustering"]["clusters"].as_array().unwrap().len(), 1);
        assert_eq!(body["insightSource"], "fallback");
        let archive_id = body["archiveId"].as_str().unwrap().to_string();
        assert!(archive_id.starts_with("ANALYSIS_"));

        let req = test::TestRequest::get().uri("/api/analyses").to_request();
        let archived: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0]["id"], archive_id);
    }

    #[actix_web::test]
    async fn nearest_facility_lookup() {
        let facilities = vec![
            Facility::new("far", "Far Hospital", 13.05, 77.59),
            Facility::new("near", "Near Clinic", 12.972, 77.595),
        ];
        let app = app!(state(vec![], Some(facilities)));

        let req = test::TestRequest::get()
            .uri("/api/facilities/nearest?lat=12.9716&lon=77.5946&severity=high")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["nearest"]["facility"]["id"], "near");
        assert_eq!(body["alternatives"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn nearest_facility_errors() {
        let app = app!(state(vec![], Some(vec![])));

        let req = test::TestRequest::get()
            .uri("/api/facilities/nearest?lat=12.97&lon=77.59&radiusKm=2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["hint"], "Increase the search radius");

        let req = test::TestRequest::get()
            .uri("/api/facilities/nearest?lat=120&lon=77.59")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let app = app!(state(vec![], None));
        let req = test::TestRequest::get()
            .uri("/api/facilities/nearest?lat=12.97&lon=77.59")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[::core::prelude::v1::test]
    fn provider_failures_map_to_not_found() {
        let errors = [
            FacilityError::NoFacilitiesFound { radius_km: 2.0 },
            FacilityError::Timeout { seconds: 10 },
            FacilityError::Unavailable {
                message: "HTTP 503".to_string(),
            },
            FacilityError::Parse {
                message: "unexpected token".to_string(),
            },
        ];
        for e in &errors {
            assert_eq!(facility_error(e).status(), StatusCode::NOT_FOUND, "{e}");
        }
        assert_eq!(
            facility_error(&FacilityError::InvalidLocation {
                latitude: 120.0,
                longitude: 77.59,
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
