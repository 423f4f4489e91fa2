#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use incident_map_analytics_models::AnalysisResult;
use incident_map_report_models::{
    Location, Report, ReportSeverity, ReportStatus, ReportType,
};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Configured insight generator, if any.
    pub insight_provider: Option<String>,
    /// Whether nearest-facility lookups are available.
    pub facilities_enabled: bool,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
    /// What the caller can do about it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiError {
    /// An error without a hint.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            hint: None,
        }
    }

    /// Attaches a hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Query parameters for `GET /api/reports`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportsQueryParams {
    /// Only reports of this type; all types when absent.
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
}

/// Body of `POST /api/reports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    /// Client-minted id; one is minted server-side when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Incident kind.
    #[serde(rename = "type")]
    pub report_type: ReportType,
    /// Capture location.
    pub location: Location,
    /// Initial status; pending when absent.
    #[serde(default)]
    pub status: Option<ReportStatus>,
    /// Reporter-assessed severity.
    #[serde(default)]
    pub severity: Option<ReportSeverity>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Capture time; the receive time when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CreateReportRequest {
    /// Builds the report to persist. `now` fills a missing capture time
    /// and `suffix` disambiguates a server-minted id.
    #[must_use]
    pub fn into_report(self, now: DateTime<Utc>, suffix: u16) -> Report {
        let created_at = self.created_at.unwrap_or(now);
        Report {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Report::mint_id(self.report_type, created_at, suffix)),
            report_type: self.report_type,
            location: self.location,
            status: self.status.unwrap_or_default(),
            severity: self.severity,
            description: self.description,
            created_at,
        }
    }
}

/// Body of `PUT /api/reports/{type}/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status.
    pub status: ReportStatus,
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Only analyse reports created within this many days.
    pub date_range_days: Option<u32>,
    /// Only analyse reports of this type.
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    /// Store the result in the generated-analysis archive.
    pub archive: bool,
}

/// Response of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAnalysis {
    /// Archive id, when the result was archived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_id: Option<String>,
    /// The analysis.
    #[serde(flatten)]
    pub result: AnalysisResult,
}

/// Query parameters for `GET /api/facilities/nearest`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestQueryParams {
    /// Query latitude.
    pub lat: f64,
    /// Query longitude.
    pub lon: f64,
    /// Search radius in kilometres.
    pub radius_km: Option<f64>,
    /// Severity of the incident the search is for.
    pub severity: Option<ReportSeverity>,
}
