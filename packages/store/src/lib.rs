#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report persistence.
//!
//! Reports are kept in one bucket per [`ReportType`], either in memory
//! ([`MemoryReportStore`]) or as `reports_<type>.json` files in a data
//! directory ([`JsonFileReportStore`]). Analysis results can be archived
//! with [`GeneratedReportArchive`].

pub mod archive;
pub mod json_file;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use incident_map_report_models::{Report, ReportStatus, ReportType};
use serde::Serialize;
use thiserror::Error;

pub use archive::{ArchivedAnalysis, GeneratedReportArchive};
pub use json_file::JsonFileReportStore;
pub use memory::MemoryReportStore;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from report storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A report with this id already exists.
    #[error("Report {id} already exists")]
    DuplicateId {
        /// The conflicting id.
        id: String,
    },

    /// No report with this id exists.
    #[error("Report {id} not found")]
    NotFound {
        /// The requested id.
        id: String,
    },
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Report counts by type and status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatistics {
    /// Reports across all types.
    pub total: u64,
    /// Count per type.
    pub by_type: BTreeMap<ReportType, u64>,
    /// Count per status.
    pub by_status: BTreeMap<ReportStatus, u64>,
}

impl ReportStatistics {
    /// Tallies `reports`.
    #[must_use]
    pub fn from_reports(reports: &[Report]) -> Self {
        let mut stats = Self::default();
        for report in reports {
            stats.total += 1;
            *stats.by_type.entry(report.report_type).or_insert(0) += 1;
            *stats.by_status.entry(report.status).or_insert(0) += 1;
        }
        stats
    }
}

/// Read/write access to persisted reports, keyed by type.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persists a new report and returns it.
    ///
    /// # Errors
    ///
    /// * [`StoreError::DuplicateId`] if a report with the same id exists
    /// * If the backend fails
    async fn save(&self, report: Report) -> Result<Report, StoreError>;

    /// All reports of one type, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn get_all(&self, report_type: ReportType) -> Result<Vec<Report>, StoreError>;

    /// Replaces the status of a report, returning the updated report.
    ///
    /// # Errors
    ///
    /// * [`StoreError::NotFound`] if no such report exists
    /// * If the backend fails
    async fn update_status(
        &self,
        report_type: ReportType,
        id: &str,
        status: ReportStatus,
    ) -> Result<Report, StoreError>;

    /// Removes a report.
    ///
    /// # Errors
    ///
    /// * [`StoreError::NotFound`] if no such report exists
    /// * If the backend fails
    async fn delete(&self, report_type: ReportType, id: &str) -> Result<(), StoreError>;

    /// Looks up one report.
    ///
    /// # Errors
    ///
    /// * [`StoreError::NotFound`] if no such report exists
    /// * If the backend fails
    async fn get_by_id(&self, report_type: ReportType, id: &str) -> Result<Report, StoreError> {
        self.get_all(report_type)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Every report of every type.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn get_all_types(&self) -> Result<Vec<Report>, StoreError> {
        let mut all = Vec::new();
        for &report_type in ReportType::all() {
            all.extend(self.get_all(report_type).await?);
        }
        Ok(all)
    }

    /// Counts of every report by type and status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn statistics(&self) -> Result<ReportStatistics, StoreError> {
        Ok(ReportStatistics::from_reports(&self.get_all_types().await?))
    }
}

// ---------------------------------------------------------------------------
// Bucket helpers shared by the backends
// ---------------------------------------------------------------------------

/// Appends `report` unless its id is already present in any bucket.
fn insert_unique(
    buckets: &mut BTreeMap<ReportType, Vec<Report>>,
    report: Report,
) -> Result<Report, StoreError> {
    if buckets.values().flatten().any(|r| r.id == report.id) {
        return Err(StoreError::DuplicateId { id: report.id });
    }
    buckets
        .entry(report.report_type)
        .or_default()
        .push(report.clone());
    Ok(report)
}

fn set_status(bucket: &mut [Report], id: &str, status: ReportStatus) -> Result<Report, StoreError> {
    let report = bucket
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
    report.status = status;
    Ok(report.clone())
}

fn remove(bucket: &mut Vec<Report>, id: &str) -> Result<(), StoreError> {
    let index = bucket
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
    bucket.remove(index);
    Ok(())
}
