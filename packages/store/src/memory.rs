//! In-memory report store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use incident_map_report_models::{Report, ReportStatus, ReportType};
use tokio::sync::RwLock;

use crate::{ReportStore, StoreError, insert_unique, remove, set_status};

/// Reports held in process memory. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    buckets: RwLock<BTreeMap<ReportType, Vec<Report>>>,
}

impl MemoryReportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `reports`, skipping duplicate ids.
    #[must_use]
    pub fn with_reports(reports: impl IntoIterator<Item = Report>) -> Self {
        let mut buckets = BTreeMap::new();
        for report in reports {
            if let Err(e) = insert_unique(&mut buckets, report) {
                log::warn!("Skipping seed report: {e}");
            }
        }
        Self {
            buckets: RwLock::new(buckets),
        }
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn save(&self, report: Report) -> Result<Report, StoreError> {
        insert_unique(&mut *self.buckets.write().await, report)
    }

    async fn get_all(&self, report_type: ReportType) -> Result<Vec<Report>, StoreError> {
        Ok(self
            .buckets
            .read()
            .await
            .get(&report_type)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_status(
        &self,
        report_type: ReportType,
        id: &str,
        status: ReportStatus,
    ) -> Result<Report, StoreError> {
        let mut buckets = self.buckets.write().await;
        set_status(buckets.entry(report_type).or_default(), id, status)
    }

    async fn delete(&self, report_type: ReportType, id: &str) -> Result<(), StoreError> {
        let mut buckets = self.buckets.write().await;
        remove(buckets.entry(report_type).or_default(), id)
    }
}
