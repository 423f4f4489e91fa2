//! Report store backed by one JSON file per report type.
//!
//! Files are named `reports_<type>.json` inside the data directory and
//! hold a JSON array of reports. Writes go to a temporary file first and
//! are renamed into place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use incident_map_report_models::{Report, ReportStatus, ReportType};
use tokio::sync::Mutex;

use crate::{ReportStore, StoreError, insert_unique, remove, set_status};

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// JSON-file report store.
#[derive(Debug)]
pub struct JsonFileReportStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileReportStore {
    /// Opens (or creates) a store in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        log::info!("Report store at {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding one report type.
    #[must_use]
    pub fn bucket_path(&self, report_type: ReportType) -> PathBuf {
        self.dir.join(format!("reports_{report_type}.json"))
    }

    async fn read_bucket(&self, report_type: ReportType) -> Result<Vec<Report>, StoreError> {
        let path = self.bucket_path(report_type);
        match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(vec![]),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_bucket(
        &self,
        report_type: ReportType,
        reports: &[Report],
    ) -> Result<(), StoreError> {
        let path = self.bucket_path(report_type);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(reports)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::debug!("Wrote {} reports to {}", reports.len(), path.display());
        Ok(())
    }

    async fn read_all(&self) -> Result<BTreeMap<ReportType, Vec<Report>>, StoreError> {
        let mut buckets = BTreeMap::new();
        for &report_type in ReportType::all() {
            buckets.insert(report_type, self.read_bucket(report_type).await?);
        }
        Ok(buckets)
    }
}

#[async_trait]
impl ReportStore for JsonFileReportStore {
    async fn save(&self, report: Report) -> Result<Report, StoreError> {
        let _guard = self.write_lock.lock().await;
        let report_type = report.report_type;
        let mut buckets = self.read_all().await?;
        let saved = insert_unique(&mut buckets, report)?;
        let bucket = buckets.get(&report_type).map(Vec::as_slice).unwrap_or_default();
        self.write_bucket(report_type, bucket).await?;
        Ok(saved)
    }

    async fn get_all(&self, report_type: ReportType) -> Result<Vec<Report>, StoreError> {
        self.read_bucket(report_type).await
    }

    async fn update_status(
        &self,
        report_type: ReportType,
        id: &str,
        status: ReportStatus,
    ) -> Result<Report, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut bucket = self.read_bucket(report_type).await?;
        let updated = set_status(&mut bucket, id, status)?;
        self.write_bucket(report_type, &bucket).await?;
        Ok(updated)
    }

    async fn delete(&self, report_type: ReportType, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut bucket = self.read_bucket(report_type).await?;
        remove(&mut bucket, id)?;
        self.write_bucket(report_type, &bucket).await
    }
}
