//! Archive of generated analysis results.
//!
//! Keeps the newest [`MAX_ARCHIVED`] results, optionally mirrored to a
//! JSON file so they survive restarts.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use incident_map_analytics_models::AnalysisResult;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::StoreError;

/// How many results the archive retains.
pub const MAX_ARCHIVED: usize = 50;

/// File name used inside a data directory.
pub const ARCHIVE_FILE_NAME: &str = "generated_reports.json";

/// A stored analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedAnalysis {
    /// `ANALYSIS_<uuid>`.
    pub id: String,
    /// When the result was archived.
    pub archived_at: DateTime<Utc>,
    /// The analysis.
    pub result: AnalysisResult,
}

/// Newest-first, bounded list of analysis results.
#[derive(Debug, Default)]
pub struct GeneratedReportArchive {
    path: Option<PathBuf>,
    entries: RwLock<Vec<ArchivedAnalysis>>,
}

impl GeneratedReportArchive {
    /// An archive that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens an archive mirrored to `path`, loading existing entries.
    ///
    /// # Errors
    ///
    /// * If the file exists but cannot be read
    /// * If the file is not a valid archive
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries: Vec<ArchivedAnalysis> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => vec![],
            Err(e) => return Err(e.into()),
        };
        log::debug!(
            "Loaded {} archived analyses from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
        })
    }

    /// Archives `result` under a fresh `ANALYSIS_<uuid>` id, evicting the
    /// oldest entries beyond [`MAX_ARCHIVED`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing file cannot be written, in
    /// which case the archive is left unchanged.
    pub async fn archive(&self, result: AnalysisResult) -> Result<ArchivedAnalysis, StoreError> {
        let entry = ArchivedAnalysis {
            id: format!("ANALYSIS_{}", uuid::Uuid::new_v4()),
            archived_at: Utc::now(),
            result,
        };

        let mut entries = self.entries.write().await;
        let mut updated = Vec::with_capacity(MAX_ARCHIVED);
        updated.push(entry.clone());
        updated.extend(entries.iter().take(MAX_ARCHIVED - 1).cloned());

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, serde_json::to_vec_pretty(&updated)?).await?;
            tokio::fs::rename(&tmp, path).await?;
        }

        *entries = updated;
        log::info!("Archived analysis {}", entry.id);
        Ok(entry)
    }

    /// All archived results, newest first.
    pub async fn list(&self) -> Vec<ArchivedAnalysis> {
        self.entries.read().await.clone()
    }

    /// One archived result by id.
    pub async fn get(&self, id: &str) -> Option<ArchivedAnalysis> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Number of archived results.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is archived.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use incident_map_analytics_models::{
        AnalysisMetadata, ClusteringResult, InsightSource, RiskAssessment, TemporalDistributions,
        TemporalProfile,
    };

    use super::*;

    fn result(report_count: u64) -> AnalysisResult {
        AnalysisResult {
            clustering: ClusteringResult::default(),
            risk_index: 0,
            risk: RiskAssessment::unknown(),
            temporal_profile: TemporalProfile {
                peak_hour: 0,
                peak_weekday: 0,
                peak_weekday_name: "Sunday".to_string(),
                peak_month: 0,
                peak_month_name: "Jan".to_string(),
                distributions: TemporalDistributions {
                    hourly: vec![0; 24],
                    weekly: vec![0; 7],
                    monthly: vec![0; 12],
                },
            },
            hotspots: vec![],
            geo_statistics: None,
            location_analysis: None,
            ml_insights: None,
            insight_text: None,
            insight_source: InsightSource::Fallback,
            medical_assignments: vec![],
            metadata: AnalysisMetadata {
                report_count,
                located_count: 0,
                date_range_days: None,
                provider: None,
            },
            generated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn keeps_newest_fifty() {
        let archive = GeneratedReportArchive::in_memory();
        for i in 0..55 {
            archive.archive(result(i)).await.unwrap();
        }

        let entries = archive.list().await;
        assert_eq!(entries.len(), MAX_ARCHIVED);
        assert_eq!(entries[0].result.metadata.report_count, 54);
        assert_eq!(entries[49].result.metadata.report_count, 5);
    }

    #[tokio::test]
    async fn ids_are_prefixed_and_retrievable() {
        let archive = GeneratedReportArchive::in_memory();
        let entry = archive.archive(result(3)).await.unwrap();
        assert!(entry.id.starts_with("ANALYSIS_"));
        assert_eq!(archive.get(&entry.id).await, Some(entry));
        assert!(archive.get("ANALYSIS_missing").await.is_none());
    }

    #[tokio::test]
    async fn file_backed_archive_reloads() {
        let path = std::env::temp_dir()
            .join(format!("incident_map_archive_{}", uuid::Uuid::new_v4()))
            .join(ARCHIVE_FILE_NAME);

        let archive = GeneratedReportArchive::open(&path).await.unwrap();
        assert!(archive.is_empty().await);
        let entry = archive.archive(result(7)).await.unwrap();

        let reopened = GeneratedReportArchive::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 1);
        assert_eq!(reopened.list().await[0].id, entry.id);

        if let Some(dir) = path.parent() {
            tokio::fs::remove_dir_all(dir).await.unwrap();
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_archive_unchanged() {
        let dir =
            std::env::temp_dir().join(format!("incident_map_archive_{}", uuid::Uuid::new_v4()));
        let archive = GeneratedReportArchive::open(dir.join(ARCHIVE_FILE_NAME))
            .await
            .unwrap();

        // A plain file where the data directory should be.
        tokio::fs::write(&dir, b"").await.unwrap();

        assert!(archive.archive(result(1)).await.is_err());
        assert!(archive.is_empty().await);

        tokio::fs::remove_file(&dir).await.unwrap();
    }
}
