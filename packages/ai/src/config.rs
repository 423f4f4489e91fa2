//! Analysis configuration.
//!
//! One explicit table replaces process-wide settings: clustering
//! parameters, weight tables, insight limits and facility resolution are
//! all read from here and passed into [`crate::AnalysisPipeline::new`].

use std::path::Path;
use std::time::Duration;

use incident_map_analytics_models::{DbscanParams, RiskWeights, SeverityWeights};
use incident_map_facility::FacilityFinder;
use incident_map_facility_models::NearestStrategy;
use serde::{Deserialize, Serialize};

use crate::AiError;

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Limits for the text-insight call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    /// Token cap for the comprehensive report.
    pub max_tokens: u32,
    /// Token cap for the area analysis.
    pub area_max_tokens: u32,
    /// Token cap for the clustering insights.
    pub ml_max_tokens: u32,
    /// Seconds each stage waits before falling back to its local text.
    pub timeout_secs: u64,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            area_max_tokens: 250,
            ml_max_tokens: 200,
            timeout_secs: 10,
        }
    }
}

impl InsightSettings {
    /// The timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Nearest-facility resolution for medical reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilitySettings {
    /// Resolve a facility for every located medical report.
    pub resolve_medical: bool,
    /// Search radius in kilometres.
    pub radius_km: f64,
    /// Alternatives returned by facility searches.
    pub alternatives: usize,
    /// Nearest-facility resolver.
    pub strategy: NearestStrategy,
}

impl Default for FacilitySettings {
    fn default() -> Self {
        Self {
            resolve_medical: false,
            radius_km: 10.0,
            alternatives: 5,
            strategy: NearestStrategy::Sorted,
        }
    }
}

impl FacilitySettings {
    /// Applies the alternative count and strategy to `finder`.
    #[must_use]
    pub const fn configure(&self, finder: FacilityFinder) -> FacilityFinder {
        finder
            .with_alternatives(self.alternatives)
            .with_strategy(self.strategy)
    }
}

/// Everything tunable about an analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Clustering parameters.
    pub dbscan: DbscanParams,
    /// Cluster severity weight table.
    pub severity_weights: SeverityWeights,
    /// Risk index coefficients and thresholds.
    pub risk: RiskWeights,
    /// Insight generation limits.
    pub insight: InsightSettings,
    /// Facility resolution.
    pub facilities: FacilitySettings,
    /// Timezone for temporal bucketing, in minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl AnalysisConfig {
    /// The embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `config/default.toml` is malformed (this is
    /// a compile-time guarantee since the file is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded config/default.toml: {e}"))
    }

    /// Parses a configuration from TOML. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if the TOML is malformed or a value has
    /// the wrong type.
    pub fn from_toml_str(s: &str) -> Result<Self, AiError> {
        toml::de::from_str(s).map_err(|e| AiError::Config {
            message: format!("Invalid analysis config: {e}"),
        })
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, AiError> {
        let contents = std::fs::read_to_string(path).map_err(|e| AiError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        log::info!("Loaded analysis config from {}", path.display());
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_matches_defaults() {
        assert_eq!(AnalysisConfig::embedded(), AnalysisConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            utc_offset_minutes = 330

            [dbscan]
            epsilon_km = 1.5

            [facilities]
            resolve_medical = true
            strategy = "mst"
            "#,
        )
        .unwrap();

        assert!((config.dbscan.epsilon_km - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.dbscan.min_points, 3);
        assert!(config.facilities.resolve_medical);
        assert_eq!(config.facilities.strategy, NearestStrategy::Mst);
        assert_eq!(config.facilities.alternatives, 5);
        assert_eq!(config.insight, InsightSettings::default());
        assert_eq!(config.utc_offset_minutes, 330);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(
            AnalysisConfig::from_toml_str("").unwrap(),
            AnalysisConfig::default()
        );
    }

    #[test]
    fn bad_value_is_config_error() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("[dbscan]\nmin_points = \"three\""),
            Err(AiError::Config { .. })
        ));
    }

    #[test]
    fn missing_file_is_config_error() {
        assert!(matches!(
            AnalysisConfig::load(Path::new("/nonexistent/analysis.toml")),
            Err(AiError::Config { .. })
        ));
    }
}
