//! Analysis pipeline orchestration.
//!
//! A run moves `idle -> clustering -> scoring -> (summarizing) -> done`.
//! Summarizing only happens when an insight generator is configured. It
//! makes three calls in order: an area analysis, clustering insights, and
//! the comprehensive report that embeds the first two. Each call has its
//! own timeout and local fallback, so one failing call never fails the
//! run or the calls after it. Any non-idle state may fall into `error`.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use incident_map_analytics::{
    AREA_FALLBACK_TEXT, EMPTY_INPUT_MESSAGE, InsightContext, ML_FALLBACK_TEXT, build_area_prompt,
    build_ml_prompt, build_prompt, fallback_summary, filter_by_date_range, geo_statistics,
    hotspots, score_risk, temporal_profile,
};
use incident_map_analytics_models::{
    AnalysisMetadata, AnalysisOptions, AnalysisResult, ClusteringResult, InsightSource,
    MedicalAssignment, RiskAssessment,
};
use incident_map_facility::FacilityFinder;
use incident_map_report_models::{Report, ReportType};
use incident_map_spatial::{ClusterEngine, LocatedReport, partition_located};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use crate::AiError;
use crate::config::AnalysisConfig;
use crate::providers::InsightGenerator;

/// Stage of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PipelineState {
    /// Not started
    Idle,
    /// Running DBSCAN
    Clustering,
    /// Computing risk, temporal, geographic figures and facility lookups
    Scoring,
    /// Waiting on the insight generator
    Summarizing,
    /// Result assembled
    Done,
    /// Aborted
    Error,
}

impl PipelineState {
    /// Whether a run may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Clustering)
                | (Self::Clustering, Self::Scoring)
                | (Self::Scoring, Self::Summarizing | Self::Done)
                | (Self::Summarizing, Self::Done)
                | (
                    Self::Clustering | Self::Scoring | Self::Summarizing,
                    Self::Error
                )
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Why a pipeline run stopped without a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// No reports left to analyse.
    #[error("No reports available for analysis")]
    EmptyInput,

    /// A stage was entered out of order.
    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition {
        /// State the run was in.
        from: PipelineState,
        /// State it tried to enter.
        to: PipelineState,
    },
}

/// The result of a pipeline run, always carrying the states it visited.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// Every state entered, starting with [`PipelineState::Idle`].
    pub states: Vec<PipelineState>,

    /// The analysis, or the error that stopped the run.
    pub result: Result<AnalysisResult, PipelineError>,
}

/// State history of a single run.
#[derive(Debug)]
struct Transitions {
    states: Vec<PipelineState>,
}

impl Transitions {
    fn new() -> Self {
        Self {
            states: vec![PipelineState::Idle],
        }
    }

    fn current(&self) -> PipelineState {
        self.states
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    fn advance(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        log::debug!("Analysis pipeline: {current} -> {next}");
        self.states.push(next);
        Ok(())
    }

    fn fail(&mut self, error: &PipelineError) {
        let current = self.current();
        if current.can_transition_to(PipelineState::Error) {
            log::debug!("Analysis pipeline: {current} -> error ({error})");
            self.states.push(PipelineState::Error);
        }
    }
}

/// Turns a report snapshot into an [`AnalysisResult`].
///
/// Holds no mutable state: concurrent runs over different inputs are
/// independent.
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    engine: ClusterEngine,
    generator: Option<Box<dyn InsightGenerator>>,
    facilities: Option<Arc<FacilityFinder>>,
}

impl AnalysisPipeline {
    /// Creates a pipeline with no insight generator and no facility
    /// finder.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self {
            engine: ClusterEngine::new(config.dbscan, config.severity_weights),
            config,
            generator: None,
            facilities: None,
        }
    }

    /// Adds a text-insight generator; runs will enter `summarizing`.
    #[must_use]
    pub fn with_generator(mut self, generator: Box<dyn InsightGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Adds a facility finder for medical report assignment. Lookups only
    /// happen when `facilities.resolve_medical` is enabled.
    #[must_use]
    pub fn with_facility_finder(mut self, finder: Arc<FacilityFinder>) -> Self {
        self.facilities = Some(finder);
        self
    }

    /// The configuration this pipeline was built with.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Name of the configured insight generator, if any.
    #[must_use]
    pub fn generator_name(&self) -> Option<&str> {
        self.generator.as_deref().map(InsightGenerator::name)
    }

    /// Analyses `reports`, never failing.
    ///
    /// An empty input (or one emptied by the date range) produces an
    /// empty result whose insight text is [`EMPTY_INPUT_MESSAGE`].
    pub async fn analyze_reports(
        &self,
        reports: &[Report],
        options: AnalysisOptions,
    ) -> AnalysisResult {
        match self.run(reports, options).await.result {
            Ok(result) => result,
            Err(PipelineError::EmptyInput) => {
                log::info!("{EMPTY_INPUT_MESSAGE}");
                self.empty_result(options, EMPTY_INPUT_MESSAGE.to_string())
            }
            Err(e) => {
                log::error!("Analysis pipeline failed: {e}");
                self.empty_result(options, e.to_string())
            }
        }
    }

    /// Runs the state machine, reporting the states visited.
    pub async fn run(&self, reports: &[Report], options: AnalysisOptions) -> AnalysisOutcome {
        let mut transitions = Transitions::new();
        let result = self.execute(&mut transitions, reports, options).await;

        if let Err(e) = &result {
            transitions.fail(e);
        }

        AnalysisOutcome {
            states: transitions.states,
            result,
        }
    }

    async fn execute(
        &self,
        transitions: &mut Transitions,
        reports: &[Report],
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, PipelineError> {
        let now = options.reference_time.unwrap_or_else(Utc::now);
        let reports = filter_by_date_range(reports, options.date_range_days, now);
        if reports.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        transitions.advance(PipelineState::Clustering)?;
        let (located, dropped) = partition_located(&reports);
        let clustering = self.engine.cluster_located(&located);
        log::info!(
            "Clustered {} reports ({} excluded): {} clusters, {} noise",
            located.len(),
            dropped.len(),
            clustering.clusters.len(),
            clustering.noise.len()
        );

        transitions.advance(PipelineState::Scoring)?;
        let risk = score_risk(&reports, &clustering, &self.config.risk);
        let temporal = temporal_profile(&reports, self.config.utc_offset_minutes);
        let hotspots = hotspots(&clustering);
        let geo = geo_statistics(&located);
        let medical_assignments = self.assign_medical(&located).await;

        let metadata = AnalysisMetadata {
            report_count: reports.len() as u64,
            located_count: located.len() as u64,
            date_range_days: options.date_range_days,
            provider: self.generator_name().map(ToString::to_string),
        };
        let generated_at = Utc::now();

        let ctx = InsightContext {
            metadata: &metadata,
            clustering: &clustering,
            risk: &risk,
            temporal: &temporal,
            hotspots: &hotspots,
            geo: geo.as_ref(),
            generated_at,
            location_analysis: None,
            ml_insights: None,
        };

        let (location_analysis, ml_insights, insight_text, insight_source) =
            match self.generator.as_deref() {
                Some(generator) => {
                    transitions.advance(PipelineState::Summarizing)?;
                    let settings = self.config.insight;

                    let location_analysis = self
                        .generate(
                            generator,
                            "area analysis",
                            &build_area_prompt(&ctx),
                            settings.area_max_tokens,
                        )
                        .await
                        .unwrap_or_else(|| AREA_FALLBACK_TEXT.to_string());
                    let ml_insights = self
                        .generate(
                            generator,
                            "clustering insights",
                            &build_ml_prompt(&ctx),
                            settings.ml_max_tokens,
                        )
                        .await
                        .unwrap_or_else(|| ML_FALLBACK_TEXT.to_string());

                    let staged = InsightContext {
                        location_analysis: Some(&location_analysis),
                        ml_insights: Some(&ml_insights),
                        ..ctx
                    };
                    let (text, source) = match self
                        .generate(generator, "report", &build_prompt(&staged), settings.max_tokens)
                        .await
                    {
                        Some(text) => (text, InsightSource::Generated),
                        None => (fallback_summary(&staged), InsightSource::Fallback),
                    };

                    (location_analysis, ml_insights, text, source)
                }
                None => (
                    AREA_FALLBACK_TEXT.to_string(),
                    ML_FALLBACK_TEXT.to_string(),
                    fallback_summary(&ctx),
                    InsightSource::Fallback,
                ),
            };

        transitions.advance(PipelineState::Done)?;

        Ok(AnalysisResult {
            risk_index: risk.overall,
            clustering,
            risk,
            temporal_profile: temporal,
            hotspots,
            geo_statistics: geo,
            location_analysis: Some(location_analysis),
            ml_insights: Some(ml_insights),
            insight_text: Some(insight_text),
            insight_source,
            medical_assignments,
            metadata,
            generated_at,
        })
    }

    /// Runs one generator call under the configured timeout. `None` on
    /// failure, timeout or empty output; the caller picks the fallback.
    async fn generate(
        &self,
        generator: &dyn InsightGenerator,
        stage: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Option<String> {
        let settings = self.config.insight;

        let outcome = tokio::time::timeout(
            settings.timeout(),
            generator.summarize(prompt, max_tokens),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AiError::Timeout {
                seconds: settings.timeout_secs,
            })
        });

        match outcome {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                log::warn!(
                    "Insight generator '{}' returned no {stage} text, using fallback",
                    generator.name()
                );
                None
            }
            Err(e) => {
                log::warn!(
                    "Insight generator '{}' failed on {stage}, using fallback: {e}",
                    generator.name()
                );
                None
            }
        }
    }

    /// Resolves the nearest facility for every located medical report,
    /// concurrently. A failed lookup yields an assignment with no facility.
    async fn assign_medical(&self, located: &[LocatedReport<'_>]) -> Vec<MedicalAssignment> {
        let settings = self.config.facilities;
        let Some(finder) = self.facilities.as_deref().filter(|_| settings.resolve_medical) else {
            return vec![];
        };

        let lookups = located
            .iter()
            .filter(|l| l.report.report_type == ReportType::Medical)
            .map(|l| async move {
                let nearest = match finder
                    .nearest(l.latitude, l.longitude, settings.radius_km)
                    .await
                {
                    Ok(m) => Some(m),
                    Err(e) => {
                        log::warn!("No facility for medical report {}: {e}", l.report.id);
                        None
                    }
                };
                MedicalAssignment {
                    report_id: l.report.id.clone(),
                    nearest,
                }
            });

        join_all(lookups).await
    }

    fn empty_result(&self, options: AnalysisOptions, message: String) -> AnalysisResult {
        AnalysisResult {
            clustering: ClusteringResult::default(),
            risk_index: 0,
            risk: RiskAssessment::unknown(),
            temporal_profile: temporal_profile(&[], self.config.utc_offset_minutes),
            hotspots: vec![],
            geo_statistics: None,
            location_analysis: None,
            ml_insights: None,
            insight_text: Some(message),
            insight_source: InsightSource::Fallback,
            medical_assignments: vec![],
            metadata: AnalysisMetadata {
                report_count: 0,
                located_count: 0,
                date_range_days: options.date_range_days,
                provider: self.generator_name().map(ToString::to_string),
            },
            generated_at: Utc::now(),
        }
    }
}
