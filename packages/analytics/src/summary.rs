//! Insight prompts and template-based fallback texts.
//!
//! Insight text is generated in three stages: a short area analysis, a
//! short read of the clustering and risk figures, and the comprehensive
//! report that embeds both. Each prompt is what an external text
//! generator receives for its stage. Each stage has a local fallback used
//! whenever no generator is configured, or the generator fails, times
//! out, or returns nothing.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use incident_map_analytics_models::{
    AnalysisMetadata, ClusteringResult, GeoStatistics, Hotspot, RiskAssessment, TemporalProfile,
};
use incident_map_report_models::ReportType;

/// Summary text for an analysis run over zero reports.
pub const EMPTY_INPUT_MESSAGE: &str = "No reports available for analysis";

/// Area analysis used when the area stage produced nothing.
pub const AREA_FALLBACK_TEXT: &str =
    "Geographic analysis shows distributed incident patterns across the monitored area.";

/// Clustering insights used when the insights stage produced nothing.
pub const ML_FALLBACK_TEXT: &str = "ML analysis reveals patterns in incident distribution and \
     timing. Recommend increased monitoring during peak hours.";

/// Everything the prompts and fallback summary are built from.
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    /// Run metadata.
    pub metadata: &'a AnalysisMetadata,
    /// Clusters and noise.
    pub clustering: &'a ClusteringResult,
    /// Risk breakdown.
    pub risk: &'a RiskAssessment,
    /// Peak-activity windows.
    pub temporal: &'a TemporalProfile,
    /// Ranked hotspots.
    pub hotspots: &'a [Hotspot],
    /// Positional summary, if any report had a usable location.
    pub geo: Option<&'a GeoStatistics>,
    /// When the analysis ran.
    pub generated_at: DateTime<Utc>,
    /// Output of the area stage, once it has run.
    pub location_analysis: Option<&'a str>,
    /// Output of the clustering insights stage, once it has run.
    pub ml_insights: Option<&'a str>,
}

/// Describes the date-range filter, e.g. `"last 30 days"` or `"all"`.
#[must_use]
pub fn describe_date_range(days: Option<u32>) -> String {
    match days {
        Some(1) => "last 1 day".to_string(),
        Some(days) => format!("last {days} days"),
        None => "all".to_string(),
    }
}

/// `"police: 3, medical: 1"` style type counts, in type order.
#[must_use]
pub fn type_counts_line(by_type: &BTreeMap<ReportType, u64>) -> String {
    if by_type.is_empty() {
        return "none".to_string();
    }
    by_type
        .iter()
        .map(|(t, n)| format!("{t}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the area-analysis prompt.
#[must_use]
pub fn build_area_prompt(ctx: &InsightContext<'_>) -> String {
    AreaPrompt(ctx).to_string()
}

/// Builds the clustering insights prompt.
#[must_use]
pub fn build_ml_prompt(ctx: &InsightContext<'_>) -> String {
    MlPrompt(ctx).to_string()
}

/// Builds the comprehensive report prompt, embedding whichever stage
/// outputs the context carries.
#[must_use]
pub fn build_prompt(ctx: &InsightContext<'_>) -> String {
    ComprehensivePrompt(ctx).to_string()
}

/// Deterministic summary synthesised from the analysis figures.
#[must_use]
pub fn fallback_summary(ctx: &InsightContext<'_>) -> String {
    if ctx.metadata.report_count == 0 {
        return EMPTY_INPUT_MESSAGE.to_string();
    }
    FallbackSummary(ctx).to_string()
}

struct AreaPrompt<'a>(&'a InsightContext<'a>);

impl fmt::Display for AreaPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.0;
        writeln!(
            f,
            "Analyze this geographic area with {} incidents:",
            ctx.metadata.report_count
        )?;
        match ctx.geo {
            Some(geo) => {
                writeln!(
                    f,
                    "Center: {:.4}, {:.4}",
                    geo.center.latitude, geo.center.longitude
                )?;
                writeln!(f, "Radius: {:.2} km", geo.radius_km)?;
            }
            None => writeln!(f, "Center: unknown")?,
        }
        writeln!(f, "Hotspots: {}", ctx.hotspots.len())?;
        writeln!(f, "Types: {}\n", type_counts_line(&ctx.risk.by_type))?;
        f.write_str(
            "Provide 2-3 sentences about patterns, concerns, and recommendations for this area.",
        )
    }
}

struct MlPrompt<'a>(&'a InsightContext<'a>);

impl fmt::Display for MlPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.0;
        writeln!(f, "Based on ML analysis:")?;
        writeln!(
            f,
            "- {} incident clusters detected",
            ctx.clustering.clusters.len()
        )?;
        writeln!(
            f,
            "- Peak activity: {}:00 on {}",
            ctx.temporal.peak_hour, ctx.temporal.peak_weekday_name
        )?;
        writeln!(
            f,
            "- Risk level: {} ({}/100)\n",
            ctx.risk.risk_level, ctx.risk.overall
        )?;
        f.write_str("Provide 2-3 key insights and recommendations.")
    }
}

struct ComprehensivePrompt<'a>(&'a InsightContext<'a>);

impl fmt::Display for ComprehensivePrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.0;
        writeln!(f, "Generate a comprehensive incident analysis report:\n")?;

        writeln!(f, "METADATA:")?;
        writeln!(f, "- Total Reports: {}", ctx.metadata.report_count)?;
        writeln!(f, "- Reports With Location: {}", ctx.metadata.located_count)?;
        writeln!(
            f,
            "- Date Range: {}",
            describe_date_range(ctx.metadata.date_range_days)
        )?;
        writeln!(
            f,
            "- Generated: {}\n",
            ctx.generated_at.format("%Y-%m-%d %H:%M UTC")
        )?;

        writeln!(f, "LOCATION ANALYSIS:")?;
        if let Some(text) = ctx.location_analysis {
            writeln!(f, "{text}")?;
        }
        match ctx.geo {
            Some(geo) => {
                writeln!(
                    f,
                    "- Center: {:.4}, {:.4}",
                    geo.center.latitude, geo.center.longitude
                )?;
                writeln!(f, "- Radius: {:.2} km", geo.radius_km)?;
            }
            None => writeln!(f, "- No location data")?,
        }
        writeln!(f, "- Hotspots: {}", ctx.hotspots.len())?;
        if let Some(top) = ctx.hotspots.first() {
            writeln!(
                f,
                "- Largest Hotspot: {} reports around {:.4}, {:.4} ({} size)",
                top.report_count, top.center.latitude, top.center.longitude, top.size
            )?;
        }
        writeln!(f, "- Types: {}\n", type_counts_line(&ctx.risk.by_type))?;

        writeln!(f, "ML ANALYSIS:")?;
        if let Some(text) = ctx.ml_insights {
            writeln!(f, "{text}")?;
        }
        writeln!(
            f,
            "- {} incident clusters detected, {} isolated reports",
            ctx.clustering.clusters.len(),
            ctx.clustering.noise.len()
        )?;
        writeln!(
            f,
            "- Peak activity: {}:00 on {}, busiest month {}",
            ctx.temporal.peak_hour, ctx.temporal.peak_weekday_name, ctx.temporal.peak_month_name
        )?;
        writeln!(
            f,
            "- Risk Level: {} ({}/100)\n",
            ctx.risk.risk_level, ctx.risk.overall
        )?;

        f.write_str(
            "Provide:\n\
             1. Executive Summary (2-3 sentences)\n\
             2. Key Findings (3-5 bullet points)\n\
             3. Actionable Recommendations (3-5 bullet points)\n\
             4. Conclusion (1-2 sentences)",
        )
    }
}

struct FallbackSummary<'a>(&'a InsightContext<'a>);

impl fmt::Display for FallbackSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.0;
        write!(
            f,
            "Analyzed {} reports ({} with a verified location; types: {}). ",
            ctx.metadata.report_count,
            ctx.metadata.located_count,
            type_counts_line(&ctx.risk.by_type)
        )?;

        let clusters = ctx.clustering.clusters.len();
        write!(
            f,
            "Detected {clusters} incident cluster{} and {} isolated report{}. ",
            plural(clusters),
            ctx.clustering.noise.len(),
            plural(ctx.clustering.noise.len())
        )?;

        if let Some(top) = ctx.hotspots.first() {
            write!(
                f,
                "The largest hotspot holds {} reports around ({:.4}, {:.4}). ",
                top.report_count, top.center.latitude, top.center.longitude
            )?;
        }

        write!(
            f,
            "Activity peaks at {:02}:00 on {}s and in {}. ",
            ctx.temporal.peak_hour, ctx.temporal.peak_weekday_name, ctx.temporal.peak_month_name
        )?;
        write!(
            f,
            "Overall risk is {} ({}/100).",
            ctx.risk.risk_level, ctx.risk.overall
        )
    }
}

const fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
