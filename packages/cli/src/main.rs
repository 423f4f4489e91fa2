#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tool for the incident map.
//!
//! ```text
//! incident_map reports [--type medical]
//! incident_map set-status medical MED-1700000000000-42 resolved
//! incident_map analyze [--days 30] [--type police] [--config analysis.toml] [--archive] [--json]
//! incident_map nearest --lat 12.9716 --lon 77.5946 [--radius 10] [--severity high]
//! ```
//!
//! Reports are read from the JSON-file store under `--data-dir` (default
//! `data`, shared with the API server). Insight generation is configured
//! through `AI_PROVIDER` and the provider API key variables.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use incident_map_ai::{AnalysisConfig, AnalysisPipeline, create_generator_from_env};
use incident_map_analytics_models::{AnalysisOptions, AnalysisResult};
use incident_map_facility::FacilityFinder;
use incident_map_report_models::{ReportSeverity, ReportStatus, ReportType};
use incident_map_store::archive::ARCHIVE_FILE_NAME;
use incident_map_store::json_file::DEFAULT_DATA_DIR;
use incident_map_store::{GeneratedReportArchive, JsonFileReportStore, ReportStore};

#[derive(Parser)]
#[command(
    name = "incident_map",
    about = "Analyse citizen incident reports and find nearby emergency facilities"
)]
struct Cli {
    /// Directory holding the report store
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored reports
    Reports {
        /// Only reports of this type (police, medical, infrastructure)
        #[arg(long = "type")]
        report_type: Option<ReportType>,
    },
    /// Change the status of a stored report
    SetStatus {
        /// Report type
        report_type: ReportType,
        /// Report ID
        id: String,
        /// New status (pending, in-progress, resolved)
        status: ReportStatus,
    },
    /// Cluster, score and summarise the stored reports
    Analyze {
        /// Only reports created within this many days
        #[arg(long)]
        days: Option<u32>,
        /// Only reports of this type
        #[arg(long = "type")]
        report_type: Option<ReportType>,
        /// Analysis configuration TOML (built-in defaults otherwise)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Keep the result in the generated-analysis archive
        #[arg(long)]
        archive: bool,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the nearest emergency facility to a point
    Nearest {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Search radius in kilometres
        #[arg(long, default_value = "10")]
        radius: f64,
        /// Severity of the emergency
        #[arg(long)]
        severity: Option<ReportSeverity>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Reports { report_type } => {
            let store = JsonFileReportStore::open(&cli.data_dir).await?;
            let reports = match report_type {
                Some(report_type) => store.get_all(report_type).await?,
                None => store.get_all_types().await?,
            };

            if reports.is_empty() {
                println!("No reports found.");
                return Ok(());
            }

            println!("{:<32} {:<15} {:<12} {:<22} LOCATION", "ID", "TYPE", "STATUS", "CREATED");
            println!("{}", "-".repeat(100));

            for report in &reports {
                let location = report.location.coordinates().map_or_else(
                    || "(none)".to_string(),
                    |(lat, lon)| format!("{lat:.5}, {lon:.5}"),
                );
                println!(
                    "{:<32} {:<15} {:<12} {:<22} {location}",
                    report.id,
                    report.report_type.to_string(),
                    report.status.to_string(),
                    report.created_at.format("%Y-%m-%d %H:%M:%S"),
                );
            }

            println!("\n{} report(s)", reports.len());
        }
        Commands::SetStatus {
            report_type,
            id,
            status,
        } => {
            let store = JsonFileReportStore::open(&cli.data_dir).await?;
            let updated = store.update_status(report_type, &id, status).await?;
            println!("{} is now {}", updated.id, updated.status);
        }
        Commands::Analyze {
            days,
            report_type,
            config,
            archive,
            json,
        } => {
            let config = match config {
                Some(path) => AnalysisConfig::load(&path)?,
                None => AnalysisConfig::embedded(),
            };
            let pipeline = build_pipeline(config);

            let store = JsonFileReportStore::open(&cli.data_dir).await?;
            let reports = match report_type {
                Some(report_type) => store.get_all(report_type).await?,
                None => store.get_all_types().await?,
            };

            let options = AnalysisOptions {
                date_range_days: days,
                reference_time: None,
            };
            let result = pipeline.analyze_reports(&reports, options).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_analysis(&result);
            }

            if archive {
                let archive =
                    GeneratedReportArchive::open(cli.data_dir.join(ARCHIVE_FILE_NAME)).await?;
                let archived = archive.archive(result).await?;
                println!("\nArchived as {}", archived.id);
            }
        }
        Commands::Nearest {
            lat,
            lon,
            radius,
            severity,
        } => {
            let finder = FacilityFinder::from_registry()?;
            let found = finder.find_nearby(lat, lon, severity, radius).await?;

            println!(
                "Nearest: {} ({:.2} km, ~{} min)",
                found.nearest.facility.name,
                found.nearest.distance_km,
                found.nearest.estimated_time_min
            );
            if let Some(address) = &found.nearest.facility.address {
                println!("         {address}");
            }
            println!(
                "         {}",
                incident_map_facility::directions_url(&found.nearest.facility, found.query_point)
            );

            if found.alternatives.len() > 1 {
                println!("\nAlternatives:");
                for (i, alt) in found.alternatives.iter().enumerate().skip(1) {
                    println!("  {i}. {} ({:.2} km)", alt.facility.name, alt.distance_km);
                }
            }
        }
    }

    Ok(())
}

/// Pipeline with whatever collaborators the environment provides.
fn build_pipeline(config: AnalysisConfig) -> AnalysisPipeline {
    let mut pipeline = AnalysisPipeline::new(config);

    match create_generator_from_env() {
        Ok(Some(generator)) => pipeline = pipeline.with_generator(generator),
        Ok(None) => {}
        Err(e) => log::warn!("Insight generator disabled: {e}"),
    }

    if config.facilities.resolve_medical {
        match FacilityFinder::from_registry() {
            Ok(finder) => {
                let finder = config.facilities.configure(finder);
                pipeline = pipeline.with_facility_finder(Arc::new(finder));
            }
            Err(e) => log::warn!("Facility lookups disabled: {e}"),
        }
    }

    pipeline
}

fn print_analysis(result: &AnalysisResult) {
    println!(
        "Reports analysed: {} ({} located)",
        result.metadata.report_count, result.metadata.located_count
    );
    println!(
        "Risk: {}/100 ({})",
        result.risk_index, result.risk.risk_level
    );
    println!(
        "Clusters: {}, isolated reports: {}",
        result.clustering.clusters.len(),
        result.clustering.noise.len()
    );
    println!(
        "Peak activity: {:02}:00, {}, {}",
        result.temporal_profile.peak_hour,
        result.temporal_profile.peak_weekday_name,
        result.temporal_profile.peak_month_name
    );

    if !result.hotspots.is_empty() {
        println!("\n{:<4} {:<8} {:<8} {:<10} CENTER", "ID", "REPORTS", "SIZE", "SEVERITY");
        for hotspot in &result.hotspots {
            println!(
                "{:<4} {:<8} {:<8} {:<10.2} {:.5}, {:.5}",
                hotspot.id,
                hotspot.report_count,
                hotspot.size.to_string(),
                hotspot.severity_score,
                hotspot.center.latitude,
                hotspot.center.longitude
            );
        }
    }

    for assignment in &result.medical_assignments {
        match &assignment.nearest {
            Some(m) => println!(
                "{} -> {} ({:.2} km)",
                assignment.report_id, m.facility.name, m.distance_km
            ),
            None => println!("{} -> no facility found", assignment.report_id),
        }
    }

    if let Some(text) = &result.insight_text {
        println!("\n{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "incident_map",
            "analyze",
            "--days",
            "30",
            "--type",
            "police",
            "--archive",
            "--data-dir",
            "/tmp/reports",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, PathBuf::from("/tmp/reports"));
        match cli.command {
            Commands::Analyze {
                days,
                report_type,
                archive,
                json,
                config,
            } => {
                assert_eq!(days, Some(30));
                assert_eq!(report_type, Some(ReportType::Police));
                assert!(archive);
                assert!(!json);
                assert!(config.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn parses_set_status() {
        let cli = Cli::try_parse_from([
            "incident_map",
            "set-status",
            "medical",
            "MED-1",
            "in-progress",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        match cli.command {
            Commands::SetStatus {
                report_type,
                id,
                status,
            } => {
                assert_eq!(report_type, ReportType::Medical);
                assert_eq!(id, "MED-1");
                assert_eq!(status, ReportStatus::InProgress);
            }
            _ => panic!("expected set-status"),
        }
    }

    #[test]
    fn nearest_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "incident_map",
            "nearest",
            "--lat",
            "-33.87",
            "--lon",
            "151.21",
        ])
        .unwrap();

        match cli.command {
            Commands::Nearest {
                lat, lon, radius, ..
            } => {
                assert!((lat + 33.87).abs() < f64::EPSILON);
                assert!((lon - 151.21).abs() < f64::EPSILON);
                assert!((radius - 10.0).abs() < f64::EPSILON);
            }
            _ => panic!("expected nearest"),
        }
    }

    #[test]
    fn rejects_unknown_report_type() {
        assert!(Cli::try_parse_from(["incident_map", "reports", "--type", "fire"]).is_err());
    }
}
