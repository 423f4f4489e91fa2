#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics over clustered report sets.
//!
//! Each function here is pure: it takes reports (and their clustering)
//! and returns a typed result the analysis pipeline assembles into an
//! `AnalysisResult`. Nothing in this crate performs I/O.

pub mod filter;
pub mod geo_stats;
pub mod risk;
pub mod summary;
pub mod temporal;

pub use filter::filter_by_date_range;
pub use geo_stats::{geo_statistics, hotspot_size, hotspots};
pub use risk::{risk_level, score_risk};
pub use summary::{
    AREA_FALLBACK_TEXT, EMPTY_INPUT_MESSAGE, InsightContext, ML_FALLBACK_TEXT, build_area_prompt,
    build_ml_prompt, build_prompt, describe_date_range, fallback_summary,
};
pub use temporal::{MONTH_NAMES, WEEKDAY_NAMES, temporal_profile};
