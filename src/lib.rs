//! Crime-statistics dashboard core for Chilean comunas.
//!
//! Long-format incident counts are aggregated into annual, monthly and
//! weekly views ([`aggregate`]), turned into derived figures ([`metrics`])
//! and rendered three ways: chart specifications ([`chart`]), Spanish
//! analysis text ([`narrative`]) and metric cards ([`reports`]).
//! [`dashboard::render`] runs one full pass for a region.

pub mod aggregate;
pub mod cache;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod narrative;
pub mod output;
pub mod reports;
pub mod source;
pub mod types;
pub mod util;

pub use error::ReportError;
