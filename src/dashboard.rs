//! One render pass of the dashboard for a region, temporality and category.
//!
//! All inputs are explicit; the pass keeps no state between calls. Chart,
//! narrative and cards all read the same `Arc<RegionTables>`, so their
//! numbers agree.

use crate::aggregate::RegionTables;
use crate::chart::{build_series, ChartSpec};
use crate::config::DashboardConfig;
use crate::error::ReportError;
use crate::narrative::{describe, key_fact, monthly_detail, weekly_detail};
use crate::reports::{generate_general_analysis, generate_key_metrics, generate_summary};
use crate::source::DataSource;
use crate::types::{Category, CategoryFilter, MetricCard, SummaryStats, Temporality};
use log::info;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    pub region_id: u32,
    pub temporality: Temporality,
    pub filter: CategoryFilter,
}

#[derive(Debug)]
pub struct Dashboard {
    pub region_id: u32,
    pub region_name: String,
    pub temporality: Temporality,
    pub filter: CategoryFilter,
    /// Options for the category selector, in table order.
    pub categories: Vec<Category>,
    pub chart: ChartSpec,
    pub narrative: String,
    /// Detailed monthly or weekly section; `None` on the annual tab.
    pub detail: Option<String>,
    pub key_metrics: Vec<MetricCard>,
    pub general_analysis: Vec<MetricCard>,
    pub key_fact: String,
    pub summary: SummaryStats,
    pub tables: Arc<RegionTables>,
}

pub fn render<S>(
    source: &S,
    request: &DashboardRequest,
    config: &DashboardConfig,
) -> Result<Dashboard, ReportError>
where
    S: DataSource + ?Sized,
{
    let region_id = source.resolve_region(request.region_id)?;
    let tables = source.get_data(region_id)?;
    let region_name = source.get_region_name(region_id);
    let opts = config.render_options();
    let filter = &request.filter;

    if let CategoryFilter::Only(c) = filter {
        if !tables.annual.contains(c) {
            info!("category {} has no records in {}, showing zeros", c, region_name);
        }
    }

    let detail = match request.temporality {
        Temporality::Annual => None,
        Temporality::Monthly => Some(monthly_detail(filter, &tables, &opts)),
        Temporality::Weekly => Some(weekly_detail(filter, &tables)),
    };

    let dashboard = Dashboard {
        region_id,
        region_name: region_name.clone(),
        temporality: request.temporality,
        filter: filter.clone(),
        categories: tables.annual.categories().cloned().collect(),
        chart: build_series(request.temporality, filter, &tables, &opts, &config.theme),
        narrative: describe(request.temporality, filter, &tables, &opts),
        detail,
        key_metrics: generate_key_metrics(&tables, &opts, &config.highlights),
        general_analysis: generate_general_analysis(&tables, &opts, &config.highlights),
        key_fact: key_fact(&tables, &opts),
        summary: generate_summary(
            &tables,
            region_id,
            &region_name,
            source.skipped_records(region_id),
            &opts,
        ),
        tables,
    };

    info!(
        "rendered {} view for {} ({}), category {}",
        request.temporality.label(),
        dashboard.region_name,
        region_id,
        filter.display_name()
    );
    Ok(dashboard)
}
