//! Reshapes long-format incident records into the three temporal views.
//!
//! Every view is keyed by [`Category`] in a `BTreeMap`, so iteration order is
//! lexicographic and identical across renders. A category seen in any view
//! is present in all three, zero-filled where it had no records.

use crate::error::{InvalidPeriodError, ReportError};
use crate::types::{Category, CategoryFilter, IncidentRecord, PeriodKey, MAX_WEEKS, MONTHS, WEEKS_PER_YEAR};
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Monthly,
    Weekly,
}

/// Annual totals for the two full years before the partial year and the
/// partial year itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualTable {
    years: [i32; 3],
    rows: BTreeMap<Category, [u64; 3]>,
}

impl AnnualTable {
    /// `[N-2, N-1, N]`; `N` is partial.
    pub fn years(&self) -> [i32; 3] {
        self.years
    }

    pub fn partial_year(&self) -> i32 {
        self.years[2]
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.rows.keys()
    }

    pub fn rows(&self) -> &BTreeMap<Category, [u64; 3]> {
        &self.rows
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.rows.contains_key(category)
    }

    /// Row for one category; an unknown category reads as all zeros.
    pub fn row(&self, category: &Category) -> [u64; 3] {
        self.rows.get(category).copied().unwrap_or([0; 3])
    }

    pub fn totals(&self, filter: &CategoryFilter) -> [u64; 3] {
        match filter {
            CategoryFilter::Only(c) => self.row(c),
            CategoryFilter::All => self.rows.values().fold([0; 3], |mut acc, row| {
                for (a, v) in acc.iter_mut().zip(row) {
                    *a += v;
                }
                acc
            }),
        }
    }
}

/// Per-year bucket sequences for one granularity (12 months or
/// `period_count` weeks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTable {
    granularity: Granularity,
    period_count: usize,
    series: BTreeMap<Category, BTreeMap<i32, Vec<u64>>>,
    /// Highest zero-based period index named by any record, per year. Zero
    /// buckets at or below it are real zeros; above it they are unreported.
    reported_through: BTreeMap<i32, usize>,
}

pub type MonthlyTable = PeriodTable;
pub type WeeklyTable = PeriodTable;

impl PeriodTable {
    fn empty(granularity: Granularity, period_count: usize) -> Self {
        PeriodTable {
            granularity,
            period_count,
            series: BTreeMap::new(),
            reported_through: BTreeMap::new(),
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// 12 for monthly tables, 52 or 53 for weekly tables.
    pub fn period_count(&self) -> usize {
        self.period_count
    }

    pub fn years(&self) -> Vec<i32> {
        self.reported_through.keys().copied().collect()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.series.keys()
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.series.contains_key(category)
    }

    pub fn reported_through(&self, year: i32) -> Option<usize> {
        self.reported_through.get(&year).copied()
    }

    /// Number of leading periods reported for `year` (0 when none).
    pub fn reported_len(&self, year: i32) -> usize {
        self.reported_through(year).map_or(0, |idx| idx + 1)
    }

    /// Zero-filled series for one category and year. Missing categories and
    /// years read as zeros of the full period count.
    pub fn series(&self, category: &Category, year: i32) -> Vec<u64> {
        self.series
            .get(category)
            .and_then(|years| years.get(&year))
            .cloned()
            .unwrap_or_else(|| vec![0; self.period_count])
    }

    /// Series for a filter; `All` sums every category bucket by bucket.
    pub fn series_for(&self, filter: &CategoryFilter, year: i32) -> Vec<u64> {
        match filter {
            CategoryFilter::Only(c) => self.series(c, year),
            CategoryFilter::All => {
                let mut acc = vec![0; self.period_count];
                for years in self.series.values() {
                    if let Some(values) = years.get(&year) {
                        for (a, v) in acc.iter_mut().zip(values) {
                            *a += v;
                        }
                    }
                }
                acc
            }
        }
    }

    pub fn period_label(&self, idx: usize) -> String {
        match self.granularity {
            Granularity::Monthly => MONTHS.get(idx).map_or_else(|| format!("Mes {}", idx + 1), |m| m.to_string()),
            Granularity::Weekly => format!("Semana {}", idx + 1),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.period_count).map(|i| self.period_label(i)).collect()
    }
}

/// The three views of one region, owned together and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTables {
    pub annual: AnnualTable,
    pub monthly: MonthlyTable,
    pub weekly: WeeklyTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub tables: RegionTables,
    pub skipped: Vec<InvalidPeriodError>,
}

type Buckets = BTreeMap<Category, BTreeMap<i32, Vec<u64>>>;

fn add_bucket(map: &mut Buckets, category: &Category, year: i32, len: usize, idx: usize, count: u64) {
    let values = map
        .entry(category.clone())
        .or_default()
        .entry(year)
        .or_insert_with(|| vec![0; len]);
    values[idx] += count;
}

fn mark_reported(reported: &mut BTreeMap<i32, usize>, year: i32, idx: usize) {
    let e = reported.entry(year).or_insert(idx);
    if idx > *e {
        *e = idx;
    }
}

/// Build a zero-filled table: every category gets every year the view knows.
fn fill_table(
    granularity: Granularity,
    period_count: usize,
    raw: &Buckets,
    categories: &BTreeSet<Category>,
    reported: BTreeMap<i32, usize>,
) -> PeriodTable {
    let mut table = PeriodTable::empty(granularity, period_count);
    for category in categories {
        let mut years = BTreeMap::new();
        for year in reported.keys() {
            let mut values = raw
                .get(category)
                .and_then(|y| y.get(year))
                .cloned()
                .unwrap_or_else(|| vec![0; period_count]);
            values.resize(period_count, 0);
            years.insert(*year, values);
        }
        table.series.insert(category.clone(), years);
    }
    table.reported_through = reported;
    table
}

/// Group records by category and year into the annual, monthly and weekly
/// views. Records with an unrecognised period are skipped and returned in
/// [`Aggregation::skipped`]; only input with no usable record at all fails.
pub fn aggregate(records: &[IncidentRecord]) -> Result<Aggregation, ReportError> {
    let mut monthly: Buckets = BTreeMap::new();
    let mut weekly: Buckets = BTreeMap::new();
    let mut monthly_reported = BTreeMap::new();
    let mut weekly_reported = BTreeMap::new();
    let mut categories = BTreeSet::new();
    let mut skipped = Vec::new();
    let mut max_week = 0usize;

    for r in records {
        match PeriodKey::parse(&r.period) {
            Some(PeriodKey::Month(idx)) => {
                add_bucket(&mut monthly, &r.category, r.year, MONTHS.len(), idx, r.count);
                mark_reported(&mut monthly_reported, r.year, idx);
            }
            Some(PeriodKey::Week(week)) => {
                add_bucket(&mut weekly, &r.category, r.year, MAX_WEEKS, week - 1, r.count);
                mark_reported(&mut weekly_reported, r.year, week - 1);
                max_week = max_week.max(week);
            }
            None => {
                let err = InvalidPeriodError {
                    category: r.category.to_string(),
                    year: r.year,
                    period: r.period.clone(),
                };
                warn!("skipping record: {}", err);
                skipped.push(err);
                continue;
            }
        }
        categories.insert(r.category.clone());
    }

    if categories.is_empty() {
        return Err(ReportError::NoUsableRecords { skipped: skipped.len() });
    }

    let week_count = if max_week > WEEKS_PER_YEAR { MAX_WEEKS } else { WEEKS_PER_YEAR };

    let current_year = monthly_reported
        .keys()
        .chain(weekly_reported.keys())
        .copied()
        .max()
        .unwrap_or_default();
    let years = [current_year - 2, current_year - 1, current_year];

    // Monthly and weekly records count the same incidents; the annual total
    // prefers the monthly breakdown and only falls back to weeks.
    let mut rows = BTreeMap::new();
    for category in &categories {
        let mut row = [0u64; 3];
        for (slot, year) in row.iter_mut().zip(years) {
            let from_months = monthly.get(category).and_then(|y| y.get(&year));
            let from_weeks = weekly.get(category).and_then(|y| y.get(&year));
            *slot = match (from_months, from_weeks) {
                (Some(values), _) | (None, Some(values)) => values.iter().sum(),
                (None, None) => 0,
            };
        }
        rows.insert(category.clone(), row);
    }

    let tables = RegionTables {
        annual: AnnualTable { years, rows },
        monthly: fill_table(Granularity::Monthly, MONTHS.len(), &monthly, &categories, monthly_reported),
        weekly: fill_table(Granularity::Weekly, week_count, &weekly, &categories, weekly_reported),
    };

    info!(
        "aggregated {} records into {} categories (partial year {}, {} weeks, {} skipped)",
        records.len() - skipped.len(),
        categories.len(),
        current_year,
        week_count,
        skipped.len()
    );

    Ok(Aggregation { tables, skipped })
}
