//! Derived statistics over the aggregated tables.
//!
//! Everything here is a pure function of its arguments. "Not enough data"
//! is `None`, never NaN or infinity, so the rendering layers can print
//! `N/A` / `Sin datos` without checking floats.

use crate::aggregate::{AnnualTable, PeriodTable};
use crate::types::{Category, CategoryFilter};
use crate::util::round_half_even;
use std::collections::BTreeMap;

/// Tables that can report one total per year for a category filter.
pub trait YearTotals {
    fn totals_by_year(&self, filter: &CategoryFilter) -> BTreeMap<i32, u64>;
}

impl YearTotals for AnnualTable {
    fn totals_by_year(&self, filter: &CategoryFilter) -> BTreeMap<i32, u64> {
        self.years().into_iter().zip(self.totals(filter)).collect()
    }
}

impl YearTotals for PeriodTable {
    fn totals_by_year(&self, filter: &CategoryFilter) -> BTreeMap<i32, u64> {
        self.years()
            .into_iter()
            .map(|year| (year, self.series_for(filter, year).iter().sum()))
            .collect()
    }
}

pub fn totals_by_year<T: YearTotals + ?Sized>(table: &T, filter: &CategoryFilter) -> BTreeMap<i32, u64> {
    table.totals_by_year(filter)
}

/// Percent change from `a` to `b`.
///
/// Returns `None` when `a <= 0`: a change against an empty or negative base
/// is reported as insufficient data.
pub fn percent_change(a: f64, b: f64) -> Option<f64> {
    if !(a > 0.0) || !b.is_finite() || !a.is_finite() {
        return None;
    }
    Some((b - a) / a * 100.0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakTrough {
    pub peak_index: usize,
    pub peak_label: String,
    pub peak_value: u64,
    pub trough_index: usize,
    pub trough_label: String,
    pub trough_value: u64,
}

/// Maximum and minimum of `series`. Ties go to the earliest index.
pub fn peak_and_trough<L: ToString>(series: &[u64], labels: &[L]) -> Option<PeakTrough> {
    let mut iter = series.iter().copied().enumerate().zip(labels);
    let ((first_idx, first_val), _) = iter.next()?;
    let (mut peak, mut trough) = ((first_idx, first_val), (first_idx, first_val));
    for ((idx, value), _) in iter {
        if value > peak.1 {
            peak = (idx, value);
        }
        if value < trough.1 {
            trough = (idx, value);
        }
    }
    Some(PeakTrough {
        peak_index: peak.0,
        peak_label: labels[peak.0].to_string(),
        peak_value: peak.1,
        trough_index: trough.0,
        trough_label: labels[trough.0].to_string(),
        trough_value: trough.1,
    })
}

/// Inclusive, zero-based index range of one quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quarter {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
}

pub const MONTH_QUARTERS: [Quarter; 4] = [
    Quarter { name: "Q1 (Ene-Mar)", start: 0, end: 2 },
    Quarter { name: "Q2 (Abr-Jun)", start: 3, end: 5 },
    Quarter { name: "Q3 (Jul-Sep)", start: 6, end: 8 },
    Quarter { name: "Q4 (Oct-Dic)", start: 9, end: 11 },
];

// Weeks 1-13, 14-26, 27-39, 40-52; week 53 belongs to no quarter.
pub const WEEK_QUARTERS: [Quarter; 4] = [
    Quarter { name: "Q1 (Ene-Mar)", start: 0, end: 12 },
    Quarter { name: "Q2 (Abr-Jun)", start: 13, end: 25 },
    Quarter { name: "Q3 (Jul-Sep)", start: 26, end: 38 },
    Quarter { name: "Q4 (Oct-Dic)", start: 39, end: 51 },
];

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterAverage {
    pub name: &'static str,
    /// `None` when no index of the quarter is reported.
    pub average: Option<f64>,
}

/// Average per period for each quarter. Only indices below `series.len()`
/// count as reported, so pass the reported prefix of a partial year.
pub fn quarterly_average(series: &[u64], quarters: &[Quarter]) -> Vec<QuarterAverage> {
    quarters
        .iter()
        .map(|q| {
            let reported: Vec<u64> = series
                .iter()
                .enumerate()
                .filter(|(i, _)| (q.start..=q.end).contains(i))
                .map(|(_, v)| *v)
                .collect();
            let average = if reported.is_empty() {
                None
            } else {
                Some(reported.iter().sum::<u64>() as f64 / reported.len() as f64)
            };
            QuarterAverage { name: q.name, average }
        })
        .collect()
}

/// Value filled into every unreported period: the mean of the strictly
/// positive values up to and including `last_reported_index`, rounded half
/// to even. Reported zeros are left out of the mean.
pub fn projection_value(series: &[u64], last_reported_index: usize) -> u64 {
    let end = (last_reported_index + 1).min(series.len());
    let positives: Vec<u64> = series[..end].iter().copied().filter(|v| *v > 0).collect();
    if positives.is_empty() {
        return 0;
    }
    let mean = positives.iter().sum::<u64>() as f64 / positives.len() as f64;
    round_half_even(mean) as u64
}

/// Copy of `series` with every index after `last_reported_index` replaced by
/// [`projection_value`].
pub fn project_remaining(series: &[u64], last_reported_index: usize) -> Vec<u64> {
    let fill = projection_value(series, last_reported_index);
    series
        .iter()
        .enumerate()
        .map(|(i, v)| if i > last_reported_index { fill } else { *v })
        .collect()
}

/// Latest period treated as reported. Starts at `default_index` and moves to
/// every later index holding a nonzero value, so a stray late report pulls
/// the cut forward even across zero months.
pub fn last_reported_index(series: &[u64], default_index: usize) -> usize {
    let mut idx = default_index.min(series.len().saturating_sub(1));
    for (i, value) in series.iter().enumerate().skip(idx + 1) {
        if *value > 0 {
            idx = i;
        }
    }
    idx
}

/// Where the reported part of a partial-year monthly series ends and what
/// fills the rest. Chart and narrative both read this one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub last_reported_index: usize,
    pub fill: u64,
    pub series: Vec<u64>,
}

pub fn projection(series: &[u64], default_index: usize) -> Projection {
    let last = last_reported_index(series, default_index);
    Projection {
        last_reported_index: last,
        fill: projection_value(series, last),
        series: project_remaining(series, last),
    }
}

/// Change between the first `span` periods of two years.
pub fn same_period_change(previous: &[u64], current: &[u64], span: usize) -> Option<f64> {
    let prev: u64 = previous.iter().take(span).sum();
    let curr: u64 = current.iter().take(span).sum();
    percent_change(prev as f64, curr as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub index: usize,
    pub label: String,
    pub change: f64,
}

/// Period-by-period change over the first `span` periods, skipping periods
/// whose previous value gives no meaningful base.
pub fn period_variations<L: ToString>(
    previous: &[u64],
    current: &[u64],
    labels: &[L],
    span: usize,
) -> Vec<Variation> {
    previous
        .iter()
        .zip(current)
        .zip(labels)
        .take(span)
        .enumerate()
        .filter_map(|(index, ((p, c), label))| {
            percent_change(*p as f64, *c as f64).map(|change| Variation {
                index,
                label: label.to_string(),
                change,
            })
        })
        .collect()
}

/// Largest increase and largest decrease; earliest period wins ties.
pub fn extreme_variations(variations: &[Variation]) -> Option<(&Variation, &Variation)> {
    let first = variations.first()?;
    let (mut max, mut min) = (first, first);
    for v in &variations[1..] {
        if v.change > max.change {
            max = v;
        }
        if v.change < min.change {
            min = v;
        }
    }
    Some((max, min))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRank {
    pub category: Category,
    pub total: u64,
}

/// Most and least frequent category for one annual column (`0..3`).
/// Categories are scanned in lexicographic order, first wins ties.
pub fn category_extremes(annual: &AnnualTable, year_slot: usize) -> Option<(CategoryRank, CategoryRank)> {
    let slot = year_slot.min(2);
    let categories: Vec<&Category> = annual.categories().collect();
    let totals: Vec<u64> = categories.iter().map(|c| annual.row(c)[slot]).collect();
    let labels: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
    let pt = peak_and_trough(&totals, &labels)?;
    Some((
        CategoryRank {
            category: categories[pt.peak_index].clone(),
            total: pt.peak_value,
        },
        CategoryRank {
            category: categories[pt.trough_index].clone(),
            total: pt.trough_value,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::rec;

    #[test]
    fn test_percent_change_insufficient_data() {
        assert_eq!(percent_change(0.0, 100.0), None);
        assert_eq!(percent_change(-5.0, 100.0), None);
    }

    #[test]
    fn test_percent_change_values() {
        assert_eq!(percent_change(100.0, 50.0), Some(-50.0));
        assert_eq!(percent_change(1000.0, 1200.0), Some(20.0));
        assert_eq!(percent_change(10.0, 10.0), Some(0.0));
    }

    #[test]
    fn test_peak_and_trough_first_wins_ties() {
        let pt = peak_and_trough(&[5, 5, 3], &["A", "B", "C"]).unwrap();
        assert_eq!(pt.peak_label, "A");
        assert_eq!(pt.peak_value, 5);
        assert_eq!(pt.trough_label, "C");
        assert_eq!(pt.trough_value, 3);

        let pt = peak_and_trough(&[1, 4, 1, 4], &["A", "B", "C", "D"]).unwrap();
        assert_eq!(pt.peak_label, "B");
        assert_eq!(pt.trough_label, "A");
    }

    #[test]
    fn test_peak_and_trough_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(peak_and_trough(&[], &empty), None);
    }

    #[test]
    fn test_project_remaining_excludes_zeros() {
        let series = [10, 0, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let projected = project_remaining(&series, 3);
        assert_eq!(&projected[..4], &[10, 0, 20, 0]);
        assert!(projected[4..].iter().all(|v| *v == 15));
        assert_eq!(projected.len(), 12);
    }

    #[test]
    fn test_project_remaining_rounds_half_even() {
        // mean([2, 3]) = 2.5 -> 2
        assert_eq!(projection_value(&[2, 3, 0], 1), 2);
        // mean([3, 4]) = 3.5 -> 4
        assert_eq!(projection_value(&[3, 4, 0], 1), 4);
    }

    #[test]
    fn test_project_remaining_no_positive_values() {
        let projected = project_remaining(&[0, 0, 0, 0], 1);
        assert_eq!(projected, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_last_reported_index_forward_scan() {
        let mut series = [5u64; 12];
        for v in series.iter_mut().skip(7) {
            *v = 0;
        }
        assert_eq!(last_reported_index(&series, 6), 6);
        // A late report moves the cut across the zero months before it.
        series[9] = 3;
        assert_eq!(last_reported_index(&series, 6), 9);
        // Zeros before the default index do not move it back.
        let zeros = [0u64; 12];
        assert_eq!(last_reported_index(&zeros, 6), 6);
    }

    #[test]
    fn test_last_reported_index_short_series() {
        assert_eq!(last_reported_index(&[1, 2, 3], 6), 2);
        assert_eq!(last_reported_index(&[], 6), 0);
    }

    #[test]
    fn test_projection_uses_scanned_cut() {
        let series = [10, 20, 30, 40, 50, 60, 70, 0, 0, 0, 0, 0];
        let p = projection(&series, 6);
        assert_eq!(p.last_reported_index, 6);
        assert_eq!(p.fill, 40);
        assert_eq!(&p.series[7..], &[40; 5]);
    }

    #[test]
    fn test_quarterly_average_future_quarter_has_no_data() {
        // Seven reported months of a partial year.
        let reported = [3, 3, 3, 6, 6, 6, 9];
        let q = quarterly_average(&reported, &MONTH_QUARTERS);
        assert_eq!(q[0].average, Some(3.0));
        assert_eq!(q[1].average, Some(6.0));
        assert_eq!(q[2].average, Some(9.0));
        assert_eq!(q[3].average, None);
        assert_eq!(q[3].name, "Q4 (Oct-Dic)");
    }

    #[test]
    fn test_quarterly_average_weeks() {
        let series = vec![2u64; 20];
        let q = quarterly_average(&series, &WEEK_QUARTERS);
        assert_eq!(q[0].average, Some(2.0));
        assert_eq!(q[1].average, Some(2.0));
        assert_eq!(q[2].average, None);
    }

    #[test]
    fn test_same_period_change() {
        let prev = [10, 10, 10, 50];
        let curr = [12, 12, 6, 0];
        assert_eq!(same_period_change(&prev, &curr, 3), Some(0.0));
        assert_eq!(same_period_change(&[0, 0], &curr, 2), None);
    }

    #[test]
    fn test_period_variations_and_extremes() {
        let labels = ["Enero", "Febrero", "Marzo", "Abril"];
        let vars = period_variations(&[10, 0, 20, 10], &[15, 4, 10, 15], &labels, 4);
        assert_eq!(vars.len(), 3);
        assert_eq!(vars[1].label, "Marzo");
        let (max, min) = extreme_variations(&vars).unwrap();
        // Enero and Abril both +50%; Enero comes first.
        assert_eq!(max.label, "Enero");
        assert_eq!(min.label, "Marzo");
        assert_eq!(min.change, -50.0);
        assert!(extreme_variations(&[]).is_none());
    }

    #[test]
    fn test_totals_by_year_all_tables() {
        let records = vec![
            rec("ROBOS", 2023, "Enero", 1000),
            rec("ROBOS", 2024, "Enero", 1200),
            rec("AMENAZAS", 2024, "3", 7),
        ];
        let tables = aggregate(&records).unwrap().tables;
        let annual = totals_by_year(&tables.annual, &CategoryFilter::All);
        assert_eq!(annual.get(&2023), Some(&1000));
        assert_eq!(annual.get(&2024), Some(&1207));
        let monthly = totals_by_year(&tables.monthly, &CategoryFilter::parse("ROBOS"));
        assert_eq!(monthly.get(&2024), Some(&1200));
        let weekly = totals_by_year(&tables.weekly, &CategoryFilter::parse("AMENAZAS"));
        assert_eq!(weekly.get(&2024), Some(&7));
    }

    #[test]
    fn test_category_extremes() {
        let records = vec![
            rec("ROBOS", 2024, "Enero", 30),
            rec("AMENAZAS", 2024, "Enero", 30),
            rec("HURTOS", 2024, "Enero", 2),
        ];
        let tables = aggregate(&records).unwrap().tables;
        let (most, least) = category_extremes(&tables.annual, 2).unwrap();
        assert_eq!(most.category.as_str(), "AMENAZAS");
        assert_eq!(most.total, 30);
        assert_eq!(least.category.as_str(), "HURTOS");
    }
}
