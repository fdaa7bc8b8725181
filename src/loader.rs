use crate::error::ReportError;
use crate::types::{Category, IncidentRecord, RawRow};
use crate::util::{parse_i32_safe, parse_u32_safe, parse_u64_safe};
use csv::ReaderBuilder;
use log::{debug, warn};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

pub fn load_records(path: &Path) -> Result<(Vec<IncidentRecord>, LoadReport), ReportError> {
    let file = std::fs::File::open(path)?;
    load_from_reader(file)
}

/// Read long-format incident rows. Rows with a missing category, region,
/// year, period or count are counted in [`LoadReport::parse_errors`] and
/// skipped; only a broken file (I/O, unreadable header) is an error.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(Vec<IncidentRecord>, LoadReport), ReportError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.headers()?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (line, result) in rdr.deserialize::<RawRow>().enumerate() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("row {}: {}", line + 2, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let category = match row.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => Category::new(c),
            _ => { report.parse_errors += 1; continue; }
        };
        let Some(region_id) = parse_u32_safe(row.region_id.as_deref()) else { report.parse_errors += 1; continue; };
        let Some(year) = parse_i32_safe(row.year.as_deref()) else { report.parse_errors += 1; continue; };
        let Some(count) = parse_u64_safe(row.count.as_deref()) else { report.parse_errors += 1; continue; };
        // The period stays raw: deciding month vs. week belongs to the aggregator.
        let period = match row.period {
            Some(p) if !p.trim().is_empty() => p.trim().to_string(),
            _ => { report.parse_errors += 1; continue; }
        };

        records.push(IncidentRecord {
            category,
            region_id,
            year,
            period,
            count,
        });
    }

    report.loaded_rows = records.len();
    if report.parse_errors > 0 {
        warn!(
            "{} of {} rows skipped due to parse/validation errors",
            report.parse_errors, report.total_rows
        );
    }
    Ok((records, report))
}
