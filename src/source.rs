//! The data-access seam: where region tables and region names come from.

use crate::aggregate::{aggregate, RegionTables};
use crate::error::ReportError;
use crate::loader::{load_from_reader, load_records, LoadReport};
use crate::types::{IncidentRecord, PeriodKey};
use crate::util::parse_u32_safe;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

// Region Metropolitana comunas plus Copiapó.
static COMUNA_NAMES: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (3101, "Copiapó"),
        (13101, "Santiago"),
        (13102, "Cerrillos"),
        (13103, "Cerro Navia"),
        (13104, "Conchalí"),
        (13105, "El Bosque"),
        (13106, "Estación Central"),
        (13107, "Huechuraba"),
        (13108, "Independencia"),
        (13109, "La Cisterna"),
        (13110, "La Florida"),
        (13111, "La Granja"),
        (13112, "La Pintana"),
        (13113, "La Reina"),
        (13114, "Las Condes"),
        (13115, "Lo Barnechea"),
        (13116, "Lo Espejo"),
        (13117, "Lo Prado"),
        (13118, "Macul"),
        (13119, "Maipú"),
        (13120, "Ñuñoa"),
        (13121, "Pedro Aguirre Cerda"),
        (13122, "Peñalolén"),
        (13123, "Providencia"),
        (13124, "Pudahuel"),
        (13125, "Quilicura"),
        (13126, "Quinta Normal"),
        (13127, "Recoleta"),
        (13128, "Renca"),
        (13129, "San Joaquín"),
        (13130, "San Miguel"),
        (13131, "San Ramón"),
        (13132, "Vitacura"),
        (13201, "Puente Alto"),
        (13401, "San Bernardo"),
    ])
});

/// Display name for a comuna code, `Comuna {code}` when unknown.
pub fn region_name(region_id: u32) -> String {
    COMUNA_NAMES
        .get(&region_id)
        .map_or_else(|| format!("Comuna {}", region_id), |n| n.to_string())
}

/// Region code from a request parameter; anything missing or malformed
/// falls back to `default`.
pub fn parse_region_param(raw: Option<&str>, default: u32) -> u32 {
    match parse_u32_safe(raw) {
        Some(id) => id,
        None => {
            if let Some(raw) = raw {
                warn!("invalid region parameter {:?}, using {}", raw, default);
            }
            default
        }
    }
}

/// Supplies aggregated tables per region.
pub trait DataSource {
    /// Region actually served for `region_id`, after any fallback.
    fn resolve_region(&self, region_id: u32) -> Result<u32, ReportError>;

    fn get_data(&self, region_id: u32) -> Result<Arc<RegionTables>, ReportError>;

    fn get_region_name(&self, region_id: u32) -> String {
        region_name(region_id)
    }

    /// Rows and records dropped on the way to `region_id`'s tables.
    fn skipped_records(&self, _region_id: u32) -> usize {
        0
    }
}

/// Long-format incident records grouped by region, aggregated on request.
#[derive(Debug, Clone)]
pub struct CsvSource {
    regions: BTreeMap<u32, Vec<IncidentRecord>>,
    default_region: u32,
    report: LoadReport,
}

impl CsvSource {
    pub fn open(path: &Path, default_region: u32) -> Result<Self, ReportError> {
        let (records, report) = load_records(path)?;
        Ok(Self::with_report(records, report, default_region))
    }

    pub fn from_reader<R: Read>(rdr: R, default_region: u32) -> Result<Self, ReportError> {
        let (records, report) = load_from_reader(rdr)?;
        Ok(Self::with_report(records, report, default_region))
    }

    /// Source over records already in memory.
    pub fn from_records(records: Vec<IncidentRecord>, default_region: u32) -> Self {
        let report = LoadReport {
            total_rows: records.len(),
            loaded_rows: records.len(),
            parse_errors: 0,
        };
        Self::with_report(records, report, default_region)
    }

    fn with_report(records: Vec<IncidentRecord>, report: LoadReport, default_region: u32) -> Self {
        let mut regions: BTreeMap<u32, Vec<IncidentRecord>> = BTreeMap::new();
        for r in records {
            regions.entry(r.region_id).or_default().push(r);
        }
        info!(
            "data source holds {} regions ({} rows loaded, {} rejected)",
            regions.len(),
            report.loaded_rows,
            report.parse_errors
        );
        CsvSource {
            regions,
            default_region,
            report,
        }
    }
}

impl DataSource for CsvSource {
    fn resolve_region(&self, region_id: u32) -> Result<u32, ReportError> {
        if self.regions.contains_key(&region_id) {
            return Ok(region_id);
        }
        if self.regions.contains_key(&self.default_region) {
            warn!(
                "no data for region {}, falling back to {}",
                region_id, self.default_region
            );
            return Ok(self.default_region);
        }
        Err(ReportError::UnknownRegion(region_id))
    }

    fn get_data(&self, region_id: u32) -> Result<Arc<RegionTables>, ReportError> {
        let region = self.resolve_region(region_id)?;
        let records = self.regions.get(&region).map_or(&[][..], |v| v.as_slice());
        let aggregation = aggregate(records)?;
        Ok(Arc::new(aggregation.tables))
    }

    fn skipped_records(&self, region_id: u32) -> usize {
        let invalid = self
            .resolve_region(region_id)
            .ok()
            .and_then(|region| self.regions.get(&region))
            .map_or(0, |records| {
                records
                    .iter()
                    .filter(|r| PeriodKey::parse(&r.period).is_none())
                    .count()
            });
        self.report.parse_errors + invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategoryFilter;

    const CSV: &str = "\
category,region_id,year,period,count
ROBOS,13101,2024,Enero,10
ROBOS,13101,2025,Enero,12
ROBOS,13101,2025,Juliembre,3
AMENAZAS,13114,2025,Marzo,4
AMENAZAS,13114,abc,Marzo,4
";

    fn source() -> CsvSource {
        CsvSource::from_reader(CSV.as_bytes(), 13101).unwrap()
    }

    #[test]
    fn test_region_names() {
        assert_eq!(region_name(13101), "Santiago");
        assert_eq!(region_name(13120), "Ñuñoa");
        assert_eq!(region_name(99999), "Comuna 99999");
    }

    #[test]
    fn test_parse_region_param_fallback() {
        assert_eq!(parse_region_param(Some("13114"), 13101), 13114);
        assert_eq!(parse_region_param(Some(" 13114 "), 13101), 13114);
        assert_eq!(parse_region_param(Some("santiago"), 13101), 13101);
        assert_eq!(parse_region_param(Some(""), 13101), 13101);
        assert_eq!(parse_region_param(None, 13101), 13101);
    }

    #[test]
    fn test_get_data_per_region() {
        let src = source();
        let tables = src.get_data(13114).unwrap();
        assert_eq!(tables.annual.totals(&CategoryFilter::All), [0, 0, 4]);
        let tables = src.get_data(13101).unwrap();
        assert_eq!(tables.annual.totals(&CategoryFilter::All), [0, 10, 12]);
    }

    #[test]
    fn test_unknown_region_falls_back_to_default() {
        let src = source();
        assert_eq!(src.resolve_region(13999).unwrap(), 13101);
        let tables = src.get_data(13999).unwrap();
        assert_eq!(tables.annual.partial_year(), 2025);
    }

    #[test]
    fn test_unknown_region_without_default_data() {
        let src = CsvSource::from_reader(CSV.as_bytes(), 13132).unwrap();
        assert!(matches!(src.get_data(1), Err(ReportError::UnknownRegion(1))));
    }

    #[test]
    fn test_skipped_records_counts_rows_and_periods() {
        let src = source();
        // One row with a bad year, one record with a bad period.
        assert_eq!(src.report.parse_errors, 1);
        assert_eq!(src.skipped_records(13101), 2);
        assert_eq!(src.skipped_records(13114), 1);
    }
}
