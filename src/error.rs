use thiserror::Error;

/// A record whose period is neither one of the twelve month labels nor a
/// valid week index. Aggregation skips the record and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period {period:?} for category {category} ({year})")]
pub struct InvalidPeriodError {
    pub category: String,
    pub year: i32,
    pub period: String,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no usable incident records ({skipped} skipped)")]
    NoUsableRecords { skipped: usize },

    #[error("region {0} has no data and the default region is unavailable")]
    UnknownRegion(u32),
}
