use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

pub const MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub const WEEKS_PER_YEAR: usize = 52;
pub const MAX_WEEKS: usize = 53;

// Full names, the "Setiembre" spelling and three-letter abbreviations.
static MONTH_LOOKUP: Lazy<HashMap<String, usize>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for (idx, name) in MONTHS.iter().enumerate() {
        let lower = name.to_lowercase();
        m.insert(lower.chars().take(3).collect::<String>(), idx);
        m.insert(lower, idx);
    }
    m.insert("setiembre".to_string(), 8);
    m.insert("set".to_string(), 8);
    m
});

/// One row of the long-format incident CSV, before validation.
///
/// Header aliases cover the column names used by the Ley STOP exports.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(alias = "delito", alias = "Delito", alias = "CATEGORY")]
    pub category: Option<String>,
    #[serde(alias = "codcom", alias = "CODCOM", alias = "comuna")]
    pub region_id: Option<String>,
    #[serde(alias = "año", alias = "Año", alias = "anio", alias = "YEAR")]
    pub year: Option<String>,
    #[serde(
        alias = "periodo",
        alias = "mes",
        alias = "Mes",
        alias = "semana",
        alias = "PERIOD"
    )]
    pub period: Option<String>,
    #[serde(alias = "valor", alias = "Valor", alias = "frecuencia", alias = "COUNT")]
    pub count: Option<String>,
}

/// Crime-type label. Always trimmed and upper-cased so that `Robo` and
/// `ROBO ` land in the same bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(raw: &str) -> Self {
        Category(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated incident count for one category, region, year and period.
///
/// `period` is kept as the raw label; the aggregator decides whether it is a
/// month or a week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRecord {
    pub category: Category,
    pub region_id: u32,
    pub year: i32,
    pub period: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKey {
    /// Zero-based month index.
    Month(usize),
    /// One-based ISO-style week number.
    Week(usize),
}

impl PeriodKey {
    /// Accepts a month label (`Enero`, `ene`, `SEPTIEMBRE`), a bare week
    /// number (`12`) or a prefixed one (`SEMANA 12`).
    pub fn parse(raw: &str) -> Option<PeriodKey> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        let lower = s.to_lowercase();
        let week_part = lower
            .strip_prefix("semana")
            .or_else(|| lower.strip_prefix("sem."))
            .unwrap_or(&lower)
            .trim();
        if !week_part.is_empty() && week_part.chars().all(|c| c.is_ascii_digit()) {
            let week: usize = week_part.parse().ok()?;
            return if (1..=MAX_WEEKS).contains(&week) {
                Some(PeriodKey::Week(week))
            } else {
                None
            };
        }
        MONTH_LOOKUP.get(lower.as_str()).map(|idx| PeriodKey::Month(*idx))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn parse(raw: &str) -> CategoryFilter {
        let s = raw.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("todos") {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(Category::new(s))
        }
    }

    pub fn matches(&self, category: &Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }

    /// Name used inside narrative paragraphs.
    pub fn display_name(&self) -> String {
        match self {
            CategoryFilter::All => "Todos los delitos".to_string(),
            CategoryFilter::Only(c) => c.to_string(),
        }
    }

    /// Name used in chart titles.
    pub fn title_name(&self) -> String {
        match self {
            CategoryFilter::All => "Todos los Delitos".to_string(),
            CategoryFilter::Only(c) => c.to_string(),
        }
    }

    /// Short name used in legend entries.
    pub fn legend_name(&self) -> String {
        match self {
            CategoryFilter::All => "Total".to_string(),
            CategoryFilter::Only(c) => c.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Temporality {
    Annual,
    Monthly,
    Weekly,
}

impl Temporality {
    pub fn label(&self) -> &'static str {
        match self {
            Temporality::Annual => "Anual",
            Temporality::Monthly => "Mensual",
            Temporality::Weekly => "Semanal",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Temporality::Annual => "annual",
            Temporality::Monthly => "monthly",
            Temporality::Weekly => "weekly",
        }
    }
}

impl FromStr for Temporality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "annual" | "anual" | "a" => Ok(Temporality::Annual),
            "monthly" | "mensual" | "m" => Ok(Temporality::Monthly),
            "weekly" | "semanal" | "w" | "s" => Ok(Temporality::Weekly),
            other => Err(format!(
                "unknown temporality '{}', expected annual, monthly or weekly",
                other
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Temporality {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One row of the key-metrics / general-analysis panels.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetricCard {
    #[serde(rename = "Title")]
    #[tabled(rename = "Title")]
    pub title: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    /// CSS tone class: `green` for a decrease, `red` for an increase or
    /// unknown change, empty for neutral cards.
    #[serde(rename = "Tone")]
    #[tabled(rename = "Tone")]
    pub tone: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub region_id: u32,
    pub region_name: String,
    pub generated_at: chrono::DateTime<chrono::Local>,
    pub years: [i32; 3],
    pub totals: [u64; 3],
    pub total_categories: usize,
    pub change_previous_year: Option<f64>,
    pub change_partial_same_period: Option<f64>,
    pub skipped_records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse_months() {
        assert_eq!(PeriodKey::parse("Enero"), Some(PeriodKey::Month(0)));
        assert_eq!(PeriodKey::parse(" JULIO "), Some(PeriodKey::Month(6)));
        assert_eq!(PeriodKey::parse("dic"), Some(PeriodKey::Month(11)));
        assert_eq!(PeriodKey::parse("Setiembre"), Some(PeriodKey::Month(8)));
    }

    #[test]
    fn test_period_parse_weeks() {
        assert_eq!(PeriodKey::parse("12"), Some(PeriodKey::Week(12)));
        assert_eq!(PeriodKey::parse("SEMANA 1"), Some(PeriodKey::Week(1)));
        assert_eq!(PeriodKey::parse("Semana 53"), Some(PeriodKey::Week(53)));
    }

    #[test]
    fn test_period_parse_invalid() {
        assert_eq!(PeriodKey::parse(""), None);
        assert_eq!(PeriodKey::parse("0"), None);
        assert_eq!(PeriodKey::parse("54"), None);
        assert_eq!(PeriodKey::parse("Juliembre"), None);
        assert_eq!(PeriodKey::parse("SEMANA"), None);
    }

    #[test]
    fn test_category_normalized() {
        assert_eq!(Category::new("  robos "), Category::new("ROBOS"));
        assert_eq!(Category::new("amenazas").as_str(), "AMENAZAS");
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!(CategoryFilter::parse("All"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("todos"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(""), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse("homicidios"),
            CategoryFilter::Only(Category::new("HOMICIDIOS"))
        );
    }

    #[test]
    fn test_temporality_from_str() {
        assert_eq!("mensual".parse::<Temporality>(), Ok(Temporality::Monthly));
        assert_eq!("Weekly".parse::<Temporality>(), Ok(Temporality::Weekly));
        assert!("daily".parse::<Temporality>().is_err());
    }
}
