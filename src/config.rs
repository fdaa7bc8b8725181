use crate::error::ReportError;
use crate::types::Temporality;
use log::info;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_REGION: u32 = 13101;

/// A single headline number on the key-metrics panel, e.g. robberies with
/// violence in July of the partial year.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Highlight {
    pub title: String,
    pub category: String,
    pub temporality: Temporality,
    /// Month label or week number, parsed like an incident period.
    pub period: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Theme {
    pub annual_bars: [String; 3],
    pub previous_year_line: String,
    pub current_year_line: String,
    pub projection_line: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            annual_bars: [
                "rgba(30, 64, 175, 0.8)".to_string(),
                "rgba(59, 130, 246, 0.8)".to_string(),
                "rgba(96, 165, 250, 0.8)".to_string(),
            ],
            previous_year_line: "#454297".to_string(),
            current_year_line: "#10b981".to_string(),
            projection_line: "#f59e0b".to_string(),
        }
    }
}

/// Per-deployment settings. Every field has a default so a partial JSON
/// file (or none at all) is valid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub default_region: u32,
    /// Month index the projection cut starts from (6 = Julio).
    pub default_month_index: usize,
    /// Months of the partial year compared against the same months of the
    /// previous year.
    pub comparable_months: usize,
    pub cache_ttl_secs: u64,
    pub highlights: Vec<Highlight>,
    pub theme: Theme,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            default_region: DEFAULT_REGION,
            default_month_index: 6,
            comparable_months: 7,
            cache_ttl_secs: 3600,
            highlights: vec![
                Highlight {
                    title: "Robos con Violencia".to_string(),
                    category: "ROBOS CON VIOLENCIA O INTIMIDACIÓN".to_string(),
                    temporality: Temporality::Monthly,
                    period: "Julio".to_string(),
                },
                Highlight {
                    title: "Homicidios y Femicidios".to_string(),
                    category: "HOMICIDIOS Y FEMICIDIOS".to_string(),
                    temporality: Temporality::Weekly,
                    period: "12".to_string(),
                },
            ],
            theme: Theme::default(),
        }
    }
}

/// The slice of [`DashboardConfig`] the narrative and chart builders need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub default_month_index: usize,
    pub comparable_months: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions::from(&DashboardConfig::default())
    }
}

impl From<&DashboardConfig> for RenderOptions {
    fn from(config: &DashboardConfig) -> Self {
        RenderOptions {
            default_month_index: config.default_month_index,
            comparable_months: config.comparable_months,
        }
    }
}

impl DashboardConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::from(self)
    }

    pub fn from_json(s: &str) -> Result<Self, ReportError> {
        let config: DashboardConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let s = std::fs::read_to_string(path)?;
        let config = Self::from_json(&s)?;
        info!("loaded dashboard config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.default_month_index > 11 {
            return Err(ReportError::Config(format!(
                "default_month_index must be 0-11, got {}",
                self.default_month_index
            )));
        }
        if !(1..=12).contains(&self.comparable_months) {
            return Err(ReportError::Config(format!(
                "comparable_months must be 1-12, got {}",
                self.comparable_months
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.default_region, 13101);
        assert_eq!(config.default_month_index, 6);
        assert_eq!(config.comparable_months, 7);
        assert_eq!(config.highlights.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DashboardConfig::from_json(r#"{"default_region": 13114}"#).unwrap();
        assert_eq!(config.default_region, 13114);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.theme, Theme::default());
    }

    #[test]
    fn test_highlight_parses_temporality() {
        let json = r#"{"highlights": [{"title": "Amenazas", "category": "AMENAZAS",
                        "temporality": "mensual", "period": "Marzo"}]}"#;
        let config = DashboardConfig::from_json(json).unwrap();
        assert_eq!(config.highlights[0].temporality, Temporality::Monthly);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DashboardConfig::from_json(r#"{"default_month_index": 12}"#),
            Err(ReportError::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_json(r#"{"comparable_months": 0}"#),
            Err(ReportError::Config(_))
        ));
        assert!(matches!(DashboardConfig::from_json("{"), Err(ReportError::Json(_))));
    }
}
