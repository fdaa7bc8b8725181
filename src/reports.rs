use crate::aggregate::RegionTables;
use crate::config::{Highlight, RenderOptions};
use crate::metrics::{category_extremes, peak_and_trough, percent_change, projection, same_period_change};
use crate::narrative::general_trend;
use crate::types::{Category, CategoryFilter, MetricCard, PeriodKey, SummaryStats, Temporality, MONTHS};
use crate::util::{format_int, format_pct_abs};

fn card(title: String, value: String) -> MetricCard {
    MetricCard {
        title,
        value,
        tone: String::new(),
    }
}

/// Percent-change card: green for a decrease, red for an increase or when
/// the change cannot be computed.
fn change_card(title: String, change: Option<f64>) -> MetricCard {
    let tone = match change {
        Some(c) if c < 0.0 => "green",
        _ => "red",
    };
    MetricCard {
        title,
        value: change.map_or_else(|| "N/A".to_string(), format_pct_abs),
        tone: tone.to_string(),
    }
}

/// Period name shown next to a highlight, e.g. `Julio` or `Semana 12`.
pub fn highlight_period_label(h: &Highlight) -> String {
    match PeriodKey::parse(&h.period) {
        Some(PeriodKey::Month(idx)) => MONTHS[idx].to_string(),
        Some(PeriodKey::Week(week)) => format!("Semana {}", week),
        None => h.period.trim().to_string(),
    }
}

/// Count for a highlighted category and period in the partial year. `None`
/// when the period does not fit the highlight's temporality.
pub fn highlight_value(tables: &RegionTables, h: &Highlight) -> Option<u64> {
    let category = Category::new(&h.category);
    let year = tables.annual.partial_year();
    match (h.temporality, PeriodKey::parse(&h.period)) {
        (Temporality::Annual, _) => Some(tables.annual.row(&category)[2]),
        (Temporality::Monthly, Some(PeriodKey::Month(idx))) => {
            tables.monthly.series(&category, year).get(idx).copied()
        }
        (Temporality::Weekly, Some(PeriodKey::Week(week))) => {
            // Week 53 of a 52-week table reads as zero, like any missing bucket.
            Some(tables.weekly.series(&category, year).get(week - 1).copied().unwrap_or(0))
        }
        _ => None,
    }
}

fn most_frequent_value(tables: &RegionTables, slot: usize) -> String {
    match category_extremes(&tables.annual, slot) {
        Some((most, _)) => format!("<strong>{}</strong><br>({})", most.category, format_int(most.total)),
        None => "N/A".to_string(),
    }
}

/// Key-metrics panel: totals, most frequent category, the two headline
/// changes and one card per configured highlight.
pub fn generate_key_metrics(
    tables: &RegionTables,
    opts: &RenderOptions,
    highlights: &[Highlight],
) -> Vec<MetricCard> {
    let [y0, y1, y2] = tables.annual.years();
    let [t0, t1, t2] = tables.annual.totals(&CategoryFilter::All);
    let previous = tables.monthly.series_for(&CategoryFilter::All, y1);
    let current = tables.monthly.series_for(&CategoryFilter::All, y2);
    let span = opts.comparable_months.clamp(1, MONTHS.len());

    let mut cards = vec![
        card(format!("Total Casos {}", y1), format_int(t1)),
        card(format!("Total Casos {} (a la fecha)", y2), format_int(t2)),
        card(format!("Delito Más Frecuente ({})", y1), most_frequent_value(tables, 1)),
        card(
            format!("Delito Más Frecuente ({} a la fecha)", y2),
            most_frequent_value(tables, 2),
        ),
        change_card(
            format!("Variación % ({} vs Mismo Periodo {})", y2, y1),
            same_period_change(&previous, &current, span),
        ),
        change_card(
            format!("Variación % Total ({} vs {})", y1, y0),
            percent_change(t0 as f64, t1 as f64),
        ),
    ];

    for h in highlights {
        let value = highlight_value(tables, h).map_or_else(|| "N/A".to_string(), format_int);
        cards.push(card(
            format!("{} ({} {})", h.title, highlight_period_label(h), y2),
            value,
        ));
    }
    cards
}

/// General-analysis panel: annual totals, trend text, most and least
/// frequent category, monthly patterns and the highlighted partial-year
/// figures.
pub fn generate_general_analysis(
    tables: &RegionTables,
    opts: &RenderOptions,
    highlights: &[Highlight],
) -> Vec<MetricCard> {
    let [y0, y1, y2] = tables.annual.years();
    let [t0, t1, t2] = tables.annual.totals(&CategoryFilter::All);
    let mut cards = Vec::new();

    cards.push(card(
        "Cifras Anuales Totales".to_string(),
        format!(
            "<p><strong>{}:</strong> {} casos</p><p><strong>{}:</strong> {} casos</p>\
             <p><strong>{} (a la fecha):</strong> {} casos</p>",
            y0,
            format_int(t0),
            y1,
            format_int(t1),
            y2,
            format_int(t2)
        ),
    ));

    cards.push(card("Tendencia General Anual".to_string(), general_trend(tables, opts)));

    let frequency = match category_extremes(&tables.annual, 1) {
        Some((most, least)) => format!(
            "<p><strong>Más frecuente:</strong> {} ({} casos)</p>\
             <p><strong>Menos frecuente:</strong> {} ({} casos)</p>",
            most.category,
            format_int(most.total),
            least.category,
            format_int(least.total)
        ),
        None => "N/A".to_string(),
    };
    cards.push(card(format!("Delitos Más y Menos Frecuentes ({})", y1), frequency));

    let previous = tables.monthly.series_for(&CategoryFilter::All, y1);
    let current = tables.monthly.series_for(&CategoryFilter::All, y2);
    let mut patterns = String::new();
    if let Some(pt) = peak_and_trough(&previous, &MONTHS).filter(|_| previous.iter().sum::<u64>() > 0) {
        patterns += &format!(
            "<p><strong>{} - Mayor frecuencia:</strong> {} ({} casos)</p>\
             <p><strong>{} - Menor frecuencia:</strong> {} ({} casos)</p>",
            y1,
            pt.peak_label,
            format_int(pt.peak_value),
            y1,
            pt.trough_label,
            format_int(pt.trough_value)
        );
    }
    let cut = projection(&current, opts.default_month_index).last_reported_index;
    let reported = &current[..=cut];
    if let Some(pt) = peak_and_trough(reported, &MONTHS).filter(|_| reported.iter().sum::<u64>() > 0) {
        let through = MONTHS[cut].to_lowercase();
        patterns += &format!(
            "<p><strong>{} (hasta {}) - Mayor frecuencia:</strong> {} ({} casos)</p>\
             <p><strong>{} (hasta {}) - Menor frecuencia:</strong> {} ({} casos)</p>",
            y2,
            through,
            pt.peak_label,
            format_int(pt.peak_value),
            y2,
            through,
            pt.trough_label,
            format_int(pt.trough_value)
        );
    }
    if patterns.is_empty() {
        patterns = "N/A".to_string();
    }
    cards.push(card("Patrones Mensuales (Frecuencia Total)".to_string(), patterns));

    if !highlights.is_empty() {
        let lines: String = highlights
            .iter()
            .map(|h| {
                let value = highlight_value(tables, h).map_or_else(|| "N/A".to_string(), format_int);
                format!(
                    "<p><strong>{} ({}):</strong> {} casos</p>",
                    h.title,
                    highlight_period_label(h),
                    value
                )
            })
            .collect();
        cards.push(card(format!("Datos Específicos de {}", y2), lines));
    }
    cards
}

pub fn generate_summary(
    tables: &RegionTables,
    region_id: u32,
    region_name: &str,
    skipped_records: usize,
    opts: &RenderOptions,
) -> SummaryStats {
    let years = tables.annual.years();
    let totals = tables.annual.totals(&CategoryFilter::All);
    let previous = tables.monthly.series_for(&CategoryFilter::All, years[1]);
    let current = tables.monthly.series_for(&CategoryFilter::All, years[2]);
    SummaryStats {
        region_id,
        region_name: region_name.to_string(),
        generated_at: chrono::Local::now(),
        years,
        totals,
        total_categories: tables.annual.categories().count(),
        change_previous_year: percent_change(totals[0] as f64, totals[1] as f64),
        change_partial_same_period: same_period_change(
            &previous,
            &current,
            opts.comparable_months.clamp(1, MONTHS.len()),
        ),
        skipped_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::rec;
    use crate::config::DashboardConfig;

    fn tables() -> RegionTables {
        let records = vec![
            rec("ROBOS CON VIOLENCIA O INTIMIDACIÓN", 2023, "Enero", 100),
            rec("ROBOS CON VIOLENCIA O INTIMIDACIÓN", 2024, "Enero", 80),
            rec("ROBOS CON VIOLENCIA O INTIMIDACIÓN", 2024, "Julio", 40),
            rec("ROBOS CON VIOLENCIA O INTIMIDACIÓN", 2025, "Enero", 90),
            rec("ROBOS CON VIOLENCIA O INTIMIDACIÓN", 2025, "Julio", 7),
            rec("AMENAZAS", 2023, "Marzo", 20),
            rec("AMENAZAS", 2024, "Marzo", 10),
            rec("HOMICIDIOS Y FEMICIDIOS", 2025, "12", 2),
        ];
        aggregate(&records).unwrap().tables
    }

    fn find<'a>(cards: &'a [MetricCard], prefix: &str) -> &'a MetricCard {
        cards
            .iter()
            .find(|c| c.title.starts_with(prefix))
            .unwrap_or_else(|| panic!("no card starting with {}", prefix))
    }

    #[test]
    fn test_key_metrics_totals_and_changes() {
        let config = DashboardConfig::default();
        let cards = generate_key_metrics(&tables(), &config.render_options(), &config.highlights);
        assert_eq!(find(&cards, "Total Casos 2024").value, "130");
        assert_eq!(find(&cards, "Total Casos 2025").value, "99");
        // 120 -> 130
        let total = find(&cards, "Variación % Total (2024 vs 2023)");
        assert_eq!(total.value, "8.3%");
        assert_eq!(total.tone, "red");
        // Enero-Julio: 130 -> 97
        let partial = find(&cards, "Variación % (2025 vs Mismo Periodo 2024)");
        assert_eq!(partial.value, "25.4%");
        assert_eq!(partial.tone, "green");
    }

    #[test]
    fn test_key_metrics_most_frequent() {
        let config = DashboardConfig::default();
        let cards = generate_key_metrics(&tables(), &config.render_options(), &config.highlights);
        assert_eq!(
            find(&cards, "Delito Más Frecuente (2024)").value,
            "<strong>ROBOS CON VIOLENCIA O INTIMIDACIÓN</strong><br>(120)"
        );
    }

    #[test]
    fn test_key_metrics_highlights() {
        let config = DashboardConfig::default();
        let cards = generate_key_metrics(&tables(), &config.render_options(), &config.highlights);
        assert_eq!(find(&cards, "Robos con Violencia (Julio 2025)").value, "7");
        assert_eq!(find(&cards, "Homicidios y Femicidios (Semana 12 2025)").value, "2");
    }

    #[test]
    fn test_change_card_without_base_is_na() {
        let c = change_card("x".to_string(), None);
        assert_eq!(c.value, "N/A");
        assert_eq!(c.tone, "red");
    }

    #[test]
    fn test_highlight_period_mismatch() {
        let h = Highlight {
            title: "Amenazas".to_string(),
            category: "AMENAZAS".to_string(),
            temporality: Temporality::Monthly,
            period: "12".to_string(),
        };
        assert_eq!(highlight_value(&tables(), &h), None);
        assert_eq!(highlight_period_label(&h), "Semana 12");
    }

    #[test]
    fn test_general_analysis_cards() {
        let config = DashboardConfig::default();
        let cards = generate_general_analysis(&tables(), &config.render_options(), &config.highlights);
        assert_eq!(cards.len(), 5);
        let freq = find(&cards, "Delitos Más y Menos Frecuentes (2024)");
        assert!(freq.value.contains("Más frecuente:</strong> ROBOS CON VIOLENCIA O INTIMIDACIÓN (120 casos)"));
        assert!(freq.value.contains("Menos frecuente:</strong> HOMICIDIOS Y FEMICIDIOS (0 casos)"));
        let patterns = find(&cards, "Patrones Mensuales");
        assert!(patterns.value.contains("2024 - Mayor frecuencia:</strong> Enero (80 casos)"), "{}", patterns.value);
        assert!(patterns.value.contains("2025 (hasta julio) - Menor frecuencia:</strong> Febrero (0 casos)"), "{}", patterns.value);
        let specific = find(&cards, "Datos Específicos de 2025");
        assert!(specific.value.contains("Homicidios y Femicidios (Semana 12):</strong> 2 casos"));
    }

    #[test]
    fn test_summary() {
        let s = generate_summary(&tables(), 13101, "Santiago", 3, &RenderOptions::default());
        assert_eq!(s.years, [2023, 2024, 2025]);
        assert_eq!(s.totals, [120, 130, 99]);
        assert_eq!(s.total_categories, 3);
        assert_eq!(s.skipped_records, 3);
        assert!(s.change_previous_year.is_some());
    }
}
