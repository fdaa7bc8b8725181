//! Serializable chart descriptions for the three dashboard tabs.
//!
//! A [`ChartSpec`] is plain data: the front end picks a plotting library and
//! maps `kind`, `line_style` and the per-point `text` onto it. Every series
//! carries exactly one point per period (3 years, 12 months or `week_count`
//! weeks); periods without data are `None`, never dropped.

use crate::aggregate::RegionTables;
use crate::config::{RenderOptions, Theme};
use crate::metrics::projection;
use crate::types::{CategoryFilter, Temporality};
use crate::util::{format_int, week_start_label};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Actual,
    Projected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Point {
    pub label: String,
    pub value: Option<u64>,
    /// Hover / data label text, already formatted.
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub name: String,
    pub segment: Segment,
    pub line_style: LineStyle,
    pub color: String,
    /// Per-point colors for bar charts; empty for lines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub point_colors: Vec<String>,
    pub show_in_legend: bool,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub series: Vec<Series>,
}

fn point(label: String, value: Option<u64>) -> Point {
    let text = value.map(format_int);
    Point { label, value, text }
}

fn line(name: String, segment: Segment, color: &str, points: Vec<Point>) -> Series {
    Series {
        name,
        segment,
        line_style: match segment {
            Segment::Actual => LineStyle::Solid,
            Segment::Projected => LineStyle::Dashed,
        },
        color: color.to_string(),
        point_colors: Vec::new(),
        show_in_legend: true,
        points,
    }
}

pub fn build_series(
    temporality: Temporality,
    filter: &CategoryFilter,
    tables: &RegionTables,
    opts: &RenderOptions,
    theme: &Theme,
) -> ChartSpec {
    match temporality {
        Temporality::Annual => annual_chart(filter, tables, theme),
        Temporality::Monthly => monthly_chart(filter, tables, opts, theme),
        Temporality::Weekly => weekly_chart(filter, tables, theme),
    }
}

fn annual_chart(filter: &CategoryFilter, tables: &RegionTables, theme: &Theme) -> ChartSpec {
    let years = tables.annual.years();
    let totals = tables.annual.totals(filter);
    let points = years
        .iter()
        .zip(totals)
        .map(|(year, total)| point(year.to_string(), Some(total)))
        .collect();

    ChartSpec {
        kind: ChartKind::Bar,
        title: format!("Frecuencia Anual de {}", filter.title_name()),
        x_title: "Año".to_string(),
        y_title: "Frecuencia de Casos".to_string(),
        series: vec![Series {
            name: format!("Frecuencia ({})", filter.legend_name()),
            segment: Segment::Actual,
            line_style: LineStyle::Solid,
            color: theme.annual_bars[1].clone(),
            point_colors: theme.annual_bars.to_vec(),
            show_in_legend: false,
            points,
        }],
    }
}

/// Previous year in full, then the partial year split into a solid actual
/// segment and a dashed projected one. Both segments share the point at the
/// last reported month so the line is continuous.
fn monthly_chart(
    filter: &CategoryFilter,
    tables: &RegionTables,
    opts: &RenderOptions,
    theme: &Theme,
) -> ChartSpec {
    let [_, y1, y2] = tables.annual.years();
    let labels = tables.monthly.labels();
    let previous = tables.monthly.series_for(filter, y1);
    let current = tables.monthly.series_for(filter, y2);
    let proj = projection(&current, opts.default_month_index);
    let cut = proj.last_reported_index;

    let previous_points = labels
        .iter()
        .zip(&previous)
        .map(|(label, v)| point(label.clone(), Some(*v)))
        .collect();

    let actual_points = labels
        .iter()
        .enumerate()
        .map(|(i, label)| point(label.clone(), (i <= cut).then(|| current[i])))
        .collect();

    let projected_points = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let value = (i >= cut).then(|| proj.series[i]);
            Point {
                label: label.clone(),
                value,
                text: value.map(|v| format!("Proy: {}", format_int(v))),
            }
        })
        .collect();

    let mut actual = line(
        format!("Frecuencia {} (Datos reales)", y2),
        Segment::Actual,
        &theme.current_year_line,
        actual_points,
    );
    actual.show_in_legend = false;
    let mut projected = line(
        format!("Frecuencia {} (Proyección)", y2),
        Segment::Projected,
        &theme.projection_line,
        projected_points,
    );
    projected.show_in_legend = false;

    ChartSpec {
        kind: ChartKind::Line,
        title: format!(
            "Frecuencia Mensual de {} ({} vs. {} Proyectado)",
            filter.title_name(),
            y1,
            y2
        ),
        x_title: "Mes".to_string(),
        y_title: "Frecuencia de Casos".to_string(),
        series: vec![
            line(
                format!("Frecuencia {} ({})", y1, filter.legend_name()),
                Segment::Actual,
                &theme.previous_year_line,
                previous_points,
            ),
            actual,
            projected,
        ],
    }
}

fn weekly_chart(filter: &CategoryFilter, tables: &RegionTables, theme: &Theme) -> ChartSpec {
    let [_, y1, y2] = tables.annual.years();
    let weekly = &tables.weekly;

    let year_points = |year: i32| -> Vec<Point> {
        let values = weekly.series_for(filter, year);
        let reported = weekly.reported_len(year);
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let week = i + 1;
                let value = (i < reported).then_some(*v);
                let text = value.map(|v| match week_start_label(year, week as u32) {
                    Some(start) => format!("Semana {} ({}): {}", week, start, format_int(v)),
                    None => format!("Semana {}: {}", week, format_int(v)),
                });
                Point {
                    label: week.to_string(),
                    value,
                    text,
                }
            })
            .collect()
    };

    ChartSpec {
        kind: ChartKind::Line,
        title: format!(
            "Frecuencia Semanal de {} ({} vs. {})",
            filter.title_name(),
            y1,
            y2
        ),
        x_title: "Semana".to_string(),
        y_title: "Frecuencia de Casos".to_string(),
        series: vec![
            line(
                format!("Frecuencia Semanal {} ({})", y1, filter.legend_name()),
                Segment::Actual,
                &theme.previous_year_line,
                year_points(y1),
            ),
            line(
                format!("Frecuencia Semanal {} (a la fecha) ({})", y2, filter.legend_name()),
                Segment::Actual,
                &theme.current_year_line,
                year_points(y2),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::rec;
    use crate::types::MONTHS;

    fn tables() -> RegionTables {
        let mut records = Vec::new();
        for (i, month) in MONTHS.iter().enumerate() {
            records.push(rec("ROBOS", 2023, month, 50));
            records.push(rec("ROBOS", 2024, month, 100 + i as u64));
        }
        for month in &MONTHS[..7] {
            records.push(rec("ROBOS", 2025, month, 40));
        }
        records.push(rec("ROBOS", 2025, "Marzo", 20));
        records.push(rec("AMENAZAS", 2024, "1", 4));
        records.push(rec("AMENAZAS", 2024, "2", 6));
        records.push(rec("AMENAZAS", 2025, "1", 3));
        aggregate(&records).unwrap().tables
    }

    fn build(t: Temporality, filter: &CategoryFilter) -> ChartSpec {
        build_series(t, filter, &tables(), &RenderOptions::default(), &Theme::default())
    }

    #[test]
    fn test_annual_chart_three_bars() {
        let chart = build(Temporality::Annual, &CategoryFilter::All);
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.title, "Frecuencia Anual de Todos los Delitos");
        assert_eq!(chart.series.len(), 1);
        let values: Vec<Option<u64>> = chart.series[0].points.iter().map(|p| p.value).collect();
        // AMENAZAS only has weeks, which count towards its annual total.
        assert_eq!(values, vec![Some(600), Some(1276), Some(303)]);
        assert_eq!(chart.series[0].points[1].text.as_deref(), Some("1.276"));
        assert_eq!(chart.series[0].point_colors.len(), 3);
    }

    #[test]
    fn test_monthly_chart_fixed_length_segments() {
        let chart = build(Temporality::Monthly, &CategoryFilter::parse("robos"));
        assert_eq!(chart.series.len(), 3);
        for s in &chart.series {
            assert_eq!(s.points.len(), 12, "{}", s.name);
        }
        let actual = &chart.series[1];
        let projected = &chart.series[2];
        assert_eq!(actual.segment, Segment::Actual);
        assert_eq!(projected.line_style, LineStyle::Dashed);
        assert_eq!(actual.points[6].value, Some(40));
        assert_eq!(actual.points[7].value, None);
        assert_eq!(projected.points[5].value, None);
        // The segments meet at the last reported month.
        assert_eq!(projected.points[6].value, Some(40));
        // mean(40, 40, 60, 40, 40, 40, 40) = 42.86 -> 43
        assert_eq!(projected.points[11].value, Some(43));
        assert_eq!(projected.points[11].text.as_deref(), Some("Proy: 43"));
    }

    #[test]
    fn test_monthly_chart_title_names_years() {
        let chart = build(Temporality::Monthly, &CategoryFilter::All);
        assert_eq!(
            chart.title,
            "Frecuencia Mensual de Todos los Delitos (2024 vs. 2025 Proyectado)"
        );
        assert_eq!(chart.series[0].name, "Frecuencia 2024 (Total)");
    }

    #[test]
    fn test_weekly_chart_pads_unreported_weeks() {
        let chart = build(Temporality::Weekly, &CategoryFilter::parse("AMENAZAS"));
        assert_eq!(chart.series.len(), 2);
        for s in &chart.series {
            assert_eq!(s.points.len(), 52);
        }
        let current = &chart.series[1];
        assert_eq!(current.points[0].value, Some(3));
        assert!(current.points[1..].iter().all(|p| p.value.is_none()));
        assert_eq!(current.points[0].text.as_deref(), Some("Semana 1 (30/12): 3"));
        assert_eq!(chart.series[0].points[1].value, Some(6));
    }

    #[test]
    fn test_weekly_chart_missing_category_is_zero_not_gap() {
        let chart = build(Temporality::Weekly, &CategoryFilter::parse("ROBOS"));
        let previous = &chart.series[0];
        assert_eq!(previous.points.len(), 52);
        assert_eq!(previous.points[0].value, Some(0));
        assert_eq!(previous.points[1].value, Some(0));
        assert_eq!(previous.points[2].value, None);
    }

    #[test]
    fn test_chart_serializes_lowercase_enums() {
        let chart = build(Temporality::Monthly, &CategoryFilter::All);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["kind"], "line");
        assert_eq!(json["series"][2]["line_style"], "dashed");
        assert_eq!(json["series"][2]["segment"], "projected");
        assert!(json["series"][0].get("point_colors").is_none());
        assert!(json["series"][1]["points"][8]["value"].is_null());
    }
}
