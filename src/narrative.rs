//! Spanish summary paragraphs for the dashboard.
//!
//! Output is lightly decorated HTML (`<strong>`, `<br>`, `<ul>`), ready to be
//! dropped into an analysis card. Every number comes from [`crate::metrics`]
//! so text, charts and cards agree.

use crate::aggregate::{PeriodTable, RegionTables};
use crate::config::RenderOptions;
use crate::metrics::{
    extreme_variations, peak_and_trough, percent_change, period_variations, projection,
    quarterly_average, same_period_change, PeakTrough, Quarter, MONTH_QUARTERS, WEEK_QUARTERS,
};
use crate::types::{CategoryFilter, Temporality, MONTHS};
use crate::util::{format_decimal1, format_int, format_pct_abs, format_pct_signed};

fn direction(change: f64, up: &'static str, down: &'static str) -> &'static str {
    if change > 0.0 {
        up
    } else {
        down
    }
}

fn comparable_span(opts: &RenderOptions) -> usize {
    opts.comparable_months.clamp(1, MONTHS.len())
}

/// Analysis paragraph for one tab of the dashboard.
pub fn describe(
    temporality: Temporality,
    filter: &CategoryFilter,
    tables: &RegionTables,
    opts: &RenderOptions,
) -> String {
    match temporality {
        Temporality::Annual => describe_annual(filter, tables, opts),
        Temporality::Monthly => describe_monthly(filter, tables, opts),
        Temporality::Weekly => describe_weekly(filter, tables),
    }
}

fn describe_annual(filter: &CategoryFilter, tables: &RegionTables, opts: &RenderOptions) -> String {
    let [y0, y1, y2] = tables.annual.years();
    let [t0, t1, t2] = tables.annual.totals(filter);
    let span = comparable_span(opts);

    let mut text = format!("Análisis Anual para <strong>{}</strong>:<br><br>", filter.display_name());
    text += &format!(
        "En {}, se registraron <strong>{}</strong> casos. Para {}, la cifra fue de <strong>{}</strong> casos. \
         Hasta la fecha en {}, se han reportado <strong>{}</strong> casos.<br><br>",
        y0,
        format_int(t0),
        y1,
        format_int(t1),
        y2,
        format_int(t2)
    );

    match percent_change(t0 as f64, t1 as f64) {
        Some(change) => {
            text += &format!(
                "Se observó {} del <strong>{}</strong> entre {} y {}. ",
                direction(change, "un incremento", "una disminución"),
                format_pct_abs(change),
                y0,
                y1
            );
        }
        None => {
            text += &format!("No hay datos suficientes para calcular la tendencia entre {} y {}. ", y0, y1);
        }
    }

    // The partial year is only compared over the months it covers.
    let previous = tables.monthly.series_for(filter, y1);
    let current = tables.monthly.series_for(filter, y2);
    match same_period_change(&previous, &current, span) {
        Some(change) => {
            text += &format!(
                "Entre {} y {} (a la fecha, Enero a {}), se registró {} del <strong>{}</strong>.",
                y1,
                y2,
                MONTHS[span - 1],
                direction(change, "un aumento", "una disminución"),
                format_pct_abs(change)
            );
        }
        None => {
            text += &format!(
                "No hay datos suficientes para comparar {} (a la fecha) con el mismo período de {}.",
                y2, y1
            );
        }
    }
    text
}

fn describe_monthly(filter: &CategoryFilter, tables: &RegionTables, opts: &RenderOptions) -> String {
    let [_, y1, y2] = tables.annual.years();
    let span = comparable_span(opts);
    let previous = tables.monthly.series_for(filter, y1);
    let current = tables.monthly.series_for(filter, y2);

    let mut text = format!("Análisis Mensual para <strong>{}</strong>:<br><br>", filter.display_name());
    text += &format!(
        "Comparativa entre {} y {} (hasta <strong>{}</strong>):<br>",
        y1,
        y2,
        MONTHS[span - 1]
    );

    match same_period_change(&previous, &current, span) {
        Some(change) => {
            text += &format!(
                "Se observa {} del <strong>{}</strong> en {} respecto al mismo período de {}.<br>",
                direction(change, "un incremento", "una disminución"),
                format_pct_abs(change),
                y2,
                y1
            );
        }
        None => {
            text += &format!(
                "No hay datos suficientes para comparar {} con el mismo período de {}.<br>",
                y2, y1
            );
        }
    }

    match peak_and_trough(&previous, &MONTHS).filter(|_| previous.iter().sum::<u64>() > 0) {
        Some(pt) => {
            text += &format!(
                "En {}, el mes con mayor frecuencia fue <strong>{}</strong> (<strong>{}</strong> casos), \
                 y el de menor fue <strong>{}</strong> (<strong>{}</strong> casos).<br>",
                y1,
                pt.peak_label,
                format_int(pt.peak_value),
                pt.trough_label,
                format_int(pt.trough_value)
            );
        }
        None => text += &format!("No hay datos disponibles para {}.<br>", y1),
    }

    let proj = projection(&current, opts.default_month_index);
    let actual = &current[..=proj.last_reported_index];
    match peak_and_trough(actual, &MONTHS).filter(|_| actual.iter().sum::<u64>() > 0) {
        Some(pt) => {
            text += &format!(
                "Hasta el momento en {}, el mes de mayor incidencia fue <strong>{}</strong> (<strong>{}</strong> casos), \
                 y el de menor fue <strong>{}</strong> (<strong>{}</strong> casos).<br><br>",
                y2,
                pt.peak_label,
                format_int(pt.peak_value),
                pt.trough_label,
                format_int(pt.trough_value)
            );
            if let Some(next_month) = MONTHS.get(proj.last_reported_index + 1) {
                text += &format!(
                    "La proyección para los meses restantes de {} (a partir de <strong>{}</strong>) es de \
                     aproximadamente <strong>{}</strong> casos por mes, con base en el promedio de los meses \
                     ya reportados de {}.",
                    y2,
                    next_month,
                    format_int(proj.fill),
                    y2
                );
            }
        }
        None => text += &format!("No hay datos disponibles para {}.", y2),
    }
    text
}

/// Peak/trough over the reported prefix of a weekly series; `None` when the
/// prefix holds no incidents.
fn weekly_extremes(table: &PeriodTable, series: &[u64], year: i32) -> Option<PeakTrough> {
    let reported = &series[..table.reported_len(year).min(series.len())];
    if reported.iter().sum::<u64>() == 0 {
        return None;
    }
    let labels: Vec<usize> = (1..=reported.len()).collect();
    peak_and_trough(reported, &labels)
}

fn describe_weekly(filter: &CategoryFilter, tables: &RegionTables) -> String {
    let [_, y1, y2] = tables.annual.years();
    let weekly = &tables.weekly;
    let previous = weekly.series_for(filter, y1);
    let current = weekly.series_for(filter, y2);

    let mut text = format!("Análisis Semanal para <strong>{}</strong>:<br><br>", filter.display_name());
    text += &format!("Análisis de las semanas disponibles en {} y {}:<br>", y1, y2);

    let span = weekly.reported_len(y2);
    match same_period_change(&previous, &current, span) {
        Some(change) => {
            text += &format!(
                "Se observa {} del <strong>{}</strong> en {} respecto a las mismas semanas de {}.<br>",
                direction(change, "un incremento", "una disminución"),
                format_pct_abs(change),
                y2,
                y1
            );
        }
        None => {
            text += &format!(
                "No hay datos suficientes para comparar {} con las mismas semanas de {}.<br>",
                y2, y1
            );
        }
    }

    match weekly_extremes(weekly, &previous, y1) {
        Some(pt) => {
            text += &format!(
                "En las semanas disponibles de {}, el pico se alcanzó en la <strong>Semana {}</strong> \
                 (<strong>{}</strong> casos) y el punto más bajo en la <strong>Semana {}</strong> \
                 (<strong>{}</strong> casos).<br>",
                y1,
                pt.peak_label,
                format_int(pt.peak_value),
                pt.trough_label,
                format_int(pt.trough_value)
            );
        }
        None => text += &format!("No hay datos disponibles para {}.<br>", y1),
    }

    match weekly_extremes(weekly, &current, y2) {
        Some(pt) => {
            text += &format!(
                "Para {}, en las semanas con datos, la semana con más casos fue la <strong>Semana {}</strong> \
                 (<strong>{}</strong> casos) y la de menor fue la <strong>Semana {}</strong> \
                 (<strong>{}</strong> casos).",
                y2,
                pt.peak_label,
                format_int(pt.peak_value),
                pt.trough_label,
                format_int(pt.trough_value)
            );
        }
        None => text += &format!("No hay datos disponibles para {}.", y2),
    }
    text
}

/// Region-wide trend sentence for the general-analysis card.
pub fn general_trend(tables: &RegionTables, opts: &RenderOptions) -> String {
    let [y0, y1, y2] = tables.annual.years();
    let [t0, t1, _] = tables.annual.totals(&CategoryFilter::All);
    let span = comparable_span(opts);

    let mut text = match percent_change(t0 as f64, t1 as f64) {
        Some(change) => format!(
            "Se observó {} general del {} entre {} y {}. ",
            direction(change, "un incremento", "un descenso"),
            format_pct_abs(change),
            y0,
            y1
        ),
        None => format!("No hay datos suficientes para calcular la tendencia entre {} y {}. ", y0, y1),
    };

    let previous = tables.monthly.series_for(&CategoryFilter::All, y1);
    let current = tables.monthly.series_for(&CategoryFilter::All, y2);
    match same_period_change(&previous, &current, span) {
        Some(change) => {
            text += &format!(
                "Para el periodo de {} (a la fecha) en comparación con el mismo periodo de {}, se registra {} del {}.",
                y2,
                y1,
                direction(change, "un aumento", "una disminución"),
                format_pct_abs(change)
            );
        }
        None => {
            text += &format!(
                "No hay datos suficientes para comparar {} (a la fecha) con el mismo periodo de {}.",
                y2, y1
            );
        }
    }
    text
}

fn quarter_lines(
    previous: &[u64],
    current: &[u64],
    quarters: &[Quarter],
    unit: &str,
    years: (i32, i32),
) -> String {
    let prev_avg = quarterly_average(previous, quarters);
    let curr_avg = quarterly_average(current, quarters);
    let (y1, y2) = years;
    let mut out = String::new();
    for (p, c) in prev_avg.iter().zip(&curr_avg) {
        let line = match (p.average, c.average) {
            (None, None) => continue,
            (Some(a), Some(b)) => {
                let change = percent_change(a, b).map_or_else(|| "(N/A)".to_string(), |v| format!("({})", format_pct_signed(v)));
                format!(
                    "{}: {} casos/{}, {}: {} casos/{} {}",
                    y1,
                    format_decimal1(a),
                    unit,
                    y2,
                    format_decimal1(b),
                    unit,
                    change
                )
            }
            (Some(a), None) => format!("{}: {} casos/{}, {}: Sin datos", y1, format_decimal1(a), unit, y2),
            (None, Some(b)) => format!("{}: Sin datos, {}: {} casos/{}", y1, y2, format_decimal1(b), unit),
        };
        out += &format!("<p><strong>{}:</strong> {}</p>", p.name, line);
    }
    out
}

fn extremes_list(title_high: &str, title_low: &str, year: i32, high: (&str, u64), low: (&str, u64), suffix: (&str, &str)) -> String {
    format!(
        "<ul><li><strong>{} ({}):</strong> {} con {} casos{}</li>\
         <li><strong>{} ({}):</strong> {} con {} casos{}</li></ul>",
        title_high,
        year,
        high.0,
        format_int(high.1),
        suffix.0,
        title_low,
        year,
        low.0,
        format_int(low.1),
        suffix.1
    )
}

fn variation_list(previous: &[u64], current: &[u64], labels: &[String], span: usize, empty: &str) -> String {
    let variations = period_variations(previous, current, labels, span);
    match extreme_variations(&variations) {
        // Both extremes share a sign when every period moved the same way.
        Some((up, down)) => format!(
            "<ul><li><strong>Mayor aumento:</strong> {} con {} del {}</li>\
             <li><strong>Mayor disminución:</strong> {} con {} del {}</li></ul>",
            up.label,
            direction(up.change, "un incremento", "una disminución"),
            format_pct_abs(up.change),
            down.label,
            direction(down.change, "un incremento", "una reducción"),
            format_pct_abs(down.change)
        ),
        None => format!("<p>{}</p>", empty),
    }
}

/// Detailed monthly card: busiest and quietest months, largest month-on-month
/// changes over the comparable months and the quarter comparison.
pub fn monthly_detail(filter: &CategoryFilter, tables: &RegionTables, opts: &RenderOptions) -> String {
    let [_, y1, y2] = tables.annual.years();
    let span = comparable_span(opts);
    let labels = tables.monthly.labels();
    let previous = tables.monthly.series_for(filter, y1);
    let current = tables.monthly.series_for(filter, y2);

    let mut out = String::new();
    match peak_and_trough(&previous, &labels).filter(|_| previous.iter().sum::<u64>() > 0) {
        Some(pt) => {
            out += &extremes_list(
                "Mes con mayor delincuencia",
                "Mes con menor delincuencia",
                y1,
                (pt.peak_label.as_str(), pt.peak_value),
                (pt.trough_label.as_str(), pt.trough_value),
                ("", ""),
            )
        }
        None => out += &format!("<p>No hay datos disponibles para {}.</p>", y1),
    }

    // Same cut as the monthly chart and narrative; `span` only aligns the
    // month-on-month variations.
    let cut = projection(&current, opts.default_month_index).last_reported_index;
    let reported = &current[..=cut];
    match peak_and_trough(reported, &labels).filter(|_| reported.iter().sum::<u64>() > 0) {
        Some(pt) => {
            out += &extremes_list(
                "Mes con mayor delincuencia",
                "Mes con menor delincuencia",
                y2,
                (pt.peak_label.as_str(), pt.peak_value),
                (pt.trough_label.as_str(), pt.trough_value),
                ("", ""),
            )
        }
        None => out += &format!("<p>No hay datos disponibles para {}.</p>", y2),
    }

    out += &variation_list(
        &previous,
        &current,
        &labels,
        span,
        "No se pudo calcular la variación porcentual para los meses comparables.",
    );

    out += "<p><strong>Comparación por trimestre (promedio mensual):</strong></p>";
    out += &quarter_lines(&previous, reported, &MONTH_QUARTERS, "mes", (y1, y2));
    out
}

/// Detailed weekly card, over the weeks actually reported in each year.
pub fn weekly_detail(filter: &CategoryFilter, tables: &RegionTables) -> String {
    let [_, y1, y2] = tables.annual.years();
    let weekly = &tables.weekly;
    let previous = weekly.series_for(filter, y1);
    let current = weekly.series_for(filter, y2);
    let prev_reported = &previous[..weekly.reported_len(y1).min(previous.len())];
    let curr_reported = &current[..weekly.reported_len(y2).min(current.len())];

    let mut out = String::new();
    for (year, series) in [(y1, &previous), (y2, &current)] {
        match weekly_extremes(weekly, series, year) {
            Some(pt) => {
                let peak = format!("Semana {}", pt.peak_label);
                let trough = format!("Semana {}", pt.trough_label);
                out += &extremes_list(
                    "Peor semana",
                    "Mejor semana",
                    year,
                    (peak.as_str(), pt.peak_value),
                    (trough.as_str(), pt.trough_value),
                    (" (mayor incidencia delictiva)", " (menor incidencia delictiva)"),
                )
            }
            None => out += &format!("<p>No hay datos disponibles para {}.</p>", year),
        }
    }

    let common = prev_reported.len().min(curr_reported.len());
    if common == 0 {
        out += &format!("<p>No hay semanas comparables entre {} y {}.</p>", y1, y2);
    } else {
        out += &variation_list(
            &previous,
            &current,
            &weekly.labels(),
            common,
            "No se pudo calcular la variación porcentual para las semanas comparables.",
        );
    }

    out += "<p><strong>Comparación por trimestre (promedio semanal):</strong></p>";
    out += &quarter_lines(prev_reported, curr_reported, &WEEK_QUARTERS, "semana", (y1, y2));
    out
}

/// The "Dato Clave" note: where real data stops and the dashed projection
/// starts, using the same cut as the monthly chart.
pub fn key_fact(tables: &RegionTables, opts: &RenderOptions) -> String {
    let y2 = tables.annual.partial_year();
    let current = tables.monthly.series_for(&CategoryFilter::All, y2);
    let proj = projection(&current, opts.default_month_index);
    let last_month = MONTHS[proj.last_reported_index];
    let last_week = tables.weekly.reported_len(y2);

    let mut text = format!(
        "Las cifras reales de {} están disponibles hasta {} para la vista mensual",
        y2,
        last_month.to_lowercase()
    );
    if last_week > 0 {
        text += &format!(" y hasta la Semana {} para la semanal", last_week);
    }
    text += ". ";
    if proj.last_reported_index + 1 < MONTHS.len() {
        text += &format!(
            "Los valores posteriores a {} en el gráfico mensual de {} son <strong>proyecciones</strong> \
             basadas en el promedio de los meses ya reportados de {}, y se visualizan con una \
             <strong>línea segmentada</strong>.",
            last_month.to_lowercase(),
            y2,
            y2
        );
    }
    text
}
