use crate::aggregate::AnnualTable;
use crate::error::ReportError;
use crate::types::MetricCard;
use log::info;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!("wrote {}", path.display());
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<(), ReportError> {
    std::fs::write(path, text)?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Header plus one row per category; the year columns are named after the
/// table's own years, the last one marked as partial.
pub fn annual_table_records(table: &AnnualTable) -> Vec<Vec<String>> {
    let [y0, y1, y2] = table.years();
    let mut records = vec![vec![
        "Delito".to_string(),
        format!("Frecuencia {}", y0),
        format!("Frecuencia {}", y1),
        format!("Frecuencia {} (a la fecha)", y2),
    ]];
    for (category, row) in table.rows() {
        let mut record = vec![category.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        records.push(record);
    }
    records
}

pub fn write_annual_table(path: &Path, table: &AnnualTable) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    let records = annual_table_records(table);
    for record in &records {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    info!("wrote {} categories to {}", records.len() - 1, path.display());
    Ok(())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn preview_cards(title: &str, cards: &[MetricCard]) {
    preview_table(title, None, cards, cards.len());
}

/// Markdown rendering of the first `max_rows` categories of the annual table.
pub fn annual_preview(table: &AnnualTable, max_rows: usize) -> String {
    let mut builder = Builder::default();
    for record in annual_table_records(table).into_iter().take(max_rows + 1) {
        builder.push_record(record);
    }
    builder.build().with(Style::markdown()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::rec;

    fn table() -> AnnualTable {
        let records = vec![
            rec("ROBOS", 2024, "Enero", 1200),
            rec("AMENAZAS", 2025, "Marzo", 4),
        ];
        aggregate(&records).unwrap().tables.annual
    }

    #[test]
    fn test_annual_table_records_dynamic_headers() {
        let records = annual_table_records(&table());
        assert_eq!(
            records[0],
            vec!["Delito", "Frecuencia 2023", "Frecuencia 2024", "Frecuencia 2025 (a la fecha)"]
        );
        assert_eq!(records[1], vec!["AMENAZAS", "0", "0", "4"]);
        assert_eq!(records[2], vec!["ROBOS", "0", "1200", "0"]);
    }

    #[test]
    fn test_write_annual_table() {
        let path = std::env::temp_dir().join(format!("comuna_report_annual_{}.csv", std::process::id()));
        write_annual_table(&path, &table()).unwrap();
        let s = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let mut lines = s.lines();
        assert_eq!(
            lines.next(),
            Some("Delito,Frecuencia 2023,Frecuencia 2024,Frecuencia 2025 (a la fecha)")
        );
        assert_eq!(lines.next(), Some("AMENAZAS,0,0,4"));
    }

    #[test]
    fn test_annual_preview_limits_rows() {
        let preview = annual_preview(&table(), 1);
        assert!(preview.contains("AMENAZAS"));
        assert!(!preview.contains("ROBOS"));
        assert!(preview.contains("Frecuencia 2024"));
    }
}
