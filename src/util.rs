// Parsing and formatting helpers.
//
// The CSV side is hand-maintained, so parsing is forgiving (thousands
// separators, stray spaces) and returns `None` instead of failing. The
// formatting side produces the Chilean conventions used in every rendered
// string: `.` groups thousands, percentages keep one decimal.
use chrono::{NaiveDate, Weekday};
use num_format::{Locale, ToFormattedString};

/// Parse a non-negative count such as `1234`, `1.234` or `1,234`.
///
/// Counts are whole numbers, so both `.` and `,` are treated as grouping
/// separators. Anything with letters or a sign is rejected.
pub fn parse_u64_safe(s: Option<&str>) -> Option<u64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s: String = s.chars().filter(|c| !matches!(c, '.' | ',' | ' ')).collect();
    s.parse::<u64>().ok()
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

pub fn parse_u32_safe(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<u32>().ok()
}

/// Round half to even (`2.5 -> 2`, `3.5 -> 4`), the rounding the published
/// projections were computed with.
pub fn round_half_even(x: f64) -> f64 {
    x.round_ties_even()
}

/// Integer with Chilean thousands grouping, e.g. `12.345`.
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // German grouping is the same as Chilean: `.` for thousands.
    n.to_formatted_string(&Locale::de)
}

/// `20.0%` style, absolute value with one decimal.
pub fn format_pct_abs(v: f64) -> String {
    format!("{:.1}%", v.abs())
}

/// `+20.0%` / `-3.5%` style.
pub fn format_pct_signed(v: f64) -> String {
    format!("{:+.1}%", v)
}

pub fn format_decimal1(v: f64) -> String {
    format!("{:.1}", v)
}

/// Monday of the given ISO week as `dd/mm`, used in weekly hover texts.
pub fn week_start_label(year: i32, week: u32) -> Option<String> {
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
    Some(monday.format("%d/%m").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_safe() {
        assert_eq!(parse_u64_safe(Some("1234")), Some(1234));
        assert_eq!(parse_u64_safe(Some(" 1.234 ")), Some(1234));
        assert_eq!(parse_u64_safe(Some("1,234")), Some(1234));
        assert_eq!(parse_u64_safe(Some("0")), Some(0));
        assert_eq!(parse_u64_safe(Some("-3")), None);
        assert_eq!(parse_u64_safe(Some("n/a")), None);
        assert_eq!(parse_u64_safe(Some("")), None);
        assert_eq!(parse_u64_safe(None), None);
    }

    #[test]
    fn test_parse_i32_safe() {
        assert_eq!(parse_i32_safe(Some("2024")), Some(2024));
        assert_eq!(parse_i32_safe(Some("20x4")), None);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(3.5), 4.0);
        assert_eq!(round_half_even(14.6), 15.0);
    }

    #[test]
    fn test_format_int_chilean_grouping() {
        assert_eq!(format_int(1234567u64), "1.234.567");
        assert_eq!(format_int(999u64), "999");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct_abs(-12.345), "12.3%");
        assert_eq!(format_pct_abs(20.0), "20.0%");
        assert_eq!(format_pct_signed(20.0), "+20.0%");
        assert_eq!(format_pct_signed(-3.5), "-3.5%");
    }

    #[test]
    fn test_week_start_label() {
        // ISO week 12 of 2025 starts on Monday 17 March.
        assert_eq!(week_start_label(2025, 12), Some("17/03".to_string()));
        assert_eq!(week_start_label(2025, 60), None);
    }
}
