//! KPI formatting helpers.
//!
//! Backend decimals occasionally coerce badly (strings, nulls) and end up as
//! NaN by the time they reach a tile. Every formatter here falls back to a
//! zero-valued string instead of rendering "NaN".

use chrono::{DateTime, Utc};

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// en-US grouped integer, e.g. `1234567.0` -> `"1,234,567"`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.round();
    let grouped = group_thousands(&format!("{}", rounded.abs() as i64));
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// USD with grouping and two decimals, e.g. `1234.5` -> `"$1,234.50"`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0.00".to_string();
    }
    let cents = (value.abs() * 100.0).round() as i64;
    let grouped = group_thousands(&(cents / 100).to_string());
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Values in (0, 1] are treated as ratios and scaled; values above 1 are
/// assumed to already be percentages.
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return "0.00%".to_string();
    }
    let pct = if value > 1.0 { value } else { value * 100.0 };
    format!("{:.2}%", pct)
}

/// Pipeline lag column: `Some(42)` -> `"42s"`, missing -> `"-"`.
pub fn format_lag(lag_seconds: Option<i64>) -> String {
    match lag_seconds {
        Some(s) => format!("{}s", s),
        None => "-".to_string(),
    }
}

/// Last-run column: `"Never"` until a run has been recorded.
pub fn format_last_run(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_percent_ratio() {
        assert_eq!(format_percent(0.1234), "12.34%");
        assert_eq!(format_percent(0.5), "50.00%");
        assert_eq!(format_percent(1.0), "100.00%");
    }

    #[test]
    fn test_format_percent_already_percentage() {
        assert_eq!(format_percent(45.0), "45.00%");
        assert_eq!(format_percent(99.999), "100.00%");
    }

    #[test]
    fn test_format_percent_nan_fallback() {
        assert_eq!(format_percent(f64::NAN), "0.00%");
        assert_eq!(format_percent(f64::INFINITY), "0.00%");
        assert_eq!(format_percent(f64::NEG_INFINITY), "0.00%");
    }

    #[test]
    fn test_format_percent_zero_and_negative() {
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(-0.05), "-5.00%");
    }

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(-1234.0), "-1,234");
    }

    #[test]
    fn test_format_number_rounds_and_defends() {
        assert_eq!(format_number(1234.6), "1,235");
        assert_eq!(format_number(f64::NAN), "0");
        assert_eq!(format_number(f64::INFINITY), "0");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-42.0), "-$42.00");
    }

    #[test]
    fn test_format_currency_nan_fallback() {
        assert_eq!(format_currency(f64::NAN), "$0.00");
        assert_eq!(format_currency(f64::NEG_INFINITY), "$0.00");
    }

    #[test]
    fn test_format_lag() {
        assert_eq!(format_lag(Some(42)), "42s");
        assert_eq!(format_lag(Some(0)), "0s");
        assert_eq!(format_lag(None), "-");
    }

    #[test]
    fn test_format_last_run() {
        assert_eq!(format_last_run(None), "Never");
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(format_last_run(Some(ts)), "2025-06-01 12:30:00");
    }
}
