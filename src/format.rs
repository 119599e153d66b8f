use chrono::{Duration, NaiveDate};

/// Currency-format a price with thousands separators, "N/A" when the backend
/// had no quote for the symbol.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${}", group_thousands(p)),
        None => "N/A".to_string(),
    }
}

/// Sign-prefixed percentage with two decimals, "N/A" when missing.
pub fn format_percentage(change: Option<f64>) -> String {
    match change {
        Some(c) => format!("{:+.2}%", c),
        None => "N/A".to_string(),
    }
}

fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Default recap window: end = today, start = today - 7 days.
pub fn default_date_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(crate::config::DEFAULT_RANGE_DAYS), today)
}

/// YYYY-MM-DD with zero-padded month and day, the shape the backend parses.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_missing() {
        assert_eq!(format_price(None), "N/A");
    }

    #[test]
    fn test_format_price_groups_thousands() {
        assert_eq!(format_price(Some(1234.5)), "$1,234.50");
        assert_eq!(format_price(Some(0.9876)), "$0.99");
        assert_eq!(format_price(Some(1_234_567.891)), "$1,234,567.89");
        assert_eq!(format_price(Some(999.0)), "$999.00");
    }

    #[test]
    fn test_format_percentage_signs() {
        assert_eq!(format_percentage(Some(-3.456)), "-3.46%");
        assert_eq!(format_percentage(Some(3.2)), "+3.20%");
        assert_eq!(format_percentage(Some(0.0)), "+0.00%");
        assert_eq!(format_percentage(None), "N/A");
    }

    #[test]
    fn test_default_date_range_is_seven_days() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let (start, end) = default_date_range(today);
        assert_eq!(format_date(start), "2024-06-08");
        assert_eq!(format_date(end), "2024-06-15");
    }

    #[test]
    fn test_format_date_zero_pads() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(format_date(d), "2024-01-03");
    }
}
