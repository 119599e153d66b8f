use std::time::Duration;

/// Hard cap on selected symbols per category. The backend renders one table
/// per category and the recap prompt budget assumes at most 5 symbols each.
pub const MAX_SELECTED_PER_CATEGORY: usize = 5;

/// Fixed article budget sent with every recap request.
pub const MAX_ARTICLES: u32 = 200;

pub const DEFAULT_AI_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_REPORT_LENGTH: u32 = 1200;
/// Default recap window in days (end = today, start = today - 7).
pub const DEFAULT_RANGE_DAYS: i64 = 7;

/// Transient alert banners disappear after this long unless dismissed.
pub const ALERT_TTL: Duration = Duration::from_secs(5);

/// Languages the backend's translator supports, English first.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "English",
    "Thai",
    "Simplified Chinese",
    "Traditional Chinese",
    "Vietnamese",
];

/// Analysis depth options accepted by the report generator.
pub const ANALYSIS_DEPTHS: &[&str] = &["standard", "detailed", "comprehensive"];

/// Report length presets cycled by the form selector.
pub const REPORT_LENGTHS: &[u32] = &[800, 1200, 2000];

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

pub fn server_base_url() -> String {
    std::env::var("MARKET_RECAP_SERVER")
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string())
}

pub fn http_timeout() -> Duration {
    let secs = std::env::var("MARKET_RECAP_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|v| v.clamp(5, 600))
        .unwrap_or(120);
    Duration::from_secs(secs)
}

/// Directory downloaded reports are written to. Defaults to the current
/// working directory.
pub fn output_dir() -> std::path::PathBuf {
    std::env::var("MARKET_RECAP_OUTPUT_DIR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}

/// Human label for a report length, shown in the success banner.
pub fn report_length_description(length: u32) -> &'static str {
    if length <= 900 {
        "concise"
    } else if length <= 1500 {
        "standard"
    } else {
        "extended"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_length_descriptions() {
        assert_eq!(report_length_description(800), "concise");
        assert_eq!(report_length_description(1200), "standard");
        assert_eq!(report_length_description(2000), "extended");
    }

    #[test]
    fn test_language_list_starts_with_english() {
        assert_eq!(SUPPORTED_LANGUAGES[0], "English");
    }
}
