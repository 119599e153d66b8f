use crate::api::{ApiClient, RecapRequest};
use crate::config;
use crate::format;
use crate::report::ReportState;
use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::{info, warn};

/// Parameters for a one-shot recap generation outside the TUI.
pub struct RecapJob {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub language: String,
    pub analysis_depth: String,
    pub temperature: f64,
    pub report_length: u32,
    pub write_html: bool,
    pub output_dir: Option<PathBuf>,
}

impl RecapJob {
    fn to_request(&self) -> RecapRequest {
        let (default_start, default_end) = format::default_date_range(Local::now().date_naive());
        let language = if config::SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            self.language.clone()
        } else {
            warn!(
                "Unsupported language {:?}; falling back to English. Supported: {}",
                self.language,
                config::SUPPORTED_LANGUAGES.join(", ")
            );
            "English".to_string()
        };
        let analysis_depth = if config::ANALYSIS_DEPTHS.contains(&self.analysis_depth.as_str()) {
            self.analysis_depth.clone()
        } else {
            warn!("Unknown analysis depth {:?}; using standard", self.analysis_depth);
            "standard".to_string()
        };

        RecapRequest {
            start_date: self
                .start_date
                .clone()
                .unwrap_or_else(|| format::format_date(default_start)),
            end_date: self
                .end_date
                .clone()
                .unwrap_or_else(|| format::format_date(default_end)),
            language,
            max_articles: config::MAX_ARTICLES,
            ai_temperature: self.temperature,
            report_length: self.report_length,
            analysis_depth,
            include_sectors: true,
            include_compliance: true,
            include_outlook: true,
            include_references: true,
        }
    }
}

/// Generate one recap and write the downloadable text file (and optionally
/// the printable HTML document). Returns the text file path.
pub async fn run_recap_once(client: &ApiClient, job: &RecapJob) -> Result<PathBuf> {
    let request = job.to_request();
    info!(
        "Generating recap {} .. {} against {}",
        request.start_date,
        request.end_date,
        client.base_url()
    );

    let language = request.language.clone();
    let report_length = request.report_length;
    let result = client.generate_recap(&request).await?;
    info!(
        "Report ready: {} articles for {}",
        result.articles_count, result.date_range
    );

    let report = ReportState::new(result, language, report_length);
    let dir = job.output_dir.clone().unwrap_or_else(config::output_dir);
    let path = report.save_text(&dir)?;
    println!("Report written to {}", path.display());

    if job.write_html {
        let html_path = report.save_printable(&dir)?;
        println!("Printable report written to {}", html_path.display());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> RecapJob {
        RecapJob {
            start_date: None,
            end_date: None,
            language: "English".to_string(),
            analysis_depth: "standard".to_string(),
            temperature: config::DEFAULT_AI_TEMPERATURE,
            report_length: config::DEFAULT_REPORT_LENGTH,
            write_html: false,
            output_dir: None,
        }
    }

    #[test]
    fn test_missing_dates_default_to_last_seven_days() {
        let request = job().to_request();
        let start: chrono::NaiveDate = request.start_date.parse().unwrap();
        let end: chrono::NaiveDate = request.end_date.parse().unwrap();
        assert_eq!(end - start, chrono::Duration::days(config::DEFAULT_RANGE_DAYS));
    }

    #[test]
    fn test_unsupported_language_falls_back_to_english() {
        let mut j = job();
        j.language = "Klingon".to_string();
        assert_eq!(j.to_request().language, "English");
    }

    #[test]
    fn test_explicit_dates_pass_through() {
        let mut j = job();
        j.start_date = Some("2024-06-08".to_string());
        j.end_date = Some("2024-06-15".to_string());
        let request = j.to_request();
        assert_eq!(request.start_date, "2024-06-08");
        assert_eq!(request.end_date, "2024-06-15");
        assert_eq!(request.max_articles, config::MAX_ARTICLES);
    }
}
