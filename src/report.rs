use crate::markdown;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

const DISCLAIMER_HEADER: &str = "\
====================================================================
MARKET RECAP REPORT
Generated by Market Research Platform
====================================================================";

const DISCLAIMER_FOOTER: &str = "\
====================================================================
DISCLAIMER: This report is generated from news articles and market
data for educational and informational purposes only. It does not
constitute investment advice, an offer, or a recommendation to buy
or sell any security. Verify all figures against primary sources.
====================================================================";

/// The last generated recap, owned by the app and handed by reference to the
/// download/copy/print actions. Overwritten on each new generation.
#[derive(Clone, Debug)]
pub struct ReportState {
    /// Raw report text as returned by the backend.
    pub markdown: String,
    /// The §-style HTML rendering used by the printable export.
    pub html: String,
    /// Server-supplied label, e.g. "Jun 08 - Jun 15, 2024".
    pub date_range: String,
    pub articles_count: u64,
    pub language: String,
    pub report_length: u32,
    pub generated_at: DateTime<Local>,
}

impl ReportState {
    pub fn new(result: crate::api::RecapResult, language: String, report_length: u32) -> Self {
        let html = markdown::to_html(&result.report);
        Self {
            markdown: result.report,
            html,
            date_range: result.date_range,
            articles_count: result.articles_count,
            language,
            report_length,
            generated_at: Local::now(),
        }
    }

    /// `market-recap-<date-range>.txt` with whitespace and commas stripped
    /// from the label.
    pub fn filename(&self) -> String {
        let label = sanitize_range_label(&self.date_range);
        let label = if label.is_empty() { "report".to_string() } else { label };
        format!("market-recap-{}.txt", label)
    }

    /// Plain text body: the HTML rendering stripped of tags, entities
    /// decoded, wrapped in the fixed disclaimer header/footer.
    pub fn plain_text(&self) -> String {
        let body = decode_entities(&strip_tags(&self.html));
        format!(
            "{}\nPeriod: {}\nArticles analyzed: {}\nLanguage: {}\n\n{}\n\n{}\n",
            DISCLAIMER_HEADER,
            self.date_range,
            self.articles_count,
            self.language,
            body.trim(),
            DISCLAIMER_FOOTER
        )
    }

    pub fn save_text(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.filename());
        std::fs::write(&path, self.plain_text())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(path)
    }

    /// Standalone HTML document, the print affordance of a terminal client.
    pub fn printable_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Market Recap {}</title>\n\
             <style>body{{font-family:Georgia,serif;max-width:48em;margin:2em auto;\
             line-height:1.5;}}h3{{margin-top:1.4em;}}</style>\n</head>\n<body>\n\
             <h2>Market Recap: {}</h2>\n{}\n<hr>\n<p><em>{} articles analyzed. \
             Generated {}. Educational use only. Not financial advice.</em></p>\n\
             </body>\n</html>\n",
            markdown::escape_html(&self.date_range),
            markdown::escape_html(&self.date_range),
            self.html,
            self.articles_count,
            self.generated_at.format("%Y-%m-%d %H:%M")
        )
    }

    pub fn save_printable(&self, dir: &Path) -> Result<PathBuf> {
        let mut filename = self.filename();
        filename.truncate(filename.len() - ".txt".len());
        let path = dir.join(format!("{}.html", filename));
        std::fs::write(&path, self.printable_html())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(path)
    }

    /// Copy the raw report text to the system clipboard.
    pub fn copy_to_clipboard(&self) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
        clipboard
            .set_text(self.markdown.clone())
            .context("Failed to copy report to clipboard")?;
        Ok(())
    }
}

fn sanitize_range_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect()
}

/// Remove HTML tags, turning `<br>` into newlines first so paragraph line
/// breaks survive.
fn strip_tags(html: &str) -> String {
    let html = html.replace("<br>", "\n");
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Decode the fixed entity set the HTML rendering can produce.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RecapResult;

    fn sample_report() -> ReportState {
        ReportState::new(
            RecapResult {
                report: "## Summary\n\nThe **S&P 500** gained.\n\n* one\n* two".to_string(),
                date_range: "Jun 08 - Jun 15, 2024".to_string(),
                articles_count: 42,
            },
            "English".to_string(),
            1200,
        )
    }

    #[test]
    fn test_filename_has_no_whitespace_or_commas() {
        let report = sample_report();
        let name = report.filename();
        assert_eq!(name, "market-recap-Jun08-Jun152024.txt");
        assert!(!name.contains(' ') && !name.contains(','));
    }

    #[test]
    fn test_filename_fallback_for_empty_label() {
        let mut report = sample_report();
        report.date_range.clear();
        assert_eq!(report.filename(), "market-recap-report.txt");
    }

    #[test]
    fn test_plain_text_strips_tags_and_decodes_entities() {
        let report = sample_report();
        let text = report.plain_text();
        assert!(text.contains("S&P 500"));
        assert!(!text.contains('<'));
        assert!(text.starts_with(DISCLAIMER_HEADER));
        assert!(text.trim_end().ends_with("===="));
        assert!(text.contains("Articles analyzed: 42"));
    }

    #[test]
    fn test_strip_tags_keeps_line_breaks() {
        assert_eq!(strip_tags("<p>a<br>b</p>\n"), "a\nb\n");
    }

    #[test]
    fn test_save_text_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let path = report.save_text(dir.path()).unwrap();
        assert!(path.ends_with("market-recap-Jun08-Jun152024.txt"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report.plain_text());
    }

    #[test]
    fn test_printable_html_is_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let path = report.save_printable(dir.path()).unwrap();
        assert!(path.ends_with("market-recap-Jun08-Jun152024.html"));
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h3>Summary</h3>"));
        assert!(html.contains("<strong>S&amp;P 500</strong>"));
    }
}
