use crate::api::{ApiClient, AssetCatalog, MarketSnapshot, RecapRequest, RecapResult};
use crate::config;
use crate::format;
use crate::report::ReportState;
use crate::selection::{Category, SelectionState, ToggleOutcome};
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Recap,
    Market,
}

impl Tab {
    pub fn title(self) -> &'static str {
        match self {
            Tab::Recap => "Market Recap",
            Tab::Market => "Market Data",
        }
    }

    pub fn all() -> &'static [Tab] {
        &[Tab::Recap, Tab::Market]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient banner. Expires after `config::ALERT_TTL` or on Delete.
#[derive(Clone, Debug)]
pub struct Alert {
    pub message: String,
    pub kind: AlertKind,
    pub created: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecapField {
    StartDate,
    EndDate,
    Language,
    Temperature,
    ReportLength,
    AnalysisDepth,
    IncludeSectors,
    IncludeCompliance,
    IncludeOutlook,
    IncludeReferences,
}

impl RecapField {
    pub fn all() -> &'static [RecapField] {
        &[
            RecapField::StartDate,
            RecapField::EndDate,
            RecapField::Language,
            RecapField::Temperature,
            RecapField::ReportLength,
            RecapField::AnalysisDepth,
            RecapField::IncludeSectors,
            RecapField::IncludeCompliance,
            RecapField::IncludeOutlook,
            RecapField::IncludeReferences,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            RecapField::StartDate => "Start date",
            RecapField::EndDate => "End date",
            RecapField::Language => "Language",
            RecapField::Temperature => "AI temperature",
            RecapField::ReportLength => "Report length",
            RecapField::AnalysisDepth => "Analysis depth",
            RecapField::IncludeSectors => "Include sector breakdown",
            RecapField::IncludeCompliance => "Include compliance notes",
            RecapField::IncludeOutlook => "Include outlook section",
            RecapField::IncludeReferences => "Include references",
        }
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            RecapField::StartDate
                | RecapField::EndDate
                | RecapField::Temperature
                | RecapField::ReportLength
        )
    }
}

/// The recap form. Text fields are free-form strings validated or
/// fallback-parsed at submit time, matching the original form behavior.
#[derive(Clone, Debug)]
pub struct RecapForm {
    pub start_date: String,
    pub end_date: String,
    pub language_idx: usize,
    pub temperature: String,
    pub report_length: String,
    pub depth_idx: usize,
    pub include_sectors: bool,
    pub include_compliance: bool,
    pub include_outlook: bool,
    pub include_references: bool,
}

impl RecapForm {
    fn with_default_dates() -> Self {
        let (start, end) = format::default_date_range(Local::now().date_naive());
        Self {
            start_date: format::format_date(start),
            end_date: format::format_date(end),
            language_idx: 0,
            temperature: config::DEFAULT_AI_TEMPERATURE.to_string(),
            report_length: config::DEFAULT_REPORT_LENGTH.to_string(),
            depth_idx: 0,
            include_sectors: true,
            include_compliance: true,
            include_outlook: true,
            include_references: true,
        }
    }

    pub fn language(&self) -> &'static str {
        config::SUPPORTED_LANGUAGES[self.language_idx % config::SUPPORTED_LANGUAGES.len()]
    }

    pub fn analysis_depth(&self) -> &'static str {
        config::ANALYSIS_DEPTHS[self.depth_idx % config::ANALYSIS_DEPTHS.len()]
    }

    /// Build the request body, or reject client-side before any network
    /// call. Numeric fields fall back to their defaults on parse failure.
    pub fn to_request(&self) -> Result<RecapRequest, String> {
        if self.start_date.trim().is_empty() || self.end_date.trim().is_empty() {
            return Err("Please select both start and end dates".to_string());
        }
        Ok(RecapRequest {
            start_date: self.start_date.trim().to_string(),
            end_date: self.end_date.trim().to_string(),
            language: self.language().to_string(),
            max_articles: config::MAX_ARTICLES,
            ai_temperature: self
                .temperature
                .trim()
                .parse()
                .unwrap_or(config::DEFAULT_AI_TEMPERATURE),
            report_length: self
                .report_length
                .trim()
                .parse()
                .unwrap_or(config::DEFAULT_REPORT_LENGTH),
            analysis_depth: self.analysis_depth().to_string(),
            include_sectors: self.include_sectors,
            include_compliance: self.include_compliance,
            include_outlook: self.include_outlook,
            include_references: self.include_references,
        })
    }
}

/// Results delivered by spawned fetch tasks.
#[derive(Debug)]
pub enum FetchEvent {
    Catalog(anyhow::Result<AssetCatalog>),
    Recap(anyhow::Result<RecapResult>),
    Market {
        seq: u64,
        result: anyhow::Result<MarketSnapshot>,
    },
}

pub struct App {
    pub should_quit: bool,
    pub tab: Tab,
    client: ApiClient,

    pub catalog: Option<AssetCatalog>,
    pub selection: SelectionState,
    /// Cursor into the flattened (category, asset) rows of the selection panel.
    pub cursor: usize,

    pub form: RecapForm,
    pub focus: RecapField,
    pub generating: bool,
    pub recap_error: Option<String>,
    pub report: Option<ReportState>,
    pub report_scroll: u16,
    /// Language and length of the in-flight request, applied to the report
    /// state when the response lands.
    pending_recap: Option<(String, u32)>,

    pub refreshing: bool,
    pub market: Option<MarketSnapshot>,
    pub market_error: Option<String>,
    /// Sequence number of the newest issued market-data request. Responses
    /// carrying an older number are stale and discarded.
    market_seq: u64,
    /// Set when the market tab opens before the catalog has arrived;
    /// consumed by the catalog-loaded event.
    pending_default_selection: bool,

    pub alerts: Vec<Alert>,

    events_tx: mpsc::UnboundedSender<FetchEvent>,
    events_rx: mpsc::UnboundedReceiver<FetchEvent>,
}

impl App {
    pub fn new(client: ApiClient, initial_tab: Tab) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            should_quit: false,
            tab: Tab::Recap,
            client,
            catalog: None,
            selection: SelectionState::new(),
            cursor: 0,
            form: RecapForm::with_default_dates(),
            focus: RecapField::StartDate,
            generating: false,
            recap_error: None,
            report: None,
            report_scroll: 0,
            pending_recap: None,
            refreshing: false,
            market: None,
            market_error: None,
            market_seq: 0,
            pending_default_selection: false,
            alerts: Vec::new(),
            events_tx,
            events_rx,
        };
        if initial_tab == Tab::Market {
            app.activate_market_tab();
        }
        app
    }

    pub async fn run(&mut self, terminal: &mut crate::tui::Tui) -> io::Result<()> {
        self.spawn_catalog_load();

        while !self.should_quit {
            self.alerts
                .retain(|a| a.created.elapsed() < config::ALERT_TTL);
            while let Ok(fetch) = self.events_rx.try_recv() {
                self.apply_fetch_event(fetch);
            }

            terminal.draw(|f| crate::ui::render(f, self))?;

            if event::poll(std::time::Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    // ── Background fetches ──────────────────────────────────────────────

    fn spawn_catalog_load(&self) {
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.available_assets().await;
            let _ = tx.send(FetchEvent::Catalog(result));
        });
    }

    fn submit_recap(&mut self) {
        if self.generating {
            return;
        }
        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(message) => {
                self.push_alert(message, AlertKind::Warning);
                return;
            }
        };
        self.generating = true;
        self.recap_error = None;
        self.pending_recap = Some((request.language.clone(), request.report_length));

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.generate_recap(&request).await;
            let _ = tx.send(FetchEvent::Recap(result));
        });
    }

    fn refresh_market_data(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.market_seq += 1;
        self.refreshing = true;

        let seq = self.market_seq;
        let client = self.client.clone();
        let selection = self.selection.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.market_data(&selection).await;
            let _ = tx.send(FetchEvent::Market { seq, result });
        });
    }

    pub fn apply_fetch_event(&mut self, fetch: FetchEvent) {
        match fetch {
            FetchEvent::Catalog(Ok(catalog)) => {
                self.catalog = Some(catalog);
                if self.pending_default_selection {
                    self.pending_default_selection = false;
                    self.apply_default_selection();
                }
            }
            FetchEvent::Catalog(Err(err)) => {
                warn!("Asset catalog load failed: {:#}", err);
                self.push_alert(
                    format!("Failed to load asset catalog: {}", err),
                    AlertKind::Error,
                );
            }
            FetchEvent::Recap(Ok(result)) => {
                self.generating = false;
                let (language, length) = self
                    .pending_recap
                    .take()
                    .unwrap_or_else(|| ("English".to_string(), config::DEFAULT_REPORT_LENGTH));
                self.push_alert(
                    format!(
                        "Report generated: {} articles, {} ({}, {} length)",
                        result.articles_count,
                        result.date_range,
                        language,
                        config::report_length_description(length)
                    ),
                    AlertKind::Success,
                );
                self.report = Some(ReportState::new(result, language, length));
                self.report_scroll = 0;
            }
            FetchEvent::Recap(Err(err)) => {
                self.generating = false;
                self.pending_recap = None;
                self.recap_error = Some(format!("{}", err));
                self.push_alert(format!("Report generation failed: {}", err), AlertKind::Error);
            }
            FetchEvent::Market { seq, result } => {
                if seq != self.market_seq {
                    debug!("Discarding stale market-data response (seq {} < {})", seq, self.market_seq);
                    return;
                }
                self.refreshing = false;
                match result {
                    Ok(snapshot) => {
                        self.market = Some(snapshot);
                        self.market_error = None;
                    }
                    Err(err) => {
                        self.market_error = Some(format!("{}", err));
                        self.push_alert(
                            format!("Market data fetch failed: {}", err),
                            AlertKind::Error,
                        );
                    }
                }
            }
        }
    }

    // ── Selection ───────────────────────────────────────────────────────

    /// Flattened (category, asset index) rows the cursor walks over.
    pub fn selectable_rows(&self) -> Vec<(Category, usize)> {
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        for &category in Category::all() {
            for i in 0..catalog.assets(category).len() {
                rows.push((category, i));
            }
        }
        rows
    }

    fn toggle_under_cursor(&mut self) {
        let rows = self.selectable_rows();
        let Some(&(category, index)) = rows.get(self.cursor) else {
            return;
        };
        let Some(symbol) = self
            .catalog
            .as_ref()
            .and_then(|c| c.assets(category).get(index))
            .map(|a| a.symbol.clone())
        else {
            return;
        };
        match self.selection.toggle(category, &symbol) {
            ToggleOutcome::RejectedFull => {
                self.push_alert(
                    format!(
                        "You can select up to {} {} symbols",
                        config::MAX_SELECTED_PER_CATEGORY,
                        category.title().to_lowercase()
                    ),
                    AlertKind::Warning,
                );
            }
            ToggleOutcome::Added | ToggleOutcome::Removed => {
                if self.tab == Tab::Market && !self.selection.is_empty() {
                    self.refresh_market_data();
                }
            }
        }
    }

    fn apply_default_selection(&mut self) {
        let Some(catalog) = &self.catalog else {
            return;
        };
        self.selection.select_defaults(catalog);
        if !self.selection.is_empty() {
            info!("Applied default selection: {} symbols", self.selection.total_selected());
            self.refresh_market_data();
        }
    }

    fn activate_market_tab(&mut self) {
        self.tab = Tab::Market;
        if self.selection.is_empty() {
            if self.catalog.is_some() {
                self.apply_default_selection();
            } else {
                self.pending_default_selection = true;
            }
        } else {
            self.refresh_market_data();
        }
    }

    // ── Input handling ──────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) {
        // shared keys first
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                match self.tab {
                    Tab::Recap => self.activate_market_tab(),
                    Tab::Market => self.tab = Tab::Recap,
                }
                return;
            }
            KeyCode::Delete => {
                self.alerts.pop();
                return;
            }
            _ => {}
        }

        match self.tab {
            Tab::Recap => self.handle_recap_key(key),
            Tab::Market => self.handle_market_key(key),
        }
    }

    fn handle_recap_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.download_report(),
                KeyCode::Char('p') => self.print_report(),
                KeyCode::Char('y') => self.copy_report(),
                KeyCode::Char('c') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Enter => self.submit_recap(),
            KeyCode::Up => self.focus_move(-1),
            KeyCode::Down => self.focus_move(1),
            KeyCode::PageUp => {
                self.report_scroll = self.report_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                self.report_scroll = self.report_scroll.saturating_add(5);
            }
            KeyCode::Left => self.cycle_field(-1),
            KeyCode::Right => self.cycle_field(1),
            KeyCode::Char(' ') if !self.focus.is_text() => self.cycle_field(1),
            KeyCode::Char(c) => self.edit_focused(Some(c)),
            KeyCode::Backspace => self.edit_focused(None),
            _ => {}
        }
    }

    fn handle_market_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                let max = self.selectable_rows().len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(max);
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_under_cursor(),
            KeyCode::Char('r') => {
                if self.selection.is_empty() {
                    self.push_alert(
                        "Select at least one asset to load market data".to_string(),
                        AlertKind::Info,
                    );
                } else {
                    self.refresh_market_data();
                }
            }
            _ => {}
        }
    }

    fn focus_move(&mut self, delta: isize) {
        let fields = RecapField::all();
        let pos = fields.iter().position(|&f| f == self.focus).unwrap_or(0) as isize;
        let next = (pos + delta).rem_euclid(fields.len() as isize) as usize;
        self.focus = fields[next];
    }

    fn cycle_field(&mut self, delta: isize) {
        match self.focus {
            RecapField::Language => {
                let n = config::SUPPORTED_LANGUAGES.len() as isize;
                self.form.language_idx =
                    ((self.form.language_idx as isize + delta).rem_euclid(n)) as usize;
            }
            RecapField::AnalysisDepth => {
                let n = config::ANALYSIS_DEPTHS.len() as isize;
                self.form.depth_idx =
                    ((self.form.depth_idx as isize + delta).rem_euclid(n)) as usize;
            }
            RecapField::ReportLength => {
                // snap the free-form field to the nearest preset in the cycle
                let current: u32 = self
                    .form
                    .report_length
                    .trim()
                    .parse()
                    .unwrap_or(config::DEFAULT_REPORT_LENGTH);
                let presets = config::REPORT_LENGTHS;
                let pos = presets.iter().position(|&l| l >= current).unwrap_or(0) as isize;
                let next = (pos + delta).rem_euclid(presets.len() as isize) as usize;
                self.form.report_length = presets[next].to_string();
            }
            RecapField::IncludeSectors => self.form.include_sectors = !self.form.include_sectors,
            RecapField::IncludeCompliance => {
                self.form.include_compliance = !self.form.include_compliance
            }
            RecapField::IncludeOutlook => self.form.include_outlook = !self.form.include_outlook,
            RecapField::IncludeReferences => {
                self.form.include_references = !self.form.include_references
            }
            _ => {}
        }
    }

    fn edit_focused(&mut self, ch: Option<char>) {
        let field = match self.focus {
            RecapField::StartDate => &mut self.form.start_date,
            RecapField::EndDate => &mut self.form.end_date,
            RecapField::Temperature => &mut self.form.temperature,
            RecapField::ReportLength => &mut self.form.report_length,
            _ => return,
        };
        match ch {
            Some(c) if c.is_ascii_digit() || c == '-' || c == '.' => field.push(c),
            Some(_) => {}
            None => {
                field.pop();
            }
        }
    }

    // ── Report actions ──────────────────────────────────────────────────

    fn download_report(&mut self) {
        let Some(report) = &self.report else {
            self.push_alert("No report to download yet".to_string(), AlertKind::Info);
            return;
        };
        match report.save_text(&config::output_dir()) {
            Ok(path) => {
                self.push_alert(format!("Report saved to {}", path.display()), AlertKind::Success)
            }
            Err(err) => self.push_alert(format!("{}", err), AlertKind::Error),
        }
    }

    fn print_report(&mut self) {
        let Some(report) = &self.report else {
            self.push_alert("No report to print yet".to_string(), AlertKind::Info);
            return;
        };
        match report.save_printable(&config::output_dir()) {
            Ok(path) => self.push_alert(
                format!("Printable report saved to {}", path.display()),
                AlertKind::Success,
            ),
            Err(err) => self.push_alert(format!("{}", err), AlertKind::Error),
        }
    }

    fn copy_report(&mut self) {
        let Some(report) = &self.report else {
            self.push_alert("No report to copy yet".to_string(), AlertKind::Info);
            return;
        };
        match report.copy_to_clipboard() {
            Ok(()) => self.push_alert("Report copied to clipboard".to_string(), AlertKind::Success),
            Err(err) => self.push_alert(format!("{}", err), AlertKind::Error),
        }
    }

    pub fn push_alert(&mut self, message: String, kind: AlertKind) {
        self.alerts.push(Alert {
            message,
            kind,
            created: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Asset, MarketData, MarketQuote};

    fn test_app() -> App {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        App::new(client, Tab::Recap)
    }

    fn catalog_with(symbols: &[&str]) -> AssetCatalog {
        AssetCatalog {
            stocks: symbols
                .iter()
                .map(|s| Asset {
                    symbol: s.to_string(),
                    name: s.to_string(),
                })
                .collect(),
            forex: vec![],
            indices: vec![],
        }
    }

    fn snapshot_with(symbol: &str) -> MarketSnapshot {
        MarketSnapshot {
            data: MarketData {
                stocks: vec![MarketQuote {
                    symbol: symbol.to_string(),
                    name: symbol.to_string(),
                    current_price: Some(100.0),
                    weekly_change: Some(1.0),
                    monthly_change: Some(2.0),
                    link: None,
                }],
                forex: vec![],
                indices: vec![],
            },
            last_updated: "2024-06-15 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_empty_start_date_rejected_before_any_request() {
        let mut form = RecapForm::with_default_dates();
        form.start_date.clear();
        assert!(form.to_request().is_err());
    }

    #[test]
    fn test_numeric_fields_fall_back_to_defaults() {
        let mut form = RecapForm::with_default_dates();
        form.temperature = "not a number".to_string();
        form.report_length = "".to_string();
        let request = form.to_request().unwrap();
        assert_eq!(request.ai_temperature, config::DEFAULT_AI_TEMPERATURE);
        assert_eq!(request.report_length, config::DEFAULT_REPORT_LENGTH);
        assert_eq!(request.max_articles, config::MAX_ARTICLES);
    }

    #[test]
    fn test_default_dates_span_seven_days() {
        let form = RecapForm::with_default_dates();
        let start: chrono::NaiveDate = form.start_date.parse().unwrap();
        let end: chrono::NaiveDate = form.end_date.parse().unwrap();
        assert_eq!(end - start, chrono::Duration::days(7));
    }

    #[tokio::test]
    async fn test_stale_market_response_discarded() {
        let mut app = test_app();
        app.catalog = Some(catalog_with(&["AAPL"]));
        app.selection.toggle(Category::Stocks, "AAPL");

        // two refreshes in flight; the older response must not win
        app.refresh_market_data();
        app.refresh_market_data();

        app.apply_fetch_event(FetchEvent::Market {
            seq: 1,
            result: Ok(snapshot_with("STALE")),
        });
        assert!(app.market.is_none());
        assert!(app.refreshing);

        app.apply_fetch_event(FetchEvent::Market {
            seq: 2,
            result: Ok(snapshot_with("AAPL")),
        });
        assert!(!app.refreshing);
        assert_eq!(app.market.as_ref().unwrap().data.stocks[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_catalog_arrival_consumes_pending_default_selection() {
        let mut app = test_app();
        app.pending_default_selection = true;
        app.apply_fetch_event(FetchEvent::Catalog(Ok(catalog_with(&[
            "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META",
        ]))));
        assert_eq!(app.selection.stocks.len(), 5);
        assert!(app.refreshing);
        assert!(!app.pending_default_selection);
    }

    #[tokio::test]
    async fn test_recap_success_stores_report_state() {
        let mut app = test_app();
        app.pending_recap = Some(("English".to_string(), 1200));
        app.generating = true;
        app.apply_fetch_event(FetchEvent::Recap(Ok(RecapResult {
            report: "## Summary\n\nBody".to_string(),
            date_range: "Jun 08 - Jun 15, 2024".to_string(),
            articles_count: 10,
        })));
        assert!(!app.generating);
        let report = app.report.as_ref().unwrap();
        assert_eq!(report.articles_count, 10);
        assert!(report.html.contains("<h3>Summary</h3>"));
        assert!(app.alerts.iter().any(|a| a.kind == AlertKind::Success));
    }

    #[tokio::test]
    async fn test_recap_failure_sets_inline_error_and_clears_busy() {
        let mut app = test_app();
        app.generating = true;
        app.apply_fetch_event(FetchEvent::Recap(Err(anyhow::anyhow!(
            "No articles found for the selected date range"
        ))));
        assert!(!app.generating);
        assert!(
            app.recap_error
                .as_deref()
                .unwrap()
                .contains("No articles found")
        );
    }

    #[test]
    fn test_selectable_rows_follow_catalog_order() {
        let mut app = test_app();
        assert!(app.selectable_rows().is_empty());
        app.catalog = Some(catalog_with(&["AAPL", "MSFT"]));
        let rows = app.selectable_rows();
        assert_eq!(rows, vec![(Category::Stocks, 0), (Category::Stocks, 1)]);
    }
}
