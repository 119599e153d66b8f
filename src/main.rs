mod api;
mod app;
mod batch;
mod config;
mod format;
mod markdown;
mod report;
mod selection;
mod tui;
mod ui;

use api::ApiClient;
use app::{App, Tab};
use clap::Parser;
use std::io;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Terminal client for the Market Research Platform: weekly recap reports and market data",
    after_help = "EXAMPLES:
    # Interactive TUI against a local backend
    cargo run --release

    # Open straight on the market data tab
    cargo run --release -- --market

    # Headless: generate last week's recap and write the text file
    cargo run --release -- --recap

    # Headless with explicit window and language
    cargo run --release -- --recap --start-date 2024-06-08 --end-date 2024-06-15 --language Thai --html"
)]
struct Args {
    /// Backend base URL (default: MARKET_RECAP_SERVER env or http://127.0.0.1:5000)
    #[arg(long)]
    server: Option<String>,

    /// Start on the market data tab
    #[arg(long)]
    market: bool,

    /// Generate one recap report without entering the TUI
    #[arg(long)]
    recap: bool,

    /// Recap start date (YYYY-MM-DD, default: 7 days ago). Ignored without --recap.
    #[arg(long)]
    start_date: Option<String>,

    /// Recap end date (YYYY-MM-DD, default: today). Ignored without --recap.
    #[arg(long)]
    end_date: Option<String>,

    /// Report language (English, Thai, Simplified Chinese, Traditional Chinese, Vietnamese)
    #[arg(long, default_value = "English")]
    language: String,

    /// Analysis depth (standard | detailed | comprehensive)
    #[arg(long, default_value = "standard")]
    depth: String,

    /// Generation temperature (default: 0.7)
    #[arg(long)]
    temperature: Option<f64>,

    /// Target report length in words (default: 1200)
    #[arg(long)]
    report_length: Option<u32>,

    /// Also write the printable HTML document. Ignored without --recap.
    #[arg(long)]
    html: bool,

    /// Output directory for report files (default: MARKET_RECAP_OUTPUT_DIR env or cwd)
    #[arg(long)]
    output: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recap_tui=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let server = args.server.clone().unwrap_or_else(config::server_base_url);
    let client = match ApiClient::new(&server) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return Ok(());
        }
    };

    if args.recap {
        let job = batch::RecapJob {
            start_date: args.start_date,
            end_date: args.end_date,
            language: args.language,
            analysis_depth: args.depth,
            temperature: args.temperature.unwrap_or(config::DEFAULT_AI_TEMPERATURE),
            report_length: args.report_length.unwrap_or(config::DEFAULT_REPORT_LENGTH),
            write_html: args.html,
            output_dir: args.output,
        };
        if let Err(e) = batch::run_recap_once(&client, &job).await {
            error!("Recap generation failed: {:#}", e);
        }
        return Ok(());
    }

    let initial_tab = if args.market { Tab::Market } else { Tab::Recap };
    let mut terminal = tui::init()?;
    let mut app = App::new(client, initial_tab);
    let res = app.run(&mut terminal).await;

    tui::restore()?;

    if let Err(e) = res {
        error!("Error: {:?}", e);
    }

    Ok(())
}
