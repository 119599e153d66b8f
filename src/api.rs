use crate::selection::{Category, SelectionState};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One tradable instrument from the catalog. Immutable once loaded.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
}

/// Response body of `GET /api/available-assets`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AssetCatalog {
    #[serde(default)]
    pub stocks: Vec<Asset>,
    #[serde(default)]
    pub forex: Vec<Asset>,
    #[serde(default)]
    pub indices: Vec<Asset>,
}

impl AssetCatalog {
    pub fn assets(&self, category: Category) -> &[Asset] {
        match category {
            Category::Stocks => &self.stocks,
            Category::Forex => &self.forex,
            Category::Indices => &self.indices,
        }
    }
}

/// Request body of `POST /api/generate-recap`. Built fresh per submission.
#[derive(Clone, Debug, Serialize)]
pub struct RecapRequest {
    pub start_date: String,
    pub end_date: String,
    pub language: String,
    pub max_articles: u32,
    pub ai_temperature: f64,
    pub report_length: u32,
    pub analysis_depth: String,
    pub include_sectors: bool,
    pub include_compliance: bool,
    pub include_outlook: bool,
    pub include_references: bool,
}

#[derive(Clone, Debug, Deserialize)]
struct RecapResponse {
    success: bool,
    report: Option<String>,
    date_range: Option<String>,
    articles_count: Option<u64>,
    error: Option<String>,
}

/// Successful recap generation.
#[derive(Clone, Debug)]
pub struct RecapResult {
    pub report: String,
    pub date_range: String,
    pub articles_count: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub weekly_change: Option<f64>,
    pub monthly_change: Option<f64>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub stocks: Vec<MarketQuote>,
    #[serde(default)]
    pub forex: Vec<MarketQuote>,
    #[serde(default)]
    pub indices: Vec<MarketQuote>,
}

impl MarketData {
    pub fn quotes(&self, category: Category) -> &[MarketQuote] {
        match category {
            Category::Stocks => &self.stocks,
            Category::Forex => &self.forex,
            Category::Indices => &self.indices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty() && self.forex.is_empty() && self.indices.is_empty()
    }
}

#[derive(Clone, Debug, Deserialize)]
struct MarketDataResponse {
    success: bool,
    data: Option<MarketData>,
    last_updated: Option<String>,
    error: Option<String>,
}

/// Successful market-data snapshot.
#[derive(Clone, Debug)]
pub struct MarketSnapshot {
    pub data: MarketData,
    pub last_updated: String,
}

/// Thin client over the three backend endpoints. Cheap to clone; the inner
/// reqwest client is reference-counted.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(crate::config::http_timeout())
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the asset catalog. Issued once at startup; no retry.
    pub async fn available_assets(&self) -> Result<AssetCatalog> {
        let catalog = self
            .client
            .get(self.endpoint("/api/available-assets"))
            .send()
            .await?
            .error_for_status()?
            .json::<AssetCatalog>()
            .await?;
        info!(
            "Loaded asset catalog: {} stocks, {} forex, {} indices",
            catalog.stocks.len(),
            catalog.forex.len(),
            catalog.indices.len()
        );
        Ok(catalog)
    }

    /// Generate a recap report. A `success:false` body becomes an error
    /// carrying the server-supplied message.
    pub async fn generate_recap(&self, request: &RecapRequest) -> Result<RecapResult> {
        info!(
            "Requesting recap {} .. {} ({})",
            request.start_date, request.end_date, request.language
        );
        let response = self
            .client
            .post(self.endpoint("/api/generate-recap"))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<RecapResponse>()
            .await?;

        if !response.success {
            return Err(anyhow::anyhow!(
                response
                    .error
                    .unwrap_or_else(|| "Report generation failed".to_string())
            ));
        }
        Ok(RecapResult {
            report: response
                .report
                .ok_or_else(|| anyhow::anyhow!("Server returned success without a report body"))?,
            date_range: response.date_range.unwrap_or_default(),
            articles_count: response.articles_count.unwrap_or(0),
        })
    }

    /// Fetch quotes for the current selection.
    pub async fn market_data(&self, selection: &SelectionState) -> Result<MarketSnapshot> {
        let response = self
            .client
            .post(self.endpoint("/api/market-data"))
            .json(selection)
            .send()
            .await?
            .error_for_status()?
            .json::<MarketDataResponse>()
            .await?;

        if !response.success {
            return Err(anyhow::anyhow!(
                response
                    .error
                    .unwrap_or_else(|| "Market data fetch failed".to_string())
            ));
        }
        Ok(MarketSnapshot {
            data: response.data.unwrap_or_default(),
            last_updated: response.last_updated.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recap_request_wire_shape() {
        let request = RecapRequest {
            start_date: "2024-06-08".to_string(),
            end_date: "2024-06-15".to_string(),
            language: "English".to_string(),
            max_articles: crate::config::MAX_ARTICLES,
            ai_temperature: 0.7,
            report_length: 1200,
            analysis_depth: "standard".to_string(),
            include_sectors: true,
            include_compliance: false,
            include_outlook: true,
            include_references: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["start_date"], "2024-06-08");
        assert_eq!(json["max_articles"], 200);
        assert_eq!(json["include_compliance"], false);
    }

    #[test]
    fn test_recap_response_failure_body() {
        let body = r#"{"success": false, "error": "No articles found for the selected date range"}"#;
        let parsed: RecapResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
        assert_eq!(
            parsed.error.as_deref(),
            Some("No articles found for the selected date range")
        );
        assert!(parsed.report.is_none());
    }

    #[test]
    fn test_market_data_response_with_null_price() {
        let body = r#"{
            "success": true,
            "data": {
                "stocks": [
                    {"symbol": "AAPL", "name": "Apple Inc.", "current_price": null,
                     "weekly_change": 1.23, "monthly_change": -0.5,
                     "link": "https://finance.yahoo.com/quote/AAPL"}
                ],
                "forex": [],
                "indices": []
            },
            "last_updated": "2024-06-15 10:30:00"
        }"#;
        let parsed: MarketDataResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        let data = parsed.data.unwrap();
        assert_eq!(data.stocks.len(), 1);
        assert!(data.stocks[0].current_price.is_none());
        assert_eq!(data.stocks[0].weekly_change, Some(1.23));
    }
}
