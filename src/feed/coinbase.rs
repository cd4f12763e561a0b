//! REST ticker poller for Coinbase-style exchange APIs.

use super::{FeedError, PriceFeed};
use crate::domain::{Decimal, PriceTick, Symbol, TimeMs};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct TickerResponse {
    pub price: Option<String>,
    pub time: Option<String>,
}

/// Polls `GET {base_url}/products/{product}/ticker`.
#[derive(Debug, Clone)]
pub struct CoinbaseFeed {
    client: Client,
    base_url: String,
    retry_budget: Duration,
}

impl CoinbaseFeed {
    pub const DEFAULT_URL: &'static str = "https://api.exchange.coinbase.com";

    /// `request_timeout` bounds each HTTP request; retries on 429/5xx stop
    /// once the same budget has elapsed.
    pub fn new(base_url: String, request_timeout: Duration) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent("paper-desk/0.1")
            .build()
            .map_err(|e| FeedError::Other(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_budget: request_timeout,
        })
    }

    async fn get_ticker(&self, product: &str) -> Result<TickerResponse, FeedError> {
        let url = format!("{}/products/{}/ticker", self.base_url, product);
        let backoff = ExponentialBackoff {
            current_interval: Duration::from_millis(100),
            initial_interval: Duration::from_millis(100),
            max_elapsed_time: Some(self.retry_budget),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                if e.is_timeout() {
                    backoff::Error::permanent(FeedError::Timeout)
                } else {
                    backoff::Error::transient(FeedError::NetworkError(e.to_string()))
                }
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(FeedError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(FeedError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(FeedError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<TickerResponse>()
                .await
                .map_err(|e| backoff::Error::permanent(FeedError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl PriceFeed for CoinbaseFeed {
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Option<PriceTick>, FeedError> {
        let product = product_id(symbol);
        debug!("Fetching ticker for product={}", product);
        let ticker = self.get_ticker(&product).await?;
        parse_ticker(symbol, &ticker)
    }
}

/// Coinbase product ids use '-' between base and quote.
pub fn product_id(symbol: &Symbol) -> String {
    symbol.as_str().replace('/', "-")
}

/// Convert a ticker body into a tick. A missing price means no update.
pub fn parse_ticker(
    symbol: &Symbol,
    ticker: &TickerResponse,
) -> Result<Option<PriceTick>, FeedError> {
    let Some(raw_price) = ticker.price.as_deref() else {
        return Ok(None);
    };
    let price = Decimal::from_str_canonical(raw_price)
        .map_err(|e| FeedError::ParseError(format!("price {:?}: {}", raw_price, e)))?;
    if !price.is_positive() {
        return Err(FeedError::ParseError(format!(
            "non-positive price {}",
            price
        )));
    }

    let time_ms = ticker
        .time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|dt| TimeMs::new(dt.timestamp_millis()))
        .unwrap_or_else(TimeMs::now);

    Ok(Some(PriceTick::new(symbol.clone(), time_ms, price)))
}
