//! Broker credentials and venue selection.

use crate::error::{BrokerError, BrokerResult};

const LIVE_TRADING_URL: &str = "https://api.alpaca.markets";
const PAPER_TRADING_URL: &str = "https://paper-api.alpaca.markets";
const MARKET_DATA_URL: &str = "https://data.alpaca.markets";

const API_KEY_VAR: &str = "ALPACA_API_KEY";
const SECRET_KEY_VAR: &str = "ALPACA_SECRET_KEY";
const PAPER_TRADE_VAR: &str = "ALPACA_PAPER_TRADE";

/// Credentials and trading-mode flag for the brokerage API.
///
/// Constructed once at startup and passed into the client; nothing
/// reads the environment after that.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub api_key: String,
    pub secret_key: String,
    /// Route orders to the paper-trading venue instead of the live one.
    pub paper: bool,
    trading_url: Option<String>,
    data_url: Option<String>,
}

impl BrokerConfig {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>, paper: bool) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            paper,
            trading_url: None,
            data_url: None,
        }
    }

    /// Load configuration from the environment.
    ///
    /// Both credential variables are required; a missing or empty one is
    /// a startup failure, not a per-call error. Paper trading defaults
    /// to on unless `ALPACA_PAPER_TRADE` is set to something other than
    /// "true".
    pub fn from_env() -> BrokerResult<Self> {
        let api_key = require_env(API_KEY_VAR)?;
        let secret_key = require_env(SECRET_KEY_VAR)?;
        let paper = std::env::var(PAPER_TRADE_VAR)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        Ok(Self::new(api_key, secret_key, paper))
    }

    /// Override the trading API base URL (tests point this at a mock).
    pub fn with_trading_url(mut self, url: impl Into<String>) -> Self {
        self.trading_url = Some(url.into());
        self
    }

    /// Override the market-data API base URL.
    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = Some(url.into());
        self
    }

    pub fn trading_url(&self) -> &str {
        self.trading_url.as_deref().unwrap_or(if self.paper {
            PAPER_TRADING_URL
        } else {
            LIVE_TRADING_URL
        })
    }

    pub fn data_url(&self) -> &str {
        self.data_url.as_deref().unwrap_or(MARKET_DATA_URL)
    }
}

fn require_env(name: &str) -> BrokerResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BrokerError::Config(format!("{name} must be set"))),
    }
}
