use crate::domain::{Decimal, Symbol};
use crate::engine::{CostBasisMethod, LedgerSettings, OversellPolicy, SignalMethod};
use crate::feed::{CoinbaseFeed, FeedError, PriceBuffer, PriceFeed, RandomWalkFeed};
use crate::intake::TradingMode;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub symbols: Vec<Symbol>,
    pub feed_mode: FeedMode,
    pub feed_api_url: String,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub price_history_capacity: usize,
    pub starting_price: Decimal,
    pub random_walk_step: Decimal,
    pub oversell_policy: OversellPolicy,
    pub cost_basis: CostBasisMethod,
    pub signal_window: usize,
    pub signal_method: SignalMethod,
    pub trading_mode: TradingMode,
    pub trade_db_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    RandomWalk,
    Coinbase,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let symbols = parse_symbols(&env_map)?;

        let feed_mode = match get(&env_map, "FEED_MODE").unwrap_or("random_walk") {
            "random_walk" => FeedMode::RandomWalk,
            "coinbase" => FeedMode::Coinbase,
            other => {
                return Err(ConfigError::InvalidValue(
                    "FEED_MODE".to_string(),
                    format!("must be random_walk or coinbase, got {}", other),
                ))
            }
        };

        let feed_api_url = get(&env_map, "FEED_API_URL")
            .unwrap_or(CoinbaseFeed::DEFAULT_URL)
            .to_string();

        let poll_interval_ms: u64 =
            parse_or(&env_map, "POLL_INTERVAL_MS", 1000, "must be a positive integer")?;
        let poll_timeout_ms: u64 =
            parse_or(&env_map, "POLL_TIMEOUT_MS", 3000, "must be a positive integer")?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "POLL_INTERVAL_MS".to_string(),
                "must be > 0".to_string(),
            ));
        }
        if poll_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "POLL_TIMEOUT_MS".to_string(),
                "must be > 0".to_string(),
            ));
        }

        let price_history_capacity: usize = parse_or(
            &env_map,
            "PRICE_HISTORY_CAPACITY",
            PriceBuffer::DEFAULT_CAPACITY,
            "must be a positive integer",
        )?;

        let starting_price = parse_decimal_or(
            &env_map,
            "STARTING_PRICE",
            Decimal::from(RandomWalkFeed::DEFAULT_START),
        )?;
        if !starting_price.is_positive() {
            return Err(ConfigError::InvalidValue(
                "STARTING_PRICE".to_string(),
                "must be > 0".to_string(),
            ));
        }
        let random_walk_step = parse_decimal_or(
            &env_map,
            "RANDOM_WALK_STEP",
            Decimal::from(RandomWalkFeed::DEFAULT_STEP),
        )?;
        if random_walk_step.is_negative() {
            return Err(ConfigError::InvalidValue(
                "RANDOM_WALK_STEP".to_string(),
                "must be >= 0".to_string(),
            ));
        }

        let oversell_policy = match get(&env_map, "OVERSELL_POLICY").unwrap_or("reject") {
            "reject" => OversellPolicy::Reject,
            "clamp" => OversellPolicy::Clamp,
            other => {
                return Err(ConfigError::InvalidValue(
                    "OVERSELL_POLICY".to_string(),
                    format!("must be reject or clamp, got {}", other),
                ))
            }
        };

        let cost_basis = match get(&env_map, "COST_BASIS").unwrap_or("average") {
            "average" => CostBasisMethod::WeightedAverage,
            "fifo" => CostBasisMethod::Fifo,
            other => {
                return Err(ConfigError::InvalidValue(
                    "COST_BASIS".to_string(),
                    format!("must be average or fifo, got {}", other),
                ))
            }
        };

        let signal_window: usize = parse_or(&env_map, "SIGNAL_WINDOW", 10, "must be an integer >= 2")?;
        if signal_window < 2 {
            return Err(ConfigError::InvalidValue(
                "SIGNAL_WINDOW".to_string(),
                "must be an integer >= 2".to_string(),
            ));
        }

        let signal_method = match get(&env_map, "SIGNAL_METHOD").unwrap_or("slope") {
            "slope" => SignalMethod::Slope,
            "sma" => SignalMethod::MovingAverage,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SIGNAL_METHOD".to_string(),
                    format!("must be slope or sma, got {}", other),
                ))
            }
        };

        let trading_mode = match get(&env_map, "TRADING_MODE").unwrap_or("simulation") {
            "simulation" => TradingMode::Simulation,
            "live" => TradingMode::Live,
            other => {
                return Err(ConfigError::InvalidValue(
                    "TRADING_MODE".to_string(),
                    format!("must be simulation or live, got {}", other),
                ))
            }
        };

        let trade_db_path = get(&env_map, "TRADE_DB_PATH")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Config {
            port,
            symbols,
            feed_mode,
            feed_api_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            poll_timeout: Duration::from_millis(poll_timeout_ms),
            price_history_capacity,
            starting_price,
            random_walk_step,
            oversell_policy,
            cost_basis,
            signal_window,
            signal_method,
            trading_mode,
            trade_db_path,
        })
    }

    /// Build the price feed selected by `feed_mode`.
    pub fn build_feed(&self) -> Result<Arc<dyn PriceFeed>, FeedError> {
        let feed: Arc<dyn PriceFeed> = match self.feed_mode {
            FeedMode::RandomWalk => Arc::new(RandomWalkFeed::new(
                self.starting_price,
                self.random_walk_step,
            )),
            FeedMode::Coinbase => Arc::new(CoinbaseFeed::new(
                self.feed_api_url.clone(),
                self.poll_timeout,
            )?),
        };
        Ok(feed)
    }

    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            oversell: self.oversell_policy,
            cost_basis: self.cost_basis,
        }
    }
}

impl Default for Config {
    /// The configuration produced by an empty environment.
    fn default() -> Self {
        Config {
            port: 8080,
            symbols: vec![Symbol::new("BTC-USD".to_string())],
            feed_mode: FeedMode::RandomWalk,
            feed_api_url: CoinbaseFeed::DEFAULT_URL.to_string(),
            poll_interval: Duration::from_millis(1000),
            poll_timeout: Duration::from_millis(3000),
            price_history_capacity: PriceBuffer::DEFAULT_CAPACITY,
            starting_price: Decimal::from(RandomWalkFeed::DEFAULT_START),
            random_walk_step: Decimal::from(RandomWalkFeed::DEFAULT_STEP),
            oversell_policy: OversellPolicy::Reject,
            cost_basis: CostBasisMethod::WeightedAverage,
            signal_window: 10,
            signal_method: SignalMethod::Slope,
            trading_mode: TradingMode::Simulation,
            trade_db_path: None,
        }
    }
}

fn get<'a>(env_map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env_map.get(key).map(|s| s.as_str())
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match get(env_map, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expected.to_string())),
    }
}

fn parse_decimal_or(
    env_map: &HashMap<String, String>,
    key: &str,
    default: Decimal,
) -> Result<Decimal, ConfigError> {
    match get(env_map, key) {
        None => Ok(default),
        Some(raw) => Decimal::from_str_canonical(raw).map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a decimal number".to_string())
        }),
    }
}

fn parse_symbols(env_map: &HashMap<String, String>) -> Result<Vec<Symbol>, ConfigError> {
    let raw = get(env_map, "SYMBOLS").unwrap_or("BTC-USD");
    let mut symbols = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let symbol = Symbol::from_str(part).map_err(|e| {
            ConfigError::InvalidValue("SYMBOLS".to_string(), e.to_string())
        })?;
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    if symbols.is_empty() {
        return Err(ConfigError::InvalidValue(
            "SYMBOLS".to_string(),
            "at least one symbol is required".to_string(),
        ));
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_from_empty_env() {
        let config = Config::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.symbols, vec![Symbol::new("BTC-USD".to_string())]);
        assert_eq!(config.feed_mode, FeedMode::RandomWalk);
        assert_eq!(config.poll_timeout, Duration::from_secs(3));
        assert_eq!(config.starting_price, Decimal::from(68_000));
        assert_eq!(config.oversell_policy, OversellPolicy::Reject);
        assert_eq!(config.cost_basis, CostBasisMethod::WeightedAverage);
        assert_eq!(config.signal_window, 10);
        assert_eq!(config.trading_mode, TradingMode::Simulation);
        assert!(config.trade_db_path.is_none());
    }

    #[test]
    fn test_symbols_are_normalized_and_deduplicated() {
        let config = Config::from_env_map(env(&[("SYMBOLS", "btc-usd, ETH-USD,,BTC-USD")])).unwrap();
        assert_eq!(
            config.symbols,
            vec![
                Symbol::new("BTC-USD".to_string()),
                Symbol::new("ETH-USD".to_string())
            ]
        );
    }

    #[test]
    fn test_invalid_port() {
        match Config::from_env_map(env(&[("PORT", "not_a_number")])) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_oversell_policy() {
        match Config::from_env_map(env(&[("OVERSELL_POLICY", "ignore")])) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "OVERSELL_POLICY"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_signal_window_too_small() {
        match Config::from_env_map(env(&[("SIGNAL_WINDOW", "1")])) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SIGNAL_WINDOW"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_non_positive_starting_price() {
        match Config::from_env_map(env(&[("STARTING_PRICE", "0")])) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "STARTING_PRICE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_alternative_modes() {
        let config = Config::from_env_map(env(&[
            ("FEED_MODE", "coinbase"),
            ("OVERSELL_POLICY", "clamp"),
            ("COST_BASIS", "fifo"),
            ("SIGNAL_METHOD", "sma"),
            ("TRADING_MODE", "live"),
            ("TRADE_DB_PATH", "/tmp/trades.db"),
        ]))
        .unwrap();
        assert_eq!(config.feed_mode, FeedMode::Coinbase);
        assert_eq!(
            config.ledger_settings(),
            LedgerSettings {
                oversell: OversellPolicy::Clamp,
                cost_basis: CostBasisMethod::Fifo,
            }
        );
        assert_eq!(config.signal_method, SignalMethod::MovingAverage);
        assert_eq!(config.trading_mode, TradingMode::Live);
        assert_eq!(config.trade_db_path.as_deref(), Some("/tmp/trades.db"));
    }

    #[test]
    fn test_empty_symbols_rejected() {
        match Config::from_env_map(env(&[("SYMBOLS", " , ")])) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SYMBOLS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
