//! Configuration management for the trading agent.
//!
//! Loads settings from environment variables and config files.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Agent-wide settings (capital, cadence)
    #[serde(default)]
    pub agent: AgentConfig,
    /// Simulated exchange parameters
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Offline market data feed parameters
    #[serde(default)]
    pub market: MarketConfig,
    /// Strategy roster
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Currency signals are funded from, e.g. "USDT"
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    /// Starting cash per currency
    #[serde(default = "default_initial_capital")]
    pub initial_capital: HashMap<String, Decimal>,
    /// Seconds between trading cycles
    #[serde(default = "default_trading_interval_secs")]
    pub trading_interval_secs: u64,
    /// Stop after this many cycles (unbounded when absent)
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Adapter selection; only "simulated" is supported
    #[serde(default = "default_exchange_kind")]
    pub kind: String,
    /// Seed reference prices per symbol, e.g. {"BTC/USDT": 50000}
    #[serde(default = "default_initial_prices")]
    pub initial_prices: HashMap<String, Decimal>,
    /// Adverse price movement on market fills (0.001 = 0.1%)
    #[serde(default = "default_slippage_factor")]
    pub slippage_factor: Decimal,
    /// Commission rate on traded notional (0.001 = 0.1%)
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
    /// Chance an order fills at all (1.0 = always)
    #[serde(default = "default_fill_probability")]
    pub fill_probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Seed for the replayed price walk (reproducible runs)
    #[serde(default = "default_market_seed")]
    pub seed: u64,
    /// Max per-tick move as a fraction of price
    #[serde(default = "default_volatility")]
    pub volatility: f64,
}

/// One strategy roster entry. `params` is passed opaquely to the
/// strategy constructor selected by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySpec {
    pub name: String,
    /// Strategy kind: "ma_crossover" or "sentiment"
    pub kind: String,
    #[serde(default = "default_params")]
    pub params: serde_json::Value,
}

// Default value functions
fn default_quote_currency() -> String {
    "USDT".to_string()
}

fn default_initial_capital() -> HashMap<String, Decimal> {
    let mut capital = HashMap::new();
    capital.insert("USDT".to_string(), Decimal::new(10_000, 0));
    capital
}

fn default_trading_interval_secs() -> u64 {
    300
}

fn default_exchange_kind() -> String {
    "simulated".to_string()
}

fn default_initial_prices() -> HashMap<String, Decimal> {
    let mut prices = HashMap::new();
    prices.insert("BTC/USDT".to_string(), Decimal::new(50_000, 0));
    prices.insert("ETH/USDT".to_string(), Decimal::new(3_000, 0));
    prices
}

fn default_slippage_factor() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

fn default_commission_rate() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

fn default_fill_probability() -> f64 {
    1.0
}

fn default_market_seed() -> u64 {
    42
}

fn default_volatility() -> f64 {
    0.002
}

fn default_params() -> serde_json::Value {
    serde_json::json!({})
}

fn default_strategies() -> Vec<StrategySpec> {
    vec![
        StrategySpec {
            name: "ma-crossover-btc".to_string(),
            kind: "ma_crossover".to_string(),
            params: serde_json::json!({ "symbol": "BTC/USDT" }),
        },
        StrategySpec {
            name: "news-sentiment".to_string(),
            kind: "sentiment".to_string(),
            params: serde_json::json!({ "target_symbols": ["BTC", "ETH"] }),
        },
    ]
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("AGENT"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.exchange.kind == "simulated",
            "unsupported exchange kind {:?}",
            self.exchange.kind
        );

        anyhow::ensure!(
            self.exchange.slippage_factor >= Decimal::ZERO
                && self.exchange.slippage_factor < Decimal::ONE,
            "slippage_factor must be in [0, 1)"
        );

        anyhow::ensure!(
            self.exchange.commission_rate >= Decimal::ZERO
                && self.exchange.commission_rate < Decimal::ONE,
            "commission_rate must be in [0, 1)"
        );

        anyhow::ensure!(
            (0.0..=1.0).contains(&self.exchange.fill_probability),
            "fill_probability must be in [0, 1]"
        );

        anyhow::ensure!(
            self.agent.trading_interval_secs >= 1,
            "trading_interval_secs must be at least 1"
        );

        anyhow::ensure!(
            self.agent
                .initial_capital
                .values()
                .all(|amount| *amount >= Decimal::ZERO),
            "initial_capital amounts must be non-negative"
        );

        anyhow::ensure!(
            !self.agent.quote_currency.is_empty(),
            "quote_currency must not be empty"
        );

        let mut seen = std::collections::HashSet::new();
        for spec in &self.strategies {
            anyhow::ensure!(
                seen.insert(spec.name.as_str()),
                "duplicate strategy name {:?}",
                spec.name
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            exchange: ExchangeConfig::default(),
            market: MarketConfig::default(),
            strategies: default_strategies(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            quote_currency: default_quote_currency(),
            initial_capital: default_initial_capital(),
            trading_interval_secs: default_trading_interval_secs(),
            max_cycles: None,
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            kind: default_exchange_kind(),
            initial_prices: default_initial_prices(),
            slippage_factor: default_slippage_factor(),
            commission_rate: default_commission_rate(),
            fill_probability: default_fill_probability(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            seed: default_market_seed(),
            volatility: default_volatility(),
        }
    }
}
