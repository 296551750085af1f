//! Moving-average crossover strategy.

use crate::exchange::{split_symbol, ExecutedOrder, OrderAction, OrderStatus};
use crate::market::MarketDataSource;
use crate::portfolio::Portfolio;
use crate::strategy::{SignalAction, Strategy, TradingSignal};
use crate::utils::decimal::sma;
use anyhow::{bail, Context};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Extra candles fetched beyond the long window so the previous-bar
/// moving averages are always available.
const MA_WINDOW_MARGIN: usize = 50;

/// Conviction attached to crossover signals.
const CROSSOVER_CONFIDENCE: f64 = 0.8;

fn default_symbol() -> String {
    "BTC/USDT".to_string()
}
fn default_short_window() -> usize {
    20
}
fn default_long_window() -> usize {
    50
}
fn default_timeframe() -> String {
    "1h".to_string()
}
fn default_trade_quantity_percentage() -> Decimal {
    Decimal::new(1, 1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaCrossoverParams {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    #[serde(default = "default_long_window")]
    pub long_window: usize,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Fraction of the quote balance committed on a buy.
    #[serde(default = "default_trade_quantity_percentage")]
    pub trade_quantity_percentage: Decimal,
}

impl Default for MaCrossoverParams {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            short_window: default_short_window(),
            long_window: default_long_window(),
            timeframe: default_timeframe(),
            trade_quantity_percentage: default_trade_quantity_percentage(),
        }
    }
}

/// Buys on a golden cross (short SMA crossing above the long SMA),
/// sells the position on a death cross. Tracks one long position via
/// an optimistic flag that `on_order_update` corrects from fills.
pub struct MaCrossoverStrategy {
    name: String,
    params: MaCrossoverParams,
    market: Arc<dyn MarketDataSource>,
    initialized: bool,
    position_active: bool,
    last_sma_short: Option<Decimal>,
    last_sma_long: Option<Decimal>,
}

impl MaCrossoverStrategy {
    pub fn new(
        name: impl Into<String>,
        params: MaCrossoverParams,
        market: Arc<dyn MarketDataSource>,
    ) -> anyhow::Result<Self> {
        if params.short_window >= params.long_window {
            bail!(
                "short window {} must be smaller than long window {}",
                params.short_window,
                params.long_window
            );
        }
        if params.short_window == 0 {
            bail!("short window must be at least 1");
        }
        Ok(Self {
            name: name.into(),
            params,
            market,
            initialized: false,
            position_active: false,
            last_sma_short: None,
            last_sma_long: None,
        })
    }

    /// Closing prices, oldest first. `None` when the feed cannot cover
    /// the long window plus the previous bar.
    async fn fetch_closes(&self) -> anyhow::Result<Option<Vec<Decimal>>> {
        let limit = self.params.long_window + MA_WINDOW_MARGIN;
        let candles = self
            .market
            .fetch_ohlcv(&self.params.symbol, &self.params.timeframe, limit)
            .await
            .with_context(|| format!("fetching candles for {}", self.params.symbol))?;

        if candles.len() < self.params.long_window + 1 {
            warn!(
                strategy = %self.name,
                symbol = %self.params.symbol,
                need = self.params.long_window + 1,
                got = candles.len(),
                "Not enough candles for moving averages"
            );
            return Ok(None);
        }
        Ok(Some(candles.into_iter().map(|c| c.close).collect()))
    }
}

#[async_trait]
impl Strategy for MaCrossoverStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn watched_symbols(&self) -> Vec<String> {
        vec![self.params.symbol.clone()]
    }

    async fn initialize(&mut self) -> anyhow::Result<()> {
        info!(
            strategy = %self.name,
            symbol = %self.params.symbol,
            short_window = self.params.short_window,
            long_window = self.params.long_window,
            timeframe = %self.params.timeframe,
            "Initializing moving-average crossover strategy"
        );
        // Warm the feed; a thin history here is not fatal, signal
        // generation re-fetches every cycle.
        let _ = self.fetch_closes().await?;
        self.initialized = true;
        Ok(())
    }

    async fn generate_signals(
        &mut self,
        portfolio: &Portfolio,
    ) -> anyhow::Result<Vec<TradingSignal>> {
        let Some(closes) = self.fetch_closes().await? else {
            return Ok(Vec::new());
        };

        let n = closes.len();
        let short = self.params.short_window;
        let long = self.params.long_window;
        let (Some(sma_short), Some(sma_long), Some(prev_short), Some(prev_long)) = (
            sma(&closes, n, short),
            sma(&closes, n, long),
            sma(&closes, n - 1, short),
            sma(&closes, n - 1, long),
        ) else {
            return Ok(Vec::new());
        };
        self.last_sma_short = Some(sma_short);
        self.last_sma_long = Some(sma_long);

        let close = closes[n - 1];
        info!(
            strategy = %self.name,
            symbol = %self.params.symbol,
            close = %close,
            sma_short = %sma_short,
            sma_long = %sma_long,
            "Evaluated moving averages"
        );

        let (base, quote) = split_symbol(&self.params.symbol)
            .with_context(|| format!("malformed symbol {:?}", self.params.symbol))?;

        let golden_cross = prev_short <= prev_long && sma_short > sma_long;
        let death_cross = prev_short >= prev_long && sma_short < sma_long;

        let mut metadata = HashMap::new();
        metadata.insert("sma_short".to_string(), sma_short.to_string());
        metadata.insert("sma_long".to_string(), sma_long.to_string());
        metadata.insert("close".to_string(), close.to_string());

        if golden_cross {
            if self.position_active {
                info!(strategy = %self.name, "Golden cross but position already active");
            } else if portfolio.cash(quote) <= Decimal::ZERO {
                warn!(strategy = %self.name, quote, "Golden cross but no cash to buy");
            } else {
                metadata.insert("reason".to_string(), "golden cross".to_string());
                self.position_active = true;
                info!(strategy = %self.name, symbol = %self.params.symbol, "Buy signal on golden cross");
                return Ok(vec![TradingSignal {
                    symbol: self.params.symbol.clone(),
                    action: SignalAction::Buy,
                    confidence: CROSSOVER_CONFIDENCE,
                    quantity_percentage: Some(self.params.trade_quantity_percentage),
                    quantity_absolute: None,
                    price: None,
                    strategy_name: self.name.clone(),
                    metadata,
                }]);
            }
        } else if death_cross {
            if !self.position_active {
                info!(strategy = %self.name, "Death cross but no active position");
            } else if portfolio.asset(base) <= Decimal::ZERO {
                // Flag said long but the ledger disagrees; trust the ledger.
                warn!(strategy = %self.name, base, "Death cross with no holdings, resetting position flag");
                self.position_active = false;
            } else {
                metadata.insert("reason".to_string(), "death cross".to_string());
                self.position_active = false;
                info!(strategy = %self.name, symbol = %self.params.symbol, "Sell signal on death cross");
                return Ok(vec![TradingSignal {
                    symbol: self.params.symbol.clone(),
                    action: SignalAction::Sell,
                    confidence: CROSSOVER_CONFIDENCE,
                    quantity_percentage: Some(Decimal::ONE),
                    quantity_absolute: None,
                    price: None,
                    strategy_name: self.name.clone(),
                    metadata,
                }]);
            }
        }

        Ok(vec![TradingSignal::hold(
            self.params.symbol.clone(),
            self.name.clone(),
            "no crossover",
        )])
    }

    async fn on_order_update(&mut self, order: &ExecutedOrder) {
        if order.symbol != self.params.symbol || order.status != OrderStatus::Filled {
            return;
        }
        match order.action {
            OrderAction::Buy => {
                self.position_active = true;
                info!(strategy = %self.name, order_id = %order.order_id, "Position active after fill");
            }
            OrderAction::Sell => {
                self.position_active = false;
                info!(strategy = %self.name, order_id = %order.order_id, "Position closed after fill");
            }
        }
    }

    fn get_status(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "kind": "ma_crossover",
            "initialized": self.initialized,
            "symbol": self.params.symbol,
            "short_window": self.params.short_window,
            "long_window": self.params.long_window,
            "timeframe": self.params.timeframe,
            "position_active": self.position_active,
            "last_sma_short": self.last_sma_short.map(|d| d.to_string()),
            "last_sma_long": self.last_sma_long.map(|d| d.to_string()),
        })
    }

    async fn shutdown(&mut self) -> anyhow::Result<()> {
        info!(strategy = %self.name, "Shutting down");
        self.initialized = false;
        Ok(())
    }
}
