//! Trading strategies.
//!
//! Each strategy turns market data and/or news sentiment into
//! [`TradingSignal`]s once per cycle. Signals are intents, not orders;
//! the orchestrator's translator resolves them into order requests
//! against the live portfolio.

mod factory;
mod ma_crossover;
mod sentiment;

pub use factory::build_strategies;
pub use ma_crossover::MaCrossoverStrategy;
pub use sentiment::SentimentStrategy;

use crate::exchange::ExecutedOrder;
use crate::market::{Candle, Ticker};
use crate::portfolio::Portfolio;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a strategy wants to happen. `Hold` signals are emitted
/// explicitly so every cycle leaves an observable trace per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// A strategy's trade intent for one symbol, produced fresh every
/// cycle and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    /// Trading pair in BASE/QUOTE form.
    pub symbol: String,
    pub action: SignalAction,
    /// Strategy's conviction in [0, 1].
    pub confidence: f64,
    /// Fraction of available balance to commit (quote for BUY, base
    /// for SELL). Ignored when `quantity_absolute` is set.
    pub quantity_percentage: Option<Decimal>,
    /// Exact base-asset quantity; takes precedence over the percentage.
    pub quantity_absolute: Option<Decimal>,
    /// Limit price. Presence means limit intent; absence means market.
    pub price: Option<Decimal>,
    pub strategy_name: String,
    pub metadata: HashMap<String, String>,
}

impl TradingSignal {
    /// A no-action signal carrying only its reason.
    pub fn hold(symbol: impl Into<String>, strategy_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("reason".to_string(), reason.into());
        Self {
            symbol: symbol.into(),
            action: SignalAction::Hold,
            confidence: 0.5,
            quantity_percentage: None,
            quantity_absolute: None,
            price: None,
            strategy_name: strategy_name.into(),
            metadata,
        }
    }
}

/// Push-style market data delivered between cycles.
#[derive(Debug, Clone)]
pub enum MarketEvent {
    Ticker(Ticker),
    Candle { symbol: String, candle: Candle },
}

/// A pluggable trading strategy.
///
/// Lifecycle: `initialize` once at agent start (failure leaves the
/// strategy uninitialized and excluded from cycles), `generate_signals`
/// once per cycle with a portfolio snapshot, `on_order_update` after
/// each of its orders settles, `shutdown` at agent stop.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    fn is_initialized(&self) -> bool;

    /// Symbols this strategy trades; the orchestrator refreshes prices
    /// for the union of these each cycle.
    fn watched_symbols(&self) -> Vec<String>;

    async fn initialize(&mut self) -> anyhow::Result<()>;

    /// Produce this cycle's signals from a portfolio snapshot.
    async fn generate_signals(
        &mut self,
        portfolio: &Portfolio,
    ) -> anyhow::Result<Vec<TradingSignal>>;

    /// Out-of-cycle market data. Default: ignore.
    async fn on_data(&mut self, _event: MarketEvent) -> anyhow::Result<()> {
        Ok(())
    }

    /// Authoritative order outcome for an order this strategy
    /// originated. Strategies correct their optimistic position flags
    /// here.
    async fn on_order_update(&mut self, order: &ExecutedOrder);

    /// Introspection snapshot for status reporting.
    fn get_status(&self) -> serde_json::Value;

    async fn shutdown(&mut self) -> anyhow::Result<()>;
}
