//! Market data: tickers and candles for the strategies and the
//! orchestrator's price refresh.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("no market data for symbol {0}")]
    UnknownSymbol(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Point-in-time quote for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last_price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// One OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Read-only price feed. Implementations must be safe to share across
/// strategies.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest quote for `symbol`.
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, MarketDataError>;

    /// Up to `limit` most recent bars for `symbol` at `timeframe`
    /// granularity (e.g. "1m", "1h"), oldest first.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

/// Parse a timeframe label like "5m", "1h" or "1d" into minutes.
/// Unrecognized labels fall back to one minute.
fn timeframe_minutes(timeframe: &str) -> i64 {
    let (digits, unit) = timeframe.split_at(timeframe.len().saturating_sub(1));
    let Ok(count) = digits.parse::<i64>() else {
        return 1;
    };
    match unit {
        "m" => count,
        "h" => count * 60,
        "d" => count * 60 * 24,
        _ => 1,
    }
}

struct WalkState {
    rng: StdRng,
    prices: HashMap<String, Decimal>,
}

/// Offline feed that replays a seeded random walk from configured
/// starting prices. Deterministic for a given seed, so test runs and
/// paper-trading sessions are reproducible.
pub struct ReplayMarketData {
    state: Mutex<WalkState>,
    /// Max per-tick move as a fraction of price (0.002 = 0.2%).
    volatility: f64,
    /// Half-spread applied around the last price for bid/ask.
    spread: Decimal,
}

impl ReplayMarketData {
    pub fn new(initial_prices: HashMap<String, Decimal>, seed: u64, volatility: f64) -> Self {
        Self {
            state: Mutex::new(WalkState {
                rng: StdRng::seed_from_u64(seed),
                prices: initial_prices,
            }),
            volatility,
            spread: Decimal::new(5, 4),
        }
    }

    fn step(rng: &mut StdRng, price: Decimal, volatility: f64) -> Decimal {
        let pct = rng.gen_range(-volatility..=volatility);
        let factor = Decimal::ONE + Decimal::from_f64(pct).unwrap_or(Decimal::ZERO);
        price * factor
    }
}

#[async_trait]
impl MarketDataSource for ReplayMarketData {
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, MarketDataError> {
        let mut state = self.state.lock().await;
        let current = *state
            .prices
            .get(symbol)
            .ok_or_else(|| MarketDataError::UnknownSymbol(symbol.to_string()))?;

        let next = Self::step(&mut state.rng, current, self.volatility);
        state.prices.insert(symbol.to_string(), next);
        debug!(symbol, price = %next, "Ticker advanced");

        let half_spread = next * self.spread;
        Ok(Ticker {
            symbol: symbol.to_string(),
            last_price: next,
            bid: next - half_spread,
            ask: next + half_spread,
            timestamp: Utc::now(),
        })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let mut state = self.state.lock().await;
        let mut price = *state
            .prices
            .get(symbol)
            .ok_or_else(|| MarketDataError::UnknownSymbol(symbol.to_string()))?;

        // Bars are synthesized by walking forward from the current
        // price; the final close becomes the new current price.
        let bar_minutes = timeframe_minutes(timeframe);
        let start = Utc::now() - Duration::minutes(bar_minutes * limit as i64);
        let mut candles = Vec::with_capacity(limit);
        for i in 0..limit {
            let open = price;
            let close = Self::step(&mut state.rng, open, self.volatility);
            let (high, low) = if close >= open { (close, open) } else { (open, close) };
            let volume = Decimal::from(state.rng.gen_range(10..1000));
            candles.push(Candle {
                timestamp: start + Duration::minutes(bar_minutes * i as i64),
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        state.prices.insert(symbol.to_string(), price);

        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn feed_with_btc(seed: u64) -> ReplayMarketData {
        let mut prices = HashMap::new();
        prices.insert("BTC/USDT".to_string(), dec!(50000));
        ReplayMarketData::new(prices, seed, 0.002)
    }

    #[tokio::test]
    async fn test_ticker_walks_within_volatility() {
        let feed = feed_with_btc(7);
        let mut last = dec!(50000);
        for _ in 0..20 {
            let ticker = feed.fetch_ticker("BTC/USDT").await.unwrap();
            let max_move = last * dec!(0.002);
            assert!((ticker.last_price - last).abs() <= max_move + dec!(0.0001));
            assert!(ticker.bid < ticker.ask);
            last = ticker.last_price;
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_walk() {
        let a = feed_with_btc(42);
        let b = feed_with_btc(42);
        for _ in 0..10 {
            let ta = a.fetch_ticker("BTC/USDT").await.unwrap();
            let tb = b.fetch_ticker("BTC/USDT").await.unwrap();
            assert_eq!(ta.last_price, tb.last_price);
        }
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!(timeframe_minutes("1m"), 1);
        assert_eq!(timeframe_minutes("15m"), 15);
        assert_eq!(timeframe_minutes("4h"), 240);
        assert_eq!(timeframe_minutes("1d"), 1440);
        assert_eq!(timeframe_minutes("weird"), 1);
    }

    #[tokio::test]
    async fn test_unknown_symbol_errors() {
        let feed = feed_with_btc(1);
        let result = feed.fetch_ticker("ETH/USDT").await;
        assert!(matches!(result, Err(MarketDataError::UnknownSymbol(_))));
    }

    #[tokio::test]
    async fn test_ohlcv_bars_are_contiguous() {
        let feed = feed_with_btc(3);
        let candles = feed.fetch_ohlcv("BTC/USDT", "1h", 50).await.unwrap();

        assert_eq!(candles.len(), 50);
        for pair in candles.windows(2) {
            assert_eq!(pair[0].close, pair[1].open);
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        for candle in &candles {
            assert!(candle.high >= candle.low);
            assert!(candle.high >= candle.open && candle.high >= candle.close);
        }
    }
}
