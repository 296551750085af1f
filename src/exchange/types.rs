//! Order types shared by the exchange adapters and the orchestrator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderAction {
    Buy,
    Sell,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Buy => write!(f, "BUY"),
            OrderAction::Sell => write!(f, "SELL"),
        }
    }
}

/// Execution style of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

/// Lifecycle state of an order. `Filled`, `Canceled` and `Rejected`
/// are terminal; `Open` orders rest in the open-orders index until
/// matched or canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Filled,
    Open,
    Canceled,
    Rejected,
}

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

/// A fully parameterized order instruction, consumed once by an
/// exchange adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Unique request id for tracking/logging.
    pub request_id: String,
    /// Trading pair in BASE/QUOTE form, e.g. "BTC/USDT".
    pub symbol: String,
    pub action: OrderAction,
    pub order_type: OrderType,
    /// Quantity in base-asset units, must be > 0.
    pub quantity: Decimal,
    /// Limit price; required iff `order_type` is `Limit`.
    pub price: Option<Decimal>,
    /// Strategy that originated this order.
    pub strategy_name: String,
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    pub fn new(
        symbol: impl Into<String>,
        action: OrderAction,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
        strategy_name: impl Into<String>,
    ) -> Self {
        let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            request_id: format!("req-{}-{}", Utc::now().timestamp_millis(), seq),
            symbol: symbol.into(),
            action,
            order_type,
            quantity,
            price,
            strategy_name: strategy_name.into(),
            client_order_id: None,
        }
    }
}

/// The adapter's authoritative record of an order's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedOrder {
    pub order_id: String,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub action: OrderAction,
    pub order_type: OrderType,
    /// Actual fill price, or the limit price for resting orders.
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
    pub fee: Decimal,
    pub fee_currency: Option<String>,
    pub status: OrderStatus,
    pub metadata: HashMap<String, String>,
}

/// Split a "BASE/QUOTE" pair into its two legs.
pub fn split_symbol(symbol: &str) -> Option<(&str, &str)> {
    let (base, quote) = symbol.split_once('/')?;
    if base.is_empty() || quote.is_empty() {
        return None;
    }
    Some((base, quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_split_symbol() {
        assert_eq!(split_symbol("BTC/USDT"), Some(("BTC", "USDT")));
        assert_eq!(split_symbol("BTCUSDT"), None);
        assert_eq!(split_symbol("/USDT"), None);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = OrderRequest::new(
            "BTC/USDT",
            OrderAction::Buy,
            OrderType::Market,
            dec!(0.1),
            None,
            "test",
        );
        let b = OrderRequest::new(
            "BTC/USDT",
            OrderAction::Buy,
            OrderType::Market,
            dec!(0.1),
            None,
            "test",
        );
        assert_ne!(a.request_id, b.request_id);
    }
}
