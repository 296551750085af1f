//! The exchange adapter capability set and its error taxonomy.
//!
//! An adapter is the ledger of record: it owns the live [`Portfolio`]
//! and is the only component that mutates balances. Everything else
//! reads snapshots via `get_account_balance`.

use crate::exchange::types::{ExecutedOrder, OrderRequest};
use crate::portfolio::Portfolio;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

/// Errors surfaced by an exchange adapter.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Expected business condition, not a bug: the account cannot cover
    /// the order. The portfolio is guaranteed unchanged.
    #[error("insufficient funds: need {needed} {currency}, have {available}")]
    InsufficientFunds {
        currency: String,
        needed: Decimal,
        available: Decimal,
    },

    #[error("order placement failed: {0}")]
    OrderPlacement(String),

    /// The adapter has no reference price for the symbol.
    #[error("no reference price available for {0}")]
    PriceUnavailable(String),

    #[error("malformed symbol {0:?}, expected BASE/QUOTE")]
    MalformedSymbol(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Capability set for executing orders against an exchange, real or
/// simulated.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Connect / fetch initial state. Failure here is fatal to the
    /// agent: trading cannot proceed without a functioning ledger.
    async fn initialize(&self) -> Result<(), ExchangeError>;

    /// Place an order. Returns the adapter's record of the outcome
    /// (`Filled`, `Open` for resting limits, or `Rejected`).
    async fn create_order(&self, request: OrderRequest) -> Result<ExecutedOrder, ExchangeError>;

    /// Cancel an open order. Returns `false` if the id is not resting
    /// in the open-orders index (an idempotent no-op, not an error).
    async fn cancel_order(&self, order_id: &str) -> Result<bool, ExchangeError>;

    /// Look up an order by id in the open index or the trade history.
    async fn get_order_status(
        &self,
        order_id: &str,
    ) -> Result<Option<ExecutedOrder>, ExchangeError>;

    /// All resting orders, optionally filtered by symbol.
    async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<ExecutedOrder>, ExchangeError>;

    /// Snapshot of the account ledger. The adapter is the sole writer;
    /// callers get a point-in-time copy.
    async fn get_account_balance(&self) -> Result<Portfolio, ExchangeError>;

    /// Latest reference price for a symbol, independent of order
    /// submission. `None` if the adapter has never seen the symbol.
    async fn get_current_price(&self, symbol: &str) -> Result<Option<Decimal>, ExchangeError>;

    /// Feed fresh reference prices into the adapter. The simulated
    /// adapter also re-evaluates resting limit orders here; real
    /// adapters track prices themselves and ignore this.
    async fn refresh(&self, _prices: &HashMap<String, Decimal>) -> Result<(), ExchangeError> {
        Ok(())
    }

    /// Cleanup (close connections, drop resting orders).
    async fn shutdown(&self) -> Result<(), ExchangeError>;
}
