//! Account ledger shared by the exchange adapter and the strategies.
//!
//! The live `Portfolio` is owned exclusively by the exchange adapter;
//! everything else works off clones fetched per cycle. Mutations are
//! signed deltas applied by the adapter as atomic debit/credit pairs.
//! Sufficiency checks live in the adapter so they happen together with
//! the other leg of the trade, not here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cash and asset balances for the trading account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Cash per currency, e.g. {"USDT": 10000}.
    pub cash_balance: HashMap<String, Decimal>,
    /// Asset holdings per base asset, e.g. {"BTC": 0.1}.
    pub asset_holdings: HashMap<String, Decimal>,
    /// Last computed total value in the quote currency.
    pub total_value: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            cash_balance: HashMap::new(),
            asset_holdings: HashMap::new(),
            total_value: Decimal::ZERO,
            last_updated: Utc::now(),
        }
    }
}

impl Portfolio {
    /// Create a portfolio holding only the given initial cash.
    pub fn with_cash(initial_cash: HashMap<String, Decimal>) -> Self {
        Self {
            cash_balance: initial_cash,
            ..Default::default()
        }
    }

    /// Cash available in `currency`, zero if the currency is unknown.
    pub fn cash(&self, currency: &str) -> Decimal {
        self.cash_balance
            .get(currency)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Holdings of `asset`, zero if the asset is unknown.
    pub fn asset(&self, asset: &str) -> Decimal {
        self.asset_holdings
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Apply a signed cash delta for `currency`.
    ///
    /// The caller (exchange adapter) must have validated sufficiency;
    /// this is a plain ledger write.
    pub fn update_cash(&mut self, currency: &str, delta: Decimal) {
        let balance = self
            .cash_balance
            .entry(currency.to_string())
            .or_insert(Decimal::ZERO);
        *balance += delta;
        self.last_updated = Utc::now();
    }

    /// Apply a signed holdings delta for `asset`.
    pub fn update_asset(&mut self, asset: &str, delta: Decimal) {
        let holding = self
            .asset_holdings
            .entry(asset.to_string())
            .or_insert(Decimal::ZERO);
        *holding += delta;
        self.last_updated = Utc::now();
    }

    /// Recompute `total_value`: cash at face value plus holdings valued
    /// at the given per-asset prices. Assets without a price contribute
    /// nothing (they cannot be valued this cycle).
    pub fn calculate_total_value(&mut self, prices: &HashMap<String, Decimal>) -> Decimal {
        let cash: Decimal = self.cash_balance.values().copied().sum();
        let assets: Decimal = self
            .asset_holdings
            .iter()
            .filter_map(|(asset, qty)| prices.get(asset).map(|price| *qty * *price))
            .sum();
        self.total_value = cash + assets;
        self.total_value
    }
}
