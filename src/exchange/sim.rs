//! Simulated exchange for paper trading and tests.
//!
//! Implements the full order lifecycle against an in-memory portfolio:
//! fill-probability roll, slippage on market orders, limit crossing,
//! atomic settlement with sufficiency checks, an open-orders index for
//! resting limits, and a trade history for terminal orders. Resting
//! orders are re-evaluated against fresh reference prices on every
//! [`ExchangeAdapter::refresh`] call.

use crate::exchange::traits::{ExchangeAdapter, ExchangeError};
use crate::exchange::types::{
    split_symbol, ExecutedOrder, OrderAction, OrderRequest, OrderStatus, OrderType,
};
use crate::portfolio::Portfolio;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Tunables for the simulated exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedExchangeConfig {
    /// Starting cash per currency.
    pub initial_capital: HashMap<String, Decimal>,
    /// Seed reference prices per symbol, e.g. {"BTC/USDT": 50000}.
    pub initial_prices: HashMap<String, Decimal>,
    /// Adverse price movement applied to market fills (0.001 = 0.1%).
    pub slippage_factor: Decimal,
    /// Commission charged on the traded notional (0.001 = 0.1%).
    pub commission_rate: Decimal,
    /// Chance an order fills at all; anything else is `Rejected`.
    pub fill_probability: f64,
}

impl Default for SimulatedExchangeConfig {
    fn default() -> Self {
        let mut capital = HashMap::new();
        capital.insert("USDT".to_string(), Decimal::new(10_000, 0));
        Self {
            initial_capital: capital,
            initial_prices: HashMap::new(),
            slippage_factor: Decimal::new(1, 3),
            commission_rate: Decimal::new(1, 3),
            fill_probability: 1.0,
        }
    }
}

#[derive(Debug)]
struct SimState {
    portfolio: Portfolio,
    prices: HashMap<String, Decimal>,
    open_orders: HashMap<String, ExecutedOrder>,
    trade_history: Vec<ExecutedOrder>,
}

/// In-memory exchange adapter. Sole writer of the [`Portfolio`]; all
/// mutations happen under one write lock so settlement is a short,
/// non-interruptible critical section.
pub struct SimulatedExchange {
    state: RwLock<SimState>,
    order_seq: AtomicU64,
    slippage_factor: Decimal,
    commission_rate: Decimal,
    fill_probability: f64,
}

impl SimulatedExchange {
    pub fn new(config: SimulatedExchangeConfig) -> Self {
        Self {
            state: RwLock::new(SimState {
                portfolio: Portfolio::with_cash(config.initial_capital),
                prices: config.initial_prices,
                open_orders: HashMap::new(),
                trade_history: Vec::new(),
            }),
            order_seq: AtomicU64::new(1),
            slippage_factor: config.slippage_factor,
            commission_rate: config.commission_rate,
            fill_probability: config.fill_probability,
        }
    }

    fn next_order_id(&self) -> String {
        format!("sim-{}", self.order_seq.fetch_add(1, Ordering::SeqCst))
    }

    fn record_from(&self, request: &OrderRequest, price: Decimal, status: OrderStatus) -> ExecutedOrder {
        ExecutedOrder {
            order_id: self.next_order_id(),
            client_order_id: request.client_order_id.clone(),
            symbol: request.symbol.clone(),
            action: request.action,
            order_type: request.order_type,
            price,
            quantity: request.quantity,
            timestamp: Utc::now(),
            fee: Decimal::ZERO,
            fee_currency: None,
            status,
            metadata: HashMap::new(),
        }
    }

    /// Full trade history (terminal orders), oldest first.
    pub async fn trade_history(&self) -> Vec<ExecutedOrder> {
        self.state.read().await.trade_history.clone()
    }
}

/// Apply one settled trade to the ledger: sufficiency check and the
/// debit/credit pair together, or nothing at all. Returns the
/// commission charged.
fn settle_leg(
    portfolio: &mut Portfolio,
    base: &str,
    quote: &str,
    action: OrderAction,
    quantity: Decimal,
    execution_price: Decimal,
    commission_rate: Decimal,
) -> Result<Decimal, ExchangeError> {
    let cost = quantity * execution_price;
    let commission = cost * commission_rate;

    match action {
        OrderAction::Buy => {
            let required = cost + commission;
            let available = portfolio.cash(quote);
            if available < required {
                return Err(ExchangeError::InsufficientFunds {
                    currency: quote.to_string(),
                    needed: required,
                    available,
                });
            }
            portfolio.update_cash(quote, -required);
            portfolio.update_asset(base, quantity);
        }
        OrderAction::Sell => {
            let available = portfolio.asset(base);
            if available < quantity {
                return Err(ExchangeError::InsufficientFunds {
                    currency: base.to_string(),
                    needed: quantity,
                    available,
                });
            }
            portfolio.update_asset(base, -quantity);
            portfolio.update_cash(quote, cost - commission);
        }
    }

    Ok(commission)
}

#[async_trait]
impl ExchangeAdapter for SimulatedExchange {
    async fn initialize(&self) -> Result<(), ExchangeError> {
        let state = self.state.read().await;
        info!(
            currencies = state.portfolio.cash_balance.len(),
            seeded_prices = state.prices.len(),
            "Simulated exchange initialized"
        );
        Ok(())
    }

    async fn create_order(&self, request: OrderRequest) -> Result<ExecutedOrder, ExchangeError> {
        let (base, quote) = split_symbol(&request.symbol)
            .ok_or_else(|| ExchangeError::MalformedSymbol(request.symbol.clone()))?;

        if request.quantity <= Decimal::ZERO {
            return Err(ExchangeError::OrderPlacement(format!(
                "non-positive quantity {} for {}",
                request.quantity, request.symbol
            )));
        }

        let mut state = self.state.write().await;

        // Non-fill roll happens before anything touches the books.
        if rand::thread_rng().gen::<f64>() >= self.fill_probability {
            let mut order =
                self.record_from(&request, request.price.unwrap_or(Decimal::ZERO), OrderStatus::Rejected);
            order
                .metadata
                .insert("reason".to_string(), "simulated non-fill".to_string());
            warn!(
                request_id = %request.request_id,
                symbol = %request.symbol,
                "Order rejected by fill-probability roll"
            );
            state.trade_history.push(order.clone());
            return Ok(order);
        }

        let reference = *state
            .prices
            .get(&request.symbol)
            .ok_or_else(|| ExchangeError::PriceUnavailable(request.symbol.clone()))?;

        let execution_price = match request.order_type {
            OrderType::Market => match request.action {
                OrderAction::Buy => reference * (Decimal::ONE + self.slippage_factor),
                OrderAction::Sell => reference * (Decimal::ONE - self.slippage_factor),
            },
            OrderType::Limit => {
                let limit = request.price.ok_or_else(|| {
                    ExchangeError::OrderPlacement("limit order without a price".to_string())
                })?;
                let crossed = match request.action {
                    OrderAction::Buy => reference <= limit,
                    OrderAction::Sell => reference >= limit,
                };
                if !crossed {
                    // Rests in the book; no funds move until it matches.
                    let order = self.record_from(&request, limit, OrderStatus::Open);
                    info!(
                        order_id = %order.order_id,
                        symbol = %request.symbol,
                        action = %request.action,
                        limit = %limit,
                        reference = %reference,
                        "Limit order resting open"
                    );
                    state.open_orders.insert(order.order_id.clone(), order.clone());
                    return Ok(order);
                }
                limit
            }
        };

        let commission = settle_leg(
            &mut state.portfolio,
            base,
            quote,
            request.action,
            request.quantity,
            execution_price,
            self.commission_rate,
        )?;

        let mut order = self.record_from(&request, execution_price, OrderStatus::Filled);
        order.fee = commission;
        order.fee_currency = Some(quote.to_string());
        order
            .metadata
            .insert("reference_price".to_string(), reference.to_string());

        info!(
            order_id = %order.order_id,
            symbol = %order.symbol,
            action = %order.action,
            quantity = %order.quantity,
            price = %order.price,
            fee = %order.fee,
            strategy = %request.strategy_name,
            "Order filled"
        );
        state.trade_history.push(order.clone());
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<bool, ExchangeError> {
        let mut state = self.state.write().await;
        match state.open_orders.remove(order_id) {
            Some(mut order) => {
                order.status = OrderStatus::Canceled;
                order.timestamp = Utc::now();
                info!(order_id, symbol = %order.symbol, "Order canceled");
                state.trade_history.push(order);
                Ok(true)
            }
            None => {
                debug!(order_id, "Cancel requested for unknown or settled order");
                Ok(false)
            }
        }
    }

    async fn get_order_status(
        &self,
        order_id: &str,
    ) -> Result<Option<ExecutedOrder>, ExchangeError> {
        let state = self.state.read().await;
        if let Some(order) = state.open_orders.get(order_id) {
            return Ok(Some(order.clone()));
        }
        Ok(state
            .trade_history
            .iter()
            .rev()
            .find(|order| order.order_id == order_id)
            .cloned())
    }

    async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<ExecutedOrder>, ExchangeError> {
        let state = self.state.read().await;
        Ok(state
            .open_orders
            .values()
            .filter(|order| symbol.map_or(true, |s| order.symbol == s))
            .cloned()
            .collect())
    }

    async fn get_account_balance(&self) -> Result<Portfolio, ExchangeError> {
        let state = self.state.read().await;
        let mut snapshot = state.portfolio.clone();
        snapshot.last_updated = Utc::now();
        Ok(snapshot)
    }

    async fn get_current_price(&self, symbol: &str) -> Result<Option<Decimal>, ExchangeError> {
        Ok(self.state.read().await.prices.get(symbol).copied())
    }

    async fn refresh(&self, prices: &HashMap<String, Decimal>) -> Result<(), ExchangeError> {
        let mut state = self.state.write().await;
        for (symbol, price) in prices {
            state.prices.insert(symbol.clone(), *price);
        }

        // Re-evaluate resting limits against the updated book.
        let crossed: Vec<String> = state
            .open_orders
            .values()
            .filter(|order| {
                state.prices.get(&order.symbol).is_some_and(|reference| match order.action {
                    OrderAction::Buy => *reference <= order.price,
                    OrderAction::Sell => *reference >= order.price,
                })
            })
            .map(|order| order.order_id.clone())
            .collect();

        for order_id in crossed {
            let Some(mut order) = state.open_orders.remove(&order_id) else {
                continue;
            };
            let Some((base, quote)) = split_symbol(&order.symbol) else {
                continue;
            };
            let (base, quote) = (base.to_string(), quote.to_string());

            match settle_leg(
                &mut state.portfolio,
                &base,
                &quote,
                order.action,
                order.quantity,
                order.price,
                self.commission_rate,
            ) {
                Ok(commission) => {
                    order.status = OrderStatus::Filled;
                    order.fee = commission;
                    order.fee_currency = Some(quote);
                    order.timestamp = Utc::now();
                    order
                        .metadata
                        .insert("matched".to_string(), "resting limit crossed".to_string());
                    info!(
                        order_id = %order.order_id,
                        symbol = %order.symbol,
                        action = %order.action,
                        price = %order.price,
                        "Resting limit order matched"
                    );
                }
                Err(ExchangeError::InsufficientFunds { currency, needed, available }) => {
                    // The account can no longer fund the resting order;
                    // reject it rather than leave it open forever.
                    order.status = OrderStatus::Rejected;
                    order.timestamp = Utc::now();
                    order.metadata.insert(
                        "reason".to_string(),
                        format!("unfunded at match: need {needed} {currency}, have {available}"),
                    );
                    warn!(
                        order_id = %order.order_id,
                        symbol = %order.symbol,
                        "Resting limit order rejected at match time (insufficient funds)"
                    );
                }
                Err(e) => return Err(e),
            }
            state.trade_history.push(order);
        }

        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ExchangeError> {
        let mut state = self.state.write().await;
        let dropped = state.open_orders.len();
        state.open_orders.clear();
        info!(dropped_open_orders = dropped, "Simulated exchange shut down");
        Ok(())
    }
}
