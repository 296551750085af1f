//! The trading agent orchestrator.
//!
//! Runs the periodic cycle: refresh prices, snapshot the portfolio,
//! collect signals from every initialized strategy, then translate and
//! submit them one at a time. Submission is strictly sequential and the
//! portfolio is re-fetched before each signal is sized, so two signals
//! can never commit the same balance twice within a cycle.

use crate::config::AgentConfig;
use crate::exchange::{
    split_symbol, ExchangeAdapter, ExchangeError, OrderAction, OrderRequest, OrderType,
};
use crate::market::{MarketDataSource, Ticker};
use crate::portfolio::Portfolio;
use crate::strategy::{MarketEvent, SignalAction, Strategy, TradingSignal};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Resolved quantities at or below this are noise from percentage
/// division, not tradeable orders.
const DUST_EPSILON: Decimal = dec!(0.000000001);

pub struct TradingAgent {
    config: AgentConfig,
    adapter: Arc<dyn ExchangeAdapter>,
    market: Arc<dyn MarketDataSource>,
    strategies: Vec<Box<dyn Strategy>>,
    running: Arc<AtomicBool>,
    cycles_completed: u64,
}

impl TradingAgent {
    pub fn new(
        config: AgentConfig,
        adapter: Arc<dyn ExchangeAdapter>,
        market: Arc<dyn MarketDataSource>,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Self {
        Self {
            config,
            adapter,
            market,
            strategies,
            running: Arc::new(AtomicBool::new(true)),
            cycles_completed: 0,
        }
    }

    /// Flag shared with signal handlers; storing `false` stops the loop
    /// after the current cycle or sleep.
    pub fn running_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Initialize the ledger and the strategies, then run the periodic
    /// trading loop until stopped (or `max_cycles` is reached).
    ///
    /// Adapter initialization failure is fatal; a strategy that fails
    /// to initialize is merely excluded from every cycle.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.adapter
            .initialize()
            .await
            .map_err(|e| anyhow::anyhow!(e).context("exchange adapter initialization failed"))?;

        let results = join_all(self.strategies.iter_mut().map(|s| s.initialize())).await;
        for (strategy, result) in self.strategies.iter().zip(results) {
            if let Err(e) = result {
                error!(
                    strategy = %strategy.name(),
                    error = %e,
                    "Strategy failed to initialize and will be skipped"
                );
            }
        }
        let active = self.strategies.iter().filter(|s| s.is_initialized()).count();
        info!(
            strategies = self.strategies.len(),
            active,
            interval_secs = self.config.trading_interval_secs,
            "Trading agent started"
        );

        let interval = Duration::from_secs(self.config.trading_interval_secs);

        while self.running.load(Ordering::SeqCst) {
            self.run_cycle().await;
            self.cycles_completed += 1;

            if let Some(max) = self.config.max_cycles {
                if self.cycles_completed >= max {
                    info!(cycles = self.cycles_completed, "Cycle limit reached");
                    break;
                }
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(interval).await;
        }

        self.shutdown().await;
        Ok(())
    }

    /// Request a stop; takes effect after the in-flight cycle or sleep.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn get_status(&self) -> serde_json::Value {
        json!({
            "running": self.running.load(Ordering::SeqCst),
            "cycles_completed": self.cycles_completed,
            "strategies": self.strategies.iter().map(|s| s.get_status()).collect::<Vec<_>>(),
        })
    }

    async fn run_cycle(&mut self) {
        let cycle = self.cycles_completed + 1;
        debug!(cycle, "Cycle started");

        // Fresh reference prices for every symbol any strategy trades.
        // The simulated adapter also matches resting limit orders here.
        let tickers = self.fetch_watched_tickers().await;
        let prices: HashMap<String, Decimal> = tickers
            .iter()
            .map(|t| (t.symbol.clone(), t.last_price))
            .collect();
        if let Err(e) = self.adapter.refresh(&prices).await {
            error!(error = %e, "Price refresh failed");
        }

        for ticker in &tickers {
            for strategy in &mut self.strategies {
                if !strategy.is_initialized() {
                    continue;
                }
                if let Err(e) = strategy.on_data(MarketEvent::Ticker(ticker.clone())).await {
                    warn!(strategy = %strategy.name(), error = %e, "Market event handler failed");
                }
            }
        }

        // One snapshot for all strategies: every strategy sizes its
        // view of the world against the same cycle-start balances.
        let snapshot = match self.adapter.get_account_balance().await {
            Ok(portfolio) => portfolio,
            Err(e) => {
                error!(error = %e, "Could not fetch portfolio, skipping cycle");
                return;
            }
        };

        let mut signals: Vec<TradingSignal> = Vec::new();
        for strategy in &mut self.strategies {
            if !strategy.is_initialized() {
                debug!(strategy = %strategy.name(), "Skipping uninitialized strategy");
                continue;
            }
            match strategy.generate_signals(&snapshot).await {
                Ok(generated) => signals.extend(generated),
                Err(e) => {
                    error!(
                        strategy = %strategy.name(),
                        error = %e,
                        "Signal generation failed, strategy contributes nothing this cycle"
                    );
                }
            }
        }

        info!(cycle, signals = signals.len(), "Signals collected");
        for signal in signals {
            self.process_signal(signal).await;
        }

        if let Ok(mut portfolio) = self.adapter.get_account_balance().await {
            let asset_prices: HashMap<String, Decimal> = prices
                .iter()
                .filter_map(|(pair, price)| {
                    split_symbol(pair).map(|(base, _)| (base.to_string(), *price))
                })
                .collect();
            let total = portfolio.calculate_total_value(&asset_prices);
            info!(cycle, total_value = %total, "Cycle finished");
        }
    }

    /// Tickers for the union of all watched symbols. A symbol whose
    /// ticker cannot be fetched keeps its previous adapter price.
    async fn fetch_watched_tickers(&self) -> Vec<Ticker> {
        let mut symbols: Vec<String> = self
            .strategies
            .iter()
            .filter(|s| s.is_initialized())
            .flat_map(|s| s.watched_symbols())
            .collect();
        symbols.sort();
        symbols.dedup();

        let mut tickers = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.market.fetch_ticker(&symbol).await {
                Ok(ticker) => tickers.push(ticker),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Ticker fetch failed");
                }
            }
        }
        tickers
    }

    /// Translate and submit one signal. Every skip is logged; no signal
    /// disappears silently.
    async fn process_signal(&mut self, signal: TradingSignal) {
        if signal.action == SignalAction::Hold {
            debug!(
                strategy = %signal.strategy_name,
                symbol = %signal.symbol,
                reason = signal.metadata.get("reason").map(String::as_str).unwrap_or(""),
                "Hold signal"
            );
            return;
        }

        // Re-fetch before sizing: earlier submissions in this cycle
        // have already moved the balances.
        let portfolio = match self.adapter.get_account_balance().await {
            Ok(portfolio) => portfolio,
            Err(e) => {
                error!(
                    strategy = %signal.strategy_name,
                    symbol = %signal.symbol,
                    error = %e,
                    "Could not fetch portfolio, signal skipped"
                );
                return;
            }
        };

        let Some(request) = self.translate_signal(&signal, &portfolio).await else {
            return;
        };

        match self.adapter.create_order(request).await {
            Ok(order) => {
                info!(
                    strategy = %signal.strategy_name,
                    order_id = %order.order_id,
                    symbol = %order.symbol,
                    action = %order.action,
                    status = ?order.status,
                    quantity = %order.quantity,
                    price = %order.price,
                    "Order submitted"
                );
                for strategy in &mut self.strategies {
                    if strategy.name() == signal.strategy_name {
                        strategy.on_order_update(&order).await;
                        break;
                    }
                }
            }
            Err(ExchangeError::InsufficientFunds {
                currency,
                needed,
                available,
            }) => {
                warn!(
                    strategy = %signal.strategy_name,
                    symbol = %signal.symbol,
                    currency = %currency,
                    %needed,
                    %available,
                    "Insufficient funds, signal skipped"
                );
            }
            Err(e) => {
                error!(
                    strategy = %signal.strategy_name,
                    symbol = %signal.symbol,
                    error = %e,
                    "Order placement failed, signal skipped"
                );
            }
        }
    }

    /// Resolve a non-HOLD signal into an order request against the
    /// given portfolio snapshot. `None` means the signal was skipped
    /// (and the reason logged).
    async fn translate_signal(
        &self,
        signal: &TradingSignal,
        portfolio: &Portfolio,
    ) -> Option<OrderRequest> {
        let action = match signal.action {
            SignalAction::Buy => OrderAction::Buy,
            SignalAction::Sell => OrderAction::Sell,
            SignalAction::Hold => return None,
        };

        let Some((base, quote)) = split_symbol(&signal.symbol) else {
            warn!(
                strategy = %signal.strategy_name,
                symbol = %signal.symbol,
                "Malformed symbol, signal skipped"
            );
            return None;
        };

        let quantity = if let Some(absolute) = signal.quantity_absolute {
            absolute
        } else if let Some(percentage) = signal.quantity_percentage {
            match action {
                OrderAction::Buy => {
                    let Some(reference) = self.reference_price(signal).await else {
                        warn!(
                            strategy = %signal.strategy_name,
                            symbol = %signal.symbol,
                            "No reference price to size buy, signal skipped"
                        );
                        return None;
                    };
                    if reference <= Decimal::ZERO {
                        warn!(
                            strategy = %signal.strategy_name,
                            symbol = %signal.symbol,
                            %reference,
                            "Non-positive reference price, signal skipped"
                        );
                        return None;
                    }
                    percentage * portfolio.cash(quote) / reference
                }
                OrderAction::Sell => percentage * portfolio.asset(base),
            }
        } else {
            warn!(
                strategy = %signal.strategy_name,
                symbol = %signal.symbol,
                "Signal carries no quantity, skipped"
            );
            return None;
        };

        if quantity <= DUST_EPSILON {
            warn!(
                strategy = %signal.strategy_name,
                symbol = %signal.symbol,
                %quantity,
                "Resolved quantity is dust, signal skipped"
            );
            return None;
        }

        let order_type = if signal.price.is_some() {
            OrderType::Limit
        } else {
            OrderType::Market
        };
        let price = match order_type {
            OrderType::Limit => signal.price,
            OrderType::Market => None,
        };

        Some(OrderRequest::new(
            signal.symbol.clone(),
            action,
            order_type,
            quantity,
            price,
            signal.strategy_name.clone(),
        ))
    }

    /// Signal price, else the adapter's reference, else a fresh ticker.
    async fn reference_price(&self, signal: &TradingSignal) -> Option<Decimal> {
        if let Some(price) = signal.price {
            return Some(price);
        }
        if let Ok(Some(price)) = self.adapter.get_current_price(&signal.symbol).await {
            return Some(price);
        }
        match self.market.fetch_ticker(&signal.symbol).await {
            Ok(ticker) => Some(ticker.last_price),
            Err(e) => {
                debug!(symbol = %signal.symbol, error = %e, "Ticker fallback failed");
                None
            }
        }
    }

    /// Concurrent strategy shutdown with isolated failures, then the
    /// adapter.
    async fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        let results = join_all(self.strategies.iter_mut().map(|s| s.shutdown())).await;
        for (strategy, result) in self.strategies.iter().zip(results) {
            if let Err(e) = result {
                error!(strategy = %strategy.name(), error = %e, "Strategy shutdown failed");
            }
        }

        if let Err(e) = self.adapter.shutdown().await {
            error!(error = %e, "Adapter shutdown failed");
        }
        info!(cycles = self.cycles_completed, "Trading agent stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{ExecutedOrder, OrderStatus, SimulatedExchange, SimulatedExchangeConfig};
    use crate::market::{Candle, MarketDataError, Ticker};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Feed that always quotes the same price for every symbol.
    struct FlatFeed {
        price: Decimal,
    }

    #[async_trait]
    impl MarketDataSource for FlatFeed {
        async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, MarketDataError> {
            Ok(Ticker {
                symbol: symbol.to_string(),
                last_price: self.price,
                bid: self.price,
                ask: self.price,
                timestamp: Utc::now(),
            })
        }

        async fn fetch_ohlcv(
            &self,
            _symbol: &str,
            _timeframe: &str,
            limit: usize,
        ) -> Result<Vec<Candle>, MarketDataError> {
            Ok((0..limit)
                .map(|_| Candle {
                    timestamp: Utc::now(),
                    open: self.price,
                    high: self.price,
                    low: self.price,
                    close: self.price,
                    volume: Decimal::ONE,
                })
                .collect())
        }
    }

    /// Strategy that emits a fixed signal list every cycle and records
    /// the order updates it receives.
    struct ScriptedStrategy {
        name: String,
        signals: Vec<TradingSignal>,
        initialized: bool,
        fail_init: bool,
        updates: Arc<Mutex<Vec<ExecutedOrder>>>,
    }

    impl ScriptedStrategy {
        fn new(name: &str, signals: Vec<TradingSignal>) -> Self {
            Self {
                name: name.to_string(),
                signals,
                initialized: false,
                fail_init: false,
                updates: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Strategy for ScriptedStrategy {
        fn name(&self) -> &str {
            &self.name
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn watched_symbols(&self) -> Vec<String> {
            vec!["BTC/USDT".to_string()]
        }

        async fn initialize(&mut self) -> anyhow::Result<()> {
            if self.fail_init {
                anyhow::bail!("scripted failure");
            }
            self.initialized = true;
            Ok(())
        }

        async fn generate_signals(
            &mut self,
            _portfolio: &Portfolio,
        ) -> anyhow::Result<Vec<TradingSignal>> {
            Ok(self.signals.clone())
        }

        async fn on_order_update(&mut self, order: &ExecutedOrder) {
            self.updates.lock().unwrap().push(order.clone());
        }

        fn get_status(&self) -> serde_json::Value {
            json!({ "name": self.name, "initialized": self.initialized })
        }

        async fn shutdown(&mut self) -> anyhow::Result<()> {
            self.initialized = false;
            Ok(())
        }
    }

    fn buy_signal(strategy: &str, percentage: Decimal) -> TradingSignal {
        TradingSignal {
            symbol: "BTC/USDT".to_string(),
            action: SignalAction::Buy,
            confidence: 0.8,
            quantity_percentage: Some(percentage),
            quantity_absolute: None,
            price: None,
            strategy_name: strategy.to_string(),
            metadata: HashMap::new(),
        }
    }

    fn sim_exchange() -> Arc<SimulatedExchange> {
        let mut config = SimulatedExchangeConfig::default();
        config
            .initial_prices
            .insert("BTC/USDT".to_string(), dec!(50000));
        config.slippage_factor = Decimal::ZERO;
        Arc::new(SimulatedExchange::new(config))
    }

    fn one_cycle_config() -> AgentConfig {
        AgentConfig {
            quote_currency: "USDT".to_string(),
            initial_capital: HashMap::new(),
            trading_interval_secs: 1,
            max_cycles: Some(1),
        }
    }

    fn agent_with(
        adapter: Arc<dyn ExchangeAdapter>,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> TradingAgent {
        TradingAgent::new(
            one_cycle_config(),
            adapter,
            Arc::new(FlatFeed { price: dec!(50000) }),
            strategies,
        )
    }

    #[tokio::test]
    async fn test_translate_absolute_quantity_wins() {
        let agent = agent_with(sim_exchange(), vec![]);
        let mut signal = buy_signal("s", dec!(0.5));
        signal.quantity_absolute = Some(dec!(0.25));

        let request = agent
            .translate_signal(&signal, &Portfolio::default())
            .await
            .expect("signal should translate");

        assert_eq!(request.quantity, dec!(0.25));
        assert_eq!(request.order_type, OrderType::Market);
        assert!(request.price.is_none());
    }

    #[tokio::test]
    async fn test_translate_buy_percentage_against_quote() {
        let agent = agent_with(sim_exchange(), vec![]);
        let mut cash = HashMap::new();
        cash.insert("USDT".to_string(), dec!(10000));
        let portfolio = Portfolio::with_cash(cash);

        // 10% of 10000 USDT at the adapter's 50000 reference.
        let request = agent
            .translate_signal(&buy_signal("s", dec!(0.1)), &portfolio)
            .await
            .expect("signal should translate");

        assert_eq!(request.quantity, dec!(0.02));
        assert_eq!(request.action, OrderAction::Buy);
    }

    #[tokio::test]
    async fn test_translate_sell_percentage_against_base() {
        let agent = agent_with(sim_exchange(), vec![]);
        let mut portfolio = Portfolio::default();
        portfolio.update_asset("BTC", dec!(0.4));

        let mut signal = buy_signal("s", dec!(0.5));
        signal.action = SignalAction::Sell;

        let request = agent
            .translate_signal(&signal, &portfolio)
            .await
            .expect("signal should translate");

        assert_eq!(request.quantity, dec!(0.2));
        assert_eq!(request.action, OrderAction::Sell);
    }

    #[tokio::test]
    async fn test_translate_limit_iff_signal_price() {
        let agent = agent_with(sim_exchange(), vec![]);
        let mut signal = buy_signal("s", dec!(0.1));
        signal.price = Some(dec!(49000));

        let mut cash = HashMap::new();
        cash.insert("USDT".to_string(), dec!(10000));
        let portfolio = Portfolio::with_cash(cash);

        let request = agent
            .translate_signal(&signal, &portfolio)
            .await
            .expect("signal should translate");

        assert_eq!(request.order_type, OrderType::Limit);
        assert_eq!(request.price, Some(dec!(49000)));
    }

    #[tokio::test]
    async fn test_translate_skips_dust() {
        let agent = agent_with(sim_exchange(), vec![]);
        let mut signal = buy_signal("s", dec!(0.5));
        signal.action = SignalAction::Sell;

        // Nothing held: percentage of zero resolves to zero.
        let request = agent
            .translate_signal(&signal, &Portfolio::default())
            .await;

        assert!(request.is_none());
    }

    #[tokio::test]
    async fn test_translate_skips_quantityless_signal() {
        let agent = agent_with(sim_exchange(), vec![]);
        let mut signal = buy_signal("s", dec!(0.1));
        signal.quantity_percentage = None;

        assert!(agent
            .translate_signal(&signal, &Portfolio::default())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_sequential_submission_prevents_double_spend() {
        let exchange = sim_exchange();
        // Two strategies each want 60% of the quote balance. Sizing
        // the second against the refetched portfolio keeps the sum
        // below 100%.
        let first = ScriptedStrategy::new("first", vec![buy_signal("first", dec!(0.6))]);
        let second = ScriptedStrategy::new("second", vec![buy_signal("second", dec!(0.6))]);

        let mut agent = agent_with(exchange.clone(), vec![Box::new(first), Box::new(second)]);
        agent.start().await.unwrap();

        let portfolio = exchange.get_account_balance().await.unwrap();
        assert!(portfolio.cash("USDT") > Decimal::ZERO);

        let history = exchange.trade_history().await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|o| o.status == OrderStatus::Filled));
        // The second order was sized against the already-debited balance.
        assert!(history[1].quantity < history[0].quantity);
    }

    #[tokio::test]
    async fn test_order_updates_reach_originating_strategy() {
        let exchange = sim_exchange();
        let strategy = ScriptedStrategy::new("solo", vec![buy_signal("solo", dec!(0.1))]);
        let updates = strategy.updates.clone();

        let mut agent = agent_with(exchange, vec![Box::new(strategy)]);
        agent.start().await.unwrap();

        let received = updates.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].status, OrderStatus::Filled);
        assert_eq!(received[0].action, OrderAction::Buy);
    }

    #[tokio::test]
    async fn test_failed_strategy_init_is_isolated() {
        let exchange = sim_exchange();
        let mut broken = ScriptedStrategy::new("broken", vec![buy_signal("broken", dec!(0.1))]);
        broken.fail_init = true;
        let healthy = ScriptedStrategy::new("healthy", vec![buy_signal("healthy", dec!(0.1))]);

        let mut agent = agent_with(exchange.clone(), vec![Box::new(broken), Box::new(healthy)]);
        agent.start().await.unwrap();

        // Only the healthy strategy traded.
        let history = exchange.trade_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].metadata.get("reference_price").map(String::as_str),
            Some("50000")
        );
    }

    #[tokio::test]
    async fn test_adapter_init_failure_is_fatal() {
        struct BrokenAdapter;

        #[async_trait]
        impl ExchangeAdapter for BrokenAdapter {
            async fn initialize(&self) -> Result<(), ExchangeError> {
                Err(ExchangeError::OrderPlacement("connection refused".to_string()))
            }
            async fn create_order(
                &self,
                _request: OrderRequest,
            ) -> Result<ExecutedOrder, ExchangeError> {
                unreachable!()
            }
            async fn cancel_order(&self, _order_id: &str) -> Result<bool, ExchangeError> {
                unreachable!()
            }
            async fn get_order_status(
                &self,
                _order_id: &str,
            ) -> Result<Option<ExecutedOrder>, ExchangeError> {
                unreachable!()
            }
            async fn get_open_orders(
                &self,
                _symbol: Option<&str>,
            ) -> Result<Vec<ExecutedOrder>, ExchangeError> {
                unreachable!()
            }
            async fn get_account_balance(&self) -> Result<Portfolio, ExchangeError> {
                unreachable!()
            }
            async fn get_current_price(
                &self,
                _symbol: &str,
            ) -> Result<Option<Decimal>, ExchangeError> {
                unreachable!()
            }
            async fn shutdown(&self) -> Result<(), ExchangeError> {
                Ok(())
            }
        }

        let mut agent = agent_with(Arc::new(BrokenAdapter), vec![]);
        assert!(agent.start().await.is_err());
    }

    #[tokio::test]
    async fn test_stop_before_start_runs_no_cycles() {
        let exchange = sim_exchange();
        let strategy = ScriptedStrategy::new("solo", vec![buy_signal("solo", dec!(0.1))]);

        let mut agent = agent_with(exchange.clone(), vec![Box::new(strategy)]);
        agent.stop();
        agent.start().await.unwrap();

        assert!(exchange.trade_history().await.is_empty());
        let status = agent.get_status();
        assert_eq!(status["running"], json!(false));
        assert_eq!(status["cycles_completed"], json!(0));
    }

    #[tokio::test]
    async fn test_status_reports_strategies() {
        let strategy = ScriptedStrategy::new("solo", vec![]);
        let mut agent = agent_with(sim_exchange(), vec![Box::new(strategy)]);
        agent.start().await.unwrap();

        let status = agent.get_status();
        assert_eq!(status["cycles_completed"], json!(1));
        assert_eq!(status["strategies"][0]["name"], json!("solo"));
    }

    #[tokio::test]
    async fn test_insufficient_funds_skips_signal_only() {
        let exchange = sim_exchange();
        // An absolute quantity far beyond the balance, followed by an
        // affordable signal from another strategy.
        let mut big = buy_signal("greedy", dec!(0.1));
        big.quantity_absolute = Some(dec!(100));
        let greedy = ScriptedStrategy::new("greedy", vec![big]);
        let modest = ScriptedStrategy::new("modest", vec![buy_signal("modest", dec!(0.1))]);

        let mut agent = agent_with(exchange.clone(), vec![Box::new(greedy), Box::new(modest)]);
        agent.start().await.unwrap();

        let history = exchange.trade_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, OrderStatus::Filled);

        let portfolio = exchange.get_account_balance().await.unwrap();
        assert!(portfolio.cash("USDT") > Decimal::ZERO);
    }
}
