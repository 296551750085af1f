//! News-sentiment strategy.

use crate::exchange::{split_symbol, ExecutedOrder, OrderAction, OrderStatus};
use crate::news::{Article, NewsProvider, SentimentAnalyzer};
use crate::portfolio::Portfolio;
use crate::strategy::{SignalAction, Strategy, TradingSignal};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const MAX_CONFIDENCE: f64 = 0.95;

fn default_target_symbols() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string()]
}
fn default_news_fetch_limit() -> usize {
    10
}
fn default_threshold_buy() -> f64 {
    0.6
}
fn default_threshold_sell() -> f64 {
    -0.4
}
fn default_trade_quantity_percentage() -> Decimal {
    Decimal::new(5, 2)
}
fn default_news_max_age_hours() -> i64 {
    24
}
fn default_quote_currency() -> String {
    "USDT".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentParams {
    /// Base assets to track, e.g. ["BTC", "ETH"].
    #[serde(default = "default_target_symbols")]
    pub target_symbols: Vec<String>,
    #[serde(default = "default_news_fetch_limit")]
    pub news_fetch_limit: usize,
    /// Average score above which to buy.
    #[serde(default = "default_threshold_buy")]
    pub sentiment_threshold_buy: f64,
    /// Average score below which to sell.
    #[serde(default = "default_threshold_sell")]
    pub sentiment_threshold_sell: f64,
    #[serde(default = "default_trade_quantity_percentage")]
    pub trade_quantity_percentage: Decimal,
    #[serde(default = "default_news_max_age_hours")]
    pub news_max_age_hours: i64,
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
}

impl Default for SentimentParams {
    fn default() -> Self {
        Self {
            target_symbols: default_target_symbols(),
            news_fetch_limit: default_news_fetch_limit(),
            sentiment_threshold_buy: default_threshold_buy(),
            sentiment_threshold_sell: default_threshold_sell(),
            trade_quantity_percentage: default_trade_quantity_percentage(),
            news_max_age_hours: default_news_max_age_hours(),
            quote_currency: default_quote_currency(),
        }
    }
}

/// Trades each target asset on the average sentiment of its recent
/// headlines. One signal per asset per cycle; positions are tracked
/// per asset with optimistic flags corrected by fills.
pub struct SentimentStrategy {
    name: String,
    params: SentimentParams,
    news: Arc<dyn NewsProvider>,
    analyzer: Arc<dyn SentimentAnalyzer>,
    initialized: bool,
    active_positions: HashMap<String, bool>,
    last_scores: HashMap<String, f64>,
}

impl SentimentStrategy {
    pub fn new(
        name: impl Into<String>,
        params: SentimentParams,
        news: Arc<dyn NewsProvider>,
        analyzer: Arc<dyn SentimentAnalyzer>,
    ) -> anyhow::Result<Self> {
        if params.sentiment_threshold_sell >= params.sentiment_threshold_buy {
            anyhow::bail!(
                "sell threshold {} must be below buy threshold {}",
                params.sentiment_threshold_sell,
                params.sentiment_threshold_buy
            );
        }
        let active_positions = params
            .target_symbols
            .iter()
            .map(|s| (s.clone(), false))
            .collect();
        Ok(Self {
            name: name.into(),
            params,
            news,
            analyzer,
            initialized: false,
            active_positions,
            last_scores: HashMap::new(),
        })
    }

    /// Average score over the articles, skipping `Uncertain` results
    /// and per-article analyzer failures. `None` if nothing scored.
    async fn score_articles(&self, base: &str, articles: &[Article]) -> Option<f64> {
        let mut total = 0.0;
        let mut scored = 0usize;
        for article in articles {
            let text = if article.summary.is_empty() {
                article.title.clone()
            } else {
                format!("{}. {}", article.title, article.summary)
            };
            match self.analyzer.analyze_sentiment(&text).await {
                Ok(sentiment) => {
                    if let Some(score) = sentiment.score() {
                        total += score;
                        scored += 1;
                        debug!(strategy = %self.name, base, title = %article.title, score, "Article scored");
                    }
                }
                Err(e) => {
                    error!(strategy = %self.name, title = %article.title, error = %e, "Sentiment analysis failed");
                }
            }
        }
        if scored == 0 {
            return None;
        }
        Some(total / scored as f64)
    }

    fn confidence_from(score: f64, threshold: f64) -> f64 {
        (0.5 + (score - threshold).abs() * 0.5).min(MAX_CONFIDENCE)
    }
}

#[async_trait]
impl Strategy for SentimentStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn watched_symbols(&self) -> Vec<String> {
        self.params
            .target_symbols
            .iter()
            .map(|base| format!("{}/{}", base, self.params.quote_currency))
            .collect()
    }

    async fn initialize(&mut self) -> anyhow::Result<()> {
        info!(
            strategy = %self.name,
            targets = ?self.params.target_symbols,
            buy_threshold = self.params.sentiment_threshold_buy,
            sell_threshold = self.params.sentiment_threshold_sell,
            "Initializing sentiment strategy"
        );
        self.initialized = true;
        Ok(())
    }

    async fn generate_signals(
        &mut self,
        portfolio: &Portfolio,
    ) -> anyhow::Result<Vec<TradingSignal>> {
        let mut signals = Vec::with_capacity(self.params.target_symbols.len());
        let cutoff = Utc::now() - Duration::hours(self.params.news_max_age_hours);

        for base in self.params.target_symbols.clone() {
            let pair = format!("{}/{}", base, self.params.quote_currency);

            let articles: Vec<Article> = match self
                .news
                .get_recent_articles(&base, self.params.news_fetch_limit)
                .await
            {
                Ok(articles) => articles
                    .into_iter()
                    .filter(|a| a.published_at >= cutoff)
                    .collect(),
                Err(e) => {
                    error!(strategy = %self.name, base = %base, error = %e, "News fetch failed");
                    signals.push(TradingSignal::hold(pair, self.name.clone(), "news unavailable"));
                    continue;
                }
            };

            if articles.is_empty() {
                debug!(strategy = %self.name, base = %base, "No recent news");
                signals.push(TradingSignal::hold(pair, self.name.clone(), "no recent news"));
                continue;
            }

            let Some(score) = self.score_articles(&base, &articles).await else {
                signals.push(TradingSignal::hold(
                    pair,
                    self.name.clone(),
                    "no scorable articles",
                ));
                continue;
            };
            self.last_scores.insert(base.clone(), score);
            info!(
                strategy = %self.name,
                symbol = %pair,
                score,
                articles = articles.len(),
                "Average sentiment"
            );

            let mut metadata = HashMap::new();
            metadata.insert("sentiment_score".to_string(), format!("{score:.3}"));
            metadata.insert("articles".to_string(), articles.len().to_string());

            let holding = self.active_positions.get(&base).copied().unwrap_or(false);

            if score > self.params.sentiment_threshold_buy {
                if holding {
                    info!(strategy = %self.name, symbol = %pair, "Positive sentiment but position already active");
                } else if portfolio.cash(&self.params.quote_currency) <= Decimal::ZERO {
                    warn!(strategy = %self.name, symbol = %pair, "Positive sentiment but no cash to buy");
                } else {
                    metadata.insert("reason".to_string(), "positive sentiment".to_string());
                    self.active_positions.insert(base.clone(), true);
                    signals.push(TradingSignal {
                        symbol: pair,
                        action: SignalAction::Buy,
                        confidence: Self::confidence_from(score, self.params.sentiment_threshold_buy),
                        quantity_percentage: Some(self.params.trade_quantity_percentage),
                        quantity_absolute: None,
                        price: None,
                        strategy_name: self.name.clone(),
                        metadata,
                    });
                    continue;
                }
            } else if score < self.params.sentiment_threshold_sell {
                if !holding {
                    info!(strategy = %self.name, symbol = %pair, "Negative sentiment but no active position");
                } else if portfolio.asset(&base) <= Decimal::ZERO {
                    warn!(strategy = %self.name, symbol = %pair, "Negative sentiment but nothing to sell, resetting flag");
                    self.active_positions.insert(base.clone(), false);
                } else {
                    metadata.insert("reason".to_string(), "negative sentiment".to_string());
                    self.active_positions.insert(base.clone(), false);
                    signals.push(TradingSignal {
                        symbol: pair,
                        action: SignalAction::Sell,
                        confidence: Self::confidence_from(score, self.params.sentiment_threshold_sell),
                        quantity_percentage: Some(Decimal::ONE),
                        quantity_absolute: None,
                        price: None,
                        strategy_name: self.name.clone(),
                        metadata,
                    });
                    continue;
                }
            }

            let mut hold = TradingSignal::hold(pair, self.name.clone(), "sentiment within thresholds");
            hold.metadata.extend(metadata);
            signals.push(hold);
        }

        Ok(signals)
    }

    async fn on_order_update(&mut self, order: &ExecutedOrder) {
        let Some((base, _)) = split_symbol(&order.symbol) else {
            return;
        };
        if !self.params.target_symbols.iter().any(|s| s == base)
            || order.status != OrderStatus::Filled
        {
            return;
        }
        let active = matches!(order.action, OrderAction::Buy);
        self.active_positions.insert(base.to_string(), active);
        info!(
            strategy = %self.name,
            base,
            active,
            order_id = %order.order_id,
            "Position flag updated from fill"
        );
    }

    fn get_status(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "kind": "sentiment",
            "initialized": self.initialized,
            "target_symbols": self.params.target_symbols,
            "active_positions": self.active_positions,
            "last_scores": self.last_scores,
            "buy_threshold": self.params.sentiment_threshold_buy,
            "sell_threshold": self.params.sentiment_threshold_sell,
        })
    }

    async fn shutdown(&mut self) -> anyhow::Result<()> {
        info!(strategy = %self.name, "Shutting down");
        self.initialized = false;
        Ok(())
    }
}
