//! Strategy construction from configuration.

use crate::config::StrategySpec;
use crate::market::MarketDataSource;
use crate::news::{NewsProvider, SentimentAnalyzer};
use crate::strategy::{MaCrossoverStrategy, SentimentStrategy, Strategy};
use std::sync::Arc;
use tracing::{error, info};

/// Build the strategy roster from config entries.
///
/// A bad entry (unknown kind, invalid params) excludes only that
/// strategy; the rest of the roster is unaffected.
pub fn build_strategies(
    specs: &[StrategySpec],
    market: Arc<dyn MarketDataSource>,
    news: Arc<dyn NewsProvider>,
    analyzer: Arc<dyn SentimentAnalyzer>,
) -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = Vec::with_capacity(specs.len());

    for spec in specs {
        let built: anyhow::Result<Box<dyn Strategy>> = match spec.kind.as_str() {
            "ma_crossover" => serde_json::from_value(spec.params.clone())
                .map_err(anyhow::Error::from)
                .and_then(|params| {
                    MaCrossoverStrategy::new(spec.name.clone(), params, market.clone())
                })
                .map(|s| Box::new(s) as Box<dyn Strategy>),
            "sentiment" => serde_json::from_value(spec.params.clone())
                .map_err(anyhow::Error::from)
                .and_then(|params| {
                    SentimentStrategy::new(
                        spec.name.clone(),
                        params,
                        news.clone(),
                        analyzer.clone(),
                    )
                })
                .map(|s| Box::new(s) as Box<dyn Strategy>),
            other => Err(anyhow::anyhow!("unknown strategy kind {other:?}")),
        };

        match built {
            Ok(strategy) => {
                info!(name = %spec.name, kind = %spec.kind, "Strategy configured");
                strategies.push(strategy);
            }
            Err(e) => {
                error!(name = %spec.name, kind = %spec.kind, error = %e, "Skipping misconfigured strategy");
            }
        }
    }

    strategies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::ReplayMarketData;
    use crate::news::{KeywordSentiment, StaticNewsFeed};
    use serde_json::json;
    use std::collections::HashMap;

    fn collaborators() -> (
        Arc<dyn MarketDataSource>,
        Arc<dyn NewsProvider>,
        Arc<dyn SentimentAnalyzer>,
    ) {
        (
            Arc::new(ReplayMarketData::new(HashMap::new(), 1, 0.001)),
            Arc::new(StaticNewsFeed::new(vec![])),
            Arc::new(KeywordSentiment::default()),
        )
    }

    fn spec(name: &str, kind: &str, params: serde_json::Value) -> StrategySpec {
        StrategySpec {
            name: name.to_string(),
            kind: kind.to_string(),
            params,
        }
    }

    #[test]
    fn test_builds_known_kinds() {
        let (market, news, analyzer) = collaborators();
        let specs = vec![
            spec("ma-btc", "ma_crossover", json!({"symbol": "BTC/USDT"})),
            spec("news", "sentiment", json!({"target_symbols": ["BTC"]})),
        ];

        let strategies = build_strategies(&specs, market, news, analyzer);

        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[0].name(), "ma-btc");
        assert_eq!(strategies[1].name(), "news");
    }

    #[test]
    fn test_bad_entry_does_not_poison_roster() {
        let (market, news, analyzer) = collaborators();
        let specs = vec![
            spec("mystery", "arbitrage", json!({})),
            spec(
                "inverted",
                "ma_crossover",
                json!({"short_window": 50, "long_window": 20}),
            ),
            spec("news", "sentiment", json!({})),
        ];

        let strategies = build_strategies(&specs, market, news, analyzer);

        assert_eq!(strategies.len(), 1);
        assert_eq!(strategies[0].name(), "news");
    }
}
