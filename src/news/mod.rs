//! News headlines and sentiment scoring for the sentiment strategy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("news provider unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single news item as seen by the strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    /// Topics this article is tagged with, e.g. ["BTC"].
    pub topics: Vec<String>,
}

/// Classified tone of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    /// The analyzer could not produce a classification.
    Uncertain,
}

impl Sentiment {
    /// Numeric score used for averaging: +1 / -1 / 0. `Uncertain`
    /// carries no information and must be filtered out before scoring.
    pub fn score(self) -> Option<f64> {
        match self {
            Sentiment::Positive => Some(1.0),
            Sentiment::Negative => Some(-1.0),
            Sentiment::Neutral => Some(0.0),
            Sentiment::Uncertain => None,
        }
    }
}

/// Source of recent headlines, filterable by topic.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Up to `limit` most recent articles tagged with `topic`, newest
    /// first. An unknown topic yields an empty list, not an error.
    async fn get_recent_articles(
        &self,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<Article>, NewsError>;
}

/// Classifies the tone of a text fragment.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, NewsError>;
}

/// Canned in-memory feed for paper trading and tests.
pub struct StaticNewsFeed {
    articles: Vec<Article>,
}

impl StaticNewsFeed {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }
}

#[async_trait]
impl NewsProvider for StaticNewsFeed {
    async fn get_recent_articles(
        &self,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<Article>, NewsError> {
        let mut matched: Vec<Article> = self
            .articles
            .iter()
            .filter(|article| article.topics.iter().any(|t| t.eq_ignore_ascii_case(topic)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        matched.truncate(limit);
        debug!(topic, count = matched.len(), "Fetched articles");
        Ok(matched)
    }
}

/// Keyword-list classifier. Counts positive and negative cue words and
/// picks whichever side dominates.
pub struct KeywordSentiment {
    positive: Vec<&'static str>,
    negative: Vec<&'static str>,
}

impl Default for KeywordSentiment {
    fn default() -> Self {
        Self {
            positive: vec![
                "surge", "rally", "adoption", "approval", "bullish", "breakout", "gain",
                "record", "upgrade",
            ],
            negative: vec![
                "crash", "hack", "ban", "lawsuit", "bearish", "selloff", "plunge", "fraud",
                "downgrade",
            ],
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for KeywordSentiment {
    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment, NewsError> {
        if text.trim().is_empty() {
            return Ok(Sentiment::Uncertain);
        }
        let lower = text.to_lowercase();
        let positive_hits = self.positive.iter().filter(|w| lower.contains(*w)).count();
        let negative_hits = self.negative.iter().filter(|w| lower.contains(*w)).count();

        Ok(match positive_hits.cmp(&negative_hits) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article(title: &str, topic: &str, minutes_ago: i64) -> Article {
        Article {
            title: title.to_string(),
            summary: String::new(),
            source: "test-wire".to_string(),
            published_at: Utc::now() - Duration::minutes(minutes_ago),
            topics: vec![topic.to_string()],
        }
    }

    #[tokio::test]
    async fn test_feed_filters_by_topic_newest_first() {
        let feed = StaticNewsFeed::new(vec![
            article("older btc story", "BTC", 60),
            article("eth story", "ETH", 5),
            article("newer btc story", "BTC", 10),
        ]);

        let articles = feed.get_recent_articles("btc", 10).await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "newer btc story");
    }

    #[tokio::test]
    async fn test_feed_unknown_topic_is_empty() {
        let feed = StaticNewsFeed::new(vec![article("btc story", "BTC", 1)]);
        assert!(feed.get_recent_articles("SOL", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keyword_classifier() {
        let analyzer = KeywordSentiment::default();

        let positive = analyzer
            .analyze_sentiment("ETF approval fuels bitcoin rally")
            .await
            .unwrap();
        assert_eq!(positive, Sentiment::Positive);

        let negative = analyzer
            .analyze_sentiment("Exchange hack triggers market selloff")
            .await
            .unwrap();
        assert_eq!(negative, Sentiment::Negative);

        let neutral = analyzer
            .analyze_sentiment("Bitcoin trades sideways on light volume")
            .await
            .unwrap();
        assert_eq!(neutral, Sentiment::Neutral);

        let uncertain = analyzer.analyze_sentiment("   ").await.unwrap();
        assert_eq!(uncertain, Sentiment::Uncertain);
    }

    #[test]
    fn test_uncertain_has_no_score() {
        assert_eq!(Sentiment::Positive.score(), Some(1.0));
        assert_eq!(Sentiment::Uncertain.score(), None);
    }
}
