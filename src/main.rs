//! Trading Agent - Main Entry Point
//!
//! Paper-trading agent: simulated exchange, replayed market data, and
//! a configurable roster of strategies.

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use trading_agent::agent::TradingAgent;
use trading_agent::config::Config;
use trading_agent::exchange::{SimulatedExchange, SimulatedExchangeConfig};
use trading_agent::market::ReplayMarketData;
use trading_agent::news::{Article, KeywordSentiment, StaticNewsFeed};
use trading_agent::strategy::build_strategies;

/// Trading Agent CLI
#[derive(Parser)]
#[command(name = "trading-agent")]
#[command(version, about = "Multi-strategy crypto trading agent (paper trading)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading loop (default)
    Run {
        /// Stop after this many cycles
        #[arg(short, long)]
        cycles: Option<u64>,
    },

    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let mut config = Config::load()?;
    config.validate()?;

    match cli.command {
        Some(Commands::Config) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        Some(Commands::Run { cycles }) => {
            if cycles.is_some() {
                config.agent.max_cycles = cycles;
            }
        }
        None => {}
    }

    log_config(&config);
    run_agent(config).await
}

async fn run_agent(config: Config) -> Result<()> {
    let adapter = Arc::new(SimulatedExchange::new(SimulatedExchangeConfig {
        initial_capital: config.agent.initial_capital.clone(),
        initial_prices: config.exchange.initial_prices.clone(),
        slippage_factor: config.exchange.slippage_factor,
        commission_rate: config.exchange.commission_rate,
        fill_probability: config.exchange.fill_probability,
    }));

    let market = Arc::new(ReplayMarketData::new(
        config.exchange.initial_prices.clone(),
        config.market.seed,
        config.market.volatility,
    ));

    let news = Arc::new(StaticNewsFeed::new(demo_articles()));
    let analyzer = Arc::new(KeywordSentiment::default());

    let strategies = build_strategies(&config.strategies, market.clone(), news, analyzer);
    anyhow::ensure!(
        !strategies.is_empty(),
        "no strategy could be constructed from the configured roster"
    );

    let mut agent = TradingAgent::new(config.agent, adapter, market, strategies);

    // Ctrl-C flips the running flag; the loop exits after the current
    // cycle or sleep.
    let running = agent.running_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Shutdown signal received");
        running.store(false, Ordering::SeqCst);
    });

    info!("🚀 Starting trading loop...");
    agent.start().await
}

/// Canned headlines for the offline news feed, spread over the last
/// few hours so the sentiment strategy's age window keeps them.
fn demo_articles() -> Vec<Article> {
    let now = Utc::now();
    vec![
        Article {
            title: "Spot ETF approval drives record bitcoin inflows".to_string(),
            summary: "Institutional adoption accelerates as funds rally.".to_string(),
            source: "demo-wire".to_string(),
            published_at: now - Duration::hours(2),
            topics: vec!["BTC".to_string()],
        },
        Article {
            title: "Bitcoin consolidates after last week's breakout".to_string(),
            summary: String::new(),
            source: "demo-wire".to_string(),
            published_at: now - Duration::hours(5),
            topics: vec!["BTC".to_string()],
        },
        Article {
            title: "Ethereum network upgrade ships without incident".to_string(),
            summary: "Validators report a smooth transition.".to_string(),
            source: "demo-wire".to_string(),
            published_at: now - Duration::hours(3),
            topics: vec!["ETH".to_string()],
        },
        Article {
            title: "Regulator files lawsuit against offshore exchange".to_string(),
            summary: "Markets shrug off the bearish headline.".to_string(),
            source: "demo-wire".to_string(),
            published_at: now - Duration::hours(8),
            topics: vec!["BTC".to_string(), "ETH".to_string()],
        },
    ]
}

/// Initialize logging to stdout with env-filter overrides.
fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("trading_agent=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .init();

    Ok(())
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("📋 Configuration:");
    info!("   Quote Currency: {}", config.agent.quote_currency);
    for (currency, amount) in &config.agent.initial_capital {
        info!("   Initial Capital: {} {}", amount, currency);
    }
    info!(
        "   Trading Interval: {}s",
        config.agent.trading_interval_secs
    );
    info!(
        "   Exchange: {} (slippage {}, commission {}, fill probability {})",
        config.exchange.kind,
        config.exchange.slippage_factor,
        config.exchange.commission_rate,
        config.exchange.fill_probability
    );
    for spec in &config.strategies {
        info!("   Strategy: {} ({})", spec.name, spec.kind);
    }
}
