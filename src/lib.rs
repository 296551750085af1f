//! # Trading Agent
//!
//! A multi-strategy crypto trading agent with a fully simulated
//! exchange for paper trading.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `portfolio`: The account ledger (cash and asset balances)
//! - `exchange`: Exchange adapter trait and the simulated exchange
//! - `market`: Market data source trait and the offline replay feed
//! - `news`: News feed and sentiment analysis collaborators
//! - `strategy`: Signal-generating strategies and their registry
//! - `agent`: The orchestration loop and signal translator
//! - `utils`: Shared decimal arithmetic helpers

pub mod agent;
pub mod config;
pub mod exchange;
pub mod market;
pub mod news;
pub mod portfolio;
pub mod strategy;
pub mod utils;

pub use config::Config;
