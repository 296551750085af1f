//! Exchange adapters: the order-execution boundary of the agent.

mod sim;
mod traits;
mod types;

pub use sim::{SimulatedExchange, SimulatedExchangeConfig};
pub use traits::{ExchangeAdapter, ExchangeError};
pub use types::{
    split_symbol, ExecutedOrder, OrderAction, OrderRequest, OrderStatus, OrderType,
};
