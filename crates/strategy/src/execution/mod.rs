pub mod lending;
pub mod pool;
pub mod quote_provider;
pub mod swap;
pub mod venue;

pub use lending::LendingService;
pub use pool::{LiquidityPool, MintResult};
pub use quote_provider::SwapQuoteProvider;
pub use swap::{AggregatorRouter, Liquidator};
pub use venue::{Transactional, Venue};
