//! On-chain TWAP price-feed aggregator.
//!
//! Reports USD prices for a set of registered assets to a downstream
//! lending protocol. Each asset is priced through a primary TWAP sub-oracle
//! over its {asset, base} pool, chained through the canonical base/USD
//! sub-oracle, and gated by a reliability predicate combining staleness and
//! pool-depth checks. Unreliable queries route to a secondary fallback
//! oracle.

pub mod common;
pub mod config;
pub mod constants;
pub mod errors;
pub mod mocks;
pub mod oracle;
pub mod types;

pub use config::OracleConfig;
pub use errors::OracleError;
pub use oracle::{CirculatingSupply, PriceAggregator, PriceFeedDispatcher};
pub use types::ReliabilityThresholds;
