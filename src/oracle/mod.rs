pub mod aggregator;
pub mod contracts;
pub mod dispatcher;
pub mod reliability;
pub mod supply;
pub mod traits;

pub use aggregator::PriceAggregator;
pub use dispatcher::PriceFeedDispatcher;
pub use supply::CirculatingSupply;
pub use traits::{AssetRef, Erc20, FallbackOracle, LiquidityPool, PairTwapOracle, TokenDirectory};
