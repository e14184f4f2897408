use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, U256};

use crate::errors::OracleError;

/// TWAP sub-oracle over one two-token liquidity pair.
///
/// The accumulator math lives in the collaborator contract; this side only
/// consults it. `consult` is linear in `amount_in`: it answers "how much of
/// the other token is `amount_in` of `token` worth, time-averaged".
#[async_trait]
pub trait PairTwapOracle: Send + Sync {
    async fn consult(&self, token: Address, amount_in: U256) -> Result<U256, OracleError>;
    async fn token0(&self) -> Result<Address, OracleError>;
    async fn token1(&self) -> Result<Address, OracleError>;
    /// Timestamp of the oracle's last accumulator update, unix seconds.
    async fn block_timestamp_last(&self) -> Result<u64, OracleError>;
    /// Handle to the underlying liquidity pool.
    fn pair(&self) -> Arc<dyn LiquidityPool>;
}

/// Liquidity pool backing a TWAP sub-oracle. Pools store their pair in an
/// arbitrary order; callers must not assume which side is which token.
#[async_trait]
pub trait LiquidityPool: Send + Sync {
    async fn get_reserves(&self) -> Result<(U256, U256), OracleError>;
    async fn token0(&self) -> Result<Address, OracleError>;
}

/// Secondary price source, consulted only when the primary TWAP path is
/// judged unreliable.
#[async_trait]
pub trait FallbackOracle: Send + Sync {
    async fn get_price(&self, token: Address) -> Result<U256, OracleError>;
}

/// A market handed to the dispatcher by the consuming protocol: resolves to
/// an underlying token, except for the distinguished native-wrapped symbol.
#[async_trait]
pub trait AssetRef: Send + Sync {
    async fn underlying_token(&self) -> Result<Address, OracleError>;
    async fn symbol(&self) -> Result<String, OracleError>;
}

/// ERC20-style token view, used by the circulating-supply calculator.
#[async_trait]
pub trait Erc20: Send + Sync {
    async fn decimals(&self) -> Result<u8, OracleError>;
    async fn total_supply(&self) -> Result<U256, OracleError>;
    async fn balance_of(&self, address: Address) -> Result<U256, OracleError>;
}

/// Decimal lookup for arbitrary tokens, used at registration time.
#[async_trait]
pub trait TokenDirectory: Send + Sync {
    async fn decimals(&self, token: Address) -> Result<u8, OracleError>;
}
