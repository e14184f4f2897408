//! In-memory collaborator doubles used by the unit tests: a settable
//! liquidity pool, a linear-rate TWAP oracle, a table-driven fallback
//! oracle, and ERC20/token-directory stand-ins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::types::{Address, U256};

use crate::errors::OracleError;
use crate::oracle::traits::{
    AssetRef, Erc20, FallbackOracle, LiquidityPool, PairTwapOracle, TokenDirectory,
};

/// Liquidity pool with settable reserves.
pub struct MockPool {
    token0: Address,
    reserves: Mutex<(U256, U256)>,
}

impl MockPool {
    pub fn new(token0: Address, reserve0: U256, reserve1: U256) -> Arc<Self> {
        Arc::new(Self {
            token0,
            reserves: Mutex::new((reserve0, reserve1)),
        })
    }

    pub fn set_reserves(&self, reserve0: U256, reserve1: U256) {
        *self.reserves.lock().unwrap() = (reserve0, reserve1);
    }
}

#[async_trait]
impl LiquidityPool for MockPool {
    async fn get_reserves(&self) -> Result<(U256, U256), OracleError> {
        Ok(*self.reserves.lock().unwrap())
    }

    async fn token0(&self) -> Result<Address, OracleError> {
        Ok(self.token0)
    }
}

/// TWAP oracle answering consults with a fixed linear rate:
/// `consult(_, amount) = amount / rate_den * rate_num`. Defaults to identity.
pub struct MockTwapOracle {
    token0: Address,
    token1: Address,
    pool: Arc<MockPool>,
    last_update: Mutex<u64>,
    rate: Mutex<(U256, U256)>,
}

impl MockTwapOracle {
    pub fn new(
        token0: Address,
        token1: Address,
        pool: Arc<MockPool>,
        last_update: u64,
    ) -> Arc<Self> {
        Arc::new(Self {
            token0,
            token1,
            pool,
            last_update: Mutex::new(last_update),
            rate: Mutex::new((U256::one(), U256::one())),
        })
    }

    pub fn set_last_update(&self, timestamp: u64) {
        *self.last_update.lock().unwrap() = timestamp;
    }

    pub fn set_rate(&self, numerator: U256, denominator: U256) {
        *self.rate.lock().unwrap() = (numerator, denominator);
    }

    pub fn pool_handle(&self) -> Arc<MockPool> {
        self.pool.clone()
    }
}

#[async_trait]
impl PairTwapOracle for MockTwapOracle {
    async fn consult(&self, _token: Address, amount_in: U256) -> Result<U256, OracleError> {
        let (num, den) = *self.rate.lock().unwrap();
        Ok((amount_in / den).checked_mul(num).unwrap_or(U256::MAX))
    }

    async fn token0(&self) -> Result<Address, OracleError> {
        Ok(self.token0)
    }

    async fn token1(&self) -> Result<Address, OracleError> {
        Ok(self.token1)
    }

    async fn block_timestamp_last(&self) -> Result<u64, OracleError> {
        Ok(*self.last_update.lock().unwrap())
    }

    fn pair(&self) -> Arc<dyn LiquidityPool> {
        self.pool.clone()
    }
}

/// Fallback oracle backed by a price table; unknown tokens fail the query.
pub struct MockFallback {
    prices: Mutex<HashMap<Address, U256>>,
}

impl MockFallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            prices: Mutex::new(HashMap::new()),
        })
    }

    pub fn set_price(&self, token: Address, price: U256) {
        self.prices.lock().unwrap().insert(token, price);
    }
}

#[async_trait]
impl FallbackOracle for MockFallback {
    async fn get_price(&self, token: Address) -> Result<U256, OracleError> {
        self.prices
            .lock()
            .unwrap()
            .get(&token)
            .copied()
            .ok_or(OracleError::NotConfigured { token })
    }
}

/// Market stand-in for the dispatcher. `with_poisoned_underlying` makes
/// `underlying_token` fail, to prove the native-symbol path never reads it.
pub struct MockAsset {
    symbol: String,
    underlying: Address,
    poisoned: bool,
}

impl MockAsset {
    pub fn new(symbol: &str, underlying: Address) -> Self {
        Self {
            symbol: symbol.to_string(),
            underlying,
            poisoned: false,
        }
    }

    pub fn with_poisoned_underlying(mut self) -> Self {
        self.poisoned = true;
        self
    }
}

#[async_trait]
impl AssetRef for MockAsset {
    async fn underlying_token(&self) -> Result<Address, OracleError> {
        if self.poisoned {
            return Err(OracleError::Contract(anyhow::anyhow!(
                "underlying_token called on a native market"
            )));
        }
        Ok(self.underlying)
    }

    async fn symbol(&self) -> Result<String, OracleError> {
        Ok(self.symbol.clone())
    }
}

/// ERC20 stand-in with a settable balance table.
pub struct MockErc20 {
    decimals: u8,
    total_supply: U256,
    balances: Mutex<HashMap<Address, U256>>,
}

impl MockErc20 {
    pub fn new(decimals: u8, total_supply: U256) -> Arc<Self> {
        Arc::new(Self {
            decimals,
            total_supply,
            balances: Mutex::new(HashMap::new()),
        })
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.balances.lock().unwrap().insert(address, balance);
    }
}

#[async_trait]
impl Erc20 for MockErc20 {
    async fn decimals(&self) -> Result<u8, OracleError> {
        Ok(self.decimals)
    }

    async fn total_supply(&self) -> Result<U256, OracleError> {
        Ok(self.total_supply)
    }

    async fn balance_of(&self, address: Address) -> Result<U256, OracleError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or_default())
    }
}

/// Fixed decimals table.
pub struct MockTokenDirectory {
    decimals: HashMap<Address, u8>,
}

impl MockTokenDirectory {
    pub fn new(entries: Vec<(Address, u8)>) -> Self {
        Self {
            decimals: entries.into_iter().collect(),
        }
    }
}

#[async_trait]
impl TokenDirectory for MockTokenDirectory {
    async fn decimals(&self, token: Address) -> Result<u8, OracleError> {
        self.decimals
            .get(&token)
            .copied()
            .ok_or(OracleError::NotConfigured { token })
    }
}
