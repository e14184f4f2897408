//! Ethers-backed collaborator clients. Each client wraps one deployed
//! contract behind the corresponding trait, with a minimal hand-written ABI
//! covering only the methods this crate consults.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use ethers::{
    abi::{Abi, Detokenize},
    contract::Contract,
    providers::{Http, Provider},
    types::{Address, U256},
};
use tokio::sync::RwLock;
use tracing::debug;

use super::traits::{AssetRef, Erc20, FallbackOracle, LiquidityPool, PairTwapOracle, TokenDirectory};
use crate::errors::OracleError;

const TWAP_ORACLE_ABI: &str = r#"[
    {
        "inputs": [
            {"internalType": "address", "name": "token", "type": "address"},
            {"internalType": "uint256", "name": "amountIn", "type": "uint256"}
        ],
        "name": "consult",
        "outputs": [{"internalType": "uint256", "name": "amountOut", "type": "uint256"}],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [],
        "name": "token0",
        "outputs": [{"internalType": "address", "name": "", "type": "address"}],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [],
        "name": "token1",
        "outputs": [{"internalType": "address", "name": "", "type": "address"}],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [],
        "name": "blockTimestampLast",
        "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [],
        "name": "pair",
        "outputs": [{"internalType": "address", "name": "", "type": "address"}],
        "stateMutability": "view",
        "type": "function"
    }
]"#;

const PAIR_ABI: &str = r#"[
    {
        "inputs": [],
        "name": "getReserves",
        "outputs": [
            {"internalType": "uint112", "name": "reserve0", "type": "uint112"},
            {"internalType": "uint112", "name": "reserve1", "type": "uint112"},
            {"internalType": "uint32", "name": "blockTimestampLast", "type": "uint32"}
        ],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [],
        "name": "token0",
        "outputs": [{"internalType": "address", "name": "", "type": "address"}],
        "stateMutability": "view",
        "type": "function"
    }
]"#;

const FALLBACK_ORACLE_ABI: &str = r#"[
    {
        "inputs": [{"internalType": "address", "name": "token", "type": "address"}],
        "name": "getPrice",
        "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
        "stateMutability": "view",
        "type": "function"
    }
]"#;

const ERC20_ABI: &str = r#"[
    {
        "inputs": [],
        "name": "decimals",
        "outputs": [{"internalType": "uint8", "name": "", "type": "uint8"}],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [],
        "name": "totalSupply",
        "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [{"internalType": "address", "name": "owner", "type": "address"}],
        "name": "balanceOf",
        "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
        "stateMutability": "view",
        "type": "function"
    }
]"#;

const MARKET_ABI: &str = r#"[
    {
        "inputs": [],
        "name": "underlying",
        "outputs": [{"internalType": "address", "name": "", "type": "address"}],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [],
        "name": "symbol",
        "outputs": [{"internalType": "string", "name": "", "type": "string"}],
        "stateMutability": "view",
        "type": "function"
    }
]"#;

fn contract(
    provider: Arc<Provider<Http>>,
    address: Address,
    abi_json: &str,
) -> Result<Contract<Provider<Http>>> {
    let abi: Abi = serde_json::from_str(abi_json)?;
    Ok(Contract::new(address, abi, provider))
}

async fn view<T: Detokenize>(contract: &Contract<Provider<Http>>, name: &str) -> Result<T> {
    Ok(contract.method::<_, T>(name, ())?.call().await?)
}

/// Client for a deployed `UniswapPairTwapOracle`. The pool handle is derived
/// once from `pair()` at connect time.
pub struct UniswapPairTwapClient {
    contract: Contract<Provider<Http>>,
    pool: Arc<UniswapPairClient>,
}

impl UniswapPairTwapClient {
    pub async fn connect(
        provider: Arc<Provider<Http>>,
        address: Address,
    ) -> Result<Self, OracleError> {
        let contract = contract(provider.clone(), address, TWAP_ORACLE_ABI)?;
        let pair_address: Address = view(&contract, "pair").await?;
        debug!(oracle = ?address, pair = ?pair_address, "connected TWAP oracle client");
        let pool = Arc::new(UniswapPairClient::new(provider, pair_address)?);
        Ok(Self { contract, pool })
    }
}

#[async_trait]
impl PairTwapOracle for UniswapPairTwapClient {
    async fn consult(&self, token: Address, amount_in: U256) -> Result<U256, OracleError> {
        let amount_out: U256 = self
            .contract
            .method("consult", (token, amount_in))
            .map_err(anyhow::Error::from)?
            .call()
            .await
            .map_err(anyhow::Error::from)?;
        Ok(amount_out)
    }

    async fn token0(&self) -> Result<Address, OracleError> {
        Ok(view(&self.contract, "token0").await?)
    }

    async fn token1(&self) -> Result<Address, OracleError> {
        Ok(view(&self.contract, "token1").await?)
    }

    async fn block_timestamp_last(&self) -> Result<u64, OracleError> {
        let timestamp: U256 = view(&self.contract, "blockTimestampLast").await?;
        Ok(timestamp.as_u64())
    }

    fn pair(&self) -> Arc<dyn LiquidityPool> {
        self.pool.clone()
    }
}

/// Client for a Uniswap-style pair contract.
pub struct UniswapPairClient {
    contract: Contract<Provider<Http>>,
}

impl UniswapPairClient {
    pub fn new(provider: Arc<Provider<Http>>, address: Address) -> Result<Self, OracleError> {
        Ok(Self {
            contract: contract(provider, address, PAIR_ABI)?,
        })
    }
}

#[async_trait]
impl LiquidityPool for UniswapPairClient {
    async fn get_reserves(&self) -> Result<(U256, U256), OracleError> {
        let (reserve0, reserve1, _): (U256, U256, u32) =
            view(&self.contract, "getReserves").await?;
        Ok((reserve0, reserve1))
    }

    async fn token0(&self) -> Result<Address, OracleError> {
        Ok(view(&self.contract, "token0").await?)
    }
}

/// Client for the secondary oracle contract.
pub struct FallbackClient {
    contract: Contract<Provider<Http>>,
}

impl FallbackClient {
    pub fn new(provider: Arc<Provider<Http>>, address: Address) -> Result<Self, OracleError> {
        Ok(Self {
            contract: contract(provider, address, FALLBACK_ORACLE_ABI)?,
        })
    }
}

#[async_trait]
impl FallbackOracle for FallbackClient {
    async fn get_price(&self, token: Address) -> Result<U256, OracleError> {
        let price: U256 = self
            .contract
            .method("getPrice", token)
            .map_err(anyhow::Error::from)?
            .call()
            .await
            .map_err(anyhow::Error::from)?;
        Ok(price)
    }
}

/// Client for one market (asset reference) of the consuming protocol.
pub struct AssetRefClient {
    contract: Contract<Provider<Http>>,
}

impl AssetRefClient {
    pub fn new(provider: Arc<Provider<Http>>, address: Address) -> Result<Self, OracleError> {
        Ok(Self {
            contract: contract(provider, address, MARKET_ABI)?,
        })
    }
}

#[async_trait]
impl AssetRef for AssetRefClient {
    async fn underlying_token(&self) -> Result<Address, OracleError> {
        Ok(view(&self.contract, "underlying").await?)
    }

    async fn symbol(&self) -> Result<String, OracleError> {
        Ok(view(&self.contract, "symbol").await?)
    }
}

/// ERC20 client bound to one token address.
pub struct Erc20Client {
    contract: Contract<Provider<Http>>,
}

impl Erc20Client {
    pub fn new(provider: Arc<Provider<Http>>, address: Address) -> Result<Self, OracleError> {
        Ok(Self {
            contract: contract(provider, address, ERC20_ABI)?,
        })
    }
}

#[async_trait]
impl Erc20 for Erc20Client {
    async fn decimals(&self) -> Result<u8, OracleError> {
        Ok(view(&self.contract, "decimals").await?)
    }

    async fn total_supply(&self) -> Result<U256, OracleError> {
        Ok(view(&self.contract, "totalSupply").await?)
    }

    async fn balance_of(&self, address: Address) -> Result<U256, OracleError> {
        let balance: U256 = self
            .contract
            .method("balanceOf", address)
            .map_err(anyhow::Error::from)?
            .call()
            .await
            .map_err(anyhow::Error::from)?;
        Ok(balance)
    }
}

/// Decimal lookup over live ERC20 contracts, cached per token so repeated
/// registrations do not repeat the calls.
pub struct Erc20Directory {
    provider: Arc<Provider<Http>>,
    cache: RwLock<HashMap<Address, u8>>,
}

impl Erc20Directory {
    pub fn new(provider: Arc<Provider<Http>>) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TokenDirectory for Erc20Directory {
    async fn decimals(&self, token: Address) -> Result<u8, OracleError> {
        if let Some(decimals) = self.cache.read().await.get(&token) {
            return Ok(*decimals);
        }
        let client = Erc20Client::new(self.provider.clone(), token)?;
        let decimals = client.decimals().await?;
        self.cache.write().await.insert(token, decimals);
        Ok(decimals)
    }
}
