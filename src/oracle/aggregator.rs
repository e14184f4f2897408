use std::collections::HashMap;
use std::sync::Arc;

use ethers::types::{Address, U256};
use tracing::{debug, info};

use super::reliability;
use super::traits::{LiquidityPool, PairTwapOracle, TokenDirectory};
use crate::common::time::current_timestamp;
use crate::constants::MANTISSA_SCALE;
use crate::errors::OracleError;
use crate::types::{AssetRegistration, BaseUsdRegistration, Registration, ReliabilityThresholds};

/// Registry of per-asset TWAP sub-oracles plus the canonical base/USD
/// sub-oracle, with the reliability predicate and the USD conversion math.
///
/// Mutation is administrator-only and modeled as `&mut self`: the aggregator
/// is configured by whoever owns it, then shared read-only (`Arc`) with the
/// query paths. Queries never mutate.
pub struct PriceAggregator {
    base_token: Address,
    thresholds: ReliabilityThresholds,
    tokens: Arc<dyn TokenDirectory>,
    base_usd: Option<BaseUsdRegistration>,
    registry: HashMap<Address, Registration>,
}

impl PriceAggregator {
    pub fn new(
        base_token: Address,
        thresholds: ReliabilityThresholds,
        tokens: Arc<dyn TokenDirectory>,
    ) -> Self {
        Self {
            base_token,
            thresholds,
            tokens,
            base_usd: None,
            registry: HashMap::new(),
        }
    }

    pub fn base_token(&self) -> Address {
        self.base_token
    }

    /// Register (or replace) the canonical base/USD sub-oracle.
    ///
    /// Caches the decimals of both pair sides and the pool orientation, so
    /// queries never repeat the external lookups. Rejects pairs that do not
    /// contain the base asset, and decimal configurations that would drive
    /// the mantissa scale exponent negative.
    pub async fn register_base_usd_oracle(
        &mut self,
        oracle: Arc<dyn PairTwapOracle>,
    ) -> Result<(), OracleError> {
        let token0 = oracle.token0().await?;
        let token1 = oracle.token1().await?;

        let usd_token = if token0 == self.base_token {
            token1
        } else if token1 == self.base_token {
            token0
        } else {
            return Err(OracleError::InvalidPair { token0, token1 });
        };

        let usd_token_decimals = self.tokens.decimals(usd_token).await?;
        let base_decimals = self.tokens.decimals(self.base_token).await?;
        scale_exponent(usd_token_decimals, base_decimals)?;

        let base_is_token0 = reliability::base_is_token0(oracle.pair().as_ref(), self.base_token).await?;

        info!(
            base = ?self.base_token,
            usd_token = ?usd_token,
            usd_token_decimals,
            "registered base/USD oracle"
        );

        self.base_usd = Some(BaseUsdRegistration {
            oracle,
            usd_token_decimals,
            base_decimals,
            base_is_token0,
        });
        Ok(())
    }

    /// Register (or replace) the TWAP sub-oracle for one asset.
    ///
    /// The oracle's constituent tokens must equal `{token, base}` in either
    /// order. Requires the base/USD oracle first, because the mantissa scale
    /// exponent is validated here against the cached USD decimals.
    pub async fn register_asset_oracle(
        &mut self,
        token: Address,
        oracle: Arc<dyn PairTwapOracle>,
    ) -> Result<(), OracleError> {
        let usd_token_decimals = self.base_usd()?.usd_token_decimals;

        let token0 = oracle.token0().await?;
        let token1 = oracle.token1().await?;
        let matches = (token0 == token && token1 == self.base_token)
            || (token0 == self.base_token && token1 == token);
        if !matches {
            return Err(OracleError::InvalidPair { token0, token1 });
        }

        let token_decimals = self.tokens.decimals(token).await?;
        scale_exponent(usd_token_decimals, token_decimals)?;

        let base_is_token0 = reliability::base_is_token0(oracle.pair().as_ref(), self.base_token).await?;

        info!(token = ?token, token_decimals, "registered asset oracle");

        self.registry.insert(
            token,
            Registration::Active(AssetRegistration {
                oracle,
                token_decimals,
                base_is_token0,
            }),
        );
        Ok(())
    }

    /// Retire an asset by overwriting its slot with the explicit tombstone.
    /// There is no deletion; subsequent queries see `NotConfigured`.
    pub fn retire_asset(&mut self, token: Address) {
        info!(token = ?token, "retired asset oracle");
        self.registry.insert(token, Registration::Unset);
    }

    /// Reliability predicate: the asset's own oracle is fresh AND both the
    /// base/USD pool and the asset's pool hold at least the minimum
    /// base-asset reserve. Pure read; mutates nothing.
    ///
    /// The base asset itself is judged on the base/USD oracle alone, no
    /// per-asset registration needed. Staleness is checked only on the
    /// asset's own sub-oracle.
    pub async fn is_reliable(&self, token: Address) -> Result<bool, OracleError> {
        let base = self.base_usd()?;

        let (oracle, base_is_token0) = if token == self.base_token {
            (&base.oracle, base.base_is_token0)
        } else {
            let reg = self.registration(token)?;
            (&reg.oracle, reg.base_is_token0)
        };

        let last_update = oracle.block_timestamp_last().await?;
        let now = current_timestamp();
        if !reliability::is_fresh(last_update, now, self.thresholds.freshness_window_secs) {
            debug!(token = ?token, last_update, now, "TWAP observation is stale");
            return Ok(false);
        }

        let base_pool_deep = self
            .has_min_base_reserves(base.oracle.pair(), base.base_is_token0)
            .await?;
        let asset_pool_deep = self
            .has_min_base_reserves(oracle.pair(), base_is_token0)
            .await?;

        Ok(base_pool_deep && asset_pool_deep)
    }

    /// USD price of one smallest unit of `token`, as a mantissa scaled by
    /// 10^(36 - usd_decimals - token_decimals).
    ///
    /// Does not re-check reliability: callers gate on [`is_reliable`] and a
    /// stale price is returned as-is. One whole-unit consult on the asset's
    /// oracle, chained through the base/USD oracle for non-base assets; the
    /// base asset converts once, directly to USD.
    ///
    /// [`is_reliable`]: Self::is_reliable
    pub async fn get_usd_price(&self, token: Address) -> Result<U256, OracleError> {
        let base = self.base_usd()?;

        let (price_in_usd, token_decimals) = if token == self.base_token {
            let one_unit = U256::exp10(base.base_decimals as usize);
            let price = base.oracle.consult(self.base_token, one_unit).await?;
            (price, base.base_decimals)
        } else {
            let reg = self.registration(token)?;
            let one_unit = U256::exp10(reg.token_decimals as usize);
            let price_in_base = reg.oracle.consult(token, one_unit).await?;
            let price = base.oracle.consult(self.base_token, price_in_base).await?;
            (price, reg.token_decimals)
        };

        let exponent = scale_exponent(base.usd_token_decimals, token_decimals)?;
        let mantissa = price_in_usd
            .checked_mul(U256::exp10(exponent as usize))
            .ok_or(OracleError::Arithmetic)?;

        debug!(token = ?token, %price_in_usd, exponent, %mantissa, "priced token");
        Ok(mantissa)
    }

    fn base_usd(&self) -> Result<&BaseUsdRegistration, OracleError> {
        self.base_usd.as_ref().ok_or(OracleError::NotConfigured {
            token: self.base_token,
        })
    }

    fn registration(&self, token: Address) -> Result<&AssetRegistration, OracleError> {
        match self.registry.get(&token) {
            Some(Registration::Active(reg)) => Ok(reg),
            Some(Registration::Unset) | None => Err(OracleError::NotConfigured { token }),
        }
    }

    async fn has_min_base_reserves(
        &self,
        pool: Arc<dyn LiquidityPool>,
        base_is_token0: bool,
    ) -> Result<bool, OracleError> {
        let reserves = pool.get_reserves().await?;
        let base_reserve = reliability::base_side_reserve(reserves, base_is_token0);
        Ok(base_reserve >= self.thresholds.min_base_reserves)
    }
}

/// Mantissa scale exponent 36 - usd_decimals - token_decimals. Checked here
/// and enforced at registration time, so the query path cannot underflow.
fn scale_exponent(usd_token_decimals: u8, token_decimals: u8) -> Result<u32, OracleError> {
    MANTISSA_SCALE
        .checked_sub(usd_token_decimals as u32 + token_decimals as u32)
        .ok_or(OracleError::InvalidDecimals {
            usd_decimals: usd_token_decimals,
            token_decimals,
        })
}
