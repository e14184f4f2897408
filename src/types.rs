use std::sync::Arc;

use ethers::types::{Address, U256};

use crate::oracle::traits::PairTwapOracle;

/// One registered asset, excluding the base asset itself.
///
/// Pair orientation and token decimals are derived once at registration and
/// cached here, so the query paths never re-derive them from contract reads.
#[derive(Clone)]
pub struct AssetRegistration {
    /// TWAP sub-oracle over the {token, base} pair.
    pub oracle: Arc<dyn PairTwapOracle>,
    /// Decimal precision of the asset token.
    pub token_decimals: u8,
    /// Whether the base asset sits on the token0 side of the backing pool.
    pub base_is_token0: bool,
}

/// The canonical base/USD sub-oracle, registered once.
#[derive(Clone)]
pub struct BaseUsdRegistration {
    /// TWAP sub-oracle over the {base, usd-reference} pair.
    pub oracle: Arc<dyn PairTwapOracle>,
    /// Decimal precision of the non-base side of the pair, cached at
    /// registration to avoid repeated external decimal lookups.
    pub usd_token_decimals: u8,
    /// Decimal precision of the base asset itself.
    pub base_decimals: u8,
    /// Whether the base asset sits on the token0 side of the backing pool.
    pub base_is_token0: bool,
}

/// Registry slot for an asset. `Unset` is an explicit tombstone: an
/// administrator retires an asset by overwriting its slot, and queries treat
/// both `Unset` and absence as not configured.
#[derive(Clone)]
pub enum Registration {
    Unset,
    Active(AssetRegistration),
}

/// Reliability thresholds, fixed at deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReliabilityThresholds {
    /// Maximum age of the asset oracle's last observation, in seconds.
    pub freshness_window_secs: u64,
    /// Minimum base-asset reserve required in each consulted pool, in
    /// smallest units of the base asset. Inclusive bound.
    pub min_base_reserves: U256,
}
