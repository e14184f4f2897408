//! Pure pieces of the reliability predicate: a staleness comparison and the
//! base-side reserve selection. Both are decision helpers with no owned
//! state beyond the thresholds their callers pass in.

use ethers::types::{Address, U256};

use super::traits::LiquidityPool;
use crate::errors::OracleError;

/// Staleness check, inclusive: an observation exactly at the window edge is
/// still fresh. A timestamp from the future counts as fresh rather than
/// underflowing.
pub fn is_fresh(last_update: u64, now: u64, window_secs: u64) -> bool {
    now.saturating_sub(last_update) <= window_secs
}

/// Pick the base-asset side of a reserve pair given the orientation derived
/// at registration time.
pub fn base_side_reserve(reserves: (U256, U256), base_is_token0: bool) -> U256 {
    if base_is_token0 {
        reserves.0
    } else {
        reserves.1
    }
}

/// Derive pool orientation by comparing `token0()` against the base asset.
/// Done once at registration; query paths use the cached flag so the
/// freshness, liquidity and conversion paths cannot disagree about sides.
pub async fn base_is_token0(
    pool: &dyn LiquidityPool,
    base_token: Address,
) -> Result<bool, OracleError> {
    Ok(pool.token0().await? == base_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_window_is_inclusive() {
        assert!(is_fresh(0, 1800, 1800));
        assert!(!is_fresh(0, 1801, 1800));
        assert!(is_fresh(100, 100, 0));
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        assert!(is_fresh(2000, 1000, 30));
    }

    #[test]
    fn test_base_side_reserve_selection() {
        let reserves = (U256::from(7u64), U256::from(11u64));
        assert_eq!(base_side_reserve(reserves, true), U256::from(7u64));
        assert_eq!(base_side_reserve(reserves, false), U256::from(11u64));
    }
}
