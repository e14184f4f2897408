use std::sync::Arc;

use ethers::types::{Address, U256};
use tracing::{debug, warn};

use super::aggregator::PriceAggregator;
use super::traits::{AssetRef, FallbackOracle};
use crate::errors::OracleError;

/// Top-level entry point consumed by the lending protocol.
///
/// Resolves a market to its underlying token, then routes the query: one
/// reliability check picks either the TWAP aggregator or the fallback
/// oracle, and exactly that source is consulted. There is no escalation
/// from an aggregator failure to the fallback; configuration errors
/// propagate to the caller.
pub struct PriceFeedDispatcher {
    aggregator: Arc<PriceAggregator>,
    fallback: Arc<dyn FallbackOracle>,
    /// Symbol of the market wrapping the network's native asset. That market
    /// has no canonical underlying token, so it resolves statically.
    native_symbol: String,
    native_token: Address,
}

impl PriceFeedDispatcher {
    pub fn new(
        aggregator: Arc<PriceAggregator>,
        fallback: Arc<dyn FallbackOracle>,
        native_symbol: String,
        native_token: Address,
    ) -> Self {
        Self {
            aggregator,
            fallback,
            native_symbol,
            native_token,
        }
    }

    /// USD price mantissa for one market of the consuming protocol.
    pub async fn get_price_for_asset(&self, asset: &dyn AssetRef) -> Result<U256, OracleError> {
        let token = self.resolve_token(asset).await?;

        if self.aggregator.is_reliable(token).await? {
            debug!(token = ?token, "primary TWAP source is reliable");
            self.aggregator.get_usd_price(token).await
        } else {
            warn!(token = ?token, "primary TWAP source unreliable, using fallback oracle");
            self.fallback.get_price(token).await
        }
    }

    async fn resolve_token(&self, asset: &dyn AssetRef) -> Result<Address, OracleError> {
        if asset.symbol().await? == self.native_symbol {
            Ok(self.native_token)
        } else {
            asset.underlying_token().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::time::current_timestamp;
    use crate::mocks::{MockAsset, MockFallback, MockPool, MockTokenDirectory, MockTwapOracle};
    use crate::types::ReliabilityThresholds;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    const NATIVE_SYMBOL: &str = "cETH";

    /// Dispatcher over a one-asset aggregator. Base = addr(1), USD side =
    /// addr(2), asset = addr(3); market contracts are addr(100)/addr(101).
    async fn dispatcher() -> (PriceFeedDispatcher, Arc<MockTwapOracle>, Arc<MockFallback>) {
        let base = addr(1);
        let directory = Arc::new(MockTokenDirectory::new(vec![
            (base, 18),
            (addr(2), 6),
            (addr(3), 18),
        ]));
        let thresholds = ReliabilityThresholds {
            freshness_window_secs: 1800,
            min_base_reserves: U256::exp10(24),
        };
        let mut agg = PriceAggregator::new(base, thresholds, directory);

        let base_pool = MockPool::new(base, U256::exp10(25), U256::exp10(13));
        let base_oracle = MockTwapOracle::new(base, addr(2), base_pool, current_timestamp());
        agg.register_base_usd_oracle(base_oracle).await.unwrap();

        let asset_pool = MockPool::new(base, U256::exp10(25), U256::exp10(25));
        let asset_oracle = MockTwapOracle::new(base, addr(3), asset_pool, current_timestamp());
        agg.register_asset_oracle(addr(3), asset_oracle.clone())
            .await
            .unwrap();

        let fallback = MockFallback::new();
        let dispatcher = PriceFeedDispatcher::new(
            Arc::new(agg),
            fallback.clone(),
            NATIVE_SYMBOL.to_string(),
            base,
        );
        (dispatcher, asset_oracle, fallback)
    }

    #[tokio::test]
    async fn test_reliable_asset_uses_primary_source() {
        let (dispatcher, _, fallback) = dispatcher().await;
        fallback.set_price(addr(3), U256::from(42u64));

        let market = MockAsset::new("cDAI", addr(3));
        let price = dispatcher.get_price_for_asset(&market).await.unwrap();
        // Primary path, not the fallback's planted 42.
        assert_ne!(price, U256::from(42u64));
    }

    #[tokio::test]
    async fn test_unreliable_asset_routes_to_fallback() {
        let (dispatcher, asset_oracle, fallback) = dispatcher().await;
        asset_oracle.set_last_update(current_timestamp() - 3600);
        fallback.set_price(addr(3), U256::from(42u64));

        let market = MockAsset::new("cDAI", addr(3));
        let price = dispatcher.get_price_for_asset(&market).await.unwrap();
        assert_eq!(price, U256::from(42u64));
    }

    #[tokio::test]
    async fn test_native_symbol_resolves_statically() {
        let (dispatcher, _, _) = dispatcher().await;

        // The native market reports a bogus underlying; the symbol match
        // must win and the call must never reach underlying_token().
        let market = MockAsset::new(NATIVE_SYMBOL, addr(99)).with_poisoned_underlying();
        assert!(dispatcher.get_price_for_asset(&market).await.is_ok());
    }

    #[tokio::test]
    async fn test_unregistered_token_error_propagates() {
        // A configuration error is not an invitation to fall back.
        let (dispatcher, _, fallback) = dispatcher().await;
        fallback.set_price(addr(9), U256::from(42u64));

        let market = MockAsset::new("cXYZ", addr(9));
        let err = dispatcher.get_price_for_asset(&market).await.unwrap_err();
        assert!(matches!(err, OracleError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_fallback_failure_propagates() {
        let (dispatcher, asset_oracle, _) = dispatcher().await;
        asset_oracle.set_last_update(current_timestamp() - 3600);

        // Fallback has no price for the asset; the query fails outright.
        let market = MockAsset::new("cDAI", addr(3));
        assert!(dispatcher.get_price_for_asset(&market).await.is_err());
    }
}
