use anyhow::{Context, Result};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FRESHNESS_WINDOW_SECS, DEFAULT_MIN_BASE_RESERVES};
use crate::types::ReliabilityThresholds;

/// Deployment wiring for the price feed: the base asset, the native-market
/// special case, reliability thresholds and the collaborator contract
/// addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub rpc_url: String,

    /// The network's primary exchange-medium token; every asset pairs
    /// against it.
    pub base_token: Address,

    /// Symbol of the market wrapping the native asset. It resolves to
    /// `native_token` instead of calling `underlying()`.
    pub native_symbol: String,
    pub native_token: Address,

    /// Canonical base/USD TWAP sub-oracle contract.
    pub base_usd_oracle: Address,

    /// Secondary oracle consulted when the primary source is unreliable.
    pub fallback_oracle: Address,

    #[serde(default = "default_freshness_window")]
    pub freshness_window_secs: u64,

    /// Minimum base-asset pool depth, decimal string in smallest units.
    #[serde(default = "default_min_base_reserves")]
    pub min_base_reserves: String,

    /// Per-asset TWAP sub-oracles to register at startup.
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub token: Address,
    pub oracle: Address,
}

fn default_freshness_window() -> u64 {
    DEFAULT_FRESHNESS_WINDOW_SECS
}

fn default_min_base_reserves() -> String {
    DEFAULT_MIN_BASE_RESERVES.to_string()
}

impl OracleConfig {
    pub async fn load(path: &str) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path))?;
        let config: OracleConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn thresholds(&self) -> Result<ReliabilityThresholds> {
        let min_base_reserves = U256::from_dec_str(&self.min_base_reserves)
            .context("min_base_reserves is not a decimal integer")?;
        Ok(ReliabilityThresholds {
            freshness_window_secs: self.freshness_window_secs,
            min_base_reserves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml_str = r#"
            rpc_url = "http://localhost:8545"
            base_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            native_symbol = "cETH"
            native_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            base_usd_oracle = "0x0000000000000000000000000000000000000010"
            fallback_oracle = "0x0000000000000000000000000000000000000011"
        "#;

        let config: OracleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.freshness_window_secs, 1800);
        assert!(config.assets.is_empty());

        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.min_base_reserves, U256::exp10(24));
    }

    #[test]
    fn test_parse_asset_list_and_overrides() {
        let toml_str = r#"
            rpc_url = "http://localhost:8545"
            base_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            native_symbol = "cETH"
            native_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            base_usd_oracle = "0x0000000000000000000000000000000000000010"
            fallback_oracle = "0x0000000000000000000000000000000000000011"
            freshness_window_secs = 600
            min_base_reserves = "5000"

            [[assets]]
            token = "0x6B175474E89094C44Da98b954EedeAC495271d0F"
            oracle = "0x0000000000000000000000000000000000000012"
        "#;

        let config: OracleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.freshness_window_secs, 600);
        assert_eq!(config.assets.len(), 1);
        assert_eq!(
            config.thresholds().unwrap().min_base_reserves,
            U256::from(5000u64)
        );
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oracle.toml");
        tokio::fs::write(
            &path,
            r#"
                rpc_url = "http://localhost:8545"
                base_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
                native_symbol = "cETH"
                native_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
                base_usd_oracle = "0x0000000000000000000000000000000000000010"
                fallback_oracle = "0x0000000000000000000000000000000000000011"
            "#,
        )
        .await
        .unwrap();

        let config = OracleConfig::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(config.native_symbol, "cETH");

        let missing = OracleConfig::load("does/not/exist.toml").await;
        assert!(missing.is_err());
    }

    #[test]
    fn test_bad_min_reserves_rejected() {
        let toml_str = r#"
            rpc_url = "http://localhost:8545"
            base_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            native_symbol = "cETH"
            native_token = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            base_usd_oracle = "0x0000000000000000000000000000000000000010"
            fallback_oracle = "0x0000000000000000000000000000000000000011"
            min_base_reserves = "not-a-number"
        "#;

        let config: OracleConfig = toml::from_str(toml_str).unwrap();
        assert!(config.thresholds().is_err());
    }
}
