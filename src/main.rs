use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use ethers::providers::{Http, Provider};
use ethers::types::Address;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use twap_price_feed::config::OracleConfig;
use twap_price_feed::oracle::contracts::{
    AssetRefClient, Erc20Directory, FallbackClient, UniswapPairTwapClient,
};
use twap_price_feed::oracle::{PriceAggregator, PriceFeedDispatcher};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("price-feed")
        .version(env!("CARGO_PKG_VERSION"))
        .about("TWAP price-feed aggregator - answers one USD price query")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Config file path")
                .default_value("config/default.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .default_value("info"),
        )
        .arg(
            Arg::new("asset")
                .required(true)
                .value_name("ADDRESS")
                .help("Market (asset reference) contract address to price"),
        )
        .get_matches();

    let log_level = matches.get_one::<String>("log-level").unwrap().clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config_path = matches.get_one::<String>("config").unwrap();
    info!("loading config from {}", config_path);
    let mut config = OracleConfig::load(config_path).await?;
    if let Ok(url) = std::env::var("RPC_URL") {
        config.rpc_url = url;
    }

    let provider = Arc::new(
        Provider::<Http>::try_from(config.rpc_url.as_str()).context("invalid RPC url")?,
    );
    let directory = Arc::new(Erc20Directory::new(provider.clone()));

    let mut aggregator =
        PriceAggregator::new(config.base_token, config.thresholds()?, directory);

    let base_oracle =
        Arc::new(UniswapPairTwapClient::connect(provider.clone(), config.base_usd_oracle).await?);
    aggregator.register_base_usd_oracle(base_oracle).await?;

    for asset in &config.assets {
        let oracle =
            Arc::new(UniswapPairTwapClient::connect(provider.clone(), asset.oracle).await?);
        aggregator.register_asset_oracle(asset.token, oracle).await?;
    }
    info!("registered {} asset oracles", config.assets.len());

    let fallback = Arc::new(FallbackClient::new(provider.clone(), config.fallback_oracle)?);
    let dispatcher = PriceFeedDispatcher::new(
        Arc::new(aggregator),
        fallback,
        config.native_symbol.clone(),
        config.native_token,
    );

    let asset_address: Address = matches
        .get_one::<String>("asset")
        .unwrap()
        .parse()
        .context("invalid asset address")?;
    let market = AssetRefClient::new(provider, asset_address)?;

    let mantissa = dispatcher.get_price_for_asset(&market).await?;
    info!(asset = ?asset_address, %mantissa, "price query answered");
    println!("{mantissa}");

    Ok(())
}
