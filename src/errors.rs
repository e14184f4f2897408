use ethers::types::Address;
use thiserror::Error;

/// Failures surfaced by the price-feed core.
///
/// Every variant aborts the enclosing operation. There is no local recovery
/// and no degraded-mode default price: a misreported collateral value is
/// worse than no value at all.
#[derive(Debug, Error)]
pub enum OracleError {
    /// A required oracle reference (base/USD, or the per-asset one) is unset.
    #[error("no oracle configured for token {token:?}")]
    NotConfigured { token: Address },

    /// Registration-time check: the sub-oracle's constituent tokens do not
    /// match the expected pair. Prior state is untouched.
    #[error("oracle pair ({token0:?}, {token1:?}) does not match the expected tokens")]
    InvalidPair { token0: Address, token1: Address },

    /// Registration-time check: the decimal configuration would drive the
    /// mantissa scale exponent negative.
    #[error("decimals out of range for mantissa scaling: usd={usd_decimals}, token={token_decimals}")]
    InvalidDecimals { usd_decimals: u8, token_decimals: u8 },

    /// Checked-math failure in a price or supply computation. Fatal for the
    /// whole query; wraparound must never reach the consumer.
    #[error("arithmetic overflow in price computation")]
    Arithmetic,

    /// The address is already on the non-circulating exclude list.
    #[error("address {address:?} is already excluded from circulating supply")]
    AlreadyExcluded { address: Address },

    /// Collaborator contract call failed (RPC error, revert, ABI mismatch).
    #[error(transparent)]
    Contract(#[from] anyhow::Error),
}
