// Reliability thresholds (deployment defaults)

/// Maximum age of a TWAP observation before the source is judged stale (30 minutes)
pub const DEFAULT_FRESHNESS_WINDOW_SECS: u64 = 1800;

/// Minimum pool depth of the base asset, in smallest units.
/// 10^24 = 1,000,000 whole units of an 18-decimals base asset.
pub const DEFAULT_MIN_BASE_RESERVES: &str = "1000000000000000000000000";

// Mantissa format

/// Total decimal scale of the reported price mantissa. The consumer expects
/// prices scaled by 10^(36 - usd_decimals - token_decimals).
pub const MANTISSA_SCALE: u32 = 36;
