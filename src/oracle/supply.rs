use std::sync::Arc;

use ethers::types::{Address, U256};
use tracing::info;

use super::traits::Erc20;
use crate::errors::OracleError;

/// Circulating supply of the governance token: total supply minus the
/// balances held by an admin-managed list of non-circulating addresses
/// (treasury, vesting, team locks).
pub struct CirculatingSupply {
    token: Arc<dyn Erc20>,
    excluded: Vec<Address>,
}

impl CirculatingSupply {
    pub fn new(token: Arc<dyn Erc20>) -> Self {
        Self {
            token,
            excluded: Vec::new(),
        }
    }

    /// Append an address to the non-circulating list. Append-only, like the
    /// registry: there is no removal operation.
    pub fn exclude(&mut self, address: Address) -> Result<(), OracleError> {
        if self.excluded.contains(&address) {
            return Err(OracleError::AlreadyExcluded { address });
        }
        info!(address = ?address, "excluded address from circulating supply");
        self.excluded.push(address);
        Ok(())
    }

    pub fn excluded(&self) -> &[Address] {
        &self.excluded
    }

    /// Sum the exclude-list balances out of the total supply. Underflow is
    /// fatal: a mis-tracked exclude list must not wrap into a huge supply.
    pub async fn circulating(&self) -> Result<U256, OracleError> {
        let mut supply = self.token.total_supply().await?;
        for address in &self.excluded {
            let held = self.token.balance_of(*address).await?;
            supply = supply.checked_sub(held).ok_or(OracleError::Arithmetic)?;
        }
        Ok(supply)
    }
}
