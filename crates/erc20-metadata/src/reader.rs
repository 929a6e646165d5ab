use async_trait::async_trait;

use crate::address::Address;
use crate::error::ReadError;

/// Read-only chain access for token metadata.
///
/// Each operation is independently fallible and the four are always issued
/// concurrently by the store; a failure in one never aborts the others.
/// `exchange_address` consults the factory registry for the exchange paired
/// with the token — `Ok(None)` means the registry answered and the token has
/// no exchange.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn name(&self, token: Address) -> Result<String, ReadError>;

    async fn symbol(&self, token: Address) -> Result<String, ReadError>;

    async fn decimals(&self, token: Address) -> Result<u8, ReadError>;

    async fn exchange_address(
        &self,
        token: Address,
        chain_id: u64,
    ) -> Result<Option<Address>, ReadError>;
}
