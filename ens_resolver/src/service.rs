use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::utils::to_checksum;
use std::time::Duration;
use tracing::{debug, info};

/// Forward and reverse ENS lookups
#[async_trait]
pub trait NameService: Send + Sync {
    /// Address registered for `name`, `None` when the name has no address record
    async fn resolve_name(&self, name: &str) -> Result<Option<String>>;

    /// Primary name of `address`, `None` when no reverse record exists
    async fn lookup_address(&self, address: &str) -> Result<Option<String>>;
}

/// ENS lookups over a JSON-RPC mainnet provider
#[derive(Debug, Clone)]
pub struct EthersNameService {
    provider: Provider<Http>,
}

impl EthersNameService {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ResolveError::Provider(format!("invalid RPC URL {}: {}", rpc_url, e)))?
            .interval(Duration::from_millis(500));

        info!("ENS provider configured for {}", rpc_url);
        Ok(Self { provider })
    }
}

/// Missing records are an answer, not a failure
fn missing_record(error: &ProviderError) -> bool {
    matches!(
        error,
        ProviderError::EnsError(_) | ProviderError::EnsNotOwned(_)
    )
}

#[async_trait]
impl NameService for EthersNameService {
    async fn resolve_name(&self, name: &str) -> Result<Option<String>> {
        match self.provider.resolve_name(name).await {
            Ok(address) if address.is_zero() => Ok(None),
            Ok(address) => Ok(Some(to_checksum(&address, None))),
            Err(e) if missing_record(&e) => {
                debug!("No address record for {}: {}", name, e);
                Ok(None)
            }
            Err(e) => Err(ResolveError::Provider(e.to_string())),
        }
    }

    async fn lookup_address(&self, address: &str) -> Result<Option<String>> {
        let parsed: Address = address.parse().map_err(|_| ResolveError::InvalidInput {
            input: address.to_string(),
        })?;

        match self.provider.lookup_address(parsed).await {
            Ok(name) if name.is_empty() => Ok(None),
            Ok(name) => Ok(Some(name)),
            Err(e) if missing_record(&e) => {
                debug!("No reverse record for {}: {}", address, e);
                Ok(None)
            }
            Err(e) => Err(ResolveError::Provider(e.to_string())),
        }
    }
}
