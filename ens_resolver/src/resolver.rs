use crate::{
    cache::NameCache,
    error::{ResolveError, Result},
    service::NameService,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timeline_core::format::{is_evm_address, trim_address};
use tracing::{debug, info, warn};

/// Wallet identified by a search input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedWallet {
    pub address: String,
    /// ENS name, when the input was one or the reverse lookup found one
    pub ens: Option<String>,
}

impl ResolvedWallet {
    /// ENS name if known, otherwise the shortened address
    pub fn display_name(&self) -> String {
        match &self.ens {
            Some(name) => name.clone(),
            None => trim_address(&self.address),
        }
    }
}

/// Turns a search box input (address or ENS name) into a wallet address
pub struct WalletResolver<S: NameService> {
    service: S,
    cache: Arc<NameCache>,
}

impl<S: NameService> WalletResolver<S> {
    pub fn new(service: S, cache: Arc<NameCache>) -> Self {
        Self { service, cache }
    }

    /// A literal address always resolves, its reverse name is best-effort.
    /// Anything else is an ENS name; `.eth` is appended when no TLD is given.
    pub async fn resolve_wallet(&self, input: &str) -> Result<ResolvedWallet> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ResolveError::InvalidInput {
                input: input.to_string(),
            });
        }

        if is_evm_address(input) {
            let ens = self.reverse_lookup(input).await;
            info!("Resolved address {} (ens: {:?})", input, ens);
            return Ok(ResolvedWallet {
                address: input.to_string(),
                ens,
            });
        }

        let name = normalize_name(input);
        match self.service.resolve_name(&name).await? {
            Some(address) => {
                info!("Resolved {} to {}", name, address);
                self.cache.insert(&address, Some(name.clone()));
                Ok(ResolvedWallet {
                    address,
                    ens: Some(name),
                })
            }
            None => {
                warn!("{} has no associated wallet", name);
                Err(ResolveError::NoAssociatedWallet { name })
            }
        }
    }

    /// Cached primary name lookup; provider failures read as "no name"
    pub async fn reverse_lookup(&self, address: &str) -> Option<String> {
        if let Some(cached) = self.cache.get(address) {
            return cached;
        }

        match self.service.lookup_address(address).await {
            Ok(name) => {
                self.cache.insert(address, name.clone());
                name
            }
            Err(e) => {
                warn!("Reverse ENS lookup failed for {}: {}", address, e);
                None
            }
        }
    }
}

fn normalize_name(input: &str) -> String {
    let name = input.to_lowercase();
    if name.contains('.') {
        name
    } else {
        debug!("Appending .eth to {}", name);
        format!("{}.eth", name)
    }
}
