use crate::{
    collections::{aggregate_collections, collection_from_detail},
    error::OpenSeaError,
    types::{
        AssetContractDetail, AssetEvent, CollectionStatsResponse, EventsRequest, EventsResponse,
        HeldCollection, OpenSeaConfig,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use timeline_core::{format::is_evm_address, CollectionInfo};
use tracing::{debug, error, info, warn};
use url::Url;

/// Source of raw event pages, the seam the timeline session pages through
#[async_trait]
pub trait EventPageFetcher: Send + Sync {
    async fn fetch_events_page(
        &self,
        request: &EventsRequest,
    ) -> Result<Vec<AssetEvent>, OpenSeaError>;
}

/// Single-collection lookup, used when a filtered collection is not in the
/// wallet's list
#[async_trait]
pub trait CollectionFetcher: Send + Sync {
    async fn fetch_collection(
        &self,
        contract_address: &str,
    ) -> Result<CollectionInfo, OpenSeaError>;
}

/// OpenSea v1 REST client for wallet events and collections
#[derive(Debug, Clone)]
pub struct OpenSeaClient {
    client: Client,
    base_url: Url,
    config: OpenSeaConfig,
}

impl OpenSeaClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, OpenSeaError> {
        Self::with_config(OpenSeaConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: OpenSeaConfig) -> Result<Self, OpenSeaError> {
        let base_url = Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &OpenSeaConfig {
        &self.config
    }

    /// Validate wallet address format (0x + 40 hex chars)
    pub fn validate_wallet_address(address: &str) -> Result<(), OpenSeaError> {
        if is_evm_address(address) {
            Ok(())
        } else {
            Err(OpenSeaError::InvalidAddress {
                address: address.to_string(),
            })
        }
    }

    /// Validate collection contract format (0x + 40 hex chars)
    pub fn validate_contract_address(address: &str) -> Result<(), OpenSeaError> {
        if is_evm_address(address) {
            Ok(())
        } else {
            Err(OpenSeaError::InvalidContract {
                address: address.to_string(),
            })
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET an endpoint and decode its JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, OpenSeaError> {
        let url = self.endpoint(path);
        debug!("OpenSea request: {} {:?}", url, query);

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header("X-API-KEY", key);
        }

        let start_time = std::time::Instant::now();
        let response = request.send().await?;
        let status = response.status();
        debug!(
            "OpenSea response {} for {} in {:.2}s",
            status,
            path,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("OpenSea API error - Status: {}, Body: {}", status, text);

            return Err(match status.as_u16() {
                401 | 403 => OpenSeaError::AuthError,
                429 => OpenSeaError::RateLimit,
                _ => OpenSeaError::ApiError {
                    message: format!("HTTP {}: {}", status, text),
                },
            });
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            let sample: String = response_text.chars().take(500).collect();
            error!("Failed to parse OpenSea response from {}: {}", path, e);
            error!("Response sample: {}", sample);
            OpenSeaError::ParseError {
                message: format!(
                    "{} (response size: {} bytes)",
                    e,
                    response_text.len()
                ),
            }
        })
    }

    /// Fetch one offset-based page of events for a wallet, newest first
    pub async fn get_events_page(
        &self,
        request: &EventsRequest,
    ) -> Result<Vec<AssetEvent>, OpenSeaError> {
        Self::validate_wallet_address(&request.account_address)?;

        let response: EventsResponse = self.get_json("events", &request.query_params()).await?;

        info!(
            "Fetched {} events for {} (offset {}, limit {})",
            response.asset_events.len(),
            request.account_address,
            request.offset,
            request.limit
        );
        Ok(response.asset_events)
    }

    /// Collections with at least one asset currently owned by the wallet
    pub async fn get_held_collections(
        &self,
        address: &str,
    ) -> Result<Vec<HeldCollection>, OpenSeaError> {
        Self::validate_wallet_address(address)?;

        let query = [
            ("asset_owner", address.to_string()),
            ("offset", "0".to_string()),
            ("limit", self.config.collections_limit.to_string()),
        ];
        let held: Vec<HeldCollection> = self.get_json("collections", &query).await?;
        info!("Wallet {} holds assets in {} collections", address, held.len());
        Ok(held)
    }

    /// Most recent events of any type, used as a "touched collections" signal
    pub async fn get_recent_events(&self, address: &str) -> Result<Vec<AssetEvent>, OpenSeaError> {
        let request = EventsRequest::new(address, self.config.collections_limit, 0);
        self.get_events_page(&request).await
    }

    /// Held and recently touched collections, fetched concurrently.
    /// Both lookups must succeed.
    pub async fn get_wallet_collections(
        &self,
        address: &str,
    ) -> Result<Vec<CollectionInfo>, OpenSeaError> {
        let (held, recent) = tokio::try_join!(
            self.get_held_collections(address),
            self.get_recent_events(address)
        )?;

        let collections = aggregate_collections(&held, &recent);
        info!(
            "Wallet {} has {} distinct collections",
            address,
            collections.len()
        );
        Ok(collections)
    }

    /// Look up a single collection by contract, including its floor price.
    /// A failed stats lookup leaves the floor empty.
    pub async fn get_collection(
        &self,
        contract_address: &str,
    ) -> Result<CollectionInfo, OpenSeaError> {
        Self::validate_contract_address(contract_address)?;

        let detail: AssetContractDetail = self
            .get_json(&format!("asset_contract/{}", contract_address), &[])
            .await?;

        let slug = detail.collection.as_ref().and_then(|c| c.slug.clone());
        let stats = match slug {
            Some(slug) => match self
                .get_json::<CollectionStatsResponse>(&format!("collection/{}/stats", slug), &[])
                .await
            {
                Ok(response) => Some(response.stats),
                Err(e) => {
                    warn!("Floor price unavailable for {}: {}", slug, e);
                    None
                }
            },
            None => None,
        };

        Ok(collection_from_detail(&detail, stats.as_ref()))
    }
}

#[async_trait]
impl EventPageFetcher for OpenSeaClient {
    async fn fetch_events_page(
        &self,
        request: &EventsRequest,
    ) -> Result<Vec<AssetEvent>, OpenSeaError> {
        self.get_events_page(request).await
    }
}

#[async_trait]
impl CollectionFetcher for OpenSeaClient {
    async fn fetch_collection(
        &self,
        contract_address: &str,
    ) -> Result<CollectionInfo, OpenSeaError> {
        self.get_collection(contract_address).await
    }
}
