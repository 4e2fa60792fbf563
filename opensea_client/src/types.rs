use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use timeline_core::{ActivityFilter, DateRange};

/// Configuration for the OpenSea API client
#[derive(Debug, Clone)]
pub struct OpenSeaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Public marketplace site, used to build asset and collection links
    pub marketplace_url: String,
    pub timeout_seconds: u64,
    /// Username of the marketplace's order-settlement account
    pub settlement_username: String,
    /// Page size for the held-collections and recent-events lookups
    pub collections_limit: u32,
}

impl Default for OpenSeaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.opensea.io/api/v1".to_string(),
            marketplace_url: "https://opensea.io".to_string(),
            timeout_seconds: 30,
            settlement_username: "OpenSea-Orders".to_string(),
            collections_limit: 300,
        }
    }
}

/// Response of the `events` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub asset_events: Vec<AssetEvent>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// One raw marketplace event. Every nested field is optional at this boundary;
/// `parser::ValidatedEvent` is the checked form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetEvent {
    pub id: Option<u64>,
    pub event_type: Option<String>,
    pub asset: Option<Asset>,
    pub transaction: Option<Transaction>,
    pub from_account: Option<Account>,
    pub to_account: Option<Account>,
    pub winner_account: Option<Account>,
    pub seller: Option<Account>,
    /// Sale price in wei, as a decimal string
    pub total_price: Option<String>,
    pub created_date: Option<String>,
    pub collection_slug: Option<String>,
    pub contract_address: Option<String>,
}

impl AssetEvent {
    /// Short label for log lines and error messages
    pub fn describe(&self) -> String {
        let hash = self
            .transaction
            .as_ref()
            .and_then(|t| t.transaction_hash.as_deref())
            .unwrap_or("<no transaction>");
        format!(
            "{}:{}",
            self.event_type.as_deref().unwrap_or("<no event_type>"),
            hash
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Asset {
    pub id: Option<u64>,
    pub token_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub image_preview_url: Option<String>,
    pub image_thumbnail_url: Option<String>,
    pub image_original_url: Option<String>,
    pub permalink: Option<String>,
    pub asset_contract: Option<AssetContract>,
    pub collection: Option<CollectionMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetContract {
    pub address: Option<String>,
    pub name: Option<String>,
}

/// Collection metadata embedded in assets and asset-contract lookups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub featured_image_url: Option<String>,
    pub banner_image_url: Option<String>,
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: Option<String>,
}

/// On-chain transaction that carried the event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_hash: Option<String>,
    pub timestamp: Option<String>,
    /// Initiator of the transaction
    pub from_account: Option<Account>,
    /// Stated recipient of the transaction (contract or exchange)
    pub to_account: Option<Account>,
}

/// Entry of the `collections?asset_owner=` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeldCollection {
    pub name: Option<String>,
    pub slug: String,
    pub image_url: Option<String>,
    pub owned_asset_count: Option<u64>,
    #[serde(default)]
    pub primary_asset_contracts: Vec<AssetContract>,
    pub stats: Option<CollectionStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    pub floor_price: Option<Decimal>,
}

/// Response of the `asset_contract/{address}` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetContractDetail {
    pub address: String,
    pub name: Option<String>,
    pub collection: Option<CollectionMeta>,
}

/// Response of the `collection/{slug}/stats` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStatsResponse {
    pub stats: CollectionStats,
}

/// Request parameters for one page of wallet events
#[derive(Debug, Clone, Default)]
pub struct EventsRequest {
    pub account_address: String,
    pub limit: u32,
    pub offset: u32,
    pub occurred_after: Option<DateTime<Utc>>,
    pub occurred_before: Option<DateTime<Utc>>,
    pub asset_contract_address: Option<String>,
    pub activity: ActivityFilter,
}

impl EventsRequest {
    pub fn new(account_address: &str, limit: u32, offset: u32) -> Self {
        Self {
            account_address: account_address.to_string(),
            limit,
            offset,
            ..Default::default()
        }
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.occurred_after = range.start;
        self.occurred_before = range.end;
        self
    }

    pub fn with_collection(mut self, contract_address: Option<String>) -> Self {
        self.asset_contract_address = contract_address.filter(|c| !c.is_empty());
        self
    }

    pub fn with_activity(mut self, activity: ActivityFilter) -> Self {
        self.activity = activity;
        self
    }

    /// Query string pairs in the order the endpoint documents them
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("account_address", self.account_address.clone()),
            ("only_opensea", "false".to_string()),
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(event_type) = self.activity.event_type() {
            params.push(("event_type", event_type.to_string()));
        }
        if let Some(contract) = &self.asset_contract_address {
            params.push(("asset_contract_address", contract.clone()));
        }
        if let Some(after) = self.occurred_after {
            params.push(("occurred_after", after.timestamp().to_string()));
        }
        if let Some(before) = self.occurred_before {
            params.push(("occurred_before", before.timestamp().to_string()));
        }
        params
    }
}
