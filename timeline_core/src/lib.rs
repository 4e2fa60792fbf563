pub mod format;
pub mod grouper;
pub mod intervals;
pub mod pagination;
pub mod timeframe;

pub use grouper::{group_events, EventGroup, DEFAULT_COLLAPSE_THRESHOLD};
pub use intervals::{bucket_by_interval, IntervalBucket, IntervalGranularity};
pub use pagination::{
    merge_groups, FusedBoundaryMerge, IndependentPageMerge, MergeStrategy, PageMergePolicy,
};
pub use timeframe::DateRange;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("Invalid event type: {0}")]
    InvalidEventType(String),
    #[error("Malformed record {record}: {reason}")]
    MalformedRecord { record: String, reason: String },
    #[error("Precondition violated: {0}")]
    Precondition(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("filter {0} is not valid")]
    InvalidFilter(String),
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

impl TimelineError {
    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        TimelineError::MalformedRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

/// Semantic classification of a wallet's involvement in one marketplace event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Minted,
    Bought,
    Sold,
    Sent,
    Received,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Minted => "Minted",
            Action::Bought => "Bought",
            Action::Sold => "Sold",
            Action::Sent => "Sent",
            Action::Received => "Received",
        }
    }

    /// Bought and Sold are the only actions that carry a price
    pub fn is_trade(&self) -> bool {
        matches!(self, Action::Bought | Action::Sold)
    }

    /// Whether the counterparty sits on the `from` side of the event
    pub fn counterparty_is_sender(&self) -> bool {
        matches!(self, Action::Bought | Action::Received | Action::Minted)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity-type filter accepted by the event page fetcher.
///
/// The marketplace only distinguishes two bulk categories, so the filter is
/// two-valued plus "everything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityFilter {
    #[default]
    All,
    /// Completed sales: Bought and Sold
    BuySell,
    /// Mints and peer transfers: Minted, Sent, Received
    MintTransfer,
}

impl ActivityFilter {
    /// Marketplace `event_type` query value for this filter
    pub fn event_type(&self) -> Option<&'static str> {
        match self {
            ActivityFilter::All => None,
            ActivityFilter::BuySell => Some("successful"),
            ActivityFilter::MintTransfer => Some("transfer"),
        }
    }
}

impl FromStr for ActivityFilter {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "all" => Ok(ActivityFilter::All),
            "successful" | "buy-sell" => Ok(ActivityFilter::BuySell),
            "transfer" | "mint-transfer" => Ok(ActivityFilter::MintTransfer),
            other => Err(TimelineError::InvalidFilter(other.to_string())),
        }
    }
}

/// Which address a Minted event reports as its `from` side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MintedFrom {
    /// The transfer's own `from_account` (usually the zero address)
    #[default]
    TransferSender,
    /// The asset's contract address
    AssetContract,
}

impl FromStr for MintedFrom {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "transfer_sender" => Ok(MintedFrom::TransferSender),
            "asset_contract" => Ok(MintedFrom::AssetContract),
            other => Err(TimelineError::InvalidOption(format!(
                "unknown minted_from policy '{}'",
                other
            ))),
        }
    }
}

/// One classified marketplace event, ready for display grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub asset_name: String,
    pub asset_description: String,
    pub asset_image_url: String,
    pub asset_url: String,

    pub collection_name: String,
    pub collection_url: String,
    pub collection_image_url: String,
    pub collection_description: String,

    /// Event time (UTC)
    pub date: DateTime<Utc>,

    /// Uppercased participant addresses
    pub from: String,
    pub to: String,

    pub action: Action,

    /// Transaction hash + asset id. One transaction can move several assets.
    pub key: String,

    pub transaction_hash: String,

    /// Sale price in wei, present only for Bought and Sold
    pub price: Option<u128>,
}

impl NormalizedEvent {
    /// The other party of the event from the subject wallet's point of view
    pub fn counterparty(&self) -> &str {
        if self.action.counterparty_is_sender() {
            &self.from
        } else {
            &self.to
        }
    }

    /// Short title such as "Bought from" or "Sent to"
    pub fn title(&self) -> String {
        let preposition = if self.action.counterparty_is_sender() {
            "from"
        } else {
            "to"
        };
        format!("{} {}", self.action, preposition)
    }
}

/// A collection the wallet holds or has recently touched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub slug: String,
    pub contract_address: Option<String>,
    pub image_url: Option<String>,
    /// Number of assets currently owned; "0" when only seen in event history
    pub holding: String,
    /// Floor price in ETH
    pub floor: Option<Decimal>,
}

impl CollectionInfo {
    /// De-duplication key. Held and event-derived entries both carry the slug,
    /// while a contract can be missing on one side or shared by several slugs.
    pub fn identifier(&self) -> &str {
        &self.slug
    }

    /// Whether this collection lives at `contract` (case-insensitive)
    pub fn has_contract(&self, contract: &str) -> bool {
        self.contract_address
            .as_deref()
            .map_or(false, |address| address.eq_ignore_ascii_case(contract.trim()))
    }
}
