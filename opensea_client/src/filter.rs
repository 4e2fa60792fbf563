use crate::types::AssetEvent;
use tracing::debug;

/// Drops raw records that would double-count or cannot be shown.
///
/// A completed sale arrives as a `successful` record plus a `transfer` record
/// sent to the settlement account; only the former is kept.
#[derive(Debug, Clone)]
pub struct EventFilter {
    settlement_username: String,
}

impl EventFilter {
    pub fn new(settlement_username: impl Into<String>) -> Self {
        Self {
            settlement_username: settlement_username.into(),
        }
    }

    pub fn filter(&self, events: Vec<AssetEvent>) -> Vec<AssetEvent> {
        let before = events.len();
        let kept: Vec<AssetEvent> = events.into_iter().filter(|e| self.keep(e)).collect();
        debug!("Event filter kept {} of {} records", kept.len(), before);
        kept
    }

    pub fn keep(&self, event: &AssetEvent) -> bool {
        if event.transaction.is_none() || event.asset.is_none() {
            debug!("Dropping incomplete record {}", event.describe());
            return false;
        }

        match event.event_type.as_deref() {
            Some("transfer") => !self.is_sale_settlement(event),
            // Sales are kept unconditionally; unknown types fail later in the parser
            _ => true,
        }
    }

    fn is_sale_settlement(&self, event: &AssetEvent) -> bool {
        event
            .transaction
            .as_ref()
            .and_then(|t| t.to_account.as_ref())
            .and_then(|a| a.user.as_ref())
            .and_then(|u| u.username.as_deref())
            .map_or(false, |name| name == self.settlement_username)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new(crate::types::OpenSeaConfig::default().settlement_username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Account, Asset, Transaction, UserProfile};

    fn record(event_type: &str, tx_recipient_user: Option<&str>) -> AssetEvent {
        AssetEvent {
            event_type: Some(event_type.to_string()),
            asset: Some(Asset::default()),
            transaction: Some(Transaction {
                transaction_hash: Some("0xfeed".to_string()),
                to_account: Some(Account {
                    address: "0x7be8076f4ea4a4ad08075c2508e481d6c946d12b".to_string(),
                    user: tx_recipient_user.map(|u| UserProfile {
                        username: Some(u.to_string()),
                    }),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_drops_settlement_transfer_keeps_sale() {
        let filter = EventFilter::default();
        let events = vec![
            record("successful", Some("OpenSea-Orders")),
            record("transfer", Some("OpenSea-Orders")),
            record("transfer", Some("someone")),
            record("transfer", None),
        ];

        let kept = filter.filter(events);
        let types: Vec<_> = kept
            .iter()
            .map(|e| e.event_type.clone().unwrap())
            .collect();
        assert_eq!(types, vec!["successful", "transfer", "transfer"]);
    }

    #[test]
    fn test_drops_records_without_transaction_or_asset() {
        let filter = EventFilter::default();
        let mut no_tx = record("transfer", None);
        no_tx.transaction = None;
        let mut no_asset = record("successful", None);
        no_asset.asset = None;

        assert!(filter.filter(vec![no_tx, no_asset]).is_empty());
    }

    #[test]
    fn test_unknown_types_pass_through() {
        let filter = EventFilter::default();
        assert_eq!(filter.filter(vec![record("bid_entered", None)]).len(), 1);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let filter = EventFilter::new("OpenSea-Orders");
        let events = vec![
            record("successful", None),
            record("transfer", Some("OpenSea-Orders")),
            record("transfer", None),
        ];
        let once = filter.filter(events);
        let twice = filter.filter(once.clone());
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.describe(), b.describe());
        }
    }
}
