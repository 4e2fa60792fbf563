use crate::{
    filter::EventFilter,
    types::{Account, AssetEvent, CollectionMeta, OpenSeaConfig},
};
use chrono::{DateTime, Utc};
use timeline_core::{timeframe::parse_event_timestamp, Action, MintedFrom, NormalizedEvent, TimelineError};
use tracing::debug;

type Result<T> = std::result::Result<T, TimelineError>;

/// The two event shapes the classifier understands, with their participants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Sale {
        winner: String,
        seller: String,
        total_price: u128,
    },
    Transfer {
        /// Transaction initiator
        starter: String,
        /// Transaction's stated recipient, usually a contract
        participant: Option<String>,
        sender: String,
        receiver: String,
    },
}

impl EventKind {
    /// Check the raw record's event type and pull out the accounts it must carry
    pub fn from_raw(event: &AssetEvent) -> Result<Self> {
        let label = event.describe();
        match event.event_type.as_deref() {
            Some("successful") => {
                let winner = required_account(&event.winner_account, &label, "winner_account")?;
                let seller = required_account(&event.seller, &label, "seller")?;
                let raw_price = event
                    .total_price
                    .as_deref()
                    .ok_or_else(|| TimelineError::malformed(&label, "missing total_price"))?;
                let total_price = raw_price.trim().parse::<u128>().map_err(|e| {
                    TimelineError::malformed(&label, format!("total_price '{}': {}", raw_price, e))
                })?;
                Ok(EventKind::Sale {
                    winner,
                    seller,
                    total_price,
                })
            }
            Some("transfer") => {
                let transaction = event
                    .transaction
                    .as_ref()
                    .ok_or_else(|| TimelineError::malformed(&label, "missing transaction"))?;
                let starter =
                    required_account(&transaction.from_account, &label, "transaction.from_account")?;
                let participant = transaction.to_account.as_ref().map(|a| a.address.clone());
                let sender = required_account(&event.from_account, &label, "from_account")?;
                let receiver = required_account(&event.to_account, &label, "to_account")?;
                Ok(EventKind::Transfer {
                    starter,
                    participant,
                    sender,
                    receiver,
                })
            }
            Some(other) => Err(TimelineError::InvalidEventType(other.to_string())),
            None => Err(TimelineError::InvalidEventType(String::new())),
        }
    }
}

fn required_account(account: &Option<Account>, label: &str, field: &str) -> Result<String> {
    account
        .as_ref()
        .map(|a| a.address.clone())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| TimelineError::malformed(label, format!("missing {}", field)))
}

fn same_address(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}

/// Classify an already validated event for the subject wallet.
///
/// The mint rule is a heuristic: the subject started the transaction and
/// received the asset, while the transaction went to a third address (the
/// contract). It is known to misclassify NFTs bought on other marketplaces
/// that the feed reports as plain transfers.
pub fn determine_action(kind: &EventKind, subject: &str) -> Action {
    match kind {
        EventKind::Sale { winner, .. } => {
            if same_address(winner, subject) {
                Action::Bought
            } else {
                Action::Sold
            }
        }
        EventKind::Transfer {
            starter,
            participant,
            sender,
            receiver,
        } => {
            let minted = participant.as_deref().map_or(false, |participant| {
                same_address(starter, receiver)
                    && same_address(starter, subject)
                    && !same_address(participant, receiver)
                    && !same_address(participant, sender)
            });

            if minted {
                Action::Minted
            } else if same_address(sender, subject) {
                Action::Sent
            } else {
                Action::Received
            }
        }
    }
}

/// Classify one raw record. Fails on anything but `successful` / `transfer`.
pub fn classify_event(event: &AssetEvent, subject: &str) -> Result<Action> {
    let kind = EventKind::from_raw(event)?;
    Ok(determine_action(&kind, subject))
}

/// Fully checked event: classification inputs plus resolved display fields
#[derive(Debug, Clone)]
pub struct ValidatedEvent {
    pub kind: EventKind,
    pub transaction_hash: String,
    pub asset_id: String,
    pub contract_address: Option<String>,
    pub date: DateTime<Utc>,
    pub asset_name: String,
    pub asset_description: String,
    pub asset_image_url: String,
    pub asset_url: String,
    pub collection_name: String,
    pub collection_url: String,
    pub collection_image_url: String,
    pub collection_description: String,
}

impl ValidatedEvent {
    pub fn from_raw(event: &AssetEvent, marketplace_url: &str) -> Result<Self> {
        let label = event.describe();
        let kind = EventKind::from_raw(event)?;

        let transaction = event
            .transaction
            .as_ref()
            .ok_or_else(|| TimelineError::malformed(&label, "missing transaction"))?;
        let asset = event
            .asset
            .as_ref()
            .ok_or_else(|| TimelineError::malformed(&label, "missing asset"))?;
        let collection = asset
            .collection
            .as_ref()
            .ok_or_else(|| TimelineError::malformed(&label, "missing asset.collection"))?;

        let transaction_hash = transaction
            .transaction_hash
            .clone()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TimelineError::malformed(&label, "missing transaction_hash"))?;

        let asset_id = asset
            .id
            .map(|id| id.to_string())
            .or_else(|| asset.token_id.clone())
            .ok_or_else(|| TimelineError::malformed(&label, "missing asset id"))?;

        let raw_date = transaction
            .timestamp
            .as_deref()
            .or(event.created_date.as_deref())
            .ok_or_else(|| TimelineError::malformed(&label, "missing timestamp"))?;
        let date = parse_event_timestamp(raw_date)
            .map_err(|e| TimelineError::malformed(&label, e.to_string()))?;

        let contract_address = asset
            .asset_contract
            .as_ref()
            .and_then(|c| c.address.clone())
            .or_else(|| event.contract_address.clone());

        let marketplace = marketplace_url.trim_end_matches('/');

        let asset_name = asset
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| asset.token_id.as_ref().map(|t| format!("#{}", t)))
            .unwrap_or_default();

        let asset_image_url = first_present(&[
            &asset.image_url,
            &asset.image_preview_url,
            &asset.image_thumbnail_url,
            &asset.image_original_url,
        ]);

        let asset_url = asset.permalink.clone().filter(|p| !p.is_empty()).unwrap_or_else(|| {
            match (&contract_address, &asset.token_id) {
                (Some(contract), Some(token)) => {
                    format!("{}/assets/{}/{}", marketplace, contract, token)
                }
                _ => String::new(),
            }
        });

        let collection_name = collection
            .name
            .clone()
            .or_else(|| collection.slug.clone())
            .ok_or_else(|| TimelineError::malformed(&label, "missing collection name"))?;

        Ok(Self {
            kind,
            transaction_hash,
            asset_id,
            contract_address,
            date,
            asset_name,
            asset_description: asset.description.clone().unwrap_or_default(),
            asset_image_url,
            asset_url,
            collection_url: collection_url(collection, marketplace),
            collection_image_url: first_present(&[
                &collection.featured_image_url,
                &collection.image_url,
                &collection.banner_image_url,
            ]),
            collection_description: collection.description.clone().unwrap_or_default(),
            collection_name,
        })
    }
}

fn first_present(candidates: &[&Option<String>]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn collection_url(collection: &CollectionMeta, marketplace: &str) -> String {
    if let Some(external) = collection.external_url.as_deref().filter(|u| !u.is_empty()) {
        return external.to_string();
    }
    collection
        .slug
        .as_deref()
        .map(|slug| format!("{}/collection/{}", marketplace, slug))
        .unwrap_or_default()
}

/// Filter, classify and project a raw page into display events, keeping order
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    filter: EventFilter,
    minted_from: MintedFrom,
    marketplace_url: String,
}

impl EventNormalizer {
    pub fn new(config: &OpenSeaConfig) -> Self {
        Self {
            filter: EventFilter::new(config.settlement_username.clone()),
            minted_from: MintedFrom::default(),
            marketplace_url: config.marketplace_url.clone(),
        }
    }

    pub fn with_minted_from(mut self, minted_from: MintedFrom) -> Self {
        self.minted_from = minted_from;
        self
    }

    /// A malformed surviving record fails the whole page
    pub fn normalize(&self, events: Vec<AssetEvent>, subject: &str) -> Result<Vec<NormalizedEvent>> {
        let raw_count = events.len();
        let kept = self.filter.filter(events);

        let normalized = kept
            .iter()
            .map(|event| self.project(event, subject))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Normalized {} events ({} raw) for wallet {}",
            normalized.len(),
            raw_count,
            subject
        );
        Ok(normalized)
    }

    fn project(&self, event: &AssetEvent, subject: &str) -> Result<NormalizedEvent> {
        let validated = ValidatedEvent::from_raw(event, &self.marketplace_url)?;
        let action = determine_action(&validated.kind, subject);

        let (from, to, price) = match &validated.kind {
            EventKind::Sale {
                winner,
                seller,
                total_price,
            } => (seller.clone(), winner.clone(), Some(*total_price)),
            EventKind::Transfer {
                sender, receiver, ..
            } => {
                let from = match (action, self.minted_from, &validated.contract_address) {
                    (Action::Minted, MintedFrom::AssetContract, Some(contract)) => contract.clone(),
                    _ => sender.clone(),
                };
                (from, receiver.clone(), None)
            }
        };

        debug!(
            "{} {} -> {} ({})",
            validated.transaction_hash, validated.asset_name, action, validated.collection_name
        );

        Ok(NormalizedEvent {
            key: format!("{}{}", validated.transaction_hash, validated.asset_id),
            asset_name: validated.asset_name,
            asset_description: validated.asset_description,
            asset_image_url: validated.asset_image_url,
            asset_url: validated.asset_url,
            collection_name: validated.collection_name,
            collection_url: validated.collection_url,
            collection_image_url: validated.collection_image_url,
            collection_description: validated.collection_description,
            date: validated.date,
            from: from.to_uppercase(),
            to: to.to_uppercase(),
            action,
            transaction_hash: validated.transaction_hash,
            price,
        })
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new(&OpenSeaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, Transaction};

    const SUBJECT: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const OTHER: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const CONTRACT: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
    const ZERO: &str = "0x0000000000000000000000000000000000000000";

    fn account(address: &str) -> Option<Account> {
        Some(Account {
            address: address.to_string(),
            user: None,
        })
    }

    fn transfer(starter: &str, participant: Option<&str>, sender: &str, receiver: &str) -> AssetEvent {
        AssetEvent {
            event_type: Some("transfer".to_string()),
            asset: Some(Asset {
                id: Some(7),
                token_id: Some("7".to_string()),
                collection: Some(CollectionMeta {
                    name: Some("CollX".to_string()),
                    slug: Some("collx".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            transaction: Some(Transaction {
                transaction_hash: Some("0xfeed".to_string()),
                timestamp: Some("2022-01-05T10:00:00".to_string()),
                from_account: account(starter),
                to_account: participant.and_then(account),
            }),
            from_account: account(sender),
            to_account: account(receiver),
            ..Default::default()
        }
    }

    fn sale(winner: &str, seller: &str) -> AssetEvent {
        let mut event = transfer(winner, Some(CONTRACT), seller, winner);
        event.event_type = Some("successful".to_string());
        event.winner_account = account(winner);
        event.seller = account(seller);
        event.total_price = Some("1000000000000000000".to_string());
        event
    }

    #[test]
    fn test_sale_classification_is_case_insensitive() {
        let event = sale(&SUBJECT.to_uppercase(), OTHER);
        assert_eq!(classify_event(&event, SUBJECT).unwrap(), Action::Bought);
        assert_eq!(classify_event(&event, OTHER).unwrap(), Action::Sold);
    }

    #[test]
    fn test_mint_detection() {
        let event = transfer(SUBJECT, Some(CONTRACT), ZERO, SUBJECT);
        assert_eq!(classify_event(&event, SUBJECT).unwrap(), Action::Minted);
    }

    #[test]
    fn test_mint_requires_participant() {
        let event = transfer(SUBJECT, None, ZERO, SUBJECT);
        assert_eq!(classify_event(&event, SUBJECT).unwrap(), Action::Received);
    }

    #[test]
    fn test_participant_matching_receiver_is_not_a_mint() {
        let event = transfer(SUBJECT, Some(SUBJECT), ZERO, SUBJECT);
        assert_eq!(classify_event(&event, SUBJECT).unwrap(), Action::Received);
    }

    #[test]
    fn test_send_and_receive() {
        let sent = transfer(SUBJECT, Some(CONTRACT), SUBJECT, OTHER);
        assert_eq!(classify_event(&sent, SUBJECT).unwrap(), Action::Sent);

        let received = transfer(OTHER, Some(CONTRACT), OTHER, SUBJECT);
        assert_eq!(classify_event(&received, SUBJECT).unwrap(), Action::Received);
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let mut event = transfer(SUBJECT, None, SUBJECT, OTHER);
        event.event_type = Some("bid_entered".to_string());
        assert_eq!(
            classify_event(&event, SUBJECT).unwrap_err(),
            TimelineError::InvalidEventType("bid_entered".to_string())
        );
    }

    #[test]
    fn test_minted_from_policy() {
        let mut event = transfer(SUBJECT, Some(CONTRACT), ZERO, SUBJECT);
        if let Some(asset) = event.asset.as_mut() {
            asset.asset_contract = Some(crate::types::AssetContract {
                address: Some(CONTRACT.to_string()),
                name: None,
            });
        }

        let default = EventNormalizer::default()
            .normalize(vec![event.clone()], SUBJECT)
            .unwrap();
        assert_eq!(default[0].from, ZERO.to_uppercase());

        let contract = EventNormalizer::default()
            .with_minted_from(MintedFrom::AssetContract)
            .normalize(vec![event], SUBJECT)
            .unwrap();
        assert_eq!(contract[0].from, CONTRACT.to_uppercase());
    }

    #[test]
    fn test_unparsable_price_is_malformed() {
        let mut event = sale(SUBJECT, OTHER);
        event.total_price = Some("1.5e18".to_string());
        let err = EventNormalizer::default()
            .normalize(vec![event], SUBJECT)
            .unwrap_err();
        assert!(matches!(err, TimelineError::MalformedRecord { .. }));
    }

    #[test]
    fn test_display_fallbacks() {
        let mut event = transfer(OTHER, None, OTHER, SUBJECT);
        if let Some(asset) = event.asset.as_mut() {
            asset.name = None;
            asset.image_preview_url = Some("https://img/preview.png".to_string());
            asset.asset_contract = Some(crate::types::AssetContract {
                address: Some(CONTRACT.to_string()),
                name: None,
            });
            if let Some(collection) = asset.collection.as_mut() {
                collection.banner_image_url = Some("https://img/banner.png".to_string());
            }
        }

        let events = EventNormalizer::default()
            .normalize(vec![event], SUBJECT)
            .unwrap();
        let e = &events[0];
        assert_eq!(e.asset_name, "#7");
        assert_eq!(e.asset_image_url, "https://img/preview.png");
        assert_eq!(e.asset_url, format!("https://opensea.io/assets/{}/7", CONTRACT));
        assert_eq!(e.collection_url, "https://opensea.io/collection/collx");
        assert_eq!(e.collection_image_url, "https://img/banner.png");
    }
}
