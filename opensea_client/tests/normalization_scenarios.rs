use opensea_client::{AssetEvent, EventNormalizer, EventsResponse};
use serde_json::{json, Value};
use std::collections::HashSet;
use timeline_core::{group_events, Action, IndependentPageMerge, PageMergePolicy};

const WALLET: &str = "0x1111111111111111111111111111111111111111";
const SELLER: &str = "0x2222222222222222222222222222222222222222";
const CONTRACT: &str = "0x3333333333333333333333333333333333333333";
const EXCHANGE: &str = "0x7be8076f4ea4a4ad08075c2508e481d6c946d12b";
const ZERO: &str = "0x0000000000000000000000000000000000000000";

fn asset(id: u64) -> Value {
    json!({
        "id": id,
        "token_id": id.to_string(),
        "name": format!("Token #{}", id),
        "image_url": format!("https://img.example/{}.png", id),
        "permalink": format!("https://opensea.io/assets/{}/{}", CONTRACT, id),
        "asset_contract": { "address": CONTRACT, "name": "Cool Contract" },
        "collection": {
            "name": "Cool Collection",
            "slug": "cool-collection",
            "featured_image_url": "https://img.example/featured.png"
        }
    })
}

fn parse_page(events: Vec<Value>) -> Vec<AssetEvent> {
    let response: EventsResponse = serde_json::from_value(json!({
        "asset_events": events,
        "next": null,
        "previous": null
    }))
    .expect("fixture deserializes");
    response.asset_events
}

fn sale_with_settlement(hash: &str, asset_id: u64) -> Vec<Value> {
    vec![
        json!({
            "event_type": "successful",
            "asset": asset(asset_id),
            "transaction": {
                "transaction_hash": hash,
                "timestamp": "2022-03-01T12:00:00",
                "from_account": { "address": WALLET },
                "to_account": { "address": EXCHANGE, "user": { "username": "OpenSea-Orders" } }
            },
            "winner_account": { "address": WALLET },
            "seller": { "address": SELLER },
            "total_price": "1000000000000000000",
            "created_date": "2022-03-01T12:00:01.123456"
        }),
        json!({
            "event_type": "transfer",
            "asset": asset(asset_id),
            "transaction": {
                "transaction_hash": hash,
                "timestamp": "2022-03-01T12:00:00",
                "from_account": { "address": WALLET },
                "to_account": { "address": EXCHANGE, "user": { "username": "OpenSea-Orders" } }
            },
            "from_account": { "address": SELLER },
            "to_account": { "address": WALLET },
            "created_date": "2022-03-01T12:00:01.123456"
        }),
    ]
}

fn mint(hash: &str, asset_id: u64) -> Value {
    json!({
        "event_type": "transfer",
        "asset": asset(asset_id),
        "transaction": {
            "transaction_hash": hash,
            "timestamp": "2022-02-14T08:30:00",
            "from_account": { "address": WALLET },
            "to_account": { "address": CONTRACT }
        },
        "from_account": { "address": ZERO },
        "to_account": { "address": WALLET }
    })
}

#[test]
fn sale_and_its_settlement_transfer_become_one_bought_event() {
    let raw = parse_page(sale_with_settlement("0xsale", 1));
    let events = EventNormalizer::default().normalize(raw, WALLET).unwrap();

    assert_eq!(events.len(), 1);
    let bought = &events[0];
    assert_eq!(bought.action, Action::Bought);
    assert_eq!(bought.price, Some(1_000_000_000_000_000_000));
    assert_eq!(bought.from, SELLER.to_uppercase());
    assert_eq!(bought.to, WALLET.to_uppercase());
    assert_eq!(bought.key, "0xsale1");
    assert_eq!(bought.collection_name, "Cool Collection");
    assert_eq!(bought.collection_image_url, "https://img.example/featured.png");
    assert_eq!(bought.title(), "Bought from");
    assert_eq!(bought.counterparty(), SELLER.to_uppercase());
}

#[test]
fn the_other_side_of_the_same_sale_is_sold() {
    let raw = parse_page(sale_with_settlement("0xsale", 1));
    let events = EventNormalizer::default().normalize(raw, SELLER).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, Action::Sold);
    assert_eq!(events[0].counterparty(), WALLET.to_uppercase());
}

#[test]
fn contract_mint_is_classified_as_minted() {
    let raw = parse_page(vec![mint("0xmint", 5)]);
    let events = EventNormalizer::default().normalize(raw, WALLET).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, Action::Minted);
    assert_eq!(events[0].from, ZERO.to_uppercase());
    assert_eq!(events[0].price, None);
}

#[test]
fn bundle_mint_yields_distinct_keys_in_one_group() {
    let raw = parse_page(vec![mint("0xbundle", 10), mint("0xbundle", 11), mint("0xbundle", 12)]);
    let events = EventNormalizer::default().normalize(raw, WALLET).unwrap();

    assert_eq!(events.len(), 3);
    let keys: HashSet<_> = events.iter().map(|e| e.key.clone()).collect();
    assert_eq!(keys.len(), 3);
    assert!(events.iter().all(|e| e.transaction_hash == "0xbundle"));

    let groups = group_events(&events);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
    assert_eq!(groups[0].summary(), "Minted 3 NFTs");
}

#[test]
fn price_is_present_only_for_trades() {
    let mut raw = sale_with_settlement("0xsale", 1);
    raw.push(mint("0xmint", 2));
    raw.push(json!({
        "event_type": "transfer",
        "asset": asset(3),
        "transaction": {
            "transaction_hash": "0xgift",
            "timestamp": "2022-01-01T00:00:00",
            "from_account": { "address": WALLET },
            "to_account": { "address": CONTRACT }
        },
        "from_account": { "address": WALLET },
        "to_account": { "address": SELLER }
    }));

    let events = EventNormalizer::default()
        .normalize(parse_page(raw), WALLET)
        .unwrap();

    assert_eq!(events.len(), 3);
    for event in &events {
        assert_eq!(event.price.is_some(), event.action.is_trade(), "{:?}", event.action);
    }
    let actions: Vec<Action> = events.iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![Action::Bought, Action::Minted, Action::Sent]);
}

#[test]
fn successful_events_only_classify_as_trades() {
    let wallets = [WALLET, SELLER, CONTRACT, ZERO];
    let raw = parse_page(sale_with_settlement("0xsale", 1));
    let sale = raw[0].clone();

    for subject in wallets {
        let action = opensea_client::classify_event(&sale, subject).unwrap();
        assert!(action.is_trade(), "{} classified as {:?}", subject, action);
    }
}

#[test]
fn normalized_pages_flow_through_the_merge_policy() {
    let normalizer = EventNormalizer::default();
    let policy = IndependentPageMerge;

    let first = normalizer
        .normalize(parse_page(vec![mint("0xa", 1), mint("0xa", 2)]), WALLET)
        .unwrap();
    let second = normalizer
        .normalize(parse_page(vec![mint("0xb", 3)]), WALLET)
        .unwrap();

    let groups = policy.merge_page(Vec::new(), &first).unwrap();
    let groups = policy.merge_page(groups, &second).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[1].len(), 1);
}

#[test]
fn a_malformed_record_fails_the_page() {
    let mut broken = mint("0xmint", 1);
    broken["from_account"] = Value::Null;

    let result = EventNormalizer::default().normalize(parse_page(vec![broken]), WALLET);
    assert!(matches!(
        result,
        Err(timeline_core::TimelineError::MalformedRecord { .. })
    ));
}
