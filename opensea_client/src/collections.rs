use crate::types::{AssetContractDetail, AssetEvent, CollectionStats, HeldCollection};
use std::collections::HashSet;
use timeline_core::CollectionInfo;
use tracing::debug;

impl From<&HeldCollection> for CollectionInfo {
    fn from(held: &HeldCollection) -> Self {
        CollectionInfo {
            name: held.name.clone().unwrap_or_else(|| held.slug.clone()),
            slug: held.slug.clone(),
            contract_address: held
                .primary_asset_contracts
                .iter()
                .find_map(|c| c.address.clone()),
            image_url: held.image_url.clone(),
            holding: held.owned_asset_count.unwrap_or(0).to_string(),
            floor: held.stats.as_ref().and_then(|s| s.floor_price),
        }
    }
}

/// Collection seen only in event history: presence, not a holding
fn from_event(event: &AssetEvent) -> Option<CollectionInfo> {
    let asset = event.asset.as_ref()?;
    let collection = asset.collection.as_ref()?;
    let slug = collection
        .slug
        .clone()
        .or_else(|| event.collection_slug.clone())?;

    Some(CollectionInfo {
        name: collection.name.clone().unwrap_or_else(|| slug.clone()),
        contract_address: asset
            .asset_contract
            .as_ref()
            .and_then(|c| c.address.clone())
            .or_else(|| event.contract_address.clone()),
        image_url: collection
            .featured_image_url
            .clone()
            .or_else(|| collection.image_url.clone()),
        holding: "0".to_string(),
        floor: None,
        slug,
    })
}

/// Distinct collections a wallet holds or has recently touched.
///
/// Held entries come first and win over event-derived entries with the same
/// slug.
pub fn aggregate_collections(held: &[HeldCollection], recent: &[AssetEvent]) -> Vec<CollectionInfo> {
    let mut seen = HashSet::new();
    let mut collections = Vec::new();

    let candidates = held
        .iter()
        .map(CollectionInfo::from)
        .chain(recent.iter().filter_map(from_event));

    for info in candidates {
        if seen.insert(info.identifier().to_string()) {
            collections.push(info);
        }
    }

    debug!(
        "Aggregated {} collections from {} held and {} recent events",
        collections.len(),
        held.len(),
        recent.len()
    );
    collections
}

/// Single collection looked up by contract, with its current floor
pub fn collection_from_detail(
    detail: &AssetContractDetail,
    stats: Option<&CollectionStats>,
) -> CollectionInfo {
    let meta = detail.collection.clone().unwrap_or_default();
    let slug = meta.slug.clone().unwrap_or_default();
    CollectionInfo {
        name: meta
            .name
            .clone()
            .or_else(|| detail.name.clone())
            .unwrap_or_else(|| slug.clone()),
        contract_address: Some(detail.address.clone()),
        image_url: meta.featured_image_url.clone().or(meta.image_url),
        holding: "0".to_string(),
        floor: stats.and_then(|s| s.floor_price),
        slug,
    }
}
