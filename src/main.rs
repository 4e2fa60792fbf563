use anyhow::{Context, Result};
use clap::Parser;
use config_manager::SystemConfig;
use ens_resolver::{EthersNameService, NameCache, WalletResolver};
use opensea_client::{CollectionFetcher, EventNormalizer, OpenSeaClient, OpenSeaConfig};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use timeline_core::{
    bucket_by_interval,
    format::{explorer_tx_url, format_eth_from_wei, trim_address, truncate},
    ActivityFilter, CollectionInfo, DateRange, EventGroup, IntervalGranularity,
};
use tracing::{info, warn};

mod export;
mod session;

use session::{TimelineCriteria, TimelineSession};

#[derive(Parser, Debug)]
#[command(name = "wallet_timeline")]
#[command(about = "NFT activity timeline for a wallet address or ENS name", long_about = None)]
struct Args {
    /// Wallet address (0x...) or ENS name
    wallet: String,

    /// Only events on or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    start_date: Option<String>,

    /// Only events on or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    end_date: Option<String>,

    /// Only events for this collection contract address
    #[arg(long)]
    collection: Option<String>,

    /// Activity filter: buy-sell or mint-transfer
    #[arg(long)]
    activity: Option<String>,

    /// Number of event pages to load
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Heading granularity: day or month
    #[arg(long)]
    granularity: Option<String>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the loaded events to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,wallet_timeline=debug")
                }),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SystemConfig::load_from_path(path),
        None => SystemConfig::load(),
    }
    .context("Failed to load configuration")?;

    let date_range = DateRange::parse(args.start_date.as_deref(), args.end_date.as_deref())?;
    let activity = ActivityFilter::from_str(args.activity.as_deref().unwrap_or(""))?;
    let granularity = match &args.granularity {
        Some(g) => IntervalGranularity::from_str(g)?,
        None => config.timeline.interval_granularity()?,
    };

    // Resolve the search input
    let name_service = EthersNameService::new(&config.ens.rpc_url)?;
    let cache = Arc::new(NameCache::new(
        config.ens.cache_capacity,
        Duration::from_secs(config.ens.cache_ttl_seconds),
    ));
    let resolver = WalletResolver::new(name_service, cache);
    let wallet = resolver.resolve_wallet(&args.wallet).await?;

    println!("Wallet: {} ({})", wallet.display_name(), wallet.address);

    let client = OpenSeaClient::with_config(OpenSeaConfig {
        api_key: config.opensea.api_key.clone(),
        base_url: config.opensea.api_base_url.clone(),
        marketplace_url: config.opensea.marketplace_url.clone(),
        timeout_seconds: config.opensea.request_timeout_seconds,
        settlement_username: config.opensea.settlement_username.clone(),
        collections_limit: config.opensea.collections_limit,
    })?;

    let mut collections = match client.get_wallet_collections(&wallet.address).await {
        Ok(collections) => collections,
        Err(e) => {
            warn!("Could not load collections for {}: {}", wallet.address, e);
            Vec::new()
        }
    };

    if let Some(contract) = args.collection.as_deref().filter(|c| !c.is_empty()) {
        include_filtered_collection(&client, &mut collections, contract).await;
    }
    print_collections(&collections);

    // Timeline
    let normalizer = EventNormalizer::new(client.config())
        .with_minted_from(config.timeline.minted_from()?);
    let criteria = TimelineCriteria {
        wallet: wallet.address.clone(),
        date_range,
        collection: args.collection.clone(),
        activity,
    };
    let mut session = TimelineSession::new(
        client,
        normalizer,
        config.timeline.merge_strategy()?.policy(),
        config.opensea.page_size,
        criteria,
    );

    session.load_pages(args.pages.max(1)).await?;

    for bucket in bucket_by_interval(session.groups(), granularity) {
        println!();
        println!("== {} ==", bucket.label);
        for group in &bucket.groups {
            print_group(
                group,
                config.timeline.collapse_threshold,
                &config.timeline.explorer_base_url,
            );
        }
    }

    if session.events().is_empty() {
        println!();
        println!("No activity found");
    } else if !session.is_exhausted() {
        println!();
        println!(
            "Showing {} events; more available (use --pages)",
            session.events().len()
        );
    }

    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        export::write_events_csv(file, session.events(), &config.timeline.explorer_base_url)?;
        info!("Wrote {} events to {}", session.events().len(), path.display());
    }

    Ok(())
}

/// Make sure the filtered collection is listed. A failed lookup only loses the
/// listing entry; the timeline is still shown.
async fn include_filtered_collection<C: CollectionFetcher>(
    fetcher: &C,
    collections: &mut Vec<CollectionInfo>,
    contract: &str,
) {
    if collections.iter().any(|c| c.has_contract(contract)) {
        return;
    }

    info!("Collection {} not in wallet list, looking it up", contract);
    match fetcher.fetch_collection(contract).await {
        Ok(collection) => collections.push(collection),
        Err(e) => warn!("Could not load collection {}: {}", contract, e),
    }
}

fn print_collections(collections: &[CollectionInfo]) {
    println!("Collections ({}):", collections.len());
    for collection in collections {
        let floor = collection
            .floor
            .map(|f| format!(", floor {} ETH", f))
            .unwrap_or_default();
        println!(
            "  {} - holding {}{}",
            truncate(&collection.name, 40),
            collection.holding,
            floor
        );
    }
}

fn print_group(group: &EventGroup, collapse_threshold: usize, explorer_base_url: &str) {
    if group.is_collapsed(collapse_threshold) {
        let total = group
            .total_price()
            .map(|wei| format!(" for {} ETH", format_eth_from_wei(wei)))
            .unwrap_or_default();
        println!(
            "  {} from {}{} ({} to {})",
            group.summary(),
            group.collection_name(),
            total,
            group.last().date.format("%Y-%m-%d"),
            group.first().date.format("%Y-%m-%d")
        );
        return;
    }

    for event in group.events() {
        let price = event
            .price
            .map(|wei| format!(" for {} ETH", format_eth_from_wei(wei)))
            .unwrap_or_default();
        println!(
            "  {} {} {} {}{}",
            event.date.format("%Y-%m-%d %H:%M"),
            truncate(&event.asset_name, 32),
            event.title(),
            trim_address(event.counterparty()),
            price
        );
        println!(
            "      {}",
            explorer_tx_url(explorer_base_url, &event.transaction_hash)
        );
    }
}
