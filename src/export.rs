use anyhow::{Context, Result};
use csv::Writer;
use std::io::Write;
use timeline_core::{
    format::{explorer_tx_url, format_eth_from_wei},
    NormalizedEvent,
};

/// Write the timeline as CSV, one row per event, newest first
pub fn write_events_csv<W: Write>(
    writer: W,
    events: &[NormalizedEvent],
    explorer_base_url: &str,
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record([
        "date",
        "action",
        "collection",
        "asset",
        "from",
        "to",
        "price_eth",
        "transaction_hash",
        "explorer_url",
    ])
    .context("CSV header error")?;

    for event in events {
        let price = event
            .price
            .map(|wei| format_eth_from_wei(wei).to_string())
            .unwrap_or_default();

        wtr.write_record([
            event.date.to_rfc3339(),
            event.action.to_string(),
            event.collection_name.clone(),
            event.asset_name.clone(),
            event.from.clone(),
            event.to.clone(),
            price,
            event.transaction_hash.clone(),
            explorer_tx_url(explorer_base_url, &event.transaction_hash),
        ])
        .with_context(|| format!("CSV row error for {}", event.key))?;
    }

    wtr.flush().context("CSV flush error")?;
    Ok(())
}
