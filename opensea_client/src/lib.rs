pub mod client;
pub mod collections;
pub mod error;
pub mod filter;
pub mod parser;
pub mod types;

pub use client::{CollectionFetcher, EventPageFetcher, OpenSeaClient};
pub use collections::aggregate_collections;
pub use error::OpenSeaError;
pub use filter::EventFilter;
pub use parser::{classify_event, determine_action, EventKind, EventNormalizer, ValidatedEvent};
pub use types::*;
