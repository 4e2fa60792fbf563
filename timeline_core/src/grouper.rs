use crate::{Action, NormalizedEvent};
use serde::Serialize;
use tracing::debug;

/// Groups longer than this render collapsed with an aggregate summary
pub const DEFAULT_COLLAPSE_THRESHOLD: usize = 3;

/// Non-empty run of consecutive events sharing collection and action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventGroup {
    events: Vec<NormalizedEvent>,
}

impl EventGroup {
    fn start(event: NormalizedEvent) -> Self {
        Self {
            events: vec![event],
        }
    }

    /// Whether `event` continues this run
    fn accepts(&self, event: &NormalizedEvent) -> bool {
        let last = self.last();
        last.collection_name == event.collection_name && last.action == event.action
    }

    pub(crate) fn append(&mut self, mut other: EventGroup) {
        self.events.append(&mut other.events);
    }

    pub fn events(&self) -> &[NormalizedEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<NormalizedEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Never true for a group built by `group_events`
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> &NormalizedEvent {
        &self.events[0]
    }

    pub fn last(&self) -> &NormalizedEvent {
        &self.events[self.events.len() - 1]
    }

    pub fn action(&self) -> Action {
        self.first().action
    }

    pub fn collection_name(&self) -> &str {
        &self.first().collection_name
    }

    /// Sum of sale prices in wei for Bought/Sold groups
    pub fn total_price(&self) -> Option<u128> {
        if !self.action().is_trade() {
            return None;
        }
        self.events
            .iter()
            .try_fold(0u128, |acc, e| e.price.and_then(|p| acc.checked_add(p)))
    }

    pub fn is_collapsed(&self, threshold: usize) -> bool {
        self.len() > threshold
    }

    /// Summary line such as "Bought 5 NFTs"
    pub fn summary(&self) -> String {
        format!("{} {} NFTs", self.action(), self.len())
    }
}

/// Partition an ordered event sequence into maximal (collection, action) runs
pub fn group_events(events: &[NormalizedEvent]) -> Vec<EventGroup> {
    let mut groups: Vec<EventGroup> = Vec::new();

    for event in events {
        match groups.last_mut() {
            Some(current) if current.accepts(event) => current.events.push(event.clone()),
            _ => groups.push(EventGroup::start(event.clone())),
        }
    }

    debug!("Grouped {} events into {} groups", events.len(), groups.len());
    groups
}

/// Concatenate groups back into the original event order
pub fn flatten(groups: &[EventGroup]) -> Vec<NormalizedEvent> {
    groups
        .iter()
        .flat_map(|g| g.events().iter().cloned())
        .collect()
}
