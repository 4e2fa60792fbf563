use crate::grouper::{group_events, EventGroup};
use crate::{NormalizedEvent, Result, TimelineError};
use std::str::FromStr;
use tracing::debug;

/// How a freshly fetched page is stitched onto the groups already accumulated
pub trait PageMergePolicy: Send + Sync {
    fn merge_page(
        &self,
        accumulated: Vec<EventGroup>,
        new_page: &[NormalizedEvent],
    ) -> Result<Vec<EventGroup>>;
}

/// Groups each page on its own and appends it.
///
/// Already-emitted groups are never touched, so a run split by a page boundary
/// shows up as two adjacent groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependentPageMerge;

impl PageMergePolicy for IndependentPageMerge {
    fn merge_page(
        &self,
        mut accumulated: Vec<EventGroup>,
        new_page: &[NormalizedEvent],
    ) -> Result<Vec<EventGroup>> {
        accumulated.extend(group_events(new_page));
        Ok(accumulated)
    }
}

/// Legacy policy: fuses the boundary groups when they continue the same run
#[derive(Debug, Clone, Copy, Default)]
pub struct FusedBoundaryMerge;

impl PageMergePolicy for FusedBoundaryMerge {
    fn merge_page(
        &self,
        accumulated: Vec<EventGroup>,
        new_page: &[NormalizedEvent],
    ) -> Result<Vec<EventGroup>> {
        let new_groups = group_events(new_page);
        // First page or empty page: nothing to fuse across
        if accumulated.is_empty() || new_groups.is_empty() {
            let mut merged = accumulated;
            merged.extend(new_groups);
            return Ok(merged);
        }
        merge_groups(accumulated, new_groups)
    }
}

/// Fuse the last existing group with the first new group when the events on
/// either side of the boundary share collection, action, `to` and `from`.
pub fn merge_groups(
    mut existing: Vec<EventGroup>,
    new_groups: Vec<EventGroup>,
) -> Result<Vec<EventGroup>> {
    let mut incoming = new_groups.into_iter();
    let (first_new, last_existing) = match (incoming.next(), existing.last_mut()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(TimelineError::Precondition(
                "merge requires at least one existing and one new group".to_string(),
            ))
        }
    };

    let tail = last_existing.last();
    let head = first_new.first();
    let continues = tail.collection_name == head.collection_name
        && tail.action == head.action
        && tail.to == head.to
        && tail.from == head.from;

    if continues {
        debug!(
            "Fusing page boundary run: {} {} (+{} events)",
            head.action,
            head.collection_name,
            first_new.len()
        );
        last_existing.append(first_new);
    } else {
        existing.push(first_new);
    }

    existing.extend(incoming);
    Ok(existing)
}

/// Configurable selection between the two merge policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    #[default]
    IndependentPages,
    FusedBoundary,
}

impl MergeStrategy {
    pub fn policy(&self) -> Box<dyn PageMergePolicy> {
        match self {
            MergeStrategy::IndependentPages => Box::new(IndependentPageMerge),
            MergeStrategy::FusedBoundary => Box::new(FusedBoundaryMerge),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "independent" | "independent_pages" => Ok(MergeStrategy::IndependentPages),
            "fused" | "fused_boundary" => Ok(MergeStrategy::FusedBoundary),
            other => Err(TimelineError::InvalidOption(format!(
                "unknown merge strategy '{}'",
                other
            ))),
        }
    }
}
