use opensea_client::{EventNormalizer, EventPageFetcher, EventsRequest, OpenSeaError};
use timeline_core::{
    ActivityFilter, DateRange, EventGroup, NormalizedEvent, PageMergePolicy,
};
use tracing::{debug, info};

/// What the timeline is showing: one wallet plus optional narrowing filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineCriteria {
    pub wallet: String,
    pub date_range: DateRange,
    pub collection: Option<String>,
    pub activity: ActivityFilter,
}

impl TimelineCriteria {
    pub fn new(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            ..Default::default()
        }
    }

    fn request(&self, limit: u32, offset: u32) -> EventsRequest {
        EventsRequest::new(&self.wallet, limit, offset)
            .with_date_range(self.date_range)
            .with_collection(self.collection.clone())
            .with_activity(self.activity)
    }
}

/// Paged timeline for one set of criteria.
///
/// Pages load strictly in order; `load_next_page` takes `&mut self`, so a
/// second page cannot start before the previous one was merged. Changing the
/// criteria goes through `reset`, which drops everything loaded so far.
pub struct TimelineSession<F: EventPageFetcher> {
    fetcher: F,
    normalizer: EventNormalizer,
    policy: Box<dyn PageMergePolicy>,
    page_size: u32,

    criteria: TimelineCriteria,
    offset: u32,
    exhausted: bool,
    events: Vec<NormalizedEvent>,
    groups: Vec<EventGroup>,
}

impl<F: EventPageFetcher> TimelineSession<F> {
    pub fn new(
        fetcher: F,
        normalizer: EventNormalizer,
        policy: Box<dyn PageMergePolicy>,
        page_size: u32,
        criteria: TimelineCriteria,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            policy,
            page_size: page_size.max(1),
            criteria,
            offset: 0,
            exhausted: false,
            events: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Fetch, normalize and merge the next page. Returns the number of events
    /// added; a failed page leaves the session untouched.
    pub async fn load_next_page(&mut self) -> Result<usize, OpenSeaError> {
        if self.exhausted {
            debug!("Timeline for {} already exhausted", self.criteria.wallet);
            return Ok(0);
        }

        let request = self.criteria.request(self.page_size, self.offset);
        let raw = self.fetcher.fetch_events_page(&request).await?;
        let raw_count = raw.len() as u32;

        let page = self.normalizer.normalize(raw, &self.criteria.wallet)?;
        // The policy consumes what it merges into; hand it a copy so an error
        // leaves `self.groups` as it was.
        let groups = self.policy.merge_page(self.groups.clone(), &page)?;

        self.groups = groups;
        self.offset += raw_count;
        self.exhausted = raw_count < self.page_size;
        let added = page.len();
        self.events.extend(page);

        info!(
            "Loaded page for {}: {} events, {} groups total (offset {}, exhausted: {})",
            self.criteria.wallet,
            added,
            self.groups.len(),
            self.offset,
            self.exhausted
        );
        Ok(added)
    }

    /// Load up to `max_pages` pages, stopping early once the feed runs dry
    pub async fn load_pages(&mut self, max_pages: usize) -> Result<usize, OpenSeaError> {
        let mut total = 0;
        for _ in 0..max_pages {
            if self.exhausted {
                break;
            }
            total += self.load_next_page().await?;
        }
        Ok(total)
    }

    /// Start over with new criteria; all accumulated state is replaced
    pub fn reset(&mut self, criteria: TimelineCriteria) {
        info!("Resetting timeline: {:?}", criteria);
        self.criteria = criteria;
        self.offset = 0;
        self.exhausted = false;
        self.events.clear();
        self.groups.clear();
    }

    pub fn criteria(&self) -> &TimelineCriteria {
        &self.criteria
    }

    pub fn events(&self) -> &[NormalizedEvent] {
        &self.events
    }

    pub fn groups(&self) -> &[EventGroup] {
        &self.groups
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
