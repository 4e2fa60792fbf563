use crate::grouper::EventGroup;
use crate::{Result, TimelineError};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::str::FromStr;

/// Calendar granularity for timeline headings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalGranularity {
    Day,
    #[default]
    Month,
}

impl IntervalGranularity {
    fn period_start(&self, at: DateTime<Utc>) -> Option<NaiveDate> {
        match self {
            IntervalGranularity::Day => Some(at.date_naive()),
            IntervalGranularity::Month => NaiveDate::from_ymd_opt(at.year(), at.month(), 1),
        }
    }

    fn label(&self, period: NaiveDate) -> String {
        match self {
            IntervalGranularity::Day => period.format("%B %-d, %Y").to_string(),
            IntervalGranularity::Month => period.format("%B %Y").to_string(),
        }
    }
}

impl FromStr for IntervalGranularity {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "day" => Ok(IntervalGranularity::Day),
            "month" => Ok(IntervalGranularity::Month),
            other => Err(TimelineError::InvalidOption(format!(
                "unknown interval granularity '{}'",
                other
            ))),
        }
    }
}

/// Groups sharing one calendar period, labelled for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalBucket {
    pub label: String,
    pub period_start: NaiveDate,
    pub groups: Vec<EventGroup>,
}

/// Bucket consecutive groups under a heading taken from each group's first
/// event. Order is preserved; a period that reappears later starts a new bucket.
pub fn bucket_by_interval(
    groups: &[EventGroup],
    granularity: IntervalGranularity,
) -> Vec<IntervalBucket> {
    let mut buckets: Vec<IntervalBucket> = Vec::new();

    for group in groups {
        let Some(period) = granularity.period_start(group.first().date) else {
            continue;
        };
        match buckets.last_mut() {
            Some(bucket) if bucket.period_start == period => bucket.groups.push(group.clone()),
            _ => buckets.push(IntervalBucket {
                label: granularity.label(period),
                period_start: period,
                groups: vec![group.clone()],
            }),
        }
    }

    buckets
}
