use std::time::{SystemTime, UNIX_EPOCH};

use crate::datapoint::{Annotation, DataPoint, Number, RateType, TagSet};

/// One submitted observation, before it is turned into wire points.
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    pub metric: &'a str,
    /// Milliseconds since the epoch; `None` means "now".
    pub timestamp: Option<i64>,
    pub value: Number,
    pub tags: &'a TagSet,
    pub rate_type: RateType,
    pub unit: &'a str,
    pub desc: &'a str,
}

/// Turns a sample into zero or more data points ready for transport.
pub trait Expand: Send + Sync {
    fn expand(&self, sample: &Sample<'_>, out: &mut Vec<DataPoint>);
}

/// Emits exactly one point per sample, stamped with the current time when the
/// sample has none, and carrying the default tags the metric does not set itself.
#[derive(Debug, Clone, Default)]
pub struct SinglePoint {
    default_tags: TagSet,
}

impl SinglePoint {
    pub fn new(default_tags: TagSet) -> Self {
        Self { default_tags }
    }
}

impl Expand for SinglePoint {
    fn expand(&self, sample: &Sample<'_>, out: &mut Vec<DataPoint>) {
        let mut tags = sample.tags.clone();
        for (k, v) in &self.default_tags {
            tags.entry(k.clone()).or_insert_with(|| v.clone());
        }
        out.push(DataPoint {
            metric: sample.metric.to_owned(),
            timestamp: sample.timestamp.unwrap_or_else(now_millis),
            value: sample.value,
            tags,
            meta: Some(Annotation {
                rate_type: sample.rate_type,
                unit: sample.unit.to_owned(),
                desc: sample.desc.to_owned(),
            }),
        });
    }
}

pub(crate) fn now_millis() -> i64 {
    unix_millis(SystemTime::now())
}

/// Milliseconds since the epoch, truncated toward zero.
pub(crate) fn unix_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => (after.as_nanos() / 1_000_000) as i64,
        Err(e) => -((e.duration().as_nanos() / 1_000_000) as i64),
    }
}
