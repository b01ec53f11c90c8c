use std::time::SystemTime;

use thiserror::Error;

use crate::client::Client;
use crate::datapoint::{RateType, TagSet};
use crate::expand::{Sample, unix_millis};
use crate::sanitize::sanitize;
use crate::value::Value;

#[derive(Debug, Error, PartialEq)]
pub enum MetricError {
    #[error("metric name {0:?} is empty after sanitizing")]
    EmptyName(String),

    #[error("tag key {0:?} is empty after sanitizing")]
    EmptyTagKey(String),

    #[error("tag {key} has value {value:?}, which is empty after sanitizing")]
    EmptyTagValue { key: String, value: String },

    #[error("tag keys {first:?} and {second:?} both sanitize to {key:?}")]
    TagKeyCollision {
        key: String,
        first: String,
        second: String,
    },
}

/// Describes a metric: its name, tags and informational metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricMeta {
    pub metric: String,
    pub tags: TagSet,
    pub rate_type: RateType,
    pub unit: String,
    pub desc: String,
}

impl MetricMeta {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            ..Self::default()
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn rate_type(mut self, rate_type: RateType) -> Self {
        self.rate_type = rate_type;
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Sanitize the name and every tag in place, rejecting anything left empty.
    pub(crate) fn sanitized(mut self) -> Result<Self, MetricError> {
        let metric = sanitize(&self.metric);
        if metric.is_empty() {
            return Err(MetricError::EmptyName(self.metric));
        }
        self.metric = metric;

        let mut tags = TagSet::new();
        // Sanitized key -> key as given, to name both sides of a collision.
        let mut originals = TagSet::new();
        for (key, value) in std::mem::take(&mut self.tags) {
            let clean_key = sanitize(&key);
            if clean_key.is_empty() {
                return Err(MetricError::EmptyTagKey(key));
            }
            let clean_value = sanitize(&value);
            if clean_value.is_empty() {
                return Err(MetricError::EmptyTagValue { key, value });
            }
            if let Some(first) = originals.get(&clean_key) {
                return Err(MetricError::TagKeyCollision {
                    key: clean_key,
                    first: first.clone(),
                    second: key,
                });
            }
            originals.insert(clean_key.clone(), key);
            tags.insert(clean_key, clean_value);
        }
        self.tags = tags;
        Ok(self)
    }
}

/// A metric bound to a [`Client`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Metric {
    meta: MetricMeta,
    client: Client,
}

impl Metric {
    pub(crate) fn new(meta: MetricMeta, client: Client) -> Self {
        Self { meta, client }
    }

    pub fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    /// Queue one observation. Never blocks and never fails; a disabled client
    /// ignores the call.
    ///
    /// `timestamp` of `None` stamps the point with the current time.
    pub fn submit(&self, value: impl Into<Value>, timestamp: Option<SystemTime>) {
        if !self.client.is_enabled() {
            return;
        }
        let sample = Sample {
            metric: &self.meta.metric,
            timestamp: timestamp.map(unix_millis),
            value: value.into().to_number(),
            tags: &self.meta.tags,
            rate_type: self.meta.rate_type,
            unit: &self.meta.unit,
            desc: &self.meta.desc,
        };
        self.client.enqueue(&sample);
    }
}
