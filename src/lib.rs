//! Buffered submission of time-series data points to an OpenTSDB-compatible
//! store.
//!
//! Producers bind [`MetricMeta`] descriptors to a shared [`Client`] and call
//! [`Metric::submit`]. Points travel over a channel to a single background
//! flush engine, which batches them and POSTs each batch to `/api/put` when the
//! batch fills up or the flush timer fires.

mod client;
mod config;
mod datapoint;
mod engine;
mod expand;
mod metric;
mod sanitize;
mod sender;
mod transport;
mod value;

#[cfg(test)]
mod testing;

pub use client::{Client, ClientError};
pub use config::{Config, ConfigError};
pub use datapoint::{Annotation, DataPoint, Number, RateType, TagSet};
pub use expand::{Expand, Sample, SinglePoint};
pub use metric::{Metric, MetricError, MetricMeta};
pub use sanitize::sanitize;
pub use transport::{Delivery, HttpTransport, Transport, TransportError};
pub use value::Value;
