use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Tag key/value pairs attached to a metric. Ordered so the wire output is stable.
pub type TagSet = BTreeMap<String, String>;

/// Numeric value as it goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    UInt(u64),
    /// Non-finite floats serialize as `null`; the store rejects those points.
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::UInt(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateType {
    #[default]
    Gauge,
    Counter,
    Rate,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::Gauge => "gauge",
            RateType::Counter => "counter",
            RateType::Rate => "rate",
        }
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Informational metadata. Travels with a point but is never sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub rate_type: RateType,
    pub unit: String,
    pub desc: String,
}

/// One observation, encoded as an `/api/put` JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub metric: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub value: Number,
    pub tags: TagSet,
    #[serde(skip)]
    pub meta: Option<Annotation>,
}

impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
