use std::time::Duration;

use crate::datapoint::Number;

/// A value handed to [`Metric::submit`](crate::Metric::submit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Duration(Duration),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Value {
    /// Coerce into the wire numeric representation.
    ///
    /// Booleans become `1`/`0` and durations become floating point milliseconds.
    /// Numbers pass through unchanged.
    pub fn to_number(self) -> Number {
        match self {
            Value::Bool(true) => Number::Int(1),
            Value::Bool(false) => Number::Int(0),
            Value::Duration(d) => Number::Float(d.as_secs_f64() * 1e3),
            Value::Int(v) => Number::Int(v),
            Value::UInt(v) => Number::UInt(v),
            Value::Float(v) => Number::Float(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(u64::from(v))
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32);
