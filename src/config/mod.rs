use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::datapoint::TagSet;

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_MAX_BATCH_SIZE: usize = 256;
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OTSDB_SUBMIT_ENDPOINT is not a valid URL: {0}")]
    EndpointInvalidUrl(String),

    #[error("{0} has invalid value: {1}")]
    InvalidNumeric(String, String),

    #[error("{0} must be at least 1")]
    Zero(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Where batches are POSTed. `None` disables submission entirely.
    pub endpoint: Option<Url>,
    /// How often a non-empty batch is flushed regardless of size.
    pub flush_interval: Duration,
    /// Point count that forces an immediate flush.
    pub max_batch_size: usize,
    pub channel_capacity: usize,
    pub request_timeout: Duration,
    /// Added to every point that does not already carry the tag.
    pub default_tags: TagSet,
    pub headers: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_tags: TagSet::new(),
            headers: Vec::new(),
        }
    }
}

impl Config {
    /// Defaults for a single endpoint. An empty string yields a disabled config.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            ..Self::default()
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with("OTSDB_SUBMIT_"))
            .collect();
        Self::parse(&vars)
    }

    fn parse(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let endpoint = match vars.get("OTSDB_SUBMIT_ENDPOINT") {
            Some(raw) => parse_endpoint(raw)?,
            None => None,
        };
        let flush_interval = parse_duration_ms(
            vars,
            "OTSDB_SUBMIT_FLUSH_INTERVAL_MS",
            DEFAULT_FLUSH_INTERVAL,
        )?;
        let max_batch_size =
            parse_count(vars, "OTSDB_SUBMIT_MAX_BATCH_SIZE", DEFAULT_MAX_BATCH_SIZE)?;
        let channel_capacity =
            parse_count(vars, "OTSDB_SUBMIT_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY)?;
        let request_timeout = parse_duration_ms(
            vars,
            "OTSDB_SUBMIT_REQUEST_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT,
        )?;
        let default_tags = parse_pairs(vars, "OTSDB_SUBMIT_TAGS").into_iter().collect();
        let headers = parse_pairs(vars, "OTSDB_SUBMIT_HEADERS");

        let config = Self {
            endpoint,
            flush_interval,
            max_batch_size,
            channel_capacity,
            request_timeout,
            default_tags,
            headers,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the flush engine cannot run with. Fields are public, so
    /// this runs again whenever an enabled client is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval.is_zero() {
            return Err(ConfigError::Zero("flush_interval".to_owned()));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::Zero("max_batch_size".to_owned()));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Zero("channel_capacity".to_owned()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero("request_timeout".to_owned()));
        }
        Ok(())
    }
}

/// Accepts full URLs as well as bare `host:port`, which is taken as plain HTTP.
fn parse_endpoint(raw: &str) -> Result<Option<Url>, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&candidate).map_err(|_| ConfigError::EndpointInvalidUrl(raw.to_owned()))?;
    if url.host_str().is_none() {
        return Err(ConfigError::EndpointInvalidUrl(raw.to_owned()));
    }
    Ok(Some(url))
}

fn parse_duration_ms(
    vars: &HashMap<String, String>,
    name: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match vars.get(name) {
        Some(val) => {
            let ms: u64 = val
                .parse()
                .map_err(|_| ConfigError::InvalidNumeric(name.to_owned(), val.clone()))?;
            if ms == 0 {
                return Err(ConfigError::Zero(name.to_owned()));
            }
            Ok(Duration::from_millis(ms))
        }
        None => Ok(default),
    }
}

fn parse_count(
    vars: &HashMap<String, String>,
    name: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    match vars.get(name) {
        Some(val) => {
            let n: usize = val
                .parse()
                .map_err(|_| ConfigError::InvalidNumeric(name.to_owned(), val.clone()))?;
            if n == 0 {
                return Err(ConfigError::Zero(name.to_owned()));
            }
            Ok(n)
        }
        None => Ok(default),
    }
}

fn parse_pairs(vars: &HashMap<String, String>, name: &str) -> Vec<(String, String)> {
    vars.get(name)
        .filter(|s| !s.is_empty())
        .map(|raw| {
            raw.split(',')
                .filter_map(|pair| {
                    let (k, v) = pair.split_once('=')?;
                    let k = k.trim();
                    let v = v.trim();
                    if k.is_empty() {
                        return None;
                    }
                    Some((k.to_owned(), v.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default()
}
