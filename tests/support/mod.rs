// Each integration test compiles this module independently via `mod support;`,
// so items used by one test appear unused in others.
#![allow(unused)]

pub mod store;

use std::time::Duration;

use otsdb_submit::Config;
use url::Url;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn config_for(endpoint: &Url, max_batch_size: usize, flush_interval: Duration) -> Config {
    Config {
        endpoint: Some(endpoint.clone()),
        max_batch_size,
        flush_interval,
        request_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}
