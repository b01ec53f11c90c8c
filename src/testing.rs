use std::io;
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use tracing::subscriber::DefaultGuard;

use crate::datapoint::{DataPoint, Number, TagSet};
use crate::transport::{Delivery, Transport, TransportError};

#[derive(Debug, Clone, Copy)]
pub enum Mode {
    /// Every batch is accepted.
    Accept,
    /// Every batch gets this status.
    Status(StatusCode),
    /// Any batch holding a point whose metric starts with `bad` gets a 400.
    RejectBad,
    /// Every call fails before a response arrives.
    Unreachable,
    /// The first `n` calls fail like `Unreachable`, later ones are accepted.
    UnreachableFirst(usize),
}

/// Records each batch it is handed and answers according to its mode.
#[derive(Clone)]
pub struct MockTransport {
    mode: Mode,
    calls: Arc<Mutex<Vec<Vec<DataPoint>>>>,
}

impl MockTransport {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn accepting() -> Self {
        Self::new(Mode::Accept)
    }

    pub fn calls(&self) -> Vec<Vec<DataPoint>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    async fn send(&self, points: &[DataPoint]) -> Result<Delivery, TransportError> {
        let seen = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(points.to_vec());
            calls.len() - 1
        };
        match self.mode {
            Mode::Accept => Ok(Delivery::new(StatusCode::NO_CONTENT)),
            Mode::Status(status) => Ok(Delivery::new(status)),
            Mode::RejectBad => {
                if points.iter().any(|p| p.metric.starts_with("bad")) {
                    Ok(Delivery::new(StatusCode::BAD_REQUEST))
                } else {
                    Ok(Delivery::new(StatusCode::NO_CONTENT))
                }
            }
            Mode::UnreachableFirst(n) if seen >= n => Ok(Delivery::new(StatusCode::NO_CONTENT)),
            Mode::Unreachable | Mode::UnreachableFirst(_) => Err(unreachable()),
        }
    }
}

fn unreachable() -> TransportError {
    TransportError::Encode(serde_json::from_str::<()>("unreachable").unwrap_err())
}

pub fn point(metric: &str, value: i64) -> DataPoint {
    DataPoint {
        metric: metric.to_owned(),
        timestamp: 1_700_000_000_000,
        value: Number::Int(value),
        tags: TagSet::from([("host".to_owned(), "test".to_owned())]),
        meta: None,
    }
}

/// Log output written by the subscriber from [`capture_logs`].
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).lines().map(str::to_owned).collect()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(needle))
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's events into a buffer until the guard drops. Only
/// suited to current-thread runtimes.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
