use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;
use url::Url;

use crate::config::{Config, ConfigError};
use crate::datapoint::DataPoint;
use crate::engine::FlushEngine;
use crate::expand::{Expand, Sample, SinglePoint};
use crate::metric::{Metric, MetricError, MetricMeta};
use crate::transport::{HttpTransport, Transport, TransportError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("an enabled client must be created inside a tokio runtime")]
    NoRuntime,
}

/// Shared entry point for producers.
///
/// An enabled client owns the sending half of the ingestion channel and has one
/// flush engine task running on the runtime it was created in. A client with no
/// endpoint is disabled: it spawns nothing and every submission is a no-op.
///
/// Clones share the same channel and engine.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    endpoint: Option<Url>,
    ingest: Option<Ingest>,
    expander: Box<dyn Expand>,
}

struct Ingest {
    tx: mpsc::Sender<DataPoint>,
    runtime: Handle,
}

impl Client {
    /// Client for `endpoint` with default settings. An empty endpoint gives a
    /// disabled client.
    pub fn from_endpoint(endpoint: &str) -> Result<Self, ClientError> {
        Self::new(&Config::with_endpoint(endpoint)?)
    }

    /// Client that POSTs to `config.endpoint` over HTTP.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        match &config.endpoint {
            Some(endpoint) => {
                config.validate()?;
                let transport = HttpTransport::new(endpoint, config)?;
                Self::with_transport(config, transport)
            }
            None => Ok(Self::disabled()),
        }
    }

    /// Client that hands batches to `transport`. The transport is dropped
    /// unused when `config.endpoint` is `None`.
    pub fn with_transport<T: Transport>(
        config: &Config,
        transport: T,
    ) -> Result<Self, ClientError> {
        let expander = SinglePoint::new(config.default_tags.clone());
        Self::with_expander(config, transport, expander)
    }

    /// Like [`Client::with_transport`], with a custom conversion from samples
    /// to data points.
    pub fn with_expander<T, E>(
        config: &Config,
        transport: T,
        expander: E,
    ) -> Result<Self, ClientError>
    where
        T: Transport,
        E: Expand + 'static,
    {
        let Some(endpoint) = config.endpoint.clone() else {
            return Ok(Self::disabled());
        };
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;

        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let engine_config = config.clone();
        runtime.spawn(async move {
            FlushEngine::new(transport, rx, &engine_config).run().await;
        });

        Ok(Self {
            inner: Arc::new(Inner {
                endpoint: Some(endpoint),
                ingest: Some(Ingest { tx, runtime }),
                expander: Box::new(expander),
            }),
        })
    }

    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Inner {
                endpoint: None,
                ingest: None,
                expander: Box::new(SinglePoint::default()),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.ingest.is_some()
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.inner.endpoint.as_ref()
    }

    /// Bind a metric to this client. Name and tags are sanitized here, once.
    pub fn new_metric(&self, meta: MetricMeta) -> Result<Metric, MetricError> {
        Ok(Metric::new(meta.sanitized()?, self.clone()))
    }

    pub(crate) fn enqueue(&self, sample: &Sample<'_>) {
        let Some(ingest) = &self.inner.ingest else {
            return;
        };
        let mut points = Vec::new();
        self.inner.expander.expand(sample, &mut points);
        for point in points {
            ingest.push(point);
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.endpoint.as_ref().map(Url::as_str))
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Ingest {
    /// Hand a point to the engine without blocking. When the channel is full the
    /// point gets its own task that waits for room, so one slow point never
    /// holds up the others.
    fn push(&self, point: DataPoint) {
        match self.tx.try_send(point) {
            Ok(()) => {}
            Err(TrySendError::Full(point)) => {
                let tx = self.tx.clone();
                self.runtime.spawn(async move {
                    if let Err(e) = tx.send(point).await {
                        warn!(point = %e.0, "flush engine stopped, dropping data point");
                    }
                });
            }
            Err(TrySendError::Closed(point)) => {
                warn!(%point, "flush engine stopped, dropping data point");
            }
        }
    }
}
