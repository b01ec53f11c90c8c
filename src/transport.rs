use std::future::Future;

use bytes::Bytes;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::datapoint::DataPoint;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to encode data points: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("endpoint cannot take an api path: {0}")]
    InvalidEndpoint(Url),
}

/// Status and fully-read body of a store response.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub status: StatusCode,
    pub body: Bytes,
}

impl Delivery {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Bytes::new(),
        }
    }

    /// The store answers an accepted `/api/put` with 204 and nothing else.
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::NO_CONTENT
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one batch of points to the store.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        points: &[DataPoint],
    ) -> impl Future<Output = Result<Delivery, TransportError>> + Send;
}

/// POSTs batches as a JSON array to the store's `/api/put` endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    put_url: Url,
    headers: Vec<(String, String)>,
}

impl HttpTransport {
    pub fn new(endpoint: &Url, config: &Config) -> Result<Self, TransportError> {
        // Only installs if the embedding application has not picked a provider.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            put_url: put_url(endpoint)?,
            headers: config.headers.clone(),
        })
    }

    pub fn put_url(&self) -> &Url {
        &self.put_url
    }
}

impl Transport for HttpTransport {
    async fn send(&self, points: &[DataPoint]) -> Result<Delivery, TransportError> {
        let body = serde_json::to_vec(points)?;

        let mut req = self
            .client
            .post(self.put_url.clone())
            .header("content-type", "application/json");
        for (k, v) in &self.headers {
            req = req.header(k, v);
        }

        let resp = req.body(body).send().await?;
        let status = resp.status();
        // Read to the end so the connection goes back to the pool.
        let body = resp.bytes().await?;
        Ok(Delivery { status, body })
    }
}

/// A bare endpoint gets `/api/put`; an endpoint with its own path is used as is.
fn put_url(endpoint: &Url) -> Result<Url, TransportError> {
    if endpoint.cannot_be_a_base() {
        return Err(TransportError::InvalidEndpoint(endpoint.clone()));
    }
    if endpoint.path() == "/" || endpoint.path().is_empty() {
        endpoint
            .join("api/put")
            .map_err(|_| TransportError::InvalidEndpoint(endpoint.clone()))
    } else {
        Ok(endpoint.clone())
    }
}
