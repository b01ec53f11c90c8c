use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;

/// One request as the fake store saw it.
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub path: String,
    pub headers: HashMap<String, String>,
    pub points: Vec<Value>,
    pub status: StatusCode,
}

type Requests = Arc<Mutex<Vec<PutRequest>>>;
type RejectFn = fn(&Value) -> bool;

/// Minimal stand-in for an OpenTSDB `/api/put` endpoint.
///
/// Answers 204 unless a point matches `reject`, in which case the whole request
/// gets a 400, the way the real store treats a batch with a malformed point.
pub struct FakeStore {
    pub endpoint: Url,
    requests: Requests,
    cancel: CancellationToken,
}

impl FakeStore {
    pub async fn start(reject: RejectFn) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake store");
        let addr = listener.local_addr().unwrap();
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();

        tokio::spawn(serve(listener, requests.clone(), reject, cancel.clone()));

        Self {
            endpoint: Url::parse(&format!("http://{addr}")).unwrap(),
            requests,
            cancel,
        }
    }

    pub async fn accepting() -> Self {
        Self::start(|_| false).await
    }

    /// Wait until at least `min_expected` requests arrived or the timeout passes.
    pub async fn wait_for(&self, min_expected: usize, timeout: Duration) -> Vec<PutRequest> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let current = self.requests();
            if current.len() >= min_expected || tokio::time::Instant::now() >= deadline {
                return current;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    pub fn requests(&self) -> Vec<PutRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeStore {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn serve(
    listener: TcpListener,
    requests: Requests,
    reject: RejectFn,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                let Ok((stream, _)) = result else { continue };
                let requests = requests.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| handle(req, requests.clone(), reject));
                    let _ = Builder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
            _ = cancel.cancelled() => break,
        }
    }
}

fn response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

async fn handle<B>(
    req: Request<B>,
    requests: Requests,
    reject: RejectFn,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
{
    if req.method() != Method::POST {
        return Ok(response(StatusCode::METHOD_NOT_ALLOWED, ""));
    }

    let path = req.uri().path().to_owned();
    let headers = req
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
        .collect();

    let body = req
        .collect()
        .await
        .map(|c| c.to_bytes())
        .unwrap_or_default();
    let points = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Array(points)) => points,
        Ok(single) => vec![single],
        Err(_) => Vec::new(),
    };

    let status = if points.is_empty() || points.iter().any(reject) {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::NO_CONTENT
    };

    requests.lock().unwrap().push(PutRequest {
        path,
        headers,
        points,
        status,
    });

    if status == StatusCode::NO_CONTENT {
        Ok(response(status, ""))
    } else {
        Ok(response(
            status,
            r#"{"error":{"code":400,"message":"One or more data points had errors"}}"#,
        ))
    }
}
