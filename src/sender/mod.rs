use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, error};

use crate::datapoint::DataPoint;
use crate::transport::{Transport, TransportError};

#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("bad status from opentsdb: {status}")]
    Rejected { status: StatusCode, body: String },
}

/// Send a batch. A 400 on a multi-point batch means some points are malformed:
/// each point is then retried on its own, the ones that still fail are logged
/// and dropped, and the batch counts as handled.
pub(crate) async fn send_data_points<T: Transport>(
    transport: &T,
    points: &[DataPoint],
) -> Result<(), SendError> {
    match attempt(transport, points).await {
        Err(SendError::Rejected { status, body })
            if status == StatusCode::BAD_REQUEST && points.len() > 1 =>
        {
            debug!(points = points.len(), %body, "batch rejected, retrying points individually");
            let rejected = isolate_rejected(transport, points).await;
            debug!(
                rejected = rejected.len(),
                accepted = points.len() - rejected.len(),
                "finished isolating bad data points"
            );
            Ok(())
        }
        other => other,
    }
}

/// Retry every point as a batch of one. Returns the points that still fail.
pub(crate) async fn isolate_rejected<'a, T: Transport>(
    transport: &T,
    points: &'a [DataPoint],
) -> Vec<&'a DataPoint> {
    let mut rejected = Vec::new();
    for point in points {
        if let Err(e) = attempt(transport, std::slice::from_ref(point)).await {
            error!(error = %e, %point, "bad opentsdb datapoint");
            rejected.push(point);
        }
    }
    rejected
}

async fn attempt<T: Transport>(transport: &T, points: &[DataPoint]) -> Result<(), SendError> {
    let delivery = transport.send(points).await?;
    if delivery.is_success() {
        Ok(())
    } else {
        Err(SendError::Rejected {
            status: delivery.status,
            body: delivery.body_text(),
        })
    }
}
