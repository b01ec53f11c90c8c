use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error};

use crate::config::Config;
use crate::datapoint::DataPoint;
use crate::sender::send_data_points;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Size,
    Timer,
    Closed,
}

impl Trigger {
    fn as_str(&self) -> &'static str {
        match self {
            Trigger::Size => "size",
            Trigger::Timer => "timer",
            Trigger::Closed => "closed",
        }
    }
}

/// Sole consumer of the ingestion channel and sole owner of the pending batch.
///
/// A batch is flushed as soon as it reaches `max_batch_size`, or on the next
/// timer tick if it is non-empty. Flushing happens inline, so points arriving
/// meanwhile wait on the channel and start the next batch. The batch is cleared
/// after every flush, whatever the outcome.
pub(crate) struct FlushEngine<T: Transport> {
    transport: T,
    rx: mpsc::Receiver<DataPoint>,
    batch: Vec<DataPoint>,
    max_batch_size: usize,
    timer: Interval,
}

impl<T: Transport> FlushEngine<T> {
    pub(crate) fn new(transport: T, rx: mpsc::Receiver<DataPoint>, config: &Config) -> Self {
        let period = config.flush_interval;
        // First tick one full period from now, not immediately.
        let mut timer = time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            transport,
            rx,
            batch: Vec::new(),
            max_batch_size: config.max_batch_size,
            timer,
        }
    }

    /// Run until every sender is gone.
    pub(crate) async fn run(mut self) {
        while let ControlFlow::Continue(()) = self.tick().await {}
        debug!("ingestion channel closed, flush engine stopped");
    }

    /// Wait for the next point or timer tick and act on it.
    async fn tick(&mut self) -> ControlFlow<()> {
        tokio::select! {
            received = self.rx.recv() => match received {
                Some(point) => {
                    self.batch.push(point);
                    if self.batch.len() >= self.max_batch_size {
                        self.flush(Trigger::Size).await;
                    }
                }
                None => {
                    if !self.batch.is_empty() {
                        self.flush(Trigger::Closed).await;
                    }
                    return ControlFlow::Break(());
                }
            },
            _ = self.timer.tick() => {
                if !self.batch.is_empty() {
                    self.flush(Trigger::Timer).await;
                }
            }
        }
        ControlFlow::Continue(())
    }

    async fn flush(&mut self, trigger: Trigger) {
        debug!(points = self.batch.len(), trigger = trigger.as_str(), "flushing batch");
        if let Err(e) = send_data_points(&self.transport, &self.batch).await {
            error!(error = %e, points = self.batch.len(), "error sending data to opentsdb");
        }
        self.batch.clear();
    }
}
