//! Virtual-user worker pool
use crate::iteration::LoadIterationRunner;
use crate::measurement::RunMetrics;
use crate::transport::{http_client, Transport, TransportError};
use gateload_core::{IterationResult, RunConfiguration, RunSummary};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

const RESULT_CHANNEL_CAPACITY: usize = 1_024;

/// A configured load run. Awaiting it runs every virtual user to completion and yields the
/// [`RunSummary`].
///
/// # Example
/// ```no_run
/// use gateload::prelude::*;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = RunConfiguration::from_env()?.duration(Duration::from_secs(60));
///     let summary = Scenario::new(config)?.await;
///     println!("{summary}");
///     Ok(())
/// }
/// ```
#[pin_project::pin_project]
pub struct Scenario<T> {
    config: RunConfiguration,
    transport: Arc<T>,
    cancel: Option<watch::Receiver<bool>>,
    runner_fut: Option<Pin<Box<dyn Future<Output = RunSummary> + Send>>>,
}

impl Scenario<reqwest::Client> {
    /// Run against the network with a `reqwest` client built from `config`.
    pub fn new(config: RunConfiguration) -> Result<Self, TransportError> {
        let client = http_client(&config)?;
        Ok(Self::with_transport(config, client))
    }
}

impl<T> Scenario<T> {
    pub fn with_transport(config: RunConfiguration, transport: T) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            cancel: None,
            runner_fut: None,
        }
    }

    /// Stop early once `true` is sent on the paired sender. In-flight iterations are abandoned.
    pub fn cancel_on(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl<T> Future for Scenario<T>
where
    T: Transport + Send + Sync + 'static,
{
    type Output = RunSummary;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if this.runner_fut.is_none() {
            let config = Arc::new(this.config.clone());
            let transport = this.transport.clone();
            let cancel = this.cancel.take();
            *this.runner_fut = Some(Box::pin(run_scenario(config, transport, cancel)));
        }

        if let Some(runner) = this.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

#[instrument(name = "scenario", skip_all, fields(vus = config.vus.get()))]
pub(crate) async fn run_scenario<T>(
    config: Arc<RunConfiguration>,
    transport: Arc<T>,
    cancel: Option<watch::Receiver<bool>>,
) -> RunSummary
where
    T: Transport + Send + Sync + 'static,
{
    let runner = LoadIterationRunner::new(config.clone(), transport);
    info!(
        "Running {} virtual users against {} for {}",
        config.vus,
        runner.url(),
        humantime::format_duration(config.duration)
    );

    // NOTE: A receiver whose sender is already gone never reports cancellation.
    let cancel = cancel.unwrap_or_else(|| watch::channel(false).1);

    let start = Instant::now();
    let deadline = start + config.duration;
    let hard_stop = deadline + config.graceful_stop;

    let (tx, mut rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
    let handles: Vec<JoinHandle<()>> = (0..config.vus.get())
        .map(|id| {
            tokio::spawn(
                virtual_user(id, runner.clone(), deadline, hard_stop, cancel.clone(), tx.clone())
                    .in_current_span(),
            )
        })
        .collect();
    drop(tx);

    let mut metrics = RunMetrics::new();
    while let Some(result) = rx.recv().await {
        metrics.record(&result);
    }

    for handle in handles {
        if let Err(err) = handle.await {
            error!("Virtual user task failed: {err}");
        }
    }

    let summary = metrics.finish(&config, start.elapsed());
    info!(
        "Scenario complete: {} iterations, thresholds {}",
        summary.iterations,
        if summary.passed() { "passed" } else { "failed" }
    );
    summary
}

async fn virtual_user<T>(
    id: usize,
    runner: LoadIterationRunner<T>,
    deadline: Instant,
    hard_stop: Instant,
    mut cancel: watch::Receiver<bool>,
    tx: mpsc::Sender<IterationResult>,
) where
    T: Transport + Send + Sync + 'static,
{
    debug!(vu = id, "Virtual user started");
    let mut iterations = 0u64;

    while Instant::now() < deadline && !*cancel.borrow() {
        let result = tokio::select! {
            result = runner.run_iteration() => result,
            _ = sleep_until(hard_stop) => {
                warn!(vu = id, "Iteration still running after the graceful stop period; abandoning it.");
                break;
            }
            _ = cancelled(&mut cancel) => {
                debug!(vu = id, "Cancelled mid-iteration.");
                break;
            }
        };

        iterations += 1;
        if tx.send(result).await.is_err() {
            error!(vu = id, "Result channel closed.");
            break;
        }
    }

    debug!(vu = id, iterations, "Virtual user finished");
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
