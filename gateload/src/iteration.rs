use crate::checks;
use crate::transport::Transport;
use gateload_core::{IterationResult, RunConfiguration};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Runs one request → check → pause iteration. Cheap to clone; every virtual user holds one.
pub struct LoadIterationRunner<T> {
    config: Arc<RunConfiguration>,
    transport: Arc<T>,
    url: Arc<str>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl<T> Clone for LoadIterationRunner<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: self.transport.clone(),
            url: self.url.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

impl<T: Transport> LoadIterationRunner<T> {
    pub fn new(config: Arc<RunConfiguration>, transport: Arc<T>) -> Self {
        let url = config.target_url().into();
        let limiter = config.max_rps.map(|rps| Arc::new(rate_limiter(rps)));
        Self {
            config,
            transport,
            url,
            limiter,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// A single attempt: no retries, and failures only show up as failed checks.
    pub async fn run_iteration(&self) -> IterationResult {
        let start = Instant::now();

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let sent = Instant::now();
        let response = self.transport.fetch(&self.url).await;
        let latency = sent.elapsed();

        let (status, body) = match &response {
            Ok(response) => (Some(response.status), Some(response.body.as_slice())),
            Err(err) => {
                warn!("GET {} failed: {err}", self.url);
                (None, None)
            }
        };

        let mut result = IterationResult {
            checks: checks::evaluate(status, body),
            status,
            latency,
            request_failed: !status.is_some_and(is_expected_status),
            bytes_received: body.map_or(0, |body| body.len() as u64),
            duration: latency,
        };
        trace!(?status, ?latency, "Iteration response checked");

        #[cfg(feature = "metrics")]
        record_metrics(&result);

        tokio::time::sleep(self.config.iteration_pause).await;

        result.duration = start.elapsed();
        result
    }
}

/// Statuses that do not count towards `http_req_failed`.
pub fn is_expected_status(status: u16) -> bool {
    (200..400).contains(&status)
}

fn rate_limiter(max_rps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(max_rps).allow_burst(NonZeroU32::MIN))
}

#[cfg(feature = "metrics")]
fn record_metrics(result: &IterationResult) {
    metrics::counter!("gateload_http_reqs").increment(1);
    if result.request_failed {
        metrics::counter!("gateload_http_req_failed").increment(1);
    }
    metrics::histogram!("gateload_http_req_duration").record(result.latency.as_secs_f64());
    metrics::counter!("gateload_data_received").increment(result.bytes_received);

    for check in &result.checks {
        let outcome = if check.passed { "pass" } else { "fail" };
        metrics::counter!("gateload_checks", "check" => check.name, "outcome" => outcome)
            .increment(1);
    }
}
