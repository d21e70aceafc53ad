use clap::Parser;
use gateload_core::{
    parse_duration, parse_failure_rate, ConfigError, LatencyThreshold, RunConfiguration,
    TrendStat, ENV_TEST_DURATION,
};
use std::net::SocketAddr;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

/// Flags override the environment (`API_NAME`, `TEST_DURATION`, `TARGET_NAMESPACE`,
/// `GATEWAY_URL`), which overrides the built-in defaults.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "gateload", version, about = "Load test an API on the Tyk gateway data plane")]
pub struct GateloadCli {
    /// Number of concurrent virtual users
    #[arg(short, long)]
    pub vus: Option<NonZeroUsize>,

    /// Run length, e.g. `30s` or `5m`
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// API path segment to target
    #[arg(short, long)]
    pub api_name: Option<String>,

    /// Namespace of the gateway data plane
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Base URL used instead of the in-cluster gateway service
    #[arg(long)]
    pub gateway_url: Option<String>,

    /// Cap on requests per second across all virtual users
    #[arg(long)]
    pub rps: Option<NonZeroU32>,

    /// Per-request timeout, e.g. `10s`
    #[arg(long, value_parser = parse_duration)]
    pub request_timeout: Option<Duration>,

    /// How long iterations running at the deadline may take to finish
    #[arg(long, value_parser = parse_duration)]
    pub graceful_stop: Option<Duration>,

    /// Maximum share of failed requests, `rate<0.01` or `0.01`
    #[arg(long, value_parser = parse_failure_rate)]
    pub failure_rate: Option<f64>,

    /// Latency threshold such as `p(95)<500`; repeat for several. Replaces the default.
    #[arg(short, long)]
    pub latency: Vec<LatencyThreshold>,

    /// Comma-separated trend stats for the summary, e.g. `avg,med,p(99)`
    #[arg(long, value_delimiter = ',')]
    pub summary_trend_stats: Vec<TrendStat>,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    pub summary_export: Option<PathBuf>,

    /// Serve Prometheus metrics on this address while the run is in progress
    #[arg(long)]
    pub metrics_listen: Option<SocketAddr>,
}

impl GateloadCli {
    /// Resolve the run configuration, reading environment variables through `lookup`.
    ///
    /// `TEST_DURATION` is not consulted when `--duration` is given, so a malformed variable
    /// can be overridden from the command line.
    pub fn configuration<F>(&self, lookup: F) -> Result<RunConfiguration, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = RunConfiguration::from_lookup(|key| {
            if key == ENV_TEST_DURATION && self.duration.is_some() {
                None
            } else {
                lookup(key)
            }
        })?;
        Ok(self.apply(config))
    }

    pub fn apply(&self, mut config: RunConfiguration) -> RunConfiguration {
        if let Some(vus) = self.vus {
            config = config.vus(vus);
        }
        if let Some(duration) = self.duration {
            config = config.duration(duration);
        }
        if let Some(api_name) = &self.api_name {
            config = config.api_name(api_name.clone());
        }
        if let Some(namespace) = &self.namespace {
            config = config.namespace(namespace.clone());
        }
        if let Some(gateway_url) = &self.gateway_url {
            config = config.gateway_url(gateway_url.clone());
        }
        if let Some(rps) = self.rps {
            config = config.max_rps(rps);
        }
        if let Some(timeout) = self.request_timeout {
            config = config.request_timeout(timeout);
        }
        if let Some(graceful_stop) = self.graceful_stop {
            config = config.graceful_stop(graceful_stop);
        }
        if let Some(rate) = self.failure_rate {
            config = config.failure_rate_threshold(rate);
        }
        if !self.latency.is_empty() {
            config = self
                .latency
                .iter()
                .fold(config.clear_latency_thresholds(), |config, threshold| {
                    config.latency_threshold(*threshold)
                });
        }
        if !self.summary_trend_stats.is_empty() {
            config.summary_trend_stats = self.summary_trend_stats.clone();
        }
        config
    }
}
