use crate::threshold::check_failure_rate;
use crate::*;
use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

/// Everything a run needs, resolved once before the first iteration.
///
/// Built from the environment with [`RunConfiguration::from_env`] (or [`Default`] for the
/// documented defaults) and shared read-only by every virtual user.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfiguration {
    pub vus: NonZeroUsize,
    pub duration: Duration,
    pub failure_rate_threshold: f64,
    /// Kept sorted by percentile, at most one entry per percentile.
    pub latency_thresholds: Vec<LatencyThreshold>,
    pub api_name: String,
    pub namespace: String,
    /// Replaces the in-cluster gateway address when set.
    pub gateway_url: Option<String>,
    pub iteration_pause: Duration,
    pub request_timeout: Duration,
    pub graceful_stop: Duration,
    pub max_rps: Option<NonZeroU32>,
    pub summary_trend_stats: Vec<TrendStat>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            vus: DEFAULT_VUS,
            duration: Duration::from_secs(30),
            failure_rate_threshold: DEFAULT_FAILURE_RATE_THRESHOLD,
            latency_thresholds: vec![LatencyThreshold::default()],
            api_name: DEFAULT_API_NAME.to_string(),
            namespace: DEFAULT_TARGET_NAMESPACE.to_string(),
            gateway_url: None,
            iteration_pause: ITERATION_PAUSE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            graceful_stop: DEFAULT_GRACEFUL_STOP,
            max_rps: None,
            summary_trend_stats: TrendStat::defaults(),
        }
    }
}

impl RunConfiguration {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve `API_NAME`, `TEST_DURATION`, `TARGET_NAMESPACE` and `GATEWAY_URL` through
    /// `lookup`. Unset and empty values both fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let duration = var(ENV_TEST_DURATION).unwrap_or_else(|| DEFAULT_TEST_DURATION.to_string());
        let duration = parse_duration(&duration)?;

        let mut config = Self::default().duration(duration);
        if let Some(api_name) = var(ENV_API_NAME) {
            config.api_name = api_name;
        }
        if let Some(namespace) = var(ENV_TARGET_NAMESPACE) {
            config.namespace = namespace;
        }
        config.gateway_url = var(ENV_GATEWAY_URL);

        Ok(config)
    }

    /// The single URL every iteration requests.
    pub fn target_url(&self) -> String {
        let base = match &self.gateway_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "http://{GATEWAY_SERVICE}.{}.svc.cluster.local:{GATEWAY_PORT}",
                self.namespace
            ),
        };
        format!("{base}/{}/get", self.api_name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        check_failure_rate(self.failure_rate_threshold)?;

        let url = self.target_url();
        url::Url::parse(&url).map_err(|source| ConfigError::InvalidUrl { url, source })?;
        Ok(())
    }

    pub fn vus(mut self, vus: NonZeroUsize) -> Self {
        self.vus = vus;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn api_name(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = api_name.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn gateway_url(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self
    }

    pub fn failure_rate_threshold(mut self, rate: f64) -> Self {
        self.failure_rate_threshold = rate;
        self
    }

    /// Add a latency threshold, replacing any existing one for the same percentile.
    pub fn latency_threshold(mut self, threshold: LatencyThreshold) -> Self {
        self.latency_thresholds
            .retain(|t| t.percentile() != threshold.percentile());
        self.latency_thresholds.push(threshold);
        self.latency_thresholds
            .sort_by(|a, b| a.percentile().total_cmp(&b.percentile()));
        self
    }

    pub fn clear_latency_thresholds(mut self) -> Self {
        self.latency_thresholds.clear();
        self
    }

    pub fn iteration_pause(mut self, pause: Duration) -> Self {
        self.iteration_pause = pause;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn graceful_stop(mut self, graceful_stop: Duration) -> Self {
        self.graceful_stop = graceful_stop;
        self
    }

    pub fn max_rps(mut self, max_rps: NonZeroU32) -> Self {
        self.max_rps = Some(max_rps);
        self
    }
}

pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|source| ConfigError::InvalidDuration {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = RunConfiguration::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.vus.get(), 10);
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.failure_rate_threshold, 0.01);
        assert_eq!(config.latency_thresholds.len(), 1);
        assert_eq!(config.latency_thresholds[0].to_string(), "p(95)<500");
        assert_eq!(config.iteration_pause, Duration::from_secs(1));
        assert_eq!(
            config.target_url(),
            "http://gateway-svc-tyk-data-plane-tyk-gateway.tyk-dp-1.svc.cluster.local:8080/test/get"
        );
        config.validate().unwrap();
    }

    #[test]
    fn overrides_are_substituted_verbatim() {
        let config = RunConfiguration::from_lookup(lookup(&[
            ("API_NAME", "orders"),
            ("TARGET_NAMESPACE", "tyk-dp-2"),
            ("TEST_DURATION", "2m"),
        ]))
        .unwrap();
        assert_eq!(
            config.target_url(),
            "http://gateway-svc-tyk-data-plane-tyk-gateway.tyk-dp-2.svc.cluster.local:8080/orders/get"
        );
        assert_eq!(config.duration, Duration::from_secs(120));
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config =
            RunConfiguration::from_lookup(lookup(&[("API_NAME", ""), ("TEST_DURATION", "")]))
                .unwrap();
        assert_eq!(config.api_name, "test");
        assert_eq!(config.duration, Duration::from_secs(30));
    }

    #[test]
    fn gateway_override() {
        let config =
            RunConfiguration::from_lookup(lookup(&[("GATEWAY_URL", "http://127.0.0.1:3002/")]))
                .unwrap();
        assert_eq!(config.target_url(), "http://127.0.0.1:3002/test/get");
    }

    #[test]
    fn invalid_duration() {
        let err = RunConfiguration::from_lookup(lookup(&[("TEST_DURATION", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));
    }

    #[test]
    fn validation() {
        let config = RunConfiguration::default().duration(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDuration)));

        let config = RunConfiguration::default().failure_rate_threshold(2.);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FailureRateOutOfRange(_))
        ));

        let config = RunConfiguration::default().namespace("not a host");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn latency_thresholds_stay_ordered() {
        let p99 = LatencyThreshold::new(99., Duration::from_secs(1)).unwrap();
        let p50 = LatencyThreshold::new(50., Duration::from_millis(100)).unwrap();
        let p95 = LatencyThreshold::new(95., Duration::from_millis(300)).unwrap();

        let config = RunConfiguration::default()
            .latency_threshold(p99)
            .latency_threshold(p50)
            .latency_threshold(p95);

        let exprs: Vec<_> = config
            .latency_thresholds
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(exprs, ["p(50)<100", "p(95)<300", "p(99)<1000"]);
    }
}
