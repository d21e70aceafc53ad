use crate::ConfigError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A ceiling on one percentile of `http_req_duration`, written `p(95)<500` (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyThreshold {
    percentile: f64,
    max: Duration,
}

impl LatencyThreshold {
    pub fn new(percentile: f64, max: Duration) -> Result<Self, ConfigError> {
        if !(percentile > 0. && percentile <= 100.) {
            return Err(ConfigError::PercentileOutOfRange(percentile));
        }
        Ok(Self { percentile, max })
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// The percentile as a quantile in (0, 1].
    pub fn quantile(&self) -> f64 {
        self.percentile / 100.
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn is_met(&self, observed: Duration) -> bool {
        observed < self.max
    }
}

impl Default for LatencyThreshold {
    fn default() -> Self {
        Self {
            percentile: crate::DEFAULT_LATENCY_PERCENTILE,
            max: crate::DEFAULT_LATENCY_MAX,
        }
    }
}

impl fmt::Display for LatencyThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p({})<{}",
            self.percentile,
            as_millis_f64(self.max)
        )
    }
}

impl FromStr for LatencyThreshold {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidThreshold(s.to_string());
        let expr: String = s.chars().filter(|c| !c.is_whitespace()).collect();

        let rest = expr.strip_prefix("p(").ok_or_else(invalid)?;
        let (percentile, rest) = rest.split_once(')').ok_or_else(invalid)?;
        let millis = rest.strip_prefix('<').ok_or_else(invalid)?;

        let percentile: f64 = percentile.parse().map_err(|_| invalid())?;
        let millis: f64 = millis.parse().map_err(|_| invalid())?;
        if !millis.is_finite() || millis < 0. {
            return Err(invalid());
        }

        Self::new(percentile, Duration::from_nanos((millis * 1e6).round() as u64))
    }
}

pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1e6
}

/// Parse a failure-rate ceiling, either bare (`0.01`) or as `rate<0.01`.
pub fn parse_failure_rate(s: &str) -> Result<f64, ConfigError> {
    let expr: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let value = expr.strip_prefix("rate<").unwrap_or(&expr);
    let rate: f64 = value
        .parse()
        .map_err(|_| ConfigError::InvalidThreshold(s.to_string()))?;
    check_failure_rate(rate)
}

pub(crate) fn check_failure_rate(rate: f64) -> Result<f64, ConfigError> {
    if (0. ..=1.).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::FailureRateOutOfRange(rate))
    }
}

/// Result of checking one threshold against the aggregated run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdOutcome {
    pub metric: String,
    pub expression: String,
    /// Observed value; a rate for `http_req_failed`, milliseconds for latencies. `None` when
    /// the metric saw no samples.
    pub observed: Option<f64>,
    pub passed: bool,
}

impl ThresholdOutcome {
    pub fn failure_rate(threshold: f64, observed: Option<f64>) -> Self {
        Self {
            metric: crate::HTTP_REQ_FAILED.to_string(),
            expression: format!("rate<{threshold}"),
            observed,
            passed: observed.map_or(true, |rate| rate < threshold),
        }
    }

    pub fn latency(threshold: &LatencyThreshold, observed: Option<Duration>) -> Self {
        Self {
            metric: crate::HTTP_REQ_DURATION.to_string(),
            expression: threshold.to_string(),
            observed: observed.map(as_millis_f64),
            passed: observed.map_or(true, |d| threshold.is_met(d)),
        }
    }
}
