use gateload_core::{
    CheckSummary, IterationResult, RunConfiguration, RunSummary, ThresholdOutcome, TrendStat,
    TrendSummary, TrendValue, HTTP_REQ_DURATION, ITERATION_DURATION,
};
use std::borrow::Cow;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// A latency-like metric. Every sample is kept so percentiles are exact.
#[derive(Debug, Clone)]
pub struct Trend {
    samples: Vec<Duration>,
    sorted: bool,
    sum: Duration,
}

impl Default for Trend {
    fn default() -> Self {
        Self {
            samples: vec![],
            sorted: true,
            sum: Duration::ZERO,
        }
    }
}

impl Trend {
    pub fn record(&mut self, value: Duration) {
        self.sorted &= self.samples.last().map_or(true, |last| *last <= value);
        self.samples.push(value);
        self.sum += value;
    }

    pub fn count(&self) -> u64 {
        self.samples.len() as u64
    }

    pub fn avg(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        Some(match u32::try_from(self.samples.len()) {
            Ok(count) => self.sum / count,
            Err(_) => self.sum.div_f64(self.samples.len() as f64),
        })
    }

    pub fn min(&self) -> Option<Duration> {
        self.sorted_samples().first().copied()
    }

    pub fn max(&self) -> Option<Duration> {
        self.sorted_samples().last().copied()
    }

    /// Percentile by linear interpolation between the closest ranks, `q` in `[0, 1]`.
    pub fn quantile(&self, quantile: f64) -> Option<Duration> {
        interpolate(&self.sorted_samples(), quantile)
    }

    pub fn stat(&self, stat: TrendStat) -> Option<Duration> {
        self.stat_in(&self.sorted_samples(), stat)
    }

    pub fn summarize(&self, metric: &str, stats: &[TrendStat]) -> TrendSummary {
        let sorted = self.sorted_samples();
        TrendSummary {
            metric: metric.to_string(),
            count: self.count(),
            values: stats
                .iter()
                .filter_map(|&stat| {
                    self.stat_in(&sorted, stat)
                        .map(|value| TrendValue { stat, value })
                })
                .collect(),
        }
    }

    fn stat_in(&self, sorted: &[Duration], stat: TrendStat) -> Option<Duration> {
        match stat {
            TrendStat::Avg => self.avg(),
            TrendStat::Min => sorted.first().copied(),
            TrendStat::Med => interpolate(sorted, 0.5),
            TrendStat::Max => sorted.last().copied(),
            TrendStat::Percentile(p) => interpolate(sorted, p / 100.),
        }
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.samples.sort_unstable();
            self.sorted = true;
        }
    }

    fn sorted_samples(&self) -> Cow<'_, [Duration]> {
        if self.sorted {
            Cow::Borrowed(&self.samples)
        } else {
            let mut samples = self.samples.clone();
            samples.sort_unstable();
            Cow::Owned(samples)
        }
    }
}

fn interpolate(sorted: &[Duration], quantile: f64) -> Option<Duration> {
    let last = sorted.len().checked_sub(1)?;
    let rank = quantile.clamp(0., 1.) * last as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(last);

    let (low, high) = (sorted[lower], sorted[upper]);
    let fraction = rank - lower as f64;
    let step = ((high - low).as_nanos() as f64 * fraction).round() as u64;
    Some(low + Duration::from_nanos(step))
}

/// Folds iteration results into run-level counters and trends.
#[derive(Debug, Default)]
pub struct RunMetrics {
    iterations: u64,
    http_reqs: u64,
    http_req_failed: u64,
    data_received: u64,
    checks: Vec<CheckSummary>,
    http_req_duration: Trend,
    iteration_duration: Trend,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &IterationResult) {
        self.iterations += 1;
        self.http_reqs += 1;
        if result.request_failed {
            self.http_req_failed += 1;
        }
        self.data_received += result.bytes_received;
        self.http_req_duration.record(result.latency);
        self.iteration_duration.record(result.duration);

        for check in &result.checks {
            let position = self.checks.iter().position(|c| c.name == check.name);
            let idx = position.unwrap_or_else(|| {
                self.checks.push(CheckSummary {
                    name: check.name.to_string(),
                    passes: 0,
                    fails: 0,
                });
                self.checks.len() - 1
            });

            let tally = &mut self.checks[idx];
            if check.passed {
                tally.passes += 1;
            } else {
                tally.fails += 1;
            }
        }
    }

    /// Share of requests counted as failed, `None` before the first request.
    pub fn failure_rate(&self) -> Option<f64> {
        (self.http_reqs > 0).then(|| self.http_req_failed as f64 / self.http_reqs as f64)
    }

    pub fn http_req_duration(&self) -> &Trend {
        &self.http_req_duration
    }

    pub fn thresholds(&self, config: &RunConfiguration) -> Vec<ThresholdOutcome> {
        let mut outcomes = vec![ThresholdOutcome::failure_rate(
            config.failure_rate_threshold,
            self.failure_rate(),
        )];
        outcomes.extend(config.latency_thresholds.iter().map(|threshold| {
            ThresholdOutcome::latency(
                threshold,
                self.http_req_duration.quantile(threshold.quantile()),
            )
        }));
        outcomes
    }

    pub fn finish(mut self, config: &RunConfiguration, elapsed: Duration) -> RunSummary {
        self.http_req_duration.sort();
        self.iteration_duration.sort();
        if self.http_reqs == 0 {
            warn!("No requests completed; thresholds had no samples to evaluate.");
        }

        let thresholds = self.thresholds(config);
        for outcome in thresholds.iter().filter(|t| !t.passed) {
            warn!(
                "Threshold {} {} crossed (observed {:?})",
                outcome.metric, outcome.expression, outcome.observed
            );
        }

        let stats = &config.summary_trend_stats;
        RunSummary {
            target: config.target_url(),
            vus: config.vus.get(),
            elapsed,
            iterations: self.iterations,
            http_reqs: self.http_reqs,
            http_req_failed: self.http_req_failed,
            data_received: self.data_received,
            checks: self.checks,
            http_req_duration: self.http_req_duration.summarize(HTTP_REQ_DURATION, stats),
            iteration_duration: self.iteration_duration.summarize(ITERATION_DURATION, stats),
            thresholds,
        }
    }
}
