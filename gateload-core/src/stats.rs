use crate::{as_millis_f64, ConfigError, ThresholdOutcome};
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr, DurationMilliSecondsWithFrac};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One statistic reported for a trend metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendStat {
    Avg,
    Min,
    Med,
    Max,
    Percentile(f64),
}

impl TrendStat {
    /// avg, min, med, max, p(90), p(95), p(99)
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::Avg,
            Self::Min,
            Self::Med,
            Self::Max,
            Self::Percentile(90.),
            Self::Percentile(95.),
            Self::Percentile(99.),
        ]
    }
}

impl fmt::Display for TrendStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Avg => write!(f, "avg"),
            Self::Min => write!(f, "min"),
            Self::Med => write!(f, "med"),
            Self::Max => write!(f, "max"),
            Self::Percentile(p) => write!(f, "p({p})"),
        }
    }
}

impl FromStr for TrendStat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "avg" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "med" => Ok(Self::Med),
            "max" => Ok(Self::Max),
            other => other
                .strip_prefix("p(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|p| p.parse::<f64>().ok())
                .filter(|p| *p > 0. && *p <= 100.)
                .map(Self::Percentile)
                .ok_or_else(|| ConfigError::InvalidThreshold(s.to_string())),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendValue {
    #[serde_as(as = "DisplayFromStr")]
    pub stat: TrendStat,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub value: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub metric: String,
    pub count: u64,
    pub values: Vec<TrendValue>,
}

impl TrendSummary {
    pub fn get(&self, stat: TrendStat) -> Option<Duration> {
        self.values
            .iter()
            .find(|value| value.stat == stat)
            .map(|value| value.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn rate(&self) -> f64 {
        ratio(self.passes, self.passes + self.fails)
    }
}

/// Aggregated statistics and threshold outcomes of a finished run.
#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub target: String,
    pub vus: usize,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub elapsed: Duration,
    pub iterations: u64,
    pub http_reqs: u64,
    pub http_req_failed: u64,
    pub data_received: u64,
    pub checks: Vec<CheckSummary>,
    pub http_req_duration: TrendSummary,
    pub iteration_duration: TrendSummary,
    pub thresholds: Vec<ThresholdOutcome>,
}

impl RunSummary {
    /// True when every threshold was met.
    pub fn passed(&self) -> bool {
        self.thresholds.iter().all(|t| t.passed)
    }

    pub fn failure_rate(&self) -> f64 {
        ratio(self.http_req_failed, self.http_reqs)
    }

    pub fn check(&self, name: &str) -> Option<&CheckSummary> {
        self.checks.iter().find(|check| check.name == name)
    }

    fn per_second(&self, count: u64) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0. {
            count as f64 / secs
        } else {
            0.
        }
    }

    fn write_thresholds(&self, f: &mut fmt::Formatter<'_>, metric: &str) -> fmt::Result {
        for outcome in self.thresholds.iter().filter(|t| t.metric == metric) {
            let mark = if outcome.passed { '✓' } else { '✗' };
            writeln!(f, "    {mark} {}", outcome.expression)?;
        }
        Ok(())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  target: {}", self.target)?;
        writeln!(f)?;

        for check in &self.checks {
            if check.fails == 0 {
                writeln!(f, "  ✓ {}", check.name)?;
            } else {
                writeln!(f, "  ✗ {}", check.name)?;
                writeln!(
                    f,
                    "   ↳  {:.0}% (✓ {} / ✗ {})",
                    check.rate() * 100.,
                    check.passes,
                    check.fails
                )?;
            }
        }
        writeln!(f)?;

        let check_passes: u64 = self.checks.iter().map(|c| c.passes).sum();
        let check_total: u64 = self.checks.iter().map(|c| c.passes + c.fails).sum();
        line(
            f,
            "checks",
            format!(
                "{:.2}% {check_passes} out of {check_total}",
                ratio(check_passes, check_total) * 100.
            ),
        )?;
        line(f, "data_received", fmt_bytes(self.data_received))?;
        line(f, crate::HTTP_REQ_DURATION, fmt_trend(&self.http_req_duration))?;
        self.write_thresholds(f, crate::HTTP_REQ_DURATION)?;
        line(
            f,
            crate::HTTP_REQ_FAILED,
            format!(
                "{:.2}% {} out of {}",
                self.failure_rate() * 100.,
                self.http_req_failed,
                self.http_reqs
            ),
        )?;
        self.write_thresholds(f, crate::HTTP_REQ_FAILED)?;
        line(
            f,
            "http_reqs",
            format!("{} {:.2}/s", self.http_reqs, self.per_second(self.http_reqs)),
        )?;
        line(f, crate::ITERATION_DURATION, fmt_trend(&self.iteration_duration))?;
        line(
            f,
            "iterations",
            format!("{} {:.2}/s", self.iterations, self.per_second(self.iterations)),
        )?;
        line(f, "vus", self.vus.to_string())?;
        writeln!(f)?;

        if self.passed() {
            write!(f, "  thresholds passed")
        } else {
            let failed = self.thresholds.iter().filter(|t| !t.passed).count();
            write!(f, "  {failed} threshold(s) FAILED")
        }
    }
}

fn line(f: &mut fmt::Formatter<'_>, name: &str, value: String) -> fmt::Result {
    writeln!(f, "  {name:.<28}: {value}")
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.
    } else {
        part as f64 / total as f64
    }
}

fn fmt_trend(trend: &TrendSummary) -> String {
    trend
        .values
        .iter()
        .map(|v| format!("{}={}", v.stat, fmt_duration(v.value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_duration(duration: Duration) -> String {
    let ms = as_millis_f64(duration);
    if ms >= 1_000. {
        format!("{:.2}s", ms / 1_000.)
    } else if ms >= 1. {
        format!("{ms:.2}ms")
    } else {
        format!("{:.2}µs", ms * 1_000.)
    }
}

fn fmt_bytes(bytes: u64) -> String {
    match bytes {
        b if b < 1_000 => format!("{b} B"),
        b if b < 1_000_000 => format!("{:.1} kB", b as f64 / 1e3),
        b => format!("{:.1} MB", b as f64 / 1e6),
    }
}
