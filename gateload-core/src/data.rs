use std::time::Duration;

/// Outcome of one named check against one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
}

impl CheckResult {
    pub fn new(name: &'static str, passed: bool) -> Self {
        Self { name, passed }
    }
}

/// Everything one iteration reports to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationResult {
    pub checks: Vec<CheckResult>,
    /// `None` when no response was received.
    pub status: Option<u16>,
    /// Time from sending the request to the full body being read.
    pub latency: Duration,
    pub request_failed: bool,
    pub bytes_received: u64,
    /// Wall time of the whole iteration, pause included.
    pub duration: Duration,
}

impl IterationResult {
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks
            .iter()
            .find(|check| check.name == name)
            .map(|check| check.passed)
    }

    pub fn all_checks_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }
}
