use std::num::NonZeroUsize;
use std::time::Duration;

pub const ENV_API_NAME: &str = "API_NAME";
pub const ENV_TEST_DURATION: &str = "TEST_DURATION";
pub const ENV_TARGET_NAMESPACE: &str = "TARGET_NAMESPACE";
pub const ENV_GATEWAY_URL: &str = "GATEWAY_URL";

pub const DEFAULT_API_NAME: &str = "test";
pub const DEFAULT_TEST_DURATION: &str = "30s";
pub const DEFAULT_TARGET_NAMESPACE: &str = "tyk-dp-1";

/// Service name of the Tyk data-plane gateway inside each namespace.
pub const GATEWAY_SERVICE: &str = "gateway-svc-tyk-data-plane-tyk-gateway";
pub const GATEWAY_PORT: u16 = 8080;

pub const DEFAULT_VUS: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(10) };

/// Default ceiling for the `http_req_failed` rate (`rate<0.01`).
pub const DEFAULT_FAILURE_RATE_THRESHOLD: f64 = 0.01;

/// Default `http_req_duration` ceiling (`p(95)<500`).
pub const DEFAULT_LATENCY_PERCENTILE: f64 = 95.;
pub const DEFAULT_LATENCY_MAX: Duration = Duration::from_millis(500);

/// Pause at the end of every iteration.
pub const ITERATION_PAUSE: Duration = Duration::from_secs(1);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);

pub const HTTP_REQ_FAILED: &str = "http_req_failed";
pub const HTTP_REQ_DURATION: &str = "http_req_duration";
pub const ITERATION_DURATION: &str = "iteration_duration";
