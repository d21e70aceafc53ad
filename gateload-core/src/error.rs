use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid duration {value:?}: {source}")]
    InvalidDuration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Invalid threshold expression {0:?}")]
    InvalidThreshold(String),

    #[error("Failure rate threshold must be within [0, 1], got {0}")]
    FailureRateOutOfRange(f64),

    #[error("Percentile must be within (0, 100], got {0}")]
    PercentileOutOfRange(f64),

    #[error("Test duration must be greater than zero")]
    ZeroDuration,

    #[error("Invalid target URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
