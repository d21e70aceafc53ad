use gateload::TransportError;
use gateload_core::ConfigError;
use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to build the HTTP client: {0}")]
    Transport(#[from] TransportError),

    #[error("Unable to install the Prometheus exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("Unable to write the summary export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to serialize the summary: {0}")]
    Json(#[from] serde_json::Error),
}
