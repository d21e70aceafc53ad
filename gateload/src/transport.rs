//! The HTTP seam between an iteration and the network.
use gateload_core::RunConfiguration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Issues the GET for one iteration.
///
/// Implemented for [`reqwest::Client`]; tests swap in canned transports.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    async fn fetch(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

impl Transport for reqwest::Client {
    async fn fetch(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let response = self.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(TransportResponse { status, body })
    }
}

/// The shared client every virtual user sends through.
pub fn http_client(config: &RunConfiguration) -> Result<reqwest::Client, TransportError> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("gateload/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
