#![cfg_attr(docsrs, feature(doc_cfg))]
//! Virtual-user load generator for the Tyk gateway data plane.
//!
//! A [`Scenario`] drives a fixed pool of virtual users against one gateway API for a fixed
//! duration. Every iteration issues a single `GET`, evaluates the response checks and pauses.
//! Awaiting the scenario yields a [`RunSummary`](gateload_core::RunSummary) with the threshold verdicts.

pub mod checks;
pub mod iteration;
pub mod measurement;
pub mod scenario;
pub mod transport;

pub use gateload_core;
pub use iteration::LoadIterationRunner;
pub use measurement::{RunMetrics, Trend};
pub use scenario::Scenario;
pub use transport::{http_client, Transport, TransportError, TransportResponse};

pub mod prelude {
    pub use crate::scenario::Scenario;
    pub use crate::transport::Transport;

    pub use gateload_core::{LatencyThreshold, RunConfiguration, RunSummary};
}
