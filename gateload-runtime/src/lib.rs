//! Command-line runtime for `gateload`: configuration resolution, Ctrl-C cancellation, summary
//! output and exit codes.
pub mod cli;
pub mod error;
pub mod runtime;

pub use cli::GateloadCli;
pub use error::RuntimeError;
pub use runtime::{exit_code, exit_status, GateloadRuntime, THRESHOLDS_FAILED_EXIT_CODE};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "gateload=info,gateload_runtime=info";
