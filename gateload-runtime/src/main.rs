use gateload_runtime::{exit_code, GateloadRuntime, DEFAULT_LOG_FILTER};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> ExitCode {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match GateloadRuntime::with_args() {
        Ok(runtime) => runtime.run().await,
        Err(err) => Err(err),
    };
    exit_code(&result)
}
