//! Default gateload runtime
//!
//! Resolves the configuration from the command line and environment, runs the scenario until
//! it completes or Ctrl-C is pressed, then prints (and optionally exports) the summary.
use crate::{cli::GateloadCli, error::RuntimeError};
use clap::Parser;
use gateload::Scenario;
use gateload_core::{RunConfiguration, RunSummary};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::watch;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn, Instrument};

/// Exit status when the run completed but at least one threshold was crossed.
pub const THRESHOLDS_FAILED_EXIT_CODE: u8 = 99;

/// # Example
///
/// ```no_run
/// use gateload_runtime::{exit_code, GateloadRuntime};
///
/// #[tokio::main]
/// async fn main() -> std::process::ExitCode {
///     let result = match GateloadRuntime::with_args() {
///         Ok(runtime) => runtime.run().await,
///         Err(err) => Err(err),
///     };
///     exit_code(&result)
/// }
/// ```
pub struct GateloadRuntime {
    config: RunConfiguration,
    summary_export: Option<PathBuf>,
    metrics_listen: Option<SocketAddr>,
    cancel: Option<watch::Receiver<bool>>,
}

impl GateloadRuntime {
    pub fn new(config: RunConfiguration) -> Self {
        Self {
            config,
            summary_export: None,
            metrics_listen: None,
            cancel: None,
        }
    }

    /// Parse the process arguments and environment.
    ///
    /// `--help`, `--version` and malformed flags exit the process, as `clap` does.
    pub fn with_args() -> Result<Self, RuntimeError> {
        Self::from_cli(&GateloadCli::parse(), |key| std::env::var(key).ok())
    }

    pub fn from_cli<F>(cli: &GateloadCli, lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = cli.configuration(lookup)?;
        Ok(Self {
            config,
            summary_export: cli.summary_export.clone(),
            metrics_listen: cli.metrics_listen,
            cancel: None,
        })
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    pub fn summary_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_export = Some(path.into());
        self
    }

    pub fn metrics_listen(mut self, addr: SocketAddr) -> Self {
        self.metrics_listen = Some(addr);
        self
    }

    /// Use `cancel` instead of Ctrl-C to stop the run early.
    pub fn cancel_on(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[instrument(name = "gateload", skip_all, fields(target = %self.config.target_url()))]
    pub async fn run(self) -> Result<RunSummary, RuntimeError> {
        self.config.validate()?;

        if let Some(addr) = self.metrics_listen {
            PrometheusBuilder::new().with_http_listener(addr).install()?;
            info!("Serving Prometheus metrics on {addr}");
        }

        let scenario = Scenario::new(self.config)?;
        let (cancel, signal_task) = match self.cancel {
            Some(cancel) => (cancel, None),
            None => {
                let (tx, rx) = watch::channel(false);
                let task = tokio::spawn(cancel_on_ctrl_c(tx).in_current_span());
                (rx, Some(task))
            }
        };

        let summary = scenario.cancel_on(cancel).await;
        if let Some(task) = signal_task {
            task.abort();
        }

        println!("{summary}");

        if let Some(path) = &self.summary_export {
            write_summary(path, &summary)?;
            info!("Summary written to {}", path.display());
        }

        Ok(summary)
    }
}

async fn cancel_on_ctrl_c(tx: watch::Sender<bool>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Interrupted; stopping virtual users.");
            let _ = tx.send(true);
        }
        Err(err) => error!("Unable to listen for Ctrl-C: {err}"),
    }
}

pub(crate) fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), RuntimeError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// `0` when every threshold held, [`THRESHOLDS_FAILED_EXIT_CODE`] when one was crossed and `1`
/// when the run could not happen at all.
pub fn exit_status(result: &Result<RunSummary, RuntimeError>) -> u8 {
    match result {
        Ok(summary) if summary.passed() => 0,
        Ok(_) => THRESHOLDS_FAILED_EXIT_CODE,
        Err(_) => 1,
    }
}

pub fn exit_code(result: &Result<RunSummary, RuntimeError>) -> ExitCode {
    if let Err(err) = result {
        error!("{err}");
    }
    ExitCode::from(exit_status(result))
}
