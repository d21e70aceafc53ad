mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use clap::Parser;
    use gateload_core::ConfigError;
    use gateload_runtime::{
        exit_status, GateloadCli, GateloadRuntime, RuntimeError, THRESHOLDS_FAILED_EXIT_CODE,
    };
    use std::collections::HashMap;
    use tokio::sync::watch;

    fn runtime(args: &[&str], env: &[(&str, &str)]) -> Result<GateloadRuntime, RuntimeError> {
        let cli =
            GateloadCli::try_parse_from(std::iter::once("gateload").chain(args.iter().copied()))
                .unwrap();
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateloadRuntime::from_cli(&cli, |key| env.get(key).cloned())
    }

    #[tokio::test]
    async fn passing_run_exports_summary() {
        let gateway = mock_gateway().await;
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("summary.json");
        let export_arg = export.to_str().unwrap();

        let (_cancel, rx) = watch::channel(false);
        let result = runtime(
            &["--vus", "2", "--summary-export", export_arg],
            &[
                ("GATEWAY_URL", gateway.as_str()),
                ("API_NAME", "orders"),
                ("TEST_DURATION", "1s"),
            ],
        )
        .unwrap()
        .cancel_on(rx)
        .run()
        .await;

        assert_eq!(exit_status(&result), 0);
        let summary = result.unwrap();
        assert_eq!(summary.target, format!("{gateway}/orders/get"));

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
        assert_eq!(exported["vus"], 2);
        assert_eq!(exported["http_reqs"], summary.http_reqs);
        assert_eq!(exported["checks"].as_array().unwrap().len(), 3);
        assert!(exported["http_req_duration"]["values"].is_array());
        assert!(exported["thresholds"]
            .as_array()
            .unwrap()
            .iter()
            .all(|t| t["passed"] == true));
    }

    #[tokio::test]
    async fn crossed_threshold_exit_status() {
        let gateway = mock_gateway().await;
        let (_cancel, rx) = watch::channel(false);
        let result = runtime(
            &["--api-name", "status/503", "--duration", "1s", "--vus", "1"],
            &[("GATEWAY_URL", gateway.as_str())],
        )
        .unwrap()
        .cancel_on(rx)
        .run()
        .await;

        assert_eq!(exit_status(&result), THRESHOLDS_FAILED_EXIT_CODE);
    }

    #[tokio::test]
    async fn invalid_gateway_url_is_a_config_error() {
        init();
        let (_cancel, rx) = watch::channel(false);
        let result = runtime(&["--gateway-url", "not a url", "--duration", "1s"], &[])
            .unwrap()
            .cancel_on(rx)
            .run()
            .await;

        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::InvalidUrl { .. }))
        ));
        assert_eq!(exit_status(&result), 1);
    }

    #[test]
    fn malformed_env_duration_is_a_config_error() {
        init();
        let result = runtime(&[], &[("TEST_DURATION", "whenever")]);
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::InvalidDuration { .. }))
        ));
    }
}
