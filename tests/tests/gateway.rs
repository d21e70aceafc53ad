mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use gateload::checks::{RESPONSE_HAS_ARGS, RESPONSE_HAS_HEADERS, STATUS_IS_200};
    use gateload::prelude::*;
    use std::time::Duration;

    fn passes_and_fails(summary: &RunSummary, check: &str) -> (u64, u64) {
        let check = summary.check(check).unwrap();
        (check.passes, check.fails)
    }

    #[tokio::test]
    async fn healthy_gateway_passes() {
        let gateway = mock_gateway().await;
        let summary = Scenario::new(quick_config(&gateway, "test"))
            .unwrap()
            .await;

        assert!(summary.iterations >= 4, "{}", summary.iterations);
        assert_eq!(summary.http_req_failed, 0);
        assert!(summary.passed());
        for check in [STATUS_IS_200, RESPONSE_HAS_ARGS, RESPONSE_HAS_HEADERS] {
            assert_eq!(passes_and_fails(&summary, check), (summary.iterations, 0));
        }
        assert_eq!(summary.target, format!("{gateway}/test/get"));
        assert!(summary.data_received > 0);
    }

    #[tokio::test]
    async fn missing_api_fails_the_run() {
        let gateway = mock_gateway().await;
        let summary = Scenario::new(quick_config(&gateway, "status/404"))
            .unwrap()
            .await;

        assert!(!summary.passed());
        assert_eq!(summary.failure_rate(), 1.);
        assert_eq!(passes_and_fails(&summary, STATUS_IS_200).0, 0);
        // The 404 still carries an echo body, so the shape checks pass on their own.
        assert_eq!(passes_and_fails(&summary, RESPONSE_HAS_ARGS).1, 0);
        assert_eq!(passes_and_fails(&summary, RESPONSE_HAS_HEADERS).1, 0);
    }

    #[tokio::test]
    async fn redirect_class_status_is_not_a_failed_request() {
        let gateway = mock_gateway().await;
        let summary = Scenario::new(quick_config(&gateway, "status/304"))
            .unwrap()
            .await;

        assert_eq!(summary.http_req_failed, 0);
        assert!(summary.passed());
        assert_eq!(passes_and_fails(&summary, STATUS_IS_200).0, 0);
    }

    #[tokio::test]
    async fn missing_headers_only_fails_that_check() {
        let gateway = mock_gateway().await;
        let summary = Scenario::new(quick_config(&gateway, "shape/no-headers"))
            .unwrap()
            .await;

        assert!(summary.passed());
        assert_eq!(passes_and_fails(&summary, STATUS_IS_200).1, 0);
        assert_eq!(passes_and_fails(&summary, RESPONSE_HAS_ARGS).1, 0);
        assert_eq!(passes_and_fails(&summary, RESPONSE_HAS_HEADERS).0, 0);
    }

    #[tokio::test]
    async fn unusual_bodies_fail_shape_checks() {
        let gateway = mock_gateway().await;
        for (shape, args_ok, headers_ok) in [
            ("shape/no-args", false, true),
            ("shape/null-headers", true, false),
            ("shape/array", false, false),
            ("shape/text", false, false),
        ] {
            let config = quick_config(&gateway, shape).duration(Duration::from_millis(500));
            let summary = Scenario::new(config).unwrap().await;

            let (args_passes, args_fails) = passes_and_fails(&summary, RESPONSE_HAS_ARGS);
            let (headers_passes, headers_fails) =
                passes_and_fails(&summary, RESPONSE_HAS_HEADERS);
            assert_eq!(args_fails == 0, args_ok, "{shape}");
            assert_eq!(args_passes == 0, !args_ok, "{shape}");
            assert_eq!(headers_fails == 0, headers_ok, "{shape}");
            assert_eq!(headers_passes == 0, !headers_ok, "{shape}");
            assert!(summary.passed(), "{shape}");
        }
    }

    #[tokio::test]
    async fn unreachable_gateway_fails_every_check() {
        init();
        let config = quick_config("http://127.0.0.1:1", "test");
        let summary = Scenario::new(config).unwrap().await;

        assert!(summary.iterations > 0);
        assert_eq!(summary.failure_rate(), 1.);
        assert!(!summary.passed());
        assert!(summary.checks.iter().all(|check| check.passes == 0));
        assert_eq!(summary.data_received, 0);
    }

    #[tokio::test]
    async fn cancellation_ends_the_run_early() {
        let gateway = mock_gateway().await;
        let (tx, rx) = tokio::sync::watch::channel(false);
        let config = quick_config(&gateway, "test").duration(Duration::from_secs(600));
        let handle = tokio::spawn(Scenario::new(config).unwrap().cancel_on(rx));

        tokio::time::sleep(Duration::from_millis(500)).await;
        tx.send(true).unwrap();

        let summary = handle.await.unwrap();
        assert!(summary.elapsed < Duration::from_secs(5));
        assert!(summary.iterations > 0);
        assert!(summary.passed());
    }
}
