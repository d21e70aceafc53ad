mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use gateload::prelude::*;
    use std::time::Duration;

    #[tokio::test]
    async fn slow_gateway_crosses_latency_threshold() {
        let gateway = mock_gateway().await;
        let summary = Scenario::new(quick_config(&gateway, "delay/700"))
            .unwrap()
            .await;

        assert!(!summary.passed());
        let failed: Vec<_> = summary
            .thresholds
            .iter()
            .filter(|t| !t.passed)
            .map(|t| t.expression.as_str())
            .collect();
        assert_eq!(failed, ["p(95)<500"]);
        assert_eq!(summary.http_req_failed, 0);
    }

    #[tokio::test]
    async fn relaxed_latency_threshold_passes() {
        let gateway = mock_gateway().await;
        let config = quick_config(&gateway, "delay/100")
            .clear_latency_thresholds()
            .latency_threshold("p(99)<2000".parse().unwrap());
        let summary = Scenario::new(config).unwrap().await;

        assert!(summary.passed());
        assert_eq!(summary.thresholds.len(), 2);
        let observed = summary.thresholds[1].observed.unwrap();
        assert!(observed >= 100., "{observed}");
    }

    #[tokio::test]
    async fn occasional_failures_cross_the_failure_rate() {
        let gateway = mock_gateway().await;
        let config = quick_config(&gateway, "fail-every/10")
            .vus(4.try_into().unwrap())
            .iteration_pause(Duration::from_millis(20));
        let summary = Scenario::new(config).unwrap().await;

        assert!(summary.http_reqs >= 20, "{}", summary.http_reqs);
        assert!(summary.http_req_failed > 0);
        assert!(summary.failure_rate() < 0.2);
        assert!(!summary.passed());

        let failed = summary.thresholds.iter().find(|t| !t.passed).unwrap();
        assert_eq!(failed.expression, "rate<0.01");
    }
}
