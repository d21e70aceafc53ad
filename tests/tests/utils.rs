use gateload_core::RunConfiguration;
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            error!("Panic occurred: {info:?}");
            default_panic(info);
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("gateload=debug,gateload_runtime=debug,mock_service=info")
            .with_test_writer()
            .try_init();
    });
}

/// Start a mock gateway on a free port for the current test and return its base URL.
#[allow(unused)]
pub async fn mock_gateway() -> String {
    init();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let addr = mock_service::spawn(addr).await.unwrap();
    format!("http://{addr}")
}

/// A short run against `gateway_url`, targeting `<gateway_url>/<api>/get`.
#[allow(unused)]
pub fn quick_config(gateway_url: &str, api: &str) -> RunConfiguration {
    RunConfiguration::default()
        .gateway_url(gateway_url)
        .api_name(api)
        .vus(2.try_into().unwrap())
        .duration(Duration::from_secs(2))
        .iteration_pause(Duration::from_millis(100))
        .request_timeout(Duration::from_secs(5))
        .graceful_stop(Duration::from_secs(5))
}
