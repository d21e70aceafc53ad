//! httpbin-style stand-in for a gateway API, used for local runs and integration tests.
use axum::{
    debug_handler,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lazy_static::lazy_static;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub fn router() -> Router {
    Router::new()
        .route("/:api/get", get(echo))
        .route("/status/:code/get", get(status))
        .route("/delay/:delay_ms/get", get(delay))
        .route("/shape/:kind/get", get(shape))
        .route("/fail-every/:n/get", get(fail_every))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mock gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Serve in the background and return the bound address. Bind port 0 to get a free one.
pub async fn spawn(addr: SocketAddr) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router()).await {
            tracing::error!("Mock gateway stopped: {err}");
        }
    });
    Ok(local)
}

fn echo_body(uri: &Uri, args: &BTreeMap<String, String>, headers: &HeaderMap) -> Value {
    let headers: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (name.as_str().to_string(), Value::String(value))
        })
        .collect();

    json!({
        "args": args,
        "headers": headers,
        "url": uri.to_string(),
    })
}

#[debug_handler]
pub async fn echo(
    Path(api): Path<String>,
    Query(args): Query<BTreeMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    REQUESTS.fetch_add(1, Ordering::Relaxed);
    debug!("Echo for API {api}");
    Json(echo_body(&uri, &args, &headers))
}

#[debug_handler]
pub async fn status(
    Path(code): Path<u16>,
    Query(args): Query<BTreeMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    REQUESTS.fetch_add(1, Ordering::Relaxed);
    let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(echo_body(&uri, &args, &headers))).into_response()
}

#[debug_handler]
pub async fn delay(
    Path(delay_ms): Path<u64>,
    Query(args): Query<BTreeMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    REQUESTS.fetch_add(1, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    Json(echo_body(&uri, &args, &headers))
}

/// Bodies that break one or more of the response-shape expectations.
#[debug_handler]
pub async fn shape(Path(kind): Path<String>, headers: HeaderMap) -> Response {
    REQUESTS.fetch_add(1, Ordering::Relaxed);
    let headers: BTreeMap<_, _> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    match kind.as_str() {
        "no-headers" => Json(json!({ "args": {} })).into_response(),
        "no-args" => Json(json!({ "headers": headers })).into_response(),
        "null-headers" => Json(json!({ "args": {}, "headers": null })).into_response(),
        "array" => Json(json!([{ "args": {} }, { "headers": headers }])).into_response(),
        "text" => "args headers".into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Every `n`th request to `/fail-every/:n/get` answers 503. Each `n` keeps its own count.
#[debug_handler]
pub async fn fail_every(
    Path(n): Path<u64>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    REQUESTS.fetch_add(1, Ordering::Relaxed);
    let seen = {
        let mut counts = FAIL_EVERY_SEEN.lock().unwrap_or_else(PoisonError::into_inner);
        let seen = counts.entry(n).or_insert(0);
        *seen += 1;
        *seen
    };
    if n > 0 && seen % n == 0 {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(echo_body(&uri, &BTreeMap::new(), &headers)))
}

lazy_static! {
    static ref FAIL_EVERY_SEEN: Mutex<HashMap<u64, u64>> = Mutex::new(HashMap::new());
}

/** RPS Printer **/

static REQUESTS: AtomicU64 = AtomicU64::new(0);

pub async fn rps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let requests = REQUESTS.swap(0, Ordering::Relaxed);
        if requests > 0 {
            info!("{requests} RPS");
        }
    }
}
