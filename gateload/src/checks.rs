//! Response-shape checks evaluated once per iteration.
use gateload_core::CheckResult;
use serde::Deserialize;
use serde_json::Value;

pub const STATUS_IS_200: &str = "status is 200";
pub const RESPONSE_HAS_ARGS: &str = "response has args";
pub const RESPONSE_HAS_HEADERS: &str = "response has headers";

/// The part of an httpbin-style `/get` echo we look at.
///
/// A field counts as present when it exists and is not `null`.
#[derive(Debug, Default, Deserialize)]
pub struct EchoBody {
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub headers: Option<Value>,
}

impl EchoBody {
    /// Decode a body, accepting only a top-level JSON object.
    pub fn decode(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }
}

/// Evaluate every check. None of them short-circuits another.
pub fn evaluate(status: Option<u16>, body: Option<&[u8]>) -> Vec<CheckResult> {
    let echo = body.and_then(EchoBody::decode);

    vec![
        CheckResult::new(STATUS_IS_200, status == Some(200)),
        CheckResult::new(
            RESPONSE_HAS_ARGS,
            echo.as_ref().is_some_and(|echo| echo.args.is_some()),
        ),
        CheckResult::new(
            RESPONSE_HAS_HEADERS,
            echo.as_ref().is_some_and(|echo| echo.headers.is_some()),
        ),
    ]
}
