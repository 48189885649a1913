use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// What the server saw for one request to `/echo`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    /// Lower-cased header names; repeated headers joined with ", ".
    pub headers: BTreeMap<String, String>,
    /// `None` when the request had an empty body.
    pub body: Option<String>,
}

impl Echo {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub body: String,
}

pub type Received = Arc<RwLock<Vec<Echo>>>;

/// Largest body `/bytes/{len}` will produce.
pub const MAX_BYTES: usize = 64 * 1024 * 1024;

pub fn app() -> Router {
    let received: Received = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/requests", get(list_requests))
        .route("/text", get(text))
        .route("/status/{code}", any(status))
        .route("/bytes/{len}", get(bytes))
        .with_state(received)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    State(received): State<Received>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    let echo = Echo {
        method: method.to_string(),
        headers: collect_headers(&headers),
        body: (!body.is_empty()).then_some(body),
    };
    log::debug!("echo {} ({} headers)", echo.method, echo.headers.len());
    received.write().await.push(echo.clone());
    Json(echo)
}

async fn list_requests(State(received): State<Received>) -> Json<Vec<Echo>> {
    Json(received.read().await.clone())
}

async fn text() -> &'static str {
    "hello"
}

async fn status(Path(code): Path<u16>, Query(query): Query<StatusQuery>) -> (StatusCode, String) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, query.body),
        Err(_) => (StatusCode::BAD_REQUEST, format!("invalid status code: {code}")),
    }
}

async fn bytes(Path(len): Path<usize>) -> (StatusCode, String) {
    if len > MAX_BYTES {
        return (StatusCode::BAD_REQUEST, format!("at most {MAX_BYTES} bytes"));
    }
    (StatusCode::OK, "x".repeat(len))
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "GET".to_string(),
            headers: BTreeMap::from([("accept".to_string(), "*/*".to_string())]),
            body: None,
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["headers"]["accept"], "*/*");
        assert!(json["body"].is_null());
    }

    #[test]
    fn echo_header_lookup_ignores_case() {
        let echo = Echo {
            method: "GET".to_string(),
            headers: BTreeMap::from([("x-test".to_string(), "1".to_string())]),
            body: None,
        };
        assert_eq!(echo.header("X-Test"), Some("1"));
    }

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append("x-multi", HeaderValue::from_static("a"));
        headers.append("x-multi", HeaderValue::from_static("b"));
        headers.insert("accept", HeaderValue::from_static("text/plain"));

        let collected = collect_headers(&headers);
        assert_eq!(collected["x-multi"], "a, b");
        assert_eq!(collected["accept"], "text/plain");
    }

    #[test]
    fn status_query_body_defaults_to_empty() {
        let query: StatusQuery = serde_json::from_str("{}").unwrap();
        assert!(query.body.is_empty());
    }
}
