#![allow(dead_code)]

use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::post;
use axum::{Json, Router};
use news_summarizer::{config::Config, AppState};
use tokio::net::TcpListener;

pub const SCENARIO_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Harga emas</title></head>
  <body>
    <nav>Home | Market | Tech</nav>
    <div class="detail_text">
      <p>Harga emas naik hari ini.</p>
      <p>Analis memperkirakan tren ini berlanjut.</p>
    </div>
  </body>
</html>"#;

pub const SCENARIO_SUMMARY: &str = "Harga emas naik hari ini. Analis memperkirakan tren ini berlanjut.";

pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap()
}

/// Serves `html` for every path and counts requests.
pub async fn article_server(html: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().fallback(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Html(html)
    });
    (serve(router).await, hits)
}

#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub authorization: Option<String>,
    pub payload: serde_json::Value,
}

pub type ProviderCalls = Arc<Mutex<Vec<ProviderCall>>>;

/// Server-sent events the way the completions API streams them.
pub fn completion_events(fragments: &[&str]) -> Vec<String> {
    let mut events = vec![event("\n\n")];
    events.extend(fragments.iter().map(|f| event(f)));
    events.push("data: [DONE]\n\n".to_string());
    events
}

fn event(text: &str) -> String {
    let body = serde_json::json!({
        "id": "cmpl-test",
        "object": "text_completion",
        "choices": [{"text": text, "index": 0, "logprobs": null, "finish_reason": null}],
        "model": "text-davinci-003",
    });
    format!("data: {}\n\n", body)
}

/// Completions provider that streams `events` one chunk at a time.
pub async fn provider_server(events: Vec<String>) -> (SocketAddr, ProviderCalls) {
    let calls: ProviderCalls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let router = Router::new().route(
        "/v1/completions",
        post(move |headers: HeaderMap, Json(payload): Json<serde_json::Value>| async move {
            let authorization = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            recorded.lock().unwrap().push(ProviderCall { authorization, payload });

            let chunks = events.into_iter().map(|e| Ok::<_, Infallible>(Bytes::from(e)));
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(futures::stream::iter(chunks)),
            )
        }),
    );
    (serve(router).await, calls)
}

/// Completions provider that refuses every request.
pub async fn failing_provider(status: StatusCode, message: &'static str) -> (SocketAddr, ProviderCalls) {
    let calls: ProviderCalls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let router = Router::new().route(
        "/v1/completions",
        post(move |Json(payload): Json<serde_json::Value>| async move {
            recorded.lock().unwrap().push(ProviderCall { authorization: None, payload });
            (status, message).into_response()
        }),
    );
    (serve(router).await, calls)
}

pub fn test_client(article_addr: SocketAddr) -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .resolve("www.cnbcindonesia.com", article_addr)
        .build()
        .unwrap()
}

pub fn app_state(article_addr: SocketAddr, provider_addr: SocketAddr) -> AppState {
    let config = Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        openai_api_key: "sk-test".into(),
        openai_api_base: format!("http://{}/v1", provider_addr),
    };
    AppState::with_client(config, test_client(article_addr))
}

/// Article URL on the source domain, routed to the mock article server.
pub fn article_url(article_addr: SocketAddr, path: &str) -> String {
    format!("http://www.cnbcindonesia.com:{}{}", article_addr.port(), path)
}
