//! Pass-through relay from the provider's event stream to the HTTP response.
//!
//! A spawned task owns the upstream stream and pushes each decoded text
//! fragment into a small channel as soon as it is decoded; the response body
//! drains the other end. Nothing is aggregated.

use std::convert::Infallible;
use std::fmt::Display;

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::llm::CompletionEvents;

const RELAY_CAPACITY: usize = 16;

/// Relays a provider response as this endpoint's streamed body.
pub fn relay_completion(upstream: reqwest::Response) -> Response {
    relay_stream(upstream.bytes_stream())
}

pub fn relay_stream<S, E>(upstream: S) -> Response
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Bytes>(RELAY_CAPACITY);
    tokio::spawn(forward(upstream, tx));

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

async fn forward<S, E>(upstream: S, tx: mpsc::Sender<Bytes>)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut upstream = std::pin::pin!(upstream);
    let mut events = CompletionEvents::new();
    let mut relayed = 0usize;

    while let Some(chunk) = upstream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                // The client sees this as an ordinary end of stream.
                warn!(error = %e, relayed, "completion stream broke off");
                return;
            }
        };

        let fragments = match events.push(&bytes) {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(error = %e, relayed, "stopping relay");
                return;
            }
        };

        for fragment in fragments {
            relayed += fragment.len();
            if tx.send(Bytes::from(fragment)).await.is_err() {
                // Receiver dropped: the caller disconnected, so let go of upstream too.
                debug!(relayed, "client went away, dropping completion stream");
                return;
            }
        }

        if events.is_done() {
            break;
        }
    }

    info!(bytes = relayed, "completion relayed");
}
