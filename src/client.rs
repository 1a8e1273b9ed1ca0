//! Client for the summarize endpoint.
//!
//! [`SummarySession`] drives one summary at a time: it validates the article,
//! streams the response body into a growing buffer and publishes every change
//! through a [`watch`] channel so a view can redraw the bullets as text
//! arrives. Starting a new submission cancels the one in flight.

use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::{Client, Response, StatusCode};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::models::SummaryRequest;
use crate::render;
use crate::source::{article_path, is_source_article, url_from_segments, INVALID_ARTICLE_NOTICE};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{}", INVALID_ARTICLE_NOTICE)]
    InvalidArticle,

    #[error("summarize endpoint returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("summarize endpoint returned no body")]
    MissingBody,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("superseded by a newer submission")]
    Superseded,
}

/// Streaming UTF-8 decoder.
///
/// Keeps the trailing bytes of an incomplete character until the next chunk
/// completes it. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        None => {
                            // incomplete character at the end, wait for more
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flushes whatever is left once the stream has ended.
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

#[derive(Debug, Clone)]
pub struct SummaryClient {
    http: Client,
    base: String,
}

impl SummaryClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base)
    }

    pub fn with_client(http: Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        SummaryClient { http, base }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/summarize", self.base)
    }

    /// Posts the article URL and returns the response once headers are in.
    pub async fn open(&self, url: &str) -> Result<Response, ClientError> {
        let res = self
            .http
            .post(self.endpoint())
            .json(&SummaryRequest::new(url))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(ClientError::Status { status: status.as_u16(), message });
        }
        if status == StatusCode::NO_CONTENT {
            return Err(ClientError::MissingBody);
        }
        Ok(res)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Requesting,
    Streaming,
}

/// Everything a view needs to draw the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryState {
    pub summary: String,
    pub loading: bool,
    pub phase: Phase,
    /// Page address of the last article summarized successfully.
    pub address_path: Option<String>,
    pub notice: Option<String>,
    generation: u64,
}

impl SummaryState {
    pub fn bullets(&self) -> Vec<&str> {
        render::bullets(&self.summary)
    }
}

pub struct SummarySession {
    client: SummaryClient,
    state: watch::Sender<SummaryState>,
    input: Mutex<String>,
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SummarySession {
    pub fn new(client: SummaryClient) -> Self {
        let (state, _) = watch::channel(SummaryState::default());
        SummarySession {
            client,
            state,
            input: Mutex::new(String::new()),
            in_flight: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SummaryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SummaryState {
        self.state.borrow().clone()
    }

    /// The article text currently typed by the user.
    pub fn input(&self) -> String {
        lock(&self.input).clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        *lock(&self.input) = text.into();
    }

    /// Starts a summary for the article named by the page address, unless an
    /// article was already entered in this session.
    pub async fn seed_from_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<Result<(), ClientError>> {
        if !self.input().is_empty() {
            return None;
        }
        let url = url_from_segments(segments)?;
        Some(self.submit(Some(&url)).await)
    }

    /// Summarizes `url`, or the typed input when `url` is `None`.
    ///
    /// Resolves once the stream has ended, failed, or been superseded by a
    /// later call.
    pub async fn submit(&self, url: Option<&str>) -> Result<(), ClientError> {
        let (generation, token) = self.begin();
        let target = match url {
            Some(url) => url.to_string(),
            None => self.input(),
        };

        if !is_source_article(&target) {
            info!(input = %target, "rejected non-article input");
            self.update(generation, |s| s.notice = Some(INVALID_ARTICLE_NOTICE.to_string()));
            self.release(generation);
            return Err(ClientError::InvalidArticle);
        }
        if url.is_some() {
            self.set_input(target.as_str());
        }

        self.update(generation, |s| {
            s.loading = true;
            s.phase = Phase::Requesting;
        });

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ClientError::Superseded),
            res = self.stream_summary(generation, &target) => res,
        };
        self.release(generation);

        match &result {
            Ok(()) => {
                let path = article_path(&target);
                self.update(generation, |s| {
                    s.loading = false;
                    s.phase = Phase::Idle;
                    s.address_path = path;
                });
            }
            Err(ClientError::Superseded) => debug!(url = %target, "summary superseded"),
            Err(e) => {
                warn!(url = %target, error = %e, "summary request failed");
                self.update(generation, |s| {
                    s.loading = false;
                    s.phase = Phase::Idle;
                });
            }
        }
        result
    }

    async fn stream_summary(&self, generation: u64, url: &str) -> Result<(), ClientError> {
        let mut response = self.client.open(url).await?;
        self.update(generation, |s| s.phase = Phase::Streaming);

        let mut decoder = Utf8Decoder::new();
        let mut received = 0usize;
        loop {
            match response.chunk().await {
                Ok(Some(bytes)) => {
                    received += bytes.len();
                    let text = decoder.decode(&bytes);
                    if !text.is_empty() {
                        self.update(generation, |s| s.summary.push_str(&text));
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // Indistinguishable from the end of the summary for the reader.
                    warn!(error = %e, received, "summary stream broke off");
                    break;
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            self.update(generation, |s| s.summary.push_str(&tail));
        }
        debug!(bytes = received, "summary stream finished");
        Ok(())
    }

    /// Cancels the previous submission and resets the buffer for a new one.
    ///
    /// The generation bump and the token swap happen under the `in_flight`
    /// lock, so the newest generation always owns the stored token.
    fn begin(&self) -> (u64, CancellationToken) {
        let mut in_flight = lock(&self.in_flight);

        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.summary.clear();
            s.notice = None;
            s.loading = false;
            s.phase = Phase::Idle;
        });

        let token = CancellationToken::new();
        if let Some((_, previous)) = in_flight.replace((generation, token.clone())) {
            previous.cancel();
        }
        (generation, token)
    }

    fn release(&self, generation: u64) {
        let mut in_flight = lock(&self.in_flight);
        if matches!(*in_flight, Some((current, _)) if current == generation) {
            *in_flight = None;
        }
    }

    /// Applies `apply` only while `generation` is still the latest submission.
    fn update(&self, generation: u64, apply: impl FnOnce(&mut SummaryState)) -> bool {
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            apply(s);
            true
        })
    }
}
