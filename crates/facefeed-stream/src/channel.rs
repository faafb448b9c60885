//! Reconnecting event-stream connection.
//!
//! Mirrors what a browser `EventSource` does on its own: when the connection
//! drops it waits the reconnection delay (server-adjustable via `retry:`)
//! and reconnects, sending `Last-Event-ID`. Events published while
//! disconnected are lost; nothing is queued on this side.

use crate::sse::{SseDecoder, DEFAULT_EVENT};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

/// Reconnection delay used until the server sends `retry:`.
pub const DEFAULT_RETRY: Duration = Duration::from_millis(3000);

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
}

enum Flow {
    /// Server closed the stream.
    Ended,
    /// Nobody is listening any more.
    ReceiverGone,
}

pub struct EventChannel {
    client: reqwest::Client,
    url: Url,
    retry: Duration,
}

impl EventChannel {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self {
            client,
            url,
            retry: DEFAULT_RETRY,
        }
    }

    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Forward `message` payloads into `tx` until the receiving side goes away.
    pub async fn run(mut self, tx: mpsc::Sender<String>) {
        let mut decoder = SseDecoder::new();
        loop {
            match self.connect_once(&mut decoder, &tx).await {
                Ok(Flow::ReceiverGone) => break,
                Ok(Flow::Ended) => tracing::info!(url = %self.url, "event stream closed by server"),
                Err(err) => tracing::warn!(url = %self.url, error = %err, "event stream failed"),
            }

            if let Some(retry) = decoder.take_retry() {
                self.retry = retry;
            }
            decoder.reset();

            tracing::debug!(delay_ms = self.retry.as_millis() as u64, "reconnecting event stream");
            tokio::select! {
                _ = tokio::time::sleep(self.retry) => {}
                _ = tx.closed() => break,
            }
        }
        tracing::debug!(url = %self.url, "event channel stopped");
    }

    async fn connect_once(
        &self,
        decoder: &mut SseDecoder,
        tx: &mpsc::Sender<String>,
    ) -> Result<Flow, ChannelError> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = decoder.last_event_id() {
            request = request.header("Last-Event-ID", id);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Status(status));
        }
        tracing::info!(url = %self.url, "event stream connected");

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for event in decoder.feed(&chunk) {
                if event.event != DEFAULT_EVENT {
                    tracing::debug!(event = %event.event, "ignoring non-message event");
                    continue;
                }
                if tx.send(event.data).await.is_err() {
                    return Ok(Flow::ReceiverGone);
                }
            }
        }
        Ok(Flow::Ended)
    }
}
