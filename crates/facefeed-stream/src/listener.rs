//! Stream listener: one subscription, one consumer, strict delivery order.
//!
//! The channel task decodes frames and hands payloads over a bounded queue to
//! a single consumer task that owns the [`MessageHandler`]. The handler state
//! (gallery, toasts) is never shared, so it needs no locking.

use crate::channel::EventChannel;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Payloads buffered between the channel and the consumer.
pub const DEFAULT_BUFFER: usize = 64;

/// Receives raw `message` payloads in delivery order.
pub trait MessageHandler: Send + 'static {
    fn handle(&mut self, payload: &str);
}

impl<F> MessageHandler for F
where
    F: FnMut(&str) + Send + 'static,
{
    fn handle(&mut self, payload: &str) {
        self(payload)
    }
}

/// Handle to a running listener. Dropping it stops the listener as well.
pub struct ListenerHandle<H> {
    shutdown: watch::Sender<bool>,
    consumer: JoinHandle<H>,
}

impl<H> ListenerHandle<H> {
    /// Stop listening and hand the handler back.
    pub async fn shutdown(self) -> Result<H, tokio::task::JoinError> {
        let _ = self.shutdown.send(true);
        self.consumer.await
    }
}

/// Subscribe via `channel` and feed every payload to `handler`.
pub fn spawn_listener<H: MessageHandler>(
    channel: EventChannel,
    handler: H,
    buffer: usize,
) -> ListenerHandle<H> {
    let (tx, mut rx) = mpsc::channel::<String>(buffer.max(1));
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tracing::info!(url = %channel.url(), "starting stream listener");
    let channel_task = tokio::spawn(channel.run(tx));

    let consumer = tokio::spawn(async move {
        let mut handler = handler;
        loop {
            tokio::select! {
                payload = rx.recv() => match payload {
                    Some(payload) => handler.handle(&payload),
                    None => break,
                },
                _ = shutdown_rx.changed() => break,
            }
        }
        channel_task.abort();
        tracing::info!("stream listener stopped");
        handler
    });

    ListenerHandle {
        shutdown: shutdown_tx,
        consumer,
    }
}
