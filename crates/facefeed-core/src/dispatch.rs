//! Single entry point for stream messages.
//!
//! Notification runs before reconciliation and does not look at its result,
//! so a toast still appears when the gallery is not mounted.

use crate::notify::{format_notification, Notification};
use crate::reconcile::{GallerySurface, ReconcileEngine, ReconcileOutcome};
use crate::timefmt::{Clock, LocalClock};
use crate::toast::NotificationSink;
use crate::types::{DetectionEvent, ImageId};
use crate::wire::{self, Payload};

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Applied {
        id: ImageId,
        notification: Notification,
        outcome: ReconcileOutcome,
    },
    Skipped(String),
    /// Payload could not be decoded and was dropped.
    Dropped,
}

pub struct Dispatcher<S, N, C = LocalClock> {
    engine: ReconcileEngine<S, C>,
    sink: N,
}

impl<S, N, C> Dispatcher<S, N, C>
where
    S: GallerySurface,
    N: NotificationSink,
    C: Clock,
{
    pub fn new(engine: ReconcileEngine<S, C>, sink: N) -> Self {
        Self { engine, sink }
    }

    pub fn engine(&self) -> &ReconcileEngine<S, C> {
        &self.engine
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    /// Decode one raw stream payload and apply it. Never fails; bad input is logged and dropped.
    pub fn handle_message(&mut self, payload: &str) -> Dispatch {
        match wire::decode(payload) {
            Ok(Payload::Event(event)) => self.handle_event(&event),
            Ok(Payload::Skipped(kind)) => {
                tracing::debug!(kind = %kind, "ignoring non-image stream message");
                Dispatch::Skipped(kind)
            }
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed stream payload");
                Dispatch::Dropped
            }
        }
    }

    pub fn handle_event(&mut self, event: &DetectionEvent) -> Dispatch {
        let notification = format_notification(event);
        self.sink.notify(notification.clone());
        let outcome = self.engine.reconcile(event);
        tracing::debug!(id = event.id, event_id = ?event.event_id, outcome = ?outcome, "event dispatched");
        Dispatch::Applied {
            id: event.id,
            notification,
            outcome,
        }
    }
}
