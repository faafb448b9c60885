//! Notification sink: a bounded stack of auto-dismissing toasts.

use crate::notify::Notification;
use crate::render::escape_html;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Anything that can present a [`Notification`] to the user.
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

impl<S: NotificationSink + ?Sized> NotificationSink for &mut S {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Sink that keeps every notification. Handy for tests and offline replay.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub received: Vec<Notification>,
}

impl NotificationSink for CollectingSink {
    fn notify(&mut self, notification: Notification) {
        self.received.push(notification);
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: Uuid,
    pub notification: Notification,
    pub shown_at: Instant,
}

/// Newest-first stack of toasts, dismissed after `ttl` or when pushed out by newer ones.
#[derive(Debug)]
pub struct ToastStack {
    toasts: VecDeque<Toast>,
    ttl: Duration,
    limit: usize,
}

impl ToastStack {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5);
    pub const DEFAULT_LIMIT: usize = 5;

    pub fn new(ttl: Duration, limit: usize) -> Self {
        Self {
            toasts: VecDeque::new(),
            ttl,
            limit: limit.max(1),
        }
    }

    /// Show `notification` as of `now`; returns the new toast's id.
    pub fn push_at(&mut self, notification: Notification, now: Instant) -> Uuid {
        let id = Uuid::new_v4();
        self.toasts.push_front(Toast {
            id,
            notification,
            shown_at: now,
        });
        while self.toasts.len() > self.limit {
            self.toasts.pop_back();
        }
        id
    }

    /// Drop toasts whose display time has elapsed. Returns how many were dismissed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        let ttl = self.ttl;
        self.toasts
            .retain(|t| now.saturating_duration_since(t.shown_at) < ttl);
        before - self.toasts.len()
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        before != self.toasts.len()
    }

    /// Visible toasts, newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::from(r#"<div class="toast-container position-fixed top-0 end-0 p-3">"#);
        for toast in &self.toasts {
            let n = &toast.notification;
            out.push_str(&format!(
                r#"<div class="toast show text-bg-{}" role="alert" data-toast-id="{}"><div class="toast-header"><strong class="me-auto">{}</strong></div><div class="toast-body">{}</div></div>"#,
                n.severity,
                toast.id,
                escape_html(&n.title),
                escape_html(&n.message),
            ));
        }
        out.push_str("</div>");
        out
    }
}

impl Default for ToastStack {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL, Self::DEFAULT_LIMIT)
    }
}

impl NotificationSink for ToastStack {
    fn notify(&mut self, notification: Notification) {
        tracing::debug!(
            title = %notification.title,
            severity = %notification.severity,
            "toast shown"
        );
        self.push_at(notification, Instant::now());
    }
}
