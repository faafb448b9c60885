//! facefeed-core: Live detection gallery engine.
//!
//! Turns a stream of image/detection records into a bounded, newest-first
//! gallery split into "has faces" and "no faces", plus one notification per
//! record. Pure and I/O free; transport lives in `facefeed-stream`.

pub mod dispatch;
pub mod gallery;
pub mod index;
pub mod notify;
pub mod reconcile;
pub mod render;
pub mod timefmt;
pub mod toast;
pub mod types;
pub mod wire;

pub use dispatch::{Dispatch, Dispatcher};
pub use gallery::HtmlGallery;
pub use index::{ViewEntry, ViewIndex};
pub use notify::{format_notification, Notification, Severity};
pub use reconcile::{GallerySurface, ReconcileEngine, ReconcileOutcome, DEFAULT_CAPACITY};
pub use render::{render, Badge, Card};
pub use timefmt::{Clock, FixedClock, LocalClock};
pub use toast::{CollectingSink, NotificationSink, ToastStack};
pub use types::{Collection, DetectionEvent, EventKind, ImageId, Match, Source};
