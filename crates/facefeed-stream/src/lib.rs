//! facefeed-stream: Event stream subscription and server collaborators.
//!
//! Connects to the server's Server-Sent Events endpoint, decodes frames and
//! forwards `message` payloads to a single consumer. Also wraps the REST
//! endpoints used by the training workflow.

pub mod api;
pub mod channel;
pub mod listener;
pub mod sse;

pub use api::{ApiClient, ApiError, Identity, ImageDetail, TrainingRequest};
pub use channel::{ChannelError, EventChannel};
pub use listener::{spawn_listener, ListenerHandle, MessageHandler};
pub use sse::{SseDecoder, SseEvent};
