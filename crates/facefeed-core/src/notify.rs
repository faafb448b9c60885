//! Notification formatting for incoming detection events.

use crate::types::{DetectionEvent, EventKind, Source};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing message, independent of gallery state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }
}

pub const GENERIC_TITLE: &str = "New image";
pub const GENERIC_MESSAGE: &str = "New image detected";

/// Human label for a source tag.
pub fn source_title(source: &Source) -> &'static str {
    match source {
        Source::CameraFeed => "Frigate",
        Source::ManualUpload => "Upload",
        Source::Webcam => "Webcam",
        Source::Other => "Other source",
        Source::Unknown(_) => GENERIC_TITLE,
    }
}

/// Build the notification for `event`. Deterministic in its input.
pub fn format_notification(event: &DetectionEvent) -> Notification {
    let camera_feed = event.source == Source::CameraFeed;

    let mut title = source_title(&event.source).to_string();
    let mut message = GENERIC_MESSAGE.to_string();
    let mut severity = Severity::Info;

    if camera_feed {
        if let Some(label) = &event.label {
            title = format!("{title}: {label}");
        }
    }

    if let Some(camera) = &event.camera {
        message = format!("Camera: {camera}");
        if let Some(zone) = &event.zone {
            message.push_str(&format!(", Zone: {zone}"));
        }
    }

    if camera_feed {
        match event.event_kind {
            Some(EventKind::New) => severity = Severity::Warning,
            Some(EventKind::Update) => severity = Severity::Info,
            _ => {}
        }
    }

    if event.has_faces() {
        let noun = if event.face_count == 1 { "face" } else { "faces" };
        message.push_str(&format!(", {} {noun} detected", event.face_count));
    }

    // Matches override any severity set above.
    if event.is_recognized() {
        let names: Vec<&str> = event.matches.iter().map(|m| m.identity.as_str()).collect();
        message.push_str(&format!(": {}", names.join(", ")));
        severity = Severity::Success;
    }

    Notification {
        title,
        message,
        severity,
    }
}
