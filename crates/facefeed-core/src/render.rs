//! Card renderer: pure projection of a [`DetectionEvent`] into a gallery card.

use crate::timefmt::timestamp_label;
use crate::types::{DetectionEvent, ImageId, Source};
use chrono::{DateTime, FixedOffset};
use std::fmt::Write as _;

/// URL prefix under which the server publishes snapshot files.
pub const SNAPSHOT_PREFIX: &str = "/snapshots/";
/// Placeholder image shown when no path is known or the image fails to load.
pub const UNAVAILABLE_IMAGE: &str = "/static/img/no-image.png";

/// A badge on a card. The order of [`badges`] output is the display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Badge {
    FaceCount(u32),
    Recognized,
    Camera(String),
    Label(String),
    Zone(String),
}

impl Badge {
    pub fn text(&self) -> String {
        match self {
            Badge::FaceCount(1) => "1 face".to_string(),
            Badge::FaceCount(n) => format!("{n} faces"),
            Badge::Recognized => "Recognized".to_string(),
            Badge::Camera(s) | Badge::Label(s) | Badge::Zone(s) => s.clone(),
        }
    }

    fn css_class(&self) -> &'static str {
        match self {
            Badge::FaceCount(_) => "badge bg-info",
            Badge::Recognized => "badge bg-success",
            Badge::Camera(_) => "badge bg-primary",
            Badge::Label(_) => "badge bg-secondary",
            Badge::Zone(_) => "badge bg-warning text-dark",
        }
    }
}

/// Rendered card contents. Two cards compare equal iff they would display identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: ImageId,
    pub title: String,
    pub image_path: String,
    pub badges: Vec<Badge>,
    pub timestamp_label: String,
}

impl Card {
    pub fn detail_href(&self) -> String {
        format!("/images/{}", self.id)
    }

    /// HTML fragment for this card, including the load-failure fallback.
    pub fn to_html(&self) -> String {
        let mut badges = String::new();
        for (i, badge) in self.badges.iter().enumerate() {
            if i > 0 {
                badges.push(' ');
            }
            let _ = write!(
                badges,
                r#"<span class="{}">{}</span>"#,
                badge.css_class(),
                escape_html(&badge.text())
            );
        }

        format!(
            concat!(
                r#"<div class="col-md-3 mb-4" data-image-col="{id}">"#,
                r#"<div class="card image-card" data-image-id="{id}">"#,
                r#"<a href="{href}">"#,
                r#"<img src="{src}" class="image-thumbnail" alt="Image" onerror="this.onerror=null; this.src='{fallback}';">"#,
                r#"</a>"#,
                r#"<div class="card-body">"#,
                r#"<div class="d-flex justify-content-between">"#,
                r#"<h6 class="card-title">{title}</h6>"#,
                r#"<small class="text-muted">{time}</small>"#,
                r#"</div>"#,
                r#"<div class="mt-2">{badges}</div>"#,
                r#"</div></div></div>"#,
            ),
            id = self.id,
            href = self.detail_href(),
            src = escape_html(&self.image_path),
            fallback = UNAVAILABLE_IMAGE,
            title = escape_html(&self.title),
            time = escape_html(&self.timestamp_label),
            badges = badges,
        )
    }
}

/// Render the card for `event`, labelling its timestamp relative to `now`.
pub fn render(event: &DetectionEvent, now: &DateTime<FixedOffset>) -> Card {
    Card {
        id: event.id,
        title: event.source.as_str().to_string(),
        image_path: resolve_image_path(event),
        badges: badges(event),
        timestamp_label: timestamp_label(event.timestamp.as_ref(), now),
    }
}

/// Resolve the display path: snapshot URL, else prefixed file path, else the placeholder.
pub fn resolve_image_path(event: &DetectionEvent) -> String {
    if let Some(url) = event.snapshot_url.as_deref().filter(|s| !s.trim().is_empty()) {
        return url.to_string();
    }
    match event.file_path.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(path) => normalize_snapshot_path(path),
        None => {
            tracing::debug!(id = event.id, "no image path; using placeholder");
            UNAVAILABLE_IMAGE.to_string()
        }
    }
}

/// Prefix `path` with [`SNAPSHOT_PREFIX`] exactly once.
pub fn normalize_snapshot_path(path: &str) -> String {
    let relative = path.trim_start_matches('/');
    let relative = relative
        .strip_prefix(SNAPSHOT_PREFIX.trim_start_matches('/'))
        .unwrap_or(relative);
    format!("{SNAPSHOT_PREFIX}{relative}")
}

/// Badges in display order: faces, recognized, then camera/label/zone for camera feeds.
pub fn badges(event: &DetectionEvent) -> Vec<Badge> {
    let mut out = Vec::new();
    if event.has_faces() {
        out.push(Badge::FaceCount(event.face_count));
    }
    if event.is_recognized() {
        out.push(Badge::Recognized);
    }
    if event.source == Source::CameraFeed {
        if let Some(camera) = &event.camera {
            out.push(Badge::Camera(camera.clone()));
        }
        if let Some(label) = &event.label {
            out.push(Badge::Label(label.clone()));
        }
        if let Some(zone) = &event.zone {
            out.push(Badge::Zone(zone.clone()));
        }
    }
    out
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Match;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00+00:00").unwrap()
    }

    fn event(id: ImageId) -> DetectionEvent {
        DetectionEvent::new(id, Source::CameraFeed)
    }

    #[test]
    fn test_path_prefers_snapshot_url() {
        let mut e = event(1);
        e.snapshot_url = Some("x.jpg".into());
        e.file_path = Some("a.jpg".into());
        assert_eq!(resolve_image_path(&e), "x.jpg");
    }

    #[test]
    fn test_path_falls_back_to_prefixed_file_path() {
        let mut e = event(1);
        e.snapshot_url = Some("".into());
        e.file_path = Some("a.jpg".into());
        assert_eq!(resolve_image_path(&e), "/snapshots/a.jpg");
    }

    #[test]
    fn test_path_prefix_never_duplicated() {
        assert_eq!(normalize_snapshot_path("/snapshots/a.jpg"), "/snapshots/a.jpg");
        assert_eq!(normalize_snapshot_path("/cam/a.jpg"), "/snapshots/cam/a.jpg");
        assert_eq!(normalize_snapshot_path("snapshots/a.jpg"), "/snapshots/a.jpg");
        assert_eq!(normalize_snapshot_path("snapshots-old/a.jpg"), "/snapshots/snapshots-old/a.jpg");
    }

    #[test]
    fn test_path_sentinel_when_nothing_known() {
        assert_eq!(resolve_image_path(&event(1)), UNAVAILABLE_IMAGE);
    }

    #[test]
    fn test_badge_order() {
        let mut e = event(1);
        e.face_count = 2;
        e.matches = vec![Match { identity: "Alice".into(), confidence: 0.9 }];
        e.camera = Some("front".into());
        e.label = Some("person".into());
        e.zone = Some("porch".into());
        assert_eq!(
            badges(&e),
            vec![
                Badge::FaceCount(2),
                Badge::Recognized,
                Badge::Camera("front".into()),
                Badge::Label("person".into()),
                Badge::Zone("porch".into()),
            ]
        );
    }

    #[test]
    fn test_source_badges_only_for_camera_feed() {
        let mut e = DetectionEvent::new(1, Source::ManualUpload);
        e.camera = Some("front".into());
        assert!(badges(&e).is_empty());
    }

    #[test]
    fn test_render_is_repeatable() {
        let mut e = event(5);
        e.face_count = 1;
        assert_eq!(render(&e, &now()), render(&e, &now()));
        assert_eq!(render(&e, &now()).badges[0].text(), "1 face");
    }

    #[test]
    fn test_html_declares_fallback_and_escapes() {
        let mut e = event(9);
        e.camera = Some("<garage>".into());
        let html = render(&e, &now()).to_html();
        assert!(html.contains(r#"data-image-id="9""#));
        assert!(html.contains("this.src='/static/img/no-image.png'"));
        assert!(html.contains("&lt;garage&gt;"));
        assert!(!html.contains("<garage>"));
        assert!(html.contains(r#"href="/images/9""#));
    }
}
