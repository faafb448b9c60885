use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Server-assigned image identifier. Stable across re-deliveries of the same image.
pub type ImageId = u64;

/// Where an image came from.
///
/// Unrecognized tags are kept verbatim so the card title can still show them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    /// NVR camera feed (`frigate`). The only source that carries camera/label/zone badges.
    CameraFeed,
    /// Manual upload through the web UI.
    ManualUpload,
    Webcam,
    #[default]
    Other,
    Unknown(String),
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::CameraFeed => "frigate",
            Source::ManualUpload => "upload",
            Source::Webcam => "webcam",
            Source::Other => "other",
            Source::Unknown(tag) => tag,
        }
    }
}

impl From<String> for Source {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "frigate" => Source::CameraFeed,
            "upload" => Source::ManualUpload,
            "webcam" => Source::Webcam,
            "other" | "" => Source::Other,
            _ => Source::Unknown(tag),
        }
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.as_str().to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera-feed event kind (`event_type` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    New,
    Update,
    Other(String),
}

impl From<String> for EventKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "new" => EventKind::New,
            "update" => EventKind::Update,
            _ => EventKind::Other(kind),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::New => "new".to_string(),
            EventKind::Update => "update".to_string(),
            EventKind::Other(kind) => kind,
        }
    }
}

/// A recognized identity for one of the faces in an image.
///
/// Leaner server builds send bare identity names; those read with confidence 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MatchWire")]
pub struct Match {
    pub identity: String,
    /// Recognition confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MatchWire {
    Name(String),
    Full {
        identity: String,
        #[serde(default)]
        confidence: f64,
    },
}

impl From<MatchWire> for Match {
    fn from(wire: MatchWire) -> Self {
        match wire {
            MatchWire::Name(identity) => Self {
                identity,
                confidence: 0.0,
            },
            MatchWire::Full {
                identity,
                confidence,
            } => Self {
                identity,
                confidence,
            },
        }
    }
}

/// One image/detection record as pushed over the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub id: ImageId,
    #[serde(default)]
    pub source: Source,
    #[serde(default, deserialize_with = "non_empty")]
    pub camera: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub zone: Option<String>,
    #[serde(default, rename = "event_type", deserialize_with = "non_empty_kind")]
    pub event_kind: Option<EventKind>,
    /// Upstream NVR event id, when the image belongs to one.
    #[serde(default, deserialize_with = "non_empty")]
    pub event_id: Option<String>,
    #[serde(default, rename = "faces_count")]
    pub face_count: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub matches: Vec<Match>,
    /// Pre-rendered URL; wins over `file_path` when present.
    #[serde(default, deserialize_with = "non_empty")]
    pub snapshot_url: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DetectionEvent {
    /// Minimal event with everything optional left empty.
    pub fn new(id: ImageId, source: Source) -> Self {
        Self {
            id,
            source,
            camera: None,
            label: None,
            zone: None,
            event_kind: None,
            event_id: None,
            face_count: 0,
            matches: Vec::new(),
            snapshot_url: None,
            file_path: None,
            timestamp: None,
        }
    }

    pub fn has_faces(&self) -> bool {
        self.face_count > 0
    }

    pub fn is_recognized(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Sub-collection this event belongs in right now.
    pub fn collection(&self) -> Collection {
        Collection::for_face_count(self.face_count)
    }
}

/// One of the two bounded display groups of the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    HasFaces,
    NoFaces,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::HasFaces, Collection::NoFaces];

    pub fn for_face_count(face_count: u32) -> Self {
        if face_count > 0 {
            Collection::HasFaces
        } else {
            Collection::NoFaces
        }
    }

    /// Value of the `data-image-container` attribute selecting this collection.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::HasFaces => "has-faces",
            Collection::NoFaces => "no-faces",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Collection::HasFaces => 0,
            Collection::NoFaces => 1,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Go-style servers emit `""` for unset strings; treat those as absent.
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn non_empty_kind<'de, D>(deserializer: D) -> Result<Option<EventKind>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_empty(deserializer)?.map(EventKind::from))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tags_round_trip_unknown() {
        assert_eq!(Source::from("frigate".to_string()), Source::CameraFeed);
        assert_eq!(Source::from("".to_string()), Source::Other);
        let odd = Source::from("doorbell".to_string());
        assert_eq!(odd, Source::Unknown("doorbell".into()));
        assert_eq!(odd.as_str(), "doorbell");
    }

    #[test]
    fn test_event_decodes_go_style_empties() {
        let json = r#"{
            "id": 7,
            "file_path": "",
            "snapshot_url": "",
            "timestamp": "2024-05-01T10:15:00+02:00",
            "faces_count": 0,
            "source": "frigate",
            "matches": null,
            "camera": "",
            "event_type": ""
        }"#;
        let event: DetectionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.source, Source::CameraFeed);
        assert!(event.camera.is_none());
        assert!(event.event_kind.is_none());
        assert!(event.snapshot_url.is_none());
        assert!(event.matches.is_empty());
        assert_eq!(
            event.timestamp.unwrap().to_rfc3339(),
            "2024-05-01T08:15:00+00:00"
        );
    }

    #[test]
    fn test_event_defaults_when_fields_missing() {
        let event: DetectionEvent = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(event, DetectionEvent::new(3, Source::Other));
        assert_eq!(event.collection(), Collection::NoFaces);
    }

    #[test]
    fn test_event_requires_id() {
        assert!(serde_json::from_str::<DetectionEvent>(r#"{"faces_count": 1}"#).is_err());
    }

    #[test]
    fn test_collection_for_face_count() {
        assert_eq!(Collection::for_face_count(0), Collection::NoFaces);
        assert_eq!(Collection::for_face_count(3), Collection::HasFaces);
        assert_eq!(Collection::HasFaces.as_str(), "has-faces");
    }
}
