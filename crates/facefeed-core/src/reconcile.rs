//! Reconciliation engine.
//!
//! Decides for each incoming event whether it becomes a new card, refreshes
//! an existing one in place, or moves it between collections; then keeps each
//! collection within its capacity. The engine is the only writer of the
//! [`ViewIndex`] and the only caller of [`GallerySurface`] mutations.

use crate::index::{ViewEntry, ViewIndex};
use crate::render::{render, Card};
use crate::timefmt::{Clock, LocalClock};
use crate::types::{Collection, DetectionEvent, ImageId};

/// Maximum number of cards per collection.
pub const DEFAULT_CAPACITY: usize = 12;

/// Where rendered cards end up. Positions are implied by call order:
/// `insert_front` and `move_to_front` always target position 0.
pub trait GallerySurface {
    /// Whether the container for `collection` exists on this surface.
    fn is_mounted(&self, collection: Collection) -> bool;
    fn insert_front(&mut self, collection: Collection, card: &Card);
    /// Replace the card's content without moving it.
    fn update(&mut self, collection: Collection, card: &Card);
    fn move_to_front(&mut self, from: Collection, to: Collection, card: &Card);
    fn remove(&mut self, collection: Collection, id: ImageId);
}

impl<S: GallerySurface + ?Sized> GallerySurface for &mut S {
    fn is_mounted(&self, collection: Collection) -> bool {
        (**self).is_mounted(collection)
    }
    fn insert_front(&mut self, collection: Collection, card: &Card) {
        (**self).insert_front(collection, card);
    }
    fn update(&mut self, collection: Collection, card: &Card) {
        (**self).update(collection, card);
    }
    fn move_to_front(&mut self, from: Collection, to: Collection, card: &Card) {
        (**self).move_to_front(from, to, card);
    }
    fn remove(&mut self, collection: Collection, id: ImageId) {
        (**self).remove(collection, id);
    }
}

/// What a single [`ReconcileEngine::reconcile`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Inserted {
        collection: Collection,
        evicted: Vec<ImageId>,
    },
    Updated {
        collection: Collection,
    },
    /// Re-delivery that would render identically; the surface was not touched.
    Unchanged {
        collection: Collection,
    },
    Relocated {
        from: Collection,
        to: Collection,
        evicted: Vec<ImageId>,
    },
    /// Target container is not mounted; nothing happened.
    Unmounted {
        collection: Collection,
    },
}

pub struct ReconcileEngine<S, C = LocalClock> {
    index: ViewIndex,
    surface: S,
    clock: C,
    capacity: usize,
}

impl<S: GallerySurface> ReconcileEngine<S, LocalClock> {
    pub fn new(surface: S) -> Self {
        Self::with_clock(surface, LocalClock)
    }
}

impl<S: GallerySurface, C: Clock> ReconcileEngine<S, C> {
    pub fn with_clock(surface: S, clock: C) -> Self {
        Self {
            index: ViewIndex::new(),
            surface,
            clock,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Override the per-collection capacity (at least 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn index(&self) -> &ViewIndex {
        &self.index
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Apply one event to the index and the surface.
    pub fn reconcile(&mut self, event: &DetectionEvent) -> ReconcileOutcome {
        let id = event.id;
        let target = event.collection();

        if !self.surface.is_mounted(target) {
            tracing::debug!(id, collection = %target, "container not mounted; skipping");
            return ReconcileOutcome::Unmounted { collection: target };
        }

        let card = render(event, &self.clock.now());

        let existing = self
            .index
            .get(id)
            .map(|entry| (entry.collection, entry.snapshot == card));

        match existing {
            None => {
                self.surface.insert_front(target, &card);
                self.index.insert_front(ViewEntry {
                    id,
                    collection: target,
                    snapshot: card,
                });
                tracing::debug!(id, collection = %target, "card inserted");
                let evicted = self.evict(target);
                ReconcileOutcome::Inserted {
                    collection: target,
                    evicted,
                }
            }
            Some((from, _)) if from != target => {
                self.surface.move_to_front(from, target, &card);
                self.index.relocate(id, target);
                self.index.set_snapshot(id, card);
                tracing::debug!(id, from = %from, to = %target, "card relocated");
                let evicted = self.evict(target);
                ReconcileOutcome::Relocated {
                    from,
                    to: target,
                    evicted,
                }
            }
            Some((_, true)) => ReconcileOutcome::Unchanged { collection: target },
            Some((_, false)) => {
                self.surface.update(target, &card);
                self.index.set_snapshot(id, card);
                tracing::debug!(id, collection = %target, "card updated in place");
                ReconcileOutcome::Updated { collection: target }
            }
        }
    }

    fn evict(&mut self, collection: Collection) -> Vec<ImageId> {
        self.index
            .evict_overflow(collection, self.capacity)
            .into_iter()
            .map(|entry| {
                self.surface.remove(collection, entry.id);
                tracing::debug!(id = entry.id, collection = %collection, "card evicted");
                entry.id
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::HtmlGallery;
    use crate::render::Badge;
    use crate::timefmt::FixedClock;
    use crate::types::{Match, Source};
    use chrono::DateTime;

    fn engine(gallery: HtmlGallery) -> ReconcileEngine<HtmlGallery, FixedClock> {
        let now = DateTime::parse_from_rfc3339("2024-05-01T12:00:00+00:00").unwrap();
        ReconcileEngine::with_clock(gallery, FixedClock(now))
    }

    fn event(id: ImageId, faces: u32) -> DetectionEvent {
        let mut e = DetectionEvent::new(id, Source::CameraFeed);
        e.face_count = faces;
        e
    }

    fn shown(engine: &ReconcileEngine<HtmlGallery, FixedClock>, c: Collection) -> Vec<ImageId> {
        engine.surface().ids(c)
    }

    #[test]
    fn test_new_event_goes_to_front() {
        let mut e = engine(HtmlGallery::new());
        e.reconcile(&event(1, 1));
        e.reconcile(&event(2, 3));
        assert_eq!(shown(&e, Collection::HasFaces), vec![2, 1]);
        assert_eq!(e.index().position(2), Some(0));
        assert_eq!(e.index().position(1), Some(1));
    }

    #[test]
    fn test_same_event_twice_is_idempotent() {
        let mut e = engine(HtmlGallery::new());
        e.reconcile(&event(1, 0));
        e.reconcile(&event(2, 0));
        let html = e.surface().to_html();

        assert_eq!(
            e.reconcile(&event(1, 0)),
            ReconcileOutcome::Unchanged { collection: Collection::NoFaces }
        );
        assert_eq!(e.index().len(), 2);
        assert_eq!(e.index().position(1), Some(1));
        assert_eq!(e.surface().to_html(), html);
    }

    #[test]
    fn test_update_in_place_keeps_position() {
        let mut e = engine(HtmlGallery::new());
        e.reconcile(&event(1, 1));
        e.reconcile(&event(2, 1));

        let mut refreshed = event(1, 2);
        refreshed.snapshot_url = Some("/new.jpg".into());
        assert_eq!(
            e.reconcile(&refreshed),
            ReconcileOutcome::Updated { collection: Collection::HasFaces }
        );
        assert_eq!(shown(&e, Collection::HasFaces), vec![2, 1]);
        let entry = e.index().get(1).unwrap();
        assert_eq!(entry.snapshot.image_path, "/new.jpg");
        assert_eq!(entry.snapshot.badges, vec![Badge::FaceCount(2)]);
    }

    #[test]
    fn test_relocates_when_faces_appear() {
        let mut e = engine(HtmlGallery::new());
        e.reconcile(&event(1, 0));
        e.reconcile(&event(2, 0));
        e.reconcile(&event(3, 1));

        let mut update = event(1, 2);
        update.matches = vec![Match { identity: "Alice".into(), confidence: 0.93 }];
        assert_eq!(
            e.reconcile(&update),
            ReconcileOutcome::Relocated {
                from: Collection::NoFaces,
                to: Collection::HasFaces,
                evicted: vec![],
            }
        );
        assert_eq!(shown(&e, Collection::NoFaces), vec![2]);
        assert_eq!(shown(&e, Collection::HasFaces), vec![1, 3]);
        assert_eq!(
            e.index().get(1).unwrap().snapshot.badges,
            vec![Badge::FaceCount(2), Badge::Recognized]
        );
    }

    #[test]
    fn test_thirteenth_insert_evicts_first() {
        let mut e = engine(HtmlGallery::new());
        for id in 1..=12 {
            e.reconcile(&event(id, 1));
        }
        assert_eq!(
            e.reconcile(&event(13, 1)),
            ReconcileOutcome::Inserted {
                collection: Collection::HasFaces,
                evicted: vec![1],
            }
        );
        assert_eq!(shown(&e, Collection::HasFaces), (2..=13).rev().collect::<Vec<_>>());
        assert!(!e.index().contains(1));
        assert_eq!(e.index().len_of(Collection::HasFaces), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_eviction_is_per_collection() {
        let mut e = engine(HtmlGallery::new()).with_capacity(2);
        e.reconcile(&event(1, 0));
        e.reconcile(&event(2, 1));
        e.reconcile(&event(3, 1));
        e.reconcile(&event(4, 1));
        assert_eq!(shown(&e, Collection::HasFaces), vec![4, 3]);
        assert_eq!(shown(&e, Collection::NoFaces), vec![1]);
    }

    #[test]
    fn test_relocation_into_full_collection_evicts_oldest() {
        let mut e = engine(HtmlGallery::new()).with_capacity(2);
        e.reconcile(&event(1, 0));
        e.reconcile(&event(2, 1));
        e.reconcile(&event(3, 1));
        assert_eq!(
            e.reconcile(&event(1, 1)),
            ReconcileOutcome::Relocated {
                from: Collection::NoFaces,
                to: Collection::HasFaces,
                evicted: vec![2],
            }
        );
        assert_eq!(shown(&e, Collection::HasFaces), vec![1, 3]);
        assert!(shown(&e, Collection::NoFaces).is_empty());
    }

    #[test]
    fn test_unmounted_container_is_noop() {
        let mut e = engine(HtmlGallery::with_mounts(&[Collection::NoFaces]));
        assert_eq!(
            e.reconcile(&event(1, 2)),
            ReconcileOutcome::Unmounted { collection: Collection::HasFaces }
        );
        assert!(e.index().is_empty());
        assert!(matches!(e.reconcile(&event(2, 0)), ReconcileOutcome::Inserted { .. }));
    }

    #[test]
    fn test_timestamp_never_reorders() {
        let mut e = engine(HtmlGallery::new());
        let mut late = event(1, 1);
        late.timestamp = Some("2024-05-01T11:00:00Z".parse().unwrap());
        let mut early = event(2, 1);
        early.timestamp = Some("2024-05-01T09:00:00Z".parse().unwrap());
        e.reconcile(&late);
        e.reconcile(&early);
        assert_eq!(shown(&e, Collection::HasFaces), vec![2, 1]);
    }

    #[test]
    fn test_membership_matches_last_face_count() {
        let mut e = engine(HtmlGallery::new()).with_capacity(3);
        let script = [(1, 0), (2, 1), (1, 1), (3, 0), (2, 0), (4, 2), (5, 3), (6, 1), (1, 0)];
        let mut last = std::collections::HashMap::new();
        for (id, faces) in script {
            e.reconcile(&event(id, faces));
            last.insert(id, faces);
        }
        for c in Collection::ALL {
            assert!(e.index().len_of(c) <= 3);
            for id in e.index().ids(c) {
                assert_eq!(Collection::for_face_count(last[&id]), c);
            }
            assert_eq!(shown(&e, c), e.index().ids(c).collect::<Vec<_>>());
        }
    }
}
