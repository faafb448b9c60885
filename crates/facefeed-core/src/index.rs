//! View index: which image is shown where.
//!
//! One ordered sequence per [`Collection`] (front = most recent) plus a map
//! from id to entry. Positions are never stored; they are read off the
//! sequence, so moving or evicting one entry needs no bookkeeping for the rest.

use crate::render::Card;
use crate::types::{Collection, ImageId};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub id: ImageId,
    pub collection: Collection,
    /// Card as last pushed to the surface.
    pub snapshot: Card,
}

#[derive(Debug, Default)]
pub struct ViewIndex {
    entries: HashMap<ImageId, ViewEntry>,
    order: [VecDeque<ImageId>; 2],
}

impl ViewIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ImageId) -> Option<&ViewEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len_of(&self, collection: Collection) -> usize {
        self.order[collection.slot()].len()
    }

    /// Ids in `collection`, most recent first.
    pub fn ids(&self, collection: Collection) -> impl Iterator<Item = ImageId> + '_ {
        self.order[collection.slot()].iter().copied()
    }

    /// Ordinal of `id` within its collection (0 = most recent).
    pub fn position(&self, id: ImageId) -> Option<usize> {
        let entry = self.entries.get(&id)?;
        self.order[entry.collection.slot()]
            .iter()
            .position(|&other| other == id)
    }

    /// Insert a previously unseen entry at the front of its collection.
    pub(crate) fn insert_front(&mut self, entry: ViewEntry) {
        debug_assert!(!self.entries.contains_key(&entry.id));
        self.order[entry.collection.slot()].push_front(entry.id);
        self.entries.insert(entry.id, entry);
    }

    pub(crate) fn set_snapshot(&mut self, id: ImageId, snapshot: Card) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.snapshot = snapshot;
        }
    }

    /// Move `id` to the front of `to`. Returns the collection it left.
    pub(crate) fn relocate(&mut self, id: ImageId, to: Collection) -> Option<Collection> {
        let entry = self.entries.get_mut(&id)?;
        let from = entry.collection;
        let old = &mut self.order[from.slot()];
        if let Some(pos) = old.iter().position(|&other| other == id) {
            old.remove(pos);
        }
        entry.collection = to;
        self.order[to.slot()].push_front(id);
        Some(from)
    }

    /// Pop the oldest entry of `collection` while it holds more than `capacity`.
    pub(crate) fn evict_overflow(&mut self, collection: Collection, capacity: usize) -> Vec<ViewEntry> {
        let mut evicted = Vec::new();
        while self.order[collection.slot()].len() > capacity {
            let Some(id) = self.order[collection.slot()].pop_back() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&id) {
                evicted.push(entry);
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: ImageId, collection: Collection) -> ViewEntry {
        ViewEntry {
            id,
            collection,
            snapshot: Card {
                id,
                title: "other".into(),
                image_path: String::new(),
                badges: Vec::new(),
                timestamp_label: String::new(),
            },
        }
    }

    #[test]
    fn test_positions_follow_insert_order() {
        let mut index = ViewIndex::new();
        index.insert_front(entry(1, Collection::NoFaces));
        index.insert_front(entry(2, Collection::NoFaces));
        assert_eq!(index.position(2), Some(0));
        assert_eq!(index.position(1), Some(1));
        assert_eq!(index.position(3), None);
    }

    #[test]
    fn test_relocate_shifts_remaining() {
        let mut index = ViewIndex::new();
        for id in 1..=3 {
            index.insert_front(entry(id, Collection::NoFaces));
        }
        assert_eq!(index.relocate(2, Collection::HasFaces), Some(Collection::NoFaces));
        assert_eq!(index.ids(Collection::NoFaces).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(index.ids(Collection::HasFaces).collect::<Vec<_>>(), vec![2]);
        assert_eq!(index.get(2).unwrap().collection, Collection::HasFaces);
        assert_eq!(index.position(1), Some(1));
    }

    #[test]
    fn test_evict_overflow_drops_oldest() {
        let mut index = ViewIndex::new();
        for id in 1..=4 {
            index.insert_front(entry(id, Collection::HasFaces));
        }
        let evicted = index.evict_overflow(Collection::HasFaces, 3);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, 1);
        assert!(!index.contains(1));
        assert_eq!(index.len(), 3);
        assert!(index.evict_overflow(Collection::HasFaces, 3).is_empty());
    }
}
