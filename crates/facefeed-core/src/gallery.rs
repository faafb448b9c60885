//! In-memory rendering surface that projects the gallery to HTML.

use crate::reconcile::GallerySurface;
use crate::render::Card;
use crate::types::{Collection, ImageId};
use std::collections::VecDeque;

/// Rendered fragments per collection, in display order.
///
/// A collection whose container is not mounted has no fragment list at all.
#[derive(Debug, Clone)]
pub struct HtmlGallery {
    columns: [Option<VecDeque<(ImageId, String)>>; 2],
}

impl HtmlGallery {
    /// Gallery with both containers mounted.
    pub fn new() -> Self {
        Self::with_mounts(&Collection::ALL)
    }

    pub fn with_mounts(mounted: &[Collection]) -> Self {
        let mut columns = [None, None];
        for collection in mounted {
            columns[collection.slot()] = Some(VecDeque::new());
        }
        Self { columns }
    }

    /// Ids currently displayed in `collection`, front first.
    pub fn ids(&self, collection: Collection) -> Vec<ImageId> {
        self.columns[collection.slot()]
            .as_ref()
            .map(|col| col.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    pub fn fragment(&self, collection: Collection, id: ImageId) -> Option<&str> {
        self.columns[collection.slot()]
            .as_ref()?
            .iter()
            .find(|(other, _)| *other == id)
            .map(|(_, html)| html.as_str())
    }

    /// Both containers as they would appear on the page.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for collection in Collection::ALL {
            let Some(col) = &self.columns[collection.slot()] else {
                continue;
            };
            out.push_str(&format!(
                r#"<div class="row" data-image-container="{}">"#,
                collection.as_str()
            ));
            for (_, html) in col {
                out.push_str(html);
            }
            out.push_str("</div>\n");
        }
        out
    }

    fn column_mut(&mut self, collection: Collection) -> Option<&mut VecDeque<(ImageId, String)>> {
        self.columns[collection.slot()].as_mut()
    }
}

impl Default for HtmlGallery {
    fn default() -> Self {
        Self::new()
    }
}

impl GallerySurface for HtmlGallery {
    fn is_mounted(&self, collection: Collection) -> bool {
        self.columns[collection.slot()].is_some()
    }

    fn insert_front(&mut self, collection: Collection, card: &Card) {
        if let Some(col) = self.column_mut(collection) {
            col.push_front((card.id, card.to_html()));
        }
    }

    fn update(&mut self, collection: Collection, card: &Card) {
        if let Some(col) = self.column_mut(collection) {
            if let Some(slot) = col.iter_mut().find(|(id, _)| *id == card.id) {
                slot.1 = card.to_html();
            }
        }
    }

    fn move_to_front(&mut self, from: Collection, to: Collection, card: &Card) {
        self.remove(from, card.id);
        self.insert_front(to, card);
    }

    fn remove(&mut self, collection: Collection, id: ImageId) {
        if let Some(col) = self.column_mut(collection) {
            col.retain(|(other, _)| *other != id);
        }
    }
}
