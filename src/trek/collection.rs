use crate::features::display_handle::HandleRegistry;
use crate::trek::structs::{PhotoId, PhotoSummary, TrekPhoto};
use std::sync::Arc;

/// Insertion-ordered set of photos. It is also the arena for their display
/// handles: a handle is released exactly when its photo leaves the collection.
#[derive(Debug)]
pub struct TrekCollection {
    photos: Vec<TrekPhoto>,
    registry: Arc<HandleRegistry>,
}

impl TrekCollection {
    pub fn new(registry: Arc<HandleRegistry>) -> Self {
        Self {
            photos: Vec::new(),
            registry,
        }
    }

    pub fn photos(&self) -> &[TrekPhoto] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn contains(&self, id: &PhotoId) -> bool {
        self.photos.iter().any(|photo| &photo.id == id)
    }

    pub fn get(&self, id: &PhotoId) -> Option<&TrekPhoto> {
        self.photos.iter().find(|photo| &photo.id == id)
    }

    pub fn summaries(&self) -> Vec<PhotoSummary> {
        self.photos.iter().map(PhotoSummary::from).collect()
    }

    /// Appends a batch. Photos whose id is already present are rejected and
    /// their handles released; the ids that were actually added are returned.
    pub fn append(&mut self, batch: Vec<TrekPhoto>) -> Vec<PhotoId> {
        let mut added = Vec::with_capacity(batch.len());
        for photo in batch {
            if self.contains(&photo.id) {
                tracing::warn!(id = %photo.id, "duplicate photo id rejected");
                self.registry.release(photo.display_handle);
                continue;
            }
            added.push(photo.id.clone());
            self.photos.push(photo);
        }
        added
    }

    /// Removes one photo and releases its display handle.
    pub fn remove(&mut self, id: &PhotoId) -> bool {
        let Some(index) = self.photos.iter().position(|photo| &photo.id == id) else {
            return false;
        };
        let photo = self.photos.remove(index);
        self.registry.release(photo.display_handle);
        true
    }

    /// Removes every photo and releases every handle. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.photos.len();
        for photo in self.photos.drain(..) {
            self.registry.release(photo.display_handle);
        }
        removed
    }
}

impl Drop for TrekCollection {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(registry: &HandleRegistry, id: &str) -> TrekPhoto {
        TrekPhoto {
            id: PhotoId::from(id),
            name: format!("{id}.jpg"),
            display_handle: registry.register(Arc::from(vec![0u8]), "image/jpeg"),
            inline_encoding: "AA==".to_string(),
            location: None,
            camera: None,
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let registry = Arc::new(HandleRegistry::new());
        let mut collection = TrekCollection::new(Arc::clone(&registry));

        collection.append(vec![photo(&registry, "b"), photo(&registry, "a")]);
        collection.append(vec![photo(&registry, "c")]);

        let names: Vec<&str> = collection.photos().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(registry.live_count(), 3);
    }

    #[test]
    fn test_duplicate_ids_are_rejected_and_released() {
        let registry = Arc::new(HandleRegistry::new());
        let mut collection = TrekCollection::new(Arc::clone(&registry));

        let added = collection.append(vec![photo(&registry, "a"), photo(&registry, "a")]);

        assert_eq!(added, vec![PhotoId::from("a")]);
        assert_eq!(collection.len(), 1);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_remove_releases_handle() {
        let registry = Arc::new(HandleRegistry::new());
        let mut collection = TrekCollection::new(Arc::clone(&registry));
        collection.append(vec![photo(&registry, "a"), photo(&registry, "b")]);
        let key = collection.get(&PhotoId::from("a")).unwrap().display_handle.key().clone();

        assert!(collection.remove(&PhotoId::from("a")));
        assert!(!collection.remove(&PhotoId::from("a")), "second removal is a no-op");

        assert!(registry.resolve(&key).is_none());
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_clear_releases_every_handle() {
        let registry = Arc::new(HandleRegistry::new());
        let mut collection = TrekCollection::new(Arc::clone(&registry));
        collection.append((0..5).map(|i| photo(&registry, &i.to_string())).collect());

        assert_eq!(collection.clear(), 5);
        assert!(collection.is_empty());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_drop_releases_handles() {
        let registry = Arc::new(HandleRegistry::new());
        {
            let mut collection = TrekCollection::new(Arc::clone(&registry));
            collection.append(vec![photo(&registry, "a")]);
        }
        assert_eq!(registry.live_count(), 0);
    }
}
