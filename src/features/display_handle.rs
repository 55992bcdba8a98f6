//! Revocable references to renderable image bytes.
//!
//! The registry is an arena: every [`DisplayHandle`] is an entry that stays
//! resolvable until it is released. Handles are not `Clone`: only the owner
//! can release one, explicitly or by dropping it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Entries = Mutex<HashMap<HandleKey, RenderableBytes>>;

/// The resolvable address of a handle, e.g. `trek-blob:17`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct HandleKey(String);

impl HandleKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes plus the type needed to render them.
#[derive(Debug, Clone)]
pub struct RenderableBytes {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
}

/// An owned entry in a [`HandleRegistry`]. Dropping it revokes the entry.
#[derive(Debug)]
pub struct DisplayHandle {
    key: HandleKey,
    entries: Weak<Entries>,
}

impl DisplayHandle {
    pub fn key(&self) -> &HandleKey {
        &self.key
    }
}

impl PartialEq for DisplayHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DisplayHandle {}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        // The registry may already be gone, taking every entry with it.
        if let Some(entries) = self.entries.upgrade() {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.key);
        }
    }
}

#[derive(Debug, Default)]
pub struct HandleRegistry {
    next_id: AtomicU64,
    entries: Arc<Entries>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<HandleKey, RenderableBytes>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, bytes: Arc<[u8]>, mime_type: impl Into<String>) -> DisplayHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let key = HandleKey(format!("trek-blob:{id}"));
        let entry = RenderableBytes {
            bytes,
            mime_type: mime_type.into(),
        };
        self.entries().insert(key.clone(), entry);
        DisplayHandle {
            key,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Looks up the bytes behind a key. Released keys resolve to `None`.
    pub fn resolve(&self, key: &HandleKey) -> Option<RenderableBytes> {
        self.entries().get(key).cloned()
    }

    /// Consumes the handle and revokes its key. Returns whether this registry
    /// held the entry; a handle from another registry is still revoked there.
    pub fn release(&self, handle: DisplayHandle) -> bool {
        let ours = Weak::ptr_eq(&handle.entries, &Arc::downgrade(&self.entries));
        let removed = ours && self.entries().remove(&handle.key).is_some();
        if !removed {
            tracing::warn!(key = %handle.key, "released a display handle that was not registered");
        }
        removed
    }

    pub fn live_count(&self) -> usize {
        self.entries().len()
    }
}
