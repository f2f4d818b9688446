//! Display resources: blobs materialized as locally dereferenceable URLs
//!
//! A [`BlobResourceCell`] owns at most one [`BlobUrlGuard`]. Installing a
//! new blob drops the previous guard first, and the guard's `Drop` revokes
//! its URL, so every handle is released exactly once on every exit path,
//! including teardown of the cell itself.

use mirnet_api::Blob;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// URL scheme prefix issued by [`MemoryBlobRegistry`]
pub const BLOB_URL_PREFIX: &str = "blob:mirnet/";

/// Locally dereferenceable handle to a materialized blob
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayUrl(String);

impl DisplayUrl {
    /// Wrap a URL string
    #[inline]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// URL text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Materializes blobs as URLs and releases them.
pub trait BlobUrlFactory: Send + Sync + fmt::Debug {
    /// Materialize `blob` as a new URL. Any blob, including an empty one,
    /// can be materialized.
    fn create(&self, blob: &Blob) -> DisplayUrl;

    /// Release a URL. Releasing an unknown URL must not panic.
    fn revoke(&self, url: &DisplayUrl);
}

/// In-process blob URL registry
///
/// Keeps each blob until its URL is revoked and can resolve a live URL back
/// to the blob it stands for.
#[derive(Debug, Default)]
pub struct MemoryBlobRegistry {
    entries: Mutex<HashMap<DisplayUrl, Blob>>,
    created: AtomicU64,
    revoked: AtomicU64,
}

impl MemoryBlobRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blob behind a live URL
    #[must_use]
    pub fn resolve(&self, url: &DisplayUrl) -> Option<Blob> {
        self.entries.lock().get(url).cloned()
    }

    /// Number of URLs currently live
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Total URLs ever created
    #[inline]
    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Total URLs released
    #[inline]
    #[must_use]
    pub fn revoked_count(&self) -> u64 {
        self.revoked.load(Ordering::Relaxed)
    }
}

impl BlobUrlFactory for MemoryBlobRegistry {
    fn create(&self, blob: &Blob) -> DisplayUrl {
        let url = DisplayUrl(format!("{BLOB_URL_PREFIX}{}", Uuid::new_v4()));
        self.entries.lock().insert(url.clone(), blob.clone());
        self.created.fetch_add(1, Ordering::Relaxed);
        debug!(%url, bytes = blob.len(), "materialized blob");
        url
    }

    fn revoke(&self, url: &DisplayUrl) {
        if self.entries.lock().remove(url).is_some() {
            self.revoked.fetch_add(1, Ordering::Relaxed);
            debug!(%url, "revoked blob");
        } else {
            warn!(%url, "revoke of unknown blob url ignored");
        }
    }
}

/// Owns one live URL and revokes it on drop
#[derive(Debug)]
pub struct BlobUrlGuard {
    url: DisplayUrl,
    factory: Arc<dyn BlobUrlFactory>,
}

impl BlobUrlGuard {
    /// Materialize `blob` and take ownership of the resulting URL
    #[must_use]
    pub fn acquire(factory: Arc<dyn BlobUrlFactory>, blob: &Blob) -> Self {
        let url = factory.create(blob);
        Self { url, factory }
    }

    /// The guarded URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &DisplayUrl {
        &self.url
    }
}

impl Drop for BlobUrlGuard {
    fn drop(&mut self) {
        self.factory.revoke(&self.url);
    }
}

/// Holds zero or one display resource.
///
/// Dropping the cell releases whatever it holds.
#[derive(Debug)]
pub struct BlobResourceCell {
    factory: Arc<dyn BlobUrlFactory>,
    current: Option<BlobUrlGuard>,
}

impl BlobResourceCell {
    /// Create empty cell
    #[inline]
    #[must_use]
    pub fn new(factory: Arc<dyn BlobUrlFactory>) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    /// Replace the held resource.
    ///
    /// The previous handle is released before `blob` is materialized.
    pub fn install(&mut self, blob: Option<&Blob>) -> Option<DisplayUrl> {
        // Release first
        drop(self.current.take());

        let guard = BlobUrlGuard::acquire(Arc::clone(&self.factory), blob?);
        let url = guard.url().clone();
        self.current = Some(guard);
        Some(url)
    }

    /// Release the held resource, if any
    #[inline]
    pub fn clear(&mut self) {
        drop(self.current.take());
    }

    /// Currently held URL
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&DisplayUrl> {
        self.current.as_ref().map(BlobUrlGuard::url)
    }

    /// Whether a resource is held
    #[inline]
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }
}
