use std::sync::{Arc, RwLock};

use tracing::info;

use crate::dao::DbSnapshot;
use crate::error::Result;

/// Owns the active snapshot and serializes generation swaps.
///
/// Readers take an `Arc` clone under a briefly-held read lock; the write lock
/// covers only the pointer swap. A lookup in flight on the old generation
/// therefore never blocks a swap, and a swap never invalidates that lookup:
/// the old snapshot stays open until its last clone is dropped.
pub struct DbManager {
    current: RwLock<Arc<DbSnapshot>>,
}

impl DbManager {
    pub fn new(initial: DbSnapshot) -> Self {
        DbManager {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Handle to the presently active snapshot, valid for the caller's whole
    /// request even if a swap completes meanwhile.
    pub fn current(&self) -> Arc<DbSnapshot> {
        self.current.read().unwrap().clone()
    }

    /// Install `next` as the active snapshot and return the superseded one
    /// for disposal. Rejects malformed pairs without touching the live
    /// snapshot.
    pub fn replace(&self, next: DbSnapshot) -> Result<Arc<DbSnapshot>> {
        next.validate()?;
        let next = Arc::new(next);
        let old = {
            let mut guard = self.current.write().unwrap();
            std::mem::replace(&mut *guard, next.clone())
        };
        info!("Snapshot installed: {}", next.describe());
        Ok(old)
    }
}
