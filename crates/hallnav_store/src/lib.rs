//! Hall Directory Store
//!
//! The `halls` document collection behind the info view and the admin panel.
//!
//! Operations mirror a hosted document database: full read, add, update by
//! id, delete by id, and a live subscription that pushes the entire
//! collection after every change. No optimistic locking: last write wins.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local, used in tests and for `backend = "memory"`.
//! - [`DirStore`]: one JSON document per file under `<root>/halls/`.

mod dir;
mod error;
mod memory;
mod subscription;

pub use dir::DirStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use subscription::{Publisher, Snapshot, Subscription};

use async_trait::async_trait;
use hallnav_protocol::{HallDraft, HallEdit, HallId, HallRecord};

/// The operations the client uses against the `halls` collection.
#[async_trait]
pub trait HallStore: Send + Sync {
    /// Read the whole collection. No server-side filtering.
    async fn list(&self) -> Result<Vec<HallRecord>>;

    /// Create a document from the three required fields.
    async fn add(&self, draft: HallDraft) -> Result<HallRecord>;

    /// Merge `edit` into the document with `id`.
    async fn update(&self, id: &HallId, edit: HallEdit) -> Result<HallRecord>;

    /// Remove a document. Returns `false` when it did not exist.
    async fn delete(&self, id: &HallId) -> Result<bool>;

    /// Standing query over the collection.
    fn subscribe(&self) -> Subscription;

    /// Pick up changes made outside this process. Backends that cannot be
    /// changed externally treat this as a no-op.
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }
}
