//! # Storage Traits
//!
//! This module defines the abstraction traits for the external
//! collaborators the domain layer depends on: the managed document
//! database, the blob store holding profile pictures, and the
//! notification channel for user-facing toasts.
//!
//! The domain layer only ever sees these traits, so the real backing
//! service can be swapped for the in-memory implementation in tests
//! without touching any business logic.

use async_trait::async_trait;
use serde_json::Value;
use shared::NotificationLevel;
use thiserror::Error;

/// Errors surfaced by the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Trait defining the interface to the document database.
///
/// Documents cross this boundary as raw `serde_json::Value`s; conversion
/// into typed records (and rejection of invalid shapes) happens in the
/// domain layer, never here.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch all documents of a collection.
    ///
    /// With `expired_only` set, only documents whose `expires_at` marker
    /// is non-null are returned; backends apply this filter server-side
    /// where they can.
    async fn fetch_documents(&self, collection: &str, expired_only: bool) -> StoreResult<Vec<Value>>;

    /// Apply a partial update to a single document.
    ///
    /// Top-level keys of `patch` are merged into the document; a `null`
    /// value clears the corresponding field.
    async fn patch_document(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()>;
}

/// Trait defining the interface to the blob store (profile pictures)
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Retrieve the raw bytes stored at `path`
    async fn fetch_blob(&self, path: &str) -> StoreResult<Vec<u8>>;
}

/// Fire-and-forget channel for user-facing toasts.
///
/// Delivery is best-effort and never fails into the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotificationLevel, message: &str);
}
