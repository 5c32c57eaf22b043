//! In-memory implementations of the storage traits.
//!
//! `MemoryStore` backs the dev server and the test suite. It keeps raw
//! documents per collection and supports one-shot failure injection so
//! tests can exercise the load-failure and restore-rollback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use shared::{Notification, NotificationLevel};
use tracing::{error, info, warn};

use super::traits::{BlobStore, Notifier, RecordStore, StoreError, StoreResult};

/// Document store holding collections of raw JSON documents
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_next_fetch: AtomicBool,
    fail_next_patch: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document into a collection.
    pub fn insert_document(&self, collection: &str, document: Value) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    pub fn insert_blob(&self, path: &str, bytes: Vec<u8>) {
        self.blobs.lock().unwrap().insert(path.to_string(), bytes);
    }

    /// Make the next `fetch_documents` call fail with a backend error.
    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Make the next `patch_document` call fail with a backend error.
    pub fn fail_next_patch(&self) {
        self.fail_next_patch.store(true, Ordering::SeqCst);
    }

    /// Read a document back, for assertions.
    pub fn get_document(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)?
            .iter()
            .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
    }
}

fn is_expired(doc: &Value) -> bool {
    matches!(doc.get("expires_at"), Some(v) if !v.is_null())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_documents(&self, collection: &str, expired_only: bool) -> StoreResult<Vec<Value>> {
        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected fetch failure".to_string()));
        }
        let collections = self.collections.lock().unwrap();
        let docs = collections.get(collection).cloned().unwrap_or_default();
        Ok(if expired_only {
            docs.into_iter().filter(is_expired).collect()
        } else {
            docs.into_iter().filter(|d| !is_expired(d)).collect()
        })
    }

    async fn patch_document(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        if self.fail_next_patch.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected patch failure".to_string()));
        }
        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let doc = docs
            .iter_mut()
            .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        if let (Some(target), Some(fields)) = (doc.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn fetch_blob(&self, path: &str) -> StoreResult<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: "blobs".to_string(),
                id: path.to_string(),
            })
    }
}

/// Notifier that records every notification, for test assertions
#[derive(Default)]
pub struct RecordingNotifier {
    notes: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notes.lock().unwrap().clone()
    }

    /// Drain recorded notifications.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut self.notes.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        self.notes.lock().unwrap().push(Notification {
            level,
            message: message.to_string(),
        });
    }
}

/// Notifier used by the server binary: toasts become log lines
#[derive(Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Success => info!("🔔 {}", message),
            NotificationLevel::Warning => warn!("🔔 {}", message),
            NotificationLevel::Error => error!("🔔 {}", message),
        }
    }
}
