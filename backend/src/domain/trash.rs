//! Soft-delete registry: the trash screen behind beneficiaries,
//! volunteers and events.
//!
//! The registry owns the in-memory working copy of the records currently
//! marked for purge, plus an optimistic overlay of pending restores. The
//! rendered list is always derived as "authoritative minus pending", so
//! rolling back a failed restore is just dropping the pending entry and
//! re-deriving; the record reappears in its prior position.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::json;
use shared::NotificationLevel;
use tracing::{debug, info, warn};

use crate::domain::records::{convert_documents, Document, SoftDeletable};
use crate::storage::{Notifier, RecordStore, StoreError};

/// Outcome of a restore attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome<T> {
    /// Persistence succeeded; the returned record has its marker cleared.
    Restored(T),
    /// Persistence failed; the record is back in the visible list.
    Failed,
    /// A restore for this record was already pending; nothing was done.
    Ignored,
    /// The record is not in the registry's working copy.
    NotFound,
}

impl<T> RestoreOutcome<T> {
    /// Map the restored record, leaving the other variants untouched.
    pub fn map_record<U>(self, f: impl FnOnce(T) -> U) -> RestoreOutcome<U> {
        match self {
            RestoreOutcome::Restored(record) => RestoreOutcome::Restored(f(record)),
            RestoreOutcome::Failed => RestoreOutcome::Failed,
            RestoreOutcome::Ignored => RestoreOutcome::Ignored,
            RestoreOutcome::NotFound => RestoreOutcome::NotFound,
        }
    }
}

struct TrashInner<T> {
    /// Authoritative working copy of records marked for purge
    records: Vec<T>,
    /// Optimistic overlay: ids hidden while their restore is in flight
    pending_restore: HashSet<String>,
    /// Bumped on detach so in-flight loads discard their result
    epoch: u64,
}

/// Generic soft-delete registry over any record carrying the expiration
/// marker.
pub struct TrashService<T> {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    inner: Arc<Mutex<TrashInner<T>>>,
}

impl<T> Clone for TrashService<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: Arc::clone(&self.notifier),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> TrashService<T>
where
    T: Document + SoftDeletable + Clone + Send + 'static,
{
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            inner: Arc::new(Mutex::new(TrashInner {
                records: Vec::new(),
                pending_restore: HashSet::new(),
                epoch: 0,
            })),
        }
    }

    /// Fetch the records currently marked for purge.
    ///
    /// On fetch failure the list is left empty and an error notification
    /// is raised; invalid documents are skipped with one aggregate
    /// warning. A load that completes after [`detach`](Self::detach) is
    /// discarded without touching state.
    pub async fn load(&self) -> Result<()> {
        let epoch = self.inner.lock().unwrap().epoch;
        info!("🗑️ Loading trashed {}", T::LABEL);

        let docs = match self.store.fetch_documents(T::COLLECTION, true).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!("🗑️ Trash fetch for {} failed: {}", T::LABEL, e);
                self.notifier.notify(
                    NotificationLevel::Error,
                    &format!("Couldn't load {}.", T::LABEL),
                );
                let mut inner = self.inner.lock().unwrap();
                if inner.epoch == epoch {
                    inner.records.clear();
                    inner.pending_restore.clear();
                }
                return Ok(());
            }
        };

        let (records, skipped) = convert_documents::<T>(docs);
        if skipped > 0 {
            self.notifier.notify(
                NotificationLevel::Warning,
                &format!("One or more {} failed to load.", T::LABEL),
            );
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.epoch != epoch {
            debug!("🗑️ Discarding {} load finished after detach", T::LABEL);
            return Ok(());
        }
        info!("🗑️ Loaded {} trashed {}", records.len(), T::LABEL);
        inner.records = records;
        let loaded: HashSet<String> = inner.records.iter().map(|r| r.id().to_string()).collect();
        inner.pending_restore.retain(|id| loaded.contains(id));
        Ok(())
    }

    /// The rendered list: authoritative records minus the pending overlay.
    pub fn visible_records(&self) -> Vec<T> {
        let inner = self.inner.lock().unwrap();
        inner
            .records
            .iter()
            .filter(|r| !inner.pending_restore.contains(r.id()))
            .cloned()
            .collect()
    }

    /// Restore a trashed record.
    ///
    /// The record disappears from [`visible_records`](Self::visible_records)
    /// synchronously, before the persistence call is awaited. On success
    /// it is committed out of the working copy; on failure the overlay
    /// entry is dropped so the record reappears, and the durable state is
    /// untouched either way until the patch lands.
    pub async fn restore(&self, id: &str) -> Result<RestoreOutcome<T>> {
        let record = {
            let mut inner = self.inner.lock().unwrap();
            let Some(record) = inner.records.iter().find(|r| r.id() == id).cloned() else {
                return Ok(RestoreOutcome::NotFound);
            };
            // A restore for this record is already in flight; the pending
            // set doubles as the re-entrancy guard.
            if !inner.pending_restore.insert(id.to_string()) {
                debug!("🗑️ Ignoring re-entrant restore of {}", id);
                return Ok(RestoreOutcome::Ignored);
            }
            record
        };

        let name = record.display_name();
        info!("♻️ Restoring {} ({})", name, id);

        let result = self
            .store
            .patch_document(T::COLLECTION, id, json!({ "expires_at": null }))
            .await;

        let mut inner = self.inner.lock().unwrap();
        inner.pending_restore.remove(id);
        match result {
            Ok(()) => {
                inner.records.retain(|r| r.id() != id);
                drop(inner);
                self.notifier
                    .notify(NotificationLevel::Success, &format!("{} restored.", name));
                let mut restored = record;
                restored.clear_expiry();
                Ok(RestoreOutcome::Restored(restored))
            }
            Err(StoreError::NotFound { .. }) => {
                // Purged (or never persisted) under us; nothing to roll back to
                inner.records.retain(|r| r.id() != id);
                drop(inner);
                warn!("♻️ Restore target {} vanished from the store", id);
                Ok(RestoreOutcome::NotFound)
            }
            Err(e) => {
                // Rollback: the overlay entry is gone, so the record is
                // visible again in its prior position.
                drop(inner);
                warn!("♻️ Restore of {} failed: {}", id, e);
                self.notifier
                    .notify(NotificationLevel::Error, &format!("Couldn't restore {}.", name));
                Ok(RestoreOutcome::Failed)
            }
        }
    }

    /// Lifecycle teardown: any load still in flight must not mutate
    /// state once this has been called.
    pub fn detach(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.epoch += 1;
        debug!("🗑️ Detached {} trash registry (epoch {})", T::LABEL, inner.epoch);
    }
}
