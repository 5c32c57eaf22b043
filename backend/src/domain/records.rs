//! Typed record contracts over the raw documents the store hands back.
//!
//! Raw `serde_json::Value` shapes never reach business logic: every
//! document is converted into a typed record right here, and a document
//! that fails to deserialize or lacks an essential field is skipped with
//! a count the caller turns into one aggregate warning per load cycle.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{Beneficiary, EventRecord, NotificationLevel, Volunteer};
use tracing::{debug, warn};

use crate::storage::{Notifier, RecordStore};

/// A record type that lives in a named store collection and can be
/// validated out of a raw document.
pub trait Document: DeserializeOwned {
    /// Collection name in the document store
    const COLLECTION: &'static str;
    /// Plural label used in user-facing notifications
    const LABEL: &'static str;

    /// Reject records that are missing essential fields.
    fn validate(&self) -> Result<()>;

    /// Convert a raw document into a validated record.
    fn from_document(doc: &Value) -> Result<Self> {
        let record: Self = serde_json::from_value(doc.clone())?;
        record.validate()?;
        Ok(record)
    }
}

/// Contract for anything that carries the soft-delete expiration marker
pub trait SoftDeletable {
    fn id(&self) -> &str;
    fn expires_at(&self) -> Option<DateTime<Utc>>;
    /// Clear the marker on the in-memory copy after a confirmed restore.
    fn clear_expiry(&mut self);
    /// Name used in restore notifications
    fn display_name(&self) -> String;

    /// Whole days until the scheduled purge. Advisory only; the purge
    /// itself is an external process.
    fn days_until_purge(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at().map(|at| (at - now).num_days())
    }
}

impl Document for Beneficiary {
    const COLLECTION: &'static str = "beneficiaries";
    const LABEL: &'static str = "beneficiaries";

    fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(anyhow!("beneficiary {} has no name", self.id));
        }
        Ok(())
    }
}

impl SoftDeletable for Beneficiary {
    fn id(&self) -> &str {
        &self.id
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    fn clear_expiry(&mut self) {
        self.expires_at = None;
    }

    fn display_name(&self) -> String {
        self.full_name()
    }
}

impl Document for Volunteer {
    const COLLECTION: &'static str = "volunteers";
    const LABEL: &'static str = "volunteers";

    fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(anyhow!("volunteer {} has no name", self.id));
        }
        Ok(())
    }
}

impl SoftDeletable for Volunteer {
    fn id(&self) -> &str {
        &self.id
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    fn clear_expiry(&mut self) {
        self.expires_at = None;
    }

    fn display_name(&self) -> String {
        self.full_name()
    }
}

impl Document for EventRecord {
    const COLLECTION: &'static str = "events";
    const LABEL: &'static str = "events";

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("event {} has no name", self.id));
        }
        Ok(())
    }
}

impl SoftDeletable for EventRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    fn clear_expiry(&mut self) {
        self.expires_at = None;
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// Convert a batch of raw documents, skipping the ones that fail.
///
/// Returns the valid records and the number of skipped documents; the
/// caller raises a single aggregate warning when the count is non-zero.
pub fn convert_documents<T: Document>(docs: Vec<Value>) -> (Vec<T>, usize) {
    let mut records = Vec::with_capacity(docs.len());
    let mut skipped = 0;
    for doc in &docs {
        match T::from_document(doc) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!("skipping invalid {} document: {:#}", T::LABEL, e);
                skipped += 1;
            }
        }
    }
    (records, skipped)
}

/// Fetch and convert the active (non-deleted) records of a collection.
///
/// A fetch failure is reported as an error notification and yields an
/// empty list; invalid documents are skipped with one aggregate warning.
pub async fn load_active<T: Document>(store: &dyn RecordStore, notifier: &dyn Notifier) -> Vec<T> {
    match store.fetch_documents(T::COLLECTION, false).await {
        Ok(docs) => {
            let (records, skipped) = convert_documents::<T>(docs);
            if skipped > 0 {
                notifier.notify(
                    NotificationLevel::Warning,
                    &format!("One or more {} failed to load.", T::LABEL),
                );
            }
            records
        }
        Err(e) => {
            warn!("Fetch of {} failed: {}", T::LABEL, e);
            notifier.notify(
                NotificationLevel::Error,
                &format!("Couldn't load {}.", T::LABEL),
            );
            Vec::new()
        }
    }
}
