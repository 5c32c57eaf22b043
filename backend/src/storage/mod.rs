//! Storage abstraction for the external document database, blob storage
//! and user-facing notification channel.

pub mod memory;
pub mod traits;

pub use memory::{MemoryStore, RecordingNotifier, TracingNotifier};
pub use traits::{BlobStore, Notifier, RecordStore, StoreError, StoreResult};
