//! Domain layer: calendar engine, soft-delete registry, list derivation
//! and card formatting. All I/O goes through the traits in
//! [`crate::storage`].

pub mod calendar;
pub mod card_list;
pub mod display_list;
pub mod records;
pub mod session;
pub mod trash;

pub use calendar::{CalendarService, CalendarState};
pub use trash::{RestoreOutcome, TrashService};
