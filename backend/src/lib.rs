//! Volunteer hub backend: calendar/event scheduling, soft-delete
//! registry with optimistic restore, and the list derivation shared by
//! the roster and trash screens.

pub mod domain;
pub mod rest;
pub mod storage;
