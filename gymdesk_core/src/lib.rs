#![forbid(unsafe_code)]

//! Core domain model and business logic for the Gymdesk booking system.
//!
//! This crate provides:
//! - Domain types (sessions, bookings, subscriptions, users)
//! - Resource store client over the remote JSON document store
//! - Subscription ledger (eligibility, debit/credit, gifts, purchases)
//! - Booking engine (capacity, duplicates, book/cancel)
//! - Schedule filter view with pagination
//! - Schedule maintenance, notifications and feedback
//!
//! All state lives in the remote store; this crate fetches, denormalizes
//! and enforces the business rules client-side before writing back. It
//! deliberately does not attempt cross-client transactional consistency:
//! capacity checks and ledger writes are separate round-trips against a
//! store shared with other uncoordinated clients.

pub mod types;
pub mod error;
pub mod store;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod state;
pub mod ledger;
pub mod booking;
pub mod view;
pub mod schedule_admin;
pub mod inbox;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use store::{GymStore, HttpStore, MemoryStore};
pub use catalog::Snapshot;
pub use config::Config;
pub use state::StoredLogin;
pub use booking::{book, cancel, eligible_action, BookingOutcome, CancelOutcome};
pub use view::{ScheduleFilter, ScheduleView};
