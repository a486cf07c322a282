//! Core domain types for the Gymdesk booking system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Sessions (schedule entries) and their status
//! - Bookings and the booking state machine
//! - Subscriptions and the catalog of subscription types
//! - Users, roles and the explicit auth context
//! - Notifications and feedback records
//!
//! Field names follow idiomatic Rust; `#[serde(rename)]` pins the wire
//! format used by the remote document store (`id_trainer`, `date_time`,
//! `max_participants` and friends).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Session (schedule entry) Types
// ============================================================================

/// Difficulty level of a class session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Beginner => write!(f, "Beginner"),
            Level::Intermediate => write!(f, "Intermediate"),
            Level::Advanced => write!(f, "Advanced"),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// Whether a session is accepting bookings
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Closed,
    Cancelled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Open => write!(f, "Open"),
            SessionStatus::Closed => write!(f, "Closed"),
            SessionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A scheduled class occurrence with a trainer, capacity and time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: u64,
    pub title: String,
    #[serde(rename = "date_time")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub level: Level,
    #[serde(rename = "max_participants")]
    pub capacity: u32,
    #[serde(rename = "id_trainer")]
    pub trainer_id: u64,
    pub status: SessionStatus,
}

/// Creation/update payload for a session; the store assigns the id
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewSession {
    pub title: String,
    #[serde(rename = "date_time")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub level: Level,
    #[serde(rename = "max_participants")]
    pub capacity: u32,
    #[serde(rename = "id_trainer")]
    pub trainer_id: u64,
    pub status: SessionStatus,
}

// ============================================================================
// Booking Types
// ============================================================================

/// Booking lifecycle status.
///
/// The primary cancellation flow hard-deletes the booking row instead of
/// marking it `Cancelled`, so `Cancelled` is unreachable through that path.
/// `Absent` is set only by a trainer-driven attendance update.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    Absent,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "Confirmed"),
            BookingStatus::Absent => write!(f, "Absent"),
            BookingStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A client's attendance record for a session.
///
/// Invariant: at most one non-cancelled booking exists per
/// (client, session) pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: u64,
    #[serde(rename = "id_client")]
    pub client_id: u64,
    #[serde(rename = "id_schedule")]
    pub session_id: u64,
    #[serde(rename = "id_subscription")]
    pub subscription_id: Option<u64>,
    pub status: BookingStatus,
    #[serde(rename = "booking_date")]
    pub booked_at: DateTime<Utc>,
}

/// Creation payload for a booking
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewBooking {
    #[serde(rename = "id_client")]
    pub client_id: u64,
    #[serde(rename = "id_schedule")]
    pub session_id: u64,
    #[serde(rename = "id_subscription")]
    pub subscription_id: Option<u64>,
    pub status: BookingStatus,
    #[serde(rename = "booking_date")]
    pub booked_at: DateTime<Utc>,
}

// ============================================================================
// Subscription Types
// ============================================================================

/// A client's purchased or granted allotment of session credits.
///
/// `sessions_total = None` means unlimited; `sessions_left` is meaningless
/// for unlimited subscriptions and ignored by the ledger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: u64,
    #[serde(rename = "id_client")]
    pub client_id: u64,
    #[serde(rename = "type")]
    pub type_label: String,
    pub sessions_total: Option<u32>,
    pub sessions_left: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub price: u32,
}

impl Subscription {
    /// True when the subscription never runs out of sessions
    pub fn is_unlimited(&self) -> bool {
        self.sessions_total.is_none()
    }
}

/// Creation payload for a subscription
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewSubscription {
    #[serde(rename = "id_client")]
    pub client_id: u64,
    #[serde(rename = "type")]
    pub type_label: String,
    pub sessions_total: Option<u32>,
    pub sessions_left: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub price: u32,
}

/// A catalog offering a subscription can be purchased from.
///
/// Immutable from the booking engine's perspective; admin-managed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionType {
    pub id: u64,
    pub name: String,
    pub sessions: Option<u32>,
    pub price: u32,
}

// ============================================================================
// User and Auth Context Types
// ============================================================================

/// User capability on the platform
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Trainer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Trainer => write!(f, "trainer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// A platform user (client, trainer or admin)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// The signed-in user, passed explicitly into every operation that needs
/// a capability check. Replaces ambient "current user" state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: u64,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_client(&self) -> bool {
        self.role == Role::Client
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}

// ============================================================================
// Booking Action Tag
// ============================================================================

/// Discriminated action the UI maps to a button label/enabled state for
/// one session, as seen by one (possibly anonymous) user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EligibleAction {
    /// No authenticated user
    RequireLogin,
    /// Authenticated but not a client
    ClientsOnly,
    /// Session is not accepting bookings
    NotOpen,
    /// Caller already holds a booking and may cancel it
    Cancel,
    /// No seats left
    Full,
    /// Booking is possible
    Book,
}

// ============================================================================
// Notification and Feedback Types
// ============================================================================

/// A message delivered to a user's in-app inbox
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub recipient_id: u64,
    pub message: String,
    #[serde(rename = "date_sent")]
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// Creation payload for a notification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewNotification {
    pub recipient_id: u64,
    pub message: String,
    #[serde(rename = "date_sent")]
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// A client-to-staff feedback message.
///
/// `status` is a staff-managed label; the client only writes the initial
/// "Pending" value and renders whatever comes back.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub id: u64,
    #[serde(rename = "id_client")]
    pub client_id: u64,
    pub subject: String,
    pub message: String,
    #[serde(rename = "date_sent")]
    pub sent_at: DateTime<Utc>,
    pub status: String,
}

/// Creation payload for feedback
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewFeedback {
    #[serde(rename = "id_client")]
    pub client_id: u64,
    pub subject: String,
    pub message: String,
    #[serde(rename = "date_sent")]
    pub sent_at: DateTime<Utc>,
    pub status: String,
}
