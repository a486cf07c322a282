//! Read-only catalog access: trainers, schedule entries and subscription
//! type offerings, plus the denormalized snapshot the filter view works
//! over.

use crate::store::GymStore;
use crate::types::{Booking, Session, SubscriptionType, User, Role};

/// Denormalized view state: sessions, trainers and bookings fetched
/// together and refreshed on demand.
///
/// Sessions are kept sorted ascending by start time; every consumer
/// downstream (filtering, pagination) relies on that order.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub sessions: Vec<Session>,
    pub trainers: Vec<User>,
    pub bookings: Vec<Booking>,
}

impl Snapshot {
    /// Fetch a fresh snapshot from the store.
    ///
    /// Any of the three reads may have silently fallen back to empty on
    /// store failure; the snapshot does not distinguish that from a
    /// legitimately empty collection.
    pub async fn fetch(store: &impl GymStore) -> Self {
        let mut sessions = store.sessions().await;
        sessions.sort_by_key(|s| s.starts_at);
        let trainers = store.users_by_role(Role::Trainer).await;
        let bookings = store.bookings().await;

        tracing::debug!(
            "snapshot: {} sessions, {} trainers, {} bookings",
            sessions.len(),
            trainers.len(),
            bookings.len()
        );

        Self {
            sessions,
            trainers,
            bookings,
        }
    }

    pub fn session(&self, id: u64) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Trainer display name, empty when the trainer is unknown
    pub fn trainer_name(&self, trainer_id: u64) -> &str {
        self.trainers
            .iter()
            .find(|t| t.id == trainer_id)
            .map(|t| t.name.as_str())
            .unwrap_or("")
    }
}

/// All trainers known to the store
pub async fn trainers(store: &impl GymStore) -> Vec<User> {
    store.users_by_role(Role::Trainer).await
}

/// The admin-managed subscription type catalog
pub async fn subscription_types(store: &impl GymStore) -> Vec<SubscriptionType> {
    store.subscription_types().await
}
