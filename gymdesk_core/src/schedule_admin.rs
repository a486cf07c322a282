//! Schedule maintenance: session create/edit/delete by trainers and
//! admins, the per-session roster, and the trainer-driven attendance
//! update (the only path that marks a booking `Absent`).

use crate::error::{Error, Result};
use crate::store::GymStore;
use crate::types::{Booking, BookingStatus, CurrentUser, NewSession, Role, Session, User};

/// May this user edit or delete this session? Admins always; trainers
/// only their own sessions.
pub fn can_edit_session(user: Option<&CurrentUser>, session: &Session) -> bool {
    match user {
        Some(u) if u.role == Role::Admin => true,
        Some(u) if u.role == Role::Trainer => session.trainer_id == u.id,
        _ => false,
    }
}

fn require_schedule_access(user: Option<&CurrentUser>) -> Result<&CurrentUser> {
    let user = user.ok_or(Error::PermissionDenied("sign in to manage the schedule"))?;
    match user.role {
        Role::Trainer | Role::Admin => Ok(user),
        Role::Client => Err(Error::PermissionDenied(
            "schedule maintenance is for trainers and admins",
        )),
    }
}

/// Create a session. Trainers may only create sessions assigned to
/// themselves; admins may assign any trainer.
pub async fn create_session(
    store: &impl GymStore,
    user: Option<&CurrentUser>,
    new: NewSession,
) -> Result<Session> {
    let user = require_schedule_access(user)?;
    if user.role == Role::Trainer && new.trainer_id != user.id {
        return Err(Error::PermissionDenied(
            "trainers may only schedule their own sessions",
        ));
    }

    store.create_session(&new).await.ok_or_else(|| {
        Error::StoreUnavailable("session write was not accepted by the store".into())
    })
}

/// Update a session; the capability check runs against the stored row,
/// not the incoming payload.
pub async fn update_session(
    store: &impl GymStore,
    user: Option<&CurrentUser>,
    session_id: u64,
    new: NewSession,
) -> Result<Session> {
    let user = require_schedule_access(user)?;
    let existing = store
        .session(session_id)
        .await
        .ok_or(Error::NotFound("session"))?;
    if !can_edit_session(Some(user), &existing) {
        return Err(Error::PermissionDenied("not your session"));
    }

    store
        .update_session(session_id, &new)
        .await
        .ok_or_else(|| {
            Error::StoreUnavailable("session update was not accepted by the store".into())
        })
}

pub async fn delete_session(
    store: &impl GymStore,
    user: Option<&CurrentUser>,
    session_id: u64,
) -> Result<()> {
    let user = require_schedule_access(user)?;
    let existing = store
        .session(session_id)
        .await
        .ok_or(Error::NotFound("session"))?;
    if !can_edit_session(Some(user), &existing) {
        return Err(Error::PermissionDenied("not your session"));
    }

    if store.delete_session(session_id).await {
        Ok(())
    } else {
        Err(Error::StoreUnavailable(
            "session delete was not accepted by the store".into(),
        ))
    }
}

/// The session's bookings joined to their client users, for the
/// trainer's roster view. Unknown clients come back as `None`.
pub async fn roster(
    store: &impl GymStore,
    session_id: u64,
) -> Vec<(Booking, Option<User>)> {
    let bookings = store.bookings_by_session(session_id).await;
    let mut out = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let client = store.user(booking.client_id).await;
        out.push((booking, client));
    }
    out
}

/// Trainer-driven attendance update: flips a booking between `Confirmed`
/// and `Absent`. Has no effect on the subscription ledger.
pub async fn mark_attendance(
    store: &impl GymStore,
    user: Option<&CurrentUser>,
    booking_id: u64,
    present: bool,
) -> Result<Booking> {
    let user = require_schedule_access(user)?;

    let booking = store
        .booking(booking_id)
        .await
        .ok_or(Error::NotFound("booking"))?;
    let session = store
        .session(booking.session_id)
        .await
        .ok_or(Error::NotFound("session"))?;
    if !can_edit_session(Some(user), &session) {
        return Err(Error::PermissionDenied("not your session"));
    }

    let status = if present {
        BookingStatus::Confirmed
    } else {
        BookingStatus::Absent
    };
    store
        .update_booking_status(booking_id, status)
        .await
        .ok_or_else(|| {
            Error::StoreUnavailable("attendance update was not accepted by the store".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{Level, NewBooking, SessionStatus};
    use chrono::{TimeZone, Utc};

    fn admin() -> CurrentUser {
        CurrentUser {
            id: 1,
            name: "Admin".into(),
            role: Role::Admin,
        }
    }

    fn trainer(id: u64) -> CurrentUser {
        CurrentUser {
            id,
            name: format!("trainer-{id}"),
            role: Role::Trainer,
        }
    }

    fn client(id: u64) -> CurrentUser {
        CurrentUser {
            id,
            name: format!("client-{id}"),
            role: Role::Client,
        }
    }

    fn new_session(trainer_id: u64) -> NewSession {
        NewSession {
            title: "Boxing".into(),
            starts_at: Utc.with_ymd_and_hms(2026, 8, 12, 18, 0, 0).unwrap(),
            duration_minutes: 90,
            level: Level::Advanced,
            capacity: 8,
            trainer_id,
            status: SessionStatus::Open,
        }
    }

    #[tokio::test]
    async fn test_clients_cannot_manage_schedule() {
        let store = MemoryStore::new();
        let result = create_session(&store, Some(&client(5)), new_session(5)).await;
        assert!(matches!(result, Err(Error::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_trainer_creates_only_own_sessions() {
        let store = MemoryStore::new();

        let foreign = create_session(&store, Some(&trainer(2)), new_session(3)).await;
        assert!(matches!(foreign, Err(Error::PermissionDenied(_))));

        let own = create_session(&store, Some(&trainer(2)), new_session(2)).await;
        assert!(own.is_ok());

        // admins may assign anyone
        let assigned = create_session(&store, Some(&admin()), new_session(3)).await;
        assert!(assigned.is_ok());
    }

    #[tokio::test]
    async fn test_update_checks_stored_owner() {
        let store = MemoryStore::new();
        let session = create_session(&store, Some(&trainer(2)), new_session(2))
            .await
            .unwrap();

        let mut edit = new_session(2);
        edit.capacity = 12;

        let other = update_session(&store, Some(&trainer(3)), session.id, edit.clone()).await;
        assert!(matches!(other, Err(Error::PermissionDenied(_))));

        let owner = update_session(&store, Some(&trainer(2)), session.id, edit).await;
        assert_eq!(owner.unwrap().capacity, 12);
    }

    #[tokio::test]
    async fn test_delete_unknown_session() {
        let store = MemoryStore::new();
        let result = delete_session(&store, Some(&admin()), 42).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_attendance_sets_absent_without_ledger_effect() {
        let store = MemoryStore::new();
        let session = create_session(&store, Some(&trainer(2)), new_session(2))
            .await
            .unwrap();
        let booking = store
            .create_booking(&NewBooking {
                client_id: 9,
                session_id: session.id,
                subscription_id: None,
                status: BookingStatus::Confirmed,
                booked_at: Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
            })
            .await
            .unwrap();

        let updated = mark_attendance(&store, Some(&trainer(2)), booking.id, false)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Absent);

        let back = mark_attendance(&store, Some(&trainer(2)), booking.id, true)
            .await
            .unwrap();
        assert_eq!(back.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_mark_attendance_foreign_session_denied() {
        let store = MemoryStore::new();
        let session = create_session(&store, Some(&trainer(2)), new_session(2))
            .await
            .unwrap();
        let booking = store
            .create_booking(&NewBooking {
                client_id: 9,
                session_id: session.id,
                subscription_id: None,
                status: BookingStatus::Confirmed,
                booked_at: Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
            })
            .await
            .unwrap();

        let result = mark_attendance(&store, Some(&trainer(3)), booking.id, false).await;
        assert!(matches!(result, Err(Error::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_roster_joins_clients() {
        let store = MemoryStore::new();
        store.seed_user(
            User {
                id: 9,
                login: "kate".into(),
                name: "Kate".into(),
                role: Role::Client,
                email: None,
                phone: None,
            },
            "pw",
        );
        let session = create_session(&store, Some(&trainer(2)), new_session(2))
            .await
            .unwrap();
        let _ = store
            .create_booking(&NewBooking {
                client_id: 9,
                session_id: session.id,
                subscription_id: None,
                status: BookingStatus::Confirmed,
                booked_at: Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
            })
            .await;

        let roster = roster(&store, session.id).await;
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].1.as_ref().unwrap().name, "Kate");
    }
}
