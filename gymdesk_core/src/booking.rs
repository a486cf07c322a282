//! Booking engine: capacity checks, duplicate prevention, booking
//! creation/cancellation and the coupling to the subscription ledger.
//!
//! The state machine per (client, session) pair is
//! `Unbooked -> Confirmed -> (deleted)`: cancellation hard-deletes the
//! booking row and credits the linked subscription back, so the
//! `Cancelled` status is never reached through this flow. `Absent` is set
//! only by the trainer attendance update in `schedule_admin`.
//!
//! Capacity check and booking creation are separate store round-trips
//! with no transaction between them; two uncoordinated writers can both
//! pass the check and overshoot `capacity`. Same for the ledger debit:
//! the booking write happens-before the debit attempt, nothing more.

use crate::error::{Error, Result};
use crate::ledger;
use crate::store::GymStore;
use crate::types::{
    Booking, BookingStatus, CurrentUser, EligibleAction, NewBooking, Session, SessionStatus,
    Subscription,
};
use chrono::{DateTime, Utc};

/// Result of a successful booking.
///
/// `gift` carries the subscription granted during this attempt, if any -
/// the UI turns it into the congratulation toast. `debit_failed` flags
/// the soft inconsistency where the booking was stored but the ledger
/// debit was dropped; the booking is deliberately not rolled back.
#[derive(Clone, Debug)]
pub struct BookingOutcome {
    pub booking: Booking,
    pub gift: Option<Subscription>,
    pub debit_failed: bool,
}

/// Result of a successful cancellation.
///
/// `restored` is the subscription state after the credit-back, when one
/// was linked and the write went through; `credit_failed` flags the soft
/// inconsistency where the row was deleted but the credit was dropped.
#[derive(Clone, Debug)]
pub struct CancelOutcome {
    pub restored: Option<Subscription>,
    pub credit_failed: bool,
}

/// Count of seats taken on a session: bookings in any non-cancelled state
pub fn booked_count(bookings: &[Booking], session_id: u64) -> usize {
    bookings
        .iter()
        .filter(|b| b.session_id == session_id && b.status != BookingStatus::Cancelled)
        .count()
}

/// Seats still available.
///
/// May go negative when uncoordinated writers overshoot capacity; clamp
/// with [`seats_left_display`] for presentation only.
pub fn capacity_remaining(session: &Session, bookings: &[Booking]) -> i64 {
    i64::from(session.capacity) - booked_count(bookings, session.id) as i64
}

/// Non-negative seats-left figure for display
pub fn seats_left_display(session: &Session, bookings: &[Booking]) -> u32 {
    capacity_remaining(session, bookings).max(0) as u32
}

/// The caller's own non-cancelled booking on a session, if any
fn own_booking<'a>(
    bookings: &'a [Booking],
    session_id: u64,
    client_id: u64,
) -> Option<&'a Booking> {
    bookings.iter().find(|b| {
        b.session_id == session_id
            && b.client_id == client_id
            && b.status != BookingStatus::Cancelled
    })
}

/// Decide which booking action a user may take on a session.
///
/// Pure function over a bookings snapshot. The own-booking check comes
/// before the session-status check on purpose: a booking can predate a
/// status change, and the client must be able to cancel regardless of
/// session state.
pub fn eligible_action(
    user: Option<&CurrentUser>,
    session: &Session,
    bookings: &[Booking],
) -> EligibleAction {
    let Some(user) = user else {
        return EligibleAction::RequireLogin;
    };
    if !user.is_client() {
        return EligibleAction::ClientsOnly;
    }
    if own_booking(bookings, session.id, user.id).is_some() {
        return EligibleAction::Cancel;
    }
    if session.status != SessionStatus::Open {
        return EligibleAction::NotOpen;
    }
    if capacity_remaining(session, bookings) <= 0 {
        return EligibleAction::Full;
    }
    EligibleAction::Book
}

/// Book the signed-in client onto a session.
///
/// Preconditions, first failure wins: client capability, session exists,
/// seats left, an eligible subscription (issuing the gift fallback when
/// there is none), no duplicate booking. The ledger debit after the
/// booking write is best-effort.
pub async fn book(
    store: &impl GymStore,
    user: Option<&CurrentUser>,
    session_id: u64,
    now: DateTime<Utc>,
) -> Result<BookingOutcome> {
    let user = user.ok_or(Error::PermissionDenied("sign in to book a session"))?;
    if !user.is_client() {
        return Err(Error::PermissionDenied("booking is available to clients only"));
    }

    let session = store
        .session(session_id)
        .await
        .ok_or(Error::NotFound("session"))?;

    let session_bookings = store.bookings_by_session(session_id).await;
    if booked_count(&session_bookings, session_id) >= session.capacity as usize {
        return Err(Error::CapacityExceeded);
    }

    let mut gift = None;
    let subscription = match ledger::find_active_subscription(store, user.id, now).await {
        Some(sub) => sub,
        None => {
            let granted = ledger::issue_gift_subscription(store, user.id, now).await?;
            gift = Some(granted.clone());
            granted
        }
    };

    let existing = store
        .booking_for(session_id, user.id)
        .await
        .filter(|b| b.status != BookingStatus::Cancelled);
    if existing.is_some() {
        return Err(Error::DuplicateBooking);
    }

    let new = NewBooking {
        client_id: user.id,
        session_id,
        subscription_id: Some(subscription.id),
        status: BookingStatus::Confirmed,
        booked_at: now,
    };
    let booking = store.create_booking(&new).await.ok_or_else(|| {
        Error::StoreUnavailable("booking write was not accepted by the store".into())
    })?;

    // Best-effort debit; the stored booking stands even if this is lost.
    let debit_failed = ledger::debit(store, &subscription).await.is_none();
    if debit_failed {
        tracing::warn!(
            "booking {} stored but subscription {} was not debited",
            booking.id,
            subscription.id
        );
    }

    tracing::info!(
        "client {} booked session {} (booking {})",
        user.id,
        session_id,
        booking.id
    );

    Ok(BookingOutcome {
        booking,
        gift,
        debit_failed,
    })
}

/// Cancel the signed-in client's booking on a session.
///
/// Deletes the booking row outright, then credits the linked finite
/// subscription back (best-effort). Succeeds once the delete went
/// through, regardless of the credit outcome.
pub async fn cancel(
    store: &impl GymStore,
    user: Option<&CurrentUser>,
    session_id: u64,
) -> Result<CancelOutcome> {
    let user = user.ok_or(Error::PermissionDenied("sign in to cancel a booking"))?;
    if !user.is_client() {
        return Err(Error::PermissionDenied("cancellation is available to clients only"));
    }

    let booking = store
        .booking_for(session_id, user.id)
        .await
        .filter(|b| b.status != BookingStatus::Cancelled)
        .ok_or(Error::NotFound("booking"))?;

    if !store.delete_booking(booking.id).await {
        return Err(Error::StoreUnavailable(
            "booking delete was not accepted by the store".into(),
        ));
    }

    let mut restored = None;
    let mut credit_failed = false;
    if let Some(sub_id) = booking.subscription_id {
        match store.subscription(sub_id).await {
            Some(sub) if !sub.is_unlimited() => match ledger::credit(store, &sub).await {
                Some(after) => restored = Some(after),
                None => credit_failed = true,
            },
            Some(_) => {} // unlimited: nothing to restore
            None => credit_failed = true,
        }
        if credit_failed {
            tracing::warn!(
                "booking {} deleted but subscription {} was not credited",
                booking.id,
                sub_id
            );
        }
    }

    tracing::info!(
        "client {} cancelled booking {} on session {}",
        user.id,
        booking.id,
        session_id
    );

    Ok(CancelOutcome {
        restored,
        credit_failed,
    })
}
