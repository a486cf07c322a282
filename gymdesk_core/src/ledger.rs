//! Subscription ledger: eligibility, session-count debit/credit, gift
//! issuance and purchase.
//!
//! The ledger is the sole writer of a subscription's session-count
//! fields. Debit and credit write back a value computed from the caller's
//! snapshot without a version check, so concurrent writers against the
//! same subscription can lose an update - a documented limitation of the
//! shared store, not something this module tries to hide.

use crate::error::{Error, Result};
use crate::store::GymStore;
use crate::types::{NewSubscription, Subscription, SubscriptionType};
use chrono::{DateTime, Duration, Utc};

/// Session allotment of an automatically granted gift subscription
pub const GIFT_SESSIONS: u32 = 10;

/// Validity window, in days, of gifted and purchased subscriptions
pub const VALIDITY_DAYS: i64 = 90;

/// Find the client's first eligible subscription, in store order.
///
/// Eligible means: unlimited or with sessions left, and not past its end
/// date as of `as_of`. Ties are not broken beyond store order.
pub async fn find_active_subscription(
    store: &impl GymStore,
    client_id: u64,
    as_of: DateTime<Utc>,
) -> Option<Subscription> {
    let today = as_of.date_naive();
    store
        .subscriptions_by_client(client_id)
        .await
        .into_iter()
        .find(|sub| {
            let has_sessions = sub.is_unlimited() || sub.sessions_left > 0;
            let in_period = sub.end_date.map_or(true, |end| end >= today);
            has_sessions && in_period
        })
}

/// Issue the promotional fallback subscription granted on a client's
/// first booking attempt without an eligible subscription.
///
/// The caller must not proceed to book if this fails.
pub async fn issue_gift_subscription(
    store: &impl GymStore,
    client_id: u64,
    now: DateTime<Utc>,
) -> Result<Subscription> {
    let today = now.date_naive();
    let gift = NewSubscription {
        client_id,
        type_label: format!("Gift ({GIFT_SESSIONS} sessions)"),
        sessions_total: Some(GIFT_SESSIONS),
        sessions_left: GIFT_SESSIONS,
        start_date: today,
        end_date: Some(today + Duration::days(VALIDITY_DAYS)),
        price: 0,
    };

    match store.create_subscription(&gift).await {
        Some(sub) => {
            tracing::info!("issued gift subscription {} to client {}", sub.id, client_id);
            Ok(sub)
        }
        None => Err(Error::LedgerWriteFailed(
            "gift subscription was not accepted by the store".into(),
        )),
    }
}

/// Consume one session from a finite subscription.
///
/// Unlimited subscriptions are never decremented. The new remaining count
/// is floor-clamped at zero. Returns `None` when the store write fails.
pub async fn debit(store: &impl GymStore, sub: &Subscription) -> Option<Subscription> {
    if sub.is_unlimited() {
        return Some(sub.clone());
    }

    let updated = Subscription {
        sessions_left: sub.sessions_left.saturating_sub(1),
        ..sub.clone()
    };
    let result = store.update_subscription(sub.id, &updated).await;
    if result.is_none() {
        tracing::warn!("debit write for subscription {} failed", sub.id);
    }
    result
}

/// Restore one session to a finite subscription after a cancellation.
///
/// The credited count is not clamped to `sessions_total`; over-crediting
/// past the original allotment is possible and left visible.
pub async fn credit(store: &impl GymStore, sub: &Subscription) -> Option<Subscription> {
    if sub.is_unlimited() {
        return Some(sub.clone());
    }

    let updated = Subscription {
        sessions_left: sub.sessions_left + 1,
        ..sub.clone()
    };
    let result = store.update_subscription(sub.id, &updated).await;
    if result.is_none() {
        tracing::warn!("credit write for subscription {} failed", sub.id);
    }
    result
}

/// Materialize a subscription from a catalog type.
///
/// Purchases are unconditionally additive: no overlap check against the
/// client's existing subscriptions.
pub async fn purchase(
    store: &impl GymStore,
    client_id: u64,
    ty: &SubscriptionType,
    now: DateTime<Utc>,
) -> Result<Subscription> {
    let today = now.date_naive();
    let new = NewSubscription {
        client_id,
        type_label: ty.name.clone(),
        sessions_total: ty.sessions,
        sessions_left: ty.sessions.unwrap_or(0),
        start_date: today,
        end_date: Some(today + Duration::days(VALIDITY_DAYS)),
        price: ty.price,
    };

    match store.create_subscription(&new).await {
        Some(sub) => {
            tracing::info!(
                "client {} purchased subscription {} ({})",
                client_id,
                sub.id,
                sub.type_label
            );
            Ok(sub)
        }
        None => Err(Error::LedgerWriteFailed(
            "subscription purchase was not accepted by the store".into(),
        )),
    }
}
