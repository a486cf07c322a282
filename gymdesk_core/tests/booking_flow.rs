//! End-to-end booking/ledger flows against the in-memory store backend.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gymdesk_core::{
    book, booking, cancel, catalog, eligible_action, ledger, BookingStatus, CurrentUser,
    EligibleAction, Error, GymStore, Level, MemoryStore, NewSession, NewSubscription, Role,
    ScheduleFilter, ScheduleView, SessionStatus, Snapshot,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
}

fn client(id: u64) -> CurrentUser {
    CurrentUser {
        id,
        name: format!("client-{id}"),
        role: Role::Client,
    }
}

async fn seed_session(store: &MemoryStore, title: &str, capacity: u32) -> gymdesk_core::Session {
    store
        .create_session(&NewSession {
            title: title.into(),
            starts_at: Utc.with_ymd_and_hms(2026, 8, 10, 9, 0, 0).unwrap(),
            duration_minutes: 60,
            level: Level::Beginner,
            capacity,
            trainer_id: 100,
            status: SessionStatus::Open,
        })
        .await
        .unwrap()
}

async fn seed_subscription(store: &MemoryStore, client_id: u64, left: u32) {
    let _ = store
        .create_subscription(&NewSubscription {
            client_id,
            type_label: "Monthly (10 sessions)".into(),
            sessions_total: Some(10),
            sessions_left: left,
            start_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            end_date: None,
            price: 3000,
        })
        .await;
}

#[tokio::test]
async fn first_booking_with_no_subscription_grants_gift_then_debits() {
    let store = MemoryStore::new();
    let session = seed_session(&store, "Crossfit", 5).await;

    let outcome = book(&store, Some(&client(1)), session.id, now())
        .await
        .unwrap();

    // gift subscription created with the fixed promotional shape
    let gift = outcome.gift.expect("gift subscription expected");
    assert_eq!(gift.sessions_total, Some(10));
    assert_eq!(gift.price, 0);
    assert_eq!(gift.start_date, now().date_naive());
    assert_eq!(
        gift.end_date,
        Some(now().date_naive() + chrono::Duration::days(90))
    );

    // the booking consumed one gifted session
    let stored = store.subscription(gift.id).await.unwrap();
    assert_eq!(stored.sessions_left, 9);

    // issuance happens once: the next booking reuses the gift
    let other = seed_session(&store, "Stretching", 5).await;
    let second = book(&store, Some(&client(1)), other.id, now())
        .await
        .unwrap();
    assert!(second.gift.is_none());
    assert_eq!(store.subscriptions_by_client(1).await.len(), 1);
    assert_eq!(store.subscription(gift.id).await.unwrap().sessions_left, 8);
}

#[tokio::test]
async fn capacity_is_respected_under_sequential_bookers() {
    let store = MemoryStore::new();
    let session = seed_session(&store, "Small group", 2).await;
    for id in 1..=3 {
        seed_subscription(&store, id, 10).await;
    }

    assert!(book(&store, Some(&client(1)), session.id, now()).await.is_ok());
    assert!(book(&store, Some(&client(2)), session.id, now()).await.is_ok());

    let third = book(&store, Some(&client(3)), session.id, now()).await;
    assert!(matches!(third, Err(Error::CapacityExceeded)));

    let bookings = store.bookings_by_session(session.id).await;
    assert!(booking::booked_count(&bookings, session.id) <= session.capacity as usize);
}

#[tokio::test]
async fn full_session_shows_full_action_and_rejects_booking() {
    let store = MemoryStore::new();
    let session = seed_session(&store, "One seat", 1).await;
    seed_subscription(&store, 1, 10).await;
    seed_subscription(&store, 2, 10).await;

    book(&store, Some(&client(1)), session.id, now())
        .await
        .unwrap();

    let snapshot = Snapshot::fetch(&store).await;
    let stored = snapshot.session(session.id).unwrap();
    assert_eq!(
        eligible_action(Some(&client(2)), stored, &snapshot.bookings),
        EligibleAction::Full
    );

    let result = book(&store, Some(&client(2)), session.id, now()).await;
    assert!(matches!(result, Err(Error::CapacityExceeded)));
}

#[tokio::test]
async fn at_most_one_live_booking_per_client_session_pair() {
    let store = MemoryStore::new();
    let session = seed_session(&store, "Yoga", 5).await;
    seed_subscription(&store, 1, 10).await;

    book(&store, Some(&client(1)), session.id, now())
        .await
        .unwrap();
    let again = book(&store, Some(&client(1)), session.id, now()).await;
    assert!(matches!(again, Err(Error::DuplicateBooking)));

    let live: Vec<_> = store
        .bookings_by_session(session.id)
        .await
        .into_iter()
        .filter(|b| b.client_id == 1 && b.status != BookingStatus::Cancelled)
        .collect();
    assert_eq!(live.len(), 1);
}

#[tokio::test]
async fn booked_client_on_closed_session_still_sees_cancel() {
    let store = MemoryStore::new();
    let session = seed_session(&store, "Evening HIIT", 5).await;
    seed_subscription(&store, 1, 10).await;

    book(&store, Some(&client(1)), session.id, now())
        .await
        .unwrap();

    // the session closes after the booking was made
    let closed = NewSession {
        title: session.title.clone(),
        starts_at: session.starts_at,
        duration_minutes: session.duration_minutes,
        level: session.level,
        capacity: session.capacity,
        trainer_id: session.trainer_id,
        status: SessionStatus::Closed,
    };
    store.update_session(session.id, &closed).await.unwrap();

    let snapshot = Snapshot::fetch(&store).await;
    let stored = snapshot.session(session.id).unwrap();
    assert_eq!(stored.status, SessionStatus::Closed);
    assert_eq!(
        eligible_action(Some(&client(1)), stored, &snapshot.bookings),
        EligibleAction::Cancel
    );

    // and cancellation still goes through
    assert!(cancel(&store, Some(&client(1)), session.id).await.is_ok());
}

#[tokio::test]
async fn cancel_restores_the_pre_booking_count() {
    let store = MemoryStore::new();
    let session = seed_session(&store, "Pilates", 5).await;
    seed_subscription(&store, 1, 3).await;

    book(&store, Some(&client(1)), session.id, now())
        .await
        .unwrap();
    let subs = store.subscriptions_by_client(1).await;
    assert_eq!(subs[0].sessions_left, 2);

    let outcome = cancel(&store, Some(&client(1)), session.id).await.unwrap();
    assert_eq!(outcome.restored.unwrap().sessions_left, 3);

    // the booking row is gone from the client's list
    assert!(store.bookings_by_client(1).await.is_empty());
}

#[tokio::test]
async fn exhausted_subscription_is_never_selected() {
    let store = MemoryStore::new();
    seed_subscription(&store, 1, 0).await;

    let found = ledger::find_active_subscription(&store, 1, now()).await;
    assert!(found.is_none());

    // a booking attempt therefore grants the gift instead of touching
    // the exhausted subscription
    let session = seed_session(&store, "Crossfit", 5).await;
    let outcome = book(&store, Some(&client(1)), session.id, now())
        .await
        .unwrap();
    assert!(outcome.gift.is_some());
}

#[tokio::test]
async fn schedule_view_pages_over_a_live_snapshot() {
    let store = MemoryStore::new();
    for i in 0..7 {
        let _ = store
            .create_session(&NewSession {
                title: format!("class {i}"),
                starts_at: Utc.with_ymd_and_hms(2026, 8, 10, 6 + i, 0, 0).unwrap(),
                duration_minutes: 60,
                level: if i % 2 == 0 {
                    Level::Beginner
                } else {
                    Level::Advanced
                },
                capacity: 10,
                trainer_id: 100,
                status: SessionStatus::Open,
            })
            .await;
    }

    let snapshot = Snapshot::fetch(&store).await;
    let mut view = ScheduleView::new(snapshot, 3);
    assert_eq!(view.total_pages(), 3);

    view.set_page(3);
    view.set_filter(ScheduleFilter {
        level: Some(Level::Advanced),
        ..Default::default()
    });
    // filter change resets pagination
    assert_eq!(view.page(), 1);
    assert_eq!(view.filtered().len(), 3);
    assert_eq!(view.total_pages(), 1);

    // refreshing after a booking keeps the filter in place
    view.refresh(Snapshot::fetch(&store).await);
    assert_eq!(view.filtered().len(), 3);
}

#[tokio::test]
async fn catalog_reader_exposes_the_type_offerings() {
    let store = MemoryStore::new();
    store.seed_subscription_type(gymdesk_core::SubscriptionType {
        id: 1,
        name: "Monthly (8 sessions)".into(),
        sessions: Some(8),
        price: 3000,
    });
    store.seed_subscription_type(gymdesk_core::SubscriptionType {
        id: 2,
        name: "Unlimited".into(),
        sessions: None,
        price: 12000,
    });

    let types = catalog::subscription_types(&store).await;
    assert_eq!(types.len(), 2);

    let unlimited = &types[1];
    let sub = ledger::purchase(&store, 4, unlimited, now()).await.unwrap();
    assert!(sub.is_unlimited());
    assert_eq!(sub.price, 12000);
}
