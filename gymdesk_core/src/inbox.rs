//! In-app notifications and client-to-staff feedback.

use crate::error::{Error, Result};
use crate::store::GymStore;
use crate::types::{
    CurrentUser, Feedback, NewFeedback, NewNotification, Notification,
};
use chrono::{DateTime, Utc};

/// Feedback message length bounds enforced client-side
const FEEDBACK_MIN_LEN: usize = 10;
const FEEDBACK_MAX_LEN: usize = 500;

/// Initial status the client writes on a new feedback row
const FEEDBACK_INITIAL_STATUS: &str = "Pending";

/// The signed-in user's notifications, newest first
pub async fn fetch_inbox(store: &impl GymStore, user: &CurrentUser) -> Vec<Notification> {
    store.notifications_for(user.id).await
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

pub async fn mark_read(store: &impl GymStore, notification_id: u64) -> Result<Notification> {
    store
        .set_notification_read(notification_id, true)
        .await
        .ok_or_else(|| {
            Error::StoreUnavailable("notification update was not accepted by the store".into())
        })
}

/// Deliver a message to a user's inbox
pub async fn notify(
    store: &impl GymStore,
    recipient_id: u64,
    message: &str,
    now: DateTime<Utc>,
) -> Result<Notification> {
    let new = NewNotification {
        recipient_id,
        message: message.to_string(),
        sent_at: now,
        read: false,
    };
    store.create_notification(&new).await.ok_or_else(|| {
        Error::StoreUnavailable("notification write was not accepted by the store".into())
    })
}

/// Send feedback from a client to the staff.
pub async fn send_feedback(
    store: &impl GymStore,
    user: &CurrentUser,
    subject: &str,
    message: &str,
    now: DateTime<Utc>,
) -> Result<Feedback> {
    if !user.is_client() {
        return Err(Error::PermissionDenied("feedback is available to clients only"));
    }
    if subject.trim().is_empty() {
        return Err(Error::Validation("subject must not be empty".into()));
    }
    let len = message.chars().count();
    if !(FEEDBACK_MIN_LEN..=FEEDBACK_MAX_LEN).contains(&len) {
        return Err(Error::Validation(format!(
            "message must be between {FEEDBACK_MIN_LEN} and {FEEDBACK_MAX_LEN} characters"
        )));
    }

    let new = NewFeedback {
        client_id: user.id,
        subject: subject.to_string(),
        message: message.to_string(),
        sent_at: now,
        status: FEEDBACK_INITIAL_STATUS.to_string(),
    };
    store.create_feedback(&new).await.ok_or_else(|| {
        Error::StoreUnavailable("feedback write was not accepted by the store".into())
    })
}

/// The client's sent feedback, newest first
pub async fn feedback_history(store: &impl GymStore, user: &CurrentUser) -> Vec<Feedback> {
    let mut items = store.feedback_by_client(user.id).await;
    items.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::Role;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    fn client(id: u64) -> CurrentUser {
        CurrentUser {
            id,
            name: "Client".into(),
            role: Role::Client,
        }
    }

    #[tokio::test]
    async fn test_unread_count_and_mark_read() {
        let store = MemoryStore::new();
        let n = notify(&store, 4, "Schedule changed", now()).await.unwrap();
        notify(&store, 4, "Welcome!", now()).await.unwrap();

        let inbox = fetch_inbox(&store, &client(4)).await;
        assert_eq!(unread_count(&inbox), 2);

        mark_read(&store, n.id).await.unwrap();
        let inbox = fetch_inbox(&store, &client(4)).await;
        assert_eq!(unread_count(&inbox), 1);
    }

    #[tokio::test]
    async fn test_feedback_length_bounds() {
        let store = MemoryStore::new();
        let user = client(4);

        let short = send_feedback(&store, &user, "Hours", "too short", now()).await;
        assert!(matches!(short, Err(Error::Validation(_))));

        let long = "x".repeat(501);
        let too_long = send_feedback(&store, &user, "Hours", &long, now()).await;
        assert!(matches!(too_long, Err(Error::Validation(_))));

        let ok = send_feedback(
            &store,
            &user,
            "Hours",
            "Could you open earlier on weekends?",
            now(),
        )
        .await
        .unwrap();
        assert_eq!(ok.status, "Pending");
    }

    #[tokio::test]
    async fn test_feedback_clients_only() {
        let store = MemoryStore::new();
        let staff = CurrentUser {
            id: 2,
            name: "T".into(),
            role: Role::Trainer,
        };
        let result =
            send_feedback(&store, &staff, "Subject", "A long enough message", now()).await;
        assert!(matches!(result, Err(Error::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_feedback_history_newest_first() {
        let store = MemoryStore::new();
        let user = client(4);
        for (hour, subject) in [(9, "first"), (15, "third"), (12, "second")] {
            send_feedback(
                &store,
                &user,
                subject,
                "A long enough message body",
                Utc.with_ymd_and_hms(2026, 8, 7, hour, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        }

        let history = feedback_history(&store, &user).await;
        let subjects: Vec<String> = history.into_iter().map(|f| f.subject).collect();
        assert_eq!(subjects, vec!["third", "second", "first"]);
    }
}
