//! Resource store client for the remote JSON document store.
//!
//! The store is a REST-ish collection API (`/schedules`, `/bookings`,
//! `/subscriptions`, ...). Transport failures and non-2xx responses are
//! swallowed at this boundary: list reads fall back to an empty vec,
//! single reads and writes to `None`/`false`, with a `warn` log. Callers
//! must treat "empty" as ambiguous between "legitimately empty" and
//! "request failed" - that imprecision is part of the contract.
//!
//! Two backends implement the same trait: [`HttpStore`] for the real
//! remote store and [`MemoryStore`], an in-process stand-in with the same
//! observable semantics (store-assigned ids, insertion-order listings).

use crate::config::StoreConfig;
use crate::types::*;
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Typed operations over the gym document store.
///
/// List operations return an empty vec on failure, single-entity reads and
/// creates/updates return `None`, deletes return `false`.
#[async_trait]
pub trait GymStore: Send + Sync {
    // Sessions (schedule entries)
    async fn sessions(&self) -> Vec<Session>;
    async fn sessions_by_trainer(&self, trainer_id: u64) -> Vec<Session>;
    async fn session(&self, id: u64) -> Option<Session>;
    async fn create_session(&self, new: &NewSession) -> Option<Session>;
    async fn update_session(&self, id: u64, new: &NewSession) -> Option<Session>;
    async fn delete_session(&self, id: u64) -> bool;

    // Bookings
    async fn bookings(&self) -> Vec<Booking>;
    async fn bookings_by_client(&self, client_id: u64) -> Vec<Booking>;
    async fn bookings_by_session(&self, session_id: u64) -> Vec<Booking>;
    async fn booking(&self, id: u64) -> Option<Booking>;
    /// First booking matching (session, client), any status
    async fn booking_for(&self, session_id: u64, client_id: u64) -> Option<Booking>;
    async fn create_booking(&self, new: &NewBooking) -> Option<Booking>;
    async fn update_booking_status(&self, id: u64, status: BookingStatus) -> Option<Booking>;
    async fn delete_booking(&self, id: u64) -> bool;

    // Subscriptions (no delete - the ledger never removes them)
    async fn subscriptions_by_client(&self, client_id: u64) -> Vec<Subscription>;
    async fn subscription(&self, id: u64) -> Option<Subscription>;
    async fn create_subscription(&self, new: &NewSubscription) -> Option<Subscription>;
    async fn update_subscription(&self, id: u64, sub: &Subscription) -> Option<Subscription>;

    // Subscription type catalog
    async fn subscription_types(&self) -> Vec<SubscriptionType>;

    // Users
    async fn users_by_role(&self, role: Role) -> Vec<User>;
    async fn user(&self, id: u64) -> Option<User>;
    async fn find_user(&self, login: &str, password: &str) -> Option<User>;

    // Notifications
    /// Notifications for a recipient, newest first
    async fn notifications_for(&self, recipient_id: u64) -> Vec<Notification>;
    async fn create_notification(&self, new: &NewNotification) -> Option<Notification>;
    async fn set_notification_read(&self, id: u64, read: bool) -> Option<Notification>;

    // Feedback
    async fn feedback_by_client(&self, client_id: u64) -> Vec<Feedback>;
    async fn create_feedback(&self, new: &NewFeedback) -> Option<Feedback>;
}

// ============================================================================
// HTTP backend
// ============================================================================

/// reqwest-backed store client
pub struct HttpStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(config: &StoreConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a collection; empty vec on any failure
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Vec<T> {
        let url = self.url(path);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<Vec<T>>().await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("decode of {} failed: {}", path, e);
                    Vec::new()
                }
            },
            Ok(resp) => {
                tracing::warn!("GET {} returned {}", path, resp.status());
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("GET {} failed: {}", path, e);
                Vec::new()
            }
        }
    }

    /// GET a single entity; `None` on any failure
    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let url = self.url(path);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<T>().await {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("decode of {} failed: {}", path, e);
                    None
                }
            },
            Ok(resp) => {
                tracing::warn!("GET {} returned {}", path, resp.status());
                None
            }
            Err(e) => {
                tracing::warn!("GET {} failed: {}", path, e);
                None
            }
        }
    }

    /// Filter query that expects at most one row
    async fn get_first<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.get_list::<T>(path).await.into_iter().next()
    }

    /// Send a JSON body and decode the entity echoed back by the store
    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Option<T> {
        let url = self.url(path);
        match self
            .client
            .request(method.clone(), &url)
            .json(body)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => match resp.json::<T>().await {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("decode of {} {} response failed: {}", method, path, e);
                    None
                }
            },
            Ok(resp) => {
                tracing::warn!("{} {} returned {}", method, path, resp.status());
                None
            }
            Err(e) => {
                tracing::warn!("{} {} failed: {}", method, path, e);
                None
            }
        }
    }

    /// DELETE a row; success/failure only
    async fn delete(&self, path: &str) -> bool {
        let url = self.url(path);
        match self.client.delete(&url).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!("DELETE {} returned {}", path, resp.status());
                false
            }
            Err(e) => {
                tracing::warn!("DELETE {} failed: {}", path, e);
                false
            }
        }
    }
}

#[async_trait]
impl GymStore for HttpStore {
    async fn sessions(&self) -> Vec<Session> {
        self.get_list("/schedules").await
    }

    async fn sessions_by_trainer(&self, trainer_id: u64) -> Vec<Session> {
        self.get_list(&format!("/schedules?id_trainer={trainer_id}")).await
    }

    async fn session(&self, id: u64) -> Option<Session> {
        self.get_one(&format!("/schedules/{id}")).await
    }

    async fn create_session(&self, new: &NewSession) -> Option<Session> {
        self.send_json(Method::POST, "/schedules", new).await
    }

    async fn update_session(&self, id: u64, new: &NewSession) -> Option<Session> {
        self.send_json(Method::PATCH, &format!("/schedules/{id}"), new).await
    }

    async fn delete_session(&self, id: u64) -> bool {
        self.delete(&format!("/schedules/{id}")).await
    }

    async fn bookings(&self) -> Vec<Booking> {
        self.get_list("/bookings").await
    }

    async fn bookings_by_client(&self, client_id: u64) -> Vec<Booking> {
        self.get_list(&format!("/bookings?id_client={client_id}")).await
    }

    async fn bookings_by_session(&self, session_id: u64) -> Vec<Booking> {
        self.get_list(&format!("/bookings?id_schedule={session_id}")).await
    }

    async fn booking(&self, id: u64) -> Option<Booking> {
        self.get_one(&format!("/bookings/{id}")).await
    }

    async fn booking_for(&self, session_id: u64, client_id: u64) -> Option<Booking> {
        self.get_first(&format!(
            "/bookings?id_schedule={session_id}&id_client={client_id}"
        ))
        .await
    }

    async fn create_booking(&self, new: &NewBooking) -> Option<Booking> {
        self.send_json(Method::POST, "/bookings", new).await
    }

    async fn update_booking_status(&self, id: u64, status: BookingStatus) -> Option<Booking> {
        let patch = serde_json::json!({ "status": status });
        self.send_json(Method::PATCH, &format!("/bookings/{id}"), &patch).await
    }

    async fn delete_booking(&self, id: u64) -> bool {
        self.delete(&format!("/bookings/{id}")).await
    }

    async fn subscriptions_by_client(&self, client_id: u64) -> Vec<Subscription> {
        self.get_list(&format!("/subscriptions?id_client={client_id}")).await
    }

    async fn subscription(&self, id: u64) -> Option<Subscription> {
        self.get_one(&format!("/subscriptions/{id}")).await
    }

    async fn create_subscription(&self, new: &NewSubscription) -> Option<Subscription> {
        self.send_json(Method::POST, "/subscriptions", new).await
    }

    async fn update_subscription(&self, id: u64, sub: &Subscription) -> Option<Subscription> {
        self.send_json(Method::PATCH, &format!("/subscriptions/{id}"), sub).await
    }

    async fn subscription_types(&self) -> Vec<SubscriptionType> {
        self.get_list("/subscription_types").await
    }

    async fn users_by_role(&self, role: Role) -> Vec<User> {
        self.get_list(&format!("/users?role={role}")).await
    }

    async fn user(&self, id: u64) -> Option<User> {
        self.get_one(&format!("/users/{id}")).await
    }

    async fn find_user(&self, login: &str, password: &str) -> Option<User> {
        // Plaintext credential match against the store; auth hardening is
        // an external concern.
        let path = format!(
            "/users?login={}&password={}",
            urlencode(login),
            urlencode(password)
        );
        self.get_first(&path).await
    }

    async fn notifications_for(&self, recipient_id: u64) -> Vec<Notification> {
        self.get_list(&format!(
            "/notifications?recipient_id={recipient_id}&_sort=date_sent&_order=desc"
        ))
        .await
    }

    async fn create_notification(&self, new: &NewNotification) -> Option<Notification> {
        self.send_json(Method::POST, "/notifications", new).await
    }

    async fn set_notification_read(&self, id: u64, read: bool) -> Option<Notification> {
        let patch = serde_json::json!({ "read": read });
        self.send_json(Method::PATCH, &format!("/notifications/{id}"), &patch).await
    }

    async fn feedback_by_client(&self, client_id: u64) -> Vec<Feedback> {
        self.get_list(&format!("/feedbacks?id_client={client_id}")).await
    }

    async fn create_feedback(&self, new: &NewFeedback) -> Option<Feedback> {
        self.send_json(Method::POST, "/feedbacks", new).await
    }
}

/// Minimal percent-encoding for query values (login/password lookups)
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Default)]
struct MemoryInner {
    sessions: Vec<Session>,
    bookings: Vec<Booking>,
    subscriptions: Vec<Subscription>,
    subscription_types: Vec<SubscriptionType>,
    users: Vec<User>,
    passwords: HashMap<u64, String>,
    notifications: Vec<Notification>,
    feedbacks: Vec<Feedback>,
    next_id: u64,
}

impl MemoryInner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store backend.
///
/// Listings come back in insertion order, matching the remote store's
/// stable collection order - that is what makes "first eligible
/// subscription in store order" deterministic here.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    fail_subscription_creates: AtomicBool,
    fail_subscription_updates: AtomicBool,
    fail_booking_creates: AtomicBool,
    fail_booking_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user (with their plaintext store credential)
    pub fn seed_user(&self, user: User, password: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.passwords.insert(user.id, password.to_string());
        inner.users.push(user);
    }

    pub fn seed_subscription_type(&self, ty: SubscriptionType) {
        self.inner.lock().unwrap().subscription_types.push(ty);
    }

    // Write-failure injection, for exercising the fallback paths
    pub fn fail_subscription_creates(&self, fail: bool) {
        self.fail_subscription_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscription_updates(&self, fail: bool) {
        self.fail_subscription_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_booking_creates(&self, fail: bool) {
        self.fail_booking_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_booking_deletes(&self, fail: bool) {
        self.fail_booking_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl GymStore for MemoryStore {
    async fn sessions(&self) -> Vec<Session> {
        self.inner.lock().unwrap().sessions.clone()
    }

    async fn sessions_by_trainer(&self, trainer_id: u64) -> Vec<Session> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.trainer_id == trainer_id)
            .cloned()
            .collect()
    }

    async fn session(&self, id: u64) -> Option<Session> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    async fn create_session(&self, new: &NewSession) -> Option<Session> {
        let mut inner = self.inner.lock().unwrap();
        let session = Session {
            id: inner.next_id(),
            title: new.title.clone(),
            starts_at: new.starts_at,
            duration_minutes: new.duration_minutes,
            level: new.level,
            capacity: new.capacity,
            trainer_id: new.trainer_id,
            status: new.status,
        };
        inner.sessions.push(session.clone());
        Some(session)
    }

    async fn update_session(&self, id: u64, new: &NewSession) -> Option<Session> {
        let mut inner = self.inner.lock().unwrap();
        let session = inner.sessions.iter_mut().find(|s| s.id == id)?;
        session.title = new.title.clone();
        session.starts_at = new.starts_at;
        session.duration_minutes = new.duration_minutes;
        session.level = new.level;
        session.capacity = new.capacity;
        session.trainer_id = new.trainer_id;
        session.status = new.status;
        Some(session.clone())
    }

    async fn delete_session(&self, id: u64) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.sessions.len();
        inner.sessions.retain(|s| s.id != id);
        inner.sessions.len() < before
    }

    async fn bookings(&self) -> Vec<Booking> {
        self.inner.lock().unwrap().bookings.clone()
    }

    async fn bookings_by_client(&self, client_id: u64) -> Vec<Booking> {
        self.inner
            .lock()
            .unwrap()
            .bookings
            .iter()
            .filter(|b| b.client_id == client_id)
            .cloned()
            .collect()
    }

    async fn bookings_by_session(&self, session_id: u64) -> Vec<Booking> {
        self.inner
            .lock()
            .unwrap()
            .bookings
            .iter()
            .filter(|b| b.session_id == session_id)
            .cloned()
            .collect()
    }

    async fn booking(&self, id: u64) -> Option<Booking> {
        self.inner
            .lock()
            .unwrap()
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    async fn booking_for(&self, session_id: u64, client_id: u64) -> Option<Booking> {
        self.inner
            .lock()
            .unwrap()
            .bookings
            .iter()
            .find(|b| b.session_id == session_id && b.client_id == client_id)
            .cloned()
    }

    async fn create_booking(&self, new: &NewBooking) -> Option<Booking> {
        if self.fail_booking_creates.load(Ordering::SeqCst) {
            return None;
        }
        let mut inner = self.inner.lock().unwrap();
        let booking = Booking {
            id: inner.next_id(),
            client_id: new.client_id,
            session_id: new.session_id,
            subscription_id: new.subscription_id,
            status: new.status,
            booked_at: new.booked_at,
        };
        inner.bookings.push(booking.clone());
        Some(booking)
    }

    async fn update_booking_status(&self, id: u64, status: BookingStatus) -> Option<Booking> {
        let mut inner = self.inner.lock().unwrap();
        let booking = inner.bookings.iter_mut().find(|b| b.id == id)?;
        booking.status = status;
        Some(booking.clone())
    }

    async fn delete_booking(&self, id: u64) -> bool {
        if self.fail_booking_deletes.load(Ordering::SeqCst) {
            return false;
        }
        let mut inner = self.inner.lock().unwrap();
        let before = inner.bookings.len();
        inner.bookings.retain(|b| b.id != id);
        inner.bookings.len() < before
    }

    async fn subscriptions_by_client(&self, client_id: u64) -> Vec<Subscription> {
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .filter(|s| s.client_id == client_id)
            .cloned()
            .collect()
    }

    async fn subscription(&self, id: u64) -> Option<Subscription> {
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    async fn create_subscription(&self, new: &NewSubscription) -> Option<Subscription> {
        if self.fail_subscription_creates.load(Ordering::SeqCst) {
            return None;
        }
        let mut inner = self.inner.lock().unwrap();
        let sub = Subscription {
            id: inner.next_id(),
            client_id: new.client_id,
            type_label: new.type_label.clone(),
            sessions_total: new.sessions_total,
            sessions_left: new.sessions_left,
            start_date: new.start_date,
            end_date: new.end_date,
            price: new.price,
        };
        inner.subscriptions.push(sub.clone());
        Some(sub)
    }

    async fn update_subscription(&self, id: u64, sub: &Subscription) -> Option<Subscription> {
        if self.fail_subscription_updates.load(Ordering::SeqCst) {
            return None;
        }
        let mut inner = self.inner.lock().unwrap();
        let slot = inner.subscriptions.iter_mut().find(|s| s.id == id)?;
        *slot = Subscription {
            id,
            ..sub.clone()
        };
        Some(slot.clone())
    }

    async fn subscription_types(&self) -> Vec<SubscriptionType> {
        self.inner.lock().unwrap().subscription_types.clone()
    }

    async fn users_by_role(&self, role: Role) -> Vec<User> {
        self.inner
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| u.role == role)
            .cloned()
            .collect()
    }

    async fn user(&self, id: u64) -> Option<User> {
        self.inner
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    async fn find_user(&self, login: &str, password: &str) -> Option<User> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .iter()
            .find(|u| {
                u.login == login
                    && inner.passwords.get(&u.id).map(String::as_str) == Some(password)
            })
            .cloned()
    }

    async fn notifications_for(&self, recipient_id: u64) -> Vec<Notification> {
        let mut items: Vec<Notification> = self
            .inner
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        items
    }

    async fn create_notification(&self, new: &NewNotification) -> Option<Notification> {
        let mut inner = self.inner.lock().unwrap();
        let notification = Notification {
            id: inner.next_id(),
            recipient_id: new.recipient_id,
            message: new.message.clone(),
            sent_at: new.sent_at,
            read: new.read,
        };
        inner.notifications.push(notification.clone());
        Some(notification)
    }

    async fn set_notification_read(&self, id: u64, read: bool) -> Option<Notification> {
        let mut inner = self.inner.lock().unwrap();
        let notification = inner.notifications.iter_mut().find(|n| n.id == id)?;
        notification.read = read;
        Some(notification.clone())
    }

    async fn feedback_by_client(&self, client_id: u64) -> Vec<Feedback> {
        self.inner
            .lock()
            .unwrap()
            .feedbacks
            .iter()
            .filter(|f| f.client_id == client_id)
            .cloned()
            .collect()
    }

    async fn create_feedback(&self, new: &NewFeedback) -> Option<Feedback> {
        let mut inner = self.inner.lock().unwrap();
        let feedback = Feedback {
            id: inner.next_id(),
            client_id: new.client_id,
            subject: new.subject.clone(),
            message: new.message.clone(),
            sent_at: new.sent_at,
            status: new.status.clone(),
        };
        inner.feedbacks.push(feedback.clone());
        Some(feedback)
    }
}
