//! In-process notification delivery.
//!
//! Feeds are keyed by user identifier; each user gets a bounded in-memory
//! store plus an optional live `broadcast` channel that UI sessions
//! subscribe to and explicitly unsubscribe from on teardown. Delivery is
//! best-effort: a full or dropped channel never fails the originating
//! write.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

/// Retained notifications per user; older entries are trimmed.
const FEED_CAPACITY: usize = 200;
/// Live channel depth per subscriber.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CrashReportNew,
    CrashReportUpdated,
    CrashReportAssigned,
    MaintenanceScheduled,
    MaintenanceCompleted,
    StatusChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

/// A notification before it is addressed to a particular user.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}

impl NotificationDraft {
    pub fn crash_report_new(report_id: Uuid, severity: &str) -> Self {
        Self {
            kind: NotificationKind::CrashReportNew,
            title: "New crash report".to_string(),
            message: format!("A {} severity crash report was filed", severity),
            data: serde_json::json!({ "report_id": report_id, "severity": severity }),
        }
    }

    pub fn crash_report_updated(report_id: Uuid) -> Self {
        Self {
            kind: NotificationKind::CrashReportUpdated,
            title: "Crash report updated".to_string(),
            message: "A crash report was updated".to_string(),
            data: serde_json::json!({ "report_id": report_id }),
        }
    }

    pub fn crash_report_assigned(report_id: Uuid, technician_id: Uuid) -> Self {
        Self {
            kind: NotificationKind::CrashReportAssigned,
            title: "Crash report assigned".to_string(),
            message: "A crash report was assigned to a technician".to_string(),
            data: serde_json::json!({ "report_id": report_id, "technician_id": technician_id }),
        }
    }

    pub fn status_changed(report_id: Uuid, old_status: &str, new_status: &str) -> Self {
        Self {
            kind: NotificationKind::StatusChanged,
            title: "Report status changed".to_string(),
            message: format!("Report status moved from {} to {}", old_status, new_status),
            data: serde_json::json!({
                "report_id": report_id,
                "old_status": old_status,
                "new_status": new_status,
            }),
        }
    }

    pub fn maintenance_scheduled(maintenance_id: Uuid, schedule_date: DateTime<Utc>) -> Self {
        Self {
            kind: NotificationKind::MaintenanceScheduled,
            title: "Maintenance scheduled".to_string(),
            message: format!(
                "Maintenance scheduled for {}",
                schedule_date.format("%d/%m/%Y")
            ),
            data: serde_json::json!({ "maintenance_id": maintenance_id }),
        }
    }

    pub fn maintenance_completed(maintenance_id: Uuid) -> Self {
        Self {
            kind: NotificationKind::MaintenanceCompleted,
            title: "Maintenance completed".to_string(),
            message: "A maintenance job was marked completed".to_string(),
            data: serde_json::json!({ "maintenance_id": maintenance_id }),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification not found: {0}")]
    NotFound(Uuid),
}

impl From<NotificationError> for crate::errors::ServiceError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound(id) => {
                crate::errors::ServiceError::NotFound(format!("notification {}", id))
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct NotificationHub {
    feeds: DashMap<Uuid, Vec<Notification>>,
    channels: DashMap<Uuid, broadcast::Sender<Notification>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a live subscription for a user, registering their feed if it
    /// does not exist yet.
    pub fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<Notification> {
        self.feeds.entry(user_id).or_default();
        self.channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Tear down a user's live channel. Their stored feed is kept.
    pub fn unsubscribe(&self, user_id: Uuid) {
        self.channels.remove(&user_id);
    }

    /// Deliver a draft to one user: store it and push it to any live
    /// subscription.
    pub fn push(&self, user_id: Uuid, draft: NotificationDraft) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            data: draft.data,
            is_read: false,
            created_at: Utc::now(),
            read_at: None,
        };

        let mut feed = self.feeds.entry(user_id).or_default();
        feed.push(notification.clone());
        if feed.len() > FEED_CAPACITY {
            let excess = feed.len() - FEED_CAPACITY;
            feed.drain(..excess);
        }
        drop(feed);

        if let Some(tx) = self.channels.get(&user_id) {
            let _ = tx.send(notification.clone());
        }

        notification
    }

    /// Deliver a draft to every registered user.
    pub fn broadcast(&self, draft: &NotificationDraft) {
        let mut users: Vec<Uuid> = self.feeds.iter().map(|entry| *entry.key()).collect();
        for entry in self.channels.iter() {
            if !users.contains(entry.key()) {
                users.push(*entry.key());
            }
        }
        for user_id in users {
            self.push(user_id, draft.clone());
        }
    }

    /// A user's feed, newest first. Listing registers the feed so later
    /// broadcasts reach users who have only polled.
    pub fn list(&self, user_id: Uuid) -> Vec<Notification> {
        let feed = self.feeds.entry(user_id).or_default();
        let mut items = feed.clone();
        items.reverse();
        items
    }

    pub fn unread_count(&self, user_id: Uuid) -> usize {
        self.feeds
            .get(&user_id)
            .map(|feed| feed.iter().filter(|n| !n.is_read).count())
            .unwrap_or(0)
    }

    pub fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<(), NotificationError> {
        let mut feed = self
            .feeds
            .get_mut(&user_id)
            .ok_or(NotificationError::NotFound(id))?;
        let item = feed
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(NotificationError::NotFound(id))?;
        if !item.is_read {
            item.is_read = true;
            item.read_at = Some(Utc::now());
        }
        Ok(())
    }

    pub fn mark_all_read(&self, user_id: Uuid) {
        if let Some(mut feed) = self.feeds.get_mut(&user_id) {
            let now = Utc::now();
            for item in feed.iter_mut().filter(|n| !n.is_read) {
                item.is_read = true;
                item.read_at = Some(now);
            }
        }
    }

    pub fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), NotificationError> {
        let mut feed = self
            .feeds
            .get_mut(&user_id)
            .ok_or(NotificationError::NotFound(id))?;
        let before = feed.len();
        feed.retain(|n| n.id != id);
        if feed.len() == before {
            return Err(NotificationError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_receives_pushed_notifications() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();
        let mut rx = hub.subscribe(user);

        hub.push(user, NotificationDraft::crash_report_updated(Uuid::new_v4()));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NotificationKind::CrashReportUpdated);
        assert_eq!(hub.unread_count(user), 1);
    }

    #[tokio::test]
    async fn unsubscribe_stops_live_delivery_but_keeps_feed() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();
        let mut rx = hub.subscribe(user);
        hub.unsubscribe(user);

        hub.push(user, NotificationDraft::maintenance_completed(Uuid::new_v4()));

        assert!(rx.try_recv().is_err());
        assert_eq!(hub.list(user).len(), 1);
    }

    #[test]
    fn read_lifecycle() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();
        let n = hub.push(user, NotificationDraft::crash_report_new(Uuid::new_v4(), "High"));

        assert_eq!(hub.unread_count(user), 1);
        hub.mark_read(user, n.id).unwrap();
        assert_eq!(hub.unread_count(user), 0);

        hub.delete(user, n.id).unwrap();
        assert!(hub.list(user).is_empty());
        assert!(matches!(
            hub.mark_read(user, n.id),
            Err(NotificationError::NotFound(_))
        ));
    }

    #[test]
    fn broadcast_reaches_every_registered_feed() {
        let hub = NotificationHub::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let _ = hub.list(a);
        let _ = hub.subscribe(b);

        hub.broadcast(&NotificationDraft::status_changed(
            Uuid::new_v4(),
            "Open",
            "Finished",
        ));

        assert_eq!(hub.list(a).len(), 1);
        assert_eq!(hub.list(b).len(), 1);
    }
}
