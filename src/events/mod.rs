//! Domain events emitted by the CRUD services and fanned out to the
//! notification hub by a background task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::notifications::{NotificationDraft, NotificationHub};

/// Events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Crash report events
    ReportCreated {
        report_id: Uuid,
        train_id: Uuid,
        severity: String,
    },
    ReportUpdated {
        report_id: Uuid,
    },
    ReportDeleted {
        report_id: Uuid,
    },
    ReportAssigned {
        report_id: Uuid,
        technician_id: Uuid,
    },
    ReportStatusChanged {
        report_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Maintenance events
    MaintenanceScheduled {
        maintenance_id: Uuid,
        train_id: Uuid,
        schedule_date: DateTime<Utc>,
    },
    MaintenanceCompleted {
        maintenance_id: Uuid,
    },

    // Registry events
    TrainCreated(Uuid),
    TrainDeleted(Uuid),
    TechnicianCreated(Uuid),
    TechnicianDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. Failure to enqueue is reported but
    /// must never fail the originating write; callers log and move on.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background loop: converts domain events into notifications. Registry
/// events are logged only.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>, hub: Arc<NotificationHub>) {
    info!("Event processor started");

    while let Some(event) = receiver.recv().await {
        debug!(?event, "Processing event");

        if let Some(draft) = notification_for(&event) {
            hub.broadcast(&draft);
        }
    }

    info!("Event processor stopped");
}

fn notification_for(event: &Event) -> Option<NotificationDraft> {
    match event {
        Event::ReportCreated {
            report_id, severity, ..
        } => Some(NotificationDraft::crash_report_new(*report_id, severity)),
        Event::ReportUpdated { report_id } => {
            Some(NotificationDraft::crash_report_updated(*report_id))
        }
        Event::ReportAssigned {
            report_id,
            technician_id,
        } => Some(NotificationDraft::crash_report_assigned(
            *report_id,
            *technician_id,
        )),
        Event::ReportStatusChanged {
            report_id,
            old_status,
            new_status,
        } => Some(NotificationDraft::status_changed(
            *report_id, old_status, new_status,
        )),
        Event::MaintenanceScheduled {
            maintenance_id,
            schedule_date,
            ..
        } => Some(NotificationDraft::maintenance_scheduled(
            *maintenance_id,
            *schedule_date,
        )),
        Event::MaintenanceCompleted { maintenance_id } => {
            Some(NotificationDraft::maintenance_completed(*maintenance_id))
        }
        Event::ReportDeleted { .. }
        | Event::TrainCreated(_)
        | Event::TrainDeleted(_)
        | Event::TechnicianCreated(_)
        | Event::TechnicianDeleted(_) => None,
    }
}
