//! Test harness: application state backed by an in-memory SQLite database
//! with the schema created from the entity definitions.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use chrono::{DateTime, Datelike, Utc};
use http_body_util::BodyExt;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DbBackend, Set, Statement,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use traincare_api::{
    config::AppConfig,
    db,
    entities::{crash_report, inspection, maintenance, technician, train, user_profile},
    events::{self, EventSender},
    handlers::AppServices,
    notifications::NotificationHub,
    AppState,
};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        // A single connection keeps every query on the same in-memory
        // database.
        options.max_connections(1).min_connections(1);
        let conn = Database::connect(options).await.expect("sqlite connect");

        // Referential integrity is the backend's job in production; the
        // aggregation tests need to stage orphaned references.
        conn.execute(Statement::from_string(
            DbBackend::Sqlite,
            "PRAGMA foreign_keys = OFF;".to_string(),
        ))
        .await
        .expect("pragma");

        db::create_schema(&conn).await.expect("schema");

        let db = Arc::new(conn);
        let notifications = Arc::new(NotificationHub::new());
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx, notifications.clone()));

        let services = AppServices::new(db.clone(), event_sender.clone());
        let config = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let state = AppState {
            db,
            config,
            event_sender,
            services,
            notifications,
        };

        let router = Router::new()
            .nest("/api/v1", traincare_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            state,
            router,
            _event_task: event_task,
        }
    }
}

pub async fn insert_train(state: &AppState, code: &str, name: &str, train_type: &str) -> Uuid {
    let id = Uuid::new_v4();
    train::ActiveModel {
        id: Set(id),
        train_code: Set(code.to_string()),
        name: Set(name.to_string()),
        train_type: Set(train_type.to_string()),
        year: Set(2020),
        created_at: Set(Utc::now()),
    }
    .insert(&*state.db)
    .await
    .expect("insert train");
    id
}

pub async fn insert_technician(state: &AppState, name: &str, expertise: &str) -> Uuid {
    let id = Uuid::new_v4();
    technician::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        expertise: Set(expertise.to_string()),
        contact: Set("+62-812-0000".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&*state.db)
    .await
    .expect("insert technician");
    id
}

pub async fn insert_report(
    state: &AppState,
    train_id: Uuid,
    technician_id: Option<Uuid>,
    severity: &str,
    status: &str,
    reported_date: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    crash_report::ActiveModel {
        id: Set(id),
        train_id: Set(train_id),
        technician_id: Set(technician_id),
        severity: Set(severity.to_string()),
        status: Set(status.to_string()),
        description: Set(format!("{} issue on {}", severity, train_id)),
        photo_url: Set(None),
        reported_date: Set(reported_date),
        created_at: Set(reported_date),
    }
    .insert(&*state.db)
    .await
    .expect("insert report");
    id
}

pub async fn insert_maintenance(
    state: &AppState,
    train_id: Uuid,
    maintenance_type: &str,
    urgency: &str,
    status: &str,
    schedule_date: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    maintenance::ActiveModel {
        id: Set(id),
        train_id: Set(train_id),
        maintenance_type: Set(maintenance_type.to_string()),
        urgency: Set(urgency.to_string()),
        status: Set(status.to_string()),
        schedule_date: Set(schedule_date),
        created_at: Set(Utc::now()),
    }
    .insert(&*state.db)
    .await
    .expect("insert maintenance");
    id
}

pub async fn insert_inspection(state: &AppState, train_id: Uuid, risk_level: &str) -> Uuid {
    let id = Uuid::new_v4();
    inspection::ActiveModel {
        id: Set(id),
        train_id: Set(train_id),
        risk_level: Set(risk_level.to_string()),
        inspector: Set("Inspector".to_string()),
        date: Set(Utc::now()),
        created_at: Set(Utc::now()),
    }
    .insert(&*state.db)
    .await
    .expect("insert inspection");
    id
}

pub async fn insert_user(state: &AppState, email: &str, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    user_profile::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        name: Set(Some(email.split('@').next().unwrap_or("user").to_string())),
        role: Set(role.to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(&*state.db)
    .await
    .expect("insert user");
    id
}

/// Remove a train row directly, leaving any referencing reports orphaned.
pub async fn delete_train_row(state: &AppState, id: Uuid) {
    use sea_orm::EntityTrait;
    train::Entity::delete_by_id(id)
        .exec(&*state.db)
        .await
        .expect("delete train");
}

/// First instant of the current month.
pub fn first_of_this_month() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .with_day(1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// An instant comfortably inside the previous calendar month.
pub fn middle_of_previous_month() -> DateTime<Utc> {
    let last_of_prev = first_of_this_month() - chrono::Duration::days(1);
    last_of_prev
        .date_naive()
        .with_day(14)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc()
}

/// Collect an axum response body as JSON.
pub async fn body_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
