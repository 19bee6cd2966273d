//! Maintenance schedule CRUD and filtered listings.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    domain::{MaintenanceStatus, Urgency},
    entities::{maintenance, train},
    errors::ServiceError,
    events::{Event, EventSender},
    reports::parse_date_bound,
    services::TrainSummary,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceWithDetails {
    #[serde(flatten)]
    pub record: maintenance::Model,
    pub trains: Option<TrainSummary>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct MaintenanceFilters {
    /// Matched against train code, train name, and maintenance type.
    pub search: Option<String>,
    pub urgency: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMaintenance {
    pub train_id: Uuid,
    #[validate(length(min = 1))]
    pub maintenance_type: String,
    pub urgency: Urgency,
    pub status: MaintenanceStatus,
    pub schedule_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateMaintenance {
    pub train_id: Option<Uuid>,
    pub maintenance_type: Option<String>,
    pub urgency: Option<Urgency>,
    pub status: Option<MaintenanceStatus>,
    pub schedule_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct MaintenanceService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl MaintenanceService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!("event delivery failed: {}", e);
        }
    }

    /// Filtered listing, newest schedule first, with the owning train
    /// summary.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filters: &MaintenanceFilters,
    ) -> Result<Vec<MaintenanceWithDetails>, ServiceError> {
        let db = &*self.db;

        let mut query = maintenance::Entity::find()
            .order_by_desc(maintenance::Column::ScheduleDate);
        if let Some(urgency) = &filters.urgency {
            query = query.filter(maintenance::Column::Urgency.eq(urgency.clone()));
        }
        if let Some(status) = &filters.status {
            query = query.filter(maintenance::Column::Status.eq(status.clone()));
        }
        if let Some(raw) = &filters.date_from {
            query = query.filter(maintenance::Column::ScheduleDate.gte(parse_date_bound(raw)?));
        }
        if let Some(raw) = &filters.date_to {
            query = query.filter(maintenance::Column::ScheduleDate.lte(parse_date_bound(raw)?));
        }

        let records = query.all(db).await?;
        let trains: HashMap<Uuid, train::Model> = train::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut items: Vec<MaintenanceWithDetails> = records
            .into_iter()
            .map(|record| {
                let t = trains.get(&record.train_id);
                MaintenanceWithDetails {
                    trains: t.map(|t| TrainSummary {
                        train_code: t.train_code.clone(),
                        name: t.name.clone(),
                        train_type: t.train_type.clone(),
                    }),
                    record,
                }
            })
            .collect();

        if let Some(search) = &filters.search {
            let needle = search.to_lowercase();
            items.retain(|item| {
                item.trains
                    .as_ref()
                    .is_some_and(|t| t.train_code.to_lowercase().contains(&needle))
                    || item
                        .trains
                        .as_ref()
                        .is_some_and(|t| t.name.to_lowercase().contains(&needle))
                    || item.record.maintenance_type.to_lowercase().contains(&needle)
            });
        }

        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<MaintenanceWithDetails, ServiceError> {
        let db = &*self.db;
        let record = maintenance::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("maintenance {}", id)))?;

        let t = train::Entity::find_by_id(record.train_id).one(db).await?;
        Ok(MaintenanceWithDetails {
            trains: t.map(|t| TrainSummary {
                train_code: t.train_code,
                name: t.name,
                train_type: t.train_type,
            }),
            record,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateMaintenance) -> Result<maintenance::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        train::Entity::find_by_id(input.train_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("train {}", input.train_id)))?;

        let model = maintenance::ActiveModel {
            id: Set(Uuid::new_v4()),
            train_id: Set(input.train_id),
            maintenance_type: Set(input.maintenance_type),
            urgency: Set(input.urgency.to_string()),
            status: Set(input.status.to_string()),
            schedule_date: Set(input.schedule_date),
            created_at: Set(Utc::now()),
        };
        let record = model.insert(db).await?;

        self.emit(Event::MaintenanceScheduled {
            maintenance_id: record.id,
            train_id: record.train_id,
            schedule_date: record.schedule_date,
        })
        .await;
        if record.status == MaintenanceStatus::Completed.to_string() {
            self.emit(Event::MaintenanceCompleted {
                maintenance_id: record.id,
            })
            .await;
        }

        Ok(record)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateMaintenance,
    ) -> Result<maintenance::Model, ServiceError> {
        let db = &*self.db;
        let existing = maintenance::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("maintenance {}", id)))?;

        let old_status = existing.status.clone();

        let mut model: maintenance::ActiveModel = existing.into();
        if let Some(train_id) = input.train_id {
            train::Entity::find_by_id(train_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("train {}", train_id)))?;
            model.train_id = Set(train_id);
        }
        if let Some(maintenance_type) = input.maintenance_type {
            model.maintenance_type = Set(maintenance_type);
        }
        if let Some(urgency) = input.urgency {
            model.urgency = Set(urgency.to_string());
        }
        if let Some(status) = input.status {
            model.status = Set(status.to_string());
        }
        if let Some(schedule_date) = input.schedule_date {
            model.schedule_date = Set(schedule_date);
        }

        let updated = model.update(db).await?;

        let completed = MaintenanceStatus::Completed.to_string();
        if updated.status == completed && old_status != completed {
            self.emit(Event::MaintenanceCompleted {
                maintenance_id: updated.id,
            })
            .await;
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let result = maintenance::Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("maintenance {}", id)));
        }
        Ok(())
    }
}
