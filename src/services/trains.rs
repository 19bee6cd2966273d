//! Train registry: CRUD, per-train statistics, and the derived condition
//! label shown in the fleet listing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    domain::TrainCondition,
    entities::{crash_report, inspection, maintenance, technician, train},
    errors::ServiceError,
    events::{Event, EventSender},
    services::TechnicianSummary,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainWithStats {
    #[serde(flatten)]
    pub train: train::Model,
    pub total_laporan: i64,
    pub total_laporan_open: i64,
    pub total_maintenance: i64,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub kondisi: TrainCondition,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainReport {
    #[serde(flatten)]
    pub report: crash_report::Model,
    pub technicians: Option<TechnicianSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainDetail {
    #[serde(flatten)]
    pub train: train::Model,
    pub crash_reports: Vec<TrainReport>,
    pub maintenance: Vec<maintenance::Model>,
    pub inspections: Vec<inspection::Model>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TrainFilters {
    /// Matched against train code and name.
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub train_type: Option<String>,
    pub kondisi: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTrain {
    #[validate(length(min = 1))]
    pub train_code: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub train_type: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTrain {
    pub train_code: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub train_type: Option<String>,
    pub year: Option<i32>,
}

/// Derived condition: any open report puts the train into `Perbaikan`.
fn kondisi_for(open_reports: i64) -> TrainCondition {
    if open_reports > 0 {
        TrainCondition::Perbaikan
    } else {
        TrainCondition::Layak
    }
}

#[derive(Clone)]
pub struct TrainService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl TrainService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!("event delivery failed: {}", e);
        }
    }

    /// Fleet listing ordered by train code, with report/maintenance
    /// statistics and the derived condition label.
    #[instrument(skip(self))]
    pub async fn list(&self, filters: &TrainFilters) -> Result<Vec<TrainWithStats>, ServiceError> {
        let db = &*self.db;
        let trains = train::Entity::find()
            .order_by_asc(train::Column::TrainCode)
            .all(db)
            .await?;

        let mut items = Vec::with_capacity(trains.len());
        for t in trains {
            let total_laporan = crash_report::Entity::find()
                .filter(crash_report::Column::TrainId.eq(t.id))
                .count(db)
                .await? as i64;

            let total_laporan_open = crash_report::Entity::find()
                .filter(crash_report::Column::TrainId.eq(t.id))
                .filter(crash_report::Column::Status.is_in(["Open", "On Progress"]))
                .count(db)
                .await? as i64;

            let total_maintenance = maintenance::Entity::find()
                .filter(maintenance::Column::TrainId.eq(t.id))
                .count(db)
                .await? as i64;

            let last_maintenance = maintenance::Entity::find()
                .filter(maintenance::Column::TrainId.eq(t.id))
                .order_by_desc(maintenance::Column::ScheduleDate)
                .limit(1)
                .one(db)
                .await?
                .map(|m| m.schedule_date);

            items.push(TrainWithStats {
                kondisi: kondisi_for(total_laporan_open),
                train: t,
                total_laporan,
                total_laporan_open,
                total_maintenance,
                last_maintenance,
            });
        }

        if let Some(search) = &filters.search {
            let needle = search.to_lowercase();
            items.retain(|item| {
                item.train.train_code.to_lowercase().contains(&needle)
                    || item.train.name.to_lowercase().contains(&needle)
            });
        }
        if let Some(train_type) = &filters.train_type {
            items.retain(|item| &item.train.train_type == train_type);
        }
        if let Some(kondisi) = &filters.kondisi {
            items.retain(|item| &item.kondisi.to_string() == kondisi);
        }

        Ok(items)
    }

    /// Train detail with its crash reports, maintenance history, and
    /// inspections.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<TrainDetail, ServiceError> {
        let db = &*self.db;
        let t = train::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("train {}", id)))?;

        let reports = crash_report::Entity::find()
            .filter(crash_report::Column::TrainId.eq(id))
            .order_by_desc(crash_report::Column::ReportedDate)
            .all(db)
            .await?;
        let technicians: HashMap<Uuid, technician::Model> = technician::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|tech| (tech.id, tech))
            .collect();

        let crash_reports = reports
            .into_iter()
            .map(|report| {
                let tech = report.technician_id.and_then(|tech_id| technicians.get(&tech_id));
                TrainReport {
                    technicians: tech.map(|tech| TechnicianSummary {
                        name: tech.name.clone(),
                        expertise: tech.expertise.clone(),
                        contact: tech.contact.clone(),
                    }),
                    report,
                }
            })
            .collect();

        let maintenance = maintenance::Entity::find()
            .filter(maintenance::Column::TrainId.eq(id))
            .order_by_desc(maintenance::Column::ScheduleDate)
            .all(db)
            .await?;

        let inspections = inspection::Entity::find()
            .filter(inspection::Column::TrainId.eq(id))
            .order_by_desc(inspection::Column::Date)
            .all(db)
            .await?;

        Ok(TrainDetail {
            train: t,
            crash_reports,
            maintenance,
            inspections,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateTrain) -> Result<train::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let model = train::ActiveModel {
            id: Set(Uuid::new_v4()),
            train_code: Set(input.train_code),
            name: Set(input.name),
            train_type: Set(input.train_type),
            year: Set(input.year),
            created_at: Set(Utc::now()),
        };
        let created = model.insert(db).await?;

        self.emit(Event::TrainCreated(created.id)).await;
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateTrain) -> Result<train::Model, ServiceError> {
        let db = &*self.db;
        let existing = train::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("train {}", id)))?;

        let mut model: train::ActiveModel = existing.into();
        if let Some(train_code) = input.train_code {
            model.train_code = Set(train_code);
        }
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(train_type) = input.train_type {
            model.train_type = Set(train_type);
        }
        if let Some(year) = input.year {
            model.year = Set(year);
        }

        Ok(model.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let result = train::Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("train {}", id)));
        }

        self.emit(Event::TrainDeleted(id)).await;
        Ok(())
    }

    /// Distinct train types, sorted, for the filter dropdown.
    #[instrument(skip(self))]
    pub async fn types(&self) -> Result<Vec<String>, ServiceError> {
        let db = &*self.db;
        let trains = train::Entity::find().all(db).await?;

        let mut types: Vec<String> = trains.into_iter().map(|t| t.train_type).collect();
        types.sort();
        types.dedup();
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_open_report_marks_the_train_for_repair() {
        assert_eq!(kondisi_for(0), TrainCondition::Layak);
        assert_eq!(kondisi_for(1), TrainCondition::Perbaikan);
        assert_eq!(kondisi_for(7), TrainCondition::Perbaikan);
    }
}
