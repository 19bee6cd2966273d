//! Technician registry: CRUD plus the derived workload and performance
//! figures shown in the listing and detail pages.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{crash_report, technician, train},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{analytics::performance_score, TrainSummary},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TechnicianWithStats {
    #[serde(flatten)]
    pub technician: technician::Model,
    pub total_assigned: i64,
    pub active_reports: i64,
    pub completed_reports: i64,
    pub performance_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TechnicianReport {
    #[serde(flatten)]
    pub report: crash_report::Model,
    pub trains: Option<TrainSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct TechnicianStatsBlock {
    pub total_assigned: i64,
    pub active_reports: i64,
    pub completed_reports: i64,
    pub performance_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TechnicianDetail {
    #[serde(flatten)]
    pub technician: technician::Model,
    pub crash_reports: Vec<TechnicianReport>,
    pub stats: TechnicianStatsBlock,
}

/// Organization-wide totals. Unlike the dashboard's active-technician
/// figure, "active" here spans Open and On Progress assignments.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianStats {
    pub total_technicians: i64,
    pub active_technicians: i64,
    pub total_assigned: i64,
    pub completed_reports: i64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TechnicianFilters {
    /// Matched against name, expertise, and contact.
    pub search: Option<String>,
    pub expertise: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTechnician {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub expertise: String,
    #[validate(length(min = 1))]
    pub contact: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTechnician {
    pub name: Option<String>,
    pub expertise: Option<String>,
    pub contact: Option<String>,
}

#[derive(Clone)]
pub struct TechnicianService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl TechnicianService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!("event delivery failed: {}", e);
        }
    }

    async fn stats_for(&self, technician_id: Uuid) -> Result<TechnicianStatsBlock, ServiceError> {
        let db = &*self.db;

        let total_assigned = crash_report::Entity::find()
            .filter(crash_report::Column::TechnicianId.eq(technician_id))
            .count(db)
            .await? as i64;

        let active_reports = crash_report::Entity::find()
            .filter(crash_report::Column::TechnicianId.eq(technician_id))
            .filter(crash_report::Column::Status.is_in(["Open", "On Progress"]))
            .count(db)
            .await? as i64;

        let completed_reports = crash_report::Entity::find()
            .filter(crash_report::Column::TechnicianId.eq(technician_id))
            .filter(crash_report::Column::Status.eq("Finished"))
            .count(db)
            .await? as i64;

        Ok(TechnicianStatsBlock {
            total_assigned,
            active_reports,
            completed_reports,
            performance_score: performance_score(completed_reports, total_assigned),
        })
    }

    /// Listing ordered by name with per-technician workload stats.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filters: &TechnicianFilters,
    ) -> Result<Vec<TechnicianWithStats>, ServiceError> {
        let db = &*self.db;
        let technicians = technician::Entity::find()
            .order_by_asc(technician::Column::Name)
            .all(db)
            .await?;

        let mut items = Vec::with_capacity(technicians.len());
        for tech in technicians {
            let stats = self.stats_for(tech.id).await?;
            items.push(TechnicianWithStats {
                technician: tech,
                total_assigned: stats.total_assigned,
                active_reports: stats.active_reports,
                completed_reports: stats.completed_reports,
                performance_score: stats.performance_score,
            });
        }

        if let Some(search) = &filters.search {
            let needle = search.to_lowercase();
            items.retain(|item| {
                item.technician.name.to_lowercase().contains(&needle)
                    || item.technician.expertise.to_lowercase().contains(&needle)
                    || item.technician.contact.to_lowercase().contains(&needle)
            });
        }
        if let Some(expertise) = &filters.expertise {
            items.retain(|item| &item.technician.expertise == expertise);
        }

        Ok(items)
    }

    /// Technician detail with assigned reports and derived stats.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<TechnicianDetail, ServiceError> {
        let db = &*self.db;
        let tech = technician::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("technician {}", id)))?;

        let reports = crash_report::Entity::find()
            .filter(crash_report::Column::TechnicianId.eq(id))
            .order_by_desc(crash_report::Column::ReportedDate)
            .all(db)
            .await?;
        let trains: HashMap<Uuid, train::Model> = train::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let crash_reports = reports
            .into_iter()
            .map(|report| {
                let t = trains.get(&report.train_id);
                TechnicianReport {
                    trains: t.map(|t| TrainSummary {
                        train_code: t.train_code.clone(),
                        name: t.name.clone(),
                        train_type: t.train_type.clone(),
                    }),
                    report,
                }
            })
            .collect();

        let stats = self.stats_for(id).await?;

        Ok(TechnicianDetail {
            technician: tech,
            crash_reports,
            stats,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateTechnician) -> Result<technician::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;

        let model = technician::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            expertise: Set(input.expertise),
            contact: Set(input.contact),
            created_at: Set(Utc::now()),
        };
        let created = model.insert(db).await?;

        self.emit(Event::TechnicianCreated(created.id)).await;
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateTechnician,
    ) -> Result<technician::Model, ServiceError> {
        let db = &*self.db;
        let existing = technician::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("technician {}", id)))?;

        let mut model: technician::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(expertise) = input.expertise {
            model.expertise = Set(expertise);
        }
        if let Some(contact) = input.contact {
            model.contact = Set(contact);
        }

        Ok(model.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let result = technician::Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("technician {}", id)));
        }

        self.emit(Event::TechnicianDeleted(id)).await;
        Ok(())
    }

    /// Distinct expertise tags, sorted, for the filter dropdown.
    #[instrument(skip(self))]
    pub async fn expertise(&self) -> Result<Vec<String>, ServiceError> {
        let db = &*self.db;
        let technicians = technician::Entity::find().all(db).await?;

        let mut tags: Vec<String> = technicians.into_iter().map(|t| t.expertise).collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    /// Organization-wide totals for the technician overview header.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<TechnicianStats, ServiceError> {
        let db = &*self.db;

        let total_technicians = technician::Entity::find().count(db).await? as i64;

        let active = crash_report::Entity::find()
            .filter(crash_report::Column::Status.is_in(["Open", "On Progress"]))
            .filter(crash_report::Column::TechnicianId.is_not_null())
            .all(db)
            .await?;
        let active_technicians = active
            .iter()
            .filter_map(|r| r.technician_id)
            .collect::<HashSet<Uuid>>()
            .len() as i64;

        let total_assigned = crash_report::Entity::find()
            .filter(crash_report::Column::TechnicianId.is_not_null())
            .count(db)
            .await? as i64;

        let completed_reports = crash_report::Entity::find()
            .filter(crash_report::Column::Status.eq("Finished"))
            .filter(crash_report::Column::TechnicianId.is_not_null())
            .count(db)
            .await? as i64;

        Ok(TechnicianStats {
            total_technicians,
            active_technicians,
            total_assigned,
            completed_reports,
        })
    }
}
